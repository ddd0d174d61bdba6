#![allow(dead_code)]

use std::sync::Arc;

use calltrace_gen::test_utils::{write_out, FakeResolver};
use calltrace_gen::{Generator, Hooks, Interceptor};
use calltrace_trace::MemoryTrace;

pub struct Harness {
    pub resolver: Arc<FakeResolver>,
    pub trace: Arc<MemoryTrace>,
    pub interceptor: Interceptor,
}

pub fn harness(api: &str) -> Harness {
    let binding = calltrace_specs::load(api).unwrap();
    with_hooks(&binding.api, &binding.hooks)
}

pub fn with_hooks(api: &calltrace_api::Api, hooks: &Hooks) -> Harness {
    let generated = Generator::new(api, hooks).generate().unwrap();
    let resolver = FakeResolver::new();
    let trace = Arc::new(MemoryTrace::new());
    let interceptor = Interceptor::new(Arc::new(generated), trace.clone(), resolver.clone());
    Harness {
        resolver,
        trace,
        interceptor,
    }
}

fn out_ptr(slot: &mut usize) -> u64 {
    slot as *mut usize as u64
}

impl Harness {
    /// Slot of `method` in the effective vtable of `interface`.
    pub fn slot(&self, interface: &str, method: &str) -> usize {
        self.interceptor
            .generated()
            .interface(interface)
            .unwrap()
            .slot(method)
            .unwrap()
    }

    /// Makes `method` of `object` (seen as `interface`) return `ret`, writing a fresh native
    /// object through the out-pointer at native word `out_index`. Returns that object.
    pub fn creates(&self, object: usize, interface: &str, method: &str, out_index: usize) -> usize {
        let created = self.resolver.new_object();
        self.resolver
            .on_method(object, self.slot(interface, method), move |args| {
                unsafe { write_out(args[out_index], created) };
                0
            });
        created
    }

    /// `Direct3DCreate9` then `CreateDevice`; returns (native device, device handle).
    pub fn d3d9_device(&self) -> (usize, usize) {
        let d3d = self.resolver.new_object();
        self.resolver.on_function("Direct3DCreate9", move |_| d3d as u64);
        let d3d_handle = unsafe {
            self.interceptor
                .call_function("Direct3DCreate9", &[32])
                .unwrap()
        } as usize;
        assert_ne!(d3d_handle, 0);

        let device = self.creates(d3d, "IDirect3D9", "CreateDevice", 6);
        let mut out = 0usize;
        let hr = unsafe {
            self.interceptor.call_method(
                d3d_handle,
                "CreateDevice",
                &[0, 1, 0, 0x40, 0, out_ptr(&mut out)],
            )
        }
        .unwrap();
        assert_eq!(hr, 0);
        (device, out)
    }

    /// Calls a creation method whose out-pointer is argument `out_arg` of `args` and returns
    /// (native, handle) of the created object.
    pub fn create(
        &self,
        (native, handle): (usize, usize),
        interface: &str,
        method: &str,
        mut args: Vec<u64>,
        out_arg: usize,
    ) -> (usize, usize) {
        let created = self.creates(native, interface, method, out_arg + 1);
        let mut out = 0usize;
        args[out_arg] = out_ptr(&mut out);
        let hr = unsafe { self.interceptor.call_method(handle, method, &args) }.unwrap();
        assert_eq!(hr, 0);
        assert_ne!(out, 0);
        (created, out)
    }
}
