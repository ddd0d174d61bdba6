#![allow(dead_code)]

use std::sync::Arc;

use calltrace_api::{Api, ApiBuilder, Callable, Primitive, Type};
use calltrace_gen::test_utils::FakeResolver;
use calltrace_gen::{Generator, Hooks, Interceptor};
use calltrace_trace::MemoryTrace;

pub fn hresult() -> Type {
    Type::alias("HRESULT", Type::prim(Primitive::I32))
}

pub fn u32_() -> Type {
    Type::prim(Primitive::U32)
}

/// `A <- B <- C` plus a few free functions exercising sizes and objects.
pub fn chain_api() -> Api {
    let mut b = ApiBuilder::new("chain");
    b.interface("A", None)
        .methods(
            "A",
            vec![
                Callable::new(u32_(), "AddRef").acquires(),
                Callable::new(u32_(), "Release").releases(),
                Callable::new(hresult(), "a").arg(u32_(), "x"),
            ],
        )
        .interface("B", Some("A"))
        .methods("B", vec![Callable::new(hresult(), "b")])
        .interface("C", Some("B"))
        .methods(
            "C",
            vec![Callable::new(hresult(), "c")
                .arg(Type::opaque_ptr(), "data")
                .arg(u32_(), "len")],
        )
        .function(Callable::new(hresult(), "CreateC").out(Type::ptr(Type::object("C")), "ppC"))
        .function(
            Callable::new(Type::void(), "Upload")
                .arg(u32_(), "count")
                .arg(Type::array(Type::prim(Primitive::F32), "count"), "data"),
        )
        .function(
            Callable::new(hresult(), "GetItems")
                .out(Type::ptr(u32_()), "pCount")
                .out(Type::array(u32_(), "*pCount"), "pItems"),
        )
        .function(
            Callable::new(Type::void(), "Bind")
                .arg(u32_(), "count")
                .arg(Type::array(Type::object("A"), "count"), "objects"),
        )
        .function(
            Callable::new(hresult(), "Missing")
                .arg(u32_(), "x")
                .out(Type::ptr(u32_()), "pOut")
                .fail(-2005530516),
        )
        .function(Callable::new(hresult(), "Hidden").internal());
    b.resolve().unwrap()
}

pub struct Harness {
    pub resolver: Arc<FakeResolver>,
    pub trace: Arc<MemoryTrace>,
    pub interceptor: Interceptor,
}

pub fn harness(api: &Api, hooks: &Hooks) -> Harness {
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

impl Harness {
    /// Creates a `C` through the traced `CreateC` and returns (native, handle).
    pub fn create_c(&self) -> (usize, usize) {
        let native = self.resolver.new_object();
        self.resolver.on_function("CreateC", move |args| {
            unsafe { calltrace_gen::test_utils::write_out(args[0], native) };
            0
        });
        let mut out = 0usize;
        let hr = unsafe {
            self.interceptor
                .call_function("CreateC", &[&mut out as *mut usize as u64])
                .unwrap()
        };
        assert_eq!(hr, 0);
        (native, out)
    }
}
