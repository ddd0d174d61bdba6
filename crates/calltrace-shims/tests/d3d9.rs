//! Drives the compiled D3D9 shims the way an application would: through exported functions and
//! through the vtable of the handles they return.

use std::ffi::c_void;
use std::ptr;
use std::sync::{Arc, OnceLock};

use calltrace_gen::test_utils::FakeResolver;
use calltrace_gen::{Generator, Interceptor};
use calltrace_shims::d3d9;
use calltrace_trace::{CallStatus, MemoryTrace, Value};
use pretty_assertions::assert_eq;

struct Fixture {
    trace: Arc<MemoryTrace>,
    resolver: Arc<FakeResolver>,
}

/// Address of the fake native `IDirect3D9`, read by the fake `Direct3DCreate9`.
static NATIVE: OnceLock<usize> = OnceLock::new();

unsafe extern "system" fn add_ref(_this: *mut c_void) -> u32 {
    2
}

unsafe extern "system" fn release(_this: *mut c_void) -> u32 {
    1
}

unsafe extern "system" fn get_adapter_count(_this: *mut c_void) -> u32 {
    2
}

unsafe extern "system" fn direct3d_create9(sdk_version: u32) -> *mut c_void {
    if sdk_version != 32 {
        return ptr::null_mut();
    }
    NATIVE.get().copied().unwrap_or(0) as *mut c_void
}

/// Installs the interceptor once per test binary; every shim in `d3d9` shares it.
fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let binding = calltrace_specs::load("d3d9").unwrap();
        let generated = Generator::new(&binding.api, &binding.hooks)
            .generate()
            .unwrap();

        let slots: Vec<String> = generated
            .interface("IDirect3D9")
            .unwrap()
            .slots
            .iter()
            .map(|plan| plan.name().to_owned())
            .collect();
        let slot = |name: &str| slots.iter().position(|s| s == name).unwrap();
        let mut vtable = vec![0usize; slots.len()];
        vtable[slot("AddRef")] = add_ref as usize;
        vtable[slot("Release")] = release as usize;
        vtable[slot("GetAdapterCount")] = get_adapter_count as usize;
        let vtable: &'static [usize] = Box::leak(vtable.into_boxed_slice());
        let object: &'static usize = Box::leak(Box::new(vtable.as_ptr() as usize));
        NATIVE.set(object as *const usize as usize).unwrap();

        let resolver = FakeResolver::new();
        resolver.on_symbol("Direct3DCreate9", direct3d_create9 as usize);
        let trace = Arc::new(MemoryTrace::new());
        let interceptor = Interceptor::new(Arc::new(generated), trace.clone(), resolver.clone());
        assert!(d3d9::install(interceptor));
        Fixture { trace, resolver }
    })
}

#[test]
fn created_object_dispatches_through_the_shim_vtable() {
    let fixture = fixture();
    let native = *NATIVE.get().unwrap();

    let handle = unsafe { d3d9::Direct3DCreate9(32) };
    assert!(!handle.is_null());
    assert_ne!(handle as usize, native);

    let vtable = unsafe { *(handle as *const *const d3d9::IDirect3D9Vtbl) };
    assert_eq!(vtable, &d3d9::IDirect3D9_VTBL as *const d3d9::IDirect3D9Vtbl);
    let count = unsafe { ((*vtable).GetAdapterCount)(handle) };
    assert_eq!(count, 2);

    let create = fixture.trace.last("Direct3DCreate9").unwrap();
    assert_eq!(create.status, CallStatus::Completed);
    assert_eq!(create.arg("SDKVersion").unwrap().before, Some(Value::UInt(32)));
    let id = create.ret.as_ref().and_then(Value::as_object).unwrap();

    let query = fixture.trace.last("IDirect3D9::GetAdapterCount").unwrap();
    assert_eq!(query.status, CallStatus::Completed);
    assert_eq!(query.this, Some(id));
    assert_eq!(query.ret, Some(Value::UInt(2)));
    assert!(fixture.resolver.resolved().iter().any(|name| name == "Direct3DCreate9"));
}

#[test]
fn void_function_without_a_driver_is_recorded_as_unresolved() {
    let fixture = fixture();

    unsafe { d3d9::D3DPERF_SetMarker(0xff00_ff00, ptr::null()) };

    let record = fixture.trace.last("D3DPERF_SetMarker").unwrap();
    assert_eq!(record.status, CallStatus::Unresolved);
    assert_eq!(record.ret, None);
    let names: Vec<&str> = record.args.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["col", "wszName"]);
    assert!(record.args.iter().all(|a| a.after.is_none()));
}
