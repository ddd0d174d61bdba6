//! Cross-crate scenarios: real API tables, generated plans, the interceptor and a writer.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use calltrace::api::{ApiBuilder, ApiError, EnumDef, Primitive};
use calltrace::gen::test_utils::{write_out, FakeResolver};
use calltrace::gen::Interceptor;
use calltrace::trace::{CallStatus, MemoryTrace, ObjectTracker, StreamReader, StreamWriter, Value};
use pretty_assertions::assert_eq;

fn out_ptr(slot: &mut usize) -> u64 {
    slot as *mut usize as u64
}

fn slot(interceptor: &Interceptor, interface: &str, method: &str) -> usize {
    interceptor
        .generated()
        .interface(interface)
        .unwrap()
        .slot(method)
        .unwrap()
}

/// `Direct3DCreate9` + `CreateDevice` through `interceptor`; returns (native, handle).
fn d3d9_device(interceptor: &Interceptor, resolver: &FakeResolver) -> (usize, usize) {
    let d3d = resolver.new_object();
    let device = resolver.new_object();
    resolver.on_function("Direct3DCreate9", move |_| d3d as u64);
    resolver.on_method(d3d, slot(interceptor, "IDirect3D9", "CreateDevice"), move |args| {
        unsafe { write_out(args[6], device) };
        0
    });
    let d3d_handle = unsafe { interceptor.call_function("Direct3DCreate9", &[32]) }.unwrap();
    let mut out = 0usize;
    unsafe {
        interceptor
            .call_method(d3d_handle as usize, "CreateDevice", &[0, 1, 0, 0x40, 0, out_ptr(&mut out)])
            .unwrap();
    }
    (device, out)
}

fn vertex_buffer(
    interceptor: &Interceptor,
    resolver: &FakeResolver,
    device: (usize, usize),
    native: usize,
) -> usize {
    resolver.on_method(
        device.0,
        slot(interceptor, "IDirect3DDevice9", "CreateVertexBuffer"),
        move |args| {
            unsafe { write_out(args[5], native) };
            0
        },
    );
    let mut out = 0usize;
    unsafe {
        interceptor
            .call_method(device.1, "CreateVertexBuffer", &[64, 0, 0, 1, out_ptr(&mut out), 0])
            .unwrap();
    }
    out
}

#[test]
fn composing_apis_with_the_same_enum_fails() {
    let mut first = ApiBuilder::new("first");
    first.enumeration(EnumDef::sequential("MODE", Primitive::U32, &["MODE_A", "MODE_B"]));
    let mut second = ApiBuilder::new("second");
    second.enumeration(EnumDef::sequential("MODE", Primitive::U32, &["MODE_C"]));

    let err = first.merge(second).map(|_| ()).unwrap_err();
    assert!(matches!(
        err,
        ApiError::DuplicateName { ref name, .. } if name == "MODE"
    ));

    // The shipped tables share the Windows base types, so they cannot be merged blindly.
    let mut d3d9 = calltrace::specs::d3d9::builder();
    assert!(d3d9.merge(calltrace::specs::d3d11::builder()).is_err());
}

#[test]
fn lock_session_round_trips_through_a_trace_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.trace");
    let writer = Arc::new(StreamWriter::new(File::create(&path).unwrap()).unwrap());
    let resolver = FakeResolver::new();
    let interceptor = calltrace::interceptor("d3d9", writer.clone(), resolver.clone()).unwrap();

    let device = d3d9_device(&interceptor, &resolver);
    let native = resolver.new_object();
    let buffer = vertex_buffer(&interceptor, &resolver, device, native);

    let mut data = vec![0u8; 64];
    let mapped = data.as_mut_ptr() as usize;
    resolver.on_method(native, slot(&interceptor, "IDirect3DVertexBuffer9", "Lock"), move |args| {
        unsafe { write_out(args[3], mapped) };
        0
    });
    resolver.on_method(native, slot(&interceptor, "IDirect3DVertexBuffer9", "Unlock"), |_| 0);

    let mut ptr = 0usize;
    unsafe {
        interceptor
            .call_method(buffer, "Lock", &[0, 64, out_ptr(&mut ptr), 0])
            .unwrap();
    }
    data.copy_from_slice(&[0xc3; 64]);
    unsafe { interceptor.call_method(buffer, "Unlock", &[]) }.unwrap();
    writer.flush().unwrap();
    drop(interceptor);

    let mut reader = StreamReader::new(BufReader::new(File::open(&path).unwrap())).unwrap();
    let records = reader.read_all().unwrap();
    assert!(!reader.truncated());
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Direct3DCreate9",
            "IDirect3D9::CreateDevice",
            "IDirect3DDevice9::CreateVertexBuffer",
            "IDirect3DVertexBuffer9::Lock",
            "IDirect3DVertexBuffer9::Unlock",
        ]
    );
    let unlock = &records[4];
    assert_eq!(unlock.status, CallStatus::Completed);
    assert_eq!(unlock.memory.len(), 1);
    assert_eq!(unlock.memory[0].bytes, vec![0xc3; 64]);
    assert_eq!(unlock.this, records[3].this);
}

#[test]
fn released_object_gets_a_new_identity_at_the_same_address() {
    let trace = Arc::new(MemoryTrace::new());
    let resolver = FakeResolver::new();
    let interceptor = calltrace::interceptor("d3d9", trace.clone(), resolver.clone()).unwrap();
    let device = d3d9_device(&interceptor, &resolver);
    let native = resolver.new_object();
    resolver.on_method(native, slot(&interceptor, "IDirect3DVertexBuffer9", "Release"), |_| 0);

    let first = vertex_buffer(&interceptor, &resolver, device, native);
    let first_id = interceptor.tracker().lookup(first).unwrap().id();
    // The same native object handed out again keeps its identity.
    let again = vertex_buffer(&interceptor, &resolver, device, native);
    assert_eq!(again, first);
    assert_eq!(interceptor.tracker().refs(first), Some(2));

    for _ in 0..2 {
        unsafe { interceptor.call_method(first, "Release", &[]) }.unwrap();
    }
    assert!(interceptor.tracker().lookup(native).is_none());

    let second = vertex_buffer(&interceptor, &resolver, device, native);
    let second_id = interceptor.tracker().lookup(second).unwrap().id();
    assert_ne!(second_id, first_id);
    let created = trace.last("IDirect3DDevice9::CreateVertexBuffer").unwrap();
    assert_eq!(
        created.arg("ppVertexBuffer").unwrap().after,
        Some(Value::Array(vec![Value::Object(second_id)]))
    );
}

#[test]
fn inherited_methods_dispatch_through_the_concrete_interface() {
    let trace = Arc::new(MemoryTrace::new());
    let resolver = FakeResolver::new();
    let interceptor = calltrace::interceptor("d3d9", trace.clone(), resolver.clone()).unwrap();
    let device = d3d9_device(&interceptor, &resolver);
    let native = resolver.new_object();
    let buffer = vertex_buffer(&interceptor, &resolver, device, native);

    let set_priority = slot(&interceptor, "IDirect3DVertexBuffer9", "SetPriority");
    assert_eq!(
        set_priority,
        slot(&interceptor, "IDirect3DTexture9", "SetPriority")
    );
    resolver.on_method(native, set_priority, |args| args[1] + 1);
    let old = unsafe { interceptor.call_method(buffer, "SetPriority", &[41]) }.unwrap();
    assert_eq!(old, 42);

    let record = trace.last("IDirect3DVertexBuffer9::SetPriority").unwrap();
    assert_eq!(record.arg("PriorityNew").unwrap().before, Some(Value::UInt(41)));
    assert_eq!(record.ret, Some(Value::UInt(42)));
}

#[test]
fn missing_driver_entry_point_is_recorded_as_unresolved() {
    let trace = Arc::new(MemoryTrace::new());
    let resolver = FakeResolver::new();
    let interceptor = calltrace::interceptor("d3d9", trace.clone(), resolver).unwrap();
    let ret = unsafe { interceptor.call_function("Direct3DCreate9", &[32]) }.unwrap();
    assert_eq!(ret, 0);
    let record = trace.last("Direct3DCreate9").unwrap();
    assert_eq!(record.status, CallStatus::Unresolved);
    assert_eq!(record.ret, Some(Value::Null));
    assert_eq!(record.arg("SDKVersion").unwrap().before, Some(Value::UInt(32)));
}

#[test]
fn apis_sharing_a_tracker_share_identities() {
    let trace = Arc::new(MemoryTrace::new());
    let resolver = FakeResolver::new();
    let tracker = Arc::new(ObjectTracker::new());
    let d3d9 = calltrace::interceptor_with_tracker(
        "d3d9",
        trace.clone(),
        resolver.clone(),
        Arc::clone(&tracker),
    )
    .unwrap();
    let egl = calltrace::interceptor_with_tracker("egl", trace, resolver.clone(), tracker).unwrap();

    let (native, handle) = d3d9_device(&d3d9, &resolver);
    let id = d3d9.tracker().lookup(native).unwrap().id();
    assert_eq!(egl.tracker().lookup(handle).unwrap().id(), id);
}
