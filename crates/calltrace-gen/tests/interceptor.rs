mod common;

use std::sync::{Arc, Mutex};

use calltrace_gen::{GenError, Generator, Hooks, Injection, InterceptError, ShaderFormat, Snippet};
use calltrace_gen::ArgEncoding;
use calltrace_trace::{CallStatus, ShadowField, Value};
use common::{chain_api, harness};
use pretty_assertions::assert_eq;

#[test]
fn effective_slots_follow_the_inheritance_chain() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    let c = h.interceptor.generated().interface("C").unwrap();
    let names: Vec<_> = c.slots.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["AddRef", "Release", "a", "b", "c"]);
    assert_eq!(c.chain, vec!["A", "B", "C"]);
    assert_eq!(c.slots[2].qualified_name, "C::a");
}

#[test]
fn inherited_method_dispatches_through_the_concrete_interface() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    let (native, handle) = h.create_c();
    assert_ne!(handle, native);

    let created = h.trace.last("CreateC").unwrap();
    let ppc = created.arg("ppC").unwrap();
    assert_eq!(ppc.before, None);
    let id = ppc.after.as_ref().unwrap().as_array().unwrap()[0]
        .as_object()
        .unwrap();

    h.resolver.on_method(native, 2, |args| args[1] * 2);
    let ret = unsafe { h.interceptor.call_method(handle, "a", &[21]) }.unwrap();
    assert_eq!(ret, 42);

    let record = h.trace.last("C::a").unwrap();
    assert_eq!(record.this, Some(id));
    assert_eq!(record.arg("x").unwrap().before, Some(Value::UInt(21)));
    assert_eq!(record.ret, Some(Value::SInt(42)));
    assert_eq!(
        h.resolver.resolved().last(),
        Some(&format!("{native:#x}#2"))
    );
}

#[test]
fn release_to_zero_forgets_the_object() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    let (native, handle) = h.create_c();
    h.resolver.on_method(native, 0, |_| 2);
    h.resolver.on_method(native, 1, |_| 1);

    unsafe { h.interceptor.call_method(handle, "AddRef", &[]) }.unwrap();
    assert_eq!(h.interceptor.tracker().refs(handle), Some(2));
    unsafe { h.interceptor.call_method(handle, "Release", &[]) }.unwrap();
    unsafe { h.interceptor.call_method(handle, "Release", &[]) }.unwrap();
    assert!(h.interceptor.tracker().lookup(native).is_none());
    assert_eq!(
        unsafe { h.interceptor.call_method(handle, "a", &[1]) },
        Err(InterceptError::UnknownObject(handle))
    );
}

#[test]
fn zero_count_never_touches_the_pointer() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    h.resolver.on_function("Upload", |_| 0);

    // 0x10 is not readable; a zero count must not look at it.
    unsafe { h.interceptor.call_function("Upload", &[0, 0x10]) }.unwrap();
    let record = h.trace.last("Upload").unwrap();
    assert_eq!(record.arg("data").unwrap().before, Some(Value::Array(vec![])));
    assert_eq!(record.ret, None);

    unsafe { h.interceptor.call_function("Upload", &[3, 0]) }.unwrap();
    let record = h.trace.last("Upload").unwrap();
    assert_eq!(record.arg("data").unwrap().before, Some(Value::Null));
}

#[test]
fn float_array_is_sized_by_its_sibling() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    h.resolver.on_function("Upload", |_| 0);
    let data = [1.0f32, 2.0, 3.0, 4.0, 5.0];
    unsafe {
        h.interceptor
            .call_function("Upload", &[4, data.as_ptr() as u64])
            .unwrap()
    };
    let record = h.trace.last("Upload").unwrap();
    assert_eq!(
        record.arg("data").unwrap().before,
        Some(Value::Array(vec![
            Value::Float(1.0),
            Value::Float(2.0),
            Value::Float(3.0),
            Value::Float(4.0),
        ]))
    );
}

#[test]
fn output_count_of_zero_yields_an_empty_array() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    h.resolver.on_function("GetItems", |args| {
        unsafe { *(args[0] as *mut u32) = 0 };
        0
    });
    let mut count = 99u32;
    let items = [7u32; 4];
    unsafe {
        h.interceptor
            .call_function(
                "GetItems",
                &[&mut count as *mut u32 as u64, items.as_ptr() as u64],
            )
            .unwrap()
    };
    let record = h.trace.last("GetItems").unwrap();
    assert_eq!(record.arg("pItems").unwrap().after, Some(Value::Array(vec![])));
    assert_eq!(
        record.arg("pCount").unwrap().after,
        Some(Value::Array(vec![Value::UInt(0)]))
    );
}

#[test]
fn output_array_is_read_after_the_call() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    h.resolver.on_function("GetItems", |args| {
        unsafe {
            *(args[0] as *mut u32) = 2;
            let items = args[1] as *mut u32;
            *items = 10;
            *items.add(1) = 11;
        }
        0
    });
    let mut count = 0u32;
    let mut items = [0u32; 4];
    unsafe {
        h.interceptor
            .call_function(
                "GetItems",
                &[&mut count as *mut u32 as u64, items.as_mut_ptr() as u64],
            )
            .unwrap()
    };
    let record = h.trace.last("GetItems").unwrap();
    assert_eq!(
        record.arg("pItems").unwrap().after,
        Some(Value::Array(vec![Value::UInt(10), Value::UInt(11)]))
    );
}

#[test]
fn unresolved_entry_point_returns_the_failure_value() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    let mut out = 0u32;
    let ret = unsafe {
        h.interceptor
            .call_function("Missing", &[5, &mut out as *mut u32 as u64])
            .unwrap()
    };
    assert_eq!(ret, -2005530516i64 as u64);

    let record = h.trace.last("Missing").unwrap();
    assert_eq!(record.status, CallStatus::Unresolved);
    assert_eq!(record.arg("x").unwrap().before, Some(Value::UInt(5)));
    let out_arg = record.arg("pOut").unwrap();
    assert_eq!(out_arg.before, None);
    assert_eq!(out_arg.after, None);
    assert_eq!(record.args.len(), 2);
    assert_eq!(record.ret, Some(Value::SInt(-2005530516)));
}

#[test]
fn object_arrays_reach_the_real_call_unwrapped() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    let (native1, handle1) = h.create_c();
    let (native2, handle2) = h.create_c();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    h.resolver.on_function("Bind", move |args| {
        let objects = args[1] as *const usize;
        let count = args[0] as usize;
        let natives = unsafe { std::slice::from_raw_parts(objects, count) }.to_vec();
        sink.lock().unwrap().extend(natives);
        0
    });
    let handles = [handle1, handle2];
    unsafe {
        h.interceptor
            .call_function("Bind", &[2, handles.as_ptr() as u64])
            .unwrap()
    };
    assert_eq!(*seen.lock().unwrap(), vec![native1, native2]);

    let ids: Vec<_> = [handle1, handle2]
        .iter()
        .map(|h2| Value::Object(h.interceptor.tracker().lookup(*h2).unwrap().id()))
        .collect();
    let record = h.trace.last("Bind").unwrap();
    assert_eq!(record.arg("objects").unwrap().before, Some(Value::Array(ids)));
}

#[test]
fn post_call_snippet_sees_shadow_state_and_captures_memory() {
    let api = chain_api();
    let hooks = Hooks::new()
        .with_wrapper_state(|interface| {
            if interface.name == "C" {
                vec![ShadowField::new("calls", 0)]
            } else {
                Vec::new()
            }
        })
        .with_inject(|interface, callable| {
            if interface.is_some_and(|i| i.name == "C") && callable.name() == "c" {
                Injection {
                    pre: None,
                    post: Some(Snippet::new("count the call, copy data", |frame| {
                        let calls = frame.shadow_get("calls").unwrap_or(0);
                        frame.shadow_set("calls", calls + 1);
                        let data = frame.arg("data").unwrap_or(0) as usize;
                        let len = frame.arg("len").unwrap_or(0) as usize;
                        unsafe { frame.capture_memory(data, len) };
                    })),
                }
            } else {
                Injection::none()
            }
        });
    let h = harness(&api, &hooks);
    let (native, handle) = h.create_c();
    h.resolver.on_method(native, 4, |_| 0);

    let bytes = [0xAAu8; 16];
    unsafe {
        h.interceptor
            .call_method(handle, "c", &[bytes.as_ptr() as u64, 16])
            .unwrap()
    };
    let record = h.trace.last("C::c").unwrap();
    assert_eq!(record.memory.len(), 1);
    assert_eq!(record.memory[0].bytes, vec![0xAA; 16]);

    let wrapper = h.interceptor.tracker().lookup(handle).unwrap();
    assert_eq!(wrapper.shadow().get("calls"), Some(1));
}

#[test]
fn internal_functions_are_not_generated_by_default() {
    let api = chain_api();
    let generated = Generator::new(&api, &Hooks::default()).generate().unwrap();
    assert!(generated.function("Hidden").is_none());

    let everything = Hooks::new().with_visibility(|_| true);
    let generated = Generator::new(&api, &everything).generate().unwrap();
    assert!(generated.function("Hidden").is_some());
}

#[test]
fn shader_text_on_a_scalar_is_rejected() {
    let api = chain_api();
    let hooks = Hooks::new().with_serialize_arg(|ctx| {
        if ctx.param.name() == "x" {
            ArgEncoding::ShaderText(ShaderFormat::Dxbc)
        } else {
            ArgEncoding::Default
        }
    });
    let err = Generator::new(&api, &hooks).generate().unwrap_err();
    assert!(matches!(err, GenError::InvalidEncoding { ref param, .. } if param == "x"));
}

#[test]
fn side_effect_flag_travels_with_the_record() {
    let api = chain_api();
    let h = harness(&api, &Hooks::default());
    h.resolver.on_function("Upload", |_| 0);
    unsafe { h.interceptor.call_function("Upload", &[0, 0]) }.unwrap();
    assert!(h.trace.last("Upload").unwrap().side_effects);
}
