mod common;

use calltrace_api::Guid;
use calltrace_specs::d3d9::{D3DERR_NOTAVAILABLE, D3DLOCK_READONLY};
use calltrace_trace::{CallStatus, Value};
use common::{harness, Harness};
use pretty_assertions::assert_eq;

const D3DPOOL_MANAGED: u64 = 1;
const D3DFMT_A8R8G8B8: u32 = 21;

fn vertex_buffer(h: &Harness, length: u64) -> (usize, usize) {
    let device = h.d3d9_device();
    h.create(
        device,
        "IDirect3DDevice9",
        "CreateVertexBuffer",
        vec![length, 0, 0, D3DPOOL_MANAGED, 0, 0],
        4,
    )
}

/// Makes `Lock` hand out `data` and `Unlock` succeed.
fn lockable_buffer(h: &Harness, native: usize, data: usize) {
    let lock = h.slot("IDirect3DVertexBuffer9", "Lock");
    let unlock = h.slot("IDirect3DVertexBuffer9", "Unlock");
    h.resolver.on_method(native, lock, move |args| {
        unsafe { calltrace_gen::test_utils::write_out(args[3], data) };
        0
    });
    h.resolver.on_method(native, unlock, |_| 0);
}

#[test]
fn vertex_shader_constants_are_four_floats_per_register() {
    let h = harness("d3d9");
    let (device, handle) = h.d3d9_device();
    let slot = h.slot("IDirect3DDevice9", "SetVertexShaderConstantF");
    assert_eq!(slot, 94);
    h.resolver.on_method(device, slot, |_| 0);

    let constants = [0.5f32, 1.0, 1.5, 2.0, 99.0];
    let hr = unsafe {
        h.interceptor.call_method(
            handle,
            "SetVertexShaderConstantF",
            &[3, constants.as_ptr() as u64, 1],
        )
    }
    .unwrap();
    assert_eq!(hr, 0);

    let record = h.trace.last("IDirect3DDevice9::SetVertexShaderConstantF").unwrap();
    assert_eq!(record.arg("StartRegister").unwrap().before, Some(Value::UInt(3)));
    assert_eq!(
        record.arg("pConstantData").unwrap().before,
        Some(Value::Array(vec![
            Value::Float(0.5),
            Value::Float(1.0),
            Value::Float(1.5),
            Value::Float(2.0),
        ]))
    );
    assert_eq!(record.ret, Some(Value::SInt(0)));
}

#[test]
fn unlock_records_what_the_application_wrote() {
    let h = harness("d3d9");
    let (native, handle) = vertex_buffer(&h, 64);
    let mut data = vec![0u8; 64];
    lockable_buffer(&h, native, data.as_mut_ptr() as usize);

    let mut mapped = 0usize;
    let hr = unsafe {
        h.interceptor
            .call_method(handle, "Lock", &[0, 64, &mut mapped as *mut usize as u64, 0])
    }
    .unwrap();
    assert_eq!(hr, 0);
    assert_eq!(mapped, data.as_ptr() as usize);

    for (i, byte) in data.iter_mut().enumerate() {
        *byte = i as u8 ^ 0x5a;
    }
    unsafe { h.interceptor.call_method(handle, "Unlock", &[]) }.unwrap();

    let unlock = h.trace.last("IDirect3DVertexBuffer9::Unlock").unwrap();
    assert_eq!(unlock.memory.len(), 1);
    assert_eq!(unlock.memory[0].address, data.as_ptr() as u64);
    assert_eq!(unlock.memory[0].bytes, data);

    let wrapper = h.interceptor.tracker().lookup(handle).unwrap();
    assert_eq!(wrapper.shadow().get("locked_ptr"), Some(0));
    assert_eq!(wrapper.shadow().get("locked_size"), Some(0));
}

#[test]
fn whole_buffer_lock_uses_the_description_size() {
    let h = harness("d3d9");
    let (native, handle) = vertex_buffer(&h, 64);
    let data = vec![7u8; 64];
    lockable_buffer(&h, native, data[16..].as_ptr() as usize);
    let get_desc = h.slot("IDirect3DVertexBuffer9", "GetDesc");
    h.resolver.on_method(native, get_desc, |args| {
        let desc = args[1] as *mut u32;
        unsafe { desc.add(4).write(64) };
        0
    });

    let mut mapped = 0usize;
    unsafe {
        h.interceptor
            .call_method(handle, "Lock", &[16, 0, &mut mapped as *mut usize as u64, 0])
            .unwrap();
        h.interceptor.call_method(handle, "Unlock", &[]).unwrap();
    }
    let unlock = h.trace.last("IDirect3DVertexBuffer9::Unlock").unwrap();
    assert_eq!(unlock.memory[0].bytes.len(), 48);
}

#[test]
fn read_only_lock_captures_nothing() {
    let h = harness("d3d9");
    let (native, handle) = vertex_buffer(&h, 32);
    let data = vec![1u8; 32];
    lockable_buffer(&h, native, data.as_ptr() as usize);

    let mut mapped = 0usize;
    unsafe {
        h.interceptor
            .call_method(
                handle,
                "Lock",
                &[0, 32, &mut mapped as *mut usize as u64, D3DLOCK_READONLY],
            )
            .unwrap();
        h.interceptor.call_method(handle, "Unlock", &[]).unwrap();
    }
    let lock = h.trace.last("IDirect3DVertexBuffer9::Lock").unwrap();
    assert_eq!(
        lock.arg("Flags").unwrap().before,
        Some(Value::Flags {
            value: D3DLOCK_READONLY,
            names: vec!["D3DLOCK_READONLY".to_owned()],
        })
    );
    assert!(h.trace.last("IDirect3DVertexBuffer9::Unlock").unwrap().memory.is_empty());
}

#[test]
fn texture_lock_covers_pitch_times_height() {
    let h = harness("d3d9");
    let device = h.d3d9_device();
    let (native, handle) = h.create(
        device,
        "IDirect3DDevice9",
        "CreateTexture",
        vec![4, 4, 1, 0, u64::from(D3DFMT_A8R8G8B8), D3DPOOL_MANAGED, 0, 0],
        6,
    );
    let pixels = vec![0xabu8; 64];
    let bits = pixels.as_ptr() as usize;
    h.resolver
        .on_method(native, h.slot("IDirect3DTexture9", "LockRect"), move |args| {
            let locked = args[2] as *mut u8;
            unsafe {
                (locked as *mut i32).write_unaligned(16);
                (locked.add(8) as *mut usize).write_unaligned(bits);
            }
            0
        });
    h.resolver
        .on_method(native, h.slot("IDirect3DTexture9", "GetLevelDesc"), |args| {
            assert_eq!(args[1], 0);
            let desc = args[2] as *mut u32;
            unsafe {
                desc.write(D3DFMT_A8R8G8B8);
                desc.add(7).write(4);
            }
            0
        });
    h.resolver
        .on_method(native, h.slot("IDirect3DTexture9", "UnlockRect"), |_| 0);

    let mut locked = [0u64; 2];
    unsafe {
        h.interceptor
            .call_method(handle, "LockRect", &[0, locked.as_mut_ptr() as u64, 0, 0])
            .unwrap();
        h.interceptor.call_method(handle, "UnlockRect", &[0]).unwrap();
    }
    let unlock = h.trace.last("IDirect3DTexture9::UnlockRect").unwrap();
    assert_eq!(unlock.memory.len(), 1);
    assert_eq!(unlock.memory[0].bytes, pixels);
}

#[test]
fn vertex_shader_is_recorded_as_text() {
    let h = harness("d3d9");
    let device = h.d3d9_device();
    // vs_2_0; dcl_position v0; mov oPos, v0
    let tokens: Vec<u32> = vec![
        0xFFFE_0200,
        0x0200_001F,
        0x8000_0000,
        0x900F_0000,
        0x0200_0001,
        0xC00F_0000,
        0x90E4_0000,
        0x0000_FFFF,
    ];
    h.create(
        device,
        "IDirect3DDevice9",
        "CreateVertexShader",
        vec![tokens.as_ptr() as u64, 0],
        1,
    );
    let record = h.trace.last("IDirect3DDevice9::CreateVertexShader").unwrap();
    let Some(Value::String(text)) = &record.arg("pFunction").unwrap().before else {
        panic!("shader not recorded as text: {record:?}");
    };
    assert_eq!(text, "vs_2_0\ndcl_position v0\nmov oPos, v0\nend\n");
}

#[test]
fn user_pointer_draw_records_every_vertex() {
    let h = harness("d3d9");
    let (device, handle) = h.d3d9_device();
    h.resolver
        .on_method(device, h.slot("IDirect3DDevice9", "DrawPrimitiveUP"), |_| 0);
    // Triangle strip of two triangles: four 12-byte vertices.
    let vertices = vec![3u8; 4 * 12 + 8];
    unsafe {
        h.interceptor
            .call_method(handle, "DrawPrimitiveUP", &[5, 2, vertices.as_ptr() as u64, 12])
            .unwrap();
    }
    let record = h.trace.last("IDirect3DDevice9::DrawPrimitiveUP").unwrap();
    let data = record.arg("pVertexStreamZeroData").unwrap().before.clone().unwrap();
    assert_eq!(data.as_blob().map(<[u8]>::len), Some(48));
    assert_eq!(
        record.arg("PrimitiveType").unwrap().before,
        Some(Value::Enum {
            name: Some("D3DPT_TRIANGLESTRIP".to_owned()),
            value: 5,
        })
    );
}

#[test]
fn oversized_draw_records_an_empty_blob() {
    let h = harness("d3d9");
    let (device, handle) = h.d3d9_device();
    h.resolver
        .on_method(device, h.slot("IDirect3DDevice9", "DrawPrimitiveUP"), |_| 0);
    // D3DPT_TRIANGLELIST with counts whose byte size does not fit in 64 bits.
    let hr = unsafe {
        h.interceptor
            .call_method(handle, "DrawPrimitiveUP", &[4, 0xFFFF_FFFF, 0, 0xFFFF_FFFF])
    }
    .unwrap();
    assert_eq!(hr, 0);
    let record = h.trace.last("IDirect3DDevice9::DrawPrimitiveUP").unwrap();
    assert_eq!(
        record.arg("pVertexStreamZeroData").unwrap().before,
        Some(Value::Blob(Vec::new()))
    );
}

#[test]
fn missing_entry_point_returns_the_declared_failure() {
    let h = harness("d3d9");
    let mut out = 0usize;
    let hr = unsafe {
        h.interceptor
            .call_function("Direct3DCreate9Ex", &[32, &mut out as *mut usize as u64])
    }
    .unwrap();
    assert_eq!(hr as u32, D3DERR_NOTAVAILABLE as u32);
    assert_eq!(out, 0);
    let record = h.trace.last("Direct3DCreate9Ex").unwrap();
    assert_eq!(record.status, CallStatus::Unresolved);
    assert_eq!(record.arg("SDKVersion").unwrap().before, Some(Value::UInt(32)));
    let out = record.arg("ppD3D").unwrap();
    assert_eq!(out.before, None);
    assert_eq!(out.after, None);
}

const IID_IDIRECT3DDEVICE9EX: &str = "b18b10ce-2649-405a-870f-95f777d4313a";

/// Makes `QueryInterface` on `native` hand out `returned`.
fn query_returns(h: &Harness, native: usize, returned: usize) {
    let slot = h.slot("IDirect3DDevice9", "QueryInterface");
    assert_eq!(slot, 0);
    h.resolver.on_method(native, slot, move |args| {
        unsafe { calltrace_gen::test_utils::write_out(args[2], returned) };
        0
    });
}

#[test]
fn query_interface_wraps_the_requested_interface() {
    let h = harness("d3d9");
    let (device, handle) = h.d3d9_device();
    let ex = h.resolver.new_object();
    query_returns(&h, device, ex);

    let iid = Guid::parse(IID_IDIRECT3DDEVICE9EX).unwrap();
    let mut out = 0usize;
    let hr = unsafe {
        h.interceptor.call_method(
            handle,
            "QueryInterface",
            &[iid.0.as_ptr() as u64, &mut out as *mut usize as u64],
        )
    }
    .unwrap();
    assert_eq!(hr, 0);
    assert_ne!(out, ex);

    let wrapper = h.interceptor.tracker().lookup(out).unwrap();
    assert_eq!(wrapper.native(), ex);
    assert_eq!(wrapper.interface().as_deref(), Some("IDirect3DDevice9Ex"));
    let record = h.trace.last("IDirect3DDevice9::QueryInterface").unwrap();
    assert_eq!(
        record.arg("ppvObj").unwrap().after,
        Some(Value::Array(vec![Value::Object(wrapper.id())]))
    );

    let priority = h.slot("IDirect3DDevice9Ex", "GetGPUThreadPriority");
    h.resolver.on_method(ex, priority, |args| {
        unsafe { (args[1] as *mut i32).write(-3) };
        0
    });
    let mut value = 0i32;
    unsafe {
        h.interceptor
            .call_method(out, "GetGPUThreadPriority", &[&mut value as *mut i32 as u64])
            .unwrap();
    }
    assert_eq!(value, -3);
    assert!(h
        .trace
        .last("IDirect3DDevice9Ex::GetGPUThreadPriority")
        .is_some());
}

#[test]
fn query_interface_upgrades_a_known_object() {
    let h = harness("d3d9");
    let (device, handle) = h.d3d9_device();
    query_returns(&h, device, device);

    let iid = Guid::parse(IID_IDIRECT3DDEVICE9EX).unwrap();
    let mut out = 0usize;
    unsafe {
        h.interceptor
            .call_method(
                handle,
                "QueryInterface",
                &[iid.0.as_ptr() as u64, &mut out as *mut usize as u64],
            )
            .unwrap();
    }
    assert_eq!(out, handle);
    let wrapper = h.interceptor.tracker().lookup(handle).unwrap();
    assert_eq!(wrapper.interface().as_deref(), Some("IDirect3DDevice9Ex"));
    assert_eq!(h.interceptor.tracker().refs(handle), Some(2));
}

#[test]
fn unknown_iid_passes_the_object_through() {
    let h = harness("d3d9");
    let (device, handle) = h.d3d9_device();
    let other = h.resolver.new_object();
    query_returns(&h, device, other);

    let iid = Guid([0x5a; 16]);
    let mut out = 0usize;
    let hr = unsafe {
        h.interceptor.call_method(
            handle,
            "QueryInterface",
            &[iid.0.as_ptr() as u64, &mut out as *mut usize as u64],
        )
    }
    .unwrap();
    assert_eq!(hr, 0);
    assert_eq!(out, other);
    assert!(h.interceptor.tracker().lookup(other).is_none());
    let record = h.trace.last("IDirect3DDevice9::QueryInterface").unwrap();
    assert_eq!(
        record.arg("ppvObj").unwrap().after,
        Some(Value::Array(vec![Value::Pointer(other as u64)]))
    );
}
