mod common;

use calltrace_api::{ApiBuilder, Callable, EnumDef, Primitive, StructDef, Type};
use calltrace_gen::{Generator, Hooks, Injection, RustEmitter, Snippet};
use common::chain_api;

fn emit(api: &calltrace_api::Api, hooks: &Hooks) -> String {
    let generated = Generator::new(api, hooks).generate().unwrap();
    RustEmitter::new(&generated).emit()
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("missing `{needle}` in:\n{haystack}"))
}

#[test]
fn vtable_lists_inherited_slots_first() {
    let source = emit(&chain_api(), &Hooks::default());
    let vtbl = position(&source, "pub struct CVtbl {");
    let add_ref = vtbl + position(&source[vtbl..], "pub AddRef:");
    let a = vtbl + position(&source[vtbl..], "pub a:");
    let b = vtbl + position(&source[vtbl..], "pub b:");
    let c = vtbl + position(&source[vtbl..], "pub c:");
    assert!(add_ref < a && a < b && b < c);
    assert!(source.contains("// A -> B -> C"));
    assert!(source.contains("pub static C_VTBL: CVtbl = CVtbl {"));
    assert!(source.contains(".with_vtable(\"C\", &C_VTBL as *const CVtbl as usize)"));
}

#[test]
fn function_shim_keeps_the_native_signature() {
    let source = emit(&chain_api(), &Hooks::default());
    assert!(source.contains("pub type HRESULT = i32;"));
    assert!(source.contains(
        "#[no_mangle]\npub unsafe extern \"system\" fn CreateC(ppC: *mut *mut ::core::ffi::c_void) -> HRESULT {"
    ));
    assert!(source.contains(
        "pub unsafe extern \"system\" fn Upload(count: u32, data: *const f32) {"
    ));
    assert!(source.contains("    // data: count elements (pre-call)"));
    assert!(source.contains("    // pItems: *pCount elements (post-call)"));
    assert!(!source.contains("fn Hidden("));
}

#[test]
fn method_shim_calls_through_the_native_vtable() {
    let source = emit(&chain_api(), &Hooks::default());
    let shim = position(
        &source,
        "unsafe extern \"system\" fn C_a(this: *mut ::core::ffi::c_void, x: u32) -> HRESULT {",
    );
    let body = &source[shim..];
    let end = position(body, "\n}\n");
    let body = &body[..end];
    assert!(body.contains("Some(this as usize), &[x as u64]"));
    assert!(body.contains("vtable_entry(call.native_this(), 2)"));
    assert!(body.contains("call.complete(ret as i64 as u64);"));
    assert!(body.contains("call.finish() as HRESULT"));
}

#[test]
fn types_and_snippets_are_rendered() {
    let mut b = ApiBuilder::new("types");
    b.enumeration(EnumDef::with_values(
        "D3DPOOL",
        Primitive::U32,
        &[("D3DPOOL_DEFAULT", 0), ("D3DPOOL_MANAGED", 1)],
    ))
    .structure(StructDef::new(
        "BLEND",
        vec![
            (Type::prim(Primitive::U32), "Count"),
            (Type::array(Type::prim(Primitive::F32), "4"), "Factor"),
            (Type::ptr(Type::array(Type::prim(Primitive::U16), "Count")), "pIndices"),
        ],
    ))
    .function(
        Callable::new(Type::void(), "SetBlend")
            .arg(Type::const_ptr(Type::structure("BLEND")), "pBlend")
            .arg(Type::enumeration("D3DPOOL"), "Pool")
            .arg(Type::prim(Primitive::F32), "Scale"),
    );
    let api = b.resolve().unwrap();
    let hooks = Hooks::new().with_inject(|_, _| Injection {
        pre: Some(Snippet::new("log the blend", |_| {})),
        post: None,
    });
    let source = emit(&api, &hooks);

    assert!(source.contains("pub type D3DPOOL = u32;"));
    assert!(source.contains("pub const D3DPOOL_MANAGED: D3DPOOL = 1_i64 as D3DPOOL;"));
    assert!(source.contains("#[repr(C)]\n#[derive(Clone, Copy)]\npub struct BLEND {"));
    assert!(source.contains("    pub Factor: [f32; 4],"));
    assert!(source.contains("    /// `Count` elements.\n    pub pIndices: *mut ::core::ffi::c_void,"));
    assert!(source.contains("Scale.to_bits() as u64"));
    assert!(source.contains("f32::from_bits(call.native_arg(2) as u32)"));
    assert!(source.contains("    // pre-call injection:\n    //     log the blend\n    call.inject_pre();"));
}

#[test]
fn void_function_returns_nothing_when_unresolved() {
    let source = emit(&chain_api(), &Hooks::default());
    let shim = position(&source, "pub unsafe extern \"system\" fn Upload(");
    let body = &source[shim..];
    let body = &body[..position(body, "\n}\n")];
    assert!(body.contains(
        "    let Some(real) = call.real_symbol() else {\n        call.unresolved();\n        return;\n    };"
    ));
    assert!(!body.contains("return call.unresolved()"));

    let shim = position(&source, "pub unsafe extern \"system\" fn Missing(");
    let body = &source[shim..];
    assert!(body.contains("        return call.unresolved() as HRESULT;\n"));
}

#[test]
fn install_registers_function_shims_by_name() {
    let source = emit(&chain_api(), &Hooks::default());
    assert!(source.contains(".with_symbol(\"CreateC\", CreateC as usize)"));
    assert!(source.contains(".with_symbol(\"Upload\", Upload as usize)"));
}

#[test]
fn items_leave_out_inner_attributes() {
    let generated = Generator::new(&chain_api(), &Hooks::default())
        .generate()
        .unwrap();
    let items = RustEmitter::new(&generated).emit_items();
    assert!(!items.contains("#!["));
    let module = RustEmitter::new(&generated).emit();
    assert!(module.starts_with("#![allow("));
    assert!(module.ends_with(&items));
}

#[test]
fn shared_constant_names_are_emitted_once() {
    let mut b = ApiBuilder::new("shared");
    b.enumeration(EnumDef::with_values("FIRST", Primitive::U32, &[("NONE", 0), ("ONE", 1)]))
        .enumeration(EnumDef::with_values("SECOND", Primitive::U32, &[("NONE", 0), ("TWO", 2)]))
        .function(
            Callable::new(Type::void(), "Use")
                .arg(Type::enumeration("FIRST"), "first")
                .arg(Type::enumeration("SECOND"), "second"),
        );
    let source = emit(&b.resolve().unwrap(), &Hooks::default());
    assert_eq!(source.matches("pub const NONE:").count(), 1);
    assert!(source.contains("pub const NONE: FIRST = 0_i64 as FIRST;"));
    assert!(source.contains("pub const TWO: SECOND = 2_i64 as SECOND;"));
}
