//! Windows base types shared by the Direct3D tables.

use calltrace_api::{ApiBuilder, Callable, Direction, Primitive, StructDef, Type};
use calltrace_gen::{ArgContext, ArgEncoding};

pub const IID_IUNKNOWN: &str = "00000000-0000-0000-c000-000000000046";

pub fn hresult() -> Type {
    Type::alias("HRESULT", Type::prim(Primitive::I32))
}

pub fn bool_() -> Type {
    Type::alias("BOOL", Type::prim(Primitive::I32))
}

pub fn int() -> Type {
    Type::alias("INT", Type::prim(Primitive::I32))
}

pub fn long() -> Type {
    Type::alias("LONG", Type::prim(Primitive::I32))
}

pub fn uint() -> Type {
    Type::alias("UINT", Type::prim(Primitive::U32))
}

pub fn uint8() -> Type {
    Type::alias("UINT8", Type::prim(Primitive::U8))
}

pub fn byte() -> Type {
    Type::alias("BYTE", Type::prim(Primitive::U8))
}

pub fn word() -> Type {
    Type::alias("WORD", Type::prim(Primitive::U16))
}

pub fn dword() -> Type {
    Type::alias("DWORD", Type::prim(Primitive::U32))
}

pub fn ulong() -> Type {
    Type::alias("ULONG", Type::prim(Primitive::U32))
}

pub fn float() -> Type {
    Type::alias("FLOAT", Type::prim(Primitive::F32))
}

pub fn size_t() -> Type {
    Type::alias("SIZE_T", Type::prim(Primitive::Usize))
}

pub fn large_integer() -> Type {
    Type::alias("LARGE_INTEGER", Type::prim(Primitive::I64))
}

pub fn handle() -> Type {
    Type::alias("HANDLE", Type::opaque_ptr())
}

pub fn hwnd() -> Type {
    Type::alias("HWND", Type::opaque_ptr())
}

pub fn hdc() -> Type {
    Type::alias("HDC", Type::opaque_ptr())
}

pub fn hmonitor() -> Type {
    Type::alias("HMONITOR", Type::opaque_ptr())
}

pub fn hmodule() -> Type {
    Type::alias("HMODULE", Type::opaque_ptr())
}

pub fn lpcstr() -> Type {
    Type::alias("LPCSTR", Type::string())
}

pub fn lpcwstr() -> Type {
    Type::alias("LPCWSTR", Type::wide_string())
}

pub fn refiid() -> Type {
    Type::alias("REFIID", Type::const_ptr(Type::structure("GUID")))
}

pub fn refguid() -> Type {
    Type::alias("REFGUID", Type::const_ptr(Type::structure("GUID")))
}

/// `T **pp` out-parameter receiving an interface pointer.
pub fn out_object(interface: &str) -> Type {
    Type::ptr(Type::object(interface))
}

/// `void **ppv` out-parameter whose interface depends on a `REFIID`.
pub fn out_unknown() -> Type {
    Type::ptr(Type::unknown_object())
}

/// Attaches IIDs to already declared interfaces.
pub fn iids(b: &mut ApiBuilder, table: &[(&str, &str)]) {
    for (interface, iid) in table {
        b.iid(interface, iid);
    }
}

/// Encoding of a `void **` output typed by a sibling `REFIID`, as in `QueryInterface`.
pub fn iid_encoding(ctx: &ArgContext<'_>) -> Option<ArgEncoding> {
    let param = &ctx.param.param;
    if param.direction == Direction::In {
        return None;
    }
    let Type::Pointer { target, .. } = param.ty.canonical() else {
        return None;
    };
    if !matches!(target.canonical(), Type::Object(None)) {
        return None;
    }
    let riid = ctx
        .callable
        .params
        .iter()
        .position(|p| matches!(&p.param.ty, Type::Alias { name, .. } if name == "REFIID"))?;
    Some(ArgEncoding::ObjectFromIid { riid })
}

/// GUID, the common geometry structs and `IUnknown`.
pub fn declare(b: &mut ApiBuilder) {
    b.structure(StructDef::new(
        "GUID",
        vec![
            (dword(), "Data1"),
            (word(), "Data2"),
            (word(), "Data3"),
            (Type::array(byte(), "8"), "Data4"),
        ],
    ))
    .structure(StructDef::new("LUID", vec![(dword(), "LowPart"), (long(), "HighPart")]))
    .structure(StructDef::new(
        "RECT",
        vec![
            (long(), "left"),
            (long(), "top"),
            (long(), "right"),
            (long(), "bottom"),
        ],
    ))
    .structure(StructDef::new("POINT", vec![(long(), "x"), (long(), "y")]))
    .structure(StructDef::new(
        "PALETTEENTRY",
        vec![
            (byte(), "peRed"),
            (byte(), "peGreen"),
            (byte(), "peBlue"),
            (byte(), "peFlags"),
        ],
    ))
    .opaque_struct("RGNDATA");

    b.interface("IUnknown", None).methods(
        "IUnknown",
        vec![
            Callable::new(hresult(), "QueryInterface")
                .arg(refiid(), "riid")
                .out(out_unknown(), "ppvObj"),
            Callable::new(ulong(), "AddRef").acquires(),
            Callable::new(ulong(), "Release").releases(),
        ],
    )
    .iid("IUnknown", IID_IUNKNOWN);
}
