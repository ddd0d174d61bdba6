//! Type algebra used to describe native ABI shapes.
//!
//! Named types (`Enum`, `Flags`, `Struct`, `Object`) are referenced by name and looked up in
//! the [`crate::Api`] they were declared in. Extending a named type in place therefore never
//! invalidates a `Type` value that already refers to it.

use std::fmt;

/// Fixed-width machine scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Void,
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Isize,
    Usize,
}

impl Primitive {
    /// Size in bytes. `Void` is zero sized.
    pub fn size(self) -> usize {
        match self {
            Primitive::Void => 0,
            Primitive::Bool | Primitive::Char | Primitive::I8 | Primitive::U8 => 1,
            Primitive::I16 | Primitive::U16 => 2,
            Primitive::I32 | Primitive::U32 | Primitive::F32 => 4,
            Primitive::I64 | Primitive::U64 | Primitive::F64 => 8,
            Primitive::Isize | Primitive::Usize => std::mem::size_of::<usize>(),
        }
    }

    pub fn align(self) -> usize {
        self.size().max(1)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Primitive::Char
                | Primitive::I8
                | Primitive::I16
                | Primitive::I32
                | Primitive::I64
                | Primitive::Isize
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }

    pub fn is_integer(self) -> bool {
        !self.is_float() && self != Primitive::Void
    }

    /// Spelling of the primitive in emitted Rust code.
    pub fn rust_name(self) -> &'static str {
        match self {
            Primitive::Void => "::core::ffi::c_void",
            Primitive::Bool => "u8",
            Primitive::Char => "::core::ffi::c_char",
            Primitive::I8 => "i8",
            Primitive::U8 => "u8",
            Primitive::I16 => "i16",
            Primitive::U16 => "u16",
            Primitive::I32 => "i32",
            Primitive::U32 => "u32",
            Primitive::I64 => "i64",
            Primitive::U64 => "u64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Isize => "isize",
            Primitive::Usize => "usize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// NUL-terminated `char` string.
    Narrow,
    /// NUL-terminated UTF-16 string (`LPCWSTR`).
    Wide,
}

/// Source text of an array count or blob size. Parsed and bound by [`crate::ApiBuilder::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SizeSpec(pub String);

impl SizeSpec {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SizeSpec {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SizeSpec {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<usize> for SizeSpec {
    fn from(value: usize) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(Primitive),
    String(StringKind),
    Enum(String),
    Flags(String),
    Pointer {
        target: Box<Type>,
        is_const: bool,
    },
    /// Pointer to a reference-counted interface object. `None` when the interface is only
    /// known at run time (e.g. `void **ppvObject` with a `REFIID`).
    Object(Option<String>),
    Array {
        element: Box<Type>,
        count: SizeSpec,
    },
    /// Byte span whose size (in bytes) is given by an expression. Opaque blobs are copied
    /// verbatim and never interpreted element-wise.
    Blob {
        element: Box<Type>,
        size: SizeSpec,
        opaque: bool,
    },
    Struct(String),
    Alias {
        name: String,
        target: Box<Type>,
    },
}

impl Type {
    pub fn prim(p: Primitive) -> Self {
        Type::Primitive(p)
    }

    pub fn void() -> Self {
        Type::Primitive(Primitive::Void)
    }

    pub fn string() -> Self {
        Type::String(StringKind::Narrow)
    }

    pub fn wide_string() -> Self {
        Type::String(StringKind::Wide)
    }

    pub fn enumeration(name: &str) -> Self {
        Type::Enum(name.to_owned())
    }

    pub fn flags(name: &str) -> Self {
        Type::Flags(name.to_owned())
    }

    pub fn structure(name: &str) -> Self {
        Type::Struct(name.to_owned())
    }

    pub fn ptr(target: Type) -> Self {
        Type::Pointer {
            target: Box::new(target),
            is_const: false,
        }
    }

    pub fn const_ptr(target: Type) -> Self {
        Type::Pointer {
            target: Box::new(target),
            is_const: true,
        }
    }

    /// Untyped `void *` that is recorded by address only.
    pub fn opaque_ptr() -> Self {
        Type::ptr(Type::void())
    }

    pub fn object(interface: &str) -> Self {
        Type::Object(Some(interface.to_owned()))
    }

    pub fn unknown_object() -> Self {
        Type::Object(None)
    }

    pub fn array(element: Type, count: impl Into<SizeSpec>) -> Self {
        Type::Array {
            element: Box::new(element),
            count: count.into(),
        }
    }

    pub fn blob(element: Type, size: impl Into<SizeSpec>) -> Self {
        Type::Blob {
            element: Box::new(element),
            size: size.into(),
            opaque: false,
        }
    }

    pub fn opaque_blob(element: Type, size: impl Into<SizeSpec>) -> Self {
        Type::Blob {
            element: Box::new(element),
            size: size.into(),
            opaque: true,
        }
    }

    pub fn alias(name: &str, target: Type) -> Self {
        Type::Alias {
            name: name.to_owned(),
            target: Box::new(target),
        }
    }

    /// Strips aliases.
    pub fn canonical(&self) -> &Type {
        let mut ty = self;
        while let Type::Alias { target, .. } = ty {
            ty = target;
        }
        ty
    }

    pub fn is_void(&self) -> bool {
        matches!(self.canonical(), Type::Primitive(Primitive::Void))
    }

    /// Types whose parameter value is passed as an address rather than by value.
    pub fn is_indirect(&self) -> bool {
        matches!(
            self.canonical(),
            Type::Pointer { .. }
                | Type::Object(_)
                | Type::Array { .. }
                | Type::Blob { .. }
                | Type::String(_)
        )
    }

    /// The first array/blob size found by walking through pointers and aliases.
    pub fn size_spec(&self) -> Option<&SizeSpec> {
        match self {
            Type::Array { count, .. } => Some(count),
            Type::Blob { size, .. } => Some(size),
            Type::Pointer { target, .. } | Type::Alias { target, .. } => target.size_spec(),
            _ => None,
        }
    }

    /// Visits every named type referenced by this type (not following named definitions).
    pub fn for_each_name(&self, f: &mut dyn FnMut(NameRef<'_>)) {
        match self {
            Type::Primitive(_) | Type::String(_) | Type::Object(None) => {}
            Type::Enum(name) => f(NameRef::Enum(name)),
            Type::Flags(name) => f(NameRef::Flags(name)),
            Type::Struct(name) => f(NameRef::Struct(name)),
            Type::Object(Some(name)) => f(NameRef::Interface(name)),
            Type::Pointer { target, .. } | Type::Alias { target, .. } => target.for_each_name(f),
            Type::Array { element, .. } | Type::Blob { element, .. } => element.for_each_name(f),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{p:?}"),
            Type::String(StringKind::Narrow) => f.write_str("cstring"),
            Type::String(StringKind::Wide) => f.write_str("wstring"),
            Type::Enum(name) | Type::Flags(name) | Type::Struct(name) => f.write_str(name),
            Type::Pointer { target, is_const } => {
                if *is_const {
                    write!(f, "const {target}*")
                } else {
                    write!(f, "{target}*")
                }
            }
            Type::Object(Some(name)) => write!(f, "{name}*"),
            Type::Object(None) => f.write_str("IUnknown?*"),
            Type::Array { element, count } => write!(f, "{element}[{}]", count.as_str()),
            Type::Blob { size, opaque, .. } => {
                if *opaque {
                    write!(f, "opaque_blob[{}]", size.as_str())
                } else {
                    write!(f, "blob[{}]", size.as_str())
                }
            }
            Type::Alias { name, .. } => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRef<'a> {
    Enum(&'a str),
    Flags(&'a str),
    Struct(&'a str),
    Interface(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub repr: Primitive,
    pub values: Vec<EnumValue>,
}

impl EnumDef {
    pub fn new(name: &str, repr: Primitive) -> Self {
        Self {
            name: name.to_owned(),
            repr,
            values: Vec::new(),
        }
    }

    /// Appends a value. Implicit values follow C numbering: previous value + 1, starting at 0.
    pub fn push(&mut self, name: &str, value: Option<i64>) {
        let value = value.unwrap_or_else(|| self.values.last().map_or(0, |v| v.value + 1));
        self.values.push(EnumValue {
            name: name.to_owned(),
            value,
        });
    }

    /// Table-style constructor with explicit values.
    pub fn with_values(name: &str, repr: Primitive, values: &[(&str, i64)]) -> Self {
        let mut def = Self::new(name, repr);
        for (value_name, value) in values {
            def.push(value_name, Some(*value));
        }
        def
    }

    /// Table-style constructor with C numbering.
    pub fn sequential(name: &str, repr: Primitive, names: &[&str]) -> Self {
        let mut def = Self::new(name, repr);
        for value_name in names {
            def.push(value_name, None);
        }
        def
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name == name)
    }

    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.value == value)
            .map(|v| v.name.as_str())
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.values.iter().find(|v| v.name == name).map(|v| v.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagBit {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagsDef {
    pub name: String,
    pub repr: Primitive,
    pub bits: Vec<FlagBit>,
}

impl FlagsDef {
    pub fn new(name: &str, repr: Primitive) -> Self {
        Self {
            name: name.to_owned(),
            repr,
            bits: Vec::new(),
        }
    }

    /// Appends a flag. Implicit values take the lowest bit not used by any earlier flag.
    pub fn push(&mut self, name: &str, value: Option<u64>) {
        let value = value.unwrap_or_else(|| {
            let used = self.bits.iter().fold(0u64, |acc, b| acc | b.value);
            let bit = (!used).trailing_zeros();
            if bit >= 64 {
                0
            } else {
                1u64 << bit
            }
        });
        self.bits.push(FlagBit {
            name: name.to_owned(),
            value,
        });
    }

    pub fn with_bits(name: &str, repr: Primitive, bits: &[(&str, u64)]) -> Self {
        let mut def = Self::new(name, repr);
        for (bit_name, value) in bits {
            def.push(bit_name, Some(*value));
        }
        def
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bits.iter().any(|b| b.name == name)
    }

    pub fn value_of(&self, name: &str) -> Option<u64> {
        self.bits.iter().find(|b| b.name == name).map(|b| b.value)
    }

    /// Splits `value` into named flags (declaration order) plus the bits no name covers.
    ///
    /// Zero-valued names only match an all-zero value.
    pub fn decompose(&self, value: u64) -> (Vec<&str>, u64) {
        let mut names = Vec::new();
        let mut rest = value;
        for bit in &self.bits {
            if bit.value == 0 {
                if value == 0 {
                    names.push(bit.name.as_str());
                }
                continue;
            }
            if value & bit.value == bit.value {
                names.push(bit.name.as_str());
                rest &= !bit.value;
            }
        }
        (names, rest)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<Field>,
    /// Layout unknown to the tables; values are recorded by address only.
    pub opaque: bool,
}

impl StructDef {
    pub fn new(name: &str, fields: Vec<(Type, &str)>) -> Self {
        Self {
            name: name.to_owned(),
            fields: fields
                .into_iter()
                .map(|(ty, name)| Field {
                    name: name.to_owned(),
                    ty,
                })
                .collect(),
            opaque: false,
        }
    }

    pub fn opaque(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            fields: Vec::new(),
            opaque: true,
        }
    }
}

/// Size and alignment of a type as laid out in native memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub size: usize,
    pub align: usize,
}

impl Layout {
    pub const POINTER: Layout = Layout {
        size: std::mem::size_of::<usize>(),
        align: std::mem::align_of::<usize>(),
    };

    pub fn of_primitive(p: Primitive) -> Self {
        Self {
            size: p.size(),
            align: p.align(),
        }
    }
}

/// COM interface identifier in its in-memory layout: `Data1`, `Data2` and `Data3` little-endian,
/// `Data4` as eight raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Parses the registry form `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, braces optional.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(text);
        let groups: Vec<&str> = text.split('-').collect();
        let widths = [8, 4, 4, 4, 12];
        if groups.len() != widths.len()
            || groups.iter().zip(widths).any(|(g, w)| {
                g.len() != w || !g.bytes().all(|b| b.is_ascii_hexdigit())
            })
        {
            return None;
        }
        let data1 = u32::from_str_radix(groups[0], 16).ok()?;
        let data2 = u16::from_str_radix(groups[1], 16).ok()?;
        let data3 = u16::from_str_radix(groups[2], 16).ok()?;
        let tail = format!("{}{}", groups[3], groups[4]);
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&data1.to_le_bytes());
        bytes[4..6].copy_from_slice(&data2.to_le_bytes());
        bytes[6..8].copy_from_slice(&data3.to_le_bytes());
        for (i, byte) in bytes[8..].iter_mut().enumerate() {
            *byte = u8::from_str_radix(&tail[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        let data1 = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let data2 = u16::from_le_bytes([b[4], b[5]]);
        let data3 = u16::from_le_bytes([b[6], b[7]]);
        write!(f, "{data1:08x}-{data2:04x}-{data3:04x}-{:02x}{:02x}-", b[8], b[9])?;
        for byte in &b[10..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

pub(crate) fn align_up(offset: usize, align: usize) -> usize {
    let align = align.max(1);
    offset.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_values_follow_c_numbering() {
        let mut def = EnumDef::new("E", Primitive::U32);
        def.push("A", None);
        def.push("B", None);
        def.push("C", Some(10));
        def.push("D", None);
        let values: Vec<i64> = def.values.iter().map(|v| v.value).collect();
        assert_eq!(values, vec![0, 1, 10, 11]);
        assert_eq!(def.name_of(11), Some("D"));
    }

    #[test]
    fn flags_take_lowest_free_bit() {
        let mut def = FlagsDef::new("F", Primitive::U32);
        def.push("READONLY", Some(0x10));
        def.push("A", None);
        def.push("B", None);
        assert_eq!(def.value_of("A"), Some(1));
        assert_eq!(def.value_of("B"), Some(2));
        let (names, rest) = def.decompose(0x13 | 0x100);
        assert_eq!(names, vec!["READONLY", "A", "B"]);
        assert_eq!(rest, 0x100);
    }

    #[test]
    fn size_spec_walks_through_pointers() {
        let ty = Type::ptr(Type::array(Type::prim(Primitive::U32), "n"));
        assert_eq!(ty.size_spec().map(SizeSpec::as_str), Some("n"));
        assert!(Type::prim(Primitive::U32).size_spec().is_none());
    }

    #[test]
    fn guid_uses_the_com_memory_layout() {
        let iid = Guid::parse("{00000000-0000-0000-C000-000000000046}").unwrap();
        assert_eq!(
            iid.0,
            [0, 0, 0, 0, 0, 0, 0, 0, 0xc0, 0, 0, 0, 0, 0, 0, 0x46]
        );
        let device = Guid::parse("D0223B96-BF7A-43fd-92BD-A43B0D82B9EB").unwrap();
        assert_eq!(&device.0[..4], &[0x96, 0x3b, 0x22, 0xd0]);
        assert_eq!(device.to_string(), "d0223b96-bf7a-43fd-92bd-a43b0d82b9eb");
        assert!(Guid::parse("D0223B96-BF7A-43fd-92BD").is_none());
        assert!(Guid::parse("Z0223B96-BF7A-43fd-92BD-A43B0D82B9EB").is_none());
    }
}
