//! Binary layout of the reference trace stream.
//!
//! ```text
//! header:  magic[8] version:u32
//! record:  payload_len:u32 payload[payload_len]
//! payload: id:u64 name:str this:opt<u64> argc:u32 arg* ret:opt<value> status:u8
//!          memc:u32 (address:u64 bytes)* side_effects:u8
//! arg:     index:u32 name:str before:opt<value> after:opt<value>
//! str:     len:u32 utf8[len]      bytes: len:u32 data[len]
//! opt<T>:  0 | 1 T
//! ```
//!
//! All integers are little endian.

pub const TRACE_MAGIC: [u8; 8] = *b"CALLTRC\0";
pub const TRACE_VERSION: u32 = 1;

/// Nesting limit for values decoded from untrusted input.
pub const MAX_VALUE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueTag {
    Null = 0,
    Bool = 1,
    SInt = 2,
    UInt = 3,
    Float = 4,
    Double = 5,
    String = 6,
    Enum = 7,
    Flags = 8,
    Struct = 9,
    Array = 10,
    Blob = 11,
    Pointer = 12,
    Object = 13,
}

impl ValueTag {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Null,
            1 => Self::Bool,
            2 => Self::SInt,
            3 => Self::UInt,
            4 => Self::Float,
            5 => Self::Double,
            6 => Self::String,
            7 => Self::Enum,
            8 => Self::Flags,
            9 => Self::Struct,
            10 => Self::Array,
            11 => Self::Blob,
            12 => Self::Pointer,
            13 => Self::Object,
            _ => return None,
        })
    }
}

pub const STATUS_COMPLETED: u8 = 0;
pub const STATUS_UNRESOLVED: u8 = 1;
