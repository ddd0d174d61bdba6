//! Raw reads from the traced process' memory.
//!
//! All functions take plain addresses because argument values travel as machine words. Reads
//! are unaligned since nothing guarantees the application hands out aligned buffers.

use crate::types::Primitive;

/// Reads one scalar and widens it to a word. Signed values are sign extended; floats are
/// returned as their bit pattern.
///
/// # Safety
///
/// `addr` must be valid for reads of `prim.size()` bytes.
pub unsafe fn read_word(addr: usize, prim: Primitive) -> u64 {
    let p = addr as *const u8;
    match prim {
        Primitive::Void => 0,
        Primitive::Bool | Primitive::U8 => p.read() as u64,
        Primitive::Char | Primitive::I8 => p.cast::<i8>().read() as i64 as u64,
        Primitive::U16 => p.cast::<u16>().read_unaligned() as u64,
        Primitive::I16 => p.cast::<i16>().read_unaligned() as i64 as u64,
        Primitive::U32 | Primitive::F32 => p.cast::<u32>().read_unaligned() as u64,
        Primitive::I32 => p.cast::<i32>().read_unaligned() as i64 as u64,
        Primitive::U64 | Primitive::I64 | Primitive::F64 => p.cast::<u64>().read_unaligned(),
        Primitive::Usize => p.cast::<usize>().read_unaligned() as u64,
        Primitive::Isize => p.cast::<isize>().read_unaligned() as i64 as u64,
    }
}

/// # Safety
///
/// `addr` must be valid for reads of a pointer-sized value.
pub unsafe fn read_pointer(addr: usize) -> usize {
    (addr as *const usize).read_unaligned()
}

/// # Safety
///
/// `addr` must be valid for writes of a pointer-sized value.
pub unsafe fn write_pointer(addr: usize, value: usize) {
    (addr as *mut usize).write_unaligned(value)
}

/// # Safety
///
/// `addr` must be valid for reads of `len` bytes (or `len` must be zero).
pub unsafe fn read_bytes(addr: usize, len: usize) -> Vec<u8> {
    if len == 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(addr as *const u8, len).to_vec()
}

/// Reads a NUL-terminated narrow string. Invalid UTF-8 is replaced.
///
/// # Safety
///
/// `addr` must point to a NUL-terminated byte string.
pub unsafe fn read_cstr(addr: usize) -> String {
    std::ffi::CStr::from_ptr(addr as *const std::ffi::c_char)
        .to_string_lossy()
        .into_owned()
}

/// Reads a NUL-terminated UTF-16 string.
///
/// # Safety
///
/// `addr` must point to a NUL-terminated sequence of `u16`.
pub unsafe fn read_wstr(addr: usize) -> String {
    let mut units = Vec::new();
    let mut p = addr as *const u16;
    loop {
        let unit = p.read_unaligned();
        if unit == 0 {
            break;
        }
        units.push(unit);
        p = p.add(1);
    }
    String::from_utf16_lossy(&units)
}

/// Converts a word holding a scalar back into a signed value (sign extending narrow types).
pub fn sign_extend(word: u64, prim: Primitive) -> i64 {
    match prim.size() {
        1 => word as u8 as i8 as i64,
        2 => word as u16 as i16 as i64,
        4 => word as u32 as i32 as i64,
        _ => word as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_reads_extend() {
        let v: i16 = -2;
        let w = unsafe { read_word(&v as *const i16 as usize, Primitive::I16) };
        assert_eq!(w as i64, -2);
        assert_eq!(sign_extend(0xffff_fffe, Primitive::I32), -2);
        assert_eq!(sign_extend(0xfe, Primitive::U8), -2);
    }

    #[test]
    fn strings() {
        let narrow = b"EGL_DEFAULT\0";
        assert_eq!(unsafe { read_cstr(narrow.as_ptr() as usize) }, "EGL_DEFAULT");
        let wide: Vec<u16> = "Marker\0".encode_utf16().collect();
        assert_eq!(unsafe { read_wstr(wide.as_ptr() as usize) }, "Marker");
    }

    #[test]
    fn zero_length_read_ignores_address() {
        assert!(unsafe { read_bytes(0, 0) }.is_empty());
    }
}
