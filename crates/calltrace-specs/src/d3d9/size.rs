//! Size helpers named by the D3D9 tables.

use calltrace_api::native;
use calltrace_api::{EvalError, Primitive, SizeHelpers};
use calltrace_gen::shader::d3d9_token_stream_size;

const D3DFMT_INDEX16: u64 = 101;
const D3DFMT_INDEX32: u64 = 102;
const D3DDECL_END_STREAM: u64 = 0xff;
const VERTEX_ELEMENT_SIZE: usize = 8;
/// MAXD3DDECLLENGTH plus the terminator.
const MAX_DECL_ELEMENTS: usize = 65;

unsafe fn shader_size(args: &[u64]) -> Result<u64, EvalError> {
    Ok(d3d9_token_stream_size(args[0] as usize))
}

/// Element count of a `D3DDECL_END()` terminated declaration, terminator included.
unsafe fn decl_count(args: &[u64]) -> Result<u64, EvalError> {
    let base = args[0] as usize;
    if base == 0 {
        return Ok(0);
    }
    for count in 0..MAX_DECL_ELEMENTS {
        let stream = native::read_word(base + count * VERTEX_ELEMENT_SIZE, Primitive::U16);
        if stream == D3DDECL_END_STREAM {
            return Ok(count as u64 + 1);
        }
    }
    tracing::warn!(max = MAX_DECL_ELEMENTS, "vertex declaration has no D3DDECL_END");
    Ok(MAX_DECL_ELEMENTS as u64)
}

pub(crate) fn vertex_count(primitive_type: u64, primitive_count: u64) -> Result<u64, EvalError> {
    let count = match primitive_type {
        1 => Some(primitive_count),
        2 => primitive_count.checked_mul(2),
        3 => primitive_count.checked_add(1),
        4 => primitive_count.checked_mul(3),
        5 | 6 => primitive_count.checked_add(2),
        _ => Some(0),
    };
    count.ok_or(EvalError::Overflow)
}

unsafe fn vertex_data_size(args: &[u64]) -> Result<u64, EvalError> {
    vertex_count(args[0], args[1])?
        .checked_mul(args[2])
        .ok_or(EvalError::Overflow)
}

unsafe fn index_data_size(args: &[u64]) -> Result<u64, EvalError> {
    let index_size = match args[2] {
        D3DFMT_INDEX16 => 2,
        D3DFMT_INDEX32 => 4,
        _ => 0,
    };
    vertex_count(args[0], args[1])?
        .checked_mul(index_size)
        .ok_or(EvalError::Overflow)
}

pub fn helpers() -> SizeHelpers {
    let mut helpers = SizeHelpers::new();
    helpers
        .register("_shaderSize", shader_size)
        .register("_declCount", decl_count)
        .register("_vertexDataSize", vertex_data_size)
        .register("_indexDataSize", index_data_size);
    helpers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_share_vertices() {
        assert_eq!(vertex_count(5, 2), Ok(4));
        assert_eq!(vertex_count(3, 3), Ok(4));
        assert_eq!(vertex_count(4, 2), Ok(6));
        assert_eq!(vertex_count(99, 2), Ok(0));
    }

    #[test]
    fn huge_counts_overflow_instead_of_wrapping() {
        assert_eq!(vertex_count(4, u64::MAX), Err(EvalError::Overflow));
        assert_eq!(vertex_count(6, u64::MAX), Err(EvalError::Overflow));
        unsafe {
            assert_eq!(
                vertex_data_size(&[4, 0xFFFF_FFFF, u64::MAX]),
                Err(EvalError::Overflow)
            );
            assert_eq!(
                index_data_size(&[1, u64::MAX, D3DFMT_INDEX32]),
                Err(EvalError::Overflow)
            );
        }
    }

    #[test]
    fn declaration_count_includes_the_terminator() {
        // Two elements followed by D3DDECL_END() (Stream = 0xff, Type = UNUSED).
        let mut decl = Vec::new();
        for stream in [0u16, 0, 0xff] {
            decl.extend_from_slice(&stream.to_le_bytes());
            decl.extend_from_slice(&[0; 6]);
        }
        let count = unsafe { decl_count(&[decl.as_ptr() as u64]) };
        assert_eq!(count, Ok(3));
    }

    #[test]
    fn unterminated_declaration_is_capped() {
        let decl = vec![0u8; MAX_DECL_ELEMENTS * VERTEX_ELEMENT_SIZE];
        let count = unsafe { decl_count(&[decl.as_ptr() as u64]) };
        assert_eq!(count, Ok(MAX_DECL_ELEMENTS as u64));
    }

    #[test]
    fn index_size_follows_the_format() {
        unsafe {
            assert_eq!(index_data_size(&[4, 2, D3DFMT_INDEX16]), Ok(12));
            assert_eq!(index_data_size(&[4, 2, D3DFMT_INDEX32]), Ok(24));
            assert_eq!(index_data_size(&[4, 2, 0]), Ok(0));
        }
    }
}
