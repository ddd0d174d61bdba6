//! Text rendering of shader bytecode arguments.
//!
//! Traces store shaders as disassembly instead of opaque bytes. D3D9 token streams (shader
//! models 1 to 3) and the SM4/5 programs inside `DXBC` containers are decoded instruction by
//! instruction. Bytecode that cannot be decoded still produces text: the error as a comment
//! followed by a hex dump of every token, so nothing is lost.

mod dxbc;
mod sm3;
mod sm4;

use std::fmt::Write as _;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderFormat {
    /// D3D9 token stream: version token, instructions, `0x0000FFFF` end token.
    D3d9Tokens,
    /// D3D10+ `DXBC` container.
    Dxbc,
}

pub const D3D9_END_TOKEN: u32 = 0x0000_FFFF;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    #[error("empty shader bytecode")]
    Empty,
    #[error("bytecode length {0} is not a multiple of 4")]
    Length(usize),
    #[error("unknown version token {0:#010x}")]
    Version(u32),
    #[error("instruction at token {at} needs {needed} tokens, {remaining} left")]
    Truncated {
        at: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("token stream has no end token")]
    MissingEnd,
    #[error("not a DXBC container")]
    NotDxbc,
    #[error("malformed DXBC container: {0}")]
    Container(String),
    #[error("DXBC container has no SHDR or SHEX chunk")]
    MissingProgram,
}

pub(crate) fn words(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
}

pub(crate) fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Tokens of a byte stream that must hold whole dwords.
fn tokens(bytes: &[u8]) -> Result<Vec<u32>, ShaderError> {
    if bytes.is_empty() {
        return Err(ShaderError::Empty);
    }
    if bytes.len() % 4 != 0 {
        return Err(ShaderError::Length(bytes.len()));
    }
    Ok(words(bytes).collect())
}

pub fn render(format: ShaderFormat, bytes: &[u8]) -> String {
    let mut out = String::new();
    let result = match format {
        ShaderFormat::D3d9Tokens => {
            tokens(bytes).and_then(|tokens| sm3::disassemble(&tokens, &mut out))
        }
        ShaderFormat::Dxbc => dxbc::disassemble(bytes, &mut out),
    };
    if let Err(err) = result {
        tracing::debug!(%err, len = bytes.len(), "shader kept as a hex dump");
        let _ = writeln!(out, "// {err}");
        hex_lines(&mut out, words(bytes));
    }
    out
}

fn hex_lines(out: &mut String, tokens: impl Iterator<Item = u32>) {
    let mut any = false;
    for (i, token) in tokens.enumerate() {
        if i % 8 == 0 {
            if i != 0 {
                out.push('\n');
            }
            out.push_str("//  ");
        }
        let _ = write!(out, " {token:08x}");
        any = true;
    }
    if any {
        out.push('\n');
    }
}

/// Component letters of a write mask, or nothing for the full `xyzw` mask.
fn mask_suffix(mask: u32) -> String {
    if mask & 0xF == 0xF || mask & 0xF == 0 {
        return String::new();
    }
    let mut out = String::from(".");
    for (bit, letter) in ['x', 'y', 'z', 'w'].into_iter().enumerate() {
        if mask & (1 << bit) != 0 {
            out.push(letter);
        }
    }
    out
}

fn component(index: u32) -> char {
    ['x', 'y', 'z', 'w'][(index & 3) as usize]
}

/// Size in bytes of a D3D9 token stream, including the end token.
///
/// # Safety
///
/// `addr` must point to a token stream terminated by the end token.
pub unsafe fn d3d9_token_stream_size(addr: usize) -> u64 {
    if addr == 0 {
        return 0;
    }
    let mut p = addr as *const u32;
    let mut count = 1u64;
    while p.read_unaligned() != D3D9_END_TOKEN {
        p = p.add(1);
        count += 1;
    }
    count * 4
}
