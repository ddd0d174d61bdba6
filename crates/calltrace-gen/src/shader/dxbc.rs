//! `DXBC` containers: chunk table, signatures and the embedded program.

use std::fmt::Write as _;

use super::{mask_suffix, read_u32_le, sm4, ShaderError};

/// magic + checksum + reserved + total_size + chunk_count
const HEADER_LEN: usize = 4 + 16 + 4 + 4 + 4;
const MAX_CHUNKS: u32 = 4096;

struct Chunk<'a> {
    fourcc: [u8; 4],
    data: &'a [u8],
}

impl Chunk<'_> {
    fn name(&self) -> String {
        String::from_utf8_lossy(&self.fourcc).into_owned()
    }

    fn is_program(&self) -> bool {
        &self.fourcc == b"SHDR" || &self.fourcc == b"SHEX"
    }
}

/// Chunks of a container, with every offset and size checked against `total_size`.
fn chunks(bytes: &[u8]) -> Result<Vec<Chunk<'_>>, ShaderError> {
    if bytes.get(..4) != Some(b"DXBC".as_slice()) {
        return Err(ShaderError::NotDxbc);
    }
    if bytes.len() < HEADER_LEN {
        return Err(ShaderError::Container(format!(
            "need {HEADER_LEN} header bytes, got {}",
            bytes.len()
        )));
    }
    let total = read_u32_le(bytes, 24).unwrap_or(0) as usize;
    let count = read_u32_le(bytes, 28).unwrap_or(0);
    if total < HEADER_LEN || total > bytes.len() {
        return Err(ShaderError::Container(format!(
            "total_size {total} outside {HEADER_LEN}..={}",
            bytes.len()
        )));
    }
    if count > MAX_CHUNKS {
        return Err(ShaderError::Container(format!(
            "chunk_count {count} exceeds {MAX_CHUNKS}"
        )));
    }
    let bytes = &bytes[..total];

    let mut chunks = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let offset = read_u32_le(bytes, HEADER_LEN + i * 4)
            .ok_or_else(|| ShaderError::Container("chunk table is truncated".to_owned()))?
            as usize;
        let header = bytes
            .get(offset..offset.saturating_add(8))
            .ok_or_else(|| ShaderError::Container(format!("chunk {i} starts out of bounds")))?;
        let fourcc = [header[0], header[1], header[2], header[3]];
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        let start = offset + 8;
        let data = bytes
            .get(start..start.saturating_add(size))
            .ok_or_else(|| ShaderError::Container(format!("chunk {i} ends out of bounds")))?;
        chunks.push(Chunk { fourcc, data });
    }
    Ok(chunks)
}

pub(super) fn disassemble(bytes: &[u8], out: &mut String) -> Result<(), ShaderError> {
    let chunks = chunks(bytes)?;
    let names: Vec<String> = chunks.iter().map(Chunk::name).collect();
    let _ = writeln!(out, "// DXBC chunks: {}", names.join(", "));
    for chunk in &chunks {
        let (entry_len, prefix) = match &chunk.fourcc {
            b"ISGN" | b"OSGN" | b"PCSG" => (24, 0),
            b"OSG5" => (28, 4),
            b"ISG1" | b"OSG1" | b"PSG1" => (32, 4),
            _ => continue,
        };
        signature(out, chunk, entry_len, prefix);
    }
    let program = chunks
        .iter()
        .find(|c| c.is_program())
        .ok_or(ShaderError::MissingProgram)?;
    sm4::disassemble(program.data, out)
}

/// One comment line per signature element. Malformed tables end the listing early.
fn signature(out: &mut String, chunk: &Chunk<'_>, entry_len: usize, prefix: usize) {
    let data = chunk.data;
    let (Some(count), Some(first)) = (read_u32_le(data, 0), read_u32_le(data, 4)) else {
        return;
    };
    let register = if chunk.fourcc[0] == b'I' { 'v' } else { 'o' };
    for i in 0..count as usize {
        let base = first as usize + i * entry_len + prefix;
        let fields = (
            read_u32_le(data, base),
            read_u32_le(data, base + 4),
            read_u32_le(data, base + 16),
            data.get(base + 20),
        );
        let (Some(name), Some(index), Some(reg), Some(&mask)) = fields else {
            let _ = writeln!(out, "// {} truncated at element {i}", chunk.name());
            return;
        };
        let name = data
            .get(name as usize..)
            .and_then(|s| s.split(|b| *b == 0).next())
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "// {} {name}{index} {register}{reg}{}",
            chunk.name(),
            mask_suffix(u32::from(mask))
        );
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::shader::tests::bytes;
    use crate::shader::{render, ShaderFormat};
    use pretty_assertions::assert_eq;

    /// A container holding `chunks` in order.
    pub(crate) fn container(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let table_end = HEADER_LEN + chunks.len() * 4;
        let total = table_end + chunks.iter().map(|(_, d)| 8 + d.len()).sum::<usize>();
        let mut out = b"DXBC".to_vec();
        out.extend_from_slice(&[0; 16]);
        for word in [1, total as u32, chunks.len() as u32] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        let mut offset = table_end;
        for (_, data) in chunks {
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            offset += 8 + data.len();
        }
        for (fourcc, data) in chunks {
            out.extend_from_slice(*fourcc);
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(data);
        }
        out
    }

    /// `ISGN` with a single `POSITION0` element in v0.xyzw.
    fn input_signature() -> Vec<u8> {
        let mut data = bytes(&[1, 8, 32, 0, 0, 3, 0, 0x0F0F]);
        data.extend_from_slice(b"POSITION\0\0\0\0");
        data
    }

    #[test]
    fn lists_chunks_and_signature_elements() {
        let program = bytes(&[0x0001_0040, 3, 0x0100_003E]);
        let blob = container(&[(b"ISGN", input_signature()), (b"SHDR", program)]);
        assert_eq!(
            render(ShaderFormat::Dxbc, &blob),
            "// DXBC chunks: ISGN, SHDR\n// ISGN POSITION0 v0\nvs_4_0\nret\n"
        );
    }

    #[test]
    fn container_without_a_program_is_dumped() {
        let blob = container(&[(b"ISGN", input_signature())]);
        let text = render(ShaderFormat::Dxbc, &blob);
        assert!(text.contains("// DXBC container has no SHDR or SHEX chunk\n"));
        assert!(text.contains(" 43425844 "));
    }

    #[test]
    fn chunk_past_the_end_is_rejected() {
        let mut blob = container(&[(b"SHDR", bytes(&[0x0001_0040, 2]))]);
        let at = HEADER_LEN;
        blob[at..at + 4].copy_from_slice(&1000u32.to_le_bytes());
        let text = render(ShaderFormat::Dxbc, &blob);
        assert!(text.starts_with("// malformed DXBC container: chunk 0 starts out of bounds\n"));
    }
}
