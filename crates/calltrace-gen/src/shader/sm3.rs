//! Disassembly of D3D9 token streams (shader models 1 to 3).

use std::fmt::Write as _;

use super::{component, mask_suffix, ShaderError};

const OPCODE_DCL: u16 = 0x1F;
const OPCODE_DEFB: u16 = 0x2F;
const OPCODE_DEFI: u16 = 0x30;
const OPCODE_TEXCOORD: u16 = 0x40;
const OPCODE_TEX: u16 = 0x42;
const OPCODE_DEF: u16 = 0x51;
const OPCODE_PHASE: u16 = 0xFFFD;
const OPCODE_COMMENT: u16 = 0xFFFE;
const OPCODE_END: u16 = 0xFFFF;

const PARAM_BIT: u32 = 0x8000_0000;
const REGNUM_MASK: u32 = 0x0000_07FF;
const ADDR_MODE_RELATIVE: u32 = 0x0000_2000;
const PREDICATED: u32 = 0x1000_0000;
const COISSUE: u32 = 0x4000_0000;

const REG_ADDR: u8 = 3;
const REG_SAMPLER: u8 = 10;
const REG_INPUT: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Vertex,
    Pixel,
}

#[derive(Debug, Clone, Copy)]
struct Version {
    stage: Stage,
    major: u8,
    minor: u8,
}

impl Version {
    fn decode(token: u32) -> Result<Self, ShaderError> {
        let stage = match token >> 16 {
            0xFFFE => Stage::Vertex,
            0xFFFF => Stage::Pixel,
            _ => return Err(ShaderError::Version(token)),
        };
        Ok(Self {
            stage,
            major: ((token >> 8) & 0xFF) as u8,
            minor: (token & 0xFF) as u8,
        })
    }

    fn pixel(&self) -> bool {
        self.stage == Stage::Pixel
    }
}

/// Mnemonic of an opcode and whether its first operand is a destination.
fn opcode_info(opcode: u16) -> Option<(&'static str, bool)> {
    let info = match opcode {
        0 => ("nop", false),
        1 => ("mov", true),
        2 => ("add", true),
        3 => ("sub", true),
        4 => ("mad", true),
        5 => ("mul", true),
        6 => ("rcp", true),
        7 => ("rsq", true),
        8 => ("dp3", true),
        9 => ("dp4", true),
        10 => ("min", true),
        11 => ("max", true),
        12 => ("slt", true),
        13 => ("sge", true),
        14 => ("exp", true),
        15 => ("log", true),
        16 => ("lit", true),
        17 => ("dst", true),
        18 => ("lrp", true),
        19 => ("frc", true),
        20 => ("m4x4", true),
        21 => ("m4x3", true),
        22 => ("m3x4", true),
        23 => ("m3x3", true),
        24 => ("m3x2", true),
        25 => ("call", false),
        26 => ("callnz", false),
        27 => ("loop", false),
        28 => ("ret", false),
        29 => ("endloop", false),
        30 => ("label", false),
        32 => ("pow", true),
        33 => ("crs", true),
        34 => ("sgn", true),
        35 => ("abs", true),
        36 => ("nrm", true),
        37 => ("sincos", true),
        38 => ("rep", false),
        39 => ("endrep", false),
        40 => ("if", false),
        41 => ("if", false),
        42 => ("else", false),
        43 => ("endif", false),
        44 => ("break", false),
        45 => ("break", false),
        46 => ("mova", true),
        47 => ("defb", true),
        48 => ("defi", true),
        64 => ("texcoord", true),
        65 => ("texkill", true),
        66 => ("tex", true),
        67 => ("texbem", true),
        68 => ("texbeml", true),
        69 => ("texreg2ar", true),
        70 => ("texreg2gb", true),
        71 => ("texm3x2pad", true),
        72 => ("texm3x2tex", true),
        73 => ("texm3x3pad", true),
        74 => ("texm3x3tex", true),
        76 => ("texm3x3spec", true),
        77 => ("texm3x3vspec", true),
        78 => ("expp", true),
        79 => ("logp", true),
        80 => ("cnd", true),
        81 => ("def", true),
        82 => ("texreg2rgb", true),
        83 => ("texdp3tex", true),
        84 => ("texm3x2depth", true),
        85 => ("texdp3", true),
        86 => ("texm3x3", true),
        87 => ("texdepth", true),
        88 => ("cmp", true),
        89 => ("bem", true),
        90 => ("dp2add", true),
        91 => ("dsx", true),
        92 => ("dsy", true),
        93 => ("texldd", true),
        94 => ("setp", true),
        95 => ("texldl", true),
        96 => ("breakp", false),
        OPCODE_PHASE => ("phase", false),
        _ => return None,
    };
    Some(info)
}

fn comparison(control: u32) -> &'static str {
    match control {
        1 => "_gt",
        2 => "_eq",
        3 => "_ge",
        4 => "_lt",
        5 => "_ne",
        6 => "_le",
        _ => "",
    }
}

fn usage(raw: u32) -> &'static str {
    match raw {
        0 => "position",
        1 => "blendweight",
        2 => "blendindices",
        3 => "normal",
        4 => "psize",
        5 => "texcoord",
        6 => "tangent",
        7 => "binormal",
        8 => "tessfactor",
        9 => "positiont",
        10 => "color",
        11 => "fog",
        12 => "depth",
        13 => "sample",
        _ => "unknown",
    }
}

pub(super) fn disassemble(tokens: &[u32], out: &mut String) -> Result<(), ShaderError> {
    let &version = tokens.first().ok_or(ShaderError::Empty)?;
    let version = Version::decode(version)?;
    let stage = if version.pixel() { "ps" } else { "vs" };
    let _ = writeln!(out, "{stage}_{}_{}", version.major, version.minor);

    let d = Disassembler { version };
    let mut pos = 1;
    while pos < tokens.len() {
        let token = tokens[pos];
        let opcode = (token & 0xFFFF) as u16;
        if opcode == OPCODE_END {
            out.push_str("end\n");
            return Ok(());
        }
        let rest = &tokens[pos + 1..];
        if opcode == OPCODE_COMMENT {
            let len = ((token >> 16) & 0x7FFF) as usize;
            let data = rest.get(..len).ok_or(ShaderError::Truncated {
                at: pos,
                needed: len,
                remaining: rest.len(),
            })?;
            comment(out, data);
            pos += 1 + len;
            continue;
        }
        let len = d.operand_count(token, rest);
        let operands = rest.get(..len).ok_or(ShaderError::Truncated {
            at: pos,
            needed: len,
            remaining: rest.len(),
        })?;
        d.instruction(token, operands, out);
        out.push('\n');
        pos += 1 + len;
    }
    Err(ShaderError::MissingEnd)
}

fn comment(out: &mut String, data: &[u32]) {
    let bytes = data.len() * 4;
    match data.first().map(|w| w.to_le_bytes()) {
        Some(tag) if tag.iter().all(u8::is_ascii_alphanumeric) => {
            let _ = writeln!(out, "// {} ({bytes} bytes)", String::from_utf8_lossy(&tag));
        }
        _ => {
            let _ = writeln!(out, "// comment ({bytes} bytes)");
        }
    }
}

struct Disassembler {
    version: Version,
}

impl Disassembler {
    /// Operand tokens following `token`. Shader model 2 and later store the count in the
    /// instruction token; model 1 streams are scanned up to the next instruction token.
    fn operand_count(&self, token: u32, rest: &[u32]) -> usize {
        if self.version.major >= 2 {
            return ((token >> 24) & 0x0F) as usize;
        }
        match (token & 0xFFFF) as u16 {
            OPCODE_DEF | OPCODE_DEFI => 5,
            OPCODE_DEFB => 2,
            _ => rest.iter().take_while(|t| *t & PARAM_BIT != 0).count(),
        }
    }

    fn instruction(&self, token: u32, operands: &[u32], out: &mut String) {
        let opcode = (token & 0xFFFF) as u16;
        if opcode == OPCODE_DCL {
            self.declaration(operands, out);
            return;
        }
        let Some((name, has_dst)) = opcode_info(opcode) else {
            let _ = write!(out, "// unknown opcode {opcode:#x}:");
            for t in std::iter::once(&token).chain(operands) {
                let _ = write!(out, " {t:08x}");
            }
            return;
        };
        let control = (token >> 16) & 0xFF;
        let mut mnemonic = self.mnemonic(opcode, name, control);

        let mut idx = 0;
        let mut rendered = Vec::new();
        if has_dst && !operands.is_empty() {
            let (dst, suffix) = self.dst(operands[0]);
            mnemonic.push_str(&suffix);
            rendered.push(dst);
            idx = 1;
        }
        // The predicate source follows the destination.
        let predicate = (token & PREDICATED != 0 && idx < operands.len())
            .then(|| self.src(operands, &mut idx));

        match opcode {
            OPCODE_DEF => rendered.extend(
                operands[idx..]
                    .iter()
                    .map(|bits| f32::from_bits(*bits).to_string()),
            ),
            OPCODE_DEFI => rendered.extend(operands[idx..].iter().map(|v| (*v as i32).to_string())),
            OPCODE_DEFB => {
                rendered.extend(operands[idx..].iter().map(|v| (*v != 0).to_string()))
            }
            _ => {
                while idx < operands.len() {
                    rendered.push(self.src(operands, &mut idx));
                }
            }
        }

        if token & COISSUE != 0 {
            out.push('+');
        }
        if let Some(predicate) = predicate {
            let _ = write!(out, "({predicate}) ");
        }
        out.push_str(&mnemonic);
        if !rendered.is_empty() {
            out.push(' ');
            out.push_str(&rendered.join(", "));
        }
    }

    fn mnemonic(&self, opcode: u16, name: &str, control: u32) -> String {
        let ps_1_4 = self.version.pixel() && self.version.major == 1 && self.version.minor >= 4;
        match opcode {
            OPCODE_TEXCOORD if ps_1_4 => "texcrd".to_owned(),
            OPCODE_TEX if self.version.major >= 2 => match control {
                1 => "texldp".to_owned(),
                2 => "texldb".to_owned(),
                _ => "texld".to_owned(),
            },
            OPCODE_TEX if ps_1_4 => "texld".to_owned(),
            41 | 45 | 94 => format!("{name}{}", comparison(control)),
            _ => name.to_owned(),
        }
    }

    fn declaration(&self, operands: &[u32], out: &mut String) {
        let &[decl, dst, ..] = operands else {
            out.push_str("dcl");
            return;
        };
        let (reg, suffix) = self.dst(dst);
        match register_type(dst) {
            REG_SAMPLER => {
                let texture = match (decl >> 27) & 0xF {
                    2 => "2d",
                    3 => "cube",
                    4 => "volume",
                    _ => "unknown",
                };
                let _ = write!(out, "dcl_{texture}{suffix} {reg}");
            }
            REG_INPUT | REG_ADDR if self.version.pixel() && self.version.major < 3 => {
                let _ = write!(out, "dcl{suffix} {reg}");
            }
            _ => {
                let index = (decl >> 16) & 0xF;
                let _ = write!(out, "dcl_{}", usage(decl & 0x1F));
                if index != 0 {
                    let _ = write!(out, "{index}");
                }
                let _ = write!(out, "{suffix} {reg}");
            }
        }
    }

    /// Destination text and the modifiers appended to the mnemonic.
    fn dst(&self, token: u32) -> (String, String) {
        let reg = self.register(register_type(token), token & REGNUM_MASK);
        let text = format!("{reg}{}", mask_suffix(token >> 16));
        let mut suffix = String::new();
        suffix.push_str(match (token >> 24) & 0xF {
            1 => "_x2",
            2 => "_x4",
            3 => "_x8",
            0xD => "_d8",
            0xE => "_d4",
            0xF => "_d2",
            _ => "",
        });
        let modifiers = (token >> 20) & 0xF;
        for (bit, name) in [(1, "_sat"), (2, "_pp"), (4, "_centroid")] {
            if modifiers & bit != 0 {
                suffix.push_str(name);
            }
        }
        (text, suffix)
    }

    fn src(&self, operands: &[u32], idx: &mut usize) -> String {
        let token = operands[*idx];
        *idx += 1;
        let mut reg = self.register(register_type(token), token & REGNUM_MASK);
        if token & ADDR_MODE_RELATIVE != 0 {
            if self.version.major >= 2 {
                if let Some(&relative) = operands.get(*idx) {
                    *idx += 1;
                    let base = self.register(register_type(relative), relative & REGNUM_MASK);
                    let _ = write!(reg, "[{base}.{}]", component(relative >> 16));
                }
            } else {
                reg.push_str("[a0.x]");
            }
        }
        let swizzle = swizzle_suffix((token >> 16) & 0xFF);
        match (token >> 24) & 0xF {
            1 => format!("-{reg}{swizzle}"),
            2 => format!("{reg}_bias{swizzle}"),
            3 => format!("-{reg}_bias{swizzle}"),
            4 => format!("{reg}_bx2{swizzle}"),
            5 => format!("-{reg}_bx2{swizzle}"),
            6 => format!("1-{reg}{swizzle}"),
            7 => format!("{reg}_x2{swizzle}"),
            8 => format!("-{reg}_x2{swizzle}"),
            9 => format!("{reg}_dz{swizzle}"),
            10 => format!("{reg}_dw{swizzle}"),
            11 => format!("{reg}_abs{swizzle}"),
            12 => format!("-{reg}_abs{swizzle}"),
            13 => format!("!{reg}{swizzle}"),
            _ => format!("{reg}{swizzle}"),
        }
    }

    fn register(&self, ty: u8, num: u32) -> String {
        let v = self.version;
        match ty {
            0 => format!("r{num}"),
            1 => format!("v{num}"),
            2 => format!("c{num}"),
            REG_ADDR if v.pixel() => format!("t{num}"),
            REG_ADDR => format!("a{num}"),
            4 => match num {
                0 => "oPos".to_owned(),
                1 => "oFog".to_owned(),
                _ => "oPts".to_owned(),
            },
            5 => format!("oD{num}"),
            6 if v.stage == Stage::Vertex && v.major >= 3 => format!("o{num}"),
            6 => format!("oT{num}"),
            7 => format!("i{num}"),
            8 => format!("oC{num}"),
            9 => "oDepth".to_owned(),
            REG_SAMPLER => format!("s{num}"),
            11 => format!("c{}", num + 2048),
            12 => format!("c{}", num + 4096),
            13 => format!("c{}", num + 6144),
            14 => format!("b{num}"),
            15 => "aL".to_owned(),
            16 => format!("half{num}"),
            17 if num == 0 => "vPos".to_owned(),
            17 => "vFace".to_owned(),
            18 => format!("l{num}"),
            19 => format!("p{num}"),
            _ => format!("?{ty}:{num}"),
        }
    }
}

fn register_type(token: u32) -> u8 {
    (((token & 0x7000_0000) >> 28) | ((token & 0x0000_1800) >> 8)) as u8
}

/// Swizzle letters with repeated trailing components collapsed; identity renders as nothing.
fn swizzle_suffix(swizzle: u32) -> String {
    if swizzle == 0xE4 {
        return String::new();
    }
    let mut letters: Vec<char> = (0..4).map(|i| component(swizzle >> (i * 2))).collect();
    while letters.len() > 1 && letters[letters.len() - 1] == letters[letters.len() - 2] {
        letters.pop();
    }
    let mut out = String::from(".");
    out.extend(letters);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::tests::bytes;
    use crate::shader::{render, ShaderFormat, D3D9_END_TOKEN};
    use pretty_assertions::assert_eq;

    fn text(tokens: &[u32]) -> String {
        render(ShaderFormat::D3d9Tokens, &bytes(tokens))
    }

    #[test]
    fn vs_2_0_passthrough() {
        let tokens = [
            0xFFFE_0200,
            // dcl_position v0
            0x0200_001F,
            0x8000_0000,
            0x900F_0000,
            // mov oPos, v0
            0x0200_0001,
            0xC00F_0000,
            0x90E4_0000,
            D3D9_END_TOKEN,
        ];
        assert_eq!(text(&tokens), "vs_2_0\ndcl_position v0\nmov oPos, v0\nend\n");
    }

    #[test]
    fn vs_3_0_modifiers_and_constants() {
        let tokens = [
            0xFFFE_0300,
            // def c0, 1, 0.5, 0, 0
            0x0500_0051,
            0xA00F_0000,
            0x3F80_0000,
            0x3F00_0000,
            0,
            0,
            // dcl_texcoord1 o1.xy
            0x0200_001F,
            0x8001_0005,
            0xE003_0001,
            // add r0.xy, -c0.x, r1.yzwx
            0x0300_0002,
            0x8003_0000,
            0xA100_0000,
            0x8039_0001,
            // mov_sat o0, c2[a0.x]
            0x0300_0001,
            0xE01F_0000,
            0xA0E4_2002,
            0xB000_0000,
            D3D9_END_TOKEN,
        ];
        assert_eq!(
            text(&tokens),
            "vs_3_0\n\
             def c0, 1, 0.5, 0, 0\n\
             dcl_texcoord1 o1.xy\n\
             add r0.xy, -c0.x, r1.yzwx\n\
             mov_sat o0, c2[a0.x]\n\
             end\n"
        );
    }

    #[test]
    fn ps_2_0_samples_a_texture() {
        let tokens = [
            0xFFFF_0200,
            // dcl t0.xy
            0x0200_001F,
            0x8000_0000,
            0xB003_0000,
            // dcl_2d s0
            0x0200_001F,
            0x9000_0000,
            0xA80F_0800,
            // texld r0, t0, s0
            0x0300_0042,
            0x800F_0000,
            0xB0E4_0000,
            0xA0E4_0800,
            // mov oC0, r0
            0x0200_0001,
            0x800F_0800,
            0x80E4_0000,
            D3D9_END_TOKEN,
        ];
        assert_eq!(
            text(&tokens),
            "ps_2_0\ndcl t0.xy\ndcl_2d s0\ntexld r0, t0, s0\nmov oC0, r0\nend\n"
        );
    }

    #[test]
    fn ps_1_1_operands_are_found_without_lengths() {
        let tokens = [
            0xFFFF_0101,
            // tex t0
            0x0000_0042,
            0xB00F_0000,
            // mov r0, t0
            0x0000_0001,
            0x800F_0000,
            0xB0E4_0000,
            D3D9_END_TOKEN,
        ];
        assert_eq!(text(&tokens), "ps_1_1\ntex t0\nmov r0, t0\nend\n");
    }

    #[test]
    fn comments_are_summarized() {
        let tokens = [0xFFFE_0200, 0x0002_FFFE, u32::from_le_bytes(*b"CTAB"), 0, D3D9_END_TOKEN];
        assert_eq!(text(&tokens), "vs_2_0\n// CTAB (8 bytes)\nend\n");
    }

    #[test]
    fn unknown_version_is_dumped() {
        assert_eq!(
            text(&[0x1234_0000, D3D9_END_TOKEN]),
            "// unknown version token 0x12340000\n//   12340000 0000ffff\n"
        );
    }
}
