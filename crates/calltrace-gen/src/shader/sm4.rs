//! Disassembly of shader model 4 and 5 programs (`SHDR`/`SHEX` chunk payloads).

use std::fmt::Write as _;

use super::{component, words, ShaderError};

const OPCODE_MASK: u32 = 0x7FF;
const EXTENDED: u32 = 0x8000_0000;

const CUSTOMDATA: u32 = 53;
const RESINFO: u32 = 61;
const DCL_RESOURCE: u32 = 88;
const DCL_CONSTANT_BUFFER: u32 = 89;
const DCL_SAMPLER: u32 = 90;
const DCL_INDEX_RANGE: u32 = 91;
const DCL_OUTPUT_TOPOLOGY: u32 = 92;
const DCL_INPUT_PRIMITIVE: u32 = 93;
const DCL_MAX_OUTPUT_VERTEX_COUNT: u32 = 94;
const DCL_INPUT_SGV: u32 = 96;
const DCL_INPUT_SIV: u32 = 97;
const DCL_INPUT_PS: u32 = 98;
const DCL_INPUT_PS_SGV: u32 = 99;
const DCL_INPUT_PS_SIV: u32 = 100;
const DCL_OUTPUT_SGV: u32 = 102;
const DCL_OUTPUT_SIV: u32 = 103;
const DCL_TEMPS: u32 = 104;
const DCL_INDEXABLE_TEMP: u32 = 105;
const DCL_GLOBAL_FLAGS: u32 = 106;
const DCL_INPUT_CONTROL_POINT_COUNT: u32 = 147;
const DCL_OUTPUT_CONTROL_POINT_COUNT: u32 = 148;
const DCL_THREAD_GROUP: u32 = 155;
const SYNC: u32 = 190;
const DCL_GS_INSTANCE_COUNT: u32 = 206;

const OPERAND_IMMEDIATE32: u32 = 4;
const OPERAND_IMMEDIATE64: u32 = 5;

const OPCODES: [&str; 207] = [
    "add", "and", "break", "breakc", "call", "callc", "case", "continue", "continuec", "cut",
    "default", "deriv_rtx", "deriv_rty", "discard", "div", "dp2", "dp3", "dp4", "else", "emit",
    "emitthencut", "endif", "endloop", "endswitch", "eq", "exp", "frc", "ftoi", "ftou", "ge",
    "iadd", "if", "ieq", "ige", "ilt", "imad", "imax", "imin", "imul", "ine", "ineg", "ishl",
    "ishr", "itof", "label", "ld", "ld_ms", "log", "loop", "lt", "mad", "min", "max",
    "customdata", "mov", "movc", "mul", "ne", "nop", "not", "or", "resinfo", "ret", "retc",
    "round_ne", "round_ni", "round_pi", "round_z", "rsq", "sample", "sample_c", "sample_c_lz",
    "sample_l", "sample_d", "sample_b", "sqrt", "switch", "sincos", "udiv", "ult", "uge", "umul",
    "umad", "umax", "umin", "ushr", "utof", "xor", "dcl_resource", "dcl_constantbuffer",
    "dcl_sampler", "dcl_indexRange", "dcl_outputtopology", "dcl_inputprimitive", "dcl_maxout",
    "dcl_input", "dcl_input_sgv", "dcl_input_siv", "dcl_input_ps", "dcl_input_ps_sgv",
    "dcl_input_ps_siv", "dcl_output", "dcl_output_sgv", "dcl_output_siv", "dcl_temps",
    "dcl_indexableTemp", "dcl_globalFlags", "reserved", "lod", "gather4", "samplepos",
    "sampleinfo", "reserved", "hs_decls", "hs_control_point_phase", "hs_fork_phase",
    "hs_join_phase", "emit_stream", "cut_stream", "emitthencut_stream", "fcall", "bufinfo",
    "deriv_rtx_coarse", "deriv_rtx_fine", "deriv_rty_coarse", "deriv_rty_fine", "gather4_c",
    "gather4_po", "gather4_po_c", "rcp", "f32tof16", "f16tof32", "uaddc", "usubb", "countbits",
    "firstbit_hi", "firstbit_lo", "firstbit_shi", "ubfe", "ibfe", "bfi", "bfrev", "swapc",
    "dcl_stream", "dcl_function_body", "dcl_function_table", "dcl_interface",
    "dcl_input_control_point_count", "dcl_output_control_point_count", "dcl_tessellator_domain",
    "dcl_tessellator_partitioning", "dcl_tessellator_output_primitive", "dcl_hs_max_tessfactor",
    "dcl_hs_fork_phase_instance_count", "dcl_hs_join_phase_instance_count", "dcl_thread_group",
    "dcl_uav_typed", "dcl_uav_raw", "dcl_uav_structured", "dcl_tgsm_raw", "dcl_tgsm_structured",
    "dcl_resource_raw", "dcl_resource_structured", "ld_uav_typed", "store_uav_typed", "ld_raw",
    "store_raw", "ld_structured", "store_structured", "atomic_and", "atomic_or", "atomic_xor",
    "atomic_cmp_store", "atomic_iadd", "atomic_imax", "atomic_imin", "atomic_umax",
    "atomic_umin", "imm_atomic_alloc", "imm_atomic_consume", "imm_atomic_iadd",
    "imm_atomic_and", "imm_atomic_or", "imm_atomic_xor", "imm_atomic_exch",
    "imm_atomic_cmp_exch", "imm_atomic_imax", "imm_atomic_imin", "imm_atomic_umax",
    "imm_atomic_umin", "sync", "dadd", "dmax", "dmin", "dmul", "deq", "dge", "dlt", "dne",
    "dmov", "dmovc", "dtof", "ftod", "eval_snapped", "eval_sample_index", "eval_centroid",
    "dcl_gs_instance_count",
];

/// Opcodes whose `_z`/`_nz` test lives in bit 18 of the opcode token.
fn has_test(opcode: u32) -> bool {
    matches!(opcode, 3 | 5 | 8 | 13 | 31 | 63)
}

fn is_declaration(opcode: u32) -> bool {
    matches!(opcode, 88..=106 | 143..=162 | DCL_GS_INSTANCE_COUNT)
}

fn stage(program_type: u32) -> &'static str {
    match program_type {
        0 => "ps",
        1 => "vs",
        2 => "gs",
        3 => "hs",
        4 => "ds",
        5 => "cs",
        _ => "unknown",
    }
}

pub(super) fn disassemble(program: &[u8], out: &mut String) -> Result<(), ShaderError> {
    let tokens: Vec<u32> = words(program).collect();
    let &[version, length, ..] = tokens.as_slice() else {
        return Err(ShaderError::Truncated {
            at: 0,
            needed: 2,
            remaining: tokens.len(),
        });
    };
    let _ = writeln!(
        out,
        "{}_{}_{}",
        stage(version >> 16),
        (version >> 4) & 0xF,
        version & 0xF
    );
    let end = length as usize;
    if end > tokens.len() {
        return Err(ShaderError::Truncated {
            at: 0,
            needed: end,
            remaining: tokens.len(),
        });
    }

    let mut pos = 2;
    while pos < end {
        let token = tokens[pos];
        let len = if token & OPCODE_MASK == CUSTOMDATA {
            tokens.get(pos + 1).copied().unwrap_or(0) as usize
        } else {
            ((token >> 24) & 0x7F) as usize
        };
        if len == 0 || pos + len > end {
            return Err(ShaderError::Truncated {
                at: pos,
                needed: len.max(1),
                remaining: end - pos,
            });
        }
        instruction(&tokens[pos..pos + len], out);
        out.push('\n');
        pos += len;
    }
    Ok(())
}

fn instruction(tokens: &[u32], out: &mut String) {
    let token = tokens[0];
    let opcode = token & OPCODE_MASK;
    if opcode == CUSTOMDATA {
        custom_data(tokens, out);
        return;
    }
    let name = OPCODES
        .get(opcode as usize)
        .copied()
        .unwrap_or("unknown");

    let mut idx = 1;
    let mut offsets = None;
    let mut extended = token & EXTENDED != 0;
    while extended && idx < tokens.len() {
        let ext = tokens[idx];
        idx += 1;
        extended = ext & EXTENDED != 0;
        // Sample controls carry immediate texel offsets.
        if ext & 0x3F == 1 {
            offsets = Some([nibble(ext >> 9), nibble(ext >> 13), nibble(ext >> 17)]);
        }
    }

    let mut ops = Operands { tokens, idx };
    match opcode {
        DCL_TEMPS | DCL_MAX_OUTPUT_VERTEX_COUNT | DCL_GS_INSTANCE_COUNT => {
            let _ = write!(out, "{name} {}", ops.raw(0));
        }
        DCL_INPUT_CONTROL_POINT_COUNT | DCL_OUTPUT_CONTROL_POINT_COUNT => {
            let _ = write!(out, "{name} {}", (token >> 11) & 0x3F);
        }
        DCL_THREAD_GROUP => {
            let _ = write!(out, "{name} {}, {}, {}", ops.raw(0), ops.raw(1), ops.raw(2));
        }
        DCL_GLOBAL_FLAGS => {
            let _ = write!(out, "{name} {}", global_flags((token >> 11) & 0x1FFF));
        }
        DCL_INDEXABLE_TEMP => {
            let _ = write!(out, "{name} x{}[{}], {}", ops.raw(0), ops.raw(1), ops.raw(2));
        }
        DCL_OUTPUT_TOPOLOGY => {
            let _ = write!(out, "{name} {}", topology((token >> 11) & 0x3F));
        }
        DCL_INPUT_PRIMITIVE => {
            let _ = write!(out, "{name} {}", primitive((token >> 11) & 0x3F));
        }
        DCL_RESOURCE => {
            let operand = ops.operand();
            let _ = write!(
                out,
                "dcl_resource_{} ({}) {operand}",
                dimension((token >> 11) & 0x1F),
                return_type(ops.raw(0))
            );
        }
        DCL_CONSTANT_BUFFER => {
            let access = if token & (1 << 11) != 0 {
                "dynamicIndexed"
            } else {
                "immediateIndexed"
            };
            let _ = write!(out, "{name} {}, {access}", ops.register());
        }
        DCL_SAMPLER => {
            let mode = match (token >> 11) & 0xF {
                1 => "mode_comparison",
                2 => "mode_mono",
                _ => "mode_default",
            };
            let _ = write!(out, "{name} {}, {mode}", ops.operand());
        }
        DCL_INPUT_PS | DCL_INPUT_PS_SGV | DCL_INPUT_PS_SIV => {
            let operand = ops.operand();
            let _ = write!(out, "{name} {} {operand}", interpolation((token >> 11) & 0xF));
            if opcode != DCL_INPUT_PS {
                let _ = write!(out, ", {}", system_value(ops.raw(0)));
            }
        }
        DCL_INPUT_SGV | DCL_INPUT_SIV | DCL_OUTPUT_SGV | DCL_OUTPUT_SIV => {
            let operand = ops.operand();
            let _ = write!(out, "{name} {operand}, {}", system_value(ops.raw(0)));
        }
        DCL_INDEX_RANGE => {
            let operand = ops.operand();
            let _ = write!(out, "{name} {operand}, {}", ops.raw(0));
        }
        _ => {
            out.push_str(name);
            out.push_str(&modifiers(opcode, token));
            if let Some([u, v, w]) = offsets {
                let _ = write!(out, "_aoffimmi({u},{v},{w})");
            }
            let mut first = true;
            while !ops.done() {
                out.push_str(if first { " " } else { ", " });
                first = false;
                out.push_str(&ops.operand());
            }
        }
    }
}

/// Mnemonic suffixes encoded in the opcode token.
fn modifiers(opcode: u32, token: u32) -> String {
    let mut suffix = String::new();
    if has_test(opcode) {
        suffix.push_str(if token & (1 << 18) != 0 { "_nz" } else { "_z" });
    } else if opcode == RESINFO {
        suffix.push_str(match (token >> 11) & 3 {
            1 => "_rcpFloat",
            2 => "_uint",
            _ => "",
        });
    } else if opcode == SYNC {
        for (bit, name) in [(14, "_uglobal"), (13, "_ugroup"), (12, "_g"), (11, "_t")] {
            if token & (1 << bit) != 0 {
                suffix.push_str(name);
            }
        }
    } else if !is_declaration(opcode) && token & (1 << 13) != 0 {
        suffix.push_str("_sat");
    }
    suffix
}

fn custom_data(tokens: &[u32], out: &mut String) {
    let class = tokens[0] >> 11;
    let data = tokens.get(2..).unwrap_or_default();
    if class == 3 {
        out.push_str("dcl_immediateConstantBuffer {");
        for (i, row) in data.chunks(4).enumerate() {
            out.push_str(if i == 0 { " " } else { ", " });
            let values: Vec<String> = row.iter().map(|v| format!("{v:#010x}")).collect();
            let _ = write!(out, "{{ {} }}", values.join(", "));
        }
        out.push_str(" }");
    } else {
        let _ = write!(out, "// customdata class {class}, {} dwords", data.len());
    }
}

/// Cursor over the operand tokens of one instruction.
struct Operands<'a> {
    tokens: &'a [u32],
    idx: usize,
}

impl Operands<'_> {
    fn done(&self) -> bool {
        self.idx >= self.tokens.len()
    }

    fn take(&mut self) -> u32 {
        let value = self.tokens.get(self.idx).copied().unwrap_or(0);
        self.idx += 1;
        value
    }

    /// Raw dword `n` positions past the cursor, for declarations with trailing values.
    fn raw(&self, n: usize) -> u32 {
        self.tokens.get(self.idx + n).copied().unwrap_or(0)
    }

    fn operand(&mut self) -> String {
        self.decode(true)
    }

    /// Operand without its component selection, as declarations print registers.
    fn register(&mut self) -> String {
        self.decode(false)
    }

    fn decode(&mut self, components: bool) -> String {
        let token = self.take();
        let num_components = token & 3;
        let selection = (token >> 2) & 3;
        let ty = (token >> 12) & 0xFF;
        let dims = ((token >> 20) & 3) as usize;
        let reps = [(token >> 22) & 7, (token >> 25) & 7, (token >> 28) & 7];

        let mut modifier = 0;
        if token & EXTENDED != 0 {
            let ext = self.take();
            if ext & 0x3F == 1 {
                modifier = (ext >> 6) & 0xFF;
            }
        }

        let text = match ty {
            OPERAND_IMMEDIATE32 => {
                let n = if num_components == 1 { 1 } else { 4 };
                let values: Vec<String> = (0..n).map(|_| immediate32(self.take())).collect();
                return format!("l({})", values.join(", "));
            }
            OPERAND_IMMEDIATE64 => {
                let n = if num_components == 1 { 1 } else { 2 };
                let values: Vec<String> = (0..n)
                    .map(|_| {
                        let lo = u64::from(self.take());
                        let hi = u64::from(self.take());
                        format!("{:?}", f64::from_bits(lo | hi << 32))
                    })
                    .collect();
                return format!("d({})", values.join(", "));
            }
            _ => {
                let mut text = operand_prefix(ty).to_owned();
                for (dim, rep) in reps.iter().take(dims).enumerate() {
                    let index = self.index(*rep);
                    if dim == 0 && *rep <= 1 {
                        text.push_str(&index);
                    } else {
                        let _ = write!(text, "[{index}]");
                    }
                }
                text
            }
        };

        let text = if components && num_components == 2 {
            match selection {
                0 => {
                    let mask = (token >> 4) & 0xF;
                    if mask == 0 {
                        text
                    } else {
                        let letters: String = (0..4)
                            .filter(|bit| mask & (1 << bit) != 0)
                            .map(component)
                            .collect();
                        format!("{text}.{letters}")
                    }
                }
                1 => {
                    let letters: String =
                        (0..4).map(|i| component(token >> (4 + i * 2))).collect();
                    format!("{text}.{letters}")
                }
                _ => format!("{text}.{}", component(token >> 4)),
            }
        } else {
            text
        };

        match modifier {
            1 => format!("-{text}"),
            2 => format!("|{text}|"),
            3 => format!("-|{text}|"),
            _ => text,
        }
    }

    fn index(&mut self, representation: u32) -> String {
        match representation {
            0 => self.take().to_string(),
            1 => {
                let hi = u64::from(self.take());
                let lo = u64::from(self.take());
                (hi << 32 | lo).to_string()
            }
            2 => self.operand(),
            3 => {
                let offset = self.take();
                format!("{} + {offset}", self.operand())
            }
            _ => {
                let hi = u64::from(self.take());
                let lo = u64::from(self.take());
                format!("{} + {}", self.operand(), hi << 32 | lo)
            }
        }
    }
}

/// Small integers print as integers, anything else as the float with the same bits.
fn immediate32(bits: u32) -> String {
    let int = bits as i32;
    if (-0x1_0000..=0x1_0000).contains(&int) {
        int.to_string()
    } else {
        format!("{:?}", f32::from_bits(bits))
    }
}

/// Sign-extended 4-bit texel offset.
fn nibble(bits: u32) -> i8 {
    (((bits & 0xF) as u8) << 4) as i8 >> 4
}

fn operand_prefix(ty: u32) -> &'static str {
    match ty {
        0 => "r",
        1 => "v",
        2 => "o",
        3 => "x",
        6 => "s",
        7 => "t",
        8 => "cb",
        9 => "icb",
        10 => "l",
        11 => "vPrim",
        12 => "oDepth",
        13 => "null",
        14 => "rasterizer",
        15 => "oMask",
        16 => "m",
        17 => "fb",
        18 => "ft",
        19 => "fp",
        20 => "fi",
        21 => "fo",
        22 => "vOutputControlPointID",
        23 => "vForkInstanceID",
        24 => "vJoinInstanceID",
        25 => "vicp",
        26 => "vocp",
        27 => "vpc",
        28 => "vDomain",
        29 => "this",
        30 => "u",
        31 => "g",
        32 => "vThreadID",
        33 => "vThreadGroupID",
        34 => "vThreadIDInGroup",
        35 => "vCoverage",
        36 => "vThreadIDInGroupFlattened",
        37 => "vGSInstanceID",
        38 => "oDepthGE",
        39 => "oDepthLE",
        40 => "vCycleCounter",
        _ => "?",
    }
}

fn global_flags(flags: u32) -> String {
    let names = [
        "refactoringAllowed",
        "enableDoublePrecisionFloatOps",
        "forceEarlyDepthStencil",
        "enableRawAndStructuredBuffers",
    ];
    let mut set: Vec<String> = names
        .iter()
        .enumerate()
        .filter(|(bit, _)| flags & (1 << bit) != 0)
        .map(|(_, name)| (*name).to_owned())
        .collect();
    let rest = flags & !0xF;
    if rest != 0 {
        set.push(format!("{rest:#x}"));
    }
    if set.is_empty() {
        "0".to_owned()
    } else {
        set.join(" | ")
    }
}

fn dimension(raw: u32) -> String {
    let name = match raw {
        1 => "buffer",
        2 => "texture1d",
        3 => "texture2d",
        4 => "texture2dms",
        5 => "texture3d",
        6 => "texturecube",
        7 => "texture1darray",
        8 => "texture2darray",
        9 => "texture2dmsarray",
        10 => "texturecubearray",
        other => return format!("dim{other}"),
    };
    name.to_owned()
}

fn return_type(token: u32) -> String {
    let names: Vec<&str> = (0..4)
        .map(|i| match (token >> (i * 4)) & 0xF {
            1 => "unorm",
            2 => "snorm",
            3 => "sint",
            4 => "uint",
            5 => "float",
            6 => "mixed",
            7 => "double",
            8 => "continued",
            _ => "unused",
        })
        .collect();
    names.join(",")
}

fn interpolation(raw: u32) -> &'static str {
    match raw {
        1 => "constant",
        2 => "linear",
        3 => "linear centroid",
        4 => "linear noperspective",
        5 => "linear noperspective centroid",
        6 => "linear sample",
        7 => "linear noperspective sample",
        _ => "undefined",
    }
}

fn system_value(raw: u32) -> String {
    let name = match raw {
        1 => "position",
        2 => "clip_distance",
        3 => "cull_distance",
        4 => "rendertarget_array_index",
        5 => "viewport_array_index",
        6 => "vertex_id",
        7 => "primitive_id",
        8 => "instance_id",
        9 => "is_front_face",
        10 => "sampleIndex",
        other => return format!("sv{other}"),
    };
    name.to_owned()
}

fn topology(raw: u32) -> String {
    let name = match raw {
        1 => "pointlist",
        2 => "linelist",
        3 => "linestrip",
        4 => "trianglelist",
        5 => "trianglestrip",
        other => return other.to_string(),
    };
    name.to_owned()
}

fn primitive(raw: u32) -> String {
    let name = match raw {
        1 => "point",
        2 => "line",
        3 => "triangle",
        6 => "lineadj",
        7 => "triangleadj",
        other => return other.to_string(),
    };
    name.to_owned()
}

#[cfg(test)]
mod tests {
    use crate::shader::dxbc::tests::container;
    use crate::shader::tests::bytes;
    use crate::shader::{render, ShaderFormat};
    use pretty_assertions::assert_eq;

    fn text(program: &[u32]) -> String {
        render(ShaderFormat::Dxbc, &container(&[(b"SHDR", bytes(program))]))
    }

    #[test]
    fn vs_4_0_passthrough() {
        let program = [
            0x0001_0040,
            14,
            // dcl_input v0.xyzw
            0x0300_005F,
            0x0010_10F2,
            0,
            // dcl_output o0.xyzw
            0x0300_0065,
            0x0010_20F2,
            0,
            // mov o0.xyzw, v0.xyzw
            0x0500_0036,
            0x0010_20F2,
            0,
            0x0010_1E46,
            0,
            // ret
            0x0100_003E,
        ];
        assert_eq!(
            text(&program),
            "// DXBC chunks: SHDR\n\
             vs_4_0\n\
             dcl_input v0.xyzw\n\
             dcl_output o0.xyzw\n\
             mov o0.xyzw, v0.xyzw\n\
             ret\n"
        );
    }

    #[test]
    fn ps_4_0_constants_and_modifiers() {
        let program = [
            0x0000_0040,
            18,
            // dcl_constantbuffer cb0[1], immediateIndexed
            0x0400_0059,
            0x0020_8E46,
            0,
            1,
            // dcl_temps 1
            0x0200_0068,
            1,
            // mul_sat r0.xy, -cb0[0].xyxx, l(0.5)
            0x0900_2038,
            0x0010_0032,
            0,
            0x8020_8046,
            0x0000_0041,
            0,
            0,
            0x0000_4001,
            0x3F00_0000,
            // ret
            0x0100_003E,
        ];
        let text = text(&program);
        assert!(text.contains("dcl_constantbuffer cb0[1], immediateIndexed\n"), "{text}");
        assert!(text.contains("dcl_temps 1\n"), "{text}");
        assert!(text.contains("mul_sat r0.xy, -cb0[0].xyxx, l(0.5)\n"), "{text}");
        assert!(text.ends_with("ret\n"));
    }

    #[test]
    fn truncated_program_is_dumped() {
        // ret claims two tokens but the program ends after one.
        let text = text(&[0x0001_0040, 3, 0x0200_003E]);
        assert!(text.contains("vs_4_0\n"));
        assert!(text.contains("// instruction at token 2 needs 2 tokens, 1 left\n"));
    }
}
