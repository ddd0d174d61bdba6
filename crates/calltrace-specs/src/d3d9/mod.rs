//! Direct3D 9 / 9Ex tables and their tracing hooks.
//!
//! Shader token streams are recorded as text, and the lock/unlock protocol of buffers,
//! surfaces and volumes copies whatever the application wrote through the locked pointer
//! into the unlock record.

mod lock;
mod size;

use calltrace_api::{ApiBuilder, Callable, EnumDef, FlagsDef, Primitive, StructDef, Type};
use calltrace_gen::{ArgEncoding, Hooks, ShaderFormat};

use crate::winapi::{
    self, bool_, dword, float, handle, hdc, hmonitor, hresult, hwnd, int, large_integer, lpcwstr,
    out_object, out_unknown, refguid, refiid, uint, word,
};

pub use lock::{D3DLOCK_READONLY, LOCKED_PTR, LOCKED_SIZE};
pub use size::helpers;

pub const D3DERR_NOTAVAILABLE: i64 = 0x8876_086A_u32 as i32 as i64;
pub const D3DERR_INVALIDCALL: i64 = 0x8876_086C_u32 as i32 as i64;

const IIDS: &[(&str, &str)] = &[
    ("IDirect3D9", "81bdcbca-64d4-426d-ae8d-ad0147f4275c"),
    ("IDirect3DDevice9", "d0223b96-bf7a-43fd-92bd-a43b0d82b9eb"),
    ("IDirect3DStateBlock9", "b07c4fe5-310d-4ba8-a23c-4f0f206f218b"),
    ("IDirect3DSwapChain9", "794950f2-adfc-458a-905e-10a10b0b503b"),
    ("IDirect3DResource9", "05eec05d-8f7d-4362-b999-d1baf357c704"),
    ("IDirect3DVertexDeclaration9", "dd13c59c-36fa-4098-a8fb-c7ed39dc8546"),
    ("IDirect3DVertexShader9", "efc5557e-6265-4613-8a94-43857889eb36"),
    ("IDirect3DPixelShader9", "6d3bdbdc-5b02-4415-b852-ce5e8bccb289"),
    ("IDirect3DBaseTexture9", "580ca87e-1d3c-4d54-991d-b7d3e3c298ce"),
    ("IDirect3DTexture9", "85c31227-3de5-4f00-9b3a-f11ac38c18b5"),
    ("IDirect3DVolumeTexture9", "2518526c-e789-4111-a7b9-47ef328d13e6"),
    ("IDirect3DCubeTexture9", "fff32f81-d953-473a-9223-93d652aba93f"),
    ("IDirect3DVertexBuffer9", "b64bb1b5-fd70-4df6-bf91-19d0a12455e3"),
    ("IDirect3DIndexBuffer9", "7c9dd65e-d3f7-4529-acee-785830acde35"),
    ("IDirect3DSurface9", "0cfbaf3a-9ff6-429a-99b3-a2796af8b89b"),
    ("IDirect3DVolume9", "24f416e6-1f67-4aa7-b88e-d33f6f3128a1"),
    ("IDirect3DQuery9", "d9771460-a695-4f26-bbd3-27b840b541cc"),
    ("IDirect3D9Ex", "02177241-69fc-400c-8ff1-93a44df6861d"),
    ("IDirect3DDevice9Ex", "b18b10ce-2649-405a-870f-95f777d4313a"),
    ("IDirect3DSwapChain9Ex", "91886caf-1c3d-4d2e-a0ab-3e4c7d8d3303"),
];

/// D3DFMT_DXT1..DXT5 as FOURCC codes.
pub const DXT_FORMATS: [u32; 5] = [
    u32::from_le_bytes(*b"DXT1"),
    u32::from_le_bytes(*b"DXT2"),
    u32::from_le_bytes(*b"DXT3"),
    u32::from_le_bytes(*b"DXT4"),
    u32::from_le_bytes(*b"DXT5"),
];

fn e(name: &str) -> Type {
    Type::enumeration(name)
}

fn f(name: &str) -> Type {
    Type::flags(name)
}

fn s(name: &str) -> Type {
    Type::structure(name)
}

fn in_struct(name: &str) -> Type {
    Type::const_ptr(s(name))
}

fn out_struct(name: &str) -> Type {
    Type::ptr(s(name))
}

fn obj(name: &str) -> Type {
    Type::object(name)
}

fn m(ret: Type, name: &str) -> Callable {
    Callable::new(ret, name)
}

fn d3dcolor() -> Type {
    Type::alias("D3DCOLOR", dword())
}

fn state_value(name: &str) -> Type {
    Type::alias(name, dword())
}

/// Vertex or pixel shader token stream, sized by walking to the end token.
pub fn shader_type() -> Type {
    Type::alias(
        "D3DSHADER9",
        Type::blob(Type::prim(Primitive::U32), "_shaderSize(pFunction)"),
    )
}

fn is_shader(ty: &Type) -> bool {
    matches!(ty, Type::Alias { name, .. } if name == "D3DSHADER9")
}

fn enums(b: &mut ApiBuilder) {
    let u32_ = Primitive::U32;
    b.enumeration(EnumDef::with_values("D3DADAPTER", u32_, &[("D3DADAPTER_DEFAULT", 0)]))
        .enumeration(EnumDef::with_values("D3DENUM", u32_, &[("D3DENUM_WHQL_LEVEL", 2)]))
        .enumeration(EnumDef::with_values(
            "D3DDEVTYPE",
            u32_,
            &[
                ("D3DDEVTYPE_HAL", 1),
                ("D3DDEVTYPE_REF", 2),
                ("D3DDEVTYPE_SW", 3),
                ("D3DDEVTYPE_NULLREF", 4),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DFORMAT",
            u32_,
            &[
                ("D3DFMT_UNKNOWN", 0),
                ("D3DFMT_R8G8B8", 20),
                ("D3DFMT_A8R8G8B8", 21),
                ("D3DFMT_X8R8G8B8", 22),
                ("D3DFMT_R5G6B5", 23),
                ("D3DFMT_X1R5G5B5", 24),
                ("D3DFMT_A1R5G5B5", 25),
                ("D3DFMT_A4R4G4B4", 26),
                ("D3DFMT_A8", 28),
                ("D3DFMT_A2B10G10R10", 31),
                ("D3DFMT_A8B8G8R8", 32),
                ("D3DFMT_X8B8G8R8", 33),
                ("D3DFMT_G16R16", 34),
                ("D3DFMT_A2R10G10B10", 35),
                ("D3DFMT_A16B16G16R16", 36),
                ("D3DFMT_L8", 50),
                ("D3DFMT_A8L8", 51),
                ("D3DFMT_D16_LOCKABLE", 70),
                ("D3DFMT_D32", 71),
                ("D3DFMT_D15S1", 73),
                ("D3DFMT_D24S8", 75),
                ("D3DFMT_D24X8", 77),
                ("D3DFMT_D16", 80),
                ("D3DFMT_D32F_LOCKABLE", 82),
                ("D3DFMT_D24FS8", 83),
                ("D3DFMT_VERTEXDATA", 100),
                ("D3DFMT_INDEX16", 101),
                ("D3DFMT_INDEX32", 102),
                ("D3DFMT_R16F", 111),
                ("D3DFMT_G16R16F", 112),
                ("D3DFMT_A16B16G16R16F", 113),
                ("D3DFMT_R32F", 114),
                ("D3DFMT_G32R32F", 115),
                ("D3DFMT_A32B32G32R32F", 116),
                ("D3DFMT_DXT1", DXT_FORMATS[0] as i64),
                ("D3DFMT_DXT2", DXT_FORMATS[1] as i64),
                ("D3DFMT_DXT3", DXT_FORMATS[2] as i64),
                ("D3DFMT_DXT4", DXT_FORMATS[3] as i64),
                ("D3DFMT_DXT5", DXT_FORMATS[4] as i64),
            ],
        ))
        .enumeration(EnumDef::sequential(
            "D3DPOOL",
            u32_,
            &[
                "D3DPOOL_DEFAULT",
                "D3DPOOL_MANAGED",
                "D3DPOOL_SYSTEMMEM",
                "D3DPOOL_SCRATCH",
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DRESOURCETYPE",
            u32_,
            &[
                ("D3DRTYPE_SURFACE", 1),
                ("D3DRTYPE_VOLUME", 2),
                ("D3DRTYPE_TEXTURE", 3),
                ("D3DRTYPE_VOLUMETEXTURE", 4),
                ("D3DRTYPE_CUBETEXTURE", 5),
                ("D3DRTYPE_VERTEXBUFFER", 6),
                ("D3DRTYPE_INDEXBUFFER", 7),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DPRIMITIVETYPE",
            u32_,
            &[
                ("D3DPT_POINTLIST", 1),
                ("D3DPT_LINELIST", 2),
                ("D3DPT_LINESTRIP", 3),
                ("D3DPT_TRIANGLELIST", 4),
                ("D3DPT_TRIANGLESTRIP", 5),
                ("D3DPT_TRIANGLEFAN", 6),
            ],
        ))
        .enumeration(EnumDef::sequential(
            "D3DMULTISAMPLE_TYPE",
            u32_,
            &[
                "D3DMULTISAMPLE_NONE",
                "D3DMULTISAMPLE_NONMASKABLE",
                "D3DMULTISAMPLE_2_SAMPLES",
                "D3DMULTISAMPLE_3_SAMPLES",
                "D3DMULTISAMPLE_4_SAMPLES",
                "D3DMULTISAMPLE_5_SAMPLES",
                "D3DMULTISAMPLE_6_SAMPLES",
                "D3DMULTISAMPLE_7_SAMPLES",
                "D3DMULTISAMPLE_8_SAMPLES",
                "D3DMULTISAMPLE_9_SAMPLES",
                "D3DMULTISAMPLE_10_SAMPLES",
                "D3DMULTISAMPLE_11_SAMPLES",
                "D3DMULTISAMPLE_12_SAMPLES",
                "D3DMULTISAMPLE_13_SAMPLES",
                "D3DMULTISAMPLE_14_SAMPLES",
                "D3DMULTISAMPLE_15_SAMPLES",
                "D3DMULTISAMPLE_16_SAMPLES",
            ],
        ))
        .enumeration(EnumDef::sequential(
            "D3DBACKBUFFER_TYPE",
            u32_,
            &[
                "D3DBACKBUFFER_TYPE_MONO",
                "D3DBACKBUFFER_TYPE_LEFT",
                "D3DBACKBUFFER_TYPE_RIGHT",
            ],
        ))
        .enumeration(EnumDef::sequential(
            "D3DCUBEMAP_FACES",
            u32_,
            &[
                "D3DCUBEMAP_FACE_POSITIVE_X",
                "D3DCUBEMAP_FACE_NEGATIVE_X",
                "D3DCUBEMAP_FACE_POSITIVE_Y",
                "D3DCUBEMAP_FACE_NEGATIVE_Y",
                "D3DCUBEMAP_FACE_POSITIVE_Z",
                "D3DCUBEMAP_FACE_NEGATIVE_Z",
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DTEXTUREFILTERTYPE",
            u32_,
            &[
                ("D3DTEXF_NONE", 0),
                ("D3DTEXF_POINT", 1),
                ("D3DTEXF_LINEAR", 2),
                ("D3DTEXF_ANISOTROPIC", 3),
                ("D3DTEXF_PYRAMIDALQUAD", 6),
                ("D3DTEXF_GAUSSIANQUAD", 7),
                ("D3DTEXF_CONVOLUTIONMONO", 8),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DSTATEBLOCKTYPE",
            u32_,
            &[("D3DSBT_ALL", 1), ("D3DSBT_PIXELSTATE", 2), ("D3DSBT_VERTEXSTATE", 3)],
        ))
        .enumeration(EnumDef::with_values(
            "D3DQUERYTYPE",
            u32_,
            &[
                ("D3DQUERYTYPE_VCACHE", 4),
                ("D3DQUERYTYPE_RESOURCEMANAGER", 5),
                ("D3DQUERYTYPE_VERTEXSTATS", 6),
                ("D3DQUERYTYPE_EVENT", 8),
                ("D3DQUERYTYPE_OCCLUSION", 9),
                ("D3DQUERYTYPE_TIMESTAMP", 10),
                ("D3DQUERYTYPE_TIMESTAMPDISJOINT", 11),
                ("D3DQUERYTYPE_TIMESTAMPFREQ", 12),
                ("D3DQUERYTYPE_PIPELINETIMINGS", 13),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DDISPLAYROTATION",
            u32_,
            &[
                ("D3DDISPLAYROTATION_IDENTITY", 1),
                ("D3DDISPLAYROTATION_90", 2),
                ("D3DDISPLAYROTATION_180", 3),
                ("D3DDISPLAYROTATION_270", 4),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DCOMPOSERECTSOP",
            u32_,
            &[
                ("D3DCOMPOSERECTS_COPY", 1),
                ("D3DCOMPOSERECTS_OR", 2),
                ("D3DCOMPOSERECTS_AND", 3),
                ("D3DCOMPOSERECTS_NEG", 4),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DSWAPEFFECT",
            u32_,
            &[
                ("D3DSWAPEFFECT_DISCARD", 1),
                ("D3DSWAPEFFECT_FLIP", 2),
                ("D3DSWAPEFFECT_COPY", 3),
                ("D3DSWAPEFFECT_OVERLAY", 4),
                ("D3DSWAPEFFECT_FLIPEX", 5),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DLIGHTTYPE",
            u32_,
            &[
                ("D3DLIGHT_POINT", 1),
                ("D3DLIGHT_SPOT", 2),
                ("D3DLIGHT_DIRECTIONAL", 3),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DTRANSFORMSTATETYPE",
            u32_,
            &[
                ("D3DTS_VIEW", 2),
                ("D3DTS_PROJECTION", 3),
                ("D3DTS_TEXTURE0", 16),
                ("D3DTS_TEXTURE1", 17),
                ("D3DTS_TEXTURE2", 18),
                ("D3DTS_TEXTURE3", 19),
                ("D3DTS_TEXTURE4", 20),
                ("D3DTS_TEXTURE5", 21),
                ("D3DTS_TEXTURE6", 22),
                ("D3DTS_TEXTURE7", 23),
                ("D3DTS_WORLD", 256),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DRENDERSTATETYPE",
            u32_,
            &[
                ("D3DRS_ZENABLE", 7),
                ("D3DRS_FILLMODE", 8),
                ("D3DRS_SHADEMODE", 9),
                ("D3DRS_ZWRITEENABLE", 14),
                ("D3DRS_ALPHATESTENABLE", 15),
                ("D3DRS_LASTPIXEL", 16),
                ("D3DRS_SRCBLEND", 19),
                ("D3DRS_DESTBLEND", 20),
                ("D3DRS_CULLMODE", 22),
                ("D3DRS_ZFUNC", 23),
                ("D3DRS_ALPHAREF", 24),
                ("D3DRS_ALPHAFUNC", 25),
                ("D3DRS_DITHERENABLE", 26),
                ("D3DRS_ALPHABLENDENABLE", 27),
                ("D3DRS_FOGENABLE", 28),
                ("D3DRS_SPECULARENABLE", 29),
                ("D3DRS_FOGCOLOR", 34),
                ("D3DRS_STENCILENABLE", 52),
                ("D3DRS_STENCILFAIL", 53),
                ("D3DRS_STENCILZFAIL", 54),
                ("D3DRS_STENCILPASS", 55),
                ("D3DRS_STENCILFUNC", 56),
                ("D3DRS_STENCILREF", 57),
                ("D3DRS_STENCILMASK", 58),
                ("D3DRS_STENCILWRITEMASK", 59),
                ("D3DRS_TEXTUREFACTOR", 60),
                ("D3DRS_LIGHTING", 137),
                ("D3DRS_AMBIENT", 139),
                ("D3DRS_COLORVERTEX", 141),
                ("D3DRS_NORMALIZENORMALS", 143),
                ("D3DRS_POINTSIZE", 154),
                ("D3DRS_MULTISAMPLEANTIALIAS", 161),
                ("D3DRS_COLORWRITEENABLE", 168),
                ("D3DRS_BLENDOP", 171),
                ("D3DRS_SCISSORTESTENABLE", 174),
                ("D3DRS_SLOPESCALEDEPTHBIAS", 175),
                ("D3DRS_SRGBWRITEENABLE", 194),
                ("D3DRS_DEPTHBIAS", 195),
                ("D3DRS_SEPARATEALPHABLENDENABLE", 206),
                ("D3DRS_SRCBLENDALPHA", 207),
                ("D3DRS_DESTBLENDALPHA", 208),
                ("D3DRS_BLENDOPALPHA", 209),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DSAMPLERSTATETYPE",
            u32_,
            &[
                ("D3DSAMP_ADDRESSU", 1),
                ("D3DSAMP_ADDRESSV", 2),
                ("D3DSAMP_ADDRESSW", 3),
                ("D3DSAMP_BORDERCOLOR", 4),
                ("D3DSAMP_MAGFILTER", 5),
                ("D3DSAMP_MINFILTER", 6),
                ("D3DSAMP_MIPFILTER", 7),
                ("D3DSAMP_MIPMAPLODBIAS", 8),
                ("D3DSAMP_MAXMIPLEVEL", 9),
                ("D3DSAMP_MAXANISOTROPY", 10),
                ("D3DSAMP_SRGBTEXTURE", 11),
                ("D3DSAMP_ELEMENTINDEX", 12),
                ("D3DSAMP_DMAPOFFSET", 13),
            ],
        ))
        .enumeration(EnumDef::with_values(
            "D3DTEXTURESTAGESTATETYPE",
            u32_,
            &[
                ("D3DTSS_COLOROP", 1),
                ("D3DTSS_COLORARG1", 2),
                ("D3DTSS_COLORARG2", 3),
                ("D3DTSS_ALPHAOP", 4),
                ("D3DTSS_ALPHAARG1", 5),
                ("D3DTSS_ALPHAARG2", 6),
                ("D3DTSS_BUMPENVMAT00", 7),
                ("D3DTSS_BUMPENVMAT01", 8),
                ("D3DTSS_BUMPENVMAT10", 9),
                ("D3DTSS_BUMPENVMAT11", 10),
                ("D3DTSS_TEXCOORDINDEX", 11),
                ("D3DTSS_BUMPENVLSCALE", 22),
                ("D3DTSS_BUMPENVLOFFSET", 23),
                ("D3DTSS_TEXTURETRANSFORMFLAGS", 24),
                ("D3DTSS_COLORARG0", 26),
                ("D3DTSS_ALPHAARG0", 27),
                ("D3DTSS_RESULTARG", 28),
                ("D3DTSS_CONSTANT", 32),
            ],
        ));
}

fn flags(b: &mut ApiBuilder) {
    let u32_ = Primitive::U32;
    b.flags(FlagsDef::with_bits(
        "D3DLOCK",
        u32_,
        &[
            ("D3DLOCK_READONLY", D3DLOCK_READONLY),
            ("D3DLOCK_NOSYSLOCK", 0x800),
            ("D3DLOCK_NOOVERWRITE", 0x1000),
            ("D3DLOCK_DISCARD", 0x2000),
            ("D3DLOCK_DONOTWAIT", 0x4000),
            ("D3DLOCK_NO_DIRTY_UPDATE", 0x8000),
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3DUSAGE",
        u32_,
        &[
            ("D3DUSAGE_RENDERTARGET", 0x1),
            ("D3DUSAGE_DEPTHSTENCIL", 0x2),
            ("D3DUSAGE_WRITEONLY", 0x8),
            ("D3DUSAGE_SOFTWAREPROCESSING", 0x10),
            ("D3DUSAGE_DONOTCLIP", 0x20),
            ("D3DUSAGE_POINTS", 0x40),
            ("D3DUSAGE_RTPATCHES", 0x80),
            ("D3DUSAGE_NPATCHES", 0x100),
            ("D3DUSAGE_DYNAMIC", 0x200),
            ("D3DUSAGE_AUTOGENMIPMAP", 0x400),
            ("D3DUSAGE_DMAP", 0x4000),
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3DCREATE",
        u32_,
        &[
            ("D3DCREATE_FPU_PRESERVE", 0x2),
            ("D3DCREATE_MULTITHREADED", 0x4),
            ("D3DCREATE_PUREDEVICE", 0x10),
            ("D3DCREATE_SOFTWARE_VERTEXPROCESSING", 0x20),
            ("D3DCREATE_HARDWARE_VERTEXPROCESSING", 0x40),
            ("D3DCREATE_MIXED_VERTEXPROCESSING", 0x80),
            ("D3DCREATE_DISABLE_DRIVER_MANAGEMENT", 0x100),
            ("D3DCREATE_ADAPTERGROUP_DEVICE", 0x200),
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3DCLEAR",
        u32_,
        &[
            ("D3DCLEAR_TARGET", 0x1),
            ("D3DCLEAR_ZBUFFER", 0x2),
            ("D3DCLEAR_STENCIL", 0x4),
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3DFVF",
        u32_,
        &[
            ("D3DFVF_XYZ", 0x2),
            ("D3DFVF_XYZRHW", 0x4),
            ("D3DFVF_NORMAL", 0x10),
            ("D3DFVF_PSIZE", 0x20),
            ("D3DFVF_DIFFUSE", 0x40),
            ("D3DFVF_SPECULAR", 0x80),
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3DSGR",
        u32_,
        &[("D3DSGR_NO_CALIBRATION", 0), ("D3DSGR_CALIBRATE", 1)],
    ))
    .flags(FlagsDef::with_bits(
        "D3DPRESENT",
        u32_,
        &[
            ("D3DPRESENT_DONOTWAIT", 0x1),
            ("D3DPRESENT_LINEAR_CONTENT", 0x2),
            ("D3DPRESENT_DONOTFLIP", 0x4),
            ("D3DPRESENT_FLIPRESTART", 0x8),
            ("D3DPRESENT_VIDEO_RESTRICT_TO_MONITOR", 0x10),
        ],
    ))
    .flags(FlagsDef::with_bits("D3DISSUE", u32_, &[("D3DISSUE_END", 1), ("D3DISSUE_BEGIN", 2)]));

    // Single-bit tables take the next free bit.
    for (name, bit) in [
        ("D3DSPD", "D3DSPD_IUNKNOWN"),
        ("D3DCURSOR", "D3DCURSOR_IMMEDIATE_UPDATE"),
        ("D3DGETDATA", "D3DGETDATA_FLUSH"),
        ("D3DPV", "D3DPV_DONOTCOPYDATA"),
    ] {
        let mut def = FlagsDef::new(name, u32_);
        def.push(bit, None);
        b.flags(def);
    }
}

fn structs(b: &mut ApiBuilder) {
    b.structure(StructDef::new(
        "D3DVERTEXELEMENT9",
        vec![
            (word(), "Stream"),
            (word(), "Offset"),
            (winapi::byte(), "Type"),
            (winapi::byte(), "Method"),
            (winapi::byte(), "Usage"),
            (winapi::byte(), "UsageIndex"),
        ],
    ))
    .structure(StructDef::new(
        "D3DVIEWPORT9",
        vec![
            (dword(), "X"),
            (dword(), "Y"),
            (dword(), "Width"),
            (dword(), "Height"),
            (float(), "MinZ"),
            (float(), "MaxZ"),
        ],
    ))
    .structure(StructDef::new("D3DMATRIX", vec![(Type::array(float(), "16"), "m")]))
    .structure(StructDef::new(
        "D3DRECT",
        vec![
            (winapi::long(), "x1"),
            (winapi::long(), "y1"),
            (winapi::long(), "x2"),
            (winapi::long(), "y2"),
        ],
    ))
    .structure(StructDef::new(
        "D3DPRESENT_PARAMETERS",
        vec![
            (uint(), "BackBufferWidth"),
            (uint(), "BackBufferHeight"),
            (e("D3DFORMAT"), "BackBufferFormat"),
            (uint(), "BackBufferCount"),
            (e("D3DMULTISAMPLE_TYPE"), "MultiSampleType"),
            (dword(), "MultiSampleQuality"),
            (e("D3DSWAPEFFECT"), "SwapEffect"),
            (hwnd(), "hDeviceWindow"),
            (bool_(), "Windowed"),
            (bool_(), "EnableAutoDepthStencil"),
            (e("D3DFORMAT"), "AutoDepthStencilFormat"),
            (dword(), "Flags"),
            (uint(), "FullScreen_RefreshRateInHz"),
            (uint(), "PresentationInterval"),
        ],
    ))
    .structure(StructDef::new(
        "D3DDISPLAYMODE",
        vec![
            (uint(), "Width"),
            (uint(), "Height"),
            (uint(), "RefreshRate"),
            (e("D3DFORMAT"), "Format"),
        ],
    ))
    .structure(StructDef::new(
        "D3DDISPLAYMODEEX",
        vec![
            (uint(), "Size"),
            (uint(), "Width"),
            (uint(), "Height"),
            (uint(), "RefreshRate"),
            (e("D3DFORMAT"), "Format"),
            (dword(), "ScanLineOrdering"),
        ],
    ))
    .structure(StructDef::new(
        "D3DDISPLAYMODEFILTER",
        vec![
            (uint(), "Size"),
            (e("D3DFORMAT"), "Format"),
            (dword(), "ScanLineOrdering"),
        ],
    ))
    .structure(StructDef::new(
        "D3DSURFACE_DESC",
        vec![
            (e("D3DFORMAT"), "Format"),
            (e("D3DRESOURCETYPE"), "Type"),
            (f("D3DUSAGE"), "Usage"),
            (e("D3DPOOL"), "Pool"),
            (e("D3DMULTISAMPLE_TYPE"), "MultiSampleType"),
            (dword(), "MultiSampleQuality"),
            (uint(), "Width"),
            (uint(), "Height"),
        ],
    ))
    .structure(StructDef::new(
        "D3DVOLUME_DESC",
        vec![
            (e("D3DFORMAT"), "Format"),
            (e("D3DRESOURCETYPE"), "Type"),
            (f("D3DUSAGE"), "Usage"),
            (e("D3DPOOL"), "Pool"),
            (uint(), "Width"),
            (uint(), "Height"),
            (uint(), "Depth"),
        ],
    ))
    .structure(StructDef::new(
        "D3DVERTEXBUFFER_DESC",
        vec![
            (e("D3DFORMAT"), "Format"),
            (e("D3DRESOURCETYPE"), "Type"),
            (f("D3DUSAGE"), "Usage"),
            (e("D3DPOOL"), "Pool"),
            (uint(), "Size"),
            (f("D3DFVF"), "FVF"),
        ],
    ))
    .structure(StructDef::new(
        "D3DINDEXBUFFER_DESC",
        vec![
            (e("D3DFORMAT"), "Format"),
            (e("D3DRESOURCETYPE"), "Type"),
            (f("D3DUSAGE"), "Usage"),
            (e("D3DPOOL"), "Pool"),
            (uint(), "Size"),
        ],
    ))
    .structure(StructDef::new(
        "D3DLOCKED_RECT",
        vec![(int(), "Pitch"), (Type::opaque_ptr(), "pBits")],
    ))
    .structure(StructDef::new(
        "D3DLOCKED_BOX",
        vec![
            (int(), "RowPitch"),
            (int(), "SlicePitch"),
            (Type::opaque_ptr(), "pBits"),
        ],
    ))
    .structure(StructDef::new(
        "D3DBOX",
        vec![
            (uint(), "Left"),
            (uint(), "Top"),
            (uint(), "Right"),
            (uint(), "Bottom"),
            (uint(), "Front"),
            (uint(), "Back"),
        ],
    ))
    .structure(StructDef::new(
        "D3DCOLORVALUE",
        vec![(float(), "r"), (float(), "g"), (float(), "b"), (float(), "a")],
    ))
    .structure(StructDef::new(
        "D3DVECTOR",
        vec![(float(), "x"), (float(), "y"), (float(), "z")],
    ))
    .structure(StructDef::new(
        "D3DMATERIAL9",
        vec![
            (s("D3DCOLORVALUE"), "Diffuse"),
            (s("D3DCOLORVALUE"), "Ambient"),
            (s("D3DCOLORVALUE"), "Specular"),
            (s("D3DCOLORVALUE"), "Emissive"),
            (float(), "Power"),
        ],
    ))
    .structure(StructDef::new(
        "D3DLIGHT9",
        vec![
            (e("D3DLIGHTTYPE"), "Type"),
            (s("D3DCOLORVALUE"), "Diffuse"),
            (s("D3DCOLORVALUE"), "Specular"),
            (s("D3DCOLORVALUE"), "Ambient"),
            (s("D3DVECTOR"), "Position"),
            (s("D3DVECTOR"), "Direction"),
            (float(), "Range"),
            (float(), "Falloff"),
            (float(), "Attenuation0"),
            (float(), "Attenuation1"),
            (float(), "Attenuation2"),
            (float(), "Theta"),
            (float(), "Phi"),
        ],
    ))
    .structure(StructDef::new(
        "D3DCLIPSTATUS9",
        vec![(dword(), "ClipUnion"), (dword(), "ClipIntersection")],
    ))
    .structure(StructDef::new(
        "D3DRASTER_STATUS",
        vec![(bool_(), "InVBlank"), (uint(), "ScanLine")],
    ))
    .structure(StructDef::new(
        "D3DGAMMARAMP",
        vec![
            (Type::array(word(), "256"), "red"),
            (Type::array(word(), "256"), "green"),
            (Type::array(word(), "256"), "blue"),
        ],
    ))
    .structure(StructDef::new(
        "D3DDEVICE_CREATION_PARAMETERS",
        vec![
            (uint(), "AdapterOrdinal"),
            (e("D3DDEVTYPE"), "DeviceType"),
            (hwnd(), "hFocusWindow"),
            (f("D3DCREATE"), "BehaviorFlags"),
        ],
    ))
    .structure(StructDef::new(
        "D3DPRESENTSTATS",
        vec![
            (uint(), "PresentCount"),
            (uint(), "PresentRefreshCount"),
            (uint(), "SyncRefreshCount"),
            (large_integer(), "SyncQPCTime"),
            (large_integer(), "SyncGPUTime"),
        ],
    ))
    .opaque_struct("D3DCAPS9")
    .opaque_struct("D3DADAPTER_IDENTIFIER9")
    .opaque_struct("D3DRECTPATCH_INFO")
    .opaque_struct("D3DTRIPATCH_INFO");
}

fn private_data_methods() -> Vec<Callable> {
    vec![
        m(hresult(), "SetPrivateData")
            .arg(refguid(), "refguid")
            .arg(Type::opaque_blob(Type::void(), "SizeOfData"), "pData")
            .arg(dword(), "SizeOfData")
            .arg(f("D3DSPD"), "Flags")
            .no_side_effects(),
        m(hresult(), "GetPrivateData")
            .arg(refguid(), "refguid")
            .out(Type::opaque_blob(Type::void(), "*pSizeOfData"), "pData")
            .out(Type::ptr(dword()), "pSizeOfData")
            .no_side_effects(),
        m(hresult(), "FreePrivateData")
            .arg(refguid(), "refguid")
            .no_side_effects(),
    ]
}

fn get_device() -> Callable {
    m(hresult(), "GetDevice").out(out_object("IDirect3DDevice9"), "ppDevice")
}

fn shader_constants(stage: &str) -> Vec<Callable> {
    let mut methods = Vec::new();
    for (suffix, element, count) in [
        ("F", float(), "Vector4fCount"),
        ("I", int(), "Vector4iCount"),
        ("B", bool_(), "BoolCount"),
    ] {
        let extent = if suffix == "B" {
            count.to_owned()
        } else {
            format!("4*{count}")
        };
        methods.push(
            m(hresult(), &format!("Set{stage}ShaderConstant{suffix}"))
                .arg(uint(), "StartRegister")
                .arg(Type::array(element.clone(), extent.as_str()), "pConstantData")
                .arg(uint(), count),
        );
        methods.push(
            m(hresult(), &format!("Get{stage}ShaderConstant{suffix}"))
                .arg(uint(), "StartRegister")
                .out(Type::array(element, extent.as_str()), "pConstantData")
                .arg(uint(), count)
                .no_side_effects(),
        );
    }
    methods
}

fn present_args(callable: Callable) -> Callable {
    callable
        .arg(in_struct("RECT"), "pSourceRect")
        .arg(in_struct("RECT"), "pDestRect")
        .arg(hwnd(), "hDestWindowOverride")
        .arg(in_struct("RGNDATA"), "pDirtyRegion")
}

fn direct3d9(b: &mut ApiBuilder) {
    let adapter = || e("D3DADAPTER");
    let devtype = || e("D3DDEVTYPE");
    let format = || e("D3DFORMAT");
    b.interface("IDirect3D9", Some("IUnknown")).methods(
        "IDirect3D9",
        vec![
            m(hresult(), "RegisterSoftwareDevice")
                .arg(Type::opaque_ptr(), "pInitializeFunction")
                .no_side_effects(),
            m(uint(), "GetAdapterCount").no_side_effects(),
            m(hresult(), "GetAdapterIdentifier")
                .arg(adapter(), "Adapter")
                .arg(e("D3DENUM"), "Flags")
                .out(out_struct("D3DADAPTER_IDENTIFIER9"), "pIdentifier")
                .no_side_effects(),
            m(uint(), "GetAdapterModeCount")
                .arg(adapter(), "Adapter")
                .arg(format(), "Format")
                .no_side_effects(),
            m(hresult(), "EnumAdapterModes")
                .arg(adapter(), "Adapter")
                .arg(format(), "Format")
                .arg(uint(), "Mode")
                .out(out_struct("D3DDISPLAYMODE"), "pMode")
                .no_side_effects(),
            m(hresult(), "GetAdapterDisplayMode")
                .arg(adapter(), "Adapter")
                .out(out_struct("D3DDISPLAYMODE"), "pMode")
                .no_side_effects(),
            m(hresult(), "CheckDeviceType")
                .arg(adapter(), "Adapter")
                .arg(devtype(), "DevType")
                .arg(format(), "AdapterFormat")
                .arg(format(), "BackBufferFormat")
                .arg(bool_(), "bWindowed")
                .no_side_effects(),
            m(hresult(), "CheckDeviceFormat")
                .arg(adapter(), "Adapter")
                .arg(devtype(), "DeviceType")
                .arg(format(), "AdapterFormat")
                .arg(f("D3DUSAGE"), "Usage")
                .arg(e("D3DRESOURCETYPE"), "RType")
                .arg(format(), "CheckFormat")
                .no_side_effects(),
            m(hresult(), "CheckDeviceMultiSampleType")
                .arg(adapter(), "Adapter")
                .arg(devtype(), "DeviceType")
                .arg(format(), "SurfaceFormat")
                .arg(bool_(), "Windowed")
                .arg(e("D3DMULTISAMPLE_TYPE"), "MultiSampleType")
                .out(Type::ptr(dword()), "pQualityLevels")
                .no_side_effects(),
            m(hresult(), "CheckDepthStencilMatch")
                .arg(adapter(), "Adapter")
                .arg(devtype(), "DeviceType")
                .arg(format(), "AdapterFormat")
                .arg(format(), "RenderTargetFormat")
                .arg(format(), "DepthStencilFormat")
                .no_side_effects(),
            m(hresult(), "CheckDeviceFormatConversion")
                .arg(adapter(), "Adapter")
                .arg(devtype(), "DeviceType")
                .arg(format(), "SourceFormat")
                .arg(format(), "TargetFormat")
                .no_side_effects(),
            m(hresult(), "GetDeviceCaps")
                .arg(adapter(), "Adapter")
                .arg(devtype(), "DeviceType")
                .out(out_struct("D3DCAPS9"), "pCaps")
                .no_side_effects(),
            m(hmonitor(), "GetAdapterMonitor")
                .arg(adapter(), "Adapter")
                .no_side_effects(),
            m(hresult(), "CreateDevice")
                .arg(adapter(), "Adapter")
                .arg(devtype(), "DeviceType")
                .arg(hwnd(), "hFocusWindow")
                .arg(f("D3DCREATE"), "BehaviorFlags")
                .inout(out_struct("D3DPRESENT_PARAMETERS"), "pPresentationParameters")
                .out(out_object("IDirect3DDevice9"), "ppReturnedDeviceInterface"),
        ],
    );
}

fn device9(b: &mut ApiBuilder) {
    let format = || e("D3DFORMAT");
    let pool = || e("D3DPOOL");
    let usage = || f("D3DUSAGE");
    let surface = || obj("IDirect3DSurface9");
    let shared = || Type::ptr(handle());
    let multisample = || e("D3DMULTISAMPLE_TYPE");

    let mut methods = vec![
        m(hresult(), "TestCooperativeLevel"),
        m(uint(), "GetAvailableTextureMem").no_side_effects(),
        m(hresult(), "EvictManagedResources"),
        m(hresult(), "GetDirect3D").out(out_object("IDirect3D9"), "ppD3D9"),
        m(hresult(), "GetDeviceCaps")
            .out(out_struct("D3DCAPS9"), "pCaps")
            .no_side_effects(),
        m(hresult(), "GetDisplayMode")
            .arg(uint(), "iSwapChain")
            .out(out_struct("D3DDISPLAYMODE"), "pMode")
            .no_side_effects(),
        m(hresult(), "GetCreationParameters")
            .out(out_struct("D3DDEVICE_CREATION_PARAMETERS"), "pParameters")
            .no_side_effects(),
        m(hresult(), "SetCursorProperties")
            .arg(uint(), "XHotSpot")
            .arg(uint(), "YHotSpot")
            .arg(surface(), "pCursorBitmap"),
        m(Type::void(), "SetCursorPosition")
            .arg(int(), "X")
            .arg(int(), "Y")
            .arg(f("D3DCURSOR"), "Flags"),
        m(bool_(), "ShowCursor").arg(bool_(), "bShow"),
        m(hresult(), "CreateAdditionalSwapChain")
            .inout(out_struct("D3DPRESENT_PARAMETERS"), "pPresentationParameters")
            .out(out_object("IDirect3DSwapChain9"), "pSwapChain"),
        m(hresult(), "GetSwapChain")
            .arg(uint(), "iSwapChain")
            .out(out_object("IDirect3DSwapChain9"), "pSwapChain"),
        m(uint(), "GetNumberOfSwapChains").no_side_effects(),
        m(hresult(), "Reset").inout(out_struct("D3DPRESENT_PARAMETERS"), "pPresentationParameters"),
        present_args(m(hresult(), "Present")),
        m(hresult(), "GetBackBuffer")
            .arg(uint(), "iSwapChain")
            .arg(uint(), "iBackBuffer")
            .arg(e("D3DBACKBUFFER_TYPE"), "Type")
            .out(out_object("IDirect3DSurface9"), "ppBackBuffer"),
        m(hresult(), "GetRasterStatus")
            .arg(uint(), "iSwapChain")
            .out(out_struct("D3DRASTER_STATUS"), "pRasterStatus")
            .no_side_effects(),
        m(hresult(), "SetDialogBoxMode").arg(bool_(), "bEnableDialogs"),
        m(Type::void(), "SetGammaRamp")
            .arg(uint(), "iSwapChain")
            .arg(f("D3DSGR"), "Flags")
            .arg(in_struct("D3DGAMMARAMP"), "pRamp"),
        m(Type::void(), "GetGammaRamp")
            .arg(uint(), "iSwapChain")
            .out(out_struct("D3DGAMMARAMP"), "pRamp")
            .no_side_effects(),
        m(hresult(), "CreateTexture")
            .arg(uint(), "Width")
            .arg(uint(), "Height")
            .arg(uint(), "Levels")
            .arg(usage(), "Usage")
            .arg(format(), "Format")
            .arg(pool(), "Pool")
            .out(out_object("IDirect3DTexture9"), "ppTexture")
            .arg(shared(), "pSharedHandle"),
        m(hresult(), "CreateVolumeTexture")
            .arg(uint(), "Width")
            .arg(uint(), "Height")
            .arg(uint(), "Depth")
            .arg(uint(), "Levels")
            .arg(usage(), "Usage")
            .arg(format(), "Format")
            .arg(pool(), "Pool")
            .out(out_object("IDirect3DVolumeTexture9"), "ppVolumeTexture")
            .arg(shared(), "pSharedHandle"),
        m(hresult(), "CreateCubeTexture")
            .arg(uint(), "EdgeLength")
            .arg(uint(), "Levels")
            .arg(usage(), "Usage")
            .arg(format(), "Format")
            .arg(pool(), "Pool")
            .out(out_object("IDirect3DCubeTexture9"), "ppCubeTexture")
            .arg(shared(), "pSharedHandle"),
        m(hresult(), "CreateVertexBuffer")
            .arg(uint(), "Length")
            .arg(usage(), "Usage")
            .arg(f("D3DFVF"), "FVF")
            .arg(pool(), "Pool")
            .out(out_object("IDirect3DVertexBuffer9"), "ppVertexBuffer")
            .arg(shared(), "pSharedHandle"),
        m(hresult(), "CreateIndexBuffer")
            .arg(uint(), "Length")
            .arg(usage(), "Usage")
            .arg(format(), "Format")
            .arg(pool(), "Pool")
            .out(out_object("IDirect3DIndexBuffer9"), "ppIndexBuffer")
            .arg(shared(), "pSharedHandle"),
        m(hresult(), "CreateRenderTarget")
            .arg(uint(), "Width")
            .arg(uint(), "Height")
            .arg(format(), "Format")
            .arg(multisample(), "MultiSample")
            .arg(dword(), "MultisampleQuality")
            .arg(bool_(), "Lockable")
            .out(out_object("IDirect3DSurface9"), "ppSurface")
            .arg(shared(), "pSharedHandle"),
        m(hresult(), "CreateDepthStencilSurface")
            .arg(uint(), "Width")
            .arg(uint(), "Height")
            .arg(format(), "Format")
            .arg(multisample(), "MultiSample")
            .arg(dword(), "MultisampleQuality")
            .arg(bool_(), "Discard")
            .out(out_object("IDirect3DSurface9"), "ppSurface")
            .arg(shared(), "pSharedHandle"),
        m(hresult(), "UpdateSurface")
            .arg(surface(), "pSourceSurface")
            .arg(in_struct("RECT"), "pSourceRect")
            .arg(surface(), "pDestinationSurface")
            .arg(in_struct("POINT"), "pDestPoint"),
        m(hresult(), "UpdateTexture")
            .arg(obj("IDirect3DBaseTexture9"), "pSourceTexture")
            .arg(obj("IDirect3DBaseTexture9"), "pDestinationTexture"),
        m(hresult(), "GetRenderTargetData")
            .arg(surface(), "pRenderTarget")
            .arg(surface(), "pDestSurface")
            .no_side_effects(),
        m(hresult(), "GetFrontBufferData")
            .arg(uint(), "iSwapChain")
            .arg(surface(), "pDestSurface")
            .no_side_effects(),
        m(hresult(), "StretchRect")
            .arg(surface(), "pSourceSurface")
            .arg(in_struct("RECT"), "pSourceRect")
            .arg(surface(), "pDestSurface")
            .arg(in_struct("RECT"), "pDestRect")
            .arg(e("D3DTEXTUREFILTERTYPE"), "Filter"),
        m(hresult(), "ColorFill")
            .arg(surface(), "pSurface")
            .arg(in_struct("RECT"), "pRect")
            .arg(d3dcolor(), "color"),
        m(hresult(), "CreateOffscreenPlainSurface")
            .arg(uint(), "Width")
            .arg(uint(), "Height")
            .arg(format(), "Format")
            .arg(pool(), "Pool")
            .out(out_object("IDirect3DSurface9"), "ppSurface")
            .arg(shared(), "pSharedHandle"),
        m(hresult(), "SetRenderTarget")
            .arg(dword(), "RenderTargetIndex")
            .arg(surface(), "pRenderTarget"),
        m(hresult(), "GetRenderTarget")
            .arg(dword(), "RenderTargetIndex")
            .out(out_object("IDirect3DSurface9"), "ppRenderTarget"),
        m(hresult(), "SetDepthStencilSurface").arg(surface(), "pNewZStencil"),
        m(hresult(), "GetDepthStencilSurface")
            .out(out_object("IDirect3DSurface9"), "ppZStencilSurface"),
        m(hresult(), "BeginScene"),
        m(hresult(), "EndScene"),
        m(hresult(), "Clear")
            .arg(dword(), "Count")
            .arg(Type::array(s("D3DRECT"), "Count"), "pRects")
            .arg(f("D3DCLEAR"), "Flags")
            .arg(d3dcolor(), "Color")
            .arg(float(), "Z")
            .arg(dword(), "Stencil"),
        m(hresult(), "SetTransform")
            .arg(e("D3DTRANSFORMSTATETYPE"), "State")
            .arg(in_struct("D3DMATRIX"), "pMatrix"),
        m(hresult(), "GetTransform")
            .arg(e("D3DTRANSFORMSTATETYPE"), "State")
            .out(out_struct("D3DMATRIX"), "pMatrix")
            .no_side_effects(),
        m(hresult(), "MultiplyTransform")
            .arg(e("D3DTRANSFORMSTATETYPE"), "State")
            .arg(in_struct("D3DMATRIX"), "pMatrix"),
        m(hresult(), "SetViewport").arg(in_struct("D3DVIEWPORT9"), "pViewport"),
        m(hresult(), "GetViewport")
            .out(out_struct("D3DVIEWPORT9"), "pViewport")
            .no_side_effects(),
        m(hresult(), "SetMaterial").arg(in_struct("D3DMATERIAL9"), "pMaterial"),
        m(hresult(), "GetMaterial")
            .out(out_struct("D3DMATERIAL9"), "pMaterial")
            .no_side_effects(),
        m(hresult(), "SetLight")
            .arg(dword(), "Index")
            .arg(in_struct("D3DLIGHT9"), "pLight"),
        m(hresult(), "GetLight")
            .arg(dword(), "Index")
            .out(out_struct("D3DLIGHT9"), "pLight")
            .no_side_effects(),
        m(hresult(), "LightEnable")
            .arg(dword(), "Index")
            .arg(bool_(), "Enable"),
        m(hresult(), "GetLightEnable")
            .arg(dword(), "Index")
            .out(Type::ptr(bool_()), "pEnable")
            .no_side_effects(),
        m(hresult(), "SetClipPlane")
            .arg(dword(), "Index")
            .arg(Type::array(float(), "4"), "pPlane"),
        m(hresult(), "GetClipPlane")
            .arg(dword(), "Index")
            .out(Type::array(float(), "4"), "pPlane")
            .no_side_effects(),
        m(hresult(), "SetRenderState")
            .arg(e("D3DRENDERSTATETYPE"), "State")
            .arg(state_value("D3DRENDERSTATEVALUE"), "Value"),
        m(hresult(), "GetRenderState")
            .arg(e("D3DRENDERSTATETYPE"), "State")
            .out(Type::ptr(state_value("D3DRENDERSTATEVALUE")), "pValue")
            .no_side_effects(),
        m(hresult(), "CreateStateBlock")
            .arg(e("D3DSTATEBLOCKTYPE"), "Type")
            .out(out_object("IDirect3DStateBlock9"), "ppSB"),
        m(hresult(), "BeginStateBlock"),
        m(hresult(), "EndStateBlock").out(out_object("IDirect3DStateBlock9"), "ppSB"),
        m(hresult(), "SetClipStatus").arg(in_struct("D3DCLIPSTATUS9"), "pClipStatus"),
        m(hresult(), "GetClipStatus")
            .out(out_struct("D3DCLIPSTATUS9"), "pClipStatus")
            .no_side_effects(),
        m(hresult(), "GetTexture")
            .arg(dword(), "Stage")
            .out(out_object("IDirect3DBaseTexture9"), "ppTexture"),
        m(hresult(), "SetTexture")
            .arg(dword(), "Stage")
            .arg(obj("IDirect3DBaseTexture9"), "pTexture"),
        m(hresult(), "GetTextureStageState")
            .arg(dword(), "Stage")
            .arg(e("D3DTEXTURESTAGESTATETYPE"), "Type")
            .out(Type::ptr(state_value("D3DTEXTURESTAGESTATEVALUE")), "pValue")
            .no_side_effects(),
        m(hresult(), "SetTextureStageState")
            .arg(dword(), "Stage")
            .arg(e("D3DTEXTURESTAGESTATETYPE"), "Type")
            .arg(state_value("D3DTEXTURESTAGESTATEVALUE"), "Value"),
        m(hresult(), "GetSamplerState")
            .arg(dword(), "Sampler")
            .arg(e("D3DSAMPLERSTATETYPE"), "Type")
            .out(Type::ptr(state_value("D3DSAMPLERSTATEVALUE")), "pValue")
            .no_side_effects(),
        m(hresult(), "SetSamplerState")
            .arg(dword(), "Sampler")
            .arg(e("D3DSAMPLERSTATETYPE"), "Type")
            .arg(state_value("D3DSAMPLERSTATEVALUE"), "Value"),
        m(hresult(), "ValidateDevice").out(Type::ptr(dword()), "pNumPasses"),
        m(hresult(), "SetPaletteEntries")
            .arg(uint(), "PaletteNumber")
            .arg(Type::array(s("PALETTEENTRY"), "256"), "pEntries"),
        m(hresult(), "GetPaletteEntries")
            .arg(uint(), "PaletteNumber")
            .out(Type::array(s("PALETTEENTRY"), "256"), "pEntries")
            .no_side_effects(),
        m(hresult(), "SetCurrentTexturePalette").arg(uint(), "PaletteNumber"),
        m(hresult(), "GetCurrentTexturePalette")
            .out(Type::ptr(uint()), "PaletteNumber")
            .no_side_effects(),
        m(hresult(), "SetScissorRect").arg(in_struct("RECT"), "pRect"),
        m(hresult(), "GetScissorRect").out(out_struct("RECT"), "pRect"),
        m(hresult(), "SetSoftwareVertexProcessing").arg(bool_(), "bSoftware"),
        m(bool_(), "GetSoftwareVertexProcessing").no_side_effects(),
        m(hresult(), "SetNPatchMode").arg(float(), "nSegments"),
        m(float(), "GetNPatchMode").no_side_effects(),
        m(hresult(), "DrawPrimitive")
            .arg(e("D3DPRIMITIVETYPE"), "PrimitiveType")
            .arg(uint(), "StartVertex")
            .arg(uint(), "PrimitiveCount"),
        m(hresult(), "DrawIndexedPrimitive")
            .arg(e("D3DPRIMITIVETYPE"), "PrimitiveType")
            .arg(int(), "BaseVertexIndex")
            .arg(uint(), "MinVertexIndex")
            .arg(uint(), "NumVertices")
            .arg(uint(), "startIndex")
            .arg(uint(), "primCount"),
        m(hresult(), "DrawPrimitiveUP")
            .arg(e("D3DPRIMITIVETYPE"), "PrimitiveType")
            .arg(uint(), "PrimitiveCount")
            .arg(
                Type::blob(
                    Type::void(),
                    "_vertexDataSize(PrimitiveType, PrimitiveCount, VertexStreamZeroStride)",
                ),
                "pVertexStreamZeroData",
            )
            .arg(uint(), "VertexStreamZeroStride"),
        m(hresult(), "DrawIndexedPrimitiveUP")
            .arg(e("D3DPRIMITIVETYPE"), "PrimitiveType")
            .arg(uint(), "MinVertexIndex")
            .arg(uint(), "NumVertices")
            .arg(uint(), "PrimitiveCount")
            .arg(
                Type::blob(
                    Type::void(),
                    "_indexDataSize(PrimitiveType, PrimitiveCount, IndexDataFormat)",
                ),
                "pIndexData",
            )
            .arg(format(), "IndexDataFormat")
            .arg(
                Type::blob(Type::void(), "NumVertices*VertexStreamZeroStride"),
                "pVertexStreamZeroData",
            )
            .arg(uint(), "VertexStreamZeroStride"),
        m(hresult(), "ProcessVertices")
            .arg(uint(), "SrcStartIndex")
            .arg(uint(), "DestIndex")
            .arg(uint(), "VertexCount")
            .arg(obj("IDirect3DVertexBuffer9"), "pDestBuffer")
            .arg(obj("IDirect3DVertexDeclaration9"), "pVertexDecl")
            .arg(f("D3DPV"), "Flags"),
        m(hresult(), "CreateVertexDeclaration")
            .arg(
                Type::array(s("D3DVERTEXELEMENT9"), "_declCount(pVertexElements)"),
                "pVertexElements",
            )
            .out(out_object("IDirect3DVertexDeclaration9"), "ppDecl"),
        m(hresult(), "SetVertexDeclaration").arg(obj("IDirect3DVertexDeclaration9"), "pDecl"),
        m(hresult(), "GetVertexDeclaration")
            .out(out_object("IDirect3DVertexDeclaration9"), "ppDecl"),
        m(hresult(), "SetFVF").arg(f("D3DFVF"), "FVF"),
        m(hresult(), "GetFVF")
            .out(Type::ptr(f("D3DFVF")), "pFVF")
            .no_side_effects(),
        m(hresult(), "CreateVertexShader")
            .arg(shader_type(), "pFunction")
            .out(out_object("IDirect3DVertexShader9"), "ppShader"),
        m(hresult(), "SetVertexShader").arg(obj("IDirect3DVertexShader9"), "pShader"),
        m(hresult(), "GetVertexShader").out(out_object("IDirect3DVertexShader9"), "ppShader"),
    ];
    methods.extend(shader_constants("Vertex"));
    methods.extend([
        m(hresult(), "SetStreamSource")
            .arg(uint(), "StreamNumber")
            .arg(obj("IDirect3DVertexBuffer9"), "pStreamData")
            .arg(uint(), "OffsetInBytes")
            .arg(uint(), "Stride"),
        m(hresult(), "GetStreamSource")
            .arg(uint(), "StreamNumber")
            .out(out_object("IDirect3DVertexBuffer9"), "ppStreamData")
            .out(Type::ptr(uint()), "pOffsetInBytes")
            .out(Type::ptr(uint()), "pStride"),
        m(hresult(), "SetStreamSourceFreq")
            .arg(uint(), "StreamNumber")
            .arg(uint(), "Setting"),
        m(hresult(), "GetStreamSourceFreq")
            .arg(uint(), "StreamNumber")
            .out(Type::ptr(uint()), "pSetting")
            .no_side_effects(),
        m(hresult(), "SetIndices").arg(obj("IDirect3DIndexBuffer9"), "pIndexData"),
        m(hresult(), "GetIndices").out(out_object("IDirect3DIndexBuffer9"), "ppIndexData"),
        m(hresult(), "CreatePixelShader")
            .arg(shader_type(), "pFunction")
            .out(out_object("IDirect3DPixelShader9"), "ppShader"),
        m(hresult(), "SetPixelShader").arg(obj("IDirect3DPixelShader9"), "pShader"),
        m(hresult(), "GetPixelShader").out(out_object("IDirect3DPixelShader9"), "ppShader"),
    ]);
    methods.extend(shader_constants("Pixel"));
    methods.extend([
        m(hresult(), "DrawRectPatch")
            .arg(uint(), "Handle")
            .arg(Type::array(float(), "4"), "pNumSegs")
            .arg(in_struct("D3DRECTPATCH_INFO"), "pRectPatchInfo"),
        m(hresult(), "DrawTriPatch")
            .arg(uint(), "Handle")
            .arg(Type::array(float(), "3"), "pNumSegs")
            .arg(in_struct("D3DTRIPATCH_INFO"), "pTriPatchInfo"),
        m(hresult(), "DeletePatch").arg(uint(), "Handle"),
        m(hresult(), "CreateQuery")
            .arg(e("D3DQUERYTYPE"), "Type")
            .out(out_object("IDirect3DQuery9"), "ppQuery"),
    ]);
    b.interface("IDirect3DDevice9", Some("IUnknown"))
        .methods("IDirect3DDevice9", methods);
}

fn resources(b: &mut ApiBuilder) {
    let lock = || f("D3DLOCK");

    b.interface("IDirect3DStateBlock9", Some("IUnknown")).methods(
        "IDirect3DStateBlock9",
        vec![get_device(), m(hresult(), "Capture"), m(hresult(), "Apply")],
    );

    b.interface("IDirect3DSwapChain9", Some("IUnknown")).methods(
        "IDirect3DSwapChain9",
        vec![
            present_args(m(hresult(), "Present")).arg(f("D3DPRESENT"), "dwFlags"),
            m(hresult(), "GetFrontBufferData")
                .arg(obj("IDirect3DSurface9"), "pDestSurface")
                .no_side_effects(),
            m(hresult(), "GetBackBuffer")
                .arg(uint(), "iBackBuffer")
                .arg(e("D3DBACKBUFFER_TYPE"), "Type")
                .out(out_object("IDirect3DSurface9"), "ppBackBuffer"),
            m(hresult(), "GetRasterStatus")
                .out(out_struct("D3DRASTER_STATUS"), "pRasterStatus")
                .no_side_effects(),
            m(hresult(), "GetDisplayMode")
                .out(out_struct("D3DDISPLAYMODE"), "pMode")
                .no_side_effects(),
            get_device(),
            m(hresult(), "GetPresentParameters")
                .out(out_struct("D3DPRESENT_PARAMETERS"), "pPresentationParameters")
                .no_side_effects(),
        ],
    );

    let mut resource = vec![get_device()];
    resource.extend(private_data_methods());
    resource.extend([
        m(dword(), "SetPriority").arg(dword(), "PriorityNew"),
        m(dword(), "GetPriority").no_side_effects(),
        m(Type::void(), "PreLoad"),
        m(e("D3DRESOURCETYPE"), "GetType").no_side_effects(),
    ]);
    b.interface("IDirect3DResource9", Some("IUnknown"))
        .methods("IDirect3DResource9", resource);

    b.interface("IDirect3DVertexDeclaration9", Some("IUnknown")).methods(
        "IDirect3DVertexDeclaration9",
        vec![
            get_device(),
            m(hresult(), "GetDeclaration")
                .out(Type::array(s("D3DVERTEXELEMENT9"), "*pNumElements"), "pElement")
                .inout(Type::ptr(uint()), "pNumElements")
                .no_side_effects(),
        ],
    );

    for shader in ["IDirect3DVertexShader9", "IDirect3DPixelShader9"] {
        b.interface(shader, Some("IUnknown")).methods(
            shader,
            vec![
                get_device(),
                m(hresult(), "GetFunction")
                    .out(Type::opaque_blob(Type::void(), "*pSizeOfData"), "pData")
                    .inout(Type::ptr(uint()), "pSizeOfData")
                    .no_side_effects(),
            ],
        );
    }

    b.interface("IDirect3DBaseTexture9", Some("IDirect3DResource9"))
        .methods(
            "IDirect3DBaseTexture9",
            vec![
                m(dword(), "SetLOD").arg(dword(), "LODNew"),
                m(dword(), "GetLOD").no_side_effects(),
                m(dword(), "GetLevelCount").no_side_effects(),
                m(hresult(), "SetAutoGenFilterType")
                    .arg(e("D3DTEXTUREFILTERTYPE"), "FilterType"),
                m(e("D3DTEXTUREFILTERTYPE"), "GetAutoGenFilterType").no_side_effects(),
                m(Type::void(), "GenerateMipSubLevels"),
            ],
        )
        .interface("IDirect3DTexture9", Some("IDirect3DBaseTexture9"))
        .methods(
            "IDirect3DTexture9",
            vec![
                m(hresult(), "GetLevelDesc")
                    .arg(uint(), "Level")
                    .out(out_struct("D3DSURFACE_DESC"), "pDesc")
                    .no_side_effects(),
                m(hresult(), "GetSurfaceLevel")
                    .arg(uint(), "Level")
                    .out(out_object("IDirect3DSurface9"), "ppSurfaceLevel"),
                m(hresult(), "LockRect")
                    .arg(uint(), "Level")
                    .out(out_struct("D3DLOCKED_RECT"), "pLockedRect")
                    .arg(in_struct("RECT"), "pRect")
                    .arg(lock(), "Flags"),
                m(hresult(), "UnlockRect").arg(uint(), "Level"),
                m(hresult(), "AddDirtyRect").arg(in_struct("RECT"), "pDirtyRect"),
            ],
        )
        .interface("IDirect3DVolumeTexture9", Some("IDirect3DBaseTexture9"))
        .methods(
            "IDirect3DVolumeTexture9",
            vec![
                m(hresult(), "GetLevelDesc")
                    .arg(uint(), "Level")
                    .out(out_struct("D3DVOLUME_DESC"), "pDesc")
                    .no_side_effects(),
                m(hresult(), "GetVolumeLevel")
                    .arg(uint(), "Level")
                    .out(out_object("IDirect3DVolume9"), "ppVolumeLevel"),
                m(hresult(), "LockBox")
                    .arg(uint(), "Level")
                    .out(out_struct("D3DLOCKED_BOX"), "pLockedVolume")
                    .arg(in_struct("D3DBOX"), "pBox")
                    .arg(lock(), "Flags"),
                m(hresult(), "UnlockBox").arg(uint(), "Level"),
                m(hresult(), "AddDirtyBox").arg(in_struct("D3DBOX"), "pDirtyBox"),
            ],
        )
        .interface("IDirect3DCubeTexture9", Some("IDirect3DBaseTexture9"))
        .methods(
            "IDirect3DCubeTexture9",
            vec![
                m(hresult(), "GetLevelDesc")
                    .arg(uint(), "Level")
                    .out(out_struct("D3DSURFACE_DESC"), "pDesc")
                    .no_side_effects(),
                m(hresult(), "GetCubeMapSurface")
                    .arg(e("D3DCUBEMAP_FACES"), "FaceType")
                    .arg(uint(), "Level")
                    .out(out_object("IDirect3DSurface9"), "ppCubeMapSurface"),
                m(hresult(), "LockRect")
                    .arg(e("D3DCUBEMAP_FACES"), "FaceType")
                    .arg(uint(), "Level")
                    .out(out_struct("D3DLOCKED_RECT"), "pLockedRect")
                    .arg(in_struct("RECT"), "pRect")
                    .arg(lock(), "Flags"),
                m(hresult(), "UnlockRect")
                    .arg(e("D3DCUBEMAP_FACES"), "FaceType")
                    .arg(uint(), "Level"),
                m(hresult(), "AddDirtyRect")
                    .arg(e("D3DCUBEMAP_FACES"), "FaceType")
                    .arg(in_struct("RECT"), "pDirtyRect"),
            ],
        );

    for (buffer, desc) in [
        ("IDirect3DVertexBuffer9", "D3DVERTEXBUFFER_DESC"),
        ("IDirect3DIndexBuffer9", "D3DINDEXBUFFER_DESC"),
    ] {
        b.interface(buffer, Some("IDirect3DResource9")).methods(
            buffer,
            vec![
                m(hresult(), "Lock")
                    .arg(uint(), "OffsetToLock")
                    .arg(uint(), "SizeToLock")
                    .out(Type::ptr(Type::opaque_ptr()), "ppbData")
                    .arg(lock(), "Flags"),
                m(hresult(), "Unlock"),
                m(hresult(), "GetDesc")
                    .out(out_struct(desc), "pDesc")
                    .no_side_effects(),
            ],
        );
    }

    b.interface("IDirect3DSurface9", Some("IDirect3DResource9")).methods(
        "IDirect3DSurface9",
        vec![
            m(hresult(), "GetContainer")
                .arg(refiid(), "riid")
                .out(out_unknown(), "ppContainer")
                .no_side_effects(),
            m(hresult(), "GetDesc")
                .out(out_struct("D3DSURFACE_DESC"), "pDesc")
                .no_side_effects(),
            m(hresult(), "LockRect")
                .out(out_struct("D3DLOCKED_RECT"), "pLockedRect")
                .arg(in_struct("RECT"), "pRect")
                .arg(lock(), "Flags"),
            m(hresult(), "UnlockRect"),
            m(hresult(), "GetDC").out(Type::ptr(hdc()), "phdc"),
            m(hresult(), "ReleaseDC").arg(hdc(), "hdc"),
        ],
    );

    let mut volume = vec![get_device()];
    volume.extend(private_data_methods());
    volume.extend([
        m(hresult(), "GetContainer")
            .arg(refiid(), "riid")
            .out(out_unknown(), "ppContainer")
            .no_side_effects(),
        m(hresult(), "GetDesc")
            .out(out_struct("D3DVOLUME_DESC"), "pDesc")
            .no_side_effects(),
        m(hresult(), "LockBox")
            .out(out_struct("D3DLOCKED_BOX"), "pLockedVolume")
            .arg(in_struct("D3DBOX"), "pBox")
            .arg(lock(), "Flags"),
        m(hresult(), "UnlockBox"),
    ]);
    b.interface("IDirect3DVolume9", Some("IUnknown"))
        .methods("IDirect3DVolume9", volume);

    b.interface("IDirect3DQuery9", Some("IUnknown")).methods(
        "IDirect3DQuery9",
        vec![
            get_device(),
            m(e("D3DQUERYTYPE"), "GetType").no_side_effects(),
            m(dword(), "GetDataSize").no_side_effects(),
            m(hresult(), "Issue").arg(f("D3DISSUE"), "dwIssueFlags"),
            m(hresult(), "GetData")
                .out(Type::blob(Type::void(), "dwSize"), "pData")
                .arg(dword(), "dwSize")
                .arg(f("D3DGETDATA"), "dwGetDataFlags")
                .no_side_effects(),
        ],
    );
}

fn ex(b: &mut ApiBuilder) {
    let adapter = || e("D3DADAPTER");
    let format = || e("D3DFORMAT");
    let multisample = || e("D3DMULTISAMPLE_TYPE");
    let shared = || Type::ptr(handle());

    b.interface("IDirect3D9Ex", Some("IDirect3D9")).methods(
        "IDirect3D9Ex",
        vec![
            m(uint(), "GetAdapterModeCountEx")
                .arg(adapter(), "Adapter")
                .arg(in_struct("D3DDISPLAYMODEFILTER"), "pFilter")
                .no_side_effects(),
            m(hresult(), "EnumAdapterModesEx")
                .arg(adapter(), "Adapter")
                .arg(in_struct("D3DDISPLAYMODEFILTER"), "pFilter")
                .arg(uint(), "Mode")
                .out(out_struct("D3DDISPLAYMODEEX"), "pMode")
                .no_side_effects(),
            m(hresult(), "GetAdapterDisplayModeEx")
                .arg(adapter(), "Adapter")
                .out(out_struct("D3DDISPLAYMODEEX"), "pMode")
                .out(Type::ptr(e("D3DDISPLAYROTATION")), "pRotation")
                .no_side_effects(),
            m(hresult(), "CreateDeviceEx")
                .arg(adapter(), "Adapter")
                .arg(e("D3DDEVTYPE"), "DeviceType")
                .arg(hwnd(), "hFocusWindow")
                .arg(f("D3DCREATE"), "BehaviorFlags")
                .inout(out_struct("D3DPRESENT_PARAMETERS"), "pPresentationParameters")
                .out(out_struct("D3DDISPLAYMODEEX"), "pFullscreenDisplayMode")
                .out(out_object("IDirect3DDevice9Ex"), "ppReturnedDeviceInterface"),
            m(hresult(), "GetAdapterLUID")
                .arg(adapter(), "Adapter")
                .out(out_struct("LUID"), "pLUID")
                .no_side_effects(),
        ],
    );

    b.interface("IDirect3DDevice9Ex", Some("IDirect3DDevice9")).methods(
        "IDirect3DDevice9Ex",
        vec![
            m(hresult(), "SetConvolutionMonoKernel")
                .arg(uint(), "width")
                .arg(uint(), "height")
                .arg(Type::array(float(), "width"), "rows")
                .arg(Type::array(float(), "height"), "columns"),
            m(hresult(), "ComposeRects")
                .arg(obj("IDirect3DSurface9"), "pSrc")
                .arg(obj("IDirect3DSurface9"), "pDst")
                .arg(obj("IDirect3DVertexBuffer9"), "pSrcRectDescs")
                .arg(uint(), "NumRects")
                .arg(obj("IDirect3DVertexBuffer9"), "pDstRectDescs")
                .arg(e("D3DCOMPOSERECTSOP"), "Operation")
                .arg(int(), "Xoffset")
                .arg(int(), "Yoffset"),
            present_args(m(hresult(), "PresentEx")).arg(f("D3DPRESENT"), "dwFlags"),
            m(hresult(), "GetGPUThreadPriority")
                .out(Type::ptr(int()), "pPriority")
                .no_side_effects(),
            m(hresult(), "SetGPUThreadPriority").arg(int(), "Priority"),
            m(hresult(), "WaitForVBlank").arg(uint(), "iSwapChain"),
            m(hresult(), "CheckResourceResidency")
                .arg(
                    Type::array(obj("IDirect3DResource9"), "NumResources"),
                    "pResourceArray",
                )
                .arg(uint(), "NumResources"),
            m(hresult(), "SetMaximumFrameLatency").arg(uint(), "MaxLatency"),
            m(hresult(), "GetMaximumFrameLatency")
                .out(Type::ptr(uint()), "pMaxLatency")
                .no_side_effects(),
            m(hresult(), "CheckDeviceState")
                .arg(hwnd(), "hDestinationWindow")
                .no_side_effects(),
            m(hresult(), "CreateRenderTargetEx")
                .arg(uint(), "Width")
                .arg(uint(), "Height")
                .arg(format(), "Format")
                .arg(multisample(), "MultiSample")
                .arg(dword(), "MultisampleQuality")
                .arg(bool_(), "Lockable")
                .out(out_object("IDirect3DSurface9"), "ppSurface")
                .arg(shared(), "pSharedHandle")
                .arg(f("D3DUSAGE"), "Usage"),
            m(hresult(), "CreateOffscreenPlainSurfaceEx")
                .arg(uint(), "Width")
                .arg(uint(), "Height")
                .arg(format(), "Format")
                .arg(e("D3DPOOL"), "Pool")
                .out(out_object("IDirect3DSurface9"), "ppSurface")
                .out(shared(), "pSharedHandle")
                .arg(f("D3DUSAGE"), "Usage"),
            m(hresult(), "CreateDepthStencilSurfaceEx")
                .arg(uint(), "Width")
                .arg(uint(), "Height")
                .arg(format(), "Format")
                .arg(multisample(), "MultiSample")
                .arg(dword(), "MultisampleQuality")
                .arg(bool_(), "Discard")
                .out(out_object("IDirect3DSurface9"), "ppSurface")
                .arg(shared(), "pSharedHandle")
                .arg(f("D3DUSAGE"), "Usage"),
            m(hresult(), "ResetEx")
                .inout(out_struct("D3DPRESENT_PARAMETERS"), "pPresentationParameters")
                .out(out_struct("D3DDISPLAYMODEEX"), "pFullscreenDisplayMode"),
            m(hresult(), "GetDisplayModeEx")
                .arg(uint(), "iSwapChain")
                .out(out_struct("D3DDISPLAYMODEEX"), "pMode")
                .out(Type::ptr(e("D3DDISPLAYROTATION")), "pRotation")
                .no_side_effects(),
        ],
    );

    b.interface("IDirect3DSwapChain9Ex", Some("IDirect3DSwapChain9")).methods(
        "IDirect3DSwapChain9Ex",
        vec![
            m(hresult(), "GetLastPresentCount")
                .out(Type::ptr(uint()), "pLastPresentCount")
                .no_side_effects(),
            m(hresult(), "GetPresentStats")
                .out(out_struct("D3DPRESENTSTATS"), "pPresentationStatistics")
                .no_side_effects(),
            m(hresult(), "GetDisplayModeEx")
                .out(out_struct("D3DDISPLAYMODEEX"), "pMode")
                .out(Type::ptr(e("D3DDISPLAYROTATION")), "pRotation")
                .no_side_effects(),
        ],
    );
}

fn functions(b: &mut ApiBuilder) {
    b.functions(vec![
        m(obj("IDirect3D9"), "Direct3DCreate9")
            .arg(uint(), "SDKVersion")
            .fail(0),
        m(hresult(), "Direct3DCreate9Ex")
            .arg(uint(), "SDKVersion")
            .out(out_object("IDirect3D9Ex"), "ppD3D")
            .fail(D3DERR_NOTAVAILABLE),
        m(int(), "D3DPERF_BeginEvent")
            .arg(d3dcolor(), "col")
            .arg(lpcwstr(), "wszName")
            .fail(-1)
            .no_side_effects(),
        m(int(), "D3DPERF_EndEvent").fail(-1).no_side_effects(),
        m(Type::void(), "D3DPERF_SetMarker")
            .arg(d3dcolor(), "col")
            .arg(lpcwstr(), "wszName")
            .no_side_effects(),
        m(Type::void(), "D3DPERF_SetRegion")
            .arg(d3dcolor(), "col")
            .arg(lpcwstr(), "wszName")
            .no_side_effects(),
        m(bool_(), "D3DPERF_QueryRepeatFrame")
            .fail(0)
            .no_side_effects(),
        m(Type::void(), "D3DPERF_SetOptions")
            .arg(dword(), "dwOptions")
            .no_side_effects(),
        m(dword(), "D3DPERF_GetStatus").fail(0).no_side_effects(),
    ]);
}

/// Unresolved tables for `d3d9.dll`.
pub fn builder() -> ApiBuilder {
    let mut b = ApiBuilder::new("d3d9");
    winapi::declare(&mut b);
    b.constant("D3D_OK", 0)
        .constant("D3DERR_NOTAVAILABLE", D3DERR_NOTAVAILABLE as u32 as u64)
        .constant("D3DERR_INVALIDCALL", D3DERR_INVALIDCALL as u32 as u64)
        .helper("_shaderSize", 1)
        .helper("_declCount", 1)
        .helper("_vertexDataSize", 3)
        .helper("_indexDataSize", 3);
    enums(&mut b);
    flags(&mut b);
    structs(&mut b);
    direct3d9(&mut b);
    device9(&mut b);
    resources(&mut b);
    ex(&mut b);
    functions(&mut b);
    winapi::iids(&mut b, IIDS);
    b
}

/// Shader text, the lock shadow state and the size helpers the tables declare.
pub fn hooks() -> Hooks {
    Hooks::new()
        .with_helpers(helpers())
        .with_serialize_arg(|ctx| {
            if let Some(encoding) = winapi::iid_encoding(ctx) {
                return encoding;
            }
            if is_shader(&ctx.param.param.ty) {
                ArgEncoding::ShaderText(ShaderFormat::D3d9Tokens)
            } else {
                ArgEncoding::Default
            }
        })
        .with_wrapper_state(lock::shadow_fields)
        .with_inject(lock::injection)
}
