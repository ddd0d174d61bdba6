//! Direct3D 11 tables. The 11.1 additions live in [`d3d11_1`] and are layered on top.

pub mod d3d11_1;

use calltrace_api::{
    ApiBuilder, Callable, EnumDef, EvalError, FlagsDef, Primitive, SizeHelpers, StructDef, Type,
};
use calltrace_gen::{ArgEncoding, Hooks, ShaderFormat};

use crate::winapi::{
    self, bool_, float, hmodule, hresult, int, lpcstr, out_object, out_unknown, refguid, refiid,
    size_t, uint, uint8,
};

/// `NumViews` value meaning "leave the bound views alone".
pub const D3D11_KEEP_VIEWS: u64 = 0xffff_ffff;

pub const STAGES: [&str; 6] = ["VS", "HS", "DS", "GS", "PS", "CS"];

pub(crate) fn e(name: &str) -> Type {
    Type::enumeration(name)
}

pub(crate) fn f(name: &str) -> Type {
    Type::flags(name)
}

pub(crate) fn s(name: &str) -> Type {
    Type::structure(name)
}

pub(crate) fn in_struct(name: &str) -> Type {
    Type::const_ptr(s(name))
}

pub(crate) fn out_struct(name: &str) -> Type {
    Type::ptr(s(name))
}

pub(crate) fn obj(name: &str) -> Type {
    Type::object(name)
}

pub(crate) fn m(ret: Type, name: &str) -> Callable {
    Callable::new(ret, name)
}

pub(crate) fn shader_bytecode() -> Type {
    Type::blob(Type::void(), "BytecodeLength")
}

const IIDS: &[(&str, &str)] = &[
    ("ID3D11DeviceChild", "1841e5c8-16b0-489b-bcc8-44cfb0d5deae"),
    ("ID3D11DepthStencilState", "03823efb-8d8f-4e1c-9aa2-f64bb2cbfdf1"),
    ("ID3D11BlendState", "75b68faa-347d-4159-8f45-a0640f01cd9a"),
    ("ID3D11RasterizerState", "9bb4ab81-ab1a-4d8f-b506-fc04200b6ee7"),
    ("ID3D11SamplerState", "da6fea51-564c-4487-9810-f0d0f9b4e3a5"),
    ("ID3D11Resource", "dc8e63f3-d12b-4952-b47b-5e45026a862d"),
    ("ID3D11Buffer", "48570b85-d1ee-4fcd-a250-eb350722b037"),
    ("ID3D11Texture1D", "f8fb5c27-c6b3-4f75-a4c8-439af2ef564c"),
    ("ID3D11Texture2D", "6f15aaf2-d208-4e89-9ab4-489535d34f9c"),
    ("ID3D11Texture3D", "037e866e-f56d-4357-a8af-9dabbe6e250e"),
    ("ID3D11View", "839d1216-bb2e-412b-b7f4-a9dbebe08ed1"),
    ("ID3D11ShaderResourceView", "b0e06fe0-8192-4e1a-b1ca-36d7414710b2"),
    ("ID3D11RenderTargetView", "dfdba067-0b8d-4865-875b-d7b4516cc164"),
    ("ID3D11DepthStencilView", "9fdac92a-1876-48c3-afad-25b94f84a9b6"),
    ("ID3D11UnorderedAccessView", "28acf509-7f5c-48f6-8611-f316010a6380"),
    ("ID3D11VertexShader", "3b301d64-d678-4289-8897-22f8928b72f3"),
    ("ID3D11HullShader", "8e5c6061-628a-4c8e-8264-bbe45cb3d5dd"),
    ("ID3D11DomainShader", "f582c508-0f36-490c-9977-31eece268cfa"),
    ("ID3D11GeometryShader", "38325b96-effb-4022-ba02-2e795b70275c"),
    ("ID3D11PixelShader", "ea82e40d-51dc-4f33-93d4-db7c9125ae8c"),
    ("ID3D11ComputeShader", "4f5b196e-c2bd-495e-bd01-1fded38e4969"),
    ("ID3D11InputLayout", "e4819ddc-4cf0-4025-bd26-5de82a3e07b7"),
    ("ID3D11Asynchronous", "4b35d0cd-1e15-4258-9c98-1b1333f6dd3b"),
    ("ID3D11Query", "d6c00747-87b7-425e-b84d-44d108560afd"),
    ("ID3D11Predicate", "9eb576dd-9f77-4d86-81aa-8bab5fe490e2"),
    ("ID3D11Counter", "6e8c49fb-a371-4770-b440-29086022b741"),
    ("ID3D11ClassInstance", "a6cd7faa-b0b7-4a2f-9436-8662a65797cb"),
    ("ID3D11ClassLinkage", "ddf57cba-9543-46e4-a12b-f207a0fe7fed"),
    ("ID3D11CommandList", "a24bc4d1-769e-43f7-8013-98ff566c18e2"),
    ("ID3D11DeviceContext", "c0bfa96c-e089-44fb-8eaf-26f8796190da"),
    ("ID3D11Device", "db6f6ddb-ac77-4e88-8253-819df9bbf140"),
];

fn shader_interface(stage: &str) -> &'static str {
    match stage {
        "VS" => "ID3D11VertexShader",
        "HS" => "ID3D11HullShader",
        "DS" => "ID3D11DomainShader",
        "GS" => "ID3D11GeometryShader",
        "PS" => "ID3D11PixelShader",
        _ => "ID3D11ComputeShader",
    }
}

unsafe fn view_count(args: &[u64]) -> Result<u64, EvalError> {
    if args[0] & 0xffff_ffff == D3D11_KEEP_VIEWS {
        Ok(0)
    } else {
        Ok(args[0])
    }
}

pub fn helpers() -> SizeHelpers {
    let mut helpers = SizeHelpers::new();
    helpers.register("_viewCount", view_count);
    helpers
}

fn enums(b: &mut ApiBuilder) {
    let u32_ = Primitive::U32;
    b.enumeration(EnumDef::with_values(
        "D3D_FEATURE_LEVEL",
        u32_,
        &[
            ("D3D_FEATURE_LEVEL_9_1", 0x9100),
            ("D3D_FEATURE_LEVEL_9_2", 0x9200),
            ("D3D_FEATURE_LEVEL_9_3", 0x9300),
            ("D3D_FEATURE_LEVEL_10_0", 0xa000),
            ("D3D_FEATURE_LEVEL_10_1", 0xa100),
            ("D3D_FEATURE_LEVEL_11_0", 0xb000),
        ],
    ))
    .enumeration(EnumDef::sequential(
        "D3D_DRIVER_TYPE",
        u32_,
        &[
            "D3D_DRIVER_TYPE_UNKNOWN",
            "D3D_DRIVER_TYPE_HARDWARE",
            "D3D_DRIVER_TYPE_REFERENCE",
            "D3D_DRIVER_TYPE_NULL",
            "D3D_DRIVER_TYPE_SOFTWARE",
            "D3D_DRIVER_TYPE_WARP",
        ],
    ))
    .enumeration(EnumDef::with_values(
        "DXGI_FORMAT",
        u32_,
        &[
            ("DXGI_FORMAT_UNKNOWN", 0),
            ("DXGI_FORMAT_R32G32B32A32_FLOAT", 2),
            ("DXGI_FORMAT_R32G32B32_FLOAT", 6),
            ("DXGI_FORMAT_R16G16B16A16_FLOAT", 10),
            ("DXGI_FORMAT_R32G32_FLOAT", 16),
            ("DXGI_FORMAT_R10G10B10A2_UNORM", 24),
            ("DXGI_FORMAT_R8G8B8A8_TYPELESS", 27),
            ("DXGI_FORMAT_R8G8B8A8_UNORM", 28),
            ("DXGI_FORMAT_R8G8B8A8_UNORM_SRGB", 29),
            ("DXGI_FORMAT_R16G16_FLOAT", 34),
            ("DXGI_FORMAT_R32_TYPELESS", 39),
            ("DXGI_FORMAT_D32_FLOAT", 40),
            ("DXGI_FORMAT_R32_FLOAT", 41),
            ("DXGI_FORMAT_R32_UINT", 42),
            ("DXGI_FORMAT_R24G8_TYPELESS", 44),
            ("DXGI_FORMAT_D24_UNORM_S8_UINT", 45),
            ("DXGI_FORMAT_R8G8_UNORM", 49),
            ("DXGI_FORMAT_R16_FLOAT", 54),
            ("DXGI_FORMAT_D16_UNORM", 55),
            ("DXGI_FORMAT_R16_UINT", 57),
            ("DXGI_FORMAT_R8_UNORM", 61),
            ("DXGI_FORMAT_BC1_UNORM", 71),
            ("DXGI_FORMAT_BC2_UNORM", 74),
            ("DXGI_FORMAT_BC3_UNORM", 77),
            ("DXGI_FORMAT_B8G8R8A8_UNORM", 87),
            ("DXGI_FORMAT_B8G8R8X8_UNORM", 88),
            ("DXGI_FORMAT_BC7_UNORM", 98),
        ],
    ))
    .enumeration(EnumDef::sequential(
        "D3D11_USAGE",
        u32_,
        &[
            "D3D11_USAGE_DEFAULT",
            "D3D11_USAGE_IMMUTABLE",
            "D3D11_USAGE_DYNAMIC",
            "D3D11_USAGE_STAGING",
        ],
    ))
    .enumeration(EnumDef::sequential(
        "D3D11_RESOURCE_DIMENSION",
        u32_,
        &[
            "D3D11_RESOURCE_DIMENSION_UNKNOWN",
            "D3D11_RESOURCE_DIMENSION_BUFFER",
            "D3D11_RESOURCE_DIMENSION_TEXTURE1D",
            "D3D11_RESOURCE_DIMENSION_TEXTURE2D",
            "D3D11_RESOURCE_DIMENSION_TEXTURE3D",
        ],
    ))
    .enumeration(EnumDef::sequential(
        "D3D11_INPUT_CLASSIFICATION",
        u32_,
        &["D3D11_INPUT_PER_VERTEX_DATA", "D3D11_INPUT_PER_INSTANCE_DATA"],
    ))
    .enumeration(EnumDef::with_values(
        "D3D11_PRIMITIVE_TOPOLOGY",
        u32_,
        &[
            ("D3D11_PRIMITIVE_TOPOLOGY_UNDEFINED", 0),
            ("D3D11_PRIMITIVE_TOPOLOGY_POINTLIST", 1),
            ("D3D11_PRIMITIVE_TOPOLOGY_LINELIST", 2),
            ("D3D11_PRIMITIVE_TOPOLOGY_LINESTRIP", 3),
            ("D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST", 4),
            ("D3D11_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP", 5),
            ("D3D11_PRIMITIVE_TOPOLOGY_LINELIST_ADJ", 10),
            ("D3D11_PRIMITIVE_TOPOLOGY_LINESTRIP_ADJ", 11),
            ("D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST_ADJ", 12),
            ("D3D11_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP_ADJ", 13),
            ("D3D11_PRIMITIVE_TOPOLOGY_1_CONTROL_POINT_PATCHLIST", 33),
            ("D3D11_PRIMITIVE_TOPOLOGY_3_CONTROL_POINT_PATCHLIST", 35),
            ("D3D11_PRIMITIVE_TOPOLOGY_4_CONTROL_POINT_PATCHLIST", 36),
        ],
    ))
    .enumeration(EnumDef::with_values(
        "D3D11_MAP",
        u32_,
        &[
            ("D3D11_MAP_READ", 1),
            ("D3D11_MAP_WRITE", 2),
            ("D3D11_MAP_READ_WRITE", 3),
            ("D3D11_MAP_WRITE_DISCARD", 4),
            ("D3D11_MAP_WRITE_NO_OVERWRITE", 5),
        ],
    ))
    .enumeration(EnumDef::with_values(
        "D3D11_BLEND",
        u32_,
        &[
            ("D3D11_BLEND_ZERO", 1),
            ("D3D11_BLEND_ONE", 2),
            ("D3D11_BLEND_SRC_COLOR", 3),
            ("D3D11_BLEND_INV_SRC_COLOR", 4),
            ("D3D11_BLEND_SRC_ALPHA", 5),
            ("D3D11_BLEND_INV_SRC_ALPHA", 6),
            ("D3D11_BLEND_DEST_ALPHA", 7),
            ("D3D11_BLEND_INV_DEST_ALPHA", 8),
            ("D3D11_BLEND_DEST_COLOR", 9),
            ("D3D11_BLEND_INV_DEST_COLOR", 10),
            ("D3D11_BLEND_SRC_ALPHA_SAT", 11),
            ("D3D11_BLEND_BLEND_FACTOR", 14),
            ("D3D11_BLEND_INV_BLEND_FACTOR", 15),
            ("D3D11_BLEND_SRC1_COLOR", 16),
            ("D3D11_BLEND_INV_SRC1_COLOR", 17),
            ("D3D11_BLEND_SRC1_ALPHA", 18),
            ("D3D11_BLEND_INV_SRC1_ALPHA", 19),
        ],
    ))
    .enumeration(EnumDef::with_values(
        "D3D11_BLEND_OP",
        u32_,
        &[
            ("D3D11_BLEND_OP_ADD", 1),
            ("D3D11_BLEND_OP_SUBTRACT", 2),
            ("D3D11_BLEND_OP_REV_SUBTRACT", 3),
            ("D3D11_BLEND_OP_MIN", 4),
            ("D3D11_BLEND_OP_MAX", 5),
        ],
    ))
    .enumeration(EnumDef::with_values(
        "D3D11_FILL_MODE",
        u32_,
        &[("D3D11_FILL_WIREFRAME", 2), ("D3D11_FILL_SOLID", 3)],
    ))
    .enumeration(EnumDef::with_values(
        "D3D11_CULL_MODE",
        u32_,
        &[
            ("D3D11_CULL_NONE", 1),
            ("D3D11_CULL_FRONT", 2),
            ("D3D11_CULL_BACK", 3),
        ],
    ))
    .enumeration(EnumDef::sequential(
        "D3D11_DEVICE_CONTEXT_TYPE",
        u32_,
        &["D3D11_DEVICE_CONTEXT_IMMEDIATE", "D3D11_DEVICE_CONTEXT_DEFERRED"],
    ))
    .enumeration(EnumDef::sequential(
        "D3D11_QUERY",
        u32_,
        &[
            "D3D11_QUERY_EVENT",
            "D3D11_QUERY_OCCLUSION",
            "D3D11_QUERY_TIMESTAMP",
            "D3D11_QUERY_TIMESTAMP_DISJOINT",
            "D3D11_QUERY_PIPELINE_STATISTICS",
            "D3D11_QUERY_OCCLUSION_PREDICATE",
            "D3D11_QUERY_SO_STATISTICS",
            "D3D11_QUERY_SO_OVERFLOW_PREDICATE",
        ],
    ))
    .enumeration(EnumDef::sequential(
        "D3D11_COUNTER_TYPE",
        u32_,
        &[
            "D3D11_COUNTER_TYPE_FLOAT32",
            "D3D11_COUNTER_TYPE_UINT16",
            "D3D11_COUNTER_TYPE_UINT32",
            "D3D11_COUNTER_TYPE_UINT64",
        ],
    ))
    .enumeration(EnumDef::sequential(
        "D3D11_FEATURE",
        u32_,
        &[
            "D3D11_FEATURE_THREADING",
            "D3D11_FEATURE_DOUBLES",
            "D3D11_FEATURE_FORMAT_SUPPORT",
            "D3D11_FEATURE_FORMAT_SUPPORT2",
            "D3D11_FEATURE_D3D10_X_HARDWARE_OPTIONS",
        ],
    ));
}

fn flags(b: &mut ApiBuilder) {
    let u32_ = Primitive::U32;
    b.flags(FlagsDef::with_bits(
        "D3D11_CREATE_DEVICE_FLAG",
        u32_,
        &[
            ("D3D11_CREATE_DEVICE_SINGLETHREADED", 0x1),
            ("D3D11_CREATE_DEVICE_DEBUG", 0x2),
            ("D3D11_CREATE_DEVICE_SWITCH_TO_REF", 0x4),
            ("D3D11_CREATE_DEVICE_PREVENT_INTERNAL_THREADING_OPTIMIZATIONS", 0x8),
            ("D3D11_CREATE_DEVICE_BGRA_SUPPORT", 0x20),
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3D11_BIND_FLAG",
        u32_,
        &[
            ("D3D11_BIND_VERTEX_BUFFER", 0x1),
            ("D3D11_BIND_INDEX_BUFFER", 0x2),
            ("D3D11_BIND_CONSTANT_BUFFER", 0x4),
            ("D3D11_BIND_SHADER_RESOURCE", 0x8),
            ("D3D11_BIND_STREAM_OUTPUT", 0x10),
            ("D3D11_BIND_RENDER_TARGET", 0x20),
            ("D3D11_BIND_DEPTH_STENCIL", 0x40),
            ("D3D11_BIND_UNORDERED_ACCESS", 0x80),
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3D11_CPU_ACCESS_FLAG",
        u32_,
        &[("D3D11_CPU_ACCESS_WRITE", 0x10000), ("D3D11_CPU_ACCESS_READ", 0x20000)],
    ))
    .flags(FlagsDef::with_bits(
        "D3D11_RESOURCE_MISC_FLAG",
        u32_,
        &[
            ("D3D11_RESOURCE_MISC_GENERATE_MIPS", 0x1),
            ("D3D11_RESOURCE_MISC_SHARED", 0x2),
            ("D3D11_RESOURCE_MISC_TEXTURECUBE", 0x4),
            ("D3D11_RESOURCE_MISC_DRAWINDIRECT_ARGS", 0x10),
            ("D3D11_RESOURCE_MISC_BUFFER_ALLOW_RAW_VIEWS", 0x20),
            ("D3D11_RESOURCE_MISC_BUFFER_STRUCTURED", 0x40),
            ("D3D11_RESOURCE_MISC_RESOURCE_CLAMP", 0x80),
            ("D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX", 0x100),
            ("D3D11_RESOURCE_MISC_GDI_COMPATIBLE", 0x200),
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3D11_MAP_FLAG",
        u32_,
        &[("D3D11_MAP_FLAG_DO_NOT_WAIT", 0x100000)],
    ))
    .flags(FlagsDef::with_bits(
        "D3D11_CLEAR_FLAG",
        u32_,
        &[("D3D11_CLEAR_DEPTH", 0x1), ("D3D11_CLEAR_STENCIL", 0x2)],
    ))
    .flags(FlagsDef::with_bits(
        "D3D11_COLOR_WRITE_ENABLE",
        Primitive::U8,
        &[
            ("D3D11_COLOR_WRITE_ENABLE_RED", 0x1),
            ("D3D11_COLOR_WRITE_ENABLE_GREEN", 0x2),
            ("D3D11_COLOR_WRITE_ENABLE_BLUE", 0x4),
            ("D3D11_COLOR_WRITE_ENABLE_ALPHA", 0x8),
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3D11_ASYNC_GETDATA_FLAG",
        u32_,
        &[("D3D11_ASYNC_GETDATA_DONOTFLUSH", 0x1)],
    ));
}

fn structs(b: &mut ApiBuilder) {
    let usage_fields = || {
        vec![
            (e("D3D11_USAGE"), "Usage"),
            (f("D3D11_BIND_FLAG"), "BindFlags"),
            (f("D3D11_CPU_ACCESS_FLAG"), "CPUAccessFlags"),
            (f("D3D11_RESOURCE_MISC_FLAG"), "MiscFlags"),
        ]
    };

    let mut buffer = vec![(uint(), "ByteWidth")];
    buffer.extend(usage_fields());
    buffer.push((uint(), "StructureByteStride"));

    let mut texture1d = vec![
        (uint(), "Width"),
        (uint(), "MipLevels"),
        (uint(), "ArraySize"),
        (e("DXGI_FORMAT"), "Format"),
    ];
    texture1d.extend(usage_fields());

    let mut texture2d = vec![
        (uint(), "Width"),
        (uint(), "Height"),
        (uint(), "MipLevels"),
        (uint(), "ArraySize"),
        (e("DXGI_FORMAT"), "Format"),
        (s("DXGI_SAMPLE_DESC"), "SampleDesc"),
    ];
    texture2d.extend(usage_fields());

    let mut texture3d = vec![
        (uint(), "Width"),
        (uint(), "Height"),
        (uint(), "Depth"),
        (uint(), "MipLevels"),
        (e("DXGI_FORMAT"), "Format"),
    ];
    texture3d.extend(usage_fields());

    b.structure(StructDef::new("DXGI_SAMPLE_DESC", vec![(uint(), "Count"), (uint(), "Quality")]))
        .structure(StructDef::new("D3D11_BUFFER_DESC", buffer))
        .structure(StructDef::new("D3D11_TEXTURE1D_DESC", texture1d))
        .structure(StructDef::new("D3D11_TEXTURE2D_DESC", texture2d))
        .structure(StructDef::new("D3D11_TEXTURE3D_DESC", texture3d))
        .structure(StructDef::new(
            "D3D11_SUBRESOURCE_DATA",
            vec![
                (Type::opaque_ptr(), "pSysMem"),
                (uint(), "SysMemPitch"),
                (uint(), "SysMemSlicePitch"),
            ],
        ))
        .structure(StructDef::new(
            "D3D11_MAPPED_SUBRESOURCE",
            vec![
                (Type::opaque_ptr(), "pData"),
                (uint(), "RowPitch"),
                (uint(), "DepthPitch"),
            ],
        ))
        .structure(StructDef::new(
            "D3D11_INPUT_ELEMENT_DESC",
            vec![
                (lpcstr(), "SemanticName"),
                (uint(), "SemanticIndex"),
                (e("DXGI_FORMAT"), "Format"),
                (uint(), "InputSlot"),
                (uint(), "AlignedByteOffset"),
                (e("D3D11_INPUT_CLASSIFICATION"), "InputSlotClass"),
                (uint(), "InstanceDataStepRate"),
            ],
        ))
        .structure(StructDef::new(
            "D3D11_SO_DECLARATION_ENTRY",
            vec![
                (uint(), "Stream"),
                (lpcstr(), "SemanticName"),
                (uint(), "SemanticIndex"),
                (uint8(), "StartComponent"),
                (uint8(), "ComponentCount"),
                (uint8(), "OutputSlot"),
            ],
        ))
        .structure(StructDef::new(
            "D3D11_RENDER_TARGET_BLEND_DESC",
            vec![
                (bool_(), "BlendEnable"),
                (e("D3D11_BLEND"), "SrcBlend"),
                (e("D3D11_BLEND"), "DestBlend"),
                (e("D3D11_BLEND_OP"), "BlendOp"),
                (e("D3D11_BLEND"), "SrcBlendAlpha"),
                (e("D3D11_BLEND"), "DestBlendAlpha"),
                (e("D3D11_BLEND_OP"), "BlendOpAlpha"),
                (f("D3D11_COLOR_WRITE_ENABLE"), "RenderTargetWriteMask"),
            ],
        ))
        .structure(StructDef::new(
            "D3D11_BLEND_DESC",
            vec![
                (bool_(), "AlphaToCoverageEnable"),
                (bool_(), "IndependentBlendEnable"),
                (
                    Type::array(
                        s("D3D11_RENDER_TARGET_BLEND_DESC"),
                        "D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT",
                    ),
                    "RenderTarget",
                ),
            ],
        ))
        .structure(StructDef::new(
            "D3D11_RASTERIZER_DESC",
            vec![
                (e("D3D11_FILL_MODE"), "FillMode"),
                (e("D3D11_CULL_MODE"), "CullMode"),
                (bool_(), "FrontCounterClockwise"),
                (int(), "DepthBias"),
                (float(), "DepthBiasClamp"),
                (float(), "SlopeScaledDepthBias"),
                (bool_(), "DepthClipEnable"),
                (bool_(), "ScissorEnable"),
                (bool_(), "MultisampleEnable"),
                (bool_(), "AntialiasedLineEnable"),
            ],
        ))
        .structure(StructDef::new(
            "D3D11_VIEWPORT",
            vec![
                (float(), "TopLeftX"),
                (float(), "TopLeftY"),
                (float(), "Width"),
                (float(), "Height"),
                (float(), "MinDepth"),
                (float(), "MaxDepth"),
            ],
        ))
        .structure(StructDef::new(
            "D3D11_BOX",
            vec![
                (uint(), "left"),
                (uint(), "top"),
                (uint(), "front"),
                (uint(), "right"),
                (uint(), "bottom"),
                (uint(), "back"),
            ],
        ))
        .structure(StructDef::new(
            "D3D11_QUERY_DESC",
            vec![(e("D3D11_QUERY"), "Query"), (uint(), "MiscFlags")],
        ))
        .structure(StructDef::new(
            "D3D11_COUNTER_DESC",
            vec![(uint(), "Counter"), (uint(), "MiscFlags")],
        ))
        .structure(StructDef::new(
            "D3D11_COUNTER_INFO",
            vec![
                (uint(), "LastDeviceDependentCounter"),
                (uint(), "NumSimultaneousCounters"),
                (uint8(), "NumDetectableParallelUnits"),
            ],
        ))
        .opaque_struct("D3D11_DEPTH_STENCIL_DESC")
        .opaque_struct("D3D11_SAMPLER_DESC")
        .opaque_struct("D3D11_SHADER_RESOURCE_VIEW_DESC")
        .opaque_struct("D3D11_RENDER_TARGET_VIEW_DESC")
        .opaque_struct("D3D11_DEPTH_STENCIL_VIEW_DESC")
        .opaque_struct("D3D11_UNORDERED_ACCESS_VIEW_DESC")
        .opaque_struct("D3D11_CLASS_INSTANCE_DESC");
}

fn device_child(b: &mut ApiBuilder) {
    b.interface("ID3D11DeviceChild", Some("IUnknown")).methods(
        "ID3D11DeviceChild",
        vec![
            m(Type::void(), "GetDevice").out(out_object("ID3D11Device"), "ppDevice"),
            m(hresult(), "GetPrivateData")
                .arg(refguid(), "guid")
                .inout(Type::ptr(uint()), "pDataSize")
                .out(Type::opaque_blob(Type::void(), "*pDataSize"), "pData")
                .no_side_effects(),
            m(hresult(), "SetPrivateData")
                .arg(refguid(), "guid")
                .arg(uint(), "DataSize")
                .arg(Type::opaque_blob(Type::void(), "DataSize"), "pData")
                .no_side_effects(),
            m(hresult(), "SetPrivateDataInterface")
                .arg(refguid(), "guid")
                .arg(obj("IUnknown"), "pData")
                .no_side_effects(),
        ],
    );
}

fn get_desc(desc: &str) -> Vec<Callable> {
    vec![m(Type::void(), "GetDesc")
        .out(out_struct(desc), "pDesc")
        .no_side_effects()]
}

fn children(b: &mut ApiBuilder) {
    for (name, desc) in [
        ("ID3D11DepthStencilState", "D3D11_DEPTH_STENCIL_DESC"),
        ("ID3D11BlendState", "D3D11_BLEND_DESC"),
        ("ID3D11RasterizerState", "D3D11_RASTERIZER_DESC"),
        ("ID3D11SamplerState", "D3D11_SAMPLER_DESC"),
    ] {
        b.interface(name, Some("ID3D11DeviceChild"))
            .methods(name, get_desc(desc));
    }

    b.interface("ID3D11Resource", Some("ID3D11DeviceChild")).methods(
        "ID3D11Resource",
        vec![
            m(Type::void(), "GetType")
                .out(Type::ptr(e("D3D11_RESOURCE_DIMENSION")), "pResourceDimension")
                .no_side_effects(),
            m(Type::void(), "SetEvictionPriority").arg(uint(), "EvictionPriority"),
            m(uint(), "GetEvictionPriority").no_side_effects(),
        ],
    );
    for (name, desc) in [
        ("ID3D11Buffer", "D3D11_BUFFER_DESC"),
        ("ID3D11Texture1D", "D3D11_TEXTURE1D_DESC"),
        ("ID3D11Texture2D", "D3D11_TEXTURE2D_DESC"),
        ("ID3D11Texture3D", "D3D11_TEXTURE3D_DESC"),
    ] {
        b.interface(name, Some("ID3D11Resource"))
            .methods(name, get_desc(desc));
    }

    b.interface("ID3D11View", Some("ID3D11DeviceChild")).methods(
        "ID3D11View",
        vec![m(Type::void(), "GetResource").out(out_object("ID3D11Resource"), "ppResource")],
    );
    for (name, desc) in [
        ("ID3D11ShaderResourceView", "D3D11_SHADER_RESOURCE_VIEW_DESC"),
        ("ID3D11RenderTargetView", "D3D11_RENDER_TARGET_VIEW_DESC"),
        ("ID3D11DepthStencilView", "D3D11_DEPTH_STENCIL_VIEW_DESC"),
        ("ID3D11UnorderedAccessView", "D3D11_UNORDERED_ACCESS_VIEW_DESC"),
    ] {
        b.interface(name, Some("ID3D11View"))
            .methods(name, get_desc(desc));
    }

    for stage in STAGES {
        b.interface(shader_interface(stage), Some("ID3D11DeviceChild"));
    }
    b.interface("ID3D11InputLayout", Some("ID3D11DeviceChild"));

    b.interface("ID3D11Asynchronous", Some("ID3D11DeviceChild"))
        .methods(
            "ID3D11Asynchronous",
            vec![m(uint(), "GetDataSize").no_side_effects()],
        )
        .interface("ID3D11Query", Some("ID3D11Asynchronous"))
        .methods("ID3D11Query", get_desc("D3D11_QUERY_DESC"))
        .interface("ID3D11Predicate", Some("ID3D11Query"))
        .interface("ID3D11Counter", Some("ID3D11Asynchronous"))
        .methods("ID3D11Counter", get_desc("D3D11_COUNTER_DESC"));

    let name_getter = |name: &str, out: &str| {
        m(Type::void(), name)
            .out(Type::opaque_blob(Type::void(), "*pBufferLength"), out)
            .inout(Type::ptr(size_t()), "pBufferLength")
            .no_side_effects()
    };
    b.interface("ID3D11ClassInstance", Some("ID3D11DeviceChild"))
        .methods(
            "ID3D11ClassInstance",
            vec![
                m(Type::void(), "GetClassLinkage")
                    .out(out_object("ID3D11ClassLinkage"), "ppLinkage"),
                m(Type::void(), "GetDesc")
                    .out(out_struct("D3D11_CLASS_INSTANCE_DESC"), "pDesc")
                    .no_side_effects(),
                name_getter("GetInstanceName", "pInstanceName"),
                name_getter("GetTypeName", "pTypeName"),
            ],
        )
        .interface("ID3D11ClassLinkage", Some("ID3D11DeviceChild"))
        .methods(
            "ID3D11ClassLinkage",
            vec![
                m(hresult(), "GetClassInstance")
                    .arg(lpcstr(), "pClassInstanceName")
                    .arg(uint(), "InstanceIndex")
                    .out(out_object("ID3D11ClassInstance"), "ppInstance"),
                m(hresult(), "CreateClassInstance")
                    .arg(lpcstr(), "pClassTypeName")
                    .arg(uint(), "ConstantBufferOffset")
                    .arg(uint(), "ConstantVectorOffset")
                    .arg(uint(), "TextureOffset")
                    .arg(uint(), "SamplerOffset")
                    .out(out_object("ID3D11ClassInstance"), "ppInstance"),
            ],
        )
        .interface("ID3D11CommandList", Some("ID3D11DeviceChild"))
        .methods(
            "ID3D11CommandList",
            vec![m(uint(), "GetContextFlags").no_side_effects()],
        );
}

fn create_shader(stage: &str, name: &str) -> Callable {
    let iface = shader_interface(stage);
    let out = format!("pp{}", &iface["ID3D11".len()..]);
    m(hresult(), name)
        .arg(shader_bytecode(), "pShaderBytecode")
        .arg(size_t(), "BytecodeLength")
        .arg(obj("ID3D11ClassLinkage"), "pClassLinkage")
        .out(out_object(iface), &out)
}

fn create_view(name: &str, desc: &str, iface: &str, out: &str) -> Callable {
    m(hresult(), name)
        .arg(obj("ID3D11Resource"), "pResource")
        .arg(in_struct(desc), "pDesc")
        .out(out_object(iface), out)
}

fn create_texture(name: &str, desc: &str, subresources: &str, iface: &str) -> Callable {
    m(hresult(), name)
        .arg(in_struct(desc), "pDesc")
        .arg(Type::array(s("D3D11_SUBRESOURCE_DATA"), subresources), "pInitialData")
        .out(out_object(iface), &format!("pp{}", &iface["ID3D11".len()..]))
}

fn device(b: &mut ApiBuilder) {
    b.interface("ID3D11Device", Some("IUnknown")).methods(
        "ID3D11Device",
        vec![
            m(hresult(), "CreateBuffer")
                .arg(in_struct("D3D11_BUFFER_DESC"), "pDesc")
                .arg(in_struct("D3D11_SUBRESOURCE_DATA"), "pInitialData")
                .out(out_object("ID3D11Buffer"), "ppBuffer"),
            create_texture(
                "CreateTexture1D",
                "D3D11_TEXTURE1D_DESC",
                "pDesc->MipLevels*pDesc->ArraySize",
                "ID3D11Texture1D",
            ),
            create_texture(
                "CreateTexture2D",
                "D3D11_TEXTURE2D_DESC",
                "pDesc->MipLevels*pDesc->ArraySize",
                "ID3D11Texture2D",
            ),
            create_texture(
                "CreateTexture3D",
                "D3D11_TEXTURE3D_DESC",
                "pDesc->MipLevels",
                "ID3D11Texture3D",
            ),
            create_view(
                "CreateShaderResourceView",
                "D3D11_SHADER_RESOURCE_VIEW_DESC",
                "ID3D11ShaderResourceView",
                "ppSRView",
            ),
            create_view(
                "CreateUnorderedAccessView",
                "D3D11_UNORDERED_ACCESS_VIEW_DESC",
                "ID3D11UnorderedAccessView",
                "ppUAView",
            ),
            create_view(
                "CreateRenderTargetView",
                "D3D11_RENDER_TARGET_VIEW_DESC",
                "ID3D11RenderTargetView",
                "ppRTView",
            ),
            create_view(
                "CreateDepthStencilView",
                "D3D11_DEPTH_STENCIL_VIEW_DESC",
                "ID3D11DepthStencilView",
                "ppDepthStencilView",
            ),
            m(hresult(), "CreateInputLayout")
                .arg(
                    Type::array(s("D3D11_INPUT_ELEMENT_DESC"), "NumElements"),
                    "pInputElementDescs",
                )
                .arg(uint(), "NumElements")
                .arg(shader_bytecode(), "pShaderBytecodeWithInputSignature")
                .arg(size_t(), "BytecodeLength")
                .out(out_object("ID3D11InputLayout"), "ppInputLayout"),
            create_shader("VS", "CreateVertexShader"),
            create_shader("GS", "CreateGeometryShader"),
            m(hresult(), "CreateGeometryShaderWithStreamOutput")
                .arg(shader_bytecode(), "pShaderBytecode")
                .arg(size_t(), "BytecodeLength")
                .arg(
                    Type::array(s("D3D11_SO_DECLARATION_ENTRY"), "NumEntries"),
                    "pSODeclaration",
                )
                .arg(uint(), "NumEntries")
                .arg(Type::array(uint(), "NumStrides"), "pBufferStrides")
                .arg(uint(), "NumStrides")
                .arg(uint(), "RasterizedStream")
                .arg(obj("ID3D11ClassLinkage"), "pClassLinkage")
                .out(out_object("ID3D11GeometryShader"), "ppGeometryShader"),
            create_shader("PS", "CreatePixelShader"),
            create_shader("HS", "CreateHullShader"),
            create_shader("DS", "CreateDomainShader"),
            create_shader("CS", "CreateComputeShader"),
            m(hresult(), "CreateClassLinkage").out(out_object("ID3D11ClassLinkage"), "ppLinkage"),
            m(hresult(), "CreateBlendState")
                .arg(in_struct("D3D11_BLEND_DESC"), "pBlendStateDesc")
                .out(out_object("ID3D11BlendState"), "ppBlendState"),
            m(hresult(), "CreateDepthStencilState")
                .arg(in_struct("D3D11_DEPTH_STENCIL_DESC"), "pDepthStencilDesc")
                .out(out_object("ID3D11DepthStencilState"), "ppDepthStencilState"),
            m(hresult(), "CreateRasterizerState")
                .arg(in_struct("D3D11_RASTERIZER_DESC"), "pRasterizerDesc")
                .out(out_object("ID3D11RasterizerState"), "ppRasterizerState"),
            m(hresult(), "CreateSamplerState")
                .arg(in_struct("D3D11_SAMPLER_DESC"), "pSamplerDesc")
                .out(out_object("ID3D11SamplerState"), "ppSamplerState"),
            m(hresult(), "CreateQuery")
                .arg(in_struct("D3D11_QUERY_DESC"), "pQueryDesc")
                .out(out_object("ID3D11Query"), "ppQuery"),
            m(hresult(), "CreatePredicate")
                .arg(in_struct("D3D11_QUERY_DESC"), "pPredicateDesc")
                .out(out_object("ID3D11Predicate"), "ppPredicate"),
            m(hresult(), "CreateCounter")
                .arg(in_struct("D3D11_COUNTER_DESC"), "pCounterDesc")
                .out(out_object("ID3D11Counter"), "ppCounter"),
            m(hresult(), "CreateDeferredContext")
                .arg(uint(), "ContextFlags")
                .out(out_object("ID3D11DeviceContext"), "ppDeferredContext"),
            m(hresult(), "OpenSharedResource")
                .arg(winapi::handle(), "hResource")
                .arg(refiid(), "ReturnedInterface")
                .out(out_unknown(), "ppResource"),
            m(hresult(), "CheckFormatSupport")
                .arg(e("DXGI_FORMAT"), "Format")
                .out(Type::ptr(uint()), "pFormatSupport")
                .no_side_effects(),
            m(hresult(), "CheckMultisampleQualityLevels")
                .arg(e("DXGI_FORMAT"), "Format")
                .arg(uint(), "SampleCount")
                .out(Type::ptr(uint()), "pNumQualityLevels")
                .no_side_effects(),
            m(Type::void(), "CheckCounterInfo")
                .out(out_struct("D3D11_COUNTER_INFO"), "pCounterInfo")
                .no_side_effects(),
            m(hresult(), "CheckCounter")
                .arg(in_struct("D3D11_COUNTER_DESC"), "pDesc")
                .out(Type::ptr(e("D3D11_COUNTER_TYPE")), "pType")
                .out(Type::ptr(uint()), "pActiveCounters")
                .out(Type::opaque_blob(Type::void(), "*pNameLength"), "szName")
                .inout(Type::ptr(uint()), "pNameLength")
                .out(Type::opaque_blob(Type::void(), "*pUnitsLength"), "szUnits")
                .inout(Type::ptr(uint()), "pUnitsLength")
                .out(Type::opaque_blob(Type::void(), "*pDescriptionLength"), "szDescription")
                .inout(Type::ptr(uint()), "pDescriptionLength")
                .no_side_effects(),
            m(hresult(), "CheckFeatureSupport")
                .arg(e("D3D11_FEATURE"), "Feature")
                .out(
                    Type::opaque_blob(Type::void(), "FeatureSupportDataSize"),
                    "pFeatureSupportData",
                )
                .arg(uint(), "FeatureSupportDataSize")
                .no_side_effects(),
            m(hresult(), "GetPrivateData")
                .arg(refguid(), "guid")
                .inout(Type::ptr(uint()), "pDataSize")
                .out(Type::opaque_blob(Type::void(), "*pDataSize"), "pData")
                .no_side_effects(),
            m(hresult(), "SetPrivateData")
                .arg(refguid(), "guid")
                .arg(uint(), "DataSize")
                .arg(Type::opaque_blob(Type::void(), "DataSize"), "pData")
                .no_side_effects(),
            m(hresult(), "SetPrivateDataInterface")
                .arg(refguid(), "guid")
                .arg(obj("IUnknown"), "pData")
                .no_side_effects(),
            m(e("D3D_FEATURE_LEVEL"), "GetFeatureLevel").no_side_effects(),
            m(f("D3D11_CREATE_DEVICE_FLAG"), "GetCreationFlags").no_side_effects(),
            m(hresult(), "GetDeviceRemovedReason").no_side_effects(),
            m(Type::void(), "GetImmediateContext")
                .out(out_object("ID3D11DeviceContext"), "ppImmediateContext"),
            m(hresult(), "SetExceptionMode").arg(uint(), "RaiseFlags"),
            m(uint(), "GetExceptionMode").no_side_effects(),
        ],
    );
}

fn set_resources(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}SetShaderResources"))
        .arg(uint(), "StartSlot")
        .arg(uint(), "NumViews")
        .arg(
            Type::array(obj("ID3D11ShaderResourceView"), "NumViews"),
            "ppShaderResourceViews",
        )
}

fn get_resources(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}GetShaderResources"))
        .arg(uint(), "StartSlot")
        .arg(uint(), "NumViews")
        .out(
            Type::array(obj("ID3D11ShaderResourceView"), "NumViews"),
            "ppShaderResourceViews",
        )
}

fn set_shader(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}SetShader"))
        .arg(obj(shader_interface(stage)), "pShader")
        .arg(
            Type::array(obj("ID3D11ClassInstance"), "NumClassInstances"),
            "ppClassInstances",
        )
        .arg(uint(), "NumClassInstances")
}

fn get_shader(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}GetShader"))
        .out(out_object(shader_interface(stage)), "ppShader")
        .out(
            Type::array(obj("ID3D11ClassInstance"), "*pNumClassInstances"),
            "ppClassInstances",
        )
        .inout(Type::ptr(uint()), "pNumClassInstances")
}

fn set_samplers(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}SetSamplers"))
        .arg(uint(), "StartSlot")
        .arg(uint(), "NumSamplers")
        .arg(Type::array(obj("ID3D11SamplerState"), "NumSamplers"), "ppSamplers")
}

fn get_samplers(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}GetSamplers"))
        .arg(uint(), "StartSlot")
        .arg(uint(), "NumSamplers")
        .out(Type::array(obj("ID3D11SamplerState"), "NumSamplers"), "ppSamplers")
}

fn set_constant_buffers(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}SetConstantBuffers"))
        .arg(uint(), "StartSlot")
        .arg(uint(), "NumBuffers")
        .arg(Type::array(obj("ID3D11Buffer"), "NumBuffers"), "ppConstantBuffers")
}

fn get_constant_buffers(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}GetConstantBuffers"))
        .arg(uint(), "StartSlot")
        .arg(uint(), "NumBuffers")
        .out(Type::array(obj("ID3D11Buffer"), "NumBuffers"), "ppConstantBuffers")
}

fn draw_indirect(name: &str) -> Callable {
    m(Type::void(), name)
        .arg(obj("ID3D11Buffer"), "pBufferForArgs")
        .arg(uint(), "AlignedByteOffsetForArgs")
}

fn context(b: &mut ApiBuilder) {
    let resource = || obj("ID3D11Resource");
    let async_ = || obj("ID3D11Asynchronous");
    let rtv = || obj("ID3D11RenderTargetView");
    let dsv = || obj("ID3D11DepthStencilView");
    let uav = || obj("ID3D11UnorderedAccessView");
    let buffer = || obj("ID3D11Buffer");

    let methods = vec![
        set_constant_buffers("VS"),
        set_resources("PS"),
        set_shader("PS"),
        set_samplers("PS"),
        set_shader("VS"),
        m(Type::void(), "DrawIndexed")
            .arg(uint(), "IndexCount")
            .arg(uint(), "StartIndexLocation")
            .arg(int(), "BaseVertexLocation"),
        m(Type::void(), "Draw")
            .arg(uint(), "VertexCount")
            .arg(uint(), "StartVertexLocation"),
        m(hresult(), "Map")
            .arg(resource(), "pResource")
            .arg(uint(), "Subresource")
            .arg(e("D3D11_MAP"), "MapType")
            .arg(f("D3D11_MAP_FLAG"), "MapFlags")
            .out(out_struct("D3D11_MAPPED_SUBRESOURCE"), "pMappedResource"),
        m(Type::void(), "Unmap")
            .arg(resource(), "pResource")
            .arg(uint(), "Subresource"),
        set_constant_buffers("PS"),
        m(Type::void(), "IASetInputLayout").arg(obj("ID3D11InputLayout"), "pInputLayout"),
        m(Type::void(), "IASetVertexBuffers")
            .arg(uint(), "StartSlot")
            .arg(uint(), "NumBuffers")
            .arg(Type::array(buffer(), "NumBuffers"), "ppVertexBuffers")
            .arg(Type::array(uint(), "NumBuffers"), "pStrides")
            .arg(Type::array(uint(), "NumBuffers"), "pOffsets"),
        m(Type::void(), "IASetIndexBuffer")
            .arg(buffer(), "pIndexBuffer")
            .arg(e("DXGI_FORMAT"), "Format")
            .arg(uint(), "Offset"),
        m(Type::void(), "DrawIndexedInstanced")
            .arg(uint(), "IndexCountPerInstance")
            .arg(uint(), "InstanceCount")
            .arg(uint(), "StartIndexLocation")
            .arg(int(), "BaseVertexLocation")
            .arg(uint(), "StartInstanceLocation"),
        m(Type::void(), "DrawInstanced")
            .arg(uint(), "VertexCountPerInstance")
            .arg(uint(), "InstanceCount")
            .arg(uint(), "StartVertexLocation")
            .arg(uint(), "StartInstanceLocation"),
        set_constant_buffers("GS"),
        set_shader("GS"),
        m(Type::void(), "IASetPrimitiveTopology")
            .arg(e("D3D11_PRIMITIVE_TOPOLOGY"), "Topology"),
        set_resources("VS"),
        set_samplers("VS"),
        m(Type::void(), "Begin").arg(async_(), "pAsync"),
        m(Type::void(), "End").arg(async_(), "pAsync"),
        m(hresult(), "GetData")
            .arg(async_(), "pAsync")
            .out(Type::blob(Type::void(), "DataSize"), "pData")
            .arg(uint(), "DataSize")
            .arg(f("D3D11_ASYNC_GETDATA_FLAG"), "GetDataFlags")
            .no_side_effects(),
        m(Type::void(), "SetPredication")
            .arg(obj("ID3D11Predicate"), "pPredicate")
            .arg(bool_(), "PredicateValue"),
        set_resources("GS"),
        set_samplers("GS"),
        m(Type::void(), "OMSetRenderTargets")
            .arg(uint(), "NumViews")
            .arg(Type::array(rtv(), "NumViews"), "ppRenderTargetViews")
            .arg(dsv(), "pDepthStencilView"),
        m(Type::void(), "OMSetRenderTargetsAndUnorderedAccessViews")
            .arg(uint(), "NumRTVs")
            .arg(Type::array(rtv(), "_viewCount(NumRTVs)"), "ppRenderTargetViews")
            .arg(dsv(), "pDepthStencilView")
            .arg(uint(), "UAVStartSlot")
            .arg(uint(), "NumUAVs")
            .arg(Type::array(uav(), "_viewCount(NumUAVs)"), "ppUnorderedAccessViews")
            .arg(Type::array(uint(), "_viewCount(NumUAVs)"), "pUAVInitialCounts"),
        m(Type::void(), "OMSetBlendState")
            .arg(obj("ID3D11BlendState"), "pBlendState")
            .arg(Type::array(float(), "4"), "BlendFactor")
            .arg(uint(), "SampleMask"),
        m(Type::void(), "OMSetDepthStencilState")
            .arg(obj("ID3D11DepthStencilState"), "pDepthStencilState")
            .arg(uint(), "StencilRef"),
        m(Type::void(), "SOSetTargets")
            .arg(uint(), "NumBuffers")
            .arg(Type::array(buffer(), "NumBuffers"), "ppSOTargets")
            .arg(Type::array(uint(), "NumBuffers"), "pOffsets"),
        m(Type::void(), "DrawAuto"),
        draw_indirect("DrawIndexedInstancedIndirect"),
        draw_indirect("DrawInstancedIndirect"),
        m(Type::void(), "Dispatch")
            .arg(uint(), "ThreadGroupCountX")
            .arg(uint(), "ThreadGroupCountY")
            .arg(uint(), "ThreadGroupCountZ"),
        draw_indirect("DispatchIndirect"),
        m(Type::void(), "RSSetState").arg(obj("ID3D11RasterizerState"), "pRasterizerState"),
        m(Type::void(), "RSSetViewports")
            .arg(uint(), "NumViewports")
            .arg(Type::array(s("D3D11_VIEWPORT"), "NumViewports"), "pViewports"),
        m(Type::void(), "RSSetScissorRects")
            .arg(uint(), "NumRects")
            .arg(Type::array(s("RECT"), "NumRects"), "pRects"),
        m(Type::void(), "CopySubresourceRegion")
            .arg(resource(), "pDstResource")
            .arg(uint(), "DstSubresource")
            .arg(uint(), "DstX")
            .arg(uint(), "DstY")
            .arg(uint(), "DstZ")
            .arg(resource(), "pSrcResource")
            .arg(uint(), "SrcSubresource")
            .arg(in_struct("D3D11_BOX"), "pSrcBox"),
        m(Type::void(), "CopyResource")
            .arg(resource(), "pDstResource")
            .arg(resource(), "pSrcResource"),
        m(Type::void(), "UpdateSubresource")
            .arg(resource(), "pDstResource")
            .arg(uint(), "DstSubresource")
            .arg(in_struct("D3D11_BOX"), "pDstBox")
            .arg(Type::opaque_ptr(), "pSrcData")
            .arg(uint(), "SrcRowPitch")
            .arg(uint(), "SrcDepthPitch"),
        m(Type::void(), "CopyStructureCount")
            .arg(buffer(), "pDstBuffer")
            .arg(uint(), "DstAlignedByteOffset")
            .arg(uav(), "pSrcView"),
        m(Type::void(), "ClearRenderTargetView")
            .arg(rtv(), "pRenderTargetView")
            .arg(Type::array(float(), "4"), "ColorRGBA"),
        m(Type::void(), "ClearUnorderedAccessViewUint")
            .arg(uav(), "pUnorderedAccessView")
            .arg(Type::array(uint(), "4"), "Values"),
        m(Type::void(), "ClearUnorderedAccessViewFloat")
            .arg(uav(), "pUnorderedAccessView")
            .arg(Type::array(float(), "4"), "Values"),
        m(Type::void(), "ClearDepthStencilView")
            .arg(dsv(), "pDepthStencilView")
            .arg(f("D3D11_CLEAR_FLAG"), "ClearFlags")
            .arg(float(), "Depth")
            .arg(uint8(), "Stencil"),
        m(Type::void(), "GenerateMips").arg(obj("ID3D11ShaderResourceView"), "pShaderResourceView"),
        m(Type::void(), "SetResourceMinLOD")
            .arg(resource(), "pResource")
            .arg(float(), "MinLOD"),
        m(float(), "GetResourceMinLOD")
            .arg(resource(), "pResource")
            .no_side_effects(),
        m(Type::void(), "ResolveSubresource")
            .arg(resource(), "pDstResource")
            .arg(uint(), "DstSubresource")
            .arg(resource(), "pSrcResource")
            .arg(uint(), "SrcSubresource")
            .arg(e("DXGI_FORMAT"), "Format"),
        m(Type::void(), "ExecuteCommandList")
            .arg(obj("ID3D11CommandList"), "pCommandList")
            .arg(bool_(), "RestoreContextState"),
        set_resources("HS"),
        set_shader("HS"),
        set_samplers("HS"),
        set_constant_buffers("HS"),
        set_resources("DS"),
        set_shader("DS"),
        set_samplers("DS"),
        set_constant_buffers("DS"),
        set_resources("CS"),
        m(Type::void(), "CSSetUnorderedAccessViews")
            .arg(uint(), "StartSlot")
            .arg(uint(), "NumUAVs")
            .arg(Type::array(uav(), "NumUAVs"), "ppUnorderedAccessViews")
            .arg(Type::array(uint(), "NumUAVs"), "pUAVInitialCounts"),
        set_shader("CS"),
        set_samplers("CS"),
        set_constant_buffers("CS"),
        get_constant_buffers("VS"),
        get_resources("PS"),
        get_shader("PS"),
        get_samplers("PS"),
        get_shader("VS"),
        get_constant_buffers("PS"),
        m(Type::void(), "IAGetInputLayout").out(out_object("ID3D11InputLayout"), "ppInputLayout"),
        m(Type::void(), "IAGetVertexBuffers")
            .arg(uint(), "StartSlot")
            .arg(uint(), "NumBuffers")
            .out(Type::array(buffer(), "NumBuffers"), "ppVertexBuffers")
            .out(Type::array(uint(), "NumBuffers"), "pStrides")
            .out(Type::array(uint(), "NumBuffers"), "pOffsets"),
        m(Type::void(), "IAGetIndexBuffer")
            .out(out_object("ID3D11Buffer"), "pIndexBuffer")
            .out(Type::ptr(e("DXGI_FORMAT")), "Format")
            .out(Type::ptr(uint()), "Offset"),
        get_constant_buffers("GS"),
        get_shader("GS"),
        m(Type::void(), "IAGetPrimitiveTopology")
            .out(Type::ptr(e("D3D11_PRIMITIVE_TOPOLOGY")), "pTopology")
            .no_side_effects(),
        get_resources("VS"),
        get_samplers("VS"),
        m(Type::void(), "GetPredication")
            .out(out_object("ID3D11Predicate"), "ppPredicate")
            .out(Type::ptr(bool_()), "pPredicateValue"),
        get_resources("GS"),
        get_samplers("GS"),
        m(Type::void(), "OMGetRenderTargets")
            .arg(uint(), "NumViews")
            .out(Type::array(rtv(), "NumViews"), "ppRenderTargetViews")
            .out(out_object("ID3D11DepthStencilView"), "ppDepthStencilView"),
        m(Type::void(), "OMGetRenderTargetsAndUnorderedAccessViews")
            .arg(uint(), "NumRTVs")
            .out(Type::array(rtv(), "NumRTVs"), "ppRenderTargetViews")
            .out(out_object("ID3D11DepthStencilView"), "ppDepthStencilView")
            .arg(uint(), "UAVStartSlot")
            .arg(uint(), "NumUAVs")
            .out(Type::array(uav(), "NumUAVs"), "ppUnorderedAccessViews"),
        m(Type::void(), "OMGetBlendState")
            .out(out_object("ID3D11BlendState"), "ppBlendState")
            .out(Type::array(float(), "4"), "BlendFactor")
            .out(Type::ptr(uint()), "pSampleMask"),
        m(Type::void(), "OMGetDepthStencilState")
            .out(out_object("ID3D11DepthStencilState"), "ppDepthStencilState")
            .out(Type::ptr(uint()), "pStencilRef"),
        m(Type::void(), "SOGetTargets")
            .arg(uint(), "NumBuffers")
            .out(Type::array(buffer(), "NumBuffers"), "ppSOTargets"),
        m(Type::void(), "RSGetState").out(out_object("ID3D11RasterizerState"), "ppRasterizerState"),
        m(Type::void(), "RSGetViewports")
            .inout(Type::ptr(uint()), "pNumViewports")
            .out(Type::array(s("D3D11_VIEWPORT"), "*pNumViewports"), "pViewports")
            .no_side_effects(),
        m(Type::void(), "RSGetScissorRects")
            .inout(Type::ptr(uint()), "pNumRects")
            .out(Type::array(s("RECT"), "*pNumRects"), "pRects")
            .no_side_effects(),
        get_resources("HS"),
        get_shader("HS"),
        get_samplers("HS"),
        get_constant_buffers("HS"),
        get_resources("DS"),
        get_shader("DS"),
        get_samplers("DS"),
        get_constant_buffers("DS"),
        get_resources("CS"),
        m(Type::void(), "CSGetUnorderedAccessViews")
            .arg(uint(), "StartSlot")
            .arg(uint(), "NumUAVs")
            .out(Type::array(uav(), "NumUAVs"), "ppUnorderedAccessViews"),
        get_shader("CS"),
        get_samplers("CS"),
        get_constant_buffers("CS"),
        m(Type::void(), "ClearState"),
        m(Type::void(), "Flush"),
        m(e("D3D11_DEVICE_CONTEXT_TYPE"), "GetType").no_side_effects(),
        m(uint(), "GetContextFlags").no_side_effects(),
        m(hresult(), "FinishCommandList")
            .arg(bool_(), "RestoreDeferredContextState")
            .out(out_object("ID3D11CommandList"), "ppCommandList"),
    ];
    b.interface("ID3D11DeviceContext", Some("ID3D11DeviceChild"))
        .methods("ID3D11DeviceContext", methods);
}

fn functions(b: &mut ApiBuilder) {
    b.function(
        m(hresult(), "D3D11CreateDevice")
            .arg(Type::unknown_object(), "pAdapter")
            .arg(e("D3D_DRIVER_TYPE"), "DriverType")
            .arg(hmodule(), "Software")
            .arg(f("D3D11_CREATE_DEVICE_FLAG"), "Flags")
            .arg(Type::array(e("D3D_FEATURE_LEVEL"), "FeatureLevels"), "pFeatureLevels")
            .arg(uint(), "FeatureLevels")
            .arg(uint(), "SDKVersion")
            .out(out_object("ID3D11Device"), "ppDevice")
            .out(Type::ptr(e("D3D_FEATURE_LEVEL")), "pFeatureLevel")
            .out(out_object("ID3D11DeviceContext"), "ppImmediateContext"),
    );
}

/// Unresolved tables for `d3d11.dll` without the 11.1 additions.
pub fn builder() -> ApiBuilder {
    let mut b = ApiBuilder::new("d3d11");
    declare(&mut b);
    b
}

pub(crate) fn declare(b: &mut ApiBuilder) {
    winapi::declare(b);
    b.constant("D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT", 8)
        .constant("D3D11_COMMONSHADER_CONSTANT_BUFFER_API_SLOT_COUNT", 14)
        .constant("D3D11_KEEP_RENDER_TARGETS_AND_DEPTH_STENCIL", D3D11_KEEP_VIEWS)
        .constant("D3D11_KEEP_UNORDERED_ACCESS_VIEWS", D3D11_KEEP_VIEWS)
        .helper("_viewCount", 1);
    enums(b);
    flags(b);
    structs(b);
    device_child(b);
    children(b);
    device(b);
    context(b);
    functions(b);
    winapi::iids(b, IIDS);
}

/// Records shader bytecode (`pShaderBytecode*` blobs) as disassembly text.
pub fn hooks() -> Hooks {
    Hooks::new()
        .with_helpers(helpers())
        .with_serialize_arg(|ctx| {
            if let Some(encoding) = winapi::iid_encoding(ctx) {
                return encoding;
            }
            let is_blob = matches!(ctx.param.param.ty.canonical(), Type::Blob { .. });
            if is_blob && ctx.param.name().starts_with("pShaderBytecode") {
                ArgEncoding::ShaderText(ShaderFormat::Dxbc)
            } else {
                ArgEncoding::Default
            }
        })
}
