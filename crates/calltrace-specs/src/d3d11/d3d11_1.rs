//! Direct3D 11.1: new feature level, device flags and the `*1` interfaces.
//!
//! Everything here extends the 11.0 tables in place; enum and flag values declared by 11.0
//! keep their numbers.

use calltrace_api::{ApiBuilder, Callable, EnumDef, FlagsDef, Primitive, StructDef, Type};

use super::{e, f, in_struct, m, obj, out_struct, s, STAGES};
use crate::winapi::{
    self, bool_, float, handle, hresult, int, lpcwstr, out_object, out_unknown, refiid, uint,
    uint8,
};

const IIDS: &[(&str, &str)] = &[
    ("ID3D11BlendState1", "cc86fabe-da55-401d-85e7-e3c9de2877e9"),
    ("ID3D11RasterizerState1", "1217d7a6-5039-418c-b042-9cbe256afd6e"),
    ("ID3DDeviceContextState", "5c1e0d8a-7c23-48f9-8c59-a92958ceff11"),
    ("ID3D11DeviceContext1", "bb2c6faa-b5fb-4082-8e6b-388b8cfa90e1"),
    ("ID3D11Device1", "a04bfb29-08ef-43d6-a49c-a9bdbdcbe686"),
    ("ID3DUserDefinedAnnotation", "b2daad8b-03d4-4dbf-95eb-32ab4b63d0ab"),
];

/// `d3d11.dll` tables including the 11.1 additions.
pub fn builder() -> ApiBuilder {
    let mut b = ApiBuilder::new("d3d11_1");
    super::declare(&mut b);
    extend(&mut b);
    b
}

pub fn extend(b: &mut ApiBuilder) {
    b.extend_enum("D3D_FEATURE_LEVEL", &[("D3D_FEATURE_LEVEL_11_1", Some(0xb100))])
        .extend_flags(
            "D3D11_CREATE_DEVICE_FLAG",
            &[
                ("D3D11_CREATE_DEVICE_DEBUGGABLE", Some(0x40)),
                (
                    "D3D11_CREATE_DEVICE_PREVENT_ALTERING_LAYER_SETTINGS_FROM_REGISTRY",
                    Some(0x80),
                ),
                ("D3D11_CREATE_DEVICE_DISABLE_GPU_TIMEOUT", Some(0x100)),
                ("D3D11_CREATE_DEVICE_VIDEO_SUPPORT", Some(0x800)),
            ],
        );

    let u32_ = Primitive::U32;
    b.enumeration(EnumDef::with_values(
        "D3D_MIN_PRECISION",
        u32_,
        &[
            ("D3D_MIN_PRECISION_DEFAULT", 0),
            ("D3D_MIN_PRECISION_FLOAT_16", 1),
            ("D3D_MIN_PRECISION_FLOAT_2_8", 2),
            ("D3D_MIN_PRECISION_RESERVED", 3),
            ("D3D_MIN_PRECISION_SINT_16", 4),
            ("D3D_MIN_PRECISION_UINT_16", 5),
            ("D3D_MIN_PRECISION_ANY_16", 0xf0),
            ("D3D_MIN_PRECISION_ANY_10", 0xf1),
        ],
    ))
    .enumeration(EnumDef::sequential(
        "D3D11_LOGIC_OP",
        u32_,
        &[
            "D3D11_LOGIC_OP_CLEAR",
            "D3D11_LOGIC_OP_SET",
            "D3D11_LOGIC_OP_COPY",
            "D3D11_LOGIC_OP_COPY_INVERTED",
            "D3D11_LOGIC_OP_NOOP",
            "D3D11_LOGIC_OP_INVERT",
            "D3D11_LOGIC_OP_AND",
            "D3D11_LOGIC_OP_NAND",
            "D3D11_LOGIC_OP_OR",
            "D3D11_LOGIC_OP_NOR",
            "D3D11_LOGIC_OP_XOR",
            "D3D11_LOGIC_OP_EQUIV",
            "D3D11_LOGIC_OP_AND_REVERSE",
            "D3D11_LOGIC_OP_AND_INVERTED",
            "D3D11_LOGIC_OP_OR_REVERSE",
            "D3D11_LOGIC_OP_OR_INVERTED",
        ],
    ))
    .flags(FlagsDef::with_bits(
        "D3D11_COPY_FLAGS",
        u32_,
        &[("D3D11_COPY_NO_OVERWRITE", 0x1), ("D3D11_COPY_DISCARD", 0x2)],
    ))
    .flags(FlagsDef::with_bits(
        "D3D11_1_CREATE_DEVICE_CONTEXT_STATE_FLAG",
        u32_,
        &[("D3D11_1_CREATE_DEVICE_CONTEXT_STATE_SINGLETHREADED", 0x1)],
    ))
    .flags(FlagsDef::with_bits(
        "DXGI_SHARED_RESOURCE_FLAG",
        u32_,
        &[
            ("DXGI_SHARED_RESOURCE_READ", 0x8000_0000),
            ("DXGI_SHARED_RESOURCE_WRITE", 0x1),
        ],
    ));

    structs(b);
    interfaces(b);
    winapi::iids(b, IIDS);
}

fn structs(b: &mut ApiBuilder) {
    b.structure(StructDef::new(
        "D3D11_RENDER_TARGET_BLEND_DESC1",
        vec![
            (bool_(), "BlendEnable"),
            (bool_(), "LogicOpEnable"),
            (e("D3D11_BLEND"), "SrcBlend"),
            (e("D3D11_BLEND"), "DestBlend"),
            (e("D3D11_BLEND_OP"), "BlendOp"),
            (e("D3D11_BLEND"), "SrcBlendAlpha"),
            (e("D3D11_BLEND"), "DestBlendAlpha"),
            (e("D3D11_BLEND_OP"), "BlendOpAlpha"),
            (e("D3D11_LOGIC_OP"), "LogicOp"),
            (uint8(), "RenderTargetWriteMask"),
        ],
    ))
    .structure(StructDef::new(
        "D3D11_BLEND_DESC1",
        vec![
            (bool_(), "AlphaToCoverageEnable"),
            (bool_(), "IndependentBlendEnable"),
            (
                Type::array(
                    s("D3D11_RENDER_TARGET_BLEND_DESC1"),
                    "D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT",
                ),
                "RenderTarget",
            ),
        ],
    ))
    .structure(StructDef::new(
        "D3D11_RASTERIZER_DESC1",
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
            (uint(), "ForcedSampleCount"),
        ],
    ));
}

fn set_constant_buffers1(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}SetConstantBuffers1"))
        .arg(uint(), "StartSlot")
        .arg(uint(), "NumBuffers")
        .arg(Type::array(obj("ID3D11Buffer"), "NumBuffers"), "ppConstantBuffers")
        .arg(Type::array(uint(), "NumBuffers"), "pFirstConstant")
        .arg(Type::array(uint(), "NumBuffers"), "pNumConstants")
}

fn get_constant_buffers1(stage: &str) -> Callable {
    m(Type::void(), &format!("{stage}GetConstantBuffers1"))
        .arg(uint(), "StartSlot")
        .arg(uint(), "NumBuffers")
        .out(Type::array(obj("ID3D11Buffer"), "NumBuffers"), "ppConstantBuffers")
        .out(Type::array(uint(), "NumBuffers"), "pFirstConstant")
        .out(Type::array(uint(), "NumBuffers"), "pNumConstants")
}

fn interfaces(b: &mut ApiBuilder) {
    b.interface("ID3D11BlendState1", Some("ID3D11BlendState"))
        .methods(
            "ID3D11BlendState1",
            vec![m(Type::void(), "GetDesc1")
                .out(out_struct("D3D11_BLEND_DESC1"), "pDesc")
                .no_side_effects()],
        )
        .interface("ID3D11RasterizerState1", Some("ID3D11RasterizerState"))
        .methods(
            "ID3D11RasterizerState1",
            vec![m(Type::void(), "GetDesc1")
                .out(out_struct("D3D11_RASTERIZER_DESC1"), "pDesc")
                .no_side_effects()],
        )
        .interface("ID3DDeviceContextState", Some("ID3D11DeviceChild"));

    let mut context = vec![
        m(Type::void(), "CopySubresourceRegion1")
            .arg(obj("ID3D11Resource"), "pDstResource")
            .arg(uint(), "DstSubresource")
            .arg(uint(), "DstX")
            .arg(uint(), "DstY")
            .arg(uint(), "DstZ")
            .arg(obj("ID3D11Resource"), "pSrcResource")
            .arg(uint(), "SrcSubresource")
            .arg(in_struct("D3D11_BOX"), "pSrcBox")
            .arg(f("D3D11_COPY_FLAGS"), "CopyFlags"),
        m(Type::void(), "UpdateSubresource1")
            .arg(obj("ID3D11Resource"), "pDstResource")
            .arg(uint(), "DstSubresource")
            .arg(in_struct("D3D11_BOX"), "pDstBox")
            .arg(Type::opaque_ptr(), "pSrcData")
            .arg(uint(), "SrcRowPitch")
            .arg(uint(), "SrcDepthPitch")
            .arg(f("D3D11_COPY_FLAGS"), "CopyFlags"),
        m(Type::void(), "DiscardResource").arg(obj("ID3D11Resource"), "pResource"),
        m(Type::void(), "DiscardView").arg(obj("ID3D11View"), "pResourceView"),
    ];
    context.extend(STAGES.map(set_constant_buffers1));
    context.extend(STAGES.map(get_constant_buffers1));
    context.extend([
        m(Type::void(), "SwapDeviceContextState")
            .arg(obj("ID3DDeviceContextState"), "pState")
            .out(out_object("ID3DDeviceContextState"), "ppPreviousState"),
        m(Type::void(), "ClearView")
            .arg(obj("ID3D11View"), "pView")
            .arg(Type::array(float(), "4"), "Color")
            .arg(Type::array(s("RECT"), "NumRects"), "pRect")
            .arg(uint(), "NumRects"),
        m(Type::void(), "DiscardView1")
            .arg(obj("ID3D11View"), "pResourceView")
            .arg(Type::array(s("RECT"), "NumRects"), "pRects")
            .arg(uint(), "NumRects"),
    ]);
    b.interface("ID3D11DeviceContext1", Some("ID3D11DeviceContext"))
        .methods("ID3D11DeviceContext1", context);

    b.interface("ID3D11Device1", Some("ID3D11Device")).methods(
        "ID3D11Device1",
        vec![
            m(Type::void(), "GetImmediateContext1")
                .out(out_object("ID3D11DeviceContext1"), "ppImmediateContext"),
            m(hresult(), "CreateDeferredContext1")
                .arg(uint(), "ContextFlags")
                .out(out_object("ID3D11DeviceContext1"), "ppDeferredContext"),
            m(hresult(), "CreateBlendState1")
                .arg(in_struct("D3D11_BLEND_DESC1"), "pBlendStateDesc")
                .out(out_object("ID3D11BlendState1"), "ppBlendState"),
            m(hresult(), "CreateRasterizerState1")
                .arg(in_struct("D3D11_RASTERIZER_DESC1"), "pRasterizerDesc")
                .out(out_object("ID3D11RasterizerState1"), "ppRasterizerState"),
            m(hresult(), "CreateDeviceContextState")
                .arg(f("D3D11_1_CREATE_DEVICE_CONTEXT_STATE_FLAG"), "Flags")
                .arg(Type::array(e("D3D_FEATURE_LEVEL"), "FeatureLevels"), "pFeatureLevels")
                .arg(uint(), "FeatureLevels")
                .arg(uint(), "SDKVersion")
                .arg(refiid(), "EmulatedInterface")
                .out(Type::ptr(e("D3D_FEATURE_LEVEL")), "pChosenFeatureLevel")
                .out(out_object("ID3DDeviceContextState"), "ppContextState"),
            m(hresult(), "OpenSharedResource1")
                .arg(handle(), "hResource")
                .arg(refiid(), "returnedInterface")
                .out(out_unknown(), "ppResource"),
            m(hresult(), "OpenSharedResourceByName")
                .arg(lpcwstr(), "lpName")
                .arg(f("DXGI_SHARED_RESOURCE_FLAG"), "dwDesiredAccess")
                .arg(refiid(), "returnedInterface")
                .out(out_unknown(), "ppResource"),
        ],
    );

    b.interface("ID3DUserDefinedAnnotation", Some("IUnknown")).methods(
        "ID3DUserDefinedAnnotation",
        vec![
            m(int(), "BeginEvent").arg(lpcwstr(), "Name"),
            m(int(), "EndEvent"),
            m(Type::void(), "SetMarker").arg(lpcwstr(), "Name"),
            m(bool_(), "GetStatus").no_side_effects(),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_level_extension_keeps_earlier_values() {
        let api = builder().resolve().unwrap();
        let levels = api.enumeration("D3D_FEATURE_LEVEL").unwrap();
        assert_eq!(levels.value_of("D3D_FEATURE_LEVEL_11_0"), Some(0xb000));
        assert_eq!(levels.value_of("D3D_FEATURE_LEVEL_11_1"), Some(0xb100));
        let flags = api.flags("D3D11_CREATE_DEVICE_FLAG").unwrap();
        assert_eq!(flags.value_of("D3D11_CREATE_DEVICE_BGRA_SUPPORT"), Some(0x20));
        assert_eq!(flags.value_of("D3D11_CREATE_DEVICE_VIDEO_SUPPORT"), Some(0x800));
    }
}
