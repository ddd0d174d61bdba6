use calltrace_gen::{Generator, RustEmitter};
use calltrace_specs::{load, SpecError, APIS};
use pretty_assertions::assert_eq;

#[test]
fn every_api_resolves_and_generates() {
    for name in APIS {
        let binding = load(name).unwrap_or_else(|e| panic!("{name}: {e}"));
        let generated = Generator::new(&binding.api, &binding.hooks)
            .generate()
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert!(generated.shim_count() > 0, "{name} has no shims");
    }
}

#[test]
fn unknown_api_is_rejected() {
    assert!(matches!(load("d3d8"), Err(SpecError::UnknownApi(name)) if name == "d3d8"));
}

#[test]
fn d3d9_vtables_have_the_header_sizes() {
    let api = load("d3d9").unwrap().api;
    let sizes = [
        ("IDirect3D9", 17),
        ("IDirect3DDevice9", 119),
        ("IDirect3DDevice9Ex", 134),
        ("IDirect3DTexture9", 22),
        ("IDirect3DVertexBuffer9", 14),
        ("IDirect3DSurface9", 17),
        ("IDirect3DSwapChain9", 10),
        ("IDirect3DQuery9", 8),
    ];
    for (interface, slots) in sizes {
        assert_eq!(
            (interface, api.interface(interface).unwrap().slots.len()),
            (interface, slots)
        );
    }
    assert!(api.is_derived_from("IDirect3DTexture9", "IDirect3DResource9"));
    assert!(api.is_derived_from("IDirect3DDevice9Ex", "IDirect3DDevice9"));
    assert!(!api.is_derived_from("IDirect3DSurface9", "IDirect3DBaseTexture9"));
}

#[test]
fn d3d11_1_keeps_the_11_0_layout() {
    let base = load("d3d11").unwrap().api;
    let extended = load("d3d11_1").unwrap().api;
    for name in ["ID3D11Device", "ID3D11DeviceContext"] {
        let before: Vec<_> = base.interface(name).unwrap().slots.iter().map(|s| s.name()).collect();
        let after: Vec<_> = extended
            .interface(name)
            .unwrap()
            .slots
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(before, after);
    }
    assert!(base.interface("ID3D11Device1").is_none());
    assert_eq!(extended.interface("ID3D11DeviceContext1").unwrap().slots.len(), 134);
}

#[test]
fn d3d9_source_exports_the_entry_points() {
    let binding = load("d3d9").unwrap();
    let generated = Generator::new(&binding.api, &binding.hooks).generate().unwrap();
    let source = RustEmitter::new(&generated).emit();
    assert!(source.contains("fn Direct3DCreate9("));
    assert!(source.contains("pub struct IDirect3DDevice9Vtbl {"));
    assert!(source.contains("pub static IDirect3DDevice9_VTBL: IDirect3DDevice9Vtbl"));
}

#[test]
fn com_interfaces_carry_distinct_iids() {
    for name in ["d3d9", "d3d11_1"] {
        let api = load(name).unwrap().api;
        let mut seen = std::collections::HashSet::new();
        for interface in api.interfaces() {
            let iid = interface
                .iid
                .unwrap_or_else(|| panic!("{name}: {} has no IID", interface.name));
            assert!(seen.insert(iid), "{name}: {} reuses {iid}", interface.name);
            assert_eq!(
                api.interface_by_iid(&iid).map(|i| i.name.as_str()),
                Some(interface.name.as_str())
            );
        }
    }
}
