use calltrace_api::{
    ApiBuilder, ApiError, BoundExpr, Callable, EnumDef, ExtentKind, FlagsDef, Guid, Layout,
    Primitive, SizeExprError, StructDef, Type,
};
use pretty_assertions::assert_eq;

fn uint() -> Type {
    Type::prim(Primitive::U32)
}

fn hresult() -> Type {
    Type::prim(Primitive::I32)
}

fn chain_abc() -> ApiBuilder {
    let mut b = ApiBuilder::new("chain");
    b.interface("A", None)
        .methods(
            "A",
            vec![
                Callable::new(uint(), "a0").acquires(),
                Callable::new(uint(), "a1").releases(),
            ],
        )
        .interface("B", Some("A"))
        .methods("B", vec![Callable::new(hresult(), "b0")])
        .interface("C", Some("B"))
        .methods(
            "C",
            vec![
                Callable::new(hresult(), "c0"),
                Callable::new(hresult(), "c1"),
            ],
        );
    b
}

#[test]
fn effective_order_is_parent_first() {
    let api = chain_abc().resolve().unwrap();
    let c = api.interface("C").unwrap();
    let names: Vec<_> = c.slots.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["a0", "a1", "b0", "c0", "c1"]);
    assert_eq!(c.chain, vec!["A", "B", "C"]);
    let own: Vec<_> = c.methods().iter().map(|m| m.name()).collect();
    assert_eq!(own, vec!["c0", "c1"]);
    assert_eq!(c.slots[2].owner.as_deref(), Some("B"));
    assert_eq!(c.slots[2].qualified_name(), "B::b0");
    assert!(api.is_derived_from("C", "A"));
    assert!(!api.is_derived_from("A", "C"));
}

#[test]
fn extending_an_interface_appends_slots() {
    let mut b = chain_abc();
    b.methods("A", vec![Callable::new(uint(), "a2")]);
    let api = b.resolve().unwrap();
    let c = api.interface("C").unwrap();
    assert_eq!(c.slot_of("a2"), Some(2));
    assert_eq!(c.slot_of("b0"), Some(3));
}

#[test]
fn interfaces_are_found_by_iid() {
    let mut b = chain_abc();
    b.iid("B", "8f5ac3e4-0cc3-4a7a-9e1b-7d2c3e4f5a6b");
    let api = b.resolve().unwrap();
    let iid = Guid::parse("8F5AC3E4-0CC3-4A7A-9E1B-7D2C3E4F5A6B").unwrap();
    assert_eq!(api.interface_by_iid(&iid).map(|i| i.name.as_str()), Some("B"));
    assert_eq!(api.interface("C").unwrap().iid, None);
    assert!(api.interface_by_iid(&Guid([0xff; 16])).is_none());
}

#[test]
fn malformed_iid_is_reported_by_resolve() {
    let mut b = chain_abc();
    b.iid("A", "not-a-guid");
    assert_eq!(
        b.resolve().unwrap_err(),
        ApiError::InvalidIid {
            interface: "A".into(),
            text: "not-a-guid".into(),
        }
    );
}

#[test]
fn inheritance_cycle_is_rejected() {
    let mut b = ApiBuilder::new("cyclic");
    b.interface("X", Some("Y")).interface("Y", Some("X"));
    assert!(matches!(b.resolve(), Err(ApiError::InheritanceCycle(_))));
}

#[test]
fn unknown_parent_is_rejected() {
    let mut b = ApiBuilder::new("orphan");
    b.interface("X", Some("Missing"));
    assert_eq!(
        b.resolve().unwrap_err(),
        ApiError::UnknownParent {
            interface: "X".into(),
            parent: "Missing".into(),
        }
    );
}

#[test]
fn merging_apis_with_a_shared_enum_fails() {
    let mut first = ApiBuilder::new("first");
    first.enumeration(EnumDef::sequential("MODE", Primitive::U32, &["A", "B"]));
    let mut second = ApiBuilder::new("second");
    second.enumeration(EnumDef::sequential("MODE", Primitive::U32, &["C"]));

    let err = first.merge(second).err().unwrap();
    assert!(matches!(err, ApiError::DuplicateName { ref name, .. } if name == "MODE"));
}

#[test]
fn disjoint_merge_keeps_both_sides() {
    let mut first = ApiBuilder::new("first");
    first.function(Callable::new(uint(), "f"));
    let mut second = ApiBuilder::new("second");
    second.function(Callable::new(uint(), "g"));
    first.merge(second).unwrap();
    let api = first.resolve().unwrap();
    assert!(api.function("f").is_some());
    assert!(api.function("g").is_some());
}

#[test]
fn duplicate_declaration_is_reported_by_resolve() {
    let mut b = ApiBuilder::new("dup");
    b.function(Callable::new(uint(), "f"))
        .function(Callable::new(uint(), "f"));
    assert!(matches!(
        b.resolve(),
        Err(ApiError::DuplicateName { ref name, .. }) if name == "f"
    ));
}

#[test]
fn extending_enums_and_flags_preserves_existing_values() {
    let mut b = ApiBuilder::new("ext");
    b.enumeration(EnumDef::with_values(
        "D3D_FEATURE_LEVEL",
        Primitive::U32,
        &[("D3D_FEATURE_LEVEL_10_0", 0xa000), ("D3D_FEATURE_LEVEL_11_0", 0xb000)],
    ))
    .flags(FlagsDef::with_bits(
        "CREATE_FLAG",
        Primitive::U32,
        &[("SINGLETHREADED", 0x1), ("DEBUG", 0x2)],
    ))
    .extend_enum("D3D_FEATURE_LEVEL", &[("D3D_FEATURE_LEVEL_11_1", Some(0xb100))])
    .extend_flags("CREATE_FLAG", &[("BGRA_SUPPORT", Some(0x20)), ("EXTRA", None)]);
    let api = b.resolve().unwrap();

    let levels = api.enumeration("D3D_FEATURE_LEVEL").unwrap();
    assert_eq!(levels.values[0].value, 0xa000);
    assert_eq!(levels.values[1].value, 0xb000);
    assert_eq!(levels.values[2].value, 0xb100);

    let flags = api.flags("CREATE_FLAG").unwrap();
    assert_eq!(flags.value_of("DEBUG"), Some(0x2));
    assert_eq!(flags.value_of("EXTRA"), Some(0x4));
}

#[test]
fn extending_a_missing_enum_is_an_error() {
    let mut b = ApiBuilder::new("ext");
    b.extend_enum("NOPE", &[("X", None)]);
    assert!(matches!(b.resolve(), Err(ApiError::ExtendMissing { .. })));
}

#[test]
fn unknown_type_reference_is_rejected() {
    let mut b = ApiBuilder::new("refs");
    b.function(Callable::new(uint(), "f").arg(Type::structure("MISSING"), "p"));
    assert!(matches!(
        b.resolve(),
        Err(ApiError::UnknownType { kind: "struct", .. })
    ));
}

#[test]
fn size_expression_binds_to_sibling_position() {
    let mut b = ApiBuilder::new("d3d");
    b.function(
        Callable::new(hresult(), "SetVertexShaderConstantF")
            .arg(uint(), "StartRegister")
            .arg(
                Type::array(Type::prim(Primitive::F32), "4*Vector4fCount"),
                "pConstantData",
            )
            .arg(uint(), "Vector4fCount"),
    );
    let api = b.resolve().unwrap();
    let f = api.function("SetVertexShaderConstantF").unwrap();
    let size = f.params[1].size.as_ref().unwrap();
    assert_eq!(size.kind, ExtentKind::Elements);
    assert!(size.pre_call);
    assert!(!size.post_call);
    assert_eq!(size.expr.references(), vec![2]);
}

#[test]
fn size_expression_naming_a_missing_sibling_fails() {
    let mut b = ApiBuilder::new("bad");
    b.function(
        Callable::new(hresult(), "f")
            .arg(Type::blob(Type::void(), "Length"), "pData"),
    );
    match b.resolve() {
        Err(ApiError::SizeExpr { error, .. }) => {
            assert_eq!(error, SizeExprError::UnknownName("Length".into()))
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn pre_call_size_cannot_read_an_output() {
    let mut b = ApiBuilder::new("bad");
    b.function(
        Callable::new(hresult(), "f")
            .arg(Type::blob(Type::void(), "*pCount"), "pData")
            .out(Type::ptr(uint()), "pCount"),
    );
    match b.resolve() {
        Err(ApiError::SizeExpr { error, .. }) => assert_eq!(
            error,
            SizeExprError::OutBeforeCall {
                name: "pCount".into()
            }
        ),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn post_call_size_may_read_an_output() {
    let mut b = ApiBuilder::new("ok");
    b.function(
        Callable::new(hresult(), "GetPrivateData")
            .out(Type::opaque_blob(Type::void(), "*pSizeOfData"), "pData")
            .inout(Type::ptr(uint()), "pSizeOfData"),
    );
    let api = b.resolve().unwrap();
    let size = api.function("GetPrivateData").unwrap().params[0]
        .size
        .clone()
        .unwrap();
    assert_eq!(size.kind, ExtentKind::Opaque);
    assert!(size.post_call);
    assert!(!size.pre_call);
    assert!(matches!(size.expr, BoundExpr::Deref { prim: Primitive::U32, .. }));
}

#[test]
fn undeclared_helper_is_rejected() {
    let mut b = ApiBuilder::new("helpers");
    b.function(
        Callable::new(hresult(), "f")
            .arg(uint(), "n")
            .arg(Type::blob(Type::void(), "_dataSize(n)"), "p"),
    );
    assert!(matches!(
        b.resolve(),
        Err(ApiError::SizeExpr {
            error: SizeExprError::UnknownHelper(_),
            ..
        })
    ));

    let mut b = ApiBuilder::new("helpers");
    b.helper("_dataSize", 1).function(
        Callable::new(hresult(), "f")
            .arg(uint(), "n")
            .arg(Type::blob(Type::void(), "_dataSize(n)"), "p"),
    );
    assert!(b.resolve().is_ok());
}

#[test]
fn struct_layout_follows_c_rules() {
    let mut b = ApiBuilder::new("layout");
    b.structure(StructDef::new(
        "MIXED",
        vec![
            (Type::prim(Primitive::U8), "a"),
            (uint(), "b"),
            (Type::prim(Primitive::U16), "c"),
        ],
    ))
    .structure(StructDef::new(
        "BLEND",
        vec![
            (Type::prim(Primitive::Bool), "AlphaToCoverage"),
            (Type::array(Type::structure("MIXED"), 8), "Targets"),
        ],
    ));
    let api = b.resolve().unwrap();

    let mixed = api.structure("MIXED").unwrap();
    assert_eq!(mixed.layout, Some(Layout { size: 12, align: 4 }));
    let offsets: Vec<_> = mixed.fields.iter().map(|f| f.offset).collect();
    assert_eq!(offsets, vec![0, 4, 8]);

    let blend = api.structure("BLEND").unwrap();
    assert_eq!(blend.fields[1].inline_count, Some(8));
    assert_eq!(blend.fields[1].offset, 4);
    assert_eq!(blend.layout, Some(Layout { size: 100, align: 4 }));
}

#[test]
fn struct_pointer_array_binds_against_sibling_fields() {
    let mut b = ApiBuilder::new("fields");
    b.structure(StructDef::new(
        "DESC",
        vec![
            (uint(), "NumElements"),
            (
                Type::const_ptr(Type::array(uint(), "NumElements")),
                "pElements",
            ),
        ],
    ));
    let api = b.resolve().unwrap();
    let desc = api.structure("DESC").unwrap();
    assert_eq!(desc.fields[1].inline_count, None);
    assert_eq!(desc.fields[1].offset, std::mem::size_of::<usize>());
    assert_eq!(
        desc.fields[1].size.as_ref().unwrap().expr,
        BoundExpr::Arg(0)
    );
}

#[test]
fn field_access_binds_offset() {
    let mut b = ApiBuilder::new("fields");
    b.structure(StructDef::new(
        "BUFFER_DESC",
        vec![(uint(), "ByteWidth"), (uint(), "Usage")],
    ))
    .function(
        Callable::new(hresult(), "CreateBuffer")
            .arg(Type::const_ptr(Type::structure("BUFFER_DESC")), "pDesc")
            .arg(Type::blob(Type::void(), "pDesc->Usage"), "pInitialData"),
    );
    let api = b.resolve().unwrap();
    let size = api.function("CreateBuffer").unwrap().params[1]
        .size
        .clone()
        .unwrap();
    assert_eq!(
        size.expr,
        BoundExpr::Field {
            base: Box::new(BoundExpr::Arg(0)),
            offset: 4,
            prim: Primitive::U32,
        }
    );
}

#[test]
fn recursive_struct_is_rejected() {
    let mut b = ApiBuilder::new("rec");
    b.structure(StructDef::new("NODE", vec![(Type::structure("NODE"), "next")]));
    assert_eq!(
        b.resolve().unwrap_err(),
        ApiError::RecursiveStruct("NODE".into())
    );
}

#[test]
fn constants_and_enum_values_are_visible_to_size_expressions() {
    let mut b = ApiBuilder::new("consts");
    b.constant("MAX_TARGETS", 8)
        .enumeration(EnumDef::with_values("E", Primitive::U32, &[("FOUR", 4)]))
        .function(
            Callable::new(hresult(), "f")
                .arg(Type::array(uint(), "MAX_TARGETS*FOUR"), "p"),
        );
    let api = b.resolve().unwrap();
    let size = api.function("f").unwrap().params[0].size.clone().unwrap();
    assert_eq!(size.expr.as_const(), Some(32));
}
