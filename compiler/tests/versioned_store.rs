use flux_compiler::ir::{
    facet, verify, Annotation, ClassInfo, ExprId, FieldFacets, FieldInfo, FunctionFacets,
    FunctionInfo, IrConst, IrError, IrExpr, IrFactory, IrType, Metadata, NewDeclaration,
    ParameterInfo, PropertyInfo, Stage, StageController, SymbolId, SymbolKind, WriteKind,
};

fn int_field(name: &str) -> NewDeclaration {
    NewDeclaration::field(name, FieldInfo::default(), FieldFacets::new(IrType::Int))
}

fn at(stage: u32) -> StageController {
    StageController::starting_at(Stage::new(stage))
}

#[test]
fn removed_declaration_stays_readable_but_leaves_live_traversal() {
    let mut factory = IrFactory::new();
    let field = factory.create(&at(2), None, int_field("f")).unwrap();
    factory
        .set(field, facet::Initializer, &at(3), Some(IrExpr::int(5)))
        .unwrap();
    factory.remove(&at(5), field).unwrap();

    for stage in [3, 4] {
        let view = factory.view_at(Stage::new(stage));
        assert_eq!(
            view.get(field, facet::Initializer).unwrap(),
            &Some(IrExpr::int(5))
        );
        assert!(view.is_live(field).unwrap());
    }

    let later = factory.view_at(Stage::new(6));
    assert_eq!(later.live().count(), 0);
    assert_eq!(
        later.get(field, facet::Initializer).unwrap(),
        &Some(IrExpr::int(5))
    );
    assert_eq!(factory.removed_up_to(Stage::new(6)).collect::<Vec<_>>(), vec![field]);
}

#[test]
fn declaration_is_not_live_before_creation() {
    let mut factory = IrFactory::new();
    let field = factory.create(&at(2), None, int_field("late")).unwrap();
    assert!(!factory.view_at(Stage::new(1)).is_live(field).unwrap());
    assert!(factory.view_at(Stage::new(2)).is_live(field).unwrap());
}

#[test]
fn binding_twice_fails_and_resolving_unbound_fails() {
    let mut factory = IrFactory::new();
    let stages = at(0);
    let symbol = factory.allocate_symbol(SymbolKind::Field);

    assert_eq!(
        factory.resolve(symbol),
        Err(IrError::UnboundSymbol { symbol })
    );
    assert!(factory.declaration(symbol).is_err());

    factory.create(&stages, Some(symbol), int_field("a")).unwrap();
    assert_eq!(
        factory.create(&stages, Some(symbol), int_field("b")),
        Err(IrError::IllegalBinding { symbol })
    );
}

#[test]
fn symbol_kind_must_match_declaration_kind() {
    let mut factory = IrFactory::new();
    let symbol = factory.allocate_symbol(SymbolKind::Function);
    let err = factory
        .create(&at(0), Some(symbol), int_field("a"))
        .unwrap_err();
    assert_eq!(
        err,
        IrError::SymbolKindMismatch {
            symbol,
            kind: SymbolKind::Function,
            found: SymbolKind::Field,
        }
    );
    assert!(factory.is_empty());
}

#[test]
fn writes_behind_last_modified_are_stale() {
    let mut factory = IrFactory::new();
    let field = factory.create(&at(0), None, int_field("f")).unwrap();
    factory
        .set(field, facet::Initializer, &at(4), Some(IrExpr::int(1)))
        .unwrap();

    let err = factory
        .set(field, facet::Initializer, &at(2), Some(IrExpr::int(2)))
        .unwrap_err();
    assert_eq!(
        err,
        IrError::StaleMutation {
            symbol: field,
            stage: Stage::new(2),
            last_modified: Stage::new(4),
        }
    );
}

#[test]
fn rewriting_the_current_value_changes_nothing() {
    let mut factory = IrFactory::new();
    let field = factory.create(&at(0), None, int_field("f")).unwrap();
    factory
        .set(field, facet::Initializer, &at(1), Some(IrExpr::int(9)))
        .unwrap();

    let outcome = factory
        .set(field, facet::Initializer, &at(2), Some(IrExpr::int(9)))
        .unwrap();
    let decl = factory.declaration(field).unwrap();
    assert_eq!(outcome, WriteKind::Unchanged);
    assert_eq!(decl.history_len(), 1);
    assert_eq!(decl.last_modified(), Stage::new(1));
}

#[test]
fn fresh_but_equal_annotation_lists_do_not_grow_history() {
    let mut factory = IrFactory::new();
    let marker = factory
        .create(&at(0), None, NewDeclaration::class("Marker", ClassInfo::default()))
        .unwrap();
    let field = factory
        .create(
            &at(0),
            None,
            int_field("f").with_annotations(vec![Annotation::marker(marker)]),
        )
        .unwrap();

    let outcome = factory
        .set(
            field,
            facet::Annotations,
            &at(1),
            vec![Annotation::marker(marker)],
        )
        .unwrap();
    assert_eq!(outcome, WriteKind::Unchanged);
    assert_eq!(factory.declaration(field).unwrap().history_len(), 0);
}

#[test]
fn many_writes_in_one_stage_make_one_carrier() {
    let mut factory = IrFactory::new();
    let field = factory.create(&at(0), None, int_field("f")).unwrap();
    let stages = at(1);
    for value in 0..10 {
        factory
            .set(field, facet::Initializer, &stages, Some(IrExpr::int(value)))
            .unwrap();
    }
    factory
        .set(field, facet::Type, &stages, IrType::Long)
        .unwrap();

    let decl = factory.declaration(field).unwrap();
    assert_eq!(decl.history_len(), 1);
    assert_eq!(decl.get(facet::Type, &stages).unwrap(), &IrType::Long);
    assert_eq!(decl.get_at(facet::Type, Stage::new(0)).unwrap(), &IrType::Int);
}

#[test]
fn class_and_members_reference_each_other_through_symbols() {
    let mut factory = IrFactory::new();
    let stages = at(0);
    let class = factory.allocate_symbol(SymbolKind::Class);

    let field = factory
        .create(
            &stages,
            None,
            NewDeclaration::field(
                "self_ref",
                FieldInfo::default(),
                FieldFacets::new(IrType::nullable(IrType::Class(class))),
            )
            .with_parent(class),
        )
        .unwrap();
    let getter = factory
        .create(
            &stages,
            None,
            NewDeclaration::function(
                "get",
                FunctionInfo::default(),
                FunctionFacets::new(IrType::Class(class)),
            )
            .with_parent(class),
        )
        .unwrap();
    factory
        .create(
            &stages,
            Some(class),
            NewDeclaration::class("Node", ClassInfo::default()),
        )
        .unwrap();
    factory
        .set(class, facet::Members, &stages, vec![field, getter])
        .unwrap();

    let view = factory.view_at(Stage::new(0));
    for member in view.get(class, facet::Members).unwrap() {
        let parent = view.get(*member, facet::Parent).unwrap().expect("parent");
        assert_eq!(view.declaration(parent).unwrap().name(), "Node");
    }
    assert!(verify(&factory).is_empty());
}

#[test]
fn live_members_drop_removed_ones() {
    let mut factory = IrFactory::new();
    let class = factory
        .create(&at(0), None, NewDeclaration::class("C", ClassInfo::default()))
        .unwrap();
    let a = factory
        .create(&at(0), None, int_field("a").with_parent(class))
        .unwrap();
    let b = factory
        .create(&at(0), None, int_field("b").with_parent(class))
        .unwrap();
    factory
        .set(class, facet::Members, &at(0), vec![a, b])
        .unwrap();
    factory.remove(&at(1), a).unwrap();

    assert_eq!(
        factory.view_at(Stage::new(2)).live_members(class).unwrap(),
        vec![b]
    );
    assert_eq!(
        factory.view_at(Stage::new(0)).live_members(class).unwrap(),
        vec![a, b]
    );
    assert_eq!(
        factory.view_at(Stage::new(1)).live_members(class).unwrap(),
        vec![b]
    );
}

#[test]
fn property_links_are_versioned() {
    let mut factory = IrFactory::new();
    let property = factory
        .create(
            &at(0),
            None,
            NewDeclaration::property("count", PropertyInfo::default()),
        )
        .unwrap();
    let backing = factory.create(&at(1), None, int_field("count$field")).unwrap();
    factory
        .set(property, facet::BackingField, &at(1), Some(backing))
        .unwrap();
    factory
        .set(backing, facet::CorrespondingProperty, &at(1), Some(property))
        .unwrap();

    let before = factory.view_at(Stage::new(0));
    let after = factory.view_at(Stage::new(1));
    assert_eq!(before.get(property, facet::BackingField).unwrap(), &None);
    assert_eq!(
        after.get(property, facet::BackingField).unwrap(),
        &Some(backing)
    );
}

#[test]
fn facet_of_another_kind_is_not_applicable() {
    let mut factory = IrFactory::new();
    let class = factory
        .create(&at(0), None, NewDeclaration::class("C", ClassInfo::default()))
        .unwrap();
    let err = factory
        .get(class, facet::Initializer, &at(0))
        .unwrap_err();
    assert_eq!(
        err,
        IrError::FacetNotApplicable {
            symbol: class,
            facet: "initializer",
            kind: SymbolKind::Class,
        }
    );
}

#[test]
fn compaction_preserves_views_from_the_floor() {
    let mut factory = IrFactory::new();
    let field = factory.create(&at(0), None, int_field("f")).unwrap();
    for stage in 1..=5u32 {
        factory
            .set(
                field,
                facet::Initializer,
                &at(stage),
                Some(IrExpr::int(i64::from(stage))),
            )
            .unwrap();
    }

    let dropped = factory.compact_before(Stage::new(4));
    assert_eq!(dropped, 4);
    for stage in 4..=6u32 {
        let expected = i64::from(stage.min(5));
        assert_eq!(
            factory
                .view_at(Stage::new(stage))
                .get(field, facet::Initializer)
                .unwrap(),
            &Some(IrExpr::int(expected))
        );
    }
    assert!(verify(&factory).is_empty());
}

#[test]
fn unknown_symbol_is_unbound() {
    let factory = IrFactory::new();
    let ghost = SymbolId::from_raw(42);
    assert_eq!(
        factory.declaration(ghost).unwrap_err(),
        IrError::UnboundSymbol { symbol: ghost }
    );
}

#[test]
fn modified_since_skips_untouched_and_removed_declarations() {
    let mut factory = IrFactory::new();
    let touched = factory.create(&at(0), None, int_field("touched")).unwrap();
    let untouched = factory.create(&at(0), None, int_field("untouched")).unwrap();
    let dropped = factory.create(&at(0), None, int_field("dropped")).unwrap();

    factory
        .set(touched, facet::Initializer, &at(2), Some(IrExpr::int(1)))
        .unwrap();
    factory
        .set(dropped, facet::Initializer, &at(2), Some(IrExpr::int(2)))
        .unwrap();
    factory.remove(&at(3), dropped).unwrap();

    let modified: Vec<_> = factory
        .modified_since(Stage::new(1))
        .map(|decl| decl.symbol())
        .collect();
    assert_eq!(modified, vec![touched]);
    assert!(!modified.contains(&untouched));
}

fn double_field(name: &str, value: f64) -> NewDeclaration {
    NewDeclaration::field(
        name,
        FieldInfo::default(),
        FieldFacets {
            initializer: Some(IrExpr::double(value)),
            ..FieldFacets::new(IrType::Double)
        },
    )
}

#[test]
fn negative_zero_to_zero_is_a_real_write() {
    let mut factory = IrFactory::new();
    let field = factory.create(&at(0), None, double_field("z", -0.0)).unwrap();

    let outcome = factory
        .set(field, facet::Initializer, &at(1), Some(IrExpr::double(0.0)))
        .unwrap();
    assert_eq!(outcome, WriteKind::Appended);

    let view = factory.view_at(Stage::new(1));
    match view.get(field, facet::Initializer).unwrap() {
        Some(IrExpr::Const(IrConst::Double(value))) => {
            assert_eq!(value.to_bits(), 0.0f64.to_bits());
        }
        other => panic!("unexpected initializer {:?}", other),
    }
}

#[test]
fn rewriting_a_nan_constant_changes_nothing() {
    let mut factory = IrFactory::new();
    let field = factory.create(&at(0), None, double_field("nan", f64::NAN)).unwrap();

    let current = factory
        .get(field, facet::Initializer, &at(1))
        .unwrap()
        .clone();
    let outcome = factory
        .set(field, facet::Initializer, &at(1), current)
        .unwrap();

    let decl = factory.declaration(field).unwrap();
    assert_eq!(outcome, WriteKind::Unchanged);
    assert_eq!(decl.history_len(), 0);
    assert_eq!(decl.last_modified(), Stage::new(0));
}

#[test]
fn assigned_bodies_link_back_to_their_declaration() {
    let mut factory = IrFactory::new();
    let initial = ExprId::from_raw(0);
    let replacement = ExprId::from_raw(1);
    let default = ExprId::from_raw(2);

    let field = factory
        .create(
            &at(0),
            None,
            NewDeclaration::field(
                "f",
                FieldInfo::default(),
                FieldFacets {
                    initializer: Some(IrExpr::Body(initial)),
                    ..FieldFacets::new(IrType::Int)
                },
            ),
        )
        .unwrap();
    let function = factory
        .create(
            &at(0),
            None,
            NewDeclaration::function("run", FunctionInfo::default(), FunctionFacets::new(IrType::Unit)),
        )
        .unwrap();
    let parameter = factory
        .create(
            &at(0),
            None,
            NewDeclaration::parameter("p", ParameterInfo::default(), IrType::Int),
        )
        .unwrap();
    assert_eq!(factory.body_owner(initial), Some(field));
    assert_eq!(factory.body_owner(replacement), None);

    factory
        .set(function, facet::Body, &at(1), Some(replacement))
        .unwrap();
    factory
        .set(parameter, facet::DefaultValue, &at(1), Some(IrExpr::Body(default)))
        .unwrap();
    assert_eq!(factory.body_owner(replacement), Some(function));
    assert_eq!(factory.body_owner(default), Some(parameter));

    factory
        .set(field, facet::Initializer, &at(2), Some(IrExpr::Body(replacement)))
        .unwrap();
    assert_eq!(factory.body_owner(replacement), Some(field));

    factory
        .set(field, facet::Initializer, &at(3), Some(IrExpr::int(1)))
        .unwrap();
    assert_eq!(factory.body_owner(replacement), Some(field));
}

#[test]
fn metadata_is_visible_at_every_stage() {
    let mut factory = IrFactory::new();
    let field = factory.create(&at(0), None, int_field("m")).unwrap();
    factory
        .set_metadata(field, Some(Metadata::new("m$backing")))
        .unwrap();

    let early = factory.view_at(Stage::new(0)).declaration(field).unwrap();
    assert_eq!(early.metadata().map(|m| m.source_name.as_str()), Some("m$backing"));
    assert_eq!(early.history_len(), 0);

    let ghost = SymbolId::from_raw(99);
    assert_eq!(
        factory.set_metadata(ghost, None),
        Err(IrError::UnboundSymbol { symbol: ghost })
    );
}
