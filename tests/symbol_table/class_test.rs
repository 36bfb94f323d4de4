//! クラスの継承グラフとメンバー管理のテスト

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_is_super_class_of_is_transitive() {
    // A <- B <- C
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    let b = fx.class("B");
    let c = fx.class("C");
    fx.inherit(b, a);
    fx.inherit(c, b);

    assert!(fx.arena.is_super_class_of(a, c, false));
    assert!(!fx.arena.is_super_class_of(a, c, true));
    assert!(fx.arena.is_super_class_of(a, b, true));
    assert!(!fx.arena.is_super_class_of(c, a, false));
}

#[test]
fn test_cycle_is_rejected_and_graph_unchanged() {
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    let b = fx.class("B");
    let c = fx.class("C");
    fx.inherit(b, a);
    fx.inherit(c, b);

    let result = fx.arena.add_base_class(a, c, Span::dummy());
    assert!(matches!(result, Err(AnalyzerError::CyclicInheritance { .. })));

    let class_a = fx.arena.payload::<ClassSymbol>(a).unwrap();
    let class_c = fx.arena.payload::<ClassSymbol>(c).unwrap();
    assert!(class_a.bases().is_empty());
    assert!(class_c.derived().is_empty());
}

#[test]
fn test_class_cannot_inherit_itself() {
    let mut fx = ClassFixture::new();
    let a = fx.class("A");

    let result = fx.arena.add_base_class(a, a, Span::dummy());
    assert!(matches!(result, Err(AnalyzerError::CyclicInheritance { .. })));
}

#[test]
fn test_duplicate_base_is_rejected() {
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    let b = fx.class("B");
    fx.inherit(b, a);

    let result = fx.arena.add_base_class(b, a, Span::dummy());
    assert!(matches!(result, Err(AnalyzerError::DuplicateDeclaration { .. })));
    assert_eq!(fx.arena.payload::<ClassSymbol>(b).unwrap().bases(), &[a]);
}

#[test]
fn test_finalized_class_rejects_changes() {
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    let base = fx.class("Base");
    fx.field(a, "x", &[]);
    fx.arena.set_collection_finished(a);

    let late = fx.arena.alloc(variable("y", "vr_late"));
    let result = fx.arena.add_member(a, late, false, Span::dummy());
    assert!(matches!(result, Err(AnalyzerError::ClassFinalized { .. })));

    let result = fx.arena.add_base_class(a, base, Span::dummy());
    assert!(matches!(result, Err(AnalyzerError::ClassFinalized { .. })));

    let class = fx.arena.payload::<ClassSymbol>(a).unwrap();
    assert!(class.is_collection_finished());
    assert_eq!(class.members().len(), 1);
    assert!(class.bases().is_empty());
}

#[test]
fn test_static_members_are_routed_separately() {
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    let count = fx.field(a, "count", &["static"]);
    let name = fx.field(a, "name", &[]);

    let class = fx.arena.payload::<ClassSymbol>(a).unwrap();
    assert_eq!(class.static_members().find("count"), Some(count));
    assert_eq!(class.members().find("count"), None);
    assert_eq!(class.members().find("name"), Some(name));
    assert_eq!(fx.arena.payload::<VariableSymbol>(count).unwrap().owner, Some(a));
}

#[test]
fn test_static_and_instance_members_share_names() {
    // インスタンスフィールドxと同名のstatic xは重複宣言になる
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    let x = fx.field(a, "x", &[]);
    let raw = "vr_static_x";
    let id = fx.arena.alloc(labeled_variable("x", raw, &["static"]));

    let result = fx.arena.add_member(a, id, false, Span::dummy());
    assert!(matches!(
        result,
        Err(AnalyzerError::DuplicateDeclaration { name, .. }) if name == "x"
    ));
    let class = fx.arena.payload::<ClassSymbol>(a).unwrap();
    assert_eq!(class.static_members().find("x"), None);
    assert_eq!(fx.arena.find_member_symbol(a, "x"), Some(x));
}

#[test]
fn test_member_lookup_prefers_own_members_then_bases() {
    let mut fx = ClassFixture::new();
    let base = fx.class("Base");
    let derived = fx.class("Derived");
    fx.inherit(derived, base);
    let base_name = fx.field(base, "name", &[]);
    let only_base = fx.field(base, "only_base", &[]);
    let own_name = fx.field(derived, "name", &[]);

    assert_eq!(fx.arena.find_member_symbol(derived, "name"), Some(own_name));
    assert_eq!(fx.arena.find_member_symbol(base, "name"), Some(base_name));
    assert_eq!(
        fx.arena.find_member_with_owner(derived, "only_base"),
        Some((only_base, base))
    );
    assert_eq!(fx.arena.find_member_symbol(derived, "missing"), None);
}

#[test]
fn test_diamond_lookup_uses_declaration_order() {
    // D extends B, C; B と C はどちらも x を持つ
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    let b = fx.class("B");
    let c = fx.class("C");
    let d = fx.class("D");
    fx.inherit(b, a);
    fx.inherit(c, a);
    fx.inherit(d, b);
    fx.inherit(d, c);
    let from_b = fx.field(b, "x", &[]);
    fx.field(c, "x", &[]);

    assert_eq!(fx.arena.find_member_symbol(d, "x"), Some(from_b));
    assert!(fx.arena.is_super_class_of(a, d, false));
}

#[test]
fn test_member_visibility() {
    let mut fx = ClassFixture::new();
    let owner = fx.class("Owner");
    let child = fx.class("Child");
    let stranger = fx.class("Stranger");
    fx.inherit(child, owner);
    let secret = fx.field(owner, "secret", &["private"]);
    let family = fx.field(owner, "family", &["protected"]);
    let open = fx.field(owner, "open", &[]);

    let find = |name: &str, accessor: Option<SymbolId>| {
        fx.arena
            .find_member_symbol_in_permission(owner, name, accessor)
            .map(|(id, _)| id)
    };
    assert_eq!(find("secret", None), None);
    assert_eq!(find("secret", Some(child)), None);
    assert_eq!(find("secret", Some(owner)), Some(secret));
    assert_eq!(find("family", Some(child)), Some(family));
    assert_eq!(find("family", Some(stranger)), None);
    assert_eq!(find("open", None), Some(open));

    assert_eq!(fx.arena.member_permission(owner, open), Permission::Public);
    assert_eq!(fx.arena.member_permission(owner, secret), Permission::Private);
}

#[test]
fn test_default_permission_applies_to_unlabeled_members() {
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    let hidden = fx.field(a, "hidden", &[]);
    fx.arena.payload_mut::<ClassSymbol>(a).unwrap().default_permission = Permission::Private;

    assert_eq!(fx.arena.member_permission(a, hidden), Permission::Private);
    assert_eq!(fx.arena.find_member_symbol_in_permission(a, "hidden", None), None);
}

#[test]
fn test_static_lifecycle_is_reported() {
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    fx.field(a, "count", &["static", "final"]);

    let (_, lifecycle) = fx
        .arena
        .find_member_symbol_in_permission(a, "count", None)
        .unwrap();
    assert!(lifecycle.contains(Lifecycle::STATIC));
    assert!(lifecycle.contains(Lifecycle::FINAL));
}

#[test]
fn test_class_without_constructors() {
    let mut fx = ClassFixture::new();
    let a = fx.class("A");

    assert_eq!(fx.arena.find_constructor(&fx.registry, a, &[], Span::dummy()).unwrap(), None);
    let result = fx.arena.find_constructor(&fx.registry, a, &[int()], Span::dummy());
    assert!(matches!(
        result,
        Err(AnalyzerError::ArgumentCountMismatch { found: 1, .. })
    ));
}

#[test]
fn test_first_matching_constructor_is_chosen() {
    let mut fx = ClassFixture::new();
    let a = fx.class("A");
    let from_str = fx.constructor(a, vec![str_type()]);
    let from_int = fx.constructor(a, vec![int()]);

    let chosen = fx.arena.find_constructor(&fx.registry, a, &[int()], Span::dummy());
    assert_eq!(chosen.unwrap(), Some(from_int));
    let chosen = fx.arena.find_constructor(&fx.registry, a, &[str_type()], Span::dummy());
    assert_eq!(chosen.unwrap(), Some(from_str));

    let result = fx.arena.find_constructor(
        &fx.registry,
        a,
        &[TypeLabel::builtin(BuiltinType::Bool)],
        Span::dummy(),
    );
    assert!(matches!(result, Err(AnalyzerError::UnrelatedTypes { .. })));
    assert_eq!(
        fx.arena.payload::<FunctionSymbol>(from_int).unwrap().owner,
        Some(a)
    );
}
