//! ラベルの分類とマークのテスト

use super::*;
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test_case("public", LabelCategory::Permission)]
#[test_case("private", LabelCategory::Permission)]
#[test_case("static", LabelCategory::Lifecycle)]
#[test_case("final", LabelCategory::Lifecycle)]
#[test_case("const", LabelCategory::Restriction)]
#[test_case("quote", LabelCategory::Restriction)]
#[test_case("virtual", LabelCategory::ObjectOriented)]
#[test_case("iterable", LabelCategory::ObjectOriented)]
#[test_case("T", LabelCategory::Type)]
#[test_case("int", LabelCategory::Type)]
fn test_label_category(name: &str, expected: LabelCategory) {
    assert_eq!(Label::parse(name).category(), expected);
}

#[test]
fn test_first_permission_label_wins() {
    let marks = LabelMarkManager::from_labels(&[Label::parse("private"), Label::parse("public")]);
    assert_eq!(marks.permission(), Some(Permission::Private));
}

#[test]
fn test_refresh_replaces_permission() {
    let mut marks = LabelMarkManager::new();
    marks.mark_label(&Label::parse("protected"), false);
    marks.mark_label(&Label::parse("public"), false);
    assert_eq!(marks.permission(), Some(Permission::Protected));

    marks.mark_label(&Label::parse("public"), true);
    assert_eq!(marks.permission(), Some(Permission::Public));
    assert!(marks.is_marked(&Label::parse("public")));
    assert!(!marks.is_marked(&Label::parse("protected")));
}

#[test]
fn test_cancel_and_reset() {
    let mut marks = LabelMarkManager::from_labels(&[
        Label::parse("static"),
        Label::parse("final"),
        Label::parse("const"),
        Label::parse("private"),
    ]);

    marks.cancel_label(&Label::parse("static"));
    assert!(!marks.is_static_marked());
    assert!(marks.lifecycle().contains(Lifecycle::FINAL));

    // 付いていないPermissionの取り消しは何もしない
    marks.cancel_label(&Label::parse("public"));
    assert_eq!(marks.permission(), Some(Permission::Private));

    marks.reset(LabelCategory::Lifecycle);
    assert!(!marks.is_category_marked(LabelCategory::Lifecycle));
    assert!(marks.is_const_marked());

    marks.reset_all();
    assert_eq!(marks, LabelMarkManager::new());
}

#[test]
fn test_marked_labels_are_listed_by_category() {
    let marks = LabelMarkManager::from_labels(&[
        Label::parse("T"),
        Label::parse("const"),
        Label::parse("static"),
        Label::parse("public"),
    ]);

    let names: Vec<String> = marks.labels().iter().map(Label::name).collect();
    assert_eq!(names, vec!["public", "static", "const", "T"]);
    assert_eq!(marks.type_labels().collect::<Vec<_>>(), vec!["T"]);
}

#[test]
fn test_type_label_descriptors_freeze() {
    let mut symbol = TypeLabelSymbol::new(TypeBase::Builtin(BuiltinType::List), "list");
    symbol
        .label
        .descriptors
        .push_group(vec![int()], Span::dummy())
        .unwrap();
    symbol.label.descriptors.freeze();

    let result = symbol.label.descriptors.push_group(vec![str_type()], Span::dummy());
    assert!(matches!(result, Err(AnalyzerError::InvalidOperation { .. })));
    assert_eq!(symbol.type_label(), TypeLabel::list_of(int()));
    assert!(symbol.label.descriptors.is_frozen());
}
