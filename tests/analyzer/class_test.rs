//! クラス（継承・可視性・コンストラクタ）のテスト

use super::*;

fn field(name: &str, label_names: &[&str], ty_name: &str) -> Member {
    Member::Field(labeled_var(name, label_names, Some(ty_name)))
}

fn method(name: &str, return_type: Option<&str>, body: Vec<Statement>) -> Member {
    Member::Method(func(name, vec![], return_type, body))
}

fn with_constructors(mut decl: ClassDecl, constructors: Vec<FunctionDecl>) -> ClassDecl {
    decl.constructors = constructors;
    decl
}

fn constructor(params: Vec<Parameter>) -> FunctionDecl {
    func("constructor", params, None, vec![])
}

fn member_of(object: Expression, name: &str) -> Expression {
    Expression::member(object, name)
}

#[test]
fn test_method_reads_own_field_through_this() {
    let counter = class(
        "Counter",
        &[],
        vec![
            field("count", &[], "int"),
            method("get", Some("int"), vec![ret(Some(member_of(this(), "count")))]),
        ],
    );

    assert_analysis_success(&module(vec![Item::Class(counter)]));
}

#[test]
fn test_private_member_is_inaccessible_outside_class() {
    let account = class("Account", &[], vec![field("balance", &["private"], "int")]);
    let peek = func(
        "peek",
        vec![param("a", Some("Account"))],
        None,
        vec![expr_stmt(member_of(Expression::identifier("a"), "balance"))],
    );

    assert_specific_error(&module(vec![Item::Class(account), Item::Function(peek)]), |e| {
        matches!(e, AnalyzerError::InaccessibleMember { member, permission, .. }
            if member == "balance" && permission == "private")
    });
}

#[test]
fn test_private_member_is_accessible_inside_class() {
    let account = class(
        "Account",
        &[],
        vec![
            field("balance", &["private"], "int"),
            method("total", Some("int"), vec![ret(Some(member_of(this(), "balance")))]),
        ],
    );

    assert_analysis_success(&module(vec![Item::Class(account)]));
}

#[test]
fn test_protected_member_visible_from_derived_class() {
    let base = class("Base", &[], vec![field("secret", &["protected"], "int")]);
    let child = class(
        "Child",
        &["Base"],
        vec![method("reveal", Some("int"), vec![ret(Some(member_of(this(), "secret")))])],
    );

    assert_analysis_success(&module(vec![Item::Class(base), Item::Class(child)]));
}

#[test]
fn test_protected_member_hidden_from_free_function() {
    let base = class("Base", &[], vec![field("secret", &["protected"], "int")]);
    let child = class("Child", &["Base"], vec![]);
    let spy = func(
        "spy",
        vec![param("c", Some("Child"))],
        None,
        vec![expr_stmt(member_of(Expression::identifier("c"), "secret"))],
    );

    assert_specific_error(
        &module(vec![Item::Class(base), Item::Class(child), Item::Function(spy)]),
        |e| {
            matches!(e, AnalyzerError::InaccessibleMember { class, permission, .. }
                if class == "Child" && permission == "protected")
        },
    );
}

#[test]
fn test_static_member_access_through_class() {
    let config = class("Config", &[], vec![field("version", &["static"], "int")]);
    let read = func(
        "read",
        vec![],
        Some("int"),
        vec![ret(Some(member_of(Expression::identifier("Config"), "version")))],
    );

    assert_analysis_success(&module(vec![Item::Class(config), Item::Function(read)]));
}

#[test]
fn test_instance_member_through_class_is_rejected() {
    let config = class("Config", &[], vec![field("name", &[], "str")]);
    let read = func(
        "read",
        vec![],
        None,
        vec![expr_stmt(member_of(Expression::identifier("Config"), "name"))],
    );

    assert_specific_error(&module(vec![Item::Class(config), Item::Function(read)]), |e| {
        matches!(e, AnalyzerError::InvalidOperation { .. })
    });
}

#[test]
fn test_cyclic_inheritance_is_rejected() {
    let a = class("A", &["B"], vec![]);
    let b = class("B", &["A"], vec![]);

    assert_specific_error(&module(vec![Item::Class(a), Item::Class(b)]), |e| {
        matches!(e, AnalyzerError::CyclicInheritance { class, base, .. }
            if class == "B" && base == "A")
    });
}

#[test]
fn test_unknown_base_class() {
    let a = class("A", &["Missing"], vec![]);

    assert_specific_error(&module(vec![Item::Class(a)]), |e| {
        matches!(e, AnalyzerError::UndefinedReference { name, .. } if name == "Missing")
    });
}

#[test]
fn test_derived_instance_assignable_to_base_type() {
    let animal = class("Animal", &[], vec![]);
    let dog = class("Dog", &["Animal"], vec![]);
    let adopt = func(
        "adopt",
        vec![],
        None,
        vec![let_stmt(
            "pet",
            Some("Animal"),
            Expression::call(Expression::identifier("Dog"), vec![]),
        )],
    );

    assert_analysis_success(&module(vec![
        Item::Class(animal),
        Item::Class(dog),
        Item::Function(adopt),
    ]));
}

#[test]
fn test_base_instance_not_assignable_to_derived_type() {
    let animal = class("Animal", &[], vec![]);
    let dog = class("Dog", &["Animal"], vec![]);
    let adopt = func(
        "adopt",
        vec![],
        None,
        vec![let_stmt(
            "pet",
            Some("Dog"),
            Expression::call(Expression::identifier("Animal"), vec![]),
        )],
    );

    assert_specific_error(
        &module(vec![Item::Class(animal), Item::Class(dog), Item::Function(adopt)]),
        |e| {
            matches!(e, AnalyzerError::TypeMismatch { expected, found, .. }
                if expected == "Dog" && found == "Animal")
        },
    );
}

#[test]
fn test_inherited_method_call() {
    let animal = class(
        "Animal",
        &[],
        vec![method("speak", Some("str"), vec![ret(Some(Expression::string("...")))])],
    );
    let dog = class("Dog", &["Animal"], vec![]);
    let talk = func(
        "talk",
        vec![],
        Some("str"),
        vec![
            let_stmt("d", None, Expression::call(Expression::identifier("Dog"), vec![])),
            ret(Some(Expression::call(
                member_of(Expression::identifier("d"), "speak"),
                vec![],
            ))),
        ],
    );

    assert_analysis_success(&module(vec![
        Item::Class(animal),
        Item::Class(dog),
        Item::Function(talk),
    ]));
}

#[test]
fn test_constructor_arguments_are_checked() {
    let point = with_constructors(
        class("Point", &[], vec![]),
        vec![constructor(vec![param("x", Some("int")), param("y", Some("int"))])],
    );
    let make = |args: Vec<Expression>| {
        func(
            "make",
            vec![],
            None,
            vec![expr_stmt(Expression::call(Expression::identifier("Point"), args))],
        )
    };

    assert_analysis_success(&module(vec![
        Item::Class(point.clone()),
        Item::Function(make(vec![Expression::integer(1), Expression::integer(2)])),
    ]));
    assert_specific_error(
        &module(vec![Item::Class(point.clone()), Item::Function(make(vec![Expression::integer(1)]))]),
        |e| matches!(e, AnalyzerError::ArgumentCountMismatch { found: 1, .. }),
    );
    assert_specific_error(
        &module(vec![
            Item::Class(point),
            Item::Function(make(vec![Expression::string("a"), Expression::integer(2)])),
        ]),
        |e| matches!(e, AnalyzerError::UnrelatedTypes { .. }),
    );
}

#[test]
fn test_class_without_constructor_takes_no_arguments() {
    let empty = class("Empty", &[], vec![]);
    let make = func(
        "make",
        vec![],
        None,
        vec![expr_stmt(Expression::call(
            Expression::identifier("Empty"),
            vec![Expression::integer(1)],
        ))],
    );

    assert_specific_error(&module(vec![Item::Class(empty), Item::Function(make)]), |e| {
        matches!(e, AnalyzerError::ArgumentCountMismatch { expected, .. } if expected == "0")
    });
}

#[test]
fn test_duplicate_member_is_rejected() {
    let a = class(
        "A",
        &[],
        vec![field("x", &[], "int"), method("x", None, vec![])],
    );

    assert_specific_error(&module(vec![Item::Class(a)]), |e| {
        matches!(e, AnalyzerError::DuplicateDeclaration { name, .. } if name == "x")
    });
}

#[test]
fn test_undefined_member() {
    let a = class("A", &[], vec![]);
    let probe = func(
        "probe",
        vec![param("a", Some("A"))],
        None,
        vec![expr_stmt(member_of(Expression::identifier("a"), "missing"))],
    );

    assert_specific_error(&module(vec![Item::Class(a), Item::Function(probe)]), |e| {
        matches!(e, AnalyzerError::UndefinedMember { class, member, .. }
            if class == "A" && member == "missing")
    });
}

#[test]
fn test_assign_to_field() {
    let counter = class(
        "Counter",
        &[],
        vec![
            field("count", &[], "int"),
            method(
                "reset",
                None,
                vec![assign(member_of(this(), "count"), Expression::integer(0))],
            ),
        ],
    );

    assert_analysis_success(&module(vec![Item::Class(counter)]));
}
