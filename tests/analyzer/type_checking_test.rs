//! 型チェックのテスト

use super::*;

fn typed_let(name: &str, ty: LabelRef, value: Expression) -> Statement {
    Statement::Let(VariableDecl {
        ty: Some(ty),
        ..var(name, None, Some(value))
    })
}

fn takes_int() -> Item {
    Item::Function(func("takes_int", vec![param("x", Some("int"))], None, vec![]))
}

#[test]
fn test_let_type_mismatch() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![let_stmt("x", Some("int"), Expression::string("hello"))],
    ))]);

    assert_specific_error(&module, |e| {
        matches!(e, AnalyzerError::TypeMismatch { expected, found, .. }
            if expected == "int" && found == "str")
    });
}

#[test]
fn test_global_initializer_type_mismatch() {
    let module = module(vec![Item::Variable(var(
        "count",
        Some("int"),
        Some(Expression::boolean(true)),
    ))]);

    assert_specific_error(&module, |e| matches!(e, AnalyzerError::TypeMismatch { .. }));
}

#[test]
fn test_return_type_mismatch() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        Some("int"),
        vec![ret(Some(Expression::string("a")))],
    ))]);

    assert_specific_error(&module, |e| {
        matches!(e, AnalyzerError::TypeMismatch { expected, .. } if expected == "int")
    });
}

#[test]
fn test_missing_return() {
    let module = module(vec![Item::Function(func("f", vec![], Some("int"), vec![]))]);

    assert_specific_error(&module, |e| {
        matches!(e, AnalyzerError::MissingReturn { name, expected, .. }
            if name == "f" && expected == "int")
    });
}

#[test]
fn test_void_function_cannot_return_value() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        Some("void"),
        vec![ret(Some(Expression::integer(1)))],
    ))]);

    assert_specific_error(&module, |e| matches!(e, AnalyzerError::TypeMismatch { .. }));
}

#[test]
fn test_untyped_function_may_return_anything() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![ret(Some(Expression::integer(1)))],
    ))]);

    assert_analysis_success(&module);
}

#[test]
fn test_const_global_assignment() {
    let module = module(vec![
        Item::Variable(labeled_var("limit", &["const"], Some("int"))),
        Item::Function(func(
            "f",
            vec![],
            None,
            vec![assign(Expression::identifier("limit"), Expression::integer(2))],
        )),
    ]);

    assert_specific_error(&module, |e| {
        matches!(e, AnalyzerError::ConstAssignment { name, .. } if name == "limit")
    });
}

#[test]
fn test_const_local_assignment() {
    let constant = Statement::Let(VariableDecl {
        value: Some(Expression::integer(1)),
        ..labeled_var("x", &["const"], None)
    });
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![constant, assign(Expression::identifier("x"), Expression::integer(2))],
    ))]);

    assert_specific_error(&module, |e| matches!(e, AnalyzerError::ConstAssignment { .. }));
}

#[test]
fn test_untyped_variable_takes_initializer_type() {
    // 型注釈のない変数は初期化式の型を持つ
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![
            let_stmt("n", None, Expression::integer(1)),
            assign(Expression::identifier("n"), Expression::string("s")),
        ],
    ))]);

    assert_specific_error(&module, |e| {
        matches!(e, AnalyzerError::TypeMismatch { expected, found, .. }
            if expected == "int" && found == "str")
    });
}

#[test]
fn test_call_argument_type_mismatch() {
    let module = module(vec![
        takes_int(),
        Item::Function(func(
            "f",
            vec![],
            None,
            vec![expr_stmt(Expression::call(
                Expression::identifier("takes_int"),
                vec![Expression::string("a")],
            ))],
        )),
    ]);

    assert_specific_error(&module, |e| matches!(e, AnalyzerError::UnrelatedTypes { .. }));
}

#[test]
fn test_call_argument_count_mismatch() {
    let module = module(vec![
        takes_int(),
        Item::Function(func(
            "f",
            vec![],
            None,
            vec![expr_stmt(Expression::call(Expression::identifier("takes_int"), vec![]))],
        )),
    ]);

    assert_specific_error(&module, |e| {
        matches!(e, AnalyzerError::ArgumentCountMismatch { found: 0, .. })
    });
}

#[test]
fn test_untyped_argument_is_checked_at_runtime() {
    // 型のない引数はanyなので、どの引数型にも渡せる
    let module = module(vec![
        takes_int(),
        Item::Function(func(
            "f",
            vec![param("v", None)],
            None,
            vec![expr_stmt(Expression::call(
                Expression::identifier("takes_int"),
                vec![Expression::identifier("v")],
            ))],
        )),
    ]);

    assert_analysis_success(&module);
}

#[test]
fn test_list_literal_types() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![
            typed_let("ints", list_ty("int"), list(vec![Expression::integer(1), Expression::integer(2)])),
            typed_let("mixed", list_ty("any"), list(vec![Expression::integer(1), Expression::string("a")])),
            typed_let("empty", list_ty("any"), list(vec![])),
        ],
    ))]);

    assert_analysis_success(&module);
}

#[test]
fn test_list_element_type_mismatch() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![typed_let("names", list_ty("str"), list(vec![Expression::integer(1)]))],
    ))]);

    assert_specific_error(&module, |e| {
        matches!(e, AnalyzerError::TypeMismatch { expected, found, .. }
            if expected == "list<str>" && found == "list<int>")
    });
}

#[test]
fn test_for_over_non_iterable() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![Statement::For(ForStatement {
            variable: "i".to_string(),
            iterable: Expression::integer(3),
            body: block(vec![]),
            span: Span::dummy(),
        })],
    ))]);

    assert_specific_error(&module, |e| {
        matches!(e, AnalyzerError::TypeMismatch { expected, found, .. }
            if expected == "iterable" && found == "int")
    });
}

#[test]
fn test_if_condition_must_be_bool() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![Statement::If(IfStatement {
            condition: Expression::integer(1),
            then_branch: block(vec![]),
            else_branch: None,
            span: Span::dummy(),
        })],
    ))]);

    assert_specific_error(&module, |e| {
        matches!(e, AnalyzerError::TypeMismatch { expected, .. } if expected == "bool")
    });
}

#[test]
fn test_while_with_bool_condition() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![Statement::While(WhileStatement {
            condition: Expression::boolean(false),
            body: block(vec![let_stmt("x", None, Expression::integer(1))]),
            span: Span::dummy(),
        })],
    ))]);

    assert_analysis_success(&module);
}

#[test]
fn test_function_value_call_uses_signature() {
    // funi<int><str> 型の値を呼び出すと戻り値の型はstr
    let module = module(vec![
        Item::Function(func(
            "describe",
            vec![param("x", Some("int"))],
            Some("str"),
            vec![ret(Some(Expression::string("n")))],
        )),
        Item::Function(func(
            "f",
            vec![],
            Some("str"),
            vec![
                let_stmt("callback", None, Expression::identifier("describe")),
                ret(Some(Expression::call(
                    Expression::identifier("callback"),
                    vec![Expression::integer(1)],
                ))),
            ],
        )),
    ]);

    assert_analysis_success(&module);
}

#[test]
fn test_calling_non_callable_value() {
    let module = module(vec![Item::Function(func(
        "f",
        vec![],
        None,
        vec![
            let_stmt("n", None, Expression::integer(1)),
            expr_stmt(Expression::call(Expression::identifier("n"), vec![])),
        ],
    ))]);

    assert_specific_error(&module, |e| matches!(e, AnalyzerError::InvalidOperation { .. }));
}

#[test]
fn test_this_outside_class() {
    let module = module(vec![Item::Function(func("f", vec![], None, vec![expr_stmt(this())]))]);

    assert_specific_error(&module, |e| matches!(e, AnalyzerError::InvalidOperation { .. }));
}

#[test]
fn test_errors_are_collected_across_functions() {
    // 1つのエラーで解析を止めず、すべての関数を検査する
    let module = module(vec![
        Item::Function(func("a", vec![], Some("int"), vec![])),
        Item::Function(func(
            "b",
            vec![],
            None,
            vec![expr_stmt(Expression::identifier("missing"))],
        )),
    ]);

    let analysis = analyze_module(&module);
    assert!(analysis.result.is_err());
    assert_eq!(analysis.errors.len(), 2);
}
