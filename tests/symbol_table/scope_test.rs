//! スコープスタックのテスト

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_inner_binding_shadows_outer_until_removed() {
    let mut manager = SymbolTableManager::new();
    let outer = manager.insert(variable("x", "vr_0"), false).unwrap();
    manager.enter_scope();
    let inner = manager.insert(variable("x", "vr_1"), false).unwrap();

    assert_eq!(manager.find_by_name("x", None), Some((inner, 1)));
    assert_eq!(manager.remove_by_name("x", None), Some(inner));
    // 内側を消すと外側の束縛が見える
    assert_eq!(manager.find_by_name("x", None), Some((outer, 0)));
}

#[test]
fn test_name_and_raw_value_lookups_agree() {
    let mut manager = SymbolTableManager::new();
    manager.enter_scope();
    let id = manager.insert(variable("count", "vr_7"), false).unwrap();

    assert_eq!(manager.find_by_name("count", None), Some((id, 1)));
    assert_eq!(manager.find_by_rid("vr_7", None), Some((id, 1)));
    assert_eq!(manager.symbol(id).scope_level(), 1);
}

#[test]
fn test_exit_scope_discards_bindings_but_keeps_symbols() {
    // fの本体でxを宣言し、スコープを出るとxは見えなくなる
    let mut manager = SymbolTableManager::new();
    let f = manager.insert(function("f", "fn_0"), false).unwrap();
    manager.enter_scope();
    let x = manager.insert(variable("x", "vr_1"), false).unwrap();
    manager.exit_scope(Span::dummy()).unwrap();

    assert_eq!(manager.current_level(), 0);
    assert_eq!(manager.find_by_name("x", None), None);
    assert_eq!(manager.find_by_name("f", None), Some((f, 0)));
    assert_eq!(manager.arena().get(x).value(), "x");
}

#[test]
fn test_lookup_at_explicit_level() {
    let mut manager = SymbolTableManager::new();
    let global = manager.insert(variable("x", "vr_0"), false).unwrap();
    manager.enter_scope();
    manager.insert(variable("y", "vr_1"), false).unwrap();

    assert_eq!(manager.find_by_name("x", Some(0)), Some((global, 0)));
    assert_eq!(manager.find_by_name("x", Some(1)), None);
    assert_eq!(manager.find_by_name("y", Some(0)), None);
    assert_eq!(manager.find_by_name("y", Some(9)), None);
}

#[test]
fn test_find_by_name_as_filters_kind() {
    let mut manager = SymbolTableManager::new();
    let f = manager.insert(function("f", "fn_0"), false).unwrap();
    let v = manager.insert(variable("v", "vr_1"), false).unwrap();

    assert_eq!(manager.find_by_name_as::<FunctionSymbol>("f", None), Some((f, 0)));
    assert_eq!(manager.find_by_name_as::<ClassSymbol>("f", None), None);
    // 変数は引数の一種として引ける
    assert_eq!(manager.find_by_name_as::<ParameterSymbol>("v", None), Some((v, 0)));
    assert_eq!(manager.find_by_rid_as::<VariableSymbol>("vr_1", None), Some((v, 0)));
}

#[test]
fn test_enter_existing_scope_level() {
    let mut manager = SymbolTableManager::new();
    manager.enter_scope();
    manager.enter_scope();
    assert_eq!(manager.top_level(), 2);

    manager.enter_scope_at(1, Span::dummy()).unwrap();
    let y = manager.insert(variable("y", "vr_0"), false).unwrap();
    assert_eq!(manager.symbol(y).scope_level(), 1);

    let result = manager.enter_scope_at(5, Span::dummy());
    assert!(matches!(result, Err(AnalyzerError::InvalidOperation { .. })));
    assert_eq!(manager.current_level(), 1);

    manager.enter_top_scope();
    assert_eq!(manager.current_level(), 2);
    manager.enter_global_scope();
    assert_eq!(manager.current_level(), 0);
}

#[test]
fn test_exit_scope_clamps_current_level() {
    let mut manager = SymbolTableManager::new();
    manager.enter_scope();
    manager.enter_scope();
    manager.exit_scope(Span::dummy()).unwrap();
    assert_eq!(manager.current_level(), 1);

    manager.enter_global_scope();
    manager.exit_scope(Span::dummy()).unwrap();
    assert_eq!(manager.current_level(), 0);
    assert!(matches!(
        manager.exit_scope(Span::dummy()),
        Err(AnalyzerError::ScopeUnderflow { .. })
    ));
}

#[test]
fn test_duplicate_in_same_scope() {
    let mut manager = SymbolTableManager::new();
    manager.insert(variable("x", "vr_0"), false).unwrap();

    let result = manager.insert(variable("x", "vr_1"), false);
    assert!(matches!(
        result,
        Err(AnalyzerError::DuplicateDeclaration { name, .. }) if name == "x"
    ));
    assert_eq!(manager.find_by_rid("vr_1", None), None);
}

#[test]
fn test_raw_value_is_unique_across_scopes() {
    // 別のスコープでも同じrawValueは宣言できず、索引は元のシンボルを指したまま
    let mut manager = SymbolTableManager::new();
    let x = manager.insert(variable("x", "vr_0"), false).unwrap();
    manager.enter_scope();

    let result = manager.insert(variable("y", "vr_0"), false);
    assert!(matches!(
        result,
        Err(AnalyzerError::DuplicateDeclaration { name, .. }) if name == "vr_0"
    ));
    assert_eq!(manager.arena().by_raw("vr_0"), Some(x));
    assert_eq!(manager.find_by_name("y", None), None);
    assert_eq!(manager.find_by_rid("vr_0", None), Some((x, 0)));
}

#[test]
fn test_remove_by_rid_removes_name() {
    let mut manager = SymbolTableManager::new();
    let id = manager.insert(variable("x", "vr_0"), false).unwrap();

    assert_eq!(manager.remove_by_rid("vr_0", None), Some(id));
    assert_eq!(manager.find_by_name("x", None), None);
    assert_eq!(manager.remove_by_rid("vr_0", None), None);
}

#[test]
fn test_scope_entries_keep_insertion_order() {
    let mut manager = SymbolTableManager::new();
    for (index, name) in ["zeta", "alpha", "mid"].iter().enumerate() {
        manager
            .insert(variable(name, &format!("vr_{}", index)), false)
            .unwrap();
    }

    let names: Vec<&str> = manager.scope_entries(0).map(|(name, _)| name).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    assert_eq!(manager.scope_symbols(0).len(), 3);
}

#[test]
fn test_transform_leaves_original_untouched() {
    let mut manager = SymbolTableManager::new();
    let id = manager.insert(variable("x", "vr_0"), false).unwrap();

    let copy = manager.symbol(id).transform("y", "vr_1", 3);
    assert_eq!(copy.value(), "y");
    assert_eq!(copy.raw_value(), "vr_1");
    assert_eq!(copy.scope_level(), 3);
    assert_eq!(manager.symbol(id).value(), "x");
    assert_eq!(manager.symbol(id).raw_value(), "vr_0");
}

#[test]
fn test_system_entry_replacement_keeps_position() {
    let mut table = SymbolTable::new();
    let a = variable_id(0);
    table.insert("a", a, EntryOrigin::User).unwrap();
    table.insert("b", variable_id(1), EntryOrigin::System).unwrap();
    table.insert("c", variable_id(2), EntryOrigin::User).unwrap();

    let replaced = table.insert("b", variable_id(3), EntryOrigin::User).unwrap();
    assert_eq!(replaced, Some(variable_id(1)));
    assert!(!table.is_system_defined("b"));
    assert_eq!(table.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);

    let duplicate = table.insert("a", variable_id(4), EntryOrigin::User);
    assert_eq!(duplicate, Err(DuplicateKey { existing: a }));
}

/// テーブル単体のテスト用に、アリーナから連番のハンドルを得る
fn variable_id(index: usize) -> SymbolId {
    let mut arena = SymbolArena::new();
    let mut id = None;
    for i in 0..=index {
        id = Some(arena.alloc(variable("v", &format!("vr_{}", i))));
    }
    id.unwrap()
}
