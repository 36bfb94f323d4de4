//! スコープスタックの管理

use crate::ast::Span;
use crate::error::{AnalysisResult, AnalyzerError};
use crate::symbol::{Symbol, SymbolArena, SymbolId, SymbolPayload};

use super::{EntryOrigin, SymbolTable, TableEntry};

/// 1つのスコープレベルの（表示名, rawValue）テーブル対
#[derive(Debug, Clone, Default)]
struct Scope {
    by_name: SymbolTable,
    by_rid: SymbolTable,
}

/// 1つのコンパイル単位のシンボルグラフとスコープスタック
///
/// レベル0はグローバル（モジュール）スコープで、常に存在します。
/// 現在レベルは通常スタックの最上位ですが、`enter_scope_at` などで
/// 構築済みのスコープに戻ることができます。
#[derive(Debug, Clone)]
pub struct SymbolTableManager {
    arena: SymbolArena,
    scopes: Vec<Scope>,
    current: usize,
}

impl Default for SymbolTableManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTableManager {
    pub fn new() -> Self {
        Self {
            arena: SymbolArena::new(),
            scopes: vec![Scope::default()],
            current: 0,
        }
    }

    pub fn arena(&self) -> &SymbolArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut SymbolArena {
        &mut self.arena
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        self.arena.get(id)
    }

    /// 現在のスコープレベル
    pub fn current_level(&self) -> usize {
        self.current
    }

    /// スタック最上位のスコープレベル
    pub fn top_level(&self) -> usize {
        self.scopes.len() - 1
    }

    /// 新しい空のスコープを最上位に積み、そこを現在レベルにする
    pub fn enter_scope(&mut self) -> usize {
        self.scopes.push(Scope::default());
        self.current = self.top_level();
        log::debug!("スコープに入る: level {}", self.current);
        self.current
    }

    /// 構築済みのスコープレベルへ移動する
    pub fn enter_scope_at(&mut self, level: usize, span: Span) -> AnalysisResult<()> {
        if level > self.top_level() {
            return Err(AnalyzerError::InvalidOperation {
                message: format!(
                    "スコープレベル {} は存在しません（最上位は {}）",
                    level,
                    self.top_level()
                ),
                span,
            });
        }
        self.current = level;
        log::trace!("スコープへ移動: level {}", level);
        Ok(())
    }

    pub fn enter_top_scope(&mut self) {
        self.current = self.top_level();
    }

    pub fn enter_global_scope(&mut self) {
        self.current = 0;
    }

    /// 最上位のスコープを破棄する。グローバルスコープは破棄できない
    pub fn exit_scope(&mut self, span: Span) -> AnalysisResult<()> {
        if self.top_level() == 0 {
            return Err(AnalyzerError::ScopeUnderflow { span });
        }
        self.scopes.pop();
        self.current = self.current.min(self.top_level());
        log::debug!("スコープを出る: level {}", self.current);
        Ok(())
    }

    /// 現在のスコープに新しいシンボルを宣言する
    ///
    /// シンボルのスコープレベルは現在レベルに設定される。表示名が空の
    /// 合成シンボルはrawValueのテーブルにだけ登録される。rawValueは
    /// スコープをまたいで一意でなければならない。
    pub fn insert(&mut self, mut symbol: Symbol, system_defined: bool) -> AnalysisResult<SymbolId> {
        if let Some(existing) = self.arena.by_raw(symbol.raw_value()) {
            return Err(AnalyzerError::DuplicateDeclaration {
                name: symbol.raw_value().to_string(),
                span: symbol.span(),
                previous: self.arena.get(existing).span(),
            });
        }
        self.check_insertable(&symbol)?;
        symbol.set_scope_level(self.current);
        let id = self.arena.alloc(symbol);
        self.bind(id, system_defined)?;
        log::trace!(
            "宣言: {} ({}) level {}",
            self.arena.get(id).value(),
            self.arena.get(id).raw_value(),
            self.current
        );
        Ok(id)
    }

    /// アリーナに既にあるシンボルを現在のスコープに束縛する
    pub fn bind(&mut self, id: SymbolId, system_defined: bool) -> AnalysisResult<()> {
        self.check_insertable(self.arena.get(id))?;
        let origin = EntryOrigin::from_system_defined(system_defined);
        let level = self.current;
        self.arena.get_mut(id).set_scope_level(level);

        let symbol = self.arena.get(id);
        let name = symbol.value().to_string();
        let raw = symbol.raw_value().to_string();
        let scope = &mut self.scopes[level];

        if !name.is_empty() {
            if let Some(replaced) = scope.by_name.insert(name, id, origin).ok().flatten() {
                // 置き換えられたシステム定義シンボルはrawValueの索引からも外す
                let replaced_raw = self.arena.get(replaced).raw_value().to_string();
                scope.by_rid.remove(&replaced_raw);
            }
        }
        scope.by_rid.insert(raw, id, origin).ok();
        Ok(())
    }

    fn check_insertable(&self, symbol: &Symbol) -> AnalysisResult<()> {
        let scope = &self.scopes[self.current];
        let by_name = match symbol.value() {
            "" => None,
            name => scope.by_name.can_insert(name).err(),
        };
        let duplicate = by_name.or_else(|| scope.by_rid.can_insert(symbol.raw_value()).err());

        match duplicate {
            Some(duplicate) => Err(AnalyzerError::DuplicateDeclaration {
                name: symbol.value().to_string(),
                span: symbol.span(),
                previous: self.arena.get(duplicate.existing).span(),
            }),
            None => Ok(()),
        }
    }

    fn find_in(
        &self,
        key: &str,
        level: Option<usize>,
        table: impl Fn(&Scope) -> &SymbolTable,
    ) -> Option<(SymbolId, usize)> {
        match level {
            Some(level) => self
                .scopes
                .get(level)
                .and_then(|scope| table(scope).find(key))
                .map(|id| (id, level)),
            None => (0..=self.current)
                .rev()
                .find_map(|level| table(&self.scopes[level]).find(key).map(|id| (id, level))),
        }
    }

    /// 表示名でシンボルを探す
    ///
    /// レベルを指定した場合はそのスコープだけを、省略した場合は現在レベルから
    /// グローバルに向かって探し、最も内側の束縛とそのレベルを返す。
    pub fn find_by_name(&self, name: &str, level: Option<usize>) -> Option<(SymbolId, usize)> {
        self.find_in(name, level, |scope| &scope.by_name)
    }

    /// rawValueでシンボルを探す
    pub fn find_by_rid(&self, raw_value: &str, level: Option<usize>) -> Option<(SymbolId, usize)> {
        self.find_in(raw_value, level, |scope| &scope.by_rid)
    }

    /// 表示名で探し、見つかったシンボルが指定のkindでなければNone
    pub fn find_by_name_as<T: SymbolPayload>(
        &self,
        name: &str,
        level: Option<usize>,
    ) -> Option<(SymbolId, usize)> {
        self.find_by_name(name, level)
            .filter(|(id, _)| self.arena.payload::<T>(*id).is_some())
    }

    pub fn find_by_rid_as<T: SymbolPayload>(
        &self,
        raw_value: &str,
        level: Option<usize>,
    ) -> Option<(SymbolId, usize)> {
        self.find_by_rid(raw_value, level)
            .filter(|(id, _)| self.arena.payload::<T>(*id).is_some())
    }

    /// 表示名で束縛を削除する。rawValueの索引からも取り除く
    pub fn remove_by_name(&mut self, name: &str, level: Option<usize>) -> Option<SymbolId> {
        let level = level.unwrap_or(self.current);
        let scope = self.scopes.get_mut(level)?;
        let entry = scope.by_name.remove(name)?;
        scope.by_rid.remove(self.arena.get(entry.symbol).raw_value());
        Some(entry.symbol)
    }

    /// rawValueで束縛を削除する。表示名の索引からも取り除く
    pub fn remove_by_rid(&mut self, raw_value: &str, level: Option<usize>) -> Option<SymbolId> {
        let level = level.unwrap_or(self.current);
        let scope = self.scopes.get_mut(level)?;
        let entry = scope.by_rid.remove(raw_value)?;
        let name = self.arena.get(entry.symbol).value();
        if scope.by_name.find(name) == Some(entry.symbol) {
            scope.by_name.remove(name);
        }
        Some(entry.symbol)
    }

    /// 指定レベルの表示名テーブルを挿入順で返す
    pub fn scope_entries(&self, level: usize) -> impl Iterator<Item = (&str, &TableEntry)> {
        self.scopes
            .get(level)
            .into_iter()
            .flat_map(|scope| scope.by_name.iter())
    }

    /// 指定レベルのrawValueテーブル（合成シンボルを含む）
    pub fn scope_symbols(&self, level: usize) -> Vec<SymbolId> {
        self.scopes
            .get(level)
            .map(|scope| scope.by_rid.symbols().collect())
            .unwrap_or_default()
    }
}
