//! シンボルテーブル
//!
//! 1つのレキシカルスコープの束縛を、挿入順を保ったまま保持します。
//! 表示名で引くテーブルとrawValueで引くテーブルは同じ型で、
//! [`SymbolTableManager`] がスコープごとに1組ずつ持ちます。

mod dump;
mod manager;

pub use dump::{ScopeDump, SymbolDump};
pub use manager::SymbolTableManager;

use crate::symbol::SymbolId;
use indexmap::IndexMap;
use serde::Serialize;

/// エントリの出自
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    /// コンパイラが合成したエントリ。ユーザー宣言で置き換えられる
    System,
    /// ユーザーが宣言したエントリ
    User,
}

impl EntryOrigin {
    pub fn from_system_defined(system_defined: bool) -> Self {
        if system_defined {
            EntryOrigin::System
        } else {
            EntryOrigin::User
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub symbol: SymbolId,
    pub origin: EntryOrigin,
}

/// 同じキーへの二重登録
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateKey {
    pub existing: SymbolId,
}

/// 挿入順を保つ文字列→シンボルの対応表
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: IndexMap<String, TableEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 挿入が可能か（同じキーが無いか、あってもシステム定義か）
    pub fn can_insert(&self, key: &str) -> Result<(), DuplicateKey> {
        match self.entries.get(key) {
            Some(entry) if entry.origin == EntryOrigin::User => Err(DuplicateKey {
                existing: entry.symbol,
            }),
            _ => Ok(()),
        }
    }

    /// シンボルを挿入する
    ///
    /// 既存エントリがシステム定義なら黙って置き換え、置き換えられたシンボルを返す。
    /// 置き換えでは挿入順の位置は変わらない。
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        symbol: SymbolId,
        origin: EntryOrigin,
    ) -> Result<Option<SymbolId>, DuplicateKey> {
        let key = key.into();
        self.can_insert(&key)?;
        let replaced = self
            .entries
            .insert(key, TableEntry { symbol, origin })
            .map(|entry| entry.symbol);
        Ok(replaced)
    }

    pub fn find(&self, key: &str) -> Option<SymbolId> {
        self.entries.get(key).map(|entry| entry.symbol)
    }

    pub fn entry(&self, key: &str) -> Option<&TableEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_system_defined(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.origin == EntryOrigin::System)
            .unwrap_or(false)
    }

    /// キーで削除する。挿入順の索引からも取り除かれる
    pub fn remove(&mut self, key: &str) -> Option<TableEntry> {
        self.entries.shift_remove(key)
    }

    /// 挿入順の反復
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.entries.values().map(|entry| entry.symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn remap(&mut self, map: &impl Fn(SymbolId) -> SymbolId) {
        for entry in self.entries.values_mut() {
            entry.symbol = map(entry.symbol);
        }
    }
}
