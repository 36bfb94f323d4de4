//! シンボルとシンボルアリーナ
//!
//! コンパイル時のすべての名前付きエンティティ（ラベル、型ラベル、引数、変数、
//! 関数、クラス）は、共通ヘッダとkind別ペイロードを持つ [`Symbol`] として
//! 表現されます。シンボルは [`SymbolArena`] に格納され、相互参照
//! （基底↔派生、エイリアス↔参照先、メンバー↔所有クラス）はすべて
//! [`SymbolId`] ハンドルで表します。

mod class;
mod function;
mod label;
mod label_mark;
mod parameter;
mod type_label;

pub use class::ClassSymbol;
pub use function::{BuiltinOrigin, FunctionKind, FunctionSymbol};
pub use label::{
    DescriptorGroups, Label, LabelCategory, LabelSymbol, Lifecycle, ObjectOriented, Permission,
    Restriction,
};
pub use label_mark::LabelMarkManager;
pub use parameter::{ParameterKind, ParameterSymbol, VariableSymbol};
pub use type_label::{BuiltinType, CustomType, TypeBase, TypeLabel, TypeLabelSymbol, TypeRegistry};

use crate::ast::Span;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// アリーナ内のシンボルを指す安定したハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

/// シンボルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Label,
    TypeLabel,
    Parameter,
    Variable,
    Function,
    Class,
}

impl SymbolKind {
    /// rawValue生成時の接頭辞
    pub fn raw_prefix(self) -> &'static str {
        match self {
            SymbolKind::Label => "lb",
            SymbolKind::TypeLabel => "tl",
            SymbolKind::Parameter => "pm",
            SymbolKind::Variable => "vr",
            SymbolKind::Function => "fn",
            SymbolKind::Class => "cl",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Label => "label",
            SymbolKind::TypeLabel => "type label",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
        };
        write!(f, "{}", name)
    }
}

/// kind別のペイロード
#[derive(Debug, Clone)]
pub enum SymbolData {
    Label(LabelSymbol),
    TypeLabel(TypeLabelSymbol),
    Parameter(ParameterSymbol),
    Variable(VariableSymbol),
    Function(FunctionSymbol),
    Class(ClassSymbol),
}

impl SymbolData {
    pub fn kind(&self) -> SymbolKind {
        match self {
            SymbolData::Label(_) => SymbolKind::Label,
            SymbolData::TypeLabel(_) => SymbolKind::TypeLabel,
            SymbolData::Parameter(_) => SymbolKind::Parameter,
            SymbolData::Variable(_) => SymbolKind::Variable,
            SymbolData::Function(_) => SymbolKind::Function,
            SymbolData::Class(_) => SymbolKind::Class,
        }
    }

    /// 含まれるハンドルをすべて書き換える
    fn remap(&mut self, map: &impl Fn(SymbolId) -> SymbolId) {
        match self {
            SymbolData::Label(_) | SymbolData::TypeLabel(_) | SymbolData::Parameter(_) => {}
            SymbolData::Variable(v) => {
                v.owner = v.owner.map(map);
                v.referenced = v.referenced.map(map);
            }
            SymbolData::Function(f) => {
                f.params.iter_mut().for_each(|p| *p = map(*p));
                f.owner = f.owner.map(map);
            }
            SymbolData::Class(c) => c.remap(map),
        }
    }
}

/// kind別ペイロードへの射影
///
/// 継承関係（VariableSymbol is-a ParameterSymbol、TypeLabelSymbol is-a
/// LabelSymbol）はここで表現されます。
pub trait SymbolPayload: Sized {
    fn project(data: &SymbolData) -> Option<&Self>;
    fn project_mut(data: &mut SymbolData) -> Option<&mut Self>;
}

impl SymbolPayload for LabelSymbol {
    fn project(data: &SymbolData) -> Option<&Self> {
        match data {
            SymbolData::Label(l) => Some(l),
            SymbolData::TypeLabel(t) => Some(&t.label),
            _ => None,
        }
    }

    fn project_mut(data: &mut SymbolData) -> Option<&mut Self> {
        match data {
            SymbolData::Label(l) => Some(l),
            SymbolData::TypeLabel(t) => Some(&mut t.label),
            _ => None,
        }
    }
}

impl SymbolPayload for TypeLabelSymbol {
    fn project(data: &SymbolData) -> Option<&Self> {
        match data {
            SymbolData::TypeLabel(t) => Some(t),
            _ => None,
        }
    }

    fn project_mut(data: &mut SymbolData) -> Option<&mut Self> {
        match data {
            SymbolData::TypeLabel(t) => Some(t),
            _ => None,
        }
    }
}

impl SymbolPayload for ParameterSymbol {
    fn project(data: &SymbolData) -> Option<&Self> {
        match data {
            SymbolData::Parameter(p) => Some(p),
            SymbolData::Variable(v) => Some(&v.parameter),
            _ => None,
        }
    }

    fn project_mut(data: &mut SymbolData) -> Option<&mut Self> {
        match data {
            SymbolData::Parameter(p) => Some(p),
            SymbolData::Variable(v) => Some(&mut v.parameter),
            _ => None,
        }
    }
}

impl SymbolPayload for VariableSymbol {
    fn project(data: &SymbolData) -> Option<&Self> {
        match data {
            SymbolData::Variable(v) => Some(v),
            _ => None,
        }
    }

    fn project_mut(data: &mut SymbolData) -> Option<&mut Self> {
        match data {
            SymbolData::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl SymbolPayload for FunctionSymbol {
    fn project(data: &SymbolData) -> Option<&Self> {
        match data {
            SymbolData::Function(f) => Some(f),
            _ => None,
        }
    }

    fn project_mut(data: &mut SymbolData) -> Option<&mut Self> {
        match data {
            SymbolData::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl SymbolPayload for ClassSymbol {
    fn project(data: &SymbolData) -> Option<&Self> {
        match data {
            SymbolData::Class(c) => Some(c),
            _ => None,
        }
    }

    fn project_mut(data: &mut SymbolData) -> Option<&mut Self> {
        match data {
            SymbolData::Class(c) => Some(c),
            _ => None,
        }
    }
}

/// シンボル
///
/// `raw_value` はコード生成が使う不変の一意識別子で、一度割り当てられたら
/// 変更されません。`value` は空であってはならず、空を許すのはコンパイラが
/// 合成する内部シンボルだけです。
#[derive(Debug, Clone)]
pub struct Symbol {
    span: Span,
    value: String,
    raw_value: String,
    scope_level: usize,
    data: SymbolData,
}

impl Symbol {
    pub fn new(
        value: impl Into<String>,
        raw_value: impl Into<String>,
        span: Span,
        data: SymbolData,
    ) -> Self {
        Self {
            span,
            value: value.into(),
            raw_value: raw_value.into(),
            scope_level: 0,
            data,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn scope_level(&self) -> usize {
        self.scope_level
    }

    pub fn kind(&self) -> SymbolKind {
        self.data.kind()
    }

    pub fn data(&self) -> &SymbolData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SymbolData {
        &mut self.data
    }

    pub fn payload<T: SymbolPayload>(&self) -> Option<&T> {
        T::project(&self.data)
    }

    pub fn payload_mut<T: SymbolPayload>(&mut self) -> Option<&mut T> {
        T::project_mut(&mut self.data)
    }

    /// 合成された内部シンボルかどうか
    pub fn is_synthetic(&self) -> bool {
        self.value.is_empty()
    }

    /// 別のスコープへ移すためのコピーを作る。元のシンボルは変更しない
    pub fn transform(
        &self,
        value: impl Into<String>,
        raw_value: impl Into<String>,
        scope_level: usize,
    ) -> Symbol {
        Symbol {
            span: self.span,
            value: value.into(),
            raw_value: raw_value.into(),
            scope_level,
            data: self.data.clone(),
        }
    }

    pub(crate) fn set_scope_level(&mut self, level: usize) {
        self.scope_level = level;
    }

    /// ラベルを持つkindならそのマーク状態
    pub fn labels(&self) -> Option<&LabelMarkManager> {
        match &self.data {
            SymbolData::Parameter(p) => Some(&p.labels),
            SymbolData::Variable(v) => Some(&v.parameter.labels),
            SymbolData::Function(f) => Some(&f.labels),
            SymbolData::Class(c) => Some(&c.labels),
            SymbolData::Label(_) | SymbolData::TypeLabel(_) => None,
        }
    }

    pub fn labels_mut(&mut self) -> Option<&mut LabelMarkManager> {
        match &mut self.data {
            SymbolData::Parameter(p) => Some(&mut p.labels),
            SymbolData::Variable(v) => Some(&mut v.parameter.labels),
            SymbolData::Function(f) => Some(&mut f.labels),
            SymbolData::Class(c) => Some(&mut c.labels),
            SymbolData::Label(_) | SymbolData::TypeLabel(_) => None,
        }
    }
}

/// セッション全体で一意なrawValueの発行器
#[derive(Debug, Default)]
pub struct RawValueGenerator {
    next: u64,
}

impl RawValueGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, kind: SymbolKind) -> String {
        let raw = format!("{}_{}", kind.raw_prefix(), self.next);
        self.next += 1;
        raw
    }
}

/// 1つのコンパイル単位のシンボルを保持するアリーナ
#[derive(Debug, Default, Clone)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
    by_raw: HashMap<String, SymbolId>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// シンボルを格納してハンドルを返す
    ///
    /// rawValueの索引は最初に格納されたシンボルを指し続ける。重複の検査は
    /// 呼び出し側（`SymbolTableManager::insert` など）の責任。
    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::from_index(self.symbols.len());
        self.by_raw.entry(symbol.raw_value.clone()).or_insert(id);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn by_raw(&self, raw_value: &str) -> Option<SymbolId> {
        self.by_raw.get(raw_value).copied()
    }

    pub fn payload<T: SymbolPayload>(&self, id: SymbolId) -> Option<&T> {
        self.get(id).payload()
    }

    pub fn payload_mut<T: SymbolPayload>(&mut self, id: SymbolId) -> Option<&mut T> {
        self.get_mut(id).payload_mut()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (SymbolId::from_index(index), symbol))
    }

    /// エイリアス（referenced symbol）をたどって実体を返す
    pub fn resolve_alias(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        let mut visited = vec![id];
        while let Some(target) = self
            .payload::<VariableSymbol>(current)
            .and_then(|v| v.referenced)
        {
            if visited.contains(&target) {
                break;
            }
            visited.push(target);
            current = target;
        }
        current
    }

    /// 別のアリーナの内容をすべて取り込み、旧ハンドルから新ハンドルへの
    /// 対応関数を返す
    ///
    /// rawValueは保持される。同じrawValueのシンボルが既にあれば（同じ
    /// モジュールを別経路でimportした場合）複製せず既存のハンドルに対応させる。
    pub fn absorb(&mut self, other: &SymbolArena) -> impl Fn(SymbolId) -> SymbolId {
        let mut next = self.symbols.len();
        let table: Vec<SymbolId> = other
            .symbols
            .iter()
            .map(|symbol| {
                self.by_raw(symbol.raw_value()).unwrap_or_else(|| {
                    let id = SymbolId::from_index(next);
                    next += 1;
                    id
                })
            })
            .collect();
        let map = move |id: SymbolId| table[id.index()];

        for symbol in &other.symbols {
            if self.by_raw.contains_key(symbol.raw_value()) {
                continue;
            }
            let mut copy = symbol.clone();
            copy.data.remap(&map);
            self.alloc(copy);
        }
        map
    }
}
