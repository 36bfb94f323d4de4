//! 型ラベルとカスタム型レジストリ
//!
//! 型は組み込み型か、クラスに裏付けられたカスタム型のどちらかです。
//! カスタム型はコンパイルセッションが所有する [`TypeRegistry`] に登録され、
//! 型の互換性（related）判定は継承グラフをたどって行われます。

use crate::ast::Span;
use crate::error::{AnalysisResult, AnalyzerError};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use super::label::{Label, LabelSymbol};
use super::{ClassSymbol, Symbol, SymbolArena, SymbolData, SymbolId};

/// 組み込み型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinType {
    Int,
    Float,
    Str,
    Bool,
    Char,
    Void,
    Null,
    Any,
    /// 戻り値なしの関数
    Func,
    /// 戻り値ありの関数
    Funi,
    Class,
    List,
    Dict,
    Series,
    Flag,
    /// 可変長位置引数
    Args,
    /// 可変長キーワード引数
    Kwargs,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 17] = [
        BuiltinType::Int,
        BuiltinType::Float,
        BuiltinType::Str,
        BuiltinType::Bool,
        BuiltinType::Char,
        BuiltinType::Void,
        BuiltinType::Null,
        BuiltinType::Any,
        BuiltinType::Func,
        BuiltinType::Funi,
        BuiltinType::Class,
        BuiltinType::List,
        BuiltinType::Dict,
        BuiltinType::Series,
        BuiltinType::Flag,
        BuiltinType::Args,
        BuiltinType::Kwargs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Int => "int",
            BuiltinType::Float => "float",
            BuiltinType::Str => "str",
            BuiltinType::Bool => "bool",
            BuiltinType::Char => "char",
            BuiltinType::Void => "void",
            BuiltinType::Null => "null",
            BuiltinType::Any => "any",
            BuiltinType::Func => "func",
            BuiltinType::Funi => "funi",
            BuiltinType::Class => "class",
            BuiltinType::List => "list",
            BuiltinType::Dict => "dict",
            BuiltinType::Series => "series",
            BuiltinType::Flag => "flag",
            BuiltinType::Args => "args",
            BuiltinType::Kwargs => "kwargs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|builtin| builtin.name() == name)
    }

    pub fn is_container(self) -> bool {
        matches!(
            self,
            BuiltinType::List
                | BuiltinType::Dict
                | BuiltinType::Series
                | BuiltinType::Args
                | BuiltinType::Kwargs
        )
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 型の基底部分
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeBase {
    Builtin(BuiltinType),
    /// カスタム型id
    Custom(String),
}

/// 型ラベルの値表現（`list<int>` など）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeLabel {
    pub base: TypeBase,
    pub descriptors: Vec<Vec<TypeLabel>>,
}

impl TypeLabel {
    pub fn builtin(builtin: BuiltinType) -> Self {
        Self {
            base: TypeBase::Builtin(builtin),
            descriptors: Vec::new(),
        }
    }

    pub fn custom(id: impl Into<String>) -> Self {
        Self {
            base: TypeBase::Custom(id.into()),
            descriptors: Vec::new(),
        }
    }

    pub fn any() -> Self {
        Self::builtin(BuiltinType::Any)
    }

    pub fn void() -> Self {
        Self::builtin(BuiltinType::Void)
    }

    pub fn with_group(mut self, group: Vec<TypeLabel>) -> Self {
        self.descriptors.push(group);
        self
    }

    pub fn list_of(element: TypeLabel) -> Self {
        Self::builtin(BuiltinType::List).with_group(vec![element])
    }

    pub fn dict_of(key: TypeLabel, value: TypeLabel) -> Self {
        Self::builtin(BuiltinType::Dict).with_group(vec![key, value])
    }

    pub fn is(&self, builtin: BuiltinType) -> bool {
        self.base == TypeBase::Builtin(builtin)
    }

    pub fn is_any(&self) -> bool {
        self.is(BuiltinType::Any)
    }

    pub fn is_void(&self) -> bool {
        self.is(BuiltinType::Void)
    }

    pub fn custom_id(&self) -> Option<&str> {
        match &self.base {
            TypeBase::Custom(id) => Some(id),
            TypeBase::Builtin(_) => None,
        }
    }

    /// 反復したときの要素型。記述子がなければany
    pub fn element_type(&self) -> TypeLabel {
        if self.is(BuiltinType::Str) {
            return TypeLabel::builtin(BuiltinType::Str);
        }
        self.descriptors
            .first()
            .and_then(|group| group.first())
            .cloned()
            .unwrap_or_else(TypeLabel::any)
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            TypeBase::Builtin(builtin) => write!(f, "{}", builtin)?,
            TypeBase::Custom(id) => write!(f, "{}", id)?,
        }
        for group in &self.descriptors {
            let items: Vec<String> = group.iter().map(|t| t.to_string()).collect();
            write!(f, "<{}>", items.join(", "))?;
        }
        Ok(())
    }
}

/// 型ラベルシンボル（LabelSymbolの一種）
#[derive(Debug, Clone, PartialEq)]
pub struct TypeLabelSymbol {
    pub label: LabelSymbol,
    pub base: TypeBase,
}

impl TypeLabelSymbol {
    pub fn new(base: TypeBase, name: impl Into<String>) -> Self {
        Self {
            label: LabelSymbol::new(Label::Type(name.into())),
            base,
        }
    }

    /// 記述子を含めた型の値
    pub fn type_label(&self) -> TypeLabel {
        TypeLabel {
            base: self.base.clone(),
            descriptors: self.label.descriptors.groups().to_vec(),
        }
    }
}

/// 登録済みのカスタム型
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomType {
    pub name: String,
    /// 所有クラスのrawValue
    pub class_raw: String,
}

/// 組み込み型とカスタム型のレジストリ
///
/// コンパイルセッションごとに作られ、セッションの終了とともに破棄されます。
#[derive(Debug)]
pub struct TypeRegistry {
    builtins: IndexMap<&'static str, BuiltinType>,
    custom: IndexMap<String, CustomType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let builtins = BuiltinType::ALL
            .iter()
            .map(|builtin| (builtin.name(), *builtin))
            .collect();
        Self {
            builtins,
            custom: IndexMap::new(),
        }
    }

    pub fn builtin(&self, name: &str) -> Option<BuiltinType> {
        self.builtins.get(name).copied()
    }

    pub fn is_builtin_name(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// クラスをカスタム型として登録する。同じidの再登録はエラー
    pub fn create_custom_type(
        &mut self,
        name: impl Into<String>,
        id: impl Into<String>,
        class_raw: impl Into<String>,
        span: Span,
    ) -> AnalysisResult<()> {
        let name = name.into();
        let id = id.into();
        if self.custom.contains_key(&id) {
            return Err(AnalyzerError::DuplicateType { id, name, span });
        }
        log::debug!("カスタム型を登録: {} ({})", name, id);
        self.custom.insert(
            id,
            CustomType {
                name,
                class_raw: class_raw.into(),
            },
        );
        Ok(())
    }

    pub fn remove_custom_type(&mut self, id: &str) -> Option<CustomType> {
        let removed = self.custom.shift_remove(id);
        if removed.is_some() {
            log::debug!("カスタム型を削除: {}", id);
        }
        removed
    }

    pub fn custom_type(&self, id: &str) -> Option<&CustomType> {
        self.custom.get(id)
    }

    pub fn custom_type_name(&self, id: &str) -> Option<&str> {
        self.custom.get(id).map(|custom| custom.name.as_str())
    }

    /// カスタム型を所有するクラスのrawValue
    pub fn custom_class_symbol(&self, id: &str) -> Option<&str> {
        self.custom.get(id).map(|custom| custom.class_raw.as_str())
    }

    /// 指定スコープレベルに束縛された新しい型ラベルシンボルを作る
    pub fn custom_type_label_symbol(
        &self,
        id: &str,
        scope_level: usize,
        raw_value: impl Into<String>,
        span: Span,
    ) -> Option<Symbol> {
        let custom = self.custom.get(id)?;
        let data = TypeLabelSymbol::new(TypeBase::Custom(id.to_string()), custom.name.clone());
        let mut symbol = Symbol::new(
            custom.name.clone(),
            raw_value,
            span,
            SymbolData::TypeLabel(data),
        );
        symbol.set_scope_level(scope_level);
        Some(symbol)
    }

    pub fn custom_types(&self) -> impl Iterator<Item = (&str, &CustomType)> {
        self.custom.iter().map(|(id, custom)| (id.as_str(), custom))
    }

    /// カスタム型idに対応するクラスのハンドル
    pub fn class_of(&self, arena: &SymbolArena, id: &str) -> Option<SymbolId> {
        let raw = self.custom_class_symbol(id)?;
        arena.by_raw(raw)
    }

    /// 宣言名を使った表示
    pub fn display(&self, ty: &TypeLabel) -> String {
        let mut text = match &ty.base {
            TypeBase::Builtin(builtin) => builtin.name().to_string(),
            TypeBase::Custom(id) => self.custom_type_name(id).unwrap_or(id.as_str()).to_string(),
        };
        for group in &ty.descriptors {
            let items: Vec<String> = group.iter().map(|t| self.display(t)).collect();
            text.push('<');
            text.push_str(&items.join(", "));
            text.push('>');
        }
        text
    }

    /// `ty` が `other` として使えるかどうか
    ///
    /// - どの型もanyに関連する
    /// - 同じ組み込み型は、記述子が両方にあればグループごとに要素が関連する場合に関連する
    /// - カスタム型は同一の型か、推移的な基底クラスの型に関連する
    pub fn related_to(&self, arena: &SymbolArena, ty: &TypeLabel, other: &TypeLabel) -> bool {
        if other.is_any() {
            return true;
        }
        match (&ty.base, &other.base) {
            (TypeBase::Builtin(a), TypeBase::Builtin(b)) => {
                a == b && self.descriptors_related(arena, ty, other)
            }
            (TypeBase::Custom(a), TypeBase::Custom(b)) => {
                a == b || self.is_ancestor_type(arena, a, b)
            }
            _ => false,
        }
    }

    fn descriptors_related(&self, arena: &SymbolArena, ty: &TypeLabel, other: &TypeLabel) -> bool {
        if ty.descriptors.is_empty() || other.descriptors.is_empty() {
            return true;
        }
        if ty.descriptors.len() != other.descriptors.len() {
            return false;
        }
        ty.descriptors
            .iter()
            .zip(&other.descriptors)
            .all(|(group, other_group)| {
                group.len() == other_group.len()
                    && group
                        .iter()
                        .zip(other_group)
                        .all(|(t, o)| self.related_to(arena, t, o))
            })
    }

    fn is_ancestor_type(&self, arena: &SymbolArena, id: &str, ancestor_id: &str) -> bool {
        match (self.class_of(arena, id), self.class_of(arena, ancestor_id)) {
            (Some(class), Some(ancestor)) => arena.is_super_class_of(ancestor, class, false),
            _ => false,
        }
    }

    /// for文で反復できる型かどうか
    pub fn is_iterable(&self, arena: &SymbolArena, ty: &TypeLabel) -> bool {
        match &ty.base {
            TypeBase::Builtin(builtin) => matches!(
                builtin,
                BuiltinType::List | BuiltinType::Dict | BuiltinType::Series | BuiltinType::Str
            ),
            TypeBase::Custom(id) => self
                .class_of(arena, id)
                .and_then(|class| arena.payload::<ClassSymbol>(class))
                .map(|class| class.labels.is_iterable_marked())
                .unwrap_or(false),
        }
    }
}
