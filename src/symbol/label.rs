//! ラベル（宣言に付く修飾子）

use crate::ast::Span;
use crate::error::{AnalysisResult, AnalyzerError};
use bitflags::{bitflags, Flags};
use serde::Serialize;
use std::fmt;

use super::type_label::TypeLabel;

/// 可視性ラベル。1つのシンボルに高々1つ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Public,
    Protected,
    Private,
}

impl Permission {
    pub fn name(self) -> &'static str {
        match self {
            Permission::Public => "public",
            Permission::Protected => "protected",
            Permission::Private => "private",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

bitflags! {
    /// ライフサイクルラベル
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Lifecycle: u8 {
        const STATIC = 1 << 0;
        const FINAL = 1 << 1;
    }
}

bitflags! {
    /// 制限ラベル
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Restriction: u8 {
        const CONST = 1 << 0;
        const QUOTE = 1 << 1;
    }
}

bitflags! {
    /// オブジェクト指向ラベル
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectOriented: u8 {
        const OVERWRITE = 1 << 0;
        const INTERFACE = 1 << 1;
        const VIRTUAL = 1 << 2;
        /// for文で反復可能なクラス
        const ITERABLE = 1 << 3;
    }
}

/// ラベルのカテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelCategory {
    Permission,
    Lifecycle,
    Restriction,
    ObjectOriented,
    Type,
}

/// 分類済みのラベル
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Permission(Permission),
    Lifecycle(Lifecycle),
    Restriction(Restriction),
    ObjectOriented(ObjectOriented),
    /// ジェネリック制約や型記述子として使われる任意の型ラベル
    Type(String),
}

impl Label {
    /// ラベル名を分類する。既知のキーワード以外はすべて型ラベル
    pub fn parse(name: &str) -> Label {
        match name {
            "public" => Label::Permission(Permission::Public),
            "protected" => Label::Permission(Permission::Protected),
            "private" => Label::Permission(Permission::Private),
            "static" => Label::Lifecycle(Lifecycle::STATIC),
            "final" => Label::Lifecycle(Lifecycle::FINAL),
            "const" => Label::Restriction(Restriction::CONST),
            "quote" => Label::Restriction(Restriction::QUOTE),
            "overwrite" => Label::ObjectOriented(ObjectOriented::OVERWRITE),
            "interface" => Label::ObjectOriented(ObjectOriented::INTERFACE),
            "virtual" => Label::ObjectOriented(ObjectOriented::VIRTUAL),
            "iterable" => Label::ObjectOriented(ObjectOriented::ITERABLE),
            other => Label::Type(other.to_string()),
        }
    }

    pub fn category(&self) -> LabelCategory {
        match self {
            Label::Permission(_) => LabelCategory::Permission,
            Label::Lifecycle(_) => LabelCategory::Lifecycle,
            Label::Restriction(_) => LabelCategory::Restriction,
            Label::ObjectOriented(_) => LabelCategory::ObjectOriented,
            Label::Type(_) => LabelCategory::Type,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Label::Permission(p) => p.name().to_string(),
            Label::Lifecycle(flags) => flag_names(flags),
            Label::Restriction(flags) => flag_names(flags),
            Label::ObjectOriented(flags) => flag_names(flags),
            Label::Type(name) => name.clone(),
        }
    }
}

fn flag_names<B: Flags>(flags: &B) -> String {
    flags
        .iter_names()
        .map(|(name, _)| name.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// ラベルに付くジェネリック引数グループの列
///
/// 収集中は追加のみ可能で、宣言の解析が終わった時点で凍結されます。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorGroups {
    groups: Vec<Vec<TypeLabel>>,
    frozen: bool,
}

impl DescriptorGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_group(&mut self, group: Vec<TypeLabel>, span: Span) -> AnalysisResult<()> {
        if self.frozen {
            return Err(AnalyzerError::InvalidOperation {
                message: "凍結済みのラベルに型記述子を追加することはできません".to_string(),
                span,
            });
        }
        self.groups.push(group);
        Ok(())
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn groups(&self) -> &[Vec<TypeLabel>] {
        &self.groups
    }
}

/// ラベルシンボル
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSymbol {
    pub label: Label,
    pub descriptors: DescriptorGroups,
}

impl LabelSymbol {
    pub fn new(label: Label) -> Self {
        Self {
            label,
            descriptors: DescriptorGroups::new(),
        }
    }

    pub fn category(&self) -> LabelCategory {
        self.label.category()
    }
}
