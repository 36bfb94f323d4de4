//! 引数シンボルと変数シンボル

use crate::ast::Span;

use super::label_mark::LabelMarkManager;
use super::type_label::TypeLabel;
use super::SymbolId;

pub use crate::ast::ParameterKind;

/// 引数シンボル
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSymbol {
    pub kind: ParameterKind,
    /// 宣言された型
    pub declared_type: Option<TypeLabel>,
    /// 推論・代入された値の型
    pub value_type: Option<TypeLabel>,
    /// デフォルト値のテキスト表現
    pub default_value: Option<String>,
    pub labels: LabelMarkManager,
}

impl ParameterSymbol {
    pub fn new(kind: ParameterKind) -> Self {
        Self {
            kind,
            declared_type: None,
            value_type: None,
            default_value: None,
            labels: LabelMarkManager::new(),
        }
    }

    pub fn with_type(mut self, ty: TypeLabel) -> Self {
        self.declared_type = Some(ty);
        self
    }

    /// 呼び出し時に省略できるかどうか
    pub fn is_optional(&self) -> bool {
        self.default_value.is_some()
            || matches!(
                self.kind,
                ParameterKind::Keyword | ParameterKind::VarArgs | ParameterKind::KwArgs
            )
    }

    /// 型チェックに使う型。宣言型、値の型、anyの順に採用する
    pub fn effective_type(&self) -> TypeLabel {
        self.declared_type
            .clone()
            .or_else(|| self.value_type.clone())
            .unwrap_or_else(TypeLabel::any)
    }

    pub fn is_const(&self) -> bool {
        self.labels.is_const_marked()
    }
}

/// 変数シンボル（ParameterSymbolの一種）
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSymbol {
    pub parameter: ParameterSymbol,
    /// メンバー変数なら所有クラス
    pub owner: Option<SymbolId>,
    /// 自前の記憶域を持たず、既存のシンボルに束縛される場合の参照先
    pub referenced: Option<SymbolId>,
    /// デフォルト値の式の位置。式そのものは構文木が所有する
    pub default_expr: Option<Span>,
}

impl VariableSymbol {
    pub fn new(kind: ParameterKind) -> Self {
        Self {
            parameter: ParameterSymbol::new(kind),
            owner: None,
            referenced: None,
            default_expr: None,
        }
    }

    /// 既存のシンボルへのエイリアスを作る
    pub fn alias_of(target: SymbolId, ty: TypeLabel) -> Self {
        let mut variable = Self::new(ParameterKind::Positional);
        variable.referenced = Some(target);
        variable.parameter.value_type = Some(ty);
        variable
    }

    pub fn is_alias(&self) -> bool {
        self.referenced.is_some()
    }

    pub fn effective_type(&self) -> TypeLabel {
        self.parameter.effective_type()
    }
}
