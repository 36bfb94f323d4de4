//! 関数シンボル

use crate::ast::Span;
use crate::error::{AnalysisResult, AnalyzerError};
use serde::Serialize;

use super::label_mark::LabelMarkManager;
use super::parameter::{ParameterKind, ParameterSymbol};
use super::type_label::{BuiltinType, TypeLabel, TypeRegistry};
use super::{SymbolArena, SymbolId};

/// 関数の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    Free,
    Constructor,
    Method,
    Anonymous,
}

/// 関数の出自
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinOrigin {
    /// ユーザー定義
    User,
    /// 純粋な組み込み関数
    Builtin,
    /// 外部から登録された組み込み関数
    External,
}

/// 関数シンボル
///
/// 戻り値型の「未設定」(`None`) と「明示的なvoid」(`Some(void)`) は区別されます。
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSymbol {
    pub params: Vec<SymbolId>,
    return_type: Option<TypeLabel>,
    returned: bool,
    pub owner: Option<SymbolId>,
    pub kind: FunctionKind,
    pub origin: BuiltinOrigin,
    pub labels: LabelMarkManager,
}

impl FunctionSymbol {
    pub fn new(kind: FunctionKind) -> Self {
        Self {
            params: Vec::new(),
            return_type: None,
            returned: false,
            owner: None,
            kind,
            origin: BuiltinOrigin::User,
            labels: LabelMarkManager::new(),
        }
    }

    pub fn set_return_type(&mut self, ty: TypeLabel) {
        self.return_type = Some(ty);
    }

    pub fn return_type(&self) -> Option<&TypeLabel> {
        self.return_type.as_ref()
    }

    pub fn is_return_unset(&self) -> bool {
        self.return_type.is_none()
    }

    /// return文を実行したことを記録する
    pub fn mark_returned(&mut self) {
        self.returned = true;
    }

    pub fn has_returned(&self) -> bool {
        self.returned
    }

    /// 呼び出し式の型。戻り値型が未設定ならany
    pub fn result_type(&self) -> TypeLabel {
        self.return_type.clone().unwrap_or_else(TypeLabel::any)
    }

    /// 関数本体の終わりで、戻り値型に対してreturn文が実行されたかを確認する
    pub fn check_return_completeness(
        &self,
        name: &str,
        registry: &TypeRegistry,
        span: Span,
    ) -> AnalysisResult<()> {
        match &self.return_type {
            Some(ty) if !ty.is_void() && !self.returned => Err(AnalyzerError::MissingReturn {
                name: name.to_string(),
                expected: registry.display(ty),
                span,
            }),
            _ => Ok(()),
        }
    }
}

impl SymbolArena {
    fn parameters_of(&self, function: &FunctionSymbol) -> Vec<&ParameterSymbol> {
        function
            .params
            .iter()
            .filter_map(|param| self.payload::<ParameterSymbol>(*param))
            .collect()
    }

    /// 引数型と戻り値型から導出されるシグネチャ型
    ///
    /// 戻り値型が未設定かvoidなら `func<P...>`、それ以外は `funi<P...><R>`。
    pub fn function_signature(&self, id: SymbolId) -> Option<TypeLabel> {
        let function = self.payload::<FunctionSymbol>(id)?;
        let params: Vec<TypeLabel> = self
            .parameters_of(function)
            .iter()
            .map(|param| param.effective_type())
            .collect();
        let signature = match function.return_type() {
            Some(ret) if !ret.is_void() => {
                TypeLabel::builtin(BuiltinType::Funi).with_group(params).with_group(vec![ret.clone()])
            }
            _ => TypeLabel::builtin(BuiltinType::Func).with_group(params),
        };
        Some(signature)
    }

    /// 引数の型列で関数を呼び出せるかを検査する。anyの引数は実行時まで判定しない
    pub fn check_call(
        &self,
        registry: &TypeRegistry,
        id: SymbolId,
        args: &[TypeLabel],
        span: Span,
    ) -> AnalysisResult<()> {
        let function = self
            .payload::<FunctionSymbol>(id)
            .ok_or_else(|| AnalyzerError::InvalidOperation {
                message: format!("{} は関数ではありません", self.get(id).value()),
                span,
            })?;
        let params = self.parameters_of(function);

        let slots: Vec<&ParameterSymbol> = params
            .iter()
            .copied()
            .filter(|p| matches!(p.kind, ParameterKind::Positional | ParameterKind::Keyword))
            .collect();
        let varargs = params
            .iter()
            .copied()
            .find(|p| p.kind == ParameterKind::VarArgs);
        let required = params.iter().filter(|p| !p.is_optional()).count();

        if args.len() < required || (varargs.is_none() && args.len() > slots.len()) {
            let expected = if varargs.is_some() {
                format!("{}以上", required)
            } else if required == slots.len() {
                required.to_string()
            } else {
                format!("{}〜{}", required, slots.len())
            };
            return Err(AnalyzerError::ArgumentCountMismatch {
                expected,
                found: args.len(),
                span,
            });
        }

        for (index, arg) in args.iter().enumerate() {
            let expected = match (slots.get(index), varargs) {
                (Some(slot), _) => slot.effective_type(),
                (None, Some(rest)) => rest.effective_type().element_type(),
                (None, None) => TypeLabel::any(),
            };
            if !arg.is_any() && !registry.related_to(self, arg, &expected) {
                return Err(AnalyzerError::UnrelatedTypes {
                    expected: registry.display(&expected),
                    found: registry.display(arg),
                    span,
                });
            }
        }
        Ok(())
    }
}
