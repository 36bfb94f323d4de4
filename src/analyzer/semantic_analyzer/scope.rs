//! スコープ管理と名前・型の解決

use crate::ast::*;
use crate::error::{AnalysisResult, AnalyzerError};
use crate::symbol::{
    BuiltinType, ClassSymbol, FunctionSymbol, Label, LabelMarkManager, ParameterSymbol, Symbol, SymbolData,
    SymbolId, TypeLabel,
};
use super::SemanticAnalyzer;

impl SemanticAnalyzer<'_> {
    /// 外側のスコープの束縛を隠す宣言なら警告を記録する
    pub fn check_shadowing(&mut self, name: &str, span: Span) {
        if !self.session.options.warn_shadowing || name.is_empty() {
            return;
        }
        if let Some((_, level)) = self.manager.find_by_name(name, None) {
            if level < self.manager.current_level() {
                log::debug!("{} が外側の定義を隠しています", name);
                self.warnings.push(AnalyzerError::ShadowedDeclaration {
                    name: name.to_string(),
                    outer_level: level,
                    span,
                });
            }
        }
    }

    /// 現在のスコープにユーザー宣言のシンボルを登録する
    pub fn declare(&mut self, symbol: Symbol) -> AnalysisResult<SymbolId> {
        self.check_shadowing(symbol.value(), symbol.span());
        self.manager.insert(symbol, false)
    }

    /// 新しいスコープで処理を実行する。エラーでも必ずスコープを出る
    pub fn with_scope<T>(
        &mut self,
        span: Span,
        f: impl FnOnce(&mut Self) -> AnalysisResult<T>,
    ) -> AnalysisResult<T> {
        self.manager.enter_scope();
        let result = f(self);
        self.manager.exit_scope(span)?;
        result
    }

    /// 名前を現在のスコープから外側に向かって解決する
    pub fn lookup(&self, name: &str, span: Span) -> AnalysisResult<SymbolId> {
        self.manager
            .find_by_name(name, None)
            .map(|(id, _)| id)
            .ok_or_else(|| AnalyzerError::UndefinedReference {
                name: name.to_string(),
                span,
            })
    }

    /// ラベル参照列からマーク状態を作る
    pub fn label_marks(&self, labels: &[LabelRef]) -> LabelMarkManager {
        let labels: Vec<Label> = labels.iter().map(|label| Label::parse(&label.name)).collect();
        LabelMarkManager::from_labels(&labels)
    }

    /// 型の参照を解決する
    ///
    /// 組み込み型名、スコープ内のクラス名、`module.Class` 形式の
    /// import先クラスの順に試す。
    pub fn resolve_type(&self, label: &LabelRef) -> AnalysisResult<TypeLabel> {
        if let Some(builtin) = self.session.types.builtin(&label.name) {
            let mut ty = TypeLabel::builtin(builtin);
            for group in &label.descriptors {
                let group = group
                    .iter()
                    .map(|descriptor| self.resolve_type(descriptor))
                    .collect::<AnalysisResult<Vec<_>>>()?;
                ty = ty.with_group(group);
            }
            return Ok(ty);
        }

        let class = self.resolve_class_path(&label.name, label.span)?;
        self.manager
            .arena()
            .payload::<ClassSymbol>(class)
            .and_then(ClassSymbol::instance_type)
            .ok_or_else(|| AnalyzerError::InvalidOperation {
                message: format!("{} は型として使えません", label.name),
                span: label.span,
            })
    }

    /// `a.b.C` 形式のパスをクラスシンボルに解決する
    pub fn resolve_class_path(&self, path: &str, span: Span) -> AnalysisResult<SymbolId> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut class = self
            .manager
            .find_by_name_as::<ClassSymbol>(first, None)
            .map(|(id, _)| id)
            .ok_or_else(|| AnalyzerError::UndefinedReference {
                name: first.to_string(),
                span,
            })?;

        let arena = self.manager.arena();
        for segment in segments {
            let member = arena
                .find_member_symbol(class, segment)
                .filter(|member| arena.payload::<ClassSymbol>(*member).is_some())
                .ok_or_else(|| AnalyzerError::UndefinedMember {
                    class: arena.get(class).value().to_string(),
                    member: segment.to_string(),
                    span,
                })?;
            class = member;
        }
        Ok(class)
    }

    /// シンボルを値として使ったときの型
    pub fn symbol_type(&self, id: SymbolId) -> TypeLabel {
        let arena = self.manager.arena();
        match arena.get(id).data() {
            SymbolData::Parameter(_) | SymbolData::Variable(_) => arena
                .payload::<ParameterSymbol>(id)
                .map(ParameterSymbol::effective_type)
                .unwrap_or_else(TypeLabel::any),
            SymbolData::Function(_) => arena
                .function_signature(id)
                .unwrap_or_else(TypeLabel::any),
            SymbolData::Class(_) => TypeLabel::builtin(BuiltinType::Class),
            SymbolData::TypeLabel(label) => label.type_label(),
            SymbolData::Label(_) => TypeLabel::any(),
        }
    }

    /// 型の互換性を検査する。値の型がanyなら実行時まで判定を遅らせる
    pub fn check_assignable(
        &self,
        found: &TypeLabel,
        expected: &TypeLabel,
        span: Span,
    ) -> AnalysisResult<()> {
        let types = &self.session.types;
        if found.is_any() || types.related_to(self.manager.arena(), found, expected) {
            return Ok(());
        }
        Err(AnalyzerError::TypeMismatch {
            expected: types.display(expected),
            found: types.display(found),
            span,
        })
    }

    /// 現在の関数のシンボル
    pub fn current_function_symbol(&self) -> Option<&FunctionSymbol> {
        self.current_function
            .and_then(|id| self.manager.arena().payload::<FunctionSymbol>(id))
    }
}
