//! 宣言（クラス、関数シグネチャ、グローバル変数）の収集

use crate::ast::*;
use crate::error::AnalysisResult;
use crate::symbol::{
    ClassSymbol, FunctionKind, FunctionSymbol, ParameterSymbol, Symbol, SymbolData, SymbolId,
    SymbolKind, VariableSymbol,
};
use super::SemanticAnalyzer;

impl SemanticAnalyzer<'_> {
    /// クラスの外形を登録し、カスタム型を作る
    ///
    /// 基底クラスとメンバーは、すべてのクラス名が揃った第二パスで登録する。
    pub fn collect_class_shell(&mut self, class: &ClassDecl) -> AnalysisResult<SymbolId> {
        let raw = self.session.next_raw(SymbolKind::Class);
        let mut payload = ClassSymbol::new();
        payload.labels = self.label_marks(&class.labels);
        payload.set_type_id(raw.clone());

        let symbol = Symbol::new(&class.name, &raw, class.span, SymbolData::Class(payload));
        let id = self.declare(symbol)?;

        // カスタム型のidはクラスのrawValueをそのまま使う
        self.session
            .types
            .create_custom_type(&class.name, &raw, &raw, class.span)?;
        self.registered_types.push(raw);
        Ok(id)
    }

    /// 関数シグネチャを収集してグローバルスコープに登録する
    pub fn collect_function_signature(&mut self, func: &FunctionDecl) -> AnalysisResult<SymbolId> {
        let symbol = self.build_function(func, FunctionKind::Free)?;
        self.declare(symbol)
    }

    /// グローバル変数を登録する。初期化式は第三パスで検査する
    pub fn collect_global(&mut self, var: &VariableDecl) -> AnalysisResult<SymbolId> {
        let symbol = self.build_variable(var)?;
        self.declare(symbol)
    }

    /// 基底クラス、メンバー、コンストラクタを登録してクラスを確定する
    ///
    /// 本体の解析が必要なメソッドとコンストラクタを返す。個々の失敗は
    /// エラーとして記録し、残りのメンバーの登録を続ける。
    pub fn collect_class_body<'m>(
        &mut self,
        class: SymbolId,
        decl: &'m ClassDecl,
    ) -> Vec<(SymbolId, &'m FunctionDecl)> {
        let mut bodies = Vec::new();

        for base in &decl.bases {
            let result = self
                .resolve_class_path(&base.name, base.span)
                .and_then(|base_id| {
                    self.manager
                        .arena_mut()
                        .add_base_class(class, base_id, base.span)
                });
            if let Err(e) = result {
                self.errors.push(e);
            }
        }

        for member in &decl.members {
            let result = match member {
                Member::Field(field) => self.collect_field(class, field),
                Member::Method(method) => self
                    .collect_method(class, method, FunctionKind::Method)
                    .map(|id| bodies.push((id, method))),
            };
            if let Err(e) = result {
                self.errors.push(e);
            }
        }

        for constructor in &decl.constructors {
            match self.collect_method(class, constructor, FunctionKind::Constructor) {
                Ok(id) => bodies.push((id, constructor)),
                Err(e) => self.errors.push(e),
            }
        }

        self.manager.arena_mut().set_collection_finished(class);
        bodies
    }

    fn collect_field(&mut self, class: SymbolId, field: &VariableDecl) -> AnalysisResult<()> {
        let symbol = self.build_variable(field)?;
        let arena = self.manager.arena_mut();
        let id = arena.alloc(symbol);
        arena.add_member(class, id, false, field.span)
    }

    fn collect_method(
        &mut self,
        class: SymbolId,
        method: &FunctionDecl,
        kind: FunctionKind,
    ) -> AnalysisResult<SymbolId> {
        let symbol = self.build_function(method, kind)?;
        let arena = self.manager.arena_mut();
        let id = arena.alloc(symbol);
        match kind {
            FunctionKind::Constructor => arena.add_constructor(class, id, method.span)?,
            _ => arena.add_member(class, id, false, method.span)?,
        }
        Ok(id)
    }

    /// 変数シンボルを作る（スコープには登録しない）
    pub fn build_variable(&mut self, var: &VariableDecl) -> AnalysisResult<Symbol> {
        let mut variable = VariableSymbol::new(ParameterKind::Positional);
        variable.parameter.labels = self.label_marks(&var.labels);
        variable.parameter.declared_type = var.ty.as_ref().map(|ty| self.resolve_type(ty)).transpose()?;
        variable.default_expr = var.value.as_ref().map(Expression::span);

        let raw = self.session.next_raw(SymbolKind::Variable);
        Ok(Symbol::new(&var.name, raw, var.span, SymbolData::Variable(variable)))
    }

    /// 関数シンボルを作る。引数シンボルはアリーナにだけ置き、本体の解析時に束縛する
    pub fn build_function(&mut self, func: &FunctionDecl, kind: FunctionKind) -> AnalysisResult<Symbol> {
        let mut function = FunctionSymbol::new(kind);
        function.labels = self.label_marks(&func.labels);
        if let Some(return_type) = &func.return_type {
            function.set_return_type(self.resolve_type(return_type)?);
        }

        for param in &func.params {
            let mut parameter = ParameterSymbol::new(param.kind);
            parameter.labels = self.label_marks(&param.labels);
            parameter.declared_type = param.ty.as_ref().map(|ty| self.resolve_type(ty)).transpose()?;
            parameter.default_value = param.default.as_ref().map(Self::describe_expression);

            let raw = self.session.next_raw(SymbolKind::Parameter);
            let symbol = Symbol::new(&param.name, raw, param.span, SymbolData::Parameter(parameter));
            function.params.push(self.manager.arena_mut().alloc(symbol));
        }

        let raw = self.session.next_raw(SymbolKind::Function);
        Ok(Symbol::new(&func.name, raw, func.span, SymbolData::Function(function)))
    }
}
