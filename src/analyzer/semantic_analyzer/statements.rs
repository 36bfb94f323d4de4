//! 関数本体と文の解析

use crate::ast::*;
use crate::error::{AnalysisResult, AnalyzerError};
use crate::symbol::{
    BuiltinType, ClassSymbol, FunctionSymbol, ParameterSymbol, Symbol, SymbolData, SymbolId,
    SymbolKind, TypeLabel, VariableSymbol,
};
use super::SemanticAnalyzer;

impl SemanticAnalyzer<'_> {
    /// グローバル変数の初期化式を検査する
    pub fn analyze_global_initializer(&mut self, id: SymbolId, var: &VariableDecl) -> AnalysisResult<()> {
        let Some(value) = &var.value else {
            return Ok(());
        };
        let found = self.infer_expression(value)?;
        self.bind_value_type(id, found, value.span())
    }

    /// 宣言型があれば互換性を検査し、なければ値の型を記録する
    fn bind_value_type(&mut self, id: SymbolId, found: TypeLabel, span: Span) -> AnalysisResult<()> {
        let declared = self
            .manager
            .arena()
            .payload::<ParameterSymbol>(id)
            .and_then(|parameter| parameter.declared_type.clone());
        match declared {
            Some(expected) => self.check_assignable(&found, &expected, span),
            None => {
                if let Some(parameter) = self.manager.arena_mut().payload_mut::<ParameterSymbol>(id) {
                    parameter.value_type = Some(found);
                }
                Ok(())
            }
        }
    }

    /// 関数・メソッド・コンストラクタの本体を解析する
    pub fn analyze_function(&mut self, id: SymbolId, func: &FunctionDecl) -> AnalysisResult<()> {
        let owner = self
            .manager
            .arena()
            .payload::<FunctionSymbol>(id)
            .and_then(|function| function.owner);

        let previous_function = self.current_function.replace(id);
        let previous_class = std::mem::replace(&mut self.current_class, owner);
        let result = self.with_scope(func.span, |analyzer| analyzer.analyze_function_body(id, func));
        self.current_function = previous_function;
        self.current_class = previous_class;
        result
    }

    fn analyze_function_body(&mut self, id: SymbolId, func: &FunctionDecl) -> AnalysisResult<()> {
        // メソッドには所有クラスを指すシステム定義のthisを置く。同名の引数で置き換えられる
        if let Some(class) = self.current_class {
            let ty = self
                .manager
                .arena()
                .payload::<ClassSymbol>(class)
                .and_then(ClassSymbol::instance_type)
                .unwrap_or_else(TypeLabel::any);
            let raw = self.session.next_raw(SymbolKind::Variable);
            let this = Symbol::new(
                "this",
                raw,
                func.span,
                SymbolData::Variable(VariableSymbol::alias_of(class, ty)),
            );
            self.manager.insert(this, true)?;
        }

        let params = self
            .manager
            .arena()
            .payload::<FunctionSymbol>(id)
            .map(|function| function.params.clone())
            .unwrap_or_default();
        for (param, decl) in params.into_iter().zip(&func.params) {
            self.check_shadowing(&decl.name, decl.span);
            self.manager.bind(param, false)?;
            if let Some(default) = &decl.default {
                let found = self.infer_expression(default)?;
                self.bind_value_type(param, found, default.span())?;
            }
        }

        self.analyze_statements(&func.body.statements);

        if let Some(function) = self.manager.arena().payload::<FunctionSymbol>(id) {
            function.check_return_completeness(&func.name, &self.session.types, func.span)?;
        }
        Ok(())
    }

    /// ブロックを新しいスコープで解析する
    pub fn analyze_block(&mut self, block: &Block) -> AnalysisResult<()> {
        self.with_scope(block.span, |analyzer| {
            analyzer.analyze_statements(&block.statements);
            Ok(())
        })
    }

    /// 文を順に解析する。失敗した文はエラーとして記録して続ける
    fn analyze_statements(&mut self, statements: &[Statement]) {
        for stmt in statements {
            if let Err(e) = self.analyze_statement(stmt) {
                self.errors.push(e);
            }
        }
    }

    /// 文を解析
    pub fn analyze_statement(&mut self, stmt: &Statement) -> AnalysisResult<()> {
        match stmt {
            Statement::Let(var) => self.analyze_let_statement(var),
            Statement::Assignment(assign) => self.analyze_assignment(assign),
            Statement::Return(ret) => self.analyze_return_statement(ret),
            Statement::If(if_stmt) => self.analyze_if_statement(if_stmt),
            Statement::While(while_stmt) => self.analyze_while_statement(while_stmt),
            Statement::For(for_stmt) => self.analyze_for_statement(for_stmt),
            Statement::Block(block) => self.analyze_block(block),
            Statement::Expression(expr) => self.infer_expression(&expr.expr).map(|_| ()),
        }
    }

    /// let文の解析
    ///
    /// 初期化式は宣言より先に評価するので、`let x = x` の右辺は外側のxを指す。
    pub fn analyze_let_statement(&mut self, var: &VariableDecl) -> AnalysisResult<()> {
        let found = var
            .value
            .as_ref()
            .map(|value| self.infer_expression(value))
            .transpose()?;
        let symbol = self.build_variable(var)?;
        let id = self.declare(symbol)?;
        match (found, &var.value) {
            (Some(found), Some(value)) => self.bind_value_type(id, found, value.span()),
            _ => Ok(()),
        }
    }

    /// 代入文の解析
    pub fn analyze_assignment(&mut self, assign: &AssignStatement) -> AnalysisResult<()> {
        let target = match &assign.target {
            Expression::Identifier(ident) => Some(self.lookup(&ident.name, ident.span)?),
            Expression::Member(member) => self.resolve_member(member)?,
            other => {
                return Err(AnalyzerError::InvalidOperation {
                    message: format!("{} には代入できません", other.kind()),
                    span: assign.span,
                })
            }
        };
        let found = self.infer_expression(&assign.value)?;

        // メンバーの型がanyで解決できない場合は動的に扱う
        let Some(target) = target else {
            return Ok(());
        };
        let target = self.manager.arena().resolve_alias(target);
        let symbol = self.manager.symbol(target);
        let Some(parameter) = symbol.payload::<ParameterSymbol>() else {
            return Err(AnalyzerError::InvalidOperation {
                message: format!("{} {} には代入できません", symbol.kind(), symbol.value()),
                span: assign.span,
            });
        };
        if parameter.is_const() {
            return Err(AnalyzerError::ConstAssignment {
                name: symbol.value().to_string(),
                span: assign.span,
            });
        }
        self.check_assignable(&found, &parameter.effective_type(), assign.value.span())
    }

    /// return文の解析
    pub fn analyze_return_statement(&mut self, ret: &ReturnStatement) -> AnalysisResult<()> {
        let Some(function_id) = self.current_function else {
            return Err(AnalyzerError::InvalidOperation {
                message: "関数の外でreturnは使えません".to_string(),
                span: ret.span,
            });
        };
        let found = match &ret.value {
            Some(value) => self.infer_expression(value)?,
            None => TypeLabel::void(),
        };

        let expected = self
            .current_function_symbol()
            .and_then(|function| function.return_type().cloned());
        if let Some(expected) = expected {
            let types = &self.session.types;
            let related = if expected.is_void() {
                found.is_void()
            } else {
                found.is_any() || types.related_to(self.manager.arena(), &found, &expected)
            };
            if !related {
                return Err(AnalyzerError::TypeMismatch {
                    expected: types.display(&expected),
                    found: types.display(&found),
                    span: ret.span,
                });
            }
        }

        if let Some(function) = self.manager.arena_mut().payload_mut::<FunctionSymbol>(function_id) {
            function.mark_returned();
        }
        Ok(())
    }

    fn check_condition(&mut self, condition: &Expression) -> AnalysisResult<()> {
        let found = self.infer_expression(condition)?;
        self.check_assignable(&found, &TypeLabel::builtin(BuiltinType::Bool), condition.span())
    }

    /// if文の解析
    pub fn analyze_if_statement(&mut self, if_stmt: &IfStatement) -> AnalysisResult<()> {
        self.check_condition(&if_stmt.condition)?;
        self.analyze_block(&if_stmt.then_branch)?;
        if let Some(else_branch) = &if_stmt.else_branch {
            self.analyze_block(else_branch)?;
        }
        Ok(())
    }

    /// while文の解析
    pub fn analyze_while_statement(&mut self, while_stmt: &WhileStatement) -> AnalysisResult<()> {
        self.check_condition(&while_stmt.condition)?;
        self.analyze_block(&while_stmt.body)
    }

    /// for文の解析。ループ変数は本体を囲むスコープに置く
    pub fn analyze_for_statement(&mut self, for_stmt: &ForStatement) -> AnalysisResult<()> {
        let iterable = self.infer_expression(&for_stmt.iterable)?;
        let types = &self.session.types;
        if !iterable.is_any() && !types.is_iterable(self.manager.arena(), &iterable) {
            return Err(AnalyzerError::TypeMismatch {
                expected: "iterable".to_string(),
                found: types.display(&iterable),
                span: for_stmt.iterable.span(),
            });
        }

        self.with_scope(for_stmt.span, |analyzer| {
            let mut variable = VariableSymbol::new(ParameterKind::Positional);
            variable.parameter.value_type = Some(iterable.element_type());
            let raw = analyzer.session.next_raw(SymbolKind::Variable);
            let symbol = Symbol::new(
                &for_stmt.variable,
                raw,
                for_stmt.span,
                SymbolData::Variable(variable),
            );
            analyzer.declare(symbol)?;
            analyzer.analyze_block(&for_stmt.body)
        })
    }
}
