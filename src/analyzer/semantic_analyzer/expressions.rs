//! 式の解析と型推論

use crate::ast::*;
use crate::error::{AnalysisResult, AnalyzerError};
use crate::symbol::{
    BuiltinType, ClassSymbol, FunctionSymbol, Lifecycle, SymbolId, TypeBase, TypeLabel,
};
use super::SemanticAnalyzer;

impl SemanticAnalyzer<'_> {
    /// 式の型を推論する
    pub fn infer_expression(&self, expr: &Expression) -> AnalysisResult<TypeLabel> {
        match expr {
            Expression::Integer(_) => Ok(TypeLabel::builtin(BuiltinType::Int)),
            Expression::Float(_) => Ok(TypeLabel::builtin(BuiltinType::Float)),
            Expression::String(_) => Ok(TypeLabel::builtin(BuiltinType::Str)),
            Expression::Char(_) => Ok(TypeLabel::builtin(BuiltinType::Char)),
            Expression::Boolean(_) => Ok(TypeLabel::builtin(BuiltinType::Bool)),
            Expression::Null(_) => Ok(TypeLabel::builtin(BuiltinType::Null)),
            Expression::Identifier(ident) => {
                let id = self.lookup(&ident.name, ident.span)?;
                Ok(self.symbol_type(id))
            }
            Expression::This(this) => self.infer_this(this),
            Expression::Member(member) => Ok(self
                .resolve_member(member)?
                .map(|id| self.symbol_type(id))
                .unwrap_or_else(TypeLabel::any)),
            Expression::Call(call) => self.infer_call(call),
            Expression::List(list) => {
                let element = self.common_type(&list.elements)?;
                Ok(TypeLabel::list_of(element))
            }
            Expression::Dict(dict) => {
                let keys: Vec<&Expression> = dict.entries.iter().map(|entry| &entry.key).collect();
                let values: Vec<&Expression> = dict.entries.iter().map(|entry| &entry.value).collect();
                let key = self.common_type(keys)?;
                let value = self.common_type(values)?;
                Ok(TypeLabel::dict_of(key, value))
            }
        }
    }

    fn infer_this(&self, this: &ThisExpr) -> AnalysisResult<TypeLabel> {
        if self.current_class.is_none() {
            return Err(AnalyzerError::InvalidOperation {
                message: "クラスの外でthisは使えません".to_string(),
                span: this.span,
            });
        }
        let id = self.lookup("this", this.span)?;
        Ok(self.symbol_type(id))
    }

    /// 要素がすべて同じ型ならその型、空か混在していればany
    fn common_type<'e>(
        &self,
        elements: impl IntoIterator<Item = &'e Expression>,
    ) -> AnalysisResult<TypeLabel> {
        let mut common: Option<TypeLabel> = None;
        for element in elements {
            let ty = self.infer_expression(element)?;
            match &common {
                None => common = Some(ty),
                Some(existing) if *existing == ty => {}
                Some(_) => return Ok(TypeLabel::any()),
            }
        }
        Ok(common.unwrap_or_else(TypeLabel::any))
    }

    /// クラス名（または `module.Class`）として書かれた式をクラスに解決する
    pub fn resolve_class_expr(&self, expr: &Expression) -> Option<SymbolId> {
        let arena = self.manager.arena();
        match expr {
            Expression::Identifier(ident) => self
                .manager
                .find_by_name(&ident.name, None)
                .map(|(id, _)| id)
                .filter(|id| arena.payload::<ClassSymbol>(*id).is_some()),
            Expression::Member(member) => {
                let owner = self.resolve_class_expr(&member.object)?;
                arena
                    .find_member_symbol(owner, &member.member)
                    .filter(|id| arena.payload::<ClassSymbol>(*id).is_some())
            }
            _ => None,
        }
    }

    /// メンバーアクセスを解決する
    ///
    /// クラス名を通したアクセスは静的メンバーだけを許す。オブジェクトの型が
    /// anyの場合は解決できないのでNoneを返す。
    pub fn resolve_member(&self, member: &MemberExpr) -> AnalysisResult<Option<SymbolId>> {
        if let Some(class) = self.resolve_class_expr(&member.object) {
            let (id, lifecycle) = self.find_accessible_member(class, member)?;
            if !lifecycle.contains(Lifecycle::STATIC) {
                return Err(AnalyzerError::InvalidOperation {
                    message: format!(
                        "{} は静的メンバーではないため、クラス {} からはアクセスできません",
                        member.member,
                        self.manager.symbol(class).value()
                    ),
                    span: member.span,
                });
            }
            return Ok(Some(id));
        }

        let object = self.infer_expression(&member.object)?;
        match &object.base {
            TypeBase::Builtin(BuiltinType::Any) => Ok(None),
            TypeBase::Custom(type_id) => {
                let class = self
                    .session
                    .types
                    .class_of(self.manager.arena(), type_id)
                    .ok_or_else(|| AnalyzerError::UndefinedReference {
                        name: self.session.types.display(&object),
                        span: member.span,
                    })?;
                let (id, _) = self.find_accessible_member(class, member)?;
                Ok(Some(id))
            }
            TypeBase::Builtin(_) => Err(AnalyzerError::InvalidOperation {
                message: format!(
                    "{} 型の値にはメンバー {} がありません",
                    self.session.types.display(&object),
                    member.member
                ),
                span: member.span,
            }),
        }
    }

    fn find_accessible_member(
        &self,
        class: SymbolId,
        member: &MemberExpr,
    ) -> AnalysisResult<(SymbolId, Lifecycle)> {
        let arena = self.manager.arena();
        if let Some(found) =
            arena.find_member_symbol_in_permission(class, &member.member, self.current_class)
        {
            return Ok(found);
        }

        let class_name = arena.get(class).value().to_string();
        match arena.find_member_with_owner(class, &member.member) {
            Some((id, owner)) => Err(AnalyzerError::InaccessibleMember {
                class: class_name,
                member: member.member.clone(),
                permission: arena.member_permission(owner, id).to_string(),
                span: member.span,
            }),
            None => Err(AnalyzerError::UndefinedMember {
                class: class_name,
                member: member.member.clone(),
                span: member.span,
            }),
        }
    }

    /// 呼び出し式の型
    ///
    /// クラスの呼び出しはコンストラクタを選んでインスタンスの型を返す。
    fn infer_call(&self, call: &CallExpr) -> AnalysisResult<TypeLabel> {
        let args = call
            .args
            .iter()
            .map(|arg| self.infer_expression(arg))
            .collect::<AnalysisResult<Vec<_>>>()?;
        let arena = self.manager.arena();
        let types = &self.session.types;

        if let Some(class) = self.resolve_class_expr(&call.callee) {
            let payload = arena.payload::<ClassSymbol>(class);
            if let Some(instance) = payload.and_then(ClassSymbol::instance_type) {
                arena.find_constructor(types, class, &args, call.span)?;
                return Ok(instance);
            }
        }

        let callee = match call.callee.as_ref() {
            Expression::Identifier(ident) => Some(self.lookup(&ident.name, ident.span)?),
            Expression::Member(member) => self.resolve_member(member)?,
            _ => None,
        };
        if let Some(callee) = callee.map(|id| arena.resolve_alias(id)) {
            if let Some(function) = arena.payload::<FunctionSymbol>(callee) {
                arena.check_call(types, callee, &args, call.span)?;
                return Ok(function.result_type());
            }
        }

        let callee_type = match callee {
            Some(id) => self.symbol_type(id),
            None => self.infer_expression(&call.callee)?,
        };
        match &callee_type.base {
            TypeBase::Builtin(BuiltinType::Any) | TypeBase::Builtin(BuiltinType::Func) => {
                Ok(TypeLabel::any())
            }
            TypeBase::Builtin(BuiltinType::Funi) => Ok(callee_type
                .descriptors
                .get(1)
                .and_then(|group| group.first().cloned())
                .unwrap_or_else(TypeLabel::any)),
            _ => Err(AnalyzerError::InvalidOperation {
                message: format!("{} 型の値は呼び出せません", types.display(&callee_type)),
                span: call.span,
            }),
        }
    }

    /// 引数のデフォルト値などに使う式の短い表記
    pub fn describe_expression(expr: &Expression) -> String {
        match expr {
            Expression::Integer(lit) => lit.value.to_string(),
            Expression::Float(lit) => lit.value.to_string(),
            Expression::String(lit) => format!("{:?}", lit.value),
            Expression::Char(lit) => format!("{:?}", lit.value),
            Expression::Boolean(lit) => lit.value.to_string(),
            Expression::Null(_) => "null".to_string(),
            Expression::Identifier(ident) => ident.name.clone(),
            Expression::This(_) => "this".to_string(),
            Expression::Member(member) => {
                format!("{}.{}", Self::describe_expression(&member.object), member.member)
            }
            other => format!("<{}>", other.kind()),
        }
    }
}
