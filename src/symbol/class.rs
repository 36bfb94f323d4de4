//! クラスシンボルと継承・可視性の操作
//!
//! 継承の辺（基底→派生）はハンドルで両方向に保持されます。循環は辺を
//! 追加する時点で拒否され、収集完了後のクラスは構造的に変更できません。

use crate::ast::Span;
use crate::error::{AnalysisResult, AnalyzerError};
use crate::table::{DuplicateKey, EntryOrigin, SymbolTable};
use std::collections::HashSet;

use super::function::FunctionSymbol;
use super::label::{Lifecycle, Permission};
use super::label_mark::LabelMarkManager;
use super::parameter::VariableSymbol;
use super::type_label::{TypeLabel, TypeRegistry};
use super::{SymbolArena, SymbolData, SymbolId};

/// クラスシンボル
#[derive(Debug, Clone)]
pub struct ClassSymbol {
    bases: Vec<SymbolId>,
    derived: Vec<SymbolId>,
    members: SymbolTable,
    static_members: SymbolTable,
    constructors: SymbolTable,
    /// 可視性ラベルのないメンバーに適用される可視性
    pub default_permission: Permission,
    collection_finished: bool,
    pub labels: LabelMarkManager,
    type_id: Option<String>,
    is_module: bool,
}

impl Default for ClassSymbol {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassSymbol {
    pub fn new() -> Self {
        Self {
            bases: Vec::new(),
            derived: Vec::new(),
            members: SymbolTable::new(),
            static_members: SymbolTable::new(),
            constructors: SymbolTable::new(),
            default_permission: Permission::Public,
            collection_finished: false,
            labels: LabelMarkManager::new(),
            type_id: None,
            is_module: false,
        }
    }

    /// importされたモジュールを表す合成クラス
    pub fn module() -> Self {
        Self {
            is_module: true,
            ..Self::new()
        }
    }

    pub fn bases(&self) -> &[SymbolId] {
        &self.bases
    }

    pub fn derived(&self) -> &[SymbolId] {
        &self.derived
    }

    pub fn members(&self) -> &SymbolTable {
        &self.members
    }

    pub fn static_members(&self) -> &SymbolTable {
        &self.static_members
    }

    pub fn constructors(&self) -> &SymbolTable {
        &self.constructors
    }

    pub fn is_collection_finished(&self) -> bool {
        self.collection_finished
    }

    pub fn is_module(&self) -> bool {
        self.is_module
    }

    pub fn type_id(&self) -> Option<&str> {
        self.type_id.as_deref()
    }

    pub fn set_type_id(&mut self, id: impl Into<String>) {
        self.type_id = Some(id.into());
    }

    /// このクラスのインスタンスの型
    pub fn instance_type(&self) -> Option<TypeLabel> {
        self.type_id.as_deref().map(TypeLabel::custom)
    }

    pub(super) fn remap(&mut self, map: &impl Fn(SymbolId) -> SymbolId) {
        self.bases.iter_mut().for_each(|id| *id = map(*id));
        self.derived.iter_mut().for_each(|id| *id = map(*id));
        self.members.remap(map);
        self.static_members.remap(map);
        self.constructors.remap(map);
    }
}

impl SymbolArena {
    fn class(&self, id: SymbolId, span: Span) -> AnalysisResult<&ClassSymbol> {
        self.payload::<ClassSymbol>(id)
            .ok_or_else(|| AnalyzerError::InvalidOperation {
                message: format!("{} はクラスではありません", self.get(id).value()),
                span,
            })
    }

    fn class_mut(&mut self, id: SymbolId) -> Option<&mut ClassSymbol> {
        self.payload_mut::<ClassSymbol>(id)
    }

    fn ensure_unfinished(&self, id: SymbolId, span: Span) -> AnalysisResult<()> {
        if self.class(id, span)?.collection_finished {
            return Err(AnalyzerError::ClassFinalized {
                class: self.get(id).value().to_string(),
                span,
            });
        }
        Ok(())
    }

    fn duplicate_error(&self, name: &str, duplicate: DuplicateKey, span: Span) -> AnalyzerError {
        AnalyzerError::DuplicateDeclaration {
            name: name.to_string(),
            span,
            previous: self.get(duplicate.existing).span(),
        }
    }

    /// 基底クラスを追加し、基底側に派生の逆辺を登録する
    ///
    /// `base` が既に `class` の子孫なら循環になるため、辺を追加する前に拒否する。
    pub fn add_base_class(
        &mut self,
        class: SymbolId,
        base: SymbolId,
        span: Span,
    ) -> AnalysisResult<()> {
        self.ensure_unfinished(class, span)?;
        self.class(base, span)?;

        if self.class(class, span)?.bases.contains(&base) {
            return Err(self.duplicate_error(
                self.get(base).value(),
                DuplicateKey { existing: base },
                span,
            ));
        }
        if base == class || self.is_super_class_of(class, base, false) {
            return Err(AnalyzerError::CyclicInheritance {
                class: self.get(class).value().to_string(),
                base: self.get(base).value().to_string(),
                span,
            });
        }

        if let Some(this) = self.class_mut(class) {
            this.bases.push(base);
        }
        if let Some(parent) = self.class_mut(base) {
            parent.derived.push(class);
        }
        log::debug!(
            "継承を追加: {} -> {}",
            self.get(class).value(),
            self.get(base).value()
        );
        Ok(())
    }

    /// `other` が `this` を（`restrict` なら直接）継承しているかどうか
    pub fn is_super_class_of(&self, this: SymbolId, other: SymbolId, restrict: bool) -> bool {
        let Some(class) = self.payload::<ClassSymbol>(this) else {
            return false;
        };
        if restrict {
            return class.derived.contains(&other);
        }

        let mut visited = HashSet::new();
        let mut stack: Vec<SymbolId> = class.derived.clone();
        while let Some(current) = stack.pop() {
            if current == other {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(derived) = self.payload::<ClassSymbol>(current) {
                stack.extend(derived.derived.iter().copied());
            }
        }
        false
    }

    /// メンバーを追加する。staticラベルがあれば静的メンバーテーブルに入る
    ///
    /// 名前の重複は静的・インスタンスの両方のテーブルで検査する。
    pub fn add_member(
        &mut self,
        class: SymbolId,
        member: SymbolId,
        system_defined: bool,
        span: Span,
    ) -> AnalysisResult<()> {
        self.ensure_unfinished(class, span)?;
        let is_static = self
            .get(member)
            .labels()
            .map(LabelMarkManager::is_static_marked)
            .unwrap_or(false);
        let name = self.get(member).value().to_string();
        let origin = EntryOrigin::from_system_defined(system_defined);

        let this = self.class(class, span)?;
        let checked = this
            .members
            .can_insert(&name)
            .and_then(|()| this.static_members.can_insert(&name));
        if let Err(duplicate) = checked {
            return Err(self.duplicate_error(&name, duplicate, span));
        }

        if let Some(this) = self.class_mut(class) {
            let table = if is_static {
                &mut this.static_members
            } else {
                &mut this.members
            };
            if let Err(duplicate) = table.insert(name.clone(), member, origin) {
                return Err(self.duplicate_error(&name, duplicate, span));
            }
        }

        match self.get_mut(member).data_mut() {
            SymbolData::Variable(VariableSymbol { owner, .. })
            | SymbolData::Function(FunctionSymbol { owner, .. }) => *owner = Some(class),
            _ => {}
        }
        Ok(())
    }

    /// コンストラクタを追加する。オーバーロードはrawValueで区別される
    pub fn add_constructor(
        &mut self,
        class: SymbolId,
        constructor: SymbolId,
        span: Span,
    ) -> AnalysisResult<()> {
        self.ensure_unfinished(class, span)?;
        let raw = self.get(constructor).raw_value().to_string();
        if let Some(this) = self.class_mut(class) {
            if let Err(duplicate) = this.constructors.insert(raw.clone(), constructor, EntryOrigin::User) {
                return Err(self.duplicate_error(&raw, duplicate, span));
            }
        }
        if let Some(function) = self.payload_mut::<FunctionSymbol>(constructor) {
            function.owner = Some(class);
        }
        Ok(())
    }

    /// 収集を完了する。以後メンバーと基底クラスは追加できない
    pub fn set_collection_finished(&mut self, class: SymbolId) {
        if let Some(this) = self.class_mut(class) {
            this.collection_finished = true;
        }
        log::debug!("クラスの収集を完了: {}", self.get(class).value());
    }

    /// メンバーを探す
    ///
    /// インスタンスメンバー、静的メンバー、各基底クラス（宣言順、深さ優先）の
    /// 順に探し、最初に見つかったものを返す。ダイヤモンド継承の曖昧さは解決しない。
    pub fn find_member_symbol(&self, class: SymbolId, name: &str) -> Option<SymbolId> {
        self.find_member_with_owner(class, name)
            .map(|(member, _)| member)
    }

    /// メンバーと、それを宣言しているクラスを探す
    pub fn find_member_with_owner(
        &self,
        class: SymbolId,
        name: &str,
    ) -> Option<(SymbolId, SymbolId)> {
        let this = self.payload::<ClassSymbol>(class)?;
        if let Some(member) = this.members.find(name) {
            return Some((member, class));
        }
        if let Some(member) = this.static_members.find(name) {
            return Some((member, class));
        }
        this.bases
            .iter()
            .find_map(|base| self.find_member_with_owner(*base, name))
    }

    /// メンバーに適用される可視性
    pub fn member_permission(&self, owner: SymbolId, member: SymbolId) -> Permission {
        self.get(member)
            .labels()
            .and_then(LabelMarkManager::permission)
            .or_else(|| {
                self.payload::<ClassSymbol>(owner)
                    .map(|class| class.default_permission)
            })
            .unwrap_or(Permission::Public)
    }

    /// `accessor` クラスの内部（Noneならクラス外）から見えるメンバーを探す
    ///
    /// 見つかったメンバーとそのライフサイクルラベルを返し、静的アクセスと
    /// インスタンスアクセスを呼び出し側で区別できるようにする。
    pub fn find_member_symbol_in_permission(
        &self,
        class: SymbolId,
        name: &str,
        accessor: Option<SymbolId>,
    ) -> Option<(SymbolId, Lifecycle)> {
        let (member, owner) = self.find_member_with_owner(class, name)?;
        let allowed = match self.member_permission(owner, member) {
            Permission::Public => true,
            Permission::Private => accessor == Some(owner),
            Permission::Protected => accessor
                .map(|accessor| accessor == owner || self.is_super_class_of(owner, accessor, false))
                .unwrap_or(false),
        };
        if !allowed {
            return None;
        }
        let lifecycle = self
            .get(member)
            .labels()
            .map(LabelMarkManager::lifecycle)
            .unwrap_or_default();
        Some((member, lifecycle))
    }

    /// 引数を受け付ける最初のコンストラクタを選ぶ
    ///
    /// コンストラクタがないクラスは引数なしでのみ生成できる。
    pub fn find_constructor(
        &self,
        registry: &TypeRegistry,
        class: SymbolId,
        args: &[TypeLabel],
        span: Span,
    ) -> AnalysisResult<Option<SymbolId>> {
        let this = self.class(class, span)?;
        if this.constructors.is_empty() {
            if args.is_empty() {
                return Ok(None);
            }
            return Err(AnalyzerError::ArgumentCountMismatch {
                expected: "0".to_string(),
                found: args.len(),
                span,
            });
        }

        let mut first_error = None;
        for constructor in this.constructors.symbols() {
            match self.check_call(registry, constructor, args, span) {
                Ok(()) => return Ok(Some(constructor)),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}
