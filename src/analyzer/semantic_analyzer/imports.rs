//! importの解決
//!
//! importされたファイルは別の解析器で解析され、そのグローバルシンボルを
//! 静的メンバーとして持つ合成モジュールクラスとして、importした側の
//! スコープに登録されます。

use std::path::Path;
use std::rc::Rc;

use crate::ast::*;
use crate::error::{AnalysisResult, AnalyzerError};
use crate::module::CompiledUnit;
use crate::symbol::{
    ClassSymbol, Label, Lifecycle, Permission, Symbol, SymbolData, SymbolId, SymbolKind,
};
use crate::table::EntryOrigin;
use super::SemanticAnalyzer;

impl SemanticAnalyzer<'_> {
    /// import文を処理する
    pub fn process_import(&mut self, import: &Import) -> AnalysisResult<()> {
        let path = self
            .session
            .loader()
            .resolve(&import.path, self.path.as_deref())
            .map_err(|e| Self::import_failed(import, e.to_string()))?;

        let unit = match self.session.modules.get(&path) {
            Some(unit) => {
                log::debug!("解析済みのモジュールを再利用: {}", path.display());
                unit
            }
            None => {
                self.session.modules.begin(&path, import.span)?;
                let result = self.compile_import(&path, import);
                self.session.modules.end(&path);
                self.session.modules.finish(result?)
            }
        };
        self.bind_module(&unit, import)
    }

    fn import_failed(import: &Import, message: String) -> AnalyzerError {
        AnalyzerError::ImportFailed {
            path: import.path.clone(),
            message,
            span: import.span,
        }
    }

    /// importされたファイルを独立したコンパイル単位として解析する
    fn compile_import(&mut self, path: &Path, import: &Import) -> AnalysisResult<CompiledUnit> {
        let module = self
            .session
            .loader()
            .load(path)
            .map_err(|e| Self::import_failed(import, e.to_string()))?;

        let mut analyzer = SemanticAnalyzer::new(&mut *self.session, Some(path.to_path_buf()));
        match analyzer.run(&module) {
            Ok(()) => Ok(analyzer.into_unit(&module.name)),
            Err(error) => {
                // 失敗した単位が登録したカスタム型は残さない
                let registered = std::mem::take(&mut analyzer.registered_types);
                drop(analyzer);
                for id in &registered {
                    self.session.types.remove_custom_type(id);
                }
                Err(match error {
                    AnalyzerError::RecursiveImport { chain, .. } => AnalyzerError::RecursiveImport {
                        chain,
                        span: import.span,
                    },
                    other => Self::import_failed(import, other.to_string()),
                })
            }
        }
    }

    /// モジュールクラスを現在のスコープに束縛する
    fn bind_module(&mut self, unit: &Rc<CompiledUnit>, import: &Import) -> AnalysisResult<()> {
        let name = import.alias.clone().unwrap_or_else(|| {
            unit.path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| unit.name.clone())
        });

        let level = self.manager.current_level();
        let original = self.manager.arena().by_raw(&unit.module_raw);
        if let (Some(original), Some((bound, _))) =
            (original, self.manager.find_by_name(&name, Some(level)))
        {
            if self.is_same_module(bound, original) {
                return Ok(());
            }
        }

        let class = match original {
            // 同じスコープに同じ名前で既に取り込まれている
            Some(existing)
                if self.manager.symbol(existing).value() == name
                    && self.manager.symbol(existing).scope_level() == level =>
            {
                existing
            }
            // 別名や別のスコープでは元のシンボルを動かさずに複製する
            Some(existing) => {
                let raw = self.session.next_raw(SymbolKind::Class);
                let copy = self.manager.symbol(existing).transform(&name, raw, level);
                self.manager.arena_mut().alloc(copy)
            }
            None => self.build_module_class(unit, &name, import.span)?,
        };

        self.manager.bind(class, false).map_err(|e| match e {
            AnalyzerError::DuplicateDeclaration { name, previous, .. } => {
                AnalyzerError::DuplicateDeclaration {
                    name,
                    span: import.span,
                    previous,
                }
            }
            other => other,
        })?;
        log::info!("モジュール {} を {} としてimport", unit.path.display(), name);
        Ok(())
    }

    /// `bound` が `original` 自身か、その複製のモジュールクラスか
    fn is_same_module(&self, bound: SymbolId, original: SymbolId) -> bool {
        if bound == original {
            return true;
        }
        let arena = self.manager.arena();
        match (
            arena.payload::<ClassSymbol>(bound),
            arena.payload::<ClassSymbol>(original),
        ) {
            (Some(a), Some(b)) if a.is_module() && b.is_module() => a
                .static_members()
                .symbols()
                .eq(b.static_members().symbols()),
            _ => false,
        }
    }

    /// importされた単位のシンボルを取り込み、モジュールクラスを作る
    ///
    /// グローバルシンボルはpublicかつstaticとしてマークし直し、
    /// importした側のスコープレベルに付け替える。
    fn build_module_class(
        &mut self,
        unit: &CompiledUnit,
        name: &str,
        span: Span,
    ) -> AnalysisResult<SymbolId> {
        let level = self.manager.current_level();
        let arena = self.manager.arena_mut();
        let map = arena.absorb(unit.manager.arena());

        let symbol = Symbol::new(
            name,
            &unit.module_raw,
            span,
            SymbolData::Class(ClassSymbol::module()),
        );
        let class = arena.alloc(symbol);

        for (_, entry) in unit.manager.scope_entries(0) {
            let member = map(entry.symbol);
            let symbol = arena.get_mut(member);
            if let Some(labels) = symbol.labels_mut() {
                labels.mark_label(&Label::Permission(Permission::Public), true);
                labels.mark_label(&Label::Lifecycle(Lifecycle::STATIC), false);
            }
            symbol.set_scope_level(level);
            arena.add_member(class, member, entry.origin == EntryOrigin::System, span)?;
        }
        arena.set_collection_finished(class);
        Ok(class)
    }
}
