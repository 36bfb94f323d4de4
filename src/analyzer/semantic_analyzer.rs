//! セマンティック解析器のメイン実装

use std::path::PathBuf;

use crate::ast::*;
use crate::error::{AnalysisResult, AnalyzerError};
use crate::module::CompiledUnit;
use crate::session::Session;
use crate::symbol::{SymbolId, SymbolKind};
use crate::table::SymbolTableManager;

// サブモジュール
mod declarations;
mod expressions;
mod imports;
mod scope;
mod statements;

/// セマンティック解析器
///
/// 1つのコンパイル単位を解析します。importされたファイルは、同じセッションを
/// 借りた別の解析器で再帰的に解析されます。
pub struct SemanticAnalyzer<'s> {
    /// コンパイルセッション
    pub session: &'s mut Session,
    /// 解析中のファイルの解決済みパス
    pub path: Option<PathBuf>,
    /// シンボルテーブル
    pub manager: SymbolTableManager,
    /// 現在解析中のクラス（メンバーの可視性判定に使う）
    pub current_class: Option<SymbolId>,
    /// 現在解析中の関数（return文のチェック用）
    pub current_function: Option<SymbolId>,
    /// この単位が登録したカスタム型
    pub registered_types: Vec<String>,
    /// 収集されたエラー
    pub errors: Vec<AnalyzerError>,
    /// 収集された警告
    pub warnings: Vec<AnalyzerError>,
}

impl<'s> SemanticAnalyzer<'s> {
    pub fn new(session: &'s mut Session, path: Option<PathBuf>) -> Self {
        Self {
            session,
            path,
            manager: SymbolTableManager::new(),
            current_class: None,
            current_function: None,
            registered_types: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// モジュールを解析する
    ///
    /// 解析中はこのファイルを「解析中」としてレジストリに記録し、
    /// 自分自身への循環importを検出できるようにする。
    pub fn analyze(&mut self, module: &Module) -> AnalysisResult<()> {
        if let Some(path) = self.path.clone() {
            self.session.modules.begin(&path, module.span)?;
        }
        let result = self.run(module);
        if let Some(path) = &self.path {
            self.session.modules.end(path);
        }
        result
    }

    pub(crate) fn run(&mut self, module: &Module) -> AnalysisResult<()> {
        log::debug!("モジュールを解析: {}", module.name);

        // インポートを処理
        for import in &module.imports {
            if let Err(e) = self.process_import(import) {
                self.errors.push(e);
            }
        }

        // 第一パス: クラスの外形、関数シグネチャ、グローバル変数を収集
        let mut classes = Vec::new();
        let mut bodies = Vec::new();
        let mut globals = Vec::new();
        for item in &module.items {
            match item {
                Item::Class(class) => match self.collect_class_shell(class) {
                    Ok(id) => classes.push((id, class)),
                    Err(e) => self.errors.push(e),
                },
                Item::Function(func) => match self.collect_function_signature(func) {
                    Ok(id) => bodies.push((id, func)),
                    Err(e) => self.errors.push(e),
                },
                Item::Variable(var) => match self.collect_global(var) {
                    Ok(id) => globals.push((id, var)),
                    Err(e) => self.errors.push(e),
                },
            }
        }

        // 第二パス: 基底クラス、メンバー、コンストラクタを登録してクラスを確定
        for (id, class) in &classes {
            bodies.extend(self.collect_class_body(*id, class));
        }

        // 第三パス: 初期化式と関数本体を解析
        for (id, var) in globals {
            if let Err(e) = self.analyze_global_initializer(id, var) {
                self.errors.push(e);
            }
        }
        for (id, func) in bodies {
            if let Err(e) = self.analyze_function(id, func) {
                self.errors.push(e);
            }
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors[0].clone())
        }
    }

    /// 収集された警告
    pub fn warnings(&self) -> &[AnalyzerError] {
        &self.warnings
    }

    /// 解析結果をコンパイル単位としてまとめる
    pub fn into_unit(mut self, name: impl Into<String>) -> CompiledUnit {
        let module_raw = self.session.next_raw(SymbolKind::Class);
        CompiledUnit {
            path: self.path.unwrap_or_default(),
            name: name.into(),
            manager: self.manager,
            custom_types: self.registered_types,
            module_raw,
            warnings: self.warnings,
        }
    }
}
