//! 解析パイプライン
//!
//! モジュールファイルの読み込みからセマンティック解析、診断の出力までを
//! まとめて扱い、複数のエラーと警告を蓄積しながら処理を進めます。

use crate::analyzer::SemanticAnalyzer;
use crate::ast::Module;
use crate::error::{ErrorCollector, YuniError, YuniResult};
use crate::session::Session;
use crate::table::{ScopeDump, SymbolTableManager};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use std::fs;
use std::path::{Path, PathBuf};

/// 解析対象のファイルと診断の状態
pub struct CompilationState {
    pub source_file: PathBuf,
    pub module: Module,
    pub files: SimpleFiles<String, String>,
    pub file_id: usize,
    pub error_collector: ErrorCollector,
}

impl CompilationState {
    /// JSON形式の構文木ファイルから状態を作成
    pub fn new<P: AsRef<Path>>(source_file: P) -> YuniResult<Self> {
        let path = source_file.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| YuniError::Io(format!("ファイルを読み込めません: {}", e)))?;
        let module: Module = serde_json::from_str(&text).map_err(|e| YuniError::Module {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let source_file = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self::from_module(source_file, module))
    }

    /// 構文木から状態を作成（テスト用）
    pub fn from_module(source_file: impl Into<PathBuf>, module: Module) -> Self {
        let source_file = source_file.into();
        let mut files = SimpleFiles::new();
        let file_id = files.add(
            source_file.display().to_string(),
            module.source.clone().unwrap_or_default(),
        );
        Self {
            source_file,
            module,
            files,
            file_id,
            error_collector: ErrorCollector::new(),
        }
    }

    /// エラーを追加
    pub fn add_error(&mut self, error: YuniError) {
        self.error_collector.add_error(error, self.file_id);
    }

    /// 警告を追加
    pub fn add_warning(&mut self, error: YuniError) {
        self.error_collector.add_warning(error, self.file_id);
    }

    /// 診断情報を報告
    pub fn report_diagnostics(&self) -> YuniResult<()> {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = codespan_reporting::term::Config::default();

        let diagnostics = self
            .error_collector
            .errors()
            .iter()
            .chain(self.error_collector.warnings());
        for error in diagnostics {
            let diagnostic = error.to_diagnostic();
            codespan_reporting::term::emit(&mut writer.lock(), &config, &self.files, &diagnostic)
                .map_err(|e| YuniError::Io(format!("診断を出力できません: {}", e)))?;
        }
        Ok(())
    }

    pub fn has_errors(&self) -> bool {
        self.error_collector.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.error_collector.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.error_collector.warning_count()
    }
}

/// 解析パイプライン
pub struct AnalysisPipeline {
    state: CompilationState,
    session: Session,
    manager: Option<SymbolTableManager>,
}

impl AnalysisPipeline {
    pub fn new(state: CompilationState, session: Session) -> Self {
        Self {
            state,
            session,
            manager: None,
        }
    }

    /// セマンティック解析を実行し、エラーと警告を収集する
    pub fn analyze(&mut self) -> bool {
        log::info!("解析を開始: {}", self.state.source_file.display());
        let mut analyzer =
            SemanticAnalyzer::new(&mut self.session, Some(self.state.source_file.clone()));
        let result = analyzer.analyze(&self.state.module);

        let mut errors = std::mem::take(&mut analyzer.errors);
        if let Err(e) = result {
            if errors.is_empty() {
                errors.push(e);
            }
        }
        let warnings = std::mem::take(&mut analyzer.warnings);
        self.manager = Some(analyzer.manager);

        for error in errors {
            self.state.add_error(error.into());
        }
        for warning in warnings {
            self.state.add_warning(warning.into());
        }
        !self.state.has_errors()
    }

    /// エラーレポートを出力
    pub fn report_errors(&self) -> YuniResult<()> {
        self.state.report_diagnostics()?;
        if self.state.has_errors() {
            eprintln!(
                "\n解析エラー: {} 個のエラーが見つかりました",
                self.state.error_count()
            );
        }
        Ok(())
    }

    /// 解析済みのスコープのダンプ
    pub fn dump(&self) -> Vec<ScopeDump> {
        self.manager
            .as_ref()
            .map(|manager| ScopeDump::all(manager, &self.session.types))
            .unwrap_or_default()
    }

    pub fn state(&self) -> &CompilationState {
        &self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn manager(&self) -> Option<&SymbolTableManager> {
        self.manager.as_ref()
    }
}
