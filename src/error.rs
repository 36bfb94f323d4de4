//! 統一的なエラーハンドリングモジュール
//!
//! シンボル・型コアが返すエラー型と、codespan-reportingによる
//! 診断メッセージへの変換を提供します。

use crate::ast::Span;
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// Yuniシンボルコアの統一エラー型
#[derive(Error, Debug, Clone)]
pub enum YuniError {
    /// セマンティック解析エラー
    #[error("意味解析エラー: {0}")]
    Analyzer(#[from] AnalyzerError),

    /// モジュールの読み込み・形式エラー
    #[error("モジュール {path} を読み込めません: {message}")]
    Module { path: String, message: String },

    /// ファイルI/Oエラー
    #[error("ファイル操作エラー: {0}")]
    Io(String),

    /// その他のエラー
    #[error("{0}")]
    Other(String),
}

/// セマンティック解析エラーの詳細
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("未定義の名前: {name}")]
    UndefinedReference { name: String, span: Span },

    #[error("クラス {class} にメンバー {member} がありません")]
    UndefinedMember {
        class: String,
        member: String,
        span: Span,
    },

    #[error("{permission} メンバー {class}.{member} にはこの位置からアクセスできません")]
    InaccessibleMember {
        class: String,
        member: String,
        permission: String,
        span: Span,
    },

    #[error("{name} は既にこのスコープで定義されています")]
    DuplicateDeclaration {
        name: String,
        span: Span,
        previous: Span,
    },

    #[error("{name} は外側のスコープ (レベル {outer_level}) の定義を隠しています")]
    ShadowedDeclaration {
        name: String,
        outer_level: usize,
        span: Span,
    },

    #[error("循環継承: {base} は既に {class} から派生しています")]
    CyclicInheritance {
        class: String,
        base: String,
        span: Span,
    },

    #[error("クラス {class} の収集は完了しており、これ以上変更できません")]
    ClassFinalized { class: String, span: Span },

    #[error("型の不一致: {expected}を期待しましたが、{found}が見つかりました")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("関連のない型: {found} は {expected} として使用できません")]
    UnrelatedTypes {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("グローバルスコープから抜けることはできません")]
    ScopeUnderflow { span: Span },

    #[error("循環import: {}", .chain.join(" -> "))]
    RecursiveImport { chain: Vec<String>, span: Span },

    #[error("モジュール {path} のimportに失敗しました: {message}")]
    ImportFailed {
        path: String,
        message: String,
        span: Span,
    },

    #[error("型 {name} (id: {id}) は既に登録されています")]
    DuplicateType { id: String, name: String, span: Span },

    #[error("関数 {name} にreturn文がありません ({expected} を返す必要があります)")]
    MissingReturn {
        name: String,
        expected: String,
        span: Span,
    },

    #[error("const変数 {name} を変更することはできません")]
    ConstAssignment { name: String, span: Span },

    #[error("引数の数が一致しません: {expected}個を期待しましたが、{found}個が見つかりました")]
    ArgumentCountMismatch {
        expected: String,
        found: usize,
        span: Span,
    },

    #[error("不正な操作: {message}")]
    InvalidOperation { message: String, span: Span },
}

impl AnalyzerError {
    /// エラーのソース位置
    pub fn span(&self) -> Span {
        match self {
            AnalyzerError::UndefinedReference { span, .. }
            | AnalyzerError::UndefinedMember { span, .. }
            | AnalyzerError::InaccessibleMember { span, .. }
            | AnalyzerError::DuplicateDeclaration { span, .. }
            | AnalyzerError::ShadowedDeclaration { span, .. }
            | AnalyzerError::CyclicInheritance { span, .. }
            | AnalyzerError::ClassFinalized { span, .. }
            | AnalyzerError::TypeMismatch { span, .. }
            | AnalyzerError::UnrelatedTypes { span, .. }
            | AnalyzerError::ScopeUnderflow { span }
            | AnalyzerError::RecursiveImport { span, .. }
            | AnalyzerError::ImportFailed { span, .. }
            | AnalyzerError::DuplicateType { span, .. }
            | AnalyzerError::MissingReturn { span, .. }
            | AnalyzerError::ConstAssignment { span, .. }
            | AnalyzerError::ArgumentCountMismatch { span, .. }
            | AnalyzerError::InvalidOperation { span, .. } => *span,
        }
    }

    /// 修正のヒント
    pub fn hints(&self) -> Vec<String> {
        match self {
            AnalyzerError::UndefinedReference { name, .. } => vec![format!(
                "{} を使用する前に宣言するか、importを確認してください",
                name
            )],
            AnalyzerError::InaccessibleMember { member, .. } => vec![format!(
                "{} を public にするか、宣言クラスの内部からアクセスしてください",
                member
            )],
            AnalyzerError::DuplicateDeclaration { name, .. } => vec![
                format!("{} を別の名前に変更してください", name),
                "外側の定義を隠したい場合は、内側のブロックで宣言してください".to_string(),
            ],
            AnalyzerError::ShadowedDeclaration { name, .. } => vec![format!(
                "意図的でなければ {} を別の名前に変更してください",
                name
            )],
            AnalyzerError::CyclicInheritance { class, base, .. } => vec![format!(
                "{} と {} の継承関係のどちらかを削除してください",
                class, base
            )],
            AnalyzerError::ClassFinalized { class, .. } => vec![format!(
                "{} のメンバーと基底クラスはクラス本体の中で宣言してください",
                class
            )],
            AnalyzerError::RecursiveImport { .. } => vec![
                "循環しているimportのいずれかを削除してください".to_string(),
                "共通部分を別のモジュールに切り出すと循環を解消できます".to_string(),
            ],
            AnalyzerError::MissingReturn { .. } => {
                vec!["関数本体の最後にreturn文を追加してください".to_string()]
            }
            AnalyzerError::ConstAssignment { name, .. } => {
                vec![format!("{} の宣言から const を外してください", name)]
            }
            AnalyzerError::ScopeUnderflow { .. } => {
                vec!["enter_scope と exit_scope の呼び出しが対応しているか確認してください".to_string()]
            }
            _ => Vec::new(),
        }
    }

    /// ラベルに添えるメッセージ
    fn label_message(&self) -> Option<&'static str> {
        match self {
            AnalyzerError::UndefinedReference { .. } => Some("この名前は定義されていません"),
            AnalyzerError::UndefinedMember { .. } => Some("このメンバーは定義されていません"),
            AnalyzerError::DuplicateDeclaration { .. } => Some("重複した定義"),
            AnalyzerError::ShadowedDeclaration { .. } => Some("外側の定義を隠しています"),
            AnalyzerError::CyclicInheritance { .. } => Some("ここで循環が発生します"),
            AnalyzerError::RecursiveImport { .. } => Some("このimportが循環を閉じています"),
            AnalyzerError::MissingReturn { .. } => Some("戻り値を返す必要があります"),
            AnalyzerError::ConstAssignment { .. } => Some("この変数はconstで宣言されています"),
            _ => None,
        }
    }
}

/// エラー情報とソースコードの位置情報を含むエラー
#[derive(Debug, Clone)]
pub struct DiagnosticError {
    pub error: YuniError,
    pub file_id: usize,
    pub severity: Severity,
}

impl DiagnosticError {
    pub fn new(error: YuniError, file_id: usize) -> Self {
        Self {
            error,
            file_id,
            severity: Severity::Error,
        }
    }

    pub fn warning(error: YuniError, file_id: usize) -> Self {
        Self {
            error,
            file_id,
            severity: Severity::Warning,
        }
    }

    /// codespan-reportingのDiagnosticに変換
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let diagnostic = Diagnostic::new(self.severity).with_message(self.error.to_string());
        match &self.error {
            YuniError::Analyzer(e) => {
                let span = e.span();
                let mut labels = if span.is_dummy() {
                    vec![]
                } else {
                    let label = Label::primary(self.file_id, span.start..span.end);
                    match e.label_message() {
                        Some(message) => vec![label.with_message(message)],
                        None => vec![label],
                    }
                };
                if let AnalyzerError::DuplicateDeclaration { previous, .. } = e {
                    if !previous.is_dummy() {
                        labels.push(
                            Label::secondary(self.file_id, previous.start..previous.end)
                                .with_message("最初の定義"),
                        );
                    }
                }
                let notes = e
                    .hints()
                    .into_iter()
                    .map(|hint| format!("ヒント: {}", hint))
                    .collect();
                diagnostic.with_labels(labels).with_notes(notes)
            }
            _ => diagnostic,
        }
    }
}

/// 複数のエラーを蓄積するためのコレクター
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<DiagnosticError>,
    warnings: Vec<DiagnosticError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーを追加
    pub fn add_error(&mut self, error: YuniError, file_id: usize) {
        self.errors.push(DiagnosticError::new(error, file_id));
    }

    /// 警告を追加
    pub fn add_warning(&mut self, error: YuniError, file_id: usize) {
        self.warnings.push(DiagnosticError::warning(error, file_id));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn errors(&self) -> &[DiagnosticError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[DiagnosticError] {
        &self.warnings
    }
}

/// Result型のエイリアス
pub type YuniResult<T> = Result<T, YuniError>;
pub type AnalysisResult<T> = Result<T, AnalyzerError>;

impl From<std::io::Error> for YuniError {
    fn from(e: std::io::Error) -> Self {
        YuniError::Io(e.to_string())
    }
}
