//! セマンティック解析モジュール
//!
//! 構文木を走査してシンボルテーブルを構築し、名前解決、継承と可視性の検査、
//! 型の互換性検査を行います。

mod semantic_analyzer;

// 公開API
pub use semantic_analyzer::SemanticAnalyzer;
