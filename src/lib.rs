//! Yuni symbol table and type system library
//!
//! This library provides the scope-structured symbol table, the label and
//! type model, and the class inheritance and visibility rules used by the
//! Yuni language compiler, together with a binder pass that drives them
//! over a syntax tree.

pub mod analyzer;
pub mod ast;
pub mod compiler;
pub mod error;
pub mod module;
pub mod session;
pub mod symbol;
pub mod table;

// Re-export commonly used types
pub use analyzer::SemanticAnalyzer;
pub use ast::{Expression, Module, Statement};
pub use compiler::{AnalysisPipeline, CompilationState};
pub use error::{AnalysisResult, AnalyzerError, ErrorCollector, YuniError, YuniResult};
pub use module::{FsLoader, MemoryLoader, ModuleLoader, ModuleRegistry};
pub use session::{Session, SessionOptions};
pub use symbol::{Symbol, SymbolArena, SymbolId, TypeLabel, TypeRegistry};
pub use table::{SymbolTable, SymbolTableManager};
