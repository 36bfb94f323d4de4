//! コンパイルセッション
//!
//! 型レジストリ、モジュールレジストリ、rawValueの発行器など、複数の
//! コンパイル単位にまたがる状態を1か所で所有します。

use std::path::PathBuf;

use crate::module::{FsLoader, ModuleLoader, ModuleRegistry};
use crate::symbol::{RawValueGenerator, SymbolKind, TypeRegistry};

/// セッションの設定
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// importの検索パス
    pub search_paths: Vec<PathBuf>,
    /// 外側の束縛を隠す宣言を警告する
    pub warn_shadowing: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            warn_shadowing: true,
        }
    }
}

pub struct Session {
    pub options: SessionOptions,
    pub types: TypeRegistry,
    pub modules: ModuleRegistry,
    loader: Box<dyn ModuleLoader>,
    raw_values: RawValueGenerator,
}

impl Session {
    /// ファイルシステムからモジュールを読み込むセッション
    pub fn new(options: SessionOptions) -> Self {
        let loader = FsLoader::new(options.search_paths.clone());
        Self::with_loader(options, Box::new(loader))
    }

    pub fn with_loader(options: SessionOptions, loader: Box<dyn ModuleLoader>) -> Self {
        Self {
            options,
            types: TypeRegistry::new(),
            modules: ModuleRegistry::new(),
            loader,
            raw_values: RawValueGenerator::new(),
        }
    }

    pub fn loader(&self) -> &dyn ModuleLoader {
        self.loader.as_ref()
    }

    /// セッション内で一意なrawValueを発行する
    pub fn next_raw(&mut self, kind: SymbolKind) -> String {
        self.raw_values.next(kind)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}
