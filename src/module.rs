//! モジュールの読み込みとレジストリ
//!
//! importされたファイルは独立したコンパイル単位として解析され、
//! 解決済みパスをキーにセッションのレジストリへ登録されます。同じパスは
//! 1セッションで一度だけ解析され、解析中のパスを再びimportすると
//! 循環importとして拒否されます。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{Module, Span};
use crate::error::{AnalysisResult, AnalyzerError, YuniError, YuniResult};
use crate::symbol::TypeRegistry;
use crate::table::SymbolTableManager;

/// モジュールファイルの拡張子
pub const MODULE_EXTENSION: &str = "json";

/// importパスの解決と構文木の読み込み
pub trait ModuleLoader {
    /// importのパスを、importしたファイルからの相対または検索パスで解決する
    fn resolve(&self, path: &str, importer: Option<&Path>) -> YuniResult<PathBuf>;

    /// 解決済みのパスから構文木を読み込む
    fn load(&self, path: &Path) -> YuniResult<Module>;
}

fn with_extension(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(MODULE_EXTENSION)
    }
}

/// JSON形式の構文木をファイルシステムから読み込む
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    search_paths: Vec<PathBuf>,
}

impl FsLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }
}

impl ModuleLoader for FsLoader {
    fn resolve(&self, path: &str, importer: Option<&Path>) -> YuniResult<PathBuf> {
        let relative = with_extension(path);
        let importer_dir = importer.and_then(Path::parent).map(Path::to_path_buf);

        let candidates = importer_dir
            .into_iter()
            .chain(self.search_paths.iter().cloned())
            .map(|dir| dir.join(&relative))
            .chain(std::iter::once(relative.clone()));

        for candidate in candidates {
            if candidate.is_file() {
                log::trace!("importを解決: {} -> {}", path, candidate.display());
                return fs::canonicalize(&candidate).map_err(YuniError::from);
            }
        }
        Err(YuniError::Module {
            path: path.to_string(),
            message: "ファイルが見つかりません".to_string(),
        })
    }

    fn load(&self, path: &Path) -> YuniResult<Module> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| YuniError::Module {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// メモリ上の構文木から読み込む。テストで使う
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    modules: HashMap<PathBuf, Module>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: &str, module: Module) -> Self {
        self.modules.insert(with_extension(path), module);
        self
    }
}

impl ModuleLoader for MemoryLoader {
    fn resolve(&self, path: &str, _importer: Option<&Path>) -> YuniResult<PathBuf> {
        let path_buf = with_extension(path);
        if self.modules.contains_key(&path_buf) {
            Ok(path_buf)
        } else {
            Err(YuniError::Module {
                path: path.to_string(),
                message: "モジュールが登録されていません".to_string(),
            })
        }
    }

    fn load(&self, path: &Path) -> YuniResult<Module> {
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| YuniError::Module {
                path: path.display().to_string(),
                message: "モジュールが登録されていません".to_string(),
            })
    }
}

/// 解析を終えたコンパイル単位
#[derive(Debug)]
pub struct CompiledUnit {
    pub path: PathBuf,
    pub name: String,
    pub manager: SymbolTableManager,
    /// この単位が登録したカスタム型のid
    pub custom_types: Vec<String>,
    /// importした側でこの単位を表すモジュールクラスのrawValue
    pub module_raw: String,
    pub warnings: Vec<AnalyzerError>,
}

/// 解決済みパスをキーとするコンパイル単位のレジストリ
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    in_progress: Vec<PathBuf>,
    units: IndexMap<PathBuf, Rc<CompiledUnit>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// パスの解析を開始する。解析中のパスなら循環の連鎖を報告する
    pub fn begin(&mut self, path: &Path, span: Span) -> AnalysisResult<()> {
        if let Some(start) = self.in_progress.iter().position(|p| p == path) {
            let chain = self.in_progress[start..]
                .iter()
                .chain(std::iter::once(&path.to_path_buf()))
                .map(|p| p.display().to_string())
                .collect();
            return Err(AnalyzerError::RecursiveImport { chain, span });
        }
        log::debug!("モジュールの解析を開始: {}", path.display());
        self.in_progress.push(path.to_path_buf());
        Ok(())
    }

    /// 解析中の印を外す（成功・失敗どちらでも呼ぶ）
    pub fn end(&mut self, path: &Path) {
        if let Some(index) = self.in_progress.iter().rposition(|p| p == path) {
            self.in_progress.remove(index);
        }
    }

    pub fn is_in_progress(&self, path: &Path) -> bool {
        self.in_progress.iter().any(|p| p == path)
    }

    /// 解析済みの単位を登録する
    pub fn finish(&mut self, unit: CompiledUnit) -> Rc<CompiledUnit> {
        log::debug!("モジュールを登録: {}", unit.path.display());
        let unit = Rc::new(unit);
        self.units.insert(unit.path.clone(), Rc::clone(&unit));
        unit
    }

    pub fn get(&self, path: &Path) -> Option<Rc<CompiledUnit>> {
        self.units.get(path).cloned()
    }

    pub fn units(&self) -> impl Iterator<Item = &Rc<CompiledUnit>> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 単位を登録解除し、それが登録したカスタム型も削除する
    pub fn unload(&mut self, path: &Path, types: &mut TypeRegistry) -> Option<Rc<CompiledUnit>> {
        let unit = self.units.shift_remove(path)?;
        for id in &unit.custom_types {
            types.remove_custom_type(id);
        }
        log::debug!("モジュールを登録解除: {}", path.display());
        Some(unit)
    }
}
