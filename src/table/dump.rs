//! シンボルテーブルのダンプ
//!
//! CLIの `dump` サブコマンドが表示・JSON出力に使う、挿入順を保った
//! スナップショットです。

use serde::Serialize;

use crate::symbol::{
    ClassSymbol, ParameterSymbol, SymbolArena, SymbolData, SymbolId, SymbolKind, TypeRegistry,
};

use super::{EntryOrigin, SymbolTable, SymbolTableManager};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolDump {
    pub name: String,
    pub raw_value: String,
    pub kind: SymbolKind,
    pub scope_level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub origin: EntryOrigin,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<SymbolDump>,
}

impl SymbolDump {
    pub fn new(
        arena: &SymbolArena,
        registry: &TypeRegistry,
        id: SymbolId,
        origin: EntryOrigin,
    ) -> Self {
        let symbol = arena.get(id);
        let type_name = match symbol.data() {
            SymbolData::Parameter(_) | SymbolData::Variable(_) => arena
                .payload::<ParameterSymbol>(id)
                .map(|parameter| registry.display(&parameter.effective_type())),
            SymbolData::Function(_) => arena
                .function_signature(id)
                .map(|signature| registry.display(&signature)),
            SymbolData::Class(class) => class.instance_type().map(|ty| registry.display(&ty)),
            SymbolData::TypeLabel(label) => Some(registry.display(&label.type_label())),
            SymbolData::Label(_) => None,
        };
        let labels = symbol
            .labels()
            .map(|marks| marks.labels().iter().map(ToString::to_string).collect())
            .unwrap_or_default();

        let (bases, members) = match arena.payload::<ClassSymbol>(id) {
            Some(class) => {
                let bases = class
                    .bases()
                    .iter()
                    .map(|base| arena.get(*base).value().to_string())
                    .collect();
                let members = [class.members(), class.static_members(), class.constructors()]
                    .into_iter()
                    .flat_map(|table| Self::table(arena, registry, table))
                    .collect();
                (bases, members)
            }
            None => (Vec::new(), Vec::new()),
        };

        Self {
            name: symbol.value().to_string(),
            raw_value: symbol.raw_value().to_string(),
            kind: symbol.kind(),
            scope_level: symbol.scope_level(),
            type_name,
            labels,
            origin,
            bases,
            members,
        }
    }

    fn table(arena: &SymbolArena, registry: &TypeRegistry, table: &SymbolTable) -> Vec<SymbolDump> {
        table
            .iter()
            .map(|(_, entry)| Self::new(arena, registry, entry.symbol, entry.origin))
            .collect()
    }
}

/// 1つのスコープレベルのダンプ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeDump {
    pub level: usize,
    pub symbols: Vec<SymbolDump>,
}

impl ScopeDump {
    pub fn new(manager: &SymbolTableManager, registry: &TypeRegistry, level: usize) -> Self {
        let symbols = manager
            .scope_entries(level)
            .map(|(_, entry)| SymbolDump::new(manager.arena(), registry, entry.symbol, entry.origin))
            .collect();
        Self { level, symbols }
    }

    /// スタック上のすべてのスコープ
    pub fn all(manager: &SymbolTableManager, registry: &TypeRegistry) -> Vec<ScopeDump> {
        (0..=manager.top_level())
            .map(|level| Self::new(manager, registry, level))
            .collect()
    }
}
