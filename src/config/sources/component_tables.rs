//! Component tables, read straight from the TOML layers.
//!
//! `config` folds keys to lower case, which would rewrite component ids and
//! parameter bags. These tables are parsed with `toml` instead and merged
//! table by table, later files overriding earlier ones key by key.

use crate::component::ComponentRecord;
use config::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

const SECTIONS: [&str; 2] = ["creators", "graders"];

/// `[creators.<id>]` and `[graders.<id>]` tables of the merged layers
#[derive(Debug, Default, Deserialize)]
pub struct ComponentTables {
    #[serde(default)]
    pub creators: BTreeMap<String, ComponentRecord>,
    #[serde(default)]
    pub graders: BTreeMap<String, ComponentRecord>,
}

/// Merge the component sections of `files`, lowest precedence first
pub fn load(files: &[PathBuf]) -> Result<ComponentTables, ConfigError> {
    let mut merged = Table::new();
    for path in files {
        let mut document = read(path)?;
        let mut sections = Table::new();
        for section in SECTIONS {
            if let Some(table) = document.remove(section) {
                sections.insert(section.to_string(), table);
            }
        }
        merge_tables(&mut merged, sections);
    }
    Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Message(format!("Invalid component table: {}", e)))
}

fn read(path: &Path) -> Result<Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Message(format!("Failed to read {}: {}", path.display(), e))
    })?;
    content
        .parse::<Table>()
        .map_err(|e| ConfigError::Message(format!("Failed to parse {}: {}", path.display(), e)))
}

fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        let nested = matches!((base.get(&key), &value), (Some(Value::Table(_)), Value::Table(_)));
        if nested {
            if let (Some(Value::Table(existing)), Value::Table(incoming)) = (base.get_mut(&key), value) {
                merge_tables(existing, incoming);
            }
        } else {
            base.insert(key, value);
        }
    }
}
