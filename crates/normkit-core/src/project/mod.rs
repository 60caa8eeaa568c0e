//! # Project model
//!
//! Immutable view over a project configuration document: entities, data
//! sources, and the layout/task-list bookkeeping a caller may want to
//! round-trip even though the core never reads it.

pub mod entity;

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{NormError, Result};
pub use entity::{
    AppendItem, Cardinality, DropDuplicatesConfig, DropEmptyRowsConfig, EntityConfig, EntityType,
    ExtraColumnsConfig, ForeignKeyConfig, ForeignKeyConstraints, JoinType, MaterializedConfig,
    UnnestConfig,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub default_entity: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub driver: String,
    #[serde(default)]
    pub options: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutOptions {
    #[serde(default)]
    pub custom: IndexMap<String, LayoutPosition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub data_sources: IndexMap<String, DataSourceConfig>,
    #[serde(default)]
    pub translations: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub mappings: IndexMap<String, serde_json::Value>,
    pub layout: Option<LayoutOptions>,
}

/// UI-facing task-list bookkeeping. Carried on the document for round-trip
/// fidelity only; the core never reads or mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub required_entities: Vec<String>,
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub entities: IndexMap<String, EntityConfig>,
    #[serde(default)]
    pub options: Options,
    pub task_list: Option<TaskList>,
    #[serde(skip)]
    pub origin: Option<String>,
}

impl Project {
    pub fn get_entity(&self, name: &str) -> Result<&EntityConfig> {
        self.entities
            .get(name)
            .ok_or_else(|| NormError::UnknownEntity {
                name: name.to_string(),
                context: "project lookup".to_string(),
            })
    }

    pub fn has_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Looks up a named entry in `options.data_sources`, as referenced by
    /// `entity`'s `data_source` field.
    pub fn get_data_source(&self, entity: &str, name: &str) -> Result<&DataSourceConfig> {
        self.options
            .data_sources
            .get(name)
            .ok_or_else(|| NormError::UnknownDataSource {
                name: name.to_string(),
                entity: entity.to_string(),
            })
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }

    /// BFS over `depends_on`, starting from `targets`, collecting every
    /// entity transitively required to produce them.
    pub fn required_subgraph(&self, targets: &[String]) -> Result<HashSet<String>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for t in targets {
            if !self.has_entity(t) {
                return Err(NormError::UnknownEntity {
                    name: t.clone(),
                    context: "normalization target".to_string(),
                });
            }
            if seen.insert(t.clone()) {
                queue.push_back(t.clone());
            }
        }
        while let Some(name) = queue.pop_front() {
            let cfg = self.get_entity(&name)?;
            for dep in cfg.full_depends_on() {
                if !self.has_entity(&dep) {
                    return Err(NormError::UnknownEntity {
                        name: dep,
                        context: format!("depends_on of '{name}'"),
                    });
                }
                if seen.insert(dep.clone()) {
                    queue.push_back(dep);
                }
            }
        }
        Ok(seen)
    }

    /// A stable digest of an entity's config tree, used by external caches
    /// to invalidate memoized outputs. Canonicalizes through a sorted-key
    /// JSON rendering so the hash is independent of in-memory map ordering.
    pub fn metadata_hash(&self, entity_name: &str) -> Result<String> {
        let cfg = self.get_entity(entity_name)?;
        let value = serde_json::to_value(cfg).map_err(|e| NormError::Other(e.to_string()))?;
        let canonical = canonicalize(&value);
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn canonicalize(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{:?}:{}", k, canonicalize(&map[k])))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonicalize).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}
