//! # Entity configuration
//!
//! The declarative description of one logical table, and the foreign-key,
//! unnest, and append shapes it can carry. Mirrors the document shape
//! described for the project configuration: a plain tree of basic types,
//! deserialized with `serde` and never mutated once loaded.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn default_system_id() -> String {
    "system_id".to_string()
}

fn default_append_mode() -> String {
    "all".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Fixed,
    Sql,
    Entity,
}

impl Default for EntityType {
    fn default() -> Self {
        EntityType::Fixed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Outer,
    Cross,
}

impl Default for JoinType {
    fn default() -> Self {
        JoinType::Inner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// `drop_duplicates`: `false | true | [columns] | {columns, check_functional_dependency, strict_functional_dependency}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DropDuplicatesConfig {
    Flag(bool),
    Columns(Vec<String>),
    Rich {
        columns: Vec<String>,
        #[serde(default)]
        check_functional_dependency: bool,
        #[serde(default)]
        strict_functional_dependency: bool,
    },
}

impl Default for DropDuplicatesConfig {
    fn default() -> Self {
        DropDuplicatesConfig::Flag(false)
    }
}

/// `drop_empty_rows`: `false | true | [columns] | {column: [empty_values]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DropEmptyRowsConfig {
    Flag(bool),
    Columns(Vec<String>),
    PerColumn(IndexMap<String, Vec<serde_json::Value>>),
}

impl Default for DropEmptyRowsConfig {
    fn default() -> Self {
        DropEmptyRowsConfig::Flag(false)
    }
}

/// `extra_columns` on a foreign key: user supplies `exposed_name -> source_name`
/// (or a bare column name / list of names meaning identity rename).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraColumnsConfig {
    Single(String),
    List(Vec<String>),
    Map(IndexMap<String, String>),
    #[serde(skip)]
    Empty,
}

impl Default for ExtraColumnsConfig {
    fn default() -> Self {
        ExtraColumnsConfig::Empty
    }
}

impl ExtraColumnsConfig {
    /// Invert `{exposed_name: source_name}` into `{source_name: exposed_name}`
    /// for lookup against the remote table's actual columns, the same
    /// inversion the configuration-level accessor in the reference project
    /// performs before selecting remote columns.
    pub fn resolved(&self) -> IndexMap<String, String> {
        match self {
            ExtraColumnsConfig::Empty => IndexMap::new(),
            ExtraColumnsConfig::Single(name) => {
                let mut m = IndexMap::new();
                m.insert(name.clone(), name.clone());
                m
            }
            ExtraColumnsConfig::List(names) => names
                .iter()
                .map(|n| (n.clone(), n.clone()))
                .collect(),
            ExtraColumnsConfig::Map(map) => {
                map.iter().map(|(k, v)| (v.clone(), k.clone())).collect()
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForeignKeyConstraints {
    pub cardinality: Option<Cardinality>,
    pub allow_unmatched_left: Option<bool>,
    pub allow_unmatched_right: Option<bool>,
    pub allow_row_decrease: Option<bool>,
    #[serde(default)]
    pub require_unique_left: bool,
    #[serde(default)]
    pub require_unique_right: bool,
    #[serde(default = "default_true")]
    pub allow_null_keys: bool,
    pub max_row_increase_abs: Option<i64>,
    pub max_row_increase_pct: Option<f64>,
    pub min_match_rate: Option<f64>,
    pub require_all_left_matched: Option<bool>,
    pub require_all_right_matched: Option<bool>,
}

impl ForeignKeyConstraints {
    pub fn is_empty(&self) -> bool {
        self.cardinality.is_none()
            && self.allow_unmatched_left.is_none()
            && self.allow_unmatched_right.is_none()
            && self.allow_row_decrease.is_none()
            && !self.require_unique_left
            && !self.require_unique_right
            && self.max_row_increase_abs.is_none()
            && self.max_row_increase_pct.is_none()
            && self.min_match_rate.is_none()
            && self.require_all_left_matched.is_none()
            && self.require_all_right_matched.is_none()
    }

    /// Any constraint that needs the post-merge match-indicator column.
    pub fn has_match_constraints(&self) -> bool {
        self.allow_unmatched_left == Some(false)
            || self.allow_unmatched_right == Some(false)
            || self.require_all_left_matched == Some(true)
            || self.require_all_right_matched == Some(true)
            || self.min_match_rate.is_some()
            || self.cardinality.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyConfig {
    #[serde(rename = "entity")]
    pub remote_entity: String,
    #[serde(default)]
    pub local_keys: Vec<String>,
    #[serde(default)]
    pub remote_keys: Vec<String>,
    #[serde(default)]
    pub how: JoinType,
    #[serde(default)]
    pub extra_columns: ExtraColumnsConfig,
    #[serde(default)]
    pub drop_remote_id: bool,
    #[serde(default)]
    pub constraints: ForeignKeyConstraints,
}

impl ForeignKeyConfig {
    /// True iff the child table already carries this link's output columns:
    /// either the exposed parent public_id, or every non-identity
    /// extra-column target. This is the idempotence check that makes a
    /// second `link_entity` attempt a no-op rather than a duplicate merge.
    pub fn has_foreign_key_link(&self, remote_public_id: &str, local_columns: &[String]) -> bool {
        let has = |name: &str| local_columns.iter().any(|c| c == name);
        if has(remote_public_id) {
            return true;
        }
        let resolved = self.extra_columns.resolved();
        if resolved.is_empty() {
            return false;
        }
        resolved
            .iter()
            .filter(|(source, target)| source != target)
            .all(|(_, target)| has(target))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnnestConfig {
    #[serde(default)]
    pub id_vars: Vec<String>,
    pub value_vars: Vec<String>,
    pub var_name: String,
    pub value_name: String,
}

/// A reference-style append item (`{source: other_entity}`) or a
/// self-contained override of any subsettable field. Non-inheritable
/// fields (`foreign_keys`, `unnest`, `append`, `append_mode`, `depends_on`)
/// are never part of an append item; they belong to the parent only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppendItem {
    pub r#type: Option<EntityType>,
    pub source: Option<String>,
    pub values: Option<Vec<Vec<serde_json::Value>>>,
    pub columns: Option<Vec<String>>,
    pub keys: Option<Vec<String>>,
    pub data_source: Option<String>,
    pub query: Option<String>,
    pub extra_columns: Option<IndexMap<String, serde_json::Value>>,
    pub drop_duplicates: Option<DropDuplicatesConfig>,
    pub drop_empty_rows: Option<DropEmptyRowsConfig>,
    pub surrogate_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializedConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub source_state: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityConfig {
    #[serde(rename = "type", default)]
    pub entity_type: EntityType,
    pub source: Option<String>,
    #[serde(default = "default_system_id")]
    pub system_id: String,
    pub public_id: Option<String>,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub extra_columns: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyConfig>,
    #[serde(default)]
    pub drop_duplicates: DropDuplicatesConfig,
    #[serde(default)]
    pub drop_empty_rows: DropEmptyRowsConfig,
    pub unnest: Option<UnnestConfig>,
    #[serde(default)]
    pub append: Vec<AppendItem>,
    #[serde(default = "default_append_mode")]
    pub append_mode: String,
    pub materialized: Option<MaterializedConfig>,
    pub values: Option<Vec<Vec<serde_json::Value>>>,
    pub data_source: Option<String>,
    pub query: Option<String>,
    pub surrogate_name: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl EntityConfig {
    /// `depends_on(E) = explicit_depends_on(E) ∪ {source(E)} ∪ {fk.remote_entity} ∪ {append.source}`.
    pub fn full_depends_on(&self) -> Vec<String> {
        let mut deps: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !deps.iter().any(|d| d == name) {
                deps.push(name.to_string());
            }
        };
        for d in &self.depends_on {
            push(d);
        }
        if let Some(s) = &self.source {
            push(s);
        }
        for fk in &self.foreign_keys {
            push(&fk.remote_entity);
        }
        for item in &self.append {
            if let Some(s) = &item.source {
                push(s);
            }
        }
        deps
    }

    /// Columns contributed by a foreign key on the local side.
    pub fn fk_columns(&self) -> Vec<String> {
        let mut cols = Vec::new();
        for fk in &self.foreign_keys {
            for c in &fk.local_keys {
                if !cols.contains(c) {
                    cols.push(c.clone());
                }
            }
        }
        cols
    }

    /// `keys ∪ columns ∪ fk_columns`, keys first, then declared columns,
    /// then any FK-only column not already present.
    pub fn keys_columns_and_fks(&self) -> Vec<String> {
        let mut out = Vec::new();
        for k in &self.keys {
            if !out.contains(k) {
                out.push(k.clone());
            }
        }
        for c in &self.columns {
            if !out.contains(c) {
                out.push(c.clone());
            }
        }
        let unnest_cols = self.unnest_columns();
        for c in self.fk_columns() {
            if !out.contains(&c) && !unnest_cols.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    pub fn unnest_columns(&self) -> Vec<String> {
        match &self.unnest {
            Some(u) => vec![u.var_name.clone(), u.value_name.clone()],
            None => Vec::new(),
        }
    }

    pub fn has_append(&self) -> bool {
        !self.append.is_empty()
    }

    /// The base config, followed by one synthetic config per append item:
    /// non-inheritable fields reset to defaults, override fields from the
    /// append item applied on top of the parent's remaining fields.
    pub fn sub_table_configs(&self) -> Vec<EntityConfig> {
        let mut out = vec![self.without_append_only_fields()];
        for item in &self.append {
            out.push(self.create_append_config(item));
        }
        out
    }

    fn without_append_only_fields(&self) -> EntityConfig {
        let mut base = self.clone();
        base.foreign_keys.clear();
        base.unnest = None;
        base.append.clear();
        base.append_mode = default_append_mode();
        base.depends_on.clear();
        base
    }

    fn create_append_config(&self, item: &AppendItem) -> EntityConfig {
        let mut cfg = self.without_append_only_fields();
        match item.r#type {
            Some(t) => cfg.entity_type = t,
            // A bare `{source: other_entity}` append item is a reference to
            // another entity's already-produced table, not a re-run of the
            // parent's own fixed values.
            None if item.source.is_some() => {
                cfg.entity_type = EntityType::Entity;
                cfg.values = None;
            }
            None => {}
        }
        cfg.source = item.source.clone().or(cfg.source);
        if let Some(v) = &item.values {
            cfg.values = Some(v.clone());
        }
        if let Some(c) = &item.columns {
            cfg.columns = c.clone();
        }
        if let Some(k) = &item.keys {
            cfg.keys = k.clone();
        }
        cfg.data_source = item.data_source.clone().or(cfg.data_source);
        cfg.query = item.query.clone().or(cfg.query);
        if let Some(ec) = &item.extra_columns {
            cfg.extra_columns = ec.clone();
        }
        if let Some(dd) = &item.drop_duplicates {
            cfg.drop_duplicates = dd.clone();
        }
        if let Some(de) = &item.drop_empty_rows {
            cfg.drop_empty_rows = de.clone();
        }
        cfg.surrogate_name = item.surrogate_name.clone().or(cfg.surrogate_name);
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_depends_on_collects_source_fk_and_append() {
        let mut cfg = EntityConfig {
            source: Some("parent".into()),
            ..Default::default()
        };
        cfg.foreign_keys.push(ForeignKeyConfig {
            remote_entity: "lookup".into(),
            local_keys: vec!["lookup_ref".into()],
            remote_keys: vec!["name".into()],
            how: JoinType::Inner,
            extra_columns: ExtraColumnsConfig::Empty,
            drop_remote_id: false,
            constraints: ForeignKeyConstraints::default(),
        });
        cfg.append.push(AppendItem {
            source: Some("extra_rows".into()),
            ..Default::default()
        });
        let deps = cfg.full_depends_on();
        assert_eq!(deps, vec!["parent", "lookup", "extra_rows"]);
    }

    #[test]
    fn keys_columns_and_fks_orders_keys_then_columns_then_fks() {
        let mut cfg = EntityConfig {
            keys: vec!["id".into()],
            columns: vec!["name".into()],
            ..Default::default()
        };
        cfg.foreign_keys.push(ForeignKeyConfig {
            remote_entity: "parent".into(),
            local_keys: vec!["parent_ref".into()],
            remote_keys: vec!["pid".into()],
            how: JoinType::Inner,
            extra_columns: ExtraColumnsConfig::Empty,
            drop_remote_id: false,
            constraints: ForeignKeyConstraints::default(),
        });
        assert_eq!(
            cfg.keys_columns_and_fks(),
            vec!["id".to_string(), "name".to_string(), "parent_ref".to_string()]
        );
    }

    #[test]
    fn extra_columns_resolved_inverts_map_form() {
        let mut map = IndexMap::new();
        map.insert("pid".to_string(), "system_id".to_string());
        let ec = ExtraColumnsConfig::Map(map);
        let resolved = ec.resolved();
        assert_eq!(resolved.get("system_id"), Some(&"pid".to_string()));
    }

    #[test]
    fn has_foreign_key_link_detects_existing_public_id() {
        let fk = ForeignKeyConfig {
            remote_entity: "parent".into(),
            local_keys: vec!["parent_ref".into()],
            remote_keys: vec!["name".into()],
            how: JoinType::Inner,
            extra_columns: ExtraColumnsConfig::Empty,
            drop_remote_id: false,
            constraints: ForeignKeyConstraints::default(),
        };
        let cols = vec!["system_id".to_string(), "parent_id".to_string()];
        assert!(fk.has_foreign_key_link("parent_id", &cols));
        assert!(!fk.has_foreign_key_link("other_id", &cols));
    }
}
