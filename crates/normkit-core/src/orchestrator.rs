//! End-to-end normalization run (spec §6.3): load, transform, link, and
//! schedule every entity needed to produce a set of targets.

use std::collections::{HashMap, HashSet};

use crate::error::{NormError, Result};
use crate::link::{link_foreign_key, LinkOutcome};
use crate::loader::Loader;
use crate::project::{DropDuplicatesConfig, EntityConfig, EntityType, Project};
use crate::schedule::{ready_entities, DeferredBudget};
use crate::spec::base::Report;
use crate::spec::project::validate_project;
use crate::table::Table;
use crate::transform::{
    drop_duplicates, drop_empty_rows, renumber_surrogate_id, subset_with_surrogate_id, unpivot, UnpivotOutcome,
};

/// An unresolved foreign key left behind at the end of a run. Only ever
/// populated by a caller-supplied `initial_store` that skips ahead of an
/// entity's own dependencies; a run driven start-to-finish either resolves
/// every foreign key or fails hard with `PersistentDeferral`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FkLocation {
    pub entity: String,
    pub remote_entity: String,
}

pub struct NormalizeOutcome {
    pub tables: HashMap<String, Table>,
    pub report: Report,
    pub residual_deferred: HashSet<FkLocation>,
}

pub fn normalize(project: &Project, targets: &[String], loader: &dyn Loader) -> Result<NormalizeOutcome> {
    let config_report = validate_project(project);
    if config_report.has_errors() {
        return Err(NormError::Config {
            message: config_report.get_report(),
        });
    }

    let scope = project.required_subgraph(targets)?;
    let mut completed: HashSet<String> = HashSet::new();
    let mut tables: HashMap<String, Table> = HashMap::new();
    let mut report = config_report;

    loop {
        if completed.len() == scope.len() {
            break;
        }
        let ready = ready_entities(project, &scope, &completed);
        if ready.is_empty() {
            let unmet: Vec<String> = scope.difference(&completed).cloned().collect();
            return Err(NormError::StalledDependency {
                unmet: unmet.join(", "),
            });
        }
        for name in ready {
            let cfg = project.get_entity(&name)?;
            let table = build_entity(&name, cfg, project, loader, &tables, &mut report)?;
            tables.insert(name.clone(), table);
            completed.insert(name);
        }
    }

    Ok(NormalizeOutcome {
        tables,
        report,
        residual_deferred: HashSet::new(),
    })
}

/// Produce the base, un-subsetted table for a single (sub-)config: a raw
/// load for `type = fixed`, the already-completed source entity's table
/// for `type = entity`, or an empty table when an `entity` has no `source`
/// and exists only to collect its `append` items.
fn load_one(
    name: &str,
    cfg: &EntityConfig,
    loader: &dyn Loader,
    completed_tables: &HashMap<String, Table>,
) -> Result<Table> {
    match cfg.entity_type {
        EntityType::Fixed => loader.load(name, cfg),
        EntityType::Entity => match &cfg.source {
            Some(source) => completed_tables
                .get(source)
                .cloned()
                .ok_or_else(|| NormError::StalledDependency { unmet: source.clone() }),
            None => Ok(Table::new(Vec::new())),
        },
        EntityType::Sql => Err(NormError::UnknownDataSource {
            name: cfg.data_source.clone().unwrap_or_default(),
            entity: name.to_string(),
        }),
    }
}

/// Load and column-subset every sub-table-config (the base config plus one
/// per `append` item), then union the results (spec §4.2.3): `all` keeps
/// every row, `distinct` additionally drops exact-duplicate rows. Each
/// sub-table is numbered `1..N` independently by `subset_with_surrogate_id`,
/// so the union is renumbered once appending is actually in play.
fn load_and_subset(
    name: &str,
    cfg: &EntityConfig,
    loader: &dyn Loader,
    completed_tables: &HashMap<String, Table>,
    report: &mut Report,
) -> Result<Table> {
    if !cfg.has_append() {
        let raw = load_one(name, cfg, loader, completed_tables)?;
        return Ok(subset_with_surrogate_id(&raw, cfg));
    }

    let mut union: Option<Table> = None;
    for sub_cfg in cfg.sub_table_configs() {
        let raw = load_one(name, &sub_cfg, loader, completed_tables)?;
        let subset = subset_with_surrogate_id(&raw, &sub_cfg);
        union = Some(match union {
            Some(acc) => acc.concat(subset),
            None => subset,
        });
    }
    let unioned = union.unwrap_or_else(|| Table::new(vec![cfg.system_id.clone()]));
    let unioned = renumber_surrogate_id(unioned, &cfg.system_id);

    if cfg.append_mode == "distinct" {
        drop_duplicates(&unioned, name, &DropDuplicatesConfig::Flag(true), report)
    } else {
        Ok(unioned)
    }
}

fn build_entity(
    name: &str,
    cfg: &EntityConfig,
    project: &Project,
    loader: &dyn Loader,
    completed_tables: &HashMap<String, Table>,
    report: &mut Report,
) -> Result<Table> {
    let subset = load_and_subset(name, cfg, loader, completed_tables, report)?;
    let deduped = drop_duplicates(&subset, name, &cfg.drop_duplicates, report)?;
    let mut current = drop_empty_rows(&deduped, name, &cfg.drop_empty_rows, true, report);

    let mut budget = DeferredBudget::for_entity(cfg.foreign_keys.len());
    loop {
        let columns_before = current.columns().len();

        if let Some(unnest_cfg) = &cfg.unnest {
            if !current.has_column(&unnest_cfg.value_name) {
                match unpivot(&current, name, unnest_cfg)? {
                    UnpivotOutcome::Done(t) => current = t,
                    UnpivotOutcome::Deferred(t) => current = t,
                }
            }
        }

        for fk in &cfg.foreign_keys {
            let remote_cfg = project.get_entity(&fk.remote_entity)?;
            let remote_table = completed_tables.get(&fk.remote_entity).ok_or_else(|| {
                NormError::StalledDependency {
                    unmet: fk.remote_entity.clone(),
                }
            })?;
            match link_foreign_key(name, &current, cfg, fk, remote_table, remote_cfg, report)? {
                LinkOutcome::Linked(t) => current = t,
                LinkOutcome::Deferred(t) => current = t,
            }
        }

        let unnest_done = cfg
            .unnest
            .as_ref()
            .map(|u| current.has_column(&u.value_name))
            .unwrap_or(true);
        let fks_done = cfg.foreign_keys.iter().all(|fk| {
            let remote_public_id = project
                .get_entity(&fk.remote_entity)
                .ok()
                .and_then(|c| c.public_id.clone())
                .unwrap_or_default();
            fk.has_foreign_key_link(&remote_public_id, current.columns())
        });

        if unnest_done && fks_done {
            return Ok(current);
        }

        let made_progress = current.columns().len() > columns_before;
        if !made_progress && !budget.tick() {
            return Err(NormError::PersistentDeferral {
                residual: name.to_string(),
            });
        }
        if !made_progress {
            continue;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::FixedLoader;
    use crate::project::{Cardinality, ExtraColumnsConfig, ForeignKeyConfig, ForeignKeyConstraints, JoinType};

    fn fixed(columns: &[&str], values: Vec<Vec<serde_json::Value>>) -> EntityConfig {
        EntityConfig {
            entity_type: EntityType::Fixed,
            columns: columns.iter().map(|s| s.to_string()).collect(),
            values: Some(values),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_a_linear_parent_child_chain() {
        let mut project = Project::default();
        let mut parent = fixed(
            &["name"],
            vec![vec![serde_json::json!("x")], vec![serde_json::json!("y")]],
        );
        parent.public_id = Some("a_id".into());
        project.entities.insert("A".to_string(), parent);

        let mut child = fixed(
            &["ref"],
            vec![vec![serde_json::json!("x")], vec![serde_json::json!("x")]],
        );
        child.public_id = Some("b_id".into());
        child.keys = vec!["ref".into()];
        child.foreign_keys.push(ForeignKeyConfig {
            remote_entity: "A".into(),
            local_keys: vec!["ref".into()],
            remote_keys: vec!["name".into()],
            how: JoinType::Inner,
            extra_columns: ExtraColumnsConfig::Empty,
            drop_remote_id: false,
            constraints: ForeignKeyConstraints::default(),
        });
        project.entities.insert("B".to_string(), child);

        let outcome = normalize(&project, &["B".to_string()], &FixedLoader).unwrap();
        let b = outcome.tables.get("B").unwrap();
        assert!(b.has_column("a_id"));
        assert_eq!(b.len(), 2);
        assert!(!outcome.report.has_errors());
        assert!(outcome.residual_deferred.is_empty());
    }

    #[test]
    fn unknown_target_is_rejected_before_any_work() {
        let project = Project::default();
        let err = normalize(&project, &["ghost".to_string()], &FixedLoader).unwrap_err();
        assert!(matches!(err, NormError::UnknownEntity { .. }));
    }

    #[test]
    fn cardinality_violation_surfaces_as_constraint_error() {
        let mut project = Project::default();
        let mut parent = fixed(
            &["name"],
            vec![vec![serde_json::json!("x")], vec![serde_json::json!("x")]],
        );
        parent.public_id = Some("a_id".into());
        project.entities.insert("A".to_string(), parent);

        let mut child = fixed(&["ref"], vec![vec![serde_json::json!("x")]]);
        child.public_id = Some("b_id".into());
        child.keys = vec!["ref".into()];
        let mut fk = ForeignKeyConfig {
            remote_entity: "A".into(),
            local_keys: vec!["ref".into()],
            remote_keys: vec!["name".into()],
            how: JoinType::Inner,
            extra_columns: ExtraColumnsConfig::Empty,
            drop_remote_id: false,
            constraints: ForeignKeyConstraints::default(),
        };
        fk.constraints.cardinality = Some(Cardinality::OneToOne);
        child.foreign_keys.push(fk);
        project.entities.insert("B".to_string(), child);

        let err = normalize(&project, &["B".to_string()], &FixedLoader).unwrap_err();
        assert!(matches!(err, NormError::ConstraintViolation { .. }));
    }

    #[test]
    fn append_distinct_mode_unions_and_dedups_sub_tables() {
        use crate::project::AppendItem;

        let mut project = Project::default();
        project
            .entities
            .insert("extra".to_string(), fixed(&["name"], vec![vec![serde_json::json!("a")]]));

        let mut base = fixed(
            &["name"],
            vec![vec![serde_json::json!("a")], vec![serde_json::json!("b")]],
        );
        base.append_mode = "distinct".to_string();
        base.append.push(AppendItem {
            source: Some("extra".to_string()),
            ..Default::default()
        });
        project.entities.insert("combined".to_string(), base);

        let outcome = normalize(&project, &["combined".to_string()], &FixedLoader).unwrap();
        let combined = outcome.tables.get("combined").unwrap();
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn entity_sourced_from_another_entity_inherits_its_rows() {
        let mut project = Project::default();
        project
            .entities
            .insert("base".to_string(), fixed(&["name"], vec![vec![serde_json::json!("a")]]));

        let derived = EntityConfig {
            entity_type: EntityType::Entity,
            source: Some("base".to_string()),
            columns: vec!["name".into()],
            ..Default::default()
        };
        project.entities.insert("derived".to_string(), derived);

        let outcome = normalize(&project, &["derived".to_string()], &FixedLoader).unwrap();
        let derived_table = outcome.tables.get("derived").unwrap();
        assert_eq!(derived_table.len(), 1);
        assert_eq!(derived_table.get(0, "name"), crate::value::Value::from("a"));
    }
}
