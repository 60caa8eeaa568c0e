//! Per-entity config-shape validation (spec §4.1, §6.2).

use crate::error::{NormError, Result};
use crate::project::{EntityConfig, EntityType, Project};
use crate::spec::base::{Report, SpecificationIssue};
use crate::spec::foreign_key::validate_foreign_key;

/// Hard, pre-run structural checks that a document simply cannot proceed
/// with, run once at parse time (spec §7.1's `ConfigurationError` entries
/// `BadFieldType` and `DuplicateSurrogateId`). These fail the whole load
/// rather than accumulate in a `Report`, since there is no sensible
/// partial result to normalize against a document this malformed.
pub fn check_field_shapes(project: &Project) -> Result<()> {
    for (name, cfg) in &project.entities {
        if cfg.columns.contains(&cfg.system_id) || cfg.keys.contains(&cfg.system_id) {
            return Err(NormError::DuplicateSurrogateId {
                entity: name.clone(),
                column: cfg.system_id.clone(),
            });
        }

        if let Some(values) = &cfg.values {
            for row in values {
                for cell in row {
                    if let Some(actual) = non_scalar_type_name(cell) {
                        return Err(NormError::BadFieldType {
                            entity: name.clone(),
                            field: "values".to_string(),
                            expected: "scalar".to_string(),
                            actual: actual.to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// `None` for a scalar (null/bool/number/string) cell, `Some(kind)` for an
/// array or object — the two JSON shapes a row cell can never legally be.
fn non_scalar_type_name(value: &serde_json::Value) -> Option<&'static str> {
    match value {
        serde_json::Value::Array(_) => Some("array"),
        serde_json::Value::Object(_) => Some("object"),
        _ => None,
    }
}

pub fn validate_entity(name: &str, cfg: &EntityConfig, project: &Project, report: &mut Report) {
    match cfg.entity_type {
        EntityType::Fixed => {
            if cfg.values.is_none() && !cfg.has_append() {
                report.add_error(
                    SpecificationIssue::error("fixed entity requires 'values'")
                        .with_entity(name)
                        .with_field("values"),
                );
            }
            if cfg.columns.is_empty() && !cfg.has_append() {
                report.add_error(
                    SpecificationIssue::error("fixed entity requires non-empty 'columns'")
                        .with_entity(name)
                        .with_field("columns"),
                );
            }
        }
        EntityType::Sql => {
            match &cfg.data_source {
                Some(ds) => {
                    if let Err(err) = project.get_data_source(name, ds) {
                        report.add_error(
                            SpecificationIssue::error(err.to_string())
                                .with_entity(name)
                                .with_field("data_source"),
                        );
                    }
                }
                None => {
                    report.add_error(
                        SpecificationIssue::error("sql entity requires 'data_source'")
                            .with_entity(name)
                            .with_field("data_source"),
                    );
                }
            }
            if cfg.query.is_none() {
                report.add_error(
                    SpecificationIssue::error("sql entity requires 'query'")
                        .with_entity(name)
                        .with_field("query"),
                );
            }
        }
        EntityType::Entity => {
            if cfg.source.is_none() && !cfg.has_append() {
                report.add_error(
                    SpecificationIssue::error("entity-derived table requires 'source' or 'append'")
                        .with_entity(name)
                        .with_field("source"),
                );
            }
            if let Some(source) = &cfg.source {
                if !project.has_entity(source) {
                    report.add_error(
                        SpecificationIssue::error(format!("unknown source entity '{source}'"))
                            .with_entity(name)
                            .with_field("source"),
                    );
                }
            }
        }
    }

    if let Some(public_id) = &cfg.public_id {
        if public_id == &cfg.system_id {
            report.add_error(
                SpecificationIssue::error(format!(
                    "public_id and system_id must not be the same column ('{public_id}')"
                ))
                .with_entity(name)
                .with_field("public_id"),
            );
        }
    }

    if let Some(unnest) = &cfg.unnest {
        if unnest.value_vars.is_empty() {
            report.add_error(
                SpecificationIssue::error("unnest requires a non-empty 'value_vars'")
                    .with_entity(name)
                    .with_field("unnest.value_vars"),
            );
        }
        if unnest.var_name == unnest.value_name {
            report.add_error(
                SpecificationIssue::error("unnest var_name and value_name must differ")
                    .with_entity(name)
                    .with_field("unnest"),
            );
        }
        for id_var in &unnest.id_vars {
            if unnest.value_vars.contains(id_var) {
                report.add_error(
                    SpecificationIssue::error(format!(
                        "unnest id_var '{id_var}' also appears in value_vars"
                    ))
                    .with_entity(name)
                    .with_field("unnest"),
                );
            }
        }
    }

    if let Some(materialized) = &cfg.materialized {
        if materialized.enabled && cfg.keys.is_empty() {
            report.add_error(
                SpecificationIssue::error("materialized entity requires non-empty 'keys'")
                    .with_entity(name)
                    .with_field("materialized"),
            );
        }
    }

    for fk in &cfg.foreign_keys {
        validate_foreign_key(name, fk, project, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_entity_without_values_is_an_error() {
        let project = Project::default();
        let cfg = EntityConfig {
            entity_type: EntityType::Fixed,
            columns: vec!["a".into()],
            ..Default::default()
        };
        let mut report = Report::default();
        validate_entity("e", &cfg, &project, &mut report);
        assert!(report.has_errors());
    }

    #[test]
    fn entity_type_requires_known_source() {
        let project = Project::default();
        let cfg = EntityConfig {
            entity_type: EntityType::Entity,
            source: Some("ghost".into()),
            ..Default::default()
        };
        let mut report = Report::default();
        validate_entity("e", &cfg, &project, &mut report);
        assert!(report.has_errors());
    }

    #[test]
    fn public_id_equal_to_system_id_is_an_error() {
        let project = Project::default();
        let cfg = EntityConfig {
            entity_type: EntityType::Fixed,
            values: Some(vec![]),
            columns: vec!["a".into()],
            public_id: Some("system_id".into()),
            ..Default::default()
        };
        let mut report = Report::default();
        validate_entity("e", &cfg, &project, &mut report);
        assert!(report.has_errors());
    }

    #[test]
    fn unknown_data_source_is_reported_via_typed_error_message() {
        let project = Project::default();
        let cfg = EntityConfig {
            entity_type: EntityType::Sql,
            data_source: Some("warehouse".into()),
            query: Some("select 1".into()),
            ..Default::default()
        };
        let mut report = Report::default();
        validate_entity("e", &cfg, &project, &mut report);
        assert!(report
            .errors
            .iter()
            .any(|issue| issue.message.contains("warehouse")));
    }

    #[test]
    fn declaring_system_id_as_a_regular_column_is_a_duplicate_surrogate_id() {
        let mut project = Project::default();
        project.entities.insert(
            "e".to_string(),
            EntityConfig {
                entity_type: EntityType::Fixed,
                columns: vec!["system_id".into(), "name".into()],
                values: Some(vec![]),
                ..Default::default()
            },
        );
        let err = check_field_shapes(&project).unwrap_err();
        assert!(matches!(err, NormError::DuplicateSurrogateId { .. }));
    }

    #[test]
    fn array_valued_cell_is_a_bad_field_type() {
        let mut project = Project::default();
        project.entities.insert(
            "e".to_string(),
            EntityConfig {
                entity_type: EntityType::Fixed,
                columns: vec!["name".into()],
                values: Some(vec![vec![serde_json::json!(["nested", "array"])]]),
                ..Default::default()
            },
        );
        let err = check_field_shapes(&project).unwrap_err();
        assert!(matches!(err, NormError::BadFieldType { .. }));
    }

    #[test]
    fn well_formed_project_passes_field_shape_checks() {
        let mut project = Project::default();
        project.entities.insert(
            "e".to_string(),
            EntityConfig {
                entity_type: EntityType::Fixed,
                columns: vec!["name".into()],
                values: Some(vec![vec![serde_json::json!("x")]]),
                ..Default::default()
            },
        );
        assert!(check_field_shapes(&project).is_ok());
    }
}
