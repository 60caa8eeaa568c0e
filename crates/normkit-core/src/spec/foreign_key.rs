//! Foreign-key well-formedness (spec §4.3.2, config-level checks).
//!
//! Local/remote key-count matching is centralized here rather than
//! duplicated inside the resolver: the resolver trusts a project that
//! already passed this specification.

use crate::project::{ForeignKeyConfig, JoinType, Project};
use crate::spec::base::{Report, SpecificationIssue};

pub fn validate_foreign_key(
    local_entity: &str,
    fk: &ForeignKeyConfig,
    project: &Project,
    report: &mut Report,
) {
    if !project.has_entity(&fk.remote_entity) {
        report.add_error(
            SpecificationIssue::error(format!(
                "foreign key references unknown entity '{}'",
                fk.remote_entity
            ))
            .with_entity(local_entity)
            .with_field("foreign_keys"),
        );
        return;
    }

    if fk.how == JoinType::Cross {
        if !fk.local_keys.is_empty() || !fk.remote_keys.is_empty() {
            report.add_error(
                SpecificationIssue::error("cross join must not declare local_keys or remote_keys")
                    .with_entity(local_entity)
                    .with_field("foreign_keys"),
            );
        }
    } else if fk.local_keys.is_empty() || fk.local_keys.len() != fk.remote_keys.len() {
        report.add_error(
            SpecificationIssue::error(format!(
                "local_keys ({}) and remote_keys ({}) must be non-empty and the same length",
                fk.local_keys.len(),
                fk.remote_keys.len()
            ))
            .with_entity(local_entity)
            .with_field("foreign_keys"),
        );
    }

    if let Ok(remote_cfg) = project.get_entity(&fk.remote_entity) {
        if remote_cfg.public_id.is_none() {
            report.add_error(
                SpecificationIssue::error(format!(
                    "remote entity '{}' has no public_id to link against",
                    fk.remote_entity
                ))
                .with_entity(local_entity)
                .with_field("foreign_keys"),
            );
        }
    }

    if let Some(min_rate) = fk.constraints.min_match_rate {
        if !(0.0..=1.0).contains(&min_rate) {
            report.add_warning(
                SpecificationIssue::warning(format!(
                    "min_match_rate={min_rate} is outside the meaningful [0, 1] range"
                ))
                .with_entity(local_entity)
                .with_field("foreign_keys.constraints"),
            );
        }
    }
}
