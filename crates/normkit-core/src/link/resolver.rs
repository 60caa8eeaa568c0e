//! Foreign-key resolver: validate, then execute, one FK linkage; enforce
//! constraints (spec §4.3).

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::{NormError, Result};
use crate::project::{Cardinality, EntityConfig, ForeignKeyConfig, JoinType};
use crate::spec::base::{Report, SpecificationIssue};
use crate::table::{Row, Table};
use crate::value::Value;

pub enum LinkOutcome {
    Linked(Table),
    /// The FK cannot be attempted yet; the caller must retry after more
    /// columns exist (typically after a pending unnest completes).
    Deferred(Table),
}

const INDICATOR_BOTH: u8 = 0;
const INDICATOR_LEFT_ONLY: u8 = 1;
const INDICATOR_RIGHT_ONLY: u8 = 2;

/// Attempt to link `local` (belonging to `local_entity`, described by
/// `local_cfg`) to `remote` (described by `remote_cfg`) via `fk`.
pub fn link_foreign_key(
    local_entity: &str,
    local: &Table,
    local_cfg: &EntityConfig,
    fk: &ForeignKeyConfig,
    remote: &Table,
    remote_cfg: &EntityConfig,
    report: &mut Report,
) -> Result<LinkOutcome> {
    let remote_public_id = match &remote_cfg.public_id {
        Some(p) => p.clone(),
        None => {
            return Err(NormError::MissingRequiredField {
                entity: fk.remote_entity.clone(),
                field: "public_id".to_string(),
            })
        }
    };

    if fk.has_foreign_key_link(&remote_public_id, local.columns()) {
        return Ok(LinkOutcome::Linked(local.clone()));
    }

    match pre_merge_validate(local_entity, local, local_cfg, fk, remote, remote_cfg)? {
        PreMergeStatus::Ready => {}
        PreMergeStatus::Deferred => return Ok(LinkOutcome::Deferred(local.clone())),
    }

    let merged = merge(local_entity, local, fk, remote, remote_cfg, &remote_public_id, report)?;
    Ok(LinkOutcome::Linked(merged))
}

enum PreMergeStatus {
    Ready,
    Deferred,
}

fn pre_merge_validate(
    local_entity: &str,
    local: &Table,
    local_cfg: &EntityConfig,
    fk: &ForeignKeyConfig,
    remote: &Table,
    remote_cfg: &EntityConfig,
) -> Result<PreMergeStatus> {
    if fk.how == JoinType::Cross {
        if !fk.local_keys.is_empty() || !fk.remote_keys.is_empty() {
            return Err(NormError::InvalidForeignKey {
                entity: local_entity.to_string(),
                remote_entity: fk.remote_entity.clone(),
                reason: "cross join must declare no local_keys or remote_keys".to_string(),
            });
        }
    } else {
        if fk.local_keys.is_empty()
            || fk.local_keys.len() != fk.remote_keys.len()
        {
            return Err(NormError::InvalidForeignKey {
                entity: local_entity.to_string(),
                remote_entity: fk.remote_entity.clone(),
                reason: format!(
                    "local_keys ({}) and remote_keys ({}) must be non-empty and the same length",
                    fk.local_keys.len(),
                    fk.remote_keys.len()
                ),
            });
        }
        let universe: HashSet<String> = local_cfg
            .keys_columns_and_fks()
            .into_iter()
            .chain(local_cfg.unnest_columns())
            .collect();
        let unreachable: Vec<String> = fk
            .local_keys
            .iter()
            .filter(|k| !universe.contains(*k))
            .cloned()
            .collect();
        if !unreachable.is_empty() {
            return Err(NormError::FKLocalKeysMissing {
                entity: local_entity.to_string(),
                remote_entity: fk.remote_entity.clone(),
                missing: unreachable.join(", "),
            });
        }
    }

    if remote_cfg.system_id.is_empty() || remote_cfg.public_id.is_none() {
        return Err(NormError::MissingRequiredField {
            entity: fk.remote_entity.clone(),
            field: "system_id/public_id".to_string(),
        });
    }

    if fk.how != JoinType::Cross {
        let unnest_cols = local_cfg.unnest_columns();
        let missing_in_local: Vec<String> = fk
            .local_keys
            .iter()
            .filter(|k| !local.has_column(k))
            .cloned()
            .collect();
        if !missing_in_local.is_empty() {
            if missing_in_local.iter().all(|k| unnest_cols.contains(k)) {
                return Ok(PreMergeStatus::Deferred);
            }
            return Err(NormError::FKLocalKeysMissingInData {
                entity: local_entity.to_string(),
                remote_entity: fk.remote_entity.clone(),
                missing: missing_in_local.join(", "),
            });
        }

        let missing_in_remote: Vec<String> = fk
            .remote_keys
            .iter()
            .filter(|k| !remote.has_column(k))
            .cloned()
            .collect();
        if !missing_in_remote.is_empty() {
            return Err(NormError::FKRemoteKeysMissing {
                entity: local_entity.to_string(),
                remote_entity: fk.remote_entity.clone(),
                missing: missing_in_remote.join(", "),
            });
        }

        if !fk.constraints.allow_null_keys {
            if has_null(local, &fk.local_keys) {
                return Err(NormError::ConstraintViolation {
                    child: local_entity.to_string(),
                    parent: fk.remote_entity.clone(),
                    reason: "null value(s) present in local_keys but allow_null_keys=false"
                        .to_string(),
                });
            }
            if has_null(remote, &fk.remote_keys) {
                return Err(NormError::ConstraintViolation {
                    child: local_entity.to_string(),
                    parent: fk.remote_entity.clone(),
                    reason: "null value(s) present in remote_keys but allow_null_keys=false"
                        .to_string(),
                });
            }
        }

        if fk.constraints.require_unique_left && has_duplicate_keys(local, &fk.local_keys) {
            return Err(NormError::ConstraintViolation {
                child: local_entity.to_string(),
                parent: fk.remote_entity.clone(),
                reason: "duplicate left key(s) but require_unique_left=true".to_string(),
            });
        }
        if fk.constraints.require_unique_right && has_duplicate_keys(remote, &fk.remote_keys) {
            return Err(NormError::ConstraintViolation {
                child: local_entity.to_string(),
                parent: fk.remote_entity.clone(),
                reason: "duplicate right key(s) but require_unique_right=true".to_string(),
            });
        }
    }

    Ok(PreMergeStatus::Ready)
}

fn has_null(table: &Table, columns: &[String]) -> bool {
    table
        .rows()
        .iter()
        .any(|r| columns.iter().any(|c| r.get(c).map(|v| v.is_null()).unwrap_or(true)))
}

fn has_duplicate_keys(table: &Table, columns: &[String]) -> bool {
    let mut seen = HashSet::new();
    for row in table.rows() {
        let key = key_tuple(row, columns);
        if !seen.insert(key) {
            return true;
        }
    }
    false
}

fn key_tuple(row: &Row, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| row.get(c).map(|v| v.to_unique_key()).unwrap_or_default())
        .collect()
}

fn merge(
    local_entity: &str,
    local: &Table,
    fk: &ForeignKeyConfig,
    remote: &Table,
    remote_cfg: &EntityConfig,
    remote_public_id: &str,
    report: &mut Report,
) -> Result<Table> {
    let resolved_extra = fk.extra_columns.resolved();
    let mut rename_map: IndexMap<String, String> = IndexMap::new();
    rename_map.insert(remote_cfg.system_id.clone(), remote_public_id.to_string());
    for (source, target) in &resolved_extra {
        rename_map.insert(source.clone(), target.clone());
    }
    let non_identity_targets: HashSet<String> = rename_map
        .iter()
        .filter(|(s, t)| s != t)
        .map(|(_, t)| t.clone())
        .collect();

    let mut candidates: Vec<String> = Vec::new();
    for k in &fk.remote_keys {
        if !candidates.contains(k) {
            candidates.push(k.clone());
        }
    }
    for source in resolved_extra.keys() {
        if !candidates.contains(source) {
            candidates.push(source.clone());
        }
    }

    let mut missing = Vec::new();
    let mut valid: Vec<String> = Vec::new();
    for c in &candidates {
        if remote.has_column(c) {
            valid.push(c.clone());
        } else {
            missing.push(c.clone());
        }
    }
    if !missing.is_empty() {
        report.add_warning(
            SpecificationIssue::warning(format!(
                "dropping unavailable remote columns from foreign key projection: {}",
                missing.join(", ")
            ))
            .with_entity(local_entity)
            .with_field("foreign_keys"),
        );
    }

    // Duplicate-column avoidance: a candidate whose own name equals a
    // non-identity rename target would collide with the column the rename
    // is about to synthesize, unless it is itself the identity source for
    // that same target.
    let filtered: Vec<String> = valid
        .into_iter()
        .filter(|c| {
            if non_identity_targets.contains(c) {
                rename_map.get(c).map(|t| t == c).unwrap_or(false)
            } else {
                true
            }
        })
        .collect();

    let mut project_cols = vec![remote_cfg.system_id.clone()];
    for c in filtered {
        if c != remote_cfg.system_id && !project_cols.contains(&c) {
            project_cols.push(c);
        }
    }

    let slim_names: Vec<String> = project_cols
        .iter()
        .map(|c| rename_map.get(c).cloned().unwrap_or_else(|| c.clone()))
        .collect();

    let local_cols_set: HashSet<&str> = local.columns().iter().map(|s| s.as_str()).collect();
    let final_names: Vec<String> = slim_names
        .iter()
        .map(|name| {
            if local_cols_set.contains(name.as_str()) && !fk.local_keys.contains(name) {
                format!("{name}_{}", fk.remote_entity)
            } else {
                name.clone()
            }
        })
        .collect();

    let mut out_columns = local.columns().to_vec();
    for n in &final_names {
        if !out_columns.contains(n) {
            out_columns.push(n.clone());
        }
    }
    let mut out = Table::new(out_columns);

    let mut both = 0usize;
    let mut left_only = 0usize;
    let mut right_only = 0usize;

    let build_row = |local_row: Option<&Row>, remote_row: Option<&Row>| -> Row {
        let mut row = Row::new();
        for c in local.columns() {
            let v = local_row
                .and_then(|r| r.get(c))
                .cloned()
                .unwrap_or(Value::Null);
            row.insert(c.clone(), v);
        }
        for (pc, fname) in project_cols.iter().zip(final_names.iter()) {
            let v = remote_row
                .and_then(|r| r.get(pc))
                .cloned()
                .unwrap_or(Value::Null);
            row.insert(fname.clone(), v);
        }
        row
    };

    match fk.how {
        JoinType::Cross => {
            for lrow in local.rows() {
                for rrow in remote.rows() {
                    out.push_row(build_row(Some(lrow), Some(rrow)));
                    both += 1;
                }
            }
        }
        JoinType::Inner | JoinType::Left => {
            let remote_index = build_index(remote, &fk.remote_keys);
            for lrow in local.rows() {
                let key = key_tuple(lrow, &fk.local_keys);
                match remote_index.get(&key) {
                    Some(matches) if !matches.is_empty() => {
                        for &ridx in matches {
                            out.push_row(build_row(Some(lrow), Some(&remote.rows()[ridx])));
                            both += 1;
                        }
                    }
                    _ => {
                        if fk.how == JoinType::Left {
                            out.push_row(build_row(Some(lrow), None));
                            left_only += 1;
                        }
                    }
                }
            }
        }
        JoinType::Right => {
            let local_index = build_index(local, &fk.local_keys);
            for rrow in remote.rows() {
                let key = key_tuple(rrow, &fk.remote_keys);
                match local_index.get(&key) {
                    Some(matches) if !matches.is_empty() => {
                        for &lidx in matches {
                            out.push_row(build_row(Some(&local.rows()[lidx]), Some(rrow)));
                            both += 1;
                        }
                    }
                    _ => {
                        out.push_row(build_row(None, Some(rrow)));
                        right_only += 1;
                    }
                }
            }
        }
        JoinType::Outer => {
            let remote_index = build_index(remote, &fk.remote_keys);
            let mut matched_remote: HashSet<usize> = HashSet::new();
            for lrow in local.rows() {
                let key = key_tuple(lrow, &fk.local_keys);
                match remote_index.get(&key) {
                    Some(matches) if !matches.is_empty() => {
                        for &ridx in matches {
                            out.push_row(build_row(Some(lrow), Some(&remote.rows()[ridx])));
                            matched_remote.insert(ridx);
                            both += 1;
                        }
                    }
                    _ => {
                        out.push_row(build_row(Some(lrow), None));
                        left_only += 1;
                    }
                }
            }
            for (ridx, rrow) in remote.rows().iter().enumerate() {
                if !matched_remote.contains(&ridx) {
                    out.push_row(build_row(None, Some(rrow)));
                    right_only += 1;
                }
            }
        }
    }

    let before = local.len();
    let after = out.len();
    validate_row_count(local_entity, fk, before, after)?;
    validate_match_quality(local_entity, fk, before, both, left_only, right_only)?;
    let _ = (INDICATOR_BOTH, INDICATOR_LEFT_ONLY, INDICATOR_RIGHT_ONLY);

    if fk.drop_remote_id {
        if let Some(pos) = project_cols.iter().position(|c| *c == remote_cfg.system_id) {
            out.drop_column(&final_names[pos]);
        }
    }

    Ok(out)
}

fn build_index(table: &Table, columns: &[String]) -> HashMap<Vec<String>, Vec<usize>> {
    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (idx, row) in table.rows().iter().enumerate() {
        index.entry(key_tuple(row, columns)).or_default().push(idx);
    }
    index
}

fn validate_row_count(local_entity: &str, fk: &ForeignKeyConfig, before: usize, after: usize) -> Result<()> {
    let c = &fk.constraints;
    let violate = |reason: String| NormError::ConstraintViolation {
        child: local_entity.to_string(),
        parent: fk.remote_entity.clone(),
        reason,
    };

    if let Some(card) = c.cardinality {
        match card {
            Cardinality::OneToOne if after != before => {
                return Err(violate(format!(
                    "row count changed from {before} to {after} but cardinality=one_to_one"
                )))
            }
            Cardinality::ManyToOne if after > before => {
                return Err(violate(format!(
                    "row count increased from {before} to {after} but cardinality=many_to_one"
                )))
            }
            Cardinality::OneToMany if after < before => {
                return Err(violate(format!(
                    "row count decreased from {before} to {after} but cardinality=one_to_many"
                )))
            }
            _ => {}
        }
    }

    if let Some(k) = c.max_row_increase_abs {
        if (after as i64 - before as i64) > k {
            return Err(violate(format!(
                "row count increased by {} which exceeds max_row_increase_abs={k}",
                after as i64 - before as i64
            )));
        }
    }
    if let Some(p) = c.max_row_increase_pct {
        if before > 0 {
            let pct = 100.0 * (after as f64 - before as f64) / before as f64;
            if pct > p {
                return Err(violate(format!(
                    "row count increased by {pct:.2}% which exceeds max_row_increase_pct={p}"
                )));
            }
        }
    }
    if c.allow_row_decrease == Some(false) && after < before {
        return Err(violate(format!(
            "row count decreased from {before} to {after} but allow_row_decrease=false"
        )));
    }
    Ok(())
}

fn validate_match_quality(
    local_entity: &str,
    fk: &ForeignKeyConfig,
    local_before: usize,
    both: usize,
    left_only: usize,
    right_only: usize,
) -> Result<()> {
    let c = &fk.constraints;
    let violate = |reason: String| NormError::ConstraintViolation {
        child: local_entity.to_string(),
        parent: fk.remote_entity.clone(),
        reason,
    };

    if (c.allow_unmatched_left == Some(false) || c.require_all_left_matched == Some(true))
        && left_only > 0
    {
        return Err(violate(format!(
            "{left_only} local row(s) unmatched but unmatched left rows are not allowed"
        )));
    }

    let right_applicable = matches!(fk.how, JoinType::Right | JoinType::Outer);
    if right_applicable
        && (c.allow_unmatched_right == Some(false) || c.require_all_right_matched == Some(true))
        && right_only > 0
    {
        return Err(violate(format!(
            "{right_only} remote row(s) unmatched but unmatched right rows are not allowed"
        )));
    }

    if let Some(m) = c.min_match_rate {
        let rate = if local_before == 0 {
            0.0
        } else {
            both as f64 / local_before as f64
        };
        if rate < m {
            return Err(violate(format!(
                "match rate {rate:.3} is below min_match_rate={m}"
            )));
        }
    }
    Ok(())
}
