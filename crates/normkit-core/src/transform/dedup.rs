//! Drop-duplicates, optionally guarded by a functional-dependency check
//! (spec §4.2.2).

use std::collections::HashMap;

use crate::error::{NormError, Result};
use crate::project::DropDuplicatesConfig;
use crate::spec::base::{Report, SpecificationIssue};
use crate::table::Table;

const MAX_REPORTED_BAD_KEYS: usize = 5;

pub fn drop_duplicates(
    table: &Table,
    entity_name: &str,
    cfg: &DropDuplicatesConfig,
    report: &mut Report,
) -> Result<Table> {
    match cfg {
        DropDuplicatesConfig::Flag(false) => Ok(table.clone()),
        DropDuplicatesConfig::Flag(true) => Ok(dedup_on(table, table.columns())),
        DropDuplicatesConfig::Columns(columns) => {
            dedup_with_subset(table, entity_name, columns, false, false, report)
        }
        DropDuplicatesConfig::Rich {
            columns,
            check_functional_dependency,
            strict_functional_dependency,
        } => dedup_with_subset(
            table,
            entity_name,
            columns,
            *check_functional_dependency,
            *strict_functional_dependency,
            report,
        ),
    }
}

fn dedup_with_subset(
    table: &Table,
    entity_name: &str,
    subset: &[String],
    fd_check: bool,
    strict_fd: bool,
    report: &mut Report,
) -> Result<Table> {
    let missing: Vec<String> = subset
        .iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        report.add_warning(
            SpecificationIssue::warning(format!(
                "drop_duplicates subset columns missing, skipping: {}",
                missing.join(", ")
            ))
            .with_entity(entity_name)
            .with_field("drop_duplicates"),
        );
        return Ok(table.clone());
    }
    if subset.is_empty() {
        report.add_error(
            SpecificationIssue::error("drop_duplicates subset must not be empty")
                .with_entity(entity_name)
                .with_field("drop_duplicates"),
        );
        return Ok(table.clone());
    }

    if fd_check {
        check_functional_dependency(table, entity_name, subset, strict_fd, report)?;
    }

    Ok(dedup_on(table, subset))
}

fn dedup_on(table: &Table, subset: &[String]) -> Table {
    let mut seen: HashMap<String, ()> = HashMap::new();
    let mut out = Table::new(table.columns().to_vec());
    for row in table.rows() {
        let key = subset
            .iter()
            .map(|c| row.get(c).map(|v| v.to_unique_key()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\u{1}");
        if seen.insert(key, ()).is_none() {
            out.push_row(row.clone());
        }
    }
    out
}

/// Group `table[subset ∪ other_columns].drop_duplicates()` by `subset` and
/// ensure each group has exactly one distinct combination of the remaining
/// columns, matching the detection rule in §4.2.2.
fn check_functional_dependency(
    table: &Table,
    entity_name: &str,
    subset: &[String],
    strict: bool,
    report: &mut Report,
) -> Result<()> {
    let other_columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| !subset.contains(c))
        .cloned()
        .collect();

    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for row in table.rows() {
        let determinant = subset
            .iter()
            .map(|c| row.get(c).map(|v| v.to_unique_key()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\u{1}");
        let dependent = other_columns
            .iter()
            .map(|c| row.get(c).map(|v| v.to_unique_key()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\u{1}");
        let seen = groups.entry(determinant.clone()).or_default();
        if !seen.contains(&dependent) {
            seen.push(dependent);
        }
    }

    let mut bad_keys: Vec<String> = groups
        .into_iter()
        .filter(|(_, combos)| combos.len() > 1)
        .map(|(k, _)| k.replace('\u{1}', ", "))
        .collect();
    bad_keys.sort();

    if bad_keys.is_empty() {
        return Ok(());
    }

    let shown: Vec<&String> = bad_keys.iter().take(MAX_REPORTED_BAD_KEYS).collect();
    let detail = format!(
        "{} determinant value(s) map to more than one combination of {:?}, e.g. {}",
        bad_keys.len(),
        other_columns,
        shown
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    );

    if strict {
        let err = NormError::FunctionalDependencyViolation {
            entity: entity_name.to_string(),
            determinant: subset.join(", "),
            detail: detail.clone(),
        };
        report.add_error(
            SpecificationIssue::error(err.to_string())
                .with_entity(entity_name)
                .with_field("drop_duplicates.check_functional_dependency"),
        );
        return Err(err);
    }

    report.add_warning(
        SpecificationIssue::warning(detail)
            .with_entity(entity_name)
            .with_field("drop_duplicates.check_functional_dependency"),
    );
    Ok(())
}
