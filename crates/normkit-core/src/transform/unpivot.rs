//! Unpivot / melt (spec §4.2.4).

use crate::error::{NormError, Result};
use crate::project::UnnestConfig;
use crate::table::{Row, Table};

pub enum UnpivotOutcome {
    Done(Table),
    /// `value_vars` are not all present yet; the caller should retry once
    /// more columns exist (after a foreign-key link, typically).
    Deferred(Table),
}

pub fn unpivot(table: &Table, entity_name: &str, cfg: &UnnestConfig) -> Result<UnpivotOutcome> {
    if table.has_column(&cfg.value_name) {
        return Ok(UnpivotOutcome::Done(table.clone()));
    }

    let missing_id_vars: Vec<String> = cfg
        .id_vars
        .iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();
    if !missing_id_vars.is_empty() {
        return Err(NormError::UnnestMissingIdVar {
            entity: entity_name.to_string(),
            missing: missing_id_vars.join(", "),
        });
    }

    let missing_value_vars: Vec<String> = cfg
        .value_vars
        .iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();
    if !missing_value_vars.is_empty() {
        tracing::info!(
            entity = entity_name,
            missing = missing_value_vars.join(", ").as_str(),
            "unnest value_vars not yet present, deferring"
        );
        return Ok(UnpivotOutcome::Deferred(table.clone()));
    }

    // Every column that isn't being melted rides through unchanged —
    // not just `id_vars`, so a surrogate `system_id` or an already-linked
    // foreign key survives the melt.
    let carried: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| !cfg.value_vars.contains(c))
        .cloned()
        .collect();
    let mut out_columns = carried.clone();
    out_columns.push(cfg.var_name.clone());
    out_columns.push(cfg.value_name.clone());
    let mut out = Table::new(out_columns);

    for row in table.rows() {
        for value_var in &cfg.value_vars {
            let mut new_row: Row = Row::new();
            for col in &carried {
                new_row.insert(col.clone(), row.get(col).cloned().unwrap_or_default());
            }
            new_row.insert(cfg.var_name.clone(), value_var.clone().into());
            new_row.insert(
                cfg.value_name.clone(),
                row.get(value_var).cloned().unwrap_or_default(),
            );
            out.push_row(new_row);
        }
    }
    Ok(UnpivotOutcome::Done(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;
    use crate::value::Value;
    use indexmap::IndexMap;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<IndexMap<_, _>>()
    }

    fn cfg() -> UnnestConfig {
        UnnestConfig {
            id_vars: vec!["site_id".into()],
            value_vars: vec!["Ort".into(), "Kreis".into(), "Land".into()],
            var_name: "type".into(),
            value_name: "name".into(),
        }
    }

    #[test]
    fn melts_n_rows_into_n_times_k_rows() {
        let mut t = Table::new(vec!["site_id".into(), "Ort".into(), "Kreis".into(), "Land".into()]);
        t.push_row(row(&[
            ("site_id", Value::Int(1)),
            ("Ort", Value::from("a")),
            ("Kreis", Value::from("b")),
            ("Land", Value::from("c")),
        ]));
        let outcome = unpivot(&t, "L", &cfg()).unwrap();
        match outcome {
            UnpivotOutcome::Done(out) => {
                assert_eq!(out.len(), 3);
                assert_eq!(out.columns(), &["site_id", "type", "name"]);
            }
            UnpivotOutcome::Deferred(_) => panic!("expected Done"),
        }
    }

    #[test]
    fn defers_when_value_vars_absent() {
        let mut t = Table::new(vec!["site_id".into()]);
        t.push_row(row(&[("site_id", Value::Int(1))]));
        let outcome = unpivot(&t, "L", &cfg()).unwrap();
        assert!(matches!(outcome, UnpivotOutcome::Deferred(_)));
    }

    #[test]
    fn already_melted_table_is_returned_unchanged() {
        let mut t = Table::new(vec!["site_id".into(), "type".into(), "name".into()]);
        t.push_row(row(&[
            ("site_id", Value::Int(1)),
            ("type", Value::from("Ort")),
            ("name", Value::from("a")),
        ]));
        let outcome = unpivot(&t, "L", &cfg()).unwrap();
        match outcome {
            UnpivotOutcome::Done(out) => assert_eq!(out.len(), 1),
            UnpivotOutcome::Deferred(_) => panic!("expected Done"),
        }
    }

    #[test]
    fn missing_id_var_is_hard_error() {
        let t = Table::new(vec!["Ort".into(), "Kreis".into(), "Land".into()]);
        let err = unpivot(&t, "L", &cfg()).unwrap_err();
        assert!(matches!(err, NormError::UnnestMissingIdVar { .. }));
    }
}
