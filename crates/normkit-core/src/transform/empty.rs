//! Drop-empty-rows (spec §4.2.3).

use crate::project::DropEmptyRowsConfig;
use crate::spec::base::{Report, SpecificationIssue};
use crate::table::Table;
use crate::value::Value;

pub fn drop_empty_rows(
    table: &Table,
    entity_name: &str,
    cfg: &DropEmptyRowsConfig,
    treat_empty_strings_as_na: bool,
    report: &mut Report,
) -> Table {
    match cfg {
        DropEmptyRowsConfig::Flag(false) => table.clone(),
        DropEmptyRowsConfig::Flag(true) => {
            drop_all_empty(table, table.columns(), treat_empty_strings_as_na)
        }
        DropEmptyRowsConfig::Columns(columns) => {
            if columns.is_empty() {
                return table.clone();
            }
            let missing: Vec<String> = columns
                .iter()
                .filter(|c| !table.has_column(c))
                .cloned()
                .collect();
            if !missing.is_empty() {
                report.add_warning(
                    SpecificationIssue::warning(format!(
                        "drop_empty_rows subset columns missing, skipping: {}",
                        missing.join(", ")
                    ))
                    .with_entity(entity_name)
                    .with_field("drop_empty_rows"),
                );
                return table.clone();
            }
            drop_all_empty(table, columns, treat_empty_strings_as_na)
        }
        DropEmptyRowsConfig::PerColumn(map) => {
            let missing: Vec<String> = map
                .keys()
                .filter(|c| !table.has_column(c))
                .cloned()
                .collect();
            if !missing.is_empty() {
                report.add_warning(
                    SpecificationIssue::warning(format!(
                        "drop_empty_rows columns missing, skipping: {}",
                        missing.join(", ")
                    ))
                    .with_entity(entity_name)
                    .with_field("drop_empty_rows"),
                );
                return table.clone();
            }
            let empty_values: std::collections::HashMap<String, Vec<Value>> = map
                .iter()
                .map(|(k, values)| (k.clone(), values.iter().map(Value::from_json).collect()))
                .collect();
            let subset: Vec<String> = map.keys().cloned().collect();
            let mut out = Table::new(table.columns().to_vec());
            for row in table.rows() {
                let all_empty = subset.iter().all(|c| {
                    let v = row.get(c).cloned().unwrap_or(Value::Null);
                    is_treated_as_na(&v, empty_values.get(c), treat_empty_strings_as_na)
                });
                if !all_empty {
                    out.push_row(row.clone());
                }
            }
            out
        }
    }
}

fn drop_all_empty(table: &Table, subset: &[String], treat_empty_strings_as_na: bool) -> Table {
    let mut out = Table::new(table.columns().to_vec());
    for row in table.rows() {
        let all_empty = subset.iter().all(|c| {
            let v = row.get(c).cloned().unwrap_or(Value::Null);
            is_treated_as_na(&v, None, treat_empty_strings_as_na)
        });
        if !all_empty {
            out.push_row(row.clone());
        }
    }
    out
}

fn is_treated_as_na(
    value: &Value,
    extra_empty_values: Option<&Vec<Value>>,
    treat_empty_strings_as_na: bool,
) -> bool {
    if value.is_null() {
        return true;
    }
    if treat_empty_strings_as_na && value.is_empty_string() {
        return true;
    }
    if let Some(values) = extra_empty_values {
        if values.iter().any(|v| v == value) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;
    use indexmap::IndexMap;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<IndexMap<_, _>>()
    }

    #[test]
    fn drops_rows_that_are_entirely_empty() {
        let mut t = Table::new(vec!["a".into(), "b".into()]);
        t.push_row(row(&[("a", Value::Null), ("b", Value::Null)]));
        t.push_row(row(&[("a", Value::Int(1)), ("b", Value::Null)]));
        let mut report = Report::default();
        let out = drop_empty_rows(&t, "e", &DropEmptyRowsConfig::Flag(true), true, &mut report);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn treats_empty_string_as_na_when_enabled() {
        let mut t = Table::new(vec!["a".into()]);
        t.push_row(row(&[("a", Value::from(""))]));
        let mut report = Report::default();
        let out = drop_empty_rows(&t, "e", &DropEmptyRowsConfig::Flag(true), true, &mut report);
        assert_eq!(out.len(), 0);
    }

    #[test]
    fn per_column_empty_values_are_treated_as_na() {
        let mut t = Table::new(vec!["status".into()]);
        t.push_row(row(&[("status", Value::from("n/a"))]));
        t.push_row(row(&[("status", Value::from("ok"))]));
        let mut map = indexmap::IndexMap::new();
        map.insert("status".to_string(), vec![serde_json::json!("n/a")]);
        let mut report = Report::default();
        let out = drop_empty_rows(&t, "e", &DropEmptyRowsConfig::PerColumn(map), true, &mut report);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0, "status"), Value::from("ok"));
    }

    #[test]
    fn missing_columns_warn_and_return_unchanged() {
        let t = Table::new(vec!["a".into()]);
        let mut report = Report::default();
        let cfg = DropEmptyRowsConfig::Columns(vec!["missing".into()]);
        let out = drop_empty_rows(&t, "e", &cfg, true, &mut report);
        assert!(report.has_warnings());
        assert_eq!(out.len(), 0);
    }
}
