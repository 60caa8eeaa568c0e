//! Column subsetting with surrogate-id assignment (spec §4.2.1).

use indexmap::IndexMap;

use crate::project::EntityConfig;
use crate::table::{Row, Table};
use crate::value::Value;

/// Produce a new table containing `keys ∪ columns ∪ fk_local_keys ∪
/// extra_columns ∪ unnest.id_vars`, in that order, with extra_columns
/// broadcast as constants and a fresh `1..N` surrogate id column.
/// Missing source columns are tolerated and simply absent from the output.
pub fn subset_with_surrogate_id(source: &Table, cfg: &EntityConfig) -> Table {
    let mut wanted: Vec<String> = Vec::new();
    let mut push = |name: &str, wanted: &mut Vec<String>| {
        if !wanted.iter().any(|c| c == name) {
            wanted.push(name.to_string());
        }
    };
    for k in &cfg.keys {
        push(k, &mut wanted);
    }
    for c in &cfg.columns {
        push(c, &mut wanted);
    }
    for c in cfg.fk_columns() {
        push(&c, &mut wanted);
    }
    for c in cfg.extra_columns.keys() {
        push(c, &mut wanted);
    }
    if let Some(u) = &cfg.unnest {
        for c in &u.id_vars {
            push(c, &mut wanted);
        }
    }

    let from_source: Vec<String> = wanted
        .iter()
        .filter(|c| source.has_column(c))
        .cloned()
        .collect();
    let extras: Vec<(String, Value)> = cfg
        .extra_columns
        .iter()
        .map(|(k, v)| (k.clone(), Value::from_json(v)))
        .collect();

    let mut columns = vec![cfg.system_id.clone()];
    for c in &from_source {
        if *c != cfg.system_id {
            columns.push(c.clone());
        }
    }
    for (name, _) in &extras {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }

    let mut out = Table::new(columns);
    for (idx, src_row) in source.rows().iter().enumerate() {
        let mut row: Row = IndexMap::new();
        row.insert(cfg.system_id.clone(), Value::Int(idx as i64 + 1));
        for c in &from_source {
            if *c == cfg.system_id {
                continue;
            }
            row.insert(c.clone(), src_row.get(c).cloned().unwrap_or(Value::Null));
        }
        for (name, value) in &extras {
            row.insert(name.clone(), value.clone());
        }
        out.push_row(row);
    }
    out
}

/// Reassign `system_id` to a fresh `1..N` sequence, in row order. Used
/// after unioning several independently-subsetted sub-tables (spec
/// §4.2.3's append step), since each sub-table was numbered from 1 on its
/// own and the surrogate id must stay unique per entity.
pub fn renumber_surrogate_id(table: Table, system_id: &str) -> Table {
    let mut out = Table::new(table.columns().to_vec());
    for (idx, row) in table.rows().iter().enumerate() {
        let mut row = row.clone();
        row.insert(system_id.to_string(), Value::Int(idx as i64 + 1));
        out.push_row(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ExtraColumnsConfig;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn assigns_fresh_surrogate_ids_and_drops_undeclared_columns() {
        let mut src = Table::new(vec!["name".into(), "noise".into()]);
        src.push_row(row(&[("name", Value::from("a")), ("noise", Value::Int(1))]));
        src.push_row(row(&[("name", Value::from("b")), ("noise", Value::Int(2))]));

        let cfg = EntityConfig {
            columns: vec!["name".into()],
            ..Default::default()
        };
        let out = subset_with_surrogate_id(&src, &cfg);
        assert_eq!(out.columns(), &["system_id", "name"]);
        assert_eq!(out.get(0, "system_id"), Value::Int(1));
        assert_eq!(out.get(1, "system_id"), Value::Int(2));
    }

    #[test]
    fn broadcasts_extra_columns_as_constants() {
        let mut src = Table::new(vec!["name".into()]);
        src.push_row(row(&[("name", Value::from("a"))]));
        src.push_row(row(&[("name", Value::from("b"))]));

        let mut cfg = EntityConfig {
            columns: vec!["name".into()],
            ..Default::default()
        };
        cfg.extra_columns
            .insert("kind".to_string(), serde_json::json!("lookup"));
        let out = subset_with_surrogate_id(&src, &cfg);
        assert_eq!(out.get(0, "kind"), Value::from("lookup"));
        assert_eq!(out.get(1, "kind"), Value::from("lookup"));
    }

    #[test]
    fn tolerates_missing_source_columns() {
        let src = Table::new(vec!["name".into()]);
        let cfg = EntityConfig {
            columns: vec!["name".into(), "absent".into()],
            ..Default::default()
        };
        let out = subset_with_surrogate_id(&src, &cfg);
        assert_eq!(out.columns(), &["system_id", "name"]);
        let _ = ExtraColumnsConfig::Empty;
    }

    #[test]
    fn renumber_surrogate_id_reassigns_sequentially() {
        let mut t = Table::new(vec!["system_id".into(), "name".into()]);
        t.push_row(row(&[("system_id", Value::Int(1)), ("name", Value::from("a"))]));
        t.push_row(row(&[("system_id", Value::Int(1)), ("name", Value::from("b"))]));
        let out = renumber_surrogate_id(t, "system_id");
        assert_eq!(out.get(0, "system_id"), Value::Int(1));
        assert_eq!(out.get(1, "system_id"), Value::Int(2));
    }
}
