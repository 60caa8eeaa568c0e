//! # Tabular data
//!
//! `Table` is the in-memory representation the whole pipeline passes
//! around: an ordered multiset of rows, each row a mapping from a fixed,
//! ordered column list to typed `Value`s. No DataFrame library appears
//! anywhere in the dependency stack this crate draws from, so the type is
//! hand-rolled on top of `indexmap`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

pub type Row = IndexMap<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Append a column to the declared column order if it isn't already
    /// present. Does not touch existing rows; callers are responsible for
    /// filling the new column in every row.
    pub fn declare_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    pub fn drop_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for row in &mut self.rows {
            row.shift_remove(name);
        }
    }

    /// Concatenate another table's rows onto this one. Columns absent from
    /// either side are padded with `Value::Null`; the resulting column
    /// order is `self.columns` followed by any column unique to `other`.
    pub fn concat(mut self, other: Table) -> Table {
        for col in &other.columns {
            self.declare_column(col);
        }
        for mut row in other.rows {
            let mut full = Row::new();
            for col in &self.columns {
                let v = row.shift_remove(col).unwrap_or(Value::Null);
                full.insert(col.clone(), v);
            }
            self.rows.push(full);
        }
        self
    }

    /// Get the value of `column` in `row_idx`, or `Value::Null` if the row
    /// has no entry for it.
    pub fn get(&self, row_idx: usize, column: &str) -> Value {
        self.rows
            .get(row_idx)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn concat_pads_missing_columns_with_null() {
        let mut a = Table::new(vec!["id".into(), "name".into()]);
        a.push_row(row(&[("id", Value::Int(1)), ("name", Value::from("x"))]));

        let mut b = Table::new(vec!["id".into(), "extra".into()]);
        b.push_row(row(&[("id", Value::Int(2)), ("extra", Value::from("y"))]));

        let merged = a.concat(b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.columns(), &["id", "name", "extra"]);
        assert_eq!(merged.get(0, "extra"), Value::Null);
        assert_eq!(merged.get(1, "name"), Value::Null);
    }

    #[test]
    fn declare_column_is_idempotent() {
        let mut t = Table::new(vec!["a".into()]);
        t.declare_column("a");
        t.declare_column("b");
        assert_eq!(t.columns(), &["a", "b"]);
    }
}
