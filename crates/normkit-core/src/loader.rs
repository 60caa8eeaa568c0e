//! Raw data loading (spec §6.2). Only `type = fixed` is implemented; `sql`
//! loading is a Non-goal of the entity-shape validation layer but the trait
//! is the seam a host application wires a real data-source driver into.

use crate::error::{NormError, Result};
use crate::project::EntityConfig;
use crate::table::{Row, Table};
use crate::value::Value;

pub trait Loader {
    fn load(&self, entity_name: &str, cfg: &EntityConfig) -> Result<Table>;
}

/// Loads `type = fixed` entities from their inline `values`/`columns`.
#[derive(Debug, Default)]
pub struct FixedLoader;

impl Loader for FixedLoader {
    fn load(&self, entity_name: &str, cfg: &EntityConfig) -> Result<Table> {
        let columns = cfg.columns.clone();
        let values = cfg.values.as_ref().ok_or_else(|| NormError::MissingRequiredField {
            entity: entity_name.to_string(),
            field: "values".to_string(),
        })?;

        let mut table = Table::new(columns.clone());
        for (row_idx, record) in values.iter().enumerate() {
            if record.len() != columns.len() {
                return Err(NormError::RowShapeMismatch {
                    entity: entity_name.to_string(),
                    reason: format!(
                        "row {row_idx} has {} value(s) but {} column(s) are declared",
                        record.len(),
                        columns.len()
                    ),
                });
            }
            let mut row: Row = Row::new();
            for (col, raw) in columns.iter().zip(record.iter()) {
                row.insert(col.clone(), Value::from_json(raw));
            }
            table.push_row(row);
        }
        Ok(table)
    }
}
