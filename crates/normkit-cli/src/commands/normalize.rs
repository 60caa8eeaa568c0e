use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Table as ComfyTable;

use normkit_core::config::load_project;
use normkit_core::loader::FixedLoader;
use normkit_core::orchestrator::normalize as run_normalize;
use normkit_core::Table;

use crate::args::{NormalizeArgs, OutputFormat};

pub fn run(args: &NormalizeArgs) -> Result<()> {
    let project = load_project(Path::new(&args.project)).context("failed to load project document")?;

    let targets: Vec<String> = if args.target.is_empty() {
        project.entity_names()
    } else {
        args.target.clone()
    };

    let outcome = run_normalize(&project, &targets, &FixedLoader).context("normalization run failed")?;

    match args.format {
        OutputFormat::Table => {
            for name in &targets {
                let Some(table) = outcome.tables.get(name) else {
                    continue;
                };
                print_table(name, table);
            }
            if outcome.report.has_warnings() {
                println!("{}", outcome.report.get_report());
            }
        }
        OutputFormat::Json => {
            let mut payload = serde_json::Map::new();
            for name in &targets {
                if let Some(table) = outcome.tables.get(name) {
                    payload.insert(name.clone(), serde_json::to_value(table)?);
                }
            }
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}

fn print_table(name: &str, table: &Table) {
    if table.is_empty() {
        println!("━━━ {} (0 rows) ━━━\n", name);
        return;
    }

    println!("━━━ {} ({} rows) ━━━", name, table.len());

    let columns = table.columns();
    let mut t = ComfyTable::new();
    t.set_header(columns.iter().map(|c| c.as_str()).collect::<Vec<_>>());

    for row in table.rows() {
        let values: Vec<String> = columns
            .iter()
            .map(|col| {
                let s = row.get(col).map(|v| v.to_string()).unwrap_or_default();
                if s.len() > 40 {
                    format!("{}...", &s[..37])
                } else {
                    s
                }
            })
            .collect();
        t.add_row(values);
    }

    println!("{}\n", t);
}
