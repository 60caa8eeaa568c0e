use std::path::Path;

use anyhow::{Context, Result};

use normkit_core::config::load_project;

use crate::args::ExplainArgs;

pub fn run(args: &ExplainArgs) -> Result<()> {
    let project = load_project(Path::new(&args.project)).context("failed to load project document")?;
    let cfg = project
        .get_entity(&args.entity)
        .with_context(|| format!("no entity named '{}' in this project", args.entity))?;

    println!("entity: {}", args.entity);
    println!("type: {:?}", cfg.entity_type);
    if let Some(source) = &cfg.source {
        println!("source: {source}");
    }
    println!("system_id: {}", cfg.system_id);
    if let Some(public_id) = &cfg.public_id {
        println!("public_id: {public_id}");
    }
    if !cfg.keys.is_empty() {
        println!("keys: {}", cfg.keys.join(", "));
    }
    if !cfg.columns.is_empty() {
        println!("columns: {}", cfg.columns.join(", "));
    }

    if let Some(unnest) = &cfg.unnest {
        println!(
            "unnest: {} -> ({}, {}), id_vars = [{}]",
            unnest.value_vars.join(", "),
            unnest.var_name,
            unnest.value_name,
            unnest.id_vars.join(", ")
        );
    }

    for fk in &cfg.foreign_keys {
        println!(
            "foreign key -> {} on ({}) = ({})  how={:?}",
            fk.remote_entity,
            fk.local_keys.join(", "),
            fk.remote_keys.join(", "),
            fk.how
        );
        if !fk.constraints.is_empty() {
            println!("  constraints: {:?}", fk.constraints);
        }
    }

    if cfg.has_append() {
        let sources: Vec<String> = cfg
            .append
            .iter()
            .filter_map(|item| item.source.clone())
            .collect();
        println!("append ({:?}): {}", cfg.append_mode, sources.join(", "));
    }

    let deps = cfg.full_depends_on();
    if !deps.is_empty() {
        println!("depends on: {}", deps.join(", "));
    }

    Ok(())
}
