use std::path::Path;

use anyhow::{Context, Result};

use normkit_core::config::load_project;
use normkit_core::graph::DependencyGraph;

use crate::args::{GraphArgs, GraphFormat};

pub fn run(args: &GraphArgs) -> Result<()> {
    let project = load_project(Path::new(&args.project)).context("failed to load project document")?;
    let graph = DependencyGraph::from_project(&project);

    match args.format {
        GraphFormat::Dot => println!("{}", graph.to_dot()),
        GraphFormat::Json => {
            let order = graph.build_order().context("dependency graph has a cycle")?;
            let edges: Vec<(String, String)> = graph
                .graph
                .raw_edges()
                .iter()
                .map(|e| {
                    (
                        graph.entity_name(e.source()).to_string(),
                        graph.entity_name(e.target()).to_string(),
                    )
                })
                .collect();
            let payload = serde_json::json!({
                "entities": order,
                "edges": edges,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}
