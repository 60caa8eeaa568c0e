//! Entity dependency graph: acyclicity check and rendering support for the
//! `graph` CLI subcommand. The runtime scheduler (`schedule`) does not walk
//! this graph directly — it re-derives readiness from `full_depends_on` on
//! every pass, since the deferred-linking loop can make an entity "ready"
//! more than once. This graph exists for pre-run validation and visualization.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{NormError, Result};
use crate::project::Project;

/// A directed graph of entity dependencies. Edges point from a dependent
/// entity to the entity it depends on (child -> parent), mirroring
/// `EntityConfig::full_depends_on`.
pub struct DependencyGraph {
    pub graph: DiGraph<String, ()>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn from_project(project: &Project) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for name in project.entity_names() {
            let idx = graph.add_node(name.clone());
            node_indices.insert(name, idx);
        }

        for name in project.entity_names() {
            let Ok(cfg) = project.get_entity(&name) else {
                continue;
            };
            let Some(&from_idx) = node_indices.get(&name) else {
                continue;
            };
            for dep in cfg.full_depends_on() {
                if let Some(&to_idx) = node_indices.get(&dep) {
                    graph.add_edge(from_idx, to_idx, ());
                }
            }
        }

        Self { graph, node_indices }
    }

    pub fn entity_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.node_indices.get(name).copied()
    }

    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Parents-before-children build order for every entity in the graph.
    pub fn build_order(&self) -> Result<Vec<String>> {
        match toposort(&self.graph, None) {
            Ok(sorted) => Ok(sorted
                .into_iter()
                .rev()
                .map(|idx| self.entity_name(idx).to_string())
                .collect()),
            Err(cycle_node) => Err(NormError::CircularDependency {
                cycle: self.entity_name(cycle_node.node_id()).to_string(),
            }),
        }
    }

    /// A Graphviz `dot` rendering for the `graph` CLI subcommand.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph normkit {\n");
        for idx in self.graph.node_indices() {
            out.push_str(&format!("  \"{}\";\n", self.entity_name(idx)));
        }
        for edge in self.graph.raw_edges() {
            out.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                self.entity_name(edge.source()),
                self.entity_name(edge.target())
            ));
        }
        out.push_str("}\n");
        out
    }
}
