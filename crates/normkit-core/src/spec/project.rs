//! Whole-project validation: every entity's shape, plus the circular
//! dependency check that spans the whole graph (spec Invariant 6 — cycles
//! are detected over `full_depends_on`, not just `source`).

use std::collections::HashSet;

use crate::project::Project;
use crate::spec::base::{Report, SpecificationIssue};
use crate::spec::entity::validate_entity;

pub fn validate_project(project: &Project) -> Report {
    let mut report = Report::default();

    for (name, cfg) in &project.entities {
        validate_entity(name, cfg, project, &mut report);
    }

    check_acyclic(project, &mut report);

    report
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

fn check_acyclic(project: &Project, report: &mut Report) {
    let mut state: std::collections::HashMap<String, VisitState> = std::collections::HashMap::new();
    let mut reported: HashSet<Vec<String>> = HashSet::new();

    for name in project.entity_names() {
        if !state.contains_key(&name) {
            let mut stack = Vec::new();
            visit(project, &name, &mut state, &mut stack, report, &mut reported);
        }
    }
}

fn visit(
    project: &Project,
    name: &str,
    state: &mut std::collections::HashMap<String, VisitState>,
    stack: &mut Vec<String>,
    report: &mut Report,
    reported: &mut HashSet<Vec<String>>,
) {
    if let Some(pos) = stack.iter().position(|n| n == name) {
        let mut cycle: Vec<String> = stack[pos..].to_vec();
        cycle.push(name.to_string());
        let mut canonical = cycle.clone();
        canonical.sort();
        if reported.insert(canonical) {
            report.add_error(
                SpecificationIssue::error(format!(
                    "circular dependency: {}",
                    cycle.join(" -> ")
                ))
                .with_field("depends_on"),
            );
        }
        return;
    }
    match state.get(name) {
        Some(VisitState::Done) => return,
        Some(VisitState::InProgress) => return,
        None => {}
    }

    stack.push(name.to_string());
    state.insert(name.to_string(), VisitState::InProgress);
    if let Ok(cfg) = project.get_entity(name) {
        for dep in cfg.full_depends_on() {
            if project.has_entity(&dep) {
                visit(project, &dep, state, stack, report, reported);
            }
        }
    }
    stack.pop();
    state.insert(name.to_string(), VisitState::Done);
}
