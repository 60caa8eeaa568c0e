//! Multi-pass readiness selection (spec §4.4.1, §4.4.2).

use std::collections::HashSet;

use crate::project::Project;

/// Entities whose `full_depends_on` are all in `completed`, are not yet
/// completed themselves, and are restricted to `scope`. Returned in lexical
/// order, which is the scheduler's tie-break whenever more than one entity
/// becomes ready in the same pass.
pub fn ready_entities(project: &Project, scope: &HashSet<String>, completed: &HashSet<String>) -> Vec<String> {
    let mut ready: Vec<String> = scope
        .iter()
        .filter(|name| !completed.contains(*name))
        .filter(|name| {
            project
                .get_entity(name)
                .map(|cfg| cfg.full_depends_on().iter().all(|d| completed.contains(d)))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    ready.sort();
    ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::EntityConfig;

    #[test]
    fn entities_with_no_dependencies_are_ready_first() {
        let mut project = Project::default();
        project.entities.insert("b".to_string(), EntityConfig::default());
        project.entities.insert(
            "a".to_string(),
            EntityConfig {
                source: Some("b".into()),
                ..Default::default()
            },
        );
        let scope: HashSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        let completed = HashSet::new();
        let ready = ready_entities(&project, &scope, &completed);
        assert_eq!(ready, vec!["b".to_string()]);
    }

    #[test]
    fn ties_break_lexically() {
        let mut project = Project::default();
        project.entities.insert("z".to_string(), EntityConfig::default());
        project.entities.insert("a".to_string(), EntityConfig::default());
        let scope: HashSet<String> = ["z".to_string(), "a".to_string()].into_iter().collect();
        let ready = ready_entities(&project, &scope, &HashSet::new());
        assert_eq!(ready, vec!["a".to_string(), "z".to_string()]);
    }
}
