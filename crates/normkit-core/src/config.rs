//! # Project configuration loading
//!
//! Reads and parses `project.toml`, the declarative document describing
//! every entity in a normalization run: entity shapes, foreign keys,
//! unnest/append rules, and the data-source catalog they draw from.

use std::path::Path;

use crate::error::{NormError, Result};
use crate::project::Project;
use crate::spec::entity::check_field_shapes;

/// Default project document name.
pub const PROJECT_FILE_NAME: &str = "project.toml";

/// Parse a project document already read into memory.
pub fn parse_project(content: &str) -> Result<Project> {
    let project: Project = toml::from_str(content).map_err(|e| NormError::Config {
        message: format!("failed to parse project document: {e}"),
    })?;
    check_field_shapes(&project)?;
    Ok(project)
}

/// Read and parse `path` as a project document.
pub fn load_project(path: &Path) -> Result<Project> {
    let content = std::fs::read_to_string(path).map_err(|e| NormError::Config {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let mut project = parse_project(&content)?;
    project.origin = Some(path.display().to_string());
    Ok(project)
}

/// Look for `project.toml` in `dir`. Returns `None` if it doesn't exist;
/// the CLI treats a missing project document as a usage error, not this
/// layer's concern.
pub fn load_project_from_dir(dir: &Path) -> Result<Option<Project>> {
    let path = dir.join(PROJECT_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(load_project(&path)?))
}
