//! # Specification framework
//!
//! A `Specification` is a predicate over some inputs with two side-channel
//! accumulators, `errors` and `warnings`. Composite specifications merge
//! child results into their own lists. Specifications never abort; they
//! surface issues and let the caller decide whether to halt.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecificationIssue {
    pub severity: Severity,
    pub message: String,
    pub entity: Option<String>,
    pub field: Option<String>,
    pub column: Option<String>,
}

impl SpecificationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        SpecificationIssue {
            severity: Severity::Error,
            message: message.into(),
            entity: None,
            field: None,
            column: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        SpecificationIssue {
            severity: Severity::Warning,
            message: message.into(),
            entity: None,
            field: None,
            column: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

impl std::fmt::Display for SpecificationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        write!(f, "[{severity}]")?;
        if let Some(e) = &self.entity {
            write!(f, " Entity '{e}'")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(field) = &self.field {
            write!(f, " (field: {field})")?;
        }
        if let Some(col) = &self.column {
            write!(f, " (column: {col})")?;
        }
        Ok(())
    }
}

/// Append-only accumulator shared by every specification and transform
/// that can emit non-fatal issues.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub errors: Vec<SpecificationIssue>,
    pub warnings: Vec<SpecificationIssue>,
}

impl Report {
    pub fn clear(&mut self) {
        self.errors.clear();
        self.warnings.clear();
    }

    pub fn add_error(&mut self, issue: SpecificationIssue) {
        tracing::warn!(target: "normkit::spec", "{issue}");
        self.errors.push(issue);
    }

    pub fn add_warning(&mut self, issue: SpecificationIssue) {
        tracing::warn!(target: "normkit::spec", "{issue}");
        self.warnings.push(issue);
    }

    pub fn merge(&mut self, other: Report) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn status(&self) -> &'static str {
        if self.has_errors() {
            "invalid"
        } else if self.has_warnings() {
            "valid-with-warnings"
        } else {
            "valid"
        }
    }

    /// Renders the human-readable report described in spec §6.4: a leading
    /// `✓` when clean, otherwise numbered error/warning sections.
    pub fn get_report(&self) -> String {
        let mut lines = Vec::new();
        if !self.has_errors() && !self.has_warnings() {
            lines.push("✓ Configuration is valid".to_string());
            return lines.join("\n");
        }
        if self.has_errors() {
            lines.push(format!("✗ Configuration has {} error(s):", self.errors.len()));
            for (idx, e) in self.errors.iter().enumerate() {
                lines.push(format!("  {}. {e}", idx + 1));
            }
        }
        if self.has_warnings() {
            lines.push(format!("\n⚠ Configuration has {} warning(s):", self.warnings.len()));
            for (idx, w) in self.warnings.iter().enumerate() {
                lines.push(format!("  {}. {w}", idx + 1));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_renders_checkmark() {
        let r = Report::default();
        assert_eq!(r.get_report(), "✓ Configuration is valid");
        assert_eq!(r.status(), "valid");
    }

    #[test]
    fn report_with_only_warnings_is_valid_with_warnings() {
        let mut r = Report::default();
        r.add_warning(SpecificationIssue::warning("missing optional column"));
        assert_eq!(r.status(), "valid-with-warnings");
        assert!(r.get_report().contains("1 warning(s)"));
    }

    #[test]
    fn merge_combines_both_lists() {
        let mut r = Report::default();
        r.add_error(SpecificationIssue::error("bad"));
        let mut other = Report::default();
        other.add_warning(SpecificationIssue::warning("meh"));
        r.merge(other);
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.warnings.len(), 1);
    }
}
