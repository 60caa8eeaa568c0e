use std::path::Path;

use anyhow::{Context, Result};

use normkit_core::config::load_project;
use normkit_core::spec::project::validate_project;

use crate::args::{ReportFormat, ValidateArgs};

pub fn run(args: &ValidateArgs) -> Result<()> {
    let project = load_project(Path::new(&args.project)).context("failed to load project document")?;
    let report = validate_project(&project);

    match args.format {
        ReportFormat::Text => println!("{}", report.get_report()),
        ReportFormat::Json => {
            let payload = serde_json::json!({
                "status": report.status(),
                "errors": report.errors,
                "warnings": report.warnings,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}
