//! `caseflow validate` command handler

use std::io::Write;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use caseflow_case_runner::{LoadDefaults, discover_case_files, load_case_from_file};
use caseflow_core::config::CaseflowConfig;

use crate::cli::ValidateArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `validate` command.
///
/// Parses every case file under the given path (or the single named file)
/// and reports each load or validation error. Unlike `run`, nothing is
/// skipped silently: each broken file becomes a report entry and the
/// command exits non-zero.
pub async fn execute(
    args: ValidateArgs,
    config: CaseflowConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let path = args
        .path
        .unwrap_or_else(|| std::path::PathBuf::from(&config.suite.root_dir));
    info!(path = %path.display(), "validating case files");

    let defaults = LoadDefaults {
        warn_timeout: Duration::from_secs(config.suite.warn_timeout_secs),
    };
    let files = if path.is_file() {
        vec![path.clone()]
    } else {
        discover_case_files(&path)?
    };

    let mut entries = Vec::new();
    for file in &files {
        match load_case_from_file(file, &defaults) {
            Ok(case) => entries.push(ValidationEntry {
                path: file.display().to_string(),
                case: Some(case.name),
                error: None,
            }),
            Err(e) => entries.push(ValidationEntry {
                path: file.display().to_string(),
                case: None,
                error: Some(e.to_string()),
            }),
        }
    }

    let invalid = entries.iter().filter(|e| e.error.is_some()).count();
    let report = ValidationReport {
        checked: entries.len(),
        invalid,
        entries,
    };
    writer.render(&report)?;

    if invalid > 0 {
        return Err(CliError::InvalidCases { count: invalid });
    }
    Ok(())
}

/// Validate command output payload.
#[derive(Serialize)]
struct ValidationReport {
    checked: usize,
    invalid: usize,
    entries: Vec<ValidationEntry>,
}

#[derive(Serialize)]
struct ValidationEntry {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    case: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Render for ValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for entry in &self.entries {
            match (&entry.case, &entry.error) {
                (Some(case), None) => writeln!(w, "ok      {case} ({})", entry.path)?,
                (_, Some(error)) => writeln!(w, "invalid {} -- {error}", entry.path)?,
                _ => {}
            }
        }
        writeln!(w, "{} checked, {} invalid", self.checked, self.invalid)?;
        Ok(())
    }
}
