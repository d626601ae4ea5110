//! `caseflow list` command handler

use std::io::Write;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use caseflow_case_runner::{LoadDefaults, discover_cases};
use caseflow_core::config::CaseflowConfig;

use crate::cli::ListArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
///
/// Discovers cases under the suite root and prints them with their
/// scheduling attributes, without running anything.
pub async fn execute(
    args: ListArgs,
    config: CaseflowConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let path = args
        .path
        .unwrap_or_else(|| std::path::PathBuf::from(&config.suite.root_dir));
    info!(path = %path.display(), "discovering cases");

    let defaults = LoadDefaults {
        warn_timeout: Duration::from_secs(config.suite.warn_timeout_secs),
    };
    let mut cases = discover_cases(&path, &defaults)?;
    // 스위프와 같은 순서로 표시: 우선순위 내림차순, 이름 오름차순
    cases.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));

    let report = CaseListReport {
        cases: cases
            .into_iter()
            .map(|c| CaseListEntry {
                name: c.name,
                priority: c.priority,
                manual: c.manual,
                summary: c.summary,
            })
            .collect(),
    };
    writer.render(&report)?;
    Ok(())
}

/// List command output payload.
#[derive(Serialize)]
struct CaseListReport {
    cases: Vec<CaseListEntry>,
}

#[derive(Serialize)]
struct CaseListEntry {
    name: String,
    priority: i64,
    manual: bool,
    summary: String,
}

impl Render for CaseListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{:<40} {:>8} {:>6}  {}",
            "Name", "Priority", "Manual", "Summary"
        )?;
        writeln!(w, "{}", "-".repeat(92))?;
        for case in &self.cases {
            writeln!(
                w,
                "{:<40} {:>8} {:>6}  {}",
                case.name,
                case.priority,
                if case.manual { "yes" } else { "" },
                case.summary,
            )?;
        }
        writeln!(w, "{} case(s)", self.cases.len())?;
        Ok(())
    }
}
