//! `caseflow run` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use caseflow_case_runner::{CaseRunnerBuilder, CaseRunnerConfig, SuiteRunner, SystemShellRunner};
use caseflow_core::config::CaseflowConfig;
use caseflow_report::{ReportCollector, SuiteReport, render_json, render_text};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Runs a suite sweep over a directory, or a single case when `path`
/// points at a case file. Returns `CliError::CasesFailed` (exit code 4)
/// when any executed case fails or times out.
pub async fn execute(
    args: RunArgs,
    config: CaseflowConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut runner_config = CaseRunnerConfig::from_core(&config.suite);
    if let Some(workers) = args.workers {
        runner_config.workers = workers;
    }
    if args.include_manual {
        runner_config.include_manual = true;
    }
    runner_config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let path = args
        .path
        .unwrap_or_else(|| std::path::PathBuf::from(&config.suite.root_dir));

    let started = Instant::now();
    let report = if path.is_file() {
        run_single_case(&path, runner_config, started).await?
    } else {
        run_suite(&path, runner_config, args.filter.as_deref(), started).await?
    };

    let payload = RunReport { report };
    writer.render(&payload)?;

    if !config.report.output_path.is_empty() {
        write_report_file(
            &payload.report,
            &config.report.format,
            &config.report.output_path,
        )?;
    }

    let not_passed = payload.report.summary.failed + payload.report.summary.timed_out;
    if not_passed > 0 {
        return Err(CliError::CasesFailed { count: not_passed });
    }
    Ok(())
}

/// Run one explicitly named case file.
async fn run_single_case(
    path: &Path,
    runner_config: CaseRunnerConfig,
    started: Instant,
) -> Result<SuiteReport, CliError> {
    // SUITE_DIR for a directly addressed case is the parent of its case directory
    let suite_dir = path
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));

    let shell = Arc::new(SystemShellRunner::new(runner_config.shell.clone()));
    let (runner, case_rx) = CaseRunnerBuilder::new()
        .config(runner_config)
        .shell_runner(shell)
        .suite_dir(suite_dir)
        .build()?;
    let case_rx = case_rx.ok_or_else(|| CliError::Command("case channel unavailable".to_owned()))?;
    let collector = tokio::spawn(ReportCollector::new(case_rx).collect());

    let outcome = runner.run_case_file(path).await?;
    drop(runner);
    let _ = collector.await;

    Ok(SuiteReport::from_outcomes(
        vec![outcome],
        Vec::new(),
        started.elapsed(),
    ))
}

/// Run a sweep over a suite directory.
async fn run_suite(
    path: &Path,
    runner_config: CaseRunnerConfig,
    filter: Option<&str>,
    started: Instant,
) -> Result<SuiteReport, CliError> {
    let shell = Arc::new(SystemShellRunner::new(runner_config.shell.clone()));
    let (runner, case_rx) = CaseRunnerBuilder::new()
        .config(runner_config.clone())
        .shell_runner(shell)
        .suite_dir(path)
        .build()?;
    let case_rx = case_rx.ok_or_else(|| CliError::Command("case channel unavailable".to_owned()))?;
    let collector = tokio::spawn(ReportCollector::new(case_rx).collect());

    let suite = SuiteRunner::new(runner_config, Arc::new(runner), path);
    let run = suite.run(filter).await?;

    // Close the case channel so the collector's progress loop terminates
    drop(suite);
    let _ = collector.await;

    Ok(SuiteReport::from_outcomes(
        run.outcomes,
        run.skipped_manual,
        started.elapsed(),
    ))
}

/// Write the report to the configured output path.
fn write_report_file(report: &SuiteReport, format: &str, path: &str) -> Result<(), CliError> {
    let content = match format {
        "json" => render_json(report)?,
        _ => render_text(report),
    };
    std::fs::write(path, content)?;
    info!(path, "report written");
    Ok(())
}

/// Run command output payload.
#[derive(Serialize)]
#[serde(transparent)]
struct RunReport {
    report: SuiteReport,
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write!(w, "{}", render_text(&self.report))?;
        let banner = if self.report.all_passed() {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        writeln!(w, "{banner}")?;
        Ok(())
    }
}
