//! Integration tests for the flows behind `caseflow validate` and `caseflow run`.
//!
//! Exercises case loading and the end-to-end sweep with real files on disk,
//! the same code paths the subcommand handlers drive.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use caseflow_case_runner::{
    CaseRunnerBuilder, CaseRunnerConfig, LoadDefaults, SuiteRunner, SystemShellRunner,
    discover_case_files, load_case_from_file,
};
use caseflow_report::SuiteReport;

#[test]
fn test_validate_accepts_well_formed_case() {
    // Given: a valid case file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let case_dir = temp_dir.path().join("basic");
    fs::create_dir(&case_dir).expect("should create case dir");

    let valid_case = r#"
[case]
summary = "a well-formed case"
priority = 10
warn_timeout = "30s"

[environment]
GREETING = "hello"

[phases]
execute = "true"
"#;
    fs::write(case_dir.join("case.toml"), valid_case).expect("should write case");

    // When: loading it the way `validate` does
    let result = load_case_from_file(&case_dir.join("case.toml"), &LoadDefaults::default());

    // Then: it loads with its declared attributes
    let case = result.expect("valid case should load");
    assert_eq!(case.priority, 10);
    assert_eq!(case.warn_timeout.as_secs(), 30);
}

#[test]
fn test_validate_rejects_case_without_execute() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let case_dir = temp_dir.path().join("broken");
    fs::create_dir(&case_dir).expect("should create case dir");

    let broken_case = r#"
[case]
summary = "no execute phase"

[phases]
prepare = "true"
"#;
    fs::write(case_dir.join("case.toml"), broken_case).expect("should write case");

    let result = load_case_from_file(&case_dir.join("case.toml"), &LoadDefaults::default());
    assert!(result.is_err(), "case without execute should be rejected");
}

#[test]
fn test_discover_finds_only_case_files() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let case_dir = temp_dir.path().join("one");
    fs::create_dir(&case_dir).expect("should create case dir");
    fs::write(
        case_dir.join("case.toml"),
        "[case]\nsummary = \"s\"\n[phases]\nexecute = \"true\"\n",
    )
    .expect("should write case");
    fs::write(case_dir.join("notes.toml"), "ignored = true").expect("should write noise");

    let files = discover_case_files(temp_dir.path()).expect("discovery should succeed");
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("one/case.toml"));
}

#[tokio::test]
async fn test_run_flow_produces_report_with_exit_relevant_counts() {
    // Given: a suite with one passing and one failing case
    let temp_dir = TempDir::new().expect("should create temp dir");
    for (name, execute) in [("passing", "true"), ("failing", "exit 1")] {
        let dir = temp_dir.path().join(name);
        fs::create_dir(&dir).expect("should create case dir");
        fs::write(
            dir.join("case.toml"),
            format!("[case]\nsummary = \"{name}\"\n[phases]\nexecute = \"{execute}\"\n"),
        )
        .expect("should write case");
    }

    // When: running the sweep the way `run` does
    let config = CaseRunnerConfig::default();
    let shell = Arc::new(SystemShellRunner::new(config.shell.clone()));
    let (runner, _case_rx) = CaseRunnerBuilder::new()
        .config(config.clone())
        .shell_runner(shell)
        .suite_dir(temp_dir.path())
        .build()
        .expect("builder should succeed");
    let suite = SuiteRunner::new(config, Arc::new(runner), temp_dir.path());
    let run = suite.run(None).await.expect("sweep should succeed");

    let report = SuiteReport::from_outcomes(
        run.outcomes,
        run.skipped_manual,
        std::time::Duration::from_secs(1),
    );

    // Then: the summary drives a non-zero exit
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.passed, 1);
    assert_eq!(report.summary.failed, 1);
    assert!(!report.all_passed());
}

#[tokio::test]
async fn test_shipped_demo_suite_passes() {
    // Given: the demo suite shipped with the repository
    let demo = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/suite");

    // When: sweeping it with default settings
    let config = CaseRunnerConfig::default();
    let shell = Arc::new(SystemShellRunner::new(config.shell.clone()));
    let (runner, _case_rx) = CaseRunnerBuilder::new()
        .config(config.clone())
        .shell_runner(shell)
        .suite_dir(&demo)
        .build()
        .expect("builder should succeed");
    let suite = SuiteRunner::new(config, Arc::new(runner), &demo);
    let run = suite.run(None).await.expect("demo sweep should succeed");

    // Then: the automatic cases pass and the manual one is skipped
    assert_eq!(run.skipped_manual, vec!["manual/slow-soak"]);
    assert_eq!(run.outcomes.len(), 2);
    assert!(
        run.outcomes.iter().all(|o| o.verdict().is_pass()),
        "demo cases should pass: {:?}",
        run.outcomes
            .iter()
            .map(|o| (o.name.clone(), o.verdict()))
            .collect::<Vec<_>>()
    );
}
