//! 스위트 러너 — 우선순위 기반 스위프 및 워커 풀
//!
//! [`SuiteRunner`]는 스위트 루트에서 케이스를 탐색하고, manual 케이스를
//! 제외한 뒤 우선순위 내림차순(동순위는 이름 오름차순)으로 정렬하여
//! 제한된 수의 워커로 실행합니다.
//!
//! 케이스 내부의 페이즈는 항상 순차 실행이며, 병렬성은 케이스 사이에만
//! 존재합니다. 각 케이스는 자신의 디렉토리를 배타적으로 소유합니다.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use caseflow_core::types::{CaseOutcome, PhaseKind, PhaseOutcome, PhaseStatus, TestCase};

use crate::config::CaseRunnerConfig;
use crate::error::CaseRunnerError;
use crate::loader::discover_cases;
use crate::process::ShellRunner;
use crate::runner::CaseRunner;

/// 스위프 한 번의 결과
#[derive(Debug)]
pub struct SuiteRun {
    /// 실행된 케이스들의 결과 (스케줄링 순서)
    pub outcomes: Vec<CaseOutcome>,
    /// manual이라 건너뛴 케이스 이름들
    pub skipped_manual: Vec<String>,
}

/// 스위트 러너
pub struct SuiteRunner<S: ShellRunner> {
    /// 러너 설정
    config: CaseRunnerConfig,
    /// 공유 케이스 러너
    case_runner: Arc<CaseRunner<S>>,
    /// 스위트 루트
    suite_root: PathBuf,
}

impl<S: ShellRunner> SuiteRunner<S> {
    /// 새 스위트 러너를 생성합니다.
    pub fn new(
        config: CaseRunnerConfig,
        case_runner: Arc<CaseRunner<S>>,
        suite_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            case_runner,
            suite_root: suite_root.into(),
        }
    }

    /// 스위트를 스위프합니다.
    ///
    /// # Arguments
    /// - `filter`: 케이스 이름 부분 문자열 필터 (None이면 전체)
    pub async fn run(&self, filter: Option<&str>) -> Result<SuiteRun, CaseRunnerError> {
        let defaults = crate::loader::LoadDefaults {
            warn_timeout: self.config.default_warn_timeout(),
        };
        let mut cases = discover_cases(&self.suite_root, &defaults)?;

        if let Some(pattern) = filter {
            cases.retain(|c| c.name.contains(pattern));
        }

        let mut skipped_manual = Vec::new();
        if !self.config.include_manual {
            let (manual, auto): (Vec<_>, Vec<_>) = cases.into_iter().partition(|c| c.manual);
            skipped_manual = manual.into_iter().map(|c| c.name).collect();
            cases = auto;
        }

        // 우선순위 내림차순, 동순위는 이름 오름차순
        cases.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));

        info!(
            cases = cases.len(),
            skipped_manual = skipped_manual.len(),
            workers = self.config.workers,
            "starting suite sweep"
        );

        let outcomes = if self.config.workers <= 1 || cases.len() <= 1 {
            self.run_sequential(cases).await
        } else {
            self.run_with_workers(cases).await
        };

        Ok(SuiteRun {
            outcomes,
            skipped_manual,
        })
    }

    /// 케이스들을 현재 태스크에서 순서대로 실행합니다.
    async fn run_sequential(&self, cases: Vec<TestCase>) -> Vec<CaseOutcome> {
        let mut outcomes = Vec::with_capacity(cases.len());
        for case in &cases {
            outcomes.push(run_one(&self.case_runner, case).await);
        }
        outcomes
    }

    /// 케이스들을 워커 풀에서 실행합니다.
    ///
    /// 워커들은 공유 큐에서 스케줄링 순서대로 케이스를 가져가며,
    /// 결과는 큐 순서대로 재정렬되어 반환됩니다.
    async fn run_with_workers(&self, cases: Vec<TestCase>) -> Vec<CaseOutcome> {
        let total = cases.len();
        let queue: VecDeque<(usize, TestCase)> = cases.into_iter().enumerate().collect();
        let queue = Arc::new(Mutex::new(queue));
        let results: Arc<Mutex<Vec<(usize, CaseOutcome)>>> =
            Arc::new(Mutex::new(Vec::with_capacity(total)));

        let workers = self.config.workers.min(total);
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let results = Arc::clone(&results);
            let runner = Arc::clone(&self.case_runner);
            handles.push(tokio::spawn(async move {
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some((index, case)) = next else {
                        break;
                    };
                    debug!(worker = worker_id, case = %case.name, "worker picked case");
                    let outcome = run_one(&runner, &case).await;
                    results.lock().await.push((index, outcome));
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "suite worker panicked");
            }
        }

        let mut indexed = Arc::try_unwrap(results)
            .map(Mutex::into_inner)
            .unwrap_or_default();
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

/// 케이스 하나를 실행하고, 실행 자체가 불가능하면 셋업 실패로 기록합니다.
async fn run_one<S: ShellRunner>(runner: &CaseRunner<S>, case: &TestCase) -> CaseOutcome {
    match runner.run_case(case).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(case = %case.name, error = %e, "case could not be run");
            errored_outcome(case, &e)
        }
    }
}

/// 실행 전 단계(환경 바인딩 등)에서 실패한 케이스의 결과를 합성합니다.
fn errored_outcome(case: &TestCase, err: &CaseRunnerError) -> CaseOutcome {
    CaseOutcome {
        name: case.name.clone(),
        summary: case.summary.clone(),
        phases: vec![PhaseOutcome {
            phase: PhaseKind::Prepare,
            status: PhaseStatus::Completed { exit_code: 1 },
            duration: Duration::ZERO,
            stdout_tail: String::new(),
            stderr_tail: err.to_string(),
        }],
        duration: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockResponse, MockShellRunner};
    use crate::runner::CaseRunnerBuilder;
    use caseflow_core::types::{FailureKind, Verdict};
    use std::path::Path;

    fn write_case(root: &Path, name: &str, priority: i64, manual: bool) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("case.toml"),
            format!(
                "[case]\nsummary = \"case {name}\"\npriority = {priority}\nmanual = {manual}\n\n[phases]\nexecute = \"exec-{name}\"\n"
            ),
        )
        .unwrap();
    }

    fn make_suite(
        shell: Arc<MockShellRunner>,
        root: &Path,
        config: CaseRunnerConfig,
    ) -> SuiteRunner<MockShellRunner> {
        let (runner, _case_rx) = CaseRunnerBuilder::new()
            .config(config.clone())
            .shell_runner(shell)
            .suite_dir(root)
            .build()
            .unwrap();
        SuiteRunner::new(config, Arc::new(runner), root)
    }

    #[tokio::test]
    async fn sweep_runs_cases_by_priority_then_name() {
        let temp = tempfile::tempdir().unwrap();
        write_case(temp.path(), "low", 1, false);
        write_case(temp.path(), "urgent", 100, false);
        write_case(temp.path(), "also-urgent", 100, false);

        let shell = Arc::new(MockShellRunner::new());
        let suite = make_suite(Arc::clone(&shell), temp.path(), CaseRunnerConfig::default());

        let run = suite.run(None).await.unwrap();
        assert_eq!(run.outcomes.len(), 3);
        assert_eq!(
            shell.scripts(),
            vec!["exec-also-urgent", "exec-urgent", "exec-low"]
        );
        // 결과도 스케줄링 순서
        let names: Vec<_> = run.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["also-urgent", "urgent", "low"]);
    }

    #[tokio::test]
    async fn sweep_skips_manual_cases() {
        let temp = tempfile::tempdir().unwrap();
        write_case(temp.path(), "auto", 0, false);
        write_case(temp.path(), "hands-on", 0, true);

        let shell = Arc::new(MockShellRunner::new());
        let suite = make_suite(Arc::clone(&shell), temp.path(), CaseRunnerConfig::default());

        let run = suite.run(None).await.unwrap();
        assert_eq!(run.outcomes.len(), 1);
        assert_eq!(run.outcomes[0].name, "auto");
        assert_eq!(run.skipped_manual, vec!["hands-on"]);
    }

    #[tokio::test]
    async fn sweep_includes_manual_when_configured() {
        let temp = tempfile::tempdir().unwrap();
        write_case(temp.path(), "hands-on", 0, true);

        let shell = Arc::new(MockShellRunner::new());
        let config = CaseRunnerConfig {
            include_manual: true,
            ..Default::default()
        };
        let suite = make_suite(Arc::clone(&shell), temp.path(), config);

        let run = suite.run(None).await.unwrap();
        assert_eq!(run.outcomes.len(), 1);
        assert!(run.skipped_manual.is_empty());
    }

    #[tokio::test]
    async fn sweep_applies_name_filter() {
        let temp = tempfile::tempdir().unwrap();
        write_case(temp.path(), "build/basic", 0, false);
        write_case(temp.path(), "install/remove", 0, false);

        let shell = Arc::new(MockShellRunner::new());
        let suite = make_suite(Arc::clone(&shell), temp.path(), CaseRunnerConfig::default());

        let run = suite.run(Some("build")).await.unwrap();
        assert_eq!(run.outcomes.len(), 1);
        assert_eq!(run.outcomes[0].name, "build/basic");
    }

    #[tokio::test]
    async fn sweep_with_worker_pool_completes_all_cases() {
        let temp = tempfile::tempdir().unwrap();
        for i in 0..6 {
            write_case(temp.path(), &format!("case-{i}"), 0, false);
        }

        let shell = Arc::new(MockShellRunner::new());
        let config = CaseRunnerConfig {
            workers: 3,
            ..Default::default()
        };
        let suite = make_suite(Arc::clone(&shell), temp.path(), config);

        let run = suite.run(None).await.unwrap();
        assert_eq!(run.outcomes.len(), 6);
        // 결과는 스케줄링 순서로 재정렬됨
        let names: Vec<_> = run.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["case-0", "case-1", "case-2", "case-3", "case-4", "case-5"]
        );
        assert_eq!(shell.scripts().len(), 6);
    }

    #[tokio::test]
    async fn sweep_reports_failures_without_stopping() {
        let temp = tempfile::tempdir().unwrap();
        write_case(temp.path(), "failing", 10, false);
        write_case(temp.path(), "passing", 0, false);

        let shell = Arc::new(
            MockShellRunner::new()
                .on_script_containing("exec-failing", MockResponse::exit(1)),
        );
        let suite = make_suite(Arc::clone(&shell), temp.path(), CaseRunnerConfig::default());

        let run = suite.run(None).await.unwrap();
        assert_eq!(run.outcomes.len(), 2);
        assert!(!run.outcomes[0].verdict().is_pass());
        assert!(run.outcomes[1].verdict().is_pass());
    }

    #[tokio::test]
    async fn sweep_records_binding_error_as_setup_failure() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("broken-env");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("case.toml"),
            "[case]\nsummary = \"bad env\"\n\n[environment]\nVAL = \"$CASEFLOW_TEST_MISSING_777\"\n\n[phases]\nexecute = \"true\"\n",
        )
        .unwrap();

        let shell = Arc::new(MockShellRunner::new());
        let suite = make_suite(Arc::clone(&shell), temp.path(), CaseRunnerConfig::default());

        let run = suite.run(None).await.unwrap();
        assert_eq!(run.outcomes.len(), 1);
        let verdict = run.outcomes[0].verdict();
        assert_eq!(verdict.failure_kind(), Some(FailureKind::Setup));
        assert!(matches!(verdict, Verdict::Fail { .. }));
        // 페이즈는 실행되지 않음
        assert!(shell.invocations().is_empty());
    }

    #[tokio::test]
    async fn sweep_missing_root_is_error() {
        let shell = Arc::new(MockShellRunner::new());
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("no-such-dir");
        let suite = make_suite(shell, &missing, CaseRunnerConfig::default());
        assert!(suite.run(None).await.is_err());
    }
}
