//! 케이스 러너 — 환경 바인딩과 페이즈 실행의 전체 흐름 관리
//!
//! [`CaseRunner`]는 케이스 하나를 받아 빌트인 주입, 환경 해석,
//! 페이즈 실행을 수행하고 결과를 [`CaseEvent`]로 방출합니다.
//!
//! # 내부 아키텍처
//! ```text
//! TestCase ──> bind_environment()
//!                   |
//!              PhaseExecutor.execute_case()
//!                   |
//!              CaseEvent ──mpsc──> ReportCollector
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::error;

use caseflow_core::event::{CaseEvent, PhaseEvent};
use caseflow_core::types::{CaseOutcome, TestCase};

use crate::config::CaseRunnerConfig;
use crate::env::{bind_environment, builtin_env};
use crate::error::CaseRunnerError;
use crate::executor::PhaseExecutor;
use crate::loader::{LoadDefaults, load_case_from_file};
use crate::process::ShellRunner;

/// 케이스 러너 -- 케이스 하나의 실행 흐름을 관리합니다.
///
/// 여러 워커가 공유할 수 있도록 모든 메서드는 `&self`를 받습니다.
///
/// # 사용 예시
/// ```ignore
/// use caseflow_case_runner::{CaseRunner, CaseRunnerBuilder, SystemShellRunner};
///
/// let (runner, case_rx) = CaseRunnerBuilder::new()
///     .config(config)
///     .shell_runner(Arc::new(SystemShellRunner::new("sh")))
///     .suite_dir("tests/suite")
///     .build()?;
///
/// let outcome = runner.run_case(&case).await?;
/// ```
pub struct CaseRunner<S: ShellRunner> {
    /// 러너 설정
    config: CaseRunnerConfig,
    /// 페이즈 실행기
    executor: PhaseExecutor<S>,
    /// 스위트 루트 (빌트인 SUITE_DIR)
    suite_dir: PathBuf,
    /// 케이스 결과 전송 채널
    case_tx: mpsc::Sender<CaseEvent>,
    /// 실행된 케이스 카운터
    cases_run: Arc<AtomicU64>,
    /// 통과한 케이스 카운터
    cases_passed: Arc<AtomicU64>,
    /// 실패한 케이스 카운터
    cases_failed: Arc<AtomicU64>,
}

impl<S: ShellRunner> CaseRunner<S> {
    /// 실행된 케이스 수를 반환합니다.
    pub fn cases_run(&self) -> u64 {
        self.cases_run.load(Ordering::Relaxed)
    }

    /// 통과한 케이스 수를 반환합니다.
    pub fn cases_passed(&self) -> u64 {
        self.cases_passed.load(Ordering::Relaxed)
    }

    /// 실패한 케이스 수를 반환합니다.
    pub fn cases_failed(&self) -> u64 {
        self.cases_failed.load(Ordering::Relaxed)
    }

    /// 러너 설정을 반환합니다.
    pub fn config(&self) -> &CaseRunnerConfig {
        &self.config
    }

    /// 케이스 로딩 기본값을 반환합니다.
    pub fn load_defaults(&self) -> LoadDefaults {
        LoadDefaults {
            warn_timeout: self.config.default_warn_timeout(),
        }
    }

    /// 케이스 하나를 실행합니다.
    ///
    /// 환경 바인딩 실패는 에러로 반환됩니다 (페이즈는 시작되지 않음).
    /// 페이즈의 실패/타임아웃은 에러가 아니라 [`CaseOutcome`]의 판정으로
    /// 보고됩니다.
    pub async fn run_case(&self, case: &TestCase) -> Result<CaseOutcome, CaseRunnerError> {
        let trace_id = uuid::Uuid::new_v4().to_string();

        let builtins = builtin_env(case, &self.suite_dir);
        let env = bind_environment(case, &builtins)?;

        let outcome = self.executor.execute_case(case, &env, &trace_id).await;

        self.cases_run.fetch_add(1, Ordering::Relaxed);
        if outcome.verdict().is_pass() {
            self.cases_passed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cases_failed.fetch_add(1, Ordering::Relaxed);
        }

        let event = CaseEvent::with_trace(outcome.clone(), trace_id);
        if let Err(e) = self.case_tx.send(event).await {
            error!(error = %e, "failed to send case event");
        }

        Ok(outcome)
    }

    /// 케이스 파일 하나를 로드하여 실행합니다.
    ///
    /// `caseflow run <path/to/case.toml>`처럼 케이스를 직접 지정할 때
    /// 사용합니다. manual 여부는 확인하지 않습니다 (직접 지정은 수동 실행).
    pub async fn run_case_file(&self, path: &Path) -> Result<CaseOutcome, CaseRunnerError> {
        let case = load_case_from_file(path, &self.load_defaults())?;
        self.run_case(&case).await
    }
}

/// 케이스 러너 빌더
///
/// 러너를 구성하고 필요한 채널을 생성합니다.
pub struct CaseRunnerBuilder<S: ShellRunner> {
    config: CaseRunnerConfig,
    shell_runner: Option<Arc<S>>,
    suite_dir: PathBuf,
    case_tx: Option<mpsc::Sender<CaseEvent>>,
    phase_tx: Option<mpsc::Sender<PhaseEvent>>,
    case_channel_capacity: usize,
}

impl<S: ShellRunner> CaseRunnerBuilder<S> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: CaseRunnerConfig::default(),
            shell_runner: None,
            suite_dir: PathBuf::from("."),
            case_tx: None,
            phase_tx: None,
            case_channel_capacity: 256,
        }
    }

    /// 러너 설정을 지정합니다.
    pub fn config(mut self, config: CaseRunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// 셸 러너를 설정합니다.
    pub fn shell_runner(mut self, runner: Arc<S>) -> Self {
        self.shell_runner = Some(runner);
        self
    }

    /// 스위트 루트 디렉토리를 설정합니다 (빌트인 `SUITE_DIR`).
    pub fn suite_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.suite_dir = dir.into();
        self
    }

    /// 외부 케이스 이벤트 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn case_sender(mut self, tx: mpsc::Sender<CaseEvent>) -> Self {
        self.case_tx = Some(tx);
        self
    }

    /// 페이즈 이벤트 전송 채널을 설정합니다 (선택).
    pub fn phase_sender(mut self, tx: mpsc::Sender<PhaseEvent>) -> Self {
        self.phase_tx = Some(tx);
        self
    }

    /// 케이스 채널 용량을 설정합니다 (외부 채널 미사용 시).
    pub fn case_channel_capacity(mut self, capacity: usize) -> Self {
        self.case_channel_capacity = capacity;
        self
    }

    /// 러너를 빌드합니다.
    ///
    /// # Returns
    /// - `CaseRunner`: 러너 인스턴스
    /// - `Option<mpsc::Receiver<CaseEvent>>`: 케이스 결과 수신 채널
    ///   (외부 case_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(CaseRunner<S>, Option<mpsc::Receiver<CaseEvent>>), CaseRunnerError> {
        self.config.validate()?;

        let shell_runner = self.shell_runner.ok_or_else(|| CaseRunnerError::Config {
            field: "shell_runner".to_owned(),
            reason: "shell runner must be provided".to_owned(),
        })?;

        let (case_tx, case_rx) = if let Some(tx) = self.case_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.case_channel_capacity);
            (tx, Some(rx))
        };

        let executor = PhaseExecutor::new(
            shell_runner,
            self.phase_tx,
            self.config.output_tail_lines,
        );

        let runner = CaseRunner {
            config: self.config,
            executor,
            suite_dir: self.suite_dir,
            case_tx,
            cases_run: Arc::new(AtomicU64::new(0)),
            cases_passed: Arc::new(AtomicU64::new(0)),
            cases_failed: Arc::new(AtomicU64::new(0)),
        };

        Ok((runner, case_rx))
    }
}

impl<S: ShellRunner> Default for CaseRunnerBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
