//! 셸 실행 추상화 — 테스트 가능성을 위한 trait 분리
//!
//! [`ShellRunner`] trait이 서브프로세스 실행을 추상화하여, 프로덕션 코드는
//! [`SystemShellRunner`]를 사용하고 테스트는 `MockShellRunner`를 사용합니다.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ PhaseExecutor │
//! └───────┬───────┘
//!         │
//!         ▼
//!  ┌─────────────┐
//!  │ ShellRunner │ (trait)
//!  └─────────────┘
//!       │     │
//!       ▼     ▼
//!  ┌────────┐ ┌──────┐
//!  │ System │ │ Mock │
//!  └───┬────┘ └──────┘
//!      │
//!      ▼
//!   sh -e -c <script>
//! ```
//!
//! # 타임아웃 계약
//!
//! `run`은 `invocation.timeout`을 스스로 강제합니다. 초과 시 프로세스
//! 그룹 전체를 강제 종료하고 `ShellStatus::TimedOut`을 반환합니다.
//! 그 시점까지 캡처된 stdout/stderr는 보존됩니다.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::CaseRunnerError;

/// 스트림당 캡처 상한 (넘치면 앞부분부터 버림)
const MAX_CAPTURE_BYTES: usize = 64 * 1024;

/// 셸 호출 컨텍스트
///
/// 스크립트 본문, 작업 디렉토리, 바인딩된 환경, 타임아웃을 담습니다.
#[derive(Debug, Clone, Copy)]
pub struct ShellInvocation<'a> {
    /// 불투명한 셸 스크립트 본문
    pub script: &'a str,
    /// 작업 디렉토리
    pub workdir: &'a Path,
    /// 바인딩된 환경 (부모 프로세스 환경 위에 덮어씀)
    pub env: &'a BTreeMap<String, String>,
    /// 실행 시간 상한
    pub timeout: Duration,
}

/// 셸 실행의 종료 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStatus {
    /// 프로세스가 종료됨 (시그널 종료는 128 + signal로 매핑)
    Exited(i32),
    /// 타임아웃으로 강제 종료됨
    TimedOut,
}

/// 셸 실행 결과
#[derive(Debug, Clone)]
pub struct ShellOutput {
    /// 종료 상태
    pub status: ShellStatus,
    /// 캡처된 stdout (상한 적용)
    pub stdout: String,
    /// 캡처된 stderr (상한 적용)
    pub stderr: String,
    /// 실행 소요 시간
    pub duration: Duration,
}

/// 셸 실행을 추상화하는 trait
///
/// 모든 페이즈 실행이 이 trait을 통과하므로 mock으로 대체할 수 있습니다.
/// `Send + Sync + 'static` 바운드로 async 컨텍스트 간 안전한 공유를
/// 보장합니다.
pub trait ShellRunner: Send + Sync + 'static {
    /// 스크립트 하나를 실행하고 종료 상태와 캡처된 출력을 반환합니다.
    ///
    /// # Errors
    ///
    /// 스크립트의 non-zero 종료는 에러가 아니라 `ShellStatus`로 보고됩니다.
    /// 에러는 프로세스를 시작하거나 기다리는 것 자체가 실패한 경우입니다.
    fn run(
        &self,
        invocation: ShellInvocation<'_>,
    ) -> impl Future<Output = Result<ShellOutput, CaseRunnerError>> + Send;
}

/// 실제 셸을 사용하는 프로덕션 구현
///
/// 스크립트를 `<shell> -e -c <script>`로 실행합니다. `-e`(strict 모드)
/// 덕분에 본문 중 처음 실패한 명령에서 페이즈가 중단됩니다.
pub struct SystemShellRunner {
    shell: String,
}

impl SystemShellRunner {
    /// 지정한 셸을 사용하는 러너를 생성합니다.
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// 사용 중인 셸 이름을 반환합니다.
    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl ShellRunner for SystemShellRunner {
    async fn run(&self, invocation: ShellInvocation<'_>) -> Result<ShellOutput, CaseRunnerError> {
        let mut command = tokio::process::Command::new(&self.shell);
        command
            .arg("-e")
            .arg("-c")
            .arg(invocation.script)
            .current_dir(invocation.workdir)
            .envs(invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // 페이즈가 띄운 자식들까지 한 번에 정리할 수 있도록 새 프로세스
        // 그룹의 리더로 실행
        #[cfg(unix)]
        command.process_group(0);

        let start = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|e| CaseRunnerError::Spawn(format!("{}: {e}", self.shell)))?;

        let stdout_task = tokio::spawn(read_tail(child.stdout.take(), MAX_CAPTURE_BYTES));
        let stderr_task = tokio::spawn(read_tail(child.stderr.take(), MAX_CAPTURE_BYTES));

        let status = match tokio::time::timeout(invocation.timeout, child.wait()).await {
            Ok(Ok(exit)) => ShellStatus::Exited(exit_code_of(exit)),
            Ok(Err(e)) => {
                kill_process_group(&child);
                let _ = child.kill().await;
                return Err(CaseRunnerError::Wait(e.to_string()));
            }
            Err(_elapsed) => {
                kill_process_group(&child);
                let _ = child.kill().await;
                let _ = child.wait().await;
                ShellStatus::TimedOut
            }
        };

        let stdout = join_capture(stdout_task).await;
        let stderr = join_capture(stderr_task).await;

        Ok(ShellOutput {
            status,
            stdout,
            stderr,
            duration: start.elapsed(),
        })
    }
}

/// 스트림을 끝까지 읽되 마지막 `cap` 바이트만 유지합니다.
async fn read_tail<R>(reader: Option<R>, cap: usize) -> String
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(mut reader) = reader else {
        return String::new();
    };
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.len() > cap {
                    let excess = buf.len() - cap;
                    buf.drain(..excess);
                }
            }
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn join_capture(task: tokio::task::JoinHandle<String>) -> String {
    task.await.unwrap_or_default()
}

/// 종료 상태를 셸 관례의 정수 코드로 변환합니다.
#[cfg(unix)]
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

#[cfg(not(unix))]
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// 자식 프로세스 그룹 전체에 SIGKILL을 보냅니다.
#[cfg(unix)]
fn kill_process_group(child: &tokio::process::Child) {
    if let Some(pid) = child.id() {
        let pgid = pid as i32;
        // SAFETY: kill(2)은 시그널 전송만 수행하며 메모리에 접근하지 않습니다.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &tokio::process::Child) {}

/// 테스트용 Mock 셸 러너
///
/// 스크립트 부분 문자열 매칭으로 설정 가능한 응답을 반환하며,
/// 호출 내역을 기록하여 실행 순서를 검증할 수 있습니다.
#[cfg(test)]
pub struct MockShellRunner {
    rules: Vec<(String, MockResponse)>,
    fallback: MockResponse,
    invocations: std::sync::Mutex<Vec<RecordedInvocation>>,
}

/// Mock 응답 설정
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: ShellStatus,
    pub stdout: String,
    pub stderr: String,
}

/// 기록된 호출 내역
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    pub script: String,
    pub workdir: std::path::PathBuf,
    pub env: BTreeMap<String, String>,
    pub timeout: Duration,
}

#[cfg(test)]
impl MockResponse {
    /// 지정한 코드로 종료하는 응답을 생성합니다.
    pub fn exit(code: i32) -> Self {
        Self {
            status: ShellStatus::Exited(code),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// 타임아웃 응답을 생성합니다.
    pub fn timed_out() -> Self {
        Self {
            status: ShellStatus::TimedOut,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// stdout을 설정합니다.
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// stderr를 설정합니다.
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

#[cfg(test)]
impl MockShellRunner {
    /// 모든 스크립트가 성공하는 mock 러너를 생성합니다.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: MockResponse::exit(0),
            invocations: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// 스크립트에 `pattern`이 포함되면 지정한 응답을 반환하도록 설정합니다.
    ///
    /// 먼저 등록된 규칙이 우선합니다.
    pub fn on_script_containing(mut self, pattern: impl Into<String>, resp: MockResponse) -> Self {
        self.rules.push((pattern.into(), resp));
        self
    }

    /// 어느 규칙에도 맞지 않는 스크립트의 기본 응답을 설정합니다.
    pub fn with_fallback(mut self, resp: MockResponse) -> Self {
        self.fallback = resp;
        self
    }

    /// 기록된 호출 내역을 반환합니다.
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.lock().expect("mock lock poisoned").clone()
    }

    /// 기록된 스크립트 목록을 호출 순서대로 반환합니다.
    pub fn scripts(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.script).collect()
    }
}

#[cfg(test)]
impl ShellRunner for MockShellRunner {
    async fn run(&self, invocation: ShellInvocation<'_>) -> Result<ShellOutput, CaseRunnerError> {
        self.invocations
            .lock()
            .expect("mock lock poisoned")
            .push(RecordedInvocation {
                script: invocation.script.to_owned(),
                workdir: invocation.workdir.to_path_buf(),
                env: invocation.env.clone(),
                timeout: invocation.timeout,
            });

        let resp = self
            .rules
            .iter()
            .find(|(pattern, _)| invocation.script.contains(pattern))
            .map(|(_, resp)| resp.clone())
            .unwrap_or_else(|| self.fallback.clone());

        Ok(ShellOutput {
            status: resp.status,
            stdout: resp.stdout,
            stderr: resp.stderr,
            duration: Duration::from_millis(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation<'a>(
        script: &'a str,
        workdir: &'a Path,
        env: &'a BTreeMap<String, String>,
        timeout: Duration,
    ) -> ShellInvocation<'a> {
        ShellInvocation {
            script,
            workdir,
            env,
            timeout,
        }
    }

    #[tokio::test]
    async fn system_runner_captures_stdout() {
        let runner = SystemShellRunner::new("sh");
        let env = BTreeMap::new();
        let dir = std::env::temp_dir();
        let out = runner
            .run(invocation(
                "echo hello world",
                &dir,
                &env,
                Duration::from_secs(10),
            ))
            .await
            .unwrap();
        assert_eq!(out.status, ShellStatus::Exited(0));
        assert_eq!(out.stdout.trim(), "hello world");
    }

    #[tokio::test]
    async fn system_runner_propagates_exit_code() {
        let runner = SystemShellRunner::new("sh");
        let env = BTreeMap::new();
        let dir = std::env::temp_dir();
        let out = runner
            .run(invocation("exit 7", &dir, &env, Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(out.status, ShellStatus::Exited(7));
    }

    #[tokio::test]
    async fn system_runner_strict_mode_stops_at_first_failure() {
        let runner = SystemShellRunner::new("sh");
        let env = BTreeMap::new();
        let dir = std::env::temp_dir();
        let out = runner
            .run(invocation(
                "false\necho unreachable",
                &dir,
                &env,
                Duration::from_secs(10),
            ))
            .await
            .unwrap();
        assert_eq!(out.status, ShellStatus::Exited(1));
        assert!(!out.stdout.contains("unreachable"));
    }

    #[tokio::test]
    async fn system_runner_injects_environment() {
        let runner = SystemShellRunner::new("sh");
        let mut env = BTreeMap::new();
        env.insert("CASEFLOW_TEST_VALUE".to_owned(), "injected".to_owned());
        let dir = std::env::temp_dir();
        let out = runner
            .run(invocation(
                "printf '%s' \"$CASEFLOW_TEST_VALUE\"",
                &dir,
                &env,
                Duration::from_secs(10),
            ))
            .await
            .unwrap();
        assert_eq!(out.stdout, "injected");
    }

    #[tokio::test]
    async fn system_runner_uses_workdir() {
        let runner = SystemShellRunner::new("sh");
        let env = BTreeMap::new();
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().canonicalize().unwrap();
        let out = runner
            .run(invocation("pwd", &dir, &env, Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), dir.display().to_string());
    }

    #[tokio::test]
    async fn system_runner_times_out_and_kills() {
        let runner = SystemShellRunner::new("sh");
        let env = BTreeMap::new();
        let dir = std::env::temp_dir();
        let start = Instant::now();
        let out = runner
            .run(invocation(
                "sleep 30",
                &dir,
                &env,
                Duration::from_millis(200),
            ))
            .await
            .unwrap();
        assert_eq!(out.status, ShellStatus::TimedOut);
        // 타임아웃 직후 정리되어야 함 (sleep 전체를 기다리지 않음)
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn system_runner_preserves_output_captured_before_timeout() {
        let runner = SystemShellRunner::new("sh");
        let env = BTreeMap::new();
        let dir = std::env::temp_dir();
        let out = runner
            .run(invocation(
                "echo before-timeout; sleep 30",
                &dir,
                &env,
                Duration::from_millis(200),
            ))
            .await
            .unwrap();
        assert_eq!(out.status, ShellStatus::TimedOut);
        assert!(out.stdout.contains("before-timeout"));
    }

    #[tokio::test]
    async fn system_runner_spawn_failure_is_error() {
        let runner = SystemShellRunner::new("/nonexistent/shell-binary");
        let env = BTreeMap::new();
        let dir = std::env::temp_dir();
        let result = runner
            .run(invocation("true", &dir, &env, Duration::from_secs(1)))
            .await;
        assert!(matches!(result, Err(CaseRunnerError::Spawn(_))));
    }

    #[tokio::test]
    async fn mock_runner_matches_rules_in_order() {
        let runner = MockShellRunner::new()
            .on_script_containing("build", MockResponse::exit(2).with_stderr("build failed"))
            .with_fallback(MockResponse::exit(0).with_stdout("ok"));
        let env = BTreeMap::new();
        let dir = std::env::temp_dir();

        let out = runner
            .run(invocation("run build now", &dir, &env, Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(out.status, ShellStatus::Exited(2));
        assert_eq!(out.stderr, "build failed");

        let out = runner
            .run(invocation("other", &dir, &env, Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(out.status, ShellStatus::Exited(0));
        assert_eq!(out.stdout, "ok");

        assert_eq!(runner.scripts(), vec!["run build now", "other"]);
    }

    #[test]
    fn read_tail_cap_is_enforced() {
        // 상한을 넘는 입력은 앞부분이 잘려야 함
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let data = vec![b'x'; MAX_CAPTURE_BYTES * 2];
        let result = rt.block_on(read_tail(Some(std::io::Cursor::new(data)), MAX_CAPTURE_BYTES));
        assert_eq!(result.len(), MAX_CAPTURE_BYTES);
    }
}
