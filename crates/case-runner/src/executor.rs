//! 페이즈 실행기 — prepare → execute → restore 고정 순서 실행
//!
//! [`PhaseExecutor`]는 케이스 하나의 페이즈들을 엄격한 순서로 실행합니다.
//!
//! # 실행 계약
//!
//! - `prepare`가 실패하거나 타임아웃되면 `execute`는 건너뜁니다 (Skipped).
//! - `restore`는 앞선 페이즈의 결과와 무관하게 항상 실행됩니다.
//! - 각 페이즈는 케이스의 `warn_timeout`으로 제한됩니다.
//! - 페이즈마다 [`PhaseEvent`]가 방출됩니다 (채널이 연결된 경우).
//!
//! 셸을 띄우는 것 자체가 실패하면 (셸 없음 등) 해당 페이즈는 종료 코드
//! 127로 기록됩니다. 이렇게 해야 restore-always 계약이 인프라 실패에도
//! 유지됩니다.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use caseflow_core::event::PhaseEvent;
use caseflow_core::types::{CaseOutcome, PhaseKind, PhaseOutcome, PhaseStatus, TestCase};

use crate::process::{ShellInvocation, ShellRunner, ShellStatus};

/// 셸을 띄울 수 없을 때 기록하는 종료 코드 (command-not-found 관례)
const EXIT_SPAWN_FAILURE: i32 = 127;

/// 페이즈 실행기
///
/// 케이스 하나의 페이즈들을 순서대로 실행하고, 페이즈별 결과를
/// [`PhaseEvent`]로 방출합니다.
pub struct PhaseExecutor<S: ShellRunner> {
    /// 셸 러너 (공유)
    runner: Arc<S>,
    /// 페이즈 이벤트 전송 채널 (선택)
    phase_tx: Option<mpsc::Sender<PhaseEvent>>,
    /// 리포트에 보존할 출력 tail 줄 수
    tail_lines: usize,
}

impl<S: ShellRunner> PhaseExecutor<S> {
    /// 새 페이즈 실행기를 생성합니다.
    pub fn new(
        runner: Arc<S>,
        phase_tx: Option<mpsc::Sender<PhaseEvent>>,
        tail_lines: usize,
    ) -> Self {
        Self {
            runner,
            phase_tx,
            tail_lines,
        }
    }

    /// 케이스 하나의 페이즈들을 실행하고 전체 결과를 반환합니다.
    ///
    /// # Arguments
    /// - `case`: 실행할 케이스
    /// - `env`: 바인딩된 환경 (빌트인 포함)
    /// - `trace_id`: 케이스 실행의 trace_id (이벤트 연결용)
    pub async fn execute_case(
        &self,
        case: &TestCase,
        env: &BTreeMap<String, String>,
        trace_id: &str,
    ) -> CaseOutcome {
        info!(case = %case.name, "executing case");
        let started = Instant::now();
        let mut phases = Vec::new();
        let mut body_failed = false;

        if let Some(script) = &case.prepare {
            let outcome = self
                .run_phase(PhaseKind::Prepare, script, case, env, trace_id)
                .await;
            body_failed = !outcome.status.is_success();
            phases.push(outcome);
        }

        if body_failed {
            debug!(case = %case.name, "prepare failed, skipping execute");
            let skipped = PhaseOutcome::skipped(PhaseKind::Execute);
            self.emit(&case.name, &skipped, trace_id).await;
            phases.push(skipped);
        } else {
            let outcome = self
                .run_phase(PhaseKind::Execute, &case.execute, case, env, trace_id)
                .await;
            phases.push(outcome);
        }

        // restore는 앞선 결과와 무관하게 항상 실행
        if let Some(script) = &case.restore {
            let outcome = self
                .run_phase(PhaseKind::Restore, script, case, env, trace_id)
                .await;
            if !outcome.status.is_success() {
                warn!(
                    case = %case.name,
                    status = %outcome.status,
                    "restore did not complete cleanly, external resources may leak"
                );
            }
            phases.push(outcome);
        }

        let outcome = CaseOutcome {
            name: case.name.clone(),
            summary: case.summary.clone(),
            phases,
            duration: started.elapsed(),
        };
        info!(case = %case.name, verdict = %outcome.verdict(), "case finished");
        outcome
    }

    /// 단일 페이즈를 실행합니다.
    async fn run_phase(
        &self,
        kind: PhaseKind,
        script: &str,
        case: &TestCase,
        env: &BTreeMap<String, String>,
        trace_id: &str,
    ) -> PhaseOutcome {
        debug!(case = %case.name, phase = %kind, "running phase");

        let invocation = ShellInvocation {
            script,
            workdir: &case.dir,
            env,
            timeout: case.warn_timeout,
        };

        let outcome = match self.runner.run(invocation).await {
            Ok(output) => {
                let status = match output.status {
                    ShellStatus::Exited(exit_code) => PhaseStatus::Completed { exit_code },
                    ShellStatus::TimedOut => PhaseStatus::TimedOut,
                };
                PhaseOutcome {
                    phase: kind,
                    status,
                    duration: output.duration,
                    stdout_tail: tail(&output.stdout, self.tail_lines),
                    stderr_tail: tail(&output.stderr, self.tail_lines),
                }
            }
            Err(e) => {
                error!(case = %case.name, phase = %kind, error = %e, "phase could not be run");
                PhaseOutcome {
                    phase: kind,
                    status: PhaseStatus::Completed {
                        exit_code: EXIT_SPAWN_FAILURE,
                    },
                    duration: Duration::ZERO,
                    stdout_tail: String::new(),
                    stderr_tail: e.to_string(),
                }
            }
        };

        match outcome.status {
            PhaseStatus::Completed { exit_code: 0 } => {
                debug!(case = %case.name, phase = %kind, "phase completed");
            }
            PhaseStatus::TimedOut => {
                warn!(
                    case = %case.name,
                    phase = %kind,
                    timeout_secs = case.warn_timeout.as_secs(),
                    "phase timed out"
                );
            }
            _ => {
                info!(case = %case.name, phase = %kind, status = %outcome.status, "phase failed");
            }
        }

        self.emit(&case.name, &outcome, trace_id).await;
        outcome
    }

    /// 페이즈 이벤트를 전송합니다 (채널이 없으면 no-op).
    async fn emit(&self, case_name: &str, outcome: &PhaseOutcome, trace_id: &str) {
        if let Some(tx) = &self.phase_tx {
            let event = PhaseEvent::with_trace(case_name, outcome.clone(), trace_id);
            if let Err(e) = tx.send(event).await {
                error!(error = %e, "failed to send phase event");
            }
        }
    }
}

/// 텍스트의 마지막 `max_lines` 줄만 유지합니다.
fn tail(text: &str, max_lines: usize) -> String {
    if max_lines == 0 {
        return String::new();
    }
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        text.trim_end_matches('\n').to_owned()
    } else {
        lines[lines.len() - max_lines..].join("\n")
    }
}
