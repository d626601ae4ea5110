//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 케이스 레코드와 실행 결과를 표현하는 데이터 구조를 정의합니다.
//! 로더가 `TestCase`를 생성하고, 실행기가 `PhaseOutcome`/`CaseOutcome`을
//! 생성하며, 리포터가 `Verdict`로 집계합니다.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 선언적 테스트 케이스 레코드
///
/// 케이스 파일 하나를 파싱한 결과입니다. 실행 중 변경되지 않으며,
/// 리포트가 방출된 후 폐기됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// 케이스 이름 (스위트 루트 기준 상대 경로에서 유도)
    pub name: String,
    /// 한 줄 요약
    pub summary: String,
    /// 자동 스위프에서 제외 여부
    pub manual: bool,
    /// 스케줄링 우선순위 (클수록 먼저 실행)
    pub priority: i64,
    /// 페이즈별 실행 시간 상한
    pub warn_timeout: Duration,
    /// 선언된 환경변수 (치환 전 원본 값)
    pub environment: BTreeMap<String, String>,
    /// 준비 페이즈 스크립트 (없으면 생략)
    pub prepare: Option<String>,
    /// 실행 페이즈 스크립트 (필수)
    pub execute: String,
    /// 정리 페이즈 스크립트 (없으면 생략)
    pub restore: Option<String>,
    /// 케이스 디렉토리 (페이즈의 작업 디렉토리)
    pub dir: PathBuf,
}

/// 페이즈 식별자
///
/// 케이스 본문은 prepare → execute → restore 고정 순서로 실행됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    /// 준비 페이즈
    Prepare,
    /// 실행 페이즈
    Execute,
    /// 정리 페이즈 (실패 여부와 무관하게 항상 실행)
    Restore,
}

impl PhaseKind {
    /// 로깅/리포트용 고정 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Execute => "execute",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 단일 페이즈의 종료 상태
///
/// 시그널로 종료된 프로세스는 셸 관례에 따라 `128 + signal`의
/// 종료 코드로 기록됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PhaseStatus {
    /// 프로세스가 종료됨 (0 = 성공)
    Completed { exit_code: i32 },
    /// warn_timeout 초과로 강제 종료됨
    TimedOut,
    /// 앞선 페이즈 실패로 실행되지 않음
    Skipped,
}

impl PhaseStatus {
    /// 성공적으로 완료되었는지 여부
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { exit_code: 0 })
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { exit_code } => write!(f, "exit {exit_code}"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// 단일 페이즈 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// 페이즈 식별자
    pub phase: PhaseKind,
    /// 종료 상태
    pub status: PhaseStatus,
    /// 실행 소요 시간
    pub duration: Duration,
    /// stdout 마지막 부분 (리포트용)
    pub stdout_tail: String,
    /// stderr 마지막 부분 (리포트용)
    pub stderr_tail: String,
}

impl PhaseOutcome {
    /// 실행되지 않은 페이즈의 결과를 생성합니다.
    pub fn skipped(phase: PhaseKind) -> Self {
        Self {
            phase,
            status: PhaseStatus::Skipped,
            duration: Duration::ZERO,
            stdout_tail: String::new(),
            stderr_tail: String::new(),
        }
    }
}

/// 케이스 하나의 전체 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseOutcome {
    /// 케이스 이름
    pub name: String,
    /// 케이스 요약
    pub summary: String,
    /// 페이즈별 결과 (실행 순서대로)
    pub phases: Vec<PhaseOutcome>,
    /// 케이스 전체 소요 시간
    pub duration: Duration,
}

impl CaseOutcome {
    /// 페이즈 결과로부터 케이스 판정을 계산합니다.
    ///
    /// 우선순위: prepare 실패 > execute 실패 > restore 실패 > pass.
    /// restore 실패는 앞선 페이즈가 이미 실패한 경우 판정을 바꾸지 않습니다
    /// (리포트에는 페이즈 결과로 남습니다).
    pub fn verdict(&self) -> Verdict {
        for kind in [PhaseKind::Prepare, PhaseKind::Execute, PhaseKind::Restore] {
            let Some(outcome) = self.phases.iter().find(|p| p.phase == kind) else {
                continue;
            };
            match outcome.status {
                PhaseStatus::Completed { exit_code } if exit_code != 0 => {
                    return Verdict::Fail {
                        phase: kind,
                        exit_code,
                    };
                }
                PhaseStatus::TimedOut => return Verdict::Timeout { phase: kind },
                _ => {}
            }
        }
        Verdict::Pass
    }

    /// 특정 페이즈의 결과를 반환합니다.
    pub fn phase(&self, kind: PhaseKind) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|p| p.phase == kind)
    }
}

/// 케이스 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum Verdict {
    /// 모든 페이즈 성공
    Pass,
    /// 페이즈가 non-zero로 종료됨
    Fail { phase: PhaseKind, exit_code: i32 },
    /// 페이즈가 warn_timeout을 초과함
    Timeout { phase: PhaseKind },
}

impl Verdict {
    /// 통과 여부
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// 실패 분류를 반환합니다 (통과 시 None).
    ///
    /// 셸 본문은 불투명하므로 execute의 종료 코드 1을 단언 실패로,
    /// 그 외 non-zero를 실행 실패로 분류합니다. 분류는 리포트 용도이며
    /// 제어 흐름에는 영향을 주지 않습니다.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Pass => None,
            Self::Timeout { .. } => Some(FailureKind::Timeout),
            Self::Fail { phase, exit_code } => Some(match phase {
                PhaseKind::Prepare => FailureKind::Setup,
                PhaseKind::Execute if *exit_code == 1 => FailureKind::Assertion,
                PhaseKind::Execute => FailureKind::Execution,
                PhaseKind::Restore => FailureKind::Cleanup,
            }),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("pass"),
            Self::Fail { phase, exit_code } => write!(f, "fail({phase}, exit {exit_code})"),
            Self::Timeout { phase } => write!(f, "timeout({phase})"),
        }
    }
}

/// 실패 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// prepare 페이즈 실패
    Setup,
    /// execute 페이즈의 단언 실패 (exit 1)
    Assertion,
    /// execute 페이즈의 그 외 실패
    Execution,
    /// 페이즈 시간 초과
    Timeout,
    /// restore 페이즈 실패
    Cleanup,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::Assertion => "assertion",
            Self::Execution => "execution",
            Self::Timeout => "timeout",
            Self::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// 기간 문자열을 파싱합니다.
///
/// `"500ms"`, `"30s"`, `"5m"`, `"1h"` 형식을 지원합니다.
/// 단위 없는 숫자나 알 수 없는 단위는 None을 반환합니다.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let trimmed = input.trim();
    let unit_start = trimmed.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = trimmed.split_at(unit_start);
    if digits.is_empty() {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    match unit {
        "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => Some(Duration::from_secs(value.checked_mul(60)?)),
        "h" => Some(Duration::from_secs(value.checked_mul(3600)?)),
        _ => None,
    }
}

/// Duration을 리포트용 문자열로 변환합니다.
pub fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else {
        let secs = d.as_secs_f64();
        if secs < 60.0 {
            format!("{secs:.1}s")
        } else {
            let mins = (secs / 60.0).floor() as u64;
            let rem = secs - (mins * 60) as f64;
            format!("{mins}m{rem:.0}s")
        }
    }
}
