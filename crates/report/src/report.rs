//! 리포트 타입 — 케이스 결과 집계 구조
//!
//! [`SuiteReport`]는 스위프 한 번의 최종 산출물입니다. 케이스별 판정과
//! 실패 분류, 페이즈 상세, 스위트 합계를 담으며 JSON으로 직렬화됩니다.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use caseflow_core::types::{CaseOutcome, FailureKind, PhaseOutcome, Verdict, format_duration};

/// 케이스 하나의 리포트 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    /// 케이스 이름
    pub name: String,
    /// 케이스 요약
    pub summary: String,
    /// 판정
    pub verdict: Verdict,
    /// 실패 분류 (통과 시 None)
    pub failure_kind: Option<FailureKind>,
    /// 케이스 소요 시간
    pub duration: Duration,
    /// 페이즈별 상세
    pub phases: Vec<PhaseOutcome>,
}

impl From<CaseOutcome> for CaseReport {
    fn from(outcome: CaseOutcome) -> Self {
        let verdict = outcome.verdict();
        Self {
            name: outcome.name,
            summary: outcome.summary,
            verdict,
            failure_kind: verdict.failure_kind(),
            duration: outcome.duration,
            phases: outcome.phases,
        }
    }
}

/// 스위트 합계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    /// 실행된 케이스 수
    pub total: usize,
    /// 통과
    pub passed: usize,
    /// 실패 (non-zero 종료)
    pub failed: usize,
    /// 타임아웃
    pub timed_out: usize,
    /// manual이라 건너뛴 케이스 수
    pub skipped_manual: usize,
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} timed out ({} total, {} manual skipped)",
            self.passed, self.failed, self.timed_out, self.total, self.skipped_manual,
        )
    }
}

/// 스위프 한 번의 최종 리포트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// 케이스별 리포트 (스케줄링 순서)
    pub cases: Vec<CaseReport>,
    /// manual이라 건너뛴 케이스 이름들
    pub skipped_manual: Vec<String>,
    /// 합계
    pub summary: SuiteSummary,
    /// 스위프 전체 소요 시간
    pub duration: Duration,
}

impl SuiteReport {
    /// 케이스 결과들로부터 리포트를 만듭니다.
    pub fn from_outcomes(
        outcomes: Vec<CaseOutcome>,
        skipped_manual: Vec<String>,
        duration: Duration,
    ) -> Self {
        let cases: Vec<CaseReport> = outcomes.into_iter().map(CaseReport::from).collect();
        let summary = SuiteSummary {
            total: cases.len(),
            passed: cases.iter().filter(|c| c.verdict.is_pass()).count(),
            failed: cases
                .iter()
                .filter(|c| matches!(c.verdict, Verdict::Fail { .. }))
                .count(),
            timed_out: cases
                .iter()
                .filter(|c| matches!(c.verdict, Verdict::Timeout { .. }))
                .count(),
            skipped_manual: skipped_manual.len(),
        };
        Self {
            cases,
            skipped_manual,
            summary,
            duration,
        }
    }

    /// 모든 실행 케이스가 통과했는지 여부
    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.timed_out == 0
    }

    /// 실패한 케이스들을 반환합니다.
    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.verdict.is_pass())
    }

    /// 리포트 한 줄 요약을 반환합니다.
    pub fn one_line(&self) -> String {
        format!("{} in {}", self.summary, format_duration(self.duration))
    }
}
