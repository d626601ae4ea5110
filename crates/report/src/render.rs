//! 리포트 렌더러 — 텍스트/JSON 출력
//!
//! 텍스트 형식은 케이스 한 줄씩, 실패한 케이스는 페이즈 상세와 출력
//! tail을 들여쓰기로 덧붙입니다. JSON 형식은 [`SuiteReport`] 전체의
//! serde 직렬화입니다.

use std::fmt::Write as _;

use caseflow_core::error::{CaseflowError, ReportError};
use caseflow_core::types::{PhaseStatus, format_duration};

use crate::report::SuiteReport;

/// 리포트를 사람이 읽는 텍스트로 렌더링합니다.
pub fn render_text(report: &SuiteReport) -> String {
    let mut out = String::new();

    for case in &report.cases {
        let _ = writeln!(
            out,
            "{:<40} {} ({})",
            case.name,
            case.verdict,
            format_duration(case.duration),
        );

        if case.verdict.is_pass() {
            continue;
        }

        // 실패한 케이스는 페이즈 상세를 덧붙임
        for phase in &case.phases {
            let _ = writeln!(
                out,
                "    {}: {} ({})",
                phase.phase,
                phase.status,
                format_duration(phase.duration),
            );
            if matches!(phase.status, PhaseStatus::Completed { exit_code: 0 })
                || matches!(phase.status, PhaseStatus::Skipped)
            {
                continue;
            }
            for line in phase.stdout_tail.lines() {
                let _ = writeln!(out, "      stdout | {line}");
            }
            for line in phase.stderr_tail.lines() {
                let _ = writeln!(out, "      stderr | {line}");
            }
        }
    }

    for name in &report.skipped_manual {
        let _ = writeln!(out, "{name:<40} skipped (manual)");
    }

    let _ = writeln!(out, "---");
    let _ = writeln!(out, "{}", report.one_line());
    out
}

/// 리포트를 JSON으로 렌더링합니다.
pub fn render_json(report: &SuiteReport) -> Result<String, CaseflowError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| CaseflowError::Report(ReportError::Render(e.to_string())))
}
