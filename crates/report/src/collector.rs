//! 결과 수집기 — 케이스 이벤트 채널을 리포트로 변환
//!
//! [`ReportCollector`]는 러너의 [`CaseEvent`] 채널을 끝까지 소비하면서
//! 진행 상황을 로그로 남기고, 수집된 결과를 반환합니다. 채널의 모든
//! 송신자가 닫히면 수집이 끝납니다.

use tokio::sync::mpsc;
use tracing::info;

use caseflow_core::event::CaseEvent;
use caseflow_core::types::CaseOutcome;

/// 케이스 이벤트 수집기
pub struct ReportCollector {
    case_rx: mpsc::Receiver<CaseEvent>,
}

impl ReportCollector {
    /// 케이스 이벤트 수신 채널로 수집기를 생성합니다.
    pub fn new(case_rx: mpsc::Receiver<CaseEvent>) -> Self {
        Self { case_rx }
    }

    /// 채널이 닫힐 때까지 이벤트를 수집합니다.
    ///
    /// 케이스가 끝날 때마다 진행 로그를 남깁니다. 반환 순서는 이벤트
    /// 도착 순서입니다 (워커 풀에서는 완료 순서).
    pub async fn collect(mut self) -> Vec<CaseOutcome> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.case_rx.recv().await {
            info!(
                case = %event.outcome.name,
                verdict = %event.outcome.verdict(),
                trace_id = %event.metadata.trace_id,
                "case completed"
            );
            outcomes.push(event.outcome);
        }
        outcomes
    }
}
