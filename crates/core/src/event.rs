//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! 실행기와 리포터 사이의 통신은 이벤트 기반 메시지 패싱으로 수행됩니다.
//! [`EventMetadata`]는 모든 이벤트에 공통으로 포함되는 메타데이터이며,
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 인터페이스입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::{CaseOutcome, PhaseOutcome};

// --- 모듈명 상수 ---

/// 케이스 러너 모듈명
pub const MODULE_CASE_RUNNER: &str = "case-runner";
/// 리포터 모듈명
pub const MODULE_REPORT: &str = "report";

// --- 이벤트 타입 상수 ---

/// 페이즈 이벤트 타입
pub const EVENT_TYPE_PHASE: &str = "phase";
/// 케이스 이벤트 타입
pub const EVENT_TYPE_CASE: &str = "case";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
///
/// 각 이벤트의 발생 시각, 생성 모듈, 추적 ID를 담고 있어
/// 한 케이스에서 비롯된 이벤트 흐름을 연결할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명
    pub source_module: String,
    /// 추적 ID — 같은 케이스의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    ///
    /// 케이스 실행의 시작점에서 사용합니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            unix_timestamp_str(self.timestamp),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터 (timestamp, source_module, trace_id)
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 페이즈 하나가 끝났을 때 생성되는 이벤트
#[derive(Debug, Clone)]
pub struct PhaseEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 케이스 이름
    pub case_name: String,
    /// 페이즈 실행 결과
    pub outcome: PhaseOutcome,
}

impl PhaseEvent {
    /// 기존 trace에 연결된 페이즈 이벤트를 생성합니다.
    pub fn with_trace(
        case_name: impl Into<String>,
        outcome: PhaseOutcome,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_CASE_RUNNER, trace_id),
            case_name: case_name.into(),
            outcome,
        }
    }
}

impl Event for PhaseEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_PHASE
    }
}

impl fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PhaseEvent[{}] case={} phase={} status={}",
            &self.id[..8.min(self.id.len())],
            self.case_name,
            self.outcome.phase,
            self.outcome.status,
        )
    }
}

/// 케이스 하나의 실행이 끝났을 때 생성되는 이벤트
#[derive(Debug, Clone)]
pub struct CaseEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 케이스 실행 결과
    pub outcome: CaseOutcome,
}

impl CaseEvent {
    /// 새로운 trace를 시작하는 케이스 이벤트를 생성합니다.
    pub fn new(outcome: CaseOutcome) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_CASE_RUNNER),
            outcome,
        }
    }

    /// 기존 trace에 연결된 케이스 이벤트를 생성합니다.
    pub fn with_trace(outcome: CaseOutcome, trace_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_CASE_RUNNER, trace_id),
            outcome,
        }
    }
}

impl Event for CaseEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_CASE
    }
}

impl fmt::Display for CaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CaseEvent[{}] case={} verdict={}",
            &self.id[..8.min(self.id.len())],
            self.outcome.name,
            self.outcome.verdict(),
        )
    }
}

/// SystemTime을 사람이 읽을 수 있는 형태로 변환합니다.
fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            format!("{secs}")
        }
        Err(_) => "unknown".to_owned(),
    }
}
