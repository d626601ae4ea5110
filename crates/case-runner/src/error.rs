//! 케이스 러너 에러 타입
//!
//! [`CaseRunnerError`]는 케이스 러너 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<CaseRunnerError> for CaseflowError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use caseflow_core::error::{CaseError, CaseflowError, ConfigError, ExecError};

/// 케이스 러너 도메인 에러
///
/// 케이스 파일 로딩/검증, 환경 바인딩, 서브프로세스 실행, 설정 에러 등
/// 케이스 러너 내부의 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum CaseRunnerError {
    /// 케이스 파일 로딩 실패
    #[error("case load error: {path}: {reason}")]
    CaseLoad {
        /// 케이스 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 케이스 레코드 유효성 검증 실패
    #[error("case validation error: case '{case}': {reason}")]
    CaseValidation {
        /// 문제가 된 케이스 이름
        case: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 환경변수 참조 순환
    #[error("environment cycle detected involving '{name}'")]
    EnvCycle {
        /// 순환에 포함된 변수명
        name: String,
    },

    /// 정의되지 않은 환경변수 참조
    #[error("undefined variable '{reference}' referenced while resolving '{name}'")]
    EnvUnresolved {
        /// 치환 중이던 변수명
        name: String,
        /// 찾을 수 없는 참조 대상
        reference: String,
    },

    /// 셸 프로세스 생성 실패
    #[error("failed to spawn shell: {0}")]
    Spawn(String),

    /// 셸 프로세스 대기 실패
    #[error("failed to wait for shell: {0}")]
    Wait(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),
}

impl From<CaseRunnerError> for CaseflowError {
    fn from(err: CaseRunnerError) -> Self {
        match err {
            CaseRunnerError::CaseLoad { path, reason } => {
                CaseflowError::Case(CaseError::LoadFailed { path, reason })
            }
            CaseRunnerError::CaseValidation { case, reason } => {
                CaseflowError::Case(CaseError::Invalid { case, reason })
            }
            CaseRunnerError::EnvCycle { ref name } => CaseflowError::Case(CaseError::EnvBinding {
                name: name.clone(),
                reason: err.to_string(),
            }),
            CaseRunnerError::EnvUnresolved { ref name, .. } => {
                let name = name.clone();
                CaseflowError::Case(CaseError::EnvBinding {
                    name,
                    reason: err.to_string(),
                })
            }
            CaseRunnerError::Spawn(reason) => CaseflowError::Exec(ExecError::Spawn(reason)),
            CaseRunnerError::Wait(reason) => CaseflowError::Exec(ExecError::Wait(reason)),
            CaseRunnerError::Config { field, reason } => {
                CaseflowError::Config(ConfigError::InvalidValue { field, reason })
            }
            CaseRunnerError::Channel(reason) => {
                CaseflowError::Exec(ExecError::ChannelSend(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_load_maps_to_case_error() {
        let err: CaseflowError = CaseRunnerError::CaseLoad {
            path: "suite/basic/case.toml".to_owned(),
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, CaseflowError::Case(_)));
        assert!(err.to_string().contains("suite/basic/case.toml"));
    }

    #[test]
    fn env_cycle_maps_to_env_binding() {
        let err: CaseflowError = CaseRunnerError::EnvCycle {
            name: "SNAP_DIR".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            CaseflowError::Case(CaseError::EnvBinding { .. })
        ));
        assert!(err.to_string().contains("SNAP_DIR"));
    }

    #[test]
    fn spawn_maps_to_exec_error() {
        let err: CaseflowError = CaseRunnerError::Spawn("no such file".to_owned()).into();
        assert!(matches!(err, CaseflowError::Exec(ExecError::Spawn(_))));
    }

    #[test]
    fn config_maps_to_config_error() {
        let err: CaseflowError = CaseRunnerError::Config {
            field: "workers".to_owned(),
            reason: "must be at least 1".to_owned(),
        }
        .into();
        assert!(matches!(err, CaseflowError::Config(_)));
    }

    #[test]
    fn env_unresolved_display_names_both_sides() {
        let err = CaseRunnerError::EnvUnresolved {
            name: "SNAP_DIR".to_owned(),
            reference: "PROJECT_ROOT".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SNAP_DIR"));
        assert!(msg.contains("PROJECT_ROOT"));
    }
}
