//! 케이스 러너 설정
//!
//! [`CaseRunnerConfig`]는 케이스 실행에 필요한 설정만 담습니다.
//! `caseflow.toml`의 `[suite]` 섹션([`SuiteConfig`])에서
//! [`CaseRunnerConfig::from_core`]로 변환해 사용합니다.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use caseflow_core::config::SuiteConfig;

use crate::error::CaseRunnerError;

/// 케이스 러너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseRunnerConfig {
    /// 페이즈 실행에 사용할 셸
    pub shell: String,
    /// 케이스가 warn_timeout을 지정하지 않았을 때의 기본값 (초)
    pub default_warn_timeout_secs: u64,
    /// 리포트에 보존할 stdout/stderr tail 줄 수
    pub output_tail_lines: usize,
    /// manual 케이스를 스위프에 포함할지 여부
    pub include_manual: bool,
    /// 동시 실행 워커 수
    pub workers: usize,
}

impl Default for CaseRunnerConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_owned(),
            default_warn_timeout_secs: 600,
            output_tail_lines: 20,
            include_manual: false,
            workers: 1,
        }
    }
}

impl CaseRunnerConfig {
    /// core의 `[suite]` 섹션에서 러너 설정을 생성합니다.
    pub fn from_core(core: &SuiteConfig) -> Self {
        Self {
            shell: core.shell.clone(),
            default_warn_timeout_secs: core.warn_timeout_secs,
            output_tail_lines: core.output_tail_lines,
            include_manual: core.include_manual,
            workers: core.workers,
        }
    }

    /// 케이스가 타임아웃을 지정하지 않았을 때 사용할 기본값
    pub fn default_warn_timeout(&self) -> Duration {
        Duration::from_secs(self.default_warn_timeout_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CaseRunnerError> {
        if self.shell.trim().is_empty() {
            return Err(CaseRunnerError::Config {
                field: "shell".to_owned(),
                reason: "shell must not be empty".to_owned(),
            });
        }
        if self.default_warn_timeout_secs == 0 {
            return Err(CaseRunnerError::Config {
                field: "default_warn_timeout_secs".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.workers == 0 {
            return Err(CaseRunnerError::Config {
                field: "workers".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        CaseRunnerConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_copies_all_fields() {
        let core = SuiteConfig {
            root_dir: "suite".to_owned(),
            workers: 4,
            include_manual: true,
            shell: "bash".to_owned(),
            warn_timeout_secs: 120,
            output_tail_lines: 50,
        };
        let config = CaseRunnerConfig::from_core(&core);
        assert_eq!(config.shell, "bash");
        assert_eq!(config.default_warn_timeout_secs, 120);
        assert_eq!(config.output_tail_lines, 50);
        assert!(config.include_manual);
        assert_eq!(config.workers, 4);
        assert_eq!(config.default_warn_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn validate_rejects_empty_shell() {
        let config = CaseRunnerConfig {
            shell: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = CaseRunnerConfig {
            default_warn_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let config = CaseRunnerConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
