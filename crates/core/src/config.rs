//! 설정 관리 — caseflow.toml 파싱 및 런타임 설정
//!
//! [`CaseflowConfig`]는 러너 전체의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CASEFLOW_SUITE_WORKERS=4` 형식)
//! 3. 설정 파일 (`caseflow.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), caseflow_core::error::CaseflowError> {
//! use caseflow_core::config::CaseflowConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = CaseflowConfig::load("caseflow.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = CaseflowConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CaseflowError, ConfigError};

/// Caseflow 통합 설정
///
/// `caseflow.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseflowConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스위트 실행 설정
    #[serde(default)]
    pub suite: SuiteConfig,
    /// 리포트 출력 설정
    #[serde(default)]
    pub report: ReportConfig,
}

impl CaseflowConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CaseflowError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CaseflowError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CaseflowError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CaseflowError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, CaseflowError> {
        toml::from_str(toml_str).map_err(|e| {
            CaseflowError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CASEFLOW_{SECTION}_{FIELD}`
    /// 예: `CASEFLOW_SUITE_WORKERS=4`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CASEFLOW_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CASEFLOW_GENERAL_LOG_FORMAT");

        // Suite
        override_string(&mut self.suite.root_dir, "CASEFLOW_SUITE_ROOT_DIR");
        override_usize(&mut self.suite.workers, "CASEFLOW_SUITE_WORKERS");
        override_bool(
            &mut self.suite.include_manual,
            "CASEFLOW_SUITE_INCLUDE_MANUAL",
        );
        override_string(&mut self.suite.shell, "CASEFLOW_SUITE_SHELL");
        override_u64(
            &mut self.suite.warn_timeout_secs,
            "CASEFLOW_SUITE_WARN_TIMEOUT_SECS",
        );
        override_usize(
            &mut self.suite.output_tail_lines,
            "CASEFLOW_SUITE_OUTPUT_TAIL_LINES",
        );

        // Report
        override_string(&mut self.report.format, "CASEFLOW_REPORT_FORMAT");
        override_string(&mut self.report.output_path, "CASEFLOW_REPORT_OUTPUT_PATH");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CaseflowError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.suite.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "suite.workers".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.suite.shell.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "suite.shell".to_owned(),
                reason: "shell must not be empty".to_owned(),
            }
            .into());
        }

        if self.suite.warn_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "suite.warn_timeout_secs".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        // report format 검증
        let valid_report_formats = ["text", "json"];
        if !valid_report_formats.contains(&self.report.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "report.format".to_owned(),
                reason: format!("must be one of: {}", valid_report_formats.join(", ")),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 스위트 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// 케이스 탐색 루트 디렉토리
    pub root_dir: String,
    /// 동시 실행 워커 수
    pub workers: usize,
    /// manual 케이스를 스위프에 포함할지 여부
    pub include_manual: bool,
    /// 페이즈 실행에 사용할 셸
    pub shell: String,
    /// 케이스가 warn_timeout을 지정하지 않았을 때의 기본값 (초)
    pub warn_timeout_secs: u64,
    /// 리포트에 보존할 출력 tail 줄 수
    pub output_tail_lines: usize,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            root_dir: ".".to_owned(),
            workers: 1,
            include_manual: false,
            shell: "sh".to_owned(),
            warn_timeout_secs: 600,
            output_tail_lines: 20,
        }
    }
}

/// 리포트 출력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 리포트 형식 (text, json)
    pub format: String,
    /// 리포트 출력 경로 (빈 문자열이면 stdout)
    pub output_path: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "text".to_owned(),
            output_path: String::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
