//! 케이스 파일 로딩 — case.toml 파싱, 검증, 스위트 탐색
//!
//! 케이스 하나는 디렉토리 하나에 대응하며, 그 디렉토리의 `case.toml`이
//! 메타데이터와 페이즈 본문을 담습니다:
//!
//! ```toml
//! [case]
//! summary = "builds a basic package"
//! manual = false
//! priority = 50
//! warn_timeout = "10m"
//!
//! [environment]
//! SNAP_DIR = "$CASE_DIR/snaps/basic"
//!
//! [phases]
//! prepare = "tools install-backend"
//! execute = """
//! build-tool pack
//! [ -d prime ] && exit 1
//! """
//! restore = "tools cleanup"
//! ```
//!
//! 케이스 이름은 스위트 루트 기준 케이스 디렉토리의 상대 경로입니다.
//! 페이즈 본문은 불투명한 셸 텍스트로 취급되며 여기서 해석하지 않습니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use walkdir::WalkDir;

use caseflow_core::types::{TestCase, parse_duration};

use crate::env::is_identifier;
use crate::error::CaseRunnerError;

/// 케이스 파일 이름
pub const CASE_FILE_NAME: &str = "case.toml";

/// 케이스 파일 최대 크기 (파싱 전 검사)
const MAX_CASE_FILE_SIZE: u64 = 256 * 1024;

/// 케이스 로딩 기본값
#[derive(Debug, Clone)]
pub struct LoadDefaults {
    /// 케이스가 warn_timeout을 지정하지 않았을 때의 값
    pub warn_timeout: Duration,
}

impl Default for LoadDefaults {
    fn default() -> Self {
        Self {
            warn_timeout: Duration::from_secs(600),
        }
    }
}

/// case.toml의 원본 구조
#[derive(Debug, Deserialize)]
struct CaseFile {
    case: CaseMeta,
    #[serde(default)]
    environment: BTreeMap<String, String>,
    #[serde(default)]
    phases: PhaseTable,
}

#[derive(Debug, Deserialize)]
struct CaseMeta {
    summary: String,
    #[serde(default)]
    manual: bool,
    #[serde(default)]
    priority: i64,
    warn_timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PhaseTable {
    prepare: Option<String>,
    execute: Option<String>,
    restore: Option<String>,
}

/// TOML 파일에서 케이스를 로드합니다.
///
/// 케이스 이름은 파일이 놓인 디렉토리 이름에서 유도됩니다.
/// 스위트 루트 기준 상대 이름이 필요하면 [`discover_cases`]를 사용하세요.
///
/// # Errors
/// - 파일 읽기 실패 / 크기 초과
/// - TOML 파싱 실패
/// - 케이스 유효성 검증 실패
pub fn load_case_from_file(
    path: &Path,
    defaults: &LoadDefaults,
) -> Result<TestCase, CaseRunnerError> {
    let dir = path
        .parent()
        .ok_or_else(|| CaseRunnerError::CaseLoad {
            path: path.display().to_string(),
            reason: "case file has no parent directory".to_owned(),
        })?
        .to_path_buf();
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "case".to_owned());
    load_case(path, name, dir, defaults)
}

fn load_case(
    path: &Path,
    name: String,
    dir: PathBuf,
    defaults: &LoadDefaults,
) -> Result<TestCase, CaseRunnerError> {
    // Check file size before reading to prevent OOM
    let metadata = std::fs::metadata(path).map_err(|e| CaseRunnerError::CaseLoad {
        path: path.display().to_string(),
        reason: format!("failed to read metadata: {e}"),
    })?;

    if metadata.len() > MAX_CASE_FILE_SIZE {
        return Err(CaseRunnerError::CaseLoad {
            path: path.display().to_string(),
            reason: format!(
                "file too large: {} bytes (max: {MAX_CASE_FILE_SIZE})",
                metadata.len()
            ),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| CaseRunnerError::CaseLoad {
        path: path.display().to_string(),
        reason: format!("failed to read file: {e}"),
    })?;

    parse_case(&content, name, dir, defaults).map_err(|e| match e {
        CaseRunnerError::CaseLoad { reason, .. } => CaseRunnerError::CaseLoad {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}

/// TOML 문자열에서 케이스를 파싱하고 검증합니다.
pub fn parse_case(
    content: &str,
    name: String,
    dir: PathBuf,
    defaults: &LoadDefaults,
) -> Result<TestCase, CaseRunnerError> {
    let raw: CaseFile = toml::from_str(content).map_err(|e| CaseRunnerError::CaseLoad {
        path: dir.display().to_string(),
        reason: format!("failed to parse TOML: {e}"),
    })?;

    let warn_timeout = match raw.case.warn_timeout.as_deref() {
        Some(text) => parse_duration(text).ok_or_else(|| CaseRunnerError::CaseValidation {
            case: name.clone(),
            reason: format!("invalid warn_timeout '{text}' (expected e.g. \"30s\", \"10m\")"),
        })?,
        None => defaults.warn_timeout,
    };

    let execute = raw
        .phases
        .execute
        .ok_or_else(|| CaseRunnerError::CaseValidation {
            case: name.clone(),
            reason: "execute phase is required".to_owned(),
        })?;

    let case = TestCase {
        name,
        summary: raw.case.summary,
        manual: raw.case.manual,
        priority: raw.case.priority,
        warn_timeout,
        environment: raw.environment,
        prepare: raw.phases.prepare,
        execute,
        restore: raw.phases.restore,
        dir,
    };
    validate_case(&case)?;
    Ok(case)
}

/// 케이스 레코드의 유효성을 검증합니다.
fn validate_case(case: &TestCase) -> Result<(), CaseRunnerError> {
    if case.summary.trim().is_empty() {
        return Err(CaseRunnerError::CaseValidation {
            case: case.name.clone(),
            reason: "summary must not be empty".to_owned(),
        });
    }
    if case.execute.trim().is_empty() {
        return Err(CaseRunnerError::CaseValidation {
            case: case.name.clone(),
            reason: "execute phase must not be empty".to_owned(),
        });
    }
    if case.warn_timeout.is_zero() {
        return Err(CaseRunnerError::CaseValidation {
            case: case.name.clone(),
            reason: "warn_timeout must be greater than zero".to_owned(),
        });
    }
    for key in case.environment.keys() {
        if !is_identifier(key) {
            return Err(CaseRunnerError::CaseValidation {
                case: case.name.clone(),
                reason: format!("invalid environment variable name '{key}'"),
            });
        }
    }
    Ok(())
}

/// 스위트 루트 아래의 모든 케이스 파일 경로를 찾습니다.
///
/// 반환 목록은 결정적 실행 순서를 위해 경로 기준으로 정렬됩니다.
pub fn discover_case_files(suite_root: &Path) -> Result<Vec<PathBuf>, CaseRunnerError> {
    if !suite_root.is_dir() {
        return Err(CaseRunnerError::CaseLoad {
            path: suite_root.display().to_string(),
            reason: "suite root is not a directory".to_owned(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(suite_root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "failed to walk suite directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.file_name() == CASE_FILE_NAME {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// 스위트 루트 아래의 모든 케이스를 로드합니다.
///
/// 케이스 이름은 스위트 루트 기준 케이스 디렉토리의 상대 경로입니다.
/// 파싱에 실패한 파일은 경고 로그를 남기고 건너뜁니다
/// (명시적 검증은 `caseflow validate`가 수행합니다).
pub fn discover_cases(
    suite_root: &Path,
    defaults: &LoadDefaults,
) -> Result<Vec<TestCase>, CaseRunnerError> {
    let files = discover_case_files(suite_root)?;
    let mut cases = Vec::new();

    for path in files {
        let dir = match path.parent() {
            Some(d) => d.to_path_buf(),
            None => continue,
        };
        let name = case_name_for(suite_root, &dir);
        match load_case(&path, name, dir, defaults) {
            Ok(case) => {
                tracing::debug!(case = %case.name, path = %path.display(), "loaded case");
                cases.push(case);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load case file");
            }
        }
    }

    Ok(cases)
}

/// 스위트 루트 기준 케이스 이름을 계산합니다.
fn case_name_for(suite_root: &Path, case_dir: &Path) -> String {
    match case_dir.strip_prefix(suite_root) {
        Ok(rel) if !rel.as_os_str().is_empty() => {
            // 플랫폼 구분자와 무관하게 '/'로 정규화
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        }
        _ => case_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "case".to_owned()),
    }
}
