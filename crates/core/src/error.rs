//! 에러 타입 — 도메인별 에러 정의

/// Caseflow 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum CaseflowError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 케이스 로딩/검증 에러
    #[error("case error: {0}")]
    Case(#[from] CaseError),

    /// 페이즈 실행 에러
    #[error("exec error: {0}")]
    Exec(#[from] ExecError),

    /// 리포트 생성 에러
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 케이스 로딩/검증 에러
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// 케이스 파일 로딩 실패
    #[error("case load error: {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// 케이스 레코드 유효성 검증 실패
    #[error("invalid case '{case}': {reason}")]
    Invalid { case: String, reason: String },

    /// 환경변수 바인딩 실패
    #[error("environment binding failed for '{name}': {reason}")]
    EnvBinding { name: String, reason: String },
}

/// 페이즈 실행 에러
///
/// 페이즈 스크립트의 non-zero 종료는 에러가 아니라 케이스 판정(`Verdict`)으로
/// 처리됩니다. 이 타입은 실행 인프라 자체의 실패만 표현합니다.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// 서브프로세스 생성 실패
    #[error("failed to spawn shell: {0}")]
    Spawn(String),

    /// 서브프로세스 대기 실패
    #[error("failed to wait for shell: {0}")]
    Wait(String),

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),
}

/// 리포트 생성 에러
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// 렌더링 실패
    #[error("render failed: {0}")]
    Render(String),

    /// 리포트 파일 쓰기 실패
    #[error("failed to write report to {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}
