//! CLI-specific error types and exit code mapping

use caseflow_case_runner::CaseRunnerError;
use caseflow_core::error::CaseflowError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// One or more case files failed to load or validate.
    #[error("{count} invalid case file(s)")]
    InvalidCases { count: usize },

    /// One or more executed cases failed or timed out.
    #[error("{count} case(s) did not pass")]
    CasesFailed { count: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from caseflow-core.
    #[error("{0}")]
    Core(#[from] CaseflowError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                             |
    /// |------|-------------------------------------|
    /// | 0    | Success                             |
    /// | 1    | General / command error             |
    /// | 2    | Configuration error                 |
    /// | 3    | Invalid case files                  |
    /// | 4    | Executed cases failed               |
    /// | 10   | IO error                            |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(CaseflowError::Config(_)) => 2,
            Self::InvalidCases { .. } => 3,
            Self::CasesFailed { .. } => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<CaseRunnerError> for CliError {
    fn from(e: CaseRunnerError) -> Self {
        Self::Core(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_core::error::ConfigError;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_core_config_error() {
        let err = CliError::Core(CaseflowError::Config(ConfigError::ParseFailed {
            reason: "bad".to_owned(),
        }));
        assert_eq!(
            err.exit_code(),
            2,
            "wrapped config error should return exit code 2"
        );
    }

    #[test]
    fn test_exit_code_invalid_cases() {
        let err = CliError::InvalidCases { count: 2 };
        assert_eq!(err.exit_code(), 3, "invalid cases should return exit code 3");
    }

    #[test]
    fn test_exit_code_cases_failed() {
        let err = CliError::CasesFailed { count: 1 };
        assert_eq!(err.exit_code(), 4, "failed cases should return exit code 4");
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(
            err.exit_code(),
            1,
            "command error should return exit code 1"
        );
    }

    #[test]
    fn test_error_display_cases_failed() {
        let err = CliError::CasesFailed { count: 3 };
        assert_eq!(err.to_string(), "3 case(s) did not pass");
    }

    #[test]
    fn test_from_case_runner_error() {
        let runner_err = CaseRunnerError::CaseLoad {
            path: "suite/case.toml".to_owned(),
            reason: "bad toml".to_owned(),
        };
        let cli_err: CliError = runner_err.into();
        match cli_err {
            CliError::Core(_) => {}
            _ => panic!("expected Core error variant"),
        }
    }

    #[test]
    fn test_error_debug_format() {
        let err = CliError::Config("test".to_owned());
        let debug_str = format!("{:?}", err);
        assert!(
            debug_str.contains("Config"),
            "debug format should show variant name"
        );
    }
}
