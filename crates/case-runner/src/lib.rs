#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`CaseRunnerError`)
//! - [`config`]: Runner configuration (`CaseRunnerConfig`)
//! - [`loader`]: Case file parsing and suite discovery
//! - [`env`]: Environment binding (`bind_environment`, `substitute`)
//! - [`process`]: Shell execution abstraction (`ShellRunner` trait, `SystemShellRunner`)
//! - [`executor`]: Phase executor (`PhaseExecutor`)
//! - [`runner`]: Single-case orchestrator (`CaseRunner`, `CaseRunnerBuilder`)
//! - [`suite`]: Priority-ordered sweep with worker pool (`SuiteRunner`)
//!
//! # Architecture
//!
//! ```text
//! case.toml --loader--> TestCase
//!                          |
//!                    bind_environment()
//!                          |
//!                    PhaseExecutor (prepare -> execute -> restore)
//!                          |
//!                    CaseEvent --mpsc--> report
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod executor;
pub mod loader;
pub mod process;
pub mod runner;
pub mod suite;

// --- Public API Re-exports ---

// Runner (main orchestrator)
pub use runner::{CaseRunner, CaseRunnerBuilder};

// Suite sweep
pub use suite::{SuiteRun, SuiteRunner};

// Configuration
pub use config::CaseRunnerConfig;

// Error
pub use error::CaseRunnerError;

// Loading
pub use loader::{CASE_FILE_NAME, LoadDefaults, discover_case_files, discover_cases,
    load_case_from_file, parse_case};

// Environment binding
pub use env::{bind_environment, builtin_env, substitute};

// Shell execution
pub use process::{ShellInvocation, ShellOutput, ShellRunner, ShellStatus, SystemShellRunner};

// Phase execution
pub use executor::PhaseExecutor;
