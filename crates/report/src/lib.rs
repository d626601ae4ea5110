#![doc = include_str!("../README.md")]

pub mod collector;
pub mod render;
pub mod report;

// --- Public API Re-exports ---

pub use collector::ReportCollector;
pub use render::{render_json, render_text};
pub use report::{CaseReport, SuiteReport, SuiteSummary};
