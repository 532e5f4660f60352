//! Diagnostic model: findings, codes, severity policy and reports.

pub mod code;
pub mod finding;
pub mod report;
pub mod severity;

pub use code::{CodeGroup, ErrorCode};
pub use finding::{Finding, FindingList, FindingSink, Severity};
pub use report::{ReportGroup, SubmitterReport};
pub use severity::{AccessionPolicy, severity_for};
