//! Findings and the ordered list a validation run produces.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::code::ErrorCode;
use crate::error::Result;

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only, may not require action.
    Info,
    /// Potential issue that should be reviewed.
    Warning,
    /// Definite issue that should be addressed.
    Error,
    /// Blocks the submission.
    Critical,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Critical => "Critical",
        }
    }

    /// One step up, saturating at `Critical`.
    pub fn raised(self) -> Self {
        match self {
            Severity::Info => Severity::Warning,
            Severity::Warning => Severity::Error,
            Severity::Error | Severity::Critical => Severity::Critical,
        }
    }

    /// One step down, saturating at `Info`.
    pub fn lowered(self) -> Self {
        match self {
            Severity::Critical => Severity::Error,
            Severity::Error => Severity::Warning,
            Severity::Warning | Severity::Info => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reported validation result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: ErrorCode,
    /// Best id of the offending record; empty when none applies.
    pub accession: String,
    pub message: String,
}

impl Finding {
    pub fn new(
        severity: Severity,
        code: ErrorCode,
        accession: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            accession: accession.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.accession,
            self.severity.label(),
            self.code.as_str(),
            self.message
        )
    }
}

/// Findings of one run, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingList {
    findings: Vec<Finding>,
}

impl FindingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.findings.iter()
    }

    pub fn as_slice(&self) -> &[Finding] {
        &self.findings
    }

    pub fn with_code(&self, code: ErrorCode) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.code == code)
    }

    pub fn count(&self, code: ErrorCode) -> usize {
        self.with_code(code).count()
    }

    pub fn has(&self, code: ErrorCode) -> bool {
        self.with_code(code).next().is_some()
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    /// Drop findings whose code is in `codes`, keeping order.
    pub fn remove_codes(&mut self, codes: &[ErrorCode]) {
        self.findings.retain(|f| !codes.contains(&f.code));
    }

    pub fn retain<F: FnMut(&Finding) -> bool>(&mut self, f: F) {
        self.findings.retain(f);
    }

    /// One line per finding.
    pub fn to_lines(&self) -> Vec<String> {
        self.findings.iter().map(Finding::to_string).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.findings)?)
    }

    pub fn into_vec(self) -> Vec<Finding> {
        self.findings
    }
}

impl From<Vec<Finding>> for FindingList {
    fn from(findings: Vec<Finding>) -> Self {
        Self { findings }
    }
}

impl IntoIterator for FindingList {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.into_iter()
    }
}

impl<'a> IntoIterator for &'a FindingList {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}

/// Append-only collector handed to rule functions.
#[derive(Debug, Default)]
pub struct FindingSink {
    findings: Vec<Finding>,
}

impl FindingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        log::trace!("{}", finding);
        self.findings.push(finding);
    }

    pub fn post(
        &mut self,
        severity: Severity,
        code: ErrorCode,
        accession: &str,
        message: impl Into<String>,
    ) {
        self.push(Finding::new(severity, code, accession, message));
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings pushed since `mark`, used by narrow runs and tests.
    pub fn since(&self, mark: usize) -> &[Finding] {
        &self.findings[mark.min(self.findings.len())..]
    }

    pub fn finish(self) -> FindingList {
        FindingList::from(self.findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_line() {
        let f = Finding::new(
            Severity::Warning,
            ErrorCode::TerminalNs,
            "lcl|nuc",
            "N at beginning of sequence",
        );
        assert_eq!(f.to_string(), "lcl|nuc:Warning:TerminalNs:N at beginning of sequence");
    }

    #[test]
    fn test_severity_steps_saturate() {
        assert_eq!(Severity::Critical.raised(), Severity::Critical);
        assert_eq!(Severity::Info.lowered(), Severity::Info);
        assert_eq!(Severity::Warning.raised(), Severity::Error);
    }

    #[test]
    fn test_remove_codes_keeps_order() {
        let mut list = FindingList::from(vec![
            Finding::new(Severity::Info, ErrorCode::Range, "a", "1"),
            Finding::new(Severity::Info, ErrorCode::BadDate, "a", "2"),
            Finding::new(Severity::Info, ErrorCode::Range, "a", "3"),
            Finding::new(Severity::Info, ErrorCode::NoStop, "a", "4"),
        ]);
        list.remove_codes(&[ErrorCode::BadDate]);
        let messages: Vec<&str> = list.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["1", "3", "4"]);
        assert_eq!(list.count(ErrorCode::Range), 2);
    }

    #[test]
    fn test_json_export() {
        let list = FindingList::from(vec![Finding::new(
            Severity::Error,
            ErrorCode::MisMatchAa,
            "lcl|prot",
            "x",
        )]);
        let json = list.to_json().unwrap();
        assert!(json.contains("\"MisMatchAA\""));
        assert!(json.contains("\"error\""));
    }
}
