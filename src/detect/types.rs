//! Core types for analysis results.

use serde::{Deserialize, Serialize};

use super::{DiagnosticId, SuppressedDiagnostic};
use crate::model::Location;

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Ordering weight; higher is more severe.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Error => 3,
            Severity::Warning => 2,
            Severity::Info => 1,
        }
    }

    /// Whether `self` meets or exceeds `threshold`.
    pub fn at_least(self, threshold: Severity) -> bool {
        self.rank() >= threshold.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub severity: Severity,
    pub location: Location,
    pub message: String,
    /// Arguments substituted into the message template.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Diagnostic {
    /// Create a unique key for this diagnostic (for deduplication/comparison).
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.id.code(),
            self.location.file,
            self.location.span.start_byte,
            self.message
        )
    }

    pub fn file(&self) -> &str {
        &self.location.file
    }

    pub fn line(&self) -> usize {
        self.location.line()
    }
}

/// Results of analyzing one or more programs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics that were suppressed by inline comments
    #[serde(default)]
    pub suppressed: Vec<SuppressedDiagnostic>,
    /// Diagnostics dropped because their file matched `excluded_paths`
    #[serde(default)]
    pub excluded: usize,
    /// Number of model dumps analyzed
    pub models: usize,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: AnalysisResult) {
        self.diagnostics.extend(other.diagnostics);
        self.suppressed.extend(other.suppressed);
        self.excluded += other.excluded;
        self.models += other.models;
    }

    /// Number of suppressed diagnostics.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Whether the run passes at the given failure threshold.
    pub fn passed(&self, fail_on: Severity) -> bool {
        !self.diagnostics.iter().any(|d| d.severity.at_least(fail_on))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Span;

    fn diagnostic(severity: Severity) -> Diagnostic {
        Diagnostic {
            id: DiagnosticId::DontUseCursorRemove,
            severity,
            location: Location::new("Hooks.cs", Span::default()),
            message: "m".into(),
            args: vec![],
        }
    }

    #[test]
    fn test_passed_respects_threshold() {
        let result = AnalysisResult {
            diagnostics: vec![diagnostic(Severity::Warning)],
            ..Default::default()
        };
        assert!(!result.passed(Severity::Warning));
        assert!(!result.passed(Severity::Info));
        assert!(result.passed(Severity::Error));
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("ERROR".parse::<Severity>().unwrap(), Severity::Error);
        assert!("fatal".parse::<Severity>().is_err());
    }
}
