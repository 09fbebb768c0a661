//! Core diagnostic types for nilnop.
//!
//! The nilness pass produces `Diagnostic` values, and the formatters
//! (human, JSON) consume them.

use serde::{Deserialize, Serialize};

/// A diagnostic produced by the checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique ID: RULE_CODE-file:line (e.g., "NNP001-a.go:10").
    pub id: String,
    /// Rule code (e.g., "NNP001").
    pub rule: String,
    /// Report category: `nil` for nil arguments, `cond` for degenerate conditions.
    pub category: String,
    pub severity: Severity,
    /// One-line summary.
    pub title: String,
    /// Detailed explanation.
    pub explanation: String,
    pub location: Location,
    /// Fully qualified name of the function containing the finding.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
}

/// Severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(format!(
                "unknown severity `{other}` (expected info, warning, error or critical)"
            )),
        }
    }
}

impl Severity {
    /// Check if this severity is at or above a threshold.
    pub fn is_at_least(&self, threshold: Severity) -> bool {
        *self >= threshold
    }
}

/// Source code location.
///
/// Lines and columns are 1-based (matching Go's `token.Position`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Builder for creating diagnostics conveniently.
pub struct DiagnosticBuilder {
    rule: String,
    category: String,
    severity: Severity,
    title: String,
    file: String,
    line: u32,
    column: u32,
    end_line: u32,
    end_column: u32,
    explanation: String,
    function: String,
}

impl DiagnosticBuilder {
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            category: category.into(),
            severity,
            title: title.into(),
            file: String::new(),
            line: 0,
            column: 0,
            end_line: 0,
            end_column: 0,
            explanation: String::new(),
            function: String::new(),
        }
    }

    /// Set the location.
    pub fn location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self.column = column;
        self.end_line = line;
        self.end_column = column;
        self
    }

    /// Set the end location.
    pub fn end_location(mut self, end_line: u32, end_column: u32) -> Self {
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }

    pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    /// Build the diagnostic.
    pub fn build(self) -> Diagnostic {
        let id = format!("{}-{}:{}", self.rule, self.file, self.line);
        Diagnostic {
            id,
            rule: self.rule,
            category: self.category,
            severity: self.severity,
            title: self.title,
            explanation: self.explanation,
            location: Location {
                file: self.file,
                line: self.line,
                column: self.column,
                end_line: self.end_line,
                end_column: self.end_column,
            },
            function: self.function,
        }
    }
}

/// Per-severity counts over a set of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut counts = Self::default();
        for diag in diagnostics {
            match diag.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.critical + self.error + self.warning + self.info
    }

    /// Whether there are any issues at or above a severity threshold.
    pub fn has_issues_above(&self, threshold: Severity) -> bool {
        match threshold {
            Severity::Info => self.total() > 0,
            Severity::Warning => self.warning + self.error + self.critical > 0,
            Severity::Error => self.error + self.critical > 0,
            Severity::Critical => self.critical > 0,
        }
    }
}
