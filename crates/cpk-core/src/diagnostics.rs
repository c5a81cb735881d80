//! Structured validation findings and the aggregate report.
//!
//! Diagnostics are data, never raised: every pipeline stage appends to a
//! `ValidationReport` and validity is derived solely from the error count.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Severity of a single validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    YamlSyntax,
    SchemaValidation,
    MissingFileReference,
    MissingHookReference,
    UnknownMcpServer,
    CircularDependency,
    DeprecatedField,
    /// Informational roll-up attached to a clean batch report.
    Summary,
}

impl DiagnosticKind {
    /// Canonical name used in rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YamlSyntax => "YAMLSyntaxError",
            Self::SchemaValidation => "SchemaValidationError",
            Self::MissingFileReference => "MissingFileReference",
            Self::MissingHookReference => "MissingHookReference",
            Self::UnknownMcpServer => "UnknownMCPServer",
            Self::CircularDependency => "CircularDependency",
            Self::DeprecatedField => "DeprecatedField",
            Self::Summary => "Summary",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured validation finding with kind, message, and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Short source excerpt around the finding, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        file: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            file: file.into(),
            line: None,
            column: None,
            snippet: None,
        }
    }

    pub fn error(kind: DiagnosticKind, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, file, message)
    }

    pub fn warning(
        kind: DiagnosticKind,
        file: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, kind, file, message)
    }

    pub fn info(kind: DiagnosticKind, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, file, message)
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.kind, self.message)?;
        write!(f, " ({}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        write!(f, ")")
    }
}

/// Counters attached to a finished report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub files_checked: usize,
}

/// Aggregate validation result across files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub info: Vec<Diagnostic>,
    pub files_checked: BTreeSet<PathBuf>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a diagnostic into the list matching its severity.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
            Severity::Info => self.info.push(diagnostic),
        }
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn record_file(&mut self, path: impl Into<PathBuf>) {
        self.files_checked.insert(path.into());
    }

    /// Absorb another report (per-file reports into the aggregate).
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.info.extend(other.info);
        self.files_checked.extend(other.files_checked);
    }

    /// Validity derives solely from the error count. Warnings and info
    /// never affect it.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            errors: self.errors.len(),
            warnings: self.warnings.len(),
            info: self.info.len(),
            files_checked: self.files_checked.len(),
        }
    }

    /// One-line human-readable summary.
    pub fn summary_line(&self) -> String {
        let s = self.summary();
        format!(
            "{} file(s) checked: {} error(s), {} warning(s), {} info",
            s.files_checked, s.errors, s.warnings, s.info
        )
    }

    /// Sort each diagnostic list by (file path, line number).
    ///
    /// Batch validation must produce identical reports regardless of
    /// traversal order, so callers normalize before returning.
    pub fn normalize(&mut self) {
        let key = |d: &Diagnostic| (d.file.clone(), d.line.unwrap_or(0));
        self.errors.sort_by_key(key);
        self.warnings.sort_by_key(key);
        self.info.sort_by_key(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(severity: Severity, file: &str, line: Option<usize>) -> Diagnostic {
        let mut d = Diagnostic::new(severity, DiagnosticKind::SchemaValidation, file, "msg");
        d.line = line;
        d
    }

    #[test]
    fn test_kind_canonical_names() {
        assert_eq!(DiagnosticKind::YamlSyntax.as_str(), "YAMLSyntaxError");
        assert_eq!(
            DiagnosticKind::SchemaValidation.as_str(),
            "SchemaValidationError"
        );
        assert_eq!(DiagnosticKind::UnknownMcpServer.as_str(), "UnknownMCPServer");
    }

    #[test]
    fn test_display_includes_location() {
        let d = Diagnostic::error(DiagnosticKind::YamlSyntax, "/tmp/p.yaml", "bad indent")
            .with_location(3, 7);
        assert_eq!(
            d.to_string(),
            "error: YAMLSyntaxError: bad indent (/tmp/p.yaml:3:7)"
        );
    }

    #[test]
    fn test_display_without_location() {
        let d = Diagnostic::warning(DiagnosticKind::DeprecatedField, "/tmp/p.yaml", "legacy_hooks");
        assert_eq!(
            d.to_string(),
            "warning: DeprecatedField: legacy_hooks (/tmp/p.yaml)"
        );
    }

    #[test]
    fn test_push_routes_by_severity() {
        let mut report = ValidationReport::new();
        report.push(diag(Severity::Error, "a", None));
        report.push(diag(Severity::Warning, "a", None));
        report.push(diag(Severity::Info, "a", None));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.info.len(), 1);
    }

    #[test]
    fn test_is_valid_ignores_warnings() {
        let mut report = ValidationReport::new();
        report.push(diag(Severity::Warning, "a", None));
        report.push(diag(Severity::Info, "a", None));
        assert!(report.is_valid());
        report.push(diag(Severity::Error, "a", None));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_merge_accumulates() {
        let mut base = ValidationReport::new();
        base.push(diag(Severity::Error, "a", None));
        base.record_file("a");

        let mut other = ValidationReport::new();
        other.push(diag(Severity::Error, "b", None));
        other.record_file("b");

        base.merge(other);
        assert_eq!(base.errors.len(), 2);
        assert_eq!(base.files_checked.len(), 2);
    }

    #[test]
    fn test_normalize_sorts_by_file_then_line() {
        let mut report = ValidationReport::new();
        report.push(diag(Severity::Error, "b.yaml", Some(1)));
        report.push(diag(Severity::Error, "a.yaml", Some(9)));
        report.push(diag(Severity::Error, "a.yaml", Some(2)));
        report.normalize();

        let order: Vec<(String, Option<usize>)> = report
            .errors
            .iter()
            .map(|d| (d.file.display().to_string(), d.line))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.yaml".to_string(), Some(2)),
                ("a.yaml".to_string(), Some(9)),
                ("b.yaml".to_string(), Some(1)),
            ]
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut report = ValidationReport::new();
        report.push(diag(Severity::Error, "a", None));
        report.push(diag(Severity::Warning, "a", None));
        report.record_file("a");
        let summary = report.summary();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.info, 0);
        assert_eq!(summary.files_checked, 1);
        assert_eq!(
            report.summary_line(),
            "1 file(s) checked: 1 error(s), 1 warning(s), 0 info"
        );
    }

}
