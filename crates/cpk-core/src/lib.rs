//! Shared types for the context profile kit: diagnostics, validation
//! reports, config document metadata, and the library error taxonomy.

pub mod diagnostics;
pub mod document;
pub mod error;

pub use diagnostics::{Diagnostic, DiagnosticKind, ReportSummary, Severity, ValidationReport};
pub use document::{ConfigDocument, ConfigKind, SourceFingerprint};
pub use error::LibraryError;
