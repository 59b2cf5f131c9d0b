//! Diagnostics infrastructure shared by checks, repair passes, and readers.
//!
//! Consistency checks and repair passes never panic on model defects; they
//! collect issues here and let the caller decide. Issues carry:
//!
//! - Severity levels (Warning, Error)
//! - Categories for grouping (topology, phase, reference, unit, ...)
//! - Optional entity references (e.g., "load_634a", "transformer_xfm1")
//! - Serialization for JSON output
//!
//! # Example
//!
//! ```
//! use dnt_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//!
//! // A semantic warning: the run continues
//! diag.add_warning("topology", "substation sub_2 nested inside sub_1");
//!
//! // A structural error with the offending entity
//! diag.add_error_with_entity("reference", "from_element references unknown node", "line_14");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but the pass continued (e.g., defaulted value, nested substation)
    Warning,
    /// Structural defect the pass could not resolve
    Error,
}

/// A single diagnostic issue encountered during an operation
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    /// Severity of the issue
    pub severity: Severity,
    /// Category for grouping (e.g., "topology", "phase", "reference", "unit")
    pub category: String,
    /// Human-readable description of the issue
    pub message: String,
    /// Optional entity reference (e.g., "load_634a", "line_650_632")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    /// Create a new diagnostic issue
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            entity: None,
        }
    }

    /// Add entity reference to the issue
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues for an operation
///
/// This is the primary container for tracking warnings and errors during
/// reads, consistency checks, and repair passes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    /// All collected issues
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    /// Create new empty diagnostics
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw issue directly
    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    /// Add a warning with category and message
    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    /// Add a warning with entity reference
    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    /// Add an error with category and message
    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    /// Add an error with entity reference
    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    /// Count warning issues
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Count error issues
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Check if there are any issues
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    /// Get issues filtered by category
    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Get only error issues
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Get only warning issues
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// Merge another diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    /// Clear all issues
    pub fn clear(&mut self) {
        self.issues.clear();
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning("unit", "unknown length unit 'furlong'");
        diag.add_error("reference", "dangling to_element");

        assert_eq!(diag.warning_count(), 1);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_issues());
        assert!(diag.has_errors());
        assert!(diag.has_warnings());
    }

    #[test]
    fn test_diagnostics_serialization() {
        let mut diag = Diagnostics::new();
        diag.add_error_with_entity("reference", "unknown connecting element", "load_634a");

        let json = serde_json::to_string_pretty(&diag).unwrap();
        assert!(json.contains("\"error\""));
        assert!(json.contains("\"entity\": \"load_634a\""));
    }

    #[test]
    fn test_diagnostic_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Error, "phase", "winding phases mismatched")
            .with_entity("transformer_xfm1");

        let display = format!("{}", issue);
        assert!(display.contains("error"));
        assert!(display.contains("phase"));
        assert!(display.contains("transformer_xfm1"));
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "No issues");

        diag.add_warning("topology", "warning");
        assert_eq!(diag.summary(), "1 warning");

        diag.add_error("topology", "error");
        assert_eq!(diag.summary(), "1 warning, 1 error");

        diag.add_warning("topology", "another warning");
        assert_eq!(diag.summary(), "2 warnings, 1 error");
    }

    #[test]
    fn test_issues_by_category() {
        let mut diag = Diagnostics::new();
        diag.add_warning("phase", "phase warning");
        diag.add_warning("topology", "topology warning");
        diag.add_error("phase", "phase error");

        let phase_issues: Vec<_> = diag.issues_by_category("phase").collect();
        assert_eq!(phase_issues.len(), 2);
    }

    #[test]
    fn test_diagnostics_merge() {
        let mut diag1 = Diagnostics::new();
        diag1.add_warning("topology", "warning 1");

        let mut diag2 = Diagnostics::new();
        diag2.add_error("topology", "error 1");

        diag1.merge(diag2);
        assert_eq!(diag1.warning_count(), 1);
        assert_eq!(diag1.error_count(), 1);
    }
}
