//! Overrun report formatting.
//!
//! A report is assembled only once an overrun is confirmed, so the text it
//! carries (including any diagnostic output) reflects the state at the moment
//! of failure rather than at scope entry.

use std::fmt;

/// Spaces per indentation level in reports.
pub const REPORT_INDENT: usize = 4;

/// Split `text` into lines and indent each one to `level`.
///
/// The leading whitespace common to all non-blank lines is stripped first so
/// that pre-indented output (stack dumps, command output) keeps its relative
/// shape. Blank lines come out empty.
#[must_use]
pub fn split_and_indent_lines(text: &str, level: usize, indent: usize) -> Vec<String> {
    let common = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len().saturating_sub(line.trim_start().len()))
        .min()
        .unwrap_or(0);
    let prefix = " ".repeat(level.saturating_mul(indent));

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                let body = line.get(common..).unwrap_or(line);
                format!("{prefix}{body}")
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DiagnosticSection {
    Captured(String),
    Failed(String),
}

/// The text logged when a monitored scope overruns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrunReport<'a> {
    label: &'a str,
    message: &'a str,
    diagnostic: Option<DiagnosticSection>,
}

impl<'a> OverrunReport<'a> {
    /// Report with the scope label and message only.
    #[must_use]
    pub fn new(label: &'a str, message: &'a str) -> Self {
        Self {
            label,
            message,
            diagnostic: None,
        }
    }

    /// Attach the output of a diagnostic callback.
    #[must_use]
    pub fn with_diagnostic(mut self, output: impl Into<String>) -> Self {
        self.diagnostic = Some(DiagnosticSection::Captured(output.into()));
        self
    }

    /// Attach the reason a diagnostic callback failed.
    #[must_use]
    pub fn with_diagnostic_failure(mut self, cause: impl Into<String>) -> Self {
        self.diagnostic = Some(DiagnosticSection::Failed(cause.into()));
        self
    }

    /// Whether the diagnostic section records a failure.
    #[must_use]
    pub fn is_diagnostic_failure(&self) -> bool {
        matches!(self.diagnostic, Some(DiagnosticSection::Failed(_)))
    }

    /// Render the report as newline separated lines.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "MonitoredScope({}): Timeout waiting for thread to exit monitored scope.",
                self.label
            ),
            format!("MESSAGE: {}", self.message),
        ];

        match &self.diagnostic {
            Some(DiagnosticSection::Captured(output)) => {
                lines.push("DIAGNOSTIC:".to_string());
                lines.extend(split_and_indent_lines(output, 1, REPORT_INDENT));
            }
            Some(DiagnosticSection::Failed(cause)) => {
                lines.push("DIAGNOSTIC FAILED: error while capturing diagnostic".to_string());
                lines.extend(split_and_indent_lines(cause, 1, REPORT_INDENT));
            }
            None => {}
        }

        lines
    }
}

impl fmt::Display for OverrunReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_single_level() {
        let lines = split_and_indent_lines("alpha\nbeta", 1, 4);
        assert_eq!(lines, vec!["    alpha", "    beta"]);
    }

    #[test]
    fn test_indent_strips_common_prefix() {
        let lines = split_and_indent_lines("    frame 0\n      at foo\n    frame 1", 1, 2);
        assert_eq!(lines, vec!["  frame 0", "    at foo", "  frame 1"]);
    }

    #[test]
    fn test_indent_blank_lines_ignored_for_prefix() {
        let lines = split_and_indent_lines("  a\n\n  b\n   ", 2, 2);
        assert_eq!(lines, vec!["    a", "", "    b", ""]);
    }

    #[test]
    fn test_indent_empty_text() {
        assert!(split_and_indent_lines("", 1, 4).is_empty());
    }

    #[test]
    fn test_report_without_diagnostic() {
        let report = OverrunReport::new("RunCommand", "Running command on node 10.0.0.4");
        assert_eq!(
            report.render(),
            "MonitoredScope(RunCommand): Timeout waiting for thread to exit monitored scope.\n\
             MESSAGE: Running command on node 10.0.0.4"
        );
        assert!(!report.is_diagnostic_failure());
    }

    #[test]
    fn test_report_with_diagnostic() {
        let report = OverrunReport::new("Query", "status").with_diagnostic("state: busy\nqueue: 4");
        let text = report.render();
        assert!(text.ends_with("DIAGNOSTIC:\n    state: busy\n    queue: 4"));
    }

    #[test]
    fn test_report_with_failure() {
        let report = OverrunReport::new("Query", "status").with_diagnostic_failure("boom");
        assert!(report.is_diagnostic_failure());
        assert!(report.render().contains("DIAGNOSTIC FAILED"));
        assert!(report.render().ends_with("    boom"));
    }
}
