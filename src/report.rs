//! Output formatting for scan results.
//!
//! Supports two output formats:
//! - Text: diagnostic blocks on stderr, the form pre-commit runners show
//! - JSON: one structured report on stdout for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::detect::{Check, Finding, ProcessingError, ScanObserver, ScanSummary, Severity};

// =============================================================================
// Text Format
// =============================================================================

/// Indentation for detail lines below a diagnostic header.
const DETAIL_INDENT: &str = "    ";

fn severity_tag(severity: Severity, color: bool) -> String {
    let tag = format!("[{}]", severity.tag());
    if !color {
        return tag;
    }
    match severity {
        Severity::Error => tag.red().bold().to_string(),
        Severity::Warning => tag.yellow().bold().to_string(),
    }
}

/// Render one finding as a diagnostic block, including the trailing blank
/// separator line.
pub fn render_finding(finding: &Finding, color: bool) -> String {
    let mut out = format!(
        "{} {}:{}: {}\n",
        severity_tag(finding.severity, color),
        finding.file,
        finding.line,
        finding.message
    );
    if let Some(snippet) = &finding.snippet {
        out.push_str(DETAIL_INDENT);
        out.push_str(snippet);
        out.push('\n');
    }
    for hint in &finding.hints {
        out.push_str(DETAIL_INDENT);
        out.push_str(hint);
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Render a processing error.
pub fn render_error(error: &ProcessingError, color: bool) -> String {
    format!(
        "{} Failed to process {}: {}\n",
        severity_tag(Severity::Error, color),
        error.file,
        error.cause
    )
}

/// Streams diagnostic blocks as each file finishes.
///
/// Write failures do not interrupt the scan; the first one is kept and
/// returned by [`TextReporter::finish`].
pub struct TextReporter<W: Write> {
    out: W,
    color: bool,
    failed: Option<std::io::Error>,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            failed: None,
        }
    }

    fn emit(&mut self, text: &str) {
        if self.failed.is_some() {
            return;
        }
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
        {
            self.failed = Some(e);
        }
    }

    /// Surface the first write error, if any.
    pub fn finish(self) -> std::io::Result<()> {
        match self.failed {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<W: Write> ScanObserver for TextReporter<W> {
    fn on_finding(&mut self, finding: &Finding) {
        let text = render_finding(finding, self.color);
        self.emit(&text);
    }

    fn on_error(&mut self, error: &ProcessingError) {
        let text = render_error(error, self.color);
        self.emit(&text);
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub check: String,
    pub passed: bool,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub findings: Vec<JsonFinding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ProcessingError>,
}

/// JSON finding structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFinding {
    pub rule: String,
    pub severity: String,
    pub file: String,
    pub line: usize,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Build the JSON report for a run.
pub fn json_report(check: Check, summary: &ScanSummary) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        check: check.as_str().to_string(),
        passed: !(check.is_blocking() && summary.blocking()),
        files_scanned: summary.scanned,
        files_skipped: summary.skipped,
        findings: summary.findings.iter().map(finding_to_json).collect(),
        errors: summary.errors.clone(),
    }
}

/// Write results in JSON format.
pub fn write_json<W: Write>(
    out: &mut W,
    check: Check,
    summary: &ScanSummary,
) -> anyhow::Result<()> {
    let report = json_report(check, summary);
    let json = serde_json::to_string_pretty(&report)?;
    writeln!(out, "{}", json)?;
    Ok(())
}

fn finding_to_json(f: &Finding) -> JsonFinding {
    JsonFinding {
        rule: f.rule.as_str().to_string(),
        severity: f.severity.to_string(),
        file: f.file.clone(),
        line: f.line,
        message: f.message.clone(),
        snippet: f.snippet.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Rule;

    fn panic_finding() -> Finding {
        Finding {
            rule: Rule::ForbiddenPanic,
            severity: Severity::Error,
            file: "internal/card/service.go".to_string(),
            line: 42,
            message: "Direct use of panic() detected.".to_string(),
            snippet: Some("panic(\"boom\")".to_string()),
            hints: vec![
                "Prefer returning errors instead of panic in production code.".to_string(),
                "Add // ALLOW-PANIC comment to exempt this line if panic is necessary.".to_string(),
            ],
        }
    }

    #[test]
    fn test_render_finding_block() {
        let text = render_finding(&panic_finding(), false);
        assert_eq!(
            text,
            "[ERROR] internal/card/service.go:42: Direct use of panic() detected.\n\
             \x20   panic(\"boom\")\n\
             \x20   Prefer returning errors instead of panic in production code.\n\
             \x20   Add // ALLOW-PANIC comment to exempt this line if panic is necessary.\n\
             \n"
        );
    }

    #[test]
    fn test_render_warning_without_details() {
        let finding = Finding {
            rule: Rule::FileLong,
            severity: Severity::Warning,
            file: "big.go".to_string(),
            line: 501,
            message: "File exceeds 500 non-empty lines (640 lines). Consider refactoring."
                .to_string(),
            snippet: None,
            hints: vec![],
        };
        assert_eq!(
            render_finding(&finding, false),
            "[WARNING] big.go:501: File exceeds 500 non-empty lines (640 lines). Consider refactoring.\n\n"
        );
    }

    #[test]
    fn test_text_reporter_keeps_visit_order() {
        let gone = ProcessingError {
            file: "gone.go".to_string(),
            cause: "No such file or directory (os error 2)".to_string(),
        };
        let mut buf = Vec::new();
        let mut reporter = TextReporter::new(&mut buf, false);
        reporter.on_error(&gone);
        reporter.on_finding(&panic_finding());
        reporter.finish().unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with(
            "[ERROR] Failed to process gone.go: No such file or directory (os error 2)\n\
             [ERROR] internal/card/service.go:42:"
        ));
    }

    #[test]
    fn test_json_report_passed_flag() {
        let summary = ScanSummary {
            findings: vec![panic_finding()],
            ..Default::default()
        };
        assert!(!json_report(Check::Panics, &summary).passed);
        assert!(json_report(Check::WarnLongFiles, &summary).passed);
        assert!(json_report(Check::Panics, &ScanSummary::new()).passed);
    }

    #[test]
    fn test_write_json_is_parseable() {
        let summary = ScanSummary {
            findings: vec![panic_finding()],
            scanned: 3,
            skipped: 1,
            ..Default::default()
        };
        let mut buf = Vec::new();
        write_json(&mut buf, Check::Panics, &summary).unwrap();

        let report: JsonReport = serde_json::from_slice(&buf).unwrap();
        assert_eq!(report.check, "panics");
        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.findings[0].rule, "forbidden_panic");
        assert_eq!(report.findings[0].severity, "error");
        assert!(report.errors.is_empty());
    }
}
