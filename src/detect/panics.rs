//! Detection of direct `panic(...)` calls.

use regex::Regex;
use std::path::Path;
use tracing::debug;

use crate::policy::PatternRules;

use super::files::{has_extension, read_utf8, split_lines};
use super::{
    display_path, FileOutcome, Finding, Rule, ScanError, ScanObserver, ScanSummary, Severity,
};

lazy_static::lazy_static! {
    static ref PANIC_CALL: Regex = Regex::new(r"\bpanic\([^)]*\)").unwrap();
}

/// Scan files for panic calls that carry no exemption.
pub fn detect_panics<P: AsRef<Path>>(
    files: &[P],
    rules: &PatternRules,
    observer: &mut dyn ScanObserver,
) -> ScanSummary {
    let mut summary = ScanSummary::new();

    for file in files {
        let path = file.as_ref();
        let shown = display_path(path);
        summary.record(&shown, scan_file(path, &shown, rules), observer);
    }

    summary
}

/// Scan a single file.
fn scan_file(path: &Path, shown: &str, rules: &PatternRules) -> Result<FileOutcome, ScanError> {
    if !has_extension(path, &rules.extensions) {
        debug!(file = shown, "not a source file, skipping");
        return Ok(FileOutcome::Skipped);
    }
    if rules.excluded.is_excluded(path) {
        debug!(file = shown, "excluded, skipping");
        return Ok(FileOutcome::Skipped);
    }

    let content = read_utf8(path)?;
    let lines = split_lines(&content);
    Ok(FileOutcome::Scanned(scan_lines(shown, &lines, rules)))
}

/// Check each line for a panic call. The current and the preceding line
/// are consulted for exemptions; at most one finding per line.
pub fn scan_lines(file: &str, lines: &[&str], rules: &PatternRules) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !PANIC_CALL.is_match(line) {
            continue;
        }
        if rules.exempt.matches_around(lines, i, 1, 0) {
            debug!(file, line = i + 1, "panic exempted");
            continue;
        }

        findings.push(Finding {
            rule: Rule::ForbiddenPanic,
            severity: Severity::Error,
            file: file.to_string(),
            line: i + 1,
            message: "Direct use of panic() detected.".to_string(),
            snippet: Some(line.trim().to_string()),
            hints: vec![
                "Prefer returning errors instead of panic in production code.".to_string(),
                "Add // ALLOW-PANIC comment to exempt this line if panic is necessary.".to_string(),
            ],
        });
    }

    findings
}
