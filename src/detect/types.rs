//! Core types for scan results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity levels for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the commit.
    Error,
    /// Reported, never blocks.
    Warning,
}

impl Severity {
    /// Tag printed in front of a diagnostic.
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Rule names for the different checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    #[serde(rename = "forbidden_panic")]
    ForbiddenPanic,
    #[serde(rename = "nondeterministic_order")]
    NondeterministicOrder,
    #[serde(rename = "file_too_long")]
    FileTooLong,
    #[serde(rename = "file_long")]
    FileLong,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::ForbiddenPanic => "forbidden_panic",
            Rule::NondeterministicOrder => "nondeterministic_order",
            Rule::FileTooLong => "file_too_long",
            Rule::FileLong => "file_long",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single reported policy violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule: Rule,
    pub severity: Severity,
    pub file: String,
    /// One-based line number.
    pub line: usize,
    pub message: String,
    /// The offending line, trimmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Remediation guidance, one entry per output line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

/// Errors that stop the scan of one file but never the whole run.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode as {encoding}")]
    Decode { encoding: &'static str },
}

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingError {
    pub file: String,
    pub cause: String,
}

/// Outcome of scanning a single file.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was scanned; the findings may be empty.
    Scanned(Vec<Finding>),
    /// The file was not considered (excluded, wrong extension, binary, ...).
    Skipped,
}

/// Receives each file's diagnostics as soon as that file is done.
///
/// Calls arrive in argument order, so a reporter can print findings and
/// processing errors interleaved exactly as the files were visited.
pub trait ScanObserver {
    fn on_finding(&mut self, finding: &Finding);
    fn on_error(&mut self, error: &ProcessingError);
}

/// Discards everything; the summary alone is kept.
impl ScanObserver for () {
    fn on_finding(&mut self, _finding: &Finding) {}
    fn on_error(&mut self, _error: &ProcessingError) {}
}

/// Results of running a check over a set of files.
///
/// Replaces a process-wide exit status: each file's outcome is folded in,
/// and the exit status is derived once at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub errors: Vec<ProcessingError>,
    /// Number of files scanned
    pub scanned: usize,
    /// Number of files skipped without scanning
    pub skipped: usize,
}

impl ScanSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the outcome of one file into the summary, passing its
    /// diagnostics on to the observer first.
    pub fn record(
        &mut self,
        file: &str,
        outcome: Result<FileOutcome, ScanError>,
        observer: &mut dyn ScanObserver,
    ) {
        match outcome {
            Ok(FileOutcome::Scanned(findings)) => {
                self.scanned += 1;
                for finding in &findings {
                    observer.on_finding(finding);
                }
                self.findings.extend(findings);
            }
            Ok(FileOutcome::Skipped) => self.skipped += 1,
            Err(e) => {
                let error = ProcessingError {
                    file: file.to_string(),
                    cause: e.to_string(),
                };
                observer.on_error(&error);
                self.errors.push(error);
            }
        }
    }

    /// Whether any finding should block the commit.
    pub fn blocking(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }
}

/// Display form of a path: relative to the working directory when it lies
/// beneath it, otherwise as given.
pub fn display_path(path: &std::path::Path) -> String {
    let shown: PathBuf = match std::env::current_dir() {
        Ok(cwd) if path.is_absolute() => path
            .strip_prefix(&cwd)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    };
    shown.to_string_lossy().to_string()
}
