//! Detection of files with too many non-blank lines.
//!
//! The same counting backs two checks: a hard limit that blocks the commit
//! and a soft limit that only warns.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::policy::LengthRules;

use super::files::split_lines;
use super::{
    display_path, FileOutcome, Finding, Rule, ScanError, ScanObserver, ScanSummary, Severity,
};

/// Bytes inspected for binary detection.
const SNIFF_LEN: usize = 1024;

/// Whether a length check blocks or warns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    Fail,
    Warn,
}

/// Text encodings recognised by their byte-order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Pick the encoding from the leading bytes of a file.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0xFF, 0xFE]) {
            TextEncoding::Utf16Le
        } else if bytes.starts_with(&[0xFE, 0xFF]) {
            TextEncoding::Utf16Be
        } else {
            TextEncoding::Utf8
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
        }
    }

    /// Decode the whole file, dropping any byte-order mark.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, ScanError> {
        let err = || ScanError::Decode {
            encoding: self.name(),
        };
        match self {
            TextEncoding::Utf8 => {
                let body = bytes.strip_prefix(&[0xEF_u8, 0xBB, 0xBF][..]).unwrap_or(bytes);
                std::str::from_utf8(body)
                    .map(str::to_string)
                    .map_err(|_| err())
            }
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                let body = bytes.get(2..).ok_or_else(err)?;
                if body.len() % 2 != 0 {
                    return Err(err());
                }
                let units = body.chunks_exact(2).map(|pair| match self {
                    TextEncoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
                    _ => u16::from_le_bytes([pair[0], pair[1]]),
                });
                char::decode_utf16(units)
                    .collect::<Result<String, _>>()
                    .map_err(|_| err())
            }
        }
    }
}

/// Heuristic binary check on the first bytes of a file.
///
/// Null bytes mark a file as binary unless they appear doubled or before a
/// newline, as they do in UTF-16 text.
pub fn looks_binary(sample: &[u8]) -> bool {
    let sample = &sample[..sample.len().min(SNIFF_LEN)];
    if !sample.contains(&0) {
        return false;
    }
    let wide = sample
        .windows(2)
        .any(|w| matches!(w, [0, 0] | [0, b'\n']));
    !wide
}

/// Non-blank line statistics for a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCount {
    /// Lines holding at least one non-whitespace character.
    pub non_blank: usize,
    /// Physical line of the first non-blank line past the threshold, if any.
    pub first_over: Option<usize>,
}

/// Count non-blank lines. `\n`, `\r\n` and a lone `\r` all end a line.
pub fn count_lines(text: &str, threshold: usize) -> LineCount {
    let mut count = LineCount {
        non_blank: 0,
        first_over: None,
    };

    for (i, line) in split_lines(text).into_iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        count.non_blank += 1;
        if count.non_blank > threshold && count.first_over.is_none() {
            count.first_over = Some(i + 1);
        }
    }

    count
}

/// Scan files against a line-count threshold.
pub fn detect_long_files<P: AsRef<Path>>(
    files: &[P],
    rules: &LengthRules,
    mode: LengthMode,
    observer: &mut dyn ScanObserver,
) -> ScanSummary {
    let mut summary = ScanSummary::new();

    for file in files {
        let path = file.as_ref();
        let shown = display_path(path);
        summary.record(&shown, scan_file(path, &shown, rules, mode), observer);
    }

    summary
}

/// Scan a single file. Unreadable, binary and undecodable files are
/// skipped rather than reported.
fn scan_file(
    path: &Path,
    shown: &str,
    rules: &LengthRules,
    mode: LengthMode,
) -> Result<FileOutcome, ScanError> {
    if rules.excluded.is_excluded(path) {
        debug!(file = shown, "excluded, skipping");
        return Ok(FileOutcome::Skipped);
    }

    let bytes = match read_all(path) {
        Ok(b) => b,
        Err(e) => {
            debug!(file = shown, error = %e, "unreadable, skipping");
            return Ok(FileOutcome::Skipped);
        }
    };

    if looks_binary(&bytes) {
        debug!(file = shown, "binary, skipping");
        return Ok(FileOutcome::Skipped);
    }

    let encoding = TextEncoding::sniff(&bytes);
    let text = match encoding.decode(&bytes) {
        Ok(t) => t,
        Err(e) => {
            debug!(file = shown, error = %e, "undecodable, skipping");
            return Ok(FileOutcome::Skipped);
        }
    };

    let count = count_lines(&text, rules.threshold);
    let Some(line) = count.first_over else {
        return Ok(FileOutcome::Scanned(Vec::new()));
    };

    let finding = match mode {
        LengthMode::Fail => Finding {
            rule: Rule::FileTooLong,
            severity: Severity::Error,
            file: shown.to_string(),
            line,
            message: format!(
                "File exceeds {} non-empty lines ({} lines). Commits with extremely long files are not allowed.",
                rules.threshold, count.non_blank
            ),
            snippet: None,
            hints: vec!["Split the file into smaller modules before committing.".to_string()],
        },
        LengthMode::Warn => Finding {
            rule: Rule::FileLong,
            severity: Severity::Warning,
            file: shown.to_string(),
            line,
            message: format!(
                "File exceeds {} non-empty lines ({} lines). Consider refactoring.",
                rules.threshold, count.non_blank
            ),
            snippet: None,
            hints: Vec::new(),
        },
    };
    Ok(FileOutcome::Scanned(vec![finding]))
}

fn read_all(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
