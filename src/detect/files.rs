//! File selection: exclusion globs and argument expansion.

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use super::ScanError;

/// Compiled set of exclusion globs.
///
/// A path is excluded when any pattern matches the full path (as passed on
/// the command line) or its base name. `*` also matches `/`, so
/// `*_test.go` excludes `pkg/foo_test.go`.
#[derive(Debug, Clone)]
pub struct PathFilter {
    set: GlobSet,
}

impl PathFilter {
    /// Compile the given glob patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid excluded_paths pattern {:?}", pattern))?;
            builder.add(glob);
        }
        let set = builder.build().context("building exclusion set")?;
        Ok(Self { set })
    }

    /// A filter that excludes nothing.
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
        }
    }

    /// Check whether the path is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.set.is_empty() {
            return false;
        }

        let full = path.to_string_lossy().replace('\\', "/");
        let full = full.strip_prefix("./").unwrap_or(&full);
        if self.set.is_match(full) {
            return true;
        }

        path.file_name()
            .map(|name| self.set.is_match(name.to_string_lossy().as_ref()))
            .unwrap_or(false)
    }
}

/// Check whether the path ends in one of the given extensions.
///
/// Extensions may be given with or without the leading dot.
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|e| e.as_ref().trim_start_matches('.') == ext)
}

/// Read a file as UTF-8 text.
pub fn read_utf8(path: &Path) -> Result<String, ScanError> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| ScanError::Decode { encoding: "utf-8" })
}

/// Split text into lines. `\n`, `\r\n` and a lone `\r` all end a line;
/// a trailing terminator does not start an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;

    while let Some(pos) = rest.find(&['\n', '\r'][..]) {
        lines.push(&rest[..pos]);
        let terminator = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[pos + terminator..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }

    lines
}

/// Expand command-line arguments into the list of files to check.
///
/// Files are kept in argument order. A directory is replaced by the regular
/// files beneath it, sorted by path, with hidden directories skipped.
/// Entries that cannot be read are logged and left out.
pub fn expand_args(args: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for arg in args {
        if !arg.is_dir() {
            files.push(arg.clone());
            continue;
        }

        for entry in WalkDir::new(arg)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                !(e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.'))
            })
        {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!(dir = %arg.display(), error = %e, "cannot read entry, skipping"),
            }
        }
    }

    files
}
