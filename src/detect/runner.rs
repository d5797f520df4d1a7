//! Detection runner that dispatches a check over a set of files.

use std::path::PathBuf;
use tracing::info;

use crate::policy::Policy;

use super::{
    detect_long_files, detect_nondeterministic_order, detect_panics, LengthMode, ScanObserver,
    ScanSummary,
};

/// The four checks. Each is run on its own; none depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Direct `panic(...)` calls (blocking)
    Panics,
    /// ORDER BY without a tie-break column (blocking)
    SqlOrdering,
    /// Files over the hard line limit (blocking)
    LongFiles,
    /// Files over the soft line limit (warning only)
    WarnLongFiles,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::Panics => "panics",
            Check::SqlOrdering => "sql-ordering",
            Check::LongFiles => "long-files",
            Check::WarnLongFiles => "warn-long-files",
        }
    }

    /// Whether findings of this check can fail the run.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Check::WarnLongFiles)
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Executes one check against a set of files.
pub struct Runner {
    policy: Policy,
}

impl Runner {
    /// Create a new runner for the given policy.
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    /// Run a check. Files are processed one at a time in the given order,
    /// and the observer hears about each file as soon as it is done.
    ///
    /// Only policy compilation can fail; per-file problems end up in the
    /// summary.
    pub fn run(
        &self,
        check: Check,
        files: &[PathBuf],
        observer: &mut dyn ScanObserver,
    ) -> anyhow::Result<ScanSummary> {
        let summary = match check {
            Check::Panics => detect_panics(files, &self.policy.panic_rules()?, observer),
            Check::SqlOrdering => {
                detect_nondeterministic_order(files, &self.policy.ordering_rules()?, observer)
            }
            Check::LongFiles => {
                let rules = self.policy.fail_length_rules()?;
                detect_long_files(files, &rules, LengthMode::Fail, observer)
            }
            Check::WarnLongFiles => {
                let rules = self.policy.warn_length_rules()?;
                detect_long_files(files, &rules, LengthMode::Warn, observer)
            }
        };

        info!(
            check = check.as_str(),
            scanned = summary.scanned,
            skipped = summary.skipped,
            findings = summary.findings.len(),
            errors = summary.errors.len(),
            "scan complete"
        );

        Ok(summary)
    }
}
