//! Detection module for commit policy violations.

mod files;
mod length;
mod ordering;
mod panics;
mod runner;
mod suppress;
mod types;

pub use files::{expand_args, has_extension, read_utf8, split_lines, PathFilter};
pub use length::{
    count_lines, detect_long_files, looks_binary, LengthMode, LineCount, TextEncoding,
};
pub use ordering::detect_nondeterministic_order;
pub use panics::detect_panics;
pub use runner::{Check, Runner};
pub use suppress::ExemptionSet;
pub use types::{
    display_path, FileOutcome, Finding, ProcessingError, Rule, ScanError, ScanObserver, ScanSummary,
    Severity,
};
