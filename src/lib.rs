//! Commitguard - pre-commit policy checks.
//!
//! Commitguard scans the files staged for a commit and blocks or warns on
//! policy violations. It is meant to be invoked by a hook runner, once per
//! check, with the matching file paths as arguments.
//!
//! # Checks
//!
//! - `panics`: direct `panic(...)` calls without an exemption comment
//! - `sql-ordering`: `ORDER BY` clauses without a secondary sort key
//! - `long-files`: files over the hard non-blank line limit (blocks)
//! - `warn-long-files`: files over the soft limit (warns only)
//!
//! All checks are line-based regex heuristics; nothing is parsed into an
//! AST.
//!
//! # Architecture
//!
//! - `detect`: the checks, path filtering, exemptions and the runner
//! - `policy`: optional YAML policy overriding the built-in defaults
//! - `report`: text and JSON output
//! - `cli`: argument parsing, logging setup and exit codes

pub mod cli;
pub mod detect;
pub mod policy;
pub mod report;

pub use detect::{Check, Finding, Runner, ScanSummary, Severity};
pub use policy::Policy;
