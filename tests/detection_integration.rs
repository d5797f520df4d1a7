//! Integration tests for the full detection pipeline.
//!
//! These tests validate that each check correctly identifies violations
//! when run against the testdata fixtures.

use std::path::PathBuf;

use commitguard::detect::{Check, Rule, Runner, ScanSummary, Severity};
use commitguard::policy::Policy;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn go_files() -> Vec<PathBuf> {
    let go = testdata_path().join("go");
    vec![
        go.join("service.go"),
        go.join("service_test.go"),
        go.join("mocks").join("store.go"),
        go.join("store.go"),
    ]
}

fn run(check: Check, files: &[PathBuf]) -> ScanSummary {
    Runner::new(Policy::default())
        .run(check, files, &mut ())
        .expect("detection should succeed")
}

fn lines_of(summary: &ScanSummary, file_suffix: &str) -> Vec<usize> {
    summary
        .findings
        .iter()
        .filter(|f| f.file.ends_with(file_suffix))
        .map(|f| f.line)
        .collect()
}

#[test]
fn test_panics_reports_only_unexempted_calls() {
    let summary = run(Check::Panics, &go_files());

    // init(), ALLOW-PANIC, testing guard and lint:allow are exempt
    assert_eq!(lines_of(&summary, "service.go"), vec![15, 35]);
    assert!(summary
        .findings
        .iter()
        .all(|f| f.rule == Rule::ForbiddenPanic && f.severity == Severity::Error));
    assert!(summary.blocking());
}

#[test]
fn test_panics_skips_test_files_and_mocks() {
    let summary = run(Check::Panics, &go_files());

    assert!(lines_of(&summary, "service_test.go").is_empty());
    assert!(lines_of(&summary, "mocks/store.go").is_empty());
    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.skipped, 2);
}

#[test]
fn test_sql_ordering_reports_single_key_clauses() {
    let summary = run(Check::SqlOrdering, &go_files());

    // listDue has a tie-break, latestSession is exempt
    assert_eq!(lines_of(&summary, "go/store.go"), vec![17, 31]);
    assert!(summary
        .findings
        .iter()
        .all(|f| f.rule == Rule::NondeterministicOrder));
    assert!(summary.blocking());
}

#[test]
fn test_fixtures_pass_length_checks() {
    for check in [Check::LongFiles, Check::WarnLongFiles] {
        let summary = run(check, &go_files());
        assert!(summary.findings.is_empty(), "{} should be clean", check);
        assert_eq!(summary.scanned, 4);
    }
}

#[test]
fn test_scans_are_idempotent() {
    for check in [Check::Panics, Check::SqlOrdering] {
        assert_eq!(run(check, &go_files()), run(check, &go_files()));
    }
}

#[test]
fn test_long_file_limits() {
    let temp = tempfile::TempDir::new().unwrap();
    let big = temp.path().join("big.go");
    let body: String = (0..1001).map(|i| format!("var v{} = {}\n\n", i, i)).collect();
    std::fs::write(&big, body).unwrap();
    let files = vec![big];

    let hard = run(Check::LongFiles, &files);
    assert_eq!(hard.findings.len(), 1);
    // 1001st non-blank line, with a blank line after each
    assert_eq!(hard.findings[0].line, 2001);
    assert!(hard.blocking());

    let soft = run(Check::WarnLongFiles, &files);
    assert_eq!(soft.findings.len(), 1);
    assert_eq!(soft.findings[0].severity, Severity::Warning);
    assert_eq!(soft.findings[0].line, 1001);
    assert!(!soft.blocking());
}
