//! Detection of SQL `ORDER BY` clauses without a tie-break column.
//!
//! This is a line heuristic, not a SQL parser. Each line mentioning
//! `ORDER BY` is checked against a window of surrounding lines standing in
//! for the query text; the clause counts as deterministic when a comma
//! follows the keyword somewhere in that window.
//!
//! Known imprecision, kept on purpose:
//! - `[^,]+` crosses line breaks, so a comma in unrelated code after the
//!   query (e.g. `rows, err := ...`) hides a single-key clause.
//! - Two clauses a few lines apart share their windows. Both may be
//!   reported, or a comma belonging to one may clear the other.

use regex::Regex;
use std::path::Path;
use tracing::debug;

use crate::policy::PatternRules;

use super::files::{has_extension, read_utf8, split_lines};
use super::{
    display_path, FileOutcome, Finding, Rule, ScanError, ScanObserver, ScanSummary, Severity,
};

/// Lines before the trigger included in the query window.
const CONTEXT_BEFORE: usize = 5;
/// The query window stops this many lines after the trigger, exclusive.
const CONTEXT_AFTER: usize = 10;
/// Lines either side of the trigger searched for an exemption comment.
const EXEMPT_RADIUS: usize = 3;

lazy_static::lazy_static! {
    static ref ORDER_BY: Regex = Regex::new(r"(?i)ORDER\s+BY").unwrap();
    static ref ORDER_BY_WITH_TIE_BREAK: Regex = Regex::new(r"(?i)ORDER\s+BY\s+[^,]+(,)").unwrap();
}

/// Scan files for ORDER BY clauses with a single sort key.
pub fn detect_nondeterministic_order<P: AsRef<Path>>(
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

/// Evaluate every ORDER BY line in the file.
pub fn scan_lines(file: &str, lines: &[&str], rules: &PatternRules) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !ORDER_BY.is_match(line) {
            continue;
        }
        if rules.exempt.matches_around(lines, i, EXEMPT_RADIUS, EXEMPT_RADIUS) {
            debug!(file, line = i + 1, "ordering exempted");
            continue;
        }

        let start = i.saturating_sub(CONTEXT_BEFORE);
        let end = (i + CONTEXT_AFTER).min(lines.len());
        let window = lines[start..end].join("\n");

        if ORDER_BY_WITH_TIE_BREAK.is_match(&window) {
            continue;
        }

        findings.push(Finding {
            rule: Rule::NondeterministicOrder,
            severity: Severity::Error,
            file: file.to_string(),
            line: i + 1,
            message: "SQL query with potentially non-deterministic ordering.".to_string(),
            snippet: Some(line.trim().to_string()),
            hints: vec![
                "The ORDER BY clause should include a secondary sort key (usually 'id') for deterministic ordering."
                    .to_string(),
                "Example: 'ORDER BY created_at DESC, id ASC'".to_string(),
                "Add // ALLOW-NONDETERMINISTIC-ORDER comment to exempt this query if needed."
                    .to_string(),
            ],
        });
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;
    use tempfile::TempDir;

    fn rules() -> PatternRules {
        Policy::default().ordering_rules().unwrap()
    }

    #[test]
    fn test_single_sort_key_is_reported() {
        let lines = vec![
            "func list(db *sql.DB) {",
            "\tquery := `SELECT id FROM cards ORDER BY created_at DESC`",
            "\t_ = query",
            "}",
        ];
        let findings = scan_lines("store.go", &lines, &rules());

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].rule, Rule::NondeterministicOrder);
    }

    #[test]
    fn test_tie_break_is_accepted() {
        let lines = vec!["query := `SELECT id FROM cards ORDER BY created_at DESC, id ASC`"];
        assert!(scan_lines("store.go", &lines, &rules()).is_empty());
    }

    #[test]
    fn test_multiline_clause_with_tie_break() {
        let lines = vec![
            "query := `",
            "    SELECT id, front, back",
            "    FROM cards",
            "    ORDER BY",
            "        next_review_at ASC,",
            "        id ASC`",
        ];
        assert!(scan_lines("store.go", &lines, &rules()).is_empty());
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let lines = vec!["q := \"select id from tasks order by   priority\""];
        assert_eq!(scan_lines("store.go", &lines, &rules()).len(), 1);
    }

    #[test]
    fn test_exemption_within_three_lines() {
        let lines = vec![
            "// ALLOW-NONDETERMINISTIC-ORDER: single row",
            "",
            "",
            "q := `SELECT id FROM users ORDER BY created_at LIMIT 1`",
        ];
        assert!(scan_lines("store.go", &lines, &rules()).is_empty());

        let after = vec![
            "q := `SELECT id FROM users ORDER BY created_at LIMIT 1`",
            "",
            "",
            "/* ALLOW_NONDETERMINISTIC_ORDER */",
        ];
        assert!(scan_lines("store.go", &after, &rules()).is_empty());
    }

    #[test]
    fn test_exemption_four_lines_away_does_not_apply() {
        let lines = vec![
            "// lint:allow nondeterministic-order",
            "",
            "",
            "",
            "q := `SELECT id FROM users ORDER BY created_at`",
        ];
        assert_eq!(scan_lines("store.go", &lines, &rules()).len(), 1);
    }

    #[test]
    fn test_comma_later_in_window_hides_finding() {
        // Accepted false negative: the comma of the next statement is
        // inside the window.
        let lines = vec![
            "q := `SELECT id FROM cards ORDER BY created_at`",
            "rows, err := db.Query(q)",
        ];
        assert!(scan_lines("store.go", &lines, &rules()).is_empty());
    }

    #[test]
    fn test_window_ends_before_tenth_following_line() {
        let mut lines = vec!["q := `SELECT id FROM cards ORDER BY created_at`"];
        lines.extend(std::iter::repeat("").take(9));
        lines.push("a, b := 1, 2");
        assert_eq!(scan_lines("store.go", &lines, &rules()).len(), 1);

        // One line closer and the comma is inside the window
        lines.remove(1);
        assert!(scan_lines("store.go", &lines, &rules()).is_empty());
    }

    #[test]
    fn test_nearby_clauses_both_reported() {
        let lines = vec![
            "a := `SELECT id FROM cards ORDER BY due`",
            "b := `SELECT id FROM decks ORDER BY name`",
        ];
        let findings = scan_lines("store.go", &lines, &rules());
        let reported: Vec<_> = findings.iter().map(|f| f.line).collect();
        assert_eq!(reported, vec![1, 2]);
    }

    #[test]
    fn test_excluded_paths_are_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("migrations")).unwrap();
        let migration = temp.path().join("migrations").join("001_init.go");
        std::fs::write(&migration, "q := `SELECT 1 ORDER BY x`\n").unwrap();
        let test_file = temp.path().join("store_test.go");
        std::fs::write(&test_file, "q := `SELECT 1 ORDER BY x`\n").unwrap();

        let summary = detect_nondeterministic_order(&[&test_file], &rules(), &mut ());
        assert_eq!(summary.skipped, 1);
        assert!(summary.findings.is_empty());

        // Relative paths as handed over by the hook runner
        let rel = Path::new("migrations/001_init.go");
        assert!(rules().excluded.is_excluded(rel));
    }
}
