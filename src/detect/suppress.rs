//! Exemption of findings via override comments and structural markers.
//!
//! An exemption pattern is a regex tested against source lines. Each check
//! decides which lines around a would-be finding are consulted:
//! - `panics`: the triggering line and the line before it
//! - `sql-ordering`: three lines either side of the triggering line

use anyhow::Context;
use regex::Regex;

/// Compiled exemption patterns.
#[derive(Debug, Clone, Default)]
pub struct ExemptionSet {
    patterns: Vec<Regex>,
}

impl ExemptionSet {
    /// Compile the given regex patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).with_context(|| format!("invalid exempt pattern {:?}", p))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Check whether any pattern matches the line.
    pub fn matches(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(line))
    }

    /// Check whether any line in `lines[index - before ..= index + after]`
    /// (clamped to the slice) is exempt.
    pub fn matches_around<S: AsRef<str>>(
        &self,
        lines: &[S],
        index: usize,
        before: usize,
        after: usize,
    ) -> bool {
        if lines.is_empty() {
            return false;
        }
        let start = index.saturating_sub(before);
        let end = (index + after).min(lines.len() - 1);
        if start > end {
            return false;
        }
        lines[start..=end].iter().any(|l| self.matches(l.as_ref()))
    }
}
