//! Policy schema for commitguard.
//!
//! A policy tunes the built-in checks. Every field is optional; anything
//! left out falls back to the defaults below, so running without a policy
//! file gives the stock behaviour.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::detect::{ExemptionSet, PathFilter};

/// Default policy file names to search for.
pub const DEFAULT_POLICY_NAMES: &[&str] = &["commitguard.yaml", ".commitguard.yaml"];

/// Non-blank line count above which a commit is blocked.
pub const DEFAULT_FAIL_THRESHOLD: usize = 1000;
/// Non-blank line count above which a warning is printed.
pub const DEFAULT_WARN_THRESHOLD: usize = 500;

const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &[".go"];

const PANIC_EXCLUDED_PATHS: &[&str] = &[
    "*_test.go",
    "testutils/**",
    "**/mocks/**",
    // Entry point handles startup failures itself
    "cmd/server/main.go",
];

const PANIC_EXEMPT_PATTERNS: &[&str] = &[
    r"//\s*ALLOW[\-_]PANIC",
    r"//\s*lint:allow panic",
    r"/\*.*ALLOW[\-_]PANIC.*\*/",
    r"func init\(\)",
    r"^\s*if\s+testing\.",
];

const ORDERING_EXCLUDED_PATHS: &[&str] = &[
    "*_test.go",
    "testutils/**",
    "migrations/**",
    "internal/platform/postgres/migrations/**",
];

const ORDERING_EXEMPT_PATTERNS: &[&str] = &[
    r"//\s*ALLOW[\-_]NONDETERMINISTIC[\-_]ORDER",
    r"//\s*lint:allow nondeterministic-order",
    r"/\*.*ALLOW[\-_]NONDETERMINISTIC[\-_]ORDER.*\*/",
];

const LENGTH_EXCLUDED_PATHS: &[&str] = &[
    "vendor/**",
    "**/vendor/**",
    "node_modules/**",
    "**/node_modules/**",
    "*.pb.go",
    "*_gen.go",
    "*.gen.go",
    "*_generated.go",
    "go.sum",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
];

/// Top-level policy definition.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    #[serde(default)]
    pub panics: PatternCheckConfig,
    #[serde(default)]
    pub sql_ordering: PatternCheckConfig,
    #[serde(default)]
    pub long_files: LengthConfig,
}

/// Settings shared by the line-pattern checks.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PatternCheckConfig {
    /// File extensions to scan (default: `.go`)
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    /// Glob patterns for paths to skip entirely
    #[serde(default)]
    pub excluded_paths: Option<Vec<String>>,
    /// Regexes that silence a finding when they match nearby lines
    #[serde(default)]
    pub exempt_patterns: Option<Vec<String>>,
}

/// Settings for the file length checks.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LengthConfig {
    #[serde(default)]
    pub excluded_paths: Option<Vec<String>>,
    #[serde(default)]
    pub fail_threshold: Option<usize>,
    #[serde(default)]
    pub warn_threshold: Option<usize>,
}

/// Compiled settings for one line-pattern check.
#[derive(Debug, Clone)]
pub struct PatternRules {
    pub extensions: Vec<String>,
    pub excluded: PathFilter,
    pub exempt: ExemptionSet,
}

/// Compiled settings for one length check.
#[derive(Debug, Clone)]
pub struct LengthRules {
    pub excluded: PathFilter,
    pub threshold: usize,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PatternCheckConfig {
    fn compile(
        &self,
        default_excluded: &[&str],
        default_exempt: &[&str],
    ) -> anyhow::Result<PatternRules> {
        let extensions = self
            .extensions
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_SOURCE_EXTENSIONS));
        let excluded = match &self.excluded_paths {
            Some(p) => PathFilter::new(p)?,
            None => PathFilter::new(default_excluded)?,
        };
        let exempt = match &self.exempt_patterns {
            Some(p) => ExemptionSet::new(p)?,
            None => ExemptionSet::new(default_exempt)?,
        };
        Ok(PatternRules {
            extensions,
            excluded,
            exempt,
        })
    }
}

impl Policy {
    /// Parse a policy from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading policy {}", path.display()))?;
        Self::parse_str(&content).with_context(|| format!("parsing policy {}", path.display()))
    }

    /// Parse a policy from YAML text. An empty document yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Rules for the forbidden-panic check.
    pub fn panic_rules(&self) -> anyhow::Result<PatternRules> {
        self.panics
            .compile(PANIC_EXCLUDED_PATHS, PANIC_EXEMPT_PATTERNS)
            .context("panics")
    }

    /// Rules for the SQL ordering check.
    pub fn ordering_rules(&self) -> anyhow::Result<PatternRules> {
        self.sql_ordering
            .compile(ORDERING_EXCLUDED_PATHS, ORDERING_EXEMPT_PATTERNS)
            .context("sql_ordering")
    }

    /// Rules for the hard length limit.
    pub fn fail_length_rules(&self) -> anyhow::Result<LengthRules> {
        Ok(LengthRules {
            excluded: self.length_filter()?,
            threshold: self
                .long_files
                .fail_threshold
                .unwrap_or(DEFAULT_FAIL_THRESHOLD),
        })
    }

    /// Rules for the soft length limit.
    pub fn warn_length_rules(&self) -> anyhow::Result<LengthRules> {
        Ok(LengthRules {
            excluded: self.length_filter()?,
            threshold: self
                .long_files
                .warn_threshold
                .unwrap_or(DEFAULT_WARN_THRESHOLD),
        })
    }

    fn length_filter(&self) -> anyhow::Result<PathFilter> {
        let filter = match &self.long_files.excluded_paths {
            Some(p) => PathFilter::new(p),
            None => PathFilter::new(LENGTH_EXCLUDED_PATHS),
        };
        filter.context("long_files")
    }
}

/// Discover a policy file in the given directory.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_POLICY_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Validate a policy: every regex and glob must compile and thresholds
/// must be positive.
pub fn validate(policy: &Policy) -> anyhow::Result<()> {
    policy.panic_rules()?;
    policy.ordering_rules()?;
    let fail = policy.fail_length_rules()?;
    let warn = policy.warn_length_rules()?;

    if fail.threshold == 0 {
        anyhow::bail!("long_files.fail_threshold must be greater than 0");
    }
    if warn.threshold == 0 {
        anyhow::bail!("long_files.warn_threshold must be greater than 0");
    }
    Ok(())
}
