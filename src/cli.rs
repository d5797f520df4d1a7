//! Command-line interface for commitguard.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::detect::{expand_args, Check, Runner, ScanSummary};
use crate::policy::{self, Policy};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Pre-commit policy checks.
///
/// Each subcommand takes the staged file paths handed over by the hook
/// runner, prints diagnostics to stderr and exits non-zero when the commit
/// should be blocked.
#[derive(Parser)]
#[command(name = "commitguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to policy YAML file (default: auto-discover)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    pub format: String,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Block direct panic() calls
    Panics(FileArgs),
    /// Block ORDER BY clauses without a secondary sort key
    SqlOrdering(FileArgs),
    /// Block files with more than 1000 non-blank lines
    LongFiles(FileArgs),
    /// Warn about files with more than 500 non-blank lines (never blocks)
    WarnLongFiles(FileArgs),
}

impl Commands {
    fn split(&self) -> (Check, &[PathBuf]) {
        match self {
            Commands::Panics(a) => (Check::Panics, a.files.as_slice()),
            Commands::SqlOrdering(a) => (Check::SqlOrdering, a.files.as_slice()),
            Commands::LongFiles(a) => (Check::LongFiles, a.files.as_slice()),
            Commands::WarnLongFiles(a) => (Check::WarnLongFiles, a.files.as_slice()),
        }
    }
}

/// Arguments shared by every check.
#[derive(Parser)]
pub struct FileArgs {
    /// Files to check; directories are expanded
    pub files: Vec<PathBuf>,
}

/// Set up logging based on verbosity. `RUST_LOG` takes precedence.
pub fn setup_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the policy from an explicit path, a discovered file, or defaults.
pub fn load_policy(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Policy> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => policy::discover(dir),
    };

    let policy = match path {
        Some(p) => {
            debug!(policy = %p.display(), "loading policy");
            Policy::parse_file(&p)?
        }
        None => {
            debug!("no policy file found, using defaults");
            Policy::default()
        }
    };

    policy::validate(&policy).context("invalid policy")?;
    Ok(policy)
}

/// Map a summary to the process exit code.
pub fn exit_code(check: Check, summary: &ScanSummary) -> i32 {
    if check.is_blocking() && summary.blocking() {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    }
}

/// Run the selected check.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    if cli.format != "text" && cli.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'text' or 'json'",
            cli.format
        );
        return Ok(EXIT_ERROR);
    }

    let cwd = std::env::current_dir().context("reading current directory")?;
    let policy = match load_policy(cli.config.as_deref(), &cwd) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let (check, args) = cli.command.split();
    let files = expand_args(args);
    debug!(check = check.as_str(), files = files.len(), "starting scan");

    let runner = Runner::new(policy);
    let summary = match cli.format.as_str() {
        "json" => {
            let summary = runner.run(check, &files, &mut ())?;
            report::write_json(&mut std::io::stdout().lock(), check, &summary)?;
            summary
        }
        _ => {
            let stderr = std::io::stderr();
            let color = stderr.is_terminal();
            let mut reporter = report::TextReporter::new(stderr.lock(), color);
            let summary = runner.run(check, &files, &mut reporter)?;
            reporter.finish()?;
            summary
        }
    };

    Ok(exit_code(check, &summary))
}
