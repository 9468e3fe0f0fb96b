//! CLI argument parsing via `clap`.

use crate::rules::RuleFlags;
use clap::{CommandFactory, Parser};

const USAGE: &str = "\
golint [flags]                # runs on package in current directory
       golint [flags] [packages]
       golint [flags] [directories]  # where a '/...' suffix includes all sub-directories
       golint [flags] [files]        # all must belong to a single package";

#[derive(Parser, Debug)]
#[command(
    name = "golint",
    version,
    about = "Print style mistakes in Go source code",
    long_about = "golint reports style mistakes in Go packages, directories or files.\n\nA run targets exactly one kind of argument. Findings below the minimum confidence are not shown.\n\nConfiguration precedence: CLI > golint.toml > defaults.",
    override_usage = USAGE,
    after_help = "Examples:\n  golint ./...\n  golint --min-confidence 0.3 cmd/server\n  golint --set-exit-status --lint-names=false example.com/org/...\n  golint main.go util.go"
)]
/// Top-level CLI options and targets.
pub struct Cli {
    #[arg(help = "Packages, directories (optionally with /...), or files; default: current directory")]
    pub targets: Vec<String>,
    #[arg(
        long = "min-confidence",
        alias = "min_confidence",
        value_name = "F64",
        help = "Minimum confidence of a problem to print it (default: 0.8)"
    )]
    pub min_confidence: Option<f64>,
    #[arg(
        long = "set-exit-status",
        alias = "set_exit_status",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Exit with status 1 if any issues are found"
    )]
    pub set_exit_status: Option<bool>,
    #[command(flatten)]
    pub rules: RuleFlags,
    #[arg(long, value_name = "CMD", help = "Analysis engine executable (default: golint-engine)")]
    pub analyzer: Option<String>,
    #[arg(
        long,
        value_parser = ["human", "json"],
        help = "Output mode: human|json (default: human)"
    )]
    pub output: Option<String>,
    #[arg(long, value_name = "PATH", help = "Explicit config file instead of discovered golint.toml")]
    pub config: Option<String>,
    #[arg(short, long, conflicts_with = "quiet", help = "Log resolution steps")]
    pub verbose: bool,
    #[arg(short, long, help = "Only log errors")]
    pub quiet: bool,
}

/// Usage line printed after a usage error.
pub fn usage() -> String {
    Cli::command().render_usage().to_string()
}
