//! golint CLI binary entry point.
//! Resolves configuration, classifies targets, lints, and prints results.

use clap::Parser;
use golinter::analyzer::CommandAnalyzer;
use golinter::cli::{usage, Cli};
use golinter::config::{self, CliOverrides};
use golinter::lint::{run_lint, should_fail, LintOptions};
use golinter::logging::init_tracing;
use golinter::output;
use golinter::resolver::GoResolver;
use golinter::target::TargetPlan;
use golinter::utils::{error_prefix, warning_prefix};
use std::path::Path;
use tracing::debug;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let overrides = CliOverrides {
        min_confidence: cli.min_confidence,
        set_exit_status: cli.set_exit_status,
        output: cli.output.as_deref(),
        analyzer: cli.analyzer.as_deref(),
        config: cli.config.as_deref(),
        rules: cli.rules.clone(),
    };
    let eff = config::resolve_effective(Path::new("."), &overrides);
    for w in &eff.warnings {
        eprintln!("{} {}", warning_prefix(), w);
    }
    debug!(
        min_confidence = eff.min_confidence,
        disabled = ?eff.rules.disabled(),
        goos = %eff.build.goos,
        goarch = %eff.build.goarch,
        "effective settings"
    );

    let plan = match TargetPlan::from_args(&cli.targets) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{} {}", error_prefix(), e);
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    };

    let resolver = GoResolver::new(eff.build.clone());
    let analyzer = CommandAnalyzer::new(eff.analyzer_command.clone(), eff.analyzer_args.clone());
    let opts = LintOptions {
        min_confidence: eff.min_confidence,
        rules: eff.rules,
        exclude: eff.exclude.clone(),
    };
    let result = run_lint(&plan, &resolver, &analyzer, &opts);
    output::print_lint(&result, &eff.output);

    if should_fail(&result.summary, eff.set_exit_status) {
        eprintln!("Found {} lint suggestions; failing.", result.summary.suggestions);
        std::process::exit(1);
    }
}
