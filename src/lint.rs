//! Lint runner: targets to compilation units to filtered findings.
//!
//! Produces a `LintResult` with the findings at or above the minimum
//! confidence, per-target diagnostics and a summary. Units are resolved, read
//! and analysed in parallel, then merged in unit order so the result is the
//! same as a sequential run.

use crate::analyzer::Analyzer;
use crate::expand::{Expander, Root};
use crate::models::{Diagnostic, Finding, Level, LintResult, Summary};
use crate::reader::read_sources;
use crate::resolver::{clean_import_path, is_local_import, PackageResolver};
use crate::rules::RuleSet;
use crate::target::TargetPlan;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default minimum confidence for a finding to be reported.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct LintOptions {
    pub min_confidence: f64,
    pub rules: RuleSet,
    /// Extra directory pruning for `...` expansion.
    pub exclude: Vec<glob::Pattern>,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            rules: RuleSet::default(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where one compilation unit's file list comes from.
pub enum UnitSource {
    Dir(PathBuf),
    Package(String),
    Files(Vec<PathBuf>),
}

#[derive(Default)]
struct UnitReport {
    diagnostics: Vec<Diagnostic>,
    findings: Vec<Finding>,
    files: usize,
    analysed: bool,
}

impl UnitReport {
    fn failed(message: String) -> Self {
        Self {
            diagnostics: vec![Diagnostic::error(message)],
            ..Default::default()
        }
    }
}

pub struct Linter<'a> {
    resolver: &'a dyn PackageResolver,
    analyzer: &'a dyn Analyzer,
    opts: &'a LintOptions,
}

impl<'a> Linter<'a> {
    pub fn new(
        resolver: &'a dyn PackageResolver,
        analyzer: &'a dyn Analyzer,
        opts: &'a LintOptions,
    ) -> Self {
        Self {
            resolver,
            analyzer,
            opts,
        }
    }

    /// Turn a plan into compilation units, expanding `...` patterns.
    ///
    /// Patterns that match nothing add a warning to `diagnostics`.
    pub fn units(&self, plan: &TargetPlan, diagnostics: &mut Vec<Diagnostic>) -> Vec<UnitSource> {
        let expander = Expander::new(self.resolver, &self.opts.exclude);
        let mut warn_empty = |pattern: &str, names: &[String]| {
            if names.is_empty() {
                diagnostics.push(Diagnostic::warning(format!(
                    "\"{}\" matched no packages",
                    pattern
                )));
            }
        };
        match plan {
            TargetPlan::Directories(targets) => {
                let mut out = Vec::new();
                for t in targets {
                    if t.recursive {
                        let names = expander.expand(&t.raw, Root::Filesystem);
                        warn_empty(&t.raw, &names);
                        out.extend(names.into_iter().map(|n| UnitSource::Dir(PathBuf::from(n))));
                    } else {
                        out.push(UnitSource::Dir(PathBuf::from(t.path())));
                    }
                }
                out
            }
            TargetPlan::Files(files) => vec![UnitSource::Files(files.clone())],
            TargetPlan::Packages(args) => {
                let roots = self.resolver.src_roots();
                let mut out = Vec::new();
                for arg in args {
                    let a = clean_import_path(arg);
                    let names = if a == "all" || a == "std" {
                        expander.expand(&a, Root::SrcRoots(&roots))
                    } else if a.contains("...") {
                        if is_local_import(&a) {
                            expander.expand(&a, Root::Filesystem)
                        } else {
                            expander.expand(&a, Root::SrcRoots(&roots))
                        }
                    } else {
                        out.push(UnitSource::Package(a));
                        continue;
                    };
                    warn_empty(&a, &names);
                    out.extend(names.into_iter().map(UnitSource::Package));
                }
                out
            }
        }
    }

    /// Lint every unit of `plan`.
    pub fn run(&self, plan: &TargetPlan) -> LintResult {
        let mut diagnostics = Vec::new();
        let units = self.units(plan, &mut diagnostics);
        debug!(units = units.len(), kind = ?plan.kind(), "linting units");

        let reports: Vec<UnitReport> = units.par_iter().map(|u| self.lint_unit(u)).collect();

        let mut result = LintResult {
            diagnostics,
            ..Default::default()
        };
        for report in reports {
            result.diagnostics.extend(report.diagnostics);
            result.summary.files += report.files;
            if report.analysed {
                result.summary.units += 1;
            }
            for f in report.findings {
                if f.confidence >= self.opts.min_confidence {
                    result.summary.suggestions += 1;
                    result.findings.push(f);
                }
            }
        }
        result.summary.errors = result
            .diagnostics
            .iter()
            .filter(|d| d.level == Level::Error)
            .count();
        result
    }

    fn lint_unit(&self, unit: &UnitSource) -> UnitReport {
        let resolved = match unit {
            UnitSource::Dir(dir) => self.resolver.import_dir(dir),
            UnitSource::Package(p) => self.resolver.import(p, Path::new(".")),
            UnitSource::Files(files) => return self.lint_files(files),
        };
        match resolved {
            Ok(pkg) => self.lint_files(&pkg.files()),
            Err(e) if e.is_no_go() => {
                debug!(unit = ?unit, "no Go sources; skipping");
                UnitReport::default()
            }
            Err(e) => UnitReport::failed(e.to_string()),
        }
    }

    /// Read, analyse and collect unfiltered findings for one set of files.
    fn lint_files(&self, files: &[PathBuf]) -> UnitReport {
        let mut report = UnitReport::default();
        let (sources, read_errors) = read_sources(files);
        report
            .diagnostics
            .extend(read_errors.into_iter().map(|e| Diagnostic::error(e.to_string())));
        if sources.is_empty() {
            return report;
        }
        report.files = sources.len();
        report.analysed = true;
        match self.analyzer.lint_files(&sources, &self.opts.rules) {
            Ok(findings) => report.findings = findings,
            Err(e) => report.diagnostics.push(Diagnostic::error(e.to_string())),
        }
        report
    }
}

/// Lint `plan` with the given collaborators.
pub fn run_lint(
    plan: &TargetPlan,
    resolver: &dyn PackageResolver,
    analyzer: &dyn Analyzer,
    opts: &LintOptions,
) -> LintResult {
    Linter::new(resolver, analyzer, opts).run(plan)
}

/// Whether the run should fail: the flag is set and something was printed.
pub fn should_fail(summary: &Summary, set_exit_status: bool) -> bool {
    set_exit_status && summary.suggestions > 0
}
