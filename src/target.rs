//! Command-line target classification.
//!
//! Each argument is a directory (optionally with a trailing `/...`), an
//! existing file, or a package specifier. A run may only use one kind, so the
//! classified arguments are folded into a [`TargetPlan`] up front.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Suffix requesting expansion into all sub-directories.
pub const RECURSIVE_MARKER: &str = "/...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Directory,
    File,
    Package,
}

impl TargetKind {
    fn label(self) -> &'static str {
        match self {
            TargetKind::Directory => "directories",
            TargetKind::File => "files",
            TargetKind::Package => "packages",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One classified command-line argument.
pub struct Target {
    /// Argument as given.
    pub raw: String,
    pub kind: TargetKind,
    /// Only set for directory targets carrying the recursive marker.
    pub recursive: bool,
}

impl Target {
    /// Path to stat/walk: the argument with any recursive marker removed.
    pub fn path(&self) -> &str {
        if self.recursive {
            &self.raw[..self.raw.len() - RECURSIVE_MARKER.len()]
        } else {
            &self.raw
        }
    }
}

fn is_dir(p: &str) -> bool {
    fs::metadata(p).map(|m| m.is_dir()).unwrap_or(false)
}

fn exists(p: &str) -> bool {
    fs::metadata(p).is_ok()
}

/// Classify a single argument. Pure apart from `stat` calls.
pub fn classify(arg: &str) -> Target {
    let kind_recursive = match arg.strip_suffix(RECURSIVE_MARKER) {
        Some(prefix) if is_dir(prefix) => (TargetKind::Directory, true),
        _ if is_dir(arg) => (TargetKind::Directory, false),
        _ if exists(arg) => (TargetKind::File, false),
        _ => (TargetKind::Package, false),
    };
    let target = Target {
        raw: arg.to_string(),
        kind: kind_recursive.0,
        recursive: kind_recursive.1,
    };
    debug!(arg, kind = ?target.kind, recursive = target.recursive, "classified target");
    target
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("cannot mix target kinds in one run (got {})", .kinds.join(" and "))]
    MixedTargets { kinds: Vec<&'static str> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The single kind of work selected for a run.
pub enum TargetPlan {
    Directories(Vec<Target>),
    /// One compilation unit made of every listed file.
    Files(Vec<PathBuf>),
    Packages(Vec<String>),
}

impl TargetPlan {
    /// Classify all arguments and enforce the one-kind rule.
    ///
    /// No arguments means the current directory.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, UsageError> {
        if args.is_empty() {
            return Ok(TargetPlan::Directories(vec![classify(".")]));
        }
        let targets: Vec<Target> = args.iter().map(|a| classify(a.as_ref())).collect();
        let mut kinds: Vec<TargetKind> = Vec::new();
        for t in &targets {
            if !kinds.contains(&t.kind) {
                kinds.push(t.kind);
            }
        }
        if kinds.len() != 1 {
            return Err(UsageError::MixedTargets {
                kinds: kinds.into_iter().map(TargetKind::label).collect(),
            });
        }
        Ok(match kinds[0] {
            TargetKind::Directory => TargetPlan::Directories(targets),
            TargetKind::File => {
                TargetPlan::Files(targets.into_iter().map(|t| PathBuf::from(t.raw)).collect())
            }
            TargetKind::Package => {
                TargetPlan::Packages(targets.into_iter().map(|t| t.raw).collect())
            }
        })
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TargetPlan::Directories(_) => TargetKind::Directory,
            TargetPlan::Files(_) => TargetKind::File,
            TargetPlan::Packages(_) => TargetKind::Package,
        }
    }
}

/// True when `p` names the current directory.
pub fn is_current_dir(p: &Path) -> bool {
    p.as_os_str().is_empty() || p == Path::new(".")
}
