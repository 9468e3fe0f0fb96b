//! Package resolution: directory or import path to a list of Go sources.
//!
//! The [`PackageResolver`] trait is the seam the orchestrator depends on.
//! [`GoResolver`] is the shipped implementation, a small rendition of
//! `go/build` directory imports (file name and `//go:build` constraints,
//! package clauses, cgo detection, GOROOT/GOPATH/module lookup).
//!
//! "No buildable Go sources" is reported as [`ResolveError::NoGoFiles`] so
//! callers can treat it as an empty outcome rather than a failure.

mod constraint;
mod context;
mod go;
mod header;

pub use constraint::Constraint;
pub use context::{parse_go_minor, BuildContext};
pub use go::GoResolver;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Sources of one buildable directory, split by role.
pub struct Package {
    /// Directory as it should be shown to the user.
    pub dir: PathBuf,
    pub name: String,
    pub import_path: String,
    pub go_files: Vec<String>,
    pub cgo_files: Vec<String>,
    pub test_go_files: Vec<String>,
    /// External `package foo_test` files; not linted.
    pub xtest_go_files: Vec<String>,
    /// Files excluded by build constraints.
    pub ignored_go_files: Vec<String>,
}

impl Package {
    /// Primary, cgo and in-package test files, qualified by `dir` unless it
    /// is the current directory.
    pub fn files(&self) -> Vec<PathBuf> {
        let names = self
            .go_files
            .iter()
            .chain(self.cgo_files.iter())
            .chain(self.test_go_files.iter());
        if crate::target::is_current_dir(&self.dir) {
            names.map(PathBuf::from).collect()
        } else {
            names.map(|f| self.dir.join(f)).collect()
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{}", no_go_message(dir, *ignored))]
    NoGoFiles { dir: PathBuf, ignored: usize },
    #[error("cannot find package \"{path}\" in any of:{}", format_searched(searched))]
    NotFound { path: String, searched: Vec<PathBuf> },
    #[error("found packages {} in {}", format_packages(packages), dir.display())]
    MultiplePackages {
        dir: PathBuf,
        /// `(package, file)` pairs, one per distinct package name.
        packages: Vec<(String, String)>,
    },
    #[error("{}: {message}", file.display())]
    Parse { file: PathBuf, message: String },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// The silent "nothing to lint here" outcome.
    pub fn is_no_go(&self) -> bool {
        matches!(self, ResolveError::NoGoFiles { .. })
    }
}

fn no_go_message(dir: &Path, ignored: usize) -> String {
    if ignored > 0 {
        format!("build constraints exclude all Go files in {}", dir.display())
    } else {
        format!("no buildable Go source files in {}", dir.display())
    }
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|p| format!("\n\t{}", p.display()))
        .collect()
}

fn format_packages(packages: &[(String, String)]) -> String {
    packages
        .iter()
        .map(|(p, f)| format!("{} ({})", p, f))
        .collect::<Vec<_>>()
        .join(" and ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A `src` directory that import paths are relative to.
pub struct SrcRoot {
    pub dir: PathBuf,
    pub goroot: bool,
}

/// Resolves directories and import paths into packages.
pub trait PackageResolver: Sync {
    /// Import the package in `dir`.
    fn import_dir(&self, dir: &Path) -> Result<Package, ResolveError>;

    /// Import `path` (import path or local `./x` path) relative to `base`.
    fn import(&self, path: &str, base: &Path) -> Result<Package, ResolveError>;

    /// Source roots for import-path pattern expansion, GOROOT first.
    fn src_roots(&self) -> Vec<SrcRoot>;
}

/// Lexical clean of a slash-separated path, as Go's `path.Clean`.
pub fn clean_path(p: &str) -> String {
    if p.is_empty() {
        return ".".to_string();
    }
    let rooted = p.starts_with('/');
    let mut out: Vec<&str> = Vec::new();
    for part in p.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(last) if *last != "..") {
                    out.pop();
                } else if !rooted {
                    out.push("..");
                }
            }
            _ => out.push(part),
        }
    }
    let joined = out.join("/");
    if rooted {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Clean an import path argument, keeping a leading `./`.
pub fn clean_import_path(p: &str) -> String {
    if p.starts_with("./") {
        match clean_path(p).as_str() {
            "." => ".".to_string(),
            other if other.starts_with("../") || other == ".." => other.to_string(),
            other => format!("./{}", other),
        }
    } else {
        clean_path(p)
    }
}

/// Whether `path` is a local import (`.`, `..`, `./x`, `../x`).
pub fn is_local_import(path: &str) -> bool {
    path == "."
        || path == ".."
        || path.starts_with("./")
        || path.starts_with("../")
}
