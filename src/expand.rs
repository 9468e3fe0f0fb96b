//! `...` pattern expansion over directory trees.
//!
//! Directory targets (`dir/...`), local package patterns (`./x/...`) and
//! import-path patterns (`example.com/org/...`, `all`, `std`) all reduce to
//! the same walk: visit directories below a root, prune hidden, `_`-prefixed,
//! `testdata` and `vendor` trees (plus configured excludes), keep the ones
//! whose name matches the pattern and that hold Go sources. [`Root`] selects
//! how a visited directory is named.

use crate::resolver::{clean_path, PackageResolver, SrcRoot};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// How walked directories are rooted and named.
pub enum Root<'a> {
    /// Walk from the pattern's directory part; names are paths.
    Filesystem,
    /// Walk each `src` root; names are import paths relative to it.
    SrcRoots(&'a [SrcRoot]),
}

/// Compile a Go package pattern: `...` matches anything and a trailing
/// `/...` also matches the bare prefix.
pub fn match_pattern(pattern: &str) -> Regex {
    let mut re = regex::escape(pattern).replace(r"\.\.\.", ".*");
    if let Some(stem) = re.strip_suffix("/.*") {
        re = format!("{}(/.*)?", stem);
    }
    Regex::new(&format!("^{}$", re)).expect("escaped pattern is a valid regex")
}

fn has_path_prefix(s: &str, prefix: &str) -> bool {
    if s.len() == prefix.len() {
        return s == prefix;
    }
    if s.len() < prefix.len() {
        return false;
    }
    if prefix.ends_with('/') {
        return s.starts_with(prefix);
    }
    s.as_bytes()[prefix.len()] == b'/' && s.starts_with(prefix)
}

/// Whether any directory below `name` could still match `pattern`.
pub fn tree_can_match(pattern: &str, name: &str) -> bool {
    let (prefix, wildcard) = match pattern.find("...") {
        Some(i) => (&pattern[..i], true),
        None => (pattern, false),
    };
    (name.len() <= prefix.len() && has_path_prefix(prefix, name))
        || (wildcard && name.starts_with(prefix))
}

/// Walks directory trees and keeps package directories matching a pattern.
pub struct Expander<'a> {
    resolver: &'a dyn PackageResolver,
    exclude: &'a [glob::Pattern],
}

impl<'a> Expander<'a> {
    pub fn new(resolver: &'a dyn PackageResolver, exclude: &'a [glob::Pattern]) -> Self {
        Self { resolver, exclude }
    }

    fn pruned(&self, entry: &DirEntry, name: &str) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let elem = entry.file_name().to_string_lossy();
        elem.starts_with('.')
            || elem.starts_with('_')
            || elem == "testdata"
            || elem == "vendor"
            || self.exclude.iter().any(|p| p.matches(name))
    }

    /// Directories holding Go sources, ignoring only the "no sources" case.
    fn is_package_dir(&self, dir: &Path) -> bool {
        match self.resolver.import_dir(dir) {
            Ok(_) => true,
            Err(e) => !e.is_no_go(),
        }
    }

    /// Expand `pattern` to matching names, in walk order, without duplicates.
    pub fn expand(&self, pattern: &str, root: Root<'_>) -> Vec<String> {
        let names = match root {
            Root::Filesystem => self.expand_fs(pattern),
            Root::SrcRoots(roots) => self.expand_src(pattern, roots),
        };
        debug!(pattern, matched = names.len(), "expanded pattern");
        names
    }

    fn expand_fs(&self, pattern: &str) -> Vec<String> {
        self.expand_fs_in(Path::new(""), pattern)
    }

    /// Filesystem expansion with relative patterns taken from `base`.
    fn expand_fs_in(&self, base: &Path, pattern: &str) -> Vec<String> {
        let head = match pattern.find("...") {
            Some(i) => &pattern[..i],
            None => pattern,
        };
        let dir = match head.rfind('/') {
            Some(i) => &head[..=i],
            None => "",
        };
        let walk_root = base.join(if dir.is_empty() { "." } else { dir });
        let prefix = if pattern.starts_with("./") { "./" } else { "" };
        let re = match_pattern(pattern);
        let relative = |p: &Path| -> String {
            let rel = if base.as_os_str().is_empty() {
                p.to_path_buf()
            } else {
                pathdiff::diff_paths(p, base).unwrap_or_else(|| p.to_path_buf())
            };
            clean_path(&rel.to_string_lossy().replace('\\', "/"))
        };

        let mut out = Vec::new();
        let mut have: HashSet<String> = HashSet::new();
        let walker = WalkDir::new(&walk_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.pruned(e, &relative(e.path())));
        for entry in walker.filter_map(Result::ok) {
            if !entry.file_type().is_dir() {
                continue;
            }
            let path = relative(entry.path());
            let name = if prefix.is_empty() || path.starts_with("../") || path == ".." {
                path
            } else if path == "." {
                ".".to_string()
            } else {
                format!("{}{}", prefix, path)
            };
            if !re.is_match(&name) || !have.insert(name.clone()) {
                continue;
            }
            if self.is_package_dir(entry.path()) {
                out.push(name);
            }
        }
        out
    }

    fn expand_src(&self, pattern: &str, roots: &[SrcRoot]) -> Vec<String> {
        let everything = pattern == "all" || pattern == "std";
        let re = match_pattern(pattern);
        let mut out = Vec::new();
        let mut have: HashSet<String> = HashSet::new();
        have.insert("builtin".to_string());

        for src in roots {
            if pattern == "std" && !src.goroot {
                continue;
            }
            let import_name = |e: &DirEntry| -> String {
                e.path()
                    .strip_prefix(&src.dir)
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default()
            };
            let walker = WalkDir::new(&src.dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    if e.depth() == 0 {
                        return true;
                    }
                    if !e.file_type().is_dir() {
                        return false;
                    }
                    let name = import_name(e);
                    if self.pruned(e, &name) {
                        return false;
                    }
                    if pattern == "std" && name.contains('.') {
                        return false;
                    }
                    everything || tree_can_match(pattern, &name)
                });
            for entry in walker.filter_map(Result::ok) {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    continue;
                }
                let name = import_name(&entry);
                if !have.insert(name.clone()) {
                    continue;
                }
                if !everything && !re.is_match(&name) {
                    continue;
                }
                if self.is_package_dir(entry.path()) {
                    out.push(name);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{BuildContext, GoResolver};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn resolver() -> GoResolver {
        GoResolver::new(BuildContext {
            goos: "linux".into(),
            goarch: "amd64".into(),
            cgo_enabled: false,
            build_tags: Vec::new(),
            goroot: None,
            gopath: Vec::new(),
            go_minor: None,
        })
    }

    fn write(path: PathBuf, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_match_pattern() {
        let re = match_pattern("foo/...");
        assert!(re.is_match("foo"));
        assert!(re.is_match("foo/bar/baz"));
        assert!(!re.is_match("foobar"));
        let re = match_pattern("net/.../http");
        assert!(re.is_match("net/x/http"));
        assert!(!re.is_match("net/http2"));
        let re = match_pattern("a.b/c");
        assert!(!re.is_match("axb/c"));
    }

    #[test]
    fn test_tree_can_match() {
        assert!(tree_can_match("example.com/org/...", "example.com"));
        assert!(tree_can_match("example.com/org/...", "example.com/org/x/y"));
        assert!(!tree_can_match("example.com/org/...", "golang.org"));
        assert!(!tree_can_match("example.com/org/...", "example.community"));
        assert!(tree_can_match("fmt", "fmt"));
        assert!(!tree_can_match("fmt", "fmt/sub"));
    }

    #[test]
    fn test_expand_fs_prunes_and_skips_no_go() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        write(root.join("a.go"), "package root\n");
        write(root.join("sub/README.md"), "no go here");
        write(root.join("sub/deep/d.go"), "package deep\n");
        write(root.join(".hidden/h.go"), "package h\n");
        write(root.join("_old/o.go"), "package o\n");
        write(root.join("testdata/t.go"), "package t\n");
        write(root.join("vendor/v/v.go"), "package v\n");
        write(root.join("gen/g.go"), "package gen\n");

        let r = resolver();
        let exclude = vec![glob::Pattern::new("**/gen").unwrap()];
        let ex = Expander::new(&r, &exclude);
        let pattern = format!("{}/...", root.to_string_lossy());
        let got = ex.expand(&pattern, Root::Filesystem);
        let base = clean_path(&root.to_string_lossy());
        assert_eq!(got, vec![base.clone(), format!("{}/sub/deep", base)]);
    }

    #[test]
    fn test_expand_fs_keeps_erroring_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        write(root.join("a.go"), "package a\n");
        write(root.join("b.go"), "package b\n");
        let r = resolver();
        let ex = Expander::new(&r, &[]);
        let got = ex.expand(&format!("{}/...", root.to_string_lossy()), Root::Filesystem);
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn test_expand_fs_relative_patterns() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("work");
        write(root.join("main.go"), "package main\n");
        write(root.join("a/a.go"), "package a\n");
        write(root.join("a/b/b.go"), "package b\n");
        write(root.join("c/c.go"), "package c\n");
        write(root.join("c/testdata/t.go"), "package t\n");
        write(root.join(".cache/x.go"), "package x\n");

        let r = resolver();
        let ex = Expander::new(&r, &[]);
        assert_eq!(
            ex.expand_fs_in(&root, "./..."),
            vec![".", "./a", "./a/b", "./c"]
        );
        assert_eq!(ex.expand_fs_in(&root, "./a/..."), vec!["./a", "./a/b"]);
        assert_eq!(ex.expand_fs_in(&root, "a/..."), vec!["a", "a/b"]);
        // Names climbing out of the base keep their `..` form.
        assert_eq!(
            ex.expand_fs_in(&root.join("c"), "../a/..."),
            vec!["../a", "../a/b"]
        );
        assert!(ex.expand_fs_in(&root, "./missing/...").is_empty());
    }

    #[test]
    fn test_expand_src_roots() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        write(src.join("example.com/org/a/a.go"), "package a\n");
        write(src.join("example.com/org/b/b.go"), "package b\n");
        write(src.join("example.com/org/b/testdata/x.go"), "package x\n");
        write(src.join("example.com/other/c.go"), "package c\n");
        write(src.join("fmt/print.go"), "package fmt\n");

        let roots = vec![SrcRoot {
            dir: src.clone(),
            goroot: false,
        }];
        let r = resolver();
        let ex = Expander::new(&r, &[]);
        assert_eq!(
            ex.expand("example.com/org/...", Root::SrcRoots(&roots)),
            vec!["example.com/org/a", "example.com/org/b"]
        );
        assert_eq!(
            ex.expand("all", Root::SrcRoots(&roots)),
            vec![
                "example.com/org/a",
                "example.com/org/b",
                "example.com/other",
                "fmt"
            ]
        );
        // std only walks GOROOT.
        assert!(ex.expand("std", Root::SrcRoots(&roots)).is_empty());
        let goroot = vec![SrcRoot { dir: src, goroot: true }];
        assert_eq!(ex.expand("std", Root::SrcRoots(&goroot)), vec!["fmt"]);
    }
}
