//! `go/build`-style resolver over the local filesystem.

use super::constraint::Constraint;
use super::context::BuildContext;
use super::header::{self, Header};
use super::{
    clean_import_path, clean_path, is_local_import, Package, PackageResolver, ResolveError,
    SrcRoot,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

#[derive(Debug, Clone, Default)]
pub struct GoResolver {
    pub ctx: BuildContext,
}

enum FileRole {
    Go,
    Cgo,
    Test,
    XTest,
    Ignored,
}

impl GoResolver {
    pub fn new(ctx: BuildContext) -> Self {
        Self { ctx }
    }

    fn should_build(&self, h: &Header) -> Result<bool, String> {
        let has_tag = |t: &str| self.ctx.match_tag(t);
        if let Some(expr) = h.go_build.as_deref() {
            return Ok(Constraint::parse_go_build(expr)?.eval(&has_tag));
        }
        match Constraint::parse_plus_build(&h.plus_build)? {
            Some(c) => Ok(c.eval(&has_tag)),
            None => Ok(true),
        }
    }

    fn classify_file(
        &self,
        dir: &Path,
        name: &str,
    ) -> Result<(FileRole, Option<Header>), ResolveError> {
        if !self.ctx.good_os_arch_file(name) {
            return Ok((FileRole::Ignored, None));
        }
        let path = dir.join(name);
        let bytes = fs::read(&path).map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;
        let src = String::from_utf8_lossy(&bytes);
        let h = header::parse(&src).map_err(|message| ResolveError::Parse {
            file: path.clone(),
            message,
        })?;
        let build = self.should_build(&h).map_err(|message| ResolveError::Parse {
            file: path.clone(),
            message,
        })?;
        if !build {
            return Ok((FileRole::Ignored, Some(h)));
        }
        let is_test = name.ends_with("_test.go");
        let role = if is_test && h.package.ends_with("_test") {
            FileRole::XTest
        } else if is_test {
            FileRole::Test
        } else if h.imports_c() {
            if self.ctx.cgo_enabled {
                FileRole::Cgo
            } else {
                FileRole::Ignored
            }
        } else {
            FileRole::Go
        };
        Ok((role, Some(h)))
    }

    /// Directory holding the module whose `go.mod` is nearest above `base`.
    fn find_module(base: &Path) -> Option<(PathBuf, String)> {
        let start = if base.is_absolute() {
            base.to_path_buf()
        } else {
            std::env::current_dir().ok()?.join(base)
        };
        let mut cur = start.as_path();
        loop {
            let gomod = cur.join("go.mod");
            if let Ok(s) = fs::read_to_string(&gomod) {
                let module = s.lines().find_map(|l| {
                    let rest = l.trim().strip_prefix("module")?;
                    if !rest.starts_with([' ', '\t']) {
                        return None;
                    }
                    Some(rest.trim().trim_matches('"').to_string())
                })?;
                return Some((cur.to_path_buf(), module));
            }
            cur = cur.parent()?;
        }
    }
}

/// Show `dir` relative to the working directory when it lies below it.
fn display_dir(dir: PathBuf) -> PathBuf {
    let Ok(cwd) = std::env::current_dir() else {
        return dir;
    };
    if !dir.starts_with(&cwd) {
        return dir;
    }
    match pathdiff::diff_paths(&dir, &cwd) {
        Some(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Some(rel) => rel,
        None => dir,
    }
}

fn is_dir(p: &Path) -> bool {
    fs::metadata(p).map(|m| m.is_dir()).unwrap_or(false)
}

impl PackageResolver for GoResolver {
    fn import_dir(&self, dir: &Path) -> Result<Package, ResolveError> {
        let entries = fs::read_dir(dir).map_err(|source| ResolveError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut names: Vec<String> = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".go") || name.starts_with('_') || name.starts_with('.') {
                continue;
            }
            // Follow symlinks; only regular files count.
            if fs::metadata(entry.path()).map(|m| m.is_file()).unwrap_or(false) {
                names.push(name);
            }
        }
        names.sort();

        let shown = PathBuf::from(clean_path(&dir.to_string_lossy()));
        let mut pkg = Package {
            import_path: shown.to_string_lossy().to_string(),
            dir: shown,
            ..Default::default()
        };
        let mut seen: Vec<(String, String)> = Vec::new();
        for name in names {
            let (role, h) = self.classify_file(dir, &name)?;
            trace!(file = %name, "classified source file");
            let list = match role {
                FileRole::Ignored => {
                    pkg.ignored_go_files.push(name);
                    continue;
                }
                FileRole::Go => &mut pkg.go_files,
                FileRole::Cgo => &mut pkg.cgo_files,
                FileRole::Test => &mut pkg.test_go_files,
                FileRole::XTest => &mut pkg.xtest_go_files,
            };
            let is_xtest = matches!(role, FileRole::XTest);
            list.push(name.clone());
            if is_xtest {
                continue;
            }
            if let Some(h) = h {
                if !seen.iter().any(|(p, _)| *p == h.package) {
                    seen.push((h.package.clone(), name));
                }
            }
        }
        let found = pkg.go_files.len()
            + pkg.cgo_files.len()
            + pkg.test_go_files.len()
            + pkg.xtest_go_files.len();
        if found == 0 {
            return Err(ResolveError::NoGoFiles {
                dir: pkg.dir,
                ignored: pkg.ignored_go_files.len(),
            });
        }
        if seen.len() > 1 {
            return Err(ResolveError::MultiplePackages {
                dir: pkg.dir,
                packages: seen,
            });
        }
        pkg.name = seen.into_iter().next().map(|(p, _)| p).unwrap_or_default();
        debug!(dir = %pkg.dir.display(), package = %pkg.name, "imported directory");
        Ok(pkg)
    }

    fn import(&self, path: &str, base: &Path) -> Result<Package, ResolveError> {
        let cleaned = clean_import_path(path);
        if is_local_import(&cleaned) {
            let dir = if crate::target::is_current_dir(base) {
                PathBuf::from(clean_path(&cleaned))
            } else {
                base.join(clean_path(&cleaned))
            };
            let mut pkg = self.import_dir(&dir)?;
            pkg.import_path = cleaned;
            return Ok(pkg);
        }

        let mut searched: Vec<PathBuf> = Vec::new();
        if let Some((root, module)) = Self::find_module(base) {
            let rest = if cleaned == module {
                Some("")
            } else {
                cleaned
                    .strip_prefix(module.as_str())
                    .and_then(|r| r.strip_prefix('/'))
            };
            if let Some(rest) = rest {
                let dir = if rest.is_empty() { root } else { root.join(rest) };
                if is_dir(&dir) {
                    let mut pkg = self.import_dir(&display_dir(dir))?;
                    pkg.import_path = cleaned;
                    return Ok(pkg);
                }
                searched.push(dir);
            }
        }
        for src in self.src_roots() {
            let dir = src.dir.join(&cleaned);
            if is_dir(&dir) {
                let mut pkg = self.import_dir(&display_dir(dir))?;
                pkg.import_path = cleaned;
                return Ok(pkg);
            }
            searched.push(dir);
        }
        Err(ResolveError::NotFound {
            path: cleaned,
            searched,
        })
    }

    fn src_roots(&self) -> Vec<SrcRoot> {
        let mut roots = Vec::new();
        if let Some(goroot) = self.ctx.goroot.as_ref() {
            roots.push(SrcRoot {
                dir: goroot.join("src"),
                goroot: true,
            });
        }
        for gp in &self.ctx.gopath {
            if Some(gp) == self.ctx.goroot.as_ref() {
                continue;
            }
            roots.push(SrcRoot {
                dir: gp.join("src"),
                goroot: false,
            });
        }
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn resolver() -> GoResolver {
        GoResolver::new(BuildContext {
            goos: "linux".into(),
            goarch: "amd64".into(),
            cgo_enabled: true,
            build_tags: Vec::new(),
            goroot: None,
            gopath: Vec::new(),
            go_minor: None,
        })
    }

    #[test]
    fn test_import_dir_categorizes_files() {
        let dir = tempdir().unwrap();
        let d = dir.path();
        fs::write(d.join("a.go"), "package demo\n").unwrap();
        fs::write(d.join("c.go"), "package demo\n\nimport \"C\"\n").unwrap();
        fs::write(d.join("a_test.go"), "package demo\n").unwrap();
        fs::write(d.join("x_test.go"), "package demo_test\n").unwrap();
        fs::write(d.join("w_windows.go"), "package demo\n").unwrap();
        fs::write(d.join("ig.go"), "//go:build ignore\n\npackage main\n").unwrap();
        fs::write(d.join("_skip.go"), "package other\n").unwrap();
        fs::write(d.join("notes.txt"), "hello").unwrap();

        let pkg = resolver().import_dir(d).unwrap();
        assert_eq!(pkg.name, "demo");
        assert_eq!(pkg.go_files, vec!["a.go"]);
        assert_eq!(pkg.cgo_files, vec!["c.go"]);
        assert_eq!(pkg.test_go_files, vec!["a_test.go"]);
        assert_eq!(pkg.xtest_go_files, vec!["x_test.go"]);
        assert_eq!(pkg.ignored_go_files, vec!["ig.go", "w_windows.go"]);
        assert_eq!(
            pkg.files(),
            vec![d.join("a.go"), d.join("c.go"), d.join("a_test.go")]
        );
    }

    #[test]
    fn test_import_dir_accepts_byte_order_mark() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "\u{FEFF}package demo\n").unwrap();
        let pkg = resolver().import_dir(dir.path()).unwrap();
        assert_eq!(pkg.name, "demo");
        assert_eq!(pkg.go_files, vec!["a.go"]);
    }

    #[test]
    fn test_release_tags_follow_go_version() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("new.go"), "//go:build go1.24\n\npackage demo\n").unwrap();
        let pkg = resolver().import_dir(dir.path()).unwrap();
        assert_eq!(pkg.go_files, vec!["new.go"]);

        let mut r = resolver();
        r.ctx.go_minor = Some(22);
        let err = r.import_dir(dir.path()).unwrap_err();
        assert!(err.is_no_go());
        assert!(err.to_string().starts_with("build constraints exclude"));
    }

    #[test]
    fn test_cgo_disabled_ignores_cgo_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("c.go"), "package demo\nimport \"C\"\n").unwrap();
        let mut r = resolver();
        r.ctx.cgo_enabled = false;
        let err = r.import_dir(dir.path()).unwrap_err();
        assert!(err.is_no_go());
        assert!(err.to_string().starts_with("build constraints exclude"));
    }

    #[test]
    fn test_empty_dir_is_no_go() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# hi").unwrap();
        let err = resolver().import_dir(dir.path()).unwrap_err();
        assert!(err.is_no_go());
    }

    #[test]
    fn test_multiple_packages_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package a\n").unwrap();
        fs::write(dir.path().join("b.go"), "package b\n").unwrap();
        let err = resolver().import_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ResolveError::MultiplePackages { .. }));
        assert!(err.to_string().contains("a (a.go) and b (b.go)"));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "func main() {}\n").unwrap();
        let err = resolver().import_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ResolveError::Parse { .. }));
    }

    #[test]
    fn test_import_local_path() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("s.go"), "package sub\n").unwrap();
        let pkg = resolver().import("./sub", dir.path()).unwrap();
        assert_eq!(pkg.import_path, "./sub");
        assert_eq!(pkg.files(), vec![sub.join("s.go")]);
    }

    #[test]
    fn test_import_from_gopath_and_not_found() {
        let dir = tempdir().unwrap();
        let gopath = dir.path().join("gopath");
        let pkg_dir = gopath.join("src/example.com/lib");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(pkg_dir.join("lib.go"), "package lib\n").unwrap();
        let mut r = resolver();
        r.ctx.gopath = vec![gopath.clone()];

        let pkg = r.import("example.com/lib/", dir.path()).unwrap();
        assert_eq!(pkg.name, "lib");
        assert_eq!(pkg.import_path, "example.com/lib");

        let err = r.import("example.com/missing", dir.path()).unwrap_err();
        match err {
            ResolveError::NotFound { path, searched } => {
                assert_eq!(path, "example.com/missing");
                assert!(searched.contains(&gopath.join("src/example.com/missing")));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_import_from_module() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("go.mod"), "module example.com/app\n\ngo 1.21\n").unwrap();
        fs::create_dir_all(root.join("internal/util")).unwrap();
        fs::write(root.join("internal/util/u.go"), "package util\n").unwrap();
        fs::write(root.join("main.go"), "package main\n").unwrap();

        let r = resolver();
        let pkg = r.import("example.com/app/internal/util", root).unwrap();
        assert_eq!(pkg.name, "util");
        let pkg = r.import("example.com/app", root).unwrap();
        assert_eq!(pkg.name, "main");
    }

    #[test]
    fn test_src_roots_goroot_first() {
        let mut r = resolver();
        r.ctx.goroot = Some(PathBuf::from("/opt/go"));
        r.ctx.gopath = vec![PathBuf::from("/home/u/go"), PathBuf::from("/opt/go")];
        let roots = r.src_roots();
        assert_eq!(roots.len(), 2);
        assert!(roots[0].goroot);
        assert_eq!(roots[1].dir, PathBuf::from("/home/u/go/src"));
    }
}
