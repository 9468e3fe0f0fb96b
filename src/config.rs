//! Configuration discovery and effective settings resolution.
//!
//! golint reads `golint.toml|yaml|yml` from the repository root (or closest
//! ancestor, stopping at `.git`) unless `--config` names a file, and merges it
//! with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `min_confidence`: 0.8
//! - `set_exit_status`: false
//! - `output`: `human`
//! - `analyzer.command`: `golint-engine`
//! - every rule category enabled
//! - build context from `GOOS`/`GOARCH`/`CGO_ENABLED`/`GOROOT`/`GOPATH`,
//!   with every `go1.N` release tag satisfied unless `build.go_version` is set
//!
//! Overrides precedence: CLI > config file > defaults. A config file that
//! cannot be read or parsed is reported as a warning and ignored.

use crate::lint::DEFAULT_MIN_CONFIDENCE;
use crate::resolver::{parse_go_minor, BuildContext};
use crate::rules::{RuleFlags, RuleSet};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Config file names probed in each directory, in order.
pub const CONFIG_FILES: [&str; 3] = ["golint.toml", "golint.yaml", "golint.yml"];

/// Analyzer executable used when neither CLI nor config names one.
pub const DEFAULT_ANALYZER: &str = "golint-engine";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Engine invocation under `[analyzer]`.
pub struct AnalyzerCfg {
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Build context overrides under `[build]`.
pub struct BuildCfg {
    pub goos: Option<String>,
    pub goarch: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cgo: Option<bool>,
    pub goroot: Option<PathBuf>,
    pub gopath: Option<Vec<PathBuf>>,
    /// Target release, e.g. `"1.22"`; bounds `go1.N` build tags.
    pub go_version: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `golint.toml|yaml`.
pub struct GolintConfig {
    pub min_confidence: Option<f64>,
    pub set_exit_status: Option<bool>,
    pub output: Option<String>,
    /// Globs pruning directories during `...` expansion.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub analyzer: AnalyzerCfg,
    #[serde(default)]
    pub rules: RuleFlags,
    #[serde(default)]
    pub build: BuildCfg,
}

#[derive(Debug, Default)]
/// Values given on the command line; `None` defers to config/defaults.
pub struct CliOverrides<'a> {
    pub min_confidence: Option<f64>,
    pub set_exit_status: Option<bool>,
    pub output: Option<&'a str>,
    pub analyzer: Option<&'a str>,
    pub config: Option<&'a str>,
    pub rules: RuleFlags,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the run after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    /// File the settings were loaded from, if any.
    pub config_path: Option<PathBuf>,
    pub min_confidence: f64,
    pub set_exit_status: bool,
    pub output: String,
    pub exclude: Vec<glob::Pattern>,
    pub analyzer_command: String,
    pub analyzer_args: Vec<String>,
    pub rules: RuleSet,
    pub build: BuildContext,
    /// Tolerated problems (bad config file, bad globs) to show the user.
    pub warnings: Vec<String>,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `golint.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// First config file present in `root`.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|f| root.join(f))
        .find(|p| p.exists())
}

/// Load `GolintConfig` from a TOML or YAML file, chosen by extension.
pub fn load_config(path: &Path) -> Result<GolintConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if yaml {
        serde_yaml::from_str(&s).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(&s).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn anchored(root: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        p
    } else {
        root.join(p)
    }
}

/// Environment build context with `[build]` applied on top.
///
/// An unparseable `go_version` adds a warning and leaves release tags
/// unbounded.
pub fn build_context(cfg: &BuildCfg, root: &Path, warnings: &mut Vec<String>) -> BuildContext {
    let mut ctx = BuildContext::from_env();
    if let Some(goos) = &cfg.goos {
        ctx.goos = goos.clone();
    }
    if let Some(goarch) = &cfg.goarch {
        ctx.goarch = goarch.clone();
    }
    if let Some(cgo) = cfg.cgo {
        ctx.cgo_enabled = cgo;
    }
    ctx.build_tags.extend(cfg.tags.iter().cloned());
    if let Some(goroot) = &cfg.goroot {
        ctx.goroot = Some(anchored(root, goroot.clone()));
    }
    if let Some(gopath) = &cfg.gopath {
        ctx.gopath = gopath.iter().cloned().map(|p| anchored(root, p)).collect();
    }
    if let Some(version) = &cfg.go_version {
        match parse_go_minor(version) {
            Some(minor) => ctx.go_minor = Some(minor),
            None => warnings.push(format!("invalid go_version {:?}; ignoring", version)),
        }
    }
    ctx
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults,
/// starting discovery at `start`.
pub fn resolve_effective(start: &Path, cli: &CliOverrides<'_>) -> Effective {
    let mut warnings = Vec::new();
    let (repo_root, config_path) = match cli.config {
        Some(explicit) => {
            let p = PathBuf::from(explicit);
            let root = p
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start.to_path_buf());
            (root, Some(p))
        }
        None => {
            let root = detect_repo_root(start);
            let found = find_config(&root);
            (root, found)
        }
    };

    let cfg = match config_path.as_deref().map(load_config) {
        Some(Ok(cfg)) => {
            debug!(path = ?config_path, "loaded config");
            cfg
        }
        Some(Err(e)) => {
            warn!(error = %e, "ignoring config file");
            warnings.push(format!("{}; using defaults", e));
            GolintConfig::default()
        }
        None => GolintConfig::default(),
    };

    let min_confidence = cli
        .min_confidence
        .or(cfg.min_confidence)
        .unwrap_or(DEFAULT_MIN_CONFIDENCE);
    let set_exit_status = cli.set_exit_status.or(cfg.set_exit_status).unwrap_or(false);

    let mut output = cli
        .output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        warnings.push(format!("unknown output mode {:?}; using human", output));
        output = "human".to_string();
    }

    let mut exclude = Vec::new();
    for raw in &cfg.exclude {
        match glob::Pattern::new(raw) {
            Ok(p) => exclude.push(p),
            Err(e) => warnings.push(format!("invalid exclude pattern {:?}: {}", raw, e)),
        }
    }

    let analyzer_command = cli
        .analyzer
        .map(|s| s.to_string())
        .or(cfg.analyzer.command)
        .unwrap_or_else(|| DEFAULT_ANALYZER.to_string());

    let build = build_context(&cfg.build, &repo_root, &mut warnings);

    Effective {
        rules: RuleSet::resolve(&cli.rules, &cfg.rules),
        build,
        repo_root,
        config_path,
        min_confidence,
        set_exit_status,
        output,
        exclude,
        analyzer_command,
        analyzer_args: cfg.analyzer.args,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        let mut f = fs::File::create(root.join("golint.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
min_confidence = 0.5
set_exit_status = true
output = "json"
exclude = ["**/generated"]

[analyzer]
command = "my-engine"
args = ["--fast"]

[rules]
names = false

[build]
goos = "windows"
goarch = "arm64"
tags = ["integration"]
cgo = false
gopath = ["third_party/go"]
go_version = "1.22"
"#
        )
        .unwrap();

        let start = root.join("pkg/sub");
        assert_eq!(detect_repo_root(&start), root);
        let eff = resolve_effective(&start, &CliOverrides::default());
        assert_eq!(eff.config_path, Some(root.join("golint.toml")));
        assert_eq!(eff.min_confidence, 0.5);
        assert!(eff.set_exit_status);
        assert_eq!(eff.output, "json");
        assert_eq!(eff.exclude.len(), 1);
        assert!(eff.exclude[0].matches("a/generated"));
        assert_eq!(eff.analyzer_command, "my-engine");
        assert_eq!(eff.analyzer_args, vec!["--fast"]);
        assert!(!eff.rules.names);
        assert!(eff.rules.exported);
        assert_eq!(eff.build.goos, "windows");
        assert_eq!(eff.build.goarch, "arm64");
        assert!(!eff.build.cgo_enabled);
        assert_eq!(eff.build.build_tags, vec!["integration"]);
        assert_eq!(eff.build.gopath, vec![root.join("third_party/go")]);
        assert_eq!(eff.build.go_minor, Some(22));
        assert!(!eff.build.match_tag("go1.23"));
        assert!(eff.warnings.is_empty());
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        let mut f = fs::File::create(root.join("golint.yml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
rules:
  errorf: false
"#
        )
        .unwrap();

        let eff = resolve_effective(root, &CliOverrides::default());
        assert_eq!(eff.min_confidence, 0.8);
        assert!(!eff.set_exit_status);
        assert_eq!(eff.output, "human");
        assert_eq!(eff.analyzer_command, DEFAULT_ANALYZER);
        assert_eq!(eff.rules.disabled(), vec!["errorf"]);
    }

    #[test]
    fn test_cli_takes_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("golint.toml"),
            "min_confidence = 0.3\nset_exit_status = true\noutput = \"json\"\n[rules]\nimports = false\nelses = false\n",
        )
        .unwrap();
        let cli = CliOverrides {
            min_confidence: Some(0.95),
            set_exit_status: Some(false),
            output: Some("human"),
            analyzer: Some("/opt/engine"),
            rules: RuleFlags {
                imports: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        let eff = resolve_effective(root, &cli);
        assert_eq!(eff.min_confidence, 0.95);
        assert!(!eff.set_exit_status);
        assert_eq!(eff.output, "human");
        assert_eq!(eff.analyzer_command, "/opt/engine");
        assert!(eff.rules.imports);
        assert!(!eff.rules.elses);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("golint.toml"), "min_confidence = \"high\"\n").unwrap();
        let eff = resolve_effective(root, &CliOverrides::default());
        assert_eq!(eff.min_confidence, 0.8);
        assert_eq!(eff.warnings.len(), 1);
        assert!(eff.warnings[0].starts_with("invalid config"));
        assert!(eff.warnings[0].ends_with("using defaults"));
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = tempdir().unwrap();
        let cfg_dir = dir.path().join("ci");
        fs::create_dir_all(&cfg_dir).unwrap();
        fs::write(cfg_dir.join("strict.yaml"), "min_confidence: 0.2\nexclude: ['[']\n").unwrap();
        let cfg_file = cfg_dir.join("strict.yaml");
        let cli = CliOverrides {
            config: cfg_file.to_str(),
            ..Default::default()
        };
        let eff = resolve_effective(dir.path(), &cli);
        assert_eq!(eff.min_confidence, 0.2);
        assert_eq!(eff.repo_root, cfg_dir);
        assert!(eff.exclude.is_empty());
        assert_eq!(eff.warnings.len(), 1);

        let missing = CliOverrides {
            config: Some("/nonexistent/golint.toml"),
            ..Default::default()
        };
        let eff = resolve_effective(dir.path(), &missing);
        assert!(eff.warnings[0].starts_with("cannot read"));
    }
}
