//! Target platform and search paths used while resolving packages.

use std::env;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips",
    "mipsle", "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le",
    "riscv", "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub cgo_enabled: bool,
    /// Extra tags, as `go build -tags`.
    pub build_tags: Vec<String>,
    pub goroot: Option<PathBuf>,
    pub gopath: Vec<PathBuf>,
    /// Minor version of the target Go release; `go1.N` tags above it are
    /// unsatisfied. `None` satisfies every release tag.
    pub go_minor: Option<u32>,
}

fn host_os() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_arch() -> &'static str {
    match env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Run `<program> env <key>` and return its trimmed, non-empty output.
fn go_env(program: &str, key: &str) -> Option<String> {
    let out = Command::new(program).args(["env", key]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Minor number of a Go version such as `1.22`, `1.22.3` or `go1.24rc1`.
pub fn parse_go_minor(version: &str) -> Option<u32> {
    let v = version.trim();
    let v = v.strip_prefix("go").unwrap_or(v);
    let minor = v.strip_prefix("1.")?;
    let digits = minor
        .find(|c: char| !c.is_ascii_digit())
        .map_or(minor, |i| &minor[..i]);
    digits.parse().ok()
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            goos: host_os().to_string(),
            goarch: host_arch().to_string(),
            cgo_enabled: true,
            build_tags: Vec::new(),
            goroot: None,
            gopath: Vec::new(),
            go_minor: None,
        }
    }
}

impl BuildContext {
    /// Read `GOOS`, `GOARCH`, `CGO_ENABLED`, `GOROOT` and `GOPATH`.
    ///
    /// GOPATH defaults to `$HOME/go`. Without `GOROOT` the `go` tool is asked
    /// for it. Cgo defaults to on only when building for the host platform.
    pub fn from_env() -> Self {
        let goos = non_empty_var("GOOS").unwrap_or_else(|| host_os().to_string());
        let goarch = non_empty_var("GOARCH").unwrap_or_else(|| host_arch().to_string());
        let cgo_enabled = match non_empty_var("CGO_ENABLED").as_deref() {
            Some("1") => true,
            Some(_) => false,
            None => goos == host_os() && goarch == host_arch(),
        };
        let gopath = match env::var_os("GOPATH") {
            Some(v) if !v.is_empty() => env::split_paths(&v).collect(),
            _ => dirs::home_dir()
                .map(|h| vec![h.join("go")])
                .unwrap_or_default(),
        };
        let goroot = non_empty_var("GOROOT").or_else(|| {
            let found = go_env("go", "GOROOT");
            debug!(goroot = ?found, "GOROOT unset; asked the go tool");
            found
        });
        Self {
            goos,
            goarch,
            cgo_enabled,
            build_tags: Vec::new(),
            goroot: goroot.map(PathBuf::from),
            gopath,
            go_minor: None,
        }
    }

    /// Whether `tag` is satisfied in this context.
    pub fn match_tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch {
            return true;
        }
        match tag {
            "gc" => return true,
            "cgo" => return self.cgo_enabled,
            "unix" => return UNIX_OS.contains(&self.goos.as_str()),
            "linux" if self.goos == "android" => return true,
            "solaris" if self.goos == "illumos" => return true,
            "darwin" if self.goos == "ios" => return true,
            _ => {}
        }
        if let Some(minor) = tag.strip_prefix("go1.") {
            if let Ok(n) = minor.parse::<u32>() {
                return n >= 1 && self.go_minor.map_or(true, |max| n <= max);
            }
        }
        self.build_tags.iter().any(|t| t == tag)
    }

    /// Apply `*_GOOS`, `*_GOARCH` and `*_GOOS_GOARCH` file name rules.
    pub fn good_os_arch_file(&self, name: &str) -> bool {
        let stem = name.split('.').next().unwrap_or(name);
        let Some(i) = stem.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = stem[i..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.match_tag(parts[n - 2]) && self.match_tag(parts[n - 1]);
        }
        if n >= 1 && (KNOWN_OS.contains(&parts[n - 1]) || KNOWN_ARCH.contains(&parts[n - 1])) {
            return self.match_tag(parts[n - 1]);
        }
        true
    }
}
