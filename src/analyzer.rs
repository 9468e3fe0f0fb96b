//! Seam to the analysis engine.
//!
//! The orchestrator only sees [`Analyzer`]. [`CommandAnalyzer`] runs an
//! external engine process once per compilation unit:
//!
//! - stdin: `{"files": {"<path>": "<source>"}, "rules": {<category>: bool}}`
//! - stdout: `{"findings": [{"position": {...}, "text": ..., "confidence": ...}]}`
//!   or `{"error": "<message>"}`
//!
//! A non-zero exit, unreadable output or an `error` reply fails the unit.

use crate::models::Finding;
use crate::reader::SourceSet;
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("failed to start analyzer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("analyzer I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("analyzer `{program}` exited with {status}{}", stderr_suffix(stderr))]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("invalid analyzer response: {0}")]
    Protocol(#[from] serde_json::Error),
    /// Reported by the engine itself, e.g. a parse error.
    #[error("{0}")]
    Engine(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Lints one compilation unit.
pub trait Analyzer: Sync {
    fn lint_files(&self, files: &SourceSet, rules: &RuleSet) -> Result<Vec<Finding>, AnalyzerError>;
}

#[derive(Serialize)]
struct Request<'a> {
    files: BTreeMap<String, Cow<'a, str>>,
    rules: &'a RuleSet,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    findings: Vec<Finding>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
/// Runs an engine executable speaking JSON over stdio.
pub struct CommandAnalyzer {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Analyzer for CommandAnalyzer {
    fn lint_files(&self, files: &SourceSet, rules: &RuleSet) -> Result<Vec<Finding>, AnalyzerError> {
        let request = Request {
            files: files
                .iter()
                .map(|(p, b)| (p.to_string_lossy().to_string(), String::from_utf8_lossy(b)))
                .collect(),
            rules,
        };
        let payload = serde_json::to_vec(&request)?;
        debug!(program = %self.program, files = files.len(), "invoking analyzer");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AnalyzerError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        // Feed stdin from a separate thread so a chatty engine can't deadlock us.
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || -> std::io::Result<()> {
                stdin.write_all(&payload)?;
                stdin.flush()
            })
        });
        let output = child.wait_with_output()?;
        let write_result = writer.and_then(|w| w.join().ok());

        if !output.status.success() {
            return Err(AnalyzerError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        if let Some(Err(e)) = write_result {
            return Err(AnalyzerError::Io(e));
        }
        let response: Response = serde_json::from_slice(&output.stdout)?;
        if let Some(msg) = response.error {
            return Err(AnalyzerError::Engine(msg));
        }
        Ok(response.findings)
    }
}
