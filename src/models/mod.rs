//! Shared data models for findings, run summaries, and lint results.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Source location reported by the analyzer.
pub struct Position {
    pub filename: String,
    pub line: usize,
    #[serde(default)]
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Mirrors go/token.Position: `file:line:col`, `file:line` without a
        // column, `line:col` without a file, `-` when nothing is known.
        let mut s = self.filename.clone();
        if self.line > 0 {
            if !s.is_empty() {
                s.push(':');
            }
            s.push_str(&self.line.to_string());
            if self.column != 0 {
                s.push_str(&format!(":{}", self.column));
            }
        }
        if s.is_empty() {
            s.push('-');
        }
        f.write_str(&s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single problem reported by the analysis engine.
pub struct Finding {
    pub position: Position,
    pub text: String,
    /// In `[0, 1]`; compared against the minimum confidence.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A non-fatal problem with one target, file, or unit.
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Run-wide counters. `suggestions` drives the exit status.
pub struct Summary {
    pub suggestions: usize,
    pub units: usize,
    pub files: usize,
    pub errors: usize,
}

#[derive(Debug, Default, Serialize)]
/// Lint results container, in emission order.
pub struct LintResult {
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: Summary,
}
