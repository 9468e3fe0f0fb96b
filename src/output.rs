//! Output rendering for lint results.
//!
//! Supports `human` (default) and `json` outputs. Human output prints one
//! `file:line:col: text` line per finding on stdout; the JSON form is a single
//! document with the findings and a top-level summary. Diagnostics always go
//! to stderr so stdout stays machine-consumable.

use crate::models::{Diagnostic, Level, LintResult};
use crate::utils::{error_prefix, warning_prefix};
use serde_json::json;
use serde_json::Value as JsonVal;

/// Print one diagnostic line on stderr.
pub fn print_diagnostic(d: &Diagnostic) {
    let prefix = match d.level {
        Level::Warning => warning_prefix(),
        Level::Error => error_prefix(),
    };
    eprintln!("{} {}", prefix, d.message);
}

/// Print lint results in the requested format.
pub fn print_lint(res: &LintResult, output: &str) {
    for d in &res.diagnostics {
        print_diagnostic(d);
    }
    match output {
        "json" => match serde_json::to_string_pretty(&compose_lint_json(res)) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} failed to render JSON: {}", error_prefix(), e),
        },
        _ => {
            for line in human_lines(res) {
                println!("{}", line);
            }
        }
    }
}

/// Finding lines as printed in human mode.
pub fn human_lines(res: &LintResult) -> Vec<String> {
    res.findings
        .iter()
        .map(|f| format!("{}: {}", f.position, f.text))
        .collect()
}

/// Compose lint JSON object (pure) for testing/snapshot purposes.
pub fn compose_lint_json(res: &LintResult) -> JsonVal {
    json!({
        "findings": res.findings,
        "summary": res.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Finding, Position, Summary};

    fn sample() -> LintResult {
        LintResult {
            findings: vec![
                Finding {
                    position: Position {
                        filename: "pkg/a.go".into(),
                        line: 12,
                        column: 1,
                    },
                    text: "exported function Serve should have comment or be unexported".into(),
                    confidence: 1.0,
                    category: Some("comments".into()),
                    link: None,
                },
                Finding {
                    position: Position {
                        filename: "pkg/b.go".into(),
                        line: 3,
                        column: 0,
                    },
                    text: "should not use dot imports".into(),
                    confidence: 0.9,
                    category: None,
                    link: None,
                },
            ],
            diagnostics: vec![Diagnostic::error("cannot find package \"x\" in any of:")],
            summary: Summary {
                suggestions: 2,
                units: 1,
                files: 2,
                errors: 1,
            },
        }
    }

    #[test]
    fn test_human_lines_format() {
        let lines = human_lines(&sample());
        assert_eq!(
            lines,
            vec![
                "pkg/a.go:12:1: exported function Serve should have comment or be unexported",
                "pkg/b.go:3: should not use dot imports",
            ]
        );
    }

    #[test]
    fn test_compose_lint_json_shape() {
        let out = compose_lint_json(&sample());
        assert_eq!(out["summary"]["suggestions"], 2);
        assert_eq!(out["summary"]["errors"], 1);
        assert_eq!(out["findings"][0]["position"]["line"], 12);
        assert_eq!(out["findings"][0]["category"], "comments");
        assert!(out["findings"][1].get("category").is_none());
        // Diagnostics go to stderr, not into the document.
        assert!(out.get("diagnostics").is_none());
    }
}
