//! golint core library.
//!
//! This crate exposes the front end of a Go style linter: it turns command
//! line targets into compilation units, hands each unit's sources to an
//! analysis engine, and filters the findings by confidence.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `target`: Argument classification into a single-kind `TargetPlan`.
//! - `expand`: `...` pattern expansion over directory trees.
//! - `resolver`: Go package resolution (build constraints, import paths).
//! - `reader`: Loading unit sources.
//! - `analyzer`: The analysis engine seam and its process-backed implementation.
//! - `lint`: Orchestration, confidence filtering and the run summary.
//! - `rules`: Rule category switches.
//! - `models`: Findings, diagnostics and lint output structs.
//! - `output`: Human/JSON printers.
//! - `logging`: Tracing subscriber setup.
//! - `utils`: Supporting helpers.
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod expand;
pub mod lint;
pub mod logging;
pub mod models;
pub mod output;
pub mod reader;
pub mod resolver;
pub mod rules;
pub mod target;
pub mod utils;
