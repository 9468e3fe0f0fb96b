//! Supporting helpers: colored prefixes for stderr diagnostics.

use owo_colors::OwoColorize;

fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if color_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn warning_prefix() -> String {
    if color_enabled() {
        "warning:".yellow().bold().to_string()
    } else {
        "warning:".to_string()
    }
}
