//! Rule category switches forwarded to the analysis engine.
//!
//! Every category is an independent boolean, on by default. The same set of
//! names is exposed three ways: as `--lint-<name>` CLI flags, as keys of the
//! `[rules]` config table, and as the `rules` object sent to the engine.

use serde::{Deserialize, Serialize};

macro_rules! rule_categories {
    ($( $field:ident => $flag:literal, $alias:literal, $help:literal; )+) => {
        #[derive(Debug, Default, Clone, clap::Args, Deserialize)]
        /// Optional per-category overrides (CLI flags or `[rules]` table).
        pub struct RuleFlags {
            $(
                #[arg(
                    long = $flag,
                    alias = $alias,
                    value_name = "BOOL",
                    num_args = 0..=1,
                    require_equals = true,
                    default_missing_value = "true",
                    help = $help
                )]
                #[serde(default)]
                pub $field: Option<bool>,
            )+
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        /// Effective snapshot of enabled rule categories.
        pub struct RuleSet {
            $( pub $field: bool, )+
        }

        impl Default for RuleSet {
            fn default() -> Self {
                Self { $( $field: true, )+ }
            }
        }

        impl RuleSet {
            /// Category names in declaration order.
            pub const NAMES: &'static [&'static str] = &[$( stringify!($field), )+];

            /// Apply precedence: CLI > config > enabled.
            pub fn resolve(cli: &RuleFlags, cfg: &RuleFlags) -> Self {
                Self {
                    $( $field: cli.$field.or(cfg.$field).unwrap_or(true), )+
                }
            }

            /// Names of the categories switched off.
            pub fn disabled(&self) -> Vec<&'static str> {
                let mut out = Vec::new();
                $( if !self.$field { out.push(stringify!($field)); } )+
                out
            }
        }
    };
}

rule_categories! {
    exported => "lint-exported", "lint_exported", "Lint exported types";
    package_comments => "lint-package-comments", "lint_package_comments", "Lint package comments";
    imports => "lint-imports", "lint_imports", "Lint import statements";
    blank_imports => "lint-blank-imports", "lint_blank_imports", "Lint blank imports";
    names => "lint-names", "lint_names", "Lint names";
    var_decls => "lint-vardecls", "lint_vardecls", "Lint variable declarations";
    elses => "lint-elses", "lint_elses", "Lint else statements";
    ranges => "lint-ranges", "lint_ranges", "Lint range statements";
    errorf => "lint-errorf", "lint_errorf", "Lint errorf";
    errors => "lint-errors", "lint_errors", "Lint errors";
    error_strings => "lint-error-strings", "lint_error_strings", "Lint error strings";
    receiver_names => "lint-receiver-names", "lint_receiver_names", "Lint receiver names";
    inc_dec => "lint-inc-dec", "lint_inc_dec", "Lint variable increments and decrements";
    error_return => "lint-error-returns", "lint_error_returns", "Lint error returns";
    unexported_return => "lint-unexported-return", "lint_unexported_return", "Lint unexported returns";
    time_names => "lint-time-names", "lint_time_names", "Lint time names";
    context_key_types => "lint-context-key-types", "lint_context_key_types", "Lint context key types";
    context_args => "lint-context-args", "lint_context_args", "Lint context args";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let rs = RuleSet::default();
        assert!(rs.disabled().is_empty());
        assert_eq!(RuleSet::NAMES.len(), 18);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = RuleFlags {
            elses: Some(true),
            ..Default::default()
        };
        let cfg: RuleFlags = toml::from_str("elses = false\nnames = false\n").unwrap();
        let rs = RuleSet::resolve(&cli, &cfg);
        assert!(rs.elses);
        assert!(!rs.names);
        assert_eq!(rs.disabled(), vec!["names"]);
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let rs = RuleSet {
            ranges: false,
            ..Default::default()
        };
        let v = serde_json::to_value(rs).unwrap();
        assert_eq!(v["ranges"], false);
        assert_eq!(v["context_args"], true);
    }
}
