//! Configuration layers and their resolution.
//!
//! This module provides:
//! - Fragments: ordered (selector, options-map) layers
//! - The merge engine turning fragments into one effective config per path
//! - Loading `lintel.toml` and `.editorconfig` into fragments
//! - Config file discovery (search upward from current directory)
//! - Template generation with `--init`

mod editorconfig;
mod effective;
mod file;
mod fragment;
mod init;
mod merge;
mod selector;
mod toml_schema;

pub use editorconfig::{editorconfig_fragment, find_editorconfig, parse_editorconfig, EditorConfig};
pub use effective::{EffectiveConfig, Resolver, RuleConfig};
pub use file::{
    find_config_file, find_file_upward, fragment_from_toml, load_config, load_project,
    nested_config_files, parse_rule_setting, ProjectConfig, CONFIG_FILE_NAME,
};
pub use fragment::{
    cli_fragment, parse_rule_override, ConfigFragment, ParamValue, RuleOptions, RuleSetting,
    Section,
};
pub use init::{generate_init_file, generate_init_file_in, LINTEL_TOML_TEMPLATE};
pub use merge::{compile, resolve, CompiledFragments};
pub use selector::{rebase_pattern, Selector, MATCH_ALL};
pub use toml_schema::{LintelToml, OverrideSection, SettingsSection};

use std::io;

/// Errors detected while loading or compiling configuration.
///
/// All of these are fatal: the engine refuses to start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid selector pattern '{pattern}': {source}")]
    Selector {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("selector must contain at least one pattern")]
    EmptySelector,

    #[error("rule '{rule}': {message}")]
    InvalidSetting { rule: String, message: String },

    #[error("rule '{rule}' has no parameter named '{param}'")]
    UnknownParam { rule: String, param: String },

    #[error("rule '{rule}' accepts {accepted} positional parameter(s), got {given}")]
    TooManyParams {
        rule: String,
        accepted: usize,
        given: usize,
    },

    #[error("rule '{rule}' parameter '{param}' expects {expected}, got {found}")]
    ParamType {
        rule: String,
        param: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("rule '{rule}' parameter '{param}' is mergeable and needs a list, got {found}")]
    MergeableType {
        rule: String,
        param: String,
        found: &'static str,
    },

    #[error("rule '{0}' is registered more than once")]
    DuplicateRule(String),

    #[error("{origin}: {source}")]
    InFile {
        origin: String,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Attach the fragment origin to an error.
    pub fn in_file(self, origin: &str) -> Self {
        match self {
            already @ ConfigError::InFile { .. } => already,
            other => ConfigError::InFile {
                origin: origin.to_string(),
                source: Box::new(other),
            },
        }
    }
}
