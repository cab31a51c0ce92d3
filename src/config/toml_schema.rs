//! TOML schema definitions for lintel.toml

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root structure for lintel.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LintelToml {
    /// Engine and walker settings
    #[serde(default)]
    pub settings: SettingsSection,

    /// Rules applying to every file (`**`)
    #[serde(default)]
    pub rules: BTreeMap<String, toml::Value>,

    /// `[[overrides]]` sections, applied in order after `[rules]`
    #[serde(default)]
    pub overrides: Vec<OverrideSection>,
}

/// `[settings]` section in lintel.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingsSection {
    /// Findings kept per rule and file before truncating (default: 100)
    pub max_diagnostics_per_rule: Option<usize>,

    /// File extensions to lint (default: all files)
    pub extensions: Option<Vec<String>>,
}

/// One `[[overrides]]` entry
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OverrideSection {
    /// Glob patterns selecting the files this section applies to
    pub files: Vec<String>,

    #[serde(default)]
    pub rules: BTreeMap<String, toml::Value>,
}
