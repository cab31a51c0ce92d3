//! .editorconfig sections as the least specific config layer

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::file::find_file_upward;
use super::fragment::{ConfigFragment, RuleSetting, Section};
use super::selector::{rebase_pattern, Selector};
use crate::Severity;

/// Sections of an .editorconfig file, in file order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EditorConfig {
    pub root: bool,
    pub sections: Vec<EditorSection>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EditorSection {
    pub pattern: String,
    /// Keys and values, lowercased
    pub properties: BTreeMap<String, String>,
}

/// Find .editorconfig by searching upward from the given directory.
pub fn find_editorconfig(start_dir: &Path) -> Option<PathBuf> {
    find_file_upward(start_dir, ".editorconfig")
}

/// Parse .editorconfig file into its sections.
pub fn parse_editorconfig(path: &Path) -> io::Result<EditorConfig> {
    let content = fs::read_to_string(path)?;
    Ok(parse_editorconfig_str(&content))
}

fn parse_editorconfig_str(content: &str) -> EditorConfig {
    let mut config = EditorConfig::default();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        // Section header
        if line.starts_with('[') && line.ends_with(']') {
            config.sections.push(EditorSection {
                pattern: line[1..line.len() - 1].trim().to_string(),
                properties: BTreeMap::new(),
            });
            continue;
        }

        // Parse key = value
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_lowercase();
            let value = value.trim().to_lowercase();

            match config.sections.last_mut() {
                Some(section) => {
                    section.properties.insert(key, value);
                }
                None if key == "root" => config.root = value == "true",
                None => {}
            }
        }
    }

    config
}

/// Translate an editorconfig section header into a selector pattern.
///
/// Headers without a `/` match file names at any depth.
fn section_pattern(header: &str) -> String {
    if let Some(anchored) = header.strip_prefix('/') {
        anchored.to_string()
    } else if header.contains('/') {
        header.to_string()
    } else if header == "*" {
        "**".to_string()
    } else {
        format!("**/{header}")
    }
}

/// Map editorconfig properties onto rule settings, all at `warn`.
fn section_rules(properties: &BTreeMap<String, String>) -> BTreeMap<String, RuleSetting> {
    let mut rules = BTreeMap::new();

    let mut indent: Option<RuleSetting> = None;
    if let Some(style @ ("tab" | "space")) = properties.get("indent_style").map(String::as_str) {
        indent = Some(RuleSetting::new(Severity::Warn).with_param("style", style));
    }
    if let Some(size) = properties.get("indent_size").and_then(|s| s.parse::<i64>().ok()) {
        let setting = indent.unwrap_or_else(|| RuleSetting::new(Severity::Warn));
        indent = Some(setting.with_param("size", size));
    }
    if let Some(setting) = indent {
        rules.insert("indent".to_string(), setting);
    }

    match properties.get("max_line_length").map(String::as_str) {
        Some("off") => {
            rules.insert("max-len".to_string(), RuleSetting::new(Severity::Off));
        }
        Some(value) => {
            if let Ok(max) = value.parse::<i64>() {
                rules.insert(
                    "max-len".to_string(),
                    RuleSetting::new(Severity::Warn).with_param("max", max),
                );
            }
        }
        None => {}
    }

    for (key, rule) in [
        ("trim_trailing_whitespace", "no-trailing-spaces"),
        ("insert_final_newline", "eol-last"),
    ] {
        match properties.get(key).map(String::as_str) {
            Some("true") => {
                rules.insert(rule.to_string(), RuleSetting::new(Severity::Warn));
            }
            Some("false") => {
                rules.insert(rule.to_string(), RuleSetting::new(Severity::Off));
            }
            _ => {}
        }
    }

    rules
}

/// Build a fragment from an .editorconfig located in `dir` (normalized,
/// relative to the project root).
///
/// Sections whose header cannot be expressed as a selector are skipped
/// with a warning; an editor setting never stops a lint run.
pub fn editorconfig_fragment(origin: &str, dir: &str, config: &EditorConfig) -> ConfigFragment {
    let mut fragment = ConfigFragment::new(origin);

    for section in &config.sections {
        let rules = section_rules(&section.properties);
        if rules.is_empty() {
            continue;
        }
        let pattern = rebase_pattern(dir, &section_pattern(&section.pattern));
        match Selector::new([pattern]) {
            Ok(selector) => fragment.sections.push(Section { selector, rules }),
            Err(e) => warn!(%origin, section = %section.pattern, "skipping editorconfig section: {e}"),
        }
    }

    fragment
}
