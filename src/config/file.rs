//! Config file discovery and loading

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, info};

use super::fragment::{ConfigFragment, ParamValue, RuleOptions, RuleSetting, Section};
use super::selector::{rebase_pattern, Selector, MATCH_ALL};
use super::toml_schema::{LintelToml, SettingsSection};
use super::ConfigError;
use crate::unit::normalize_path;
use crate::Severity;

pub const CONFIG_FILE_NAME: &str = "lintel.toml";

/// Search upward from `start_dir` for a file with the given name.
///
/// Returns `None` if the file is not found.
pub fn find_file_upward(start_dir: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Find the project's lintel.toml by searching upward from the given directory.
///
/// Inside a git repository (directory containing `.git`) the outermost
/// `lintel.toml` below the repository root wins, so that configs in
/// subdirectories become per-directory layers of that project rather than
/// separate projects. Outside a repository the nearest file wins.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut nearest = None;
    let mut outermost = None;
    let mut current = start_dir.to_path_buf();

    loop {
        let file_path = current.join(CONFIG_FILE_NAME);
        if file_path.is_file() {
            if nearest.is_none() {
                nearest = Some(file_path.clone());
            }
            outermost = Some(file_path);
        }
        if current.join(".git").exists() {
            return outermost;
        }
        if !current.pop() {
            return nearest;
        }
    }
}

/// Load and parse lintel.toml from the given path.
pub fn load_config(path: &Path) -> Result<LintelToml, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: LintelToml = toml::from_str(&content)?;
    Ok(config)
}

/// `lintel.toml` files strictly below `root`, shallowest first.
///
/// Respects `.gitignore` so vendored trees do not contribute layers.
pub fn nested_config_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.depth() > 1 && entry.file_name() == CONFIG_FILE_NAME)
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort_by(|a, b| {
        a.components()
            .count()
            .cmp(&b.components().count())
            .then_with(|| a.cmp(b))
    });
    files
}

/// Everything loaded from the file system for one project.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Directory unit paths are made relative to.
    pub root: PathBuf,
    /// Layers from the project config and nested configs, least specific first.
    pub fragments: Vec<ConfigFragment>,
    /// Settings of the project config.
    pub settings: SettingsSection,
    /// Files the fragments were read from.
    pub files: Vec<PathBuf>,
}

/// Load the project configuration.
///
/// With `explicit`, only that file is used and its directory is the root.
/// Otherwise the project config is discovered upward from `start_dir` and
/// every nested `lintel.toml` below the root adds a layer scoped to its
/// directory.
pub fn load_project(start_dir: &Path, explicit: Option<&Path>) -> Result<ProjectConfig, ConfigError> {
    if let Some(path) = explicit {
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| start_dir.to_path_buf(), Path::to_path_buf);
        let config = load_config(path).map_err(|e| e.in_file(&path.display().to_string()))?;
        let fragment = fragment_from_toml(&path.display().to_string(), "", &config)?;
        info!(path = %path.display(), "using config");
        return Ok(ProjectConfig {
            root,
            fragments: vec![fragment],
            settings: config.settings,
            files: vec![path.to_path_buf()],
        });
    }

    let Some(project_file) = find_config_file(start_dir) else {
        debug!(dir = %start_dir.display(), "no {CONFIG_FILE_NAME} found");
        return Ok(ProjectConfig {
            root: start_dir.to_path_buf(),
            fragments: Vec::new(),
            settings: SettingsSection::default(),
            files: Vec::new(),
        });
    };

    let root = project_file
        .parent()
        .map_or_else(|| start_dir.to_path_buf(), Path::to_path_buf);
    let project = load_config(&project_file)
        .map_err(|e| e.in_file(&project_file.display().to_string()))?;
    info!(path = %project_file.display(), "using config");

    let mut fragments = vec![fragment_from_toml(
        &project_file.display().to_string(),
        "",
        &project,
    )?];
    let mut files = vec![project_file.clone()];

    for nested in nested_config_files(&root) {
        let origin = nested.display().to_string();
        let config = load_config(&nested).map_err(|e| e.in_file(&origin))?;
        let dir = nested
            .parent()
            .map(|d| normalize_path(&root, d))
            .unwrap_or_default();
        info!(path = %origin, scope = %dir, "using nested config");
        fragments.push(fragment_from_toml(&origin, &dir, &config)?);
        files.push(nested);
    }

    Ok(ProjectConfig {
        root,
        fragments,
        settings: project.settings,
        files,
    })
}

/// Convert a parsed lintel.toml into a fragment whose selectors are scoped
/// to `dir` (normalized, relative to the project root; empty for the root).
pub fn fragment_from_toml(
    origin: &str,
    dir: &str,
    config: &LintelToml,
) -> Result<ConfigFragment, ConfigError> {
    let mut fragment = ConfigFragment::new(origin);

    if !config.rules.is_empty() {
        let selector = Selector::new([rebase_pattern(dir, MATCH_ALL)]).map_err(|e| e.in_file(origin))?;
        fragment.sections.push(Section {
            selector,
            rules: parse_rules(&config.rules).map_err(|e| e.in_file(origin))?,
        });
    }

    for over in &config.overrides {
        let selector = Selector::new(over.files.iter().map(|p| rebase_pattern(dir, p)))
            .map_err(|e| e.in_file(origin))?;
        fragment.sections.push(Section {
            selector,
            rules: parse_rules(&over.rules).map_err(|e| e.in_file(origin))?,
        });
    }

    Ok(fragment)
}

fn parse_rules(
    rules: &BTreeMap<String, toml::Value>,
) -> Result<BTreeMap<String, RuleSetting>, ConfigError> {
    rules
        .iter()
        .map(|(name, value)| Ok((name.clone(), parse_rule_setting(name, value)?)))
        .collect()
}

/// Accepted forms:
/// - `"warn"` or `1`
/// - `["error", 4, "tab"]` (positional) or `["error", { size = 4 }]` (named)
/// - `{ level = "warn", max = 100 }`
pub fn parse_rule_setting(rule: &str, value: &toml::Value) -> Result<RuleSetting, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidSetting {
        rule: rule.to_string(),
        message,
    };

    match value {
        toml::Value::String(_) | toml::Value::Integer(_) => {
            Ok(RuleSetting::new(parse_severity(value).map_err(invalid)?))
        }
        toml::Value::Array(items) => {
            let (first, rest) = items
                .split_first()
                .ok_or_else(|| invalid("empty setting, expected a severity first".into()))?;
            let severity = parse_severity(first).map_err(invalid)?;

            if let [toml::Value::Table(table)] = rest {
                let named = table
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), param_value(v).map_err(invalid)?)))
                    .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;
                return Ok(RuleSetting {
                    severity,
                    options: Some(RuleOptions::Named(named)),
                });
            }
            if rest.is_empty() {
                return Ok(RuleSetting::new(severity));
            }
            let values = rest
                .iter()
                .map(|v| param_value(v).map_err(invalid))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RuleSetting::positional(severity, values))
        }
        toml::Value::Table(table) => {
            let level = table
                .get("level")
                .ok_or_else(|| invalid("table setting needs a 'level' key".into()))?;
            let severity = parse_severity(level).map_err(invalid)?;
            let named = table
                .iter()
                .filter(|(k, _)| k.as_str() != "level")
                .map(|(k, v)| Ok((k.clone(), param_value(v).map_err(invalid)?)))
                .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;
            let options = (!named.is_empty()).then_some(RuleOptions::Named(named));
            Ok(RuleSetting { severity, options })
        }
        other => Err(invalid(format!(
            "expected a severity, array or table, got {}",
            other.type_str()
        ))),
    }
}

fn parse_severity(value: &toml::Value) -> Result<Severity, String> {
    match value {
        toml::Value::String(s) => s.parse(),
        toml::Value::Integer(i) => {
            Severity::from_level(*i).ok_or_else(|| format!("unknown severity level {i}"))
        }
        other => Err(format!("expected a severity, got {}", other.type_str())),
    }
}

fn param_value(value: &toml::Value) -> Result<ParamValue, String> {
    match value {
        toml::Value::Boolean(b) => Ok(ParamValue::Bool(*b)),
        toml::Value::Integer(i) => Ok(ParamValue::Int(*i)),
        toml::Value::String(s) => Ok(ParamValue::Str(s.clone())),
        toml::Value::Array(items) => items
            .iter()
            .map(param_value)
            .collect::<Result<Vec<_>, _>>()
            .map(ParamValue::List),
        other => Err(format!("unsupported parameter type {}", other.type_str())),
    }
}
