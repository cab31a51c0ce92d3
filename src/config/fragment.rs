//! Configuration fragments: the layers merged into an effective config.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::selector::{Selector, MATCH_ALL};
use crate::rules::{ParamKind, RuleCatalog};
use crate::Severity;

/// A rule parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "boolean",
            ParamValue::Int(_) => "integer",
            ParamValue::Str(_) => "string",
            ParamValue::List(_) => "list",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Str(s) => write!(f, "{s:?}"),
            ParamValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Options attached to a rule setting, as written by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOptions {
    /// Bound to the rule's declared parameters in order (`["error", 4]`).
    Positional(Vec<ParamValue>),
    /// Bound by parameter name (`{ level = "warn", max = 100 }`).
    Named(BTreeMap<String, ParamValue>),
}

/// One rule's entry in an options-map.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetting {
    pub severity: Severity,
    /// `None` keeps whatever parameters earlier layers established.
    pub options: Option<RuleOptions>,
}

impl RuleSetting {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            options: None,
        }
    }

    pub fn positional(severity: Severity, values: Vec<ParamValue>) -> Self {
        Self {
            severity,
            options: Some(RuleOptions::Positional(values)),
        }
    }

    /// Add a named parameter, switching the options to named form.
    pub fn with_param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        let mut named = match self.options.take() {
            Some(RuleOptions::Named(map)) => map,
            _ => BTreeMap::new(),
        };
        named.insert(name.to_string(), value.into());
        self.options = Some(RuleOptions::Named(named));
        self
    }
}

impl From<Severity> for RuleSetting {
    fn from(severity: Severity) -> Self {
        RuleSetting::new(severity)
    }
}

/// A (selector, options-map) pair.
#[derive(Debug, Clone)]
pub struct Section {
    pub selector: Selector,
    pub rules: BTreeMap<String, RuleSetting>,
}

impl Section {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            rules: BTreeMap::new(),
        }
    }

    pub fn rule(mut self, name: &str, setting: impl Into<RuleSetting>) -> Self {
        self.rules.insert(name.to_string(), setting.into());
        self
    }
}

/// One configuration layer: an ordered list of sections from one origin.
#[derive(Debug, Clone)]
pub struct ConfigFragment {
    /// Where the fragment came from, for log and error messages.
    pub origin: String,
    pub sections: Vec<Section>,
}

impl ConfigFragment {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Fragment with a single section applying to every unit.
    pub fn global(origin: impl Into<String>, rules: BTreeMap<String, RuleSetting>) -> Self {
        Self {
            origin: origin.into(),
            sections: vec![Section {
                selector: Selector::all(),
                rules,
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.rules.is_empty())
    }
}

/// Parse a command-line rule override such as `max-len=warn`,
/// `indent=error:2` or `no-warning-comments=warn:todo,hack`.
///
/// Values after `:` are positional and read against the rule's declared
/// parameter kinds: a list parameter takes comma-separated strings (`\,`
/// for a literal comma, empty items dropped), a string parameter takes the
/// raw text. Values of unknown rules or beyond the declared parameters are
/// inferred: a comma makes a list, integers and booleans are recognized,
/// anything else is a string.
pub fn parse_rule_override(
    spec: &str,
    catalog: &RuleCatalog,
) -> Result<(String, RuleSetting), String> {
    let (name, setting) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=SEVERITY, got '{spec}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing rule name in '{spec}'"));
    }

    let declared = catalog.params(name).unwrap_or_default();
    let mut parts = setting.split(':');
    let severity: Severity = parts.next().unwrap_or_default().parse()?;
    let values: Vec<ParamValue> = parts
        .enumerate()
        .map(|(i, raw)| parse_cli_value(raw, declared.get(i).map(|p| p.kind)))
        .collect();

    let setting = if values.is_empty() {
        RuleSetting::new(severity)
    } else {
        RuleSetting::positional(severity, values)
    };
    Ok((name.to_string(), setting))
}

fn parse_cli_value(raw: &str, kind: Option<ParamKind>) -> ParamValue {
    match kind {
        Some(ParamKind::List) => {
            ParamValue::List(split_list(raw).into_iter().map(ParamValue::Str).collect())
        }
        Some(ParamKind::Str) => ParamValue::Str(raw.to_string()),
        _ if raw.contains(',') => ParamValue::List(
            raw.split(',')
                .map(|s| parse_cli_value(s.trim(), None))
                .collect(),
        ),
        _ => infer_scalar(raw),
    }
}

fn infer_scalar(raw: &str) -> ParamValue {
    if let Ok(i) = raw.parse::<i64>() {
        return ParamValue::Int(i);
    }
    match raw {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => ParamValue::Str(raw.to_string()),
    }
}

/// Split on unescaped commas; `\,` stays a comma.
fn split_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(',') => current.push(','),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            ',' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// The `--rule` overrides as the most specific layer.
pub fn cli_fragment(overrides: &[String], catalog: &RuleCatalog) -> Result<ConfigFragment, String> {
    let mut rules = BTreeMap::new();
    for spec in overrides {
        let (name, setting) = parse_rule_override(spec, catalog)?;
        rules.insert(name, setting);
    }
    Ok(ConfigFragment::global(
        format!("command line ({MATCH_ALL})"),
        rules,
    ))
}
