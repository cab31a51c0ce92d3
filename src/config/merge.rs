//! Configuration merging logic
//!
//! Fragments are applied from least to most specific. Within a matching
//! section:
//! - Severity: replaced
//! - Parameters: replaced wholesale when the setting carries options,
//!   kept when it only names a severity
//! - Mergeable list parameters: accumulated, de-duplicated by value

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::effective::{EffectiveConfig, RuleConfig};
use super::fragment::{ConfigFragment, ParamValue, RuleOptions, RuleSetting};
use super::selector::Selector;
use super::ConfigError;
use crate::rules::{ParamSpec, Params, RuleCatalog};
use crate::Severity;

/// Fragments validated against a rule catalog, ready for resolution.
#[derive(Debug, Clone, Default)]
pub struct CompiledFragments {
    layers: Vec<CompiledLayer>,
}

#[derive(Debug, Clone)]
struct CompiledLayer {
    origin: String,
    sections: Vec<CompiledSection>,
}

#[derive(Debug, Clone)]
struct CompiledSection {
    selector: Selector,
    rules: BTreeMap<String, CompiledSetting>,
}

#[derive(Debug, Clone)]
struct CompiledSetting {
    severity: Severity,
    /// Parameters bound by name; `None` keeps earlier parameters.
    params: Option<Params>,
    known: bool,
}

impl CompiledFragments {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Validate every fragment against the catalog.
///
/// Unknown rule names are kept and surface later as diagnostics; anything
/// wrong with a known rule's parameters is a fatal error.
pub fn compile(
    fragments: &[ConfigFragment],
    catalog: &RuleCatalog,
) -> Result<CompiledFragments, ConfigError> {
    let mut layers = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        let mut sections = Vec::with_capacity(fragment.sections.len());
        for section in &fragment.sections {
            let mut rules = BTreeMap::new();
            for (name, setting) in &section.rules {
                let compiled = compile_setting(name, setting, catalog)
                    .map_err(|e| e.in_file(&fragment.origin))?;
                rules.insert(name.clone(), compiled);
            }
            sections.push(CompiledSection {
                selector: section.selector.clone(),
                rules,
            });
        }
        layers.push(CompiledLayer {
            origin: fragment.origin.clone(),
            sections,
        });
    }

    Ok(CompiledFragments { layers })
}

fn compile_setting(
    name: &str,
    setting: &RuleSetting,
    catalog: &RuleCatalog,
) -> Result<CompiledSetting, ConfigError> {
    let Some(specs) = catalog.params(name) else {
        return Ok(CompiledSetting {
            severity: setting.severity,
            params: None,
            known: false,
        });
    };

    let params = match &setting.options {
        None => None,
        Some(RuleOptions::Positional(values)) => {
            if values.len() > specs.len() {
                return Err(ConfigError::TooManyParams {
                    rule: name.to_string(),
                    accepted: specs.len(),
                    given: values.len(),
                });
            }
            let mut bound = Params::new();
            for (spec, value) in specs.iter().zip(values) {
                check_param(name, spec, value)?;
                bound.insert(spec.name.to_string(), value.clone());
            }
            Some(bound)
        }
        Some(RuleOptions::Named(values)) => {
            let mut bound = Params::new();
            for (param, value) in values {
                let spec = specs.iter().find(|s| s.name == param).ok_or_else(|| {
                    ConfigError::UnknownParam {
                        rule: name.to_string(),
                        param: param.clone(),
                    }
                })?;
                check_param(name, spec, value)?;
                bound.insert(param.clone(), value.clone());
            }
            Some(bound)
        }
    };

    Ok(CompiledSetting {
        severity: setting.severity,
        params,
        known: true,
    })
}

fn check_param(rule: &str, spec: &ParamSpec, value: &ParamValue) -> Result<(), ConfigError> {
    if spec.mergeable && value.as_list().is_none() {
        return Err(ConfigError::MergeableType {
            rule: rule.to_string(),
            param: spec.name.to_string(),
            found: value.type_name(),
        });
    }
    if !spec.kind.accepts(value) {
        return Err(ConfigError::ParamType {
            rule: rule.to_string(),
            param: spec.name.to_string(),
            expected: spec.kind.name(),
            found: value.type_name(),
        });
    }
    Ok(())
}

/// Compute the effective configuration for one normalized path.
///
/// Pure: the result depends only on `fragments`, `catalog` and `path`.
pub fn resolve(fragments: &CompiledFragments, catalog: &RuleCatalog, path: &str) -> EffectiveConfig {
    let mut rules: BTreeMap<String, RuleConfig> = catalog
        .iter()
        .map(|(name, specs)| {
            (
                name.to_string(),
                RuleConfig {
                    severity: Severity::Off,
                    params: default_params(specs),
                },
            )
        })
        .collect();
    let mut unknown = BTreeSet::new();

    for layer in &fragments.layers {
        for section in &layer.sections {
            if !section.selector.matches(path) {
                continue;
            }
            trace!(path, origin = %layer.origin, patterns = ?section.selector.patterns(), "section matched");

            for (name, setting) in &section.rules {
                if !setting.known {
                    unknown.insert(name.clone());
                    continue;
                }
                let (Some(entry), Some(specs)) = (rules.get_mut(name), catalog.params(name)) else {
                    continue;
                };
                entry.severity = setting.severity;
                if let Some(params) = &setting.params {
                    entry.params = overlay_params(&entry.params, params, specs);
                }
            }
        }
    }

    EffectiveConfig::new(path, rules, unknown.into_iter().collect())
}

fn default_params(specs: &[ParamSpec]) -> Params {
    specs
        .iter()
        .map(|spec| (spec.name.to_string(), spec.default.clone()))
        .collect()
}

fn overlay_params(current: &Params, incoming: &Params, specs: &[ParamSpec]) -> Params {
    specs
        .iter()
        .map(|spec| {
            let value = if spec.mergeable {
                let mut items: Vec<ParamValue> = current
                    .get(spec.name)
                    .and_then(ParamValue::as_list)
                    .map(<[ParamValue]>::to_vec)
                    .unwrap_or_default();
                if let Some(extra) = incoming.get(spec.name).and_then(ParamValue::as_list) {
                    for item in extra {
                        if !items.contains(item) {
                            items.push(item.clone());
                        }
                    }
                }
                ParamValue::List(items)
            } else {
                incoming
                    .get(spec.name)
                    .cloned()
                    .unwrap_or_else(|| spec.default.clone())
            };
            (spec.name.to_string(), value)
        })
        .collect()
}
