//! Effective (fully merged) configuration and its per-path cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use super::fragment::ConfigFragment;
use super::merge::{compile, resolve, CompiledFragments};
use super::ConfigError;
use crate::rules::{Params, RuleCatalog};
use crate::Severity;

/// A rule's merged severity and parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleConfig {
    pub severity: Severity,
    pub params: Params,
}

/// Merged configuration for one unit path. Every registered rule has an
/// entry; derived only, never edited after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    path: String,
    rules: BTreeMap<String, RuleConfig>,
    unknown_rules: Vec<String>,
}

impl EffectiveConfig {
    pub(crate) fn new(
        path: &str,
        rules: BTreeMap<String, RuleConfig>,
        unknown_rules: Vec<String>,
    ) -> Self {
        Self {
            path: path.to_string(),
            rules,
            unknown_rules,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn rules(&self) -> &BTreeMap<String, RuleConfig> {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&RuleConfig> {
        self.rules.get(name)
    }

    /// Severity of `name`; `Off` for rules that are not registered.
    pub fn severity(&self, name: &str) -> Severity {
        self.rules.get(name).map_or(Severity::Off, |r| r.severity)
    }

    /// Rules that will be dispatched, in name order.
    pub fn enabled(&self) -> impl Iterator<Item = (&str, &RuleConfig)> {
        self.rules
            .iter()
            .filter(|(_, r)| r.severity.is_enabled())
            .map(|(name, r)| (name.as_str(), r))
    }

    /// Rule names referenced by matching sections but not registered.
    pub fn unknown_rules(&self) -> &[String] {
        &self.unknown_rules
    }
}

/// Compiled fragments plus a concurrent cache of resolved configs.
///
/// Resolution is pure, so two workers racing on the same path compute
/// identical values and either may win the insert.
#[derive(Debug)]
pub struct Resolver {
    catalog: RuleCatalog,
    fragments: CompiledFragments,
    cache: DashMap<String, Arc<EffectiveConfig>>,
}

impl Resolver {
    pub fn new(fragments: &[ConfigFragment], catalog: RuleCatalog) -> Result<Self, ConfigError> {
        let compiled = compile(fragments, &catalog)?;
        debug!(
            layers = compiled.len(),
            rules = catalog.len(),
            "compiled configuration"
        );
        Ok(Self {
            catalog,
            fragments: compiled,
            cache: DashMap::new(),
        })
    }

    pub fn resolve(&self, path: &str) -> Arc<EffectiveConfig> {
        if let Some(hit) = self.cache.get(path) {
            return Arc::clone(hit.value());
        }
        let config = Arc::new(resolve(&self.fragments, &self.catalog, path));
        self.cache
            .entry(path.to_string())
            .or_insert_with(|| Arc::clone(&config));
        config
    }

    /// Resolve without touching the cache.
    pub fn resolve_uncached(&self, path: &str) -> EffectiveConfig {
        resolve(&self.fragments, &self.catalog, path)
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn cached_paths(&self) -> usize {
        self.cache.len()
    }
}
