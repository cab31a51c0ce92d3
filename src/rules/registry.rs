//! Explicit rule registration.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ParamSpec, Rule};
use crate::config::ConfigError;
use crate::unit::{SourceUnit, Unit};

/// Declared parameter shapes of every registered rule, keyed by name.
///
/// This is all the merge engine needs to know about rules, so config
/// resolution stays independent of the unit type.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: BTreeMap<String, Vec<ParamSpec>>,
}

impl RuleCatalog {
    pub fn insert(&mut self, name: &str, params: Vec<ParamSpec>) {
        self.rules.insert(name.to_string(), params);
    }

    pub fn params(&self, name: &str) -> Option<&[ParamSpec]> {
        self.rules.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ParamSpec])> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Mapping from rule name to implementation, populated once at startup
/// and read-only afterwards.
pub struct RuleRegistry<U: Unit + ?Sized = SourceUnit> {
    rules: BTreeMap<&'static str, Arc<dyn Rule<U>>>,
    catalog: RuleCatalog,
}

impl<U: Unit + ?Sized> Default for RuleRegistry<U> {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            catalog: RuleCatalog::default(),
        }
    }
}

impl<U: Unit + ?Sized> RuleRegistry<U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single entry point for adding rules. Names must be unique and
    /// mergeable parameters must be lists.
    pub fn register(&mut self, rule: impl Rule<U> + 'static) -> Result<(), ConfigError> {
        self.register_arc(Arc::new(rule))
    }

    pub fn register_arc(&mut self, rule: Arc<dyn Rule<U>>) -> Result<(), ConfigError> {
        let name = rule.name();
        if self.rules.contains_key(name) {
            return Err(ConfigError::DuplicateRule(name.to_string()));
        }

        let params = rule.params();
        for spec in &params {
            if !spec.kind.accepts(&spec.default) || (spec.mergeable && spec.default.as_list().is_none()) {
                return Err(ConfigError::ParamType {
                    rule: name.to_string(),
                    param: spec.name.to_string(),
                    expected: spec.kind.name(),
                    found: spec.default.type_name(),
                });
            }
        }

        self.catalog.insert(name, params);
        self.rules.insert(name, rule);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Rule<U>>> {
        self.rules.get(name)
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule<U>>> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamValue;
    use crate::rules::{ParamKind, RuleContext, RuleFault};
    use crate::Finding;

    struct Named(&'static str, Vec<ParamSpec>);

    impl Rule for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn params(&self) -> Vec<ParamSpec> {
            self.1.clone()
        }

        fn inspect(&self, _: &SourceUnit, _: &RuleContext<'_>) -> Result<Vec<Finding>, RuleFault> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry: RuleRegistry = RuleRegistry::new();
        registry.register(Named("semi", vec![])).unwrap();
        registry
            .register(Named("indent", vec![ParamSpec::new("size", ParamKind::Int, 4)]))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("semi").is_some());
        assert!(registry.get("quotes").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["indent", "semi"]);
        assert_eq!(registry.catalog().params("indent").unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry: RuleRegistry = RuleRegistry::new();
        registry.register(Named("semi", vec![])).unwrap();
        let err = registry.register(Named("semi", vec![])).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRule(name) if name == "semi"));
    }

    #[test]
    fn test_default_must_match_kind() {
        let mut registry: RuleRegistry = RuleRegistry::new();
        let bad = ParamSpec {
            name: "max",
            kind: ParamKind::Int,
            mergeable: false,
            default: ParamValue::Str("80".into()),
        };
        let err = registry.register(Named("max-len", vec![bad])).unwrap_err();
        assert!(matches!(err, ConfigError::ParamType { .. }));
        assert!(registry.is_empty());
    }
}
