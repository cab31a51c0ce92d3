//! Running the enabled rules of an effective config against one unit.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::config::EffectiveConfig;
use crate::rules::{RuleContext, RuleFault, RuleRegistry};
use crate::unit::Unit;
use crate::{Diagnostic, Finding, Severity};

/// Findings kept per rule and unit when no setting says otherwise.
pub const DEFAULT_MAX_PER_RULE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_per_rule: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_per_rule: DEFAULT_MAX_PER_RULE,
        }
    }
}

impl Limits {
    pub fn with_max_per_rule(max_per_rule: Option<usize>) -> Self {
        max_per_rule.map_or_else(Self::default, |max_per_rule| Self { max_per_rule })
    }
}

/// Invoke every rule that `config` enables on `unit`.
///
/// A rule that returns a fault or panics yields one internal-error
/// diagnostic and the remaining rules still run. Output is unordered.
pub fn dispatch<U: Unit + ?Sized>(
    config: &EffectiveConfig,
    unit: &U,
    registry: &RuleRegistry<U>,
    limits: Limits,
) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = config
        .unknown_rules()
        .iter()
        .map(|name| Diagnostic::config_error(name, format!("Definition for rule '{name}' was not found")))
        .collect();

    for (name, rule_config) in config.enabled() {
        let Some(rule) = registry.get(name) else {
            diagnostics.push(Diagnostic::config_error(
                name,
                format!("Definition for rule '{name}' was not found"),
            ));
            continue;
        };

        let ctx = RuleContext::new(&rule_config.params);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.inspect(unit, &ctx)))
            .unwrap_or_else(|payload| Err(RuleFault::new(panic_message(payload.as_ref()))));

        match outcome {
            Ok(findings) => {
                debug!(rule = name, path = unit.path(), count = findings.len(), "rule finished");
                push_capped(&mut diagnostics, name, rule_config.severity, findings, limits);
            }
            Err(fault) => {
                warn!(rule = name, path = unit.path(), "rule failed: {fault}");
                diagnostics.push(Diagnostic::internal_error(name, &fault));
            }
        }
    }

    diagnostics
}

fn push_capped(
    out: &mut Vec<Diagnostic>,
    rule: &str,
    severity: Severity,
    findings: Vec<Finding>,
    limits: Limits,
) {
    let total = findings.len();
    out.extend(
        findings
            .into_iter()
            .take(limits.max_per_rule)
            .map(|f| Diagnostic::from_finding(rule, severity, f)),
    );
    if total > limits.max_per_rule {
        out.push(Diagnostic::truncated(
            rule,
            severity,
            limits.max_per_rule,
            total - limits.max_per_rule,
        ));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
