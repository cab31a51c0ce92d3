//! Rule abstraction and the built-in rule set.
//!
//! A rule is a named inspection routine. It declares the shape of the
//! parameters it accepts, receives its merged parameters through a
//! [`RuleContext`], and reports [`Finding`]s without any severity.

pub mod builtin;
mod registry;

pub use registry::{RuleCatalog, RuleRegistry};

use std::collections::BTreeMap;

use crate::config::ParamValue;
use crate::unit::{SourceUnit, Unit};
use crate::Finding;

/// Error raised by a rule while inspecting a unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RuleFault {
    pub message: String,
}

impl RuleFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Int,
    Str,
    List,
}

impl ParamKind {
    pub fn accepts(&self, value: &ParamValue) -> bool {
        matches!(
            (self, value),
            (ParamKind::Bool, ParamValue::Bool(_))
                | (ParamKind::Int, ParamValue::Int(_))
                | (ParamKind::Str, ParamValue::Str(_))
                | (ParamKind::List, ParamValue::List(_))
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Bool => "boolean",
            ParamKind::Int => "integer",
            ParamKind::Str => "string",
            ParamKind::List => "list",
        }
    }
}

/// Declared parameter of a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    /// List parameters that accumulate across config layers instead of
    /// being replaced.
    pub mergeable: bool,
    pub default: ParamValue,
}

impl ParamSpec {
    pub fn new(name: &'static str, kind: ParamKind, default: impl Into<ParamValue>) -> Self {
        Self {
            name,
            kind,
            mergeable: false,
            default: default.into(),
        }
    }

    /// A list parameter whose items accumulate across layers.
    pub fn mergeable(name: &'static str, default: Vec<ParamValue>) -> Self {
        Self {
            name,
            kind: ParamKind::List,
            mergeable: true,
            default: ParamValue::List(default),
        }
    }
}

/// Merged parameters handed to a rule.
pub type Params = BTreeMap<String, ParamValue>;

/// What a rule sees besides the unit itself.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    params: &'a Params,
}

impl<'a> RuleContext<'a> {
    pub fn new(params: &'a Params) -> Self {
        Self { params }
    }

    pub fn param(&self, name: &str) -> Option<&'a ParamValue> {
        self.params.get(name)
    }

    /// Integer parameter, faulting when it is missing or negative.
    pub fn usize_param(&self, name: &str) -> Result<usize, RuleFault> {
        self.param(name)
            .and_then(ParamValue::as_int)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| RuleFault::new(format!("parameter '{name}' must be a non-negative integer")))
    }

    pub fn bool_param(&self, name: &str) -> Result<bool, RuleFault> {
        self.param(name)
            .and_then(ParamValue::as_bool)
            .ok_or_else(|| RuleFault::new(format!("parameter '{name}' must be a boolean")))
    }

    pub fn str_param(&self, name: &str) -> Result<&'a str, RuleFault> {
        self.param(name)
            .and_then(ParamValue::as_str)
            .ok_or_else(|| RuleFault::new(format!("parameter '{name}' must be a string")))
    }

    /// List parameter whose items must all be strings.
    pub fn str_list_param(&self, name: &str) -> Result<Vec<&'a str>, RuleFault> {
        let items = self
            .param(name)
            .and_then(ParamValue::as_list)
            .ok_or_else(|| RuleFault::new(format!("parameter '{name}' must be a list")))?;
        items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    RuleFault::new(format!("parameter '{name}' must only contain strings"))
                })
            })
            .collect()
    }
}

/// A named, pluggable inspection routine over units of type `U`.
///
/// Implementations must be free of side effects on the unit and on each
/// other; the dispatcher runs them in unspecified order, possibly on
/// several threads at once.
pub trait Rule<U: Unit + ?Sized = SourceUnit>: Send + Sync {
    fn name(&self) -> &'static str;

    /// One-line description shown by `--list-rules`.
    fn description(&self) -> &'static str {
        ""
    }

    /// Declared parameters, in positional order.
    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    fn inspect(&self, unit: &U, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_kind_accepts() {
        assert!(ParamKind::Int.accepts(&ParamValue::Int(3)));
        assert!(!ParamKind::Int.accepts(&ParamValue::Str("3".into())));
        assert!(ParamKind::List.accepts(&ParamValue::List(vec![])));
    }

    #[test]
    fn test_context_typed_accessors() {
        let mut params = Params::new();
        params.insert("max".into(), ParamValue::Int(80));
        params.insert("flag".into(), ParamValue::Bool(true));
        params.insert("terms".into(), vec!["todo", "fixme"].into());
        let ctx = RuleContext::new(&params);

        assert_eq!(ctx.usize_param("max"), Ok(80));
        assert_eq!(ctx.bool_param("flag"), Ok(true));
        assert_eq!(ctx.str_list_param("terms"), Ok(vec!["todo", "fixme"]));
        assert!(ctx.str_param("missing").is_err());
    }

    #[test]
    fn test_negative_integer_is_fault() {
        let mut params = Params::new();
        params.insert("max".into(), ParamValue::Int(-1));
        let ctx = RuleContext::new(&params);
        assert!(ctx.usize_param("max").is_err());
    }
}
