//! A lint session: compiled configuration plus registry, applied to units.

use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{aggregate, Aggregate, Summary};
use crate::config::{ConfigError, ConfigFragment, EffectiveConfig, Resolver};
use crate::dispatch::{dispatch, Limits};
use crate::rules::RuleRegistry;
use crate::unit::{SourceUnit, Unit};
use crate::Diagnostic;

/// Shared flag checked before each unit starts.
///
/// Units already running finish; no new ones begin once cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub path: String,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Reports sorted by path
    pub units: Vec<UnitReport>,
    pub summary: Summary,
    pub cancelled: bool,
}

impl RunReport {
    /// Units with at least one diagnostic.
    pub fn with_diagnostics(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|u| !u.diagnostics.is_empty())
    }
}

pub struct Linter<U: Unit + ?Sized = SourceUnit> {
    registry: Arc<RuleRegistry<U>>,
    resolver: Resolver,
    limits: Limits,
}

impl<U: Unit + ?Sized> Linter<U> {
    /// Compile `fragments` against the registry's rules.
    pub fn new(
        registry: Arc<RuleRegistry<U>>,
        fragments: &[ConfigFragment],
        limits: Limits,
    ) -> Result<Self, ConfigError> {
        let resolver = Resolver::new(fragments, registry.catalog().clone())?;
        Ok(Self {
            registry,
            resolver,
            limits,
        })
    }

    pub fn registry(&self) -> &RuleRegistry<U> {
        &self.registry
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn effective_config(&self, path: &str) -> Arc<EffectiveConfig> {
        self.resolver.resolve(path)
    }

    pub fn lint_unit(&self, unit: &U) -> UnitReport {
        let config = self.resolver.resolve(unit.path());
        let Aggregate { diagnostics, summary } =
            aggregate([dispatch(&config, unit, &self.registry, self.limits)]);
        debug!(
            path = unit.path(),
            errors = summary.errors,
            warnings = summary.warnings,
            "linted unit"
        );
        UnitReport {
            path: unit.path().to_string(),
            diagnostics,
            summary,
        }
    }

    /// Lint units in parallel.
    pub fn lint_units<T>(&self, units: &[T], cancel: &CancelToken) -> RunReport
    where
        T: Borrow<U> + Sync,
    {
        self.lint_units_with(units, cancel, |_| {})
    }

    /// Like [`Linter::lint_units`], calling `on_done` from the worker
    /// thread as each unit finishes.
    pub fn lint_units_with<T, F>(&self, units: &[T], cancel: &CancelToken, on_done: F) -> RunReport
    where
        T: Borrow<U> + Sync,
        F: Fn(&UnitReport) + Sync,
    {
        let mut reports: Vec<UnitReport> = units
            .par_iter()
            .filter_map(|unit| {
                if cancel.is_cancelled() {
                    return None;
                }
                let report = self.lint_unit(unit.borrow());
                on_done(&report);
                Some(report)
            })
            .collect();
        reports.sort_by(|a, b| a.path.cmp(&b.path));

        let mut summary = Summary::default();
        for report in &reports {
            summary += report.summary;
        }

        RunReport {
            units: reports,
            summary,
            cancelled: cancel.is_cancelled(),
        }
    }
}
