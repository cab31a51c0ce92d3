//! Ordering, de-duplication and counting of diagnostics.

use std::ops::AddAssign;

use serde::Serialize;

use crate::{Diagnostic, DiagnosticKind, Severity};

/// Counts over a set of diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    /// Internal and configuration errors
    pub fatal: usize,
}

impl Summary {
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self::default();
        for d in diagnostics {
            match d.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warn => summary.warnings += 1,
                Severity::Off => {}
            }
            if matches!(d.kind, DiagnosticKind::InternalError | DiagnosticKind::ConfigError) {
                summary.fatal += 1;
            }
        }
        summary
    }

    pub fn has_blocking_error(&self) -> bool {
        self.errors > 0
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, rhs: Self) {
        self.errors += rhs.errors;
        self.warnings += rhs.warnings;
        self.fatal += rhs.fatal;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub diagnostics: Vec<Diagnostic>,
    pub summary: Summary,
}

/// Merge diagnostic lists into one ordered, duplicate-free list.
///
/// The result does not depend on the order of `lists` or of the items
/// within them.
pub fn aggregate<I>(lists: I) -> Aggregate
where
    I: IntoIterator<Item = Vec<Diagnostic>>,
{
    let mut diagnostics: Vec<Diagnostic> = lists.into_iter().flatten().collect();

    diagnostics.sort_by(|a, b| {
        (a.location.line, a.location.column, &a.rule, a.location.end_column, &a.message, a.severity, a.kind).cmp(&(
            b.location.line,
            b.location.column,
            &b.rule,
            b.location.end_column,
            &b.message,
            b.severity,
            b.kind,
        ))
    });
    // Equal (rule, location, message) are adjacent after sorting
    diagnostics.dedup_by(|b, a| a.rule == b.rule && a.location == b.location && a.message == b.message);

    let summary = Summary::of(&diagnostics);
    Aggregate {
        diagnostics,
        summary,
    }
}
