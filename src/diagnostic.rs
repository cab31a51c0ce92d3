//! Diagnostic values produced by rules and the dispatcher.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User-facing severity of a rule.
///
/// Ordered so that `Off < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Off,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    /// Numeric form accepted in config files (`0`, `1`, `2`).
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Severity::Off),
            1 => Some(Severity::Warn),
            2 => Some(Severity::Error),
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != Severity::Off
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(Severity::Off),
            "warn" | "warning" | "1" => Ok(Severity::Warn),
            "error" | "2" => Ok(Severity::Error),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// Position of a finding. Lines and columns are 1-based; line 0 means the
/// diagnostic concerns the whole unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub end_column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, end_column: usize) -> Self {
        Self {
            line,
            column,
            end_column: end_column.max(column),
        }
    }

    /// A single-column location.
    pub fn at(line: usize, column: usize) -> Self {
        Self::new(line, column, column)
    }

    /// Location for diagnostics that are not tied to a position.
    pub fn unit() -> Self {
        Self::default()
    }

    pub fn is_unit_level(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What a rule reports. Rules never choose a severity; the dispatcher
/// stamps the configured one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub location: Location,
    pub message: String,
}

impl Finding {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

/// Origin of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Reported by the rule itself.
    Finding,
    /// The rule faulted while inspecting the unit.
    InternalError,
    /// The rule produced more findings than the per-rule cap.
    Truncated,
    /// The effective configuration references something unusable.
    ConfigError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub location: Location,
    pub message: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn from_finding(rule: &str, severity: Severity, finding: Finding) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            location: finding.location,
            message: finding.message,
            kind: DiagnosticKind::Finding,
        }
    }

    pub fn internal_error(rule: &str, message: impl fmt::Display) -> Self {
        Self {
            rule: rule.to_string(),
            severity: Severity::Error,
            location: Location::unit(),
            message: format!("rule '{rule}' failed: {message}"),
            kind: DiagnosticKind::InternalError,
        }
    }

    pub fn truncated(rule: &str, severity: Severity, kept: usize, dropped: usize) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            location: Location::unit(),
            message: format!("{dropped} more finding(s) suppressed after the first {kept}"),
            kind: DiagnosticKind::Truncated,
        }
    }

    pub fn config_error(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: Severity::Error,
            location: Location::unit(),
            message: message.into(),
            kind: DiagnosticKind::ConfigError,
        }
    }
}
