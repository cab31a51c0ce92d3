use std::io::{self, IsTerminal};

use crate::Severity;

const RESET: &str = "\x1b[0m";

#[derive(Clone, Copy)]
pub struct Colors {
    pub error: &'static str,
    pub warning: &'static str,
    pub success: &'static str,
    pub dim: &'static str,
    pub underline: &'static str,
    enabled: bool,
}

impl Colors {
    pub fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                error: "\x1b[31m",   // Red
                warning: "\x1b[33m", // Yellow
                success: "\x1b[32m", // Green
                dim: "\x1b[2m",
                underline: "\x1b[4m",
                enabled: true,
            }
        } else {
            Self {
                error: "",
                warning: "",
                success: "",
                dim: "",
                underline: "",
                enabled: false,
            }
        }
    }

    pub fn severity(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::Error => self.error,
            Severity::Warn => self.warning,
            Severity::Off => "",
        }
    }

    pub fn reset(&self) -> &'static str {
        if self.enabled {
            RESET
        } else {
            ""
        }
    }
}

pub fn should_use_colors(force_color: bool, no_color: bool) -> bool {
    // Priority: --no-color > --color > NO_COLOR env > TTY detection
    if no_color {
        return false;
    }
    if force_color {
        return true;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_colors_are_empty() {
        let colors = Colors::new(false);
        assert_eq!(colors.severity(Severity::Error), "");
        assert_eq!(colors.reset(), "");
    }

    #[test]
    fn test_severity_colors() {
        let colors = Colors::new(true);
        assert_eq!(colors.severity(Severity::Error), colors.error);
        assert_eq!(colors.severity(Severity::Warn), colors.warning);
        assert_eq!(colors.reset(), RESET);
    }

    #[test]
    fn test_flag_priority() {
        assert!(!should_use_colors(true, true));
        assert!(should_use_colors(true, false));
    }
}
