use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::aggregate::Summary;
use crate::colors::Colors;
use crate::rules::RuleRegistry;
use crate::session::{RunReport, UnitReport};
use crate::{Diagnostic, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Grouped by file, one line per diagnostic
    #[default]
    Text,
    /// One JSON document on stdout
    Json,
}

pub struct OutputContext {
    pub format: OutputFormat,
    /// Report errors only
    pub quiet: bool,
    pub colors: Colors,
    pub verbose: bool,
    pub show_progress: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, quiet: bool, use_colors: bool, verbose: bool, show_progress: bool) -> Self {
        Self {
            format,
            quiet,
            colors: Colors::new(use_colors),
            verbose,
            show_progress,
        }
    }

    fn shows(&self, diagnostic: &Diagnostic) -> bool {
        !self.quiet || diagnostic.severity == Severity::Error
    }
}

/// Outcome of a whole run, handed to the exit-code policy.
#[derive(Debug, Default)]
pub struct RunResult {
    pub report: RunReport,
    pub files_skipped: usize,
}

impl RunResult {
    pub fn summary(&self) -> Summary {
        self.report.summary
    }

    /// Errors, or more warnings than `max_warnings` allows.
    pub fn fails(&self, max_warnings: Option<usize>) -> bool {
        let summary = self.summary();
        summary.has_blocking_error() || max_warnings.is_some_and(|max| summary.warnings > max)
    }
}

pub fn print_result(result: &RunResult, ctx: &OutputContext) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match ctx.format {
        OutputFormat::Text => write_text(&mut out, result, ctx),
        OutputFormat::Json => write_json(&mut out, result, ctx),
    }
}

pub fn write_text(out: &mut impl Write, result: &RunResult, ctx: &OutputContext) -> io::Result<()> {
    let c = &ctx.colors;

    for unit in result.report.with_diagnostics() {
        let shown: Vec<&Diagnostic> = unit.diagnostics.iter().filter(|d| ctx.shows(d)).collect();
        if shown.is_empty() {
            continue;
        }

        writeln!(out, "{}{}{}", c.underline, unit.path, c.reset())?;
        for d in shown {
            let location = if d.location.is_unit_level() {
                "-".to_string()
            } else {
                d.location.to_string()
            };
            writeln!(
                out,
                "  {}{:>7}{}  {}{:<5}{}  {}  {}{}{}",
                c.dim,
                location,
                c.reset(),
                c.severity(d.severity),
                d.severity.as_str(),
                c.reset(),
                d.message,
                c.dim,
                d.rule,
                c.reset()
            )?;
        }
        writeln!(out)?;
    }

    write_summary(out, result, ctx)
}

fn write_summary(out: &mut impl Write, result: &RunResult, ctx: &OutputContext) -> io::Result<()> {
    let c = &ctx.colors;
    let summary = result.summary();
    let warnings = if ctx.quiet { 0 } else { summary.warnings };
    let problems = summary.errors + warnings;

    if problems == 0 {
        if ctx.verbose {
            writeln!(
                out,
                "{}No problems found{} ({} file(s) checked)",
                c.success,
                c.reset(),
                result.report.units.len()
            )?;
        }
    } else {
        let color = if summary.errors > 0 { c.error } else { c.warning };
        writeln!(
            out,
            "{}{} problem(s) ({} error(s), {} warning(s)){}",
            color,
            problems,
            summary.errors,
            warnings,
            c.reset()
        )?;
    }

    if result.report.cancelled {
        writeln!(out, "{}Run cancelled before all files were linted{}", c.warning, c.reset())?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonUnit<'a> {
    path: &'a str,
    diagnostics: Vec<&'a Diagnostic>,
    errors: usize,
    warnings: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: Vec<JsonUnit<'a>>,
    summary: Summary,
    files_skipped: usize,
    cancelled: bool,
}

pub fn write_json(out: &mut impl Write, result: &RunResult, ctx: &OutputContext) -> io::Result<()> {
    let files = result
        .report
        .units
        .iter()
        .map(|unit: &UnitReport| JsonUnit {
            path: &unit.path,
            diagnostics: unit.diagnostics.iter().filter(|d| ctx.shows(d)).collect(),
            errors: unit.summary.errors,
            warnings: unit.summary.warnings,
        })
        .collect();
    let report = JsonReport {
        files,
        summary: result.summary(),
        files_skipped: result.files_skipped,
        cancelled: result.report.cancelled,
    };

    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}

/// `--list-rules`: one rule per line with its parameters and defaults.
pub fn write_rule_list(out: &mut impl Write, registry: &RuleRegistry, colors: &Colors) -> io::Result<()> {
    for rule in registry.iter() {
        writeln!(out, "{}{}{}  {}", colors.success, rule.name(), colors.reset(), rule.description())?;
        for spec in rule.params() {
            let merge = if spec.mergeable { ", mergeable" } else { "" };
            writeln!(
                out,
                "    {}{} ({}{}) = {}{}",
                colors.dim,
                spec.name,
                spec.kind.name(),
                merge,
                spec.default,
                colors.reset()
            )?;
        }
    }
    Ok(())
}

/// Verbose-only note on stderr; stdout stays machine readable.
pub fn print_skipped(path: &Path, reason: &str, ctx: &OutputContext) {
    if !ctx.verbose || ctx.quiet {
        return;
    }
    eprintln!(
        "{}Skipping {}: {}{}",
        ctx.colors.dim,
        reason,
        path.display(),
        ctx.colors.reset()
    );
}
