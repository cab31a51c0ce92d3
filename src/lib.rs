pub mod aggregate;
pub mod colors;
pub mod config;
mod diagnostic;
pub mod dispatch;
mod output;
pub mod progress;
pub mod rules;
pub mod session;
pub mod unit;
pub mod walker;

pub use aggregate::{aggregate, Aggregate, Summary};
pub use colors::{should_use_colors, Colors};
pub use config::{
    cli_fragment, editorconfig_fragment, find_config_file, find_editorconfig, generate_init_file,
    load_config, load_project, parse_editorconfig, ConfigError, ConfigFragment, EffectiveConfig,
    LintelToml, ParamValue, RuleSetting, Section, Selector, LINTEL_TOML_TEMPLATE,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, Finding, Location, Severity};
pub use dispatch::{dispatch, Limits};
pub use output::{
    print_result, print_skipped, write_json, write_rule_list, write_text, OutputContext,
    OutputFormat, RunResult,
};
pub use progress::ProgressReporter;
pub use rules::{builtin, Rule, RuleContext, RuleFault, RuleRegistry};
pub use session::{CancelToken, Linter, RunReport, UnitReport};
pub use unit::{normalize_path, SourceUnit, Unit};
pub use walker::walk_paths;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

const BINARY_CHECK_SIZE: usize = 8192;

/// Errors that stop a run before any file is linted.
#[derive(Debug, thiserror::Error)]
pub enum LintelError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid --rule option: {0}")]
    RuleOption(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Command-line inputs that shape the configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Explicit config file (skips discovery)
    pub config: Option<PathBuf>,
    /// `name=setting` overrides, most specific layer
    pub rules: Vec<String>,
    /// Extensions to lint; replaces `settings.extensions` when non-empty
    pub extensions: Vec<String>,
}

/// A ready-to-run linter bound to a project root.
pub struct Project {
    pub root: PathBuf,
    pub linter: Linter,
    pub extensions: Vec<String>,
    /// Layer origins, least specific first
    pub origins: Vec<String>,
}

impl Project {
    /// Assemble every config layer seen from `cwd` and compile them.
    ///
    /// Layers, least specific first: `.editorconfig`, the project
    /// `lintel.toml`, nested `lintel.toml` files, then `--rule` options.
    pub fn load(cwd: &Path, options: &RunOptions) -> Result<Self, LintelError> {
        let project = load_project(cwd, options.config.as_deref())?;
        let root = absolute(cwd, &project.root);
        let registry = Arc::new(builtin::registry()?);

        let mut fragments = Vec::new();
        if let Some(path) = find_editorconfig(&root) {
            let dir = path
                .parent()
                .filter(|d| d.starts_with(&root))
                .map(|d| normalize_path(&root, d))
                .unwrap_or_default();
            let origin = path.display().to_string();
            let fragment = editorconfig_fragment(&origin, &dir, &parse_editorconfig(&path)?);
            if !fragment.is_empty() {
                info!(path = %origin, "using editorconfig");
                fragments.push(fragment);
            }
        }
        fragments.extend(project.fragments);
        if !options.rules.is_empty() {
            fragments.push(
                cli_fragment(&options.rules, registry.catalog()).map_err(LintelError::RuleOption)?,
            );
        }

        let origins = fragments.iter().map(|f| f.origin.clone()).collect();
        let limits = Limits::with_max_per_rule(project.settings.max_diagnostics_per_rule);
        let linter = Linter::new(registry, &fragments, limits)?;

        let extensions = if options.extensions.is_empty() {
            project.settings.extensions.unwrap_or_default()
        } else {
            options.extensions.clone()
        };

        Ok(Self {
            root,
            linter,
            extensions,
            origins,
        })
    }

    /// Path form that selectors match against.
    pub fn unit_path(&self, cwd: &Path, path: &Path) -> String {
        normalize_path(&self.root, &absolute(cwd, path))
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Check if content is binary by looking for null bytes in first 8192 bytes
pub fn is_binary(content: &[u8]) -> bool {
    let check_len = content.len().min(BINARY_CHECK_SIZE);
    content[..check_len].contains(&0)
}

/// Main entry point: lint all files in given paths
pub fn run(
    paths: &[String],
    project: &Project,
    cwd: &Path,
    ctx: &OutputContext,
) -> Result<RunResult, LintelError> {
    let mut files_skipped = 0;
    let mut units = Vec::new();

    for path in walk_paths(paths, &project.extensions) {
        let path = path?;
        match load_unit(&path, &project.unit_path(cwd, &path)) {
            Ok(Loaded::Unit(unit)) => units.push(unit),
            Ok(Loaded::Skipped(reason)) => {
                files_skipped += 1;
                debug!(path = %path.display(), reason, "skipped");
                print_skipped(&path, reason, ctx);
            }
            Err(e) => {
                files_skipped += 1;
                warn!(path = %path.display(), "failed to read: {e}");
            }
        }
    }

    let progress = ProgressReporter::new(units.len() as u64, ctx.show_progress);
    let report = project
        .linter
        .lint_units_with(&units, &CancelToken::new(), |unit| {
            progress.set_message(&unit.path);
            progress.inc();
        });
    progress.finish();

    debug!(
        files = report.units.len(),
        skipped = files_skipped,
        errors = report.summary.errors,
        warnings = report.summary.warnings,
        "run finished"
    );

    Ok(RunResult {
        report,
        files_skipped,
    })
}

enum Loaded {
    Unit(SourceUnit),
    Skipped(&'static str),
}

/// Read a file into a unit. Empty, binary and non-UTF-8 files are skipped.
fn load_unit(path: &Path, unit_path: &str) -> io::Result<Loaded> {
    let bytes = fs::read(path)?;

    if bytes.is_empty() {
        return Ok(Loaded::Skipped("empty"));
    }
    if is_binary(&bytes) {
        return Ok(Loaded::Skipped("binary"));
    }
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Loaded::Unit(SourceUnit::new(unit_path, text))),
        Err(_) => Ok(Loaded::Skipped("non-UTF-8")),
    }
}
