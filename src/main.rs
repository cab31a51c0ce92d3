use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use lintel::{
    builtin, generate_init_file, print_result, run, should_use_colors, write_rule_list, Colors,
    LintelError, OutputContext, OutputFormat, Project, RunOptions,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Lint errors or too many warnings
const EXIT_LINT: u8 = 1;
/// Configuration or I/O error
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "lintel")]
#[command(version, about = "A layered-configuration rule engine for source files")]
struct Cli {
    /// Target files or directories
    #[arg(default_value = ".")]
    paths: Vec<String>,

    /// Specify config file path (overrides auto-discovery)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override a rule, e.g. `max-len=warn:120` (repeatable)
    #[arg(long = "rule", value_name = "NAME=SETTING")]
    rules: Vec<String>,

    /// Only lint files with this extension (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Report errors only
    #[arg(short, long)]
    quiet: bool,

    /// Exit with 1 when there are more warnings than this
    #[arg(long, value_name = "N")]
    max_warnings: Option<usize>,

    /// Print the effective configuration for a file as JSON
    #[arg(long, value_name = "PATH")]
    print_config: Option<PathBuf>,

    /// List available rules and their parameters
    #[arg(long)]
    list_rules: bool,

    /// Generate a template lintel.toml configuration file
    #[arg(long)]
    init: bool,

    /// Force colored output
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.init {
        return handle_init();
    }

    let use_colors = should_use_colors(cli.color, cli.no_color);

    if cli.list_rules {
        return handle_list_rules(&Colors::new(use_colors));
    }

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => return fatal(&LintelError::Io(e)),
    };

    let options = RunOptions {
        config: cli.config.clone(),
        rules: cli.rules.clone(),
        extensions: cli.extensions.clone(),
    };
    let project = match Project::load(&cwd, &options) {
        Ok(project) => project,
        Err(e) => return fatal(&e),
    };

    if let Some(path) = &cli.print_config {
        return handle_print_config(&project, &cwd, path);
    }

    let ctx = OutputContext::new(
        cli.format,
        cli.quiet,
        use_colors && cli.format == OutputFormat::Text,
        cli.verbose > 0,
        !cli.no_progress && cli.format == OutputFormat::Text,
    );

    let result = match run(&cli.paths, &project, &cwd, &ctx) {
        Ok(result) => result,
        Err(e) => return fatal(&e),
    };
    if let Err(e) = print_result(&result, &ctx) {
        return fatal(&LintelError::Io(e));
    }

    if result.fails(cli.max_warnings) {
        ExitCode::from(EXIT_LINT)
    } else {
        ExitCode::SUCCESS
    }
}

/// Logs go to stderr so stdout stays clean for reports. `RUST_LOG`
/// takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "lintel=warn",
        1 => "lintel=info",
        2 => "lintel=debug",
        _ => "lintel=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}

fn fatal(error: &LintelError) -> ExitCode {
    eprintln!("Error: {error}");
    ExitCode::from(EXIT_FATAL)
}

fn handle_init() -> ExitCode {
    match generate_init_file() {
        Ok(path) => {
            println!("Created {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fatal(&LintelError::Io(e)),
    }
}

fn handle_list_rules(colors: &Colors) -> ExitCode {
    let registry = match builtin::registry() {
        Ok(registry) => registry,
        Err(e) => return fatal(&LintelError::Config(e)),
    };
    let stdout = io::stdout();
    match write_rule_list(&mut stdout.lock(), &registry, colors) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fatal(&LintelError::Io(e)),
    }
}

fn handle_print_config(project: &Project, cwd: &Path, path: &Path) -> ExitCode {
    let config = project.linter.effective_config(&project.unit_path(cwd, path));
    match serde_json::to_string_pretty(&*config) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => fatal(&LintelError::Io(e.into())),
    }
}
