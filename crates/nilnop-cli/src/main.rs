use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use nilnop_core::config::{self, Config, CONFIG_FILE_NAME};
use nilnop_core::orchestrator::{self, AnalysisOutput};
use nilnop_core::targets::TargetSpec;
use nilnop_diagnostics::diagnostic::{Severity, SeverityCounts};
use tracing_subscriber::EnvFilter;

/// Build a long version string: "0.1.0 (abc12345)"
fn long_version() -> &'static str {
    concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")")
}

#[derive(Parser)]
#[command(name = "nilnop")]
#[command(about = "Reports nil passed to functions that do nothing for nil")]
#[command(version, long_version = long_version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a JSON IR file for nil arguments to target functions
    Check {
        /// IR file produced by the Go front-end
        ir: PathBuf,
        /// Config file (default: nilnop.toml found by walking up from the current directory)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Extra target as <pkg_path>:<FuncName>:<arg_pos>; repeatable
        #[arg(long = "target", value_name = "SPEC")]
        targets: Vec<TargetSpec>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
        /// Severity threshold: info, warning, error, critical
        #[arg(long)]
        severity: Option<Severity>,
        /// Max diagnostics to report (0 = unlimited)
        #[arg(long)]
        max_diagnostics: Option<usize>,
        /// Do not report tautological or impossible nil comparisons
        #[arg(long)]
        no_conditions: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        /// Worker threads (0 = one per core)
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Explain a rule in detail
    Explain {
        /// Rule code (e.g., NNP001)
        rule: String,
    },
    /// Write a default nilnop.toml in the current directory
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Log to stderr so stdout stays clean for machine output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match cli.command {
        Commands::Check {
            ir,
            config,
            targets,
            format,
            severity,
            max_diagnostics,
            no_conditions,
            no_color,
            jobs,
        } => run_check(CheckArgs {
            ir,
            config_path: config,
            targets,
            format,
            severity_override: severity,
            max_diagnostics,
            no_conditions,
            no_color,
            jobs,
        }),
        Commands::Explain { rule } => run_explain(&rule),
        Commands::Init => run_init(),
    }
}

struct CheckArgs {
    ir: PathBuf,
    config_path: Option<PathBuf>,
    targets: Vec<TargetSpec>,
    format: Format,
    severity_override: Option<Severity>,
    max_diagnostics: Option<usize>,
    no_conditions: bool,
    no_color: bool,
    jobs: Option<usize>,
}

fn run_check(args: CheckArgs) -> ExitCode {
    let output = match check(&args) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    match args.format {
        Format::Json => match nilnop_diagnostics::format_json(&output.diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(2);
            }
        },
        Format::Human => {
            let text =
                nilnop_diagnostics::human::format_human(&output.diagnostics, !args.no_color);
            print!("{text}");
        }
    }
    if output.summary.truncated > 0 {
        eprintln!(
            "note: {} more diagnostic(s) not shown (max_diagnostics)",
            output.summary.truncated
        );
    }

    // Exit code: 0 clean, 1 issues found
    let counts = SeverityCounts::from_diagnostics(&output.diagnostics);
    if counts.has_issues_above(Severity::Error) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn check(args: &CheckArgs) -> anyhow::Result<AnalysisOutput> {
    let mut config = load_config(args.config_path.as_deref())?;

    if let Some(sev) = args.severity_override {
        config.nilnop.severity_threshold = sev;
    }
    if let Some(max) = args.max_diagnostics {
        config.nilnop.max_diagnostics = max;
    }
    if args.no_conditions {
        config.nilnop.report_conditions = false;
    }
    if let Some(jobs) = args.jobs {
        config.nilnop.jobs = jobs;
    }

    let program = nilnop_ir::load_json_file(&args.ir)
        .with_context(|| format!("cannot load IR from {}", args.ir.display()))?;
    let output = orchestrator::analyze_program_with_targets(&program, &config, &args.targets)?;
    Ok(output)
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let config = match explicit {
        Some(path) => config::load_config_file(path)?,
        None => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            config::load_config(&cwd)?
        }
    };
    Ok(config)
}

fn run_explain(rule: &str) -> ExitCode {
    match nilnop_diagnostics::rules::explain(rule) {
        Some(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        None => {
            let known: Vec<&str> = nilnop_diagnostics::rules::get_all_rules()
                .iter()
                .map(|r| r.code)
                .collect();
            eprintln!("Unknown rule: {rule}. Known rules: {}", known.join(", "));
            ExitCode::from(2)
        }
    }
}

fn run_init() -> ExitCode {
    if Path::new(CONFIG_FILE_NAME).exists() {
        eprintln!("{CONFIG_FILE_NAME} already exists");
        return ExitCode::from(2);
    }

    match std::fs::write(CONFIG_FILE_NAME, config::DEFAULT_CONFIG_TOML) {
        Ok(()) => {
            println!("Created {CONFIG_FILE_NAME}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
