mod cmd;
mod output;
mod prompts;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{GlobalArgs, MethodArg, ScriptArg};
use output::{OutputFormat, print_error};

/// Keeps a project's symlinks in line with its symlink-config.json declarations
#[derive(Parser)]
#[command(name = "symconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Project root (default: discovered from the current directory)
  #[arg(long, global = true)]
  root: Option<PathBuf>,

  /// Never prompt; every question takes its configured default
  #[arg(long, global = true)]
  silent: bool,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Create and remove links so they match the declarations
  Apply {
    /// Apply directly or only generate scripts (asks when omitted)
    #[arg(short, long, value_enum)]
    method: Option<MethodArg>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Remove every declared link
  Clean {
    /// Clean directly or only generate scripts (asks when omitted)
    #[arg(short, long, value_enum)]
    method: Option<MethodArg>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Recompute every generated file
  Refresh {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show what apply would do, without changing anything
  Plan {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show project state and recent activity
  Status {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the project root, or pin it in the settings of the current directory
  Root {
    /// Directory to use as the project root
    path: Option<PathBuf>,
  },

  /// Overwrite the settings file with defaults
  ResetSettings {
    /// Skip confirmation prompt
    #[arg(long)]
    force: bool,
  },

  /// Run a generated script for this OS
  Run {
    #[arg(value_enum, default_value = "apply")]
    script: ScriptArg,

    /// Run with administrator rights (Windows)
    #[arg(long)]
    elevated: bool,
  },

  /// Watch the project and keep everything consistent until interrupted
  Watch,

  /// Declare a new link in a directory's symlink-config.json
  Link {
    /// Where the link goes, relative to the declaring directory or `@`-prefixed
    target: String,

    /// What it points to, relative to the declaring directory or `@`-prefixed
    source: String,

    /// Declaring directory (default: current directory)
    #[arg(long)]
    dir: Option<PathBuf>,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let global = GlobalArgs {
    root: cli.root,
    silent: cli.silent,
    verbose: cli.verbose,
  };

  match cli.command {
    Commands::Apply { method, output } => cmd::cmd_apply(&global, method, output),
    Commands::Clean { method, output } => cmd::cmd_clean(&global, method, output),
    Commands::Refresh { output } => cmd::cmd_refresh(&global, output),
    Commands::Plan { output } => cmd::cmd_plan(&global, output),
    Commands::Status { output } => cmd::cmd_status(&global, output),
    Commands::Root { path } => cmd::cmd_root(&global, path.as_deref()),
    Commands::ResetSettings { force } => cmd::cmd_reset_settings(&global, force),
    Commands::Run { script, elevated } => cmd::cmd_run(&global, script, elevated),
    Commands::Watch => cmd::cmd_watch(&global),
    Commands::Link { target, source, dir } => cmd::cmd_link(&global, target, source, dir.as_deref()),
  }
}
