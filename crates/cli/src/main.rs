mod commands;
mod config;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Pluto procedure language toolchain.
#[derive(Parser)]
#[command(name = "pluto", version, about = "Pluto procedure language toolchain")]
struct Cli {
    /// Output format (text or json); overrides the config file
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log parser activity to stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Path to a pluto.toml (default: ./pluto.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a .pluto file and print its AST as JSON
    Parse {
        /// Path to the .pluto source file
        file: PathBuf,
    },

    /// Check a .pluto file for lexical and syntax errors
    Check {
        /// Path to the .pluto source file
        file: PathBuf,
        /// Keep going after syntax errors and report all of them
        #[arg(long)]
        recover: bool,
        /// Maximum number of diagnostics collected with --recover (at least 1)
        #[arg(long)]
        max_errors: Option<NonZeroUsize>,
    },

    /// Print a .pluto file in canonical form
    Fmt {
        /// Path to the .pluto source file
        file: PathBuf,
        /// Exit 1 instead of printing when the file is not canonical
        #[arg(long)]
        check: bool,
    },

    /// Print the token stream with highlight categories
    Tokens {
        /// Path to the .pluto source file
        file: PathBuf,
    },

    /// List the recognised unit spellings by quantity kind
    Units,
}

fn main() {
    let cli = Cli::parse();

    let config = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, cli.output.unwrap_or(OutputFormat::Text), cli.quiet);
            process::exit(1);
        }
    };
    init_tracing(cli.verbose, config.output.log_level.as_deref());

    let output = cli
        .output
        .or(config.output.format)
        .unwrap_or(OutputFormat::Text);
    let quiet = cli.quiet;

    match cli.command {
        Commands::Parse { file } => commands::cmd_parse(&file, output, quiet),
        Commands::Check {
            file,
            recover,
            max_errors,
        } => {
            let recover = recover || config.parse.recover;
            let max_errors = max_errors.unwrap_or(config.parse.max_errors).get();
            commands::cmd_check(&file, recover, max_errors, output, quiet);
        }
        Commands::Fmt { file, check } => commands::cmd_fmt(&file, check, output, quiet),
        Commands::Tokens { file } => commands::cmd_tokens(&file, output, quiet),
        Commands::Units => commands::cmd_units(output),
    }
}

/// Logs go to stderr so stdout stays machine-readable. `--verbose` wins,
/// then `RUST_LOG`, then the config file, then `warn`.
fn init_tracing(verbose: bool, configured: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warn")))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
