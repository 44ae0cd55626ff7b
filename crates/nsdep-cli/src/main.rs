//! nsdep CLI tool.
//!
//! Usage:
//! ```bash
//! nsdep check --facts <FILE> [OPTIONS] [PATH]
//! nsdep init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;
mod facts;

/// Namespace dependency checker
#[derive(Parser)]
#[command(name = "nsdep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to policy file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check dependency facts against the policy
    Check {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// JSON file of type dependency facts
        #[arg(long)]
        facts: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Exclude glob patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Source file extensions to analyze
        #[arg(long = "extension", default_value = "cs")]
        extensions: Vec<String>,

        /// Referenced assembly paths passed to the fact source
        #[arg(long = "reference")]
        references: Vec<PathBuf>,
    },

    /// Initialize policy file
    Init {
        /// Overwrite existing policy
        #[arg(long)]
        force: bool,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-issue compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Check {
            path,
            facts,
            format,
            exclude,
            extensions,
            references,
        } => {
            let source = config_resolver::ConfigSource::resolve(&path, cli.config.as_deref());
            let options = commands::check::CheckOptions {
                facts,
                exclude,
                extensions,
                references,
            };
            if commands::check::run(&path, format, &options, &source)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
