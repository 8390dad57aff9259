//! # ter CLI
//!
//! Command-line interface for the ter static wiki generator.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (optional)
    #[arg(long, default_value = "ter.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the page graph and write pages.json
    Build {
        /// Content directory (overrides input_dir)
        input: Option<PathBuf>,

        /// Output directory (overrides output_dir)
        output: Option<PathBuf>,
    },

    /// Report internal links that point at no page
    Verify {
        /// Content directory (overrides input_dir)
        input: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List tags with their page counts
    Tags {
        /// Content directory (overrides input_dir)
        input: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays clean
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build { input, output } => {
            commands::build_site(&cli.config, input.as_deref(), output.as_deref())
        }
        Commands::Verify { input, json } => {
            commands::verify_site(&cli.config, input.as_deref(), json)
        }
        Commands::Tags { input, json } => commands::list_tags(&cli.config, input.as_deref(), json),
    }
}
