//! OpenSASE Forms CLI
//!
//! Command-line front end for the forms engine.
//!
//! # Usage
//!
//! ```bash
//! opensase-forms validate --schema signup.json --values answers.json
//! opensase-forms render --schema signup.json --values answers.json --touched
//! opensase-forms submit --schema signup.json --values answers.json --store submissions.json
//! opensase-forms submissions --store submissions.json --format json
//! opensase-forms stats
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "opensase-forms")]
#[command(author = "OpenSASE")]
#[command(version)]
#[command(about = "OpenSASE Forms Command Line Interface", long_about = None)]
struct Cli {
    /// Output format (defaults to the config file, then table)
    #[arg(long, short, global = true)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short, global = true, env = "OPENSASE_FORMS_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate values against a schema
    Validate {
        /// Form schema JSON
        #[arg(long)]
        schema: PathBuf,
        /// Values JSON object keyed by field name
        #[arg(long)]
        values: PathBuf,
    },
    /// Describe the controls a schema renders to
    Render {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        values: Option<PathBuf>,
        /// Treat every field as touched so errors are shown
        #[arg(long)]
        touched: bool,
    },
    /// Validate and store a submission
    Submit {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        values: PathBuf,
        /// Submissions file (JSON array)
        #[arg(long, env = "OPENSASE_FORMS_STORE")]
        store: Option<PathBuf>,
    },
    /// List stored submissions with resolved labels
    Submissions {
        #[arg(long, env = "OPENSASE_FORMS_STORE")]
        store: Option<PathBuf>,
        /// Current schema, used when a record lacks label metadata
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Per-form submission statistics
    Stats {
        #[arg(long, env = "OPENSASE_FORMS_STORE")]
        store: Option<PathBuf>,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the active configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    let config = match config::Config::load(profile) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let format = cli.format.or(config.default_format).unwrap_or_default();

    let result = match cli.command {
        Commands::Validate { schema, values } => {
            commands::validate::handle(&schema, &values, format)
        }
        Commands::Render { schema, values, touched } => {
            commands::render::handle(&schema, values.as_deref(), touched, format).map(|()| true)
        }
        Commands::Submit { schema, values, store } => {
            let store = config.store_path(store);
            commands::submit::handle(&schema, &values, &store, format).await
        }
        Commands::Submissions { store, schema } => {
            let store = config.store_path(store);
            commands::submissions::handle(&store, schema.as_deref(), &config.display, format)
                .map(|()| true)
        }
        Commands::Stats { store } => {
            let store = config.store_path(store);
            commands::stats::handle(&store, format).map(|()| true)
        }
        Commands::Config { action } => {
            commands::config::handle(action, &config, profile, format).map(|()| true)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
