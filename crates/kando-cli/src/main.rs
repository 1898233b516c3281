//! Kando - dotted-path access to JSON namespaces from the command line.
//!
//! `local` and `session` are JSON files under the data directory, so values
//! persist between invocations.

use anyhow::Context;
use clap::{Parser, Subcommand};
use kando::{Kando, KandoConfig, MediumKind};
use kando_storage::{FileMedium, Medium};
use kando_util::LogLevel;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "kando")]
#[command(author, version, about = "Read and write JSON values by dotted path", long_about = None)]
struct Cli {
    /// Directory holding local.json and session.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to ~/.config/kando/kando.json if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a type path, e.g. `local.user.profile`
    Get { type_path: String },

    /// Store a value (JSON, or a plain string if it is not valid JSON)
    Set {
        type_path: String,
        value: String,

        /// Expire after this many seconds (session paths only)
        #[arg(short, long)]
        expires: Option<u64>,
    },

    /// Delete the value at a type path
    Delete { type_path: String },

    /// List the raw keys stored in a medium
    Keys { medium: String },

    /// Evict expired session values now
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = KandoConfig::load(cli.config.as_deref()).context("failed to load config")?;
    init_logging(cli.verbose, config.log_level);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => kando_util::path::data_dir().context("cannot determine data directory")?,
    };
    tracing::debug!(data_dir = %data_dir.display(), "Opening mediums");

    let kando = open(&data_dir, config);
    run(&kando, cli.command, &mut std::io::stdout())
}

fn init_logging(verbose: bool, configured: Option<LogLevel>) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        configured.unwrap_or_default()
    };
    kando_util::log::init(level);
}

/// Build an adapter over the file mediums in `data_dir`.
fn open(data_dir: &Path, config: KandoConfig) -> Kando {
    Kando::builder()
        .local(Arc::new(FileMedium::new(data_dir.join("local.json"))))
        .session(Arc::new(FileMedium::new(data_dir.join("session.json"))))
        .config(config)
        .build()
}

/// Parse a command-line value as JSON, keeping bare words as strings.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn run(kando: &Kando, command: Commands, out: &mut impl std::io::Write) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Get { type_path } => match kando.get(&type_path)? {
            Some(value) => {
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
                Ok(ExitCode::SUCCESS)
            }
            None => Ok(ExitCode::FAILURE),
        },
        Commands::Set {
            type_path,
            value,
            expires,
        } => {
            kando.apply(&type_path, Some(parse_value(&value)), expires)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Delete { type_path } => {
            kando.delete(&type_path)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Keys { medium } => {
            let medium = kando.medium(&MediumKind::parse(&medium));
            for key in medium.keys()? {
                writeln!(out, "{key}")?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sweep => {
            let report = kando.sweep_now()?;
            writeln!(
                out,
                "evicted {} live {} malformed {}",
                report.evicted, report.live, report.malformed
            )?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
