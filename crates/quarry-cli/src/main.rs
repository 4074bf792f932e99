//! Quarry CLI - pull plain text out of TXT, PDF and EPUB files

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Quarry - extract plain text from documents
#[derive(Parser)]
#[command(name = "quarry")]
#[command(version)]
#[command(about = "Extract plain text from TXT, PDF and EPUB documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Extract the text of a document
    Extract {
        /// Document to read
        path: PathBuf,

        /// Override the media type detected from the extension (MIME or txt/pdf/epub)
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,

        /// Write the text to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a JSON object with the text and basic counts
        #[arg(long)]
        json: bool,
    },

    /// Show what would be extracted without doing it
    Inspect {
        /// Document to inspect
        path: PathBuf,

        /// Override the media type detected from the extension
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,

    /// Open the config file in $EDITOR
    Edit,
}

fn init_logging(verbose: bool) {
    let level = quarry_config::Config::load()
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".to_string());

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quarry=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("quarry={},warn", level)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Edit => commands::config::edit(),
        },
        Commands::Extract {
            path,
            media_type,
            output,
            json,
        } => commands::extract::run(&path, media_type, output, json),
        Commands::Inspect { path, media_type } => commands::inspect::run(&path, media_type),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
