//! DocPivot CLI - command-line interface
//!
//! A thin front end over the `docpivot` library: load documents with the
//! adaptive loader, detect candidate files, and manage the configuration file.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use console::style;
use docpivot::config::ConfigFile;
use docpivot::logging::init_logging;

use commands::config::ConfigArgs;
use commands::detect::DetectArgs;
use commands::load::LoadArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "docpivot")]
#[command(version, about = "Load and inspect Docling JSON documents", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides logging.level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load documents and print a summary of each
    Load(LoadArgs),

    /// Check whether files look like Docling JSON documents
    Detect(DetectArgs),

    /// View or modify configuration settings
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    let config = match ConfigFile::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}; using defaults", style("Warning:").yellow(), e);
            ConfigFile::default()
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let _log_guard = match init_logging(level, config.logging.file.as_deref()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{} {}", style("Warning:").yellow(), e);
            None
        }
    };

    if let Err(e) = run(cli.command, &config) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(command: Commands, config: &ConfigFile) -> Result<(), CliError> {
    match command {
        Commands::Load(args) => commands::load::run(args, config),
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
