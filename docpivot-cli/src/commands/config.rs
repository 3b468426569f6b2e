//! `config` command: inspect and edit the INI configuration file.
//!
//! Every action works on one file, `~/.docpivot/config.ini` unless `--file`
//! names another. `set` validates the resulting loader settings before
//! anything is written.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use docpivot::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config file to operate on instead of ~/.docpivot/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print one setting, e.g. `loader.chunk_size`
    Get { key: String },

    /// Change one setting; sizes accept KB/MB/GB suffixes
    Set { key: String, value: String },

    /// Print every setting in INI form
    List,

    /// Print the config file location
    Path,
}

pub fn run(args: ConfigArgs) -> Result<(), CliError> {
    let path = args.file.unwrap_or_else(config_file_path);

    match args.action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Get { key } => {
            let key = parse_key(&key)?;
            let value = key.get(&ConfigFile::load_from(&path)?);
            println!("{}", or_unset(&value));
        }
        ConfigAction::Set { key, value } => {
            let key = parse_key(&key)?;
            let (before, after) = apply_setting(&path, key, &value)?;
            println!(
                "{} {}: {} {} {}",
                style("✓").green(),
                key,
                or_unset(&before),
                style("→").dim(),
                or_unset(&after)
            );
        }
        ConfigAction::List => print!("{}", render_listing(&ConfigFile::load_from(&path)?)),
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Run 'docpivot config list' for the valid keys.",
            key
        ))
    })
}

/// Set `key` in the file at `path`, returning the old and new rendered values.
///
/// Nothing is written when the value does not parse or the resulting loader
/// settings are inconsistent.
fn apply_setting(path: &Path, key: ConfigKey, value: &str) -> Result<(String, String), CliError> {
    let mut config = ConfigFile::load_from(path)?;
    let before = key.get(&config);

    key.set(&mut config, value)?;
    config.to_loader_config().validate()?;
    config.save_to(path)?;

    Ok((before, key.get(&config)))
}

/// Settings grouped by section, unset values commented out.
fn render_listing(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut section = None;

    for key in ConfigKey::all() {
        if section != Some(key.section()) {
            if section.is_some() {
                out.push('\n');
            }
            section = Some(key.section());
            let _ = writeln!(out, "[{}]", key.section());
        }

        let value = key.get(config);
        if value.is_empty() {
            let _ = writeln!(out, "# {} =", key.key_name());
        } else {
            let _ = writeln!(out, "{} = {}", key.key_name(), value);
        }
    }
    out
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}
