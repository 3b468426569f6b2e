//! `detect` command: report which files look like Docling JSON.

use std::path::PathBuf;

use clap::Args;
use console::style;
use docpivot::detect_format;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Files to check
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

pub fn run(args: DetectArgs) -> Result<(), CliError> {
    let mut undetected = 0;

    for path in &args.paths {
        if detect_format(path) {
            println!("{} {}", style("✓").green(), path.display());
        } else {
            undetected += 1;
            println!("{} {}", style("✗").red(), path.display());
        }
    }

    if undetected > 0 {
        return Err(CliError::Undetected(undetected));
    }
    Ok(())
}
