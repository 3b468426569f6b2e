//! `load` command: load documents and print a summary of each.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use console::style;
use docpivot::config::{format_size, ConfigFile};
use docpivot::{AdaptiveDocumentLoader, DoclingDocument, LoadError, LoadRequest};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{load_exit_code, CliError};

/// Progress bar resolution.
const PROGRESS_STEPS: u64 = 1000;

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Files to load
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Always read in chunks, regardless of file size
    #[arg(long, conflicts_with = "standard")]
    pub streaming: bool,

    /// Always read the whole file at once, regardless of file size
    #[arg(long)]
    pub standard: bool,

    /// Bypass the document cache
    #[arg(long)]
    pub no_cache: bool,

    /// Print the body text of each document
    #[arg(long)]
    pub text: bool,

    /// Don't show progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: LoadArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut loader_config = config.to_loader_config();
    if args.no_cache {
        loader_config = loader_config.with_caching(false);
    }
    let loader = AdaptiveDocumentLoader::new(loader_config)?;
    tracing::debug!(backend = loader.json_backend(), "Loader ready");

    let total = args.paths.len();
    let mut first_error: Option<LoadError> = None;
    let mut failed = 0;

    for path in &args.paths {
        match load_one(&loader, path, &args) {
            Ok(document) => print_summary(path, &document, args.text),
            Err(e) if total == 1 => return Err(e.into()),
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", style("✗").red(), path.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    if total > 1 {
        let stats = loader.stats();
        println!();
        println!(
            "Loaded {} of {} documents ({} standard, {} streaming, {} mmap, {} fallbacks)",
            total - failed,
            total,
            stats.standard_loads,
            stats.streaming_loads,
            stats.mmap_loads,
            stats.mmap_fallbacks
        );
    }

    match first_error {
        Some(e) => Err(CliError::LoadFailures {
            failed,
            total,
            exit_code: load_exit_code(&e),
        }),
        None => Ok(()),
    }
}

fn load_one(
    loader: &AdaptiveDocumentLoader,
    path: &Path,
    args: &LoadArgs,
) -> Result<Arc<DoclingDocument>, LoadError> {
    let mut request = LoadRequest::new(path);
    if args.streaming {
        request = request.force_streaming(true);
    }
    if args.standard {
        request = request.force_standard(true);
    }

    if args.quiet {
        return loader.load(request);
    }

    let bar = progress_bar(path);
    let sink = bar.clone();
    let result = loader.load(request.with_progress(move |fraction| {
        sink.set_position((fraction * PROGRESS_STEPS as f64).round() as u64);
    }));
    bar.finish_and_clear();
    result
}

fn progress_bar(path: &Path) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    let bar = ProgressBar::new(PROGRESS_STEPS).with_style(style);
    bar.set_message(
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    bar
}

fn print_summary(path: &Path, document: &DoclingDocument, with_text: bool) {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("{} {}", style("✓").green(), style(path.display()).bold());
    println!("  Name:    {}", document.name);
    println!("  Version: {}", document.version);
    println!("  Size:    {}", format_size(size));
    if let Some(origin) = &document.origin {
        println!("  Origin:  {} ({})", origin.filename, origin.mimetype);
    }
    println!(
        "  Nodes:   {} ({} texts, {} tables, {} pictures, {} pages)",
        document.node_count(),
        document.texts.len(),
        document.tables.len(),
        document.pictures.len(),
        document.pages.len()
    );

    if with_text {
        println!();
        for line in document.body_text() {
            println!("{}", line);
        }
    }
}
