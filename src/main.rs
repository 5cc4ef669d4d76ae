use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use keepdir::{
    check_root, reconcile, validate_marker_name, GitCheckIgnore, ReconcileOptions, DEFAULT_MARKER,
};
use signal_hook::consts::SIGINT;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn, Level};

/// Exit status after Ctrl-C, following the shell convention of 128 + SIGINT.
const INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Keep empty directories in git by adding .gitkeep files, and drop the ones no longer needed",
    long_about = None
)]
struct Args {
    /// Directory to process (defaults to current directory)
    #[arg(default_value = ".", value_parser = parse_target_dir)]
    path: PathBuf,

    /// Also process directories whose name starts with a dot
    #[arg(long, short)]
    all: bool,

    /// Show the changes that would be made, but don't make them
    #[arg(long, short)]
    dry: bool,

    /// Run even if the directory looks like a top-level or home directory
    #[arg(long, short)]
    force: bool,

    /// Name of the placeholder file
    #[arg(long, short, default_value = DEFAULT_MARKER, env = "KEEPDIR_MARKER", value_parser = parse_marker)]
    marker: String,

    /// Log every decision and print the full cause of errors
    #[arg(long, short)]
    verbose: bool,
}

fn parse_target_dir(arg: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(arg);
    if !path.exists() {
        return Err(format!("{arg} does not exist"));
    }
    if !path.is_dir() {
        return Err(format!("{arg} is not a directory"));
    }
    Ok(path)
}

fn parse_marker(arg: &str) -> Result<String, String> {
    validate_marker_name(arg).map_err(|e| e.to_string())?;
    Ok(arg.to_string())
}

fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}

fn run(args: &Args, cancel: &AtomicBool) -> Result<()> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", args.path.display()))?;

    if !args.dry && !args.force {
        check_root(&root)?;
    }

    let options = ReconcileOptions {
        dry_run: args.dry,
        include_hidden: args.all,
        marker: args.marker.clone(),
    };
    debug!("Reconciling {} with {:?}", root.display(), options);

    let report = reconcile(&root, &options, &GitCheckIgnore::new(), cancel)
        .with_context(|| format!("Failed to update placeholders under {}", root.display()))?;

    debug!(
        "Visited {} directories: {} added, {} removed",
        report.visited,
        report.added.len(),
        report.removed.len()
    );
    if args.dry {
        println!("Dry run: no changes were made.");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(args.verbose);
    debug!("Parsed CLI arguments: {args:?}");

    let cancel = Arc::new(AtomicBool::new(false));
    if let Err(err) = signal_hook::flag::register(SIGINT, Arc::clone(&cancel)) {
        warn!("Could not install Ctrl-C handler: {err}");
    }

    match run(&args, &cancel) {
        Ok(()) => ExitCode::SUCCESS,
        // git may die from the same SIGINT; whatever failed, this is an interrupt
        Err(_) if cancel.load(Ordering::SeqCst) => {
            eprintln!();
            ExitCode::from(INTERRUPTED)
        }
        Err(err) => {
            if args.verbose {
                eprintln!("{} {:?}", "error:".red().bold(), err);
            } else {
                eprintln!("{} {:#}", "error:".red().bold(), err);
            }
            ExitCode::FAILURE
        }
    }
}
