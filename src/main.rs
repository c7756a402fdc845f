/*!
 * Command-line interface for filekit
 */

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use tracing_subscriber::EnvFilter;

use filekit::config::{Args, BatchArgs, Command, Config};
use filekit::disk::{calculate_total_size, check_disk_space, get_disk_usage};
use filekit::metadata::collect_file_metadata;
use filekit::path::{expand_user, normalize, path_exists_cross_platform};
use filekit::platform::Platform;
use filekit::report::{BatchSummary, ReportFormat, Reporter};
use filekit::select::SourceSelector;
use filekit::symlink::{SymlinkCreator, SymlinkRequest};
use filekit::transfer::{Operation, Transfer};

/// Environment variable holding the log filter
const LOG_ENV: &str = "FILEKIT_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn failure(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::Other, message)
}

fn run_batch(config: &Config, operation: Operation, batch: &BatchArgs) -> io::Result<()> {
    let selector = SourceSelector::new(
        batch.include_patterns.clone(),
        batch.ignore_patterns.clone(),
    );
    let sources = selector.expand(&batch.sources);

    if batch.check_space && operation == Operation::Copy {
        let required = calculate_total_size(&sources, true);
        check_disk_space(&batch.dest, required, filekit::disk::DEFAULT_SAFETY_MARGIN, true)?;
    }

    // Create progress bar
    let progress = ProgressBar::new(sources.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  Elapsed: {elapsed_precise}")
            .map_err(|e| failure(e.to_string()))?,
    );
    progress.enable_steady_tick(std::time::Duration::from_millis(100));
    progress.set_prefix(format!("📦 {}", operation));

    let options = config.batch_options(batch);
    let start_time = Instant::now();

    let report = Transfer::new().run_batch_with_progress(
        operation,
        &sources,
        &batch.source_base,
        &batch.dest,
        &options,
        |source: &Path, _| {
            progress.set_message(source.display().to_string());
            progress.inc(1);
        },
    );

    progress.finish_and_clear();

    let reporter = Reporter::new(ReportFormat::ConsoleTable);
    reporter.print_batch_report(&BatchSummary {
        operation,
        report: &report,
        duration: start_time.elapsed(),
    });

    if report.failed() > 0 {
        return Err(failure(format!(
            "{} of {} files failed",
            report.failed(),
            report.len()
        )));
    }
    Ok(())
}

fn run_space(
    dest: &Path,
    required: Option<u64>,
    sources: &[PathBuf],
    margin: f64,
    strict: bool,
) -> io::Result<()> {
    let usage = get_disk_usage(dest)?;

    let required = match required {
        Some(bytes) => Some(bytes),
        None if !sources.is_empty() => Some(calculate_total_size(sources, true)),
        None => None,
    };

    let check = match required {
        Some(bytes) => Some(check_disk_space(dest, bytes, margin, strict)?),
        None => None,
    };

    let reporter = Reporter::new(ReportFormat::ConsoleTable);
    println!(
        "{}",
        reporter.space_report(&dest.display().to_string(), &usage, check.as_ref())
    );

    if let Some(check) = check {
        println!("{}", check.message);
    }
    Ok(())
}

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "filekit", &mut io::stdout());
        return Ok(());
    }

    // Create configuration
    let config = Config::from_args(args);

    init_logging(config.verbose);

    // Validate configuration
    config.validate()?;

    // Configure thread pool
    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()
    {
        tracing::warn!("Failed to set thread pool size: {}", e);
    }

    let Some(command) = config.command.clone() else {
        return Ok(());
    };

    match command {
        Command::Normalize {
            path,
            target,
            expand,
        } => {
            let path = if expand { expand_user(&path) } else { path };
            let target = target.unwrap_or_else(Platform::current);
            println!("{}", normalize(&path, target));
        }
        Command::Exists { path } => {
            if !path_exists_cross_platform(&path) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Not found: {}", path),
                ));
            }
            println!("{}", path);
        }
        Command::Copy { source, dest } => {
            Transfer::new().try_copy(&source, &dest, config.transfer)?;
        }
        Command::Move { source, dest } => {
            Transfer::new().try_move(&source, &dest, config.transfer)?;
        }
        Command::Link {
            target,
            link,
            force,
            dir,
        } => {
            let mut request = SymlinkRequest::new(target, link).force(force);
            if dir {
                request = request.directory(true);
            }
            SymlinkCreator::new().create(&request)?;
        }
        Command::Meta { path, json } => {
            let snapshot = collect_file_metadata(&path);
            if json {
                let text = serde_json::to_string_pretty(&snapshot)
                    .map_err(filekit::FileKitError::from)?;
                println!("{}", text);
            } else {
                let reporter = Reporter::new(ReportFormat::ConsoleTable);
                println!(
                    "{}",
                    reporter.metadata_report(&path.display().to_string(), &snapshot)
                );
            }
        }
        Command::BatchCopy(batch) => run_batch(&config, Operation::Copy, &batch)?,
        Command::BatchMove(batch) => run_batch(&config, Operation::Move, &batch)?,
        Command::Space {
            dest,
            required,
            sources,
            margin,
            strict,
        } => run_space(&dest, required, &sources, margin, strict)?,
    }

    Ok(())
}
