use anyhow::Result;
use charsniff::{collect_input_files, detect_file, DetectorConfig, FileReport, ReportOptions, DEFAULT_SAMPLE_CAP};
use clap::Parser;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "charsniff")]
#[command(about = "Identify the most probable character encoding of files with no declared encoding")]
#[command(version)]
struct Args {
    /// Files or directories (walked recursively) to inspect
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Print every match, not only the best one
    #[arg(long)]
    all: bool,

    /// Print the text decoded with the best match
    #[arg(long)]
    decode: bool,

    /// Stop decoding after this many characters
    #[arg(long)]
    max_chars: Option<usize>,

    /// Bytes sampled from each file before detection
    #[arg(long, default_value_t = DEFAULT_SAMPLE_CAP)]
    sample_cap: usize,

    /// Hide matches below this confidence
    #[arg(long, default_value_t = 0)]
    min_confidence: u8,

    /// Emit one JSON object per file
    #[arg(long)]
    json: bool,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Debug-level logging on stderr
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // WHY: structured JSON logging on stderr keeps stdout free for results
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .json()
        .init();

    info!(?args, "Parsed CLI arguments");

    let files = collect_input_files(&args.paths);
    info!("Inspecting {} files", files.len());

    let config = Arc::new(DetectorConfig {
        sample_cap: args.sample_cap,
        min_confidence: args.min_confidence,
    });
    let options = Arc::new(ReportOptions {
        all_matches: args.all,
        decode: args.decode,
        max_chars: args.max_chars,
    });

    // WHY: detection is blocking file I/O; bound concurrency by core count and keep input order
    let mut reports = stream::iter(files)
        .map(|path| {
            let config = Arc::clone(&config);
            let options = Arc::clone(&options);
            tokio::task::spawn_blocking(move || {
                let result = detect_file(&path, &config, &options);
                (path, result)
            })
        })
        .buffered(num_cpus::get().max(1));

    let mut detected = 0usize;
    let mut failed = 0usize;
    while let Some(joined) = reports.next().await {
        let (path, result) = joined?;
        match result {
            Ok(report) => {
                if !report.matches.is_empty() {
                    detected += 1;
                }
                print_report(&report, args.all, args.json)?;
            }
            Err(e) => {
                if args.fail_fast {
                    return Err(e);
                }
                failed += 1;
                warn!("Failed to inspect {}: {:#}", path.display(), e);
                eprintln!("{}: error: {:#}", path.display(), e);
            }
        }
    }

    info!("Detection finished: {} detected, {} failed", detected, failed);
    Ok(())
}

fn print_report(report: &FileReport, all: bool, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    match report.matches.first() {
        None => println!("{}: no match", report.path),
        Some(best) if !all => println!("{}: {} (confidence {})", report.path, best.encoding, best.confidence),
        Some(_) => {
            println!("{}:", report.path);
            for m in &report.matches {
                match &m.language {
                    Some(language) => println!("  {:>3}  {} [{}]", m.confidence, m.encoding, language),
                    None => println!("  {:>3}  {}", m.confidence, m.encoding),
                }
            }
        }
    }

    if let Some(error) = &report.error {
        println!("  decode failed: {error}");
    }
    if let Some(text) = &report.text {
        println!("{text}");
    }
    Ok(())
}
