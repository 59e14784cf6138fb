// WHY: per-file detection lives in the library so the CLI, integration tests and
// benchmarks exercise the same path

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::charset_match::CharsetMatch;
use crate::config::DetectorConfig;
use crate::detector::CharsetDetector;

/// One ranked match, as reported
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MatchSummary {
    pub encoding: String,
    pub confidence: u8,
    pub language: Option<String>,
}

impl From<&CharsetMatch> for MatchSummary {
    fn from(m: &CharsetMatch) -> Self {
        Self {
            encoding: m.name().to_string(),
            confidence: m.confidence().get(),
            language: m.language().map(str::to_string),
        }
    }
}

/// Detection outcome for a single file
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FileReport {
    pub path: String,
    /// Bytes the recognizers looked at
    pub bytes_sampled: u64,
    /// Best match first; only the best unless every match was requested
    pub matches: Vec<MatchSummary>,
    /// Decoded text of the best match, when decoding was requested and succeeded
    pub text: Option<String>,
    pub processing_time_ms: u64,
    /// detected, undetected
    pub status: String,
    /// Decode failure for the best match
    pub error: Option<String>,
}

/// What to include in each report
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub all_matches: bool,
    pub decode: bool,
    pub max_chars: Option<usize>,
}

/// Expand directories recursively into the regular files beneath them.
///
/// Paths that do not exist are kept, so opening them fails per file and the
/// caller decides whether that aborts the run.
pub fn collect_input_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(false).sort_by_file_name() {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                    Ok(_) => {}
                    Err(e) => warn!("Skipping unreadable entry under {}: {}", path.display(), e),
                }
            }
        } else {
            if !path.is_file() {
                warn!("Input path does not exist: {}", path.display());
            }
            files.push(path.clone());
        }
    }
    debug!("Collected {} input files", files.len());
    files
}

/// Sample a file as a seekable stream and rank its encodings
pub fn detect_file(path: &Path, config: &DetectorConfig, options: &ReportOptions) -> Result<FileReport> {
    let start_time = Instant::now();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut detector = CharsetDetector::with_config(config.clone());
    detector
        .set_seekable(file)
        .with_context(|| format!("Failed to read sample from {}", path.display()))?;
    let bytes_sampled = detector.sample().map(|s| s.len() as u64).unwrap_or(0);

    let ranked = detector.detect_all();
    let mut matches: Vec<MatchSummary> = ranked.iter().map(MatchSummary::from).collect();
    if !options.all_matches {
        matches.truncate(1);
    }

    let mut text = None;
    let mut error = None;
    if options.decode {
        if let Some(best) = ranked.first() {
            match best.materialize(options.max_chars) {
                Ok(decoded) => text = Some(decoded),
                Err(e) => {
                    warn!("Failed to decode {} as {}: {}", path.display(), best.name(), e);
                    error = Some(e.to_string());
                }
            }
        }
    }

    let status = if ranked.is_empty() { "undetected" } else { "detected" };
    Ok(FileReport {
        path: path.display().to_string(),
        bytes_sampled,
        matches,
        text,
        processing_time_ms: start_time.elapsed().as_millis() as u64,
        status: status.to_string(),
        error,
    })
}
