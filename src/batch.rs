//! Batch traversal: correct every transcript in a directory, skipping
//! unreadable files, then persist aggregate statistics.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::corrector::Corrector;
use crate::io::{write_stats, write_transcript};
use crate::models::{RunStats, Segment};

/// Aggregate outcome of one batch run
#[derive(Debug)]
pub struct BatchSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub stats: RunStats,
}

/// Process every `*.txt` file in `input_dir` into
/// `<output_dir>/<stem>_corrected.txt`
///
/// A file that cannot be read or written is skipped with a warning; the rest
/// of the batch continues. Statistics for all corrected segments are written
/// to `batch_statistics.json` in the output directory.
pub async fn process_directory(
    corrector: &mut Corrector,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let files = transcript_files(input_dir)?;
    if files.is_empty() {
        warn!("No .txt files found in {:?}", input_dir);
    }
    info!("Batch processing {} files from {:?}", files.len(), input_dir);

    let mut files_processed = 0;
    let mut files_failed = 0;
    let mut all_segments: Vec<Segment> = Vec::new();

    for (index, path) in files.iter().enumerate() {
        info!("[{}/{}] Processing {:?}", index + 1, files.len(), path);

        match process_file(corrector, path, output_dir).await {
            Ok(segments) => {
                info!(
                    "  {} segments, {} via generation service",
                    segments.len(),
                    segments.iter().filter(|s| s.llm_used).count()
                );
                all_segments.extend(segments);
                files_processed += 1;
            }
            Err(e) => {
                warn!("  Skipping {:?}: {:#}", path, e);
                files_failed += 1;
            }
        }
    }

    let stats = corrector.stats(&all_segments);
    write_stats(&stats, &output_dir.join("batch_statistics.json"))?;

    Ok(BatchSummary {
        files_processed,
        files_failed,
        stats,
    })
}

async fn process_file(
    corrector: &mut Corrector,
    path: &Path,
    output_dir: &Path,
) -> Result<Vec<Segment>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;

    let segments = corrector.correct_transcript(&content).await;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("transcript");
    let output_path = output_dir.join(format!("{}_corrected.txt", stem));
    write_transcript(&segments, &output_path)?;

    Ok(segments)
}

/// All `*.txt` files in the directory, in stable name order
fn transcript_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read directory: {:?}", input_dir))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}
