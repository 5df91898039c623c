use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{SENTINEL_TIMESTAMP, SourceSegment};

/// Any bracketed pair of digit/colon runs is treated as a segment header
static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[0-9:]+ - [0-9:]+\]").unwrap());

/// Strict timestamp shape; headers that fail this re-parse get sentinel times
static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d+:\d+:\d+) - (\d+:\d+:\d+)\]$").unwrap());

/// Read a transcript file and split it into timestamped segments
pub fn parse_transcript_file(path: &Path) -> Result<Vec<SourceSegment>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    Ok(parse_transcript(&content))
}

/// Split raw transcript text into ordered timestamped segments
///
/// Text before the first header produces nothing, as do whitespace-only gaps
/// between headers. A header whose bracket does not parse into two `H:MM:SS`
/// timestamps is still emitted with sentinel start/end times.
pub fn parse_transcript(text: &str) -> Vec<SourceSegment> {
    let headers: Vec<regex::Match> = HEADER_RE.find_iter(text).collect();
    let mut segments = Vec::new();

    for (i, header) in headers.iter().enumerate() {
        let content_end = headers
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(text.len());
        let content = text[header.end()..content_end].trim();
        if content.is_empty() {
            continue;
        }

        let (start_time, end_time) = match TIMESTAMP_RE.captures(header.as_str()) {
            Some(caps) => (caps[1].to_string(), caps[2].to_string()),
            None => (
                SENTINEL_TIMESTAMP.to_string(),
                SENTINEL_TIMESTAMP.to_string(),
            ),
        };

        segments.push(SourceSegment {
            start_time,
            end_time,
            text: content.to_string(),
        });
    }

    segments
}
