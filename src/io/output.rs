use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{RunStats, Segment};

/// Render corrected segments in the transcript output format
///
/// Each retained segment becomes `[start - end]\n<corrected text>\n\n`, in
/// original order. Re-segmenting the rendered text yields the same
/// (start, end, text) tuples.
pub fn render_transcript(segments: &[Segment]) -> String {
    let mut output = String::new();
    for segment in segments {
        output.push_str(&format!(
            "[{} - {}]\n{}\n\n",
            segment.start_time, segment.end_time, segment.corrected_text
        ));
    }
    output
}

/// Write corrected segments to a transcript file
pub fn write_transcript(segments: &[Segment], path: &Path) -> Result<()> {
    std::fs::write(path, render_transcript(segments))
        .with_context(|| format!("Failed to write transcript: {:?}", path))
}

/// Persist run statistics as pretty-printed JSON
pub fn write_stats(stats: &RunStats, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create stats file: {:?}", path))?;
    serde_json::to_writer_pretty(file, stats).context("Failed to write statistics JSON")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::input::parse_transcript;
    use crate::models::RunAccounting;

    fn make_segment(id: usize, start: &str, end: &str, text: &str) -> Segment {
        Segment {
            id,
            start_time: start.to_string(),
            end_time: end.to_string(),
            original_text: text.to_string(),
            corrected_text: text.to_string(),
            applied_corrections: vec![],
            quality_score: 0.5,
            llm_used: false,
        }
    }

    #[test]
    fn test_render_format() {
        let segments = vec![make_segment(1, "0:00:01", "0:00:05", "申します。")];
        assert_eq!(
            render_transcript(&segments),
            "[0:00:01 - 0:00:05]\n申します。\n\n"
        );
    }

    #[test]
    fn test_round_trip_through_segmenter() {
        let segments = vec![
            make_segment(1, "0:00:01", "0:00:27", "皆さんこんばんは。"),
            make_segment(2, "0:00:27", "0:00:58", "本日の講座です。"),
        ];

        let rendered = render_transcript(&segments);
        let reparsed = parse_transcript(&rendered);

        assert_eq!(reparsed.len(), segments.len());
        for (src, seg) in reparsed.iter().zip(&segments) {
            assert_eq!(src.start_time, seg.start_time);
            assert_eq!(src.end_time, seg.end_time);
            assert_eq!(src.text, seg.corrected_text);
        }
    }

    #[test]
    fn test_write_transcript_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let transcript_path = dir.path().join("out.txt");
        let stats_path = dir.path().join("stats.json");

        let segments = vec![make_segment(1, "0:00:01", "0:00:05", "本文")];
        write_transcript(&segments, &transcript_path).unwrap();
        let written = std::fs::read_to_string(&transcript_path).unwrap();
        assert!(written.contains("[0:00:01 - 0:00:05]"));

        let stats = RunStats::from_segments(&segments, &RunAccounting::default());
        write_stats(&stats, &stats_path).unwrap();
        let parsed: RunStats =
            serde_json::from_str(&std::fs::read_to_string(&stats_path).unwrap()).unwrap();
        assert_eq!(parsed.total_segments, 1);
    }
}
