use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strsim::normalized_levenshtein;

use crate::io::input::parse_transcript;
use crate::models::{CorrectionCategory, SourceSegment};
use crate::rules::find_duplicate_phrase;
use crate::scoring::{ScoreVariant, score};

static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[。！？]").unwrap());
static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[。、]").unwrap());

/// Fillers counted when judging whether a correction removed hesitations
const FILLERS: &[&str] = &["えー", "あのー", "なんか", "その", "ちょっと"];

/// Canonical-term substitutions the auditor recognizes
const TERM_PAIRS: &[(&str, &str)] = &[
    ("ベルト", "BERT"),
    ("ジーピーティー", "GPT"),
    ("ラーム", "Llama"),
    ("エルエム", "LLM"),
];

const NATURALIZATION_PAIRS: &[(&str, &str)] = &[("だったのかな", "でした"), ("っていう", "という")];

const ENDING_PAIRS: &[(&str, &str)] = &[("申しす", "申します"), ("ございす", "ございます")];

/// Canonical terms whose presence improves readability
const PROPER_TERMS: &[&str] = &["BERT", "GPT", "LLM", "Transformer"];

/// Audit result for one positionally-paired segment
#[derive(Debug, Clone, Serialize)]
pub struct SegmentComparison {
    pub segment_id: usize,
    pub start_time: String,
    pub end_time: String,
    /// Character counts (not bytes)
    pub original_length: usize,
    pub corrected_length: usize,
    /// Independently re-detected correction categories
    pub corrections: Vec<CorrectionCategory>,
    pub quality_score: f64,
    pub readability_delta: f64,
    /// Normalized edit-distance similarity: 0 disjoint, 1 identical
    pub text_similarity: f64,
    pub significant_changes: Vec<String>,
    pub original_preview: String,
    pub corrected_preview: String,
}

/// Segment counts per quality bucket
#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityDistribution {
    /// quality >= 0.8
    pub excellent: usize,
    /// quality >= 0.6
    pub good: usize,
    /// quality >= 0.4
    pub fair: usize,
    pub poor: usize,
}

impl QualityDistribution {
    fn add(&mut self, quality: f64) {
        if quality >= 0.8 {
            self.excellent += 1;
        } else if quality >= 0.6 {
            self.good += 1;
        } else if quality >= 0.4 {
            self.fair += 1;
        } else {
            self.poor += 1;
        }
    }
}

/// Whole-transcript metrics over both texts
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverallMetrics {
    /// Corrected minus original character count (negative when text shrank)
    pub character_delta: i64,
    /// Change in sentence-ending mark count
    pub sentence_count_delta: i64,
    /// Change in punctuation marks per whitespace-separated token
    pub punctuation_density_delta: f64,
}

/// Machine-readable aggregate of one audit run
#[derive(Debug, Clone, Serialize)]
pub struct DiffAnalysis {
    pub segments: Vec<SegmentComparison>,
    pub category_totals: BTreeMap<CorrectionCategory, usize>,
    pub distribution: QualityDistribution,
    pub overall: OverallMetrics,
    /// Segments dropped because the two transcripts differ in length;
    /// positional pairing covers only the shorter side
    pub unpaired_segments: usize,
}

impl DiffAnalysis {
    pub fn average_quality(&self) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        self.segments.iter().map(|s| s.quality_score).sum::<f64>() / self.segments.len() as f64
    }

    pub fn average_readability_delta(&self) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        self.segments.iter().map(|s| s.readability_delta).sum::<f64>() / self.segments.len() as f64
    }

    /// Write the analysis as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create analysis file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write analysis JSON")?;
        Ok(())
    }
}

/// Audit an original transcript against its corrected counterpart
pub fn analyze_files(original_path: &Path, corrected_path: &Path) -> Result<DiffAnalysis> {
    let original = std::fs::read_to_string(original_path)
        .with_context(|| format!("Failed to read original transcript: {:?}", original_path))?;
    let corrected = std::fs::read_to_string(corrected_path)
        .with_context(|| format!("Failed to read corrected transcript: {:?}", corrected_path))?;
    Ok(analyze(&original, &corrected))
}

/// Audit two finished transcripts, re-segmented by the segmenter contract
pub fn analyze(original: &str, corrected: &str) -> DiffAnalysis {
    let original_segments = parse_transcript(original);
    let corrected_segments = parse_transcript(corrected);

    let paired = original_segments.len().min(corrected_segments.len());
    let unpaired_segments = original_segments.len().abs_diff(corrected_segments.len());

    let mut segments = Vec::with_capacity(paired);
    let mut category_totals: BTreeMap<CorrectionCategory, usize> = BTreeMap::new();
    let mut distribution = QualityDistribution::default();

    for (index, (orig, corr)) in original_segments
        .iter()
        .zip(corrected_segments.iter())
        .enumerate()
    {
        let comparison = compare_segment(index + 1, orig, corr);
        for category in &comparison.corrections {
            *category_totals.entry(*category).or_insert(0) += 1;
        }
        distribution.add(comparison.quality_score);
        segments.push(comparison);
    }

    DiffAnalysis {
        segments,
        category_totals,
        distribution,
        overall: overall_metrics(original, corrected),
        unpaired_segments,
    }
}

fn compare_segment(
    segment_id: usize,
    source: &SourceSegment,
    corrected_source: &SourceSegment,
) -> SegmentComparison {
    let original = source.text.as_str();
    let corrected = corrected_source.text.as_str();
    let corrections = detect_corrections(original, corrected);
    let quality_score = score(ScoreVariant::Weighted, original, corrected, &corrections);
    let readability_delta = readability_score(corrected) - readability_score(original);
    let text_similarity = normalized_levenshtein(original, corrected);

    SegmentComparison {
        segment_id,
        start_time: source.start_time.clone(),
        end_time: source.end_time.clone(),
        original_length: original.chars().count(),
        corrected_length: corrected.chars().count(),
        corrections,
        quality_score,
        readability_delta,
        text_similarity,
        significant_changes: significant_changes(original, corrected),
        original_preview: preview(original),
        corrected_preview: preview(corrected),
    }
}

/// Re-detect correction categories from the before/after pair alone
///
/// Stays semantically consistent with the pipeline's categories without
/// consulting its log.
fn detect_corrections(original: &str, corrected: &str) -> Vec<CorrectionCategory> {
    let mut corrections = Vec::new();

    if find_duplicate_phrase(original).is_some() && find_duplicate_phrase(corrected).is_none() {
        corrections.push(CorrectionCategory::RepetitionRemoval);
    }

    if TERM_PAIRS
        .iter()
        .any(|(old, new)| original.contains(old) && corrected.contains(new))
    {
        corrections.push(CorrectionCategory::TechnicalTerm);
    }

    if filler_count(corrected) < filler_count(original) {
        corrections.push(CorrectionCategory::FillerRemoval);
    }

    if PUNCT_RE.find_iter(corrected).count() > PUNCT_RE.find_iter(original).count() {
        corrections.push(CorrectionCategory::Punctuation);
    }

    if NATURALIZATION_PAIRS
        .iter()
        .any(|(old, new)| original.contains(old) && corrected.contains(new))
    {
        corrections.push(CorrectionCategory::Naturalization);
    }

    if ENDING_PAIRS
        .iter()
        .any(|(old, new)| original.contains(old) && corrected.contains(new))
    {
        corrections.push(CorrectionCategory::EndingFix);
    }

    corrections
}

fn filler_count(text: &str) -> usize {
    FILLERS.iter().map(|f| text.matches(f).count()).sum()
}

fn sentence_count(text: &str) -> usize {
    SENTENCE_END_RE
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Heuristic readability in [0, 1]
fn readability_score(text: &str) -> f64 {
    let mut score = 0.0;
    let word_count = text.split_whitespace().count().max(1);

    let punct_density = PUNCT_RE.find_iter(text).count() as f64 / word_count as f64;
    if (0.1..=0.3).contains(&punct_density) {
        score += 0.3;
    }

    let sentences: Vec<&str> = SENTENCE_END_RE
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !sentences.is_empty() {
        let avg_len = sentences
            .iter()
            .map(|s| s.split_whitespace().count())
            .sum::<usize>() as f64
            / sentences.len() as f64;
        if (10.0..=25.0).contains(&avg_len) {
            score += 0.3;
        }
    }

    let filler_ratio = filler_count(text) as f64 / text.chars().count().max(1) as f64;
    score += (0.2 - filler_ratio * 10.0).max(0.0);

    let term_bonus = PROPER_TERMS
        .iter()
        .filter(|term| text.contains(*term))
        .count() as f64
        * 0.05;
    score += term_bonus.min(0.2);

    score.min(1.0)
}

/// Human-readable descriptions of the notable edits in this pair
fn significant_changes(original: &str, corrected: &str) -> Vec<String> {
    let mut changes = Vec::new();

    if let Some(word) = find_duplicate_phrase(original) {
        if find_duplicate_phrase(corrected).is_none() && corrected.contains(&word) {
            changes.push(format!(
                "duplicate phrase removed: 「{word}になる{word}」→「{word}」"
            ));
        }
    }

    for (old, new) in TERM_PAIRS {
        if original.contains(old) && corrected.contains(new) {
            changes.push(format!("term corrected: 「{old}」→「{new}」"));
        }
    }

    let original_sentences = sentence_count(original);
    let corrected_sentences = sentence_count(corrected);
    if corrected_sentences > original_sentences {
        changes.push(format!(
            "sentence breaks improved ({original_sentences}→{corrected_sentences} sentences)"
        ));
    }

    changes
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(100).collect();
    if text.chars().count() > 100 {
        preview.push_str("...");
    }
    preview
}

fn overall_metrics(original: &str, corrected: &str) -> OverallMetrics {
    let original_chars = original.chars().count() as i64;
    let corrected_chars = corrected.chars().count() as i64;

    let original_words = original.split_whitespace().count();
    let corrected_words = corrected.split_whitespace().count();
    let punctuation_density_delta = if original_words > 0 && corrected_words > 0 {
        PUNCT_RE.find_iter(corrected).count() as f64 / corrected_words as f64
            - PUNCT_RE.find_iter(original).count() as f64 / original_words as f64
    } else {
        0.0
    };

    OverallMetrics {
        character_delta: corrected_chars - original_chars,
        sentence_count_delta: SENTENCE_END_RE.find_iter(corrected).count() as i64
            - SENTENCE_END_RE.find_iter(original).count() as i64,
        punctuation_density_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_phrase_removal_is_significant() {
        let original = "[0:00:27 - 0:00:58]\n本日ですねDay2になるDay2の講座になります\n";
        let corrected = "[0:00:27 - 0:00:58]\n本日ですね。Day2の講座になります。\n";
        let analysis = analyze(original, corrected);

        assert_eq!(analysis.segments.len(), 1);
        let segment = &analysis.segments[0];
        assert!(segment
            .corrections
            .contains(&CorrectionCategory::RepetitionRemoval));
        assert!(segment
            .significant_changes
            .iter()
            .any(|c| c.contains("duplicate phrase removed")));
        assert!(segment.significant_changes.iter().any(|c| c.contains("Day2")));
    }

    #[test]
    fn test_term_substitution_detected() {
        let original = "[0:00:01 - 0:00:05]\nベルトの説明とジーピーティーの話\n";
        let corrected = "[0:00:01 - 0:00:05]\nBERTの説明とGPTの話\n";
        let analysis = analyze(original, corrected);

        let segment = &analysis.segments[0];
        assert!(segment
            .corrections
            .contains(&CorrectionCategory::TechnicalTerm));
        assert!(segment
            .significant_changes
            .iter()
            .any(|c| c.contains("「ベルト」→「BERT」")));
        assert_eq!(analysis.category_totals[&CorrectionCategory::TechnicalTerm], 1);
    }

    #[test]
    fn test_similarity_bounds() {
        let original = "[0:00:01 - 0:00:05]\n同じテキスト\n";
        let analysis = analyze(original, original);
        assert!((analysis.segments[0].text_similarity - 1.0).abs() < 1e-9);

        let corrected = "[0:00:01 - 0:00:05]\nxyz\n";
        let analysis = analyze(original, corrected);
        let similarity = analysis.segments[0].text_similarity;
        assert!((0.0..1.0).contains(&similarity));
    }

    #[test]
    fn test_mismatched_counts_reported_not_silent() {
        let original =
            "[0:00:01 - 0:00:05]\n一つ目\n[0:00:05 - 0:00:09]\n二つ目\n[0:00:09 - 0:00:12]\n三つ目\n";
        let corrected = "[0:00:01 - 0:00:05]\n一つ目\n";
        let analysis = analyze(original, corrected);

        assert_eq!(analysis.segments.len(), 1);
        assert_eq!(analysis.unpaired_segments, 2);
    }

    #[test]
    fn test_empty_input_yields_zero_statistics() {
        let analysis = analyze("", "");

        assert!(analysis.segments.is_empty());
        assert_eq!(analysis.unpaired_segments, 0);
        assert_eq!(analysis.average_quality(), 0.0);
        assert_eq!(analysis.average_readability_delta(), 0.0);
        assert_eq!(analysis.overall.character_delta, 0);
        assert_eq!(analysis.distribution.excellent, 0);
        assert!(analysis.category_totals.is_empty());
    }

    #[test]
    fn test_quality_scores_bucketed() {
        let original = "[0:00:01 - 0:00:05]\nベルトとジーピーティーの説明だったのかな、\n";
        let corrected = "[0:00:01 - 0:00:05]\nBERTとGPTの説明でした。\n";
        let analysis = analyze(original, corrected);

        let total = analysis.distribution.excellent
            + analysis.distribution.good
            + analysis.distribution.fair
            + analysis.distribution.poor;
        assert_eq!(total, 1);
        assert!((0.0..=1.0).contains(&analysis.segments[0].quality_score));
    }

    #[test]
    fn test_punctuation_increase_detected() {
        let original = "[0:00:01 - 0:00:05]\n本日は講座ですよろしくお願いします\n";
        let corrected = "[0:00:01 - 0:00:05]\n本日は講座です。よろしくお願いします。\n";
        let analysis = analyze(original, corrected);

        let segment = &analysis.segments[0];
        assert!(segment.corrections.contains(&CorrectionCategory::Punctuation));
        assert!(analysis.overall.sentence_count_delta > 0);
        assert!(segment
            .significant_changes
            .iter()
            .any(|c| c.contains("sentence breaks improved")));
    }

    #[test]
    fn test_analyze_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let original_path = dir.path().join("original.txt");
        let corrected_path = dir.path().join("corrected.txt");
        std::fs::write(&original_path, "[0:00:01 - 0:00:05]\nえー本日の講座です\n").unwrap();
        std::fs::write(&corrected_path, "[0:00:01 - 0:00:05]\n本日の講座です。\n").unwrap();

        let analysis = analyze_files(&original_path, &corrected_path).unwrap();
        assert_eq!(analysis.segments.len(), 1);
        assert!(analysis.segments[0]
            .corrections
            .contains(&CorrectionCategory::FillerRemoval));

        let json_path = dir.path().join("analysis.json");
        analysis.write_json(&json_path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["segments"][0]["segment_id"], 1);
    }
}
