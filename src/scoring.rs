//! Quality-score heuristics for corrected segments.
//!
//! Two named variants share one shape: a base value, per-category bonuses, a
//! length-ratio adjustment, a bonus for curated obvious improvements and a
//! penalty when the correction made things worse. Scores are always clamped
//! to [0, 1].

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::CorrectionCategory;

/// Which scoring formula to use for the live correction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreVariant {
    /// Count-based heuristic: base 0.3, uniform bonus per distinct category
    #[default]
    Simple,
    /// Weighted heuristic: base 0.5, per-category weights
    Weighted,
}

/// Curated (bad pattern in original, good literal in corrected) pairs
static OBVIOUS_IMPROVEMENTS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"Day2になるDay2", "Day2"),
        (r"ますタイトル", "ます。タイトル"),
        (r"かなと思っている", "かと思"),
    ]
    .iter()
    .map(|(pattern, good)| (Regex::new(pattern).unwrap(), *good))
    .collect()
});

/// Long polite closing whose leading characters are easily lost
const FULL_CLOSING: &str = "ありがとうございます";
const TRUNCATED_CLOSING: &str = "りがとうございます";

/// Domain keywords that must survive correction
const IMPORTANT_KEYWORDS: &[&str] = &["講師", "講座", "皆さん", "研究室"];

fn category_weight(category: CorrectionCategory) -> f64 {
    match category {
        CorrectionCategory::TechnicalTerm => 0.20,
        CorrectionCategory::RepetitionRemoval => 0.15,
        CorrectionCategory::EndingFix => 0.15,
        CorrectionCategory::Punctuation => 0.10,
        CorrectionCategory::Naturalization => 0.10,
        CorrectionCategory::FillerRemoval => 0.05,
        _ => 0.02,
    }
}

/// Score one segment's correction
pub fn score(
    variant: ScoreVariant,
    original: &str,
    corrected: &str,
    corrections: &[CorrectionCategory],
) -> f64 {
    let distinct: BTreeSet<CorrectionCategory> = corrections.iter().copied().collect();

    let mut score = match variant {
        ScoreVariant::Simple => 0.3 + 0.2 * distinct.len() as f64,
        ScoreVariant::Weighted => {
            0.5 + distinct.iter().map(|&c| category_weight(c)).sum::<f64>()
        }
    };

    let original_len = original.chars().count().max(1);
    let length_ratio = corrected.chars().count() as f64 / original_len as f64;
    if (0.7..=1.3).contains(&length_ratio) {
        score += 0.1;
    } else if length_ratio < 0.5 {
        score -= 0.2;
    }

    if detect_obvious_improvement(original, corrected) {
        score += 0.15;
    }

    if detect_deterioration(original, corrected) {
        score -= 0.3;
    }

    score.clamp(0.0, 1.0)
}

/// True when a curated bad-phrase/good-phrase pair fires
pub fn detect_obvious_improvement(original: &str, corrected: &str) -> bool {
    OBVIOUS_IMPROVEMENTS
        .iter()
        .any(|(bad, good)| bad.is_match(original) && corrected.contains(good))
}

/// True when the correction truncated a critical phrase or lost a keyword
///
/// The closing phrase counts as truncated only when the full form is gone
/// from the corrected text while its tail survives.
pub fn detect_deterioration(original: &str, corrected: &str) -> bool {
    if original.contains(FULL_CLOSING)
        && corrected.contains(TRUNCATED_CLOSING)
        && !corrected.contains(FULL_CLOSING)
    {
        return true;
    }

    IMPORTANT_KEYWORDS
        .iter()
        .any(|keyword| original.contains(keyword) && !corrected.contains(keyword))
}
