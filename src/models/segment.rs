use serde::{Deserialize, Serialize};

/// Sentinel used when a bracketed header cannot be parsed into two timestamps
pub const SENTINEL_TIMESTAMP: &str = "00:00:00";

/// Category of a single applied correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionCategory {
    /// Phonetic confusable replaced with a canonical term, name or product name
    TechnicalTerm,
    /// Truncated polite verb ending completed
    EndingFix,
    /// Immediately repeated word or word+suffix pattern collapsed
    RepetitionRemoval,
    /// Discourse filler or hesitation sound stripped
    FillerRemoval,
    /// Colloquial spoken construction rewritten into written register
    Naturalization,
    /// Sentence-ending mark inserted
    Punctuation,
    /// Context-dependent repair produced by the external generation service
    ContextCorrection,
}

impl CorrectionCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TechnicalTerm => "technical term",
            Self::EndingFix => "ending fix",
            Self::RepetitionRemoval => "repetition removal",
            Self::FillerRemoval => "filler removal",
            Self::Naturalization => "naturalization",
            Self::Punctuation => "punctuation",
            Self::ContextCorrection => "context correction",
        }
    }
}

impl std::fmt::Display for CorrectionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One timestamped unit of raw transcript text, as produced by the segmenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSegment {
    /// Start timestamp as it appeared in the header (opaque)
    pub start_time: String,
    /// End timestamp as it appeared in the header (opaque)
    pub end_time: String,
    /// Trimmed content between this header and the next
    pub text: String,
}

/// One timestamped unit of transcript text plus its correction state
///
/// Populated once by the corrector, in fixed stage order, and immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Sequential 1-based id, assigned only to non-empty content units
    pub id: usize,
    /// Start timestamp (opaque, sentinel "00:00:00" on parse fallback)
    pub start_time: String,
    /// End timestamp (opaque, sentinel "00:00:00" on parse fallback)
    pub end_time: String,
    /// Content as extracted from the source transcript
    pub original_text: String,
    /// Content after the rule pipeline and any LLM escalation
    pub corrected_text: String,
    /// Ordered log of applied correction categories
    pub applied_corrections: Vec<CorrectionCategory>,
    /// Quality estimate, always clamped to [0, 1]
    pub quality_score: f64,
    /// Whether the external generation service changed this segment
    pub llm_used: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels() {
        assert_eq!(CorrectionCategory::TechnicalTerm.label(), "technical term");
        assert_eq!(CorrectionCategory::EndingFix.label(), "ending fix");
        assert_eq!(
            CorrectionCategory::ContextCorrection.to_string(),
            "context correction"
        );
    }

    #[test]
    fn test_category_serde_snake_case() {
        let json = serde_json::to_string(&CorrectionCategory::RepetitionRemoval).unwrap();
        assert_eq!(json, "\"repetition_removal\"");
        let back: CorrectionCategory = serde_json::from_str("\"filler_removal\"").unwrap();
        assert_eq!(back, CorrectionCategory::FillerRemoval);
    }
}
