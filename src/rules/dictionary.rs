use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::CorrectionCategory;

/// One pattern-rewrite rule within a pipeline stage
#[derive(Debug, Clone)]
pub struct CorrectionRule {
    pub pattern: Regex,
    pub replacement: String,
    pub category: CorrectionCategory,
    /// Skip a match when this text follows it (the regex crate has no
    /// negative lookahead). Used for expansion rules like 松尾研 →
    /// 松尾研究室, which must not re-match the already-expanded form.
    pub unless_followed_by: Option<String>,
}

impl CorrectionRule {
    pub fn new(pattern: &str, replacement: &str, category: CorrectionCategory) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("correction rule pattern should compile"),
            replacement: replacement.to_string(),
            category,
            unless_followed_by: None,
        }
    }
}

fn rules(category: CorrectionCategory, pairs: &[(&str, &str)]) -> Vec<CorrectionRule> {
    pairs
        .iter()
        .map(|(pattern, replacement)| CorrectionRule::new(pattern, replacement, category))
        .collect()
}

/// Phonetic-confusable terms, names and product names
///
/// Word boundaries keep 松尾研 from matching inside 松尾研究室.
pub static TECH_TERMS: Lazy<Vec<CorrectionRule>> = Lazy::new(|| {
    rules(
        CorrectionCategory::TechnicalTerm,
        &[
            (r"\bベルト\b", "ベルトン"),
            (r"\bベル ト\b", "ベルトン"),
            (r"\bジーピーティー\b", "GPT"),
            (r"\bラーム\b", "Llama"),
            (r"\bエルエム\b", "LLM"),
            (r"\b松尾研\b", "松尾研究室"),
            (r"とも配も", "ともかく"),
            (r"編集BERT", "BERT"),
            (r"あの後単語", "後ほど"),
        ],
    )
});

/// Truncated polite verb endings
///
/// The long closing phrase comes first so the shorter ございす rule cannot
/// shadow its repair. Patterns are unanchored: a truncated ending directly
/// followed by the next clause must still be completed.
pub static ENDING_FIXES: Lazy<Vec<CorrectionRule>> = Lazy::new(|| {
    rules(
        CorrectionCategory::EndingFix,
        &[
            (r"りがとうございす", "ありがとうございます"),
            (r"申しす", "申します"),
            (r"ございす", "ございます"),
            (r"思いす", "思います"),
        ],
    )
});

/// Discourse fillers and hesitation sounds
pub static FILLER_PATTERNS: Lazy<Vec<CorrectionRule>> = Lazy::new(|| {
    rules(
        CorrectionCategory::FillerRemoval,
        &[
            (r"\s*[えあ]+ー*\s*", " "),
            (r"\s*あのー*\s*", " "),
            (r"なんか\s+", ""),
        ],
    )
});

/// Colloquial spoken constructions rewritten into written register
pub static NATURALNESS_RULES: Lazy<Vec<CorrectionRule>> = Lazy::new(|| {
    rules(
        CorrectionCategory::Naturalization,
        &[
            (r"だったのかな[、。]", "でした。"),
            (r"あるのかなと思", "あると思"),
            (r"かなというふう", "かと思"),
            (r"っていう", "という"),
            (r"だったりとか", "や"),
        ],
    )
});

/// Completed polite endings that take a sentence-ending mark
pub const POLITE_ENDINGS: &[&str] = &["申します", "ございます", "思います"];

/// Infixes joining an immediately repeated word (`XになるX` → `X`)
pub const REPETITION_INFIXES: &[&str] = &["になる"];

/// Matches one run of word characters
pub static WORD_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Repeated whitespace collapsed by the normalization stage
pub static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Whitespace immediately preceding punctuation
pub static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([。、！？])").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_dictionaries_compile() {
        assert!(!TECH_TERMS.is_empty());
        assert!(!ENDING_FIXES.is_empty());
        assert!(!FILLER_PATTERNS.is_empty());
        assert!(!NATURALNESS_RULES.is_empty());
    }

    #[test]
    fn test_word_boundary_rejects_longer_organization_name() {
        let rule = &TECH_TERMS[5];
        assert!(rule.pattern.is_match("松尾研"));
        assert!(rule.pattern.is_match("所属: 松尾研 です"));
        assert!(!rule.pattern.is_match("松尾研究室"));
    }

    #[test]
    fn test_long_closing_repair_ordered_first() {
        assert_eq!(ENDING_FIXES[0].replacement, "ありがとうございます");
    }
}
