use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use crate::models::CorrectionCategory;

use super::dictionary::{
    CorrectionRule, ENDING_FIXES, FILLER_PATTERNS, MULTI_SPACE_RE, NATURALNESS_RULES,
    POLITE_ENDINGS, REPETITION_INFIXES, SPACE_BEFORE_PUNCT_RE, TECH_TERMS,
};

static POLITE_ENDING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&POLITE_ENDINGS.join("|")).unwrap());

/// Per-stage enable flags for the correction pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub tech_terms: bool,
    pub ending_fixes: bool,
    pub repetition_removal: bool,
    pub filler_removal: bool,
    pub naturalization: bool,
    pub punctuation: bool,
    pub normalization: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tech_terms: true,
            ending_fixes: true,
            repetition_removal: true,
            filler_removal: true,
            naturalization: true,
            punctuation: true,
            normalization: true,
        }
    }
}

/// Result of one pipeline pass over a segment's text
#[derive(Debug, Clone)]
pub struct CorrectionOutcome {
    pub text: String,
    /// Ordered category log, one entry per rule that matched
    pub corrections: Vec<CorrectionCategory>,
}

/// The ordered rule tables for one run
///
/// Built once at initialization; custom term dictionaries from configuration
/// are merged into the technical-term stage and the tables are read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct RuleSet {
    tech_terms: Vec<CorrectionRule>,
    ending_fixes: Vec<CorrectionRule>,
    fillers: Vec<CorrectionRule>,
    naturalness: Vec<CorrectionRule>,
}

impl RuleSet {
    /// Rule set with only the built-in dictionaries
    pub fn builtin() -> Self {
        Self {
            tech_terms: TECH_TERMS.clone(),
            ending_fixes: ENDING_FIXES.clone(),
            fillers: FILLER_PATTERNS.clone(),
            naturalness: NATURALNESS_RULES.clone(),
        }
    }

    /// Merge custom term dictionaries into the technical-term stage
    ///
    /// Entries are matched literally (escaped), in the given order, after the
    /// built-in rules. Identity entries are dropped; expansion entries
    /// (replacement starts with the term) are guarded so the already-expanded
    /// form is never re-matched.
    pub fn merge_custom_terms<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (term, replacement) in entries {
            if term == replacement {
                continue;
            }
            let mut rule = CorrectionRule::new(
                &regex::escape(term),
                replacement,
                CorrectionCategory::TechnicalTerm,
            );
            if let Some(suffix) = replacement.strip_prefix(term) {
                rule.unless_followed_by = Some(suffix.to_string());
            }
            self.tech_terms.push(rule);
        }
    }

    /// Apply the seven pipeline stages in fixed order
    ///
    /// Later stages assume earlier stages already ran: punctuation insertion
    /// expects ending repair to have completed the polite verb forms.
    pub fn apply(&self, text: &str, config: &PipelineConfig) -> CorrectionOutcome {
        let mut corrected = text.to_string();
        let mut corrections = Vec::new();

        // 1. Technical terms
        if config.tech_terms {
            run_rules(&self.tech_terms, &mut corrected, &mut corrections);
        }

        // 2. Ending repair
        if config.ending_fixes {
            run_rules(&self.ending_fixes, &mut corrected, &mut corrections);
        }

        // 3. Repetition removal
        if config.repetition_removal {
            for infix in REPETITION_INFIXES {
                if let Some(collapsed) = collapse_infix_repetition(&corrected, infix) {
                    corrected = collapsed;
                    corrections.push(CorrectionCategory::RepetitionRemoval);
                }
            }
            if let Some(collapsed) = collapse_spaced_duplicates(&corrected) {
                corrected = collapsed;
                corrections.push(CorrectionCategory::RepetitionRemoval);
            }
        }

        // 4. Filler removal
        if config.filler_removal {
            run_rules(&self.fillers, &mut corrected, &mut corrections);
        }

        // 5. Naturalization
        if config.naturalization {
            run_rules(&self.naturalness, &mut corrected, &mut corrections);
        }

        // 6. Punctuation insertion
        if config.punctuation {
            if let Some(punctuated) = insert_sentence_breaks(&corrected) {
                corrected = punctuated;
                corrections.push(CorrectionCategory::Punctuation);
            }
        }

        // 7. Normalization
        if config.normalization {
            corrected = normalize(&corrected);
        }

        CorrectionOutcome {
            text: corrected,
            corrections,
        }
    }
}

fn run_rules(
    rules: &[CorrectionRule],
    text: &mut String,
    corrections: &mut Vec<CorrectionCategory>,
) {
    for rule in rules {
        let replaced = match &rule.unless_followed_by {
            None => {
                if rule.pattern.is_match(text) {
                    Some(
                        rule.pattern
                            .replace_all(text, NoExpand(&rule.replacement))
                            .into_owned(),
                    )
                } else {
                    None
                }
            }
            Some(suffix) => replace_unless_followed_by(&rule.pattern, text, &rule.replacement, suffix),
        };
        if let Some(new_text) = replaced {
            *text = new_text;
            corrections.push(rule.category);
        }
    }
}

/// Replace every match that is not immediately followed by `suffix`
fn replace_unless_followed_by(
    pattern: &Regex,
    text: &str,
    replacement: &str,
    suffix: &str,
) -> Option<String> {
    let mut result = String::new();
    let mut copied_to = 0;
    let mut changed = false;

    for m in pattern.find_iter(text) {
        if text[m.end()..].starts_with(suffix) {
            continue;
        }
        result.push_str(&text[copied_to..m.start()]);
        result.push_str(replacement);
        copied_to = m.end();
        changed = true;
    }

    if changed {
        result.push_str(&text[copied_to..]);
        Some(result)
    } else {
        None
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Find the first `XになるX` duplicate and return the repeated word
///
/// Shared by the diff analyzer so its repetition detection stays
/// semantically consistent with the pipeline stage.
pub fn find_duplicate_phrase(text: &str) -> Option<String> {
    for infix in REPETITION_INFIXES {
        let mut rest = text;
        while let Some(pos) = rest.find(infix) {
            let prefix = &rest[..pos];
            let run_start = prefix
                .char_indices()
                .rev()
                .take_while(|(_, c)| is_word_char(*c))
                .last()
                .map(|(i, _)| i)
                .unwrap_or(pos);
            let run = &prefix[run_start..];
            let after = &rest[pos + infix.len()..];

            for (i, _) in run.char_indices() {
                let candidate = &run[i..];
                if !candidate.is_empty() && after.starts_with(candidate) {
                    return Some(candidate.to_string());
                }
            }
            rest = &rest[pos + infix.len()..];
        }
    }
    None
}

/// Collapse `XになるX` to `X`, where X is the longest word run that appears
/// on both sides of the infix
///
/// The regex crate has no back-references, so the duplicate is located by
/// comparing the word run before the infix against the text after it,
/// longest suffix first.
fn collapse_infix_repetition(text: &str, infix: &str) -> Option<String> {
    let mut result = String::new();
    let mut rest = text;
    let mut changed = false;

    while let Some(pos) = rest.find(infix) {
        let prefix = &rest[..pos];
        let run_start = prefix
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_word_char(*c))
            .last()
            .map(|(i, _)| i)
            .unwrap_or(pos);
        let run = &prefix[run_start..];
        let after = &rest[pos + infix.len()..];

        let mut collapsed_at = None;
        for (i, _) in run.char_indices() {
            let candidate = &run[i..];
            if !candidate.is_empty() && after.starts_with(candidate) {
                collapsed_at = Some(candidate.len());
                break;
            }
        }

        match collapsed_at {
            Some(len) => {
                result.push_str(&rest[..pos]);
                rest = &after[len..];
                changed = true;
            }
            None => {
                result.push_str(&rest[..pos + infix.len()]);
                rest = &rest[pos + infix.len()..];
            }
        }
    }

    if changed {
        result.push_str(rest);
        Some(result)
    } else {
        None
    }
}

/// Collapse a whitespace-separated immediate duplicate (`X X ` → `X `)
///
/// The duplicate must be followed by further whitespace, matching the
/// reference behavior of only collapsing mid-text repeats.
fn collapse_spaced_duplicates(text: &str) -> Option<String> {
    use super::dictionary::WORD_RUN_RE;

    let runs: Vec<(usize, usize, &str)> = WORD_RUN_RE
        .find_iter(text)
        .map(|m| (m.start(), m.end(), m.as_str()))
        .collect();

    let mut result = String::new();
    let mut copied_to = 0;
    let mut changed = false;
    let mut i = 0;

    while i + 1 < runs.len() {
        let (s1, e1, w1) = runs[i];
        let (s2, e2, w2) = runs[i + 1];
        let gap = &text[e1..s2];
        let followed_by_space = text[e2..].chars().next().is_some_and(char::is_whitespace);

        if w1 == w2 && !gap.is_empty() && gap.chars().all(char::is_whitespace) && followed_by_space
        {
            result.push_str(&text[copied_to..s1]);
            result.push_str(w1);
            copied_to = e2;
            changed = true;
            i += 2;
        } else {
            i += 1;
        }
    }

    if changed {
        result.push_str(&text[copied_to..]);
        Some(result)
    } else {
        None
    }
}

/// Insert a sentence-ending mark after completed polite endings
///
/// Fires when the ending is immediately followed by kana or alphanumeric
/// text, and when the ending closes the segment without punctuation.
fn insert_sentence_breaks(text: &str) -> Option<String> {
    let mut result = String::new();
    let mut copied_to = 0;
    let mut changed = false;

    for m in POLITE_ENDING_RE.find_iter(text) {
        let following = &text[m.end()..];
        let needs_break = match following.chars().next() {
            None => true,
            Some(c) => {
                ('あ'..='ん').contains(&c) || c.is_ascii_alphanumeric()
            }
        };
        if needs_break {
            result.push_str(&text[copied_to..m.end()]);
            result.push('。');
            copied_to = m.end();
            changed = true;
        }
    }

    if changed {
        result.push_str(&text[copied_to..]);
        Some(result)
    } else {
        None
    }
}

/// Collapse repeated whitespace, drop space before punctuation, trim ends
fn normalize(text: &str) -> String {
    let collapsed = MULTI_SPACE_RE.replace_all(text, " ");
    let tightened = SPACE_BEFORE_PUNCT_RE.replace_all(&collapsed, "$1");
    tightened.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(text: &str) -> CorrectionOutcome {
        RuleSet::builtin().apply(text, &PipelineConfig::default())
    }

    #[test]
    fn test_truncated_endings_repaired_and_punctuated() {
        let outcome = apply("申しすございす");

        assert_eq!(outcome.text, "申します。ございます。");
        assert_eq!(
            outcome.corrections,
            vec![
                CorrectionCategory::EndingFix,
                CorrectionCategory::EndingFix,
                CorrectionCategory::Punctuation,
            ]
        );
    }

    #[test]
    fn test_technical_term_replacement() {
        let outcome = apply("ベルト");
        assert_eq!(outcome.text, "ベルトン");
        assert!(outcome
            .corrections
            .contains(&CorrectionCategory::TechnicalTerm));

        let outcome = apply("ジーピーティー");
        assert_eq!(outcome.text, "GPT");
    }

    #[test]
    fn test_infix_repetition_collapsed() {
        let outcome = apply("本日ですねDay2になるDay2の講座です");

        assert!(outcome.text.contains("Day2の講座"));
        assert!(!outcome.text.contains("Day2になるDay2"));
        assert!(outcome
            .corrections
            .contains(&CorrectionCategory::RepetitionRemoval));
    }

    #[test]
    fn test_spaced_duplicate_collapsed() {
        let outcome = apply("これは 講座 講座 です");

        assert!(outcome.text.contains("講座 です"));
        assert!(!outcome.text.contains("講座 講座"));
        assert!(outcome
            .corrections
            .contains(&CorrectionCategory::RepetitionRemoval));
    }

    #[test]
    fn test_filler_removal() {
        let outcome = apply("えーと申します");
        // The hesitation run is stripped and the gap normalized away
        assert!(!outcome.text.contains("えー"));
        assert!(outcome
            .corrections
            .contains(&CorrectionCategory::FillerRemoval));
    }

    #[test]
    fn test_naturalization() {
        let outcome = apply("面白いっていう話");
        assert!(outcome.text.contains("という話"));
        assert!(outcome
            .corrections
            .contains(&CorrectionCategory::Naturalization));
    }

    #[test]
    fn test_no_break_inserted_before_existing_punctuation() {
        let outcome = apply("よろしくお願いします、と思います。");
        // 思います is already followed by punctuation; no double mark
        assert!(!outcome.text.contains("。。"));
    }

    #[test]
    fn test_stage_toggles_skip_stages() {
        let config = PipelineConfig {
            punctuation: false,
            ending_fixes: false,
            ..PipelineConfig::default()
        };
        let outcome = RuleSet::builtin().apply("申しすございす", &config);

        assert_eq!(outcome.text, "申しすございす");
        assert!(outcome.corrections.is_empty());
    }

    #[test]
    fn test_normalization_collapses_whitespace() {
        let outcome = apply("本日は  講座 。です");
        assert!(!outcome.text.contains("  "));
        assert!(outcome.text.contains("講座。"));
    }

    #[test]
    fn test_find_duplicate_phrase() {
        assert_eq!(
            find_duplicate_phrase("本日ですねDay2になるDay2の講座"),
            Some("Day2".to_string())
        );
        assert_eq!(find_duplicate_phrase("本日の講座になります"), None);
        assert_eq!(find_duplicate_phrase(""), None);
    }

    #[test]
    fn test_custom_terms_merged() {
        let mut rules = RuleSet::builtin();
        rules.merge_custom_terms([("Googleコラボ", "Google Colab")]);
        let outcome = rules.apply("Googleコラボを使います", &PipelineConfig::default());

        assert!(outcome.text.contains("Google Colab"));
        assert!(outcome
            .corrections
            .contains(&CorrectionCategory::TechnicalTerm));
    }

    #[test]
    fn test_custom_expansion_does_not_rematch_expanded_form() {
        let mut rules = RuleSet::builtin();
        rules.merge_custom_terms([("岩澤研", "岩澤研究室")]);

        let outcome = rules.apply("岩澤研 です", &PipelineConfig::default());
        assert!(outcome.text.contains("岩澤研究室 です"));

        // Already-expanded text is left alone
        let outcome = rules.apply("岩澤研究室 です", &PipelineConfig::default());
        assert_eq!(outcome.text, "岩澤研究室 です");
        assert!(outcome.corrections.is_empty());
    }

    #[test]
    fn test_identity_custom_entry_is_dropped() {
        let mut rules = RuleSet::builtin();
        rules.merge_custom_terms([("ベルトン", "ベルトン")]);
        let outcome = rules.apply("ベルトン", &PipelineConfig::default());

        assert_eq!(outcome.text, "ベルトン");
        assert!(outcome.corrections.is_empty());
    }
}
