use once_cell::sync::Lazy;
use regex::Regex;

/// Residual-defect detectors applied to rule-corrected text
///
/// Each pattern captures a known speech-to-text misrecognition the rule
/// stages cannot repair: phonetic confusables, garbled named entities and
/// organization/product name fragments.
static RESIDUAL_DEFECT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[あ-ん]{3,}も",
        r"帰漏らし",
        r"エポック",
        r"簡易回",
        r"バット[^ー]",
        r"お腹切り",
        r"円周部分",
        r"ベルトンさん",
        r"松尾岩澤研",
        r"スレッド1",
        r"Googleコラボ",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("escalation pattern should compile"))
    .collect()
});

/// Decides whether a rule-corrected unit still needs LLM intervention
#[derive(Debug, Clone, Default)]
pub struct EscalationGate;

impl EscalationGate {
    pub fn new() -> Self {
        Self
    }

    /// True when any residual-defect detector matches
    pub fn should_escalate(&self, text: &str) -> bool {
        RESIDUAL_DEFECT_PATTERNS
            .iter()
            .any(|pattern| pattern.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kana_run_confusable_escalates() {
        let gate = EscalationGate::new();
        // Three-or-more-kana run followed by も
        assert!(gate.should_escalate("なんとかかんとかも"));
        assert!(gate.should_escalate("いろいろもあります"));
    }

    #[test]
    fn test_garbled_entities_escalate() {
        let gate = EscalationGate::new();
        assert!(gate.should_escalate("ベルトンさんが担当です"));
        assert!(gate.should_escalate("松尾岩澤研の学生です"));
        assert!(gate.should_escalate("Googleコラボで演習します"));
        assert!(gate.should_escalate("帰漏らしのないように"));
    }

    #[test]
    fn test_clean_text_does_not_escalate() {
        let gate = EscalationGate::new();
        assert!(!gate.should_escalate("本日の講座です。"));
        assert!(!gate.should_escalate(""));
        assert!(!gate.should_escalate("GPTとLLMの話をします。"));
    }
}
