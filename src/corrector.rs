//! Session orchestration: rule pass, scoring, escalation decision and the
//! generation-service adapter, applied segment by segment in source order.

use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::io::parse_transcript;
use crate::llm::{
    CompletionClient, EscalationGate, GenerationParams, NullClient, build_correction_instruction,
};
use crate::models::{CorrectionCategory, RunAccounting, RunStats, Segment, SourceSegment};
use crate::rules::{PipelineConfig, RuleSet};
use crate::scoring::{ScoreVariant, score};

/// Flat quality increment for a segment the service actually changed
const LLM_QUALITY_BONUS: f64 = 0.3;

/// One correction session
///
/// Owns the rule tables, the escalation gate, the service client and the
/// token/cost accounting, so concurrent or sequential sessions cannot
/// interfere with each other.
pub struct Corrector {
    rules: RuleSet,
    pipeline_config: PipelineConfig,
    variant: ScoreVariant,
    gate: EscalationGate,
    client: Box<dyn CompletionClient>,
    params: GenerationParams,
    use_threshold: f64,
    cost_tracking: bool,
    max_cost_jpy: f64,
    alert_threshold_jpy: f64,
    cost_alerted: bool,
    pub accounting: RunAccounting,
}

impl Corrector {
    pub fn new(config: &AppConfig, client: Box<dyn CompletionClient>) -> Self {
        let mut rules = RuleSet::builtin();
        rules.merge_custom_terms(config.custom_patterns.entries());

        Self {
            rules,
            pipeline_config: config.pipeline_config(),
            variant: config.correction.scoring,
            gate: EscalationGate::new(),
            client,
            params: config.generation_params(),
            use_threshold: config.llm.use_threshold,
            cost_tracking: config.cost.cost_tracking,
            max_cost_jpy: config.cost.max_cost_per_session,
            alert_threshold_jpy: config.cost.alert_threshold,
            cost_alerted: false,
            accounting: RunAccounting::default(),
        }
    }

    /// Session without a generation service (rule-only mode)
    pub fn rule_only(config: &AppConfig) -> Self {
        Self::new(config, Box::new(NullClient))
    }

    /// Correct a whole transcript, one segment at a time in source order
    pub async fn correct_transcript(&mut self, text: &str) -> Vec<Segment> {
        let sources = parse_transcript(text);
        info!("Processing {} segments", sources.len());

        let mut segments = Vec::with_capacity(sources.len());
        for (index, source) in sources.into_iter().enumerate() {
            let segment = self.correct_segment(index + 1, source).await;
            segments.push(segment);
        }

        segments
    }

    async fn correct_segment(&mut self, id: usize, source: SourceSegment) -> Segment {
        let outcome = self.rules.apply(&source.text, &self.pipeline_config);
        let mut corrected = outcome.text;
        let mut corrections = outcome.corrections;
        let mut quality = score(self.variant, &source.text, &corrected, &corrections);
        let mut llm_used = false;

        if self.needs_escalation(&corrected, quality) {
            debug!("Segment {}: escalating to generation service", id);
            if let Some(reply) = self.try_escalate(&corrected).await {
                corrected = reply;
                corrections.push(CorrectionCategory::ContextCorrection);
                quality = (quality + LLM_QUALITY_BONUS).min(1.0);
                llm_used = true;
            }
        }

        debug!(
            "Segment {}: {} corrections, quality {:.3}, llm_used={}",
            id,
            corrections.len(),
            quality,
            llm_used
        );

        Segment {
            id,
            start_time: source.start_time,
            end_time: source.end_time,
            original_text: source.text,
            corrected_text: corrected,
            applied_corrections: corrections,
            quality_score: quality,
            llm_used,
        }
    }

    /// Escalate when a residual-defect detector fires, or when the rule pass
    /// scored below the configured threshold
    fn needs_escalation(&self, text: &str, quality: f64) -> bool {
        self.gate.should_escalate(text) || quality < self.use_threshold
    }

    /// Call the generation service; `None` means keep the rule-corrected text
    ///
    /// Covers the no-op reply, the cost ceiling and adapter failures; none
    /// of these abort the run.
    async fn try_escalate(&mut self, text: &str) -> Option<String> {
        if self.cost_tracking && self.accounting.total_cost_jpy() >= self.max_cost_jpy {
            warn!(
                "Session cost ceiling reached ({:.2} JPY), skipping escalation",
                self.accounting.total_cost_jpy()
            );
            return None;
        }

        let instruction = build_correction_instruction(text);
        match self.client.correct(&instruction, &self.params).await {
            Ok(completion) => {
                let call_cost =
                    self.accounting.record(completion.input_tokens, completion.output_tokens);
                debug!(
                    "Service call: {} input / {} output tokens, cost {:.4} JPY",
                    completion.input_tokens,
                    completion.output_tokens,
                    call_cost * crate::models::JPY_PER_USD
                );

                if self.cost_tracking
                    && !self.cost_alerted
                    && self.accounting.total_cost_jpy() >= self.alert_threshold_jpy
                {
                    warn!(
                        "Session cost passed alert threshold: {:.2} JPY",
                        self.accounting.total_cost_jpy()
                    );
                    self.cost_alerted = true;
                }

                if completion.text == text {
                    debug!("Service reply unchanged, keeping rule-corrected text");
                    None
                } else {
                    Some(completion.text)
                }
            }
            Err(e) => {
                warn!("Generation service failed, keeping rule-corrected text: {}", e);
                None
            }
        }
    }

    /// Aggregate run statistics for finished segments
    pub fn stats(&self, segments: &[Segment]) -> RunStats {
        RunStats::from_segments(segments, &self.accounting)
    }
}
