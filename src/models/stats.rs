use serde::{Deserialize, Serialize};

use super::Segment;

/// Price per 1,000 input tokens in USD (Nova Micro)
pub const INPUT_RATE_PER_1K: f64 = 0.000035;
/// Price per 1,000 output tokens in USD (Nova Micro)
pub const OUTPUT_RATE_PER_1K: f64 = 0.00014;
/// Conversion rate used for the display currency
pub const JPY_PER_USD: f64 = 150.0;

/// Token and cost counters for one processing session
///
/// Owned by the session corrector and threaded through every adapter call;
/// counters only ever increase within a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunAccounting {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Accumulated cost in USD
    pub total_cost: f64,
}

impl RunAccounting {
    /// Record one service call and return its incremental cost in USD
    pub fn record(&mut self, input_tokens: u64, output_tokens: u64) -> f64 {
        self.total_input_tokens += input_tokens;
        self.total_output_tokens += output_tokens;
        let call_cost = input_tokens as f64 * INPUT_RATE_PER_1K / 1000.0
            + output_tokens as f64 * OUTPUT_RATE_PER_1K / 1000.0;
        self.total_cost += call_cost;
        call_cost
    }

    /// Session cost converted to the display currency
    pub fn total_cost_jpy(&self) -> f64 {
        self.total_cost * JPY_PER_USD
    }
}

/// Persisted statistics for one correction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub total_segments: usize,
    /// Number of segments the generation service actually changed
    pub llm_usage: usize,
    pub average_quality: f64,
    /// Segments with quality score above 0.7
    pub high_quality_count: usize,
    /// Session cost in the display currency
    pub total_cost_jpy: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub processing_timestamp: String,
}

impl RunStats {
    /// Aggregate statistics over finished segments
    ///
    /// Empty input yields all-zero counts and averages rather than a
    /// division error.
    pub fn from_segments(segments: &[Segment], accounting: &RunAccounting) -> Self {
        let total_segments = segments.len();
        let average_quality = if total_segments > 0 {
            segments.iter().map(|s| s.quality_score).sum::<f64>() / total_segments as f64
        } else {
            0.0
        };

        Self {
            total_segments,
            llm_usage: segments.iter().filter(|s| s.llm_used).count(),
            average_quality,
            high_quality_count: segments.iter().filter(|s| s.quality_score > 0.7).count(),
            total_cost_jpy: accounting.total_cost_jpy(),
            input_tokens: accounting.total_input_tokens,
            output_tokens: accounting.total_output_tokens,
            processing_timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_segment(quality: f64, llm_used: bool) -> Segment {
        Segment {
            id: 1,
            start_time: "0:00:01".to_string(),
            end_time: "0:00:05".to_string(),
            original_text: "a".to_string(),
            corrected_text: "a".to_string(),
            applied_corrections: vec![],
            quality_score: quality,
            llm_used,
        }
    }

    #[test]
    fn test_record_accumulates_monotonically() {
        let mut accounting = RunAccounting::default();
        let first = accounting.record(1000, 500);
        let second = accounting.record(2000, 0);

        assert_eq!(accounting.total_input_tokens, 3000);
        assert_eq!(accounting.total_output_tokens, 500);
        assert!((first - (0.000035 + 0.00007)).abs() < 1e-12);
        assert!((accounting.total_cost - (first + second)).abs() < 1e-12);
    }

    #[test]
    fn test_cost_jpy_conversion() {
        let mut accounting = RunAccounting::default();
        accounting.record(1_000_000, 0);
        assert!((accounting.total_cost - 0.035).abs() < 1e-9);
        assert!((accounting.total_cost_jpy() - 5.25).abs() < 1e-9);
    }

    #[test]
    fn test_stats_from_empty_input() {
        let stats = RunStats::from_segments(&[], &RunAccounting::default());
        assert_eq!(stats.total_segments, 0);
        assert_eq!(stats.llm_usage, 0);
        assert_eq!(stats.average_quality, 0.0);
        assert_eq!(stats.high_quality_count, 0);
        assert_eq!(stats.total_cost_jpy, 0.0);
    }

    #[test]
    fn test_stats_aggregation() {
        let segments = vec![
            make_segment(0.9, true),
            make_segment(0.5, false),
            make_segment(0.4, false),
        ];
        let stats = RunStats::from_segments(&segments, &RunAccounting::default());

        assert_eq!(stats.total_segments, 3);
        assert_eq!(stats.llm_usage, 1);
        assert_eq!(stats.high_quality_count, 1);
        assert!((stats.average_quality - 0.6).abs() < 1e-9);
    }
}
