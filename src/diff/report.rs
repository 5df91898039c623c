use super::analyzer::DiffAnalysis;

/// Number of exemplar segments shown in the report
const EXEMPLAR_LIMIT: usize = 3;
/// Minimum quality for a segment to be shown as an exemplar
const EXEMPLAR_MIN_QUALITY: f64 = 0.7;

/// Render the human-readable audit report
pub fn render_report(analysis: &DiffAnalysis) -> String {
    let mut report = String::new();

    report.push_str("Transcript Correction Audit\n");
    report.push_str("===========================\n");

    let total = analysis.segments.len();
    if total == 0 {
        report.push_str("No pairable segments found.\n");
        return report;
    }

    report.push_str(&format!("Segments analyzed: {}\n", total));
    if analysis.unpaired_segments > 0 {
        report.push_str(&format!(
            "Unpaired segments (length mismatch, not analyzed): {}\n",
            analysis.unpaired_segments
        ));
    }
    report.push_str(&format!(
        "Average quality: {:.3}\n",
        analysis.average_quality()
    ));
    report.push_str(&format!(
        "Average readability delta: {:+.3}\n",
        analysis.average_readability_delta()
    ));
    report.push_str(&format!(
        "Character delta: {:+} chars\n",
        analysis.overall.character_delta
    ));
    report.push_str(&format!(
        "Sentence count delta: {:+}\n",
        analysis.overall.sentence_count_delta
    ));
    report.push_str(&format!(
        "Punctuation density delta: {:+.4}\n\n",
        analysis.overall.punctuation_density_delta
    ));

    report.push_str("Quality Distribution\n");
    report.push_str("--------------------\n");
    let dist = &analysis.distribution;
    for (label, count) in [
        ("excellent (>= 0.8)", dist.excellent),
        ("good      (>= 0.6)", dist.good),
        ("fair      (>= 0.4)", dist.fair),
        ("poor      (< 0.4)", dist.poor),
    ] {
        report.push_str(&format!(
            "{}: {} ({:.1}%)\n",
            label,
            count,
            count as f64 / total as f64 * 100.0
        ));
    }
    report.push('\n');

    report.push_str("Corrections Detected\n");
    report.push_str("--------------------\n");
    if analysis.category_totals.is_empty() {
        report.push_str("(none)\n");
    }
    for (category, count) in &analysis.category_totals {
        report.push_str(&format!("{}: {}\n", category, count));
    }
    report.push('\n');

    let exemplars: Vec<_> = analysis
        .segments
        .iter()
        .filter(|s| s.quality_score >= EXEMPLAR_MIN_QUALITY)
        .take(EXEMPLAR_LIMIT)
        .collect();

    if !exemplars.is_empty() {
        report.push_str("Exemplar Segments\n");
        report.push_str("-----------------\n");
        for segment in exemplars {
            report.push_str(&format!(
                "#{} [{} - {}] quality {:.3}, similarity {:.3}\n",
                segment.segment_id,
                segment.start_time,
                segment.end_time,
                segment.quality_score,
                segment.text_similarity
            ));
            if segment.significant_changes.is_empty() {
                report.push_str("  changes: minor cleanup\n");
            } else {
                report.push_str(&format!(
                    "  changes: {}\n",
                    segment.significant_changes.join("; ")
                ));
            }
            report.push_str(&format!("  before:  {}\n", segment.original_preview));
            report.push_str(&format!("  after:   {}\n\n", segment.corrected_preview));
        }
    }

    report
}
