pub mod batch;
pub mod config;
pub mod corrector;
pub mod diff;
pub mod io;
pub mod llm;
pub mod models;
pub mod rules;
pub mod scoring;

pub use batch::{BatchSummary, process_directory};
pub use config::AppConfig;
pub use corrector::Corrector;
pub use diff::{DiffAnalysis, analyze, analyze_files, render_report};
pub use io::{
    parse_transcript, parse_transcript_file, render_transcript, write_stats, write_transcript,
};
pub use llm::{
    CompletionClient, EscalationGate, GenerationParams, LlmError, NovaClient, NovaConfig,
    NullClient, build_correction_instruction,
};
pub use models::{CorrectionCategory, RunAccounting, RunStats, Segment, SourceSegment};
pub use rules::{CorrectionRule, PipelineConfig, RuleSet};
pub use scoring::{ScoreVariant, score};
