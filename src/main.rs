use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use kosei::{
    AppConfig, CompletionClient, Corrector, NovaClient, NovaConfig, NullClient, analyze_files,
    process_directory, render_report, write_stats, write_transcript,
};

#[derive(Parser)]
#[command(name = "kosei")]
#[command(author, version, about = "Lecture transcript correction pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correct one transcript file
    Correct {
        /// Input transcript file (timestamped plaintext)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the corrected transcript
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write run statistics to this JSON file
        #[arg(long)]
        stats: Option<PathBuf>,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip LLM escalation (rule-only mode)
        #[arg(long)]
        no_llm: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Correct every .txt transcript in a directory
    Batch {
        /// Input directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to "<input>_corrected")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip LLM escalation (rule-only mode)
        #[arg(long)]
        no_llm: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Audit an original transcript against its corrected counterpart
    Diff {
        /// Original transcript file
        #[arg(long)]
        original: PathBuf,

        /// Corrected transcript file
        #[arg(long)]
        corrected: PathBuf,

        /// Write the machine-readable analysis to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "correction_config.json")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Correct {
            input,
            output,
            stats,
            config,
            no_llm,
            verbose,
        } => {
            setup_logging(verbose);
            correct_file(input, output, stats, config, no_llm).await
        }
        Commands::Batch {
            input,
            output,
            config,
            no_llm,
            verbose,
        } => {
            setup_logging(verbose);
            batch_directory(input, output, config, no_llm).await
        }
        Commands::Diff {
            original,
            corrected,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            diff_transcripts(original, corrected, output)
        }
        Commands::InitConfig { path } => {
            setup_logging(false);
            AppConfig::default().save(&path)?;
            info!("Default configuration written to {:?}", path);
            Ok(())
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Build the generation-service client, degrading to rule-only mode when the
/// service is disabled or its credentials are absent
fn build_client(config: &AppConfig, no_llm: bool) -> Box<dyn CompletionClient> {
    if no_llm || !config.system.enable_llm {
        info!("LLM escalation disabled, running rule-only");
        return Box::new(NullClient);
    }

    match std::env::var("AWS_BEARER_TOKEN_BEDROCK") {
        Ok(api_key) => Box::new(NovaClient::new(NovaConfig::new(
            api_key,
            config.system.aws_region.clone(),
            config.system.model_id.clone(),
        ))),
        Err(_) => {
            warn!("AWS_BEARER_TOKEN_BEDROCK not set, running rule-only");
            Box::new(NullClient)
        }
    }
}

async fn correct_file(
    input: PathBuf,
    output: Option<PathBuf>,
    stats_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    no_llm: bool,
) -> Result<()> {
    let config = AppConfig::load_or_default(config_path.as_deref())?;
    let client = build_client(&config, no_llm);
    let mut corrector = Corrector::new(&config, client);

    info!("Loading transcript from {:?}", input);
    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read transcript: {:?}", input))?;

    let segments = corrector.correct_transcript(&content).await;
    let stats = corrector.stats(&segments);

    let output = output.unwrap_or_else(|| default_output_path(&input));
    write_transcript(&segments, &output)?;
    info!("Corrected transcript written to {:?}", output);

    if let Some(path) = stats_path {
        write_stats(&stats, &path)?;
        info!("Statistics written to {:?}", path);
    }

    println!("Segments:        {}", stats.total_segments);
    println!("LLM corrections: {}", stats.llm_usage);
    println!("Average quality: {:.3}", stats.average_quality);
    println!(
        "High quality:    {}/{}",
        stats.high_quality_count, stats.total_segments
    );
    println!("Estimated cost:  {:.2} JPY", stats.total_cost_jpy);

    Ok(())
}

async fn batch_directory(
    input: PathBuf,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    no_llm: bool,
) -> Result<()> {
    let config = AppConfig::load_or_default(config_path.as_deref())?;
    let client = build_client(&config, no_llm);
    let mut corrector = Corrector::new(&config, client);

    let output = output.unwrap_or_else(|| {
        let mut name = input.as_os_str().to_os_string();
        name.push("_corrected");
        PathBuf::from(name)
    });

    let summary = process_directory(&mut corrector, &input, &output).await?;

    println!(
        "Files processed: {} ({} failed)",
        summary.files_processed, summary.files_failed
    );
    println!("Segments:        {}", summary.stats.total_segments);
    println!("LLM corrections: {}", summary.stats.llm_usage);
    println!("Average quality: {:.3}", summary.stats.average_quality);
    println!("Estimated cost:  {:.2} JPY", summary.stats.total_cost_jpy);
    println!("Input tokens:    {}", summary.stats.input_tokens);
    println!("Output tokens:   {}", summary.stats.output_tokens);

    Ok(())
}

fn diff_transcripts(
    original: PathBuf,
    corrected: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let analysis = analyze_files(&original, &corrected)?;

    print!("{}", render_report(&analysis));

    if let Some(path) = output {
        analysis.write_json(&path)?;
        info!("Analysis written to {:?}", path);
    }

    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("transcript");
    input.with_file_name(format!("{}_corrected.txt", stem))
}
