//! htlc-swaps CLI tool
//!
//! Runs the classification, extraction and correlation stages over batch files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use htlc_swaps::filter::FilterRule;
use htlc_swaps::pipeline;
use htlc_swaps::{ConsumptionScope, PipelineConfig, SwapAnalyzer};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "htlc-swaps")]
#[command(about = "Detect atomic swaps from HTLC scripts across ledgers")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep only candidates with an equality check, a branch and a signature check
    Filter {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Apply the scanner rule instead: non-standard script with a locktime and a hash opcode
        #[arg(long)]
        detect: bool,
    },
    /// Extend the type catalog from every configured ledger
    Classify {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Extract HTLC fields using the curated templates
    Extract {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Pair extracted HTLCs into atomic swaps
    Correlate {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Let each HTLC take part in at most one swap per run
        #[arg(long)]
        global: bool,
    },
    /// Extract, then correlate
    Run {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Commands::Filter { input, output, detect } => {
            let rule = if detect { FilterRule::TimelockHashlock } else { FilterRule::HtlcShape };
            let kept = pipeline::run_filter(&input, &output, rule)
                .with_context(|| format!("Failed to filter {}", input.display()))?;
            info!("wrote {} candidates to {}", kept, output.display());
        }
        Commands::Classify { config } => {
            let config = load_config(config.as_deref())?;
            let catalog = pipeline::run_classification(&config).context("Classification failed")?;
            info!("{} types in {}", catalog.len(), config.types_path.display());
        }
        Commands::Extract { config } => {
            let config = load_config(config.as_deref())?;
            let analyzer = SwapAnalyzer::from_config(&config)?;
            pipeline::run_extraction(&config, analyzer.rules()).context("Extraction failed")?;
        }
        Commands::Correlate { config, global } => {
            let mut config = load_config(config.as_deref())?;
            if global {
                config.consumption = ConsumptionScope::Global;
            }
            let ledgers = pipeline::load_extracted(&config).context("Failed to load extracted HTLCs")?;
            pipeline::run_correlation(&config, &ledgers).context("Correlation failed")?;
        }
        Commands::Run { config } => {
            let config = load_config(config.as_deref())?;
            let analyzer = SwapAnalyzer::from_config(&config)?;
            let ledgers =
                pipeline::run_extraction(&config, analyzer.rules()).context("Extraction failed")?;
            pipeline::run_correlation(&config, &ledgers).context("Correlation failed")?;
        }
    }

    info!("All done.");
    Ok(())
}
