//! Batch stages over the configured ledgers
//!
//! Each stage reads its inputs completely, computes in memory, and only then
//! writes its outputs, so a failing stage writes nothing.

use std::path::Path;
use tracing::info;

use crate::classify::{classify_batch, Classification, TypeCatalog};
use crate::config::PipelineConfig;
use crate::correlate::correlate;
use crate::error::Result;
use crate::extract::extract_batch;
use crate::filter::{filter_candidates, FilterRule};
use crate::io::{read_json, read_json_or_default, write_json_all_atomic, write_json_atomic};
use crate::secret::SecretRuleTable;
use crate::template::TemplateCatalog;
use crate::types::*;

/// Filter one candidate file into another
pub fn run_filter(input: &Path, output: &Path, rule: FilterRule) -> Result<usize> {
    let candidates: Vec<ProcessedCandidate> = read_json(input)?;
    let kept = filter_candidates(candidates, rule);
    write_json_atomic(output, &kept)?;
    Ok(kept.len())
}

/// Classify every configured ledger in order, extending the stored catalog
pub fn run_classification(config: &PipelineConfig) -> Result<TypeCatalog> {
    let mut catalog: TypeCatalog = read_json_or_default(&config.types_path)?;
    let known = catalog.len();

    for input in &config.chains {
        let candidates: Vec<ProcessedCandidate> = read_json(&input.candidates)?;
        let (next, assignments) = classify_batch(&candidates, catalog, input.chain);
        catalog = next;

        let minted = assignments
            .iter()
            .filter(|c| matches!(c, Classification::New(_)))
            .count();
        info!(
            chain = %input.chain,
            candidates = candidates.len(),
            new_types = minted,
            "classification finished"
        );
    }

    info!("type catalog grew from {} to {}", known, catalog.len());
    write_json_atomic(&config.types_path, &catalog)?;
    Ok(catalog)
}

/// Extract every configured ledger; outputs are written only if all succeed
pub fn run_extraction(config: &PipelineConfig, rules: &SecretRuleTable) -> Result<Vec<LedgerRecords>> {
    let templates: TemplateCatalog = read_json(&config.templates_path)?;
    info!("loaded {} field templates", templates.len());

    let mut ledgers = Vec::with_capacity(config.chains.len());
    for input in &config.chains {
        let candidates: Vec<ProcessedCandidate> = read_json(&input.candidates)?;
        let htlcs = extract_batch(&candidates, &templates, rules, input.chain)?;
        ledgers.push(LedgerRecords::new(input.chain, htlcs));
    }

    let outputs: Vec<(&Path, &Vec<ExtractedHtlc>)> = config
        .chains
        .iter()
        .zip(&ledgers)
        .map(|(input, ledger)| (input.extracted.as_path(), &ledger.htlcs))
        .collect();
    write_json_all_atomic(&outputs)?;

    Ok(ledgers)
}

/// Read the extracted records of every configured ledger
pub fn load_extracted(config: &PipelineConfig) -> Result<Vec<LedgerRecords>> {
    config
        .chains
        .iter()
        .map(|input| {
            let htlcs: Vec<ExtractedHtlc> = read_json(&input.extracted)?;
            Ok(LedgerRecords::new(input.chain, htlcs))
        })
        .collect()
}

/// Correlate ledgers into swap pairs and write them
pub fn run_correlation(
    config: &PipelineConfig,
    ledgers: &[LedgerRecords],
) -> Result<Vec<AtomicSwapPair>> {
    let swaps = correlate(ledgers, config.consumption, config.swap_window_secs)?;
    info!(
        scope = ?config.consumption,
        "found {} atomic swap pairs",
        swaps.len()
    );
    write_json_atomic(&config.swaps_path, &swaps)?;
    Ok(swaps)
}
