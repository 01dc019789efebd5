//! Pipeline configuration
//!
//! Loaded from a JSON file; every field has a default reproducing the
//! four-ledger layout (BTC, LTC, BCH, DCR) and file names of a standard run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::constants::SWAP_WINDOW_SECS;
use crate::correlate::{check_window, ConsumptionScope};
use crate::error::{AnalysisError, Result};
use crate::types::Chain;

/// Per-ledger input and output files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInput {
    pub chain: Chain,
    /// Pre-filtered, disassembled candidates
    pub candidates: PathBuf,
    /// Extracted HTLC records
    pub extracted: PathBuf,
}

impl ChainInput {
    /// Conventional file names for a ledger, e.g. `filteredHTLCsBTC.json`
    pub fn standard(chain: Chain) -> Self {
        Self {
            chain,
            candidates: PathBuf::from(format!("filteredHTLCs{}.json", chain.ticker())),
            extracted: PathBuf::from(format!("realHTLCs{}.json", chain.ticker())),
        }
    }

    fn within(mut self, dir: &Path) -> Self {
        self.candidates = dir.join(&self.candidates);
        self.extracted = dir.join(&self.extracted);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ledgers in pairing order
    pub chains: Vec<ChainInput>,
    /// Type catalog read and extended by classification
    pub types_path: PathBuf,
    /// Curated field templates read by extraction
    pub templates_path: PathBuf,
    /// Correlated swap pairs
    pub swaps_path: PathBuf,
    pub consumption: ConsumptionScope,
    pub swap_window_secs: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chains: Chain::ALL.iter().copied().map(ChainInput::standard).collect(),
            types_path: PathBuf::from("types.json"),
            templates_path: PathBuf::from("filteredTypes.json"),
            swaps_path: PathBuf::from("AS.json"),
            consumption: ConsumptionScope::default(),
            swap_window_secs: SWAP_WINDOW_SECS,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let config: PipelineConfig = crate::io::read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Default layout with every file placed under `dir`
    pub fn in_dir(dir: &Path) -> Self {
        let defaults = Self::default();
        Self {
            chains: defaults.chains.into_iter().map(|c| c.within(dir)).collect(),
            types_path: dir.join(defaults.types_path),
            templates_path: dir.join(defaults.templates_path),
            swaps_path: dir.join(defaults.swaps_path),
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_window(self.swap_window_secs)?;

        let mut seen = HashSet::new();
        for input in &self.chains {
            if !seen.insert(input.chain) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "chain {} configured twice",
                    input.chain
                )));
            }
        }

        Ok(())
    }
}
