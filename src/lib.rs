//! # HTLC Swaps
//!
//! Detection of cross-ledger atomic swaps from hashed-timelock-contract scripts.
//!
//! The crate consumes spending inputs whose redeem scripts were already
//! disassembled, and works in three pure stages:
//! - classification of normalized opcode sequences into a growing type catalog
//! - template-driven extraction of locktime, key hashes, secret hashes and secrets
//! - correlation of extracted records on two ledgers into atomic swap pairs
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every stage is a deterministic transformation of its inputs
//! 2. **Explicit State**: the type catalog is passed in and returned, never global
//! 3. **Curated Templates**: field positions come from a read-only template table
//! 4. **All-or-Nothing Outputs**: batch files are replaced atomically
//!
//! ## Usage
//!
//! ```rust
//! use htlc_swaps::SwapAnalyzer;
//! use htlc_swaps::types::*;
//!
//! let analyzer = SwapAnalyzer::new();
//! let pc = ProcessedCandidate {
//!     candidate: Candidate {
//!         block: 540000,
//!         timestamp: "2018-09-01 12:00:00 +0000 UTC".to_string(),
//!         transaction: "spend".to_string(),
//!         input_tx: "fund".to_string(),
//!         input_value: 0.01,
//!         asm: vec!["sig".into(), "secret".into(), "1".into(), "script".into()],
//!     },
//!     ops: vec!["OP_IF".into(), "OP_SHA256".into(), "OP_DATA_32 ab".into(), "OP_ENDIF".into()],
//! };
//! let (catalog, class) = analyzer.classify(&pc, Default::default(), Chain::Btc);
//! assert_eq!(catalog.len(), 1);
//! assert_eq!(class.type_name(), "Type 1");
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod normalize;
pub mod classify;
pub mod template;
pub mod secret;
pub mod extract;
pub mod correlate;
pub mod filter;
pub mod config;
pub mod io;
pub mod pipeline;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{AnalysisError, Result};
pub use classify::{Classification, TypeCatalog};
pub use template::TemplateCatalog;
pub use secret::{BranchCondition, SecretRule, SecretRuleTable};
pub use correlate::ConsumptionScope;
pub use config::PipelineConfig;

/// Entry point bundling the secret rule table and correlation settings
///
/// # Examples
///
/// ```
/// use htlc_swaps::{SwapAnalyzer, ConsumptionScope};
///
/// let analyzer = SwapAnalyzer::new().with_consumption(ConsumptionScope::Global);
/// assert_eq!(analyzer.consumption(), ConsumptionScope::Global);
/// ```
#[derive(Debug, Clone)]
pub struct SwapAnalyzer {
    rules: SecretRuleTable,
    consumption: ConsumptionScope,
    swap_window_secs: i64,
}

impl Default for SwapAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapAnalyzer {
    /// Analyzer with the built-in secret rules, per-pair consumption and a one-day window
    pub fn new() -> Self {
        Self {
            rules: SecretRuleTable::default(),
            consumption: ConsumptionScope::default(),
            swap_window_secs: SWAP_WINDOW_SECS,
        }
    }

    /// Analyzer matching a pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new()
            .with_consumption(config.consumption)
            .with_swap_window(config.swap_window_secs)
    }

    pub fn with_rules(mut self, rules: SecretRuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_consumption(mut self, consumption: ConsumptionScope) -> Self {
        self.consumption = consumption;
        self
    }

    /// Replace the swap window; it must be at least one second
    ///
    /// ```
    /// use htlc_swaps::{AnalysisError, SwapAnalyzer};
    ///
    /// assert!(SwapAnalyzer::new().with_swap_window(3600).is_ok());
    /// let err = SwapAnalyzer::new().with_swap_window(0).unwrap_err();
    /// assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    /// ```
    pub fn with_swap_window(mut self, secs: i64) -> Result<Self> {
        correlate::check_window(secs)?;
        self.swap_window_secs = secs;
        Ok(self)
    }

    pub fn rules(&self) -> &SecretRuleTable {
        &self.rules
    }

    pub fn consumption(&self) -> ConsumptionScope {
        self.consumption
    }

    /// Classify one candidate against the catalog, returning the updated catalog
    pub fn classify(
        &self,
        pc: &ProcessedCandidate,
        catalog: TypeCatalog,
        chain: Chain,
    ) -> (TypeCatalog, Classification) {
        classify::classify(pc, catalog, chain)
    }

    /// Extract one candidate's fields
    ///
    /// # Examples
    ///
    /// ```
    /// use htlc_swaps::{SwapAnalyzer, TemplateCatalog, AnalysisError};
    /// use htlc_swaps::types::*;
    ///
    /// let analyzer = SwapAnalyzer::new();
    /// let templates = TemplateCatalog::new(vec![]).unwrap();
    /// let pc = ProcessedCandidate {
    ///     candidate: Candidate {
    ///         block: 1,
    ///         timestamp: "2020-01-01 00:00:00 +0000 UTC".to_string(),
    ///         transaction: "tx".to_string(),
    ///         input_tx: "in".to_string(),
    ///         input_value: 1.0,
    ///         asm: vec![],
    ///     },
    ///     ops: vec!["OP_CHECKSIG".into()],
    /// };
    ///
    /// // Unknown shapes are reported, not fatal
    /// let err = analyzer.extract(&pc, &templates, Chain::Ltc).unwrap_err();
    /// assert!(matches!(err, AnalysisError::NoMatchingTemplate(_)));
    /// assert!(err.is_recoverable());
    /// ```
    pub fn extract(
        &self,
        pc: &ProcessedCandidate,
        templates: &TemplateCatalog,
        chain: Chain,
    ) -> Result<ExtractedHtlc> {
        extract::extract_htlc(pc, templates, &self.rules, chain)
    }

    /// Extract a ledger's batch, skipping candidates without a template
    pub fn extract_batch(
        &self,
        candidates: &[ProcessedCandidate],
        templates: &TemplateCatalog,
        chain: Chain,
    ) -> Result<Vec<ExtractedHtlc>> {
        extract::extract_batch(candidates, templates, &self.rules, chain)
    }

    /// Pair records across ledgers
    pub fn correlate(&self, ledgers: &[LedgerRecords]) -> Result<Vec<AtomicSwapPair>> {
        correlate::correlate(ledgers, self.consumption, self.swap_window_secs)
    }
}
