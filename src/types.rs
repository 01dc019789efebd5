//! Core record types for HTLC classification, extraction and swap correlation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::error::AnalysisError;

/// Block height type
pub type Height = i64;

/// Ledgers scanned for HTLC scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Btc,
    Ltc,
    Bch,
    Dcr,
}

impl Chain {
    /// All supported ledgers in their canonical pairing order
    pub const ALL: [Chain; 4] = [Chain::Btc, Chain::Ltc, Chain::Bch, Chain::Dcr];

    /// Lowercase identifier used in extracted records and file names
    pub fn id(&self) -> &'static str {
        match self {
            Chain::Btc => "btc",
            Chain::Ltc => "ltc",
            Chain::Bch => "bch",
            Chain::Dcr => "dcr",
        }
    }

    /// Upper-case ticker used in swap pairs
    pub fn ticker(&self) -> &'static str {
        match self {
            Chain::Btc => "BTC",
            Chain::Ltc => "LTC",
            Chain::Bch => "BCH",
            Chain::Dcr => "DCR",
        }
    }

    /// Whether this ledger renumbers the single-round hash opcode.
    ///
    /// Decred put OP_BLAKE256 where OP_SHA256 normally sits and moved SHA-256
    /// to the OP_UNKNOWN192 slot.
    pub fn remaps_hash_opcodes(&self) -> bool {
        matches!(self, Chain::Dcr)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

impl FromStr for Chain {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "btc" => Ok(Chain::Btc),
            "ltc" => Ok(Chain::Ltc),
            "bch" => Ok(Chain::Bch),
            "dcr" => Ok(Chain::Dcr),
            other => Err(AnalysisError::InvalidConfig(format!("unknown chain '{}'", other))),
        }
    }
}

/// Serialises a [`Chain`] as its upper-case ticker (`"BTC"`)
pub mod ticker {
    use super::Chain;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(chain: &Chain, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(chain.ticker())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Chain, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Candidate: one spending input whose redeem script looks like an HTLC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub block: Height,
    pub timestamp: String,
    pub transaction: String,
    pub input_tx: String,
    pub input_value: f64,
    /// Execution trace; the last element is the redeem script hex
    pub asm: Vec<String>,
}

/// ProcessedCandidate: 𝒫𝒞 = 𝒞 × 𝒪𝓅*
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Disassembled redeem script, `MNEMONIC` or `MNEMONIC payloadhex`
    pub ops: Vec<String>,
}

/// A type catalog entry: a name plus the normalized signature defining it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcType {
    pub name: String,
    pub ops: Vec<String>,
}

/// Curated field positions for one type, indices into its ops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTemplate {
    pub name: String,
    pub length: usize,
    pub secrethash_pos: Vec<usize>,
    pub locktime_pos: usize,
    pub public_keys1_pos: Vec<usize>,
    pub public_key2_pos: usize,
    pub ops: Vec<String>,
}

/// ExtractedHTLC: the economically meaningful fields of one classified script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedHtlc {
    pub chain: Chain,
    pub block: Height,
    pub timestamp: String,
    pub transaction: String,
    pub input_tx: String,
    pub input_value: f64,
    #[serde(rename = "type")]
    pub type_name: String,
    pub timelock: String,
    pub pub_key_hashes1: Vec<String>,
    pub pub_key_hash2: String,
    pub secrets: Vec<String>,
    pub secret_hashes: Vec<String>,
}

impl ExtractedHtlc {
    /// True if at least one preimage was revealed
    pub fn reveals_secret(&self) -> bool {
        self.secrets.iter().any(|s| s != ABSENT_SECRET)
    }
}

/// Two HTLCs on different ledgers locked to the same secret hash(es)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicSwapPair {
    #[serde(with = "ticker")]
    pub chain1: Chain,
    #[serde(rename = "HTLC1")]
    pub htlc1: ExtractedHtlc,
    #[serde(with = "ticker")]
    pub chain2: Chain,
    #[serde(rename = "HTLC2")]
    pub htlc2: ExtractedHtlc,
}

/// The extracted records of one ledger, in discovery order
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRecords {
    pub chain: Chain,
    pub htlcs: Vec<ExtractedHtlc>,
}

impl LedgerRecords {
    pub fn new(chain: Chain, htlcs: Vec<ExtractedHtlc>) -> Self {
        Self { chain, htlcs }
    }
}
