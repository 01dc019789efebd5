//! Type classification: cluster normalized signatures into a growing catalog

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::{normalize_ops, signatures_match};
use crate::types::*;

/// Prefix of sequentially assigned type names (`Type 1`, `Type 2`, ...)
pub const TYPE_NAME_PREFIX: &str = "Type ";

/// Append-only catalog of known HTLC types, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCatalog {
    types: Vec<HtlcType>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_types(types: Vec<HtlcType>) -> Self {
        Self { types }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn types(&self) -> &[HtlcType] {
        &self.types
    }

    pub fn into_types(self) -> Vec<HtlcType> {
        self.types
    }

    /// First entry (in catalog order) whose signature equals `signature`
    pub fn find(&self, signature: &[String]) -> Option<&HtlcType> {
        self.types.iter().find(|t| signatures_match(&t.ops, signature))
    }

    /// Name the next minted type would receive
    fn next_name(&self) -> String {
        format!("{}{}", TYPE_NAME_PREFIX, self.types.len() + 1)
    }
}

/// Outcome of classifying one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Signature already catalogued under this name
    Known(String),
    /// Signature was new and appended under this name
    New(String),
}

impl Classification {
    pub fn type_name(&self) -> &str {
        match self {
            Classification::Known(name) | Classification::New(name) => name,
        }
    }
}

/// RegisterType: 𝒫𝒞 × 𝒯* × Chain → 𝒯*
///
/// 1. Normalize the candidate's ops for `chain`
/// 2. First-fit scan of the catalog for an equal signature
/// 3. If none matches, append a new entry named after the catalog size
pub fn classify(
    pc: &ProcessedCandidate,
    mut catalog: TypeCatalog,
    chain: Chain,
) -> (TypeCatalog, Classification) {
    let signature = normalize_ops(&pc.ops, chain);

    if let Some(existing) = catalog.find(&signature) {
        let name = existing.name.clone();
        return (catalog, Classification::Known(name));
    }

    let name = catalog.next_name();
    debug!(
        chain = %chain,
        tx = %pc.candidate.transaction,
        length = signature.len(),
        "registered new type {}", name
    );
    catalog.types.push(HtlcType {
        name: name.clone(),
        ops: signature,
    });

    (catalog, Classification::New(name))
}

/// Classify a whole batch in order, returning the grown catalog and one
/// assignment per candidate
pub fn classify_batch(
    candidates: &[ProcessedCandidate],
    catalog: TypeCatalog,
    chain: Chain,
) -> (TypeCatalog, Vec<Classification>) {
    let mut catalog = catalog;
    let mut assignments = Vec::with_capacity(candidates.len());

    for pc in candidates {
        let (next, classification) = classify(pc, catalog, chain);
        catalog = next;
        assignments.push(classification);
    }

    (catalog, assignments)
}
