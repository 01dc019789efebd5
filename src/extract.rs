//! Template-driven field extraction from classified candidates

use tracing::{debug, info, warn};

use crate::constants::OPCODE_PREFIX;
use crate::error::{AnalysisError, Result};
use crate::normalize::{normalize_ops, small_int_numeral, split_op};
use crate::secret::SecretRuleTable;
use crate::template::TemplateCatalog;
use crate::types::*;

/// ExtractData: 𝒫𝒞 × 𝒯ℱ* × Chain → ℋ𝒯ℒ𝒞 ∪ {NoMatchingTemplate}
///
/// 1. Normalize the candidate's ops exactly as classification does
/// 2. Find the template with an identical signature
/// 3. Decode the locktime (payload, or the numeral of a small-integer push)
/// 4. Decode branch-1 public-key hashes and the branch-2 public key
/// 5. Decode the secret hashes
/// 6. Locate the secret(s) in the trace with the type's rule
pub fn extract_htlc(
    pc: &ProcessedCandidate,
    templates: &TemplateCatalog,
    rules: &SecretRuleTable,
    chain: Chain,
) -> Result<ExtractedHtlc> {
    let signature = normalize_ops(&pc.ops, chain);

    let template = templates.find(&signature).ok_or_else(|| {
        AnalysisError::NoMatchingTemplate(format!(
            "{} tx {} ({} ops)",
            chain,
            pc.candidate.transaction,
            signature.len()
        ))
    })?;

    let timelock = decode_locktime(&pc.ops[template.locktime_pos]);

    let pub_key_hashes1 = template
        .public_keys1_pos
        .iter()
        .map(|&pos| payload_or_op(&pc.ops[pos]))
        .collect();
    let pub_key_hash2 = payload_or_op(&pc.ops[template.public_key2_pos]);

    let secret_hashes = template
        .secrethash_pos
        .iter()
        .map(|&pos| payload_or_op(&pc.ops[pos]))
        .collect();

    let secrets = match rules.get(&template.name) {
        Some(rule) => rule.locate(&pc.candidate.asm)?,
        None => {
            warn!(type_name = %template.name, "no secret rule for type");
            Vec::new()
        }
    };

    debug!(
        chain = %chain,
        tx = %pc.candidate.transaction,
        type_name = %template.name,
        "extracted htlc"
    );

    Ok(ExtractedHtlc {
        chain,
        block: pc.candidate.block,
        timestamp: pc.candidate.timestamp.clone(),
        transaction: pc.candidate.transaction.clone(),
        input_tx: pc.candidate.input_tx.clone(),
        input_value: pc.candidate.input_value,
        type_name: template.name.clone(),
        timelock,
        pub_key_hashes1,
        pub_key_hash2,
        secrets,
        secret_hashes,
    })
}

/// Extract every candidate of one ledger, dropping those without a template.
///
/// Any other error aborts the batch so no partial output is produced.
pub fn extract_batch(
    candidates: &[ProcessedCandidate],
    templates: &TemplateCatalog,
    rules: &SecretRuleTable,
    chain: Chain,
) -> Result<Vec<ExtractedHtlc>> {
    let mut htlcs = Vec::new();
    let mut skipped = 0usize;

    for pc in candidates {
        match extract_htlc(pc, templates, rules, chain) {
            Ok(htlc) => htlcs.push(htlc),
            Err(e) if e.is_recoverable() => {
                debug!("skipping candidate: {}", e);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        chain = %chain,
        extracted = htlcs.len(),
        skipped,
        "extraction finished"
    );

    Ok(htlcs)
}

/// Locktime is either pushed data or a small-integer opcode (`OP_12` → `12`).
///
/// Templates are checked at load time to point at a push, so the fallback only
/// strips the opcode prefix.
fn decode_locktime(op: &str) -> String {
    match split_op(op) {
        (_, Some(payload)) => payload.to_string(),
        (mnemonic, None) => small_int_numeral(mnemonic)
            .or_else(|| mnemonic.strip_prefix(OPCODE_PREFIX))
            .unwrap_or(mnemonic)
            .to_string(),
    }
}

/// Pushed payload, or the bare mnemonic when the op pushes nothing
fn payload_or_op(op: &str) -> String {
    match split_op(op) {
        (_, Some(payload)) => payload.to_string(),
        (mnemonic, None) => mnemonic.to_string(),
    }
}
