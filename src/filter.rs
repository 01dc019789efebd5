//! Coarse script filters applied before classification
//!
//! These work on disassembled mnemonics only; payloads are ignored.

use tracing::info;

use crate::normalize::{is_small_int_push, strip_payload};
use crate::types::ProcessedCandidate;

const LOCKTIME_OPS: [&str; 2] = ["OP_CHECKLOCKTIMEVERIFY", "OP_CHECKSEQUENCEVERIFY"];
const HASH_OPS: [&str; 5] = ["OP_RIPEMD160", "OP_SHA1", "OP_SHA256", "OP_HASH160", "OP_HASH256"];
const EQUALITY_OPS: [&str; 2] = ["OP_EQUAL", "OP_EQUALVERIFY"];
const SIGNATURE_OPS: [&str; 2] = ["OP_CHECKSIG", "OP_CHECKSIGVERIFY"];

fn mnemonics(ops: &[String]) -> impl Iterator<Item = &str> {
    ops.iter().map(|op| strip_payload(op))
}

fn contains_any(ops: &[String], wanted: &[&str]) -> bool {
    mnemonics(ops).any(|m| wanted.contains(&m))
}

/// Pay-to-pubkey: `<pubkey> OP_CHECKSIG`
pub fn is_pay_to_pubkey(ops: &[String]) -> bool {
    let m: Vec<&str> = mnemonics(ops).collect();
    matches!(m.as_slice(), ["OP_DATA_33" | "OP_DATA_65", "OP_CHECKSIG"])
}

/// Pay-to-pubkey-hash: `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
pub fn is_pay_to_pubkey_hash(ops: &[String]) -> bool {
    let m: Vec<&str> = mnemonics(ops).collect();
    matches!(
        m.as_slice(),
        ["OP_DUP", "OP_HASH160", "OP_DATA_20", "OP_EQUALVERIFY", "OP_CHECKSIG"]
    )
}

/// Bare multisig: `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`
pub fn is_multisig(ops: &[String]) -> bool {
    let m: Vec<&str> = mnemonics(ops).collect();
    match m.as_slice() {
        [required, keys @ .., total, "OP_CHECKMULTISIG"] => {
            is_small_int_push(required)
                && is_small_int_push(total)
                && !keys.is_empty()
                && keys.iter().all(|k| matches!(*k, "OP_DATA_33" | "OP_DATA_65"))
        }
        _ => false,
    }
}

/// Null data: `OP_RETURN ...`
pub fn is_null_data(ops: &[String]) -> bool {
    mnemonics(ops).next() == Some("OP_RETURN")
}

/// Any of the standard output script shapes
pub fn is_standard_script(ops: &[String]) -> bool {
    is_pay_to_pubkey(ops) || is_pay_to_pubkey_hash(ops) || is_multisig(ops) || is_null_data(ops)
}

/// Detection rule of the block scanner: a non-standard script combining a
/// locktime check with a hash opcode
pub fn has_timelock_and_hashlock(ops: &[String]) -> bool {
    !is_standard_script(ops) && contains_any(ops, &LOCKTIME_OPS) && contains_any(ops, &HASH_OPS)
}

/// Coarse HTLC shape: an equality check, a branch and a signature check
pub fn is_htlc_shaped(ops: &[String]) -> bool {
    contains_any(ops, &EQUALITY_OPS)
        && mnemonics(ops).any(|m| m == "OP_IF")
        && contains_any(ops, &SIGNATURE_OPS)
}

/// Which shape test a filter pass applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterRule {
    /// [`is_htlc_shaped`]: equality check, branch and signature check
    #[default]
    HtlcShape,
    /// [`has_timelock_and_hashlock`]: the block scanner's detection rule
    TimelockHashlock,
}

impl FilterRule {
    pub fn accepts(&self, ops: &[String]) -> bool {
        match self {
            FilterRule::HtlcShape => is_htlc_shaped(ops),
            FilterRule::TimelockHashlock => has_timelock_and_hashlock(ops),
        }
    }
}

/// Keep the candidates of a batch accepted by `rule`, in order
pub fn filter_candidates(
    candidates: Vec<ProcessedCandidate>,
    rule: FilterRule,
) -> Vec<ProcessedCandidate> {
    let total = candidates.len();
    let kept: Vec<ProcessedCandidate> = candidates
        .into_iter()
        .filter(|pc| rule.accepts(&pc.ops))
        .collect();
    info!(?rule, "filter kept {} of {} candidates", kept.len(), total);
    kept
}
