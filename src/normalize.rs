//! Opcode normalization: disassembled ops → comparable type signature
//!
//! Each op is rewritten in order:
//! 1. `MNEMONIC payload` → `MNEMONIC`
//! 2. `OP_0` .. `OP_16` → `OP_` (locktimes pushed as small integers must not split a type)
//! 3. On ledgers with renumbered hash opcodes, `OP_SHA256` → `OP_BLAKE256` and
//!    `OP_UNKNOWN192` → `OP_SHA256`

use crate::constants::*;
use crate::types::Chain;

/// Split a disassembled op into its mnemonic and optional payload
pub fn split_op(op: &str) -> (&str, Option<&str>) {
    match op.split_once(PAYLOAD_SEPARATOR) {
        Some((mnemonic, payload)) => (mnemonic, Some(payload)),
        None => (op, None),
    }
}

/// Drop the pushed payload, keeping only the mnemonic
pub fn strip_payload(op: &str) -> &str {
    split_op(op).0
}

/// Is this one of the OP_0 .. OP_16 small-integer push mnemonics?
///
/// Recognised syntactically: four characters (`OP_0`..`OP_9`) or five starting
/// with `OP_1` (`OP_10`..`OP_16`).
pub fn is_small_int_push(mnemonic: &str) -> bool {
    mnemonic.len() == 4 || (mnemonic.len() == 5 && mnemonic.starts_with("OP_1"))
}

/// Numeral carried by a small-integer push mnemonic (`OP_7` → `7`)
pub fn small_int_numeral(mnemonic: &str) -> Option<&str> {
    if is_small_int_push(mnemonic) {
        mnemonic.strip_prefix(OPCODE_PREFIX)
    } else {
        None
    }
}

/// Map a ledger's hash-opcode aliases to the standard mnemonics
pub fn remap_hash_alias<'a>(mnemonic: &'a str, chain: Chain) -> &'a str {
    if !chain.remaps_hash_opcodes() {
        return mnemonic;
    }
    match mnemonic {
        OP_SHA256 => DCR_BLAKE256,
        DCR_SHA256_ALIAS => OP_SHA256,
        other => other,
    }
}

/// Ledger-independent canonical form of one op (steps 1 and 2)
pub fn canonicalize_op(op: &str) -> &str {
    let mnemonic = strip_payload(op);
    if is_small_int_push(mnemonic) {
        PUSH_NUMBER_MARKER
    } else {
        mnemonic
    }
}

/// Normalize one op for `chain`
pub fn normalize_op(op: &str, chain: Chain) -> String {
    remap_hash_alias(canonicalize_op(op), chain).to_string()
}

/// Normalize a whole op sequence into a type signature.
///
/// The output has the same length as the input. The hash-alias remap is a
/// swap, so it must be applied to raw disassembler output exactly once.
pub fn normalize_ops(ops: &[String], chain: Chain) -> Vec<String> {
    ops.iter().map(|op| normalize_op(op, chain)).collect()
}

/// Signature equality: cheap length rejection, then elementwise
pub fn signatures_match(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).all(|(x, y)| x == y)
}
