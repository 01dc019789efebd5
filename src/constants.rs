//! Constants shared by the classification, extraction and correlation stages

/// Separator between an opcode mnemonic and its pushed payload in disassembled ops
pub const PAYLOAD_SEPARATOR: char = ' ';

/// Generic marker replacing every OP_0 .. OP_16 small-integer push
pub const PUSH_NUMBER_MARKER: &str = "OP_";

/// Prefix shared by all opcode mnemonics
pub const OPCODE_PREFIX: &str = "OP_";

/// Direct data pushes (`OP_DATA_1` .. `OP_DATA_75`) and length-prefixed pushes
pub const DATA_PUSH_PREFIX: &str = "OP_DATA_";
pub const PUSHDATA_PREFIX: &str = "OP_PUSHDATA";

/// Secret value emitted when the hash branch was not taken
pub const ABSENT_SECRET: &str = "none";

/// Trace token selecting the ELSE branch of an IF
pub const BRANCH_FALSE_TOKEN: &str = "0";

/// Distance of the branch selector from the end of the trace
pub const BRANCH_SELECTOR_OFFSET: usize = 2;

/// Ordered-secret scripts reveal their preimages at trace positions 15 down to 1
pub const RANGED_SECRET_FIRST: usize = 15;
pub const RANGED_SECRET_LAST: usize = 1;

/// Maximum distance between the two legs of an atomic swap: one day
pub const SWAP_WINDOW_SECS: i64 = 86_400;

/// Block timestamp layout, e.g. `2020-01-01 00:00:00 +0000 UTC`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z UTC";

/// Decred single-round SHA-256 lives at the slot other ledgers call OP_UNKNOWN192
pub const DCR_SHA256_ALIAS: &str = "OP_UNKNOWN192";
pub const DCR_BLAKE256: &str = "OP_BLAKE256";
pub const OP_SHA256: &str = "OP_SHA256";
