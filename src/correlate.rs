//! Cross-ledger atomic swap correlation
//!
//! Two HTLCs on different ledgers form a swap candidate when they lock the same
//! ordered secret hashes and were spent within one swap window of each other.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::constants::*;
use crate::error::{AnalysisError, Result};
use crate::types::*;

/// How far a match removes a record from further consideration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionScope {
    /// A record is consumed only within the chain pair that matched it and
    /// may pair again with a third ledger
    #[default]
    PerPair,
    /// A record takes part in at most one swap per run
    Global,
}

/// Ordered secret hashes must agree at every position.
///
/// Lists of differing length never match, and neither do empty lists.
pub fn secret_hashes_match(a: &[String], b: &[String]) -> bool {
    match (a, b) {
        ([single_a], [single_b]) => single_a == single_b,
        _ => !a.is_empty() && a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y),
    }
}

/// Parse a block timestamp in `YYYY-MM-DD HH:MM:SS +ZZZZ UTC` form
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| AnalysisError::AmbiguousTimestamp(format!("'{}': {}", timestamp, e)))
}

/// Spend times strictly less than `window_secs` apart
pub fn within_window(a: &ExtractedHtlc, b: &ExtractedHtlc, window_secs: i64) -> Result<bool> {
    let t1 = parse_timestamp(&a.timestamp)?;
    let t2 = parse_timestamp(&b.timestamp)?;
    Ok((t1.timestamp() - t2.timestamp()).abs() < window_secs)
}

/// Swap predicate: matching secret hashes, then time proximity.
///
/// Timestamps are only parsed once the hashes agree.
pub fn is_swap_match(a: &ExtractedHtlc, b: &ExtractedHtlc, window_secs: i64) -> Result<bool> {
    if !secret_hashes_match(&a.secret_hashes, &b.secret_hashes) {
        return Ok(false);
    }
    within_window(a, b, window_secs)
}

/// A swap window must be positive
pub fn check_window(window_secs: i64) -> Result<()> {
    if window_secs <= 0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "swap window must be positive, got {} seconds",
            window_secs
        )));
    }
    Ok(())
}

fn check_distinct_ledgers(ledgers: &[LedgerRecords]) -> Result<()> {
    let mut seen = HashSet::new();
    for ledger in ledgers {
        if !seen.insert(ledger.chain) {
            return Err(AnalysisError::MalformedInput(format!(
                "ledger {} supplied twice",
                ledger.chain
            )));
        }
    }
    Ok(())
}

/// All unordered ledger index pairs `(i, j)` with `i < j`, in lexicographic order
pub fn chain_pairs(count: usize) -> Vec<(usize, usize)> {
    (0..count)
        .flat_map(|i| (i + 1..count).map(move |j| (i, j)))
        .collect()
}

/// MatchAtomicSwaps: ℒ* × Scope → 𝒜𝒮*
///
/// For every ledger pair, each unconsumed record of the first ledger takes the
/// first unconsumed record of the second ledger satisfying [`is_swap_match`];
/// both are then consumed. Output is in pair order, then discovery order.
pub fn correlate(
    ledgers: &[LedgerRecords],
    scope: ConsumptionScope,
    window_secs: i64,
) -> Result<Vec<AtomicSwapPair>> {
    check_window(window_secs)?;
    check_distinct_ledgers(ledgers)?;

    let mut consumed: Vec<Vec<bool>> = ledgers
        .iter()
        .map(|ledger| vec![false; ledger.htlcs.len()])
        .collect();
    let mut swaps = Vec::new();

    for (i, j) in chain_pairs(ledgers.len()) {
        let (first, second) = (&ledgers[i], &ledgers[j]);

        if scope == ConsumptionScope::PerPair {
            consumed[i].iter_mut().for_each(|c| *c = false);
            consumed[j].iter_mut().for_each(|c| *c = false);
        }

        let before = swaps.len();

        for (a, htlc1) in first.htlcs.iter().enumerate() {
            if consumed[i][a] {
                continue;
            }
            for (b, htlc2) in second.htlcs.iter().enumerate() {
                if consumed[j][b] {
                    continue;
                }
                if is_swap_match(htlc1, htlc2, window_secs)? {
                    debug!(
                        "swap {} {} <-> {} {}",
                        first.chain, htlc1.transaction, second.chain, htlc2.transaction
                    );
                    swaps.push(AtomicSwapPair {
                        chain1: first.chain,
                        htlc1: htlc1.clone(),
                        chain2: second.chain,
                        htlc2: htlc2.clone(),
                    });
                    consumed[i][a] = true;
                    consumed[j][b] = true;
                    break;
                }
            }
        }

        info!(
            "{}-{}: {} swaps",
            first.chain,
            second.chain,
            swaps.len() - before
        );
    }

    Ok(swaps)
}
