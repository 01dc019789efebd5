//! Per-type location of the revealed secret in an execution trace
//!
//! Redeem-script shapes push the preimage at different distances from the end
//! of the trace, and two-branch scripts only carry it when the hash branch was
//! taken. The branch selector is the token just before the redeem script.

use std::collections::HashMap;

use crate::constants::*;
use crate::error::{AnalysisError, Result};

/// Which selector value means the secret-reveal branch was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCondition {
    /// IF branch: selector is anything but `"0"`
    SelectorNonZero,
    /// ELSE branch: selector is exactly `"0"`
    SelectorZero,
}

impl BranchCondition {
    pub fn holds(&self, selector: &str) -> bool {
        match self {
            BranchCondition::SelectorNonZero => selector != BRANCH_FALSE_TOKEN,
            BranchCondition::SelectorZero => selector == BRANCH_FALSE_TOKEN,
        }
    }
}

/// Where a type keeps its secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRule {
    /// Always at `trace[len - offset]`
    Fixed { offset: usize },
    /// At `trace[len - offset]` if the branch condition holds, else absent
    Conditional { offset: usize, when: BranchCondition },
    /// Ordered secrets at trace positions 15 down to 1 if the condition holds,
    /// else one absent marker per position
    Ranged { when: BranchCondition },
}

impl SecretRule {
    /// Read the secret(s) this rule points at
    pub fn locate(&self, trace: &[String]) -> Result<Vec<String>> {
        match *self {
            SecretRule::Fixed { offset } => Ok(vec![from_end(trace, offset)?.clone()]),
            SecretRule::Conditional { offset, when } => {
                if when.holds(branch_selector(trace)?) {
                    Ok(vec![from_end(trace, offset)?.clone()])
                } else {
                    Ok(vec![ABSENT_SECRET.to_string()])
                }
            }
            SecretRule::Ranged { when } => {
                let span = (RANGED_SECRET_LAST..=RANGED_SECRET_FIRST).rev();
                if when.holds(branch_selector(trace)?) {
                    span.map(|i| {
                        trace.get(i).cloned().ok_or_else(|| {
                            AnalysisError::MalformedInput(format!(
                                "trace of length {} has no secret at position {}",
                                trace.len(),
                                i
                            ))
                        })
                    })
                    .collect()
                } else {
                    Ok(span.map(|_| ABSENT_SECRET.to_string()).collect())
                }
            }
        }
    }

    /// Number of secret slots this rule produces
    pub fn slots(&self) -> usize {
        match self {
            SecretRule::Ranged { .. } => RANGED_SECRET_FIRST - RANGED_SECRET_LAST + 1,
            _ => 1,
        }
    }
}

fn from_end(trace: &[String], offset: usize) -> Result<&String> {
    offset
        .checked_sub(1)
        .and_then(|_| trace.len().checked_sub(offset))
        .and_then(|i| trace.get(i))
        .ok_or_else(|| {
            AnalysisError::MalformedInput(format!(
                "trace of length {} has no element {} from the end",
                trace.len(),
                offset
            ))
        })
}

fn branch_selector(trace: &[String]) -> Result<&str> {
    from_end(trace, BRANCH_SELECTOR_OFFSET).map(String::as_str)
}

/// Secret rules keyed by curated type name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRuleTable {
    rules: HashMap<String, SecretRule>,
}

impl SecretRuleTable {
    /// An empty table
    pub fn empty() -> Self {
        Self { rules: HashMap::new() }
    }

    pub fn get(&self, type_name: &str) -> Option<&SecretRule> {
        self.rules.get(type_name)
    }

    /// Register or replace the rule for a type
    pub fn insert(&mut self, type_name: impl Into<String>, rule: SecretRule) -> Option<SecretRule> {
        self.rules.insert(type_name.into(), rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for SecretRuleTable {
    /// Rules for every curated type observed on BTC, LTC, BCH and DCR
    fn default() -> Self {
        use BranchCondition::*;
        use SecretRule::*;

        let if_branch = |offset| Conditional { offset, when: SelectorNonZero };
        let else_branch = |offset| Conditional { offset, when: SelectorZero };

        let entries = [
            ("Type1a", if_branch(3)),
            ("Type1b", if_branch(3)),
            ("Type2", Fixed { offset: 2 }),
            ("Type3a", if_branch(3)),
            ("Type3b", if_branch(3)),
            ("Type3c", if_branch(3)),
            ("Type4", Fixed { offset: 2 }),
            ("Type5a", if_branch(3)),
            ("Type5b", if_branch(3)),
            ("Type6a", Fixed { offset: 2 }),
            ("Type6b", Fixed { offset: 2 }),
            ("Type7", if_branch(3)),
            ("Type8a", Ranged { when: SelectorNonZero }),
            ("Type8b", Ranged { when: SelectorNonZero }),
            ("Type9a", else_branch(3)),
            ("Type9b", else_branch(3)),
            ("Type10a", else_branch(4)),
            ("Type10b", if_branch(4)),
            ("Type11", if_branch(3)),
            ("Type12", else_branch(5)),
            ("Type13", if_branch(3)),
            ("Type14", else_branch(5)),
            ("Type15", else_branch(5)),
            ("Type16", if_branch(3)),
            ("Type17", if_branch(3)),
            ("Type18", Fixed { offset: 3 }),
            ("Type19a", if_branch(3)),
            ("Type19b", if_branch(3)),
            ("Type19c", if_branch(3)),
            ("Type20", if_branch(3)),
        ];

        Self {
            rules: entries
                .into_iter()
                .map(|(name, rule)| (name.to_string(), rule))
                .collect(),
        }
    }
}
