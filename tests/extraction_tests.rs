//! Tests for template-driven extraction and per-type secret rules

use htlc_swaps::normalize::normalize_ops;
use htlc_swaps::*;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

fn hash160(data: &[u8]) -> String {
    hex::encode(Ripemd160::digest(Sha256::digest(data)))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn processed(ops: Vec<String>, asm: Vec<String>) -> ProcessedCandidate {
    ProcessedCandidate {
        candidate: Candidate {
            block: 1_200_000,
            timestamp: "2019-06-01 10:00:00 +0000 UTC".to_string(),
            transaction: "spend".to_string(),
            input_tx: "fund".to_string(),
            input_value: 3.0,
            asm,
        },
        ops,
    }
}

fn template_for(
    name: &str,
    raw: &[String],
    secrethash_pos: Vec<usize>,
    locktime_pos: usize,
    pk1: Vec<usize>,
    pk2: usize,
) -> FieldTemplate {
    let ops = normalize_ops(raw, Chain::Btc);
    FieldTemplate {
        name: name.to_string(),
        length: ops.len(),
        secrethash_pos,
        locktime_pos,
        public_keys1_pos: pk1,
        public_key2_pos: pk2,
        ops,
    }
}

/// Six-op script: OP_HASH160 <h> OP_EQUALVERIFY <pk> OP_CHECKSIG with a locktime push
fn six_ops(secret_hash: &str) -> Vec<String> {
    vec![
        "OP_HASH160".to_string(),
        format!("OP_DATA_20 {}", secret_hash),
        "OP_EQUALVERIFY".to_string(),
        "OP_DATA_33 02pk".to_string(),
        "OP_4".to_string(),
        "OP_CHECKSIG".to_string(),
    ]
}

#[test]
fn test_length_mismatch_is_dropped_and_run_continues() {
    let analyzer = SwapAnalyzer::new();
    let raw6 = six_ops(&hash160(b"s"));
    let templates = TemplateCatalog::new(vec![template_for("Type2", &raw6, vec![1], 4, vec![3], 3)]).unwrap();

    let mut raw7 = raw6.clone();
    raw7.push("OP_DROP".to_string());

    let seven = processed(raw7, strings(&["sig", "secret", "script"]));
    let six = processed(raw6, strings(&["sig", "secret", "script"]));

    assert!(matches!(
        analyzer.extract(&seven, &templates, Chain::Btc),
        Err(AnalysisError::NoMatchingTemplate(_))
    ));

    let htlcs = analyzer.extract_batch(&[seven, six], &templates, Chain::Btc).unwrap();
    assert_eq!(htlcs.len(), 1);
    assert_eq!(htlcs[0].timelock, "4");
    // Type2: secret always two from the end
    assert_eq!(htlcs[0].secrets, vec!["secret"]);
    assert_eq!(htlcs[0].secret_hashes, vec![hash160(b"s")]);
}

#[test]
fn test_extraction_requires_exact_signature() {
    let analyzer = SwapAnalyzer::new();
    let raw = six_ops("aa");
    let templates = TemplateCatalog::new(vec![template_for("Type2", &raw, vec![1], 4, vec![3], 3)]).unwrap();

    // Same length, one opcode differs
    let mut altered = raw.clone();
    altered[5] = "OP_CHECKSIGVERIFY".to_string();
    let result = analyzer.extract(&processed(altered, strings(&["a", "b", "c"])), &templates, Chain::Btc);
    assert!(matches!(result, Err(AnalysisError::NoMatchingTemplate(_))));
}

#[test]
fn test_decred_candidate_uses_bitcoin_template() {
    let analyzer = SwapAnalyzer::new();
    let btc_raw = vec![
        "OP_IF".to_string(),
        "OP_SHA256".to_string(),
        "OP_DATA_32 77".to_string(),
        "OP_EQUALVERIFY".to_string(),
        "OP_DATA_33 02aa".to_string(),
        "OP_ELSE".to_string(),
        "OP_DATA_3 a08601".to_string(),
        "OP_CHECKLOCKTIMEVERIFY".to_string(),
        "OP_DROP".to_string(),
        "OP_DATA_33 03bb".to_string(),
        "OP_ENDIF".to_string(),
        "OP_CHECKSIG".to_string(),
    ];
    let templates = TemplateCatalog::new(vec![template_for("Type3a", &btc_raw, vec![2], 6, vec![4], 9)]).unwrap();

    let mut dcr_raw = btc_raw.clone();
    dcr_raw[1] = "OP_UNKNOWN192".to_string();
    let claim = processed(dcr_raw.clone(), strings(&["sig", "preimage", "1", "script"]));
    let htlc = analyzer.extract(&claim, &templates, Chain::Dcr).unwrap();

    assert_eq!(htlc.chain, Chain::Dcr);
    assert_eq!(htlc.type_name, "Type3a");
    assert_eq!(htlc.timelock, "a08601");
    assert_eq!(htlc.pub_key_hashes1, vec!["02aa"]);
    assert_eq!(htlc.pub_key_hash2, "03bb");
    assert_eq!(htlc.secrets, vec!["preimage"]);

    // On Decred, OP_SHA256 is BLAKE-256 and no longer matches
    let blake = processed(btc_raw, strings(&["sig", "preimage", "1", "script"]));
    assert!(analyzer.extract(&blake, &templates, Chain::Dcr).is_err());
}

#[test]
fn test_secret_sentinel_consistency_for_every_rule() {
    let rules = SecretRuleTable::default();
    let names = [
        "Type1a", "Type1b", "Type2", "Type3a", "Type3b", "Type3c", "Type4", "Type5a", "Type5b",
        "Type6a", "Type6b", "Type7", "Type8a", "Type8b", "Type9a", "Type9b", "Type10a", "Type10b",
        "Type11", "Type12", "Type13", "Type14", "Type15", "Type16", "Type17", "Type18", "Type19a",
        "Type19b", "Type19c", "Type20",
    ];

    for name in names {
        let rule = rules.get(name).unwrap_or_else(|| panic!("{} missing", name));

        for selector in ["0", "1"] {
            let mut trace: Vec<String> = (0..20).map(|i| format!("item{}", i)).collect();
            trace.push(selector.to_string());
            trace.push("script".to_string());

            let secrets = rule.locate(&trace).unwrap();
            assert_eq!(secrets.len(), rule.slots(), "{}", name);

            let all_absent = secrets.iter().all(|s| s == ABSENT_SECRET);
            let any_absent = secrets.iter().any(|s| s == ABSENT_SECRET);
            match rule {
                SecretRule::Fixed { .. } => assert!(!any_absent, "{}", name),
                SecretRule::Conditional { when, .. } | SecretRule::Ranged { when } => {
                    if when.holds(selector) {
                        assert!(!any_absent, "{} selector {}", name, selector);
                    } else {
                        assert!(all_absent, "{} selector {}", name, selector);
                    }
                }
            }
        }
    }
}

#[test]
fn test_ranged_type_extracts_fifteen_ordered_secrets() {
    let analyzer = SwapAnalyzer::new();
    let raw: Vec<String> = (0..15)
        .map(|i| format!("OP_DATA_20 {}", hash160(&[i as u8])))
        .chain(
            ["OP_IF", "OP_CHECKSIG", "OP_ELSE", "OP_DATA_2 9000", "OP_CHECKSEQUENCEVERIFY", "OP_ENDIF"]
                .iter()
                .map(|s| s.to_string()),
        )
        .collect();
    let templates = TemplateCatalog::new(vec![template_for("Type8a", &raw, (0..15).collect(), 18, vec![], 16)]).unwrap();

    // Preimages pushed so position 15 holds the first and position 1 the last
    let mut asm = vec!["sig".to_string()];
    asm.extend((1..=15).map(|i| format!("preimage{:02}", 16 - i)));
    asm.push("01".to_string());
    asm.push("script".to_string());

    let htlc = analyzer.extract(&processed(raw.clone(), asm), &templates, Chain::Ltc).unwrap();
    assert_eq!(htlc.secret_hashes.len(), 15);
    assert_eq!(htlc.secrets.len(), 15);
    assert_eq!(htlc.secrets[0], "preimage01");
    assert_eq!(htlc.secrets[14], "preimage15");
    assert_eq!(htlc.timelock, "9000");
}

#[test]
fn test_custom_rule_table() {
    let mut rules = SecretRuleTable::empty();
    rules.insert("Custom", SecretRule::Conditional { offset: 4, when: BranchCondition::SelectorZero });
    let analyzer = SwapAnalyzer::new().with_rules(rules);

    let raw = six_ops("aa");
    let templates = TemplateCatalog::new(vec![template_for("Custom", &raw, vec![1], 4, vec![3], 3)]).unwrap();

    let refund = processed(raw.clone(), strings(&["x", "sig", "pk", "1", "script"]));
    let htlc = analyzer.extract(&refund, &templates, Chain::Bch).unwrap();
    assert_eq!(htlc.secrets, vec![ABSENT_SECRET]);

    let claim = processed(raw, strings(&["x", "secret", "pk", "0", "script"]));
    let htlc = analyzer.extract(&claim, &templates, Chain::Bch).unwrap();
    assert_eq!(htlc.secrets, vec!["secret"]);
}

#[test]
fn test_extracted_record_json_shape() {
    let analyzer = SwapAnalyzer::new();
    let raw = six_ops("abcd");
    let templates = TemplateCatalog::new(vec![template_for("Type4", &raw, vec![1], 4, vec![3], 3)]).unwrap();
    let htlc = analyzer
        .extract(&processed(raw, strings(&["sig", "s", "script"])), &templates, Chain::Ltc)
        .unwrap();

    let value = serde_json::to_value(&htlc).unwrap();
    for key in [
        "chain", "block", "timestamp", "transaction", "input_tx", "input_value", "type",
        "timelock", "pub_key_hashes1", "pub_key_hash2", "secrets", "secret_hashes",
    ] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(value["chain"], "ltc");
    assert_eq!(value["type"], "Type4");
}
