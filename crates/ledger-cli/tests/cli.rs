use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;

fn cli() -> Command {
    Command::cargo_bin("ledger-cli").unwrap()
}

fn mine_chain(args: &[&str]) -> Value {
    let output = cli().arg("mine").args(args).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn mine_prints_chain_with_transactions() {
    let chain = mine_chain(&["--blocks", "1", "--tx", "A,B,10"]);
    assert_eq!(chain["length"], 2);
    let block = &chain["chain"][1];
    assert_eq!(block["index"], 2);
    assert_eq!(block["proof"], 533);
    assert_eq!(block["transactions"][0]["sender"], "A");
    assert_eq!(block["transactions"][0]["amount"], 10);
}

#[test]
fn mine_with_reward_appends_reward_transaction() {
    let chain = mine_chain(&["--blocks", "1", "--reward-to", "Pulkit"]);
    let txs = chain["chain"][1]["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0]["receiver"], "Pulkit");
}

#[test]
fn validate_accepts_mined_chain_and_rejects_tampering() {
    let dir = tempfile::tempdir().unwrap();
    let mut chain = mine_chain(&["--blocks", "2"]);

    let good = dir.path().join("good.json");
    fs::write(&good, serde_json::to_string(&chain).unwrap()).unwrap();
    cli()
        .args(["validate", "--file"])
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid (3 blocks)"));

    chain["chain"][1]["proof"] = Value::from(534);
    let bad = dir.path().join("bad.json");
    fs::write(&bad, serde_json::to_string(&chain).unwrap()).unwrap();
    cli()
        .args(["validate", "--file"])
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid chain"));
}

#[test]
fn malformed_transaction_is_rejected() {
    cli()
        .args(["mine", "--tx", "A,B"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SENDER,RECEIVER,AMOUNT"));
}

#[test]
fn out_of_range_difficulty_is_rejected() {
    cli()
        .args(["--difficulty", "0", "mine"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("difficulty"));
}

#[test]
fn resolve_without_reachable_peers_keeps_local_chain() {
    let output = cli()
        .args(["resolve", "--peer", "http://127.0.0.1:1", "--blocks", "1"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["replaced"], false);
    assert_eq!(report["length"], 2);
    assert_eq!(report["valid"], true);
}
