//! End-to-end classification scenarios over wire-format traces.

use std::sync::Arc;

use mev_sentry_heuristics::{DetectionEngine, SignatureSet, Trace, VerdictReason};
use mev_sentry_oracle::StaticOracle;
use serde_json::{json, Value};

const ORIGIN: &str = "0xae2Fc483527B8EF99EB5D9B44875F005ba1FaE13";
const BOT: &str = "0x1f2f10d1c40777ae1da742455c65828ff36df387";
const POOL: &str = "0x0d4a11d5eeaac28ec3f61d100daf4d40471f1852";
const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

fn trace(calls: Value) -> Trace {
    serde_json::from_value(json!({
        "from": ORIGIN,
        "to": BOT,
        "transactionHash": "0x4f7b1a8f0c3e9b21d6a7f3c0e5d8b9a2c1f0e3d4b5a697887766554433221100",
        "logs": [],
        "calls": calls,
    }))
    .unwrap()
}

fn swap_call() -> Value {
    json!({
        "from": BOT,
        "to": POOL,
        "input": format!("0x022c0d9f{}", "0".repeat(56)),
        "gasUsed": "30000",
        "value": "0",
        "output": "0x",
        "calls": [],
    })
}

/// A bot contract that pulls WETH, swaps on a V2 pair and keeps the output.
fn nested_sandwich_leg() -> Value {
    json!([{
        "from": ORIGIN,
        "to": BOT,
        "input": "0x0000000a",
        "gasUsed": "98000",
        "value": "0",
        "output": "0x",
        "calls": [
            {
                "from": BOT,
                "to": WETH,
                "input": format!("0xa9059cbb{}", "0".repeat(128)),
                "gasUsed": "12000",
                "value": "0",
                "output": "0x",
                "calls": []
            },
            {
                "from": BOT,
                "to": POOL,
                "input": format!("0x022C0D9F{}", "0".repeat(256)),
                "gasUsed": "60000",
                "value": "0",
                "output": "0x",
                "calls": [{
                    "from": POOL,
                    "to": WETH,
                    "input": format!("0xa9059cbb{}", "0".repeat(128)),
                    "gasUsed": "9000",
                    "value": "0",
                    "output": "0x",
                    "calls": []
                }]
            }
        ]
    }])
}

#[tokio::test]
async fn single_swap_without_return_is_detected() {
    let engine = DetectionEngine::new(SignatureSet::default());
    let verdict = engine.classify(&trace(json!([swap_call()]))).await;

    assert!(verdict.detected);
    assert_eq!(verdict.message, "Possible sandwich attack detected");
}

#[tokio::test]
async fn funds_returned_to_origin_is_not_detected() {
    let engine = DetectionEngine::new(SignatureSet::default());
    let refund = json!({
        "from": POOL,
        "to": ORIGIN.to_lowercase(),
        "input": format!("0xa9059cbb{}", "0".repeat(56)),
        "gasUsed": "21000",
        "value": "1000000000000000000",
        "output": "0x",
        "calls": [],
    });
    let verdict = engine.classify(&trace(json!([swap_call(), refund]))).await;

    assert!(!verdict.detected);
    assert_eq!(verdict.reason, VerdictReason::FundsReturned);
    assert_eq!(verdict.message, "No MEV detected");
}

#[tokio::test]
async fn empty_and_swapless_traces_are_not_detected() {
    let engine = DetectionEngine::new(SignatureSet::default());
    assert!(!engine.classify(&trace(json!([]))).await.detected);

    let transfer = json!([{
        "from": ORIGIN,
        "to": "0x0000000000000000000000000000000000000000",
        "input": format!("0xabcdef12{}", "0".repeat(56)),
        "gasUsed": "25000",
        "value": "0",
        "output": "0x",
        "calls": [],
    }]);
    assert!(!engine.classify(&trace(transfer)).await.detected);
}

#[tokio::test]
async fn nested_sandwich_leg_with_oracle() {
    let unverified = Arc::new(StaticOracle::new(false));
    let engine = DetectionEngine::new(SignatureSet::default()).with_oracle(unverified.clone());
    assert!(engine.classify(&trace(nested_sandwich_leg())).await.detected);
    assert_eq!(unverified.calls(), 1);

    let verified = Arc::new(StaticOracle::new(true));
    let engine = DetectionEngine::new(SignatureSet::default()).with_oracle(verified);
    let verdict = engine.classify(&trace(nested_sandwich_leg())).await;
    assert!(!verdict.detected);
    assert_eq!(verdict.reason, VerdictReason::VerifiedContract);
}

#[tokio::test]
async fn extra_selector_extends_detection() {
    let swap_exact_tokens = json!([{
        "from": BOT,
        "to": POOL,
        "input": format!("0x38ed1739{}", "0".repeat(64)),
        "gasUsed": "40000",
        "value": "0",
        "output": "0x",
        "calls": [],
    }]);

    let default_engine = DetectionEngine::new(SignatureSet::default());
    assert!(!default_engine.classify(&trace(swap_exact_tokens.clone())).await.detected);

    let extended = DetectionEngine::new(SignatureSet::with_additional(["0x38ed1739"]).unwrap());
    assert!(extended.classify(&trace(swap_exact_tokens)).await.detected);
}
