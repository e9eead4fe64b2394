//! Trace and verdict types.

use serde::{Deserialize, Serialize};

/// Length of a selector including the `0x` prefix.
pub const SELECTOR_LEN: usize = 10;

pub const MESSAGE_NOT_DETECTED: &str = "No MEV detected";
pub const MESSAGE_DETECTED: &str = "Possible sandwich attack detected";

/// One call frame of an execution trace, with its nested calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub input: String,
    /// Wei, decimal string.
    #[serde(default)]
    pub value: String,
    /// Decimal string.
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub output: String,
    #[serde(default, rename = "calls")]
    pub children: Vec<Call>,
}

/// Full execution trace of one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub calls: Vec<Call>,
}

impl Trace {
    /// Total number of call frames in the tree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Call> = self.calls.iter().collect();
        while let Some(call) = stack.pop() {
            count += 1;
            stack.extend(call.children.iter());
        }
        count
    }
}

/// A [`Call`] without its nested calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedCall {
    pub from: String,
    pub to: String,
    pub input: String,
    pub value: String,
    pub gas_used: String,
    pub output: String,
}

/// The method selector of calldata: `0x` plus its first four bytes.
///
/// `None` when the input is too short to carry one.
pub fn selector_of(input: &str) -> Option<&str> {
    input.get(..SELECTOR_LEN)
}

impl FlattenedCall {
    pub fn selector(&self) -> Option<&str> {
        selector_of(&self.input)
    }
}

impl From<&Call> for FlattenedCall {
    fn from(call: &Call) -> Self {
        Self {
            from: call.from.clone(),
            to: call.to.clone(),
            input: call.input.clone(),
            value: call.value.clone(),
            gas_used: call.gas_used.clone(),
            output: call.output.clone(),
        }
    }
}

/// The rule that terminated a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    NoCalls,
    NoSwap,
    FundsReturned,
    VerifiedContract,
    OracleUnavailable,
    SandwichPattern,
}

impl VerdictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictReason::NoCalls => "no_calls",
            VerdictReason::NoSwap => "no_swap",
            VerdictReason::FundsReturned => "funds_returned",
            VerdictReason::VerifiedContract => "verified_contract",
            VerdictReason::OracleUnavailable => "oracle_unavailable",
            VerdictReason::SandwichPattern => "sandwich_pattern",
        }
    }
}

/// Outcome of classifying one trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub detected: bool,
    pub message: String,
    pub reason: VerdictReason,
}

impl Verdict {
    pub fn detected(reason: VerdictReason) -> Self {
        Self {
            detected: true,
            message: MESSAGE_DETECTED.to_string(),
            reason,
        }
    }

    pub fn not_detected(reason: VerdictReason) -> Self {
        Self {
            detected: false,
            message: MESSAGE_NOT_DETECTED.to_string(),
            reason,
        }
    }
}
