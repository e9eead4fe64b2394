//! Decision engine combining the trace heuristics and the verification oracle.

use std::sync::Arc;
use std::time::Duration;

use mev_sentry_oracle::{FailurePolicy, OracleError, VerificationOracle};
use tracing::{debug, warn};

use crate::flatten::flatten_calls;
use crate::fund_flow::find_return_to_origin;
use crate::signatures::SignatureSet;
use crate::types::{Trace, Verdict, VerdictReason};

/// Default bound on a single verification lookup.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Tuning of the oracle rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on one verification lookup; the lookup is dropped after it.
    pub oracle_timeout: Duration,
    /// Verdict contribution of a failed or timed out lookup.
    pub failure_policy: FailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Classifies traces as possible sandwich attacks.
///
/// Rules run in a fixed order and the first one that rules detection out
/// wins:
/// 1. no top-level calls
/// 2. no call with a known swap selector
/// 3. some call targets the trace originator
/// 4. the oracle, when configured, reports the originator as verified
///
/// Rules 1-3 are in-memory and always run before the oracle round trip.
/// The engine holds no mutable state; clones share the selector set and
/// oracle.
#[derive(Clone)]
pub struct DetectionEngine {
    signatures: Arc<SignatureSet>,
    oracle: Option<Arc<dyn VerificationOracle>>,
    config: EngineConfig,
}

impl DetectionEngine {
    /// Create an engine without an oracle; rule 4 is skipped.
    pub fn new(signatures: SignatureSet) -> Self {
        Self {
            signatures: Arc::new(signatures),
            oracle: None,
            config: EngineConfig::default(),
        }
    }

    /// Enable rule 4 with the given oracle.
    pub fn with_oracle(mut self, oracle: Arc<dyn VerificationOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    pub fn oracle_enabled(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify one trace.
    ///
    /// Never fails: oracle errors degrade according to the failure policy.
    pub async fn classify(&self, trace: &Trace) -> Verdict {
        if trace.calls.is_empty() {
            debug!("Trace from {} has no calls", trace.from);
            return Verdict::not_detected(VerdictReason::NoCalls);
        }

        let flattened = flatten_calls(&trace.calls);

        let Some(swap_index) = self.signatures.first_match(&flattened) else {
            debug!("No swap selector among {} calls", flattened.len());
            return Verdict::not_detected(VerdictReason::NoSwap);
        };

        if let Some(return_index) = find_return_to_origin(&flattened, &trace.from) {
            debug!(
                "Swap at call {} but call {} returns to origin {}",
                swap_index, return_index, trace.from
            );
            return Verdict::not_detected(VerdictReason::FundsReturned);
        }

        if let Some(oracle) = &self.oracle {
            match self.lookup(oracle.as_ref(), &trace.from).await {
                Ok(true) => {
                    debug!("Origin {} is a verified contract", trace.from);
                    return Verdict::not_detected(VerdictReason::VerifiedContract);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        "Verification of {} failed, applying {}: {}",
                        trace.from,
                        self.config.failure_policy.as_str(),
                        e
                    );
                    if self.config.failure_policy.assumed_verified() {
                        return Verdict::not_detected(VerdictReason::OracleUnavailable);
                    }
                }
            }
        }

        debug!(
            "Possible sandwich from {}: swap at call {} of {}",
            trace.from,
            swap_index,
            flattened.len()
        );
        Verdict::detected(VerdictReason::SandwichPattern)
    }

    async fn lookup(
        &self,
        oracle: &dyn VerificationOracle,
        address: &str,
    ) -> Result<bool, OracleError> {
        tokio::time::timeout(self.config.oracle_timeout, oracle.is_verified(address))
            .await
            .map_err(|_| OracleError::Timeout(self.config.oracle_timeout))?
    }
}
