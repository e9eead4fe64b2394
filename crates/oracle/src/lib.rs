//! Contract verification oracle interface.
//!
//! The decision engine asks an oracle whether the address that originated a
//! trace is a contract with published source code. The lookup is an external,
//! slow capability, so it sits behind the [`VerificationOracle`] trait and the
//! engine never depends on a concrete provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Error type for verification lookups.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for verification lookups.
pub type OracleResult<T> = Result<T, OracleError>;

/// Capability answering "is this address a verified contract?".
#[async_trait]
pub trait VerificationOracle: Send + Sync {
    /// Look up the verification status of `address`.
    ///
    /// # Arguments
    /// * `address` - 0x-prefixed hex address, any case
    ///
    /// # Returns
    /// `true` if the provider reports published source code for the address.
    async fn is_verified(&self, address: &str) -> OracleResult<bool>;
}

/// How an oracle failure (error or timeout) is folded into the verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Treat the address as unverified and keep classifying.
    #[default]
    FailOpen,
    /// Treat the address as verified, which suppresses detection.
    FailClosed,
}

impl FailurePolicy {
    /// The verification answer assumed when the lookup failed.
    pub fn assumed_verified(self) -> bool {
        matches!(self, FailurePolicy::FailClosed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailOpen => "fail-open",
            FailurePolicy::FailClosed => "fail-closed",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail-open" => Ok(FailurePolicy::FailOpen),
            "fail-closed" => Ok(FailurePolicy::FailClosed),
            other => Err(format!(
                "unknown failure policy '{}', expected fail-open or fail-closed",
                other
            )),
        }
    }
}

/// Oracle that always gives the same answer.
///
/// Counts its invocations, which makes it the usual stand-in in tests.
#[derive(Debug, Default)]
pub struct StaticOracle {
    verified: bool,
    calls: AtomicUsize,
}

impl StaticOracle {
    pub fn new(verified: bool) -> Self {
        Self {
            verified,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerificationOracle for StaticOracle {
    async fn is_verified(&self, _address: &str) -> OracleResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verified)
    }
}

/// Oracle whose every lookup fails with a malformed-response error.
#[derive(Debug, Default)]
pub struct FailingOracle;

#[async_trait]
impl VerificationOracle for FailingOracle {
    async fn is_verified(&self, _address: &str) -> OracleResult<bool> {
        Err(OracleError::MalformedResponse(
            "stand-in oracle always fails".to_string(),
        ))
    }
}
