//! Detection settings shared by the `serve` and `classify` commands.

use clap::Args;
use mev_sentry_explorer::{
    EtherscanConfig, EtherscanOracle, VerificationPredicate, DEFAULT_ETHERSCAN_URL,
};
use mev_sentry_heuristics::{DetectionEngine, EngineConfig, SignatureSet};
use mev_sentry_oracle::FailurePolicy;
use mev_sentry_telemetry::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct DetectionArgs {
    /// Explorer API key; enables the verified-contract check
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// Explorer API endpoint
    #[arg(long, env = "ETHERSCAN_API_URL", default_value = DEFAULT_ETHERSCAN_URL)]
    pub etherscan_url: String,

    /// Upper bound on one verification lookup, in milliseconds
    #[arg(long, env = "MEV_SENTRY_ORACLE_TIMEOUT_MS", default_value = "2000")]
    pub oracle_timeout_ms: u64,

    /// Verdict when the lookup fails: fail-open (detect) or fail-closed (suppress)
    #[arg(long, env = "MEV_SENTRY_ORACLE_FAILURE_POLICY", default_value = "fail-open")]
    pub oracle_failure_policy: FailurePolicy,

    /// How an explorer answer maps to "verified": result-message or not-ok-with-result
    #[arg(long, env = "MEV_SENTRY_VERIFICATION_PREDICATE", default_value = "result-message")]
    pub verification_predicate: VerificationPredicate,

    /// Additional swap selector (0x + 8 hex digits), repeatable
    #[arg(
        long = "extra-selector",
        env = "MEV_SENTRY_EXTRA_SELECTORS",
        value_delimiter = ','
    )]
    pub extra_selectors: Vec<String>,
}

impl DetectionArgs {
    /// The API key, if one was given and is not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.etherscan_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    /// Build the detection engine, wiring the explorer oracle when a key is set.
    pub fn build_engine(&self, metrics: &Metrics) -> anyhow::Result<DetectionEngine> {
        let signatures = SignatureSet::with_additional(&self.extra_selectors)?;
        let engine = DetectionEngine::new(signatures).with_config(EngineConfig {
            oracle_timeout: self.oracle_timeout(),
            failure_policy: self.oracle_failure_policy,
        });

        let engine = match self.api_key() {
            Some(api_key) => {
                let config = EtherscanConfig {
                    base_url: self.etherscan_url.clone(),
                    api_key: api_key.to_string(),
                    timeout: self.oracle_timeout(),
                    predicate: self.verification_predicate,
                };
                let oracle = EtherscanOracle::new(config, metrics.clone())?;
                engine.with_oracle(Arc::new(oracle))
            }
            None => {
                info!("No explorer API key configured, verified-contract check disabled");
                engine
            }
        };

        info!(
            "Detection engine ready: {} swap selectors, oracle {}, failure policy {}",
            engine.signatures().len(),
            if engine.oracle_enabled() { "enabled" } else { "disabled" },
            self.oracle_failure_policy.as_str()
        );
        Ok(engine)
    }
}
