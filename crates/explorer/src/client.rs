//! HTTP client for the explorer contract-verification lookup.

use async_trait::async_trait;
use mev_sentry_oracle::{OracleError, OracleResult, VerificationOracle};
use mev_sentry_telemetry::Metrics;
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::predicate::{ExplorerResponse, VerificationPredicate};

/// Etherscan mainnet API endpoint.
pub const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/api";

/// Settings of the explorer lookup.
#[derive(Debug, Clone)]
pub struct EtherscanConfig {
    /// API endpoint, e.g. [`DEFAULT_ETHERSCAN_URL`].
    pub base_url: String,
    pub api_key: String,
    /// Per-request timeout, covering connect and body.
    pub timeout: Duration,
    pub predicate: VerificationPredicate,
}

impl EtherscanConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_ETHERSCAN_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(2),
            predicate: VerificationPredicate::default(),
        }
    }
}

/// Verification oracle backed by an Etherscan-compatible explorer.
pub struct EtherscanOracle {
    client: Client,
    config: EtherscanConfig,
    metrics: Metrics,
}

impl EtherscanOracle {
    /// Create a new explorer oracle.
    ///
    /// # Arguments
    /// * `config` - Endpoint, credential, timeout and predicate
    /// * `metrics` - Metrics collector
    pub fn new(config: EtherscanConfig, metrics: Metrics) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        info!(
            "Initialized explorer oracle for {} (predicate: {})",
            config.base_url,
            config.predicate.as_str()
        );

        Ok(Self {
            client,
            config,
            metrics,
        })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> OracleError {
        if err.is_timeout() {
            OracleError::Timeout(self.config.timeout)
        } else {
            // The request URL carries the API key.
            OracleError::Transport(err.without_url().to_string())
        }
    }

    async fn get_abi(&self, address: &str) -> OracleResult<ExplorerResponse> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("module", "contract"),
                ("action", "getabi"),
                ("address", address),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            return Err(OracleError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        serde_json::from_str(&body).map_err(|e| OracleError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl VerificationOracle for EtherscanOracle {
    async fn is_verified(&self, address: &str) -> OracleResult<bool> {
        self.metrics.inc_oracle_requests();
        let start = Instant::now();
        let result = self
            .get_abi(address)
            .await
            .and_then(|response| self.config.predicate.evaluate(&response));
        self.metrics
            .observe_oracle_latency("getabi", start.elapsed().as_secs_f64());

        match &result {
            Ok(verified) => debug!("Address {} verified: {}", address, verified),
            Err(e) => {
                self.metrics.inc_oracle_errors();
                warn!("Verification lookup for {} failed: {}", address, e);
            }
        }
        result
    }
}
