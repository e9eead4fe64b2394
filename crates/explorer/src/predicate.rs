//! Mapping of an explorer `getabi` response to a verification answer.

use mev_sentry_oracle::{OracleError, OracleResult};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

/// `result` returned by the explorer for an address without published source.
pub const NOT_VERIFIED_RESULT: &str = "Contract source code not verified";

/// Body of an explorer `module=contract&action=getabi` response.
///
/// A verified contract answers `status = "1"`, `message = "OK"` and its ABI in
/// `result`. Anything else answers `status = "0"`, `message = "NOTOK"` and an
/// explanation in `result`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub result: Value,
}

impl ExplorerResponse {
    fn result_str(&self) -> Option<&str> {
        self.result.as_str()
    }

    fn is_not_verified(&self) -> bool {
        self.result_str() == Some(NOT_VERIFIED_RESULT)
    }
}

/// Rule deciding whether an explorer response means "verified".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerificationPredicate {
    /// Verified unless `result` is the not-verified message.
    ///
    /// Other `status = "0"` answers (bad API key, rate limiting) are provider
    /// errors rather than "verified".
    #[default]
    ResultMessage,
    /// Verified only if `message` is `NOTOK` and `result` is not the
    /// not-verified message.
    NotOkWithResult,
}

impl VerificationPredicate {
    /// Evaluate the predicate over a parsed response.
    pub fn evaluate(&self, response: &ExplorerResponse) -> OracleResult<bool> {
        match self {
            VerificationPredicate::ResultMessage => {
                if response.is_not_verified() {
                    return Ok(false);
                }
                if response.status == "0" {
                    let detail = response
                        .result_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| response.result.to_string());
                    return Err(OracleError::Provider(detail));
                }
                Ok(true)
            }
            VerificationPredicate::NotOkWithResult => {
                Ok(response.message == "NOTOK" && !response.is_not_verified())
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationPredicate::ResultMessage => "result-message",
            VerificationPredicate::NotOkWithResult => "not-ok-with-result",
        }
    }
}

impl FromStr for VerificationPredicate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "result-message" => Ok(VerificationPredicate::ResultMessage),
            "not-ok-with-result" => Ok(VerificationPredicate::NotOkWithResult),
            other => Err(format!(
                "unknown verification predicate '{}', expected result-message or not-ok-with-result",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> ExplorerResponse {
        serde_json::from_value(value).unwrap()
    }

    fn verified() -> ExplorerResponse {
        response(json!({
            "status": "1",
            "message": "OK",
            "result": "[{\"type\":\"function\",\"name\":\"swap\"}]"
        }))
    }

    fn unverified() -> ExplorerResponse {
        response(json!({
            "status": "0",
            "message": "NOTOK",
            "result": NOT_VERIFIED_RESULT
        }))
    }

    fn rate_limited() -> ExplorerResponse {
        response(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        }))
    }

    #[test]
    fn test_result_message_predicate() {
        let predicate = VerificationPredicate::ResultMessage;
        assert!(predicate.evaluate(&verified()).unwrap());
        assert!(!predicate.evaluate(&unverified()).unwrap());
        assert!(matches!(
            predicate.evaluate(&rate_limited()),
            Err(OracleError::Provider(msg)) if msg == "Max rate limit reached"
        ));
    }

    #[test]
    fn test_not_ok_with_result_predicate() {
        // Only a NOTOK answer that is not the unverified message counts here,
        // so a regular verified answer reads as unverified.
        let predicate = VerificationPredicate::NotOkWithResult;
        assert!(!predicate.evaluate(&verified()).unwrap());
        assert!(!predicate.evaluate(&unverified()).unwrap());
        assert!(predicate.evaluate(&rate_limited()).unwrap());
    }

    #[test]
    fn test_predicates_disagree_on_verified_contract() {
        let body = verified();
        assert_ne!(
            VerificationPredicate::ResultMessage.evaluate(&body).unwrap(),
            VerificationPredicate::NotOkWithResult.evaluate(&body).unwrap()
        );
    }

    #[test]
    fn test_non_string_result() {
        let body = response(json!({ "status": "1", "message": "OK", "result": [] }));
        assert!(VerificationPredicate::ResultMessage.evaluate(&body).unwrap());
    }

    #[test]
    fn test_missing_result_is_rejected() {
        assert!(serde_json::from_value::<ExplorerResponse>(json!({ "status": "1" })).is_err());
    }

    #[test]
    fn test_parse_predicate() {
        assert_eq!(
            "not-ok-with-result".parse(),
            Ok(VerificationPredicate::NotOkWithResult)
        );
        assert_eq!(
            VerificationPredicate::default().as_str(),
            "result-message"
        );
        assert!("substring".parse::<VerificationPredicate>().is_err());
    }
}
