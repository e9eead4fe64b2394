//! Structural validation of detection requests.
//!
//! Runs on the raw JSON so every problem can be reported with its path,
//! before anything reaches the detection engine.

use crate::document::MAX_CALL_DEPTH;
use alloy::primitives::{Address, U256};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One problem found in a request, e.g. `trace.calls.0.to must be an address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub problem: &'static str,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.problem)
    }
}

#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, path: &str, problem: &'static str) {
        self.0.push(ValidationIssue {
            path: path.to_string(),
            problem,
        });
    }

    fn required_address(&mut self, object: &Value, path: &str, key: &str) {
        match object.get(key) {
            None | Some(Value::Null) => self.push(&join(path, key), "is required"),
            Some(value) => self.address(value, &join(path, key)),
        }
    }

    fn optional_address(&mut self, object: &Value, path: &str, key: &str) {
        if let Some(value) = object.get(key).filter(|v| !v.is_null()) {
            self.address(value, &join(path, key));
        }
    }

    fn address(&mut self, value: &Value, path: &str) {
        if !value.as_str().map(is_address).unwrap_or(false) {
            self.push(path, "must be a 0x-prefixed 20-byte hex address");
        }
    }

    fn optional_hex(&mut self, object: &Value, path: &str, key: &str) {
        if let Some(value) = object.get(key).filter(|v| !v.is_null()) {
            if !value.as_str().map(is_hex_data).unwrap_or(false) {
                self.push(&join(path, key), "must be 0x-prefixed hex data");
            }
        }
    }

    fn optional_decimal(&mut self, object: &Value, path: &str, key: &str) {
        if let Some(value) = object.get(key).filter(|v| !v.is_null()) {
            if !value.as_str().map(is_decimal).unwrap_or(false) {
                self.push(&join(path, key), "must be a decimal string");
            }
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn is_address(s: &str) -> bool {
    s.starts_with("0x") && s.len() == 42 && Address::from_str(s).is_ok()
}

fn is_hex_data(s: &str) -> bool {
    s.strip_prefix("0x")
        .map(|digits| hex::decode(digits).is_ok())
        .unwrap_or(false)
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && U256::from_str_radix(s, 10).is_ok()
}

/// Validate a detection request body.
///
/// # Returns
/// Every issue found, in document order; empty if the request is valid.
pub fn validate_request(body: &Value) -> Vec<ValidationIssue> {
    let mut issues = Issues::default();

    if !body.is_object() {
        issues.push("body", "must be a JSON object");
        return issues.0;
    }

    if !body.get("chainId").map(Value::is_u64).unwrap_or(false) {
        issues.push("chainId", "must be a non-negative integer");
    }
    issues.optional_address(body, "", "protocolAddress");

    let Some(trace) = body.get("trace").filter(|t| t.is_object()) else {
        issues.push("trace", "must be an object");
        return issues.0;
    };

    issues.required_address(trace, "trace", "from");
    issues.optional_address(trace, "trace", "to");

    match trace.get("logs") {
        None | Some(Value::Null) => {}
        Some(Value::Array(logs)) => {
            for (index, log) in logs.iter().enumerate() {
                let path = format!("trace.logs.{}", index);
                issues.required_address(log, &path, "address");
            }
        }
        Some(_) => issues.push("trace.logs", "must be an array"),
    }

    // Explicit stack: call trees may be deep.
    let mut stack: Vec<(String, usize, &Value)> = Vec::new();
    push_calls(&mut stack, &mut issues, trace, "trace", 1);

    while let Some((path, depth, call)) = stack.pop() {
        if depth > MAX_CALL_DEPTH {
            issues.push(&path, "exceeds the maximum call depth of 1024");
            continue;
        }
        if !call.is_object() {
            issues.push(&path, "must be an object");
            continue;
        }
        issues.required_address(call, &path, "from");
        issues.required_address(call, &path, "to");
        issues.optional_hex(call, &path, "input");
        issues.optional_hex(call, &path, "output");
        issues.optional_decimal(call, &path, "value");
        issues.optional_decimal(call, &path, "gasUsed");
        push_calls(&mut stack, &mut issues, call, &path, depth + 1);
    }

    issues.0
}

fn push_calls<'a>(
    stack: &mut Vec<(String, usize, &'a Value)>,
    issues: &mut Issues,
    parent: &'a Value,
    parent_path: &str,
    depth: usize,
) {
    match parent.get("calls") {
        None | Some(Value::Null) => {}
        Some(Value::Array(calls)) => {
            // Reversed so calls are reported in document order.
            for (index, call) in calls.iter().enumerate().rev() {
                stack.push((format!("{}.calls.{}", parent_path, index), depth, call));
            }
        }
        Some(_) => issues.push(&join(parent_path, "calls"), "must be an array"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORIGIN: &str = "0xae2Fc483527B8EF99EB5D9B44875F005ba1FaE13";
    const BOT: &str = "0x1f2f10d1c40777ae1da742455c65828ff36df387";

    fn valid_request() -> Value {
        json!({
            "chainId": 1,
            "protocolAddress": BOT,
            "trace": {
                "from": ORIGIN,
                "to": BOT,
                "logs": [{ "address": BOT, "data": "0x", "topics": [] }],
                "calls": [{
                    "from": ORIGIN,
                    "to": BOT,
                    "input": "0x022c0d9f",
                    "gasUsed": "30000",
                    "value": "0",
                    "output": "0x",
                    "calls": [{ "from": BOT, "to": ORIGIN, "input": "0x", "calls": [] }]
                }]
            }
        })
    }

    fn paths(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_valid_request() {
        assert!(validate_request(&valid_request()).is_empty());
    }

    #[test]
    fn test_invalid_protocol_address() {
        let mut body = valid_request();
        body["protocolAddress"] = json!("definitely not address");
        let issues = validate_request(&body);
        assert_eq!(paths(&issues), ["protocolAddress"]);
    }

    #[test]
    fn test_nested_trace_issues() {
        let mut body = valid_request();
        body["trace"]["from"] = json!("not valid address");
        body["trace"]["to"] = json!("not valid as well");
        body["trace"]["logs"] = json!([{ "address": "not address deeply nested", "data": "0x" }]);
        body["trace"]["calls"][0]["calls"][0]["to"] = json!("0x1234");
        body["trace"]["calls"][0]["gasUsed"] = json!("-1");
        body["trace"]["calls"][0]["input"] = json!("0xzz");

        let issues = validate_request(&body);
        assert_eq!(
            paths(&issues),
            [
                "trace.from",
                "trace.to",
                "trace.logs.0.address",
                "trace.calls.0.input",
                "trace.calls.0.gasUsed",
                "trace.calls.0.calls.0.to",
            ]
        );
        assert_eq!(
            issues[0].to_string(),
            "trace.from must be a 0x-prefixed 20-byte hex address"
        );
    }

    #[test]
    fn test_missing_pieces() {
        assert_eq!(paths(&validate_request(&json!([]))), ["body"]);
        assert_eq!(paths(&validate_request(&json!({ "chainId": 1 }))), ["trace"]);
        assert_eq!(
            paths(&validate_request(&json!({ "trace": { "calls": "nope" } }))),
            ["chainId", "trace.from", "trace.calls"]
        );
    }

    fn call_chain(depth: usize) -> Value {
        let mut call = json!({ "from": BOT, "to": ORIGIN, "calls": [] });
        for _ in 1..depth {
            call = json!({ "from": ORIGIN, "to": BOT, "calls": [call] });
        }
        json!({ "chainId": 1, "trace": { "from": ORIGIN, "calls": [call] } })
    }

    #[test]
    fn test_call_depth_limit() {
        let body = call_chain(MAX_CALL_DEPTH);
        assert!(validate_request(&body).is_empty());
        crate::document::dismantle(body);

        let body = call_chain(MAX_CALL_DEPTH + 1);
        let issues = validate_request(&body);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].path.ends_with(".calls.0.calls.0"));
        assert_eq!(
            issues[0].problem,
            format!("exceeds the maximum call depth of {}", MAX_CALL_DEPTH)
        );
        crate::document::dismantle(body);
    }

    #[test]
    fn test_value_must_fit_u256() {
        let mut body = valid_request();
        body["trace"]["calls"][0]["value"] = json!("9".repeat(90));
        assert_eq!(paths(&validate_request(&body)), ["trace.calls.0.value"]);
    }
}
