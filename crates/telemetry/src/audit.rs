//! Audit samples of classification outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// One classification outcome as written to the audit file.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub request_id: Option<String>,
    pub chain_id: Option<u64>,
    pub origin: String,
    pub detected: bool,
    pub reason: String,
    pub flattened_calls: usize,
    pub evaluated_at: DateTime<Utc>,
}

/// Append a sample JSON payload to the audit file.
///
/// Does nothing when `path` is `None`. Each record goes out in a single
/// append write so concurrent writers do not interleave. Blocking; async
/// callers should run it on the blocking pool.
pub fn write_audit_sample<P: AsRef<Path>, T: Serialize>(
    path: Option<P>,
    payload: &T,
) -> anyhow::Result<()> {
    if let Some(audit_path) = path {
        let mut line = serde_json::to_string_pretty(payload)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&audit_path)?;
        file.write_all(line.as_bytes())?;
        debug!("Wrote audit sample to {:?}", audit_path.as_ref());
    }
    Ok(())
}
