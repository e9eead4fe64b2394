//! CLI for the MEV Sentry detection service.

mod config;
mod document;
mod server;
mod validation;

use clap::{Parser, Subcommand};
use mev_sentry_heuristics::Trace;
use mev_sentry_telemetry::{init_logging, LogFormat, Metrics};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::DetectionArgs;
use crate::server::AppState;

#[derive(Parser)]
#[command(name = "mev-sentry")]
#[command(version)]
#[command(about = "Heuristic sandwich/arbitrage detection over transaction traces")]
struct Cli {
    /// Log filter, e.g. "info" or "mev_sentry_explorer=debug"
    #[arg(long, global = true, env = "MEV_SENTRY_LOG")]
    log_level: Option<String>,

    /// Log output format: json or pretty
    #[arg(long, global = true, default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP detection service
    Serve {
        /// Address to listen on
        #[arg(long, env = "MEV_SENTRY_BIND", default_value = "0.0.0.0:3000")]
        bind_address: String,

        /// Append one JSON audit record per classification to this file
        #[arg(long)]
        sample_output_path: Option<PathBuf>,

        #[command(flatten)]
        detection: DetectionArgs,
    },
    /// Classify a single trace read from a JSON file and print the verdict
    Classify {
        /// Trace JSON, or a full detection request containing a `trace`
        #[arg(long)]
        trace: PathBuf,

        #[command(flatten)]
        detection: DetectionArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_format)?;

    match cli.command {
        Commands::Serve {
            bind_address,
            sample_output_path,
            detection,
        } => {
            let metrics = Metrics::new()?;
            let engine = detection.build_engine(&metrics)?;
            let state = AppState {
                engine,
                metrics,
                sample_output_path,
            };
            server::serve(&bind_address, state).await?;
        }
        Commands::Classify { trace, detection } => {
            let metrics = Metrics::new()?;
            let engine = detection.build_engine(&metrics)?;
            let trace = read_trace(&trace)?;

            let verdict = engine.classify(&trace).await;
            info!(
                "Classified {} calls from {}: {}",
                trace.node_count(),
                trace.from,
                verdict.reason.as_str()
            );
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
    }

    Ok(())
}

/// Read a trace, accepting either a bare trace or a request envelope.
fn read_trace(path: &Path) -> anyhow::Result<Trace> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    parse_trace(&contents)
}

#[derive(Deserialize)]
struct TraceEnvelope {
    trace: Trace,
}

fn parse_trace(contents: &str) -> anyhow::Result<Trace> {
    let bytes = contents.as_bytes();
    let value = document::parse_document(bytes)?;
    let wrapped = value.get("trace").is_some();
    document::dismantle(value);
    if wrapped {
        Ok(document::from_slice::<TraceEnvelope>(bytes)?.trace)
    } else {
        Ok(document::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_trace() {
        let trace = parse_trace(r#"{ "from": "0x01", "to": "0x02", "calls": [{ "from": "0x02", "to": "0x03" }] }"#)
            .unwrap();
        assert_eq!(trace.from, "0x01");
        assert_eq!(trace.node_count(), 1);
    }

    #[test]
    fn test_parse_request_envelope() {
        let trace = parse_trace(r#"{ "chainId": 1, "trace": { "from": "0x01", "to": "0x02", "calls": [] } }"#)
            .unwrap();
        assert_eq!(trace.to, "0x02");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_trace("[1, 2]").is_err());
        assert!(parse_trace("{").is_err());
    }

    fn chain_trace(depth: usize) -> String {
        let open = r#"{ "from": "0x02", "to": "0x03", "input": "0x022c0d9f", "calls": ["#;
        format!(
            r#"{{ "from": "0x01", "to": "0x02", "calls": [{}{}] }}"#,
            open.repeat(depth),
            "] }".repeat(depth)
        )
    }

    #[test]
    fn test_parse_deep_trace() {
        let trace = parse_trace(&chain_trace(1000)).unwrap();
        assert_eq!(trace.node_count(), 1000);
    }

    #[test]
    fn test_parse_rejects_excessive_nesting() {
        let err = parse_trace(&chain_trace(1100)).unwrap_err();
        assert!(err.to_string().contains("nesting depth"));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "mev-sentry",
            "--log-format",
            "pretty",
            "serve",
            "--bind-address",
            "127.0.0.1:8080",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert!(matches!(cli.command, Commands::Serve { ref bind_address, .. } if bind_address == "127.0.0.1:8080"));

        let cli = Cli::try_parse_from(["mev-sentry", "classify", "--trace", "tx.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Classify { .. }));
    }
}
