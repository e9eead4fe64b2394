//! Heuristic sandwich/arbitrage detection over a single transaction trace.
//!
//! A trace is flattened once, then checked against an ordered chain of
//! rules: any swap at all, funds flowing back to the originator, and
//! optionally the originator's contract verification status.

pub mod analyzer;
pub mod flatten;
pub mod fund_flow;
pub mod signatures;
pub mod types;

pub use analyzer::{DetectionEngine, EngineConfig};
pub use flatten::flatten_calls;
pub use fund_flow::returns_to_origin;
pub use signatures::{SignatureError, SignatureSet};
pub use types::{Call, FlattenedCall, Trace, Verdict, VerdictReason};
