//! Observability for the MEV Sentry detection service.

pub mod audit;
pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::Metrics;
