//! Telemetry module for logging and metrics.

mod logging;
mod metrics;

pub use logging::{LogConfig, init_logging};
pub use metrics::{Counter, EngineMetrics};
