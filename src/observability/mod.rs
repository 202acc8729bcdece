//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! orchestrator / wallet / journal produce:
//!     → logging.rs (structured tracing events: currency, chain_id, tx_hash, record_id)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
