//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Waiting for a receipt:
//!     → backoff.rs (poll delay grows from poll_interval_ms to max_poll_backoff_ms)
//!     → blockchain/transaction.rs (overall deadline via tokio::time::timeout)
//! ```

pub mod backoff;

pub use backoff::{calculate_backoff, Backoff};
