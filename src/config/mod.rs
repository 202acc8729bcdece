//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SaleConfig (validated, immutable)
//!     → CurrencyTable + connector + orchestrator built from it
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup and never mutated
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BlockchainConfig, ConnectorConfig, CurrenciesConfig, CurrencyConfig, NetworkConfig,
    ObservabilityConfig, PurchaseConfig, SaleConfig,
};
