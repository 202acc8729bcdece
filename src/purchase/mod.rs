//! Purchase orchestration.

pub mod error;
pub mod journal;
pub mod orchestrator;
pub mod types;

pub use error::{PurchaseError, SwitchError};
pub use journal::{JournalError, PurchaseJournal};
pub use orchestrator::PurchaseOrchestrator;
pub use types::{FailureInfo, PurchasePhase, PurchaseRecord, PurchaseStage};
