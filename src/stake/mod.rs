//! StakeWallet: token stakes keyed by DeviceID.

pub mod orchestrator;
pub mod record;

pub use orchestrator::{StakeOrchestrator, StakeState};
pub use record::{StakeEvent, StakeEventKind, StakeRecord};
