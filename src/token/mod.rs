//! ParityToken: ERC-20 with mint/burn, data-carrying transfers and `Ownable`.

pub mod events;
pub mod facade;

pub use events::{ApprovalEvent, OwnershipTransferredEvent, TransferEvent};
pub use facade::{TokenFacade, TokenInfo};
