//! Client SDK for the Parity token and DeviceID stake wallet

pub mod blockchain;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod observability;
pub mod stake;
pub mod token;

pub use blockchain::{Amount, BlockRange, ChainConnection, DeviceId, PendingTransaction};
pub use client::SdkClient;
pub use config::schema::SdkConfig;
pub use error::{SdkError, SdkResult, StakePhase};
