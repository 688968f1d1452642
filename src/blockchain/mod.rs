//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! SdkConfig (endpoint, chain id, private key)
//!     → transport.rs (JSON-RPC session with timeouts)
//!     → client.rs (chain verification, credential slot)
//!     → wallet.rs (key loading, signing contexts)
//!     → transaction.rs (pending handle, mined/confirmed wait)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when the chain ID does not match

pub mod client;
pub mod transaction;
pub mod transport;
pub mod types;
pub mod wallet;

pub use client::ChainConnection;
pub use transaction::PendingTransaction;
pub use transport::{LogFilter, LogStream, RpcTransport, Transport};
pub use types::{
    Amount, BlockRange, BlockTag, ChainId, ConfirmationPolicy, ConfirmationStatus, DeviceId,
    MinedReceipt, TransportError,
};
pub use wallet::{Credential, TransactContext};
