//! Contract bindings.
//!
//! # Data Flow
//! ```text
//! JSON ABI (bundled or configured path)
//!     → schema.rs (parsed once per binding)
//!     → binding.rs (encode args, call/transact, decode results)
//!     → logs.rs (chunked historical queries)
//!     → subscription.rs (live logs through a forwarding task)
//!     → events.rs (tagged EventRecord, indexed-field filters)
//! ```

pub mod binding;
pub mod events;
pub mod logs;
pub mod schema;
pub mod subscription;
pub mod value;

pub use binding::ContractBinding;
pub use events::{CallFilter, EventField, EventRecord, LogMeta};
pub use logs::{LogIter, LogQuery};
pub use schema::ContractSchema;
pub use subscription::LogSubscription;
pub use value::FromSolValue;
