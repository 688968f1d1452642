//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → SdkConfig (validated, immutable)
//!     → consumed once by SdkClient::connect
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Private keys come from the environment or the file, never from logs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{PrivateKey, SdkConfig};
