//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Bindings, facades and the stake workflow produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a global subscriber or recorder itself
//! - Key material is never part of a log field

pub mod logging;
pub mod metrics;
