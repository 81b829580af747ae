//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, drivers and the table cache produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
