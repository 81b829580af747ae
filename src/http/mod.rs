//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, metrics)
//!     → request.rs (assign request ID)
//!     → api.rs (query parsing, dispatch to drivers) / page.rs (index page)
//!     → ChartSpec or menu serialized as JSON
//! ```

pub mod api;
pub mod page;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, DashboardServer};
