//! Declarative chart assembly.
//!
//! # Data Flow
//! ```text
//! driver rows (Serialize)
//!     → layouts.rs (daily/average panels, per-region lines)
//!     → spec.rs (typed Vega-Lite views)
//!     → ChartSpec serialized as JSON for vega-embed in the browser
//! ```

pub mod layouts;
pub mod spec;

pub use layouts::{grey_panel, legend_panel, region_lines, region_selection, LegendTags, Panel};
pub use spec::{Channel, ChartSpec, Encoding, Mark, View};
