//! Derived metrics: rolling averages, per-capita scaling and ranking.

pub mod ranking;
pub mod rolling;
pub mod series;

pub use ranking::top_n;
pub use rolling::{diff, max_value, per_capita, ratio, rolling_mean, rolling_ratio, PER_CAPITA_SCALE};
pub use series::{days_since, group_by, since, Dated};
