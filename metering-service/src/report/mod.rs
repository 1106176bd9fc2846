//! Read-only aggregations for dashboards and reports. Nothing here is persisted.

pub mod pareto;
pub mod profile;

pub use pareto::{pareto_breakdown, pareto_report, GroupBy, Metric, ParetoEntry, Reduction};
pub use profile::{
    classification_breakdown, daily_trend, hourly_heatmap, summarize, ClassificationTotals,
    DailyPoint, LoadHeatmap, Summary,
};

pub(crate) const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub(crate) const UNKNOWN_CLASSIFICATION: &str = "Unknown";
