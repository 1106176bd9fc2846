use std::collections::HashMap;

use metering_client::domain::Measurement;
use serde::{Deserialize, Serialize};
use time::UtcOffset;

use super::{UNKNOWN_CLASSIFICATION, WEEKDAY_NAMES};
use crate::error::{MeteringError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupBy {
    Classification,
    #[serde(alias = "day_of_week")]
    DayOfWeek,
    #[serde(alias = "hour_of_day")]
    HourOfDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Energy,
    Power,
}

impl Metric {
    /// Energy accumulates across a group; power is a peak, so a group keeps its max.
    pub fn reduction(&self) -> Reduction {
        match self {
            Self::Energy => Reduction::Sum,
            Self::Power => Reduction::Max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoEntry {
    pub key: String,
    pub value: f64,
    pub percent_of_total: f64,
    pub cumulative_percent: f64,
}

/// Group `items` by `key_fn`, reduce each group's `value_fn` results with
/// `reduction`, and annotate the groups in descending value order with their
/// share of the total and the running cumulative share.
///
/// Groups with equal values keep the order in which their keys were first
/// seen. An empty input or a zero total is `NoData`.
pub fn pareto_breakdown<T, K, V>(
    items: &[T],
    key_fn: K,
    value_fn: V,
    reduction: Reduction,
) -> Result<Vec<ParetoEntry>>
where
    K: Fn(&T) -> String,
    V: Fn(&T) -> f64,
{
    let mut groups: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let key = key_fn(item);
        let value = value_fn(item);
        match index.get(&key) {
            Some(&i) => {
                let acc = &mut groups[i].1;
                *acc = match reduction {
                    Reduction::Sum => *acc + value,
                    Reduction::Max => acc.max(value),
                };
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, value));
            }
        }
    }

    // Stable sort: ties stay in first-seen order.
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total: f64 = groups.iter().map(|(_, v)| v).sum();
    if groups.is_empty() || total == 0.0 {
        return Err(MeteringError::NoData(format!(
            "pareto breakdown over {} group(s) has a zero total",
            groups.len()
        )));
    }

    let mut running = 0.0;
    let entries = groups
        .into_iter()
        .map(|(key, value)| {
            running += value;
            ParetoEntry {
                key,
                value,
                percent_of_total: value / total * 100.0,
                cumulative_percent: running / total * 100.0,
            }
        })
        .collect();

    Ok(entries)
}

/// Pareto breakdown of readings. Classification keys come from `names`;
/// ids without a name fall under "Unknown".
pub fn pareto_report<M: Measurement>(
    readings: &[M],
    group_by: GroupBy,
    metric: Metric,
    names: &HashMap<i32, String>,
) -> Result<Vec<ParetoEntry>> {
    let key_fn = |r: &M| -> String {
        let ts = r.ts().to_offset(UtcOffset::UTC);
        match group_by {
            GroupBy::Classification => names
                .get(&r.classification_id())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_CLASSIFICATION.to_string()),
            GroupBy::DayOfWeek => {
                WEEKDAY_NAMES[ts.weekday().number_days_from_sunday() as usize].to_string()
            }
            GroupBy::HourOfDay => format!("{:02}:00", ts.hour()),
        }
    };
    let value_fn = |r: &M| match metric {
        Metric::Energy => r.energy_value(),
        Metric::Power => r.power(),
    };

    pareto_breakdown(readings, key_fn, value_fn, metric.reduction())
}
