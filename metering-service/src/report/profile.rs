use std::collections::{BTreeMap, HashMap};

use metering_client::domain::Measurement;
use serde::Serialize;
use time::{Date, UtcOffset};

use super::{UNKNOWN_CLASSIFICATION, WEEKDAY_NAMES};
use crate::error::{MeteringError, Result};

/// Mean power per weekday (rows, Sunday first) and hour of day (columns).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadHeatmap {
    pub days: Vec<&'static str>,
    pub hours: Vec<u8>,
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub energy: f64,
    pub avg_power: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub total_energy: f64,
    pub max_power: f64,
    pub avg_power: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationTotals {
    pub classification_id: i32,
    pub name: String,
    pub count: usize,
    pub total_energy: f64,
    pub max_power: f64,
    pub avg_power: f64,
}

#[derive(Default)]
struct Acc {
    count: usize,
    energy: f64,
    power_sum: f64,
    power_max: f64,
}

impl Acc {
    fn add<M: Measurement>(&mut self, r: &M) {
        self.count += 1;
        self.energy += r.energy_value();
        self.power_sum += r.power();
        self.power_max = if self.count == 1 { r.power() } else { self.power_max.max(r.power()) };
    }

    fn avg_power(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.power_sum / self.count as f64
        }
    }
}

/// Cells without readings are 0.
pub fn hourly_heatmap<M: Measurement>(readings: &[M]) -> LoadHeatmap {
    let mut cells: Vec<Vec<Acc>> = (0..7).map(|_| (0..24).map(|_| Acc::default()).collect()).collect();

    for r in readings {
        let ts = r.ts().to_offset(UtcOffset::UTC);
        let day = ts.weekday().number_days_from_sunday() as usize;
        cells[day][ts.hour() as usize].add(r);
    }

    LoadHeatmap {
        days: WEEKDAY_NAMES.to_vec(),
        hours: (0..24).collect(),
        values: cells
            .iter()
            .map(|row| row.iter().map(Acc::avg_power).collect())
            .collect(),
    }
}

fn format_date(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

/// Total energy and mean power per UTC calendar day, oldest first.
pub fn daily_trend<M: Measurement>(readings: &[M]) -> Vec<DailyPoint> {
    let mut days: BTreeMap<Date, Acc> = BTreeMap::new();
    for r in readings {
        days.entry(r.ts().to_offset(UtcOffset::UTC).date())
            .or_default()
            .add(r);
    }

    days.into_iter()
        .map(|(date, acc)| DailyPoint {
            date: format_date(date),
            energy: acc.energy,
            avg_power: acc.avg_power(),
        })
        .collect()
}

pub fn summarize<M: Measurement>(readings: &[M]) -> Result<Summary> {
    if readings.is_empty() {
        return Err(MeteringError::NoData("nothing to summarize".to_string()));
    }

    let mut acc = Acc::default();
    readings.iter().for_each(|r| acc.add(r));

    Ok(Summary {
        count: acc.count,
        total_energy: acc.energy,
        max_power: acc.power_max,
        avg_power: acc.avg_power(),
    })
}

/// Per-classification totals, highest energy first (ties by first appearance).
pub fn classification_breakdown<M: Measurement>(
    readings: &[M],
    names: &HashMap<i32, String>,
) -> Vec<ClassificationTotals> {
    let mut order: Vec<i32> = Vec::new();
    let mut accs: HashMap<i32, Acc> = HashMap::new();

    for r in readings {
        let id = r.classification_id();
        accs.entry(id)
            .or_insert_with(|| {
                order.push(id);
                Acc::default()
            })
            .add(r);
    }

    let mut out: Vec<ClassificationTotals> = order
        .into_iter()
        .filter_map(|id| {
            let acc = accs.remove(&id)?;
            Some(ClassificationTotals {
                classification_id: id,
                name: names
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_CLASSIFICATION.to_string()),
                count: acc.count,
                total_energy: acc.energy,
                max_power: acc.power_max,
                avg_power: acc.avg_power(),
            })
        })
        .collect();

    out.sort_by(|a, b| b.total_energy.total_cmp(&a.total_energy));
    out
}
