//! Energy Performance Indicator reduction.
//!
//! The engine performs no filtering of its own: callers hand it readings
//! already restricted to one classification and one window (the service layer
//! does this through the store's `ReadingFilter`).

use std::fmt;

use metering_client::domain::{BaselineStatus, IndicatorFormula, Measurement};
use time::OffsetDateTime;

use crate::error::{MeteringError, Result};

/// Closed time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl TimeWindow {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self> {
        if end < start {
            return Err(MeteringError::InvalidArgument(format!(
                "window end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn hours(&self) -> f64 {
        (self.end - self.start).as_seconds_f64() / 3600.0
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Baseline readings together with the window they were selected for.
#[derive(Debug, Clone, Copy)]
pub struct BaselineInput<'a, M> {
    pub readings: &'a [M],
    pub window: TimeWindow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaselineOutcome {
    NotRequested,
    /// A baseline window was given but held no readings.
    NoData,
    Measured(f64),
}

impl BaselineOutcome {
    /// Value persisted as `baseline_value`: 0 unless measured.
    pub fn value(&self) -> f64 {
        match self {
            Self::Measured(v) => *v,
            _ => 0.0,
        }
    }

    pub fn status(&self) -> BaselineStatus {
        match self {
            Self::NotRequested => BaselineStatus::NotRequested,
            Self::NoData => BaselineStatus::NoData,
            Self::Measured(_) => BaselineStatus::Measured,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorValues {
    pub current_value: f64,
    pub baseline: BaselineOutcome,
}

/// Reduce one reading set with `formula`. `window` only matters for
/// `EnergyPerHour`, whose denominator is the window span in hours.
pub fn reduce<M: Measurement>(formula: IndicatorFormula, readings: &[M], window: &TimeWindow) -> Result<f64> {
    if readings.is_empty() {
        return Err(MeteringError::NoData(format!(
            "no readings to reduce with {formula} over {window}"
        )));
    }

    let value = match formula {
        IndicatorFormula::TotalEnergy => readings.iter().map(|r| r.energy_value()).sum(),
        IndicatorFormula::EnergyPerHour => {
            let hours = window.hours();
            if hours <= 0.0 {
                return Err(MeteringError::InvalidArgument(format!(
                    "{formula} needs a window longer than zero, got {window}"
                )));
            }
            readings.iter().map(|r| r.energy_value()).sum::<f64>() / hours
        }
        IndicatorFormula::MaxPower => readings
            .iter()
            .map(|r| r.power())
            .fold(f64::NEG_INFINITY, f64::max),
        IndicatorFormula::AvgPower => {
            readings.iter().map(|r| r.power()).sum::<f64>() / readings.len() as f64
        }
    };

    Ok(value)
}

/// Compute the current value and, when a baseline is supplied, the baseline
/// value with the same formula over the baseline's own window.
///
/// An empty current set fails with `NoData`; an empty baseline set does not.
pub fn calculate<M: Measurement>(
    formula: IndicatorFormula,
    readings: &[M],
    window: TimeWindow,
    baseline: Option<BaselineInput<'_, M>>,
) -> Result<IndicatorValues> {
    let current_value = reduce(formula, readings, &window)?;

    let baseline = match baseline {
        None => BaselineOutcome::NotRequested,
        Some(b) if b.readings.is_empty() => BaselineOutcome::NoData,
        Some(b) => BaselineOutcome::Measured(reduce(formula, b.readings, &b.window)?),
    };

    Ok(IndicatorValues {
        current_value,
        baseline,
    })
}
