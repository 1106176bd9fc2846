use std::{fmt, str::FromStr};

use time::OffsetDateTime;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown indicator formula '{0}'")]
pub struct ParseFormulaError(pub String);

/// Reduction applied to a set of readings to obtain an EnPI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String"))]
pub enum IndicatorFormula {
    TotalEnergy,
    EnergyPerHour,
    MaxPower,
    AvgPower,
}

impl IndicatorFormula {
    pub const ALL: [IndicatorFormula; 4] = [
        Self::TotalEnergy,
        Self::EnergyPerHour,
        Self::MaxPower,
        Self::AvgPower,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalEnergy => "TotalEnergy",
            Self::EnergyPerHour => "EnergyPerHour",
            Self::MaxPower => "MaxPower",
            Self::AvgPower => "AvgPower",
        }
    }
}

impl FromStr for IndicatorFormula {
    type Err = ParseFormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ParseFormulaError(s.to_string()))
    }
}

impl TryFrom<String> for IndicatorFormula {
    type Error = ParseFormulaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for IndicatorFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown baseline status '{0}'")]
pub struct ParseBaselineStatusError(pub String);

/// Whether the baseline value of an indicator was actually measured.
///
/// `baseline_value` is 0 for both `NotRequested` and `NoData`; this status is
/// what tells them apart from a measured zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BaselineStatus {
    NotRequested,
    NoData,
    Measured,
}

impl BaselineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRequested => "not_requested",
            Self::NoData => "no_data",
            Self::Measured => "measured",
        }
    }
}

impl TryFrom<String> for BaselineStatus {
    type Error = ParseBaselineStatusError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "not_requested" => Ok(Self::NotRequested),
            "no_data" => Ok(Self::NoData),
            "measured" => Ok(Self::Measured),
            _ => Err(ParseBaselineStatusError(s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Indicator {
    pub id: i32,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub formula: IndicatorFormula,
    pub current_value: f64,
    pub baseline_value: f64,
    #[sqlx(try_from = "String")]
    pub baseline_status: BaselineStatus,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub calculation_date: OffsetDateTime,
    pub classification_id: i32,
}

impl Indicator {
    /// Percentage reduction of the current value relative to a measured,
    /// non-zero baseline. Positive means the indicator went down.
    pub fn improvement_percent(&self) -> Option<f64> {
        if self.baseline_status != BaselineStatus::Measured || self.baseline_value == 0.0 {
            return None;
        }
        Some((self.baseline_value - self.current_value) / self.baseline_value * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIndicator {
    pub name: String,
    pub formula: IndicatorFormula,
    pub current_value: f64,
    pub baseline_value: f64,
    pub baseline_status: BaselineStatus,
    pub calculation_date: OffsetDateTime,
    pub classification_id: i32,
}

impl NewIndicator {
    pub fn with_id(self, id: i32) -> Indicator {
        Indicator {
            id,
            name: self.name,
            formula: self.formula,
            current_value: self.current_value,
            baseline_value: self.baseline_value,
            baseline_status: self.baseline_status,
            calculation_date: self.calculation_date,
            classification_id: self.classification_id,
        }
    }
}
