use std::fmt;

use time::OffsetDateTime;

use super::IndicatorFormula;

/// A named EnPI set up once for a classification and recalculated over
/// different windows. Normalization is recorded but not applied.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EnpiDefinition {
    pub id: i32,
    pub name: String,
    pub classification_id: i32,
    #[sqlx(try_from = "String")]
    pub formula: IndicatorFormula,
    pub normalize_by: String,
    pub normalization_unit: Option<String>,
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
}

pub const NO_NORMALIZATION: &str = "None";

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct NewEnpiDefinition {
    pub name: String,
    pub classification_id: i32,
    pub formula: IndicatorFormula,
    #[cfg_attr(feature = "serde", serde(default = "default_normalize_by"))]
    pub normalize_by: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub normalization_unit: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

#[cfg(feature = "serde")]
fn default_normalize_by() -> String {
    NO_NORMALIZATION.to_string()
}

impl NewEnpiDefinition {
    pub fn with_id(self, id: i32, created_at: OffsetDateTime) -> EnpiDefinition {
        EnpiDefinition {
            id,
            name: self.name,
            classification_id: self.classification_id,
            formula: self.formula,
            normalize_by: self.normalize_by,
            normalization_unit: self.normalization_unit,
            description: self.description,
            created_at,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown target type '{0}'")]
pub struct ParseTargetKindError(pub String);

/// How `target_value` is read: a percentage reduction against the baseline,
/// or a level the indicator should reach or stay under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "&'static str"))]
pub enum TargetKind {
    Reduction,
    AbsoluteValue,
    MaximumValue,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reduction => "Reduction",
            Self::AbsoluteValue => "AbsoluteValue",
            Self::MaximumValue => "MaximumValue",
        }
    }
}

impl TryFrom<String> for TargetKind {
    type Error = ParseTargetKindError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "Reduction" => Ok(Self::Reduction),
            "AbsoluteValue" => Ok(Self::AbsoluteValue),
            "MaximumValue" => Ok(Self::MaximumValue),
            _ => Err(ParseTargetKindError(s)),
        }
    }
}

impl From<TargetKind> for &'static str {
    fn from(kind: TargetKind) -> Self {
        kind.as_str()
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Target {
    pub id: i32,
    pub definition_id: i32,
    #[sqlx(rename = "target_type", try_from = "String")]
    #[cfg_attr(feature = "serde", serde(rename = "target_type"))]
    pub kind: TargetKind,
    pub target_value: f64,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub target_date: OffsetDateTime,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct NewTarget {
    pub definition_id: i32,
    #[cfg_attr(feature = "serde", serde(rename = "target_type"))]
    pub kind: TargetKind,
    pub target_value: f64,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub target_date: OffsetDateTime,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

impl NewTarget {
    pub fn with_id(self, id: i32) -> Target {
        Target {
            id,
            definition_id: self.definition_id,
            kind: self.kind,
            target_value: self.target_value,
            target_date: self.target_date,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_kinds_parse_from_their_text() {
        for kind in [TargetKind::Reduction, TargetKind::AbsoluteValue, TargetKind::MaximumValue] {
            assert_eq!(TargetKind::try_from(kind.as_str().to_string()), Ok(kind));
        }
        assert_eq!(
            TargetKind::try_from("Increase".to_string()),
            Err(ParseTargetKindError("Increase".to_string()))
        );
    }
}
