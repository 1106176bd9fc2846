use time::OffsetDateTime;

/// A stored reference period for a classification.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Baseline {
    pub id: i32,
    pub classification_id: i32,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub start: OffsetDateTime,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub end: OffsetDateTime,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct NewBaseline {
    pub classification_id: i32,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub start: OffsetDateTime,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub end: OffsetDateTime,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

impl NewBaseline {
    pub fn with_id(self, id: i32) -> Baseline {
        Baseline {
            id,
            classification_id: self.classification_id,
            start: self.start,
            end: self.end,
            description: self.description,
        }
    }
}
