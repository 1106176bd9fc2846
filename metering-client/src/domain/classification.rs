use std::fmt;

/// Kind of energy-consumption grouping.
///
/// The well-known kinds are matched case-sensitively; any other text is kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum ClassificationType {
    Equipment,
    Facility,
    ProductionLine,
    Organization,
    Other(String),
}

impl ClassificationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equipment => "Equipment",
            Self::Facility => "Facility",
            Self::ProductionLine => "ProductionLine",
            Self::Organization => "Organization",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ClassificationType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Equipment" => Self::Equipment,
            "Facility" => Self::Facility,
            "ProductionLine" => Self::ProductionLine,
            "Organization" => Self::Organization,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for ClassificationType {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ClassificationType> for String {
    fn from(t: ClassificationType) -> Self {
        match t {
            ClassificationType::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ClassificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Classification {
    pub id: i32,
    pub name: String,
    #[sqlx(rename = "type", try_from = "String")]
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: ClassificationType,
}

/// Payload for creating or replacing a classification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct NewClassification {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: ClassificationType,
}
