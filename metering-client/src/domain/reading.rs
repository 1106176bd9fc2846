use time::OffsetDateTime;

/// Read access shared by persisted and not-yet-persisted readings, so the
/// aggregation code can run over either.
pub trait Measurement {
    fn ts(&self) -> OffsetDateTime;
    fn classification_id(&self) -> i32;
    fn energy_value(&self) -> f64;
    fn power(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reading {
    pub id: i64,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub ts: OffsetDateTime,
    pub classification_id: i32,
    pub energy_value: f64,
    pub power: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewReading {
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub ts: OffsetDateTime,
    pub classification_id: i32,
    pub energy_value: f64,
    pub power: f64,
}

impl Measurement for Reading {
    fn ts(&self) -> OffsetDateTime {
        self.ts
    }

    fn classification_id(&self) -> i32 {
        self.classification_id
    }

    fn energy_value(&self) -> f64 {
        self.energy_value
    }

    fn power(&self) -> f64 {
        self.power
    }
}

impl Measurement for NewReading {
    fn ts(&self) -> OffsetDateTime {
        self.ts
    }

    fn classification_id(&self) -> i32 {
        self.classification_id
    }

    fn energy_value(&self) -> f64 {
        self.energy_value
    }

    fn power(&self) -> f64 {
        self.power
    }
}

impl NewReading {
    pub fn with_id(self, id: i64) -> Reading {
        Reading {
            id,
            ts: self.ts,
            classification_id: self.classification_id,
            energy_value: self.energy_value,
            power: self.power,
        }
    }
}

/// Selection applied by the storage layer. Both time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct ReadingFilter {
    #[cfg_attr(feature = "serde", serde(default))]
    pub classification_id: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default, with = "time::serde::rfc3339::option"))]
    pub start: Option<OffsetDateTime>,
    #[cfg_attr(feature = "serde", serde(default, with = "time::serde::rfc3339::option"))]
    pub end: Option<OffsetDateTime>,
}

impl ReadingFilter {
    pub fn for_window(classification_id: i32, start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self {
            classification_id: Some(classification_id),
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn matches<M: Measurement + ?Sized>(&self, m: &M) -> bool {
        if let Some(id) = self.classification_id {
            if m.classification_id() != id {
                return false;
            }
        }
        if let Some(start) = self.start {
            if m.ts() < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if m.ts() > end {
                return false;
            }
        }
        true
    }
}
