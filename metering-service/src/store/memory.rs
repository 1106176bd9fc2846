use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use metering_client::domain::{
    Baseline, Classification, ClassificationType, EnpiDefinition, Indicator, NewBaseline,
    NewClassification, NewEnpiDefinition, NewIndicator, NewReading, NewTarget, Reading,
    ReadingFilter, Target,
};
use time::OffsetDateTime;

use super::MeteringStore;

#[derive(Default)]
struct Tables {
    classifications: Vec<Classification>,
    readings: Vec<Reading>,
    indicators: Vec<Indicator>,
    baselines: Vec<Baseline>,
    definitions: Vec<EnpiDefinition>,
    targets: Vec<Target>,
    next_classification_id: i32,
    next_reading_id: i64,
    next_indicator_id: i32,
    next_baseline_id: i32,
    next_definition_id: i32,
    next_target_id: i32,
}

/// In-process store with the same semantics as [`super::PgStore`]: inclusive
/// reading filters, foreign-key checks and cascading classification deletes.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the three default classifications.
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut t = store.tables.lock().unwrap_or_else(|e| e.into_inner());
            for (name, kind) in [
                ("Main Building", ClassificationType::Facility),
                ("Server Room", ClassificationType::Equipment),
                ("Production Line A", ClassificationType::ProductionLine),
            ] {
                t.next_classification_id += 1;
                let id = t.next_classification_id;
                t.classifications.push(Classification {
                    id,
                    name: name.to_string(),
                    kind,
                });
            }
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

fn ensure_classification(t: &Tables, id: i32) -> Result<()> {
    if t.classifications.iter().any(|c| c.id == id) {
        Ok(())
    } else {
        bail!("foreign key violation: classification {id} does not exist")
    }
}

fn ensure_definition(t: &Tables, id: i32) -> Result<()> {
    if t.definitions.iter().any(|d| d.id == id) {
        Ok(())
    } else {
        bail!("foreign key violation: enpi definition {id} does not exist")
    }
}

impl Tables {
    fn remove_definitions(&mut self, keep: impl Fn(&EnpiDefinition) -> bool) -> bool {
        let before = self.definitions.len();
        self.definitions.retain(|d| keep(d));
        let Tables { definitions, targets, .. } = self;
        targets.retain(|tg| definitions.iter().any(|d| d.id == tg.definition_id));
        self.definitions.len() != before
    }
}

#[async_trait::async_trait]
impl MeteringStore for MemoryStore {
    async fn list_classifications(&self) -> Result<Vec<Classification>> {
        Ok(self.lock()?.classifications.clone())
    }

    async fn get_classification(&self, id: i32) -> Result<Option<Classification>> {
        Ok(self.lock()?.classifications.iter().find(|c| c.id == id).cloned())
    }

    async fn create_classification(&self, new: &NewClassification) -> Result<Classification> {
        let mut t = self.lock()?;
        t.next_classification_id += 1;
        let row = Classification {
            id: t.next_classification_id,
            name: new.name.clone(),
            kind: new.kind.clone(),
        };
        t.classifications.push(row.clone());
        Ok(row)
    }

    async fn update_classification(&self, id: i32, new: &NewClassification) -> Result<Option<Classification>> {
        let mut t = self.lock()?;
        Ok(t.classifications.iter_mut().find(|c| c.id == id).map(|c| {
            c.name = new.name.clone();
            c.kind = new.kind.clone();
            c.clone()
        }))
    }

    async fn delete_classification(&self, id: i32) -> Result<bool> {
        let mut t = self.lock()?;
        let before = t.classifications.len();
        t.classifications.retain(|c| c.id != id);
        if t.classifications.len() == before {
            return Ok(false);
        }
        t.readings.retain(|r| r.classification_id != id);
        t.indicators.retain(|i| i.classification_id != id);
        t.baselines.retain(|b| b.classification_id != id);
        t.remove_definitions(|d| d.classification_id != id);
        Ok(true)
    }

    async fn readings(&self, filter: &ReadingFilter) -> Result<Vec<Reading>> {
        let t = self.lock()?;
        let mut rows: Vec<Reading> = t.readings.iter().filter(|r| filter.matches(*r)).cloned().collect();
        rows.sort_by(|a, b| a.ts.cmp(&b.ts).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert_readings(&self, readings: &[NewReading]) -> Result<Vec<Reading>> {
        let mut t = self.lock()?;
        for r in readings {
            ensure_classification(&t, r.classification_id)?;
        }
        let mut inserted = Vec::with_capacity(readings.len());
        for r in readings {
            t.next_reading_id += 1;
            let row = r.clone().with_id(t.next_reading_id);
            t.readings.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn list_indicators(&self) -> Result<Vec<Indicator>> {
        Ok(self.lock()?.indicators.clone())
    }

    async fn get_indicator(&self, id: i32) -> Result<Option<Indicator>> {
        Ok(self.lock()?.indicators.iter().find(|i| i.id == id).cloned())
    }

    async fn insert_indicator(&self, new: &NewIndicator) -> Result<Indicator> {
        let mut t = self.lock()?;
        ensure_classification(&t, new.classification_id)?;
        t.next_indicator_id += 1;
        let row = new.clone().with_id(t.next_indicator_id);
        t.indicators.push(row.clone());
        Ok(row)
    }

    async fn delete_indicator(&self, id: i32) -> Result<bool> {
        let mut t = self.lock()?;
        let before = t.indicators.len();
        t.indicators.retain(|i| i.id != id);
        Ok(t.indicators.len() != before)
    }

    async fn list_baselines(&self) -> Result<Vec<Baseline>> {
        Ok(self.lock()?.baselines.clone())
    }

    async fn get_baseline(&self, id: i32) -> Result<Option<Baseline>> {
        Ok(self.lock()?.baselines.iter().find(|b| b.id == id).cloned())
    }

    async fn insert_baseline(&self, new: &NewBaseline) -> Result<Baseline> {
        let mut t = self.lock()?;
        ensure_classification(&t, new.classification_id)?;
        t.next_baseline_id += 1;
        let row = new.clone().with_id(t.next_baseline_id);
        t.baselines.push(row.clone());
        Ok(row)
    }

    async fn delete_baseline(&self, id: i32) -> Result<bool> {
        let mut t = self.lock()?;
        let before = t.baselines.len();
        t.baselines.retain(|b| b.id != id);
        Ok(t.baselines.len() != before)
    }

    async fn list_definitions(&self) -> Result<Vec<EnpiDefinition>> {
        Ok(self.lock()?.definitions.clone())
    }

    async fn get_definition(&self, id: i32) -> Result<Option<EnpiDefinition>> {
        Ok(self.lock()?.definitions.iter().find(|d| d.id == id).cloned())
    }

    async fn insert_definition(&self, new: &NewEnpiDefinition) -> Result<EnpiDefinition> {
        let mut t = self.lock()?;
        ensure_classification(&t, new.classification_id)?;
        t.next_definition_id += 1;
        let row = new.clone().with_id(t.next_definition_id, OffsetDateTime::now_utc());
        t.definitions.push(row.clone());
        Ok(row)
    }

    async fn update_definition(&self, id: i32, new: &NewEnpiDefinition) -> Result<Option<EnpiDefinition>> {
        let mut t = self.lock()?;
        ensure_classification(&t, new.classification_id)?;
        Ok(t.definitions.iter_mut().find(|d| d.id == id).map(|d| {
            *d = new.clone().with_id(id, d.created_at);
            d.clone()
        }))
    }

    async fn delete_definition(&self, id: i32) -> Result<bool> {
        Ok(self.lock()?.remove_definitions(|d| d.id != id))
    }

    async fn list_targets(&self, definition_id: Option<i32>) -> Result<Vec<Target>> {
        let t = self.lock()?;
        Ok(t.targets
            .iter()
            .filter(|tg| definition_id.map_or(true, |id| tg.definition_id == id))
            .cloned()
            .collect())
    }

    async fn get_target(&self, id: i32) -> Result<Option<Target>> {
        Ok(self.lock()?.targets.iter().find(|tg| tg.id == id).cloned())
    }

    async fn insert_target(&self, new: &NewTarget) -> Result<Target> {
        let mut t = self.lock()?;
        ensure_definition(&t, new.definition_id)?;
        t.next_target_id += 1;
        let row = new.clone().with_id(t.next_target_id);
        t.targets.push(row.clone());
        Ok(row)
    }

    async fn update_target(&self, id: i32, new: &NewTarget) -> Result<Option<Target>> {
        let mut t = self.lock()?;
        ensure_definition(&t, new.definition_id)?;
        Ok(t.targets.iter_mut().find(|tg| tg.id == id).map(|tg| {
            *tg = new.clone().with_id(id);
            tg.clone()
        }))
    }

    async fn delete_target(&self, id: i32) -> Result<bool> {
        let mut t = self.lock()?;
        let before = t.targets.len();
        t.targets.retain(|tg| tg.id != id);
        Ok(t.targets.len() != before)
    }
}
