//! Request-level operations: argument checks, store lookups, and the calls
//! into the generator, indicator engine and report aggregations.

use std::{collections::HashMap, sync::Arc};

use metering_client::domain::{
    Baseline, Classification, EnpiDefinition, Indicator, IndicatorFormula, NewBaseline,
    NewClassification, NewEnpiDefinition, NewIndicator, NewTarget, Reading, ReadingFilter, Target,
    TargetKind, NO_NORMALIZATION,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    config::GeneratorConfig,
    error::{MeteringError, Result},
    generator::{self, SeriesParams},
    indicators::{self, BaselineInput, TimeWindow},
    report::{self, ClassificationTotals, DailyPoint, GroupBy, LoadHeatmap, Metric, ParetoEntry, Summary},
    store::MeteringStore,
};

/// Omitted numeric parameters fall back to the `[generator]` config defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub classification_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    #[serde(default)]
    pub interval_minutes: Option<i64>,
    #[serde(default)]
    pub base_value: Option<f64>,
    #[serde(default)]
    pub variance: Option<f64>,
    /// Fixes the noise source; omitted means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Baseline may come from explicit bounds or from a stored baseline, not both.
///
/// With `definition_id` set, the formula and classification come from the
/// stored definition; `formula` and `classification_id` may then be left
/// out, and a blank `name` takes the definition's name.
#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub classification_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub baseline_start: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub baseline_end: Option<OffsetDateTime>,
    #[serde(default)]
    pub baseline_id: Option<i32>,
    #[serde(default)]
    pub definition_id: Option<i32>,
}

/// Name, formula and classification an indicator calculation runs with.
struct ResolvedIndicator {
    name: String,
    formula: IndicatorFormula,
    classification_id: i32,
}

pub struct MeteringService {
    store: Arc<dyn MeteringStore>,
    generator: GeneratorConfig,
}

fn describe_filter(filter: &ReadingFilter) -> String {
    let class = filter
        .classification_id
        .map(|id| format!("classification {id}"))
        .unwrap_or_else(|| "all classifications".to_string());
    let start = filter.start.map(|t| t.to_string()).unwrap_or_else(|| "-inf".to_string());
    let end = filter.end.map(|t| t.to_string()).unwrap_or_else(|| "+inf".to_string());
    format!("{class} in [{start}, {end}]")
}

fn validate_filter(filter: &ReadingFilter) -> Result<()> {
    if let (Some(start), Some(end)) = (filter.start, filter.end) {
        TimeWindow::new(start, end)?;
    }
    Ok(())
}

fn validate_definition(new: &NewEnpiDefinition) -> Result<NewEnpiDefinition> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(MeteringError::InvalidArgument("definition name must not be empty".to_string()));
    }
    let normalize_by = match new.normalize_by.trim() {
        "" => NO_NORMALIZATION,
        other => other,
    };
    Ok(NewEnpiDefinition {
        name: name.to_string(),
        normalize_by: normalize_by.to_string(),
        ..new.clone()
    })
}

fn validate_target(new: &NewTarget) -> Result<()> {
    let v = new.target_value;
    if !v.is_finite() {
        return Err(MeteringError::InvalidArgument("target_value must be finite".to_string()));
    }
    match new.kind {
        TargetKind::Reduction if v <= 0.0 || v > 100.0 => Err(MeteringError::InvalidArgument(format!(
            "reduction target must be a percentage in (0, 100], got {v}"
        ))),
        TargetKind::AbsoluteValue | TargetKind::MaximumValue if v < 0.0 => Err(MeteringError::InvalidArgument(
            format!("{} target must be >= 0, got {v}", new.kind),
        )),
        _ => Ok(()),
    }
}

fn validate_classification(new: &NewClassification) -> Result<NewClassification> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(MeteringError::InvalidArgument("classification name must not be empty".to_string()));
    }
    if new.kind.as_str().trim().is_empty() {
        return Err(MeteringError::InvalidArgument("classification type must not be empty".to_string()));
    }
    Ok(NewClassification {
        name: name.to_string(),
        kind: new.kind.clone(),
    })
}

impl MeteringService {
    pub fn new(store: Arc<dyn MeteringStore>, generator: GeneratorConfig) -> Self {
        Self { store, generator }
    }

    pub fn store(&self) -> &Arc<dyn MeteringStore> {
        &self.store
    }

    // ---- classifications ------------------------------------------------

    pub async fn list_classifications(&self) -> Result<Vec<Classification>> {
        Ok(self.store.list_classifications().await?)
    }

    pub async fn get_classification(&self, id: i32) -> Result<Classification> {
        self.store
            .get_classification(id)
            .await?
            .ok_or(MeteringError::ClassificationNotFound(id))
    }

    pub async fn create_classification(&self, new: &NewClassification) -> Result<Classification> {
        let new = validate_classification(new)?;
        let created = self.store.create_classification(&new).await?;
        tracing::info!(id = created.id, name = %created.name, kind = %created.kind, "classification created");
        Ok(created)
    }

    pub async fn update_classification(&self, id: i32, new: &NewClassification) -> Result<Classification> {
        let new = validate_classification(new)?;
        self.store
            .update_classification(id, &new)
            .await?
            .ok_or(MeteringError::ClassificationNotFound(id))
    }

    /// Removes the classification together with its readings, indicators and baselines.
    pub async fn delete_classification(&self, id: i32) -> Result<()> {
        if !self.store.delete_classification(id).await? {
            return Err(MeteringError::ClassificationNotFound(id));
        }
        tracing::info!(id, "classification deleted");
        Ok(())
    }

    async fn classification_names(&self) -> Result<HashMap<i32, String>> {
        Ok(self
            .store
            .list_classifications()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect())
    }

    // ---- readings -------------------------------------------------------

    pub async fn list_readings(&self, filter: &ReadingFilter) -> Result<Vec<Reading>> {
        validate_filter(filter)?;
        Ok(self.store.readings(filter).await?)
    }

    /// Generate a synthetic series with a noise source built from the
    /// request's seed (or OS entropy) and persist it.
    pub async fn generate_readings(&self, req: &GenerationRequest) -> Result<Vec<Reading>> {
        let mut rng = match req.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.generate_readings_with(req, &mut rng).await
    }

    pub async fn generate_readings_with<R: Rng + Send + ?Sized>(
        &self,
        req: &GenerationRequest,
        rng: &mut R,
    ) -> Result<Vec<Reading>> {
        let params = self.series_params(req)?;

        if self.store.get_classification(params.classification_id).await?.is_none() {
            return Err(MeteringError::ClassificationNotFound(params.classification_id));
        }

        let series = generator::generate(&params, rng);
        let stored = self.store.insert_readings(&series).await?;

        metrics::counter!("readings_generated_total").increment(stored.len() as u64);
        tracing::info!(
            classification_id = params.classification_id,
            count = stored.len(),
            interval_minutes = params.interval_minutes,
            start = %params.start,
            end = %params.end,
            "generated synthetic readings"
        );

        Ok(stored)
    }

    fn series_params(&self, req: &GenerationRequest) -> Result<SeriesParams> {
        let params = SeriesParams {
            classification_id: req.classification_id,
            start: req.start,
            end: req.end,
            interval_minutes: req.interval_minutes.unwrap_or(self.generator.default_interval_minutes),
            base_value: req.base_value.unwrap_or(self.generator.default_base_value),
            variance: req.variance.unwrap_or(self.generator.default_variance),
        };

        if params.classification_id <= 0 {
            return Err(MeteringError::InvalidArgument(format!(
                "classification id must be positive, got {}",
                params.classification_id
            )));
        }
        if params.interval_minutes <= 0 {
            return Err(MeteringError::InvalidArgument(format!(
                "interval_minutes must be positive, got {}",
                params.interval_minutes
            )));
        }
        if params.step().is_none() {
            return Err(MeteringError::InvalidArgument(format!(
                "interval_minutes {} is out of range",
                params.interval_minutes
            )));
        }
        TimeWindow::new(params.start, params.end)?;
        if !params.base_value.is_finite() {
            return Err(MeteringError::InvalidArgument("base_value must be finite".to_string()));
        }
        if !params.variance.is_finite() || params.variance < 0.0 {
            return Err(MeteringError::InvalidArgument(format!(
                "variance must be a finite value >= 0, got {}",
                params.variance
            )));
        }
        let points = params.point_count();
        if points > self.generator.max_points {
            return Err(MeteringError::InvalidArgument(format!(
                "request would generate {points} readings, limit is {}",
                self.generator.max_points
            )));
        }

        Ok(params)
    }

    // ---- indicators -----------------------------------------------------

    pub async fn list_indicators(&self) -> Result<Vec<Indicator>> {
        Ok(self.store.list_indicators().await?)
    }

    pub async fn get_indicator(&self, id: i32) -> Result<Indicator> {
        self.store
            .get_indicator(id)
            .await?
            .ok_or(MeteringError::NotFound {
                entity: "indicator",
                id: id.into(),
            })
    }

    pub async fn delete_indicator(&self, id: i32) -> Result<()> {
        if !self.store.delete_indicator(id).await? {
            return Err(MeteringError::NotFound {
                entity: "indicator",
                id: id.into(),
            });
        }
        Ok(())
    }

    /// Compute an indicator over readings the store selects for the request's
    /// classification and window, then persist it as a new row.
    pub async fn calculate_indicator(&self, req: &IndicatorRequest) -> Result<Indicator> {
        let ResolvedIndicator {
            name,
            formula,
            classification_id,
        } = self.resolve_indicator(req).await?;
        let window = TimeWindow::new(req.start, req.end)?;
        let baseline_window = self.resolve_baseline_window(req, classification_id).await?;

        self.get_classification(classification_id).await?;

        let readings = self
            .store
            .readings(&ReadingFilter::for_window(classification_id, window.start, window.end))
            .await?;
        if readings.is_empty() {
            metrics::counter!("indicator_no_data_total").increment(1);
            return Err(MeteringError::NoData(format!(
                "no readings for classification {classification_id} in {window} ({formula})"
            )));
        }

        let baseline_readings = match baseline_window {
            Some(w) => Some(
                self.store
                    .readings(&ReadingFilter::for_window(classification_id, w.start, w.end))
                    .await?,
            ),
            None => None,
        };
        let baseline = baseline_window
            .zip(baseline_readings.as_deref())
            .map(|(window, readings)| BaselineInput { readings, window });

        let values = indicators::calculate(formula, &readings, window, baseline)?;

        let indicator = self
            .store
            .insert_indicator(&NewIndicator {
                name,
                formula,
                current_value: values.current_value,
                baseline_value: values.baseline.value(),
                baseline_status: values.baseline.status(),
                calculation_date: OffsetDateTime::now_utc(),
                classification_id,
            })
            .await?;

        metrics::counter!("indicator_calculations_total").increment(1);
        tracing::info!(
            id = indicator.id,
            classification_id = indicator.classification_id,
            formula = %formula,
            current_value = indicator.current_value,
            baseline_value = indicator.baseline_value,
            baseline_status = indicator.baseline_status.as_str(),
            readings = readings.len(),
            "indicator calculated"
        );

        Ok(indicator)
    }

    async fn resolve_indicator(&self, req: &IndicatorRequest) -> Result<ResolvedIndicator> {
        let Some(definition_id) = req.definition_id else {
            let formula: IndicatorFormula = req.formula.parse()?;
            let name = req.name.trim();
            if name.is_empty() {
                return Err(MeteringError::InvalidArgument("indicator name must not be empty".to_string()));
            }
            return Ok(ResolvedIndicator {
                name: name.to_string(),
                formula,
                classification_id: req.classification_id,
            });
        };

        let definition = self.get_definition(definition_id).await?;
        let formula_text = req.formula.trim();
        if !formula_text.is_empty() {
            let formula: IndicatorFormula = formula_text.parse()?;
            if formula != definition.formula {
                return Err(MeteringError::InvalidArgument(format!(
                    "definition {definition_id} uses {}, request asked for {formula}",
                    definition.formula
                )));
            }
        }
        if req.classification_id != 0 && req.classification_id != definition.classification_id {
            return Err(MeteringError::InvalidArgument(format!(
                "definition {definition_id} belongs to classification {}, not {}",
                definition.classification_id, req.classification_id
            )));
        }

        let name = match req.name.trim() {
            "" => definition.name,
            given => given.to_string(),
        };
        Ok(ResolvedIndicator {
            name,
            formula: definition.formula,
            classification_id: definition.classification_id,
        })
    }

    async fn resolve_baseline_window(
        &self,
        req: &IndicatorRequest,
        classification_id: i32,
    ) -> Result<Option<TimeWindow>> {
        let explicit = match (req.baseline_start, req.baseline_end) {
            (Some(start), Some(end)) => Some(TimeWindow::new(start, end)?),
            (None, None) => None,
            _ => {
                tracing::warn!(
                    classification_id = classification_id,
                    "only one baseline bound given; calculating without baseline"
                );
                None
            }
        };

        match (req.baseline_id, explicit) {
            (Some(_), Some(_)) => Err(MeteringError::InvalidArgument(
                "give either baseline_id or baseline_start/baseline_end, not both".to_string(),
            )),
            (Some(id), None) => {
                let baseline = self.get_baseline(id).await?;
                if baseline.classification_id != classification_id {
                    return Err(MeteringError::InvalidArgument(format!(
                        "baseline {id} belongs to classification {}, not {}",
                        baseline.classification_id, classification_id
                    )));
                }
                Ok(Some(TimeWindow::new(baseline.start, baseline.end)?))
            }
            (None, window) => Ok(window),
        }
    }

    // ---- baselines ------------------------------------------------------

    pub async fn list_baselines(&self) -> Result<Vec<Baseline>> {
        Ok(self.store.list_baselines().await?)
    }

    pub async fn get_baseline(&self, id: i32) -> Result<Baseline> {
        self.store
            .get_baseline(id)
            .await?
            .ok_or(MeteringError::NotFound {
                entity: "baseline",
                id: id.into(),
            })
    }

    pub async fn create_baseline(&self, new: &NewBaseline) -> Result<Baseline> {
        TimeWindow::new(new.start, new.end)?;
        self.get_classification(new.classification_id).await?;
        let created = self.store.insert_baseline(new).await?;
        tracing::info!(id = created.id, classification_id = created.classification_id, "baseline created");
        Ok(created)
    }

    pub async fn delete_baseline(&self, id: i32) -> Result<()> {
        if !self.store.delete_baseline(id).await? {
            return Err(MeteringError::NotFound {
                entity: "baseline",
                id: id.into(),
            });
        }
        Ok(())
    }

    // ---- EnPI definitions and targets -----------------------------------

    pub async fn list_definitions(&self) -> Result<Vec<EnpiDefinition>> {
        Ok(self.store.list_definitions().await?)
    }

    pub async fn get_definition(&self, id: i32) -> Result<EnpiDefinition> {
        self.store
            .get_definition(id)
            .await?
            .ok_or(MeteringError::NotFound {
                entity: "enpi definition",
                id: id.into(),
            })
    }

    pub async fn create_definition(&self, new: &NewEnpiDefinition) -> Result<EnpiDefinition> {
        let new = validate_definition(new)?;
        self.get_classification(new.classification_id).await?;
        let created = self.store.insert_definition(&new).await?;
        tracing::info!(
            id = created.id,
            classification_id = created.classification_id,
            formula = %created.formula,
            "enpi definition created"
        );
        Ok(created)
    }

    pub async fn update_definition(&self, id: i32, new: &NewEnpiDefinition) -> Result<EnpiDefinition> {
        let new = validate_definition(new)?;
        self.get_classification(new.classification_id).await?;
        self.store
            .update_definition(id, &new)
            .await?
            .ok_or(MeteringError::NotFound {
                entity: "enpi definition",
                id: id.into(),
            })
    }

    /// Removes the definition and its targets.
    pub async fn delete_definition(&self, id: i32) -> Result<()> {
        if !self.store.delete_definition(id).await? {
            return Err(MeteringError::NotFound {
                entity: "enpi definition",
                id: id.into(),
            });
        }
        tracing::info!(id, "enpi definition deleted");
        Ok(())
    }

    pub async fn list_targets(&self, definition_id: Option<i32>) -> Result<Vec<Target>> {
        if let Some(id) = definition_id {
            self.get_definition(id).await?;
        }
        Ok(self.store.list_targets(definition_id).await?)
    }

    pub async fn get_target(&self, id: i32) -> Result<Target> {
        self.store
            .get_target(id)
            .await?
            .ok_or(MeteringError::NotFound {
                entity: "target",
                id: id.into(),
            })
    }

    pub async fn create_target(&self, new: &NewTarget) -> Result<Target> {
        validate_target(new)?;
        self.get_definition(new.definition_id).await?;
        let created = self.store.insert_target(new).await?;
        tracing::info!(id = created.id, definition_id = created.definition_id, kind = %created.kind, "target created");
        Ok(created)
    }

    pub async fn update_target(&self, id: i32, new: &NewTarget) -> Result<Target> {
        validate_target(new)?;
        self.get_definition(new.definition_id).await?;
        self.store
            .update_target(id, new)
            .await?
            .ok_or(MeteringError::NotFound {
                entity: "target",
                id: id.into(),
            })
    }

    pub async fn delete_target(&self, id: i32) -> Result<()> {
        if !self.store.delete_target(id).await? {
            return Err(MeteringError::NotFound {
                entity: "target",
                id: id.into(),
            });
        }
        Ok(())
    }

    // ---- reports --------------------------------------------------------

    async fn report_readings(&self, filter: &ReadingFilter) -> Result<Vec<Reading>> {
        validate_filter(filter)?;
        if let Some(id) = filter.classification_id {
            self.get_classification(id).await?;
        }
        let readings = self.store.readings(filter).await?;
        if readings.is_empty() {
            return Err(MeteringError::NoData(format!("no readings for {}", describe_filter(filter))));
        }
        Ok(readings)
    }

    pub async fn pareto_report(&self, filter: &ReadingFilter, group_by: GroupBy, metric: Metric) -> Result<Vec<ParetoEntry>> {
        let readings = self.report_readings(filter).await?;
        let names = self.classification_names().await?;
        report::pareto_report(&readings, group_by, metric, &names).map_err(|e| match e {
            MeteringError::NoData(msg) => MeteringError::NoData(format!("{msg} for {}", describe_filter(filter))),
            other => other,
        })
    }

    pub async fn heatmap_report(&self, filter: &ReadingFilter) -> Result<LoadHeatmap> {
        let readings = self.report_readings(filter).await?;
        Ok(report::hourly_heatmap(&readings))
    }

    pub async fn daily_report(&self, filter: &ReadingFilter) -> Result<Vec<DailyPoint>> {
        let readings = self.report_readings(filter).await?;
        Ok(report::daily_trend(&readings))
    }

    pub async fn summary_report(&self, filter: &ReadingFilter) -> Result<Summary> {
        let readings = self.report_readings(filter).await?;
        report::summarize(&readings)
    }

    pub async fn classification_report(&self, filter: &ReadingFilter) -> Result<Vec<ClassificationTotals>> {
        let readings = self.report_readings(filter).await?;
        let names = self.classification_names().await?;
        Ok(report::classification_breakdown(&readings, &names))
    }
}
