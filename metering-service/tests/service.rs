use std::sync::Arc;

use metering_client::domain::{
    BaselineStatus, ClassificationType, IndicatorFormula, NewBaseline, NewClassification, NewEnpiDefinition,
    NewReading, NewTarget, ReadingFilter, TargetKind, NO_NORMALIZATION,
};
use metering_service::{
    config::GeneratorConfig,
    report::{GroupBy, Metric},
    service::{GenerationRequest, IndicatorRequest},
    store::{MemoryStore, MeteringStore},
    MeteringError, MeteringService,
};
use rand::{rngs::StdRng, SeedableRng};
use time::{macros::datetime, OffsetDateTime};

fn service() -> (Arc<MemoryStore>, MeteringService) {
    let store = Arc::new(MemoryStore::seeded());
    let service = MeteringService::new(store.clone(), GeneratorConfig::default());
    (store, service)
}

fn reading(ts: OffsetDateTime, classification_id: i32, energy_value: f64) -> NewReading {
    NewReading {
        ts,
        classification_id,
        energy_value,
        power: energy_value * 4.0,
    }
}

/// Classification 1 has three readings inside the current window, one just
/// after it and two in December; classification 2 has one reading in the window.
async fn seed_readings(store: &MemoryStore) {
    store
        .insert_readings(&[
            reading(datetime!(2023-12-04 00:00:00 UTC), 1, 4.0),
            reading(datetime!(2023-12-04 00:15:00 UTC), 1, 4.0),
            reading(datetime!(2024-01-01 00:00:00 UTC), 1, 1.0),
            reading(datetime!(2024-01-01 00:15:00 UTC), 1, 2.0),
            reading(datetime!(2024-01-01 00:30:00 UTC), 1, 3.0),
            reading(datetime!(2024-01-01 00:30:00 UTC), 2, 50.0),
            reading(datetime!(2024-01-02 00:00:00 UTC), 1, 100.0),
        ])
        .await
        .unwrap();
}

fn indicator_request(formula: &str) -> IndicatorRequest {
    IndicatorRequest {
        name: "Main building energy".to_string(),
        formula: formula.to_string(),
        classification_id: 1,
        start: datetime!(2024-01-01 00:00:00 UTC),
        end: datetime!(2024-01-01 00:30:00 UTC),
        baseline_start: None,
        baseline_end: None,
        baseline_id: None,
        definition_id: None,
    }
}

fn generation_request(classification_id: i32) -> GenerationRequest {
    GenerationRequest {
        classification_id,
        start: datetime!(2024-01-01 00:00:00 UTC),
        end: datetime!(2024-01-01 01:00:00 UTC),
        interval_minutes: None,
        base_value: None,
        variance: None,
        seed: Some(7),
    }
}

#[tokio::test]
async fn generated_readings_are_persisted_in_order() {
    let (store, service) = service();

    let readings = service.generate_readings(&generation_request(1)).await.unwrap();

    assert_eq!(readings.len(), 5);
    assert!(readings.windows(2).all(|w| w[0].ts < w[1].ts));
    assert!(readings.iter().all(|r| r.energy_value >= 0.0 && r.classification_id == 1));
    assert_eq!(readings.last().unwrap().ts, datetime!(2024-01-01 01:00:00 UTC));
    assert_eq!(store.readings(&ReadingFilter::default()).await.unwrap(), readings);
}

#[tokio::test]
async fn same_seed_gives_same_series() {
    let (_, a) = service();
    let (_, b) = service();

    let first: Vec<f64> = a
        .generate_readings(&generation_request(1))
        .await
        .unwrap()
        .iter()
        .map(|r| r.energy_value)
        .collect();
    let second: Vec<f64> = b
        .generate_readings(&generation_request(1))
        .await
        .unwrap()
        .iter()
        .map(|r| r.energy_value)
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn zero_variance_generation_is_deterministic_with_any_rng() {
    let (_, service) = service();
    let mut req = generation_request(1);
    req.variance = Some(0.0);
    req.interval_minutes = Some(60);
    req.seed = None;

    let mut rng = StdRng::seed_from_u64(99);
    let readings = service.generate_readings_with(&req, &mut rng).await.unwrap();

    // Monday night: 10 * 0.3 * 1.0 per hourly reading.
    assert_eq!(readings.len(), 2);
    for r in &readings {
        assert!((r.energy_value - 3.0).abs() < 1e-9);
        assert!((r.power - 3.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn generation_rejects_bad_arguments() {
    let (_, service) = service();

    let mut req = generation_request(1);
    req.interval_minutes = Some(0);
    assert!(matches!(
        service.generate_readings(&req).await,
        Err(MeteringError::InvalidArgument(_))
    ));

    let mut req = generation_request(1);
    req.end = datetime!(2023-12-31 00:00:00 UTC);
    assert!(matches!(
        service.generate_readings(&req).await,
        Err(MeteringError::InvalidArgument(_))
    ));

    let mut req = generation_request(1);
    req.variance = Some(-1.0);
    assert!(matches!(
        service.generate_readings(&req).await,
        Err(MeteringError::InvalidArgument(_))
    ));

    assert!(matches!(
        service.generate_readings(&generation_request(42)).await,
        Err(MeteringError::ClassificationNotFound(42))
    ));
}

#[tokio::test]
async fn generation_rejects_oversized_interval_without_panicking() {
    let (_, service) = service();

    for interval in [200_000_000_000_000_000, 400_000_000_000_000_000, i64::MAX] {
        let mut req = generation_request(1);
        req.interval_minutes = Some(interval);
        assert!(matches!(
            service.generate_readings(&req).await,
            Err(MeteringError::InvalidArgument(_))
        ));
    }

    let mut req = generation_request(1);
    req.interval_minutes = Some(10_000_000);
    let readings = service.generate_readings(&req).await.unwrap();
    assert_eq!(readings.len(), 1);
}

#[tokio::test]
async fn generation_respects_point_limit() {
    let store = Arc::new(MemoryStore::seeded());
    let service = MeteringService::new(
        store,
        GeneratorConfig {
            max_points: 4,
            ..GeneratorConfig::default()
        },
    );

    assert!(matches!(
        service.generate_readings(&generation_request(1)).await,
        Err(MeteringError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn indicator_uses_only_classification_and_window_readings() {
    let (store, service) = service();
    seed_readings(&store).await;

    let total = service.calculate_indicator(&indicator_request("TotalEnergy")).await.unwrap();
    assert_eq!(total.current_value, 6.0);
    assert_eq!(total.formula, IndicatorFormula::TotalEnergy);
    assert_eq!(total.baseline_value, 0.0);
    assert_eq!(total.baseline_status, BaselineStatus::NotRequested);

    let max = service.calculate_indicator(&indicator_request("MaxPower")).await.unwrap();
    assert_eq!(max.current_value, 12.0);

    let avg = service.calculate_indicator(&indicator_request("AvgPower")).await.unwrap();
    assert_eq!(avg.current_value, 8.0);

    let mut per_hour = indicator_request("EnergyPerHour");
    per_hour.end = datetime!(2024-01-01 01:00:00 UTC);
    let per_hour = service.calculate_indicator(&per_hour).await.unwrap();
    assert_eq!(per_hour.current_value, 6.0);

    // Every calculation is a new row.
    assert_eq!(service.list_indicators().await.unwrap().len(), 4);
}

#[tokio::test]
async fn indicator_with_explicit_baseline() {
    let (store, service) = service();
    seed_readings(&store).await;

    let mut req = indicator_request("TotalEnergy");
    req.baseline_start = Some(datetime!(2023-12-04 00:00:00 UTC));
    req.baseline_end = Some(datetime!(2023-12-04 00:15:00 UTC));

    let indicator = service.calculate_indicator(&req).await.unwrap();
    assert_eq!(indicator.current_value, 6.0);
    assert_eq!(indicator.baseline_value, 8.0);
    assert_eq!(indicator.baseline_status, BaselineStatus::Measured);
    assert_eq!(indicator.improvement_percent(), Some(25.0));
}

#[tokio::test]
async fn empty_baseline_window_is_not_an_error() {
    let (store, service) = service();
    seed_readings(&store).await;

    let mut req = indicator_request("TotalEnergy");
    req.baseline_start = Some(datetime!(2022-01-01 00:00:00 UTC));
    req.baseline_end = Some(datetime!(2022-01-02 00:00:00 UTC));

    let indicator = service.calculate_indicator(&req).await.unwrap();
    assert_eq!(indicator.baseline_value, 0.0);
    assert_eq!(indicator.baseline_status, BaselineStatus::NoData);
}

#[tokio::test]
async fn single_baseline_bound_means_no_baseline() {
    let (store, service) = service();
    seed_readings(&store).await;

    let mut req = indicator_request("TotalEnergy");
    req.baseline_start = Some(datetime!(2023-12-04 00:00:00 UTC));

    let indicator = service.calculate_indicator(&req).await.unwrap();
    assert_eq!(indicator.baseline_status, BaselineStatus::NotRequested);
}

#[tokio::test]
async fn indicator_with_stored_baseline() {
    let (store, service) = service();
    seed_readings(&store).await;

    let baseline = service
        .create_baseline(&NewBaseline {
            classification_id: 1,
            start: datetime!(2023-12-04 00:00:00 UTC),
            end: datetime!(2023-12-04 23:59:59 UTC),
            description: Some("December week".to_string()),
        })
        .await
        .unwrap();

    let mut req = indicator_request("TotalEnergy");
    req.baseline_id = Some(baseline.id);
    let indicator = service.calculate_indicator(&req).await.unwrap();
    assert_eq!(indicator.baseline_value, 8.0);

    req.baseline_start = Some(datetime!(2023-12-04 00:00:00 UTC));
    req.baseline_end = Some(datetime!(2023-12-05 00:00:00 UTC));
    assert!(matches!(
        service.calculate_indicator(&req).await,
        Err(MeteringError::InvalidArgument(_))
    ));

    let mut other = indicator_request("TotalEnergy");
    other.baseline_id = Some(baseline.id + 100);
    assert!(matches!(
        service.calculate_indicator(&other).await,
        Err(MeteringError::NotFound { entity: "baseline", .. })
    ));

    let mut wrong_class = indicator_request("TotalEnergy");
    wrong_class.classification_id = 2;
    wrong_class.baseline_id = Some(baseline.id);
    assert!(matches!(
        service.calculate_indicator(&wrong_class).await,
        Err(MeteringError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn indicator_errors() {
    let (store, service) = service();
    seed_readings(&store).await;

    assert!(matches!(
        service.calculate_indicator(&indicator_request("Median")).await,
        Err(MeteringError::InvalidFormula(_))
    ));

    let mut req = indicator_request("TotalEnergy");
    req.classification_id = 42;
    assert!(matches!(
        service.calculate_indicator(&req).await,
        Err(MeteringError::ClassificationNotFound(42))
    ));

    let mut req = indicator_request("TotalEnergy");
    req.classification_id = 3;
    assert!(matches!(service.calculate_indicator(&req).await, Err(MeteringError::NoData(_))));

    let mut req = indicator_request("TotalEnergy");
    req.end = datetime!(2023-01-01 00:00:00 UTC);
    assert!(matches!(
        service.calculate_indicator(&req).await,
        Err(MeteringError::InvalidArgument(_))
    ));

    let mut req = indicator_request("TotalEnergy");
    req.name = "  ".to_string();
    assert!(matches!(
        service.calculate_indicator(&req).await,
        Err(MeteringError::InvalidArgument(_))
    ));

    assert!(service.list_indicators().await.unwrap().is_empty());
}

fn definition(classification_id: i32, formula: IndicatorFormula) -> NewEnpiDefinition {
    NewEnpiDefinition {
        name: " Building kWh ".to_string(),
        classification_id,
        formula,
        normalize_by: String::new(),
        normalization_unit: None,
        description: None,
    }
}

fn target(definition_id: i32, kind: TargetKind, target_value: f64) -> NewTarget {
    NewTarget {
        definition_id,
        kind,
        target_value,
        target_date: datetime!(2025-01-01 00:00:00 UTC),
        description: None,
    }
}

#[tokio::test]
async fn indicator_from_stored_definition() {
    let (store, service) = service();
    seed_readings(&store).await;

    let def = service
        .create_definition(&definition(1, IndicatorFormula::MaxPower))
        .await
        .unwrap();
    assert_eq!(def.name, "Building kWh");
    assert_eq!(def.normalize_by, NO_NORMALIZATION);

    let mut req = indicator_request("");
    req.name = String::new();
    req.classification_id = 0;
    req.definition_id = Some(def.id);
    let indicator = service.calculate_indicator(&req).await.unwrap();
    assert_eq!(indicator.name, "Building kWh");
    assert_eq!(indicator.formula, IndicatorFormula::MaxPower);
    assert_eq!(indicator.classification_id, 1);
    assert_eq!(indicator.current_value, 12.0);

    // Matching formula and classification are accepted; the request's name wins.
    let mut named = indicator_request("MaxPower");
    named.definition_id = Some(def.id);
    let indicator = service.calculate_indicator(&named).await.unwrap();
    assert_eq!(indicator.name, "Main building energy");

    let mut other_formula = indicator_request("TotalEnergy");
    other_formula.definition_id = Some(def.id);
    assert!(matches!(
        service.calculate_indicator(&other_formula).await,
        Err(MeteringError::InvalidArgument(_))
    ));

    let mut other_class = indicator_request("");
    other_class.classification_id = 2;
    other_class.definition_id = Some(def.id);
    assert!(matches!(
        service.calculate_indicator(&other_class).await,
        Err(MeteringError::InvalidArgument(_))
    ));

    let mut missing = indicator_request("");
    missing.definition_id = Some(def.id + 100);
    assert!(matches!(
        service.calculate_indicator(&missing).await,
        Err(MeteringError::NotFound { entity: "enpi definition", .. })
    ));

    assert_eq!(service.list_indicators().await.unwrap().len(), 2);
}

#[tokio::test]
async fn definitions_and_targets_crud() {
    let (_store, service) = service();

    assert!(matches!(
        service.create_definition(&definition(42, IndicatorFormula::TotalEnergy)).await,
        Err(MeteringError::ClassificationNotFound(42))
    ));
    let mut blank = definition(1, IndicatorFormula::TotalEnergy);
    blank.name = "   ".to_string();
    assert!(matches!(
        service.create_definition(&blank).await,
        Err(MeteringError::InvalidArgument(_))
    ));

    let def = service
        .create_definition(&definition(1, IndicatorFormula::TotalEnergy))
        .await
        .unwrap();
    let mut changed = definition(2, IndicatorFormula::AvgPower);
    changed.normalize_by = "Area".to_string();
    changed.normalization_unit = Some("m2".to_string());
    let updated = service.update_definition(def.id, &changed).await.unwrap();
    assert_eq!(updated.classification_id, 2);
    assert_eq!(updated.formula, IndicatorFormula::AvgPower);
    assert_eq!(updated.normalize_by, "Area");
    assert_eq!(updated.created_at, def.created_at);
    assert!(matches!(
        service.update_definition(def.id + 100, &changed).await,
        Err(MeteringError::NotFound { entity: "enpi definition", .. })
    ));

    let reduction = service
        .create_target(&target(def.id, TargetKind::Reduction, 10.0))
        .await
        .unwrap();
    service
        .create_target(&target(def.id, TargetKind::MaximumValue, 500.0))
        .await
        .unwrap();
    for bad in [
        target(def.id, TargetKind::Reduction, 0.0),
        target(def.id, TargetKind::Reduction, 150.0),
        target(def.id, TargetKind::AbsoluteValue, -1.0),
        target(def.id, TargetKind::MaximumValue, f64::NAN),
    ] {
        assert!(
            matches!(service.create_target(&bad).await, Err(MeteringError::InvalidArgument(_))),
            "{bad:?}"
        );
    }
    assert!(matches!(
        service.create_target(&target(def.id + 100, TargetKind::Reduction, 5.0)).await,
        Err(MeteringError::NotFound { entity: "enpi definition", .. })
    ));

    let raised = service
        .update_target(reduction.id, &target(def.id, TargetKind::Reduction, 15.0))
        .await
        .unwrap();
    assert_eq!(raised.target_value, 15.0);
    assert_eq!(service.list_targets(Some(def.id)).await.unwrap().len(), 2);
    assert!(matches!(
        service.list_targets(Some(def.id + 100)).await,
        Err(MeteringError::NotFound { entity: "enpi definition", .. })
    ));

    service.delete_target(reduction.id).await.unwrap();
    assert!(matches!(
        service.get_target(reduction.id).await,
        Err(MeteringError::NotFound { entity: "target", .. })
    ));
    assert_eq!(service.list_targets(None).await.unwrap().len(), 1);

    // Deleting the classification takes its definitions and their targets.
    service.delete_classification(2).await.unwrap();
    assert!(service.list_definitions().await.unwrap().is_empty());
    assert!(service.list_targets(None).await.unwrap().is_empty());
    assert!(matches!(
        service.delete_definition(def.id).await,
        Err(MeteringError::NotFound { entity: "enpi definition", .. })
    ));
}

#[tokio::test]
async fn pareto_report_by_classification() {
    let (store, service) = service();
    seed_readings(&store).await;

    let filter = ReadingFilter {
        classification_id: None,
        start: Some(datetime!(2024-01-01 00:00:00 UTC)),
        end: Some(datetime!(2024-01-01 23:59:59 UTC)),
    };
    let entries = service
        .pareto_report(&filter, GroupBy::Classification, Metric::Energy)
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key, "Server Room");
    assert_eq!(entries[0].value, 50.0);
    assert_eq!(entries[1].key, "Main Building");
    assert_eq!(entries[1].value, 6.0);
    assert!((entries[1].cumulative_percent - 100.0).abs() < 1e-9);

    let empty = ReadingFilter::for_window(3, datetime!(2024-01-01 00:00:00 UTC), datetime!(2024-01-02 00:00:00 UTC));
    assert!(matches!(
        service.pareto_report(&empty, GroupBy::HourOfDay, Metric::Power).await,
        Err(MeteringError::NoData(_))
    ));
}

#[tokio::test]
async fn summary_and_daily_reports() {
    let (store, service) = service();
    seed_readings(&store).await;

    let filter = ReadingFilter {
        classification_id: Some(1),
        ..ReadingFilter::default()
    };
    let summary = service.summary_report(&filter).await.unwrap();
    assert_eq!(summary.count, 6);
    assert_eq!(summary.total_energy, 114.0);
    assert_eq!(summary.max_power, 400.0);

    let daily = service.daily_report(&filter).await.unwrap();
    let dates: Vec<_> = daily.iter().map(|d| d.date.as_str()).collect();
    assert_eq!(dates, vec!["2023-12-04", "2024-01-01", "2024-01-02"]);
}

#[tokio::test]
async fn classification_crud_and_cascade() {
    let (store, service) = service();
    seed_readings(&store).await;

    let created = service
        .create_classification(&NewClassification {
            name: "  Chiller  ".to_string(),
            kind: ClassificationType::Equipment,
        })
        .await
        .unwrap();
    assert_eq!(created.name, "Chiller");

    assert!(matches!(
        service
            .create_classification(&NewClassification {
                name: " ".to_string(),
                kind: ClassificationType::Facility,
            })
            .await,
        Err(MeteringError::InvalidArgument(_))
    ));

    let renamed = service
        .update_classification(
            created.id,
            &NewClassification {
                name: "Chiller 1".to_string(),
                kind: ClassificationType::Other("HVAC".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.kind.as_str(), "HVAC");

    service.calculate_indicator(&indicator_request("TotalEnergy")).await.unwrap();
    service.delete_classification(1).await.unwrap();

    let remaining = service.list_readings(&ReadingFilter::default()).await.unwrap();
    assert!(remaining.iter().all(|r| r.classification_id != 1));
    assert!(service.list_indicators().await.unwrap().is_empty());
    assert!(matches!(
        service.get_classification(1).await,
        Err(MeteringError::ClassificationNotFound(1))
    ));
    assert!(matches!(
        service.delete_classification(1).await,
        Err(MeteringError::ClassificationNotFound(1))
    ));
}
