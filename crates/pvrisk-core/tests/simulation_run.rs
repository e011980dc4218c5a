// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PVRisk.

//! End-to-end simulation runs over the sample reference data.

use pvrisk_core::environment::FixedEnvironment;
use pvrisk_core::runner::EnvironmentOrigin;
use pvrisk_core::{
    CsvReferenceStore, EnvironmentSource, ModelKind, PvRiskError, ReferenceData, RiskAnalysis,
    RunSettings, SimulationRunner, StressProfileCatalog,
};
use pvrisk_types::{
    ArrayOrientation, EnvironmentOverrides, EnvironmentalSummary, Location, SimulationRequest,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

struct UnreachableEnvironment;

impl EnvironmentSource for UnreachableEnvironment {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn summarize(&self, _location: &Location) -> pvrisk_core::Result<EnvironmentalSummary> {
        Err(PvRiskError::EnvironmentalFetch("service unavailable".to_owned()))
    }
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

fn reference() -> Arc<ReferenceData> {
    Arc::new(ReferenceData::load(&CsvReferenceStore::new(data_dir())).expect("sample data loads"))
}

fn runner_with(environment: Arc<dyn EnvironmentSource>) -> SimulationRunner {
    SimulationRunner::new(reference(), environment, RunSettings::default())
}

fn hot_site() -> Arc<dyn EnvironmentSource> {
    Arc::new(FixedEnvironment::new(EnvironmentalSummary::new(
        45.0,
        Some(60.0),
        250.0,
    )))
}

fn profile(name: &str) -> pvrisk_types::StressProfile {
    StressProfileCatalog::builtin().get(name).unwrap().clone()
}

#[test]
fn test_default_bom_uses_weibull_model() {
    let runner = runner_with(hot_site());
    let bom = runner.reference().bom_catalog.default_selection();
    let request = SimulationRequest::new(Location::named("Phoenix"), bom, profile("IEC 61215"))
        .with_rated_power(400.0);

    let report = runner.run(&request).unwrap();

    assert_eq!(report.degradation.diagnostics.model, ModelKind::Weibull);
    assert!(report.degradation.diagnostics.weibull_available);
    let series = report.degradation.series().unwrap();
    assert_eq!(series.len(), 25);
    assert_eq!(series.first().unwrap().year, 1);
    assert_eq!(series.last().unwrap().year, 25);
    assert!(series.iter().all(|r| r.power_w.unwrap() <= 400.0));

    assert_eq!(
        report.environment_origin,
        EnvironmentOrigin::Provider("fixed".to_owned())
    );
    assert!((report.total_stress_score - 6.0).abs() < 1e-12);

    let risk = report.risk.report().expect("IEC profile is applicable");
    assert!(!risk.no_risks_found());
    assert_eq!(risk.components.len(), 6, "one summary per BOM slot");

    let financials = report.financials.expect("rated power enables financials");
    assert!(financials.lifetime_energy_kwh < financials.annual_energy_kwh * 25.0);
}

#[test]
fn test_cell_without_weibull_falls_back() {
    let runner = runner_with(hot_site());
    let bom = runner
        .reference()
        .resolve_bom(&[("Cell".to_owned(), "HJT".to_owned())], true)
        .unwrap();
    let request = SimulationRequest::new(Location::named("Phoenix"), bom, profile("IEC 61215"));

    let report = runner.run(&request).unwrap();

    assert!(!report.degradation.diagnostics.weibull_available);
    assert_eq!(report.degradation.diagnostics.model, ModelKind::Empirical);
    assert_eq!(report.degradation.diagnostics.missing_weibull.len(), 1);
    assert!(report.degradation.series().is_none());
    assert!(report.financials.is_none());
}

#[test]
fn test_field_only_profile_marks_risk_not_applicable() {
    let runner = runner_with(hot_site());
    let bom = runner.reference().bom_catalog.default_selection();
    let request = SimulationRequest::new(Location::named("Prague"), bom, profile("Field Only"));

    let report = runner.run(&request).unwrap();
    assert_eq!(report.risk, RiskAnalysis::NotApplicable);
    assert!(report.total_stress_score.abs() < f64::EPSILON);
}

#[test]
fn test_complete_overrides_skip_the_provider() {
    let runner = runner_with(Arc::new(UnreachableEnvironment));
    let bom = runner.reference().bom_catalog.default_selection();
    let overrides = EnvironmentOverrides {
        mean_temperature_c: Some(30.0),
        mean_relative_humidity_pct: None,
        mean_irradiance_wm2: Some(300.0),
        damp_heat_hours: None,
    };
    let request = SimulationRequest::new(Location::named("Madrid"), bom, profile("Desert"))
        .with_overrides(overrides);

    let report = runner.run(&request).unwrap();
    assert_eq!(report.environment_origin, EnvironmentOrigin::Overrides);
    assert!((report.environment.mean_temperature_c - 30.0).abs() < f64::EPSILON);
}

#[test]
fn test_fetch_failure_aborts_run() {
    let runner = runner_with(Arc::new(UnreachableEnvironment));
    let bom = runner.reference().bom_catalog.default_selection();
    let overrides = EnvironmentOverrides {
        mean_temperature_c: Some(30.0),
        ..EnvironmentOverrides::default()
    };
    let request = SimulationRequest::new(Location::named("Madrid"), bom, profile("Desert"))
        .with_overrides(overrides);

    let err = runner.run(&request).unwrap_err();
    assert!(matches!(err, PvRiskError::EnvironmentalFetch(_)));
}

#[test]
fn test_incomplete_bom_is_rejected() {
    let runner = runner_with(hot_site());
    let mut bom = pvrisk_types::BomSelection::default();
    bom.select(
        runner
            .reference()
            .bom_catalog
            .find("Cell", "PERC")
            .unwrap()
            .clone(),
    );
    let request = SimulationRequest::new(Location::named("Prague"), bom, profile("IEC 61215"));

    let err = runner.run(&request).unwrap_err();
    match err {
        PvRiskError::IncompleteBom { missing } => assert_eq!(missing.len(), 5),
        other => panic!("expected IncompleteBom, got {other:?}"),
    }
}

#[test]
fn test_runs_are_reproducible() {
    let runner = runner_with(hot_site());
    let bom = runner.reference().bom_catalog.default_selection();
    let request = SimulationRequest::new(Location::named("Riyadh"), bom, profile("Desert"))
        .with_rated_power(450.0);

    assert_eq!(runner.run(&request).unwrap(), runner.run(&request).unwrap());
}

#[test]
fn test_missing_reference_directory() {
    let dir = TempDir::new().unwrap();
    let err = ReferenceData::load(&CsvReferenceStore::new(dir.path().join("absent"))).unwrap_err();
    assert!(matches!(err, PvRiskError::MissingReferenceData { .. }));
}

#[test]
fn test_sample_stress_profiles_merge() {
    let mut catalog = StressProfileCatalog::builtin();
    let added = catalog
        .merge_file(&data_dir().join("stress_profiles.toml"))
        .unwrap();
    assert_eq!(added, 2);
    assert_eq!(catalog.get("marine").unwrap().len(), 3);
}

#[test]
fn test_request_from_json_keeps_selection_rules() {
    let runner = runner_with(hot_site());
    let bom = runner.reference().bom_catalog.default_selection();
    let request = SimulationRequest::new(Location::named("Phoenix"), bom, profile("IEC 61215"));
    let valid = serde_json::to_value(&request).unwrap();

    let parsed: SimulationRequest = serde_json::from_value(valid.clone()).unwrap();
    assert_eq!(parsed, request);
    assert!(runner.run(&parsed).is_ok());

    let mut two_cells = valid.clone();
    let hjt = serde_json::to_value(runner.reference().bom_catalog.find("Cell", "HJT").unwrap())
        .unwrap();
    two_cells["bom"]["slots"].as_array_mut().unwrap().push(hjt);
    let err = serde_json::from_value::<SimulationRequest>(two_cells).unwrap_err();
    assert!(err.to_string().contains("Cell"), "{err}");

    let mut repeated_test = valid;
    repeated_test["stress_profile"]["tests"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({"identifier": "uv", "severity_weight": 1.0}));
    assert!(serde_json::from_value::<SimulationRequest>(repeated_test).is_err());
}

#[test]
fn test_monthly_energy_follows_orientation() {
    let runner = runner_with(hot_site());
    let run = |orientation: ArrayOrientation| {
        let bom = runner.reference().bom_catalog.default_selection();
        let request = SimulationRequest::new(Location::named("Prague"), bom, profile("IEC 61215"))
            .with_rated_power(400.0)
            .with_orientation(orientation);
        runner.run(&request).unwrap().financials.unwrap()
    };

    let flat = run(ArrayOrientation::flat());
    let south = run(ArrayOrientation::new(35.0, 180.0));
    let north = run(ArrayOrientation::new(35.0, 0.0));

    for estimate in [&flat, &south, &north] {
        assert_eq!(estimate.monthly_energy.len(), 12);
        let total: f64 = estimate.monthly_energy.iter().map(|m| m.energy_kwh).sum();
        assert!((total - estimate.annual_energy_kwh).abs() < 1e-9);
    }
    assert!(south.annual_energy_kwh > flat.annual_energy_kwh);
    assert!(north.annual_energy_kwh < flat.annual_energy_kwh);
    assert!(flat.monthly_energy[5].energy_kwh > flat.monthly_energy[11].energy_kwh);
}

#[test]
fn test_energy_estimate_needs_a_known_site() {
    let runner = runner_with(hot_site());
    let bom = runner.reference().bom_catalog.default_selection();
    let request = SimulationRequest::new(Location::named("Atlantis"), bom, profile("IEC 61215"));
    assert!(runner.run(&request).is_ok(), "no energy estimate without rated power");

    let err = runner.run(&request.with_rated_power(400.0)).unwrap_err();
    assert!(matches!(err, PvRiskError::UnknownLocation(_)));

    let bom = runner.reference().bom_catalog.default_selection();
    let tilted_too_far =
        SimulationRequest::new(Location::named("Prague"), bom, profile("IEC 61215"))
            .with_rated_power(400.0)
            .with_orientation(ArrayOrientation::new(120.0, 180.0));
    assert!(matches!(
        runner.run(&tilted_too_far).unwrap_err(),
        PvRiskError::InvalidParameter(_)
    ));
}
