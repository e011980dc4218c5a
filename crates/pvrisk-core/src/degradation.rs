// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PVRisk.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Degradation and reliability projection.
//!
//! Two model paths share one interface. The Weibull path needs reference
//! parameters for both the front encapsulant and the cell; when either is
//! missing the engine falls back to the empirical additive model and records
//! which lookups failed in [`ModelDiagnostics`].

use pvrisk_types::{
    BomSelection, ComponentSlot, DegradationResult, EnvironmentalSummary, StressProfile,
    WeibullParameters,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{PvRiskError, Result};
use crate::physics::{
    DEFAULT_ACTIVATION_ENERGY_EV, DEFAULT_REFERENCE_TEMPERATURE_K, acceleration_factor,
    weibull_survival,
};

/// Calibration constants of the degradation model.
///
/// None of these are validated physics; they are exposed so a deployment can
/// calibrate them against its own field data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConstants {
    /// Baseline first-year power loss at the reference temperature (%/yr)
    pub base_degradation_rate_pct: f64,
    /// Activation energy used for the empirical path (eV)
    pub activation_energy_ev: f64,
    pub reference_temperature_k: f64,
    /// Added first-year loss per stress-score point (%)
    pub stress_coefficient: f64,
    /// Humidity factor slope per RH percentage point
    pub humidity_coefficient: f64,
    pub humidity_reference_pct: f64,
    /// UV factor slope per UV index point
    pub uv_coefficient: f64,
    pub uv_reference_index: f64,
    /// Added first-year loss per damp-heat hour (%)
    pub damp_heat_coefficient: f64,
    /// Damp-heat sensitivity by backsheet material (case-insensitive keys)
    pub backsheet_factors: BTreeMap<String, f64>,
    pub default_backsheet_factor: f64,
    /// Discount on linear extrapolation after initial burn-in
    pub stabilization_factor: f64,
    pub horizon_years: u32,
}

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            base_degradation_rate_pct: 0.5,
            activation_energy_ev: DEFAULT_ACTIVATION_ENERGY_EV,
            reference_temperature_k: DEFAULT_REFERENCE_TEMPERATURE_K,
            stress_coefficient: 0.05,
            humidity_coefficient: 0.01,
            humidity_reference_pct: 50.0,
            uv_coefficient: 0.02,
            uv_reference_index: 5.0,
            damp_heat_coefficient: 0.0001,
            backsheet_factors: BTreeMap::new(),
            default_backsheet_factor: 1.0,
            stabilization_factor: 0.95,
            horizon_years: 25,
        }
    }
}

impl ModelConstants {
    pub fn validate(&self) -> Result<()> {
        let nonnegative = [
            ("base_degradation_rate_pct", self.base_degradation_rate_pct),
            ("stress_coefficient", self.stress_coefficient),
            ("humidity_coefficient", self.humidity_coefficient),
            ("uv_coefficient", self.uv_coefficient),
            ("damp_heat_coefficient", self.damp_heat_coefficient),
            ("default_backsheet_factor", self.default_backsheet_factor),
        ];
        for (name, value) in nonnegative {
            if !value.is_finite() || value < 0.0 {
                return Err(PvRiskError::InvalidParameter(format!(
                    "model.{name} must be a nonnegative number, got {value}"
                )));
            }
        }
        if let Some((material, factor)) = self
            .backsheet_factors
            .iter()
            .find(|(_, f)| !f.is_finite() || **f < 0.0)
        {
            return Err(PvRiskError::InvalidParameter(format!(
                "model.backsheet_factors.{material} must be nonnegative, got {factor}"
            )));
        }
        if !self.stabilization_factor.is_finite() || self.stabilization_factor <= 0.0 {
            return Err(PvRiskError::InvalidParameter(format!(
                "model.stabilization_factor must be positive, got {}",
                self.stabilization_factor
            )));
        }
        if self.horizon_years == 0 {
            return Err(PvRiskError::InvalidParameter(
                "model.horizon_years must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Damp-heat sensitivity of a backsheet material
    pub fn backsheet_factor(&self, material: Option<&str>) -> f64 {
        material
            .and_then(|m| {
                self.backsheet_factors
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(m.trim()))
                    .map(|(_, factor)| *factor)
            })
            .unwrap_or(self.default_backsheet_factor)
    }
}

/// Case-insensitive access to Weibull reference parameters by material name.
pub trait WeibullLookup {
    fn weibull_for(&self, material_name: &str) -> Option<&WeibullParameters>;
}

impl WeibullLookup for [WeibullParameters] {
    fn weibull_for(&self, material_name: &str) -> Option<&WeibullParameters> {
        self.iter()
            .find(|p| p.material_name.eq_ignore_ascii_case(material_name.trim()))
    }
}

impl WeibullLookup for Vec<WeibullParameters> {
    fn weibull_for(&self, material_name: &str) -> Option<&WeibullParameters> {
        self.as_slice().weibull_for(material_name)
    }
}

/// Environmental and test-stress multipliers shared by both model paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressMultipliers {
    /// `1 + c_h * (RH - RH_ref)`, or 1 without humidity data
    pub humidity: f64,
    /// `1 + c_uv * (UV - UV_ref)`
    pub uv: f64,
    /// `1 + c_s * total_stress_score`
    pub stress: f64,
}

impl StressMultipliers {
    pub fn from_inputs(
        environment: &EnvironmentalSummary,
        stress_profile: &StressProfile,
        constants: &ModelConstants,
    ) -> Self {
        let humidity = environment
            .mean_relative_humidity_pct
            .map_or(1.0, |rh| {
                1.0 + constants.humidity_coefficient * (rh - constants.humidity_reference_pct)
            });
        let uv = 1.0
            + constants.uv_coefficient
                * (environment.derived_uv_index() - constants.uv_reference_index);
        let stress = 1.0 + constants.stress_coefficient * stress_profile.total_stress_score();
        Self {
            humidity,
            uv,
            stress,
        }
    }

    /// Product of all multipliers
    pub fn combined(&self) -> f64 {
        self.humidity * self.uv * self.stress
    }

    /// [`combined`](Self::combined), rejected unless finite and positive
    pub fn checked_combined(&self) -> Result<f64> {
        let combined = self.combined();
        if !combined.is_finite() || combined <= 0.0 {
            return Err(PvRiskError::InvalidParameter(format!(
                "combined stress multiplier must be positive, got {combined} \
                 (humidity {:.3}, UV {:.3}, stress {:.3})",
                self.humidity, self.uv, self.stress
            )));
        }
        Ok(combined)
    }
}

/// Which modeling path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Empirical,
    Weibull,
}

/// A Weibull lookup that did not resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingWeibull {
    pub slot: ComponentSlot,
    /// Selected material, or `None` when the slot itself is not in the BOM
    pub material: Option<String>,
}

impl std::fmt::Display for MissingWeibull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.material {
            Some(material) => write!(f, "{} ({material})", self.slot),
            None => write!(f, "{} (not selected)", self.slot),
        }
    }
}

/// How a degradation result was produced and what was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDiagnostics {
    pub model: ModelKind,
    pub weibull_available: bool,
    pub missing_weibull: Vec<MissingWeibull>,
}

/// Breakdown of the empirical additive estimate (all values in %)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalSummary {
    pub acceleration_factor: f64,
    pub multipliers: StressMultipliers,
    /// `base_rate * acceleration_factor`
    pub base_term_pct: f64,
    pub environmental_adjustment_pct: f64,
    pub stress_term_pct: f64,
    pub year1_loss_pct: f64,
    pub year25_loss_pct: f64,
    pub reliability_index: f64,
}

/// Temperature-adjusted Weibull curve of one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCurve {
    pub slot: ComponentSlot,
    pub material: String,
    pub acceleration_factor: f64,
    /// `base_lifetime / acceleration_factor` (years)
    pub eta_effective_years: f64,
    pub shape_beta: f64,
    pub survival: Vec<f64>,
}

/// Year-by-year projection from the Weibull path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeibullProjection {
    pub front_encapsulant: MaterialCurve,
    pub cell: MaterialCurve,
    pub multipliers: StressMultipliers,
    pub rated_power_w: Option<f64>,
    pub series: Vec<DegradationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum DegradationEstimate {
    Empirical(EmpiricalSummary),
    Weibull(WeibullProjection),
}

/// Result of one degradation computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationModelOutput {
    pub diagnostics: ModelDiagnostics,
    pub estimate: DegradationEstimate,
}

impl DegradationModelOutput {
    pub fn year1_loss_pct(&self) -> f64 {
        match &self.estimate {
            DegradationEstimate::Empirical(summary) => summary.year1_loss_pct,
            DegradationEstimate::Weibull(projection) => projection
                .series
                .first()
                .and_then(|r| r.loss_pct)
                .unwrap_or(0.0),
        }
    }

    pub fn year25_loss_pct(&self) -> f64 {
        match &self.estimate {
            DegradationEstimate::Empirical(summary) => summary.year25_loss_pct,
            DegradationEstimate::Weibull(projection) => projection
                .series
                .last()
                .and_then(|r| r.loss_pct)
                .unwrap_or(0.0),
        }
    }

    /// 0-100 score; higher is better
    pub fn reliability_index(&self) -> f64 {
        match &self.estimate {
            DegradationEstimate::Empirical(summary) => summary.reliability_index,
            DegradationEstimate::Weibull(projection) => projection
                .series
                .last()
                .map_or(100.0, |r| r.reliability_pct),
        }
    }

    /// The full series when the Weibull path ran
    pub fn series(&self) -> Option<&[DegradationResult]> {
        match &self.estimate {
            DegradationEstimate::Weibull(projection) => Some(&projection.series),
            DegradationEstimate::Empirical(_) => None,
        }
    }

    /// Power loss (%) for each year `1..=horizon_years`.
    ///
    /// The empirical path only yields year-1 and end-of-horizon points; the
    /// years in between are interpolated linearly.
    pub fn loss_trajectory(&self, horizon_years: u32) -> Vec<f64> {
        if let Some(series) = self.series() {
            return series.iter().map(|r| r.loss_pct.unwrap_or(0.0)).collect();
        }
        let first = self.year1_loss_pct();
        let last = self.year25_loss_pct().min(100.0);
        let span = f64::from(horizon_years.saturating_sub(1).max(1));
        (1..=horizon_years)
            .map(|year| {
                let loss = first + (last - first) * f64::from(year - 1) / span;
                loss.clamp(0.0, 100.0)
            })
            .collect()
    }
}

/// The two interchangeable modeling paths.
#[derive(Debug, Clone, PartialEq)]
pub enum DegradationModel {
    Empirical,
    Weibull {
        front_encapsulant: WeibullParameters,
        cell: WeibullParameters,
    },
}

impl DegradationModel {
    /// Pick the richest model the reference data supports for this BOM
    pub fn select<W>(bom: &BomSelection, weibull: &W) -> (Self, ModelDiagnostics)
    where
        W: WeibullLookup + ?Sized,
    {
        let mut missing = Vec::new();
        let mut resolve = |slot: ComponentSlot| {
            let Some(record) = bom.slot(slot) else {
                missing.push(MissingWeibull {
                    slot,
                    material: None,
                });
                return None;
            };
            let found = weibull.weibull_for(&record.material_type).cloned();
            if found.is_none() {
                missing.push(MissingWeibull {
                    slot,
                    material: Some(record.material_type.clone()),
                });
            }
            found
        };

        let front = resolve(ComponentSlot::EncapsulantFront);
        let cell = resolve(ComponentSlot::Cell);

        match (front, cell) {
            (Some(front_encapsulant), Some(cell)) => (
                Self::Weibull {
                    front_encapsulant,
                    cell,
                },
                ModelDiagnostics {
                    model: ModelKind::Weibull,
                    weibull_available: true,
                    missing_weibull: missing,
                },
            ),
            _ => {
                let listed: Vec<String> = missing.iter().map(ToString::to_string).collect();
                warn!(
                    "Weibull parameters not found for {}, using empirical model",
                    listed.join(", ")
                );
                (
                    Self::Empirical,
                    ModelDiagnostics {
                        model: ModelKind::Empirical,
                        weibull_available: false,
                        missing_weibull: missing,
                    },
                )
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Empirical => ModelKind::Empirical,
            Self::Weibull { .. } => ModelKind::Weibull,
        }
    }

    /// Run this model path
    pub fn compute(
        &self,
        environment: &EnvironmentalSummary,
        bom: &BomSelection,
        stress_profile: &StressProfile,
        constants: &ModelConstants,
        rated_power_w: Option<f64>,
    ) -> Result<DegradationEstimate> {
        validate_inputs(environment, stress_profile, rated_power_w)?;
        constants.validate()?;
        let multipliers = StressMultipliers::from_inputs(environment, stress_profile, constants);

        match self {
            Self::Empirical => {
                empirical_estimate(environment, bom, stress_profile, constants, multipliers)
                    .map(DegradationEstimate::Empirical)
            }
            Self::Weibull {
                front_encapsulant,
                cell,
            } => weibull_projection(
                environment,
                front_encapsulant,
                cell,
                constants,
                multipliers,
                rated_power_w,
            )
            .map(DegradationEstimate::Weibull),
        }
    }
}

/// Estimate degradation for one site, BOM and stress profile.
///
/// Selects the Weibull path when both front-encapsulant and cell parameters
/// resolve, otherwise the empirical path. Missing parameters never fail the
/// call; malformed physical inputs do.
pub fn compute_degradation_rate<W>(
    environment: &EnvironmentalSummary,
    bom: &BomSelection,
    stress_profile: &StressProfile,
    weibull: &W,
    constants: &ModelConstants,
    rated_power_w: Option<f64>,
) -> Result<DegradationModelOutput>
where
    W: WeibullLookup + ?Sized,
{
    let (model, diagnostics) = DegradationModel::select(bom, weibull);
    debug!("Selected {:?} degradation model", model.kind());
    let estimate = model.compute(environment, bom, stress_profile, constants, rated_power_w)?;
    Ok(DegradationModelOutput {
        diagnostics,
        estimate,
    })
}

fn validate_inputs(
    environment: &EnvironmentalSummary,
    stress_profile: &StressProfile,
    rated_power_w: Option<f64>,
) -> Result<()> {
    if let Some(rh) = environment.mean_relative_humidity_pct
        && !(0.0..=100.0).contains(&rh)
    {
        return Err(PvRiskError::Domain(format!(
            "relative humidity {rh}% is outside 0-100%"
        )));
    }
    if !environment.mean_irradiance_wm2.is_finite() || environment.mean_irradiance_wm2 < 0.0 {
        return Err(PvRiskError::Domain(format!(
            "mean irradiance {} W/m² must be nonnegative",
            environment.mean_irradiance_wm2
        )));
    }
    if let Some(hours) = environment.damp_heat_hours
        && (!hours.is_finite() || hours < 0.0)
    {
        return Err(PvRiskError::Domain(format!(
            "damp-heat hours {hours} must be nonnegative"
        )));
    }
    if let Some(test) = stress_profile
        .tests()
        .iter()
        .find(|t| !t.severity_weight.is_finite() || t.severity_weight < 0.0)
    {
        return Err(PvRiskError::InvalidParameter(format!(
            "stress test '{}' has negative severity weight {}",
            test.identifier, test.severity_weight
        )));
    }
    if let Some(power) = rated_power_w
        && (!power.is_finite() || power <= 0.0)
    {
        return Err(PvRiskError::InvalidParameter(format!(
            "rated power must be positive, got {power} W"
        )));
    }
    Ok(())
}

fn empirical_estimate(
    environment: &EnvironmentalSummary,
    bom: &BomSelection,
    stress_profile: &StressProfile,
    constants: &ModelConstants,
    multipliers: StressMultipliers,
) -> Result<EmpiricalSummary> {
    multipliers.checked_combined()?;
    let af = acceleration_factor(
        environment.mean_temperature_c,
        constants.activation_energy_ev,
        constants.reference_temperature_k,
    )?;
    let base_term_pct = constants.base_degradation_rate_pct * af;

    // Humidity and UV scale the thermal term; absent inputs contribute nothing
    let mut environmental_adjustment_pct =
        base_term_pct * (multipliers.humidity * multipliers.uv - 1.0);
    if let Some(hours) = environment.damp_heat_hours {
        let backsheet = bom
            .slot(ComponentSlot::Backsheet)
            .map(|r| r.material_type.as_str());
        environmental_adjustment_pct +=
            hours * constants.damp_heat_coefficient * constants.backsheet_factor(backsheet);
    }

    let stress_term_pct = stress_profile.total_stress_score() * constants.stress_coefficient;
    let year1_loss_pct = base_term_pct + environmental_adjustment_pct + stress_term_pct;
    let year25_loss_pct =
        year1_loss_pct * f64::from(constants.horizon_years) * constants.stabilization_factor;
    let reliability_index = (100.0 - year25_loss_pct).clamp(0.0, 100.0);

    debug!(
        "Empirical model: AF={af:.3}, year1={year1_loss_pct:.3}%, year{}={year25_loss_pct:.3}%",
        constants.horizon_years
    );

    Ok(EmpiricalSummary {
        acceleration_factor: af,
        multipliers,
        base_term_pct,
        environmental_adjustment_pct,
        stress_term_pct,
        year1_loss_pct,
        year25_loss_pct,
        reliability_index,
    })
}

fn material_curve(
    slot: ComponentSlot,
    params: &WeibullParameters,
    temperature_c: f64,
    constants: &ModelConstants,
    years: &[f64],
) -> Result<MaterialCurve> {
    if !params.base_lifetime_years.is_finite() || params.base_lifetime_years <= 0.0 {
        return Err(PvRiskError::InvalidParameter(format!(
            "base lifetime of '{}' must be positive, got {}",
            params.material_name, params.base_lifetime_years
        )));
    }
    let af = acceleration_factor(
        temperature_c,
        params.activation_energy_ev,
        constants.reference_temperature_k,
    )?;
    let eta_effective_years = params.base_lifetime_years / af;
    let survival = weibull_survival(years, eta_effective_years, params.shape_beta)?;

    Ok(MaterialCurve {
        slot,
        material: params.material_name.clone(),
        acceleration_factor: af,
        eta_effective_years,
        shape_beta: params.shape_beta,
        survival,
    })
}

fn weibull_projection(
    environment: &EnvironmentalSummary,
    front_params: &WeibullParameters,
    cell_params: &WeibullParameters,
    constants: &ModelConstants,
    multipliers: StressMultipliers,
    rated_power_w: Option<f64>,
) -> Result<WeibullProjection> {
    let penalty = multipliers.checked_combined()?;

    let years: Vec<f64> = (1..=constants.horizon_years).map(f64::from).collect();
    let front_encapsulant = material_curve(
        ComponentSlot::EncapsulantFront,
        front_params,
        environment.mean_temperature_c,
        constants,
        &years,
    )?;
    let cell = material_curve(
        ComponentSlot::Cell,
        cell_params,
        environment.mean_temperature_c,
        constants,
        &years,
    )?;

    let series = (1..=constants.horizon_years)
        .zip(front_encapsulant.survival.iter().zip(&cell.survival))
        .map(|(year, (front, cell))| {
            // Multipliers below 1 would lift survival above 1
            let combined = (((front + cell) / 2.0) / penalty).clamp(0.0, 1.0);
            DegradationResult {
                year,
                reliability_pct: combined * 100.0,
                power_w: rated_power_w.map(|rated| rated * combined),
                loss_pct: Some(100.0 * (1.0 - combined)),
            }
        })
        .collect();

    Ok(WeibullProjection {
        front_encapsulant,
        cell,
        multipliers,
        rated_power_w,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvrisk_types::MaterialRecord;

    fn record(component: &str, material: &str) -> MaterialRecord {
        MaterialRecord {
            component_name: component.to_owned(),
            material_type: material.to_owned(),
            supplier: "Acme".to_owned(),
            region: "EU".to_owned(),
            certifications: Vec::new(),
        }
    }

    fn bom(cell: &str) -> BomSelection {
        let mut bom = BomSelection::default();
        bom.select(record("Encapsulant-Front", "EVA"));
        bom.select(record("Cell", cell));
        bom.select(record("Backsheet", "PET"));
        bom
    }

    fn weibull_table() -> Vec<WeibullParameters> {
        vec![
            WeibullParameters {
                material_name: "EVA".to_owned(),
                base_lifetime_years: 40.0,
                activation_energy_ev: 0.6,
                shape_beta: 2.5,
            },
            WeibullParameters {
                material_name: "perc".to_owned(),
                base_lifetime_years: 45.0,
                activation_energy_ev: 0.7,
                shape_beta: 3.0,
            },
        ]
    }

    fn neutral_environment(temperature_c: f64) -> EnvironmentalSummary {
        // 250 W/m² is UV index 5, the neutral point of the UV factor
        EnvironmentalSummary::new(temperature_c, None, 250.0)
    }

    fn empirical(output: &DegradationModelOutput) -> &EmpiricalSummary {
        match &output.estimate {
            DegradationEstimate::Empirical(summary) => summary,
            DegradationEstimate::Weibull(_) => panic!("expected empirical estimate"),
        }
    }

    #[test]
    fn test_hot_site_without_humidity_or_stress() {
        let output = compute_degradation_rate(
            &neutral_environment(45.0),
            &bom("HJT"),
            &StressProfile::new("none"),
            &weibull_table(),
            &ModelConstants::default(),
            None,
        )
        .unwrap();

        let af = acceleration_factor(45.0, 0.7, 298.0).unwrap();
        let year1 = 0.5 * af;
        let year25 = year1 * 25.0 * 0.95;

        assert_eq!(output.diagnostics.model, ModelKind::Empirical);
        assert!((output.year1_loss_pct() - year1).abs() < 1e-9);
        assert!((output.year25_loss_pct() - year25).abs() < 1e-9);
        assert!((output.reliability_index() - (100.0 - year25)).abs() < 1e-9);

        let summary = empirical(&output);
        assert!(summary.environmental_adjustment_pct.abs() < 1e-12);
        assert!(summary.stress_term_pct.abs() < 1e-12);
    }

    #[test]
    fn test_missing_cell_weibull_falls_back_with_flag() {
        let output = compute_degradation_rate(
            &neutral_environment(30.0),
            &bom("HJT"),
            &StressProfile::new("none"),
            &weibull_table(),
            &ModelConstants::default(),
            Some(400.0),
        )
        .unwrap();

        assert!(!output.diagnostics.weibull_available);
        assert_eq!(output.diagnostics.model, ModelKind::Empirical);
        assert_eq!(
            output.diagnostics.missing_weibull,
            vec![MissingWeibull {
                slot: ComponentSlot::Cell,
                material: Some("HJT".to_owned()),
            }]
        );
        assert!(output.series().is_none());
    }

    #[test]
    fn test_missing_slot_reported_without_material() {
        let mut partial = BomSelection::default();
        partial.select(record("Cell", "PERC"));

        let (model, diagnostics) = DegradationModel::select(&partial, &weibull_table());
        assert_eq!(model, DegradationModel::Empirical);
        assert_eq!(diagnostics.missing_weibull.len(), 1);
        assert_eq!(
            diagnostics.missing_weibull[0].slot,
            ComponentSlot::EncapsulantFront
        );
        assert!(diagnostics.missing_weibull[0].material.is_none());
    }

    #[test]
    fn test_weibull_series_shape() {
        let profile = StressProfile::new("IEC")
            .with_test("UV", 1.0)
            .with_test("DH1000", 2.0);
        let environment = EnvironmentalSummary::new(35.0, Some(70.0), 300.0);

        let output = compute_degradation_rate(
            &environment,
            &bom("PERC"),
            &profile,
            &weibull_table(),
            &ModelConstants::default(),
            Some(400.0),
        )
        .unwrap();

        assert!(output.diagnostics.weibull_available);
        let series = output.series().unwrap();
        assert_eq!(series.len(), 25);
        for (idx, result) in series.iter().enumerate() {
            assert_eq!(result.year as usize, idx + 1);
        }
        for pair in series.windows(2) {
            assert!(
                pair[1].reliability_pct <= pair[0].reliability_pct,
                "reliability increased between years {} and {}",
                pair[0].year,
                pair[1].year
            );
        }
        for result in series {
            let power = result.power_w.unwrap();
            let loss = result.loss_pct.unwrap();
            assert!((loss - 100.0 * (1.0 - power / 400.0)).abs() < 1e-9);
            assert!((0.0..=100.0).contains(&result.reliability_pct));
        }
    }

    #[test]
    fn test_weibull_penalized_by_multipliers() {
        let constants = ModelConstants::default();
        let environment = EnvironmentalSummary::new(30.0, Some(80.0), 400.0);
        let profile = StressProfile::new("harsh").with_test("DH2000", 4.0);

        let relaxed = compute_degradation_rate(
            &neutral_environment(30.0),
            &bom("PERC"),
            &StressProfile::new("none"),
            &weibull_table(),
            &constants,
            None,
        )
        .unwrap();
        let stressed = compute_degradation_rate(
            &environment,
            &bom("PERC"),
            &profile,
            &weibull_table(),
            &constants,
            None,
        )
        .unwrap();

        assert!(stressed.reliability_index() < relaxed.reliability_index());
        let multipliers = StressMultipliers::from_inputs(&environment, &profile, &constants);
        assert!((multipliers.humidity - 1.3).abs() < 1e-12);
        assert!((multipliers.uv - 1.06).abs() < 1e-12);
        assert!((multipliers.stress - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_humidity_uv_and_damp_heat_terms() {
        let mut constants = ModelConstants::default();
        constants
            .backsheet_factors
            .insert("pet".to_owned(), 1.5);
        let mut environment = EnvironmentalSummary::new(25.0, Some(70.0), 350.0);
        environment.damp_heat_hours = Some(1000.0);
        let profile = StressProfile::new("one").with_test("UV", 2.0);

        let output = compute_degradation_rate(
            &environment,
            &bom("HJT"),
            &profile,
            &weibull_table(),
            &constants,
            None,
        )
        .unwrap();
        let summary = empirical(&output);

        let af = acceleration_factor(25.0, 0.7, 298.0).unwrap();
        let base = 0.5 * af;
        let expected_adjustment = base * (1.2 * 1.04 - 1.0) + 1000.0 * 0.0001 * 1.5;
        assert!((summary.environmental_adjustment_pct - expected_adjustment).abs() < 1e-9);
        assert!((summary.stress_term_pct - 0.1).abs() < 1e-12);
        assert!(
            (summary.year1_loss_pct - (base + expected_adjustment + 0.1)).abs() < 1e-9
        );
    }

    #[test]
    fn test_reliability_index_floors_at_zero() {
        let profile = StressProfile::new("brutal").with_test("TC2000", 100.0);
        let output = compute_degradation_rate(
            &neutral_environment(85.0),
            &bom("HJT"),
            &profile,
            &weibull_table(),
            &ModelConstants::default(),
            None,
        )
        .unwrap();

        assert!(output.year25_loss_pct() > 100.0);
        assert!(output.reliability_index().abs() < f64::EPSILON);
        let trajectory = output.loss_trajectory(25);
        assert_eq!(trajectory.len(), 25);
        assert!(trajectory.iter().all(|l| (0.0..=100.0).contains(l)));
    }

    #[test]
    fn test_negative_humidity_factor_rejected() {
        let constants = ModelConstants {
            humidity_coefficient: 0.05,
            ..ModelConstants::default()
        };
        let dry = EnvironmentalSummary::new(30.0, Some(0.0), 250.0);

        for cell in ["HJT", "PERC"] {
            let result = compute_degradation_rate(
                &dry,
                &bom(cell),
                &StressProfile::new("none"),
                &weibull_table(),
                &constants,
                None,
            );
            assert!(
                matches!(result, Err(PvRiskError::InvalidParameter(_))),
                "{cell}: {result:?}"
            );
        }
    }

    #[test]
    fn test_reliability_index_stays_in_range() {
        let dry = EnvironmentalSummary::new(-20.0, Some(0.0), 0.0);
        let output = compute_degradation_rate(
            &dry,
            &bom("HJT"),
            &StressProfile::new("none"),
            &weibull_table(),
            &ModelConstants::default(),
            None,
        )
        .unwrap();

        assert!(output.year1_loss_pct() > 0.0);
        assert!((0.0..=100.0).contains(&output.reliability_index()));
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let environment = EnvironmentalSummary::new(32.5, Some(65.0), 280.0);
        let profile = StressProfile::new("IEC").with_test("UV", 1.0);
        let run = || {
            compute_degradation_rate(
                &environment,
                &bom("PERC"),
                &profile,
                &weibull_table(),
                &ModelConstants::default(),
                Some(410.0),
            )
            .unwrap()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_invalid_weibull_parameters_abort() {
        let mut table = weibull_table();
        table[1].shape_beta = 0.0;

        let result = compute_degradation_rate(
            &neutral_environment(25.0),
            &bom("PERC"),
            &StressProfile::new("none"),
            &table,
            &ModelConstants::default(),
            None,
        );
        assert!(matches!(result, Err(PvRiskError::InvalidParameter(_))));
    }

    #[test]
    fn test_domain_errors() {
        let cold = neutral_environment(-280.0);
        let result = compute_degradation_rate(
            &cold,
            &bom("HJT"),
            &StressProfile::new("none"),
            &weibull_table(),
            &ModelConstants::default(),
            None,
        );
        assert!(matches!(result, Err(PvRiskError::Domain(_))));

        let soggy = EnvironmentalSummary::new(25.0, Some(120.0), 250.0);
        let result = compute_degradation_rate(
            &soggy,
            &bom("HJT"),
            &StressProfile::new("none"),
            &weibull_table(),
            &ModelConstants::default(),
            None,
        );
        assert!(matches!(result, Err(PvRiskError::Domain(_))));
    }

    #[test]
    fn test_empirical_trajectory_interpolates() {
        let output = compute_degradation_rate(
            &neutral_environment(25.0),
            &bom("HJT"),
            &StressProfile::new("none"),
            &weibull_table(),
            &ModelConstants::default(),
            None,
        )
        .unwrap();

        let trajectory = output.loss_trajectory(25);
        assert!((trajectory[0] - output.year1_loss_pct()).abs() < 1e-12);
        assert!((trajectory[24] - output.year25_loss_pct()).abs() < 1e-9);
        for pair in trajectory.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_constants_validation() {
        let mut constants = ModelConstants::default();
        assert!(constants.validate().is_ok());

        constants.horizon_years = 0;
        assert!(constants.validate().is_err());

        let mut constants = ModelConstants::default();
        constants.stress_coefficient = -0.1;
        assert!(constants.validate().is_err());
    }
}
