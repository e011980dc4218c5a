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

//! One simulation run from request to report.

use pvrisk_types::{
    ArrayOrientation, EnvironmentalSummary, Location, MaterialRecord, SimulationRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::degradation::{DegradationModelOutput, ModelConstants, compute_degradation_rate};
use crate::environment::{EnvironmentSource, SiteCatalog, fetch_with_timeout};
use crate::error::{PvRiskError, Result};
use crate::financials::{FinancialEstimate, FinancialParameters, estimate_financials};
use crate::reference::ReferenceData;
use crate::risk::{MatchMode, RiskAnalysis, build_risk_report};
use crate::solar::{monthly_clear_sky_insolation, site_clearness_index};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables applied to every run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub constants: ModelConstants,
    pub financial: FinancialParameters,
    pub match_mode: MatchMode,
    pub fetch_timeout: Duration,
    /// Resolves named locations to a latitude for the monthly breakdown
    pub sites: SiteCatalog,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            constants: ModelConstants::default(),
            financial: FinancialParameters::default(),
            match_mode: MatchMode::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            sites: SiteCatalog::default(),
        }
    }
}

/// Where the environmental summary of a run came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentOrigin {
    /// Overrides were complete, nothing was fetched
    Overrides,
    /// Fetched from the named provider, overrides applied on top
    Provider(String),
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub location: Location,
    pub bom: Vec<MaterialRecord>,
    pub stress_profile: String,
    pub total_stress_score: f64,
    pub environment: EnvironmentalSummary,
    pub environment_origin: EnvironmentOrigin,
    pub degradation: DegradationModelOutput,
    pub risk: RiskAnalysis,
    pub orientation: ArrayOrientation,
    pub financials: Option<FinancialEstimate>,
}

/// Runs simulations against shared reference data
pub struct SimulationRunner {
    reference: Arc<ReferenceData>,
    environment: Arc<dyn EnvironmentSource>,
    settings: RunSettings,
}

impl std::fmt::Debug for SimulationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationRunner")
            .field("environment", &self.environment.name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SimulationRunner {
    pub fn new(
        reference: Arc<ReferenceData>,
        environment: Arc<dyn EnvironmentSource>,
        settings: RunSettings,
    ) -> Self {
        Self {
            reference,
            environment,
            settings,
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Run one simulation. Any error aborts the run before a report exists.
    pub fn run(&self, request: &SimulationRequest) -> Result<SimulationReport> {
        self.check_bom(request)?;

        let (environment, environment_origin) = self.environment_for(request)?;
        debug!("Environment for run: {environment:?}");

        let degradation = compute_degradation_rate(
            &environment,
            &request.bom,
            &request.stress_profile,
            &self.reference.weibull,
            &self.settings.constants,
            request.rated_power_w,
        )?;

        let risk = build_risk_report(
            &request.bom,
            &request.stress_profile,
            &self.reference.risk_matrix,
            self.settings.match_mode,
        );

        let financials = request
            .rated_power_w
            .map(|rated| self.financials_for(request, rated, &environment, &degradation))
            .transpose()?;

        info!(
            "✅ Simulation complete: {:?} model, reliability index {:.1}, year-{} loss {:.2}%",
            degradation.diagnostics.model,
            degradation.reliability_index(),
            self.settings.constants.horizon_years,
            degradation.year25_loss_pct()
        );

        Ok(SimulationReport {
            location: request.location.clone(),
            bom: request.bom.iter().cloned().collect(),
            stress_profile: request.stress_profile.name.clone(),
            total_stress_score: request.stress_profile.total_stress_score(),
            environment,
            environment_origin,
            degradation,
            risk,
            orientation: request.orientation,
            financials,
        })
    }

    fn check_bom(&self, request: &SimulationRequest) -> Result<()> {
        for record in &request.bom {
            if self
                .reference
                .bom_catalog
                .find(&record.component_name, &record.material_type)
                .is_none()
            {
                return Err(PvRiskError::UnknownMaterial {
                    component: record.component_name.clone(),
                    material_type: record.material_type.clone(),
                });
            }
        }
        self.reference.ensure_complete(&request.bom)
    }

    fn financials_for(
        &self,
        request: &SimulationRequest,
        rated_power_w: f64,
        environment: &EnvironmentalSummary,
        degradation: &DegradationModelOutput,
    ) -> Result<FinancialEstimate> {
        let (latitude, _longitude) = self.settings.sites.resolve(&request.location)?;
        let clearness = site_clearness_index(latitude, environment.mean_irradiance_wm2);
        let insolation = monthly_clear_sky_insolation(latitude, &request.orientation, clearness)?;
        debug!(
            "Monthly insolation at tilt {}°, azimuth {}°, clearness {clearness:.3}",
            request.orientation.tilt_deg, request.orientation.azimuth_deg
        );

        estimate_financials(
            rated_power_w,
            environment,
            &insolation,
            &self.settings.financial,
            &degradation.loss_trajectory(self.settings.constants.horizon_years),
        )
    }

    fn environment_for(
        &self,
        request: &SimulationRequest,
    ) -> Result<(EnvironmentalSummary, EnvironmentOrigin)> {
        if let Some(summary) = request.overrides.as_summary() {
            debug!("Environment fully overridden, skipping fetch");
            return Ok((summary, EnvironmentOrigin::Overrides));
        }

        info!(
            "Fetching environment for {} from {}",
            request.location,
            self.environment.name()
        );
        let fetched = fetch_with_timeout(
            Arc::clone(&self.environment),
            &request.location,
            self.settings.fetch_timeout,
        )?;
        Ok((
            fetched.with_overrides(&request.overrides),
            EnvironmentOrigin::Provider(self.environment.name().to_owned()),
        ))
    }
}
