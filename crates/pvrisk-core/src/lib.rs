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

//! PVRisk engine: degradation projection, failure-risk matching and the
//! reference data and environment collaborators a simulation run needs.

pub mod degradation;
pub mod environment;
pub mod error;
pub mod financials;
pub mod physics;
pub mod reference;
pub mod risk;
pub mod runner;
pub mod solar;
pub mod stress_catalog;

pub use degradation::{
    DegradationEstimate, DegradationModel, DegradationModelOutput, ModelConstants, ModelKind,
    WeibullLookup, compute_degradation_rate,
};
pub use environment::{
    ClearSkyEnvironment, EnvironmentSource, FixedEnvironment, SiteCatalog, TmyCsvEnvironment,
    fetch_with_timeout,
};
pub use error::{PvRiskError, Result};
pub use financials::{
    FinancialEstimate, FinancialParameters, MonthlyEnergy, estimate_financials,
};
pub use physics::{acceleration_factor, weibull_survival};
pub use reference::{CsvReferenceStore, ReferenceData, ReferenceStore, WeibullTable};
pub use risk::{MatchMode, RiskAnalysis, RiskReport, build_risk_report, match_failures};
pub use runner::{RunSettings, SimulationReport, SimulationRunner};
pub use solar::{MonthlyInsolation, monthly_clear_sky_insolation};
pub use stress_catalog::StressProfileCatalog;
