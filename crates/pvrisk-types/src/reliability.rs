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

use serde::{Deserialize, Serialize};

/// Weibull reference parameters for one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeibullParameters {
    pub material_name: String,
    /// Characteristic lifetime at the reference temperature (years)
    pub base_lifetime_years: f64,
    /// Arrhenius activation energy (eV)
    pub activation_energy_ev: f64,
    /// Weibull shape parameter
    pub shape_beta: f64,
}

/// One year of a projected reliability/loss trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegradationResult {
    /// 1-based year of operation
    pub year: u32,
    /// Share of modules expected to survive (0-100 %)
    pub reliability_pct: f64,
    /// Expected output power, when a rated power was supplied (W)
    #[serde(default)]
    pub power_w: Option<f64>,
    /// Power loss relative to rated (%)
    #[serde(default)]
    pub loss_pct: Option<f64>,
}
