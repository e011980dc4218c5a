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

/// One row of the failure-risk matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRiskRow {
    pub material: String,
    pub stress: String,
    pub failure_mode: String,
    pub risk_score: f64,
    #[serde(default)]
    pub field_insight: Option<String>,
}

/// A matched risk row tagged with the BOM slot it was found for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReportRow {
    pub component: String,
    pub material: String,
    pub stress: String,
    pub failure_mode: String,
    pub risk_score: f64,
    #[serde(default)]
    pub field_insight: Option<String>,
}

impl RiskReportRow {
    pub fn from_match(component: &str, row: FailureRiskRow) -> Self {
        Self {
            component: component.to_owned(),
            material: row.material,
            stress: row.stress,
            failure_mode: row.failure_mode,
            risk_score: row.risk_score,
            field_insight: row.field_insight,
        }
    }
}
