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

//! Failure-risk matching against the risk matrix.
//!
//! Material and stress names are joined by case-insensitive substring by
//! default, which is lossy ("TC200" also matches "TC2000"). [`MatchMode::Exact`]
//! compares whole names instead for reference data that uses structured keys.

use pvrisk_types::{BomSelection, FailureRiskRow, RiskReportRow, StressProfile, StressTest};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How material and stress names are compared with risk-matrix rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Substring,
    Exact,
}

impl MatchMode {
    fn matches(self, haystack: &str, needle: &str) -> bool {
        match self {
            Self::Substring => haystack
                .to_lowercase()
                .contains(&needle.trim().to_lowercase()),
            Self::Exact => haystack.trim().eq_ignore_ascii_case(needle.trim()),
        }
    }
}

/// Risk rows for one material under a set of stress tests.
///
/// Each test is matched by its [`StressTest::match_token`]. Matches are
/// concatenated per test in the order given and are not deduplicated: a row
/// matching two tests appears twice.
pub fn match_failures<'a, I>(
    material_name: &str,
    stress_tests: I,
    risk_table: &[FailureRiskRow],
    mode: MatchMode,
) -> Vec<FailureRiskRow>
where
    I: IntoIterator<Item = &'a StressTest>,
{
    let mut matches = Vec::new();
    for test in stress_tests {
        let Some(token) = test.match_token() else {
            continue;
        };
        matches.extend(
            risk_table
                .iter()
                .filter(|row| {
                    mode.matches(&row.material, material_name) && mode.matches(&row.stress, token)
                })
                .cloned(),
        );
    }
    matches
}

/// Risk totals for one BOM slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRiskSummary {
    pub component: String,
    pub material: String,
    pub match_count: usize,
    pub max_risk_score: Option<f64>,
    pub total_risk_score: f64,
}

/// Matched rows across the whole BOM, in BOM order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub rows: Vec<RiskReportRow>,
    pub components: Vec<ComponentRiskSummary>,
}

impl RiskReport {
    /// True when the analysis ran and found nothing
    pub fn no_risks_found(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn highest_risk(&self) -> Option<&RiskReportRow> {
        self.rows
            .iter()
            .max_by(|a, b| a.risk_score.total_cmp(&b.risk_score))
    }
}

/// Outcome of the failure-risk analysis.
///
/// An empty stress profile means there is nothing to match against, which is
/// reported as `NotApplicable` rather than an empty report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RiskAnalysis {
    NotApplicable,
    Analyzed(RiskReport),
}

impl RiskAnalysis {
    pub fn report(&self) -> Option<&RiskReport> {
        match self {
            Self::Analyzed(report) => Some(report),
            Self::NotApplicable => None,
        }
    }
}

/// Match every BOM slot against the risk matrix
pub fn build_risk_report(
    bom: &BomSelection,
    stress_profile: &StressProfile,
    risk_table: &[FailureRiskRow],
    mode: MatchMode,
) -> RiskAnalysis {
    if stress_profile.is_empty() {
        debug!("Stress profile '{}' is empty, risk analysis not applicable", stress_profile.name);
        return RiskAnalysis::NotApplicable;
    }

    let mut report = RiskReport::default();
    for record in bom {
        let matches = match_failures(
            &record.material_type,
            stress_profile.tests(),
            risk_table,
            mode,
        );

        report.components.push(ComponentRiskSummary {
            component: record.component_name.clone(),
            material: record.material_type.clone(),
            match_count: matches.len(),
            max_risk_score: matches
                .iter()
                .map(|m| m.risk_score)
                .max_by(f64::total_cmp),
            total_risk_score: matches.iter().map(|m| m.risk_score).sum(),
        });
        report.rows.extend(
            matches
                .into_iter()
                .map(|row| RiskReportRow::from_match(&record.component_name, row)),
        );
    }

    debug!(
        "Risk report: {} rows across {} components",
        report.rows.len(),
        report.components.len()
    );
    RiskAnalysis::Analyzed(report)
}
