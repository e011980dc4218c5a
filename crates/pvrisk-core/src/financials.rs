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

//! Energy yield by month and year, and simple payback.

use chrono::Month;
use pvrisk_types::EnvironmentalSummary;
use serde::{Deserialize, Serialize};

use crate::error::{PvRiskError, Result};
use crate::solar::MonthlyInsolation;

const HOURS_PER_YEAR: f64 = 8760.0;

/// Irradiance at standard test conditions (W/m²)
const STC_IRRADIANCE_WM2: f64 = 1000.0;

const STC_TEMPERATURE_C: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialParameters {
    /// Installed cost per rated watt
    pub cost_per_watt: f64,
    /// Value of one kWh of produced energy
    pub electricity_rate_per_kwh: f64,
    /// Fixed system performance ratio (0-1]
    pub performance_ratio: f64,
    /// Power temperature coefficient (%/°C, usually negative)
    pub temperature_coefficient_pct_per_c: f64,
}

impl Default for FinancialParameters {
    fn default() -> Self {
        Self {
            cost_per_watt: 1.0,
            electricity_rate_per_kwh: 0.15,
            performance_ratio: 0.8,
            temperature_coefficient_pct_per_c: -0.4,
        }
    }
}

impl FinancialParameters {
    pub fn validate(&self) -> Result<()> {
        if !(self.performance_ratio > 0.0 && self.performance_ratio <= 1.0) {
            return Err(PvRiskError::InvalidParameter(format!(
                "performance ratio must be within (0, 1], got {}",
                self.performance_ratio
            )));
        }
        if !self.cost_per_watt.is_finite() || self.cost_per_watt < 0.0 {
            return Err(PvRiskError::InvalidParameter(format!(
                "cost per watt must be nonnegative, got {}",
                self.cost_per_watt
            )));
        }
        if !self.electricity_rate_per_kwh.is_finite() || self.electricity_rate_per_kwh < 0.0 {
            return Err(PvRiskError::InvalidParameter(format!(
                "electricity rate must be nonnegative, got {}",
                self.electricity_rate_per_kwh
            )));
        }
        if !self.temperature_coefficient_pct_per_c.is_finite() {
            return Err(PvRiskError::InvalidParameter(
                "temperature coefficient must be a number".to_owned(),
            ));
        }
        Ok(())
    }
}

/// First-year energy of one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEnergy {
    /// 1 = January
    pub month: u8,
    /// Plane-of-array insolation scaled to the site (kWh/m²)
    pub plane_of_array_kwh_m2: f64,
    pub energy_kwh: f64,
}

impl MonthlyEnergy {
    pub fn month_name(&self) -> &'static str {
        Month::try_from(self.month).map_or("Unknown", |month| month.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEstimate {
    pub system_cost: f64,
    /// First-year energy before degradation (kWh)
    pub annual_energy_kwh: f64,
    pub annual_savings: f64,
    /// `None` when the system never pays back
    pub payback_years: Option<f64>,
    /// Energy over the horizon with degradation applied (kWh)
    pub lifetime_energy_kwh: f64,
    pub lifetime_savings: f64,
    /// Calendar breakdown of `annual_energy_kwh`; empty without insolation data
    #[serde(default)]
    pub monthly_energy: Vec<MonthlyEnergy>,
}

/// Estimate energy and payback for one system.
///
/// `insolation` gives the seasonal shape and the mounting gain. It is scaled
/// so its horizontal total matches the site's mean irradiance, which keeps a
/// flat array at the equivalent-sun-hours yield. Without insolation data the
/// annual figure falls back to equivalent sun hours on the horizontal.
///
/// `loss_trajectory` holds the power loss (%) for each year of the horizon.
/// The performance ratio is fixed; identical inputs give identical output.
pub fn estimate_financials(
    rated_power_w: f64,
    environment: &EnvironmentalSummary,
    insolation: &[MonthlyInsolation],
    params: &FinancialParameters,
    loss_trajectory: &[f64],
) -> Result<FinancialEstimate> {
    params.validate()?;
    if !rated_power_w.is_finite() || rated_power_w <= 0.0 {
        return Err(PvRiskError::InvalidParameter(format!(
            "rated power must be positive, got {rated_power_w} W"
        )));
    }

    let thermal_derate = (1.0
        + params.temperature_coefficient_pct_per_c / 100.0
            * (environment.mean_temperature_c - STC_TEMPERATURE_C))
        .max(0.0);
    // kWh/m² at 1 kW/m² is equivalent sun hours
    let energy_for = |insolation_kwh_m2: f64| {
        rated_power_w / 1000.0 * insolation_kwh_m2 * 1000.0 / STC_IRRADIANCE_WM2
            * params.performance_ratio
            * thermal_derate
    };

    let site_horizontal_kwh_m2 = environment.mean_irradiance_wm2.max(0.0) * HOURS_PER_YEAR / 1000.0;
    let clear_sky_horizontal_kwh_m2: f64 = insolation.iter().map(|m| m.horizontal_kwh_m2).sum();
    let monthly_energy: Vec<MonthlyEnergy> = if clear_sky_horizontal_kwh_m2 > 0.0 {
        let scale = site_horizontal_kwh_m2 / clear_sky_horizontal_kwh_m2;
        insolation
            .iter()
            .map(|m| {
                let plane_of_array_kwh_m2 = m.plane_of_array_kwh_m2 * scale;
                MonthlyEnergy {
                    month: m.month,
                    plane_of_array_kwh_m2,
                    energy_kwh: energy_for(plane_of_array_kwh_m2),
                }
            })
            .collect()
    } else {
        Vec::new()
    };
    let annual_energy_kwh = if monthly_energy.is_empty() {
        energy_for(site_horizontal_kwh_m2)
    } else {
        monthly_energy.iter().map(|m| m.energy_kwh).sum()
    };

    let system_cost = rated_power_w * params.cost_per_watt;
    let annual_savings = annual_energy_kwh * params.electricity_rate_per_kwh;
    let payback_years = (annual_savings > 0.0).then(|| system_cost / annual_savings);

    let lifetime_energy_kwh: f64 = loss_trajectory
        .iter()
        .map(|loss| annual_energy_kwh * (1.0 - loss.clamp(0.0, 100.0) / 100.0))
        .sum();

    Ok(FinancialEstimate {
        system_cost,
        annual_energy_kwh,
        annual_savings,
        payback_years,
        lifetime_energy_kwh,
        lifetime_savings: lifetime_energy_kwh * params.electricity_rate_per_kwh,
        monthly_energy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::monthly_clear_sky_insolation;
    use pvrisk_types::ArrayOrientation;

    fn flat() -> Vec<MonthlyInsolation> {
        monthly_clear_sky_insolation(50.0, &ArrayOrientation::flat(), 0.5).unwrap()
    }

    #[test]
    fn test_energy_and_payback() {
        // 1000 W/m² for 1/8.76 of the year is 1000 sun hours
        let environment = EnvironmentalSummary::new(25.0, None, 1000.0 / 8.76);
        let params = FinancialParameters {
            cost_per_watt: 1.2,
            electricity_rate_per_kwh: 0.2,
            performance_ratio: 0.8,
            temperature_coefficient_pct_per_c: -0.4,
        };

        let estimate =
            estimate_financials(5000.0, &environment, &flat(), &params, &[0.0; 3]).unwrap();

        assert!((estimate.annual_energy_kwh - 4000.0).abs() < 1e-6);
        assert!((estimate.system_cost - 6000.0).abs() < 1e-9);
        assert!((estimate.annual_savings - 800.0).abs() < 1e-6);
        assert!((estimate.payback_years.unwrap() - 7.5).abs() < 1e-6);
        assert!((estimate.lifetime_energy_kwh - 12000.0).abs() < 1e-6);
    }

    #[test]
    fn test_heat_and_degradation_reduce_yield() {
        let params = FinancialParameters::default();
        let cool = EnvironmentalSummary::new(25.0, None, 200.0);
        let hot = EnvironmentalSummary::new(45.0, None, 200.0);

        let insolation = flat();
        let cool_estimate =
            estimate_financials(400.0, &cool, &insolation, &params, &[0.0, 0.0]).unwrap();
        let hot_estimate =
            estimate_financials(400.0, &hot, &insolation, &params, &[0.0, 0.0]).unwrap();
        assert!((hot_estimate.annual_energy_kwh / cool_estimate.annual_energy_kwh - 0.92).abs() < 1e-9);

        let degraded =
            estimate_financials(400.0, &cool, &insolation, &params, &[10.0, 20.0]).unwrap();
        assert!(
            (degraded.lifetime_energy_kwh - cool_estimate.annual_energy_kwh * 1.7).abs() < 1e-9
        );
    }

    #[test]
    fn test_no_savings_means_no_payback() {
        let params = FinancialParameters {
            electricity_rate_per_kwh: 0.0,
            ..FinancialParameters::default()
        };
        let environment = EnvironmentalSummary::new(25.0, None, 200.0);
        let estimate = estimate_financials(400.0, &environment, &[], &params, &[]).unwrap();
        assert!(estimate.payback_years.is_none());
    }

    #[test]
    fn test_invalid_parameters() {
        let environment = EnvironmentalSummary::new(25.0, None, 200.0);
        let params = FinancialParameters {
            performance_ratio: 1.5,
            ..FinancialParameters::default()
        };
        assert!(estimate_financials(400.0, &environment, &[], &params, &[]).is_err());
        assert!(
            estimate_financials(0.0, &environment, &[], &FinancialParameters::default(), &[]).is_err()
        );
    }

    #[test]
    fn test_monthly_breakdown_sums_to_annual() {
        let environment = EnvironmentalSummary::new(20.0, None, 130.0);
        let tilted =
            monthly_clear_sky_insolation(50.0, &ArrayOrientation::new(35.0, 180.0), 0.5).unwrap();
        let estimate = estimate_financials(
            400.0,
            &environment,
            &tilted,
            &FinancialParameters::default(),
            &[0.0],
        )
        .unwrap();

        assert_eq!(estimate.monthly_energy.len(), 12);
        assert_eq!(estimate.monthly_energy[0].month_name(), "January");
        assert_eq!(estimate.monthly_energy[11].month_name(), "December");
        let total: f64 = estimate.monthly_energy.iter().map(|m| m.energy_kwh).sum();
        assert!((total - estimate.annual_energy_kwh).abs() < 1e-9);
        assert!(estimate.monthly_energy[5].energy_kwh > estimate.monthly_energy[11].energy_kwh);
    }

    #[test]
    fn test_flat_array_keeps_sun_hour_yield_and_tilt_adds() {
        let environment = EnvironmentalSummary::new(25.0, None, 130.0);
        let params = FinancialParameters::default();
        let sun_hours_only = estimate_financials(400.0, &environment, &[], &params, &[]).unwrap();
        assert!(sun_hours_only.monthly_energy.is_empty());

        let flat_estimate =
            estimate_financials(400.0, &environment, &flat(), &params, &[]).unwrap();
        assert!(
            (flat_estimate.annual_energy_kwh - sun_hours_only.annual_energy_kwh).abs() < 1e-6
        );

        let tilted =
            monthly_clear_sky_insolation(50.0, &ArrayOrientation::new(35.0, 180.0), 0.5).unwrap();
        let tilted_estimate =
            estimate_financials(400.0, &environment, &tilted, &params, &[]).unwrap();
        assert!(tilted_estimate.annual_energy_kwh > flat_estimate.annual_energy_kwh);
        assert!(tilted_estimate.payback_years < flat_estimate.payback_years);
    }

    #[test]
    fn test_month_name_out_of_range() {
        let month = MonthlyEnergy {
            month: 13,
            plane_of_array_kwh_m2: 0.0,
            energy_kwh: 0.0,
        };
        assert_eq!(month.month_name(), "Unknown");
    }
}
