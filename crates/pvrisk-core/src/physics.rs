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

//! Closed-form physics behind the degradation model.

use crate::error::{PvRiskError, Result};

/// Boltzmann constant (eV/K)
pub const BOLTZMANN_EV_PER_K: f64 = 8.617e-5;

/// Offset between Celsius and Kelvin
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Default activation energy for PV degradation processes (eV)
pub const DEFAULT_ACTIVATION_ENERGY_EV: f64 = 0.7;

/// Reference temperature the acceleration factor is normalized to (K)
pub const DEFAULT_REFERENCE_TEMPERATURE_K: f64 = 298.0;

/// Arrhenius temperature-acceleration factor relative to `reference_temperature_k`.
///
/// `exp((Ea / k) * (1/T_ref - 1/T))`, always strictly positive. Values above 1
/// mean faster degradation than at the reference temperature.
///
/// Fails with [`PvRiskError::Domain`] for temperatures at or below absolute
/// zero and for a non-positive reference temperature.
pub fn acceleration_factor(
    temperature_c: f64,
    activation_energy_ev: f64,
    reference_temperature_k: f64,
) -> Result<f64> {
    if !temperature_c.is_finite() || temperature_c <= -CELSIUS_TO_KELVIN {
        return Err(PvRiskError::Domain(format!(
            "temperature {temperature_c} °C is at or below absolute zero"
        )));
    }
    if !reference_temperature_k.is_finite() || reference_temperature_k <= 0.0 {
        return Err(PvRiskError::Domain(format!(
            "reference temperature {reference_temperature_k} K must be positive"
        )));
    }
    if !activation_energy_ev.is_finite() {
        return Err(PvRiskError::InvalidParameter(format!(
            "activation energy {activation_energy_ev} eV is not a finite number"
        )));
    }

    let temperature_k = temperature_c + CELSIUS_TO_KELVIN;
    let exponent = (activation_energy_ev / BOLTZMANN_EV_PER_K)
        * (1.0 / reference_temperature_k - 1.0 / temperature_k);
    Ok(exponent.exp())
}

/// Acceleration factor with the default 0.7 eV / 298 K parameters
pub fn default_acceleration_factor(temperature_c: f64) -> Result<f64> {
    acceleration_factor(
        temperature_c,
        DEFAULT_ACTIVATION_ENERGY_EV,
        DEFAULT_REFERENCE_TEMPERATURE_K,
    )
}

/// Weibull survival probability `exp(-(t/eta)^beta)` for each time in `years`.
///
/// `eta` (characteristic lifetime) and `beta` (shape) must be positive.
/// The result is non-increasing in `t` and lies in `[0, 1]`.
pub fn weibull_survival(years: &[f64], eta: f64, beta: f64) -> Result<Vec<f64>> {
    if !eta.is_finite() || eta <= 0.0 {
        return Err(PvRiskError::InvalidParameter(format!(
            "Weibull scale (eta) must be positive, got {eta}"
        )));
    }
    if !beta.is_finite() || beta <= 0.0 {
        return Err(PvRiskError::InvalidParameter(format!(
            "Weibull shape (beta) must be positive, got {beta}"
        )));
    }
    if let Some(bad) = years.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(PvRiskError::InvalidParameter(format!(
            "survival time must be a nonnegative number, got {bad}"
        )));
    }

    Ok(years
        .iter()
        .map(|t| (-(t / eta).powf(beta)).exp())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceleration_near_reference_is_unity() {
        // 25 °C is 298.15 K, 0.15 K above the 298 K reference
        let af = default_acceleration_factor(25.0).unwrap();
        assert!((af - 1.0).abs() < 0.02, "expected ~1.0, got {af}");

        let exact = acceleration_factor(24.85, 0.7, 298.0).unwrap();
        assert!((exact - 1.0).abs() < 1e-9, "expected 1.0, got {exact}");
    }

    #[test]
    fn test_acceleration_strictly_increasing_in_temperature() {
        let temps = [-40.0, -10.0, 0.0, 15.0, 25.0, 45.0, 65.0, 85.0];
        let factors: Vec<f64> = temps
            .iter()
            .map(|t| default_acceleration_factor(*t).unwrap())
            .collect();

        for pair in factors.windows(2) {
            assert!(pair[1] > pair[0], "not increasing: {pair:?}");
        }
        assert!(factors.iter().all(|f| *f > 0.0));
        assert!(factors[0] < 1.0, "cold sites decelerate degradation");
    }

    #[test]
    fn test_acceleration_matches_formula_at_45c() {
        let expected = ((0.7_f64 / 8.617e-5) * (1.0 / 298.0 - 1.0 / 318.15)).exp();
        let af = default_acceleration_factor(45.0).unwrap();
        assert!((af - expected).abs() < 1e-12);
    }

    #[test]
    fn test_acceleration_rejects_absolute_zero() {
        assert!(matches!(
            default_acceleration_factor(-273.15),
            Err(PvRiskError::Domain(_))
        ));
        assert!(matches!(
            default_acceleration_factor(-300.0),
            Err(PvRiskError::Domain(_))
        ));
        assert!(default_acceleration_factor(-273.0).is_ok());
    }

    #[test]
    fn test_weibull_survival_decreasing_in_unit_interval() {
        let survival = weibull_survival(&[1.0, 5.0, 10.0, 25.0], 10.0, 1.0).unwrap();

        assert_eq!(survival.len(), 4);
        for pair in survival.windows(2) {
            assert!(pair[1] < pair[0], "not strictly decreasing: {pair:?}");
        }
        assert!(survival.iter().all(|s| *s > 0.0 && *s <= 1.0));
        // At t = eta survival is 1/e regardless of shape
        assert!((survival[2] - (-1.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_weibull_rejects_non_positive_parameters() {
        assert!(matches!(
            weibull_survival(&[1.0], 0.0, 1.0),
            Err(PvRiskError::InvalidParameter(_))
        ));
        assert!(matches!(
            weibull_survival(&[1.0], 10.0, -2.0),
            Err(PvRiskError::InvalidParameter(_))
        ));
        assert!(matches!(
            weibull_survival(&[f64::NAN], 10.0, 2.0),
            Err(PvRiskError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_weibull_empty_input() {
        assert!(weibull_survival(&[], 30.0, 2.5).unwrap().is_empty());
    }
}
