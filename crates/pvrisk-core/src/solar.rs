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

//! Sun geometry and month-resolved clear-sky insolation.
//!
//! The year is walked day by day in quarter-hour steps. Global horizontal
//! irradiance is the extraterrestrial value scaled by a constant clearness
//! index, split into beam and diffuse with the Erbs correlation and
//! transposed to the module plane with the isotropic sky model.

use pvrisk_types::ArrayOrientation;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use crate::error::{PvRiskError, Result};

/// Solar constant (W/m²)
pub const SOLAR_CONSTANT: f64 = 1361.0;

/// Ground reflectance seen by tilted modules
const ALBEDO: f64 = 0.2;

const STEPS_PER_HOUR: u32 = 4;

/// Non-leap year
const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Solar declination (rad), Cooper's equation
pub fn declination(day_of_year: f64) -> f64 {
    23.45_f64.to_radians() * (2.0 * PI * (284.0 + day_of_year) / 365.0).sin()
}

/// Earth-sun distance correction of the solar constant
pub fn eccentricity(day_of_year: f64) -> f64 {
    1.0 + 0.033 * (2.0 * PI * day_of_year / 365.0).cos()
}

/// Diffuse share of global horizontal irradiance (Erbs)
pub fn diffuse_fraction(clearness_index: f64) -> f64 {
    let kt = clearness_index;
    if kt <= 0.22 {
        1.0 - 0.09 * kt
    } else if kt <= 0.8 {
        0.9511 - 0.1604 * kt + 4.388 * kt.powi(2) - 16.638 * kt.powi(3) + 12.336 * kt.powi(4)
    } else {
        0.165
    }
}

/// Clear-sky insolation over one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyInsolation {
    /// 1 = January
    pub month: u8,
    pub horizontal_kwh_m2: f64,
    pub plane_of_array_kwh_m2: f64,
}

/// Insolation for every month of a typical year.
///
/// Clearness index is the ratio of surface to extraterrestrial horizontal
/// irradiance and is applied uniformly across the year.
pub fn monthly_clear_sky_insolation(
    latitude_deg: f64,
    orientation: &ArrayOrientation,
    clearness_index: f64,
) -> Result<Vec<MonthlyInsolation>> {
    if !(-90.0..=90.0).contains(&latitude_deg) {
        return Err(PvRiskError::Domain(format!(
            "latitude {latitude_deg} is outside -90..90"
        )));
    }
    if !(0.0..=90.0).contains(&orientation.tilt_deg) {
        return Err(PvRiskError::InvalidParameter(format!(
            "tilt must be within 0-90°, got {}",
            orientation.tilt_deg
        )));
    }
    if !(0.0..=360.0).contains(&orientation.azimuth_deg) {
        return Err(PvRiskError::InvalidParameter(format!(
            "azimuth must be within 0-360°, got {}",
            orientation.azimuth_deg
        )));
    }
    if !(0.0..=1.0).contains(&clearness_index) {
        return Err(PvRiskError::InvalidParameter(format!(
            "clearness index must be within 0-1, got {clearness_index}"
        )));
    }

    let phi = latitude_deg.to_radians();
    let tilt = orientation.tilt_deg.to_radians();
    let azimuth = orientation.azimuth_deg.to_radians();
    // Module normal in (east, north, up)
    let normal = (
        tilt.sin() * azimuth.sin(),
        tilt.sin() * azimuth.cos(),
        tilt.cos(),
    );
    let sky_view = (1.0 + tilt.cos()) / 2.0;
    let ground_view = (1.0 - tilt.cos()) / 2.0;
    let diffuse_share = diffuse_fraction(clearness_index);
    let step_hours = 1.0 / f64::from(STEPS_PER_HOUR);

    let mut months = Vec::with_capacity(DAYS_IN_MONTH.len());
    let mut day_of_year = 0_u32;
    for (month, days) in (1_u8..).zip(DAYS_IN_MONTH) {
        let mut horizontal_wh = 0.0;
        let mut plane_wh = 0.0;
        for _ in 0..days {
            day_of_year += 1;
            let day = f64::from(day_of_year);
            let delta = declination(day);
            let global_normal = SOLAR_CONSTANT * eccentricity(day) * clearness_index;

            for step in 0..24 * STEPS_PER_HOUR {
                let solar_time = (f64::from(step) + 0.5) * step_hours;
                let omega = (solar_time - 12.0) * 15_f64.to_radians();
                let east = -delta.cos() * omega.sin();
                let north = delta.sin() * phi.cos() - delta.cos() * phi.sin() * omega.cos();
                let up = delta.sin() * phi.sin() + delta.cos() * phi.cos() * omega.cos();
                if up <= 0.0 {
                    continue;
                }

                let global_horizontal = global_normal * up;
                let diffuse = diffuse_share * global_horizontal;
                let beam_normal = (1.0 - diffuse_share) * global_normal;
                let incidence = (normal.0 * east + normal.1 * north + normal.2 * up).max(0.0);

                horizontal_wh += global_horizontal * step_hours;
                plane_wh += (beam_normal * incidence
                    + diffuse * sky_view
                    + global_horizontal * ALBEDO * ground_view)
                    * step_hours;
            }
        }
        months.push(MonthlyInsolation {
            month,
            horizontal_kwh_m2: horizontal_wh / 1000.0,
            plane_of_array_kwh_m2: plane_wh / 1000.0,
        });
    }

    debug!(
        "Clear-sky insolation at {latitude_deg:.2}°: {:.0} kWh/m² horizontal, {:.0} in plane",
        months.iter().map(|m| m.horizontal_kwh_m2).sum::<f64>(),
        months.iter().map(|m| m.plane_of_array_kwh_m2).sum::<f64>()
    );
    Ok(months)
}

/// Clearness index implied by a site's annual mean horizontal irradiance
pub fn site_clearness_index(latitude_deg: f64, mean_irradiance_wm2: f64) -> f64 {
    let extraterrestrial = mean_extraterrestrial_irradiance(latitude_deg);
    if extraterrestrial <= 0.0 {
        return 0.0;
    }
    (mean_irradiance_wm2 / extraterrestrial).clamp(0.0, 1.0)
}

/// Annual mean of the 24-hour mean extraterrestrial horizontal irradiance (W/m²)
pub fn mean_extraterrestrial_irradiance(latitude_deg: f64) -> f64 {
    let phi = latitude_deg.to_radians();
    let total: f64 = (1..=365)
        .map(|day| {
            let day = f64::from(day);
            let delta = declination(day);
            // Sunset hour angle; polar day and night clamp to ±1
            let cos_ws = (-phi.tan() * delta.tan()).clamp(-1.0, 1.0);
            let ws = cos_ws.acos();
            SOLAR_CONSTANT / PI
                * eccentricity(day)
                * (phi.cos() * delta.cos() * ws.sin() + ws * phi.sin() * delta.sin())
        })
        .sum();
    total / 365.0
}
