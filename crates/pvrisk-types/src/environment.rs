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

/// Irradiance (W/m²) per UV index point used to derive the UV index
pub const IRRADIANCE_PER_UV_INDEX: f64 = 50.0;

/// Where the module is installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Coordinates { latitude: f64, longitude: f64 },
    Named(String),
}

impl Location {
    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        Self::Coordinates {
            latitude,
            longitude,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coordinates {
                latitude,
                longitude,
            } => write!(f, "{latitude:.4}, {longitude:.4}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Scalar site statistics for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalSummary {
    pub mean_temperature_c: f64,
    #[serde(default)]
    pub mean_relative_humidity_pct: Option<f64>,
    pub mean_irradiance_wm2: f64,
    /// Hours per year spent in damp-heat conditions, when the source knows it
    #[serde(default)]
    pub damp_heat_hours: Option<f64>,
}

impl EnvironmentalSummary {
    pub fn new(
        mean_temperature_c: f64,
        mean_relative_humidity_pct: Option<f64>,
        mean_irradiance_wm2: f64,
    ) -> Self {
        Self {
            mean_temperature_c,
            mean_relative_humidity_pct,
            mean_irradiance_wm2,
            damp_heat_hours: None,
        }
    }

    /// UV index derived from mean irradiance
    pub fn derived_uv_index(&self) -> f64 {
        self.mean_irradiance_wm2 / IRRADIANCE_PER_UV_INDEX
    }

    /// Apply user overrides on top of fetched values
    #[must_use]
    pub fn with_overrides(mut self, overrides: &EnvironmentOverrides) -> Self {
        if let Some(t) = overrides.mean_temperature_c {
            self.mean_temperature_c = t;
        }
        if let Some(rh) = overrides.mean_relative_humidity_pct {
            self.mean_relative_humidity_pct = Some(rh);
        }
        if let Some(irr) = overrides.mean_irradiance_wm2 {
            self.mean_irradiance_wm2 = irr;
        }
        if let Some(hours) = overrides.damp_heat_hours {
            self.damp_heat_hours = Some(hours);
        }
        self
    }
}

/// Manually entered environmental values that replace fetched ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentOverrides {
    #[serde(default)]
    pub mean_temperature_c: Option<f64>,
    #[serde(default)]
    pub mean_relative_humidity_pct: Option<f64>,
    #[serde(default)]
    pub mean_irradiance_wm2: Option<f64>,
    #[serde(default)]
    pub damp_heat_hours: Option<f64>,
}

impl EnvironmentOverrides {
    /// A complete summary can be built without asking any provider
    pub fn as_summary(&self) -> Option<EnvironmentalSummary> {
        let temperature = self.mean_temperature_c?;
        let irradiance = self.mean_irradiance_wm2?;
        Some(EnvironmentalSummary {
            mean_temperature_c: temperature,
            mean_relative_humidity_pct: self.mean_relative_humidity_pct,
            mean_irradiance_wm2: irradiance,
            damp_heat_hours: self.damp_heat_hours,
        })
    }
}
