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

use crate::environment::{EnvironmentOverrides, Location};
use crate::material::BomSelection;
use crate::stress::StressProfile;

/// Fixed mounting of the module plane.
///
/// Azimuth is the compass direction the modules face, clockwise from north,
/// so 180° faces south.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrayOrientation {
    /// Tilt from horizontal (°), 0-90
    pub tilt_deg: f64,
    /// Facing direction (°), 0-360
    pub azimuth_deg: f64,
}

impl Default for ArrayOrientation {
    fn default() -> Self {
        Self {
            tilt_deg: 25.0,
            azimuth_deg: 180.0,
        }
    }
}

impl ArrayOrientation {
    pub fn new(tilt_deg: f64, azimuth_deg: f64) -> Self {
        Self {
            tilt_deg,
            azimuth_deg,
        }
    }

    /// Modules lying flat; plane-of-array and horizontal insolation coincide
    pub fn flat() -> Self {
        Self::new(0.0, 180.0)
    }
}

/// Everything a single "run simulation" action needs, fixed up front.
///
/// Built once by the caller and handed to the engine by reference; the engine
/// never reads selections from anywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub location: Location,
    pub bom: BomSelection,
    pub stress_profile: StressProfile,
    #[serde(default)]
    pub overrides: EnvironmentOverrides,
    /// Module nameplate power (W); enables power trajectories and energy estimates
    #[serde(default)]
    pub rated_power_w: Option<f64>,
    /// Mounting used for the monthly energy breakdown
    #[serde(default)]
    pub orientation: ArrayOrientation,
}

impl SimulationRequest {
    pub fn new(location: Location, bom: BomSelection, stress_profile: StressProfile) -> Self {
        Self {
            location,
            bom,
            stress_profile,
            overrides: EnvironmentOverrides::default(),
            rated_power_w: None,
            orientation: ArrayOrientation::default(),
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: EnvironmentOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    #[must_use]
    pub fn with_rated_power(mut self, rated_power_w: f64) -> Self {
        self.rated_power_w = Some(rated_power_w);
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: ArrayOrientation) -> Self {
        self.orientation = orientation;
        self
    }
}
