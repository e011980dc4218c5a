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

//! Data model shared by the PVRisk engine and its front ends.
//!
//! Everything here is plain data: reference records loaded once per session,
//! the immutable simulation request, and the per-run result rows.

pub mod environment;
pub mod material;
pub mod reliability;
pub mod request;
pub mod risk;
pub mod stress;

// Re-export common types for convenience
pub use environment::{EnvironmentOverrides, EnvironmentalSummary, Location};
pub use material::{BomCatalog, BomSelection, ComponentSlot, MaterialRecord};
pub use reliability::{DegradationResult, WeibullParameters};
pub use request::{ArrayOrientation, SimulationRequest};
pub use risk::{FailureRiskRow, RiskReportRow};
pub use stress::{StressProfile, StressTest};
