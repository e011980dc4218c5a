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

//! Error types for the reliability engine

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PvRiskError {
    #[error("missing reference data: {resource}")]
    MissingReferenceData { resource: String },

    #[error("environmental data unavailable: {0}")]
    EnvironmentalFetch(String),

    #[error("domain error: {0}")]
    Domain(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("bill of materials is incomplete, no selection for: {}", missing.join(", "))]
    IncompleteBom { missing: Vec<String> },

    #[error("component '{component}' is selected more than once")]
    DuplicateSelection { component: String },

    #[error("no catalog entry for component '{component}' with type '{material_type}'")]
    UnknownMaterial {
        component: String,
        material_type: String,
    },

    #[error("unknown stress profile '{0}'")]
    UnknownProfile(String),

    #[error("unknown site '{0}'")]
    UnknownLocation(String),

    #[error("reference table parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stress profile file parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PvRiskError>;
