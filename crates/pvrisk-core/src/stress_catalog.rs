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

//! Named accelerated-test protocols.

use pvrisk_types::{StressProfile, StressTest};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::{PvRiskError, Result};

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: Vec<ProfileEntry>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    name: String,
    #[serde(default)]
    tests: Vec<TestEntry>,
}

#[derive(Debug, Deserialize)]
struct TestEntry {
    id: String,
    weight: f64,
}

/// Stress profiles addressable by name (case-insensitive)
#[derive(Debug, Clone, PartialEq)]
pub struct StressProfileCatalog {
    profiles: Vec<StressProfile>,
}

impl Default for StressProfileCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StressProfileCatalog {
    /// Built-in protocols
    pub fn builtin() -> Self {
        let profiles = vec![
            StressProfile::new("Field Only"),
            StressProfile::new("IEC 61215")
                .with_test("UV", 1.0)
                .with_test("TC200", 2.0)
                .with_test("DH1000", 2.0)
                .with_test("HF10", 1.0),
            StressProfile::new("IEC 61215 Extended")
                .with_test("UV", 2.0)
                .with_test("TC400", 3.0)
                .with_test("DH2000", 3.5)
                .with_test("HF20", 1.5),
            StressProfile::new("PID Screening")
                .with_test("PID", 2.5)
                .with_test("DH1000", 1.5),
            StressProfile::new("Desert")
                .with_test("UV", 3.0)
                .with_test("TC600", 3.0),
        ];
        Self { profiles }
    }

    pub fn profiles(&self) -> &[StressProfile] {
        &self.profiles
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn get(&self, name: &str) -> Result<&StressProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| PvRiskError::UnknownProfile(name.to_owned()))
    }

    /// Add a profile, replacing any existing one with the same name
    pub fn insert(&mut self, profile: StressProfile) {
        if let Some(existing) = self
            .profiles
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&profile.name))
        {
            *existing = profile;
        } else {
            self.profiles.push(profile);
        }
    }

    /// Parse profiles from TOML text.
    ///
    /// ```toml
    /// [[profiles]]
    /// name = "Marine"
    /// tests = [{ id = "SM6", weight = 2.0 }, { id = "DH1000", weight = 1.5 }]
    /// ```
    pub fn parse_profiles(content: &str) -> Result<Vec<StressProfile>> {
        let file: ProfileFile = toml::from_str(content)?;
        file.profiles
            .into_iter()
            .map(|entry| {
                if entry.name.trim().is_empty() {
                    return Err(PvRiskError::InvalidParameter(
                        "stress profile name cannot be empty".to_owned(),
                    ));
                }
                let mut profile = StressProfile::new(entry.name.trim());
                for test in entry.tests {
                    if !test.weight.is_finite() || test.weight < 0.0 {
                        return Err(PvRiskError::InvalidParameter(format!(
                            "profile '{}': test '{}' weight must be nonnegative, got {}",
                            profile.name, test.id, test.weight
                        )));
                    }
                    if test.id.trim().is_empty() {
                        return Err(PvRiskError::InvalidParameter(format!(
                            "profile '{}': test identifier cannot be empty",
                            profile.name
                        )));
                    }
                    let id = test.id.trim().to_owned();
                    if !profile.insert(StressTest::new(id.clone(), test.weight)) {
                        return Err(PvRiskError::InvalidParameter(format!(
                            "profile '{}': test '{id}' listed twice",
                            profile.name
                        )));
                    }
                }
                Ok(profile)
            })
            .collect()
    }

    /// Merge profiles from a TOML file over this catalog
    pub fn merge_file(&mut self, path: &Path) -> Result<usize> {
        if !path.is_file() {
            return Err(PvRiskError::MissingReferenceData {
                resource: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let profiles = Self::parse_profiles(&content)?;
        let count = profiles.len();
        for profile in profiles {
            self.insert(profile);
        }
        info!("Loaded {count} stress profiles from {}", path.display());
        Ok(count)
    }
}
