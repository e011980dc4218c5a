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

/// A single accelerated-aging test and how severe it is considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTest {
    /// Test identifier, e.g. "UV", "DH2000", "TC200", "PID"
    pub identifier: String,
    /// Nonnegative severity weight
    pub severity_weight: f64,
}

impl StressTest {
    pub fn new(identifier: impl Into<String>, severity_weight: f64) -> Self {
        Self {
            identifier: identifier.into(),
            severity_weight,
        }
    }

    /// First whitespace-delimited token of the identifier.
    ///
    /// "TC200 (-40/85C)" becomes "TC200". Returns `None` for a blank identifier.
    pub fn match_token(&self) -> Option<&str> {
        self.identifier.split_whitespace().next()
    }
}

/// A named set of stress tests. Identifiers are unique within a profile
/// (case-insensitive); iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStressProfile")]
pub struct StressProfile {
    pub name: String,
    tests: Vec<StressTest>,
}

#[derive(Deserialize)]
struct RawStressProfile {
    name: String,
    #[serde(default)]
    tests: Vec<StressTest>,
}

impl TryFrom<RawStressProfile> for StressProfile {
    type Error = String;

    fn try_from(raw: RawStressProfile) -> Result<Self, Self::Error> {
        let mut profile = Self::new(raw.name);
        for test in raw.tests {
            let identifier = test.identifier.clone();
            if !profile.insert(test) {
                return Err(format!(
                    "stress test '{identifier}' appears more than once in profile '{}'",
                    profile.name
                ));
            }
        }
        Ok(profile)
    }
}

impl StressProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
        }
    }

    /// Add a test. Returns `false` and leaves the profile unchanged if a test
    /// with the same identifier is already present.
    pub fn insert(&mut self, test: StressTest) -> bool {
        if self.contains(&test.identifier) {
            return false;
        }
        self.tests.push(test);
        true
    }

    /// Builder-style insert; duplicates are ignored
    #[must_use]
    pub fn with_test(mut self, identifier: impl Into<String>, severity_weight: f64) -> Self {
        self.insert(StressTest::new(identifier, severity_weight));
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.tests
            .iter()
            .any(|t| t.identifier.eq_ignore_ascii_case(identifier.trim()))
    }

    pub fn tests(&self) -> &[StressTest] {
        &self.tests
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Sum of all severity weights; zero for an empty profile
    pub fn total_stress_score(&self) -> f64 {
        self.tests.iter().map(|t| t.severity_weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_scores_zero() {
        let profile = StressProfile::new("Field only");
        assert!(profile.is_empty());
        assert!(profile.total_stress_score().abs() < f64::EPSILON);
    }

    #[test]
    fn test_identifiers_are_unique() {
        let mut profile = StressProfile::new("IEC").with_test("UV", 1.0);
        assert!(!profile.insert(StressTest::new("uv", 3.0)));
        assert!(profile.insert(StressTest::new("DH1000", 2.0)));

        assert_eq!(profile.len(), 2);
        assert!((profile.total_stress_score() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_match_token() {
        assert_eq!(
            StressTest::new("TC200 (-40/85C)", 1.0).match_token(),
            Some("TC200")
        );
        assert_eq!(StressTest::new("   ", 1.0).match_token(), None);
    }

    #[test]
    fn test_deserialize_rejects_repeated_identifier() {
        let json = r#"{"name": "Custom", "tests": [
            {"identifier": "UV", "severity_weight": 1.0},
            {"identifier": "uv", "severity_weight": 1.0}
        ]}"#;
        let err = serde_json::from_str::<StressProfile>(json).unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");

        let json = r#"{"name": "Custom", "tests": [
            {"identifier": "UV", "severity_weight": 1.0},
            {"identifier": "DH1000", "severity_weight": 2.0}
        ]}"#;
        let profile: StressProfile = serde_json::from_str(json).unwrap();
        assert!((profile.total_stress_score() - 3.0).abs() < 1e-12);
    }
}
