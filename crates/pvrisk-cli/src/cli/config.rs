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

//! `pvrisk.toml` configuration.

use anyhow::{Context, Result, bail};
use pvrisk_core::environment::{ClearSkyEnvironment, FixedEnvironment, SiteCatalog, TmyCsvEnvironment};
use pvrisk_core::reference::{DEFAULT_BOM_FILE, DEFAULT_RISK_FILE, DEFAULT_WEIBULL_FILE};
use pvrisk_core::{
    CsvReferenceStore, EnvironmentSource, FinancialParameters, MatchMode, ModelConstants,
    RunSettings, StressProfileCatalog,
};
use pvrisk_types::EnvironmentalSummary;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::validation::ValidationResult;

pub const DEFAULT_CONFIG_FILE: &str = "pvrisk.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub financial: FinancialParameters,
    #[serde(default)]
    pub system: SystemConfig,
}

/// Where the reference tables live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_bom_file")]
    pub bom_file: String,
    #[serde(default = "default_risk_file")]
    pub risk_file: String,
    #[serde(default = "default_weibull_file")]
    pub weibull_file: String,
    /// Extra stress profiles merged over the built-in ones
    #[serde(default)]
    pub stress_profiles: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_bom_file() -> String {
    DEFAULT_BOM_FILE.to_owned()
}

fn default_risk_file() -> String {
    DEFAULT_RISK_FILE.to_owned()
}

fn default_weibull_file() -> String {
    DEFAULT_WEIBULL_FILE.to_owned()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            bom_file: default_bom_file(),
            risk_file: default_risk_file(),
            weibull_file: default_weibull_file(),
            stress_profiles: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(flatten)]
    pub constants: ModelConstants,
    #[serde(default)]
    pub match_mode: MatchMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    ClearSky,
    Tmy,
    Fixed,
}

/// Values returned by the fixed provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedValues {
    pub temperature_c: f64,
    #[serde(default)]
    pub relative_humidity_pct: Option<f64>,
    pub irradiance_wm2: f64,
    #[serde(default)]
    pub damp_heat_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub tmy_path: Option<PathBuf>,
    #[serde(default = "default_clearness_index")]
    pub clearness_index: f64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub fixed: Option<FixedValues>,
}

fn default_clearness_index() -> f64 {
    0.6
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            tmy_path: None,
            clearness_index: default_clearness_index(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            fixed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl AppConfig {
    /// Load from `explicit`, else `./pvrisk.toml`, else defaults with
    /// environment overrides. The result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            let config = Self::from_file(local)?;
            return Ok((config, ConfigSource::File(local.to_path_buf())));
        }

        let config = Self::from_env();
        config.validate()?;
        Ok((config, ConfigSource::Defaults))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with `PVRISK_DATA_DIR` and `PVRISK_LOG_LEVEL` applied
    fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("PVRISK_DATA_DIR")
            && !dir.trim().is_empty()
        {
            config.data.dir = PathBuf::from(dir);
        }

        if let Ok(level) = std::env::var("PVRISK_LOG_LEVEL") {
            config.system.log_level = level.trim().to_lowercase();
        }

        config
    }

    pub fn validate_detailed(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        for (field, name) in [
            ("data.bom_file", &self.data.bom_file),
            ("data.risk_file", &self.data.risk_file),
            ("data.weibull_file", &self.data.weibull_file),
        ] {
            if name.trim().is_empty() {
                result.add_error(field, "File name cannot be empty");
            }
        }
        if !self.data.dir.is_dir() {
            result.add_warning(
                "data.dir",
                format!("Directory {} does not exist", self.data.dir.display()),
            );
        }

        result.merge(self.validate_model());
        result.merge(self.validate_environment());
        result.merge(self.validate_financial());

        if !LOG_LEVELS.contains(&self.system.log_level.as_str()) {
            result.add_error(
                "system.log_level",
                format!(
                    "Unknown log level '{}', expected one of {}",
                    self.system.log_level,
                    LOG_LEVELS.join(", ")
                ),
            );
        }

        result
    }

    fn validate_model(&self) -> ValidationResult {
        let mut result = ValidationResult::success();
        let constants = &self.model.constants;

        if let Err(e) = constants.validate() {
            result.add_error("model", e.to_string());
        }
        if constants.stabilization_factor > 1.0 {
            result.add_warning(
                "model.stabilization_factor",
                "Factor above 1 accelerates degradation after burn-in",
            );
        }
        if constants.horizon_years != 25 {
            result.add_warning(
                "model.horizon_years",
                format!(
                    "Horizon of {} years differs from the usual 25-year warranty",
                    constants.horizon_years
                ),
            );
        }
        if constants.reference_temperature_k <= 0.0 {
            result.add_error(
                "model.reference_temperature_k",
                "Reference temperature must be above absolute zero",
            );
        }

        result
    }

    fn validate_environment(&self) -> ValidationResult {
        let mut result = ValidationResult::success();
        let env = &self.environment;

        if env.fetch_timeout_secs == 0 {
            result.add_error("environment.fetch_timeout_secs", "Timeout must be at least 1s");
        }
        match env.provider {
            ProviderKind::ClearSky => {
                if !(0.0..=1.0).contains(&env.clearness_index) {
                    result.add_error(
                        "environment.clearness_index",
                        "Clearness index must be within 0-1",
                    );
                }
            }
            ProviderKind::Tmy => match &env.tmy_path {
                None => result.add_error(
                    "environment.tmy_path",
                    "TMY provider requires a tmy_path",
                ),
                Some(path) if !path.is_file() => result.add_warning(
                    "environment.tmy_path",
                    format!("File {} does not exist", path.display()),
                ),
                Some(_) => {}
            },
            ProviderKind::Fixed => match &env.fixed {
                None => result.add_error(
                    "environment.fixed",
                    "Fixed provider requires an [environment.fixed] table",
                ),
                Some(values) => {
                    if values
                        .relative_humidity_pct
                        .is_some_and(|rh| !(0.0..=100.0).contains(&rh))
                    {
                        result.add_error(
                            "environment.fixed.relative_humidity_pct",
                            "Relative humidity must be within 0-100%",
                        );
                    }
                    if values.irradiance_wm2 < 0.0 {
                        result.add_error(
                            "environment.fixed.irradiance_wm2",
                            "Irradiance cannot be negative",
                        );
                    }
                }
            },
        }

        result
    }

    fn validate_financial(&self) -> ValidationResult {
        let mut result = ValidationResult::success();
        let financial = &self.financial;

        if !(financial.performance_ratio > 0.0 && financial.performance_ratio <= 1.0) {
            result.add_error(
                "financial.performance_ratio",
                "Performance ratio must be within (0, 1]",
            );
        } else if financial.performance_ratio < 0.5 {
            result.add_warning(
                "financial.performance_ratio",
                "Performance ratio below 0.5 is unusually low",
            );
        }
        if financial.cost_per_watt < 0.0 {
            result.add_error("financial.cost_per_watt", "Cost cannot be negative");
        }
        if financial.electricity_rate_per_kwh < 0.0 {
            result.add_error(
                "financial.electricity_rate_per_kwh",
                "Electricity rate cannot be negative",
            );
        }
        if financial.temperature_coefficient_pct_per_c > 0.0 {
            result.add_warning(
                "financial.temperature_coefficient_pct_per_c",
                "Positive coefficient means output rises with temperature",
            );
        }

        result
    }

    /// Fail on any validation error
    pub fn validate(&self) -> Result<()> {
        let result = self.validate_detailed();
        if !result.is_valid() {
            let messages: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
            bail!("Invalid configuration: {}", messages.join("; "));
        }
        Ok(())
    }

    pub fn reference_store(&self) -> CsvReferenceStore {
        CsvReferenceStore::with_files(
            &self.data.dir,
            &self.data.bom_file,
            &self.data.risk_file,
            &self.data.weibull_file,
        )
    }

    /// Built-in profiles plus the configured profile file
    pub fn profile_catalog(&self) -> Result<StressProfileCatalog> {
        let mut catalog = StressProfileCatalog::builtin();
        if let Some(path) = &self.data.stress_profiles {
            catalog
                .merge_file(path)
                .with_context(|| format!("Failed to load stress profiles from {}", path.display()))?;
        }
        Ok(catalog)
    }

    pub fn environment_source(&self) -> Result<Arc<dyn EnvironmentSource>> {
        let env = &self.environment;
        let source: Arc<dyn EnvironmentSource> = match env.provider {
            ProviderKind::ClearSky => Arc::new(ClearSkyEnvironment::new(
                SiteCatalog::default(),
                env.clearness_index,
            )),
            ProviderKind::Tmy => {
                let Some(path) = &env.tmy_path else {
                    bail!("environment.tmy_path is required for the tmy provider");
                };
                Arc::new(TmyCsvEnvironment::new(path))
            }
            ProviderKind::Fixed => {
                let Some(values) = env.fixed else {
                    bail!("[environment.fixed] is required for the fixed provider");
                };
                let mut summary = EnvironmentalSummary::new(
                    values.temperature_c,
                    values.relative_humidity_pct,
                    values.irradiance_wm2,
                );
                summary.damp_heat_hours = values.damp_heat_hours;
                Arc::new(FixedEnvironment::new(summary))
            }
        };
        Ok(source)
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            constants: self.model.constants.clone(),
            financial: self.financial.clone(),
            match_mode: self.model.match_mode,
            fetch_timeout: Duration::from_secs(self.environment.fetch_timeout_secs),
            sites: SiteCatalog::default(),
        }
    }
}
