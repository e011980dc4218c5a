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

//! Environmental summary providers.
//!
//! A provider turns a [`Location`] into scalar site statistics. Providers are
//! interchangeable: a fixed stand-in, a synthetic clear-sky model and a cached
//! TMY dataset. [`fetch_with_timeout`] wraps any of them in the single
//! blocking call with a deadline that a simulation run makes.

use chrono::{DateTime, NaiveDateTime};
use pvrisk_types::{EnvironmentalSummary, Location};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{PvRiskError, Result};
use crate::solar::mean_extraterrestrial_irradiance;

/// Relative humidity at or above which an hour counts as damp heat (%)
pub const DAMP_HEAT_RH_THRESHOLD_PCT: f64 = 85.0;

const HOURS_PER_YEAR: f64 = 8760.0;

/// A named site with coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Named sites that a [`Location::Named`] can refer to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteCatalog {
    sites: Vec<Site>,
}

impl Default for SiteCatalog {
    fn default() -> Self {
        let builtin = [
            ("Prague", 50.0755, 14.4378),
            ("Munich", 48.1351, 11.5820),
            ("Madrid", 40.4168, -3.7038),
            ("Phoenix", 33.4484, -112.0740),
            ("Riyadh", 24.7136, 46.6753),
            ("Chennai", 13.0827, 80.2707),
            ("Singapore", 1.3521, 103.8198),
            ("Sydney", -33.8688, 151.2093),
        ];
        Self {
            sites: builtin
                .into_iter()
                .map(|(name, latitude, longitude)| Site {
                    name: name.to_owned(),
                    latitude,
                    longitude,
                })
                .collect(),
        }
    }
}

impl SiteCatalog {
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn find(&self, name: &str) -> Option<&Site> {
        self.sites
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Latitude and longitude of a location
    pub fn resolve(&self, location: &Location) -> Result<(f64, f64)> {
        let (latitude, longitude) = match location {
            Location::Coordinates {
                latitude,
                longitude,
            } => (*latitude, *longitude),
            Location::Named(name) => {
                let site = self
                    .find(name)
                    .ok_or_else(|| PvRiskError::UnknownLocation(name.clone()))?;
                (site.latitude, site.longitude)
            }
        };
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(PvRiskError::Domain(format!(
                "coordinates ({latitude}, {longitude}) are out of range"
            )));
        }
        Ok((latitude, longitude))
    }
}

/// Pluggable source of site statistics
pub trait EnvironmentSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn summarize(&self, location: &Location) -> Result<EnvironmentalSummary>;
}

/// Returns the same values for every location
#[derive(Debug, Clone, Copy)]
pub struct FixedEnvironment {
    summary: EnvironmentalSummary,
}

impl FixedEnvironment {
    pub fn new(summary: EnvironmentalSummary) -> Self {
        Self { summary }
    }
}

impl EnvironmentSource for FixedEnvironment {
    fn name(&self) -> &str {
        "fixed"
    }

    fn summarize(&self, _location: &Location) -> Result<EnvironmentalSummary> {
        Ok(self.summary)
    }
}

/// Deterministic synthetic clear-sky climate.
///
/// Irradiance is the annual mean extraterrestrial horizontal irradiance at
/// the site latitude scaled by a clearness index. Temperature comes from a
/// linear latitude climatology. No humidity is produced.
#[derive(Debug, Clone)]
pub struct ClearSkyEnvironment {
    sites: SiteCatalog,
    clearness_index: f64,
}

impl ClearSkyEnvironment {
    pub fn new(sites: SiteCatalog, clearness_index: f64) -> Self {
        Self {
            sites,
            clearness_index,
        }
    }

    /// Mean air temperature from latitude (°C)
    pub fn climatological_temperature(latitude_deg: f64) -> f64 {
        28.0 - 0.4 * latitude_deg.abs()
    }
}

impl EnvironmentSource for ClearSkyEnvironment {
    fn name(&self) -> &str {
        "clear_sky"
    }

    fn summarize(&self, location: &Location) -> Result<EnvironmentalSummary> {
        if !(0.0..=1.0).contains(&self.clearness_index) {
            return Err(PvRiskError::InvalidParameter(format!(
                "clearness index must be within 0-1, got {}",
                self.clearness_index
            )));
        }
        let (latitude, _longitude) = self.sites.resolve(location)?;
        let irradiance =
            mean_extraterrestrial_irradiance(latitude).max(0.0) * self.clearness_index;
        Ok(EnvironmentalSummary::new(
            Self::climatological_temperature(latitude),
            None,
            irradiance,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TmyRow {
    timestamp: String,
    temp_air: f64,
    #[serde(default)]
    relative_humidity: Option<f64>,
    ghi: f64,
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").ok())
}

/// Typical meteorological year cached as CSV.
///
/// Columns: `timestamp,temp_air,relative_humidity,ghi`, in time order. The
/// dataset describes one site, so the requested location is only logged.
#[derive(Debug, Clone)]
pub struct TmyCsvEnvironment {
    path: PathBuf,
}

impl TmyCsvEnvironment {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn fetch_error(&self, reason: impl std::fmt::Display) -> PvRiskError {
        PvRiskError::EnvironmentalFetch(format!("{}: {reason}", self.path.display()))
    }
}

impl EnvironmentSource for TmyCsvEnvironment {
    fn name(&self) -> &str {
        "tmy"
    }

    fn summarize(&self, location: &Location) -> Result<EnvironmentalSummary> {
        debug!("Reading TMY data from {} for {location}", self.path.display());
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| self.fetch_error(e))?;

        let mut samples = 0_u32;
        let mut temperature_sum = 0.0;
        let mut irradiance_sum = 0.0;
        let mut humidity_sum = 0.0;
        let mut humidity_samples = 0_u32;
        let mut damp_samples = 0_u32;
        let mut previous: Option<NaiveDateTime> = None;

        for row in reader.deserialize::<TmyRow>() {
            let row = row.map_err(|e| self.fetch_error(e))?;
            let timestamp = parse_timestamp(&row.timestamp)
                .ok_or_else(|| self.fetch_error(format!("bad timestamp '{}'", row.timestamp)))?;
            if previous.is_some_and(|p| timestamp <= p) {
                return Err(self.fetch_error(format!("timestamps not increasing at {timestamp}")));
            }
            previous = Some(timestamp);

            samples += 1;
            temperature_sum += row.temp_air;
            irradiance_sum += row.ghi.max(0.0);
            if let Some(rh) = row.relative_humidity {
                humidity_sum += rh;
                humidity_samples += 1;
                if rh >= DAMP_HEAT_RH_THRESHOLD_PCT {
                    damp_samples += 1;
                }
            }
        }

        if samples == 0 {
            return Err(self.fetch_error("no rows"));
        }

        let n = f64::from(samples);
        let mut summary = EnvironmentalSummary::new(
            temperature_sum / n,
            (humidity_samples > 0).then(|| humidity_sum / f64::from(humidity_samples)),
            irradiance_sum / n,
        );
        // Annualized, so partial datasets stay comparable
        if humidity_samples > 0 {
            summary.damp_heat_hours =
                Some(f64::from(damp_samples) / f64::from(humidity_samples) * HOURS_PER_YEAR);
        }
        Ok(summary)
    }
}

/// Run one provider call with a deadline.
///
/// The provider runs on its own thread. On timeout the run is abandoned and
/// reported as [`PvRiskError::EnvironmentalFetch`]; it is never retried.
pub fn fetch_with_timeout(
    source: Arc<dyn EnvironmentSource>,
    location: &Location,
    timeout: Duration,
) -> Result<EnvironmentalSummary> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let name = source.name().to_owned();
    let target = location.clone();

    std::thread::Builder::new()
        .name(format!("env-{name}"))
        .spawn(move || {
            let result = source.summarize(&target);
            // Receiver may have given up already
            let _ = tx.send(result);
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            let summary = result?;
            info!(
                "Environment from {name}: {:.1}°C, {:.0} W/m²",
                summary.mean_temperature_c, summary.mean_irradiance_wm2
            );
            Ok(summary)
        }
        Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(PvRiskError::EnvironmentalFetch(
            format!("{name} provider timed out after {}s", timeout.as_secs_f64()),
        )),
        Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(
            PvRiskError::EnvironmentalFetch(format!("{name} provider stopped without a result")),
        ),
    }
}
