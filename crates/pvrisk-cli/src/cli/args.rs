// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PVRisk.

//! CLI argument definitions using clap.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use pvrisk_types::{ArrayOrientation, EnvironmentOverrides, Location};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pvrisk")]
#[command(author, version, about = "PV module reliability and failure-risk estimator")]
#[command(
    long_about = "Estimate long-term degradation, reliability and failure risk of a PV module build.\n\
    \nA run combines a site climate, a bill of materials and an accelerated-test stress profile.\n\
    Reference tables (BOM catalog, risk matrix, Weibull parameters) are read from the data directory.\n\
    \nExamples:\n  \
    pvrisk run --site Phoenix                          # Default BOM, IEC 61215 profile\n  \
    pvrisk run --site Prague --bom Cell=HJT --output json\n  \
    pvrisk catalog --component Backsheet               # List backsheet options"
)]
pub struct Cli {
    /// Configuration file (defaults to ./pvrisk.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one reliability simulation
    #[command(
        long_about = "Run a simulation for one site, BOM and stress profile.\n\
        \nSite (choose one):\n  \
        - Named: --site <name> (see `pvrisk sites`)\n  \
        - Coordinates: --lat <deg> --lon <deg>\n\
        \nUnselected BOM components take the first catalog option.\n\
        \nExamples:\n  \
        pvrisk run --site Riyadh --profile Desert --rated-power 450\n  \
        pvrisk run --site Prague --rated-power 400 --tilt 35 --azimuth 180\n  \
        pvrisk run --lat 35.1 --lon 33.4 --bom Encapsulant-Front=POE --bom Backsheet=PVF\n  \
        pvrisk run --site Singapore --temperature 31 --humidity 84 --irradiance 230"
    )]
    Run(RunArgs),

    /// List bill-of-materials options from the reference catalog
    Catalog(CatalogArgs),

    /// List available stress profiles
    Profiles(ListArgs),

    /// List built-in named sites
    Sites(ListArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Named site from the built-in catalog
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub site: Option<String>,

    /// Site latitude in degrees (requires --lon)
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Site longitude in degrees (requires --lat)
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// BOM selection as COMPONENT=TYPE; repeat for several components
    #[arg(long = "bom", value_name = "COMPONENT=TYPE", value_parser = parse_bom_choice)]
    pub bom: Vec<(String, String)>,

    /// Stress profile name (see `pvrisk profiles`)
    #[arg(long, default_value = "IEC 61215")]
    pub profile: String,

    /// Override mean ambient temperature (°C)
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<f64>,

    /// Override mean relative humidity (%)
    #[arg(long)]
    pub humidity: Option<f64>,

    /// Override mean irradiance (W/m²)
    #[arg(long)]
    pub irradiance: Option<f64>,

    /// Override annual damp-heat hours
    #[arg(long)]
    pub damp_heat_hours: Option<f64>,

    /// Module nameplate power (W); enables power series and financials
    #[arg(long)]
    pub rated_power: Option<f64>,

    /// Module tilt from horizontal (°)
    #[arg(long, default_value_t = 25.0)]
    pub tilt: f64,

    /// Direction the modules face (°, clockwise from north; 180 = south)
    #[arg(long, default_value_t = 180.0)]
    pub azimuth: f64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Print the year-by-year series under the summary tables
    #[arg(long, default_value_t = false)]
    pub series: bool,

    /// Also write the failure-risk rows to this CSV file
    #[arg(long, value_name = "PATH")]
    pub risk_csv: Option<PathBuf>,

    /// Also write the monthly energy breakdown to this CSV file (needs --rated-power)
    #[arg(long, value_name = "PATH", requires = "rated_power")]
    pub monthly_csv: Option<PathBuf>,
}

impl RunArgs {
    pub fn location(&self) -> Result<Location> {
        match (&self.site, self.lat, self.lon) {
            (Some(site), None, None) => Ok(Location::named(site.clone())),
            (None, Some(lat), Some(lon)) => Ok(Location::coordinates(lat, lon)),
            _ => bail!("Specify a site with --site <name> or --lat <deg> --lon <deg>"),
        }
    }

    pub fn orientation(&self) -> ArrayOrientation {
        ArrayOrientation::new(self.tilt, self.azimuth)
    }

    pub fn overrides(&self) -> EnvironmentOverrides {
        EnvironmentOverrides {
            mean_temperature_c: self.temperature,
            mean_relative_humidity_pct: self.humidity,
            mean_irradiance_wm2: self.irradiance,
            damp_heat_hours: self.damp_heat_hours,
        }
    }
}

fn parse_bom_choice(raw: &str) -> std::result::Result<(String, String), String> {
    let (component, material) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COMPONENT=TYPE, got '{raw}'"))?;
    let (component, material) = (component.trim(), material.trim());
    if component.is_empty() || material.is_empty() {
        return Err(format!("expected COMPONENT=TYPE, got '{raw}'"));
    }
    Ok((component.to_owned(), material.to_owned()))
}

#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// Only list options for this component
    #[arg(long)]
    pub component: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_site_and_bom() {
        let cli = Cli::try_parse_from([
            "pvrisk",
            "run",
            "--site",
            "Phoenix",
            "--bom",
            "Cell=HJT",
            "--bom",
            "Backsheet = PVF",
            "--output",
            "json",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.location().unwrap(), Location::named("Phoenix"));
        assert_eq!(
            args.bom,
            vec![
                ("Cell".to_owned(), "HJT".to_owned()),
                ("Backsheet".to_owned(), "PVF".to_owned()),
            ]
        );
        assert_eq!(args.profile, "IEC 61215");
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.orientation(), ArrayOrientation::default());
    }

    #[test]
    fn test_run_with_orientation_and_monthly_csv() {
        let cli = Cli::try_parse_from([
            "pvrisk",
            "run",
            "--site",
            "Sydney",
            "--rated-power",
            "400",
            "--tilt",
            "30",
            "--azimuth",
            "0",
            "--monthly-csv",
            "monthly.csv",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.orientation(), ArrayOrientation::new(30.0, 0.0));
        assert_eq!(args.monthly_csv, Some(PathBuf::from("monthly.csv")));

        assert!(
            Cli::try_parse_from(["pvrisk", "run", "--site", "Sydney", "--monthly-csv", "m.csv"])
                .is_err(),
            "monthly breakdown needs a rated power"
        );
    }

    #[test]
    fn test_run_with_coordinates_and_overrides() {
        let cli = Cli::try_parse_from([
            "pvrisk",
            "--config",
            "site.toml",
            "run",
            "--lat",
            "-33.9",
            "--lon",
            "151.2",
            "--temperature",
            "-5",
            "--irradiance",
            "180",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.location().unwrap(), Location::coordinates(-33.9, 151.2));
        let overrides = args.overrides();
        assert_eq!(overrides.mean_temperature_c, Some(-5.0));
        assert_eq!(overrides.mean_irradiance_wm2, Some(180.0));
        assert!(overrides.mean_relative_humidity_pct.is_none());
    }

    #[test]
    fn test_run_requires_a_location() {
        let cli = Cli::try_parse_from(["pvrisk", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.location().is_err());

        assert!(Cli::try_parse_from(["pvrisk", "run", "--lat", "10"]).is_err());
        assert!(Cli::try_parse_from(["pvrisk", "run", "--bom", "Cell"]).is_err());
    }
}
