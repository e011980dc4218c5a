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

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use pvrisk_core::environment::SiteCatalog;
use pvrisk_core::{ReferenceData, SimulationRunner};
use pvrisk_types::SimulationRequest;
use std::fs::File;
use std::io;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use cli::{
    AppConfig, CatalogArgs, Cli, Commands, ConfigSource, CsvFormatter, JsonFormatter, ListArgs,
    OutputFormat, RunArgs, TableFormatter, series_rows,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, source) = AppConfig::load(cli.config.as_deref())?;

    // RUST_LOG wins over the configured level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.system.log_level)),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    match &source {
        ConfigSource::File(path) => info!("📋 Loaded configuration from {}", path.display()),
        ConfigSource::Defaults => {
            info!("📋 No configuration file found, using defaults with environment overrides");
        }
    }
    for warning in &config.validate_detailed().warnings {
        warn!("Config: {warning}");
    }

    match cli.command {
        Commands::Run(args) => run(&config, &args),
        Commands::Catalog(args) => catalog(&config, &args),
        Commands::Profiles(args) => profiles(&config, &args),
        Commands::Sites(args) => sites(&args),
    }
}

fn load_reference(config: &AppConfig) -> Result<ReferenceData> {
    ReferenceData::load(&config.reference_store()).with_context(|| {
        format!(
            "Failed to load reference data from {}",
            config.data.dir.display()
        )
    })
}

fn run(config: &AppConfig, args: &RunArgs) -> Result<()> {
    let reference = Arc::new(load_reference(config)?);
    let profiles = config.profile_catalog()?;
    let stress_profile = profiles
        .get(&args.profile)
        .with_context(|| {
            format!(
                "Available profiles: {}",
                profiles.names().collect::<Vec<_>>().join(", ")
            )
        })?
        .clone();
    let bom = reference.resolve_bom(&args.bom, true)?;

    let mut request = SimulationRequest::new(args.location()?, bom, stress_profile)
        .with_overrides(args.overrides())
        .with_orientation(args.orientation());
    if let Some(rated) = args.rated_power {
        request = request.with_rated_power(rated);
    }

    let runner = SimulationRunner::new(
        reference,
        config.environment_source()?,
        config.run_settings(),
    );
    let report = runner.run(&request).context("Simulation failed")?;
    let horizon = config.model.constants.horizon_years;

    match args.output {
        OutputFormat::Table => {
            print!(
                "{}",
                TableFormatter::format_report(&report, args.series, horizon)
            );
        }
        OutputFormat::Csv => {
            CsvFormatter::write_series(io::stdout().lock(), &series_rows(&report, horizon))?;
        }
        OutputFormat::Json => println!("{}", JsonFormatter::format(&report)?),
    }

    if let Some(path) = &args.risk_csv {
        let rows = report
            .risk
            .report()
            .map(|r| r.rows.as_slice())
            .unwrap_or_default();
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        CsvFormatter::write_risk_rows(file, rows)?;
        info!("💾 Wrote {} risk rows to {}", rows.len(), path.display());
    }

    if let Some(path) = &args.monthly_csv {
        let months = report
            .financials
            .as_ref()
            .map(|f| f.monthly_energy.as_slice())
            .unwrap_or_default();
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        CsvFormatter::write_monthly(file, months)?;
        info!("💾 Wrote {} monthly rows to {}", months.len(), path.display());
    }

    Ok(())
}

fn catalog(config: &AppConfig, args: &CatalogArgs) -> Result<()> {
    let reference = load_reference(config)?;
    let catalog = &reference.bom_catalog;

    match args.output {
        OutputFormat::Table => print!(
            "{}",
            TableFormatter::format_catalog(catalog, args.component.as_deref())
        ),
        OutputFormat::Csv => {
            let records: Vec<_> = match args.component.as_deref() {
                Some(component) => catalog.options_for(component).cloned().collect(),
                None => catalog.records().to_vec(),
            };
            CsvFormatter::write_catalog(io::stdout().lock(), &records)?;
        }
        OutputFormat::Json => println!("{}", JsonFormatter::format(catalog.records())?),
    }
    Ok(())
}

fn profiles(config: &AppConfig, args: &ListArgs) -> Result<()> {
    let catalog = config.profile_catalog()?;
    match args.output {
        OutputFormat::Table => print!("{}", TableFormatter::format_profiles(catalog.profiles())),
        OutputFormat::Csv => CsvFormatter::write_profiles(io::stdout().lock(), catalog.profiles())?,
        OutputFormat::Json => println!("{}", JsonFormatter::format(catalog.profiles())?),
    }
    Ok(())
}

fn sites(args: &ListArgs) -> Result<()> {
    let sites = SiteCatalog::default();
    match args.output {
        OutputFormat::Table => print!("{}", TableFormatter::format_sites(sites.sites())),
        OutputFormat::Csv => CsvFormatter::write_sites(io::stdout().lock(), sites.sites())?,
        OutputFormat::Json => println!("{}", JsonFormatter::format(sites.sites())?),
    }
    Ok(())
}
