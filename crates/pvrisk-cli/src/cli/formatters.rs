// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PVRisk.

//! Output formatters for simulation reports and catalog listings.

use anyhow::Result;
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use pvrisk_core::environment::Site;
use pvrisk_core::runner::EnvironmentOrigin;
use pvrisk_core::{DegradationEstimate, MonthlyEnergy, RiskAnalysis, SimulationReport};
use pvrisk_types::{BomCatalog, MaterialRecord, RiskReportRow, StressProfile};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

/// Formatter for pretty terminal tables
#[derive(Debug)]
pub struct TableFormatter;

/// Formatter for CSV export
#[derive(Debug)]
pub struct CsvFormatter;

/// Formatter for JSON export
#[derive(Debug)]
pub struct JsonFormatter;

/// One year of the projected trajectory, flattened for export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRow {
    pub year: u32,
    pub reliability_pct: f64,
    pub power_w: Option<f64>,
    pub loss_pct: f64,
}

/// Year-by-year rows for either model path.
///
/// The empirical path only has endpoints; its rows use the interpolated loss
/// and `100 - loss` as reliability.
pub fn series_rows(report: &SimulationReport, horizon_years: u32) -> Vec<SeriesRow> {
    if let Some(series) = report.degradation.series() {
        return series
            .iter()
            .map(|r| SeriesRow {
                year: r.year,
                reliability_pct: r.reliability_pct,
                power_w: r.power_w,
                loss_pct: r.loss_pct.unwrap_or(100.0 - r.reliability_pct),
            })
            .collect();
    }
    (1..)
        .zip(report.degradation.loss_trajectory(horizon_years))
        .map(|(year, loss_pct)| SeriesRow {
            year,
            reliability_pct: 100.0 - loss_pct,
            power_w: None,
            loss_pct,
        })
        .collect()
}

fn header(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

fn risk_cell(score: f64) -> Cell {
    let cell = Cell::new(format!("{score:.1}"));
    if score >= 7.0 {
        cell.fg(Color::Red).add_attribute(Attribute::Bold)
    } else if score >= 5.0 {
        cell.fg(Color::Yellow)
    } else {
        cell
    }
}

impl TableFormatter {
    /// Render a full simulation report
    pub fn format_report(report: &SimulationReport, show_series: bool, horizon_years: u32) -> String {
        let mut output = String::new();

        let origin = match &report.environment_origin {
            EnvironmentOrigin::Overrides => "manual overrides".to_owned(),
            EnvironmentOrigin::Provider(name) => format!("{name} provider"),
        };
        let env = &report.environment;
        let _ = writeln!(output, "Site: {} ({origin})", report.location);
        let _ = writeln!(
            output,
            "Climate: {:.1}°C | RH {} | {:.0} W/m² (UV index {:.1}){}",
            env.mean_temperature_c,
            env.mean_relative_humidity_pct
                .map_or_else(|| "n/a".to_owned(), |rh| format!("{rh:.0}%")),
            env.mean_irradiance_wm2,
            env.derived_uv_index(),
            env.damp_heat_hours
                .map_or_else(String::new, |h| format!(" | {h:.0} damp-heat h/yr")),
        );
        let _ = writeln!(
            output,
            "Stress profile: {} (score {:.1})\n",
            report.stress_profile, report.total_stress_score
        );

        output.push_str(&Self::format_bom(&report.bom));
        output.push('\n');
        output.push_str(&Self::format_metrics(report, horizon_years));
        output.push('\n');

        let diagnostics = &report.degradation.diagnostics;
        if !diagnostics.weibull_available {
            let missing: Vec<String> = diagnostics
                .missing_weibull
                .iter()
                .map(ToString::to_string)
                .collect();
            let _ = writeln!(
                output,
                "⚠ Weibull parameters not found for {}; empirical model used\n",
                missing.join(", ")
            );
        }

        match &report.risk {
            RiskAnalysis::NotApplicable => {
                output.push_str("Failure-risk analysis: not applicable (empty stress profile)\n");
            }
            RiskAnalysis::Analyzed(risk) if risk.no_risks_found() => {
                output.push_str("Failure-risk analysis: no identified risks\n");
            }
            RiskAnalysis::Analyzed(risk) => {
                output.push_str(&Self::format_risk_rows(&risk.rows));
                output.push('\n');

                let mut table = new_table();
                table.set_header(header(&["Component", "Material", "Matches", "Max", "Total"]));
                for summary in &risk.components {
                    table.add_row(vec![
                        Cell::new(&summary.component),
                        Cell::new(&summary.material),
                        Cell::new(summary.match_count),
                        summary
                            .max_risk_score
                            .map_or_else(|| Cell::new("-"), risk_cell),
                        Cell::new(format!("{:.1}", summary.total_risk_score)),
                    ]);
                }
                output.push_str(&table.to_string());
                output.push('\n');
            }
        }

        if let Some(financials) = &report.financials {
            output.push('\n');
            let mut table = new_table();
            table.set_header(header(&["Financials", "Value"]));
            table.add_row(vec![
                Cell::new("System cost"),
                Cell::new(format!("{:.2}", financials.system_cost)),
            ]);
            table.add_row(vec![
                Cell::new("Annual energy (kWh)"),
                Cell::new(format!("{:.1}", financials.annual_energy_kwh)),
            ]);
            table.add_row(vec![
                Cell::new("Annual savings"),
                Cell::new(format!("{:.2}", financials.annual_savings)),
            ]);
            table.add_row(vec![
                Cell::new("Payback (years)"),
                Cell::new(
                    financials
                        .payback_years
                        .map_or_else(|| "never".to_owned(), |p| format!("{p:.2}")),
                ),
            ]);
            table.add_row(vec![
                Cell::new(format!("Lifetime energy, {horizon_years} yr (kWh)")),
                Cell::new(format!("{:.0}", financials.lifetime_energy_kwh)),
            ]);
            table.add_row(vec![
                Cell::new("Lifetime savings"),
                Cell::new(format!("{:.2}", financials.lifetime_savings)),
            ]);
            output.push_str(&table.to_string());
            output.push('\n');

            if !financials.monthly_energy.is_empty() {
                let _ = writeln!(
                    output,
                    "\nMonthly energy (tilt {:.0}°, azimuth {:.0}°)",
                    report.orientation.tilt_deg, report.orientation.azimuth_deg
                );
                output.push_str(&Self::format_monthly(&financials.monthly_energy));
            }
        }

        if show_series {
            output.push('\n');
            let mut table = new_table();
            table.set_header(header(&["Year", "Reliability (%)", "Power (W)", "Loss (%)"]));
            for row in series_rows(report, horizon_years) {
                table.add_row(vec![
                    Cell::new(row.year),
                    Cell::new(format!("{:.2}", row.reliability_pct)),
                    Cell::new(row.power_w.map_or_else(|| "-".to_owned(), |p| format!("{p:.1}"))),
                    Cell::new(format!("{:.2}", row.loss_pct)),
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output
    }

    fn format_metrics(report: &SimulationReport, horizon_years: u32) -> String {
        let degradation = &report.degradation;
        let mut table = new_table();
        table.set_header(header(&["Metric", "Value"]));

        let model = match &degradation.estimate {
            DegradationEstimate::Empirical(summary) => {
                format!("Empirical (AF {:.2})", summary.acceleration_factor)
            }
            DegradationEstimate::Weibull(projection) => format!(
                "Weibull ({} η {:.1} yr, {} η {:.1} yr)",
                projection.front_encapsulant.material,
                projection.front_encapsulant.eta_effective_years,
                projection.cell.material,
                projection.cell.eta_effective_years
            ),
        };
        table.add_row(vec![Cell::new("Model"), Cell::new(model)]);
        table.add_row(vec![
            Cell::new("Year-1 loss (%)"),
            Cell::new(format!("{:.2}", degradation.year1_loss_pct())),
        ]);
        table.add_row(vec![
            Cell::new(format!("Year-{horizon_years} loss (%)")),
            Cell::new(format!("{:.2}", degradation.year25_loss_pct())),
        ]);

        let index = degradation.reliability_index();
        let color = if index >= 80.0 {
            Color::Green
        } else if index >= 50.0 {
            Color::Yellow
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new("Reliability index"),
            Cell::new(format!("{index:.1}"))
                .fg(color)
                .add_attribute(Attribute::Bold),
        ]);

        let mut output = table.to_string();
        output.push('\n');
        output
    }

    pub fn format_monthly(months: &[MonthlyEnergy]) -> String {
        let mut table = new_table();
        table.set_header(header(&["Month", "Insolation (kWh/m²)", "Energy (kWh)"]));
        for month in months {
            table.add_row(vec![
                Cell::new(month.month_name()),
                Cell::new(format!("{:.1}", month.plane_of_array_kwh_m2)),
                Cell::new(format!("{:.1}", month.energy_kwh)),
            ]);
        }
        table.add_row(vec![
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new(format!(
                "{:.1}",
                months.iter().map(|m| m.plane_of_array_kwh_m2).sum::<f64>()
            )),
            Cell::new(format!("{:.1}", months.iter().map(|m| m.energy_kwh).sum::<f64>()))
                .add_attribute(Attribute::Bold),
        ]);
        let mut output = table.to_string();
        output.push('\n');
        output
    }

    pub fn format_bom(records: &[MaterialRecord]) -> String {
        let mut table = new_table();
        table.set_header(header(&["Component", "Type", "Supplier", "Region", "Certifications"]));
        for record in records {
            table.add_row(vec![
                Cell::new(&record.component_name),
                Cell::new(&record.material_type),
                Cell::new(&record.supplier),
                Cell::new(&record.region),
                Cell::new(record.certifications.join(", ")),
            ]);
        }
        let mut output = table.to_string();
        output.push('\n');
        output
    }

    pub fn format_risk_rows(rows: &[RiskReportRow]) -> String {
        let mut table = new_table();
        table.set_header(header(&[
            "Component",
            "Material",
            "Stress",
            "Failure Mode",
            "Risk",
            "Field Insight",
        ]));
        for row in rows {
            table.add_row(vec![
                Cell::new(&row.component),
                Cell::new(&row.material),
                Cell::new(&row.stress),
                Cell::new(&row.failure_mode),
                risk_cell(row.risk_score),
                Cell::new(row.field_insight.as_deref().unwrap_or("")),
            ]);
        }
        let mut output = table.to_string();
        output.push('\n');
        output
    }

    pub fn format_catalog(catalog: &BomCatalog, component: Option<&str>) -> String {
        let records: Vec<MaterialRecord> = match component {
            Some(component) => catalog.options_for(component).cloned().collect(),
            None => catalog.records().to_vec(),
        };
        Self::format_bom(&records)
    }

    pub fn format_profiles(profiles: &[StressProfile]) -> String {
        let mut table = new_table();
        table.set_header(header(&["Profile", "Tests", "Total Score"]));
        for profile in profiles {
            let tests: Vec<String> = profile
                .tests()
                .iter()
                .map(|t| format!("{} ({:.1})", t.identifier, t.severity_weight))
                .collect();
            table.add_row(vec![
                Cell::new(&profile.name),
                Cell::new(if tests.is_empty() {
                    "-".to_owned()
                } else {
                    tests.join(", ")
                }),
                Cell::new(format!("{:.1}", profile.total_stress_score())),
            ]);
        }
        let mut output = table.to_string();
        output.push('\n');
        output
    }

    pub fn format_sites(sites: &[Site]) -> String {
        let mut table = new_table();
        table.set_header(header(&["Site", "Latitude", "Longitude"]));
        for site in sites {
            table.add_row(vec![
                Cell::new(&site.name),
                Cell::new(format!("{:.4}", site.latitude)),
                Cell::new(format!("{:.4}", site.longitude)),
            ]);
        }
        let mut output = table.to_string();
        output.push('\n');
        output
    }
}

#[derive(Serialize)]
struct CatalogCsvRow<'a> {
    #[serde(rename = "Component")]
    component: &'a str,
    #[serde(rename = "Type")]
    material_type: &'a str,
    #[serde(rename = "Supplier")]
    supplier: &'a str,
    #[serde(rename = "Region")]
    region: &'a str,
    #[serde(rename = "Certifications")]
    certifications: String,
}

#[derive(Serialize)]
struct MonthlyCsvRow {
    month: &'static str,
    plane_of_array_kwh_m2: f64,
    energy_kwh: f64,
}

#[derive(Serialize)]
struct ProfileCsvRow<'a> {
    profile: &'a str,
    test: &'a str,
    weight: f64,
}

impl CsvFormatter {
    /// Year-by-year trajectory
    pub fn write_series<W: Write>(writer: W, rows: &[SeriesRow]) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in rows {
            csv.serialize(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// First-year energy by calendar month
    pub fn write_monthly<W: Write>(writer: W, months: &[MonthlyEnergy]) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for month in months {
            csv.serialize(MonthlyCsvRow {
                month: month.month_name(),
                plane_of_array_kwh_m2: month.plane_of_array_kwh_m2,
                energy_kwh: month.energy_kwh,
            })?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Failure-risk rows with the risk matrix column names
    pub fn write_risk_rows<W: Write>(writer: W, rows: &[RiskReportRow]) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "Component",
            "Material",
            "Stress",
            "Failure Mode",
            "Risk Score",
            "Field Insight",
        ])?;
        for row in rows {
            csv.write_record([
                row.component.as_str(),
                row.material.as_str(),
                row.stress.as_str(),
                row.failure_mode.as_str(),
                &row.risk_score.to_string(),
                row.field_insight.as_deref().unwrap_or(""),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Catalog records in the on-disk catalog format
    pub fn write_catalog<W: Write>(writer: W, records: &[MaterialRecord]) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for record in records {
            csv.serialize(CatalogCsvRow {
                component: &record.component_name,
                material_type: &record.material_type,
                supplier: &record.supplier,
                region: &record.region,
                certifications: record.certifications.join(";"),
            })?;
        }
        csv.flush()?;
        Ok(())
    }

    /// One row per profile test
    pub fn write_profiles<W: Write>(writer: W, profiles: &[StressProfile]) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for profile in profiles {
            for test in profile.tests() {
                csv.serialize(ProfileCsvRow {
                    profile: &profile.name,
                    test: &test.identifier,
                    weight: test.severity_weight,
                })?;
            }
        }
        csv.flush()?;
        Ok(())
    }

    pub fn write_sites<W: Write>(writer: W, sites: &[Site]) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for site in sites {
            csv.serialize(site)?;
        }
        csv.flush()?;
        Ok(())
    }
}

impl JsonFormatter {
    pub fn format<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}
