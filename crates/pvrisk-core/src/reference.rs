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

//! Reference data store: BOM catalog, failure-risk matrix and Weibull table.
//!
//! All three tables are loaded once per session and shared read-only. Column
//! headers are the on-disk format and must match exactly.

use pvrisk_types::{BomCatalog, BomSelection, FailureRiskRow, MaterialRecord, WeibullParameters};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::degradation::WeibullLookup;
use crate::error::{PvRiskError, Result};

pub const DEFAULT_BOM_FILE: &str = "bom_catalog.csv";
pub const DEFAULT_RISK_FILE: &str = "risk_matrix.csv";
pub const DEFAULT_WEIBULL_FILE: &str = "weibull_params.csv";

/// Source of the three reference tables
pub trait ReferenceStore {
    fn load_bom_catalog(&self) -> Result<BomCatalog>;
    fn load_risk_matrix(&self) -> Result<Vec<FailureRiskRow>>;
    fn load_weibull_table(&self) -> Result<WeibullTable>;
}

/// Weibull parameters keyed by lowercase material name
#[derive(Debug, Clone, Default)]
pub struct WeibullTable {
    by_material: HashMap<String, WeibullParameters>,
}

impl WeibullTable {
    /// Later rows replace earlier rows with the same material name
    pub fn new(rows: Vec<WeibullParameters>) -> Self {
        let by_material = rows
            .into_iter()
            .map(|p| (p.material_name.trim().to_lowercase(), p))
            .collect();
        Self { by_material }
    }

    pub fn len(&self) -> usize {
        self.by_material.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_material.is_empty()
    }
}

impl WeibullLookup for WeibullTable {
    fn weibull_for(&self, material_name: &str) -> Option<&WeibullParameters> {
        self.by_material.get(&material_name.trim().to_lowercase())
    }
}

#[derive(Debug, Deserialize)]
struct BomRow {
    #[serde(rename = "Component")]
    component: String,
    #[serde(rename = "Type")]
    material_type: String,
    #[serde(rename = "Supplier")]
    supplier: String,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Certifications", default)]
    certifications: Option<String>,
}

impl From<BomRow> for MaterialRecord {
    fn from(row: BomRow) -> Self {
        let certifications = row
            .certifications
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Self {
            component_name: row.component,
            material_type: row.material_type,
            supplier: row.supplier,
            region: row.region,
            certifications,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RiskRow {
    #[serde(rename = "Material")]
    material: String,
    #[serde(rename = "Stress")]
    stress: String,
    #[serde(rename = "Failure Mode")]
    failure_mode: String,
    #[serde(rename = "Risk Score")]
    risk_score: f64,
    #[serde(rename = "Field Insight", default)]
    field_insight: Option<String>,
}

impl From<RiskRow> for FailureRiskRow {
    fn from(row: RiskRow) -> Self {
        Self {
            material: row.material,
            stress: row.stress,
            failure_mode: row.failure_mode,
            risk_score: row.risk_score,
            field_insight: row.field_insight.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeibullRow {
    #[serde(rename = "Material")]
    material: String,
    #[serde(rename = "Base_Lifetime")]
    base_lifetime: f64,
    #[serde(rename = "Ea")]
    ea: f64,
    #[serde(rename = "Beta")]
    beta: f64,
}

impl From<WeibullRow> for WeibullParameters {
    fn from(row: WeibullRow) -> Self {
        Self {
            material_name: row.material,
            base_lifetime_years: row.base_lifetime,
            activation_energy_ev: row.ea,
            shape_beta: row.beta,
        }
    }
}

/// Reads the reference tables from CSV files in one directory
#[derive(Debug, Clone)]
pub struct CsvReferenceStore {
    bom_path: PathBuf,
    risk_path: PathBuf,
    weibull_path: PathBuf,
}

impl CsvReferenceStore {
    /// Store using the default file names inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_files(dir, DEFAULT_BOM_FILE, DEFAULT_RISK_FILE, DEFAULT_WEIBULL_FILE)
    }

    pub fn with_files(
        dir: impl AsRef<Path>,
        bom_file: &str,
        risk_file: &str,
        weibull_file: &str,
    ) -> Self {
        let dir = dir.as_ref();
        Self {
            bom_path: dir.join(bom_file),
            risk_path: dir.join(risk_file),
            weibull_path: dir.join(weibull_file),
        }
    }

    fn read<R, T>(path: &Path) -> Result<Vec<T>>
    where
        R: serde::de::DeserializeOwned,
        T: From<R>,
    {
        if !path.is_file() {
            return Err(PvRiskError::MissingReferenceData {
                resource: path.display().to_string(),
            });
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        let mut rows = Vec::new();
        for record in reader.deserialize::<R>() {
            rows.push(T::from(record?));
        }
        Ok(rows)
    }
}

impl ReferenceStore for CsvReferenceStore {
    fn load_bom_catalog(&self) -> Result<BomCatalog> {
        let records: Vec<MaterialRecord> = Self::read::<BomRow, _>(&self.bom_path)?;
        if records.is_empty() {
            return Err(PvRiskError::MissingReferenceData {
                resource: format!("{} (no rows)", self.bom_path.display()),
            });
        }
        Ok(BomCatalog::new(records))
    }

    fn load_risk_matrix(&self) -> Result<Vec<FailureRiskRow>> {
        let rows: Vec<FailureRiskRow> = Self::read::<RiskRow, _>(&self.risk_path)?;
        if rows.is_empty() {
            warn!("Risk matrix {} has no rows", self.risk_path.display());
        }
        Ok(rows)
    }

    fn load_weibull_table(&self) -> Result<WeibullTable> {
        let rows: Vec<WeibullParameters> = Self::read::<WeibullRow, _>(&self.weibull_path)?;
        Ok(WeibullTable::new(rows))
    }
}

/// All reference tables for one session
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub bom_catalog: BomCatalog,
    pub risk_matrix: Vec<FailureRiskRow>,
    pub weibull: WeibullTable,
}

impl ReferenceData {
    /// Load every table; any missing table aborts the load
    pub fn load(store: &dyn ReferenceStore) -> Result<Self> {
        let bom_catalog = store.load_bom_catalog()?;
        let risk_matrix = store.load_risk_matrix()?;
        let weibull = store.load_weibull_table()?;

        info!(
            "Loaded reference data: {} BOM records, {} risk rows, {} Weibull materials",
            bom_catalog.records().len(),
            risk_matrix.len(),
            weibull.len()
        );

        Ok(Self {
            bom_catalog,
            risk_matrix,
            weibull,
        })
    }

    /// Build a BOM from `(component, type)` choices.
    ///
    /// Components without a choice take the catalog's first option for that
    /// component when `fill_defaults` is set.
    pub fn resolve_bom(
        &self,
        choices: &[(String, String)],
        fill_defaults: bool,
    ) -> Result<BomSelection> {
        let mut bom = if fill_defaults {
            self.bom_catalog.default_selection()
        } else {
            BomSelection::default()
        };
        let mut chosen: Vec<&str> = Vec::new();

        for (component, material_type) in choices {
            if chosen.iter().any(|c| c.eq_ignore_ascii_case(component.trim())) {
                return Err(PvRiskError::DuplicateSelection {
                    component: component.clone(),
                });
            }
            let record = self.bom_catalog.find(component, material_type).ok_or_else(|| {
                PvRiskError::UnknownMaterial {
                    component: component.clone(),
                    material_type: material_type.clone(),
                }
            })?;
            chosen.push(component.trim());
            bom.select(record.clone());
        }

        self.ensure_complete(&bom)?;
        Ok(bom)
    }

    /// Every catalog component must have a selection
    pub fn ensure_complete(&self, bom: &BomSelection) -> Result<()> {
        let missing = bom.missing_components(&self.bom_catalog);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PvRiskError::IncompleteBom { missing })
        }
    }
}
