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
use std::fmt;

/// Well-known component slots of a PV module build.
///
/// The catalog itself is data driven and may carry extra slots; these are the
/// ones the degradation engine looks up by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentSlot {
    EncapsulantFront,
    EncapsulantRear,
    Backsheet,
    Cell,
    Glass,
    Interconnect,
}

impl ComponentSlot {
    /// Name of the slot as it appears in the `Component` column of the catalog
    pub fn catalog_name(&self) -> &'static str {
        match self {
            Self::EncapsulantFront => "Encapsulant-Front",
            Self::EncapsulantRear => "Encapsulant-Rear",
            Self::Backsheet => "Backsheet",
            Self::Cell => "Cell",
            Self::Glass => "Glass",
            Self::Interconnect => "Interconnect",
        }
    }
}

impl fmt::Display for ComponentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_name())
    }
}

/// One orderable material for one component slot.
///
/// Identity is `(component_name, material_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub component_name: String,
    pub material_type: String,
    pub supplier: String,
    pub region: String,
    #[serde(default)]
    pub certifications: Vec<String>,
}

impl MaterialRecord {
    /// True when this record has the given identity (case-insensitive)
    pub fn is(&self, component_name: &str, material_type: &str) -> bool {
        self.component_name.eq_ignore_ascii_case(component_name.trim())
            && self.material_type.eq_ignore_ascii_case(material_type.trim())
    }
}

/// The full bill-of-materials catalog, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BomCatalog {
    records: Vec<MaterialRecord>,
}

impl BomCatalog {
    pub fn new(records: Vec<MaterialRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MaterialRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct component slots in order of first appearance
    pub fn components(&self) -> Vec<&str> {
        let mut components: Vec<&str> = Vec::new();
        for record in &self.records {
            if !components
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&record.component_name))
            {
                components.push(&record.component_name);
            }
        }
        components
    }

    /// All material options for one component slot
    pub fn options_for<'a>(
        &'a self,
        component_name: &'a str,
    ) -> impl Iterator<Item = &'a MaterialRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.component_name.eq_ignore_ascii_case(component_name.trim()))
    }

    /// Look up a record by its identity
    pub fn find(&self, component_name: &str, material_type: &str) -> Option<&MaterialRecord> {
        self.records
            .iter()
            .find(|r| r.is(component_name, material_type))
    }

    /// A selection holding the first listed option of every component
    pub fn default_selection(&self) -> BomSelection {
        let mut selection = BomSelection::default();
        for component in self.components() {
            if let Some(record) = self.options_for(component).next() {
                selection.select(record.clone());
            }
        }
        selection
    }
}

/// Exactly one material per component slot, in insertion order.
///
/// Deserialization goes through [`BomSelection::select`] and rejects input
/// that names the same component twice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBomSelection")]
pub struct BomSelection {
    slots: Vec<MaterialRecord>,
}

#[derive(Deserialize)]
struct RawBomSelection {
    #[serde(default)]
    slots: Vec<MaterialRecord>,
}

impl TryFrom<RawBomSelection> for BomSelection {
    type Error = String;

    fn try_from(raw: RawBomSelection) -> Result<Self, Self::Error> {
        let mut selection = Self::default();
        for record in raw.slots {
            let component = record.component_name.clone();
            if selection.select(record).is_some() {
                return Err(format!(
                    "component '{component}' is selected more than once"
                ));
            }
        }
        Ok(selection)
    }
}

impl BomSelection {
    /// Put a material into its component slot.
    ///
    /// Returns the material previously held by that slot, if any. A replaced
    /// slot keeps its original position.
    pub fn select(&mut self, record: MaterialRecord) -> Option<MaterialRecord> {
        if let Some(existing) = self
            .slots
            .iter_mut()
            .find(|r| r.component_name.eq_ignore_ascii_case(&record.component_name))
        {
            return Some(std::mem::replace(existing, record));
        }
        self.slots.push(record);
        None
    }

    /// Material held by a component slot
    pub fn get(&self, component_name: &str) -> Option<&MaterialRecord> {
        self.slots
            .iter()
            .find(|r| r.component_name.eq_ignore_ascii_case(component_name.trim()))
    }

    /// Material held by a well-known slot
    pub fn slot(&self, slot: ComponentSlot) -> Option<&MaterialRecord> {
        self.get(slot.catalog_name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialRecord> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Catalog components that have no selection yet
    pub fn missing_components(&self, catalog: &BomCatalog) -> Vec<String> {
        catalog
            .components()
            .into_iter()
            .filter(|component| self.get(component).is_none())
            .map(ToOwned::to_owned)
            .collect()
    }
}

impl<'a> IntoIterator for &'a BomSelection {
    type Item = &'a MaterialRecord;
    type IntoIter = std::slice::Iter<'a, MaterialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(component: &str, material: &str) -> MaterialRecord {
        MaterialRecord {
            component_name: component.to_owned(),
            material_type: material.to_owned(),
            supplier: "Acme".to_owned(),
            region: "EU".to_owned(),
            certifications: vec!["IEC 61215".to_owned()],
        }
    }

    fn catalog() -> BomCatalog {
        BomCatalog::new(vec![
            record("Encapsulant-Front", "EVA"),
            record("Encapsulant-Front", "POE"),
            record("Cell", "PERC"),
            record("Backsheet", "PET"),
            record("Cell", "TOPCon"),
        ])
    }

    #[test]
    fn test_components_in_first_appearance_order() {
        assert_eq!(
            catalog().components(),
            vec!["Encapsulant-Front", "Cell", "Backsheet"]
        );
    }

    #[test]
    fn test_select_replaces_slot_in_place() {
        let mut selection = BomSelection::default();
        assert!(selection.select(record("Cell", "PERC")).is_none());
        assert!(selection.select(record("Backsheet", "PET")).is_none());

        let previous = selection.select(record("cell", "TOPCon"));
        assert_eq!(previous.map(|r| r.material_type), Some("PERC".to_owned()));
        assert_eq!(selection.len(), 2);

        let order: Vec<&str> = selection.iter().map(|r| r.material_type.as_str()).collect();
        assert_eq!(order, vec!["TOPCon", "PET"]);
    }

    #[test]
    fn test_missing_components() {
        let mut selection = BomSelection::default();
        selection.select(record("Cell", "PERC"));

        assert_eq!(
            selection.missing_components(&catalog()),
            vec!["Encapsulant-Front".to_owned(), "Backsheet".to_owned()]
        );
        assert!(
            catalog()
                .default_selection()
                .missing_components(&catalog())
                .is_empty()
        );
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let catalog = catalog();
        assert!(catalog.find("encapsulant-front", "poe").is_some());
        assert!(catalog.find("Cell", "HJT").is_none());
    }

    #[test]
    fn test_slot_lookup_by_role() {
        let selection = catalog().default_selection();
        assert_eq!(
            selection
                .slot(ComponentSlot::EncapsulantFront)
                .map(|r| r.material_type.as_str()),
            Some("EVA")
        );
    }

    #[test]
    fn test_deserialize_keeps_slot_order() {
        let json = r#"{"slots": [
            {"component_name": "Cell", "material_type": "PERC", "supplier": "A", "region": "EU"},
            {"component_name": "Backsheet", "material_type": "PET", "supplier": "B", "region": "EU"}
        ]}"#;
        let selection: BomSelection = serde_json::from_str(json).unwrap();

        assert_eq!(selection.len(), 2);
        assert_eq!(
            selection.get("backsheet").map(|r| r.material_type.as_str()),
            Some("PET")
        );
    }

    #[test]
    fn test_deserialize_rejects_repeated_component() {
        let json = r#"{"slots": [
            {"component_name": "Cell", "material_type": "PERC", "supplier": "A", "region": "EU"},
            {"component_name": "cell", "material_type": "HJT", "supplier": "B", "region": "EU"}
        ]}"#;
        let err = serde_json::from_str::<BomSelection>(json).unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");
    }
}
