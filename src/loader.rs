//! Store loader
//!
//! Pushes the prepared species table and the range GeoJSON into the store.
//! The two pushes are independent: each opens its own connection, and a
//! failure in one is logged without stopping the other.

use crate::data::GeoRecord;
use crate::geometry::geometry_from_geojson;
use crate::store::{SpeciesStore, REQUIRED_SPECIES_COLUMNS};
use crate::utils::{materialize_with_columns, scan_table};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

impl Feature {
    fn text(&self, key: &str) -> Option<String> {
        self.properties
            .as_ref()?
            .get(key)?
            .as_str()
            .map(str::to_string)
    }

    fn into_record(self) -> Option<GeoRecord> {
        let geometry = match self.geometry.as_ref().filter(|g| !g.is_null()) {
            Some(value) => match geometry_from_geojson(value) {
                Ok(geometry) => Some(geometry),
                Err(e) => {
                    tracing::debug!("Skipping feature geometry: {}", e);
                    None
                }
            },
            None => None,
        };

        GeoRecord::from_parts(
            self.text("sci_name"),
            self.text("habitat"),
            self.text("category"),
            geometry,
            self.text("photo_url"),
        )
    }
}

/// Parse a GeoJSON FeatureCollection of species ranges.
///
/// Features missing sci_name, habitat, category or a polygon geometry are
/// dropped; names and habitats are trimmed.
pub fn read_range_features(path: &Path) -> Result<Vec<GeoRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let collection: FeatureCollection = serde_json::from_str(&text)
        .with_context(|| format!("Not a GeoJSON FeatureCollection: {}", path.display()))?;

    let total = collection.features.len();
    let records: Vec<GeoRecord> = collection
        .features
        .into_iter()
        .filter_map(Feature::into_record)
        .collect();

    if records.len() < total {
        tracing::warn!(
            "Dropped {} of {} features with missing fields",
            total - records.len(),
            total
        );
    }
    Ok(records)
}

/// Check the species file carries every required column; returns its row count
pub fn validate_species_file(path: &Path) -> Result<usize> {
    let lazy = scan_table(path)?;
    let df = materialize_with_columns(&lazy, &REQUIRED_SPECIES_COLUMNS, "species_data")?;
    Ok(df.height())
}

/// Replace `species_data` with the given file
pub fn push_species_data<F>(connect: F, path: &Path) -> Result<usize>
where
    F: FnOnce() -> crate::Result<SpeciesStore>,
{
    let rows = validate_species_file(path)?;
    tracing::debug!("Validated {} species rows in {}", rows, path.display());

    let store = connect().context("Failed to connect to store")?;
    let pushed = store
        .replace_species_data_from_file(path)
        .with_context(|| format!("Failed to push {}", path.display()))?;

    tracing::info!("Pushed {} rows to 'species_data'", pushed);
    Ok(pushed)
}

/// Replace `species_geo` with the ranges in a GeoJSON file
pub fn push_species_geo<F>(connect: F, path: &Path) -> Result<usize>
where
    F: FnOnce() -> crate::Result<SpeciesStore>,
{
    let records = read_range_features(path)?;

    let mut store = connect().context("Failed to connect to store")?;
    let pushed = store
        .replace_species_geo(&records)
        .with_context(|| format!("Failed to push {}", path.display()))?;

    tracing::info!("Pushed {} rows to 'species_geo'", pushed);
    Ok(pushed)
}

/// Outcome of both pushes
#[derive(Debug, Default)]
pub struct PushReport {
    pub species_rows: Option<usize>,
    pub geo_rows: Option<usize>,
}

impl PushReport {
    pub fn is_success(&self) -> bool {
        self.species_rows.is_some() && self.geo_rows.is_some()
    }
}

/// Run both pushes, each with a fresh connection from `connect`
pub fn push_all<F>(connect: F, species_file: &Path, geo_file: &Path) -> PushReport
where
    F: Fn() -> crate::Result<SpeciesStore>,
{
    let species_rows = match push_species_data(&connect, species_file) {
        Ok(rows) => Some(rows),
        Err(e) => {
            tracing::error!("Error pushing species data: {:#}", e);
            None
        }
    };

    let geo_rows = match push_species_geo(&connect, geo_file) {
        Ok(rows) => Some(rows),
        Err(e) => {
            tracing::error!("Error pushing range data: {:#}", e);
            None
        }
    };

    PushReport {
        species_rows,
        geo_rows,
    }
}
