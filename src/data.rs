//! Species Tables
//!
//! Typed, read-only views of the two store tables:
//! - `SpeciesTable`: per-species attributes (category, order, habitat flags)
//! - `GeoTable`: range polygons keyed by habitat and scientific name
//!
//! All loose typing in the source data (string or native booleans, padded
//! order codes, missing labels) is resolved here, once, when rows cross the
//! store boundary. Nothing downstream sees raw cells.

use crate::geometry::parse_wkt;
use crate::labels::{category_full_name, is_threatened_code, order_common_name};
use crate::utils::text::{non_blank, normalize_order_code, parse_flag};
use geo_types::Geometry;
use serde::Serialize;
use std::collections::BTreeSet;

// ============================================================================
// Raw rows (as read from the store)
// ============================================================================

/// One `species_data` row with every cell still in text/integer form
#[derive(Debug, Clone, Default)]
pub struct RawSpeciesRow {
    pub id_no: Option<i64>,
    pub category: Option<String>,
    pub order_: Option<String>,
    pub order_name: Option<String>,
    pub marine: Option<String>,
    pub terrestria: Option<String>,
    pub freshwater: Option<String>,
    pub presence: Option<i64>,
    pub category_full: Option<String>,
}

/// One `species_geo` row with the geometry still as WKT text
#[derive(Debug, Clone, Default)]
pub struct RawGeoRow {
    pub sci_name: Option<String>,
    pub habitat: Option<String>,
    pub category: Option<String>,
    pub geometry_wkt: Option<String>,
    pub photo_url: Option<String>,
}

// ============================================================================
// Species attributes
// ============================================================================

/// Marine / terrestrial / freshwater system flags of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct HabitatFlags {
    pub marine: bool,
    pub terrestrial: bool,
    pub freshwater: bool,
}

/// A parsed `species_data` row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpeciesRecord {
    pub id_no: Option<i64>,
    /// Short Red List code, trimmed
    pub category: Option<String>,
    /// Trimmed, title-cased order code ("Carnivora")
    pub order_code: Option<String>,
    /// Common name of the order
    pub order_name: Option<String>,
    pub marine: Option<bool>,
    pub terrestrial: Option<bool>,
    pub freshwater: Option<bool>,
    pub presence: Option<i64>,
    pub category_full: Option<String>,
}

impl SpeciesRecord {
    /// Parse a raw row. Never fails: malformed cells become `None`.
    ///
    /// Labels present in the table win; otherwise they are derived from
    /// the static label maps.
    pub fn from_raw(raw: RawSpeciesRow) -> Self {
        let category = non_blank(raw.category);
        let order_code = raw.order_.as_deref().and_then(normalize_order_code);

        let order_name = non_blank(raw.order_name).or_else(|| {
            order_code
                .as_deref()
                .and_then(order_common_name)
                .map(str::to_string)
        });

        let category_full = non_blank(raw.category_full).or_else(|| {
            category
                .as_deref()
                .and_then(category_full_name)
                .map(str::to_string)
        });

        SpeciesRecord {
            id_no: raw.id_no,
            category,
            order_code,
            order_name,
            marine: raw.marine.as_deref().and_then(parse_flag),
            terrestrial: raw.terrestria.as_deref().and_then(parse_flag),
            freshwater: raw.freshwater.as_deref().and_then(parse_flag),
            presence: raw.presence,
            category_full,
        }
    }

    /// CR, EN or VU
    pub fn is_threatened(&self) -> bool {
        self.category.as_deref().is_some_and(is_threatened_code)
    }

    /// Presence flag equals 1
    pub fn is_present(&self) -> bool {
        self.presence == Some(1)
    }

    /// All three habitat flags, or `None` if any is missing
    pub fn habitat_flags(&self) -> Option<HabitatFlags> {
        Some(HabitatFlags {
            marine: self.marine?,
            terrestrial: self.terrestrial?,
            freshwater: self.freshwater?,
        })
    }
}

/// The loaded `species_data` table
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    records: Vec<SpeciesRecord>,
}

impl SpeciesTable {
    pub fn new(records: Vec<SpeciesRecord>) -> Self {
        Self { records }
    }

    pub fn from_raw_rows(rows: Vec<RawSpeciesRow>) -> Self {
        Self::new(rows.into_iter().map(SpeciesRecord::from_raw).collect())
    }

    pub fn records(&self) -> &[SpeciesRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeciesRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct category codes present (the filter options)
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

// ============================================================================
// Range geometries
// ============================================================================

/// A parsed `species_geo` row. Every field except the photo is guaranteed.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecord {
    pub sci_name: String,
    pub habitat: String,
    pub category: String,
    pub geometry: Geometry<f64>,
    pub photo_url: Option<String>,
}

impl GeoRecord {
    /// Build a record, or `None` when a required field is missing.
    ///
    /// Names and habitats are trimmed; an unparseable geometry counts as
    /// missing.
    pub fn from_parts(
        sci_name: Option<String>,
        habitat: Option<String>,
        category: Option<String>,
        geometry: Option<Geometry<f64>>,
        photo_url: Option<String>,
    ) -> Option<Self> {
        Some(GeoRecord {
            sci_name: sci_name?.trim().to_string(),
            habitat: habitat?.trim().to_string(),
            category: category?,
            geometry: geometry?,
            photo_url: non_blank(photo_url),
        })
    }

    pub fn from_raw(raw: RawGeoRow) -> Option<Self> {
        let geometry = match raw.geometry_wkt.as_deref().map(parse_wkt) {
            Some(Ok(geometry)) => Some(geometry),
            Some(Err(e)) => {
                tracing::debug!("Unreadable range geometry for {:?}: {}", raw.sci_name, e);
                None
            }
            None => None,
        };

        Self::from_parts(raw.sci_name, raw.habitat, raw.category, geometry, raw.photo_url)
    }
}

/// The loaded `species_geo` table
#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    records: Vec<GeoRecord>,
    habitats: Vec<String>,
}

impl GeoTable {
    pub fn new(records: Vec<GeoRecord>) -> Self {
        let habitats = records
            .iter()
            .map(|r| r.habitat.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { records, habitats }
    }

    /// Parse raw rows, dropping any row missing sci_name, habitat,
    /// category or geometry.
    pub fn from_raw_rows(rows: Vec<RawGeoRow>) -> Self {
        let total = rows.len();
        let records: Vec<GeoRecord> = rows.into_iter().filter_map(GeoRecord::from_raw).collect();

        let dropped = total - records.len();
        if dropped > 0 {
            tracing::warn!("Dropped {} of {} range rows with missing fields", dropped, total);
        }

        Self::new(records)
    }

    pub fn records(&self) -> &[GeoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct habitats
    pub fn habitats(&self) -> &[String] {
        &self.habitats
    }

    /// Sorted distinct species names recorded for a habitat
    pub fn species_for_habitat(&self, habitat: &str) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.habitat == habitat)
            .map(|r| r.sci_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows matching both habitat and species exactly, in table order
    pub fn matching(&self, habitat: &str, sci_name: &str) -> Vec<GeoRecord> {
        self.records
            .iter()
            .filter(|r| r.habitat == habitat && r.sci_name == sci_name)
            .cloned()
            .collect()
    }

    /// First row for a species, in any habitat
    pub fn find_species(&self, sci_name: &str) -> Option<&GeoRecord> {
        self.records.iter().find(|r| r.sci_name == sci_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))";

    fn geo_row(sci_name: Option<&str>, habitat: Option<&str>) -> RawGeoRow {
        RawGeoRow {
            sci_name: sci_name.map(str::to_string),
            habitat: habitat.map(str::to_string),
            category: Some("EN".to_string()),
            geometry_wkt: Some(SQUARE.to_string()),
            photo_url: None,
        }
    }

    #[test]
    fn test_species_record_parses_flags_and_labels() {
        let record = SpeciesRecord::from_raw(RawSpeciesRow {
            id_no: Some(7),
            category: Some(" VU ".to_string()),
            order_: Some(" CARNIVORA".to_string()),
            marine: Some("TRUE".to_string()),
            terrestria: Some("false".to_string()),
            freshwater: Some("False".to_string()),
            presence: Some(1),
            ..Default::default()
        });

        assert_eq!(record.category.as_deref(), Some("VU"));
        assert_eq!(record.order_code.as_deref(), Some("Carnivora"));
        assert_eq!(record.order_name.as_deref(), Some("Carnivores (Cats, Dogs, Bears)"));
        assert_eq!(record.category_full.as_deref(), Some("Vulnerable"));
        assert!(record.is_threatened());
        assert!(record.is_present());
        assert_eq!(
            record.habitat_flags(),
            Some(HabitatFlags { marine: true, terrestrial: false, freshwater: false })
        );
    }

    #[test]
    fn test_table_labels_take_precedence() {
        let record = SpeciesRecord::from_raw(RawSpeciesRow {
            category: Some("LC".to_string()),
            order_: Some("rodentia".to_string()),
            order_name: Some("Rodents".to_string()),
            category_full: Some("Least Concern (2020)".to_string()),
            ..Default::default()
        });

        assert_eq!(record.order_name.as_deref(), Some("Rodents"));
        assert_eq!(record.category_full.as_deref(), Some("Least Concern (2020)"));
    }

    #[test]
    fn test_malformed_cells_become_none() {
        let record = SpeciesRecord::from_raw(RawSpeciesRow {
            id_no: Some(1),
            category: Some("ZZ".to_string()),
            order_: Some("  ".to_string()),
            marine: Some("yes".to_string()),
            terrestria: Some("true".to_string()),
            freshwater: None,
            ..Default::default()
        });

        assert_eq!(record.category.as_deref(), Some("ZZ"));
        assert_eq!(record.category_full, None);
        assert_eq!(record.order_code, None);
        assert_eq!(record.order_name, None);
        assert_eq!(record.habitat_flags(), None);
        assert!(!record.is_threatened());
    }

    #[test]
    fn test_categories_sorted_distinct() {
        let table = SpeciesTable::from_raw_rows(vec![
            RawSpeciesRow { category: Some("VU".into()), ..Default::default() },
            RawSpeciesRow { category: Some("CR".into()), ..Default::default() },
            RawSpeciesRow { category: None, ..Default::default() },
            RawSpeciesRow { category: Some("VU".into()), ..Default::default() },
        ]);
        assert_eq!(table.categories(), vec!["CR".to_string(), "VU".to_string()]);
    }

    #[test]
    fn test_geo_rows_missing_fields_are_dropped() {
        let mut no_geometry = geo_row(Some("Lynx lynx"), Some("Forest"));
        no_geometry.geometry_wkt = None;
        let mut bad_geometry = geo_row(Some("Lynx pardinus"), Some("Forest"));
        bad_geometry.geometry_wkt = Some("POLYGON((".to_string());
        let mut no_category = geo_row(Some("Felis silvestris"), Some("Forest"));
        no_category.category = None;

        let table = GeoTable::from_raw_rows(vec![
            geo_row(None, Some("Forest")),
            geo_row(Some("Panthera tigris"), None),
            no_geometry,
            bad_geometry,
            no_category,
            geo_row(Some(" Panthera tigris "), Some(" Forest")),
        ]);

        assert_eq!(table.len(), 1);
        let kept = &table.records()[0];
        assert_eq!(kept.sci_name, "Panthera tigris");
        assert_eq!(kept.habitat, "Forest");
    }

    #[test]
    fn test_species_options_sorted_per_habitat() {
        let table = GeoTable::from_raw_rows(vec![
            geo_row(Some("Ursus arctos"), Some("Forest")),
            geo_row(Some("Panthera tigris"), Some("Forest")),
            geo_row(Some("Panthera tigris"), Some("Forest")),
            geo_row(Some("Camelus ferus"), Some("Desert")),
        ]);

        assert_eq!(table.habitats(), &["Desert".to_string(), "Forest".to_string()]);
        assert_eq!(
            table.species_for_habitat("Forest"),
            vec!["Panthera tigris".to_string(), "Ursus arctos".to_string()]
        );
        assert_eq!(table.matching("Forest", "Panthera tigris").len(), 2);
        assert!(table.matching("Desert", "Panthera tigris").is_empty());
    }
}
