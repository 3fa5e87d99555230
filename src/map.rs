//! Map and detail card presentation
//!
//! Turns a loaded subset into what the page's Leaflet map consumes: a
//! styled GeoJSON layer plus the view (centre, zoom limits, bounds). With
//! no rows the view falls back to a fixed centre and a placeholder marker.

use crate::data::GeoRecord;
use crate::geometry::{geometry_to_geojson, BBox};
use crate::labels::{category_color, Category, DEFAULT_CATEGORY_COLOR};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_ZOOM: u8 = 4;
pub const MIN_ZOOM: u8 = 4;
pub const MAX_ZOOM: u8 = 18;
pub const FALLBACK_CENTER: (f64, f64) = (45.0, -75.0);
pub const NO_DATA_MESSAGE: &str = "No data for selected filters";
pub const IMAGE_UNAVAILABLE: &str = "Image not available.";

const STROKE_WEIGHT: u8 = 2;
const FILL_OPACITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStyle {
    pub color: &'static str,
    #[serde(rename = "fillColor")]
    pub fill_color: &'static str,
    pub weight: u8,
    #[serde(rename = "fillOpacity")]
    pub fill_opacity: f64,
}

/// Style for a range polygon, coloured by conservation category
pub fn feature_style(category: &str) -> FeatureStyle {
    let color = category_color(category);
    FeatureStyle {
        color,
        fill_color: color,
        weight: STROKE_WEIGHT,
        fill_opacity: FILL_OPACITY,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub color: &'static str,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// (lat, lng)
    pub center: (f64, f64),
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// [[south, west], [north, east]]; also the max bounds
    pub bounds: Option<[[f64; 2]; 2]>,
    /// GeoJSON FeatureCollection
    pub layer: Value,
    pub placeholder: Option<Marker>,
}

impl MapView {
    pub fn fallback() -> Self {
        Self {
            center: FALLBACK_CENTER,
            zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            bounds: None,
            layer: feature_collection(Vec::new()),
            placeholder: Some(Marker {
                lat: FALLBACK_CENTER.0,
                lng: FALLBACK_CENTER.1,
                color: DEFAULT_CATEGORY_COLOR,
                popup: NO_DATA_MESSAGE.to_string(),
            }),
        }
    }

    pub fn for_records(records: &[GeoRecord]) -> Self {
        let Some(bbox) = BBox::covering(records.iter().map(|r| &r.geometry)) else {
            return Self::fallback();
        };

        let features = records.iter().filter_map(feature).collect();

        Self {
            center: bbox.center(),
            zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            bounds: Some(bbox.corners()),
            layer: feature_collection(features),
            placeholder: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.placeholder.is_some()
    }
}

fn feature(record: &GeoRecord) -> Option<Value> {
    let geometry = geometry_to_geojson(&record.geometry)?;
    Some(json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "sci_name": record.sci_name,
            "habitat": record.habitat,
            "category": record.category,
            "popup": record.sci_name,
            "style": feature_style(&record.category),
        },
    }))
}

fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

// ============================================================================
// Detail card
// ============================================================================

/// Where a species photo comes from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum PhotoSource {
    Remote(String),
    Local(PathBuf),
    Unavailable,
}

/// Classify a stored photo reference.
///
/// http(s) URLs are remote; anything else is a file path, resolved against
/// `photo_dir` when relative, and only usable if the file exists.
pub fn resolve_photo(photo_url: Option<&str>, photo_dir: Option<&Path>) -> PhotoSource {
    let Some(reference) = photo_url.map(str::trim).filter(|s| !s.is_empty()) else {
        return PhotoSource::Unavailable;
    };

    let lower = reference.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return PhotoSource::Remote(reference.to_string());
    }

    let path = Path::new(reference);
    let path = match photo_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    };

    if path.is_file() {
        PhotoSource::Local(path)
    } else {
        tracing::debug!("Photo not found at {}", path.display());
        PhotoSource::Unavailable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailCard {
    pub sci_name: String,
    pub category: String,
    /// Full status name when the category is recognised
    pub category_label: Option<&'static str>,
    pub photo: PhotoSource,
}

impl DetailCard {
    /// Card for the first row of a subset
    pub fn for_records(records: &[GeoRecord], photo_dir: Option<&Path>) -> Option<Self> {
        let first = records.first()?;
        let category = Category::from_code(&first.category)
            .or_else(|| Category::from_full_name(&first.category));

        Some(Self {
            sci_name: first.sci_name.clone(),
            category: category
                .map(|c| c.code().to_string())
                .unwrap_or_else(|| first.category.clone()),
            category_label: category.map(Category::full_name),
            photo: resolve_photo(first.photo_url.as_deref(), photo_dir),
        })
    }

    /// "Endangered (EN)", or the raw category when unrecognised
    pub fn status_line(&self) -> String {
        match self.category_label {
            Some(label) => format!("{} ({})", label, self.category),
            None => self.category.clone(),
        }
    }
}
