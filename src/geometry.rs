//! Range polygon encoding.
//!
//! Geometries live in the store as WKT text and travel to the map as
//! GeoJSON. Only Polygon and MultiPolygon ranges are accepted.

use crate::error::{Result, SpeciesError};
use geo::BoundingRect;
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use serde::Serialize;
use serde_json::{json, Value};
use std::str::FromStr;
use wkt::ToWkt;

/// Parse WKT text into a range geometry.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    let geometry: Geometry<f64> = wkt::Wkt::<f64>::from_str(text)
        .map_err(|e| SpeciesError::Geometry(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| SpeciesError::Geometry(format!("{:?}", e)))
        })?;
    ensure_areal(geometry)
}

/// Serialize a geometry to WKT for storage.
pub fn to_wkt(geometry: &Geometry<f64>) -> String {
    geometry.wkt_string()
}

fn ensure_areal(geometry: Geometry<f64>) -> Result<Geometry<f64>> {
    match geometry {
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Ok(geometry),
        _ => Err(SpeciesError::Geometry(
            "expected Polygon or MultiPolygon range".to_string(),
        )),
    }
}

// ============================================================================
// GeoJSON
// ============================================================================

/// Decode a GeoJSON geometry object (Polygon or MultiPolygon).
pub fn geometry_from_geojson(value: &Value) -> Result<Geometry<f64>> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SpeciesError::Geometry("geometry has no type".to_string()))?;
    let coordinates = value
        .get("coordinates")
        .ok_or_else(|| SpeciesError::Geometry("geometry has no coordinates".to_string()))?;

    match kind {
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(coordinates)?)),
        "MultiPolygon" => {
            let polygons = as_array(coordinates, "multipolygon")?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        other => Err(SpeciesError::Geometry(format!(
            "expected Polygon or MultiPolygon, got {}",
            other
        ))),
    }
}

/// Encode a range geometry as a GeoJSON geometry object.
pub fn geometry_to_geojson(geometry: &Geometry<f64>) -> Option<Value> {
    match geometry {
        Geometry::Polygon(polygon) => Some(json!({
            "type": "Polygon",
            "coordinates": polygon_coordinates(polygon),
        })),
        Geometry::MultiPolygon(multi) => Some(json!({
            "type": "MultiPolygon",
            "coordinates": multi.0.iter().map(polygon_coordinates).collect::<Vec<_>>(),
        })),
        _ => None,
    }
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| SpeciesError::Geometry(format!("{} is not an array", what)))
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let pair = as_array(value, "position")?;
    let x = pair.first().and_then(Value::as_f64);
    let y = pair.get(1).and_then(Value::as_f64);
    match (x, y) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(SpeciesError::Geometry("position needs two numbers".to_string())),
    }
}

fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let coords = as_array(value, "ring")?
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::from(coords))
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = as_array(value, "polygon")?
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>>>()?;
    if rings.is_empty() {
        return Err(SpeciesError::Geometry("polygon has no rings".to_string()));
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn ring_coordinates(ring: &LineString<f64>) -> Vec<[f64; 2]> {
    ring.coords().map(|c| [c.x, c.y]).collect()
}

fn polygon_coordinates(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_coordinates)
        .collect()
}

// ============================================================================
// Bounds
// ============================================================================

/// Axis-aligned bounding box in lon/lat degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BBox {
    pub fn from_geometry(geometry: &Geometry<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        Some(Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        })
    }

    /// Union of the bounds of all geometries; `None` when there are none.
    pub fn covering<'a, I>(geometries: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Geometry<f64>>,
    {
        geometries
            .into_iter()
            .filter_map(Self::from_geometry)
            .reduce(|a, b| a.union(&b))
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lng: self.min_lng.min(other.min_lng),
            max_lng: self.max_lng.max(other.max_lng),
        }
    }

    /// Midpoint as (lat, lng)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Leaflet-style corners: [[south, west], [north, east]]
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.min_lat, self.min_lng], [self.max_lat, self.max_lng]]
    }
}
