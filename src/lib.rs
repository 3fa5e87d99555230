//! SpeciesWatch
//!
//! Conservation dashboard for mammal species: range maps per habitat and
//! species, and Red List analytics by taxonomic order and habitat type.
//!
//! Layout:
//! - `labels`: Red List category and taxonomic order label maps
//! - `data`: typed species and range tables (all parsing happens here)
//! - `store`: DuckDB tables `species_data` and `species_geo`
//! - `repository`: loaded tables shared across requests, with refresh
//! - `analytics`: order, habitat and Red List aggregation
//! - `selection`: per-session habitat/species state machine
//! - `map`, `charts`: map layer, detail card and donut charts
//! - `preprocess`, `loader`: offline history enrichment and store loading
//! - `api_server`, `web`: axum dashboard (feature `api`)

pub mod utils;
pub mod error;
pub mod labels;
pub mod geometry;
pub mod data;
pub mod store;
pub mod repository;
pub mod analytics;
pub mod charts;
pub mod selection;
pub mod map;
pub mod preprocess;
pub mod loader;
pub mod config;

#[cfg(feature = "api")]
pub mod api_server;

#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use error::{Result, SpeciesError};
pub use labels::{Category, ALL_CATEGORIES};
pub use data::{GeoRecord, GeoTable, HabitatFlags, SpeciesRecord, SpeciesTable};
pub use store::SpeciesStore;
pub use repository::{SpeciesRepository, SpeciesTables};
pub use analytics::{aggregate, AnalyticsReport, CategorySelection};
pub use selection::{SelectionError, SelectionMachine, SelectionState};
pub use map::{DetailCard, MapView, PhotoSource};
pub use config::Config;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
