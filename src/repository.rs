//! Species Repository
//!
//! Loads both store tables once and hands out shared, read-only snapshots.
//! `refresh` swaps the snapshot atomically; readers holding the old `Arc`
//! keep a consistent view until they drop it.

use crate::data::{GeoTable, SpeciesTable};
use crate::error::Result;
use crate::store::SpeciesStore;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// Both tables as of one load
#[derive(Debug, Default)]
pub struct SpeciesTables {
    pub species: SpeciesTable,
    pub geo: GeoTable,
}

impl SpeciesTables {
    pub fn load(store: &SpeciesStore) -> Result<Self> {
        let species = SpeciesTable::from_raw_rows(store.fetch_species_rows()?);
        let geo = GeoTable::from_raw_rows(store.fetch_geo_rows()?);
        Ok(Self { species, geo })
    }
}

pub struct SpeciesRepository {
    tables: RwLock<Arc<SpeciesTables>>,
}

impl SpeciesRepository {
    /// Load both tables from the store
    pub fn load(store: &SpeciesStore) -> Result<Self> {
        let start = Instant::now();
        let tables = SpeciesTables::load(store)?;
        tracing::info!(
            "Loaded {} species rows and {} range rows in {:?}",
            tables.species.len(),
            tables.geo.len(),
            start.elapsed()
        );
        Ok(Self::from_tables(tables))
    }

    pub fn from_tables(tables: SpeciesTables) -> Self {
        Self {
            tables: RwLock::new(Arc::new(tables)),
        }
    }

    /// Current tables
    pub fn snapshot(&self) -> Arc<SpeciesTables> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reload from the store. On failure the previous snapshot stays live.
    pub fn refresh(&self, store: &SpeciesStore) -> Result<Arc<SpeciesTables>> {
        let fresh = Arc::new(SpeciesTables::load(store)?);
        *self.tables.write().unwrap_or_else(PoisonError::into_inner) = fresh.clone();
        tracing::info!(
            "Refreshed repository: {} species rows, {} range rows",
            fresh.species.len(),
            fresh.geo.len()
        );
        Ok(fresh)
    }
}
