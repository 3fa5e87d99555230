// Runtime configuration from environment variables

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "data/speciesdb.duckdb";
pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_SPECIES_DATA_FILE: &str = "data/species_dataMap_clean.parquet";
pub const DEFAULT_SPECIES_GEO_FILE: &str = "data/final_species.geojson";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SPECIESWATCH_DB
    pub db_path: String,
    /// PORT
    pub port: u16,
    /// PHOTO_DIR: base directory for relative photo paths
    pub photo_dir: Option<PathBuf>,
    /// SPECIES_DATA_FILE
    pub species_data_file: PathBuf,
    /// SPECIES_GEO_FILE
    pub species_geo_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            db_path: get("SPECIESWATCH_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            port: get("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            photo_dir: get("PHOTO_DIR").map(PathBuf::from),
            species_data_file: get("SPECIES_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SPECIES_DATA_FILE)),
            species_geo_file: get("SPECIES_GEO_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SPECIES_GEO_FILE)),
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  SPECIESWATCH_DB: {}", self.db_path);
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  PHOTO_DIR: {:?}", self.photo_dir);
    }
}
