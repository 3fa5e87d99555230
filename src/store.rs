//! DuckDB Store
//!
//! Holds the two source tables:
//! - `species_data`: species attributes, pushed wholesale from Parquet/CSV
//! - `species_geo`: range polygons, geometry stored as WKT text
//!
//! Readers cast every column to a predictable SQL type so that the typed
//! parsing in `data` does not depend on how a file was ingested (native
//! BOOLEAN flags and "true"/"false" text both arrive as VARCHAR).

use crate::data::{GeoRecord, RawGeoRow, RawSpeciesRow};
use crate::error::{Result, SpeciesError};
use crate::geometry::to_wkt;
use crate::utils::TableFormat;
use duckdb::{params, Connection};
use std::collections::HashSet;
use std::path::Path;

pub const SPECIES_DATA_TABLE: &str = "species_data";
pub const SPECIES_GEO_TABLE: &str = "species_geo";

/// Columns `species_data` must carry
pub const REQUIRED_SPECIES_COLUMNS: [&str; 7] = [
    "id_no",
    "category",
    "order_",
    "marine",
    "terrestria",
    "freshwater",
    "presence",
];

/// Columns `species_geo` must carry
pub const REQUIRED_GEO_COLUMNS: [&str; 4] = ["sci_name", "habitat", "category", "geometry"];

pub struct SpeciesStore {
    conn: Connection,
}

impl SpeciesStore {
    /// Open (or create) a database file
    pub fn open(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!("Opened store at {}", path);
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Run raw SQL (fixtures, maintenance)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?")?;
        let count: i64 = stmt.query_row(params![table], |row| row.get(0))?;
        Ok(count > 0)
    }

    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, params![], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn table_columns(&self, table: &str) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT column_name FROM information_schema.columns WHERE table_name = ?")?;
        let rows = stmt.query_map(params![table], |row| row.get::<_, String>(0))?;

        let mut columns = HashSet::new();
        for column in rows {
            columns.insert(column?);
        }
        Ok(columns)
    }

    fn require_columns(&self, table: &str, required: &[&str]) -> Result<HashSet<String>> {
        let columns = self.table_columns(table)?;
        for &name in required {
            if !columns.contains(name) {
                return Err(SpeciesError::MissingColumn {
                    context: table.to_string(),
                    column: name.to_string(),
                });
            }
        }
        Ok(columns)
    }

    // ========================================================================
    // Writes (loader only)
    // ========================================================================

    /// Replace `species_data` with the contents of a Parquet or CSV file
    pub fn replace_species_data_from_file(&self, path: &Path) -> Result<usize> {
        let escaped = path.to_string_lossy().replace('\'', "''");
        let source = match TableFormat::from_path(path) {
            Ok(TableFormat::Parquet) => format!("read_parquet('{}')", escaped),
            Ok(TableFormat::Csv) => format!("read_csv_auto('{}')", escaped),
            Err(_) => return Err(SpeciesError::UnsupportedFormat(path.display().to_string())),
        };

        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}",
            SPECIES_DATA_TABLE, source
        ))?;
        self.count_rows(SPECIES_DATA_TABLE)
    }

    /// Replace `species_geo` with the given range records
    pub fn replace_species_geo(&mut self, records: &[GeoRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "CREATE OR REPLACE TABLE {} (
                sci_name VARCHAR,
                habitat VARCHAR,
                category VARCHAR,
                geometry VARCHAR,
                photo_url VARCHAR
            )",
            SPECIES_GEO_TABLE
        ))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} VALUES (?, ?, ?, ?, ?)",
                SPECIES_GEO_TABLE
            ))?;
            for record in records {
                stmt.execute(params![
                    record.sci_name,
                    record.habitat,
                    record.category,
                    to_wkt(&record.geometry),
                    record.photo_url,
                ])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    // ========================================================================
    // Reads (dashboard)
    // ========================================================================

    pub fn fetch_species_rows(&self) -> Result<Vec<RawSpeciesRow>> {
        let columns = self.require_columns(SPECIES_DATA_TABLE, &REQUIRED_SPECIES_COLUMNS)?;
        let order_name = optional_text(&columns, &["order_name", "order_name_mapped"]);
        let category_full = optional_text(&columns, &["category_full"]);

        let sql = format!(
            "SELECT
                TRY_CAST(id_no AS BIGINT),
                CAST(category AS VARCHAR),
                CAST(order_ AS VARCHAR),
                {},
                CAST(marine AS VARCHAR),
                CAST(terrestria AS VARCHAR),
                CAST(freshwater AS VARCHAR),
                TRY_CAST(presence AS BIGINT),
                {}
            FROM {}",
            order_name, category_full, SPECIES_DATA_TABLE
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![], |row| {
            Ok(RawSpeciesRow {
                id_no: row.get(0)?,
                category: row.get(1)?,
                order_: row.get(2)?,
                order_name: row.get(3)?,
                marine: row.get(4)?,
                terrestria: row.get(5)?,
                freshwater: row.get(6)?,
                presence: row.get(7)?,
                category_full: row.get(8)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn fetch_geo_rows(&self) -> Result<Vec<RawGeoRow>> {
        let columns = self.require_columns(SPECIES_GEO_TABLE, &REQUIRED_GEO_COLUMNS)?;
        let photo_url = optional_text(&columns, &["photo_url"]);

        let sql = format!(
            "SELECT
                CAST(sci_name AS VARCHAR),
                CAST(habitat AS VARCHAR),
                CAST(category AS VARCHAR),
                CAST(geometry AS VARCHAR),
                {}
            FROM {}",
            photo_url, SPECIES_GEO_TABLE
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![], |row| {
            Ok(RawGeoRow {
                sci_name: row.get(0)?,
                habitat: row.get(1)?,
                category: row.get(2)?,
                geometry_wkt: row.get(3)?,
                photo_url: row.get(4)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

/// Select expression for the first present column among `candidates`,
/// or a typed NULL when none exists
fn optional_text(columns: &HashSet<String>, candidates: &[&str]) -> String {
    candidates
        .iter()
        .find(|name| columns.contains(**name))
        .map(|name| format!("CAST(\"{}\" AS VARCHAR)", name))
        .unwrap_or_else(|| "CAST(NULL AS VARCHAR)".to_string())
}
