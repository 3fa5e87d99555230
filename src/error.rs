//! Error types for the species tables and the store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpeciesError>;

/// Errors raised while reading, parsing or writing species tables.
#[derive(Error, Debug)]
pub enum SpeciesError {
    /// DuckDB failure (connection, SQL, row decoding).
    #[error("Store error: {0}")]
    Store(#[from] duckdb::Error),

    /// WKT or GeoJSON geometry that cannot be decoded.
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// A required column is absent from a table or file.
    #[error("{context}: missing expected column '{column}'")]
    MissingColumn { context: String, column: String },

    /// File extension the loaders do not understand.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
