//! Columnar file helpers with column validation
//!
//! Offline tools accept either Parquet or CSV inputs; these helpers pick the
//! reader from the file extension and fail early, with context, when an
//! expected column is missing.

use polars::prelude::*;
use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;

/// Supported columnar input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Parquet,
    Csv,
}

impl TableFormat {
    /// Detect format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("parquet") => Ok(TableFormat::Parquet),
            Some("csv") => Ok(TableFormat::Csv),
            _ => bail!("Unsupported table format: {}", path.display()),
        }
    }
}

/// Open a Parquet or CSV file as a LazyFrame
pub fn scan_table(path: &Path) -> Result<LazyFrame> {
    match TableFormat::from_path(path)? {
        TableFormat::Parquet => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to scan parquet: {}", path.display())),
        TableFormat::Csv => {
            let df = CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(None)
                .try_into_reader_with_file_path(Some(path.to_path_buf()))
                .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
                .finish()
                .with_context(|| format!("Failed to load CSV: {}", path.display()))?;
            Ok(df.lazy())
        }
    }
}

/// Read a Parquet or CSV file into a DataFrame
pub fn read_table(path: &Path) -> Result<DataFrame> {
    scan_table(path)?
        .collect()
        .with_context(|| format!("Failed to read table: {}", path.display()))
}

/// Materialize exactly `columns` from a LazyFrame.
///
/// # Errors
/// Returns error if materialization fails or any column is absent.
pub fn materialize_with_columns(
    lazy: &LazyFrame,
    columns: &[&str],
    context: &str,
) -> Result<DataFrame> {
    let exprs: Vec<Expr> = columns.iter().map(|&name| col(name)).collect();

    let df = lazy
        .clone()
        .select(&exprs)
        .collect()
        .with_context(|| format!("{}: Failed to materialize columns {:?}", context, columns))?;

    require_columns(&df, columns, context)?;
    Ok(df)
}

/// Check that every column in `columns` exists in `df`.
pub fn require_columns(df: &DataFrame, columns: &[&str], context: &str) -> Result<()> {
    for &expected in columns {
        if df.column(expected).is_err() {
            return Err(anyhow!(
                "{}: Missing expected column '{}'. Available columns: {:?}",
                context,
                expected,
                df.get_column_names()
            ));
        }
    }
    Ok(())
}
