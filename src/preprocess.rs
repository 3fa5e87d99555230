//! Historical status enrichment
//!
//! Adds three derived columns to a per-species, per-assessment-year table:
//!   - `category_full`: full Red List name for `category`
//!   - `category_change`: the species' previous assessment had a different `category_full`
//!   - `order_name`: common name for `order_`
//!
//! Rows come out sorted by (`id_no`, `yrcompiled`); nothing else changes.

use crate::labels::{category_full_name, order_common_name};
use crate::utils::{read_table, require_columns};
use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

pub const HISTORY_COLUMNS: [&str; 4] = ["id_no", "category", "order_", "yrcompiled"];

/// Flag rows whose full category label differs from the previous row of the
/// same species.
///
/// Input must already be sorted by species. The first row of each species is
/// never a change, nor is a row following one with no label; legacy codes
/// such as `LR/lc` have no label, so moving off them is not a change.
pub fn detect_category_changes(ids: &[Option<i64>], labels: &[Option<&str>]) -> Vec<bool> {
    ids.iter()
        .zip(labels)
        .enumerate()
        .map(|(i, (id, label))| {
            if i == 0 || id.is_none() || ids[i - 1] != *id {
                return false;
            }
            match labels[i - 1] {
                Some(previous) => Some(previous) != *label,
                None => false,
            }
        })
        .collect()
}

/// Sort and add the derived columns
pub fn enrich_history(df: DataFrame) -> Result<DataFrame> {
    require_columns(&df, &HISTORY_COLUMNS, "history")?;

    let mut df = df
        .lazy()
        .sort(
            ["id_no", "yrcompiled"],
            SortMultipleOptions::default()
                .with_maintain_order(true)
                .with_nulls_last(true),
        )
        .collect()
        .context("Failed to sort history by id_no, yrcompiled")?;

    let id_col = df.column("id_no")?.cast(&DataType::Int64)?;
    let ids: Vec<Option<i64>> = id_col.i64()?.into_iter().collect();

    let category_col = df.column("category")?.cast(&DataType::String)?;
    let categories: Vec<Option<&str>> = category_col.str()?.into_iter().collect();

    let order_col = df.column("order_")?.cast(&DataType::String)?;
    let order_names: Vec<Option<&str>> = order_col
        .str()?
        .into_iter()
        .map(|code| code.and_then(order_common_name))
        .collect();

    let category_full: Vec<Option<&str>> = categories
        .iter()
        .map(|code| code.and_then(category_full_name))
        .collect();
    let changes = detect_category_changes(&ids, &category_full);

    df.with_column(Series::new("category_full".into(), category_full))?;
    df.with_column(Series::new("category_change".into(), changes))?;
    df.with_column(Series::new("order_name".into(), order_names))?;

    Ok(df)
}

/// Write a frame as ZSTD-compressed parquet
pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .finish(df)
        .with_context(|| format!("Failed to write parquet: {}", path.display()))?;
    Ok(())
}

/// Read, enrich and write; returns the number of rows written
pub fn preprocess_file(input: &Path, output: &Path) -> Result<usize> {
    let df = read_table(input)?;
    tracing::info!("Read {} history rows from {}", df.height(), input.display());

    let mut enriched = enrich_history(df)?;
    write_parquet(&mut enriched, output)?;

    tracing::info!("Wrote {} enriched rows to {}", enriched.height(), output.display());
    Ok(enriched.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_detection_per_species() {
        let ids = [Some(1), Some(1), Some(1), Some(1)];
        let labels = [
            Some("Least Concern"),
            Some("Least Concern"),
            Some("Vulnerable"),
            Some("Vulnerable"),
        ];
        assert_eq!(detect_category_changes(&ids, &labels), vec![false, false, true, false]);
    }

    #[test]
    fn test_change_does_not_cross_species() {
        let ids = [Some(1), Some(2), Some(2), None];
        let labels = [
            Some("Least Concern"),
            Some("Endangered"),
            Some("Endangered"),
            Some("Critically Endangered"),
        ];
        assert_eq!(detect_category_changes(&ids, &labels), vec![false, false, false, false]);
    }

    #[test]
    fn test_missing_previous_category_is_not_a_change() {
        let ids = [Some(1), Some(1), Some(1)];
        let labels = [None, Some("Vulnerable"), None];
        assert_eq!(detect_category_changes(&ids, &labels), vec![false, false, true]);
    }

    #[test]
    fn test_legacy_codes_do_not_flag_changes() {
        let df = df![
            "id_no" => &[1i64, 1, 1],
            "yrcompiled" => &[1996i64, 2000, 2008],
            "category" => &["LR/lc", "LR/nt", "LC"],
            "order_" => &["RODENTIA", "RODENTIA", "RODENTIA"],
        ]
        .unwrap();

        let enriched = enrich_history(df).unwrap();
        let changes: Vec<Option<bool>> = enriched
            .column("category_change")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(changes, vec![Some(false), Some(false), Some(false)]);

        let full = enriched.column("category_full").unwrap().str().unwrap();
        assert_eq!(full.get(0), None);
        assert_eq!(full.get(2), Some("Least Concern"));
    }

    #[test]
    fn test_null_keys_sort_last() {
        let df = df![
            "id_no" => &[None, Some(2i64), Some(1)],
            "yrcompiled" => &[Some(2000i64), Some(2004), Some(2008)],
            "category" => &["EN", "VU", "LC"],
            "order_" => &["PRIMATES", "PRIMATES", "PRIMATES"],
        ]
        .unwrap();

        let enriched = enrich_history(df).unwrap();
        let ids: Vec<Option<i64>> = enriched.column("id_no").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some(1), Some(2), None]);
    }

    #[test]
    fn test_enrich_sorts_and_labels() {
        let df = df![
            "id_no" => &[2i64, 1, 1, 1, 1],
            "yrcompiled" => &[2008i64, 2012, 2000, 2008, 2004],
            "category" => &["CR", "VU", "LC", "VU", "LC"],
            "order_" => &["PRIMATES", "CARNIVORA", "CARNIVORA", "CARNIVORA", "CARNIVORA"],
            "extra" => &["e", "d", "a", "c", "b"],
        ]
        .unwrap();

        let enriched = enrich_history(df).unwrap();
        assert_eq!(enriched.height(), 5);

        let extra: Vec<Option<&str>> = enriched.column("extra").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(extra, vec![Some("a"), Some("b"), Some("c"), Some("d"), Some("e")]);

        let changes: Vec<Option<bool>> = enriched
            .column("category_change")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(changes, vec![Some(false), Some(false), Some(true), Some(false), Some(false)]);

        let full = enriched.column("category_full").unwrap().str().unwrap();
        assert_eq!(full.get(4), Some("Critically Endangered"));

        let orders = enriched.column("order_name").unwrap().str().unwrap();
        assert_eq!(orders.get(0), Some("Carnivores (Cats, Dogs, Bears)"));
        assert_eq!(orders.get(4), Some("Primates (Monkeys and Apes)"));
    }

    #[test]
    fn test_enrich_requires_year_column() {
        let df = df![
            "id_no" => &[1i64],
            "category" => &["LC"],
            "order_" => &["RODENTIA"],
        ]
        .unwrap();
        assert!(enrich_history(df).is_err());
    }
}
