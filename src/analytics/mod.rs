//! CONSERVATION ANALYTICS
//!
//! Aggregates the species table, filtered to a set of Red List categories,
//! into three views:
//!   1. Order summary: species and threatened species per taxonomic order
//!   2. Habitat summary: present species per marine/terrestrial/freshwater
//!      combination
//!   3. Red List breakdown: present rows per full category label
//!
//! **Counting rules**:
//!   - Species counts are distinct `id_no`; a null id counts for nothing
//!   - Order codes are grouped after trim + title case (done at parse time)
//!   - Habitat and Red List views only consider `presence == 1`
//!
//! Everything here is a pure function of the table and the selection.

pub mod format;

use crate::data::{HabitatFlags, SpeciesRecord, SpeciesTable};
use rustc_hash::FxHashSet;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};

pub const UNKNOWN_HABITAT: &str = "Unknown";

// ============================================================================
// Selection
// ============================================================================

/// Categories picked in the sidebar multiselect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection(BTreeSet<String>);

impl CategorySelection {
    /// Build from raw codes; blanks are ignored, codes are trimmed
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            codes
                .into_iter()
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Stable key for response caching ("CR,EN")
    pub fn cache_key(&self) -> String {
        self.0.iter().cloned().collect::<Vec<_>>().join(",")
    }

    fn admits(&self, record: &SpeciesRecord) -> bool {
        record.category.as_deref().is_some_and(|c| self.contains(c))
    }
}

// ============================================================================
// Report types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub order_code: String,
    pub order_common_name: Option<String>,
    pub species_count: usize,
    pub threatened_count: usize,
    pub threat_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitatSummary {
    pub flags: HabitatFlags,
    pub habitat_type: String,
    pub species_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsReport {
    /// Sorted by threat ratio, highest first
    pub orders: Vec<OrderSummary>,
    /// Ordered by the flag triple
    pub habitats: Vec<HabitatSummary>,
    /// Ordered by label
    pub red_list: Vec<CategorySlice>,
}

impl AnalyticsReport {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.habitats.is_empty() && self.red_list.is_empty()
    }

    /// Habitat pie data: "Unknown" dropped, largest first
    pub fn habitat_chart(&self) -> Vec<CategorySlice> {
        let mut slices: Vec<CategorySlice> = self
            .habitats
            .iter()
            .filter(|h| h.habitat_type != UNKNOWN_HABITAT)
            .map(|h| CategorySlice {
                label: h.habitat_type.clone(),
                count: h.species_count,
            })
            .collect();
        slices.sort_by(|a, b| b.count.cmp(&a.count));
        slices
    }
}

impl HabitatFlags {
    /// "Marine", "Marine & Terrestrial", ... or "Unknown" when no flag is set
    pub fn label(&self) -> String {
        let mut parts: SmallVec<[&str; 3]> = SmallVec::new();
        if self.marine {
            parts.push("Marine");
        }
        if self.terrestrial {
            parts.push("Terrestrial");
        }
        if self.freshwater {
            parts.push("Freshwater");
        }

        if parts.is_empty() {
            UNKNOWN_HABITAT.to_string()
        } else {
            parts.join(" & ")
        }
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Share of threatened species; 0 for an empty group
pub fn threat_ratio(threatened: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        threatened as f64 / total as f64
    }
}

/// Build all three views for the selected categories.
///
/// An empty selection yields an empty report.
pub fn aggregate(table: &SpeciesTable, selection: &CategorySelection) -> AnalyticsReport {
    if selection.is_empty() {
        return AnalyticsReport::default();
    }

    let filtered: Vec<&SpeciesRecord> = table.iter().filter(|r| selection.admits(r)).collect();

    tracing::debug!(
        "Aggregating {} of {} rows for categories [{}]",
        filtered.len(),
        table.len(),
        selection.cache_key()
    );

    AnalyticsReport {
        orders: summarize_orders(&filtered),
        habitats: summarize_habitats(&filtered),
        red_list: summarize_red_list(&filtered),
    }
}

#[derive(Default)]
struct OrderGroup {
    name: Option<String>,
    species: FxHashSet<i64>,
    threatened: FxHashSet<i64>,
}

/// Per-order distinct counts, sorted by threat ratio descending
pub fn summarize_orders(records: &[&SpeciesRecord]) -> Vec<OrderSummary> {
    let mut groups: BTreeMap<&str, OrderGroup> = BTreeMap::new();

    for record in records {
        let Some(code) = record.order_code.as_deref() else {
            continue;
        };
        let group = groups.entry(code).or_default();

        if group.name.is_none() {
            group.name = record.order_name.clone();
        }
        if let Some(id) = record.id_no {
            group.species.insert(id);
            if record.is_threatened() {
                group.threatened.insert(id);
            }
        }
    }

    let mut summaries: Vec<OrderSummary> = groups
        .into_iter()
        .map(|(code, group)| {
            let species_count = group.species.len();
            let threatened_count = group.threatened.len();
            OrderSummary {
                order_code: code.to_string(),
                order_common_name: group.name,
                species_count,
                threatened_count,
                threat_ratio: threat_ratio(threatened_count, species_count),
            }
        })
        .collect();

    // Stable: equal ratios keep ascending code order
    summaries.sort_by(|a, b| b.threat_ratio.total_cmp(&a.threat_ratio));
    summaries
}

/// Present species per habitat flag triple; rows with a missing flag are skipped
pub fn summarize_habitats(records: &[&SpeciesRecord]) -> Vec<HabitatSummary> {
    let mut groups: BTreeMap<HabitatFlags, FxHashSet<i64>> = BTreeMap::new();

    for record in records.iter().filter(|r| r.is_present()) {
        let Some(flags) = record.habitat_flags() else {
            continue;
        };
        let ids = groups.entry(flags).or_default();
        if let Some(id) = record.id_no {
            ids.insert(id);
        }
    }

    groups
        .into_iter()
        .map(|(flags, ids)| HabitatSummary {
            flags,
            habitat_type: flags.label(),
            species_count: ids.len(),
        })
        .collect()
}

/// Present rows per full category label
pub fn summarize_red_list(records: &[&SpeciesRecord]) -> Vec<CategorySlice> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for record in records.iter().filter(|r| r.is_present()) {
        if let Some(label) = record.category_full.as_deref() {
            *counts.entry(label).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|(label, count)| CategorySlice {
            label: label.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawSpeciesRow;
    use approx::assert_relative_eq;

    fn row(id: i64, category: &str, order: &str, flags: (&str, &str, &str), presence: i64) -> RawSpeciesRow {
        RawSpeciesRow {
            id_no: Some(id),
            category: Some(category.to_string()),
            order_: Some(order.to_string()),
            marine: Some(flags.0.to_string()),
            terrestria: Some(flags.1.to_string()),
            freshwater: Some(flags.2.to_string()),
            presence: Some(presence),
            ..Default::default()
        }
    }

    const LAND: (&str, &str, &str) = ("false", "true", "false");

    fn all_categories() -> CategorySelection {
        CategorySelection::new(["CR", "EN", "EX", "LC", "VU", "NT", "DD", "EW"])
    }

    #[test]
    fn test_order_codes_merge_across_case_and_whitespace() {
        let table = SpeciesTable::from_raw_rows(vec![
            row(1, "CR", " carnivora", LAND, 1),
            row(2, "LC", "CARNIVORA ", LAND, 1),
        ]);

        let report = aggregate(&table, &all_categories());
        assert_eq!(report.orders.len(), 1);
        let carnivora = &report.orders[0];
        assert_eq!(carnivora.order_code, "Carnivora");
        assert_eq!(carnivora.species_count, 2);
        assert_eq!(carnivora.threatened_count, 1);
        assert_relative_eq!(carnivora.threat_ratio, 0.5);
    }

    #[test]
    fn test_duplicate_ids_count_once() {
        let table = SpeciesTable::from_raw_rows(vec![
            row(9, "EN", "Primates", LAND, 1),
            row(9, "EN", "Primates", LAND, 1),
            row(9, "EN", "Primates", ("true", "true", "false"), 0),
        ]);

        let report = aggregate(&table, &all_categories());
        assert_eq!(report.orders[0].species_count, 1);
        assert_eq!(report.orders[0].threatened_count, 1);
        assert_eq!(report.habitats.len(), 1);
        assert_eq!(report.habitats[0].species_count, 1);
        assert_eq!(report.red_list, vec![CategorySlice { label: "Endangered".into(), count: 2 }]);
    }

    #[test]
    fn test_empty_selection_gives_empty_report() {
        let table = SpeciesTable::from_raw_rows(vec![row(1, "CR", "Carnivora", LAND, 1)]);
        let report = aggregate(&table, &CategorySelection::new(Vec::<String>::new()));
        assert!(report.is_empty());
        assert!(report.orders.is_empty());
        assert!(report.habitats.is_empty());
    }

    #[test]
    fn test_selection_filters_rows() {
        let table = SpeciesTable::from_raw_rows(vec![
            row(1, "CR", "Carnivora", LAND, 1),
            row(2, "LC", "Rodentia", LAND, 1),
        ]);
        let report = aggregate(&table, &CategorySelection::new(["LC"]));
        assert_eq!(report.orders.len(), 1);
        assert_eq!(report.orders[0].order_code, "Rodentia");
        assert_eq!(report.orders[0].threatened_count, 0);
    }

    #[test]
    fn test_zero_size_group_has_zero_ratio() {
        assert_eq!(threat_ratio(0, 0), 0.0);

        let mut nameless = row(0, "CR", "Chiroptera", LAND, 1);
        nameless.id_no = None;
        let table = SpeciesTable::from_raw_rows(vec![nameless]);

        let report = aggregate(&table, &all_categories());
        assert_eq!(report.orders[0].species_count, 0);
        assert_eq!(report.orders[0].threat_ratio, 0.0);
    }

    #[test]
    fn test_orders_sorted_by_ratio_then_code() {
        let table = SpeciesTable::from_raw_rows(vec![
            row(1, "LC", "Rodentia", LAND, 1),
            row(2, "CR", "Primates", LAND, 1),
            row(3, "LC", "Chiroptera", LAND, 1),
            row(4, "VU", "Carnivora", LAND, 1),
            row(5, "LC", "Carnivora", LAND, 1),
        ]);

        let codes: Vec<String> = aggregate(&table, &all_categories())
            .orders
            .into_iter()
            .map(|o| o.order_code)
            .collect();
        assert_eq!(codes, vec!["Primates", "Carnivora", "Chiroptera", "Rodentia"]);
    }

    #[test]
    fn test_counts_and_ratio_bounds() {
        let table = SpeciesTable::from_raw_rows(vec![
            row(1, "CR", "Carnivora", LAND, 1),
            row(2, "EN", "Carnivora", LAND, 1),
            row(3, "NT", "Carnivora", LAND, 1),
            row(4, "DD", "Rodentia", LAND, 1),
        ]);

        for order in aggregate(&table, &all_categories()).orders {
            assert!(order.species_count >= order.threatened_count);
            assert!((0.0..=1.0).contains(&order.threat_ratio));
        }
    }

    #[test]
    fn test_habitat_labels() {
        let flags = |m, t, f| HabitatFlags { marine: m, terrestrial: t, freshwater: f };
        assert_eq!(flags(true, false, false).label(), "Marine");
        assert_eq!(flags(true, true, false).label(), "Marine & Terrestrial");
        assert_eq!(flags(false, true, true).label(), "Terrestrial & Freshwater");
        assert_eq!(flags(true, true, true).label(), "Marine & Terrestrial & Freshwater");
        assert_eq!(flags(false, false, false).label(), "Unknown");
    }

    #[test]
    fn test_habitat_summary_skips_absent_and_null_flags() {
        let mut null_flag = row(4, "LC", "Cetacea", ("true", "false", "false"), 1);
        null_flag.freshwater = None;

        let table = SpeciesTable::from_raw_rows(vec![
            row(1, "LC", "Cetacea", ("true", "false", "false"), 1),
            row(2, "LC", "Rodentia", LAND, 1),
            row(3, "LC", "Rodentia", LAND, 1),
            row(5, "LC", "Rodentia", LAND, 0),
            row(6, "LC", "Rodentia", ("false", "false", "false"), 1),
            null_flag,
        ]);

        let report = aggregate(&table, &all_categories());
        let table_view: Vec<(&str, usize)> = report
            .habitats
            .iter()
            .map(|h| (h.habitat_type.as_str(), h.species_count))
            .collect();
        assert_eq!(table_view, vec![("Unknown", 1), ("Terrestrial", 2), ("Marine", 1)]);

        let chart: Vec<String> = report.habitat_chart().into_iter().map(|s| s.label).collect();
        assert_eq!(chart, vec!["Terrestrial", "Marine"]);
    }

    #[test]
    fn test_first_non_null_order_name_wins() {
        let mut named = row(2, "LC", "Rodentia", LAND, 1);
        named.order_name = Some("Rodents".to_string());
        let mut renamed = row(3, "LC", "Rodentia", LAND, 1);
        renamed.order_name = Some("Gnawers".to_string());

        let table = SpeciesTable::from_raw_rows(vec![named, renamed]);
        let report = aggregate(&table, &all_categories());
        assert_eq!(report.orders[0].order_common_name.as_deref(), Some("Rodents"));
    }

    #[test]
    fn test_cache_key_is_order_independent() {
        assert_eq!(
            CategorySelection::new(["EN", " CR", ""]).cache_key(),
            CategorySelection::new(["CR", "EN"]).cache_key()
        );
    }
}
