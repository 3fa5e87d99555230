//! Display rows for the two summary tables

use super::{AnalyticsReport, HabitatSummary, OrderSummary};
use crate::utils::{format_thousands, round_to};
use serde::Serialize;

pub const ORDER_TABLE_TITLE: &str = "Species and Threatened Species by Taxonomic Order";
pub const HABITAT_SECTION_TITLE: &str = "Habitat-Based Species Distribution Overview";
pub const HABITAT_TABLE_TITLE: &str = "Species Distribution by Habitat Type";
pub const RED_LIST_CHART_TITLE: &str = "Mammals Red List Categories";
pub const HABITAT_CHART_TITLE: &str = "Habitat Systems";
pub const EMPTY_SELECTION_PROMPT: &str = "Select filters from the sidebar to view detailed analysis.";

pub const ORDER_COLUMNS: [&str; 5] = [
    "Taxonomic Order",
    "Order Common Name",
    "Number of Species",
    "Number of Threatened Species",
    "Threat Ratio (%)",
];

pub const HABITAT_COLUMNS: [&str; 2] = ["Habitat Type", "Number of Species"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    pub order: String,
    pub common_name: String,
    pub species: String,
    pub threatened: String,
    pub threat_ratio_pct: f64,
}

impl From<&OrderSummary> for OrderRow {
    fn from(summary: &OrderSummary) -> Self {
        OrderRow {
            order: summary.order_code.clone(),
            common_name: summary.order_common_name.clone().unwrap_or_default(),
            species: format_thousands(summary.species_count),
            threatened: format_thousands(summary.threatened_count),
            threat_ratio_pct: round_to(summary.threat_ratio * 100.0, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitatRow {
    pub habitat_type: String,
    pub species: String,
}

impl From<&HabitatSummary> for HabitatRow {
    fn from(summary: &HabitatSummary) -> Self {
        HabitatRow {
            habitat_type: summary.habitat_type.clone(),
            species: format_thousands(summary.species_count),
        }
    }
}

pub fn order_rows(report: &AnalyticsReport) -> Vec<OrderRow> {
    report.orders.iter().map(OrderRow::from).collect()
}

pub fn habitat_rows(report: &AnalyticsReport) -> Vec<HabitatRow> {
    report.habitats.iter().map(HabitatRow::from).collect()
}
