// Dashboard view model
//
// One request = one pass: apply the form to the session's selection
// machine, then render map, detail card and analytics from the current
// repository snapshot.

use crate::analytics::format::{
    habitat_rows, order_rows, HabitatRow, OrderRow, EMPTY_SELECTION_PROMPT, HABITAT_CHART_TITLE,
    RED_LIST_CHART_TITLE,
};
use crate::analytics::{aggregate, CategorySelection};
use crate::charts::DonutChart;
use crate::data::GeoRecord;
use crate::labels::ALL_CATEGORIES;
use crate::map::{DetailCard, MapView, PhotoSource};
use crate::repository::SpeciesTables;
use crate::selection::SelectionMachine;
use crate::web::query::DashboardQuery;
use serde::Serialize;
use std::path::Path;

/// Sidebar category option
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOption {
    pub code: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub code: &'static str,
    pub label: &'static str,
}

/// Detail card ready for display
#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub sci_name: String,
    pub status: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsView {
    pub order_rows: Vec<OrderRow>,
    pub habitat_rows: Vec<HabitatRow>,
    pub red_list_chart: DonutChart,
    pub habitat_chart: DonutChart,
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub habitats: Vec<String>,
    pub selected_habitat: String,
    pub species_options: Vec<String>,
    pub selected_species: String,
    pub hint: Option<&'static str>,
    pub error: Option<String>,
    pub warning: Option<&'static str>,
    pub map: MapView,
    pub detail: Option<DetailView>,
    pub categories: Vec<CategoryOption>,
    pub legend: Vec<LegendEntry>,
    pub analytics: Option<AnalyticsView>,
    pub analytics_prompt: Option<&'static str>,
}

/// Link the page uses for a card's photo
pub fn photo_link(card: &DetailCard) -> Option<String> {
    match &card.photo {
        PhotoSource::Remote(url) => Some(url.clone()),
        PhotoSource::Local(_) => Some(format!(
            "/api/photo?sci_name={}",
            urlencoding::encode(&card.sci_name)
        )),
        PhotoSource::Unavailable => None,
    }
}

pub fn detail_view(rows: &[GeoRecord], photo_dir: Option<&Path>) -> Option<DetailView> {
    DetailCard::for_records(rows, photo_dir).map(|card| DetailView {
        photo_url: photo_link(&card),
        status: card.status_line(),
        sci_name: card.sci_name,
    })
}

pub fn legend() -> Vec<LegendEntry> {
    ALL_CATEGORIES
        .iter()
        .map(|c| LegendEntry {
            code: c.code(),
            label: c.full_name(),
        })
        .collect()
}

pub fn analytics_view(tables: &SpeciesTables, selection: &CategorySelection) -> Option<AnalyticsView> {
    let report = aggregate(&tables.species, selection);
    if report.is_empty() {
        return None;
    }

    Some(AnalyticsView {
        order_rows: order_rows(&report),
        habitat_rows: habitat_rows(&report),
        red_list_chart: DonutChart::new(RED_LIST_CHART_TITLE, &report.red_list),
        habitat_chart: DonutChart::new(HABITAT_CHART_TITLE, &report.habitat_chart()),
    })
}

/// Apply the form to the session's selection and assemble the page
pub fn build_dashboard(
    tables: &SpeciesTables,
    machine: &mut SelectionMachine,
    query: &DashboardQuery,
    photo_dir: Option<&Path>,
) -> DashboardView {
    let mut error = None;
    let mut warning = None;

    if let Some(habitat) = &query.habitat {
        machine.select_habitat(habitat, &tables.geo);
    }
    if let Some(species) = &query.species {
        if let Err(e) = machine.select_species(species) {
            tracing::debug!("Ignoring species choice: {}", e);
        }
    }

    if query.load {
        match machine.load(&tables.geo) {
            Ok(outcome) => warning = outcome.warning(),
            Err(e) => error = Some(e.to_string()),
        }
    }

    let rows: &[GeoRecord] = machine.loaded().map(|l| l.rows.as_slice()).unwrap_or(&[]);
    let map = MapView::for_records(rows);
    let detail = detail_view(rows, photo_dir);

    let selection = query.selection();
    let categories = tables
        .species
        .categories()
        .into_iter()
        .map(|code| CategoryOption {
            selected: selection.contains(&code),
            code,
        })
        .collect();

    let analytics = analytics_view(tables, &selection);
    let analytics_prompt = analytics.is_none().then_some(EMPTY_SELECTION_PROMPT);

    DashboardView {
        habitats: tables.geo.habitats().to_vec(),
        selected_habitat: machine.habitat().unwrap_or_default().to_string(),
        species_options: machine.species_options().to_vec(),
        selected_species: machine.species().unwrap_or_default().to_string(),
        hint: machine.hint(),
        error,
        warning,
        map,
        detail,
        categories,
        legend: legend(),
        analytics,
        analytics_prompt,
    }
}

/// Map view as JSON safe to embed in a `<script>` element
pub fn map_json(view: &MapView) -> String {
    serde_json::to_string(view)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GeoTable, RawGeoRow, RawSpeciesRow, SpeciesTable};

    fn tables() -> SpeciesTables {
        let geo = GeoTable::from_raw_rows(vec![RawGeoRow {
            sci_name: Some("Panthera tigris".to_string()),
            habitat: Some("Forest".to_string()),
            category: Some("EN".to_string()),
            geometry_wkt: Some("POLYGON((80 20, 90 20, 90 30, 80 30, 80 20))".to_string()),
            photo_url: Some("https://example.org/tiger.jpg".to_string()),
        }]);
        let species = SpeciesTable::from_raw_rows(vec![RawSpeciesRow {
            id_no: Some(1),
            category: Some("EN".to_string()),
            order_: Some("CARNIVORA".to_string()),
            marine: Some("false".to_string()),
            terrestria: Some("true".to_string()),
            freshwater: Some("false".to_string()),
            presence: Some(1),
            ..Default::default()
        }]);
        SpeciesTables { species, geo }
    }

    #[test]
    fn test_load_fills_map_and_card() {
        let tables = tables();
        let mut machine = SelectionMachine::new();
        let query = DashboardQuery::parse(Some(
            "habitat=Forest&species=Panthera+tigris&load=1&category=EN",
        ));

        let view = build_dashboard(&tables, &mut machine, &query, None);
        assert!(view.error.is_none());
        assert!(!view.map.is_fallback());

        let detail = view.detail.unwrap();
        assert_eq!(detail.status, "Endangered (EN)");
        assert_eq!(detail.photo_url.as_deref(), Some("https://example.org/tiger.jpg"));

        let analytics = view.analytics.unwrap();
        assert_eq!(analytics.order_rows[0].threat_ratio_pct, 100.0);
        assert!(view.categories[0].selected);
    }

    #[test]
    fn test_load_without_species_shows_error() {
        let tables = tables();
        let mut machine = SelectionMachine::new();
        let query = DashboardQuery::parse(Some("habitat=Forest&species=&load=1"));

        let view = build_dashboard(&tables, &mut machine, &query, None);
        assert_eq!(
            view.error.as_deref(),
            Some("Please select both habitat and species before loading.")
        );
        assert!(view.map.is_fallback());
        assert_eq!(view.analytics_prompt, Some(EMPTY_SELECTION_PROMPT));
    }

    #[test]
    fn test_map_json_is_script_safe() {
        let json = map_json(&MapView::fallback());
        assert!(!json.contains("</"));
        assert!(json.contains("No data for selected filters"));
    }
}
