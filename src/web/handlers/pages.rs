// Page handlers for HTML rendering with Askama

use crate::analytics::format::{
    HABITAT_COLUMNS, HABITAT_SECTION_TITLE, HABITAT_TABLE_TITLE, ORDER_COLUMNS, ORDER_TABLE_TITLE,
};
use crate::api_server::AppState;
use crate::web::dashboard::{build_dashboard, map_json, DashboardView};
use crate::web::query::DashboardQuery;
use crate::web::session::{session_cookie, session_id_from_headers};
use askama::Template;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};
use std::sync::PoisonError;

pub const PAGE_TITLE: &str = "SpeciesWatch: Mammal Conservation and Habitat Explorer";

/// `<select>` entry
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

fn select_options(values: &[String], selected: &str) -> Vec<SelectOption> {
    values
        .iter()
        .map(|value| SelectOption {
            selected: value == selected,
            value: value.clone(),
        })
        .collect()
}

// ============================================================================
// Dashboard Page
// ============================================================================

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub title: &'static str,
    pub order_table_title: &'static str,
    pub order_columns: [&'static str; 5],
    pub habitat_section_title: &'static str,
    pub habitat_table_title: &'static str,
    pub habitat_columns: [&'static str; 2],
    pub habitat_options: Vec<SelectOption>,
    pub species_options: Vec<SelectOption>,
    pub species_enabled: bool,
    pub view: DashboardView,
    pub map_json: String,
}

impl DashboardTemplate {
    pub fn new(view: DashboardView) -> Self {
        Self {
            title: PAGE_TITLE,
            order_table_title: ORDER_TABLE_TITLE,
            order_columns: ORDER_COLUMNS,
            habitat_section_title: HABITAT_SECTION_TITLE,
            habitat_table_title: HABITAT_TABLE_TITLE,
            habitat_columns: HABITAT_COLUMNS,
            habitat_options: select_options(&view.habitats, &view.selected_habitat),
            species_options: select_options(&view.species_options, &view.selected_species),
            species_enabled: !view.species_options.is_empty(),
            map_json: map_json(&view.map),
            view,
        }
    }
}

pub async fn dashboard_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Response {
    let query = DashboardQuery::parse(raw.as_deref());
    let (session_id, selection, created) = state
        .sessions
        .get_or_create(session_id_from_headers(&headers))
        .await;

    let tables = state.repository.snapshot();
    let view = {
        let mut machine = selection.lock().unwrap_or_else(PoisonError::into_inner);
        build_dashboard(&tables, &mut machine, &query, state.photo_dir.as_deref())
    };

    let template = DashboardTemplate::new(view);
    let page = Html(template.render().unwrap_or_else(|e| {
        format!("Template error: {}", e)
    }));

    if created {
        ([(header::SET_COOKIE, session_cookie(&session_id))], page).into_response()
    } else {
        page.into_response()
    }
}
