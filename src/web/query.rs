// Dashboard form parameters
//
// The sidebar multiselect submits `category` once per selected code, which
// the serde form extractor cannot collect, so the raw query is parsed here.

use crate::analytics::CategorySelection;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardQuery {
    pub habitat: Option<String>,
    pub species: Option<String>,
    /// The Load button was pressed
    pub load: bool,
    pub categories: Vec<String>,
}

impl DashboardQuery {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = DashboardQuery::default();

        for pair in raw.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode(value);

            match key {
                "habitat" => query.habitat = Some(value),
                "species" => query.species = Some(value),
                "load" => query.load = !matches!(value.as_str(), "0" | "false"),
                "category" => query.categories.push(value),
                // Comma-separated form, as used by the JSON API
                "categories" => query
                    .categories
                    .extend(value.split(',').map(str::to_string)),
                _ => {}
            }
        }

        query
    }

    pub fn selection(&self) -> CategorySelection {
        CategorySelection::new(&self.categories)
    }
}

/// Form-decode a value ('+' is a space); undecodable input is kept as-is
fn decode(value: &str) -> String {
    let spaced = value.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|v| v.into_owned())
        .unwrap_or(spaced)
}
