// Axum dashboard server
//
// Purpose: HTML dashboard plus JSON API over the loaded species tables
// Tables are loaded once into the repository; /api/refresh reloads them.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::analytics::format::{habitat_rows, order_rows, EMPTY_SELECTION_PROMPT};
use crate::analytics::{aggregate, CategorySelection};
use crate::config::Config;
use crate::map::{resolve_photo, MapView, PhotoSource, IMAGE_UNAVAILABLE};
use crate::repository::SpeciesRepository;
use crate::selection::SelectionError;
use crate::store::SpeciesStore;
use crate::web::dashboard::{detail_view, legend};
use crate::web::handlers::pages::dashboard_page;
use crate::web::session::{session_cookie, session_id_from_headers, SessionStore};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<SpeciesRepository>,
    pub store: Arc<Mutex<SpeciesStore>>,
    pub sessions: SessionStore,
    pub cache: Cache<String, Value>,
    pub photo_dir: Option<PathBuf>,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        tracing::info!("Opening store at {}...", config.db_path);
        let store = SpeciesStore::open(&config.db_path)?;
        Self::from_store(store, config.photo_dir.clone())
    }

    /// Build state around an open store (tests use an in-memory one)
    pub fn from_store(store: SpeciesStore, photo_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        tracing::info!("Loading species tables...");
        let repository = Arc::new(SpeciesRepository::load(&store)?);

        tracing::info!("Initializing Moka cache...");
        let cache = Cache::builder()
            .max_capacity(1_000) // 1K analytics responses
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build();

        Ok(Self {
            repository,
            store: Arc::new(Mutex::new(store)),
            sessions: SessionStore::new(),
            cache,
            photo_dir,
        })
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Dashboard page (HTML)
        .route("/", get(dashboard_page))

        // Selection endpoints (JSON)
        .route("/api/habitats", get(get_habitats))
        .route("/api/species", get(get_species))
        .route("/api/selection/load", post(load_selection))

        // Analytics endpoints (JSON)
        .route("/api/analytics", get(get_analytics))
        .route("/api/categories", get(get_categories))

        // Species photo (bytes or redirect)
        .route("/api/photo", get(get_photo))

        // Reload tables from the store
        .route("/api/refresh", post(refresh_tables))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_habitats(State(state): State<AppState>) -> Json<Value> {
    let tables = state.repository.snapshot();
    Json(json!({
        "habitats": tables.geo.habitats(),
    }))
}

#[derive(Debug, Deserialize)]
struct SpeciesQuery {
    habitat: Option<String>,
}

async fn get_species(
    State(state): State<AppState>,
    Query(params): Query<SpeciesQuery>,
) -> Json<Value> {
    let habitat = params.habitat.unwrap_or_default();
    let habitat = habitat.trim();
    let species = if habitat.is_empty() {
        Vec::new()
    } else {
        state.repository.snapshot().geo.species_for_habitat(habitat)
    };

    Json(json!({
        "habitat": habitat,
        "species": species,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct LoadRequest {
    #[serde(default)]
    habitat: Option<String>,
    #[serde(default)]
    species: Option<String>,
}

/// Apply a habitat/species choice to the session and load its ranges
async fn load_selection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoadRequest>,
) -> Response {
    let (session_id, selection, created) = state
        .sessions
        .get_or_create(session_id_from_headers(&headers))
        .await;

    let tables = state.repository.snapshot();
    let result = {
        let mut machine = selection.lock().unwrap_or_else(PoisonError::into_inner);
        machine.select_habitat(payload.habitat.as_deref().unwrap_or(""), &tables.geo);

        let species = payload.species.as_deref().unwrap_or("");
        machine
            .select_species(species)
            .or_else(|e| match e {
                // A missing habitat surfaces from load below
                SelectionError::MissingSelection => Ok(()),
                other => Err(other),
            })
            .and_then(|_| machine.load(&tables.geo))
    };

    let response = match result {
        Ok(outcome) => {
            let map = MapView::for_records(&outcome.rows);
            Json(json!({
                "rows": outcome.rows.len(),
                "recomputed": outcome.recomputed,
                "warning": outcome.warning(),
                "map": map,
                "detail": detail_view(&outcome.rows, state.photo_dir.as_deref()),
            }))
            .into_response()
        }
        Err(e) => AppError::BadRequest(e.to_string()).into_response(),
    };

    if created {
        ([(header::SET_COOKIE, session_cookie(&session_id))], response).into_response()
    } else {
        response
    }
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    /// Comma-separated category codes ("CR,EN")
    categories: Option<String>,
}

async fn get_analytics(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsQuery>,
) -> Json<Value> {
    let raw = params.categories.unwrap_or_default();
    let selection = CategorySelection::new(raw.split(','));
    let cache_key = format!("analytics:{}", selection.cache_key());

    // Check cache
    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!("Cache hit for {}", cache_key);
        return Json(cached);
    }

    let tables = state.repository.snapshot();
    let report = aggregate(&tables.species, &selection);

    let result = json!({
        "categories": selection.iter().collect::<Vec<_>>(),
        "empty": report.is_empty(),
        "prompt": report.is_empty().then_some(EMPTY_SELECTION_PROMPT),
        "order_rows": order_rows(&report),
        "habitat_rows": habitat_rows(&report),
        "habitat_chart": report.habitat_chart(),
        "report": report,
    });

    // Cache result
    state.cache.insert(cache_key, result.clone()).await;

    Json(result)
}

async fn get_categories(State(state): State<AppState>) -> Json<Value> {
    let tables = state.repository.snapshot();
    Json(json!({
        "legend": legend(),
        "categories": tables.species.categories(),
    }))
}

#[derive(Debug, Deserialize)]
struct PhotoQuery {
    sci_name: String,
}

/// Photo for a species: redirect for remote URLs, bytes for local files
async fn get_photo(
    State(state): State<AppState>,
    Query(params): Query<PhotoQuery>,
) -> Result<Response, AppError> {
    let tables = state.repository.snapshot();
    let photo_url = tables
        .geo
        .find_species(params.sci_name.trim())
        .and_then(|r| r.photo_url.clone());

    match resolve_photo(photo_url.as_deref(), state.photo_dir.as_deref()) {
        PhotoSource::Remote(url) => Ok(Redirect::temporary(&url).into_response()),
        PhotoSource::Local(path) => match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(([(header::CONTENT_TYPE, image_content_type(&path))], bytes).into_response()),
            Err(e) => {
                tracing::warn!("Failed to read photo {}: {}", path.display(), e);
                Err(AppError::NotFound(IMAGE_UNAVAILABLE.to_string()))
            }
        },
        PhotoSource::Unavailable => Err(AppError::NotFound(IMAGE_UNAVAILABLE.to_string())),
    }
}

fn image_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Reload both tables from the store and drop cached analytics
async fn refresh_tables(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let repository = state.repository.clone();
    let store = state.store.clone();

    // Blocking DuckDB reads: run in blocking thread pool
    let tables = tokio::task::spawn_blocking(move || {
        let store = store.lock().unwrap_or_else(PoisonError::into_inner);
        repository.refresh(&store)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
    .map_err(|e| AppError::Store(e.to_string()))?;

    state.cache.invalidate_all();

    Ok(Json(json!({
        "species_rows": tables.species.len(),
        "geo_rows": tables.geo.len(),
    })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AppError {
    Store(String),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
