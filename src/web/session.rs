// Per-session selection state, keyed by the `sw_session` cookie

use crate::selection::SelectionMachine;
use axum::http::{header, HeaderMap};
use moka::future::Cache;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SESSION_COOKIE: &str = "sw_session";

pub type SharedSelection = Arc<Mutex<SelectionMachine>>;

#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, SharedSelection>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_idle(Duration::from_secs(30 * 60))
    }

    pub fn with_idle(idle: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(10_000) // 10K concurrent sessions
            .time_to_idle(idle)
            .build();
        Self { sessions }
    }

    /// Look up a session, creating it when the id is absent, malformed or expired.
    ///
    /// Returns the id to use and whether the cookie needs setting.
    pub async fn get_or_create(&self, id: Option<String>) -> (String, SharedSelection, bool) {
        if let Some(id) = id.filter(|id| is_valid_id(id)) {
            if let Some(selection) = self.sessions.get(&id).await {
                return (id, selection, false);
            }
        }

        let id = new_session_id();
        let selection = self
            .sessions
            .get_with(id.clone(), async { Arc::new(Mutex::new(SelectionMachine::new())) })
            .await;
        tracing::debug!("Created session {}", id);
        (id, selection, true)
    }
}

pub fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

fn is_valid_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Session id from the request's Cookie header(s)
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
}

pub fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sw_session=abc123 ; other=1"),
        );
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("abc123"));
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_sessions_are_reused() {
        let store = SessionStore::new();
        let (id, first, created) = store.get_or_create(None).await;
        assert!(created);

        let (same_id, second, created) = store.get_or_create(Some(id.clone())).await;
        assert!(!created);
        assert_eq!(same_id, id);
        assert!(Arc::ptr_eq(&first, &second));

        let (_, _, created) = store.get_or_create(Some("forged".to_string())).await;
        assert!(created);
    }
}
