//! Key-value HTTP routes
//!
//! CRUD over the store, one route per operation:
//!
//! - `PUT    /kv/{type}/{key}`: raw body bytes; 201 insert, 200 update
//! - `GET    /kv/{type}/{key}`: raw value bytes, 404 when absent
//! - `DELETE /kv/{type}/{key}`: idempotent 200
//! - `GET    /kv/{type}`: ordered key listing with `prefix` and `limit`
//!
//! The route layer validates type/key shape and value size, and checks
//! the bearer token, before touching the store.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::kvstore::{KvStore, PutOutcome, MAX_LIST_LIMIT};

use super::response::{ApiError, ListResponse};

/// Default number of keys returned when the caller omits `limit`.
const DEFAULT_LIST_LIMIT: usize = 100;

/// State shared by the key-value handlers.
pub struct KvState {
    pub store: Arc<KvStore>,
    pub auth_token: Option<String>,
    pub max_value_bytes: usize,
}

/// Builds the `/kv` router.
pub fn kv_routes(state: Arc<KvState>) -> Router {
    Router::new()
        .route("/kv/{type}", get(list_records_handler))
        .route(
            "/kv/{type}/{key}",
            get(get_record_handler)
                .put(put_record_handler)
                .delete(delete_record_handler),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Checks the bearer token when one is configured.
fn authorize(state: &KvState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(ref expected) = state.auth_token else {
        return Ok(());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

/// Validates a path component used as a type or key.
///
/// Rejects empty strings, `/`, and the control bytes 0x00-0x1F and 0x7F.
fn validate_component(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::invalid_argument(format!(
            "{field} must be nonempty"
        )));
    }
    let forbidden = |c: char| c == '/' || ('\u{00}'..='\u{1f}').contains(&c) || c == '\u{7f}';
    if value.chars().any(forbidden) {
        return Err(ApiError::invalid_argument(format!(
            "{field} must not contain '/' or control characters"
        )));
    }
    Ok(())
}

/// Clamps a requested listing limit into `[0, MAX_LIST_LIMIT]`.
fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT)
}

async fn put_record_handler(
    State(state): State<Arc<KvState>>,
    Path((record_type, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    validate_component("type", &record_type)?;
    validate_component("key", &key)?;
    if body.is_empty() {
        return Err(ApiError::invalid_argument("value must be nonempty"));
    }
    if body.len() > state.max_value_bytes {
        return Err(ApiError::PayloadTooLarge);
    }

    match state
        .store
        .put(&record_type, &key, &body)
        .map_err(ApiError::from_store)?
    {
        PutOutcome::Created => Ok(StatusCode::CREATED),
        PutOutcome::Updated => Ok(StatusCode::OK),
    }
}

async fn get_record_handler(
    State(state): State<Arc<KvState>>,
    Path((record_type, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;
    validate_component("type", &record_type)?;
    validate_component("key", &key)?;

    match state
        .store
        .get(&record_type, &key)
        .map_err(ApiError::from_store)?
    {
        Some(value) => Ok((
            [(header::CONTENT_TYPE, "application/octet-stream")],
            value,
        )),
        None => Err(ApiError::NotFound),
    }
}

async fn delete_record_handler(
    State(state): State<Arc<KvState>>,
    Path((record_type, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    validate_component("type", &record_type)?;
    validate_component("key", &key)?;

    state
        .store
        .delete(&record_type, &key)
        .map_err(ApiError::from_store)?;
    // Idempotent: deleting an absent key is still a success.
    Ok(StatusCode::OK)
}

async fn list_records_handler(
    State(state): State<Arc<KvState>>,
    Path(record_type): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Json<ListResponse>, ApiError> {
    authorize(&state, &headers)?;
    validate_component("type", &record_type)?;

    let limit = clamp_limit(query.limit);
    let keys = state
        .store
        .list(&record_type, query.prefix.as_deref(), limit)
        .map_err(ApiError::from_store)?;

    let count = keys.len();
    Ok(Json(ListResponse { keys, count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn state_with_token(token: Option<&str>) -> (tempfile::TempDir, KvState) {
        use crate::txnlog::SpyTxnLogger;
        let dir = tempfile::TempDir::new().unwrap();
        let store = KvStore::open(
            dir.path().join("test.sqlite"),
            Arc::new(SpyTxnLogger::new()),
        )
        .unwrap();
        let state = KvState {
            store: Arc::new(store),
            auth_token: token.map(str::to_string),
            max_value_bytes: 1024,
        };
        (dir, state)
    }

    #[test]
    fn test_validate_component_accepts_plain_names() {
        assert!(validate_component("key", "alice").is_ok());
        assert!(validate_component("key", "a-1_b.2~c").is_ok());
        assert!(validate_component("key", "naïve").is_ok());
    }

    #[test]
    fn test_validate_component_rejects_bad_shapes() {
        assert!(validate_component("key", "").is_err());
        assert!(validate_component("key", "a/b").is_err());
        assert!(validate_component("key", "line\nbreak").is_err());
        assert!(validate_component("key", "line\rbreak").is_err());
        assert!(validate_component("key", "nul\u{0}byte").is_err());
        assert!(validate_component("key", "del\u{7f}byte").is_err());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 100);
        assert_eq!(clamp_limit(Some(0)), 0);
        assert_eq!(clamp_limit(Some(1000)), 1000);
        assert_eq!(clamp_limit(Some(5000)), 1000);
    }

    #[test]
    fn test_authorize_disabled_without_token() {
        let (_dir, state) = state_with_token(None);
        assert!(authorize(&state, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_authorize_checks_bearer_token() {
        let (_dir, state) = state_with_token(Some("secret"));

        assert!(authorize(&state, &HeaderMap::new()).is_err());

        let mut wrong = HeaderMap::new();
        wrong.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer nope"),
        );
        assert!(authorize(&state, &wrong).is_err());

        let mut right = HeaderMap::new();
        right.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer secret"),
        );
        assert!(authorize(&state, &right).is_ok());
    }

    #[test]
    fn test_router_builds() {
        let (_dir, state) = state_with_token(None);
        let _router = kv_routes(Arc::new(state));
    }
}
