//! Admin CRUD over tag name records, gated by a shared-secret header.
//!
//! Every handler checks the `x-admin-token` header against the configured
//! secret. When no secret is configured the endpoints answer 404, so an
//! unconfigured deployment exposes nothing.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{TagListResponse, TagRecordDto, TagUpsertResponse, UpsertTagRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::ws::messages::ServerFrame;

/// Header carrying the admin shared secret.
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Compares the request's admin token against the configured secret.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(GatewayError::AdminDisabled);
    };
    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(GatewayError::Unauthorized)
    }
}

/// `GET /tags` — List all stored tag records.
///
/// # Errors
///
/// Returns [`GatewayError`] when unauthorized or the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "Tags",
    summary = "List tag records",
    description = "Returns every stored tag record, most recently updated first. Requires the `x-admin-token` header.",
    responses(
        (status = 200, description = "Stored tag records", body = TagListResponse),
        (status = 401, description = "Missing or invalid admin token", body = ErrorResponse),
        (status = 404, description = "Admin surface disabled", body = ErrorResponse),
    )
)]
pub async fn list_tags(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    authorize(&state, &headers)?;
    let records = state.tags.list().await?;
    let data: Vec<TagRecordDto> = records.into_iter().map(TagRecordDto::from).collect();
    let total = data.len();
    Ok(Json(TagListResponse { data, total }))
}

/// `PUT /tags/{id}` — Set a tag's display name.
///
/// # Errors
///
/// Returns [`GatewayError`] when unauthorized or the name is empty.
#[utoipa::path(
    put,
    path = "/api/v1/tags/{id}",
    tag = "Tags",
    summary = "Upsert a tag record",
    description = "Sets the display name for a tag and announces the change to connected viewers. Requires the `x-admin-token` header.",
    request_body = UpsertTagRequest,
    responses(
        (status = 200, description = "Record stored", body = TagUpsertResponse),
        (status = 400, description = "Empty name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid admin token", body = ErrorResponse),
        (status = 404, description = "Admin surface disabled", body = ErrorResponse),
    )
)]
pub async fn upsert_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpsertTagRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    authorize(&state, &headers)?;
    if req.name.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "name must be non-empty; use DELETE to clear a record".to_string(),
        ));
    }

    let stored = state.tags.set_name(&id, &req.name).await;
    let name = stored.unwrap_or_default();

    // Keep connected viewers consistent with out-of-band renames.
    let update = ServerFrame::TagNameUpdated {
        id: id.clone(),
        name: name.clone(),
    };
    state.registry.broadcast_to_viewers(&update.to_json()).await;

    Ok(Json(TagUpsertResponse { id, name }))
}

/// `DELETE /tags/{id}` — Clear a tag record.
///
/// # Errors
///
/// Returns [`GatewayError`] when unauthorized.
#[utoipa::path(
    delete,
    path = "/api/v1/tags/{id}",
    tag = "Tags",
    summary = "Delete a tag record",
    description = "Removes the stored record for a tag and announces the cleared name to connected viewers. Deleting an absent record succeeds. Requires the `x-admin-token` header.",
    responses(
        (status = 204, description = "Record removed"),
        (status = 401, description = "Missing or invalid admin token", body = ErrorResponse),
        (status = 404, description = "Admin surface disabled", body = ErrorResponse),
    )
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    authorize(&state, &headers)?;
    let _ = state.tags.set_name(&id, "").await;

    let update = ServerFrame::TagNameUpdated {
        id,
        name: String::new(),
    };
    state.registry.broadcast_to_viewers(&update.to_json()).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Tag admin routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags/{id}", axum::routing::put(upsert_tag).delete(delete_tag))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn state_with_token(token: Option<&str>) -> AppState {
        use crate::domain::ConnectionRegistry;
        use crate::persistence::memory::MemoryTagStore;
        use crate::service::TagService;
        use std::sync::Arc;

        let store: Arc<dyn crate::persistence::TagStore> = Arc::new(MemoryTagStore::default());
        AppState {
            registry: Arc::new(ConnectionRegistry::new()),
            tags: Arc::new(TagService::new(store)),
            admin_token: token.map(str::to_string),
        }
    }

    #[test]
    fn no_configured_token_fails_closed() {
        let state = state_with_token(None);
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("anything"));
        let result = authorize(&state, &headers);
        assert!(matches!(result, Err(GatewayError::AdminDisabled)));
    }

    #[test]
    fn wrong_or_missing_token_is_unauthorized() {
        let state = state_with_token(Some("secret"));

        let empty = HeaderMap::new();
        assert!(matches!(
            authorize(&state, &empty),
            Err(GatewayError::Unauthorized)
        ));

        let mut wrong = HeaderMap::new();
        wrong.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("nope"));
        assert!(matches!(
            authorize(&state, &wrong),
            Err(GatewayError::Unauthorized)
        ));
    }

    #[test]
    fn exact_token_match_is_authorized() {
        let state = state_with_token(Some("secret"));
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("secret"));
        assert!(authorize(&state, &headers).is_ok());
    }
}
