//! HTTP handlers
//!
//! Thin handlers that delegate avatar resolution to the service layer and
//! turn the outcome into the wire response.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::config::ResponseMode;
use crate::models::{AvatarQuery, ResolvedAvatar};

use super::{AppState, ClientKey};

/// `GET /` — point visitors at the project page.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, state.config.web.index_redirect.clone())],
    )
}

/// `GET /favicon.ico` — nothing to serve, and browsers may cache that.
pub async fn favicon() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::CACHE_CONTROL, "public, max-age=86400")],
    )
}

/// `GET /{user_id}` — resolve an avatar and answer in the configured mode.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<AvatarQuery>,
    client_key: ClientKey,
) -> Response {
    let resolved = match state
        .resolver
        .resolve(client_key.as_deref(), &user_id, &query)
        .await
    {
        Ok(resolved) => resolved,
        Err(error) => return error.into_response(),
    };

    match state.config.web.response_mode {
        ResponseMode::Redirect => redirect_response(&resolved),
        ResponseMode::Proxy => proxy_response(&state, &resolved).await,
    }
}

fn cache_control(resolved: &ResolvedAvatar) -> String {
    format!("public, max-age={}", resolved.max_age.as_secs())
}

fn redirect_response(resolved: &ResolvedAvatar) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, resolved.location.clone()),
            (header::CACHE_CONTROL, cache_control(resolved)),
        ],
    )
        .into_response()
}

/// Proxy mode performs a second outbound fetch and relays content type and
/// raw bytes; its failure maps to the same upstream-error status.
async fn proxy_response(state: &AppState, resolved: &ResolvedAvatar) -> Response {
    match state.resolver.fetch_image(&resolved.location).await {
        Ok(image) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, image.content_type),
                (header::CACHE_CONTROL, cache_control(resolved)),
            ],
            image.bytes,
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}
