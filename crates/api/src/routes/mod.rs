//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod assets;
pub mod health;
pub mod openapi;

/// Creates the `/v1/media` router.
///
/// Health and the OpenAPI document are public; every asset route sits
/// behind the bearer credential check.
#[allow(clippy::needless_pass_by_value)]
pub fn media_routes(state: AppState) -> Router<AppState> {
    let max_upload_bytes = state.assets.settings().max_upload_bytes;

    let protected_routes = assets::routes(max_upload_bytes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(openapi::routes())
        .merge(protected_routes)
}
