//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{AppState, error::ApiError};
use mediagate_shared::{AppError, CallerIdentity};

/// Authentication middleware that verifies bearer credentials.
///
/// On success the [`CallerIdentity`] is stored in the request extensions.
/// On failure the request is answered with 401 before any body is read.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // A header that is not valid visible ASCII is treated as malformed.
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|h| h.to_str().unwrap_or_default());

    match state.jwt_service.verify_authorization(auth_header) {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => {
            debug!(reason = %e, path = %request.uri().path(), "Rejected credential");
            ApiError::from(e).into_response()
        }
    }
}

/// Extractor for the authenticated caller.
///
/// ```ignore
/// async fn handler(AuthUser(caller): AuthUser) -> impl IntoResponse {
///     // caller: CallerIdentity
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub CallerIdentity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError(AppError::Unauthenticated("no verified caller".to_string())))
    }
}
