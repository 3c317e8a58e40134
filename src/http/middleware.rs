//! Request middleware: principal resolution and the admin gate.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::token;
use crate::domain::access::{authorize, Principal, ROLE_ADMIN};
use crate::error::{ApiError, ApiResult};

use super::AppState;

/// Resolves the bearer token into a [`Principal`] stored in the request
/// extensions. Requests without a valid token never reach a handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("Authentication required".into()))?;
    let bearer = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthenticated("Authentication required".into()))?;
    let claims = token::verify_token(&state.config.jwt_secret, bearer)?;
    let principal = claims.to_principal()?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Lets the request through only when the principal holds the admin role.
/// Must sit inside [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> ApiResult<Response> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::Unauthenticated("Authentication required".into()))?;
    authorize(principal, &[ROLE_ADMIN])?;
    Ok(next.run(request).await)
}
