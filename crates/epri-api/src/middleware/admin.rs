//! Admin credential check for destructive endpoints.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use epri_core::error::DomainError;
use subtle::ConstantTimeEq;

use crate::error::ApiError;
use crate::state::AppState;

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Lets the request through only if it carries `Authorization: Bearer
/// <ADMIN_TOKEN>`. Tokens are compared in constant time.
///
/// # Errors
///
/// Returns a 401 `ApiError` if the header is missing, the token does not
/// match, or no admin token is configured.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        tracing::warn!("admin endpoint called but no admin token is configured");
        return Err(state.fail("Unauthorized")(DomainError::Unauthorized));
    };

    let authorized = bearer_token(&request)
        .is_some_and(|presented| bool::from(presented.as_bytes().ct_eq(expected.as_bytes())));

    if !authorized {
        return Err(state.fail("Unauthorized")(DomainError::Unauthorized));
    }

    Ok(next.run(request).await)
}
