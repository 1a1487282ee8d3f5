//! Permission gate for routes that need a specific permission code.

use axum::extract::{FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Authenticate the caller and require `code` in the token's permission set.
///
/// Membership is exact: no hierarchy and no wildcards. Use as a route layer:
///
/// ```ignore
/// .route_layer(from_fn_with_state(state, |s, req, next| {
///     require_permission(s, "users:create", req, next)
/// }))
/// ```
pub async fn require_permission(
    State(state): State<AppState>,
    code: &'static str,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    let auth = AuthUser::from_request_parts(&mut parts, &state).await?;
    auth.require(code)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}
