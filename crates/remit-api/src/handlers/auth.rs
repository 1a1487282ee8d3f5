//! Auth handlers: register, login, refresh, logout, me, password, sessions.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;

use remit_core::error::AppError;

use crate::cookies;
use crate::dto::request::{
    ActivityQuery, ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
};
use crate::dto::response::{
    ActivityResponse, LoginResponse, MessageResponse, RevokedSessionsResponse, SessionResponse, TokenResponse,
    UserResponse,
};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, Client, ValidatedJson};
use crate::state::AppState;

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state.auth.register(req.into()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let result = state.auth.login(&req.email, &req.password, &client).await?;

    let jar = cookies::set_tokens(jar, &result.tokens, &state.config.auth);
    Ok((
        jar,
        Json(LoginResponse {
            tokens: TokenResponse::from(&result.tokens),
            session_id: result.session.id,
            user: UserResponse::from(&result.user),
        }),
    ))
}

/// POST /api/v1/auth/refresh
///
/// The refresh token comes from the body, or the `refreshToken` cookie.
pub async fn refresh(
    State(state): State<AppState>,
    Client(client): Client,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<(CookieJar, Json<TokenResponse>)> {
    let token = body
        .and_then(|Json(b)| b.refresh_token)
        .filter(|t| !t.is_empty())
        .or_else(|| cookies::refresh_token(&jar))
        .ok_or_else(|| AppError::token_invalid("Refresh token required"))?;

    let pair = state.auth.refresh(&token, &client).await?;

    let jar = cookies::set_tokens(jar, &pair, &state.config.auth);
    Ok((jar, Json(TokenResponse::from(&pair))))
}

/// POST /api/v1/auth/logout
///
/// Always succeeds for the caller and clears the cookies. Without a valid
/// access token the refresh token, from the body or cookie, still ends its
/// session.
pub async fn logout(
    State(state): State<AppState>,
    Client(client): Client,
    auth: Option<AuthUser>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    let refresh = body
        .and_then(|Json(b)| b.refresh_token)
        .filter(|t| !t.is_empty())
        .or_else(|| cookies::refresh_token(&jar));

    match (auth, refresh) {
        (Some(auth), refresh) => state.auth.logout(&auth, refresh.as_deref()).await?,
        (None, Some(refresh)) => state.auth.logout_with_refresh(&refresh, &client).await?,
        (None, None) => {}
    }

    let jar = cookies::clear_tokens(jar, &state.config.auth);
    Ok((jar, Json(MessageResponse::new("Logged out successfully"))))
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserResponse>> {
    let user = state.auth.me(&auth).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .auth
        .change_password(&auth, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// GET /api/v1/auth/activity
pub async fn activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityResponse>>> {
    let entries = state.auth.recent_activity(&auth, query.limit).await?;
    Ok(Json(entries.into_iter().map(ActivityResponse::from).collect()))
}

/// GET /api/v1/auth/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let current = auth.session_id();
    let sessions = state.auth.list_sessions(&auth).await?;
    Ok(Json(
        sessions
            .iter()
            .map(|s| SessionResponse::new(s, current))
            .collect(),
    ))
}

/// DELETE /api/v1/auth/sessions
pub async fn revoke_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<RevokedSessionsResponse>)> {
    let revoked = state.auth.revoke_all_sessions(&auth).await?;
    let jar = cookies::clear_tokens(jar, &state.config.auth);
    Ok((jar, Json(RevokedSessionsResponse { revoked })))
}
