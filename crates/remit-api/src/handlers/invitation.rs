//! Invitation handlers. Management routes sit behind the `users:create`
//! permission gate; validate and accept are public.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;

use remit_auth::invitation::AcceptInvitation;
use remit_entity::invitation::{InvitationFilter, InvitationStatus};

use crate::dto::request::{
    AcceptInvitationRequest, CreateInvitationRequest, ListInvitationsQuery,
    ResendInvitationRequest, ValidateInvitationQuery,
};
use crate::dto::response::{
    InvitationAcceptedResponse, InvitationCreatedResponse, InvitationListResponse,
    InvitationResponse, InvitationValidationResponse,
};
use crate::error::{ApiResult, invalid_body};
use crate::extractors::{AuthUser, Client, ValidatedJson};
use crate::state::AppState;

/// POST /api/v1/invitations
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<InvitationCreatedResponse>)> {
    let issued = state.invitations.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// GET /api/v1/invitations?status=&email=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListInvitationsQuery>,
) -> ApiResult<Json<InvitationListResponse>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<InvitationStatus>)
        .transpose()?;
    let filter = InvitationFilter {
        status,
        email: query.email.filter(|e| !e.is_empty()),
    };

    let now = Utc::now();
    let invitations: Vec<InvitationResponse> = state
        .invitations
        .list(&filter)
        .await?
        .iter()
        .map(|inv| InvitationResponse::new(inv, now))
        .collect();

    Ok(Json(InvitationListResponse {
        total: invitations.len(),
        invitations,
    }))
}

/// DELETE /api/v1/invitations/{id}
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<InvitationResponse>> {
    let invitation = state.invitations.cancel(id).await?;
    Ok(Json(InvitationResponse::new(&invitation, Utc::now())))
}

/// POST /api/v1/invitations/{id}/resend
pub async fn resend(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ResendInvitationRequest>>,
) -> ApiResult<Json<InvitationCreatedResponse>> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    validator::Validate::validate(&req).map_err(invalid_body)?;

    let issued = state.invitations.resend(id, req.expires_in_hours).await?;
    Ok(Json(issued.into()))
}

/// GET /api/v1/invitations/validate?token=
pub async fn validate(
    State(state): State<AppState>,
    Query(query): Query<ValidateInvitationQuery>,
) -> ApiResult<Json<InvitationValidationResponse>> {
    let summary = state.invitations.validate(&query.token).await?;
    Ok(Json(summary.into()))
}

/// POST /api/v1/invitations/accept
///
/// 201 when a new identity was created, 200 when a pending registration
/// was promoted in place.
pub async fn accept(
    State(state): State<AppState>,
    Client(client): Client,
    ValidatedJson(req): ValidatedJson<AcceptInvitationRequest>,
) -> ApiResult<(StatusCode, Json<InvitationAcceptedResponse>)> {
    let profile = req.profile();
    let accepted = state
        .invitations
        .accept(
            AcceptInvitation {
                token: req.token,
                profile,
                password: req.password,
            },
            &client,
        )
        .await?;

    let status = if accepted.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(accepted.into())))
}
