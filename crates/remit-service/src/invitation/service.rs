//! Invitation use cases: administrators issue and manage invitations,
//! invitees validate and accept them.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use remit_auth::InvitationEngine;
use remit_auth::invitation::{
    AcceptInvitation, AcceptedInvitation, InvitationSummary, IssuedInvitation, NewInvitation,
};
use remit_core::result::AppResult;
use remit_entity::activity::{ActivityType, NewActivity};
use remit_entity::invitation::{Invitation, InvitationFilter};

use crate::activity::ActivityRecorder;
use crate::context::{ClientInfo, RequestContext};

/// Administrator input for a new invitation.
#[derive(Debug, Clone)]
pub struct InvitationRequest {
    pub email: String,
    pub role_id: i32,
    pub ttl_hours: Option<u64>,
    pub message: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InvitationService {
    engine: Arc<InvitationEngine>,
    activity: ActivityRecorder,
}

impl InvitationService {
    pub fn new(engine: Arc<InvitationEngine>, activity: ActivityRecorder) -> Self {
        Self { engine, activity }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: InvitationRequest,
    ) -> AppResult<IssuedInvitation> {
        Ok(self
            .engine
            .create(NewInvitation {
                email: req.email,
                role_id: req.role_id,
                invited_by: ctx.user_id(),
                ttl_hours: req.ttl_hours,
                message: req.message,
                department: req.department,
                position: req.position,
            })
            .await?)
    }

    pub async fn validate(&self, token: &str) -> AppResult<InvitationSummary> {
        Ok(self.engine.validate(token).await?)
    }

    pub async fn accept(
        &self,
        req: AcceptInvitation,
        client: &ClientInfo,
    ) -> AppResult<AcceptedInvitation> {
        let accepted = self.engine.accept(req).await?;
        self.activity
            .record(
                NewActivity::new(accepted.user_id, ActivityType::InvitationAccepted)
                    .with_client(client.ip_address.clone(), client.user_agent.clone())
                    .with_details(json!({ "created": accepted.created })),
            )
            .await;
        Ok(accepted)
    }

    pub async fn cancel(&self, id: Uuid) -> AppResult<Invitation> {
        Ok(self.engine.cancel(id).await?)
    }

    pub async fn resend(&self, id: Uuid, ttl_hours: Option<u64>) -> AppResult<IssuedInvitation> {
        Ok(self.engine.resend(id, ttl_hours).await?)
    }

    pub async fn list(&self, filter: &InvitationFilter) -> AppResult<Vec<Invitation>> {
        Ok(self.engine.list(filter).await?)
    }
}
