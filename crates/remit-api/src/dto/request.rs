//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use remit_entity::user::ProfileUpdate;
use remit_service::{InvitationRequest, RegisterRequest as RegisterInput};

/// Self-registration body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

impl From<RegisterRequest> for RegisterInput {
    fn from(req: RegisterRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
        }
    }
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh and logout bodies. The token may come from the cookie instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// `GET /auth/activity?limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

/// `PATCH /users/{id}/status` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Administrator input for a new invitation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(range(min = 1, message = "roleId is required"))]
    pub role_id: i32,
    #[validate(range(min = 1, max = 720))]
    pub expires_in_hours: Option<u64>,
    #[validate(length(max = 1000))]
    pub message: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
}

impl From<CreateInvitationRequest> for InvitationRequest {
    fn from(req: CreateInvitationRequest) -> Self {
        Self {
            email: req.email,
            role_id: req.role_id,
            ttl_hours: req.expires_in_hours,
            message: req.message,
            department: req.department,
            position: req.position,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResendInvitationRequest {
    #[validate(range(min = 1, max = 720))]
    #[serde(default)]
    pub expires_in_hours: Option<u64>,
}

/// `GET /invitations/validate?token=`
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateInvitationQuery {
    pub token: String,
}

/// `GET /invitations?status=&email=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListInvitationsQuery {
    pub status: Option<String>,
    pub email: Option<String>,
}

/// Invitee acceptance body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitationRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
}

impl AcceptInvitationRequest {
    pub fn profile(&self) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.clone(),
            department: self.department.clone(),
            position: self.position.clone(),
        }
    }
}
