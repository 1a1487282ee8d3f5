//! Invitation onboarding configuration.

use serde::{Deserialize, Serialize};

/// Invitation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Hours an invitation stays valid after creation or resend.
    #[serde(default = "default_ttl_hours")]
    pub default_ttl_hours: u64,
    /// Registration page the invite URL points at; `?token=` is appended.
    #[serde(default = "default_invite_base_url")]
    pub invite_base_url: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            default_ttl_hours: default_ttl_hours(),
            invite_base_url: default_invite_base_url(),
        }
    }
}

fn default_ttl_hours() -> u64 {
    72
}

fn default_invite_base_url() -> String {
    "http://localhost:3000/register".to_string()
}
