//! Authentication and token configuration.

use serde::{Deserialize, Serialize};

/// Authentication, lockout, and token configuration.
///
/// Signing keys can be supplied inline (`jwt_private_key`, typically from
/// `REMIT__AUTH__JWT_PRIVATE_KEY`) or as file paths. Inline values win.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// PEM-encoded RSA private key used to sign tokens.
    #[serde(default)]
    pub jwt_private_key: Option<String>,
    /// PEM-encoded RSA public key used to verify tokens.
    #[serde(default)]
    pub jwt_public_key: Option<String>,
    /// Path to the PEM private key, used when no inline key is set.
    #[serde(default)]
    pub jwt_private_key_path: Option<String>,
    /// Path to the PEM public key, used when no inline key is set.
    #[serde(default)]
    pub jwt_public_key_path: Option<String>,
    /// Value of the `iss` claim.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub jwt_refresh_ttl_hours: u64,
    /// Clock skew tolerated when validating `exp`.
    #[serde(default = "default_leeway")]
    pub jwt_leeway_seconds: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Maximum consecutive failed login attempts before lockout.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: i32,
    /// Account lockout duration in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_duration_minutes: u64,
    /// Revoke the presented refresh token when a new pair is issued.
    #[serde(default = "default_true")]
    pub rotate_refresh_tokens: bool,
    /// Set the `Secure` attribute on auth cookies.
    #[serde(default = "default_true")]
    pub cookie_secure: bool,
    /// Optional `Domain` attribute for auth cookies.
    #[serde(default)]
    pub cookie_domain: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key: None,
            jwt_public_key: None,
            jwt_private_key_path: None,
            jwt_public_key_path: None,
            jwt_issuer: default_issuer(),
            jwt_access_ttl_minutes: default_access_ttl(),
            jwt_refresh_ttl_hours: default_refresh_ttl(),
            jwt_leeway_seconds: default_leeway(),
            password_min_length: default_password_min(),
            max_failed_attempts: default_max_failed(),
            lockout_duration_minutes: default_lockout(),
            rotate_refresh_tokens: true,
            cookie_secure: true,
            cookie_domain: None,
        }
    }
}

fn default_issuer() -> String {
    "global-remit-api".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    24 * 7
}

fn default_leeway() -> u64 {
    5
}

fn default_password_min() -> usize {
    8
}

fn default_max_failed() -> i32 {
    5
}

fn default_lockout() -> u64 {
    15
}

fn default_true() -> bool {
    true
}
