//! Session store configuration.

use serde::{Deserialize, Serialize};

/// Session store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in minutes. Extended by this amount on every refresh.
    #[serde(default = "default_ttl")]
    pub ttl_minutes: u64,
    /// Interval for the expired-session sweep in minutes (0 disables it).
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
    /// How long an explicitly ended session stays marked as ended, in hours.
    /// Refresh tokens of an ended session are refused for this long, so it
    /// should be at least the refresh token lifetime.
    #[serde(default = "default_ended_ttl")]
    pub ended_ttl_hours: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl(),
            cleanup_interval_minutes: default_cleanup_interval(),
            ended_ttl_hours: default_ended_ttl(),
        }
    }
}

fn default_ttl() -> u64 {
    30
}

fn default_cleanup_interval() -> u64 {
    10
}

fn default_ended_ttl() -> u64 {
    168
}
