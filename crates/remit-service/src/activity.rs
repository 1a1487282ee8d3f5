//! Best-effort security activity log.

use std::sync::Arc;

use tracing::warn;

use uuid::Uuid;

use remit_core::result::AppResult;
use remit_database::ActivityStore;
use remit_entity::activity::{NewActivity, UserActivity};

/// Appends activity entries. A failed write is logged and never fails the
/// operation being recorded.
#[derive(Debug, Clone)]
pub struct ActivityRecorder {
    store: Arc<dyn ActivityStore>,
}

impl ActivityRecorder {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, entry: NewActivity) {
        if let Err(e) = self.store.record(&entry).await {
            warn!(
                user_id = %entry.user_id,
                activity = ?entry.activity_type,
                error = %e,
                "Failed to record activity"
            );
        }
    }

    /// Most recent entries of an identity, newest first.
    pub async fn recent(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<UserActivity>> {
        self.store.recent_for_user(user_id, limit).await
    }
}
