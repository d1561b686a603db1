use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// A granted lease on one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockToken {
    pub document_id: String,
    pub holder: SessionId,
    pub acquired_at: SystemTime,
    pub expires_at: SystemTime,
}

impl LockToken {
    /// A lease is live strictly before `expires_at`.
    pub fn is_live_at(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }

    pub fn is_held_by(&self, session: &SessionId) -> bool {
        &self.holder == session
    }
}
