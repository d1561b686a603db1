use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use crate::clock::{Clock, SystemClock};
use crate::config::DEFAULT_LOCK_TTL;
use crate::session::SessionId;

use super::{LockError, LockManager, LockToken};

/// In-memory lock manager backed by a `Mutex<HashMap<String, LockToken>>`.
///
/// Every operation runs under the one mutex, so acquire/release/heartbeat
/// are linearizable per document. Expired entries are overwritten or dropped
/// when next touched; there is no background sweep.
///
/// Clone-friendly (cloning shares the same lock table).
#[derive(Clone)]
pub struct InMemoryLockManager {
    leases: Arc<Mutex<HashMap<String, LockToken>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl InMemoryLockManager {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_LOCK_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        InMemoryLockManager {
            leases: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            clock,
        }
    }

    fn leases(&self) -> Result<MutexGuard<'_, HashMap<String, LockToken>>, LockError> {
        self.leases
            .lock()
            .map_err(|_| LockError::Poisoned("lock table poisoned".into()))
    }

    fn expiry(&self, now: SystemTime) -> SystemTime {
        now.checked_add(self.ttl).unwrap_or(now)
    }
}

impl Default for InMemoryLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager for InMemoryLockManager {
    fn acquire(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError> {
        let now = self.clock.now();
        let mut leases = self.leases()?;

        let acquired_at = match leases.get(document_id) {
            Some(lease) if lease.is_live_at(now) && !lease.is_held_by(session) => {
                return Err(LockError::Held {
                    document_id: document_id.to_string(),
                    holder: lease.holder.clone(),
                });
            }
            // Re-acquire by the holder keeps the original acquisition time.
            Some(lease) if lease.is_live_at(now) => lease.acquired_at,
            _ => now,
        };

        let token = LockToken {
            document_id: document_id.to_string(),
            holder: session.clone(),
            acquired_at,
            expires_at: self.expiry(now),
        };
        leases.insert(document_id.to_string(), token.clone());
        Ok(token)
    }

    fn release(&self, document_id: &str, session: &SessionId) -> Result<(), LockError> {
        let now = self.clock.now();
        let mut leases = self.leases()?;

        match leases.get(document_id) {
            Some(lease) if lease.is_live_at(now) && !lease.is_held_by(session) => {
                Err(LockError::NotHolder {
                    document_id: document_id.to_string(),
                    holder: lease.holder.clone(),
                })
            }
            Some(_) => {
                leases.remove(document_id);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn heartbeat(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError> {
        let now = self.clock.now();
        let expires_at = self.expiry(now);
        let mut leases = self.leases()?;

        match leases.get_mut(document_id) {
            Some(lease) if lease.is_live_at(now) => {
                if !lease.is_held_by(session) {
                    return Err(LockError::Held {
                        document_id: document_id.to_string(),
                        holder: lease.holder.clone(),
                    });
                }
                lease.expires_at = expires_at;
                Ok(lease.clone())
            }
            Some(_) => {
                leases.remove(document_id);
                Err(LockError::NotFound(document_id.to_string()))
            }
            None => Err(LockError::NotFound(document_id.to_string())),
        }
    }

    fn holder(&self, document_id: &str) -> Result<Option<LockToken>, LockError> {
        let now = self.clock.now();
        let leases = self.leases()?;
        Ok(leases
            .get(document_id)
            .filter(|lease| lease.is_live_at(now))
            .cloned())
    }

    fn remove(&self, document_id: &str) -> Result<(), LockError> {
        self.leases()?.remove(document_id);
        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
