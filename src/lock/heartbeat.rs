//! Background lease renewal.
//!
//! `HeartbeatThread` keeps one session's lease on one document alive by
//! calling [`LockManager::heartbeat`] every interval until stopped.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::session::SessionId;

use super::{LockError, LockManager};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Statistics from the heartbeat thread.
#[derive(Debug, Default, Clone)]
pub struct HeartbeatStats {
    /// Successful renewals.
    pub beats: usize,
    /// Renewals that failed (retried at the next interval).
    pub failures: usize,
    /// The most recent failure, cleared by the next successful renewal.
    pub last_error: Option<LockError>,
}

/// A background thread renewing a lease at a fixed interval.
///
/// Failures are logged and retried on the next tick; nothing is surfaced to
/// the user from here. A lease that was lost for good shows up when the next
/// explicit save fails to re-acquire the lock.
///
/// ## Example
///
/// ```ignore
/// use docsync::{HeartbeatThread, InMemoryLockManager, SessionId};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let locks = Arc::new(InMemoryLockManager::with_ttl(Duration::from_secs(30)));
/// let session = SessionId::generate();
/// locks.acquire("doc-1", &session)?;
///
/// let heartbeat = HeartbeatThread::spawn(locks.clone(), "doc-1", session, Duration::from_secs(10));
/// // ... edit ...
/// let stats = heartbeat.stop();
/// ```
pub struct HeartbeatThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<HeartbeatStats>>,
}

impl HeartbeatThread {
    /// Spawn a heartbeat loop. The first renewal happens one `interval` after spawn.
    ///
    /// Intervals below one millisecond are raised to one millisecond.
    pub fn spawn<L>(
        manager: L,
        document_id: impl Into<String>,
        session: SessionId,
        interval: Duration,
    ) -> Self
    where
        L: LockManager + 'static,
    {
        let (stop_tx, stop_rx) = channel::<()>();
        let document_id = document_id.into();
        let interval = interval.max(MIN_INTERVAL);

        let handle = thread::spawn(move || {
            let mut stats = HeartbeatStats::default();

            loop {
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                match manager.heartbeat(&document_id, &session) {
                    Ok(token) => {
                        stats.beats += 1;
                        stats.last_error = None;
                        tracing::trace!(
                            document_id = %document_id,
                            session = %session,
                            expires_at = ?token.expires_at,
                            "lease renewed"
                        );
                    }
                    Err(err) => {
                        stats.failures += 1;
                        tracing::warn!(
                            document_id = %document_id,
                            session = %session,
                            error = %err,
                            "heartbeat failed; retrying next interval"
                        );
                        stats.last_error = Some(err);
                    }
                }
            }

            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the thread to stop and wait for it to finish.
    /// Returns the heartbeat statistics.
    pub fn stop(mut self) -> HeartbeatStats {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or_default()
        } else {
            HeartbeatStats::default()
        }
    }

    /// Signal the thread to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for HeartbeatThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        // Don't join on drop - the thread exits at its next wakeup
    }
}
