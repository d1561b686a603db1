//! SyncCoordinator integration tests.
//!
//! Drives saves, edit sessions, snapshots and local fallback against
//! in-memory stores, with fault injection for unreachable or slow remotes.

mod support;
mod saves;
mod fallback;
