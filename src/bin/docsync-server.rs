//! Reference server: in-memory version store and lock manager over HTTP.
//!
//! Environment:
//! - `DOCSYNC_ADDR` - listen address, default `127.0.0.1:5000`
//! - `DOCSYNC_CONFIG` - path to a JSON [`SyncConfig`]; defaults apply when unset
//! - `RUST_LOG` - tracing filter, default `info`

use std::sync::Arc;

use docsync::http::{self, HttpState};
use docsync::{InMemoryLockManager, InMemoryVersionStore, SyncConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:5000";

fn load_config() -> Result<SyncConfig, Box<dyn std::error::Error>> {
    match std::env::var("DOCSYNC_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let config = SyncConfig::from_json(&raw)?;
            tracing::info!(%path, "loaded config");
            Ok(config)
        }
        Err(_) => Ok(SyncConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let addr = std::env::var("DOCSYNC_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    tracing::info!(
        lock_ttl_ms = config.lock_ttl_ms,
        heartbeat_ms = config.heartbeat_interval().as_millis() as u64,
        "starting docsync server"
    );

    let state = HttpState::new(
        Arc::new(InMemoryVersionStore::new()),
        Arc::new(InMemoryLockManager::with_ttl(config.lock_ttl())),
    );
    http::serve(state, &addr).await?;
    Ok(())
}
