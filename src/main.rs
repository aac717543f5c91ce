//! scopecache demo runner.
//!
//! Wires the channels from environment configuration and walks through the
//! static and request channels once.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use scopecache::cache::{BackendKind, CacheChannels, ScopeSlot};
use scopecache::config::CacheSettings;

fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scopecache=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = CacheSettings::from_env();
    info!(
        enabled = settings.enabled,
        store_capacity = ?settings.store_capacity,
        default_channel = %settings.default_channel,
        "Configuration loaded"
    );

    let slot = ScopeSlot::new();
    let channels = CacheChannels::with_defaults(settings.backend_factory(Arc::new(slot.clone())));
    info!(channels = ?channels.names(), "Cache channels ready");

    let default = channels.for_kind(settings.default_channel)?;
    let greeting = default.get_or_insert_with("greeting", Some(Duration::from_secs(300)), || {
        "hello".to_string()
    })?;
    let again = default.get_or_insert_with("greeting", None, || "goodbye".to_string())?;
    info!(
        channel = %settings.default_channel,
        first = %greeting,
        second = %again,
        "Greeting resolved"
    );

    let statics = channels.for_kind(BackendKind::Static)?;
    for id in 1..=3 {
        statics.set(&format!("user:{id}"), format!("user #{id}"), None)?;
    }
    statics.set("order:1", "order #1".to_string(), None)?;
    let removed = statics.remove_by_pattern("^user:")?;
    info!(removed, remaining = ?statics.keys(), "Invalidated users");

    let request = channels.for_kind(BackendKind::Request)?;
    {
        let _scope = slot.enter();
        request.set("culture", "en-US".to_string(), None)?;
        info!(cached = request.contains("culture"), "Inside request scope");
    }
    info!(cached = request.contains("culture"), "After request scope");

    statics.clear();
    Ok(())
}
