// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use glasses_layout::application::profile_builder::ProfileBuilder;
use glasses_layout::application::profile_store::ProfileStore;
use glasses_layout::infrastructure::config::{StoreKind, load_app_config};
use glasses_layout::infrastructure::json_store::JsonProfileStore;
use glasses_layout::infrastructure::memory_store::InMemoryProfileStore;
use glasses_layout::presentation::app_state::AppState;
use glasses_layout::presentation::handlers::{
    add_field, add_screen, clear_error, create_profile, delete_profile, duplicate_profile,
    get_state, health_check, list_data_fields, remove_field, remove_screen, rename_profile,
    select_profile, select_screen, stream_state, update_field, update_profile,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;
    let settings = config.builder_settings()?;

    // Create profile store (infrastructure layer)
    let store: Arc<dyn ProfileStore> = match config.store.kind {
        StoreKind::Json => Arc::new(JsonProfileStore::new(&config.store.path)),
        StoreKind::Memory => Arc::new(InMemoryProfileStore::new()),
    };

    // Create builder (application layer) and publish the first snapshot
    let builder = Arc::new(ProfileBuilder::new(store, settings));
    builder.load().await;
    if let Some(error) = builder.snapshot().error {
        tracing::warn!("Initial profile load failed: {}", error);
    }

    let state = Arc::new(AppState { builder });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/data-fields", get(list_data_fields))
        .route("/state", get(get_state))
        .route("/state/stream", get(stream_state))
        .route("/error", delete(clear_error))
        .route("/profiles", post(create_profile))
        .route("/profiles/:id", delete(delete_profile).put(update_profile))
        .route("/profiles/:id/duplicate", post(duplicate_profile))
        .route("/profiles/:id/rename", post(rename_profile))
        .route("/profiles/:id/select", post(select_profile))
        .route("/screens", post(add_screen))
        .route("/screens/:id", delete(remove_screen))
        .route("/screens/:id/select", post(select_screen))
        .route("/screens/:id/fields", post(add_field).put(update_field))
        .route("/screens/:id/fields/:zone", delete(remove_field))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?;
    tracing::info!("Starting glasses-layout builder on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
