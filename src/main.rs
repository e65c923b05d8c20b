//! Gateway server: loads settings and the entity map, connects the row store, serves the router.

use std::sync::Arc;
use table_gateway::{app, load_entity_map, AppState, MemoryStore, PgRowStore, RowStore, Settings, StoreKind};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("table_gateway=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let entities = load_entity_map(settings.entity_map_path.as_deref(), settings.strict_entities).await?;

    let store: Arc<dyn RowStore> = match settings.store {
        StoreKind::Postgres => {
            let url = settings.database_url.as_deref().unwrap_or_default();
            let store = PgRowStore::connect(url, settings.max_connections, &settings.db_schema).await?;
            tracing::info!(schema = %settings.db_schema, "connected to postgres");
            Arc::new(store)
        }
        StoreKind::Memory => {
            let mut tables: Vec<String> = entities.table_by_path.values().cloned().collect();
            tables.sort();
            tracing::warn!(tables = ?tables, "using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::with_primary_key(&entities.primary_key, tables))
        }
    };

    tracing::info!(
        entities = ?entities.available(),
        strict = entities.strict,
        "entity map ready"
    );
    let state = AppState::new(store, entities).with_max_page_size(settings.max_page_size);
    let router = app(state, settings.body_limit);

    let listener = TcpListener::bind(settings.socket_addr()?).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
