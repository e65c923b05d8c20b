//! Table gateway: entity-to-table REST proxy over a row store.

pub mod client;
pub mod config;
pub mod cors;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod routing;
pub mod sql;
pub mod state;
pub mod store;

pub use client::{ClientError, GatewayClient, ListPage};
pub use config::{load_entity_map, EntityMap, GatewayConfig, Settings, StoreKind};
pub use error::{ConfigError, GatewayError, StoreError};
pub use routes::{app, common_routes, entity_routes};
pub use state::AppState;
pub use store::{MemoryStore, PgRowStore, Row, RowStore};
