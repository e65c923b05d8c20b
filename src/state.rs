//! Shared application state for all routes. Built once at startup.

use crate::config::EntityMap;
use crate::store::RowStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RowStore>,
    pub entities: Arc<EntityMap>,
    pub max_page_size: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn RowStore>, entities: EntityMap) -> Self {
        AppState {
            store,
            entities: Arc::new(entities),
            max_page_size: 1000,
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }
}
