use std::sync::Arc;

use service::store::{repository::StoreRepository, StoreService};

/// Shared handler state, generic over the store repository so the router can
/// run against SeaORM or the in-memory repository.
pub struct AppState<R: StoreRepository> {
    pub stores: Arc<StoreService<R>>,
}

impl<R: StoreRepository> AppState<R> {
    pub fn new(stores: StoreService<R>) -> Self { Self { stores: Arc::new(stores) } }
}

impl<R: StoreRepository> Clone for AppState<R> {
    fn clone(&self) -> Self { Self { stores: Arc::clone(&self.stores) } }
}
