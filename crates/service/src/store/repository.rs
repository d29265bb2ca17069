use async_trait::async_trait;
use common::pagination::{Page, PageRequest};
use uuid::Uuid;

use super::domain::{NewStore, SortField, Store, StoreStatus};
use super::errors::StoreError;

/// Repository abstraction for store persistence.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Store by id with all of its images, whatever its status.
    async fn find_by_id(&self, id: i64) -> Result<Option<Store>, StoreError>;

    /// Exact match on owner, coordinates and name, restricted to `status`.
    async fn find_existing(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
        name: &str,
        status: StoreStatus,
    ) -> Result<Option<Store>, StoreError>;

    async fn find_page(
        &self,
        status: StoreStatus,
        category: &str,
        page: PageRequest,
        sort: SortField,
        descending: bool,
    ) -> Result<Page<Store>, StoreError>;

    /// Every matching store, nearest to (`latitude`, `longitude`) first.
    async fn find_ranked_by_distance(
        &self,
        longitude: f64,
        latitude: f64,
        category: &str,
        status: StoreStatus,
    ) -> Result<Vec<Store>, StoreError>;

    async fn insert(&self, store: NewStore) -> Result<Store, StoreError>;

    /// Write back a mutated store: fields, image status changes and images
    /// without an id.
    async fn persist(&self, store: &Store) -> Result<Store, StoreError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use chrono::Utc;

    use crate::store::domain::{StoreImage, StoreImageStatus};
    use crate::store::geo::great_circle_km;

    #[derive(Default)]
    struct State {
        stores: BTreeMap<i64, Store>, // key: store id
        next_store_id: i64,
        next_image_id: i64,
    }

    impl State {
        fn store_id(&mut self) -> i64 {
            self.next_store_id += 1;
            self.next_store_id
        }

        fn assign_image_ids(&mut self, images: &mut [StoreImage]) {
            for image in images.iter_mut().filter(|img| img.id.is_none()) {
                self.next_image_id += 1;
                image.id = Some(self.next_image_id);
            }
        }
    }

    #[derive(Default)]
    pub struct MockStoreRepository {
        state: Mutex<State>,
    }

    impl MockStoreRepository {
        /// Insert a fully formed store as-is, keeping its id and timestamps.
        pub fn seed(&self, mut store: Store) -> Store {
            let mut state = self.state.lock().unwrap();
            state.next_store_id = state.next_store_id.max(store.id);
            state.assign_image_ids(&mut store.images);
            state.stores.insert(store.id, store.clone());
            store
        }

        pub fn len(&self) -> usize { self.state.lock().unwrap().stores.len() }

        pub fn is_empty(&self) -> bool { self.len() == 0 }
    }

    fn matches(store: &Store, status: StoreStatus, category: &str) -> bool {
        store.status == status && store.category == category
    }

    #[async_trait]
    impl StoreRepository for MockStoreRepository {
        async fn find_by_id(&self, id: i64) -> Result<Option<Store>, StoreError> {
            let state = self.state.lock().unwrap();
            Ok(state.stores.get(&id).cloned())
        }

        async fn find_existing(
            &self,
            user_id: Uuid,
            latitude: f64,
            longitude: f64,
            name: &str,
            status: StoreStatus,
        ) -> Result<Option<Store>, StoreError> {
            let state = self.state.lock().unwrap();
            Ok(state
                .stores
                .values()
                .find(|s| {
                    s.user_id == user_id
                        && s.latitude == latitude
                        && s.longitude == longitude
                        && s.name == name
                        && s.status == status
                })
                .cloned())
        }

        async fn find_page(
            &self,
            status: StoreStatus,
            category: &str,
            page: PageRequest,
            sort: SortField,
            descending: bool,
        ) -> Result<Page<Store>, StoreError> {
            let state = self.state.lock().unwrap();
            let mut rows: Vec<Store> = state.stores.values().filter(|s| matches(s, status, category)).cloned().collect();
            rows.sort_by(|a, b| {
                let ord = match sort {
                    SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                    SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                    SortField::Name => a.name.cmp(&b.name),
                };
                let ord = ord.then(a.id.cmp(&b.id));
                if descending { ord.reverse() } else { ord }
            });
            Ok(Page::slice(rows, page))
        }

        async fn find_ranked_by_distance(
            &self,
            longitude: f64,
            latitude: f64,
            category: &str,
            status: StoreStatus,
        ) -> Result<Vec<Store>, StoreError> {
            let state = self.state.lock().unwrap();
            let mut ranked: Vec<(f64, Store)> = state
                .stores
                .values()
                .filter(|s| matches(s, status, category))
                .map(|s| (great_circle_km(latitude, longitude, s.latitude, s.longitude), s.clone()))
                .collect();
            ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
            Ok(ranked.into_iter().map(|(_, s)| s).collect())
        }

        async fn insert(&self, new: NewStore) -> Result<Store, StoreError> {
            let mut state = self.state.lock().unwrap();
            let now = Utc::now();
            let mut store = Store {
                id: state.store_id(),
                user_id: new.user_id,
                name: new.name,
                category: new.category,
                latitude: new.latitude,
                longitude: new.longitude,
                address_name: new.address_name,
                body: new.body,
                phone: new.phone,
                homepage: new.homepage,
                status: StoreStatus::Exists,
                created_at: now,
                updated_at: now,
                images: new
                    .images
                    .into_iter()
                    .map(|img| StoreImage { id: None, image_url: img.image_url, status: StoreImageStatus::Exists })
                    .collect(),
            };
            state.assign_image_ids(&mut store.images);
            state.stores.insert(store.id, store.clone());
            Ok(store)
        }

        async fn persist(&self, store: &Store) -> Result<Store, StoreError> {
            let mut state = self.state.lock().unwrap();
            if !state.stores.contains_key(&store.id) {
                return Err(StoreError::NotFound);
            }
            let mut saved = store.clone();
            state.assign_image_ids(&mut saved.images);
            state.stores.insert(saved.id, saved.clone());
            Ok(saved)
        }
    }
}
