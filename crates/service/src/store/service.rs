use std::sync::Arc;

use chrono::Utc;
use common::pagination::{Page, PageRequest};
use models::store as store_rules;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{NewStore, SortField, Store, StorePatch, StoreQuery, StoreSort, StoreStatus};
use super::errors::StoreError;
use super::repository::StoreRepository;

/// Store service configuration
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for StoreConfig {
    fn default() -> Self { Self { default_page_size: 20, max_page_size: 100 } }
}

/// Store business service independent of web framework
pub struct StoreService<R: StoreRepository> {
    repo: Arc<R>,
    cfg: StoreConfig,
}

impl<R: StoreRepository> StoreService<R> {
    pub fn new(repo: Arc<R>, cfg: StoreConfig) -> Self { Self { repo, cfg } }

    pub fn config(&self) -> &StoreConfig { &self.cfg }

    /// Register a new store, rejecting an active duplicate of the same owner,
    /// coordinates and name.
    ///
    /// # Examples
    /// ```
    /// use service::store::{StoreService, StoreConfig, repository::mock::MockStoreRepository};
    /// use service::store::domain::NewStore;
    /// use service::store::errors::StoreError;
    /// use std::sync::Arc;
    /// let svc = StoreService::new(Arc::new(MockStoreRepository::default()), StoreConfig::default());
    /// let input = NewStore {
    ///     user_id: uuid::Uuid::new_v4(), name: "Corner Bakery".into(), category: "bakery".into(),
    ///     latitude: 37.56, longitude: 126.97, address_name: None, body: None, phone: None,
    ///     homepage: None, images: vec![],
    /// };
    /// let store = tokio_test::block_on(svc.create_store(input.clone())).unwrap();
    /// assert_eq!(store.name, "Corner Bakery");
    /// let again = tokio_test::block_on(svc.create_store(input));
    /// assert!(matches!(again, Err(StoreError::Duplicate)));
    /// ```
    #[instrument(skip(self, input), fields(user_id = %input.user_id, name = %input.name))]
    pub async fn create_store(&self, input: NewStore) -> Result<Store, StoreError> {
        store_rules::validate_name(&input.name)?;
        store_rules::validate_category(&input.category)?;
        store_rules::validate_latitude(input.latitude)?;
        store_rules::validate_longitude(input.longitude)?;

        // The partial unique index in storage still guards concurrent creates
        self.verify_not_registered(input.user_id, input.latitude, input.longitude, &input.name).await?;

        let store = self.repo.insert(input).await?;
        info!(store_id = store.id, user_id = %store.user_id, category = %store.category, "store_created");
        Ok(store)
    }

    /// Fail with `Duplicate` when an active store already has this key.
    pub async fn verify_not_registered(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
        name: &str,
    ) -> Result<(), StoreError> {
        if let Some(existing) = self
            .repo
            .find_existing(user_id, latitude, longitude, name, StoreStatus::Exists)
            .await?
        {
            debug!(store_id = existing.id, "store already registered");
            return Err(StoreError::Duplicate);
        }
        Ok(())
    }

    /// Load a store that exists and is not soft-deleted.
    #[instrument(skip(self))]
    pub async fn find_verified_store(&self, id: i64) -> Result<Store, StoreError> {
        let store = self.repo.find_by_id(id).await?.ok_or(StoreError::NotFound)?;
        if store.is_deleted() {
            debug!(store_id = id, "store is deleted");
            return Err(StoreError::NotFound);
        }
        Ok(store)
    }

    /// Owner of a verified store.
    pub async fn find_owning_user(&self, store_id: i64) -> Result<Uuid, StoreError> {
        Ok(self.find_verified_store(store_id).await?.user_id)
    }

    /// Apply a partial update to a verified store and persist it.
    ///
    /// # Examples
    /// ```
    /// use service::store::{StoreService, StoreConfig, repository::mock::MockStoreRepository};
    /// use service::store::domain::{NewStore, StorePatch};
    /// use std::sync::Arc;
    /// let svc = StoreService::new(Arc::new(MockStoreRepository::default()), StoreConfig::default());
    /// let store = tokio_test::block_on(svc.create_store(NewStore {
    ///     user_id: uuid::Uuid::new_v4(), name: "Old".into(), category: "cafe".into(),
    ///     latitude: 1.0, longitude: 2.0, address_name: None, body: None, phone: Some("010".into()),
    ///     homepage: None, images: vec![],
    /// })).unwrap();
    /// let patch = StorePatch { name: Some("New".into()), ..StorePatch::new(store.id) };
    /// let updated = tokio_test::block_on(svc.update_store(patch)).unwrap();
    /// assert_eq!(updated.name, "New");
    /// assert_eq!(updated.phone.as_deref(), Some("010"));
    /// ```
    #[instrument(skip(self, patch), fields(store_id = patch.id))]
    pub async fn update_store(&self, patch: StorePatch) -> Result<Store, StoreError> {
        let mut store = self.find_verified_store(patch.id).await?;

        if let Some(name) = &patch.name { store_rules::validate_name(name)?; }
        if let Some(category) = &patch.category { store_rules::validate_category(category)?; }
        if let Some(latitude) = patch.latitude { store_rules::validate_latitude(latitude)?; }
        if let Some(longitude) = patch.longitude { store_rules::validate_longitude(longitude)?; }

        let replaced_images = patch.images.as_ref().map(Vec::len);
        patch.apply_to(&mut store);

        let store = self.repo.persist(&store).await?;
        info!(store_id = store.id, status = ?store.status, ?replaced_images, "store_updated");
        Ok(store)
    }

    /// Soft delete: flip the status to `Deleted`.
    pub async fn delete_store(&self, id: i64) -> Result<Store, StoreError> {
        let patch = StorePatch { status: Some(StoreStatus::Deleted), updated_at: Some(Utc::now()), ..StorePatch::new(id) };
        self.update_store(patch).await
    }

    /// Page through active stores of a category, newest first or nearest first.
    #[instrument(skip(self, query), fields(sort = %query.sort, category = %query.category, page = query.page, size = query.size))]
    pub async fn find_stores(&self, query: StoreQuery) -> Result<Page<Store>, StoreError> {
        let sort: StoreSort = query.sort.parse()?;
        let page = PageRequest::new(query.page, query.size).normalize(self.cfg.max_page_size);
        if page.checked_offset().is_none() {
            return Err(StoreError::Validation(format!("page {} is out of range", query.page)));
        }

        match sort {
            StoreSort::CreatedAt => {
                self.repo
                    .find_page(StoreStatus::Exists, &query.category, page, SortField::CreatedAt, true)
                    .await
            }
            StoreSort::Distance => {
                let (Some(latitude), Some(longitude)) = (query.latitude, query.longitude) else {
                    return Err(StoreError::Validation("latitude and longitude are required for distance sort".into()));
                };
                store_rules::validate_latitude(latitude)?;
                store_rules::validate_longitude(longitude)?;

                // Ranked in storage, paginated here
                let ranked = self
                    .repo
                    .find_ranked_by_distance(longitude, latitude, &query.category, StoreStatus::Exists)
                    .await?;
                debug!(total = ranked.len(), "stores_ranked_by_distance");
                Ok(Page::slice(ranked, page))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::store::domain::{NewStoreImage, StoreImageStatus};
    use crate::store::repository::mock::MockStoreRepository;

    const KM_IN_DEGREES: f64 = 1.0 / 111.195;

    fn service() -> (Arc<MockStoreRepository>, StoreService<MockStoreRepository>) {
        let repo = Arc::new(MockStoreRepository::default());
        (repo.clone(), StoreService::new(repo, StoreConfig::default()))
    }

    fn new_store(user_id: Uuid, name: &str) -> NewStore {
        NewStore {
            user_id,
            name: name.into(),
            category: "cafe".into(),
            latitude: 37.5665,
            longitude: 126.978,
            address_name: Some("Jung-gu".into()),
            body: Some("espresso bar".into()),
            phone: Some("02-000-0000".into()),
            homepage: Some("https://example.com".into()),
            images: vec![NewStoreImage { image_url: "https://img/0.png".into() }],
        }
    }

    fn seeded(id: i64, category: &str, latitude: f64, created_minutes_ago: i64, status: StoreStatus) -> Store {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let at = base - Duration::minutes(created_minutes_ago);
        Store {
            id,
            user_id: Uuid::new_v4(),
            name: format!("store-{id}"),
            category: category.into(),
            latitude,
            longitude: 0.0,
            address_name: None,
            body: None,
            phone: None,
            homepage: None,
            status,
            created_at: at,
            updated_at: at,
            images: vec![],
        }
    }

    fn query(sort: &str, page: u64, size: u64) -> StoreQuery {
        StoreQuery { page, size, sort: sort.into(), category: "cafe".into(), latitude: Some(0.0), longitude: Some(0.0) }
    }

    #[tokio::test]
    async fn duplicate_create_rejected() {
        let (_, svc) = service();
        let owner = Uuid::new_v4();
        svc.create_store(new_store(owner, "Cafe")).await.unwrap();
        let err = svc.create_store(new_store(owner, "Cafe")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[tokio::test]
    async fn create_with_any_key_field_changed_succeeds() {
        let (repo, svc) = service();
        let owner = Uuid::new_v4();
        svc.create_store(new_store(owner, "Cafe")).await.unwrap();

        svc.create_store(new_store(Uuid::new_v4(), "Cafe")).await.unwrap();
        svc.create_store(NewStore { latitude: 37.0, ..new_store(owner, "Cafe") }).await.unwrap();
        svc.create_store(NewStore { longitude: 127.5, ..new_store(owner, "Cafe") }).await.unwrap();
        svc.create_store(new_store(owner, "Cafe Two")).await.unwrap();
        assert_eq!(repo.len(), 5);
    }

    #[tokio::test]
    async fn deleted_store_does_not_block_recreation() {
        let (_, svc) = service();
        let owner = Uuid::new_v4();
        let first = svc.create_store(new_store(owner, "Cafe")).await.unwrap();
        svc.delete_store(first.id).await.unwrap();
        let second = svc.create_store(new_store(owner, "Cafe")).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn create_validates_input() {
        let (repo, svc) = service();
        let err = svc.create_store(NewStore { latitude: 91.0, ..new_store(Uuid::new_v4(), "Cafe") }).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        let err = svc.create_store(new_store(Uuid::new_v4(), " ")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn deleted_store_is_not_found_like_missing() {
        let (repo, svc) = service();
        repo.seed(seeded(7, "cafe", 0.0, 0, StoreStatus::Deleted));

        assert!(matches!(svc.find_verified_store(7).await, Err(StoreError::NotFound)));
        assert!(matches!(svc.find_verified_store(8).await, Err(StoreError::NotFound)));
        assert!(matches!(svc.find_owning_user(7).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn owning_user_of_active_store() {
        let (_, svc) = service();
        let owner = Uuid::new_v4();
        let store = svc.create_store(new_store(owner, "Cafe")).await.unwrap();
        assert_eq!(svc.find_owning_user(store.id).await.unwrap(), owner);
    }

    #[tokio::test]
    async fn name_only_update_leaves_other_fields() {
        let (_, svc) = service();
        let before = svc.create_store(new_store(Uuid::new_v4(), "Cafe")).await.unwrap();

        let patch = StorePatch { name: Some("Renamed".into()), ..StorePatch::new(before.id) };
        let after = svc.update_store(patch).await.unwrap();

        assert_eq!(after.name, "Renamed");
        assert_eq!(Store { name: before.name.clone(), ..after }, before);
    }

    #[tokio::test]
    async fn image_update_tombstones_and_appends() {
        let (_, svc) = service();
        let before = svc.create_store(new_store(Uuid::new_v4(), "Cafe")).await.unwrap();
        assert_eq!(before.images.len(), 1);

        let patch = StorePatch {
            images: Some(vec![
                NewStoreImage { image_url: "https://img/1.png".into() },
                NewStoreImage { image_url: "https://img/2.png".into() },
            ]),
            ..StorePatch::new(before.id)
        };
        let after = svc.update_store(patch).await.unwrap();

        assert_eq!(after.images.len(), before.images.len() + 2);
        assert_eq!(after.images[0].status, StoreImageStatus::Deleted);
        assert_eq!(after.active_images().count(), 2);

        // A second replacement keeps accumulating
        let patch = StorePatch { images: Some(vec![NewStoreImage { image_url: "https://img/3.png".into() }]), ..StorePatch::new(before.id) };
        let again = svc.update_store(patch).await.unwrap();
        assert_eq!(again.images.len(), 4);
        assert_eq!(again.active_images().count(), 1);
    }

    #[tokio::test]
    async fn update_of_deleted_store_is_not_found() {
        let (repo, svc) = service();
        repo.seed(seeded(3, "cafe", 0.0, 0, StoreStatus::Deleted));
        let err = svc.update_store(StorePatch { name: Some("x".into()), ..StorePatch::new(3) }).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn invalid_patch_on_missing_store_is_not_found() {
        let (repo, svc) = service();
        repo.seed(seeded(3, "cafe", 0.0, 0, StoreStatus::Deleted));
        let blank = |id| StorePatch { name: Some(" ".into()), ..StorePatch::new(id) };
        assert!(matches!(svc.update_store(blank(3)).await, Err(StoreError::NotFound)));
        assert!(matches!(svc.update_store(blank(99)).await, Err(StoreError::NotFound)));

        let store = svc.create_store(new_store(Uuid::new_v4(), "Cafe")).await.unwrap();
        assert!(matches!(svc.update_store(blank(store.id)).await, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_hides_store() {
        let (_, svc) = service();
        let store = svc.create_store(new_store(Uuid::new_v4(), "Cafe")).await.unwrap();
        let deleted = svc.delete_store(store.id).await.unwrap();
        assert_eq!(deleted.status, StoreStatus::Deleted);
        assert!(matches!(svc.find_verified_store(store.id).await, Err(StoreError::NotFound)));
        assert!(matches!(svc.delete_store(store.id).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn distance_sort_pages_in_memory() {
        let (repo, svc) = service();
        repo.seed(seeded(1, "cafe", 1.0 * KM_IN_DEGREES, 0, StoreStatus::Exists));
        repo.seed(seeded(2, "cafe", 5.0 * KM_IN_DEGREES, 0, StoreStatus::Exists));
        repo.seed(seeded(3, "cafe", 2.0 * KM_IN_DEGREES, 0, StoreStatus::Exists));

        let page = svc.find_stores(query("distance", 0, 2)).await.unwrap();
        let ids: Vec<i64> = page.content.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);

        let page = svc.find_stores(query("distance", 1, 2)).await.unwrap();
        let ids: Vec<i64> = page.content.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(page.total_elements, 3);
    }

    #[tokio::test]
    async fn distance_sort_past_last_page_is_empty() {
        let (repo, svc) = service();
        repo.seed(seeded(1, "cafe", 0.0, 0, StoreStatus::Exists));
        let page = svc.find_stores(query("distance", 4, 10)).await.unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn distance_sort_excludes_deleted_and_other_categories() {
        let (repo, svc) = service();
        repo.seed(seeded(1, "cafe", 3.0 * KM_IN_DEGREES, 0, StoreStatus::Exists));
        repo.seed(seeded(2, "cafe", 1.0 * KM_IN_DEGREES, 0, StoreStatus::Deleted));
        repo.seed(seeded(3, "bar", 0.0, 0, StoreStatus::Exists));

        let page = svc.find_stores(query("distance", 0, 10)).await.unwrap();
        let ids: Vec<i64> = page.content.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn distance_sort_requires_coordinates() {
        let (_, svc) = service();
        let q = StoreQuery { latitude: None, ..query("distance", 0, 10) };
        assert!(matches!(svc.find_stores(q).await, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_sort_rejected() {
        let (_, svc) = service();
        let err = svc.find_stores(query("bogus", 0, 10)).await.unwrap_err();
        assert!(matches!(err, StoreError::SortNotFound(s) if s == "bogus"));
    }

    #[tokio::test]
    async fn created_at_sort_filters_and_orders_newest_first() {
        let (repo, svc) = service();
        repo.seed(seeded(1, "cafe", 0.0, 30, StoreStatus::Exists));
        repo.seed(seeded(2, "cafe", 0.0, 10, StoreStatus::Exists));
        repo.seed(seeded(3, "cafe", 0.0, 5, StoreStatus::Deleted));
        repo.seed(seeded(4, "bar", 0.0, 1, StoreStatus::Exists));
        repo.seed(seeded(5, "cafe", 0.0, 20, StoreStatus::Exists));

        let page = svc.find_stores(query("createdAt", 0, 10)).await.unwrap();
        let ids: Vec<i64> = page.content.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 5, 1]);
        assert_eq!(page.total_elements, 3);
        assert!(page.content.iter().all(|s| s.category == "cafe" && s.status == StoreStatus::Exists));
    }

    #[tokio::test]
    async fn overflowing_page_index_rejected() {
        let (repo, svc) = service();
        repo.seed(seeded(1, "cafe", 0.0, 0, StoreStatus::Exists));
        for sort in ["createdAt", "distance"] {
            let err = svc.find_stores(query(sort, u64::MAX / 2, 20)).await.unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{sort}: {err:?}");
        }
        let err = svc.find_stores(query("createdAt", i64::MAX as u64, 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn page_size_clamped_to_config() {
        let repo = Arc::new(MockStoreRepository::default());
        for id in 1..=5 {
            repo.seed(seeded(id, "cafe", 0.0, id, StoreStatus::Exists));
        }
        let svc = StoreService::new(repo, StoreConfig { default_page_size: 2, max_page_size: 3 });
        let page = svc.find_stores(query("createdAt", 0, 50)).await.unwrap();
        assert_eq!(page.content.len(), 3);
        assert_eq!(page.size, 3);
        assert_eq!(page.total_elements, 5);
    }
}
