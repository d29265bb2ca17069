use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::pagination::{Page, PageRequest};
use sea_orm::{
    ActiveModelTrait, ActiveValue::{NotSet, Set, Unchanged}, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, SqlErr, Statement, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use models::{store, store_image};

use crate::store::domain::{NewStore, SortField, Store, StoreImage, StoreImageStatus, StoreStatus};
use crate::store::errors::StoreError;
use crate::store::repository::StoreRepository;

/// Matching stores ordered by great-circle distance (km, Earth radius 6371)
/// from `($3, $4)` = (latitude, longitude). The cosine term is clamped so
/// rounding never pushes `acos` out of its domain.
const RANKED_BY_DISTANCE_SQL: &str = r#"SELECT * FROM store s
WHERE s.status = $1 AND s.category = $2
ORDER BY (6371 * acos(LEAST(1.0, GREATEST(-1.0,
    cos(radians($3)) * cos(radians(s.latitude)) * cos(radians(s.longitude) - radians($4))
    + sin(radians($3)) * sin(radians(s.latitude)))))) ASC, s.id ASC"#;

pub struct SeaOrmStoreRepository {
    pub db: DatabaseConnection,
}

fn repo_err(e: DbErr) -> StoreError {
    StoreError::Repository(e.to_string())
}

/// Writes hitting the active-store unique index surface as duplicates; an
/// owner id without a `user` row is a caller error.
fn write_err(e: DbErr) -> StoreError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Duplicate,
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => StoreError::Validation("unknown user".into()),
        _ => repo_err(e),
    }
}

fn to_domain(row: store::Model, images: Vec<store_image::Model>) -> Store {
    Store {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        category: row.category,
        latitude: row.latitude,
        longitude: row.longitude,
        address_name: row.address_name,
        body: row.body,
        phone: row.phone,
        homepage: row.homepage,
        status: row.status,
        created_at: row.created_at.with_timezone(&Utc),
        updated_at: row.updated_at.with_timezone(&Utc),
        images: images
            .into_iter()
            .map(|img| StoreImage { id: Some(img.id), image_url: img.image_url, status: img.status })
            .collect(),
    }
}

fn sort_column(field: SortField) -> store::Column {
    match field {
        SortField::CreatedAt => store::Column::CreatedAt,
        SortField::UpdatedAt => store::Column::UpdatedAt,
        SortField::Name => store::Column::Name,
    }
}

async fn insert_image<C: ConnectionTrait>(
    conn: &C,
    store_id: i64,
    image_url: &str,
    now: DateTime<Utc>,
) -> Result<store_image::Model, StoreError> {
    store_image::ActiveModel {
        id: NotSet,
        store_id: Set(store_id),
        image_url: Set(image_url.to_string()),
        status: Set(StoreImageStatus::Exists),
        created_at: Set(now.into()),
    }
    .insert(conn)
    .await
    .map_err(repo_err)
}

impl SeaOrmStoreRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    async fn images_of<C: ConnectionTrait>(conn: &C, store_id: i64) -> Result<Vec<store_image::Model>, StoreError> {
        store_image::Entity::find()
            .filter(store_image::Column::StoreId.eq(store_id))
            .order_by_asc(store_image::Column::Id)
            .all(conn)
            .await
            .map_err(repo_err)
    }

    /// Load images for a batch of rows with one query, preserving row order.
    async fn with_images(&self, rows: Vec<store::Model>) -> Result<Vec<Store>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let images = store_image::Entity::find()
            .filter(store_image::Column::StoreId.is_in(ids))
            .order_by_asc(store_image::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_err)?;
        let mut by_store: HashMap<i64, Vec<store_image::Model>> = HashMap::new();
        for img in images {
            by_store.entry(img.store_id).or_default().push(img);
        }
        Ok(rows
            .into_iter()
            .map(|row| {
                let images = by_store.remove(&row.id).unwrap_or_default();
                to_domain(row, images)
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl StoreRepository for SeaOrmStoreRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Store>, StoreError> {
        let Some(row) = store::Entity::find_by_id(id).one(&self.db).await.map_err(repo_err)? else {
            return Ok(None);
        };
        let images = Self::images_of(&self.db, row.id).await?;
        Ok(Some(to_domain(row, images)))
    }

    async fn find_existing(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
        name: &str,
        status: StoreStatus,
    ) -> Result<Option<Store>, StoreError> {
        let row = store::Entity::find()
            .filter(store::Column::UserId.eq(user_id))
            .filter(store::Column::Latitude.eq(latitude))
            .filter(store::Column::Longitude.eq(longitude))
            .filter(store::Column::Name.eq(name.to_string()))
            .filter(store::Column::Status.eq(status))
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        match row {
            Some(row) => Ok(self.with_images(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_page(
        &self,
        status: StoreStatus,
        category: &str,
        page: PageRequest,
        sort: SortField,
        descending: bool,
    ) -> Result<Page<Store>, StoreError> {
        // fetch_page multiplies page by size unchecked
        if page.checked_offset().is_none() {
            return Err(StoreError::Validation(format!("page {} is out of range", page.page)));
        }
        let order = if descending { Order::Desc } else { Order::Asc };
        let paginator = store::Entity::find()
            .filter(store::Column::Status.eq(status))
            .filter(store::Column::Category.eq(category.to_string()))
            .order_by(sort_column(sort), order.clone())
            .order_by(store::Column::Id, order)
            .paginate(&self.db, page.size);
        let total = paginator.num_items().await.map_err(repo_err)?;
        let rows = paginator.fetch_page(page.page).await.map_err(repo_err)?;
        debug!(total, rows = rows.len(), page = page.page, "store_page_fetched");
        Ok(Page::new(self.with_images(rows).await?, page, total))
    }

    async fn find_ranked_by_distance(
        &self,
        longitude: f64,
        latitude: f64,
        category: &str,
        status: StoreStatus,
    ) -> Result<Vec<Store>, StoreError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            RANKED_BY_DISTANCE_SQL,
            [status.into(), category.into(), latitude.into(), longitude.into()],
        );
        let rows = store::Entity::find()
            .from_raw_sql(stmt)
            .all(&self.db)
            .await
            .map_err(repo_err)?;
        self.with_images(rows).await
    }

    async fn insert(&self, new: NewStore) -> Result<Store, StoreError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        let now = Utc::now();
        let row = store::ActiveModel {
            id: NotSet,
            user_id: Set(new.user_id),
            name: Set(new.name),
            category: Set(new.category),
            latitude: Set(new.latitude),
            longitude: Set(new.longitude),
            address_name: Set(new.address_name),
            body: Set(new.body),
            phone: Set(new.phone),
            homepage: Set(new.homepage),
            status: Set(StoreStatus::Exists),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(write_err)?;

        let mut images = Vec::with_capacity(new.images.len());
        for img in &new.images {
            images.push(insert_image(&txn, row.id, &img.image_url, now).await?);
        }
        txn.commit().await.map_err(repo_err)?;
        Ok(to_domain(row, images))
    }

    async fn persist(&self, s: &Store) -> Result<Store, StoreError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        let row = store::ActiveModel {
            id: Unchanged(s.id),
            user_id: Unchanged(s.user_id),
            name: Set(s.name.clone()),
            category: Set(s.category.clone()),
            latitude: Set(s.latitude),
            longitude: Set(s.longitude),
            address_name: Set(s.address_name.clone()),
            body: Set(s.body.clone()),
            phone: Set(s.phone.clone()),
            homepage: Set(s.homepage.clone()),
            status: Set(s.status),
            created_at: Unchanged(s.created_at.into()),
            updated_at: Set(s.updated_at.into()),
        }
        .update(&txn)
        .await
        .map_err(|e| match e {
            DbErr::RecordNotUpdated => StoreError::NotFound,
            other => write_err(other),
        })?;

        let tombstoned: Vec<i64> = s
            .images
            .iter()
            .filter(|img| img.status == StoreImageStatus::Deleted)
            .filter_map(|img| img.id)
            .collect();
        if !tombstoned.is_empty() {
            // Only rows still active are touched
            let res = store_image::Entity::update_many()
                .set(store_image::ActiveModel { status: Set(StoreImageStatus::Deleted), ..Default::default() })
                .filter(store_image::Column::StoreId.eq(row.id))
                .filter(store_image::Column::Status.eq(StoreImageStatus::Exists))
                .filter(store_image::Column::Id.is_in(tombstoned))
                .exec(&txn)
                .await
                .map_err(repo_err)?;
            debug!(store_id = row.id, rows = res.rows_affected, "store_images_tombstoned");
        }

        let now = Utc::now();
        for image in s.images.iter().filter(|img| img.id.is_none()) {
            insert_image(&txn, row.id, &image.image_url, now).await?;
        }
        let images = Self::images_of(&txn, row.id).await?;
        txn.commit().await.map_err(repo_err)?;
        debug!(store_id = row.id, images = images.len(), "store_persisted");
        Ok(to_domain(row, images))
    }
}
