use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use common::pagination::Page;
use serde::{Deserialize, Serialize};
use service::store::domain::{NewStore, NewStoreImage, Store, StorePatch, StoreQuery};
use service::store::repository::StoreRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{errors::JsonApiError, state::AppState};

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateStoreInput {
    pub user_id: Uuid,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address_name: Option<String>,
    pub body: Option<String>,
    pub phone: Option<String>,
    pub homepage: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateStoreInput {
    /// Caller; must own the store
    pub user_id: Uuid,
    pub name: Option<String>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address_name: Option<String>,
    pub body: Option<String>,
    pub phone: Option<String>,
    pub homepage: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery { pub user_id: Uuid }

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub sort: Option<String>,
    pub category: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Public view of a store; only active images are listed.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct StoreResponse {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address_name: Option<String>,
    pub body: Option<String>,
    pub phone: Option<String>,
    pub homepage: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<String>,
}

impl From<Store> for StoreResponse {
    fn from(s: Store) -> Self {
        let images = s.active_images().map(|img| img.image_url.clone()).collect();
        Self {
            id: s.id,
            user_id: s.user_id,
            name: s.name,
            category: s.category,
            latitude: s.latitude,
            longitude: s.longitude,
            address_name: s.address_name,
            body: s.body,
            phone: s.phone,
            homepage: s.homepage,
            created_at: s.created_at,
            updated_at: s.updated_at,
            images,
        }
    }
}

fn to_images(urls: Vec<String>) -> Vec<NewStoreImage> {
    urls.into_iter().map(|image_url| NewStoreImage { image_url }).collect()
}

async fn ensure_owner<R: StoreRepository>(state: &AppState<R>, store_id: i64, user_id: Uuid) -> Result<(), JsonApiError> {
    let owner = state.stores.find_owning_user(store_id).await?;
    if owner != user_id {
        warn!(store_id, %user_id, "store_owner_mismatch");
        return Err(JsonApiError::forbidden("only the owner may modify this store"));
    }
    Ok(())
}

pub async fn create<R: StoreRepository + 'static>(
    State(state): State<AppState<R>>,
    Json(input): Json<CreateStoreInput>,
) -> Result<(StatusCode, Json<StoreResponse>), JsonApiError> {
    info!(user_id = %input.user_id, name = %input.name, category = %input.category, "store_create_request");
    let store = state
        .stores
        .create_store(NewStore {
            user_id: input.user_id,
            name: input.name,
            category: input.category,
            latitude: input.latitude,
            longitude: input.longitude,
            address_name: input.address_name,
            body: input.body,
            phone: input.phone,
            homepage: input.homepage,
            images: to_images(input.images),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(store.into())))
}

pub async fn get<R: StoreRepository + 'static>(
    State(state): State<AppState<R>>,
    Path(id): Path<i64>,
) -> Result<Json<StoreResponse>, JsonApiError> {
    let store = state.stores.find_verified_store(id).await?;
    Ok(Json(store.into()))
}

pub async fn update<R: StoreRepository + 'static>(
    State(state): State<AppState<R>>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateStoreInput>,
) -> Result<Json<StoreResponse>, JsonApiError> {
    ensure_owner(&state, id, input.user_id).await?;
    let patch = StorePatch {
        id,
        updated_at: Some(Utc::now()),
        images: input.images.map(to_images),
        latitude: input.latitude,
        longitude: input.longitude,
        category: input.category,
        name: input.name,
        address_name: input.address_name,
        body: input.body,
        phone: input.phone,
        homepage: input.homepage,
        status: None,
    };
    let store = state.stores.update_store(patch).await?;
    Ok(Json(store.into()))
}

pub async fn delete<R: StoreRepository + 'static>(
    State(state): State<AppState<R>>,
    Path(id): Path<i64>,
    Query(q): Query<OwnerQuery>,
) -> Result<StatusCode, JsonApiError> {
    ensure_owner(&state, id, q.user_id).await?;
    state.stores.delete_store(id).await?;
    info!(store_id = id, "store_deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list<R: StoreRepository + 'static>(
    State(state): State<AppState<R>>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Page<StoreResponse>>, JsonApiError> {
    let size = q.size.unwrap_or(state.stores.config().default_page_size);
    let page = state
        .stores
        .find_stores(StoreQuery {
            page: q.page.unwrap_or(0),
            size,
            sort: q.sort.unwrap_or_else(|| "createdAt".to_string()),
            category: q.category,
            latitude: q.latitude,
            longitude: q.longitude,
        })
        .await?;
    info!(count = page.content.len(), total = page.total_elements, "list stores");
    Ok(Json(page.map(StoreResponse::from)))
}
