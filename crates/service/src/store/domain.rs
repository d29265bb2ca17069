use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use models::store::StoreStatus;
pub use models::store_image::StoreImageStatus;

use super::errors::StoreError;

/// Image attached to a store. `id` is `None` until persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreImage {
    pub id: Option<i64>,
    pub image_url: String,
    pub status: StoreImageStatus,
}

impl StoreImage {
    pub fn is_active(&self) -> bool { self.status == StoreImageStatus::Exists }
}

/// Image supplied on create or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStoreImage {
    pub image_url: String,
}

/// Domain store (business view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
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
    pub status: StoreStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Every image ever attached, tombstoned ones included, in insertion order
    pub images: Vec<StoreImage>,
}

impl Store {
    pub fn is_deleted(&self) -> bool { self.status == StoreStatus::Deleted }

    /// Mark every current image as deleted.
    pub fn tombstone_images(&mut self) {
        for image in &mut self.images {
            image.status = StoreImageStatus::Deleted;
        }
    }

    /// Append new, not yet persisted, active images.
    pub fn append_images(&mut self, images: impl IntoIterator<Item = NewStoreImage>) {
        self.images.extend(images.into_iter().map(|img| StoreImage {
            id: None,
            image_url: img.image_url,
            status: StoreImageStatus::Exists,
        }));
    }

    pub fn active_images(&self) -> impl Iterator<Item = &StoreImage> {
        self.images.iter().filter(|img| img.is_active())
    }
}

/// Registration input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStore {
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
    pub images: Vec<NewStoreImage>,
}

/// Partial update. `None` leaves the target field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorePatch {
    pub id: i64,
    pub updated_at: Option<DateTime<Utc>>,
    pub images: Option<Vec<NewStoreImage>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub address_name: Option<String>,
    pub body: Option<String>,
    pub phone: Option<String>,
    pub homepage: Option<String>,
    pub status: Option<StoreStatus>,
}

impl StorePatch {
    pub fn new(id: i64) -> Self { Self { id, ..Default::default() } }

    /// Merge every present field into `store`.
    ///
    /// Images are replaced by tombstoning the current ones and appending the
    /// new ones, so the collection only grows.
    pub fn apply_to(self, store: &mut Store) {
        if let Some(updated_at) = self.updated_at { store.updated_at = updated_at; }
        if let Some(images) = self.images {
            store.tombstone_images();
            store.append_images(images);
        }
        if let Some(latitude) = self.latitude { store.latitude = latitude; }
        if let Some(longitude) = self.longitude { store.longitude = longitude; }
        if let Some(category) = self.category { store.category = category; }
        if let Some(name) = self.name { store.name = name; }
        if let Some(address_name) = self.address_name { store.address_name = Some(address_name); }
        if let Some(body) = self.body { store.body = Some(body); }
        if let Some(phone) = self.phone { store.phone = Some(phone); }
        if let Some(homepage) = self.homepage { store.homepage = Some(homepage); }
        if let Some(status) = self.status { store.status = status; }
    }
}

/// Listing order accepted by `find_stores`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSort {
    /// Newest first
    CreatedAt,
    /// Nearest to the query point first
    Distance,
}

impl FromStr for StoreSort {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(StoreSort::CreatedAt),
            "distance" => Ok(StoreSort::Distance),
            other => Err(StoreError::SortNotFound(other.to_string())),
        }
    }
}

/// Column a repository page query orders by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Name,
}

/// Listing input
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub page: u64,
    pub size: u64,
    pub sort: String,
    pub category: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
