use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors, store_image, user};

/// Lifecycle of a store row. `Deleted` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreStatus {
    #[sea_orm(string_value = "EXISTS")]
    Exists,
    #[sea_orm(string_value = "DELETED")]
    Deleted,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "store")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    pub phone: Option<String>,
    pub homepage: Option<String>,
    pub status: StoreStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
    Images,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
            Relation::Images => Entity::has_many(store_image::Entity).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl Related<store_image::Entity> for Entity {
    fn to() -> RelationDef { Relation::Images.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("store name required".into()));
    }
    Ok(())
}

pub fn validate_category(category: &str) -> Result<(), errors::ModelError> {
    if category.trim().is_empty() {
        return Err(errors::ModelError::Validation("store category required".into()));
    }
    Ok(())
}

pub fn validate_latitude(latitude: f64) -> Result<(), errors::ModelError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(errors::ModelError::Validation("latitude must be within [-90, 90]".into()));
    }
    Ok(())
}

pub fn validate_longitude(longitude: f64) -> Result<(), errors::ModelError> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(errors::ModelError::Validation("longitude must be within [-180, 180]".into()));
    }
    Ok(())
}
