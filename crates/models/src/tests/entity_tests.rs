use crate::db::connect;
use crate::{store, store_image, user};
use crate::store::StoreStatus;
use crate::store_image::StoreImageStatus;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set};
use anyhow::Result;
use chrono::Utc;
use migration::MigratorTrait;
use uuid::Uuid;

/// Connect and migrate; `None` when no database is reachable.
async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let db = match connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}

fn new_store(user_id: Uuid, name: &str) -> store::ActiveModel {
    let now = Utc::now().into();
    store::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        category: Set("cafe".into()),
        latitude: Set(37.5665),
        longitude: Set(126.9780),
        address_name: Set(Some("Jung-gu, Seoul".into())),
        body: Set(None),
        phone: Set(None),
        homepage: Set(None),
        status: Set(StoreStatus::Exists),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

#[tokio::test]
async fn store_with_images_round_trip() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let owner = user::create(&db, &format!("owner_{}@example.com", Uuid::new_v4()), "Owner").await?;
    let created = new_store(owner.id, &format!("store_{}", Uuid::new_v4())).insert(&db).await?;
    assert!(created.id > 0);
    assert_eq!(created.status, StoreStatus::Exists);

    let image = store_image::ActiveModel {
        store_id: Set(created.id),
        image_url: Set("https://img.example.com/1.png".into()),
        status: Set(StoreImageStatus::Exists),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    let images = created.find_related(store_image::Entity).all(&db).await?;
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, image.id);

    let owned = store::Entity::find()
        .filter(store::Column::UserId.eq(owner.id))
        .all(&db)
        .await?;
    assert_eq!(owned.len(), 1);

    user::Entity::delete_by_id(owner.id).exec(&db).await?;
    let gone = store::Entity::find_by_id(created.id).one(&db).await?;
    assert!(gone.is_none(), "store rows cascade with their owner");
    Ok(())
}

#[tokio::test]
async fn active_duplicate_rejected_by_unique_index() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let owner = user::create(&db, &format!("dup_{}@example.com", Uuid::new_v4()), "Owner").await?;
    let name = format!("dup_store_{}", Uuid::new_v4());
    let first = new_store(owner.id, &name).insert(&db).await?;

    let err = new_store(owner.id, &name).insert(&db).await.unwrap_err();
    assert!(matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))));

    // A deleted row no longer blocks the same key
    let mut deleted: store::ActiveModel = first.into();
    deleted.status = Set(StoreStatus::Deleted);
    deleted.update(&db).await?;
    new_store(owner.id, &name).insert(&db).await?;

    user::Entity::delete_by_id(owner.id).exec(&db).await?;
    Ok(())
}
