#![allow(dead_code)]

use axum::{Router, routing::get};
use chrono::{DateTime, Duration, TimeZone, Utc};
use listcrate::ListResource;
use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use sea_orm_migration::prelude::*;

pub mod blogs {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "blogs")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        pub slug: String,
        #[sea_orm(column_type = "Text", nullable)]
        pub content: Option<String>,
        pub tags: String,
        pub views: i32,
        pub rating: Option<f64>,
        pub internal_notes: Option<String>,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Blogs;

impl ListResource for Blogs {
    type EntityType = blogs::Entity;
    const RESOURCE_NAME_PLURAL: &'static str = "blogs";

    fn searchable_fields() -> &'static [&'static str] {
        &["title", "content"]
    }

    fn hidden_fields() -> &'static [&'static str] {
        &["internalNotes"]
    }
}

/// Route `tracing` output to the test harness. `RUST_LOG=listcrate=debug` shows generated clauses.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateBlogTable)]
    }
}

pub struct CreateBlogTable;

impl MigrationName for CreateBlogTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_blog_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateBlogTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(schema.create_table_from_entity(blogs::Entity))
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(blogs::Entity).to_owned())
            .await
    }
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn setup_blog_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .route("/blogs", get(Blogs::list_handler))
        .with_state(db);

    Router::new().nest("/api/v1", api)
}

/// Creation time of the `n`th seeded blog; later blogs are newer.
pub fn created_at(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

/// A blog row with neutral defaults; override fields with struct update syntax.
pub fn blog(n: i64, title: &str, tags: &str) -> blogs::ActiveModel {
    blogs::ActiveModel {
        title: Set(title.to_string()),
        slug: Set(title.to_lowercase().replace(' ', "-")),
        content: Set(Some(format!("Body of {title}"))),
        tags: Set(tags.to_string()),
        views: Set(<i32 as TryFrom<i64>>::try_from(n * 10).unwrap()),
        rating: Set(None),
        internal_notes: Set(Some("do not publish".to_string())),
        created_at: Set(created_at(n)),
        ..Default::default()
    }
}

pub async fn seed(db: &DatabaseConnection, rows: Vec<blogs::ActiveModel>) -> Result<(), DbErr> {
    blogs::Entity::insert_many(rows).exec(db).await?;
    Ok(())
}

/// Twelve blogs tagged `a` or `b` (days 0..12) and four tagged `c` (days 20..24).
pub async fn seed_tagged(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut rows: Vec<blogs::ActiveModel> = (0..12)
        .map(|n| {
            let tag = if n % 2 == 0 { "a" } else { "b" };
            blog(n, &format!("Post {n}"), tag)
        })
        .collect();
    rows.extend((20..24).map(|n| blog(n, &format!("Other {n}"), "c")));
    seed(db, rows).await
}

/// A small, varied data set for filter and search tests.
pub async fn seed_varied(db: &DatabaseConnection) -> Result<(), DbErr> {
    seed(
        db,
        vec![
            blogs::ActiveModel {
                rating: Set(Some(4.5)),
                ..blog(1, "Hello World", "rust")
            },
            blogs::ActiveModel {
                content: Set(Some("Say HELLO to axum".to_string())),
                rating: Set(Some(3.0)),
                ..blog(2, "Axum Intro", "rust,web")
            },
            blog(3, "Cooking Pasta", "food"),
            blogs::ActiveModel {
                content: Set(None),
                ..blog(4, "100% Discount_Code", "deals")
            },
            blogs::ActiveModel {
                rating: Set(Some(5.0)),
                ..blog(5, "SQL Tips", "sql")
            },
        ],
    )
    .await
}

pub fn titles(rows: &[serde_json::Value]) -> Vec<String> {
    rows.iter()
        .map(|row| row["title"].as_str().unwrap_or_default().to_string())
        .collect()
}
