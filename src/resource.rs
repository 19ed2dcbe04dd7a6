use async_trait::async_trait;
use axum::extract::{Query, State, rejection::QueryRejection};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Select};
use serde_json::Value as JsonValue;

use crate::config::ListConfig;
use crate::context::QueryContext;
use crate::errors::ApiError;
use crate::metadata::EntityMetadata;
use crate::models::Paginated;
use crate::params::QueryParams;

/// A listable resource backed by one Sea-ORM entity.
///
/// Implementors only name the entity and the resource; the defaults run the full
/// filter, search, sort, projection and pagination pipeline.
///
/// ```rust,ignore
/// struct Blogs;
///
/// impl ListResource for Blogs {
///     type EntityType = blogs::Entity;
///     const RESOURCE_NAME_PLURAL: &'static str = "blogs";
///
///     fn searchable_fields() -> &'static [&'static str] {
///         &["title", "content"]
///     }
/// }
///
/// let app = Router::new()
///     .route("/blogs", get(Blogs::list_handler))
///     .with_state(db);
/// ```
#[async_trait]
pub trait ListResource: Send + Sync
where
    <Self::EntityType as EntityTrait>::Model: Sync,
{
    type EntityType: EntityTrait + Sync;

    const RESOURCE_NAME_PLURAL: &'static str;

    /// Columns `q` is matched against.
    #[must_use]
    fn searchable_fields() -> &'static [&'static str] {
        &[]
    }

    /// Columns that can never be filtered, sorted on or selected.
    #[must_use]
    fn hidden_fields() -> &'static [&'static str] {
        &[]
    }

    /// Query the pipeline starts from, e.g. with a tenant filter already applied.
    #[must_use]
    fn base_query() -> Select<Self::EntityType> {
        Self::EntityType::find()
    }

    #[must_use]
    fn metadata() -> Option<EntityMetadata> {
        Some(EntityMetadata::of::<Self::EntityType>().without(Self::hidden_fields()))
    }

    #[must_use]
    fn list_config() -> ListConfig {
        ListConfig::default()
    }

    /// Key for caching one list response.
    #[must_use]
    fn cache_key(params: &QueryParams) -> String {
        params.cache_key(Self::RESOURCE_NAME_PLURAL)
    }

    /// One page of rows for `params`.
    async fn list(
        db: &DatabaseConnection,
        params: QueryParams,
    ) -> Result<Paginated<JsonValue>, DbErr> {
        let page = QueryContext::from_select(Self::base_query(), params)
            .with_metadata(Self::metadata())
            .with_config(Self::list_config())
            .prepare(Self::searchable_fields())
            .execute(db)
            .await?;
        Ok(page.with_resource(Self::RESOURCE_NAME_PLURAL))
    }

    /// `GET` handler: the page as JSON with a `Content-Range` header.
    async fn list_handler(
        state: State<DatabaseConnection>,
        query: Result<Query<QueryParams>, QueryRejection>,
    ) -> Result<Paginated<JsonValue>, ApiError> {
        let Query(params) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self::list(&state.0, params).await?)
    }
}
