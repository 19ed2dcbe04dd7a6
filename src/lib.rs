//! # listcrate
//!
//! Turns untrusted list-endpoint query parameters into a safe, paginated
//! Sea-ORM query.
//!
//! ```text
//! GET /blogs?tags=rust,sql&createdAt=[>=]2024-01-01&q=axum&sort=-createdAt&fields=title&page=2&limit=5
//! ```
//!
//! Field names are resolved against the entity's columns before use and values
//! are always bound as parameters. Input that cannot be used is skipped and
//! reported as a [`Diagnostic`], never turned into an error.
//!
//! ```rust,ignore
//! use listcrate::QueryContext;
//!
//! let page = QueryContext::from_select(blogs::Entity::find(), params)
//!     .prepare(&["title", "content"])
//!     .execute(&db)
//!     .await?;
//!
//! println!("{} of {} blogs", page.meta.item_count, page.meta.total_items);
//! ```
//!
//! [`ListResource`] wraps the same pipeline for an axum route.

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod errors;
pub mod filtering;
pub mod metadata;
pub mod models;
pub mod params;
pub mod query;
pub mod resource;

pub use config::ListConfig;
pub use context::QueryContext;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use errors::ApiError;
pub use filtering::{PageRequest, PaginationMeta};
pub use metadata::{ColumnKind, ColumnMeta, EntityMetadata};
pub use models::{ListQueryParams, Paginated};
pub use params::{QueryParams, RawValue};
pub use query::{ListQuery, SortKey};
pub use resource::ListResource;
