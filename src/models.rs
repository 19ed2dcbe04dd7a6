use std::collections::BTreeMap;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::diagnostics::Diagnostic;
use crate::filtering::pagination::{PaginationMeta, content_range};
use crate::params::{QueryParams, RawValue};

/// Query parameters for listing, filtering, searching, sorting and paging resources.
///
/// # Filtering
/// Any key that is not one of the documented parameters filters on the column of
/// that name (database or camelCase property name):
/// - **Equality:** `title=Hello`
/// - **Membership:** `tags=rust,sql`
/// - **Comparison:** `views=[>=]100`, `createdAt=[<]2024-06-01`
/// - **Range:** `createdAt=[between]2024-01-01,2024-12-31`
/// - **Null checks:** `deletedAt=[=]null`, `rating=[!=]null`
///
/// Unknown columns and malformed values are skipped, never rejected.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQueryParams {
    /// 1-based page number.
    #[param(example = "1")]
    pub page: Option<String>,
    /// Page size, capped at 100.
    #[param(example = "10")]
    pub limit: Option<String>,
    /// Comma-separated fields, `-` prefix for descending.
    #[param(example = "-createdAt,title")]
    pub sort: Option<String>,
    /// Comma-separated fields to return. Primary keys are always included.
    #[param(example = "title,slug")]
    pub fields: Option<String>,
    /// Case-insensitive text search over the resource's searchable fields.
    #[param(example = "hello")]
    pub q: Option<String>,
    /// Column filters.
    #[serde(flatten)]
    #[param(ignore)]
    pub filters: BTreeMap<String, String>,
}

impl From<ListQueryParams> for QueryParams {
    fn from(query: ListQueryParams) -> Self {
        let reserved = [
            ("page", query.page),
            ("limit", query.limit),
            ("sort", query.sort),
            ("fields", query.fields),
            ("q", query.q),
        ];

        let mut params: QueryParams = query
            .filters
            .into_iter()
            .map(|(key, value)| (key, RawValue::Text(value)))
            .collect();
        for (key, value) in reserved {
            if let Some(value) = value {
                params.insert(key, value);
            }
        }
        params
    }
}

/// One page of rows plus its [`PaginationMeta`].
///
/// Serializes as `{ "rows": [...], "meta": {...} }`. As an axum response it also
/// sets `Content-Range`.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub rows: Vec<T>,
    pub meta: PaginationMeta,
    /// Input the pipeline skipped while building the query.
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
    /// Name used in the `Content-Range` header.
    #[serde(skip)]
    pub resource: Option<&'static str>,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn with_resource(mut self, resource: &'static str) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Map each row, keeping the page bookkeeping.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            rows: self.rows.into_iter().map(f).collect(),
            meta: self.meta,
            diagnostics: self.diagnostics,
            resource: self.resource,
        }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        let headers = content_range(&self.meta, self.resource.unwrap_or("items"));
        (headers, Json(self)).into_response()
    }
}
