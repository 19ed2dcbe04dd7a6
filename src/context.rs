//! # Query context
//!
//! A [`QueryContext`] owns one [`ListQuery`] for one request together with the raw
//! request parameters. Each stage consumes the context, writes its part of the
//! query and hands the context back:
//!
//! ```rust,ignore
//! let page = QueryContext::from_select(blogs::Entity::find(), params)
//!     .filter()
//!     .search(&["title", "content"])
//!     .sort()
//!     .limit_fields()
//!     .paginate(&db)
//!     .await?
//!     .execute(&db)
//!     .await?;
//! ```
//!
//! Projection runs after sorting because the selection must contain every
//! ordered column. Pagination runs last and counts with the WHERE clause only.

use sea_orm::{
    Condition, ConnectionTrait, DbBackend, DbErr, EntityTrait, Select, Statement,
};
use serde_json::Value as JsonValue;

use crate::config::ListConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::filtering::{
    PageRequest, PaginationMeta, ParamSeq, default_sort, parse_filters, parse_search, parse_sort,
    resolve_projection,
};
use crate::metadata::EntityMetadata;
use crate::models::Paginated;
use crate::params::QueryParams;
use crate::query::ListQuery;

#[derive(Debug, Clone)]
pub struct QueryContext<E: EntityTrait> {
    query: ListQuery<E>,
    params: QueryParams,
    metadata: Option<EntityMetadata>,
    config: ListConfig,
    seq: ParamSeq,
    diagnostics: Diagnostics,
    pagination_meta: Option<PaginationMeta>,
}

impl<E: EntityTrait> QueryContext<E> {
    /// Wrap a query handle. Metadata is read from `E`; use
    /// [`with_metadata`](Self::with_metadata) to narrow or drop it.
    pub fn new(query: ListQuery<E>, params: impl Into<QueryParams>) -> Self {
        Self {
            query,
            params: params.into(),
            metadata: Some(EntityMetadata::of::<E>()),
            config: ListConfig::default(),
            seq: ParamSeq::default(),
            diagnostics: Diagnostics::default(),
            pagination_meta: None,
        }
    }

    pub fn from_select(select: Select<E>, params: impl Into<QueryParams>) -> Self {
        Self::new(ListQuery::new(select), params)
    }

    /// Replace the column metadata. `None` switches every stage to its degraded
    /// policy: identifier checks instead of the allow-list, no default sort,
    /// primary key assumed from the config.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Option<EntityMetadata>) -> Self {
        if metadata.is_none() {
            self.diagnostics
                .push(Diagnostic::MetadataUnavailable { stage: "context" });
        }
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ListConfig) -> Self {
        self.config = config;
        self
    }

    /// AND one predicate per filter parameter into the WHERE clause.
    #[must_use]
    pub fn filter(mut self) -> Self {
        let predicates = parse_filters(
            &self.params,
            self.metadata.as_ref(),
            &mut self.seq,
            &mut self.diagnostics,
        );

        for predicate in predicates {
            tracing::debug!(
                param = %predicate.param,
                column = %predicate.column,
                kind = ?predicate.kind,
                "filter predicate"
            );
            let expr = predicate.to_expr(self.query.column_expr(&predicate.column));
            self.query.and_where(expr);
        }
        self
    }

    /// AND an OR-group of case-insensitive substring matches of `q` over `fields`.
    #[must_use]
    pub fn search(mut self, fields: &[&str]) -> Self {
        let clauses = parse_search(
            self.params.get("q"),
            fields,
            self.metadata.as_ref(),
            &mut self.seq,
            &mut self.diagnostics,
        );
        if clauses.is_empty() {
            return self;
        }

        let group = clauses.iter().fold(Condition::any(), |group, clause| {
            tracing::debug!(param = %clause.param, column = %clause.column, "search clause");
            group.add(clause.to_expr(self.query.column_expr(&clause.column)))
        });
        self.query.and_where(group);
        self
    }

    /// Apply `sort`, or the default ordering when neither the request nor the
    /// query already orders the rows.
    #[must_use]
    pub fn sort(mut self) -> Self {
        if let Some(keys) = parse_sort(
            self.params.get("sort"),
            self.metadata.as_ref(),
            &mut self.diagnostics,
        ) {
            self.query.clear_order_by();
            for key in keys {
                tracing::debug!(column = %key.column, direction = ?key.direction, "sort key");
                self.query.add_order_by(key);
            }
        } else if self.query.orderings().is_empty()
            && let Some(key) =
                default_sort(self.metadata.as_ref(), &self.config, &mut self.diagnostics)
        {
            tracing::debug!(column = %key.column, direction = ?key.direction, "default sort key");
            self.query.add_order_by(key);
        }
        self
    }

    /// Restrict the selection to `fields`, plus primary keys and ordered columns.
    #[must_use]
    pub fn limit_fields(mut self) -> Self {
        if let Some(columns) = resolve_projection(
            self.params.get("fields"),
            self.query.orderings(),
            self.metadata.as_ref(),
            &self.config,
            &mut self.diagnostics,
        ) {
            tracing::debug!(columns = ?columns, "projection");
            self.query.select(columns);
        }
        self
    }

    /// Filter, search, sort and projection in their required order.
    #[must_use]
    pub fn prepare(self, searchable_fields: &[&str]) -> Self {
        self.filter()
            .search(searchable_fields)
            .sort()
            .limit_fields()
    }

    #[must_use]
    pub fn query(&self) -> &ListQuery<E> {
        &self.query
    }

    #[must_use]
    pub fn into_query(self) -> ListQuery<E> {
        self.query
    }

    #[must_use]
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&EntityMetadata> {
        self.metadata.as_ref()
    }

    /// Set once [`paginate`](Self::paginate) has succeeded.
    #[must_use]
    pub fn pagination_meta(&self) -> Option<&PaginationMeta> {
        self.pagination_meta.as_ref()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    /// The statement the terminal fetch would run on `backend`.
    #[must_use]
    pub fn statement(&self, backend: DbBackend) -> Statement {
        self.query.statement(backend)
    }
}

impl<E> QueryContext<E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    /// Count the matches, then apply the page window.
    ///
    /// # Errors
    ///
    /// Returns the count query's database error; no metadata is recorded then.
    pub async fn paginate<C: ConnectionTrait>(mut self, db: &C) -> Result<Self, DbErr> {
        let request = PageRequest::from_params(&self.params, &self.config);
        let total_items = self.query.count_query().count(db).await?;

        self.query
            .skip(Some(request.offset()))
            .take(Some(request.limit));

        let meta = PaginationMeta::new(request, total_items);
        tracing::debug!(
            page = meta.current_page,
            limit = meta.items_per_page,
            offset = request.offset(),
            total_items,
            "page window"
        );
        self.pagination_meta = Some(meta);
        Ok(self)
    }

    /// Rows of the composed query.
    ///
    /// # Errors
    ///
    /// Returns the database error after logging the statement.
    pub async fn get_many<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<JsonValue>, DbErr> {
        self.query.all(db).await
    }

    /// Rows plus the number of matches ignoring the page window.
    ///
    /// # Errors
    ///
    /// Returns the database error after logging the statement.
    pub async fn get_many_and_count<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<(Vec<JsonValue>, u64), DbErr> {
        self.query.all_and_count(db).await
    }

    /// Paginate if that has not happened yet, then fetch the page.
    ///
    /// # Errors
    ///
    /// Returns the first database error.
    pub async fn execute<C: ConnectionTrait>(self, db: &C) -> Result<Paginated<JsonValue>, DbErr> {
        let context = match self.pagination_meta {
            Some(_) => self,
            None => self.paginate(db).await?,
        };
        let rows = context.get_many(db).await?;
        let meta = context
            .pagination_meta
            .ok_or_else(|| DbErr::Custom("pagination metadata missing after paginate".into()))?;

        Ok(Paginated {
            rows,
            meta,
            diagnostics: context.diagnostics.into_vec(),
            resource: None,
        })
    }
}
