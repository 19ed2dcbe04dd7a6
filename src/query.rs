//! The query-builder handle the pipeline stages write into.
//!
//! `ListQuery` wraps a caller-built `Select<E>` and keeps the parts the pipeline
//! owns (extra predicates, ordering, selection, window) separate until the
//! statement is assembled. Keeping them apart is what lets the pagination stage
//! count with only the WHERE clause, and lets the projection stage see which
//! columns the ordering needs.

use sea_orm::{
    Condition, ConnectionTrait, DbBackend, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select, Statement,
    sea_query::{Alias, Expr, IntoCondition, NullOrdering, SimpleExpr},
};
use serde_json::Value as JsonValue;

use crate::config::FALLBACK_ALIAS;

/// One `ORDER BY` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    /// Database column name, unqualified.
    pub column: String,
    pub direction: Order,
    pub nulls_last: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Order::Asc,
            nulls_last: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Order::Desc,
            nulls_last: false,
        }
    }

    #[must_use]
    pub fn nulls_last(mut self) -> Self {
        self.nulls_last = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ListQuery<E: EntityTrait> {
    base: Select<E>,
    alias: String,
    condition: Condition,
    orderings: Vec<SortKey>,
    selection: Option<Vec<String>>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl<E: EntityTrait> ListQuery<E> {
    /// Wrap a base query. Column references are qualified with the entity's table name.
    pub fn new(base: Select<E>) -> Self {
        let table = E::default().table_name().to_string();
        let alias = if table.is_empty() {
            tracing::warn!(
                fallback = FALLBACK_ALIAS,
                "could not determine table name for list query, using fallback alias"
            );
            FALLBACK_ALIAS.to_string()
        } else {
            table
        };
        Self::with_alias(base, alias)
    }

    /// Wrap a base query whose root table is referenced by `alias`.
    pub fn with_alias(base: Select<E>, alias: impl Into<String>) -> Self {
        Self {
            base,
            alias: alias.into(),
            condition: Condition::all(),
            orderings: Vec::new(),
            selection: None,
            offset: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// `alias.column` as an expression. Both parts are emitted as quoted identifiers.
    #[must_use]
    pub fn column_expr(&self, column: &str) -> Expr {
        Expr::col((Alias::new(self.alias.as_str()), Alias::new(column)))
    }

    /// AND a predicate (or a grouped condition) into the WHERE clause.
    pub fn and_where<C: IntoCondition>(&mut self, condition: C) -> &mut Self {
        self.condition = std::mem::replace(&mut self.condition, Condition::all())
            .add(condition.into_condition());
        self
    }

    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn add_order_by(&mut self, key: SortKey) -> &mut Self {
        self.orderings.push(key);
        self
    }

    pub fn clear_order_by(&mut self) -> &mut Self {
        self.orderings.clear();
        self
    }

    #[must_use]
    pub fn orderings(&self) -> &[SortKey] {
        &self.orderings
    }

    /// Restrict the returned columns. Names are unqualified column names.
    pub fn select(&mut self, columns: Vec<String>) -> &mut Self {
        self.selection = Some(columns);
        self
    }

    pub fn clear_selection(&mut self) -> &mut Self {
        self.selection = None;
        self
    }

    #[must_use]
    pub fn selection(&self) -> Option<&[String]> {
        self.selection.as_deref()
    }

    pub fn skip(&mut self, offset: Option<u64>) -> &mut Self {
        self.offset = offset;
        self
    }

    pub fn take(&mut self, limit: Option<u64>) -> &mut Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn window(&self) -> (Option<u64>, Option<u64>) {
        (self.offset, self.limit)
    }

    /// A copy carrying only the WHERE clause, for counting matches.
    #[must_use]
    pub fn count_query(&self) -> Self {
        let mut count = self.clone();
        count.clear_selection().clear_order_by().skip(None).take(None);
        count
    }

    /// Assemble the final Sea-ORM select.
    #[must_use]
    pub fn to_select(&self) -> Select<E> {
        let mut select = self.base.clone().filter(self.condition.clone());

        if let Some(columns) = &self.selection {
            select = select.select_only();
            for column in columns {
                select = select.expr_as(self.column_expr(column), column.as_str());
            }
        }

        for key in &self.orderings {
            let column: SimpleExpr = self.column_expr(&key.column).into();
            select = if key.nulls_last {
                select.order_by_with_nulls(column, key.direction.clone(), NullOrdering::Last)
            } else {
                select.order_by(column, key.direction.clone())
            };
        }

        select.offset(self.offset).limit(self.limit)
    }

    /// The SQL and bound values this query would run on `backend`.
    #[must_use]
    pub fn statement(&self, backend: DbBackend) -> Statement {
        self.to_select().build(backend)
    }

    fn report_failure(&self, operation: &'static str, backend: DbBackend, err: &DbErr) {
        let statement = self.statement(backend);
        tracing::error!(
            operation,
            sql = %statement.sql,
            values = ?statement.values,
            error = %err,
            "list query failed"
        );
    }
}

impl<E> ListQuery<E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    /// Number of rows matching this query as-is.
    ///
    /// # Errors
    ///
    /// Returns the database error unchanged after logging the statement.
    pub async fn count<C: ConnectionTrait>(&self, db: &C) -> Result<u64, DbErr> {
        let result = self.to_select().count(db).await;
        if let Err(err) = &result {
            self.report_failure("count", db.get_database_backend(), err);
        }
        result
    }

    /// Fetch the composed rows as JSON objects keyed by column name.
    ///
    /// # Errors
    ///
    /// Returns the database error unchanged after logging the statement.
    pub async fn all<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<JsonValue>, DbErr> {
        let result = self.to_select().into_json().all(db).await;
        if let Err(err) = &result {
            self.report_failure("fetch", db.get_database_backend(), err);
        }
        result
    }

    /// Fetch the rows together with the number of matches ignoring the window.
    ///
    /// # Errors
    ///
    /// Returns the first database error unchanged after logging the statement.
    pub async fn all_and_count<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<(Vec<JsonValue>, u64), DbErr> {
        let total = self.count_query().count(db).await?;
        let rows = self.all(db).await?;
        Ok((rows, total))
    }
}
