//! # Query parameter translation
//!
//! Each submodule turns one part of the untrusted parameter map into query parts:
//!
//! - [`conditions`]: `field=[op]value` filters into WHERE predicates
//! - [`search`]: `q=term` into an OR-group of case-insensitive substring matches
//! - [`sort`]: `sort=-createdAt,title` into an ordering, with a metadata default
//! - [`projection`]: `fields=title,slug` into a column selection
//! - [`pagination`]: `page`/`limit` into a window and [`PaginationMeta`]
//!
//! ## Filter syntax
//!
//! ```text
//! GET /blogs?title=Hello                       title = 'Hello'
//! GET /blogs?tags=rust,sql                     tags IN ('rust', 'sql')
//! GET /blogs?views=[>=]100                     views >= 100
//! GET /blogs?createdAt=[between]2024-01-01,2024-12-31
//! GET /blogs?deletedAt=[=]null                 deleted_at IS NULL
//! GET /blogs?rating=[ne]null                   rating IS NOT NULL
//! GET /blogs?q=axum&sort=-createdAt&fields=title,slug&page=2&limit=5
//! ```
//!
//! Every value is bound as a query parameter. Field names are only used after
//! they resolve to a known column and are always emitted as quoted identifiers.

pub mod conditions;
pub mod pagination;
pub mod projection;
pub mod search;
pub mod sort;

pub use conditions::{Comparison, FilterOperator, Predicate, PredicateKind, parse_filters};
pub use pagination::{PageRequest, PaginationMeta};
pub use projection::resolve_projection;
pub use search::{SearchClause, parse_search};
pub use sort::{default_sort, parse_sort};

/// Hands out parameter labels that are unique within one query build.
///
/// Labels look like `created_at_gte_3`: column, operator tag, sequence number.
/// They identify predicates in logs and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ParamSeq(usize);

impl ParamSeq {
    pub fn next_label(&mut self, column: &str, tag: &str) -> String {
        let label = format!("{column}_{tag}_{}", self.0);
        self.0 += 1;
        label
    }
}
