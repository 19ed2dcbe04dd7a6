use sea_orm::sea_query::{Expr, Func, SimpleExpr};

use super::ParamSeq;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::metadata::{EntityMetadata, resolve_column};
use crate::params::RawValue;

/// Escape character for LIKE patterns. Needs no quoting on any backend.
pub const LIKE_ESCAPE: char = '!';

// Basic safety limit
const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

/// A case-insensitive substring match on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchClause {
    pub param: String,
    pub column: String,
    /// `%term%` pattern with wildcards in the term escaped. Case is left as
    /// given; the database lowers it with the same function as the column.
    pub pattern: String,
}

impl SearchClause {
    /// `LOWER(column) LIKE LOWER(pattern) ESCAPE '!'`.
    ///
    /// Both sides go through the backend's `LOWER`, so case folding agrees even
    /// where it only covers ASCII (SQLite).
    #[must_use]
    pub fn to_expr(&self, column: Expr) -> SimpleExpr {
        Expr::cust_with_exprs(
            format!("$1 LIKE LOWER($2) ESCAPE '{LIKE_ESCAPE}'"),
            [
                SimpleExpr::from(Func::lower(column)),
                Expr::val(self.pattern.as_str()).into(),
            ],
        )
    }
}

/// Build one clause per searchable field for the `q` parameter.
///
/// Returns nothing when `q` is absent or blank, or when no field resolves.
/// The caller ORs the clauses together.
pub fn parse_search(
    term: Option<&RawValue>,
    fields: &[&str],
    metadata: Option<&EntityMetadata>,
    seq: &mut ParamSeq,
    diagnostics: &mut Diagnostics,
) -> Vec<SearchClause> {
    let term = match term {
        None | Some(RawValue::Null) => return Vec::new(),
        Some(value) => match value.non_blank_text() {
            Some(text) => text,
            None => {
                if value.as_text().is_none() {
                    diagnostics.push(Diagnostic::IgnoredParameter { key: "q" });
                }
                return Vec::new();
            }
        },
    };

    if term.len() > MAX_SEARCH_QUERY_LENGTH {
        diagnostics.push(Diagnostic::IgnoredParameter { key: "q" });
        return Vec::new();
    }

    let pattern = format!("%{}%", escape_like_wildcards(term));
    let mut clauses: Vec<SearchClause> = Vec::new();

    for field in fields {
        let Some(column) = resolve_column(metadata, field) else {
            diagnostics.push(Diagnostic::UnknownField {
                stage: "search",
                key: (*field).to_string(),
            });
            continue;
        };
        if clauses.iter().any(|clause| clause.column == column.name) {
            continue;
        }
        clauses.push(SearchClause {
            param: seq.next_label(&column.name, "search"),
            column: column.name,
            pattern: pattern.clone(),
        });
    }

    clauses
}

/// Escape LIKE wildcards so the term is matched literally.
#[must_use]
pub fn escape_like_wildcards(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_') || ch == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}
