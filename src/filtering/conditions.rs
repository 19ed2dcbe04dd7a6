use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{
    Value,
    sea_query::{Expr, SimpleExpr},
};
use uuid::Uuid;

use super::ParamSeq;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::metadata::{ColumnKind, EntityMetadata, ResolvedColumn, resolve_column};
use crate::params::{QueryParams, RawValue};

// Basic safety limit, same as the search term limit
const MAX_FIELD_VALUE_LENGTH: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
}

impl Comparison {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Eq => "eq",
            Self::Ne => "ne",
        }
    }
}

/// Operators accepted in the `[op]value` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Compare(Comparison),
    Between,
}

impl FilterOperator {
    /// Parse a bracketed operator token, symbolic or long form, case-insensitively.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let op = match token.trim().to_ascii_lowercase().as_str() {
            ">" | "gt" => Self::Compare(Comparison::Gt),
            ">=" | "gte" => Self::Compare(Comparison::Gte),
            "<" | "lt" => Self::Compare(Comparison::Lt),
            "<=" | "lte" => Self::Compare(Comparison::Lte),
            "=" | "eq" => Self::Compare(Comparison::Eq),
            "!=" | "ne" => Self::Compare(Comparison::Ne),
            "between" => Self::Between,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateKind {
    Compare(Comparison, Value),
    IsNull,
    IsNotNull,
    Between(Value, Value),
    In(Vec<Value>),
}

impl PredicateKind {
    const fn tag(&self) -> &'static str {
        match self {
            Self::Compare(comparison, _) => comparison.tag(),
            Self::IsNull => "null",
            Self::IsNotNull => "notnull",
            Self::Between(..) => "between",
            Self::In(_) => "in",
        }
    }
}

/// One WHERE predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Label unique within the query build.
    pub param: String,
    /// Database column name, unqualified.
    pub column: String,
    pub kind: PredicateKind,
}

impl Predicate {
    /// Render against a (qualified) column expression. Values stay bound.
    #[must_use]
    pub fn to_expr(&self, column: Expr) -> SimpleExpr {
        match &self.kind {
            PredicateKind::Compare(comparison, value) => {
                let value = value.clone();
                match comparison {
                    Comparison::Gt => column.gt(value),
                    Comparison::Gte => column.gte(value),
                    Comparison::Lt => column.lt(value),
                    Comparison::Lte => column.lte(value),
                    Comparison::Eq => column.eq(value),
                    Comparison::Ne => column.ne(value),
                }
            }
            PredicateKind::IsNull => column.is_null(),
            PredicateKind::IsNotNull => column.is_not_null(),
            PredicateKind::Between(low, high) => column.between(low.clone(), high.clone()),
            PredicateKind::In(values) => column.is_in(values.iter().cloned()),
        }
    }
}

/// Split `[op]value` into its operator token and value. Bare values yield `None`.
#[must_use]
pub fn split_operator(raw: &str) -> Option<(&str, &str)> {
    raw.strip_prefix('[')?.split_once(']')
}

/// Translate every non-reserved parameter into a predicate.
///
/// Keys that do not resolve to a column, and values that cannot be understood,
/// are skipped with a diagnostic; the remaining filters still apply.
pub fn parse_filters(
    params: &QueryParams,
    metadata: Option<&EntityMetadata>,
    seq: &mut ParamSeq,
    diagnostics: &mut Diagnostics,
) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    for (key, raw) in params.filters() {
        let Some(column) = resolve_column(metadata, key) else {
            diagnostics.push(Diagnostic::UnknownField {
                stage: "filter",
                key: key.to_string(),
            });
            continue;
        };

        if let Some(kind) = parse_value(key, &column, raw, diagnostics) {
            predicates.push(Predicate {
                param: seq.next_label(&column.name, kind.tag()),
                column: column.name,
                kind,
            });
        }
    }

    predicates
}

fn parse_value(
    key: &str,
    column: &ResolvedColumn,
    raw: &RawValue,
    diagnostics: &mut Diagnostics,
) -> Option<PredicateKind> {
    match raw {
        RawValue::Null => Some(PredicateKind::IsNull),
        RawValue::Number(number) => Some(PredicateKind::Compare(
            Comparison::Eq,
            coerce_number(column.kind, number),
        )),
        RawValue::List(items) => membership(key, column, items.iter().map(String::as_str), diagnostics),
        RawValue::Other(_) => {
            diagnostics.push(Diagnostic::UnsupportedValue { key: key.to_string() });
            None
        }
        RawValue::Text(text) if text.len() > MAX_FIELD_VALUE_LENGTH => {
            diagnostics.push(Diagnostic::UnsupportedValue { key: key.to_string() });
            None
        }
        RawValue::Text(text) => match split_operator(text) {
            Some((token, value)) => {
                let Some(operator) = FilterOperator::parse(token) else {
                    diagnostics.push(Diagnostic::UnknownOperator {
                        key: key.to_string(),
                        operator: token.to_string(),
                    });
                    return None;
                };
                operator_predicate(key, column, operator, value, diagnostics)
            }
            None if text.contains(',') => membership(key, column, text.split(','), diagnostics),
            None => Some(PredicateKind::Compare(
                Comparison::Eq,
                coerce_text(column.kind, text),
            )),
        },
    }
}

fn operator_predicate(
    key: &str,
    column: &ResolvedColumn,
    operator: FilterOperator,
    value: &str,
    diagnostics: &mut Diagnostics,
) -> Option<PredicateKind> {
    match operator {
        FilterOperator::Compare(Comparison::Eq) if is_null_literal(value) => {
            Some(PredicateKind::IsNull)
        }
        FilterOperator::Compare(Comparison::Ne) if is_null_literal(value) => {
            Some(PredicateKind::IsNotNull)
        }
        FilterOperator::Compare(comparison) => Some(PredicateKind::Compare(
            comparison,
            coerce_text(column.kind, value),
        )),
        FilterOperator::Between => {
            let parts: Vec<&str> = value.split(',').map(str::trim).collect();
            if let [low, high] = parts.as_slice()
                && !low.is_empty()
                && !high.is_empty()
            {
                Some(PredicateKind::Between(
                    coerce_text(column.kind, low),
                    coerce_text(column.kind, high),
                ))
            } else {
                diagnostics.push(Diagnostic::MalformedBetween {
                    key: key.to_string(),
                    value: value.to_string(),
                });
                None
            }
        }
    }
}

fn membership<'a>(
    key: &str,
    column: &ResolvedColumn,
    items: impl Iterator<Item = &'a str>,
    diagnostics: &mut Diagnostics,
) -> Option<PredicateKind> {
    let values: Vec<Value> = items
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| coerce_text(column.kind, item))
        .collect();

    if values.is_empty() {
        diagnostics.push(Diagnostic::EmptyMembership { key: key.to_string() });
        return None;
    }
    Some(PredicateKind::In(values))
}

fn is_null_literal(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("null")
}

/// Bind a text value with the column's SQL type when it parses as one.
///
/// Values that do not parse are bound as text unchanged; checking that a value
/// makes sense for its column is left to the database.
#[must_use]
pub fn coerce_text(kind: ColumnKind, text: &str) -> Value {
    let trimmed = text.trim();
    let typed = match kind {
        ColumnKind::Integer => trimmed.parse::<i64>().ok().map(Value::from),
        ColumnKind::Float => trimmed.parse::<f64>().ok().map(Value::from),
        ColumnKind::Boolean => parse_bool(trimmed).map(Value::from),
        ColumnKind::Uuid => Uuid::parse_str(trimmed).ok().map(Value::from),
        ColumnKind::DateTimeTz => parse_datetime_utc(trimmed).map(Value::from),
        ColumnKind::DateTime => parse_naive_datetime(trimmed).map(Value::from),
        ColumnKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .map(Value::from),
        ColumnKind::Text | ColumnKind::Other => None,
    };
    typed.unwrap_or_else(|| Value::from(text.to_string()))
}

fn coerce_number(kind: ColumnKind, number: &serde_json::Number) -> Value {
    match kind {
        ColumnKind::Text => Value::from(number.to_string()),
        ColumnKind::Float => number
            .as_f64()
            .map_or_else(|| Value::from(number.to_string()), Value::from),
        _ => number
            .as_i64()
            .map(Value::from)
            .or_else(|| number.as_f64().map(Value::from))
            .unwrap_or_else(|| Value::from(number.to_string())),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_datetime_utc(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|datetime| datetime.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_naive_datetime(text).map(|naive| naive.and_utc()))
}

fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|datetime| datetime.naive_utc())
        })
}
