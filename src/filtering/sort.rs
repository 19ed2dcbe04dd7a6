use sea_orm::Order;

use crate::config::ListConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::metadata::{EntityMetadata, resolve_column};
use crate::params::RawValue;
use crate::query::SortKey;

/// Split one `sort` token into field and direction. A leading `-` means descending.
fn parse_token(token: &str) -> Option<(&str, Order)> {
    let token = token.trim();
    let (field, order) = match token.strip_prefix('-') {
        Some(rest) => (rest.trim(), Order::Desc),
        None => (token, Order::Asc),
    };
    (!field.is_empty()).then_some((field, order))
}

/// Resolve an explicit `sort` parameter such as `-createdAt,title`.
///
/// Returns `None` when the parameter is absent, not a string, or resolves to no
/// column; the caller then keeps the existing ordering or applies the default.
/// Every key sorts nulls last. A field listed twice keeps its first position and
/// takes the later direction.
pub fn parse_sort(
    raw: Option<&RawValue>,
    metadata: Option<&EntityMetadata>,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<SortKey>> {
    let text = match raw? {
        RawValue::Null => return None,
        RawValue::Text(text) if !text.is_empty() => text,
        RawValue::Text(_) => return None,
        _ => {
            diagnostics.push(Diagnostic::IgnoredParameter { key: "sort" });
            return None;
        }
    };

    let mut keys: Vec<SortKey> = Vec::new();
    for (field, direction) in text.split(',').filter_map(parse_token) {
        let Some(column) = resolve_column(metadata, field) else {
            diagnostics.push(Diagnostic::UnknownField {
                stage: "sort",
                key: field.to_string(),
            });
            continue;
        };

        match keys.iter_mut().find(|key| key.column == column.name) {
            Some(existing) => existing.direction = direction,
            None => keys.push(SortKey {
                column: column.name,
                direction,
                nulls_last: true,
            }),
        }
    }

    (!keys.is_empty()).then_some(keys)
}

/// The ordering used when neither the request nor the base query gives one:
/// the configured timestamp property descending, else the first primary key.
pub fn default_sort(
    metadata: Option<&EntityMetadata>,
    config: &ListConfig,
    diagnostics: &mut Diagnostics,
) -> Option<SortKey> {
    let Some(metadata) = metadata else {
        diagnostics.push(Diagnostic::MetadataUnavailable { stage: "sort" });
        return None;
    };

    if let Some(column) = metadata.resolve(&config.default_sort_property) {
        return Some(SortKey::desc(column.name.as_str()).nulls_last());
    }

    metadata
        .primary_keys()
        .next()
        .map(|column| SortKey::asc(column.name.as_str()))
}
