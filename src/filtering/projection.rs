use crate::config::ListConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::metadata::{EntityMetadata, resolve_column};
use crate::params::RawValue;
use crate::query::SortKey;

/// Work out the column list for `fields=...`.
///
/// The selection always carries the primary key(s) and every ordered column, so
/// rows stay identifiable and ordering stays valid on strict backends. Without
/// explicit fields the base is every known column. Returns `None` when projection
/// does not apply (no `fields`, no ordering) or resolves to nothing.
pub fn resolve_projection(
    fields: Option<&RawValue>,
    orderings: &[SortKey],
    metadata: Option<&EntityMetadata>,
    config: &ListConfig,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<String>> {
    let requested = match fields {
        None | Some(RawValue::Null) => None,
        Some(RawValue::Text(text)) if !text.is_empty() => Some(text.as_str()),
        Some(RawValue::Text(_)) => None,
        Some(_) => {
            diagnostics.push(Diagnostic::IgnoredParameter { key: "fields" });
            None
        }
    };

    // Without fields or metadata there is no column list to narrow to.
    if requested.is_none() && (orderings.is_empty() || metadata.is_none()) {
        return None;
    }

    let mut selection: Vec<String> = Vec::new();
    let mut add = |column: &str| {
        if !selection.iter().any(|existing| existing == column) {
            selection.push(column.to_string());
        }
    };

    match requested {
        Some(text) => {
            for field in text.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                match resolve_column(metadata, field) {
                    Some(column) => add(&column.name),
                    None => diagnostics.push(Diagnostic::UnknownField {
                        stage: "projection",
                        key: field.to_string(),
                    }),
                }
            }
        }
        None => {
            if let Some(metadata) = metadata {
                metadata.columns().iter().for_each(|column| add(&column.name));
            }
        }
    }

    match metadata {
        Some(metadata) => metadata.primary_keys().for_each(|column| add(&column.name)),
        None => add(&config.fallback_primary_key),
    }

    for key in orderings {
        add(&key.column);
    }

    if selection.is_empty() {
        diagnostics.push(Diagnostic::EmptySelection);
        return None;
    }
    Some(selection)
}
