//! Column metadata the pipeline resolves request keys against.
//!
//! Request keys are untrusted. With metadata available, a key is only used when it
//! names a known column (either its database name, e.g. `created_at`, or its camelCase
//! property name, e.g. `createdAt`). Without metadata the pipeline falls back to a
//! strict identifier check.

use sea_orm::{
    ColumnTrait, ColumnType, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn,
};

/// Coarse column type, used to bind request values with the right SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Boolean,
    Uuid,
    Date,
    DateTime,
    DateTimeTz,
    Other,
}

impl From<&ColumnType> for ColumnKind {
    fn from(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => Self::Text,
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Self::Integer,
            ColumnType::Float | ColumnType::Double => Self::Float,
            ColumnType::Boolean => Self::Boolean,
            ColumnType::Uuid => Self::Uuid,
            ColumnType::Date => Self::Date,
            ColumnType::DateTime | ColumnType::Timestamp => Self::DateTime,
            ColumnType::TimestampWithTimeZone => Self::DateTimeTz,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Database column name.
    pub name: String,
    /// API-facing camelCase name.
    pub property: String,
    pub is_primary_key: bool,
    pub kind: ColumnKind,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        let name = name.into();
        Self {
            property: to_camel_case(&name),
            name,
            is_primary_key: false,
            kind,
        }
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Whether `key` refers to this column by database or property name.
    #[must_use]
    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.property == key
    }
}

/// Ordered column list of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMetadata {
    columns: Vec<ColumnMeta>,
}

impl EntityMetadata {
    #[must_use]
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self { columns }
    }

    /// Read the column list and primary key of a Sea-ORM entity.
    #[must_use]
    pub fn of<E: EntityTrait>() -> Self {
        let primary_keys: Vec<String> = E::PrimaryKey::iter()
            .map(|key| key.into_column().as_str().to_string())
            .collect();

        let columns = E::Column::iter()
            .map(|column| {
                let name = column.as_str();
                let meta = ColumnMeta::new(name, ColumnKind::from(column.def().get_column_type()));
                if primary_keys.iter().any(|key| key == name) {
                    meta.primary_key()
                } else {
                    meta
                }
            })
            .collect();

        Self { columns }
    }

    /// Drop columns that must never be filtered, sorted on or returned.
    ///
    /// Keys are matched by database or property name.
    #[must_use]
    pub fn without(mut self, hidden: &[&str]) -> Self {
        self.columns
            .retain(|column| !hidden.iter().any(|key| column.answers_to(key)));
        self
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.iter().filter(|column| column.is_primary_key)
    }

    /// Find the column a request key refers to. Exact database names win over
    /// property names so a `created_at` / `createdAt` pair cannot shadow each other.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<&ColumnMeta> {
        self.columns
            .iter()
            .find(|column| column.name == key)
            .or_else(|| self.columns.iter().find(|column| column.property == key))
    }
}

/// A request key resolved to a concrete column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// Resolve an untrusted key to a column name.
///
/// With metadata this is an allow-list lookup. Without it only plain identifiers
/// are accepted; the name is still quoted as an identifier when rendered.
#[must_use]
pub fn resolve_column(metadata: Option<&EntityMetadata>, key: &str) -> Option<ResolvedColumn> {
    let key = key.trim();
    match metadata {
        Some(metadata) => metadata.resolve(key).map(|column| ResolvedColumn {
            name: column.name.clone(),
            kind: column.kind,
        }),
        None if is_valid_identifier(key) => Some(ResolvedColumn {
            name: key.to_string(),
            kind: ColumnKind::Other,
        }),
        None => None,
    }
}

/// Plain SQL identifier: ASCII letter or underscore, then letters, digits or
/// underscores, at most 63 bytes.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= 63
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `created_at` -> `createdAt`. Already camelCased names are returned unchanged.
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
