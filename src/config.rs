//! Tunables for list queries.

/// Query parameter keys that drive the pipeline itself and are never treated as filters.
pub const RESERVED_KEYS: [&str; 5] = ["page", "limit", "sort", "fields", "q"];

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
pub const DEFAULT_SORT_PROPERTY: &str = "createdAt";
pub const FALLBACK_ALIAS: &str = "entity";
pub const FALLBACK_PRIMARY_KEY: &str = "id";

/// Returns `true` for keys consumed by the pipeline rather than the filter stage.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Per-resource list configuration.
///
/// The defaults match the documented query contract: ten items per page, at most
/// one hundred, newest first when a `createdAt` column exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListConfig {
    /// Page size used when `limit` is absent or not numeric.
    pub default_limit: u64,
    /// Upper bound applied to any requested `limit`.
    pub max_limit: u64,
    /// Property preferred for the default descending sort.
    pub default_sort_property: String,
    /// Primary key assumed when no entity metadata is available.
    pub fallback_primary_key: String,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            default_sort_property: DEFAULT_SORT_PROPERTY.to_string(),
            fallback_primary_key: FALLBACK_PRIMARY_KEY.to_string(),
        }
    }
}

impl ListConfig {
    /// Set the upper bound for `limit`. Values below one are raised to one, and the
    /// default limit is lowered if it would exceed the new bound.
    #[must_use]
    pub fn with_max_limit(mut self, max_limit: u64) -> Self {
        self.max_limit = max_limit.max(1);
        self.default_limit = self.default_limit.min(self.max_limit);
        self
    }

    /// Set the page size used when the request does not give one.
    #[must_use]
    pub fn with_default_limit(mut self, default_limit: u64) -> Self {
        self.default_limit = default_limit.clamp(1, self.max_limit);
        self
    }

    #[must_use]
    pub fn with_default_sort_property(mut self, property: impl Into<String>) -> Self {
        self.default_sort_property = property.into();
        self
    }
}
