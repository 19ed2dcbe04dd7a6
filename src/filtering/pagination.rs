use axum::http::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::ListConfig;
use crate::params::{QueryParams, RawValue};

/// Largest offset any backend binds as a signed 64-bit integer.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Normalized `page` / `limit` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number, at least 1.
    pub page: u64,
    /// Page size, between 1 and the configured maximum.
    pub limit: u64,
}

impl PageRequest {
    /// Read `page` and `limit` from the request.
    ///
    /// Text is read like a leading integer (`"2abc"` is 2); text without one, or
    /// whose integer is 0, falls back to the default. Numbers are floored. Other
    /// zero and negative values are raised to 1, and `limit` is capped at
    /// `config.max_limit`.
    #[must_use]
    pub fn from_params(params: &QueryParams, config: &ListConfig) -> Self {
        let page = read_integer(params.get("page")).map_or(1, at_least_one);
        let limit = read_integer(params.get("limit"))
            .map_or(config.default_limit, at_least_one)
            .clamp(1, config.max_limit.max(1));
        Self { page, limit }
    }

    /// Rows to skip, capped so it always binds as a signed 64-bit value.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = self.page.saturating_sub(1).saturating_mul(self.limit);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }
}

fn at_least_one(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0).max(1)
}

#[allow(clippy::cast_possible_truncation)]
fn read_integer(value: Option<&RawValue>) -> Option<i64> {
    match value? {
        RawValue::Text(text) => parse_leading_integer(text).filter(|value| *value != 0),
        RawValue::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite())
                .map(|float| float.floor() as i64)
        }),
        _ => None,
    }
}

/// `" 12abc"` -> 12, `"-3"` -> -3, `"abc"` -> None. Overlong digit runs saturate.
fn parse_leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit);

    let mut value: i64 = 0;
    let mut seen = false;
    for digit in digits {
        seen = true;
        value = value.saturating_mul(10).saturating_add(i64::from(digit - b'0'));
    }
    seen.then_some(if negative { -value } else { value })
}

/// Page bookkeeping returned next to the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Rows on this page.
    #[schema(example = 10)]
    pub item_count: u64,
    /// Rows matching the filters across all pages.
    #[schema(example = 57)]
    pub total_items: u64,
    #[schema(example = 10)]
    pub items_per_page: u64,
    /// At least 1, even when nothing matches.
    #[schema(example = 6)]
    pub total_pages: u64,
    #[schema(example = 1)]
    pub current_page: u64,
    #[schema(example = true)]
    pub has_next_page: bool,
    #[schema(example = false)]
    pub has_prev_page: bool,
}

impl PaginationMeta {
    #[must_use]
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        let limit = request.limit.max(1);
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(limit)
        };
        let item_count = total_items.saturating_sub(request.offset()).min(limit);

        Self {
            item_count,
            total_items,
            items_per_page: limit,
            total_pages,
            current_page: request.page,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }

    /// Zero-based offset of the first row on this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.current_page
            .saturating_sub(1)
            .saturating_mul(self.items_per_page)
    }
}

/// Remove control characters so a resource name is safe in a header value.
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// `Content-Range: blogs 10-19/57`, or `blogs */57` for an empty page.
#[must_use]
pub fn content_range(meta: &PaginationMeta, resource_name: &str) -> HeaderMap {
    let safe_name = sanitize_resource_name(resource_name);
    let range = if meta.item_count == 0 {
        format!("{safe_name} */{}", meta.total_items)
    } else {
        let first = meta.offset();
        let last = first + meta.item_count - 1;
        format!("{safe_name} {first}-{last}/{}", meta.total_items)
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&range) {
        headers.insert("Content-Range", value);
    } else {
        tracing::warn!(range = %range, "could not build Content-Range header");
    }
    headers
}
