//! Request parameter multimap.
//!
//! The HTTP layer hands this core a key → ordered-string-list multimap
//! plus two well-known parameters: the pagination cursor (`last_seen`)
//! and the page size (`limit`). Entity filters read their recognized
//! keys from here; the caching facade derives cache keys from the
//! non-empty entries.

use tracing::debug;

use crate::statement::SortOrder;

/// Well-known parameter carrying the previous page's last sort-field value.
pub const PARAM_LAST_SEEN: &str = "last_seen";

/// Well-known parameter carrying the requested page size.
pub const PARAM_LIMIT: &str = "limit";

/// Well-known parameter carrying `<field> <order>`.
pub const PARAM_SORT: &str = "sort";

/// Explicit do-not-cache signal from the client.
pub const PARAM_NO_STORE: &str = "no_store";

/// Default page size when the request does not specify one.
pub const DEFAULT_LIMIT: u32 = 25;

/// Hard ceiling on the page size a request can ask for.
pub const MAX_LIMIT: u32 = 100;

/// Key → ordered string-list multimap of request parameters.
///
/// Insertion order is preserved for value lists; key lookup is
/// first-match. One instance per request.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    entries: Vec<(String, Vec<String>)>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs, aggregating repeated keys in order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.append(key, value);
        }
        params
    }

    /// Append a value under `key`, creating the entry if needed.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// All values for `key`, in insertion order.
    pub fn values(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// First non-empty value for `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key)
            .iter()
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }

    /// Non-empty values for `key`.
    pub fn non_empty_values(&self, key: &str) -> Vec<&str> {
        self.values(key)
            .iter()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Iterate `(key, values)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    /// The pagination cursor, if present.
    pub fn cursor(&self) -> Option<&str> {
        self.first(PARAM_LAST_SEEN)
    }

    /// Requested page size, clamped to [1, MAX_LIMIT].
    ///
    /// A non-numeric value is ignored and the default applies.
    pub fn limit(&self) -> u32 {
        let requested = self.first(PARAM_LIMIT).and_then(|raw| {
            let parsed = raw.parse::<u32>().ok();
            if parsed.is_none() {
                debug!(value = %raw, "ignoring non-numeric limit parameter");
            }
            parsed
        });
        requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Whether the client sent an explicit do-not-cache signal.
    pub fn wants_no_store(&self) -> bool {
        self.first(PARAM_NO_STORE).is_some()
    }

    /// Parse the `sort` parameter into `(field, order)`.
    ///
    /// The value is `<field>` optionally followed by an order token;
    /// a missing or unrecognized token falls back to [SortOrder::None].
    pub fn sort(&self) -> Option<(&str, SortOrder)> {
        let raw = self.first(PARAM_SORT)?;
        let mut tokens = raw.split_whitespace();
        let field = tokens.next()?;
        let order = tokens
            .next()
            .map(SortOrder::parse)
            .unwrap_or(SortOrder::None);
        Some((field, order))
    }
}

/// Validate a parameter value destined for a numeric comparison.
///
/// Non-numeric values are skipped silently (logged at debug), never an
/// error: clients routinely send garbage in numeric filter slots.
pub fn parse_numeric_param(key: &str, raw: &str) -> Option<i64> {
    match raw.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(param = %key, value = %raw, "ignoring non-numeric parameter");
            None
        }
    }
}

/// Float variant of [parse_numeric_param].
pub fn parse_float_param(key: &str, raw: &str) -> Option<f64> {
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(param = %key, value = %raw, "ignoring non-numeric parameter");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multimap_aggregates_repeated_keys() {
        let params = RequestParams::from_pairs([("id", "a"), ("id", "b"), ("q", "x")]);
        assert_eq!(params.values("id"), &["a", "b"]);
        assert_eq!(params.first("q"), Some("x"));
        assert_eq!(params.first("missing"), None);
    }

    #[test]
    fn test_first_skips_empty_values() {
        let params = RequestParams::from_pairs([("q", ""), ("q", "widget")]);
        assert_eq!(params.first("q"), Some("widget"));
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(RequestParams::new().limit(), DEFAULT_LIMIT);
        let params = RequestParams::from_pairs([("limit", "10")]);
        assert_eq!(params.limit(), 10);
        let params = RequestParams::from_pairs([("limit", "9999")]);
        assert_eq!(params.limit(), MAX_LIMIT);
        let params = RequestParams::from_pairs([("limit", "lots")]);
        assert_eq!(params.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_sort_parsing() {
        let params = RequestParams::from_pairs([("sort", "title desc")]);
        assert_eq!(params.sort(), Some(("title", SortOrder::Descending)));

        let params = RequestParams::from_pairs([("sort", "title")]);
        assert_eq!(params.sort(), Some(("title", SortOrder::None)));

        let params = RequestParams::from_pairs([("sort", "title sideways")]);
        assert_eq!(params.sort(), Some(("title", SortOrder::None)));
    }

    #[test]
    fn test_numeric_validation_skips_garbage() {
        assert_eq!(parse_numeric_param("year", "1999"), Some(1999));
        assert_eq!(parse_numeric_param("year", "next year"), None);
        assert_eq!(parse_float_param("rating", "7.5"), Some(7.5));
        assert_eq!(parse_float_param("rating", "high"), None);
    }
}
