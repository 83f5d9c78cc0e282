//! Filter parameters of the listing request.

use serde::Serialize;

/// Query parameters for `GET /perks/all`.
///
/// Both filters are trimmed on construction; a filter that is empty after
/// trimming is omitted from the request instead of being sent as an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PerkQuery {
    /// Free-text search.
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    /// Merchant name.
    #[serde(skip_serializing_if = "Option::is_none")]
    merchant: Option<String>,
}

impl PerkQuery {
    /// Creates a query from raw filter text.
    #[inline]
    #[must_use]
    pub fn new(search: &str, merchant: &str) -> Self {
        Self {
            search: normalize(search),
            merchant: normalize(merchant),
        }
    }

    /// Creates a query with no filters (the full list).
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns the trimmed search text, if any.
    #[inline]
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Returns the trimmed merchant filter, if any.
    #[inline]
    #[must_use]
    pub fn merchant(&self) -> Option<&str> {
        self.merchant.as_deref()
    }

    /// Returns `true` if no filter is applied.
    #[inline]
    #[must_use]
    pub const fn is_unfiltered(&self) -> bool {
        self.search.is_none() && self.merchant.is_none()
    }
}

/// Trims `raw` and maps an empty result to `None`.
fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_are_trimmed() {
        let query = PerkQuery::new("  coffee ", "\tAcme\n");
        assert_eq!(query.search(), Some("coffee"));
        assert_eq!(query.merchant(), Some("Acme"));
    }

    #[test]
    fn blank_filters_are_omitted() {
        let query = PerkQuery::new("   ", "");
        assert!(query.is_unfiltered());
        assert_eq!(query, PerkQuery::all());
        assert_eq!(serde_json::to_string(&query).unwrap(), "{}");
    }

    #[test]
    fn only_present_filters_serialize() {
        let query = PerkQuery::new("", "Acme");
        assert_eq!(
            serde_json::to_string(&query).unwrap(),
            r#"{"merchant":"Acme"}"#
        );
    }
}
