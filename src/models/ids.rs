//! Newtype wrapper for perk identifiers.

use serde::{Deserialize, Serialize};

/// Path prefix of the perk detail view.
const DETAIL_PATH_PREFIX: &str = "/perks/";

/// Unique, stable identifier of a perk record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerkId(String);

impl PerkId {
    /// Creates a new identifier from the given string.
    #[inline]
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns a reference to the inner string.
    #[inline]
    #[must_use]
    pub fn as_inner(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner string.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the path of the detail view for this perk (`/perks/{id}`).
    #[inline]
    #[must_use]
    pub fn detail_path(&self) -> String {
        format!("{DETAIL_PATH_PREFIX}{}", self.0)
    }
}

impl core::fmt::Display for PerkId {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<String> for PerkId {
    #[inline]
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PerkId {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_path_uses_identifier() {
        let id = PerkId::from("65f1c0ffee");
        assert_eq!(id.detail_path(), "/perks/65f1c0ffee");
    }

    #[test]
    fn deserializes_transparently() {
        let id: PerkId = serde_json::from_str(r#""abc-123""#).unwrap();
        assert_eq!(id.as_inner(), "abc-123");
        assert_eq!(id.to_string(), "abc-123");
    }
}
