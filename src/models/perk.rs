//! Perk record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PerkId;

/// Reference to the user who published a perk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
}

/// A discount or offer record as returned by the Perks API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Perk {
    /// Unique identifier (sent as `id` or `_id`).
    #[serde(alias = "_id")]
    pub id: PerkId,
    /// Short headline.
    pub title: String,
    /// Category label (e.g. `"food"`, `"travel"`).
    pub category: String,
    /// Merchant offering the perk.
    #[serde(default)]
    pub merchant: Option<String>,
    /// Discount in percent.
    #[serde(default)]
    pub discount_percent: Option<f64>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Publisher of the perk.
    #[serde(default)]
    pub created_by: Option<Creator>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Perk {
    /// Returns the trimmed merchant name, or `None` when it is absent or
    /// blank.
    #[inline]
    #[must_use]
    pub fn merchant_name(&self) -> Option<&str> {
        self.merchant
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a minimal perk with the given merchant.
    fn perk_with_merchant(merchant: Option<&str>) -> Perk {
        Perk {
            id: PerkId::from("p-1"),
            title: "Half-price latte".to_owned(),
            category: "food".to_owned(),
            merchant: merchant.map(ToOwned::to_owned),
            discount_percent: None,
            description: None,
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn deserialize_full_perk() {
        let json = r#"{
            "_id": "65f1",
            "title": "20% off coffee",
            "category": "food",
            "merchant": "Acme Coffee",
            "discountPercent": 20,
            "description": "Weekdays only",
            "createdBy": { "name": "Dana", "email": "dana@example.com" },
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-02T10:00:00.000Z",
            "__v": 0
        }"#;
        let perk: Perk = serde_json::from_str(json).unwrap();
        assert_eq!(perk.id, PerkId::from("65f1"));
        assert_eq!(perk.merchant.as_deref(), Some("Acme Coffee"));
        assert_eq!(perk.discount_percent, Some(20.0));
        let creator = perk.created_by.unwrap();
        assert_eq!(creator.name.as_deref(), Some("Dana"));
        assert_eq!(creator.email.as_deref(), Some("dana@example.com"));
        assert_eq!(
            perk.created_at,
            Some(DateTime::from_timestamp(1_709_287_200, 0).unwrap())
        );
        assert!(perk.updated_at.is_some());
    }

    #[test]
    fn deserialize_minimal_perk() {
        let json = r#"{ "id": "p-2", "title": "Free fries", "category": "food" }"#;
        let perk: Perk = serde_json::from_str(json).unwrap();
        assert_eq!(perk.id.as_inner(), "p-2");
        assert!(perk.merchant.is_none());
        assert!(perk.discount_percent.is_none());
        assert!(perk.created_by.is_none());
    }

    #[test]
    fn merchant_name_is_trimmed() {
        let perk = perk_with_merchant(Some("  Acme  "));
        assert_eq!(perk.merchant_name(), Some("Acme"));
    }

    #[test]
    fn blank_merchant_name_is_none() {
        assert_eq!(perk_with_merchant(Some("   ")).merchant_name(), None);
        assert_eq!(perk_with_merchant(None).merchant_name(), None);
    }
}
