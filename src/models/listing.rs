//! Response bodies of the listing endpoint.

use serde::{Deserialize, Serialize};

use super::Perk;

/// Successful response of `GET /perks/all`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerksResponse {
    /// Perks matching the request filters, in server order.
    #[serde(default)]
    pub perks: Vec<Perk>,
}

/// Body of a non-success response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable failure description.
    #[serde(default)]
    pub message: Option<String>,
}
