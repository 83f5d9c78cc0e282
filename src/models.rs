//! Data models for Perks API entities.
//!
//! Records returned by the API are read-only display data: nothing here
//! validates or mutates them beyond decoding.

mod ids;
mod listing;
mod perk;
mod query;

pub use chrono::{DateTime, Utc};
pub use ids::PerkId;
pub use listing::{ApiErrorBody, PerksResponse};
pub use perk::{Creator, Perk};
pub use query::PerkQuery;
