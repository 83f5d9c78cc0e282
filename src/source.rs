//! Abstraction over the remote perk listing.
//!
//! The listing controller only needs one operation from the API, so it
//! depends on this trait instead of a concrete HTTP client. The async
//! [`crate::client::PerksClient`] implements it; tests substitute an
//! in-memory source.

use crate::error::Result;
use crate::models::{PerkQuery, PerksResponse};

/// A source of perk listings.
pub trait PerkSource: core::fmt::Debug + Send + Sync + 'static {
    /// Fetches the perks matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be retrieved. The controller
    /// turns it into a user-facing message with
    /// [`crate::error::PerksError::user_message`].
    fn fetch_perks(&self, query: &PerkQuery) -> impl Future<Output = Result<PerksResponse>> + Send;
}
