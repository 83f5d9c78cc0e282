//! Observable state of the perk listing.

use alloc::collections::BTreeSet;

use crate::models::Perk;

/// Returns the distinct, non-empty, trimmed merchant names in `perks`.
#[inline]
#[must_use]
pub fn unique_merchants(perks: &[Perk]) -> BTreeSet<String> {
    perks
        .iter()
        .filter_map(Perk::merchant_name)
        .map(ToOwned::to_owned)
        .collect()
}

/// Snapshot of the listing: filters, results, and request status.
///
/// The merchant set is derived from the perk list and is only ever
/// recomputed together with it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingState {
    /// Search text as typed.
    search_query: String,
    /// Search text after the debounce delay.
    debounced_search_query: String,
    /// Selected merchant.
    merchant_filter: String,
    /// Perks of the last successful fetch.
    perks: Vec<Perk>,
    /// Distinct merchants of `perks`.
    unique_merchants: BTreeSet<String>,
    /// Whether a fetch is in flight.
    loading: bool,
    /// Message of the last failed fetch.
    error: Option<String>,
}

impl ListingState {
    /// Search text as typed.
    #[inline]
    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Search text the current listing was requested with.
    #[inline]
    #[must_use]
    pub fn debounced_search_query(&self) -> &str {
        &self.debounced_search_query
    }

    /// Selected merchant filter (empty when unset).
    #[inline]
    #[must_use]
    pub fn merchant_filter(&self) -> &str {
        &self.merchant_filter
    }

    /// Perks of the last successful fetch.
    #[inline]
    #[must_use]
    pub fn perks(&self) -> &[Perk] {
        &self.perks
    }

    /// Distinct merchant names of [`Self::perks`], sorted.
    #[inline]
    #[must_use]
    pub const fn unique_merchants(&self) -> &BTreeSet<String> {
        &self.unique_merchants
    }

    /// Whether a fetch is in flight.
    #[inline]
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed fetch, cleared when a new one starts.
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Records the typed search text.
    pub(crate) fn set_search_query(&mut self, text: String) {
        self.search_query = text;
    }

    /// Records the settled search text.
    pub(crate) fn set_debounced_search_query(&mut self, text: String) {
        self.debounced_search_query = text;
    }

    /// Records the merchant filter.
    pub(crate) fn set_merchant_filter(&mut self, merchant: String) {
        self.merchant_filter = merchant;
    }

    /// Clears both filters and the error message.
    pub(crate) fn reset_filters(&mut self) {
        self.search_query.clear();
        self.debounced_search_query.clear();
        self.merchant_filter.clear();
        self.error = None;
    }

    /// Marks a fetch as started.
    pub(crate) fn begin_fetch(&mut self) {
        self.error = None;
        self.loading = true;
    }

    /// Marks the in-flight fetch as settled.
    pub(crate) fn end_fetch(&mut self) {
        self.loading = false;
    }

    /// Replaces the perk list and recomputes the merchant set.
    pub(crate) fn replace_perks(&mut self, perks: Vec<Perk>) {
        self.unique_merchants = unique_merchants(&perks);
        self.perks = perks;
    }

    /// Records a failed fetch. The perk list is kept.
    pub(crate) fn fail(&mut self, message: String) {
        self.error = Some(message);
    }
}
