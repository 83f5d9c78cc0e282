//! Rust client library and listing controller for the Perks API.
//!
//! The crate has two layers:
//!
//! - [`client`]: typed async and blocking HTTP clients for
//!   `GET /perks/all`.
//! - [`controller`]: a headless, debounced search-and-filter controller
//!   that keeps a perk listing in sync with the user's filters and
//!   publishes [`controller::ListingState`] snapshots for rendering.

extern crate alloc;

#[cfg(any(feature = "async", feature = "blocking"))]
pub mod client;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod models;
pub mod source;
pub mod timer;
