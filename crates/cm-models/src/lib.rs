//! # cm-models
//!
//! Domain models for CarMart RS: the car `Listing` entity together with its
//! creation params and partial-update patch type.

pub mod listing;

pub use listing::{Listing, ListingPatch, NewListing};
