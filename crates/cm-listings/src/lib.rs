//! # cm-listings
//!
//! The listing lifecycle manager for CarMart RS: the authoritative CRUD and
//! search surface over car listings, scoped to the requesting owner.
//!
//! The record store is consumed behind the [`ListingStore`] trait; an
//! in-memory engine ships with the crate. Mutations always follow
//! fetch → ownership check → persist, and attachment references are merged
//! append-only.

pub mod service;
pub mod store;

pub use service::{ListingError, ListingResult, ListingService};
pub use store::{ListingStore, MemoryListingStore, StoreError, StoreResult};
