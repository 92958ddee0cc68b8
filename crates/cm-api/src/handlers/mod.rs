//! API request handlers

pub mod listings;

pub use listings::*;
