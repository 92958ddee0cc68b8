//! # cm-api
//!
//! REST API handlers for CarMart RS.
//!
//! Exposes the listing lifecycle under `/api/v1/cars`. Create and update
//! accept multipart forms; uploaded image parts are ingested into the
//! owner's storage namespace before the lifecycle service runs, so a
//! failed ingestion never leaves a half-written record.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;

pub use extractors::AppState;
pub use routes::router;
