//! # cm-core
//!
//! Core types, traits, and configuration for CarMart RS.
//!
//! This crate provides the building blocks shared by all other crates:
//! - The `Id` primary key type and entity traits
//! - Application configuration

pub mod config;
pub mod traits;

pub use config::*;
pub use traits::*;
