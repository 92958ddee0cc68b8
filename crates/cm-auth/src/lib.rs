//! # cm-auth
//!
//! Identity verification for CarMart RS.
//!
//! Session issuance lives outside this system; what arrives here is a
//! bearer token whose subject claim names the user. This crate validates
//! the token and produces the [`CurrentUser`] every request handler runs
//! as. Requests without a valid identity never reach the core.

pub mod jwt;
pub mod user;

pub use jwt::{extract_bearer_token, Claims, JwtError, JwtService};
pub use user::CurrentUser;
