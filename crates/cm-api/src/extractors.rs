//! Axum extractors and shared application state

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use cm_attachments::AttachmentIngestor;
use cm_auth::{extract_bearer_token, CurrentUser, JwtService};
use cm_core::AppConfig;
use cm_listings::ListingService;

use crate::error::ApiError;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub listings: Arc<ListingService>,
    pub ingestor: Arc<AttachmentIngestor>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        listings: Arc<ListingService>,
        ingestor: Arc<AttachmentIngestor>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            config,
            listings,
            ingestor,
            jwt,
        }
    }
}

/// Verified requester identity, rejected before any handler logic runs
///
/// The identity collaborator upstream issues the bearer token; this
/// extractor only verifies it and refuses the request otherwise.
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let token = extract_bearer_token(header_value)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let user_id = app_state
            .jwt
            .user_id_from_token(token)
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

        Ok(AuthenticatedUser(CurrentUser::new(user_id)))
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = CurrentUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
