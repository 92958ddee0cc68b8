//! Listing Service
//!
//! Owner-scoped create/read/update/delete/search. Every mutation runs
//! fetch → ownership check → persist; a failed step leaves the record
//! untouched. Concurrent updates to one record are last-writer-wins.

use std::sync::Arc;

use cm_core::{Id, Owned};
use cm_models::{Listing, ListingPatch, NewListing};
use thiserror::Error;
use tracing::{info, instrument};

use crate::store::{ListingStore, StoreError};

/// Service errors
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Listing not found: {0}")]
    NotFound(Id),
    #[error("User {user_id} is not the owner of listing {id}")]
    NotOwner { user_id: Id, id: Id },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type ListingResult<T> = Result<T, ListingError>;

/// The listing lifecycle service
pub struct ListingService {
    store: Arc<dyn ListingStore>,
}

impl ListingService {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }

    /// Create a listing owned by `owner_id`, with the ingested attachment
    /// references taken over verbatim, in order.
    #[instrument(skip(self, params, image_refs))]
    pub async fn create(
        &self,
        owner_id: Id,
        params: NewListing,
        image_refs: Vec<String>,
    ) -> ListingResult<Listing> {
        let mut listing = Listing::new(owner_id, params.title, params.description)
            .with_tags(params.tags)
            .with_images(image_refs);

        let id = self.store.insert(&mut listing).await?;
        info!(id, owner_id, images = listing.images.len(), "listing created");
        Ok(listing)
    }

    /// All listings of this owner, in store-native order
    pub async fn list_all(&self, owner_id: Id) -> ListingResult<Vec<Listing>> {
        Ok(self.store.find_by_owner(owner_id).await?)
    }

    /// Fetch one listing by id. Reads are owner-agnostic; the ownership gate
    /// applies to mutations only.
    pub async fn get(&self, id: Id) -> ListingResult<Listing> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ListingError::NotFound(id))
    }

    /// Partially update a listing: present non-empty fields replace, absent
    /// ones are retained, and new attachment references are appended after
    /// the existing ones.
    #[instrument(skip(self, patch, new_image_refs))]
    pub async fn update(
        &self,
        owner_id: Id,
        id: Id,
        patch: ListingPatch,
        new_image_refs: Vec<String>,
    ) -> ListingResult<Listing> {
        let mut listing = self.get(id).await?;
        if !listing.is_owned_by(owner_id) {
            return Err(ListingError::NotOwner { user_id: owner_id, id });
        }

        listing.apply(&patch);
        listing.append_images(new_image_refs);

        self.store.update(&listing).await.map_err(|err| match err {
            StoreError::NotFound(_) => ListingError::NotFound(id),
            other => ListingError::Store(other),
        })?;

        info!(id, owner_id, images = listing.images.len(), "listing updated");
        Ok(listing)
    }

    /// Delete a listing. Stored attachment files are left in place; only the
    /// record goes away.
    #[instrument(skip(self))]
    pub async fn delete(&self, owner_id: Id, id: Id) -> ListingResult<()> {
        let listing = self.get(id).await?;
        if !listing.is_owned_by(owner_id) {
            return Err(ListingError::NotOwner { user_id: owner_id, id });
        }

        // The record may have been removed between fetch and delete.
        if !self.store.delete(id).await? {
            return Err(ListingError::NotFound(id));
        }

        info!(id, owner_id, "listing deleted");
        Ok(())
    }

    /// Keyword search across this owner's listings: case-insensitive
    /// substring on title/description, exact element match on tags. An empty
    /// keyword matches every listing of the owner.
    pub async fn search(&self, owner_id: Id, keyword: &str) -> ListingResult<Vec<Listing>> {
        Ok(self.store.search(owner_id, keyword).await?)
    }
}
