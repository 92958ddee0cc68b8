//! Listing record store
//!
//! The persistent record store is an external collaborator; this module
//! defines the trait the lifecycle service consumes, plus an in-memory
//! engine used by the server binary and the tests.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use cm_core::Id;
use cm_models::Listing;
use thiserror::Error;
use tokio::sync::RwLock;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(Id),
    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store trait
///
/// Ids are assigned by the store at insert time and are stable and unique.
/// A single insert/update/delete is atomic; there are no multi-record
/// transactions.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert a new record, assigning and returning its id
    async fn insert(&self, listing: &mut Listing) -> StoreResult<Id>;

    /// Fetch a record by id
    async fn find_by_id(&self, id: Id) -> StoreResult<Option<Listing>>;

    /// All records of one owner, in store-native order
    async fn find_by_owner(&self, owner_id: Id) -> StoreResult<Vec<Listing>>;

    /// Owner equality plus keyword predicate (see `Listing::matches_keyword`)
    async fn search(&self, owner_id: Id, keyword: &str) -> StoreResult<Vec<Listing>>;

    /// Replace the stored record with this one (matched by id)
    async fn update(&self, listing: &Listing) -> StoreResult<()>;

    /// Remove a record by id; false when nothing was there at delete time
    async fn delete(&self, id: Id) -> StoreResult<bool>;
}

/// In-memory listing store
pub struct MemoryListingStore {
    listings: RwLock<Vec<Listing>>,
    next_id: AtomicI64,
}

impl Default for MemoryListingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Total number of records, any owner
    pub async fn count(&self) -> usize {
        self.listings.read().await.len()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn insert(&self, listing: &mut Listing) -> StoreResult<Id> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        listing.id = Some(id);

        self.listings.write().await.push(listing.clone());
        Ok(id)
    }

    async fn find_by_id(&self, id: Id) -> StoreResult<Option<Listing>> {
        let listings = self.listings.read().await;
        Ok(listings.iter().find(|l| l.id == Some(id)).cloned())
    }

    async fn find_by_owner(&self, owner_id: Id) -> StoreResult<Vec<Listing>> {
        let listings = self.listings.read().await;
        Ok(listings
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn search(&self, owner_id: Id, keyword: &str) -> StoreResult<Vec<Listing>> {
        let listings = self.listings.read().await;
        Ok(listings
            .iter()
            .filter(|l| l.owner_id == owner_id && l.matches_keyword(keyword))
            .cloned()
            .collect())
    }

    async fn update(&self, listing: &Listing) -> StoreResult<()> {
        let id = listing
            .id
            .ok_or_else(|| StoreError::Backend("cannot update an unsaved listing".to_string()))?;

        let mut listings = self.listings.write().await;
        match listings.iter().position(|l| l.id == Some(id)) {
            Some(pos) => {
                listings[pos] = listing.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn delete(&self, id: Id) -> StoreResult<bool> {
        let mut listings = self.listings.write().await;
        let before = listings.len();
        listings.retain(|l| l.id != Some(id));
        Ok(listings.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(owner_id: Id, title: &str) -> Listing {
        Listing::new(owner_id, title, "")
    }

    #[tokio::test]
    async fn test_insert_assigns_unique_ids() {
        let store = MemoryListingStore::new();

        let mut first = listing(1, "one");
        let mut second = listing(1, "two");
        let a = store.insert(&mut first).await.unwrap();
        let b = store.insert(&mut second).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(first.id, Some(a));
        assert_eq!(store.find_by_id(a).await.unwrap().unwrap().title, "one");
    }

    #[tokio::test]
    async fn test_find_by_owner_filters() {
        let store = MemoryListingStore::new();
        store.insert(&mut listing(1, "mine")).await.unwrap();
        store.insert(&mut listing(2, "theirs")).await.unwrap();

        let mine = store.find_by_owner(1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "mine");
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = MemoryListingStore::new();

        let mut ghost = listing(1, "ghost");
        ghost.id = Some(99);
        assert!(matches!(
            store.update(&ghost).await,
            Err(StoreError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_update_unsaved_record() {
        let store = MemoryListingStore::new();
        assert!(matches!(
            store.update(&listing(1, "unsaved")).await,
            Err(StoreError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let store = MemoryListingStore::new();
        let mut record = listing(1, "gone soon");
        let id = store.insert(&mut record).await.unwrap();

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(store.find_by_id(id).await.unwrap().is_none());
    }
}
