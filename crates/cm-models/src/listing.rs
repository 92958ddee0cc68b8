//! Listing Model
//!
//! A car listing is owned by exactly one user. Text fields and tags are
//! replaced wholesale on update; the `images` sequence is append-only.

use chrono::{DateTime, Utc};
use cm_core::{Id, Identifiable, Owned, Timestamped};
use serde::{Deserialize, Serialize};

/// A car listing record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Store-assigned ID, absent until first persisted
    pub id: Option<Id>,
    /// Listing title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Ordered tag tokens
    pub tags: Vec<String>,
    /// Ordered reference paths of stored attachments; only ever grows
    pub images: Vec<String>,
    /// Owning user, bound at creation
    pub owner_id: Id,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a new unsaved listing bound to its owner
    pub fn new(owner_id: Id, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            tags: Vec::new(),
            images: Vec::new(),
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Apply a partial update. A present but empty field behaves like an
    /// absent one: the existing value is retained.
    pub fn apply(&mut self, patch: &ListingPatch) {
        if let Some(title) = patch.title.as_deref() {
            if !title.is_empty() {
                self.title = title.to_string();
            }
        }
        if let Some(description) = patch.description.as_deref() {
            if !description.is_empty() {
                self.description = description.to_string();
            }
        }
        if let Some(tags) = &patch.tags {
            if !tags.is_empty() {
                self.tags = tags.clone();
            }
        }
        self.touch();
    }

    /// Concatenate newly ingested attachment references after the existing
    /// ones. Existing entries are never removed or reordered.
    pub fn append_images<I>(&mut self, references: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.images.extend(references);
        self.touch();
    }

    /// Keyword predicate used by search: case-insensitive substring match on
    /// title or description, or an exact tag element match.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.tags.iter().any(|tag| tag == keyword)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Identifiable for Listing {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Listing {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Owned for Listing {
    fn owner_id(&self) -> Id {
        self.owner_id
    }
}

/// Params for creating a listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Partial update with per-field presence; `None` means "leave unchanged"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.tags.is_none()
    }
}
