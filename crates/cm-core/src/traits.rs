//! Core entity traits

use chrono::{DateTime, Utc};

/// Primary key type, assigned by the record store
pub type Id = i64;

/// Trait for entities that carry a store-assigned primary key
pub trait Identifiable {
    fn id(&self) -> Option<Id>;

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }

    fn is_new_record(&self) -> bool {
        !self.is_persisted()
    }
}

/// Trait for entities with created_at/updated_at bookkeeping
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Trait for entities bound to a single owning identity
pub trait Owned {
    /// The identity that created the entity; immutable after creation.
    fn owner_id(&self) -> Id;

    fn is_owned_by(&self, user_id: Id) -> bool {
        self.owner_id() == user_id
    }
}
