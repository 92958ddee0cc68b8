//! The verified requester identity

use cm_core::Id;

/// Identity attached to a request after token verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    id: Id,
}

impl CurrentUser {
    pub fn new(id: Id) -> Self {
        Self { id }
    }

    pub fn id(&self) -> Id {
        self.id
    }
}
