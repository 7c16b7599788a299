pub mod authors;
pub mod books;
pub mod error;
pub mod identity;
pub mod preferences;

pub use error::{StoreError, StoreResult};

/// Offset/limit window for list operations. Lists are always ordered by id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }
}
