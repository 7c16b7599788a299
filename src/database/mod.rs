pub mod manager;
pub mod models;
pub mod transaction;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::{Author, Book, BookRecord, Preference, User, UserProfile, UserRead};
pub use transaction::begin_write;
