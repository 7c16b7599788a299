pub mod author;
pub mod book;
pub mod preference;
pub mod user;

pub use author::Author;
pub use book::{Book, BookRecord};
pub use preference::Preference;
pub use user::{User, UserProfile, UserRead};
