// handlers/protected/mod.rs - Bearer token required
//
// The auth middleware has already verified the token and inserted `AuthUser`. Each handler
// resolves that email to a live user inside its own unit of work.

pub mod authors;
pub mod books;
pub mod preferences;
pub mod users;
