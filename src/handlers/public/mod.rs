// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Account creation, token acquisition, the public profile lookup and service health checks.

pub mod meta;
pub mod users;
