// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer JWT). Handlers open the request's transaction,
// call into `services`, and commit only when every step succeeded.

pub mod protected;
pub mod public;
pub mod utils;
