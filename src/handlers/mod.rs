// handlers/mod.rs - HTTP handlers grouped by security tier
//
// Public (no auth) handlers serve registration, login and health checks.
// Protected handlers run behind the JWT middleware and act as the token's user.

pub mod protected;
pub mod public;
