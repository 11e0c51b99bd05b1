// handlers/public/mod.rs - Endpoints that do not require authentication

pub mod auth;
pub mod health;

pub use health::health_get;
