// handlers/public/auth/mod.rs - Registration and token acquisition

pub mod login; // POST /auth/login
pub mod register; // POST /auth/register, POST /auth/register/resend
pub mod verify; // POST /auth/verify

pub use login::login_post;
pub use register::{register_post, resend_post};
pub use verify::verify_post;
