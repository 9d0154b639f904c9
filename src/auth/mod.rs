//! Authentication
//!
//! Handles:
//! - Password hashing and verification
//! - Session management (HMAC-signed tokens)
//! - Authentication middleware

mod middleware;
pub mod password;
pub mod session;

pub use middleware::{CurrentUser, require_auth};
pub use session::{Session, create_session_token, verify_session_token};
