//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password login and account creation

pub mod auth;

pub use auth::{AuthError, AuthService, NewUser};
