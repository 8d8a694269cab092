//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Bootstrap (lazy migrate + seed; binary only)
//! 3. `TraceLayer` (`http_request` span)
//! 4. Request ID (recorded on the span, echoed in the response)
//! 5. Security headers
//! 6. Session layer (tower-sessions, signed cookie)

pub mod auth;
pub mod bootstrap;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user,
};
pub use bootstrap::bootstrap_middleware;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, create_session_store, session_layer};
