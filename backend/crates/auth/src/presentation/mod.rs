//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, session cookies and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod session_cookie;

pub use handlers::AuthAppState;
pub use middleware::{CurrentSession, RequireUser, route_guard, with_cookies};
pub use router::auth_router;
pub use session_cookie::SessionCookieCodec;
