//! Caller authentication
//!
//! Users register and log in elsewhere; requests here carry a bearer JWT that
//! is verified and turned into an [`AuthenticatedUser`].

pub mod middleware;
pub mod service;

pub use middleware::{AuthenticatedUser, jwt_auth_middleware};
pub use service::{AuthError, Claims, TokenVerifier, issue_token};
