use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::service::AuthError;
use crate::gateway::{state::AppState, types::ApiError};
use crate::transfer::Sender;

/// Identity of the caller, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub first_name: String,
}

impl From<&AuthenticatedUser> for Sender {
    fn from(user: &AuthenticatedUser) -> Self {
        Sender {
            user_id: user.user_id.clone(),
            first_name: user.first_name.clone(),
        }
    }
}

fn bearer_token(request: &Request<Body>) -> Result<&str, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_token(&request)
        .and_then(|token| state.token_verifier.verify_token(token))
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::from(e)
        })?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
        first_name: claims.firstname,
    });
    Ok(next.run(request).await)
}
