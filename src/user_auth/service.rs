//! Bearer token verification
//!
//! Tokens are issued by the identity service with a shared HS256 secret.
//! This process only verifies them.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    #[serde(default)]
    pub firstname: String,
    pub exp: usize, // Expiration time (as UTC timestamp)
    pub iat: usize, // Issued at
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Invalid token format")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Failed to issue token: {0}")]
    Issue(String),
}

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;
        if token_data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(token_data.claims)
    }
}

/// Sign a token the way the identity service does (local tooling and tests)
pub fn issue_token(
    jwt_secret: &str,
    user_id: &str,
    first_name: &str,
    ttl_secs: i64,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        firstname: first_name.to_string(),
        exp: (now + ttl_secs).max(0) as usize,
        iat: now as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Issue(e.to_string()))
}
