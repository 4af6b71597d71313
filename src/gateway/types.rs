//! API error envelope
//!
//! Every error leaves the gateway as `{code, error, field?}` with the HTTP
//! status chosen by the originating error type.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::transfer::TransferError;
use crate::user_auth::AuthError;

/// Error response body
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                error: error.into(),
                field: None,
            },
        }
    }

    pub fn with_field(mut self, field: &'static str) -> Self {
        self.body.field = Some(field);
        self
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", error)
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // Internal details stay in the logs
        let message = match &e {
            TransferError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        Self {
            status,
            body: ErrorBody {
                code: e.code(),
                error: message,
                field: e.field(),
            },
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Issue(_) => Self::internal(e.to_string()),
            _ => Self::new(StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED", e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::ValidationError;

    #[test]
    fn test_transfer_error_envelope() {
        let err = ApiError::from(TransferError::Validation(ValidationError::new(
            "currency",
            "\"currency\" must be 3 uppercase letters",
        )));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.code, "VALIDATION_ERROR");
        assert_eq!(err.body.field, Some("currency"));

        let err = ApiError::from(TransferError::RegistryUnavailable("timeout".into()));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = ApiError::from(TransferError::Internal("connection reset".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.body.error.contains("connection reset"));
    }

    #[test]
    fn test_field_omitted_when_absent() {
        let value = serde_json::to_value(ApiError::from(TransferError::InsufficientFunds).body)
            .unwrap();
        assert_eq!(value["error"], "Insufficent funds!");
        assert!(value.get("field").is_none());
    }
}
