//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body is JSON with a German `message`; authentication failures
//! additionally carry `"errorType": "token"`. Internal details never leave
//! the server.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{CheckoutError, ValidationError};

const MSG_BAD_REQUEST: &str = "Anfrage ungültig!";
const MSG_ADDRESS_NOT_FOUND: &str = "Adresse nicht gefunden.";
const MSG_UNAUTHORIZED: &str = "Nicht autorisiert!";
const MSG_FORBIDDEN: &str = "Token ungültig!";
const MSG_INTERNAL: &str = "Fehler beim Zugriff auf die Datenbank.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Address or order operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found; the message is shown to the client.
    #[error("Not found: {0}")]
    NotFound(&'static str),

    /// No bearer token was supplied.
    #[error("Unauthorized")]
    Unauthorized,

    /// The bearer token is malformed, forged, or expired.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(RepositoryError::Database(err))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Checkout(CheckoutError::Validation(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<&'static str>,
}

impl AppError {
    /// Whether this error is the server's fault.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) => true,
            Self::Checkout(err) => !err.is_client_error(),
            _ => false,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Localized message shown to the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        if self.is_server_error() {
            return MSG_INTERNAL.to_owned();
        }
        match self {
            Self::Checkout(CheckoutError::AddressNotFound) => MSG_ADDRESS_NOT_FOUND.to_owned(),
            Self::Checkout(CheckoutError::ProductNotFound(id)) => {
                format!("Produkt mit ID {id} nicht gefunden.")
            }
            Self::Checkout(CheckoutError::PriceMismatch { resolved, claimed }) => {
                format!("Preis {claimed} stimmt nicht mit {resolved} überein.")
            }
            Self::NotFound(message) => (*message).to_owned(),
            Self::Unauthorized => MSG_UNAUTHORIZED.to_owned(),
            Self::Forbidden => MSG_FORBIDDEN.to_owned(),
            _ => MSG_BAD_REQUEST.to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let error_type = matches!(self, Self::Unauthorized | Self::Forbidden).then_some("token");
        let body = ErrorBody {
            message: self.client_message(),
            error_type,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
