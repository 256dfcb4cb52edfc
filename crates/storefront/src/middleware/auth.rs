//! Authentication extractor.
//!
//! Tokens are issued by the auth service; this service only verifies them.
//! A token is an HS256 JWT whose `id` claim is the user id.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use jsonwebtoken::{Algorithm, Validation};
use serde::Deserialize;

use kiosk_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Claims this service reads from a bearer token.
#[derive(Debug, Deserialize)]
struct Claims {
    id: i32,
    #[allow(dead_code)]
    exp: u64,
}

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 if no token is present and 403 if the token does not
/// verify or has expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;

        let user = verify_token(token, state)?;
        set_sentry_user(&user.id);

        Ok(Self(user))
    }
}

/// The token from `Authorization: Bearer <token>`, if any.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn verify_token(token: &str, state: &AppState) -> Result<CurrentUser, AppError> {
    let validation = Validation::new(Algorithm::HS256);

    let data = jsonwebtoken::decode::<Claims>(token, state.token_key(), &validation)
        .map_err(|e| {
            tracing::debug!("Token validation failed: {e}");
            AppError::Forbidden
        })?;

    let id = UserId::new(data.claims.id);
    if !id.is_valid() {
        tracing::debug!(user_id = %id, "Token carries an invalid user id");
        return Err(AppError::Forbidden);
    }

    Ok(CurrentUser { id })
}
