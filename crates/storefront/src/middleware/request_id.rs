//! Request ID middleware.
//!
//! An upstream proxy may already have assigned an `x-request-id`; otherwise a
//! UUID v4 is generated. The id is recorded on the request span, tagged on the
//! Sentry scope, and echoed in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest incoming id that is trusted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = incoming_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

fn incoming_request_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request_with(id: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/health");
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Body::empty()).unwrap_or_default()
    }

    #[test]
    fn test_incoming_id_is_kept() {
        assert_eq!(
            incoming_request_id(&request_with(Some("cf-1234"))).as_deref(),
            Some("cf-1234")
        );
    }

    #[test]
    fn test_blank_or_oversized_id_is_ignored() {
        assert_eq!(incoming_request_id(&request_with(None)), None);
        assert_eq!(incoming_request_id(&request_with(Some("  "))), None);

        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        assert_eq!(incoming_request_id(&request_with(Some(&long))), None);
    }
}
