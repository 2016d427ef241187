//! Defines application-specific Axum middleware.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;

use super::error::AppError;
use super::jwt::Claims;
use crate::jwt::TokenManager;

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required.".to_string()))
    }
}

/// The caller of a route guarded by [`optional_auth`]: anonymous or
/// authenticated by a bearer access token.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Claims>);

impl Caller {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|claims| claims.sub)
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<Claims>().cloned()))
    }
}

/// Authenticates the request when it carries a bearer token and lets
/// anonymous requests through. A token that is present but invalid is
/// rejected rather than downgraded to anonymous.
pub async fn optional_auth(
    State(tm): State<Arc<dyn TokenManager>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Ok(next.run(req).await),
    };

    let token = header_value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid authorization header".to_string()))?;

    let claims = tm.validate_access_token(token)?;

    let (mut parts, body) = req.into_parts();
    parts.extensions.insert(claims);
    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}

pub async fn request_response_logger(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let start_time = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let mut c_id = String::default();
    if let Some(request_id) = req.headers().get("x-request-id") {
        if let Ok(id_str) = request_id.to_str() {
            c_id = id_str.to_string()
        }
    } else {
        c_id = uuid::Uuid::new_v4().to_string()
    }

    req.extensions_mut().insert(c_id.clone());

    tracing::info!(
        _cID = c_id,
        method = %method,
        uri = %uri,
        version = ?version,
        "Incoming request"
    );

    let mut response = next.run(req).await;

    let duration = start_time.elapsed();
    let status = response.status();

    response.headers_mut().insert(
        HeaderName::from_static("x-request-id"),
        HeaderValue::from_str(c_id.as_str()).unwrap_or_else(|_| HeaderValue::from_static("invalid-correlation-id")),
    );

    let log_level = if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "warn"
    } else {
        "info"
    };

    match log_level {
        "error" => tracing::error!(
            _cID = c_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "Request completed with server error"
        ),
        "warn" => tracing::warn!(
            _cID = c_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "Request completed with client error"
        ),
        _ => tracing::info!(
            _cID = c_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "Request completed successfully"
        ),
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Router, middleware};
    use tower::ServiceExt;

    use super::*;
    use crate::jwt::{Claims, JwtError, MockTokenManager, TokenManager};

    async fn whoami(caller: Caller) -> impl IntoResponse {
        match caller.user_id() {
            Some(id) => format!("user {id}"),
            None => "anonymous".to_string(),
        }
    }

    fn app(tm: MockTokenManager) -> Router {
        let tm: Arc<dyn TokenManager> = Arc::new(tm);

        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(tm.clone(), optional_auth))
            .layer(middleware::from_fn(request_response_logger))
            .with_state(tm)
    }

    async fn body_string(response: Response) -> String {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body_bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_optional_auth_with_valid_token() {
        let mut tm = MockTokenManager::new();
        tm.expect_validate_access_token()
            .withf(|token| token == "valid_token")
            .returning(|_token| {
                Ok(Claims { sub: 123, exp: 9999999999, jti: "".into(), iss: "".into(), aud: "".into(), iat: 1 })
            });

        let request = axum::http::Request::builder()
            .method(Method::GET)
            .uri("/whoami")
            .header("authorization", "Bearer valid_token")
            .body(Body::empty())
            .unwrap();

        let response = app(tm).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_string(response).await, "user 123");
    }

    #[tokio::test]
    async fn test_optional_auth_without_header_is_anonymous() {
        let mut tm = MockTokenManager::new();
        tm.expect_validate_access_token().never();

        let request = axum::http::Request::builder()
            .method(Method::GET)
            .uri("/whoami")
            .header("x-request-id", "req-1")
            .body(Body::empty())
            .unwrap();

        let response = app(tm).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-1");
        assert_eq!(body_string(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_optional_auth_rejects_invalid_token() {
        let mut tm = MockTokenManager::new();
        tm.expect_validate_access_token().returning(|_| Err(JwtError::InvalidToken));

        let request = axum::http::Request::builder()
            .method(Method::GET)
            .uri("/whoami")
            .header("authorization", "Bearer invalid_token")
            .body(Body::empty())
            .unwrap();

        let response = app(tm).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_optional_auth_rejects_non_bearer_scheme() {
        let mut tm = MockTokenManager::new();
        tm.expect_validate_access_token().never();

        let request = axum::http::Request::builder()
            .method(Method::GET)
            .uri("/whoami")
            .header("authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let response = app(tm).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
