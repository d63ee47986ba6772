//! Request middleware for the scope API
//!
//! Every request gets a [`RequestId`] and runs inside a tracing span that
//! carries it, so decision logs from handlers and the resolver can be joined
//! to the access log line. Callers are authenticated upstream; the user
//! context arrives in the body.

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation id for one request
///
/// Taken from `x-request-id` when the caller sent a UUID, generated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok());
        Self(supplied.unwrap_or_else(Uuid::new_v4))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Scope checks are POST, health, metrics and docs are GET
pub fn cors_layer() -> CorsLayer {
    let request_id = HeaderName::from_static(X_REQUEST_ID);
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            request_id.clone(),
        ])
        .expose_headers([request_id])
        .max_age(Duration::from_secs(3600))
}

/// Assigns the request id and runs the rest of the stack inside its span
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    request.extensions_mut().insert(request_id);

    let span = info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

/// One access log line per request
///
/// Health checks and metric scrapes log at debug so they do not drown out
/// scope traffic.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let routine = matches!(path.as_str(), "/health" | "/metrics");

    let start = Instant::now();
    let response = next.run(request).await;
    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    match status {
        500..=599 => warn!(%method, %path, status, duration_ms, "Request failed"),
        400..=499 => warn!(%method, %path, status, duration_ms, "Request rejected"),
        _ if routine => debug!(%method, %path, status, duration_ms, "Request completed"),
        _ => info!(%method, %path, status, duration_ms, "Request completed"),
    }

    response
}

/// Logs 5xx responses; a 503 means a scope decision could not be made
pub async fn server_error_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    match response.status() {
        StatusCode::SERVICE_UNAVAILABLE => {
            error!(%path, "Scope decision indeterminate, directory unavailable")
        }
        status if status.is_server_error() => {
            error!(%path, status = status.as_u16(), "Server error occurred")
        }
        _ => {}
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    async fn ok() -> &'static str {
        "OK"
    }

    async fn unavailable() -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }

    async fn echo_request_id(Extension(id): Extension<RequestId>) -> String {
        id.to_string()
    }

    fn with_request_id(router: Router) -> Router {
        router.layer(middleware::from_fn(request_id_middleware))
    }

    async fn get_with_id(app: Router, id: Option<&str>) -> Response {
        let mut request = Request::builder().uri("/");
        if let Some(id) = id {
            request = request.header(X_REQUEST_ID, id);
        }
        app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let app = with_request_id(Router::new().route("/", get(ok)));

        let response = get_with_id(app, None).await;

        let header = response.headers().get(X_REQUEST_ID).unwrap();
        assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_supplied_request_id_reaches_handler() {
        let app = with_request_id(Router::new().route("/", get(echo_request_id)));

        let id = "6f1c1d4e-7d2b-4a7e-9a55-0c6d1b7f2a10";
        let response = get_with_id(app, Some(id)).await;

        assert_eq!(response.headers().get(X_REQUEST_ID).unwrap(), id);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], id.as_bytes());
    }

    #[tokio::test]
    async fn test_malformed_request_id_replaced() {
        let app = with_request_id(Router::new().route("/", get(echo_request_id)));

        let response = get_with_id(app, Some("shift-42")).await;

        let echoed = response.headers().get(X_REQUEST_ID).unwrap().to_str().unwrap().to_owned();
        assert_ne!(echoed, "shift-42");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], echoed.as_bytes());
    }

    #[tokio::test]
    async fn test_cors_preflight_for_scope_check() {
        let app = Router::new().route("/", get(ok)).layer(cors_layer());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header(header::ORIGIN, "http://scheduler.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let allowed = response.headers().get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap();
        assert!(allowed.to_str().unwrap().contains(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_logging_layers_pass_status_through() {
        let app = with_request_id(
            Router::new()
                .route("/", get(unavailable))
                .route("/health", get(ok))
                .layer(middleware::from_fn(server_error_middleware))
                .layer(middleware::from_fn(logging_middleware)),
        );

        let response = get_with_id(app.clone(), None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
