use crate::core::logging::with_trace_id;
use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// HTTP header name for trace ID
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Trace ID of the current request, available from request extensions
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Tag every request with a UUID trace ID.
///
/// The ID names the `http_request` span, is stored in request extensions,
/// is echoed in the `X-Trace-Id` response header, and is the `trace_id`
/// of any error body produced while handling the request.
pub async fn trace_id_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = Uuid::new_v4().to_string();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    request.extensions_mut().insert(TraceId(trace_id.clone()));

    let handled = async move {
        let started = std::time::Instant::now();
        let response = next.run(request).await;
        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
    .instrument(span);

    let mut response = with_trace_id(trace_id.clone(), handled).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CuraError;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    async fn echo_trace_id(Extension(trace_id): Extension<TraceId>) -> String {
        trace_id.as_str().to_string()
    }

    async fn fail() -> Result<(), CuraError> {
        Err(CuraError::NotFound("Trial not found".to_string()))
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", get(echo_trace_id))
            .route("/fail", get(fail))
            .layer(middleware::from_fn(trace_id_middleware))
    }

    async fn call(uri: &str) -> (String, StatusCode, Vec<u8>) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let header = response
            .headers()
            .get(TRACE_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (header, status, body.to_vec())
    }

    #[tokio::test]
    async fn test_trace_id_header_matches_handler_view() {
        let (header, status, body) = call("/echo").await;

        assert_eq!(status, StatusCode::OK);
        assert!(Uuid::parse_str(&header).is_ok());
        assert_eq!(String::from_utf8(body).unwrap(), header);
    }

    #[tokio::test]
    async fn test_error_body_carries_request_trace_id() {
        let (header, status, body) = call("/fail").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["trace_id"], header);
    }

    #[tokio::test]
    async fn test_trace_id_unique_per_request() {
        let (first, _, _) = call("/echo").await;
        let (second, _, _) = call("/echo").await;
        assert_ne!(first, second);
    }
}
