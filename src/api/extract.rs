//! Request extractors whose rejections use the JSON error body
//!
//! axum's own `Json`, `Query` and `Form` reject with plain text. These
//! wrappers run the same extraction and convert the rejection into a
//! [`CuraError`], so a malformed body or query string gets
//! `{error, message, trace_id}` like every other failure.

use crate::core::error::CuraError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Form, Json,
};
use serde::de::DeserializeOwned;

/// JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CuraError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// URL query string
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CuraError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// URL-encoded form body
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for FormBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CuraError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{self, header},
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        count: u32,
    }

    fn json_request(body: &str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_body_extracts() {
        let request = json_request(r#"{"count":3}"#);
        let JsonBody(sample) = JsonBody::<Sample>::from_request(request, &()).await.unwrap();
        assert_eq!(sample.count, 3);
    }

    #[tokio::test]
    async fn test_json_type_mismatch_is_validation_error() {
        let err = JsonBody::<Sample>::from_request(json_request(r#"{"count":"many"}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, CuraError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_json_syntax_error_is_invalid_request() {
        let err = JsonBody::<Sample>::from_request(json_request("{count"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, CuraError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_bad_query_is_invalid_request() {
        let request = http::Request::builder()
            .uri("/?count=abc")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let err = QueryParams::<Sample>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, CuraError::InvalidRequest(_)));
    }
}
