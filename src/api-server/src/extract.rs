//! Request body extraction for scope endpoints

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that has been parsed and validated
///
/// Malformed bodies, missing fields and failed validation all reject with
/// [`ApiError::ValidationError`], so callers always get the JSON error shape.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DepartmentsRequest;
    use axum::{body::Body, http::StatusCode};

    fn request(content_type: Option<&str>, body: &str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(Body::from(body.to_owned())).unwrap()
    }

    async fn extract(content_type: Option<&str>, body: &str) -> Result<DepartmentsRequest, ApiError> {
        ValidatedJson::<DepartmentsRequest>::from_request(request(content_type, body), &())
            .await
            .map(|ValidatedJson(req)| req)
    }

    #[tokio::test]
    async fn test_valid_body() {
        let req = extract(
            Some("application/json"),
            r#"{"user": {"userId": "u-1"}, "propertyId": "P1"}"#,
        )
        .await
        .unwrap();
        assert_eq!(req.property_id, "P1");
        assert!(req.user.assignments.is_empty());
    }

    #[tokio::test]
    async fn test_rejections_are_validation_errors() {
        let cases = [
            (Some("application/json"), r#"{"user": "#),
            (Some("application/json"), r#"{"propertyId": "P1"}"#),
            (Some("application/json"), r#"{"user": {"userId": ""}, "propertyId": "P1"}"#),
            (None, r#"{"user": {"userId": "u-1"}, "propertyId": "P1"}"#),
        ];

        for (content_type, body) in cases {
            let err = extract(content_type, body).await.unwrap_err();
            assert!(matches!(err, ApiError::ValidationError(_)), "{body}");
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert!(!err.is_indeterminate());
        }
    }
}
