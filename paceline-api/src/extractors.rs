//! Custom query-string extractor.
//!
//! Axum's default `Query` rejection is a plain-text 400, which breaks the
//! JSON error envelope every other path returns. `ApiQuery<T>` extracts the
//! same way but maps malformed input into an [`ApiError`].

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Query-string extractor whose rejection is the API's JSON error shape.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_progress(
///     ApiQuery(params): ApiQuery<ProgressParams>,
/// ) -> ApiResult<Json<Value>> {
///     // params.limit failed to parse? The caller got a VALIDATION_FAILED
///     // body, not axum's plain-text rejection.
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation_failed(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Page {
        limit: Option<i64>,
    }

    async fn extract(uri: &str) -> Result<ApiQuery<Page>, ApiError> {
        let (mut parts, _) = Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        ApiQuery::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_well_formed_query_parses() {
        let ApiQuery(page) = extract("/report?limit=25").await.unwrap();
        assert_eq!(page.limit, Some(25));
    }

    #[tokio::test]
    async fn test_malformed_query_maps_to_validation_error() {
        let err = extract("/report?limit=abc").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
