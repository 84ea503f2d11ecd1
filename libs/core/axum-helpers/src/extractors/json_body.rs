//! JSON body extractor that reports rejections in the standard error shape.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

/// JSON extractor whose rejections are rendered as `400 {"error": "..."}`.
///
/// Axum's own `Json` answers with plain-text bodies and a mix of 400, 415
/// and 422. Handlers that take `JsonBody<T>` get a single client-error status
/// for syntax errors, type mismatches and a missing `Content-Type`.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::JsonBody;
///
/// async fn create(JsonBody(payload): JsonBody<serde_json::Value>) -> String {
///     payload.to_string()
/// }
/// ```
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(data))
    }
}
