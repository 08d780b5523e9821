//! Request plumbing shared by every route: request ids, CORS and JSON bodies
//! that fail in the API's error format.

use super::errors::ApiError;
use crate::config::ApiSettings;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use tower_http::cors::{Any, CorsLayer, ExposeHeaders};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client-supplied ids longer than this are replaced
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlates a request with its log lines and error body
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Echo the caller's `x-request-id` if it is usable, otherwise mint one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN);

        match supplied {
            Some(id) => Self(id.to_string()),
            None => Self(Uuid::new_v4().to_string()),
        }
    }
}

/// Game routes are plain GET/POST; `*` (or no list) opens them to any origin.
pub fn create_cors_layer(settings: &ApiSettings) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_headers(Any)
        .expose_headers(ExposeHeaders::list([HeaderName::from_static(REQUEST_ID_HEADER)]));

    let origins = &settings.allowed_origins;
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any).allow_methods(Any);
    }

    layer
        .allow_origin(
            origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST])
}

/// Tags the request with a [`RequestId`] and echoes it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    let header = HeaderValue::from_str(&request_id.0).ok();
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;
    if let Some(header) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    response
}

/// `Json` body whose rejections (bad syntax, out-of-range fields, sub-cent
/// amounts, wrong content type) come back as a 400 [`ApiError`].
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId::from_headers(request.headers()));

        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(request_id = %request_id.0, reason = %rejection.body_text(), "Rejected request body");
                Err(ApiError::bad_request(request_id.0, rejection.body_text()))
            }
        }
    }
}
