use axum::{extract::Request, middleware::Next, response::Response};
use http::HeaderValue;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tag every request/response pair with an id so log lines can be
/// correlated. An incoming id is kept; a missing or unusable one is
/// replaced with a fresh uuid.
pub async fn inject_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let Ok(header_value) = HeaderValue::from_str(&request_id) else {
        return next.run(request).await;
    };

    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value.clone());
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value);
    response
}
