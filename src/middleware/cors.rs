use axum::http::{
    header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
    HeaderValue,
};
use tower::layer::util::{Identity, Stack};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::SecurityConfig;

pub type CorsLayers = Stack<
    SetResponseHeaderLayer<HeaderValue>,
    Stack<SetResponseHeaderLayer<HeaderValue>, Stack<SetResponseHeaderLayer<HeaderValue>, Identity>>,
>;

/// Static CORS headers on every response. Preflights are answered by the
/// routes themselves with 204.
pub fn cors_layers(security: &SecurityConfig) -> CorsLayers {
    let origin = HeaderValue::from_str(&security.allowed_origin).unwrap_or_else(|_| {
        tracing::warn!("SITE_URL '{}' is not a valid header value; using *", security.allowed_origin);
        HeaderValue::from_static("*")
    });

    tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(ACCESS_CONTROL_ALLOW_ORIGIN, origin))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        ))
        .into_inner()
}
