use super::errors::ServerError;
use axum::{
    http::{
        header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, Method, Request,
    },
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};

/// The dashboard is a static site on another origin.
pub fn dashboard_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Ledger data must never sit in a shared cache.
pub async fn no_store<B>(
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, ServerError> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_str("no-store")?);

    Ok(response)
}
