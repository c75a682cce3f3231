use super::{controllers, middleware, models};
use axum::{
    middleware::from_fn,
    routing::{any, get, post, Router},
};

#[rustfmt::skip]
pub fn get_routes() -> Router<models::AppState> {
    Router::new()
        .route("/", get(controllers::root))
        .route("/api/webhook", post(controllers::webhook).fallback(controllers::webhook_ping))
        .route("/api/debug", any(controllers::debug))
        .route("/api/setup-richmenu", get(controllers::setup_richmenu).fallback(controllers::method_not_allowed))
        .merge(dashboard_routes())
}

/// Read by the browser dashboard, so CORS applies and nothing is cached.
/// The CORS layer answers every `OPTIONS` request itself.
#[rustfmt::skip]
fn dashboard_routes() -> Router<models::AppState> {
    Router::new()
        .route("/api/dashboard", get(controllers::dashboard))
        .route("/api/export.csv", get(controllers::export_csv))
        .route("/api/images/:message_id", get(controllers::receipt_image))
        .layer(from_fn(middleware::no_store))
        .layer(middleware::dashboard_cors())
}
