use super::models::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;

/// Proof that the request carried the dashboard password as a bearer
/// token. With no password configured, nothing gets in.
pub struct DashboardAuth;

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    Some(value.strip_prefix("Bearer ").unwrap_or(value).trim())
}

#[async_trait]
impl FromRequestParts<AppState> for DashboardAuth {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized =
            || (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" })));

        let Some(password) = state.config.dashboard_password.as_deref() else {
            tracing::warn!("dashboard request refused: DASHBOARD_PASSWORD is not set");
            return Err(unauthorized());
        };
        let token = bearer_token(parts).ok_or_else(unauthorized)?;

        if bool::from(token.as_bytes().ct_eq(password.as_bytes())) {
            Ok(DashboardAuth)
        } else {
            Err(unauthorized())
        }
    }
}
