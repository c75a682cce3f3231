use super::{
    crypto, db_ops,
    errors::ServerError,
    export,
    extractors::DashboardAuth,
    line::events::WebhookBody,
    models::AppState,
    richmenu, webhook,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};

const BODY_PREVIEW_LEN: usize = 100;

pub async fn root() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// LINE pings the webhook URL with other methods when it is configured.
pub async fn webhook_ping() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(crypto::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let valid = match &state.config.line_channel_secret {
        Some(secret) => crypto::is_valid(secret.as_bytes(), &body, signature),
        None => {
            tracing::error!("LINE_CHANNEL_SECRET is not set");
            false
        }
    };
    if !valid {
        tracing::warn!("invalid webhook signature");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Invalid signature" })),
        );
    }

    let body: WebhookBody = match serde_json::from_slice(&body) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("unreadable webhook body: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid body" })),
            );
        }
    };
    tracing::info!(events = body.events.len(), "webhook delivery");
    webhook::handle_delivery(&state, body).await;

    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn dashboard(
    _: DashboardAuth,
    State(AppState { store, .. }): State<AppState>,
) -> Result<impl IntoResponse, ServerError> {
    let data = db_ops::get_dashboard_data(store.as_ref()).await?;

    Ok(Json(data))
}

pub async fn export_csv(
    _: DashboardAuth,
    State(AppState { store, .. }): State<AppState>,
) -> Result<impl IntoResponse, ServerError> {
    let transactions = store.list_transactions(None).await?;
    let csv = export::transactions_csv(transactions)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!(
            "attachment; filename=\"{}\"",
            export::filename(Utc::now().date_naive())
        ))?,
    );

    Ok((headers, csv))
}

/// Stream a stored receipt photo back from LINE, since the browser can't
/// send the bot token itself.
pub async fn receipt_image(
    _: DashboardAuth,
    State(AppState { line, .. }): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let not_found = || (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })));
    // the id becomes part of the LINE content URL
    if message_id.is_empty() || !message_id.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(not_found());
    }
    let content = line.get_content(&message_id).await.map_err(|e| {
        tracing::warn!(%message_id, "receipt image unavailable: {e:#}");
        not_found()
    })?;
    let content_type = HeaderValue::from_str(&content.content_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));

    Ok(([(CONTENT_TYPE, content_type)], content.bytes))
}

/// What JavaScript's `typeof` would call a request body.
fn body_type(body: &[u8]) -> (&'static str, Option<Value>) {
    if body.is_empty() {
        return ("undefined", None);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(v) => {
            let kind = match v {
                Value::Bool(_) => "boolean",
                Value::Number(_) => "number",
                Value::String(_) => "string",
                Value::Null | Value::Array(_) | Value::Object(_) => "object",
            };
            (kind, Some(v))
        }
        Err(_) => ("string", None),
    }
}

/// Everything needed to work out why LINE deliveries aren't landing,
/// without leaking any secret in full.
pub async fn debug(
    State(AppState { config, .. }): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let env_check: Map<String, Value> = config
        .env_check()
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v)))
        .collect();

    let (kind, parsed) = body_type(&body);
    let preview = match parsed {
        Some(v) => v.to_string(),
        None if body.is_empty() => "null".to_string(),
        None => String::from_utf8_lossy(&body).into_owned(),
    };
    let preview: String = preview.chars().take(BODY_PREVIEW_LEN).collect();

    let signature = if headers.contains_key(crypto::SIGNATURE_HEADER) {
        "present"
    } else {
        "missing"
    };

    Json(json!({
        "method": method.as_str(),
        "envCheck": env_check,
        "bodyType": kind,
        "bodyPreview": preview,
        "headers": {
            "content-type": headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            "x-line-signature": signature,
        },
    }))
}

pub async fn setup_richmenu(
    State(AppState { line, config, .. }): State<AppState>,
) -> impl IntoResponse {
    if config.line_channel_access_token.is_none() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Missing LINE_CHANNEL_ACCESS_TOKEN" })),
        );
    }

    match richmenu::setup(line.as_ref(), &config.dashboard_url).await {
        Ok(rich_menu_id) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "richMenuId": rich_menu_id,
                "message": "Rich Menu สร้างสำเร็จ!",
            })),
        ),
        Err(e) => {
            tracing::error!(step = e.error, "rich menu setup failed: {}", e.details);
            let mut body = json!({ "error": e.error, "details": e.details });
            if let Some(id) = e.rich_menu_id {
                body["richMenuId"] = Value::String(id);
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
    }
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_type() {
        assert_eq!(body_type(b"").0, "undefined");
        assert_eq!(body_type(br#"{"events":[]}"#).0, "object");
        assert_eq!(body_type(b"[1]").0, "object");
        assert_eq!(body_type(b"42").0, "number");
        assert_eq!(body_type(b"not json").0, "string");
    }
}
