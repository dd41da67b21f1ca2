use crate::model::IntakeResponse;
use crate::server::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub async fn serve_widget_script(State(_state): State<AppState>) -> impl IntoResponse {
    let script = match tokio::fs::read_to_string("assets/widget.js").await {
        Ok(script) => script,
        Err(_) => crate::sdk::widget_script(),
    };
    let mut resp = Response::new(script);
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/javascript"),
    );
    resp
}

/// Largest intake body read before the request is answered with an error.
pub const MAX_INTAKE_BODY: usize = 1024 * 1024;

/// Reads the raw body itself so oversized or malformed payloads reach the
/// handler instead of an extractor rejection; the reply is always 200.
pub async fn post_intake(State(state): State<AppState>, body: Body) -> impl IntoResponse {
    match axum::body::to_bytes(body, MAX_INTAKE_BODY).await {
        Ok(bytes) => Json(state.intake.handle(&bytes).await),
        Err(err) => {
            tracing::warn!(%err, limit = MAX_INTAKE_BODY, "intake body rejected");
            Json(IntakeResponse::error(format!("payload too large: {err}")))
        }
    }
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sheet_backend": state.config.sheet_backend,
    }))
}
