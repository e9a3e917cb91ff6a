//! HTTP handler for inbound provider webhooks.
//!
//! The body is taken as raw `Bytes` and handed to the provider adapter
//! untouched; JSON is only parsed after the signature has been checked.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::ProcessWebhookCommand;
use crate::domain::purchase::ProviderKind;

use super::super::AppState;

/// Route segment → provider. Only the exact canonical names route.
pub fn provider_for_segment(segment: &str) -> Option<ProviderKind> {
    ProviderKind::ALL
        .iter()
        .copied()
        .find(|kind| kind.as_str() == segment)
}

/// Status acknowledging an accepted delivery.
pub fn success_status(kind: ProviderKind) -> StatusCode {
    if kind.expects_async_ack() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::NO_CONTENT
    }
}

/// POST /webhooks/:provider
///
/// Responds with an empty body in every case.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(provider) = provider_for_segment(&segment) else {
        tracing::debug!(segment = %segment, "Webhook for unknown provider");
        return StatusCode::NOT_FOUND.into_response();
    };

    let cmd = ProcessWebhookCommand {
        provider,
        headers,
        body,
    };

    match state.webhook_handler().handle(cmd).await {
        Ok(_) => success_status(provider).into_response(),
        Err(err) => err.status_code().into_response(),
    }
}
