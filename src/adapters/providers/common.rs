//! Helpers shared by the provider adapters.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::purchase::{OwnerRef, ProviderKind, WebhookError, ORGANIZATION_ID_KEY, USER_ID_KEY};
use crate::ports::PaymentError;

/// Decodes a provider API response, mapping non-success statuses to
/// [`PaymentError`].
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: ProviderKind,
    response: reqwest::Response,
) -> Result<T, PaymentError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(
            provider = %provider,
            status = status.as_u16(),
            error = %error_text,
            "Provider API call failed"
        );
        return Err(PaymentError::from_status(provider, status.as_u16(), &error_text));
    }

    response
        .json()
        .await
        .map_err(|e| PaymentError::unexpected_response(provider, e))
}

/// Like [`read_json`] for calls whose response body is irrelevant.
pub(crate) async fn expect_success(
    provider: ProviderKind,
    response: reqwest::Response,
) -> Result<(), PaymentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let error_text = response.text().await.unwrap_or_default();
    tracing::error!(
        provider = %provider,
        status = status.as_u16(),
        error = %error_text,
        "Provider API call failed"
    );
    Err(PaymentError::from_status(provider, status.as_u16(), &error_text))
}

pub(crate) fn network_error(provider: ProviderKind, err: reqwest::Error) -> PaymentError {
    tracing::warn!(provider = %provider, error = %err, "Provider API unreachable");
    PaymentError::network(err.to_string())
}

/// Decodes a verified body, reporting malformed JSON as a bad request.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, WebhookError> {
    serde_json::from_slice(body).map_err(|e| WebhookError::ParseError(e.to_string()))
}

/// Decodes the event object of an envelope into its typed shape.
pub(crate) fn parse_object<T: DeserializeOwned>(object: Value) -> Result<T, WebhookError> {
    serde_json::from_value(object).map_err(|e| WebhookError::ParseError(e.to_string()))
}

/// Identifier that some APIs send as a number and others as a string.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identifier of an expandable reference: either the id itself or an
/// object with an `id` field.
pub(crate) fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("id").and_then(id_string),
        other => id_string(other),
    }
}

/// Reads the owner from a provider metadata map.
pub(crate) fn owner_from_metadata(
    metadata: Option<&Map<String, Value>>,
) -> Result<Option<OwnerRef>, WebhookError> {
    let Some(metadata) = metadata else {
        return Ok(None);
    };
    let organization_id = metadata.get(ORGANIZATION_ID_KEY).and_then(id_string);
    let user_id = metadata.get(USER_ID_KEY).and_then(id_string);

    OwnerRef::from_metadata(organization_id.as_deref(), user_id.as_deref())
        .map_err(|_| WebhookError::MissingMetadata("exactly one of organization_id or user_id"))
}

/// Reads the owner, failing when none is present.
pub(crate) fn require_owner(
    metadata: Option<&Map<String, Value>>,
) -> Result<OwnerRef, WebhookError> {
    owner_from_metadata(metadata)?.ok_or(WebhookError::MissingMetadata("organization_id or user_id"))
}

/// Metadata maps some platforms serialise as a JSON string.
pub(crate) fn metadata_map(value: Option<&Value>) -> Option<Map<String, Value>> {
    match value? {
        Value::Object(map) => Some(map.clone()),
        Value::String(raw) => serde_json::from_str::<Map<String, Value>>(raw).ok(),
        _ => None,
    }
}

pub(crate) fn required<T>(value: Option<T>, field: &'static str) -> Result<T, WebhookError> {
    value.ok_or(WebhookError::MissingField(field))
}
