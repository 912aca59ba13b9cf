use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, ErrorResponse};
use crate::handlers::{dispatch, Action};
use crate::state::AppState;

/// One inbound line
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub action: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub request_id: Option<serde_json::Value>,
}

/// One outbound line
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<serde_json::Value>,
}

impl GatewayResponse {
    fn ok(data: serde_json::Value, request_id: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            request_id,
        }
    }

    fn failed(err: &AppError, request_id: Option<serde_json::Value>) -> Self {
        let body = ErrorResponse::from(err);
        Self {
            success: false,
            data: None,
            error: Some(body.error),
            error_kind: Some(body.kind),
            request_id,
        }
    }
}

/// Serve line-delimited envelopes until the reader hits end of input.
///
/// Every non-blank line gets exactly one response line, in input order.
pub async fn serve<R, W>(state: &AppState, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(state, &line).await;
        let mut payload = serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                r#"{{"success":false,"error":"failed to encode response: {}"}}"#,
                e.to_string().replace('"', "'")
            )
        });
        payload.push('\n');

        writer.write_all(payload.as_bytes()).await?;
        writer.flush().await?;
    }

    tracing::info!("Input closed, gateway stopping");
    Ok(())
}

/// Decode, dispatch and package a single request line
pub async fn handle_line(state: &AppState, line: &str) -> GatewayResponse {
    let envelope: Envelope = match serde_json::from_str(line) {
        Ok(envelope) => envelope,
        Err(e) => {
            let err = AppError::Serialization(e.to_string());
            return GatewayResponse {
                error: Some(format!("invalid JSON: {}", e)),
                ..GatewayResponse::failed(&err, None)
            };
        }
    };

    let request_id = envelope.request_id;

    let action = match Action::decode(&envelope.action, envelope.data) {
        Ok(action) => action,
        Err(e) => {
            tracing::warn!(action = %envelope.action, error = %e, "Rejected request");
            return GatewayResponse::failed(&e, request_id);
        }
    };

    let name = action.name();
    tracing::debug!(action = name, "Handling action");

    match dispatch(state, action).await {
        Ok(data) => GatewayResponse::ok(data, request_id),
        Err(e) => {
            tracing::warn!(action = name, error = %e, kind = e.kind(), "Action failed");
            GatewayResponse::failed(&e, request_id)
        }
    }
}
