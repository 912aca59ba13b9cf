use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

/// Decode an action payload; a missing payload reads as `{}`
pub fn decode_payload<T>(data: serde_json::Value) -> AppResult<T>
where
    T: DeserializeOwned,
{
    let data = if data.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        data
    };

    serde_json::from_value(data)
        .map_err(|e| AppError::Validation(format!("invalid request data: {}", e)))
}

/// RFC 3339 rendering used in every response DTO
pub fn timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Probe {
        #[serde(default)]
        endpoint_id: i64,
    }

    #[test]
    fn test_null_payload_reads_as_empty_object() {
        let probe: Probe = decode_payload(serde_json::Value::Null).unwrap();
        assert_eq!(probe.endpoint_id, 0);
    }

    #[test]
    fn test_wrong_type_is_a_validation_error() {
        let err = decode_payload::<Probe>(serde_json::json!({"endpointId": "seven"})).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().starts_with("invalid request data:"));
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let at = time::macros::datetime!(2025-01-02 03:04:05 UTC);
        assert_eq!(timestamp(at), "2025-01-02T03:04:05Z");
    }
}
