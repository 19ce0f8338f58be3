//! Request body decoding and response encoding.

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use roamdb_core::{RoamError, RoamResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a write body into a patch.
///
/// The body must be a JSON object and no field may be `null`. Unknown fields
/// are ignored; type mismatches are malformed input.
pub fn decode_patch<T: DeserializeOwned>(body: &[u8]) -> RoamResult<T> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RoamError::malformed(format!("body is not JSON: {}", e)))?;
    let Value::Object(fields) = &value else {
        return Err(RoamError::malformed("body must be a JSON object"));
    };
    if let Some((name, _)) = fields.iter().find(|(_, v)| v.is_null()) {
        return Err(RoamError::malformed(format!("`{}` is null", name)));
    }
    serde_json::from_value(value).map_err(|e| RoamError::malformed(e.to_string()))
}

fn json(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}

/// `{"avg": x.xxxxx}` with exactly five decimals.
pub fn average_body(avg: f64) -> Response {
    json(format!("{{\"avg\": {:.5}}}", avg))
}

/// Empty object acknowledging a write. The connection is closed afterwards.
pub fn write_ack() -> Response {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CONNECTION, HeaderValue::from_static("close")),
        ],
        "{}",
    )
        .into_response()
}
