//! Feed message classification.
//!
//! Decides whether an inbound payload describes a storable token and
//! extracts its fields. Payload shapes differ by channel: creation events
//! carry `mint`, trade events may carry `token` or `address`. The first
//! non-empty field in the order `address`, `token`, `mint` wins.

use crate::error::Result;
use crate::record::TokenFields;
use serde_json::Value;

/// Address-bearing fields, in precedence order.
const ADDRESS_FIELDS: [&str; 3] = ["address", "token", "mint"];

/// Number of signature characters shown in logs.
const SIGNATURE_PREVIEW_LEN: usize = 10;

/// Decode a text frame into a JSON value.
pub fn decode_frame(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Check whether the payload is an object carrying a `signature` field.
///
/// Presence is what matters; the value itself is not inspected.
pub fn is_signed(payload: &Value) -> bool {
    payload
        .as_object()
        .is_some_and(|obj| obj.contains_key("signature"))
}

/// Classify a decoded payload.
///
/// Returns `None` for unsigned payloads and for payloads with no non-empty
/// address-bearing field.
pub fn classify(payload: &Value) -> Option<TokenFields> {
    if !is_signed(payload) {
        return None;
    }

    let address = ADDRESS_FIELDS
        .iter()
        .map(|field| str_field(payload, field))
        .find(|value| !value.is_empty())?;

    Some(TokenFields {
        address: address.to_string(),
        name: str_field(payload, "name").to_string(),
        symbol: str_field(payload, "symbol").to_string(),
    })
}

/// Short prefix of the payload's signature for log lines.
pub fn signature_preview(payload: &Value) -> String {
    match payload.get("signature") {
        Some(Value::String(sig)) => sig.chars().take(SIGNATURE_PREVIEW_LEN).collect(),
        Some(other) => other
            .to_string()
            .chars()
            .take(SIGNATURE_PREVIEW_LEN)
            .collect(),
        None => String::new(),
    }
}

fn str_field<'a>(payload: &'a Value, field: &str) -> &'a str {
    payload.get(field).and_then(Value::as_str).unwrap_or("")
}
