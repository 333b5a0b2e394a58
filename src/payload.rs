//! Outbound payload kinds and their wire encodings.

use arcstr::ArcStr;
use bytes::Bytes;

/// Payload of an outbound publish, as an explicit tagged union.
///
/// Each kind carries its own serialization rule, resolved at the call
/// boundary instead of by runtime type inspection:
///
/// - [`Payload::Json`] is rendered to its canonical JSON text
/// - [`Payload::Number`] becomes its base-10 text form
/// - [`Payload::Text`] and [`Payload::Binary`] pass through unchanged
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	Json(serde_json::Value),
	Number(f64),
	Text(String),
	Binary(Bytes),
}

impl Payload {
	/// Encodes the payload for the transport.
	pub fn to_bytes(&self) -> Bytes {
		match self {
			// Value rendering cannot fail: maps are string-keyed by
			// construction.
			| Payload::Json(value) => Bytes::from(value.to_string()),
			| Payload::Number(number) => Bytes::from(number.to_string()),
			| Payload::Text(text) => Bytes::from(text.clone()),
			| Payload::Binary(bytes) => bytes.clone(),
		}
	}
}

impl From<serde_json::Value> for Payload {
	fn from(value: serde_json::Value) -> Self {
		Payload::Json(value)
	}
}

impl From<f64> for Payload {
	fn from(number: f64) -> Self {
		Payload::Number(number)
	}
}

impl From<&str> for Payload {
	fn from(text: &str) -> Self {
		Payload::Text(text.to_string())
	}
}

impl From<String> for Payload {
	fn from(text: String) -> Self {
		Payload::Text(text)
	}
}

impl From<Bytes> for Payload {
	fn from(bytes: Bytes) -> Self {
		Payload::Binary(bytes)
	}
}

impl From<Vec<u8>> for Payload {
	fn from(bytes: Vec<u8>) -> Self {
		Payload::Binary(Bytes::from(bytes))
	}
}

/// An outbound publish request: topic plus payload.
///
/// Handed back unchanged inside the rejection error when the owning
/// connection is not in a state to send it, so the caller can retry or
/// re-route without reconstructing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
	pub topic: ArcStr,
	pub payload: Payload,
}

impl PublishRequest {
	pub fn new(topic: impl Into<ArcStr>, payload: impl Into<Payload>) -> Self {
		Self {
			topic: topic.into(),
			payload: payload.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn json_renders_canonical_text() {
		let payload = Payload::from(json!({"v": 21.5}));
		assert_eq!(payload.to_bytes(), Bytes::from(r#"{"v":21.5}"#));
	}

	#[test]
	fn numbers_render_base_10() {
		assert_eq!(Payload::from(21.5).to_bytes(), Bytes::from("21.5"));
		assert_eq!(Payload::from(3.0).to_bytes(), Bytes::from("3"));
	}

	#[test]
	fn text_and_binary_pass_through() {
		assert_eq!(Payload::from("on").to_bytes(), Bytes::from("on"));
		let raw = Bytes::from(vec![0x00, 0xff, 0x10]);
		assert_eq!(Payload::from(raw.clone()).to_bytes(), raw);
	}
}
