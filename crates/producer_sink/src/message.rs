//! JSON wire payloads.
//!
//! A message is a JSON object sent as a single UTF-8 frame with no envelope.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// A mapping-shaped message.
pub type Message = serde_json::Map<String, Value>;

pub(crate) fn encode(message: &Message) -> Result<Vec<u8>> {
	Ok(serde_json::to_vec(message)?)
}

/// Decodes one frame, rejecting anything that is not a JSON object.
pub(crate) fn decode(frame: &[u8]) -> Result<Message> {
	match serde_json::from_slice::<Value>(frame)? {
		Value::Object(map) => Ok(map),
		other => Err(Error::MalformedMessage(format!(
			"expected a JSON object, got {}",
			kind_of(&other)
		))),
	}
}

/// Converts any serializable value into a [`Message`].
///
/// # Errors
///
/// Returns [`Error::MalformedMessage`] if `value` fails to serialize or does
/// not serialize to a JSON object.
pub fn to_message<T: Serialize + ?Sized>(value: &T) -> Result<Message> {
	match serde_json::to_value(value)? {
		Value::Object(map) => Ok(map),
		other => Err(Error::MalformedMessage(format!(
			"expected a value serializing to a JSON object, got {}",
			kind_of(&other)
		))),
	}
}

/// Converts a [`Message`] into a typed value.
///
/// # Errors
///
/// Returns [`Error::MalformedMessage`] if the object does not match `T`.
pub fn from_message<T: DeserializeOwned>(message: Message) -> Result<T> {
	Ok(serde_json::from_value(Value::Object(message))?)
}

const fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde::Deserialize;
	use serde_json::json;

	use super::*;
	use crate::error::ErrorKind;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Job {
		my_id: String,
		weight: u32,
	}

	#[test]
	fn empty_object_is_a_message() {
		let msg = decode(b"{}").unwrap();
		assert!(msg.is_empty());
	}

	#[test]
	fn non_objects_are_malformed() {
		let frames: [&[u8]; 6] = [b"[1,2]", b"42", b"\"x\"", b"null", b"{\"a\":", b"\xff\xfe"];
		for frame in frames {
			assert_eq!(decode(frame).unwrap_err().kind(), ErrorKind::MalformedMessage);
		}
	}

	#[test]
	fn typed_values_pass_through_messages() {
		let job = Job {
			my_id: "P_3".into(),
			weight: 7,
		};
		let msg = to_message(&job).unwrap();
		assert_eq!(Value::Object(msg.clone()), json!({"my_id": "P_3", "weight": 7}));

		let frame = encode(&msg).unwrap();
		let back: Job = from_message(decode(&frame).unwrap()).unwrap();
		assert_eq!(back, job);
	}

	#[test]
	fn scalar_values_are_not_messages() {
		assert_eq!(to_message(&5u8).unwrap_err().kind(), ErrorKind::MalformedMessage);
		assert_eq!(to_message(&vec![1, 2]).unwrap_err().kind(), ErrorKind::MalformedMessage);
	}
}
