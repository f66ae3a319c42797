//! Wire messages of the line-delimited JSON transport.
//!
//! One JSON object per line:
//! * request (client → backend): `{"id": 1, "command": "read", "args": {...}}`
//! * response (backend → client): `{"id": 1, "ok": ...}` or `{"id": 1, "error": "..."}`
//! * event (backend → client): `{"event": "loading", "payload": ...}`

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Simple counter-based request id generator.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct CounterIdGen(u64);

impl CounterIdGen {
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub(crate) fn next(&mut self) -> u64 {
		self.0 += 1;
		self.0
	}
}

#[derive(Debug, Serialize)]
pub(crate) struct WireRequest<'a> {
	pub id: u64,
	pub command: &'a str,
	pub args: &'a Value,
}

/// Classification of one inbound line.
#[derive(Debug, PartialEq)]
pub(crate) enum Inbound {
	Response { id: u64, result: Result<Value, String> },
	Event { name: String, payload: Value },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInbound {
	Response {
		id: u64,
		#[serde(default)]
		ok: Option<Value>,
		#[serde(default)]
		error: Option<String>,
	},
	Event {
		event: String,
		#[serde(default)]
		payload: Value,
	},
}

impl Inbound {
	pub(crate) fn parse(line: &str) -> Result<Self, serde_json::Error> {
		Ok(match serde_json::from_str(line)? {
			RawInbound::Response { id, ok, error } => Inbound::Response {
				id,
				result: match error {
					Some(message) => Err(message),
					None => Ok(ok.unwrap_or(Value::Null)),
				},
			},
			RawInbound::Event { event, payload } => Inbound::Event { name: event, payload },
		})
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[test]
	fn splits_responses_and_events() {
		assert_eq!(
			Inbound::parse(r#"{"id": 3, "ok": ["a"]}"#).unwrap(),
			Inbound::Response {
				id: 3,
				result: Ok(json!(["a"])),
			}
		);
		assert_eq!(
			Inbound::parse(r#"{"id": 4, "error": "no database"}"#).unwrap(),
			Inbound::Response {
				id: 4,
				result: Err("no database".into()),
			}
		);
		assert_eq!(
			Inbound::parse(r#"{"event": "close-table"}"#).unwrap(),
			Inbound::Event {
				name: "close-table".into(),
				payload: Value::Null,
			}
		);
		assert!(Inbound::parse(r#"{"hello": 1}"#).is_err());
	}

	#[test]
	fn request_ids_start_at_one() {
		let mut ids = CounterIdGen::default();
		assert_eq!(ids.next(), 1);
		assert_eq!(ids.next(), 2);
	}

	#[test]
	fn request_serializes_flat() {
		let args = json!({ "cmd": "db current" });
		let line = serde_json::to_string(&WireRequest {
			id: 7,
			command: "read",
			args: &args,
		})
		.unwrap();
		assert_eq!(line, r#"{"id":7,"command":"read","args":{"cmd":"db current"}}"#);
	}
}
