//! Named session events exchanged with the backend.
//!
//! Events arrive as `(name, payload)` pairs. [`SessionEvent::decode`] turns a
//! pair into a typed event; malformed payloads are rejected with an
//! [`EventError`] instead of being coerced.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Wire names of every event the client understands.
pub mod names {
	pub const ADD_VECTOR_LAYER: &str = "add-vector-layer";
	pub const ADD_RASTER_LAYER: &str = "add-raster-layer";
	pub const WIPE_LAYERS: &str = "wipe-layers";
	pub const LOADING: &str = "loading";
	pub const OPEN_TABLE: &str = "open-table";
	pub const CLOSE_TABLE: &str = "close-table";
}

/// Schema assumed when the backend names a layer without one.
pub const DEFAULT_SCHEMA: &str = "public";

/// Errors raised while decoding an event payload.
#[derive(Debug, Error)]
pub enum EventError {
	#[error("unknown event: {0}")]
	Unknown(String),
	#[error("malformed payload for '{event}': {reason}")]
	Malformed { event: &'static str, reason: String },
	#[error("payload decode failed: {0}")]
	Json(#[from] serde_json::Error),
}

impl EventError {
	fn malformed(event: &'static str, reason: impl Into<String>) -> Self {
		Self::Malformed {
			event,
			reason: reason.into(),
		}
	}
}

/// Typed session event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
	/// The backend created or restyled a vector layer.
	AddVectorLayer { name: String, schema: String },
	/// The backend exposed a raster layer.
	AddRasterLayer { name: String, schema: String },
	/// `true` asks the client to drop every vector layer.
	WipeLayers(bool),
	/// Progress percentage. Not clamped.
	Loading(i64),
	/// Opens the table view; `payload` is still double-encoded JSON.
	OpenTable { label: String, payload: String },
	CloseTable,
}

impl SessionEvent {
	/// Decodes a named event payload.
	pub fn decode(name: &str, payload: Value) -> Result<Self, EventError> {
		match name {
			names::ADD_VECTOR_LAYER => {
				let (name, schema) = layer_payload(names::ADD_VECTOR_LAYER, payload)?;
				Ok(Self::AddVectorLayer { name, schema })
			}
			names::ADD_RASTER_LAYER => {
				let (name, schema) = layer_payload(names::ADD_RASTER_LAYER, payload)?;
				Ok(Self::AddRasterLayer { name, schema })
			}
			names::WIPE_LAYERS => match payload {
				Value::Bool(wipe) => Ok(Self::WipeLayers(wipe)),
				other => Err(EventError::malformed(names::WIPE_LAYERS, format!("expected boolean, got {other}"))),
			},
			names::LOADING => loading_payload(payload).map(Self::Loading),
			names::OPEN_TABLE => {
				let parts: Vec<String> = serde_json::from_value(payload)?;
				match <[String; 2]>::try_from(parts) {
					Ok([label, payload]) => Ok(Self::OpenTable { label, payload }),
					Err(parts) => Err(EventError::malformed(
						names::OPEN_TABLE,
						format!("expected [label, json], got {} elements", parts.len()),
					)),
				}
			}
			names::CLOSE_TABLE => Ok(Self::CloseTable),
			other => Err(EventError::Unknown(other.to_string())),
		}
	}

	pub const fn name(&self) -> &'static str {
		match self {
			Self::AddVectorLayer { .. } => names::ADD_VECTOR_LAYER,
			Self::AddRasterLayer { .. } => names::ADD_RASTER_LAYER,
			Self::WipeLayers(_) => names::WIPE_LAYERS,
			Self::Loading(_) => names::LOADING,
			Self::OpenTable { .. } => names::OPEN_TABLE,
			Self::CloseTable => names::CLOSE_TABLE,
		}
	}

	/// Encodes the payload in its wire shape.
	pub fn payload(&self) -> Value {
		match self {
			Self::AddVectorLayer { name, schema } | Self::AddRasterLayer { name, schema } => {
				Value::from(vec![name.clone(), schema.clone()])
			}
			Self::WipeLayers(wipe) => Value::Bool(*wipe),
			Self::Loading(percent) => Value::String(percent.to_string()),
			Self::OpenTable { label, payload } => Value::from(vec![label.clone(), payload.clone()]),
			Self::CloseTable => Value::Null,
		}
	}
}

/// `[name, schema]`, `[name]` or a bare `name`.
fn layer_payload(event: &'static str, payload: Value) -> Result<(String, String), EventError> {
	match payload {
		Value::String(name) => Ok((name, DEFAULT_SCHEMA.to_string())),
		Value::Array(items) => {
			let mut strings = items.into_iter().map(|item| match item {
				Value::String(s) => Ok(s),
				other => Err(EventError::malformed(event, format!("expected string, got {other}"))),
			});
			let name = strings
				.next()
				.transpose()?
				.ok_or_else(|| EventError::malformed(event, "missing layer name"))?;
			let schema = strings.next().transpose()?.unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
			Ok((name, schema))
		}
		other => Err(EventError::malformed(event, format!("expected [name, schema], got {other}"))),
	}
}

/// Integer or stringified integer.
fn loading_payload(payload: Value) -> Result<i64, EventError> {
	match &payload {
		Value::Number(n) => n
			.as_i64()
			.ok_or_else(|| EventError::malformed(names::LOADING, format!("not an integer: {n}"))),
		Value::String(s) => s
			.trim()
			.parse::<i64>()
			.map_err(|_| EventError::malformed(names::LOADING, format!("not an integer: {s:?}"))),
		other => Err(EventError::malformed(names::LOADING, format!("expected integer, got {other}"))),
	}
}

/// Decodes a JSON string whose content is itself JSON.
///
/// Table payloads and layer symbology travel this way.
pub fn decode_double_encoded<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
	let inner: String = serde_json::from_str(raw)?;
	serde_json::from_str(&inner)
}
