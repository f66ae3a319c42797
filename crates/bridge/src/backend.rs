//! Request/response surface of the backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tigre_model::event::decode_double_encoded;
use tigre_model::{LayerRef, Output, Symbology};
use tracing::warn;

use crate::error::{BridgeError, Result};

/// Default bound on a single backend call made outside the redraw path.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Opaque intermediate form returned by `read` and consumed by `eval`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadForm(pub Value);

/// Commands the client invokes on the backend.
///
/// Implementations carry no client logic; decoding of the wire encodings
/// lives in the provided helpers below.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
	/// Parses free text into the backend's intermediate form.
	async fn read(&self, command: &str) -> Result<ReadForm>;

	/// Evaluates a parsed form, returning JSON-encoded [`Output`].
	async fn eval(&self, form: ReadForm) -> Result<String>;

	/// Returns one JSON-encoded geometry collection per stored row.
	async fn get_as_json_gpkg(&self, layer: &LayerRef) -> Result<Vec<String>>;

	/// Returns the layer's symbology as double-encoded JSON.
	async fn get_layer_symbology(&self, layer: &LayerRef) -> Result<String>;
}

pub type SharedBackend = Arc<dyn Backend>;

/// Decoded geometry for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySet {
	pub layer: LayerRef,
	pub geometries: Vec<Value>,
}

impl GeometrySet {
	/// Decodes the per-row JSON strings, dropping rows that are not JSON.
	pub fn decode(layer: LayerRef, rows: Vec<String>) -> Self {
		let mut geometries = Vec::with_capacity(rows.len());
		for (index, row) in rows.iter().enumerate() {
			match serde_json::from_str::<Value>(row) {
				Ok(value) => geometries.push(value),
				Err(error) => warn!(layer = %layer, index, %error, "bridge.geometry.undecodable_row"),
			}
		}
		Self { layer, geometries }
	}
}

/// Runs `read` then `eval` and decodes the resulting [`Output`].
pub async fn run_command(backend: &dyn Backend, command: &str) -> Result<Output> {
	let form = backend.read(command).await?;
	let encoded = backend.eval(form).await?;
	Ok(serde_json::from_str(&encoded)?)
}

/// Fetches and decodes one layer's geometry.
pub async fn fetch_geometry(backend: &dyn Backend, layer: &LayerRef) -> Result<GeometrySet> {
	let rows = backend.get_as_json_gpkg(layer).await?;
	Ok(GeometrySet::decode(layer.clone(), rows))
}

/// Fetches and decodes one layer's symbology.
pub async fn fetch_symbology(backend: &dyn Backend, layer: &LayerRef) -> Result<Symbology> {
	let raw = backend.get_layer_symbology(layer).await?;
	Ok(decode_double_encoded(&raw)?)
}

/// Runs `call`, failing with [`BridgeError::TimedOut`] once `limit` elapses.
pub async fn bounded<T>(command: &'static str, limit: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
	match tokio::time::timeout(limit, call).await {
		Ok(result) => result,
		Err(_) => Err(BridgeError::TimedOut { command, after: limit }),
	}
}
