//! Scriptable in-memory backend for tests.
//!
//! Responses are configured per layer name or per command text. Calls are
//! recorded so tests can assert on what the client actually asked for.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tigre_model::{LayerRef, Output, Symbology};
use tokio::sync::Semaphore;

use crate::backend::{Backend, ReadForm};
use crate::error::{BridgeError, Result};

/// One recorded backend invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
	Read(String),
	Eval(String),
	Geometry(LayerRef),
	Symbology(LayerRef),
}

#[derive(Debug, Clone)]
enum Reply<T> {
	Value(T),
	Fail(String),
	Stall,
	/// Waits for the gate to open, then answers.
	Gated(Gate, T),
}

/// Holds back gated responses until opened. Stays open afterwards.
#[derive(Debug, Clone)]
pub struct Gate(Arc<Semaphore>);

impl Default for Gate {
	fn default() -> Self {
		Self(Arc::new(Semaphore::new(0)))
	}
}

impl Gate {
	pub fn open(&self) {
		self.0.add_permits(1);
	}

	async fn wait(&self) {
		// The permit is returned on drop, so every later waiter passes too.
		let _permit = self.0.acquire().await;
	}
}

#[derive(Default)]
struct Script {
	geometry: HashMap<String, Reply<Vec<String>>>,
	symbology: HashMap<String, Reply<String>>,
	outputs: HashMap<String, Reply<Output>>,
}

#[derive(Default)]
pub struct MockBackend {
	script: Mutex<Script>,
	calls: Mutex<Vec<MockCall>>,
}

impl MockBackend {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn shared(self) -> Arc<Self> {
		Arc::new(self)
	}

	/// Answers geometry requests for `name` with `geometries`, one row each.
	pub fn with_geometry(self, name: &str, geometries: Vec<Value>) -> Self {
		let rows = geometries.iter().map(Value::to_string).collect();
		self.script.lock().geometry.insert(name.into(), Reply::Value(rows));
		self
	}

	/// Answers symbology requests for `name` in the double-encoded form.
	pub fn with_symbology(self, name: &str, symbology: &Symbology) -> Self {
		self.script
			.lock()
			.symbology
			.insert(name.into(), Reply::Value(double_encode(symbology)));
		self
	}

	/// Answers `eval` of `command` with `output`.
	pub fn with_output(self, command: &str, output: Output) -> Self {
		self.script.lock().outputs.insert(command.into(), Reply::Value(output));
		self
	}

	pub fn fail_geometry(self, name: &str, message: &str) -> Self {
		self.script.lock().geometry.insert(name.into(), Reply::Fail(message.into()));
		self
	}

	pub fn fail_symbology(self, name: &str, message: &str) -> Self {
		self.script.lock().symbology.insert(name.into(), Reply::Fail(message.into()));
		self
	}

	/// Makes `read` of `command` fail.
	pub fn fail_command(self, command: &str, message: &str) -> Self {
		self.script.lock().outputs.insert(command.into(), Reply::Fail(message.into()));
		self
	}

	/// Geometry requests for `name` never complete.
	pub fn stall_geometry(self, name: &str) -> Self {
		self.script.lock().geometry.insert(name.into(), Reply::Stall);
		self
	}

	/// Symbology requests for `name` never complete.
	pub fn stall_symbology(self, name: &str) -> Self {
		self.script.lock().symbology.insert(name.into(), Reply::Stall);
		self
	}

	/// `eval` of `command` never completes.
	pub fn stall_command(self, command: &str) -> Self {
		self.script.lock().outputs.insert(command.into(), Reply::Stall);
		self
	}

	/// Geometry requests for `name` wait until the returned gate is opened.
	pub fn gate_geometry(&self, name: &str, geometries: Vec<Value>) -> Gate {
		let gate = Gate::default();
		let rows = geometries.iter().map(Value::to_string).collect();
		self.script
			.lock()
			.geometry
			.insert(name.into(), Reply::Gated(gate.clone(), rows));
		gate
	}

	/// Replaces the symbology answered for `name`.
	pub fn set_symbology(&self, name: &str, symbology: &Symbology) {
		self.script
			.lock()
			.symbology
			.insert(name.into(), Reply::Value(double_encode(symbology)));
	}

	pub fn calls(&self) -> Vec<MockCall> {
		self.calls.lock().clone()
	}

	/// Layers whose geometry was requested, in call order.
	pub fn geometry_calls(&self) -> Vec<LayerRef> {
		self.calls
			.lock()
			.iter()
			.filter_map(|call| match call {
				MockCall::Geometry(layer) => Some(layer.clone()),
				_ => None,
			})
			.collect()
	}

	/// Command texts passed to `read`, in call order.
	pub fn commands(&self) -> Vec<String> {
		self.calls
			.lock()
			.iter()
			.filter_map(|call| match call {
				MockCall::Read(text) => Some(text.clone()),
				_ => None,
			})
			.collect()
	}

	pub fn clear_calls(&self) {
		self.calls.lock().clear();
	}

	fn record(&self, call: MockCall) {
		self.calls.lock().push(call);
	}
}

fn double_encode(symbology: &Symbology) -> String {
	let inner = serde_json::to_string(symbology).unwrap_or_default();
	Value::String(inner).to_string()
}

async fn answer<T>(command: &'static str, reply: Option<Reply<T>>, fallback: T) -> Result<T> {
	match reply {
		None => Ok(fallback),
		Some(Reply::Value(value)) => Ok(value),
		Some(Reply::Fail(message)) => Err(BridgeError::Rejected { command, message }),
		Some(Reply::Stall) => std::future::pending().await,
		Some(Reply::Gated(gate, value)) => {
			gate.wait().await;
			Ok(value)
		}
	}
}

#[async_trait]
impl Backend for MockBackend {
	async fn read(&self, command: &str) -> Result<ReadForm> {
		self.record(MockCall::Read(command.to_string()));
		if let Some(Reply::Fail(message)) = self.script.lock().outputs.get(command) {
			return Err(BridgeError::Rejected {
				command: "read",
				message: message.clone(),
			});
		}
		Ok(ReadForm(json!({ "cmd": command })))
	}

	async fn eval(&self, form: ReadForm) -> Result<String> {
		let command = form.0["cmd"].as_str().unwrap_or_default().to_string();
		self.record(MockCall::Eval(command.clone()));
		let reply = self.script.lock().outputs.get(&command).cloned();
		let output = answer("eval", reply, Output::message(format!("ok: {command}"))).await?;
		Ok(serde_json::to_string(&output)?)
	}

	async fn get_as_json_gpkg(&self, layer: &LayerRef) -> Result<Vec<String>> {
		self.record(MockCall::Geometry(layer.clone()));
		let reply = self.script.lock().geometry.get(&layer.name).cloned();
		answer("get_as_json_gpkg", reply, Vec::new()).await
	}

	async fn get_layer_symbology(&self, layer: &LayerRef) -> Result<String> {
		self.record(MockCall::Symbology(layer.clone()));
		let reply = self.script.lock().symbology.get(&layer.name).cloned();
		let fallback = Reply::Fail(format!("no symbology for {layer}"));
		answer("get_layer_symbology", Some(reply.unwrap_or(fallback)), String::new()).await
	}
}
