//! Backend reached through a child process speaking line-delimited JSON.
//!
//! [`StdioBackend`] owns a main loop task that multiplexes outgoing requests
//! with inbound lines. Responses resolve the pending request with the same
//! id; events are decoded and published on the [`EventHub`]. When the stream
//! ends every pending request fails with [`BridgeError::Closed`].

mod protocol;

use std::collections::HashMap;
use std::ffi::OsStr;
use std::process::Stdio;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tigre_model::LayerRef;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use self::protocol::{CounterIdGen, Inbound, WireRequest};
use crate::backend::{Backend, ReadForm};
use crate::error::{BridgeError, Result};
use crate::hub::EventHub;

type Reply = oneshot::Sender<Result<Value>>;

/// Request queued for the main loop.
struct Outgoing {
	command: &'static str,
	args: Value,
	reply: Reply,
}

pub struct StdioBackend {
	tx: mpsc::UnboundedSender<Outgoing>,
	shutdown: CancellationToken,
	/// Cancelled when the main loop stops, for whatever reason.
	stopped: CancellationToken,
	child: Mutex<Option<Child>>,
}

impl std::fmt::Debug for StdioBackend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StdioBackend")
			.field("closed", &self.tx.is_closed())
			.finish_non_exhaustive()
	}
}

impl StdioBackend {
	/// Spawns `program` and speaks the protocol over its stdin/stdout.
	pub fn spawn<I, S>(program: impl AsRef<OsStr>, args: I, hub: EventHub) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<OsStr>,
	{
		let program = program.as_ref();
		let mut child = Command::new(program)
			.args(args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::inherit())
			.kill_on_drop(true)
			.spawn()?;

		let stdin = child
			.stdin
			.take()
			.ok_or_else(|| BridgeError::Protocol("backend stdin unavailable".into()))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| BridgeError::Protocol("backend stdout unavailable".into()))?;

		info!(program = %program.to_string_lossy(), pid = ?child.id(), "bridge.stdio.spawned");
		let mut backend = Self::connect(BufReader::new(stdout), stdin, hub);
		backend.child = Mutex::new(Some(child));
		Ok(backend)
	}

	/// Speaks the protocol over arbitrary streams.
	pub fn connect<R, W>(input: R, output: W, hub: EventHub) -> Self
	where
		R: AsyncBufRead + Unpin + Send + 'static,
		W: AsyncWrite + Unpin + Send + 'static,
	{
		let (tx, rx) = mpsc::unbounded_channel();
		let shutdown = CancellationToken::new();
		let main_loop = MainLoop {
			rx,
			ids: CounterIdGen::default(),
			pending: HashMap::new(),
			hub,
		};
		let cancel = shutdown.clone();
		let stopped = CancellationToken::new();
		let done = stopped.clone().drop_guard();
		tokio::spawn(async move {
			let _done = done;
			if let Err(error) = main_loop.run(input, output, cancel).await {
				warn!(%error, "bridge.stdio.main_loop_failed");
			}
		});

		Self {
			tx,
			shutdown,
			stopped,
			child: Mutex::new(None),
		}
	}

	/// Returns `true` once the main loop has stopped.
	pub fn is_closed(&self) -> bool {
		self.stopped.is_cancelled()
	}

	/// Resolves once the main loop has stopped.
	pub async fn closed(&self) {
		self.stopped.cancelled().await;
	}

	/// Stops the main loop and kills the child, if any.
	pub fn shutdown(&self) {
		self.shutdown.cancel();
		if let Some(mut child) = self.child.lock().take()
			&& let Err(error) = child.start_kill()
		{
			debug!(%error, "bridge.stdio.kill_failed");
		}
	}

	async fn call(&self, command: &'static str, args: Value) -> Result<Value> {
		let (reply, rx) = oneshot::channel();
		self.tx
			.send(Outgoing { command, args, reply })
			.map_err(|_| BridgeError::Closed)?;
		rx.await.map_err(|_| BridgeError::Closed)?
	}
}

impl Drop for StdioBackend {
	fn drop(&mut self) {
		self.shutdown.cancel();
	}
}

#[async_trait]
impl Backend for StdioBackend {
	async fn read(&self, command: &str) -> Result<ReadForm> {
		self.call("read", json!({ "cmd": command })).await.map(ReadForm)
	}

	async fn eval(&self, form: ReadForm) -> Result<String> {
		let value = self.call("eval", json!({ "ast": form.0 })).await?;
		Ok(serde_json::from_value(value)?)
	}

	async fn get_as_json_gpkg(&self, layer: &LayerRef) -> Result<Vec<String>> {
		let value = self.call("get_as_json_gpkg", serde_json::to_value(layer)?).await?;
		Ok(serde_json::from_value(value)?)
	}

	async fn get_layer_symbology(&self, layer: &LayerRef) -> Result<String> {
		let value = self.call("get_layer_symbology", serde_json::to_value(layer)?).await?;
		Ok(serde_json::from_value(value)?)
	}
}

struct MainLoop {
	rx: mpsc::UnboundedReceiver<Outgoing>,
	ids: CounterIdGen,
	pending: HashMap<u64, (&'static str, Reply)>,
	hub: EventHub,
}

impl MainLoop {
	async fn run<R, W>(mut self, input: R, mut output: W, cancel: CancellationToken) -> Result<()>
	where
		R: AsyncBufRead + Unpin,
		W: AsyncWrite + Unpin,
	{
		let mut lines = input.lines();

		let ret = loop {
			tokio::select! {
				biased;

				_ = cancel.cancelled() => break Ok(()),

				line = lines.next_line() => match line {
					Ok(Some(line)) => self.dispatch_line(&line),
					Ok(None) => break Err(BridgeError::Closed),
					Err(error) => break Err(error.into()),
				},

				outgoing = self.rx.recv() => match outgoing {
					Some(outgoing) => {
						if let Err(error) = self.send(&mut output, outgoing).await {
							break Err(error);
						}
					}
					None => break Ok(()),
				},
			}
		};

		for (id, (command, reply)) in self.pending.drain() {
			trace!(id, command, "bridge.stdio.abandon");
			let _ = reply.send(Err(BridgeError::Closed));
		}
		ret
	}

	async fn send<W>(&mut self, output: &mut W, outgoing: Outgoing) -> Result<()>
	where
		W: AsyncWrite + Unpin,
	{
		let id = self.ids.next();
		let request = WireRequest {
			id,
			command: outgoing.command,
			args: &outgoing.args,
		};
		let mut line = match serde_json::to_string(&request) {
			Ok(line) => line,
			Err(error) => {
				let _ = outgoing.reply.send(Err(error.into()));
				return Ok(());
			}
		};
		line.push('\n');

		trace!(id, command = outgoing.command, "bridge.stdio.request");
		self.pending.insert(id, (outgoing.command, outgoing.reply));
		output.write_all(line.as_bytes()).await?;
		output.flush().await?;
		Ok(())
	}

	fn dispatch_line(&mut self, line: &str) {
		if line.trim().is_empty() {
			return;
		}
		match Inbound::parse(line) {
			Ok(Inbound::Response { id, result }) => match self.pending.remove(&id) {
				Some((command, reply)) => {
					trace!(id, command, ok = result.is_ok(), "bridge.stdio.response");
					let result = result.map_err(|message| BridgeError::Rejected { command, message });
					// The caller may have given up waiting.
					let _ = reply.send(result);
				}
				None => warn!(id, "bridge.stdio.unknown_response"),
			},
			Ok(Inbound::Event { name, payload }) => {
				debug!(event = %name, "bridge.stdio.event");
				// Rejections are logged by the hub.
				let _ = self.hub.emit_raw(&name, payload);
			}
			Err(error) => warn!(%error, line, "bridge.stdio.protocol_violation"),
		}
	}
}
