//! REPL command grammar produced by UI actions, and the shared surface those
//! commands are submitted through.
//!
//! Typed input, map clicks, the layer pane and control-bar actions all end up
//! as text on one [`CommandSurface`]; a single pipeline drains the matching
//! [`CommandReceiver`] in submission order.

use std::fmt;

use tokio::sync::mpsc;
use tracing::trace;

use crate::geo::LngLat;
use crate::layer::{LayerRef, Symbology};

/// Commands the client itself knows how to phrase.
///
/// Anything else the user types goes through untouched as [`Command::Raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
	/// `add layer '<path>'`
	AddLayer { path: String },
	/// `db connect <user> <pass> <host> <port> <db> <params>`
	DbConnect(DbConnect),
	/// `db describe '<desc>' <email> <phone> <website>`
	DbDescribe(DbDescribe),
	/// `buffer <schema.name> <distance>`
	Buffer { layer: LayerRef, distance: f64 },
	/// `intersect <schema.name> <schema.name>`
	Intersect { layer: LayerRef, other: LayerRef },
	/// `symbology set <schema.name> '<json>'`
	SymbologySet { layer: LayerRef, symbology: Symbology },
	/// `inspect <schema.name> '<lng>, <lat>'`
	Inspect { layer: LayerRef, at: LngLat },
	/// Clears the local history only.
	Clear,
	Raw(String),
}

#[derive(Clone, PartialEq, Eq, Default)]
pub struct DbConnect {
	pub user: String,
	pub password: String,
	pub host: String,
	pub port: String,
	pub database: String,
	pub params: String,
}

impl fmt::Debug for DbConnect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DbConnect")
			.field("user", &self.user)
			.field("password", &"<redacted>")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("database", &self.database)
			.field("params", &self.params)
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DbDescribe {
	pub description: String,
	pub email: String,
	pub phone: String,
	pub website: String,
}

impl Command {
	pub const CLEAR: &'static str = "clear";

	/// Parses submitted text into the only form the client treats specially.
	pub fn parse(text: &str) -> Self {
		let text = normalize(text);
		if text == Self::CLEAR { Self::Clear } else { Self::Raw(text) }
	}

	/// Returns `true` for commands that never reach the backend.
	pub fn is_local(&self) -> bool {
		match self {
			Self::Clear => true,
			Self::Raw(text) => text == Self::CLEAR,
			_ => false,
		}
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::AddLayer { path } => write!(f, "add layer '{path}'"),
			Self::DbConnect(c) => write!(
				f,
				"db connect {} {} {} {} {} {}",
				c.user, c.password, c.host, c.port, c.database, c.params
			),
			Self::DbDescribe(d) => write!(f, "db describe '{}' {} {} {}", d.description, d.email, d.phone, d.website),
			Self::Buffer { layer, distance } => write!(f, "buffer {layer} {distance}"),
			Self::Intersect { layer, other } => write!(f, "intersect {layer} {other}"),
			Self::SymbologySet { layer, symbology } => {
				let json = serde_json::to_string(symbology).map_err(|_| fmt::Error)?;
				write!(f, "symbology set {layer} '{json}'")
			}
			Self::Inspect { layer, at } => write!(f, "inspect {layer} '{at}'"),
			Self::Clear => f.write_str(Self::CLEAR),
			Self::Raw(text) => f.write_str(text),
		}
	}
}

/// Drops line breaks the way the input box does and trims the ends.
pub fn normalize(text: &str) -> String {
	text.replace(['\n', '\r'], "").trim().to_string()
}

/// Sending half of the shared command input.
#[derive(Debug, Clone)]
pub struct CommandSurface {
	tx: mpsc::UnboundedSender<String>,
}

/// Receiving half, drained by the command pipeline.
#[derive(Debug)]
pub struct CommandReceiver {
	rx: mpsc::UnboundedReceiver<String>,
}

impl CommandSurface {
	pub fn channel() -> (Self, CommandReceiver) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, CommandReceiver { rx })
	}

	/// Submits command text. Returns `false` once the pipeline is gone.
	pub fn submit(&self, command: impl fmt::Display) -> bool {
		let text = command.to_string();
		trace!(command = %text, "command.submit");
		self.tx.send(text).is_ok()
	}
}

impl CommandReceiver {
	pub async fn recv(&mut self) -> Option<String> {
		self.rx.recv().await
	}

	pub fn try_recv(&mut self) -> Option<String> {
		self.rx.try_recv().ok()
	}

	/// Drains everything currently queued.
	pub fn drain(&mut self) -> Vec<String> {
		std::iter::from_fn(|| self.try_recv()).collect()
	}
}
