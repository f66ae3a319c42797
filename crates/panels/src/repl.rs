//! Command pipeline and REPL history.
//!
//! Every submission, whoever made it, is normalized, then either handled
//! locally (`clear`) or sent through `read` and `eval`. The resulting
//! [`Output`] lands in the history. Bridge failures become history items
//! carrying the failure text, so the pipeline never stops on a bad command.
//! A command the backend never answers becomes such an item once the call
//! timeout elapses.

use std::time::Duration;

use chrono::{DateTime, Local};
use tigre_bridge::SharedBackend;
use tigre_bridge::backend::{DEFAULT_CALL_TIMEOUT, bounded, run_command};
use tigre_model::command::normalize;
use tigre_model::{Command, CommandReceiver, Output};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const WELCOME_COMMAND: &str = "Welcome to TIGRE!";
pub const WELCOME_MESSAGE: &str = "Learn more about TIGRE here: https://geocml.github.io/docs/";

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
	pub command: String,
	pub output: Output,
	/// Shows results verbatim regardless of errors.
	pub forced: bool,
	pub recorded_at: DateTime<Local>,
}

impl HistoryItem {
	pub fn new(command: impl Into<String>, output: Output) -> Self {
		Self {
			command: command.into(),
			output,
			forced: false,
			recorded_at: Local::now(),
		}
	}

	pub fn welcome() -> Self {
		Self {
			forced: true,
			..Self::new(WELCOME_COMMAND, Output::message(WELCOME_MESSAGE))
		}
	}

	pub fn is_error(&self) -> bool {
		!self.forced && self.output.is_error()
	}

	/// Text shown under the command.
	pub fn message(&self) -> String {
		if self.forced {
			self.output.result_lines().join(" ")
		} else {
			self.output.summary()
		}
	}

	/// `M / D / YYYY @ H:MM`
	pub fn timestamp(&self) -> String {
		self.recorded_at.format("%-m / %-d / %Y @ %-H:%M").to_string()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct History {
	items: Vec<HistoryItem>,
	/// Bumped by every `clear`.
	epoch: u64,
}

impl Default for History {
	fn default() -> Self {
		Self {
			items: vec![HistoryItem::welcome()],
			epoch: 0,
		}
	}
}

impl History {
	pub fn items(&self) -> &[HistoryItem] {
		&self.items
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn last(&self) -> Option<&HistoryItem> {
		self.items.last()
	}

	pub fn push(&mut self, item: HistoryItem) {
		self.items.push(item);
	}

	pub fn clear(&mut self) {
		self.items.clear();
		self.epoch += 1;
	}

	/// Number of clears so far. Lets observers of coalesced snapshots tell
	/// a cleared history from one that merely has the same length.
	pub fn epoch(&self) -> u64 {
		self.epoch
	}
}

/// Runs submitted commands against the backend, one at a time.
#[derive(Clone)]
pub struct CommandPipeline {
	backend: SharedBackend,
	history: watch::Sender<History>,
	call_timeout: Duration,
}

impl CommandPipeline {
	pub fn new(backend: SharedBackend) -> Self {
		let (history, _rx) = watch::channel(History::default());
		Self {
			backend,
			history,
			call_timeout: DEFAULT_CALL_TIMEOUT,
		}
	}

	pub fn with_call_timeout(mut self, limit: Duration) -> Self {
		self.call_timeout = limit;
		self
	}

	pub fn history(&self) -> History {
		self.history.borrow().clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<History> {
		self.history.subscribe()
	}

	/// Drains `commands` in submission order until every sender is gone.
	pub fn spawn(self, mut commands: CommandReceiver) -> JoinHandle<()> {
		tokio::spawn(async move {
			while let Some(text) = commands.recv().await {
				self.submit(&text).await;
			}
			debug!("repl.pipeline.stopped");
		})
	}

	/// Runs one submission. Returns the history item it produced, if any.
	pub async fn submit(&self, text: &str) -> Option<HistoryItem> {
		let command = Command::parse(text);
		if command.is_local() {
			info!("repl.clear");
			self.history.send_modify(History::clear);
			return None;
		}

		let text = normalize(text);
		if text.is_empty() {
			return None;
		}

		let run = run_command(self.backend.as_ref(), &text);
		let output = match bounded("eval", self.call_timeout, run).await {
			Ok(output) => output,
			Err(error) => {
				warn!(command = %text, %error, "repl.command_failed");
				Output::error(error.to_string())
			}
		};
		debug!(command = %text, failed = output.is_error(), "repl.evaluated");

		let item = HistoryItem::new(text, output);
		self.history.send_modify(|history| history.push(item.clone()));
		Some(item)
	}
}

#[cfg(test)]
mod tests;
