//! Loading indicator fed by `loading` events.
//!
//! The latest value is the bar width. The indicator does no sequencing and no
//! clamping; the emitter is responsible for sensible values. Payloads that are
//! not integers never reach it (the hub rejects them), so the bar keeps its
//! last value.

use tigre_bridge::{EventHub, EventStream};
use tigre_model::SessionEvent;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingBar {
	/// Bar width in percent, as last reported.
	pub percent: i64,
}

impl LoadingBar {
	/// `0` hides the bar, any positive width shows it.
	pub fn is_visible(&self) -> bool {
		self.percent > 0
	}
}

pub struct LoadingIndicator {
	state: watch::Receiver<LoadingBar>,
	task: JoinHandle<()>,
}

impl LoadingIndicator {
	/// Starts listening on `hub`.
	pub fn spawn(hub: &EventHub) -> Self {
		let (tx, state) = watch::channel(LoadingBar::default());
		let task = tokio::spawn(listen(hub.subscribe(), tx));
		Self { state, task }
	}

	pub fn current(&self) -> LoadingBar {
		*self.state.borrow()
	}

	pub fn watch(&self) -> watch::Receiver<LoadingBar> {
		self.state.clone()
	}
}

impl Drop for LoadingIndicator {
	fn drop(&mut self) {
		self.task.abort();
	}
}

async fn listen(mut events: EventStream, tx: watch::Sender<LoadingBar>) {
	while let Some(event) = events.recv().await {
		if let SessionEvent::Loading(percent) = event {
			trace!(percent, "loading.update");
			tx.send_replace(LoadingBar { percent });
		}
	}
}
