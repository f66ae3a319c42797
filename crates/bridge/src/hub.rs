//! Named event fan-out.
//!
//! Backend pushes and local emitters (the redraw scheduler's `loading`, the
//! table view's `close-table`) share one hub, so every listener sees a single
//! ordered stream regardless of where an event came from.

use serde_json::Value;
use tigre_model::{EventError, SessionEvent};
use tokio::sync::broadcast;
use tracing::{trace, warn};

const HUB_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventHub {
	tx: broadcast::Sender<SessionEvent>,
}

impl Default for EventHub {
	fn default() -> Self {
		Self::new()
	}
}

impl EventHub {
	pub fn new() -> Self {
		let (tx, _rx) = broadcast::channel(HUB_CAPACITY);
		Self { tx }
	}

	/// Publishes a typed event. Returns the number of listeners reached.
	pub fn emit(&self, event: SessionEvent) -> usize {
		trace!(event = event.name(), "hub.emit");
		self.tx.send(event).unwrap_or(0)
	}

	/// Decodes and publishes a raw `(name, payload)` pair.
	///
	/// Malformed payloads are logged and rejected; nothing is published.
	pub fn emit_raw(&self, name: &str, payload: Value) -> Result<usize, EventError> {
		match SessionEvent::decode(name, payload) {
			Ok(event) => Ok(self.emit(event)),
			Err(error) => {
				warn!(event = name, %error, "hub.emit.rejected");
				Err(error)
			}
		}
	}

	/// Subscribes to every event published from now on.
	pub fn subscribe(&self) -> EventStream {
		EventStream { rx: self.tx.subscribe() }
	}
}

/// One listener's view of the hub.
#[derive(Debug)]
pub struct EventStream {
	rx: broadcast::Receiver<SessionEvent>,
}

impl EventStream {
	/// Waits for the next event. Returns `None` once the hub is gone.
	///
	/// A listener that falls behind skips the overwritten events and keeps going.
	pub async fn recv(&mut self) -> Option<SessionEvent> {
		loop {
			match self.rx.recv().await {
				Ok(event) => return Some(event),
				Err(broadcast::error::RecvError::Lagged(skipped)) => {
					warn!(skipped, "hub.listener.lagged");
				}
				Err(broadcast::error::RecvError::Closed) => return None,
			}
		}
	}

	/// Returns the next queued event without waiting.
	pub fn try_recv(&mut self) -> Option<SessionEvent> {
		loop {
			match self.rx.try_recv() {
				Ok(event) => return Some(event),
				Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
					warn!(skipped, "hub.listener.lagged");
				}
				Err(_) => return None,
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn raw_events_are_decoded_for_every_listener() {
		let hub = EventHub::new();
		let mut a = hub.subscribe();
		let mut b = hub.subscribe();

		assert_eq!(hub.emit_raw("loading", json!("75")).unwrap(), 2);
		assert_eq!(a.recv().await, Some(SessionEvent::Loading(75)));
		assert_eq!(b.recv().await, Some(SessionEvent::Loading(75)));
	}

	#[test]
	fn malformed_events_are_not_published() {
		let hub = EventHub::new();
		let mut rx = hub.subscribe();

		assert!(hub.emit_raw("loading", json!("NaN")).is_err());
		assert_eq!(rx.try_recv(), None);
	}

	#[test]
	fn emit_without_listeners_is_harmless() {
		let hub = EventHub::new();
		assert_eq!(hub.emit(SessionEvent::CloseTable), 0);
	}
}
