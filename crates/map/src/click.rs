//! Map click to `inspect` command dispatch.
//!
//! Each redraw pass installs a fresh handler capturing that pass's visible
//! layers. A click takes the handler out of its slot and fires it, so one
//! installed handler answers at most one click.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tigre_model::{Command, CommandSurface, LayerRef, LngLat};
use tracing::{debug, trace};

/// Single-shot click callback. Returns the number of commands submitted.
pub type ClickHandler = Box<dyn FnOnce(LngLat) -> usize + Send>;

/// Builds click handlers that submit commands to the shared surface.
#[derive(Debug, Clone)]
pub struct ClickDispatcher {
	commands: CommandSurface,
}

impl ClickDispatcher {
	pub fn new(commands: CommandSurface) -> Self {
		Self { commands }
	}

	/// Returns a handler that inspects each of `layers`, in order, at the
	/// clicked point.
	pub fn handler(&self, layers: Vec<LayerRef>) -> ClickHandler {
		let commands = self.commands.clone();
		Box::new(move |at| {
			debug!(layers = layers.len(), %at, "map.click.dispatch");
			let mut submitted = 0;
			for layer in layers {
				if commands.submit(Command::Inspect { layer, at }) {
					submitted += 1;
				}
			}
			submitted
		})
	}
}

/// Slot holding the currently installed handler.
#[derive(Clone, Default)]
pub(crate) struct ClickSlot {
	handler: Arc<Mutex<Option<ClickHandler>>>,
}

impl ClickSlot {
	/// Installs `handler`, replacing any handler that was never fired.
	pub(crate) fn install(&self, handler: ClickHandler) {
		if self.handler.lock().replace(handler).is_some() {
			trace!("map.click.replaced");
		}
	}

	pub(crate) fn port(&self) -> ClickPort {
		ClickPort { slot: self.clone() }
	}
}

/// Fires the installed click handler from outside the scheduler.
#[derive(Clone)]
pub struct ClickPort {
	slot: ClickSlot,
}

impl fmt::Debug for ClickPort {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClickPort").field("armed", &self.is_armed()).finish()
	}
}

impl ClickPort {
	/// Delivers a click. Returns `None` when no handler is installed.
	pub fn click(&self, at: LngLat) -> Option<usize> {
		// Take first so the handler runs without the lock held.
		let handler = self.slot.handler.lock().take();
		match handler {
			Some(handler) => Some(handler(at)),
			None => {
				debug!(%at, "map.click.unarmed");
				None
			}
		}
	}

	pub fn is_armed(&self) -> bool {
		self.slot.handler.lock().is_some()
	}
}
