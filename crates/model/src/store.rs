//! Reactive layer store.
//!
//! [`LayerStoreState`] is a plain value mutated only through [`LayerAction`]s.
//! [`LayerStore`] shares one state across the client and notifies observers
//! through a [`watch`] channel whenever an action actually changed it, so
//! observers see coalesced snapshots rather than every intermediate write.
//!
//! # Invariants
//!
//! - Every key equals its entry's `layer.name`.
//! - Insertion order is preserved; overwriting a key keeps its position.
//! - Raster layers can be added but never removed or toggled.

use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::layer::{Layer, LayerRef, RasterEntry, VectorEntry, VectorLayer};

/// Named state transformations accepted by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerAction {
	/// Inserts or overwrites the vector entry at its name.
	AddVectorLayer(VectorEntry),
	/// Deletes the vector entry at its name; absent names are a no-op.
	RemoveVectorLayer(VectorEntry),
	/// Flips `visible` on the named vector layer; absent names are a no-op.
	ToggleVectorLayerVisibility(String),
	/// Drops every vector layer, leaving rasters untouched.
	RemoveAllVectorLayers,
	/// Inserts or overwrites the raster entry at its name.
	AddRasterLayer(RasterEntry),
}

impl LayerAction {
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::AddVectorLayer(_) => "add_vector_layer",
			Self::RemoveVectorLayer(_) => "remove_vector_layer",
			Self::ToggleVectorLayerVisibility(_) => "toggle_vector_layer_visibility",
			Self::RemoveAllVectorLayers => "remove_all_vector_layers",
			Self::AddRasterLayer(_) => "add_raster_layer",
		}
	}
}

/// Snapshot of every layer known to the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerStoreState {
	pub vector_layers: IndexMap<String, VectorEntry>,
	pub raster_layers: IndexMap<String, RasterEntry>,
}

impl LayerStoreState {
	pub fn new() -> Self {
		Self::default()
	}

	/// Applies `action` and returns the resulting state.
	#[must_use]
	pub fn reduce(mut self, action: &LayerAction) -> Self {
		self.apply(action);
		self
	}

	/// Applies `action` in place. Returns `true` if the state changed.
	pub fn apply(&mut self, action: &LayerAction) -> bool {
		match action {
			LayerAction::AddVectorLayer(entry) => {
				let previous = self.vector_layers.insert(entry.key().to_string(), entry.clone());
				previous.as_ref() != Some(entry)
			}
			LayerAction::RemoveVectorLayer(entry) => self.vector_layers.shift_remove(entry.key()).is_some(),
			LayerAction::ToggleVectorLayerVisibility(name) => match self.vector_layers.get_mut(name) {
				Some(entry) => {
					entry.layer.visible = !entry.layer.visible;
					true
				}
				None => false,
			},
			LayerAction::RemoveAllVectorLayers => {
				let changed = !self.vector_layers.is_empty();
				self.vector_layers.clear();
				changed
			}
			LayerAction::AddRasterLayer(entry) => {
				let previous = self.raster_layers.insert(entry.key().to_string(), entry.clone());
				previous.as_ref() != Some(entry)
			}
		}
	}

	pub fn vector_layer(&self, name: &str) -> Option<&VectorLayer> {
		self.vector_layers.get(name).map(|entry| &entry.layer)
	}

	/// Visible vector layers in store order.
	pub fn visible_vector_layers(&self) -> impl Iterator<Item = &VectorLayer> {
		self.vector_layers
			.values()
			.map(|entry| &entry.layer)
			.filter(|layer| layer.visible)
	}

	/// Backend references of the visible vector layers, in store order.
	pub fn visible_refs(&self) -> Vec<LayerRef> {
		self.visible_vector_layers().map(Layer::layer_ref).collect()
	}
}

/// Shared handle to the session's layer state.
///
/// Cloning the handle shares the same state.
#[derive(Debug, Clone)]
pub struct LayerStore {
	tx: watch::Sender<LayerStoreState>,
}

impl Default for LayerStore {
	fn default() -> Self {
		Self::new()
	}
}

impl LayerStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		let (tx, _rx) = watch::channel(LayerStoreState::default());
		Self { tx }
	}

	/// Applies `action`, notifying subscribers if the state changed.
	///
	/// Returns `true` if the state changed.
	pub fn dispatch(&self, action: LayerAction) -> bool {
		let changed = self.tx.send_if_modified(|state| state.apply(&action));
		if changed {
			debug!(action = action.as_str(), "store.dispatch");
		} else {
			trace!(action = action.as_str(), "store.dispatch.noop");
		}
		changed
	}

	/// Returns a copy of the current state.
	pub fn snapshot(&self) -> LayerStoreState {
		self.tx.borrow().clone()
	}

	/// Runs `f` against the current state without cloning it.
	pub fn with_state<R>(&self, f: impl FnOnce(&LayerStoreState) -> R) -> R {
		f(&self.tx.borrow())
	}

	/// Returns a receiver that observes every subsequent change.
	pub fn subscribe(&self) -> watch::Receiver<LayerStoreState> {
		self.tx.subscribe()
	}
}
