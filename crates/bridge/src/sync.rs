//! Keeps the layer store in step with backend layer events.
//!
//! The store is rebuilt every session from these events: `add-vector-layer`
//! fetches the layer's symbology and then adds it, `add-raster-layer` adds a
//! raster, and `wipe-layers true` drops every vector layer. Events are handled
//! one at a time in arrival order, so a wipe followed by adds can never
//! interleave. The symbology fetch is bounded by the call timeout; a stalled
//! backend costs one layer its style, not the rest of the event stream.

use std::time::Duration;

use tigre_model::{LayerAction, LayerEntry, LayerRef, LayerStore, RasterLayer, SessionEvent, VectorLayer};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{DEFAULT_CALL_TIMEOUT, SharedBackend, bounded, fetch_symbology};
use crate::hub::{EventHub, EventStream};

#[derive(Clone)]
pub struct LayerSync {
	backend: SharedBackend,
	store: LayerStore,
	call_timeout: Duration,
}

impl LayerSync {
	pub fn new(backend: SharedBackend, store: LayerStore) -> Self {
		Self {
			backend,
			store,
			call_timeout: DEFAULT_CALL_TIMEOUT,
		}
	}

	pub fn with_call_timeout(mut self, limit: Duration) -> Self {
		self.call_timeout = limit;
		self
	}

	/// Spawns a listener that applies every layer event published on `hub`.
	pub fn spawn(self, hub: &EventHub) -> JoinHandle<()> {
		let events = hub.subscribe();
		tokio::spawn(self.run(events))
	}

	async fn run(self, mut events: EventStream) {
		while let Some(event) = events.recv().await {
			self.handle(event).await;
		}
		debug!("layer_sync.stopped");
	}

	/// Applies one event. Events unrelated to layers are ignored.
	pub async fn handle(&self, event: SessionEvent) {
		match event {
			SessionEvent::AddVectorLayer { name, schema } => {
				let layer_ref = LayerRef::new(schema, name);
				let mut layer = VectorLayer::new(layer_ref.schema.clone(), layer_ref.name.clone());
				let fetch = fetch_symbology(self.backend.as_ref(), &layer_ref);
				match bounded("get_layer_symbology", self.call_timeout, fetch).await {
					Ok(symbology) => layer.symbology = Some(symbology),
					Err(error) => warn!(layer = %layer_ref, %error, "layer_sync.symbology_unavailable"),
				}
				info!(layer = %layer_ref, styled = layer.symbology.is_some(), "layer_sync.add_vector");
				self.store.dispatch(LayerAction::AddVectorLayer(LayerEntry::new(layer)));
			}
			SessionEvent::AddRasterLayer { name, schema } => {
				info!(layer = %LayerRef::new(schema.as_str(), name.as_str()), "layer_sync.add_raster");
				self.store
					.dispatch(LayerAction::AddRasterLayer(LayerEntry::new(RasterLayer::new(schema, name))));
			}
			SessionEvent::WipeLayers(true) => {
				info!("layer_sync.wipe");
				self.store.dispatch(LayerAction::RemoveAllVectorLayers);
			}
			SessionEvent::WipeLayers(false)
			| SessionEvent::Loading(_)
			| SessionEvent::OpenTable { .. }
			| SessionEvent::CloseTable => {}
		}
	}
}

#[cfg(test)]
mod tests;
