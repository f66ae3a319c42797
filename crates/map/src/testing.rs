//! Surface that records every operation for later inspection.

use std::sync::Arc;

use parking_lot::Mutex;
use tigre_model::LayerRef;

use crate::surface::{Basemap, HeadlessSurface, MapSurface, Overlay};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
	Clear,
	Add { layer: LayerRef, generation: u64 },
}

#[derive(Debug, Default)]
struct Recorded {
	surface: HeadlessSurface,
	ops: Vec<SurfaceOp>,
}

/// Cloneable handle; the scheduler gets one clone, the test keeps another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
	inner: Arc<Mutex<Recorded>>,
	basemap: Basemap,
}

impl RecordingSurface {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn ops(&self) -> Vec<SurfaceOp> {
		self.inner.lock().ops.clone()
	}

	/// Overlays currently on the surface.
	pub fn overlays(&self) -> Vec<Overlay> {
		self.inner.lock().surface.overlays().to_vec()
	}

	pub fn overlay(&self, name: &str) -> Option<Overlay> {
		self.overlays().into_iter().find(|overlay| overlay.layer.name == name)
	}
}

impl MapSurface for RecordingSurface {
	fn basemap(&self) -> &Basemap {
		&self.basemap
	}

	fn clear_overlays(&mut self) {
		let mut inner = self.inner.lock();
		inner.ops.push(SurfaceOp::Clear);
		inner.surface.clear_overlays();
	}

	fn add_overlay(&mut self, overlay: Overlay) {
		let mut inner = self.inner.lock();
		inner.ops.push(SurfaceOp::Add {
			layer: overlay.layer.clone(),
			generation: overlay.generation,
		});
		inner.surface.add_overlay(overlay);
	}
}
