//! Render target of the redraw scheduler.
//!
//! A surface holds one basemap, which is never removed, plus the overlays drawn
//! by redraw passes. The scheduler task owns its surface exclusively.

use serde_json::Value;
use tigre_model::{LayerRef, Symbology};

/// Default tile source, as used by the desktop client.
pub const DEFAULT_BASEMAP_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";

/// Tile layer underneath every overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basemap {
	pub url: String,
}

impl Default for Basemap {
	fn default() -> Self {
		Self {
			url: DEFAULT_BASEMAP_URL.to_string(),
		}
	}
}

/// Geometry of one layer as drawn by one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
	pub layer: LayerRef,
	/// Pass that produced the overlay.
	pub generation: u64,
	pub geometries: Vec<Value>,
	/// Style at render time. `None` leaves the renderer's default.
	pub style: Option<Symbology>,
}

pub trait MapSurface: Send + 'static {
	fn basemap(&self) -> &Basemap;

	/// Removes every overlay. The basemap stays.
	fn clear_overlays(&mut self);

	fn add_overlay(&mut self, overlay: Overlay);
}

/// Surface without a display, keeping overlays in memory.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
	basemap: Basemap,
	overlays: Vec<Overlay>,
}

impl HeadlessSurface {
	pub fn new(basemap: Basemap) -> Self {
		Self {
			basemap,
			overlays: Vec::new(),
		}
	}

	pub fn overlays(&self) -> &[Overlay] {
		&self.overlays
	}
}

impl MapSurface for HeadlessSurface {
	fn basemap(&self) -> &Basemap {
		&self.basemap
	}

	fn clear_overlays(&mut self) {
		self.overlays.clear();
	}

	fn add_overlay(&mut self, overlay: Overlay) {
		self.overlays.push(overlay);
	}
}
