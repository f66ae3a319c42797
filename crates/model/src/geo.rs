use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate as reported by the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
	pub lng: f64,
	pub lat: f64,
}

impl LngLat {
	pub const fn new(lng: f64, lat: f64) -> Self {
		Self { lng, lat }
	}
}

/// Formats as `<lng>, <lat>`, the point form the backend's `inspect` expects.
impl fmt::Display for LngLat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}, {}", self.lng, self.lat)
	}
}
