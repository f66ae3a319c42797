//! Layer records held by the store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Common identity of every layer kind.
///
/// `schema` and `name` together form the backend identity. The store keys
/// entries by `name` alone.
pub trait Layer {
	fn schema(&self) -> &str;
	fn name(&self) -> &str;

	/// Returns the `(schema, name)` reference used for backend calls.
	fn layer_ref(&self) -> LayerRef {
		LayerRef::new(self.schema(), self.name())
	}
}

/// Schema-qualified reference to a backend table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerRef {
	pub schema: String,
	#[serde(rename = "table")]
	pub name: String,
}

impl LayerRef {
	pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			schema: schema.into(),
			name: name.into(),
		}
	}
}

/// Formats as `schema.name`.
impl fmt::Display for LayerRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.schema, self.name)
	}
}

/// Style parameters for a vector layer.
///
/// Field names follow the renderer's path options (`fillColor`, `fillOpacity`,
/// `color`, `weight`), which is also how the backend persists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbology {
	pub fill_color: String,
	/// Fill opacity in `0.0..=1.0`.
	pub fill_opacity: f64,
	/// Stroke color.
	pub color: String,
	/// Stroke width in `0..=8`.
	pub weight: f64,
}

impl Symbology {
	pub const MAX_WEIGHT: f64 = 8.0;

	/// Returns a copy with opacity and weight pulled into their valid ranges.
	pub fn clamped(&self) -> Self {
		Self {
			fill_color: self.fill_color.clone(),
			fill_opacity: self.fill_opacity.clamp(0.0, 1.0),
			color: self.color.clone(),
			weight: self.weight.clamp(0.0, Self::MAX_WEIGHT),
		}
	}
}

impl Default for Symbology {
	fn default() -> Self {
		Self {
			fill_color: "#3388ff".to_string(),
			fill_opacity: 0.2,
			color: "#3388ff".to_string(),
			weight: 3.0,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorLayer {
	pub schema: String,
	pub name: String,
	pub visible: bool,
	/// Unset until the backend confirms a style for the layer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub symbology: Option<Symbology>,
}

impl VectorLayer {
	/// Creates a visible layer with no confirmed symbology.
	pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			schema: schema.into(),
			name: name.into(),
			visible: true,
			symbology: None,
		}
	}

	pub fn with_symbology(mut self, symbology: Symbology) -> Self {
		self.symbology = Some(symbology);
		self
	}

	pub fn hidden(mut self) -> Self {
		self.visible = false;
		self
	}
}

impl Layer for VectorLayer {
	fn schema(&self) -> &str {
		&self.schema
	}

	fn name(&self) -> &str {
		&self.name
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterLayer {
	pub schema: String,
	pub name: String,
}

impl RasterLayer {
	pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			schema: schema.into(),
			name: name.into(),
		}
	}
}

impl Layer for RasterLayer {
	fn schema(&self) -> &str {
		&self.schema
	}

	fn name(&self) -> &str {
		&self.name
	}
}

/// Store element wrapping a layer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry<L> {
	pub layer: L,
}

impl<L: Layer> LayerEntry<L> {
	pub fn new(layer: L) -> Self {
		Self { layer }
	}

	/// Store key for this entry.
	pub fn key(&self) -> &str {
		self.layer.name()
	}
}

pub type VectorEntry = LayerEntry<VectorLayer>;
pub type RasterEntry = LayerEntry<RasterLayer>;
