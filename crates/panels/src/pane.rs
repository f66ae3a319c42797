//! Layer pane: a filterable view of the store's vector layers.
//!
//! The pane only reads the store and dispatches visibility toggles. Analysis
//! affordances phrase commands and submit them to the command surface; the
//! backend's reply arrives through the usual event path.

use thiserror::Error;
use tigre_model::{Command, CommandSurface, Layer, LayerAction, LayerRef, LayerStore, Symbology, VectorLayer};
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaneError {
	#[error("no vector layer named '{0}'")]
	UnknownLayer(String),
	#[error("command pipeline is closed")]
	Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaneRow {
	pub schema: String,
	pub name: String,
	pub visible: bool,
	pub symbology: Option<Symbology>,
}

impl PaneRow {
	/// `schema.name`, as shown in the pane.
	pub fn label(&self) -> String {
		format!("{}.{}", self.schema, self.name)
	}
}

impl From<&VectorLayer> for PaneRow {
	fn from(layer: &VectorLayer) -> Self {
		Self {
			schema: layer.schema.clone(),
			name: layer.name.clone(),
			visible: layer.visible,
			symbology: layer.symbology.clone(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct LayerPane {
	store: LayerStore,
	commands: CommandSurface,
	filter: String,
}

impl LayerPane {
	pub fn new(store: LayerStore, commands: CommandSurface) -> Self {
		Self {
			store,
			commands,
			filter: String::new(),
		}
	}

	pub fn filter(&self) -> &str {
		&self.filter
	}

	pub fn set_filter(&mut self, filter: impl Into<String>) {
		self.filter = filter.into();
	}

	/// Rows passing the filter, in store order.
	pub fn rows(&self) -> Vec<PaneRow> {
		let needle = self.filter.to_lowercase();
		self.store.with_state(|state| {
			state
				.vector_layers
				.values()
				.map(|entry| &entry.layer)
				.filter(|layer| matches_filter(&needle, layer))
				.map(PaneRow::from)
				.collect()
		})
	}

	/// Checkbox action. Returns `false` if the layer is unknown.
	pub fn toggle(&self, name: &str) -> bool {
		self.store.dispatch(LayerAction::ToggleVectorLayerVisibility(name.to_string()))
	}

	pub fn buffer(&self, name: &str, distance: f64) -> Result<(), PaneError> {
		let layer = self.layer_ref(name)?;
		self.submit(Command::Buffer { layer, distance })
	}

	pub fn intersect(&self, name: &str, other: &str) -> Result<(), PaneError> {
		let layer = self.layer_ref(name)?;
		let other = self.layer_ref(other)?;
		self.submit(Command::Intersect { layer, other })
	}

	pub fn set_symbology(&self, name: &str, symbology: Symbology) -> Result<(), PaneError> {
		let layer = self.layer_ref(name)?;
		self.submit(Command::SymbologySet {
			layer,
			symbology: symbology.clamped(),
		})
	}

	fn layer_ref(&self, name: &str) -> Result<LayerRef, PaneError> {
		self.store
			.with_state(|state| state.vector_layer(name).map(Layer::layer_ref))
			.ok_or_else(|| PaneError::UnknownLayer(name.to_string()))
	}

	fn submit(&self, command: Command) -> Result<(), PaneError> {
		debug!(command = %command, "pane.submit");
		if self.commands.submit(command) { Ok(()) } else { Err(PaneError::Closed) }
	}
}

/// Case-insensitive substring match on name or schema. `needle` is lowercase.
fn matches_filter(needle: &str, layer: &VectorLayer) -> bool {
	needle.is_empty() || layer.name.to_lowercase().contains(needle) || layer.schema.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;
	use tigre_model::{CommandReceiver, LayerEntry};

	use super::*;

	fn pane() -> (LayerPane, CommandReceiver) {
		let store = LayerStore::new();
		for (schema, name) in [("public", "Parcels"), ("public", "roads"), ("zoning", "districts")] {
			store.dispatch(LayerAction::AddVectorLayer(LayerEntry::new(VectorLayer::new(schema, name))));
		}
		let (commands, rx) = CommandSurface::channel();
		(LayerPane::new(store, commands), rx)
	}

	#[rstest]
	#[case("", &["Parcels", "roads", "districts"])]
	#[case("parc", &["Parcels"])]
	#[case("PUBLIC", &["Parcels", "roads"])]
	#[case("zon", &["districts"])]
	#[case("rivers", &[])]
	fn filters_on_name_or_schema(#[case] filter: &str, #[case] expected: &[&str]) {
		let (mut pane, _rx) = pane();
		pane.set_filter(filter);
		let names: Vec<_> = pane.rows().into_iter().map(|row| row.name).collect();
		assert_eq!(names, expected);
	}

	#[test]
	fn toggling_flips_visibility() {
		let (pane, _rx) = pane();
		assert!(pane.toggle("roads"));
		assert!(!pane.toggle("rivers"));

		let roads = pane.rows().into_iter().find(|row| row.name == "roads").unwrap();
		assert!(!roads.visible);
		assert_eq!(roads.label(), "public.roads");
	}

	#[test]
	fn analysis_actions_submit_commands() {
		let (pane, mut rx) = pane();
		pane.buffer("roads", 25.5).unwrap();
		pane.intersect("Parcels", "districts").unwrap();
		pane.set_symbology(
			"roads",
			Symbology {
				fill_color: "#112233".into(),
				fill_opacity: 0.5,
				color: "#000000".into(),
				weight: 12.0,
			},
		)
		.unwrap();

		assert_eq!(
			rx.drain(),
			vec![
				"buffer public.roads 25.5".to_string(),
				"intersect public.Parcels zoning.districts".to_string(),
				r##"symbology set public.roads '{"fillColor":"#112233","fillOpacity":0.5,"color":"#000000","weight":8.0}'"##
					.to_string(),
			]
		);
	}

	#[test]
	fn unknown_layers_are_rejected() {
		let (pane, mut rx) = pane();
		assert_eq!(pane.buffer("rivers", 1.0), Err(PaneError::UnknownLayer("rivers".into())));
		assert!(rx.drain().is_empty());
	}

	#[test]
	fn closed_pipeline_is_reported() {
		let (pane, rx) = pane();
		drop(rx);
		assert_eq!(pane.buffer("roads", 1.0), Err(PaneError::Closed));
	}
}
