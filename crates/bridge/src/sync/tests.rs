use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tigre_model::{LayerAction, LayerEntry, LayerStore, SessionEvent, Symbology, VectorLayer};

use super::*;
use crate::testing::MockBackend;

fn red() -> Symbology {
	Symbology {
		fill_color: "#ff0000".into(),
		fill_opacity: 0.5,
		color: "#000000".into(),
		weight: 2.0,
	}
}

fn add(name: &str) -> SessionEvent {
	SessionEvent::AddVectorLayer {
		name: name.into(),
		schema: "public".into(),
	}
}

#[tokio::test]
async fn added_layers_carry_their_symbology() {
	let backend = MockBackend::new().with_symbology("parcels", &red()).shared();
	let store = LayerStore::new();
	let sync = LayerSync::new(backend, store.clone());

	sync.handle(add("parcels")).await;

	let layer = store.snapshot().vector_layer("parcels").cloned().unwrap();
	assert_eq!(layer, VectorLayer::new("public", "parcels").with_symbology(red()));
}

#[tokio::test]
async fn missing_symbology_still_adds_the_layer() {
	let backend = MockBackend::new().fail_symbology("roads", "no style").shared();
	let store = LayerStore::new();
	let sync = LayerSync::new(backend, store.clone());

	sync.handle(add("roads")).await;

	let layer = store.snapshot().vector_layer("roads").cloned().unwrap();
	assert!(layer.visible);
	assert_eq!(layer.symbology, None);
}

#[tokio::test(start_paused = true)]
async fn stalled_symbology_adds_the_layer_unstyled_and_keeps_listening() {
	let backend = MockBackend::new().stall_symbology("parcels").shared();
	let store = LayerStore::new();
	store.dispatch(LayerAction::AddVectorLayer(LayerEntry::new(VectorLayer::new("public", "old"))));
	let hub = EventHub::new();
	let task = LayerSync::new(backend, store.clone())
		.with_call_timeout(Duration::from_secs(5))
		.spawn(&hub);

	hub.emit(add("parcels"));
	hub.emit(SessionEvent::WipeLayers(true));
	hub.emit(add("roads"));
	tokio::time::sleep(Duration::from_secs(60)).await;

	let state = store.snapshot();
	let names: Vec<_> = state.vector_layers.keys().cloned().collect();
	assert_eq!(names, vec!["roads".to_string()]);
	task.abort();
}

#[tokio::test(start_paused = true)]
async fn stalled_symbology_times_out_with_the_configured_bound() {
	let backend = MockBackend::new().stall_symbology("parcels").shared();
	let store = LayerStore::new();
	let sync = LayerSync::new(backend, store.clone()).with_call_timeout(Duration::from_secs(5));

	let started = tokio::time::Instant::now();
	sync.handle(add("parcels")).await;

	assert_eq!(started.elapsed(), Duration::from_secs(5));
	let layer = store.snapshot().vector_layer("parcels").cloned().unwrap();
	assert_eq!(layer.symbology, None);
}

#[tokio::test]
async fn wipe_drops_vectors_only_when_true() {
	let backend = Arc::new(MockBackend::new());
	let store = LayerStore::new();
	store.dispatch(LayerAction::AddVectorLayer(LayerEntry::new(VectorLayer::new("public", "a"))));
	let sync = LayerSync::new(backend, store.clone());

	sync.handle(SessionEvent::WipeLayers(false)).await;
	assert_eq!(store.snapshot().vector_layers.len(), 1);

	sync.handle(SessionEvent::AddRasterLayer {
		name: "dem".into(),
		schema: "rasters".into(),
	})
	.await;
	sync.handle(SessionEvent::WipeLayers(true)).await;

	let state = store.snapshot();
	assert!(state.vector_layers.is_empty());
	assert_eq!(state.raster_layers.keys().collect::<Vec<_>>(), vec!["dem"]);
}

#[tokio::test]
async fn spawned_listener_applies_events_in_order() {
	let backend = MockBackend::new().with_symbology("b", &red()).shared();
	let store = LayerStore::new();
	let hub = EventHub::new();
	let mut changes = store.subscribe();
	let task = LayerSync::new(backend, store.clone()).spawn(&hub);

	hub.emit(add("a"));
	hub.emit(SessionEvent::WipeLayers(true));
	hub.emit(add("b"));

	tokio::time::timeout(Duration::from_secs(2), async {
		loop {
			changes.changed().await.unwrap();
			if changes.borrow().vector_layer("b").is_some() {
				break;
			}
		}
	})
	.await
	.expect("layer b added");

	let names: Vec<_> = store.snapshot().vector_layers.keys().cloned().collect();
	assert_eq!(names, vec!["b".to_string()]);
	task.abort();
}
