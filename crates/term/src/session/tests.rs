use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tigre_bridge::testing::MockBackend;
use tigre_model::{LngLat, Symbology};
use tokio::time::sleep;

use super::*;

const SETTLE: Duration = Duration::from_secs(60);

fn parcels_backend() -> MockBackend {
	MockBackend::new()
		.with_symbology("parcels", &Symbology::default())
		.with_geometry("parcels", vec![json!({ "type": "Point", "coordinates": [-1.0, 2.0] })])
}

fn start(backend: MockBackend) -> (Session, EventHub, Arc<MockBackend>) {
	let backend = Arc::new(backend);
	let hub = EventHub::new();
	let session = Session::start(backend.clone(), hub.clone(), &Config::default());
	(session, hub, backend)
}

#[tokio::test(start_paused = true)]
async fn backend_layers_are_drawn_and_clickable() {
	let (session, hub, backend) = start(parcels_backend());
	let mut reports = session.reports();

	hub.emit_raw("add-vector-layer", json!(["parcels", "public"])).unwrap();
	sleep(SETTLE).await;

	let drawn: Vec<_> = std::iter::from_fn(|| reports.try_recv().ok()).collect();
	assert_eq!(drawn.last().map(|r| (r.fetched, r.rendered)), Some((1, 1)));
	assert_eq!(
		session.execute(Input::Layers(None)).as_deref(),
		Some("[x] public.parcels")
	);

	let reply = session.execute(Input::Click(LngLat::new(-1.0, 2.0)));
	assert_eq!(reply.as_deref(), Some("inspecting 1 layer(s) at -1, 2"));
	sleep(SETTLE).await;

	assert_eq!(backend.commands(), vec!["inspect public.parcels '-1, 2'".to_string()]);
	let history = session.history().borrow().clone();
	assert_eq!(history.last().map(|item| item.command.as_str()), Some("inspect public.parcels '-1, 2'"));
	session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn toggling_hides_a_layer_from_clicks() {
	let (session, hub, _backend) = start(parcels_backend());
	hub.emit_raw("add-vector-layer", json!(["parcels"])).unwrap();
	sleep(SETTLE).await;

	assert_eq!(session.execute(Input::Toggle("parcels".into())), None);
	assert_eq!(
		session.execute(Input::Toggle("rivers".into())).as_deref(),
		Some("no vector layer named 'rivers'")
	);
	sleep(SETTLE).await;

	assert_eq!(
		session.execute(Input::Click(LngLat::new(0.0, 0.0))).as_deref(),
		Some("inspecting 0 layer(s) at 0, 0")
	);
	session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn wipe_layers_clears_the_pane() {
	let (session, hub, _backend) = start(parcels_backend());
	hub.emit_raw("add-vector-layer", json!(["parcels", "public"])).unwrap();
	sleep(SETTLE).await;

	hub.emit_raw("wipe-layers", json!(true)).unwrap();
	sleep(SETTLE).await;

	assert_eq!(session.execute(Input::Layers(None)).as_deref(), Some("no layers"));
	session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn table_events_reach_the_table_view() {
	let (session, hub, _backend) = start(MockBackend::new());
	let payload = Value::String(json!({ "json_agg": [{ "id": 7, "geom": "01" }] }).to_string()).to_string();
	hub.emit_raw("open-table", json!(["parcels", payload])).unwrap();
	sleep(SETTLE).await;

	assert_eq!(
		session.execute(Input::Table).as_deref(),
		Some("parcels (1 rows)\nid\n7")
	);

	let mut events = hub.subscribe();
	assert_eq!(session.execute(Input::CloseTable), None);
	assert_eq!(events.try_recv(), Some(tigre_model::SessionEvent::CloseTable));
	assert_eq!(session.execute(Input::Table).as_deref(), Some("no table open"));
	session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn typed_commands_and_pane_actions_share_one_pipeline() {
	let (session, hub, backend) = start(parcels_backend());
	hub.emit_raw("add-vector-layer", json!(["parcels", "public"])).unwrap();
	sleep(SETTLE).await;

	session.execute(Input::Command("db current".into()));
	session.execute(Input::Buffer {
		name: "parcels".into(),
		distance: 5.0,
	});
	assert_eq!(
		session.execute(Input::Intersect {
			name: "parcels".into(),
			other: "zoning".into(),
		})
		.as_deref(),
		Some("no vector layer named 'zoning'")
	);
	sleep(SETTLE).await;

	assert_eq!(
		backend.commands(),
		vec!["db current".to_string(), "buffer public.parcels 5".to_string()]
	);
	assert_eq!(session.history().borrow().len(), 3);
	session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn control_bar_and_symbology_inputs_reach_the_backend() {
	let (session, hub, backend) = start(parcels_backend());
	hub.emit_raw("add-vector-layer", json!(["parcels", "public"])).unwrap();
	sleep(SETTLE).await;

	for line in [
		":add-layer /data/roads.shp",
		":db-connect geo secret localhost 5432 gis",
		":db-describe me@example.com 555-0100 https://example.com City data",
		r##":symbology parcels {"fillColor":"#ff0000","fillOpacity":3,"color":"#000000","weight":2}"##,
	] {
		assert_eq!(session.execute(Input::parse(line).unwrap()), None);
	}
	assert_eq!(
		session
			.execute(Input::parse(r##":symbology rivers {"fillColor":"#fff","fillOpacity":1,"color":"#000","weight":1}"##).unwrap())
			.as_deref(),
		Some("no vector layer named 'rivers'")
	);
	sleep(SETTLE).await;

	assert_eq!(
		backend.commands(),
		vec![
			"add layer '/data/roads.shp'".to_string(),
			"db connect geo secret localhost 5432 gis".to_string(),
			"db describe 'City data' me@example.com 555-0100 https://example.com".to_string(),
			r##"symbology set public.parcels '{"fillColor":"#ff0000","fillOpacity":1.0,"color":"#000000","weight":2.0}'"##
				.to_string(),
		]
	);
	session.shutdown().await;
}
