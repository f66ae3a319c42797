use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use tigre_bridge::EventHub;
use tigre_map::FailedFetch;
use tigre_model::{DbConnect, DbDescribe, LayerRef, Output, SessionEvent, Symbology};
use tigre_panels::TableView;

use super::*;

#[rstest]
#[case("", Input::Empty)]
#[case("  db current ", Input::Command("db current".into()))]
#[case(":click -73.5 45.25", Input::Click(LngLat::new(-73.5, 45.25)))]
#[case(":toggle parcels", Input::Toggle("parcels".into()))]
#[case(":layers", Input::Layers(None))]
#[case(":layers PUB", Input::Layers(Some("PUB".into())))]
#[case(":pan", Input::Pan)]
#[case(":table", Input::Table)]
#[case(":close-table", Input::CloseTable)]
#[case(":buffer parcels 10", Input::Buffer { name: "parcels".into(), distance: 10.0 })]
#[case(":intersect parcels zoning", Input::Intersect { name: "parcels".into(), other: "zoning".into() })]
#[case(":q", Input::Quit)]
fn parses_lines(#[case] line: &str, #[case] expected: Input) {
	assert_eq!(Input::parse(line), Ok(expected));
}

#[test]
fn parses_control_bar_meta_commands() {
	assert_eq!(
		Input::parse(":add-layer /data/city parcels.gpkg"),
		Ok(Input::AddLayer("/data/city parcels.gpkg".into()))
	);
	assert_eq!(
		Input::parse(":db-connect geo secret localhost 5432 gis sslmode=disable"),
		Ok(Input::DbConnect(DbConnect {
			user: "geo".into(),
			password: "secret".into(),
			host: "localhost".into(),
			port: "5432".into(),
			database: "gis".into(),
			params: "sslmode=disable".into(),
		}))
	);
	assert_eq!(
		Input::parse(":db-connect geo secret localhost 5432 gis"),
		Ok(Input::DbConnect(DbConnect {
			user: "geo".into(),
			password: "secret".into(),
			host: "localhost".into(),
			port: "5432".into(),
			database: "gis".into(),
			params: String::new(),
		}))
	);
	assert_eq!(
		Input::parse(":db-describe me@example.com 555-0100 https://example.com  City  parcels"),
		Ok(Input::DbDescribe(DbDescribe {
			description: "City  parcels".into(),
			email: "me@example.com".into(),
			phone: "555-0100".into(),
			website: "https://example.com".into(),
		}))
	);
}

#[test]
fn parses_symbology_json_with_spaces() {
	let line = r##":symbology parcels { "fillColor": "#ff0000", "fillOpacity": 0.5, "color": "#000000", "weight": 2 }"##;
	assert_eq!(
		Input::parse(line),
		Ok(Input::Symbology {
			name: "parcels".into(),
			symbology: Symbology {
				fill_color: "#ff0000".into(),
				fill_opacity: 0.5,
				color: "#000000".into(),
				weight: 2.0,
			},
		})
	);
}

#[rstest]
#[case(":symbology parcels", InputError::Usage(":symbology <name> <json>"))]
#[case(":symbology parcels red", InputError::Usage(":symbology <name> <json>"))]
#[case(":add-layer", InputError::Usage(":add-layer <path>"))]
#[case(":db-connect geo secret localhost", InputError::Usage(":db-connect <user> <pass> <host> <port> <db> [params]"))]
#[case(":db-describe me@example.com 555-0100", InputError::Usage(":db-describe <email> <phone> <website> <description>"))]
fn rejects_incomplete_control_bar_commands(#[case] line: &str, #[case] expected: InputError) {
	assert_eq!(Input::parse(line), Err(expected));
}

#[rstest]
#[case(":click 1", InputError::Usage(":click <lng> <lat>"))]
#[case(":click east north", InputError::Usage(":click <lng> <lat>"))]
#[case(":buffer parcels far", InputError::Usage(":buffer <name> <distance>"))]
#[case(":zoom 3", InputError::Unknown("zoom".into()))]
fn rejects_bad_meta_commands(#[case] line: &str, #[case] expected: InputError) {
	assert_eq!(Input::parse(line), Err(expected));
}

#[test]
fn renders_layer_rows() {
	let rows = vec![
		PaneRow {
			schema: "public".into(),
			name: "parcels".into(),
			visible: true,
			symbology: Some(Symbology::default()),
		},
		PaneRow {
			schema: "public".into(),
			name: "roads".into(),
			visible: false,
			symbology: None,
		},
	];
	assert_eq!(render_rows(&rows), "[x] public.parcels\n[ ] public.roads (unstyled)");
	assert_eq!(render_rows(&[]), "no layers");
}

#[test]
fn renders_the_open_table() {
	let view = TableView::new(EventHub::new());
	assert_eq!(render_table(&view.state()), "no table open");

	let payload = serde_json::Value::String(
		json!({ "json_agg": [{ "id": 1, "owner": "Ada", "geom": "01" }, { "id": 2, "owner": null, "geom": "02" }] })
			.to_string(),
	)
	.to_string();
	view.handle(&SessionEvent::OpenTable {
		label: "parcels".into(),
		payload,
	})
	.unwrap();

	assert_eq!(
		render_table(&view.state()),
		"parcels (2 rows)\nid | owner\n1 | \"Ada\"\n2 | null"
	);
}

#[test]
fn renders_pass_reports() {
	let report = PassReport {
		generation: 3,
		fetched: 2,
		rendered: 1,
		failed: vec![FailedFetch {
			layer: LayerRef::new("public", "roads"),
			reason: "timed out after 30s".into(),
		}],
	};
	assert_eq!(
		render_report(&report),
		"map: pass 3 drew 1/2 layers\n    public.roads failed: timed out after 30s"
	);
}

#[test]
fn history_cursor_prints_each_item_once() {
	let mut cursor = HistoryCursor::default();
	let mut history = History::default();
	assert_eq!(cursor.fresh(&history).len(), 1);
	assert!(cursor.fresh(&history).is_empty());

	let item = HistoryItem::new("db current", Output::message("ok"));
	assert!(render_history_item(&item).ends_with("> db current\n    ok"));
	history.push(item.clone());
	history.push(item);
	assert_eq!(cursor.fresh(&history).len(), 2);
	assert!(cursor.fresh(&history).is_empty());

	// Cleared, then one new item.
	history.clear();
	history.push(HistoryItem::new("db current", Output::error("no database")));
	let fresh = cursor.fresh(&history);
	assert_eq!(fresh.len(), 1);
	assert!(render_history_item(&fresh[0]).contains("! db current"));
}

#[test]
fn history_cursor_restarts_after_a_clear_of_equal_length() {
	let mut cursor = HistoryCursor::default();
	let mut history = History::default();
	history.clear();
	history.push(HistoryItem::new("a", Output::message("ok")));
	history.push(HistoryItem::new("b", Output::message("ok")));
	assert_eq!(commands(cursor.fresh(&history)), vec!["a", "b"]);

	// Both updates land before the printer wakes up.
	history.clear();
	history.push(HistoryItem::new("c", Output::message("ok")));
	history.push(HistoryItem::new("d", Output::message("ok")));
	assert_eq!(commands(cursor.fresh(&history)), vec!["c", "d"]);
}

fn commands(items: &[HistoryItem]) -> Vec<&str> {
	items.iter().map(|item| item.command.as_str()).collect()
}
