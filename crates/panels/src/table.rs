//! Table view fed by `open-table` and `close-table`.
//!
//! `open-table` carries `[label, payload]` where `payload` is JSON encoded
//! twice. The decoded object holds the rows under `json_agg`. The view shows a
//! single tab; opening another replaces it.

use serde_json::{Map, Value};
use thiserror::Error;
use tigre_bridge::{EventHub, EventStream};
use tigre_model::SessionEvent;
use tigre_model::event::decode_double_encoded;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Column never shown in the table.
pub const GEOMETRY_COLUMN: &str = "geom";

const ROWS_FIELD: &str = "json_agg";

#[derive(Debug, Error)]
pub enum TableError {
	#[error("table '{label}' payload is not double-encoded JSON: {source}")]
	Undecodable {
		label: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("table '{label}' rows are not an array of objects")]
	NotRows { label: String },
}

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct TableTab {
	pub label: String,
	pub rows: Vec<Row>,
}

impl TableTab {
	/// Decodes an `open-table` payload.
	///
	/// Returns `Ok(None)` when the payload has no `json_agg` rows.
	pub fn decode(label: &str, payload: &str) -> Result<Option<Self>, TableError> {
		let mut object: Map<String, Value> = decode_double_encoded(payload).map_err(|source| TableError::Undecodable {
			label: label.to_string(),
			source,
		})?;
		let rows = match object.remove(ROWS_FIELD) {
			None | Some(Value::Null) => return Ok(None),
			Some(rows) => rows,
		};
		let rows: Vec<Row> = serde_json::from_value(rows).map_err(|_| TableError::NotRows {
			label: label.to_string(),
		})?;
		Ok(Some(Self {
			label: label.to_string(),
			rows,
		}))
	}

	/// Column names taken from the first row, geometry excluded.
	pub fn columns(&self) -> Vec<&str> {
		self.rows
			.first()
			.map(|row| {
				row.keys()
					.map(String::as_str)
					.filter(|column| *column != GEOMETRY_COLUMN)
					.collect()
			})
			.unwrap_or_default()
	}

	/// Cell text: the value's JSON form, empty when the row lacks the column.
	pub fn cell(row: &Row, column: &str) -> String {
		row.get(column).map(Value::to_string).unwrap_or_default()
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableViewState {
	pub tab: Option<TableTab>,
	pub visible: bool,
}

/// Shared handle to the table panel.
#[derive(Debug, Clone)]
pub struct TableView {
	state: watch::Sender<TableViewState>,
	hub: EventHub,
}

impl TableView {
	pub fn new(hub: EventHub) -> Self {
		let (state, _rx) = watch::channel(TableViewState::default());
		Self { state, hub }
	}

	/// Starts applying table events published on the hub.
	pub fn spawn(&self) -> JoinHandle<()> {
		let events = self.hub.subscribe();
		tokio::spawn(self.clone().listen(events))
	}

	async fn listen(self, mut events: EventStream) {
		while let Some(event) = events.recv().await {
			if let Err(error) = self.handle(&event) {
				warn!(%error, "table.open_failed");
			}
		}
	}

	/// Applies one event. Other events are ignored.
	pub fn handle(&self, event: &SessionEvent) -> Result<(), TableError> {
		match event {
			SessionEvent::OpenTable { label, payload } => match TableTab::decode(label, payload)? {
				Some(tab) => {
					info!(label = %tab.label, rows = tab.rows.len(), "table.open");
					self.state.send_replace(TableViewState {
						tab: Some(tab),
						visible: true,
					});
				}
				None => warn!(label = %label, "table.missing_rows"),
			},
			SessionEvent::CloseTable => self.clear(),
			_ => {}
		}
		Ok(())
	}

	/// The panel's own close action: tells the backend, then clears locally.
	pub fn close(&self) {
		debug!("table.close");
		self.hub.emit(SessionEvent::CloseTable);
		self.clear();
	}

	pub fn state(&self) -> TableViewState {
		self.state.borrow().clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<TableViewState> {
		self.state.subscribe()
	}

	fn clear(&self) {
		self.state.send_if_modified(|state| {
			let changed = state.visible || state.tab.is_some();
			*state = TableViewState::default();
			changed
		});
	}
}
