//! Line input and text rendering for the headless front end.
//!
//! Plain lines are REPL commands. Lines starting with `:` stand in for the
//! desktop client's mouse affordances.

use std::fmt::Write as _;

use thiserror::Error;
use tigre_map::PassReport;
use tigre_model::{DbConnect, DbDescribe, LngLat, Symbology};
use tigre_panels::{History, HistoryItem, PaneRow, TableTab, TableViewState};

pub const HELP: &str = "\
:click <lng> <lat>         inspect every visible layer at a point
:toggle <name>             flip a layer's visibility
:layers [filter]           list layers, optionally filtered
:pan                       redraw as after a pan or zoom
:table                     show the open table
:close-table               close the table
:buffer <name> <distance>  buffer a layer
:intersect <name> <other>  intersect two layers
:symbology <name> <json>   restyle a layer
:add-layer <path>          add a layer from a file
:db-connect <user> <pass> <host> <port> <db> [params]
                           connect to a database
:db-describe <email> <phone> <website> <description>
                           describe the served database
:quit                      leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
	Empty,
	Command(String),
	Click(LngLat),
	Toggle(String),
	Layers(Option<String>),
	Pan,
	Table,
	CloseTable,
	Buffer { name: String, distance: f64 },
	Intersect { name: String, other: String },
	Symbology { name: String, symbology: Symbology },
	AddLayer(String),
	DbConnect(DbConnect),
	DbDescribe(DbDescribe),
	Help,
	Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
	#[error("unknown command ':{0}' (try :help)")]
	Unknown(String),
	#[error("usage: {0}")]
	Usage(&'static str),
}

impl Input {
	pub fn parse(line: &str) -> Result<Self, InputError> {
		let line = line.trim();
		let Some(meta) = line.strip_prefix(':') else {
			return Ok(if line.is_empty() { Self::Empty } else { Self::Command(line.to_string()) });
		};

		let mut words = meta.split_whitespace();
		let name = words.next().unwrap_or_default();
		let args: Vec<&str> = words.collect();
		match (name, args.as_slice()) {
			("click", [lng, lat]) => match (lng.parse(), lat.parse()) {
				(Ok(lng), Ok(lat)) => Ok(Self::Click(LngLat::new(lng, lat))),
				_ => Err(InputError::Usage(":click <lng> <lat>")),
			},
			("click", _) => Err(InputError::Usage(":click <lng> <lat>")),
			("toggle", [name]) => Ok(Self::Toggle((*name).to_string())),
			("toggle", _) => Err(InputError::Usage(":toggle <name>")),
			("layers", []) => Ok(Self::Layers(None)),
			("layers", [filter]) => Ok(Self::Layers(Some((*filter).to_string()))),
			("layers", _) => Err(InputError::Usage(":layers [filter]")),
			("pan", []) => Ok(Self::Pan),
			("table", []) => Ok(Self::Table),
			("close-table", []) => Ok(Self::CloseTable),
			("buffer", [name, distance]) => match distance.parse() {
				Ok(distance) => Ok(Self::Buffer {
					name: (*name).to_string(),
					distance,
				}),
				Err(_) => Err(InputError::Usage(":buffer <name> <distance>")),
			},
			("buffer", _) => Err(InputError::Usage(":buffer <name> <distance>")),
			("intersect", [name, other]) => Ok(Self::Intersect {
				name: (*name).to_string(),
				other: (*other).to_string(),
			}),
			("intersect", _) => Err(InputError::Usage(":intersect <name> <other>")),
			("symbology", [layer, _, ..]) => {
				match serde_json::from_str(skip_words(meta, 2)) {
					Ok(symbology) => Ok(Self::Symbology {
						name: (*layer).to_string(),
						symbology,
					}),
					Err(_) => Err(InputError::Usage(":symbology <name> <json>")),
				}
			}
			("symbology", _) => Err(InputError::Usage(":symbology <name> <json>")),
			("add-layer", [_, ..]) => Ok(Self::AddLayer(skip_words(meta, 1).to_string())),
			("add-layer", _) => Err(InputError::Usage(":add-layer <path>")),
			("db-connect", [user, password, host, port, database, params @ ..]) if params.len() <= 1 => {
				Ok(Self::DbConnect(DbConnect {
					user: (*user).to_string(),
					password: (*password).to_string(),
					host: (*host).to_string(),
					port: (*port).to_string(),
					database: (*database).to_string(),
					params: params.first().map(|p| (*p).to_string()).unwrap_or_default(),
				}))
			}
			("db-connect", _) => Err(InputError::Usage(":db-connect <user> <pass> <host> <port> <db> [params]")),
			("db-describe", [email, phone, website, _, ..]) => {
				Ok(Self::DbDescribe(DbDescribe {
					description: skip_words(meta, 4).to_string(),
					email: (*email).to_string(),
					phone: (*phone).to_string(),
					website: (*website).to_string(),
				}))
			}
			("db-describe", _) => Err(InputError::Usage(":db-describe <email> <phone> <website> <description>")),
			("help", _) => Ok(Self::Help),
			("quit" | "q", _) => Ok(Self::Quit),
			(other, _) => Err(InputError::Unknown(other.to_string())),
		}
	}
}

/// The rest of `text` after its first `count` words, inner spacing intact.
fn skip_words(text: &str, count: usize) -> &str {
	let mut rest = text.trim();
	for _ in 0..count {
		let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
		rest = rest[end..].trim_start();
	}
	rest
}

pub fn render_history_item(item: &HistoryItem) -> String {
	let marker = if item.is_error() { "!" } else { ">" };
	format!("[{}] {marker} {}\n    {}", item.timestamp(), item.command, item.message())
}

pub fn render_rows(rows: &[PaneRow]) -> String {
	if rows.is_empty() {
		return "no layers".to_string();
	}
	let mut out = String::new();
	for row in rows {
		let check = if row.visible { 'x' } else { ' ' };
		let style = if row.symbology.is_some() { "" } else { " (unstyled)" };
		let _ = writeln!(out, "[{check}] {}{style}", row.label());
	}
	out.truncate(out.trim_end().len());
	out
}

pub fn render_table(state: &TableViewState) -> String {
	let Some(tab) = state.tab.as_ref().filter(|_| state.visible) else {
		return "no table open".to_string();
	};
	let columns = tab.columns();
	let mut out = format!("{} ({} rows)\n{}", tab.label, tab.rows.len(), columns.join(" | "));
	for row in &tab.rows {
		let cells: Vec<String> = columns.iter().map(|column| TableTab::cell(row, column)).collect();
		let _ = write!(out, "\n{}", cells.join(" | "));
	}
	out
}

pub fn render_report(report: &PassReport) -> String {
	let mut out = format!(
		"map: pass {} drew {}/{} layers",
		report.generation, report.rendered, report.fetched
	);
	for failure in &report.failed {
		let _ = write!(out, "\n    {} failed: {}", failure.layer, failure.reason);
	}
	out
}

/// Tracks which history items were already printed.
#[derive(Debug, Default)]
pub struct HistoryCursor {
	printed: usize,
	epoch: u64,
}

impl HistoryCursor {
	/// Items not printed yet. A history cleared since the last call starts over.
	pub fn fresh<'a>(&mut self, history: &'a History) -> &'a [HistoryItem] {
		if history.epoch() != self.epoch || history.len() < self.printed {
			self.epoch = history.epoch();
			self.printed = 0;
		}
		let fresh = &history.items()[self.printed..];
		self.printed = history.len();
		fresh
	}
}

#[cfg(test)]
mod tests;
