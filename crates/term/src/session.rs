//! Wiring of one client session.
//!
//! One store, one event hub and one command surface are shared by every
//! component. Each long-lived component runs as its own task.

use tigre_bridge::{EventHub, LayerSync, SharedBackend};
use tigre_map::{HeadlessSurface, PassReport, RedrawScheduler, RedrawTrigger};
use tigre_model::{Command, CommandSurface, LayerStore};
use tigre_panels::{CommandPipeline, History, LayerPane, LoadingIndicator, TableView};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::shell::{self, HELP, Input};

pub struct Session {
	store: LayerStore,
	commands: CommandSurface,
	scheduler: RedrawScheduler,
	pipeline: CommandPipeline,
	table: TableView,
	loading: LoadingIndicator,
	tasks: Vec<JoinHandle<()>>,
}

impl Session {
	/// Starts every component and requests the initial redraw.
	pub fn start(backend: SharedBackend, hub: EventHub, config: &Config) -> Self {
		let store = LayerStore::new();
		let (commands, receiver) = CommandSurface::channel();
		let redraw = config.redraw();
		let call_timeout = redraw.fetch_timeout;

		let sync = LayerSync::new(backend.clone(), store.clone()).with_call_timeout(call_timeout);
		let mut tasks = vec![sync.spawn(&hub)];

		let table = TableView::new(hub.clone());
		tasks.push(table.spawn());
		let loading = LoadingIndicator::spawn(&hub);

		let pipeline = CommandPipeline::new(backend.clone()).with_call_timeout(call_timeout);
		tasks.push(pipeline.clone().spawn(receiver));

		let scheduler = RedrawScheduler::spawn(
			HeadlessSurface::new(config.basemap()),
			store.clone(),
			backend,
			hub,
			commands.clone(),
			redraw,
		);
		scheduler.request_redraw(RedrawTrigger::MapReady);
		info!(basemap = %config.map.basemap_url, "term.session.started");

		Self {
			store,
			commands,
			scheduler,
			pipeline,
			table,
			loading,
			tasks,
		}
	}

	pub fn history(&self) -> watch::Receiver<History> {
		self.pipeline.subscribe()
	}

	pub fn reports(&self) -> broadcast::Receiver<PassReport> {
		self.scheduler.subscribe_reports()
	}

	/// Runs one parsed input line. Returns text to print, if any.
	pub fn execute(&self, input: Input) -> Option<String> {
		debug!(?input, "term.input");
		match input {
			Input::Empty | Input::Quit => None,
			Input::Command(text) => {
				self.commands.submit(text);
				None
			}
			Input::Click(at) => Some(match self.scheduler.click_port().click(at) {
				Some(count) => format!("inspecting {count} layer(s) at {at}"),
				None => "map not drawn yet".to_string(),
			}),
			Input::Toggle(name) => {
				if self.pane().toggle(&name) {
					None
				} else {
					Some(format!("no vector layer named '{name}'"))
				}
			}
			Input::Layers(filter) => {
				let mut pane = self.pane();
				if let Some(filter) = filter {
					pane.set_filter(filter);
				}
				let rows = shell::render_rows(&pane.rows());
				let loading = self.loading.current();
				Some(if loading.is_visible() {
					format!("{rows}\n(loading {}%)", loading.percent)
				} else {
					rows
				})
			}
			Input::Pan => {
				self.scheduler.request_redraw(RedrawTrigger::ViewportChanged);
				None
			}
			Input::Table => Some(shell::render_table(&self.table.state())),
			Input::CloseTable => {
				self.table.close();
				None
			}
			Input::Buffer { name, distance } => self.pane().buffer(&name, distance).err().map(|e| e.to_string()),
			Input::Intersect { name, other } => self.pane().intersect(&name, &other).err().map(|e| e.to_string()),
			Input::Symbology { name, symbology } => {
				self.pane().set_symbology(&name, symbology).err().map(|e| e.to_string())
			}
			Input::AddLayer(path) => self.submit(Command::AddLayer { path }),
			Input::DbConnect(connect) => self.submit(Command::DbConnect(connect)),
			Input::DbDescribe(describe) => self.submit(Command::DbDescribe(describe)),
			Input::Help => Some(HELP.to_string()),
		}
	}

	/// Cancels the scheduler and stops every listener.
	pub async fn shutdown(mut self) {
		self.scheduler.shutdown().await;
		for task in self.tasks.drain(..) {
			task.abort();
		}
		info!("term.session.stopped");
	}

	fn submit(&self, command: Command) -> Option<String> {
		if self.commands.submit(command) { None } else { Some("command pipeline stopped".to_string()) }
	}

	fn pane(&self) -> LayerPane {
		LayerPane::new(self.store.clone(), self.commands.clone())
	}
}

#[cfg(test)]
mod tests;
