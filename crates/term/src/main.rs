mod cli;
mod config;
mod logging;
mod session;
mod shell;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use config::Config;
use session::Session;
use shell::{HistoryCursor, Input};
use tigre_bridge::{EventHub, StdioBackend};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let config = Config::load_or_default(cli.config.as_deref()).context("failed to load configuration")?;
	logging::setup_tracing(cli.verbose, config.log.filter.as_deref());

	let (program, args) = cli.backend_command(&config);
	let hub = EventHub::new();
	let backend = Arc::new(
		StdioBackend::spawn(&program, &args, hub.clone()).with_context(|| format!("failed to start backend '{program}'"))?,
	);
	info!(%program, "term.started");

	let session = Session::start(backend.clone(), hub, &config);
	let printer = spawn_printer(&session);

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	loop {
		let line = tokio::select! {
			line = lines.next_line() => line?,
			() = backend.closed() => {
				eprintln!("backend exited");
				break;
			}
		};
		let Some(line) = line else { break };
		match Input::parse(&line) {
			Ok(Input::Quit) => break,
			Ok(input) => {
				if let Some(text) = session.execute(input) {
					println!("{text}");
				}
			}
			Err(error) => eprintln!("{error}"),
		}
	}

	printer.abort();
	session.shutdown().await;
	backend.shutdown();
	Ok(())
}

/// Prints history items and pass reports as they arrive.
fn spawn_printer(session: &Session) -> JoinHandle<()> {
	let mut history = session.history();
	let mut reports = session.reports();
	tokio::spawn(async move {
		let mut cursor = HistoryCursor::default();
		let initial = history.borrow_and_update().clone();
		for item in cursor.fresh(&initial) {
			println!("{}", shell::render_history_item(item));
		}
		loop {
			tokio::select! {
				changed = history.changed() => {
					if changed.is_err() {
						break;
					}
					let history = history.borrow_and_update().clone();
					for item in cursor.fresh(&history) {
						println!("{}", shell::render_history_item(item));
					}
				}
				report = reports.recv() => match report {
					Ok(report) => println!("{}", shell::render_report(&report)),
					Err(broadcast::error::RecvError::Lagged(_)) => {}
					Err(broadcast::error::RecvError::Closed) => break,
				},
			}
		}
	})
}
