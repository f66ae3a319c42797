use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tigre_bridge::testing::MockBackend;
use tigre_model::{CommandSurface, OutputResults};

use super::*;

fn pipeline(backend: MockBackend) -> (CommandPipeline, Arc<MockBackend>) {
	let backend = Arc::new(backend);
	(CommandPipeline::new(backend.clone()), backend)
}

#[test]
fn history_opens_with_the_welcome_item() {
	let history = History::default();
	assert_eq!(history.len(), 1);
	let welcome = &history.items()[0];
	assert_eq!(welcome.command, WELCOME_COMMAND);
	assert_eq!(welcome.message(), WELCOME_MESSAGE);
	assert!(welcome.forced);
	assert!(!welcome.is_error());
}

#[tokio::test]
async fn commands_run_read_then_eval() {
	let (pipeline, backend) = pipeline(MockBackend::new().with_output(
		"buffer public.parcels 10",
		Output {
			errors: Vec::new(),
			results: OutputResults::Messages(vec!["Done.".into(), "parcels_buffer".into()]),
		},
	));

	let item = pipeline.submit("buffer public.parcels 10\n").await.unwrap();

	assert_eq!(item.command, "buffer public.parcels 10");
	assert_eq!(item.message(), "Done. → parcels_buffer");
	assert!(!item.is_error());
	assert_eq!(backend.commands(), vec!["buffer public.parcels 10".to_string()]);
	assert_eq!(pipeline.history().len(), 2);
}

#[tokio::test]
async fn clear_stays_local() {
	let (pipeline, backend) = pipeline(MockBackend::new());
	pipeline.submit("db current").await;

	assert_eq!(pipeline.submit("  clear\n").await, None);

	assert!(pipeline.history().is_empty());
	assert_eq!(backend.commands(), vec!["db current".to_string()]);
}

#[tokio::test]
async fn blank_submissions_are_ignored() {
	let (pipeline, backend) = pipeline(MockBackend::new());
	assert_eq!(pipeline.submit(" \r\n").await, None);
	assert!(backend.calls().is_empty());
	assert_eq!(pipeline.history().len(), 1);
}

#[tokio::test]
async fn bridge_failures_become_error_items() {
	let (pipeline, _backend) = pipeline(MockBackend::new().fail_command("frobnicate", "unknown command"));

	let item = pipeline.submit("frobnicate").await.unwrap();

	assert!(item.is_error());
	assert_eq!(item.message(), "backend rejected 'read': unknown command");
	// The pipeline keeps going.
	assert!(pipeline.submit("db current").await.is_some());
	assert_eq!(pipeline.history().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn stalled_commands_time_out_into_error_items() {
	let backend = Arc::new(MockBackend::new().stall_command("db describe"));
	let pipeline = CommandPipeline::new(backend.clone()).with_call_timeout(Duration::from_secs(5));
	let (commands, rx) = CommandSurface::channel();
	let task = pipeline.clone().spawn(rx);

	commands.submit("db describe");
	commands.submit("db current");
	drop(commands);
	task.await.unwrap();

	let history = pipeline.history();
	let items: Vec<_> = history.items()[1..].iter().map(|item| (item.command.as_str(), item.is_error())).collect();
	assert_eq!(items, vec![("db describe", true), ("db current", false)]);
	assert_eq!(history.items()[1].message(), "backend did not answer 'eval' within 5s");
	assert_eq!(backend.commands(), vec!["db describe".to_string(), "db current".to_string()]);
}

#[tokio::test]
async fn backend_errors_are_shown_joined() {
	let (pipeline, _backend) = pipeline(MockBackend::new().with_output(
		"intersect public.a public.b",
		Output {
			errors: vec!["intersect failed".into(), "no overlap".into()],
			results: OutputResults::default(),
		},
	));

	let item = pipeline.submit("intersect public.a public.b").await.unwrap();
	assert!(item.is_error());
	assert_eq!(item.message(), "intersect failed → no overlap");
}

#[tokio::test]
async fn spawned_pipeline_drains_the_surface_in_order() {
	let (pipeline, backend) = pipeline(MockBackend::new());
	let mut history = pipeline.subscribe();
	let (commands, rx) = CommandSurface::channel();
	let task = pipeline.spawn(rx);

	commands.submit("db current");
	commands.submit("clear");
	commands.submit("add layer '/tmp/parcels.gpkg'");
	drop(commands);
	task.await.unwrap();

	assert_eq!(
		backend.commands(),
		vec!["db current".to_string(), "add layer '/tmp/parcels.gpkg'".to_string()]
	);
	let history = history.borrow_and_update().clone();
	assert_eq!(history.len(), 1);
	assert_eq!(history.items()[0].message(), "ok: add layer '/tmp/parcels.gpkg'");
}

#[test]
fn timestamps_use_month_day_year() {
	use chrono::TimeZone;

	let mut item = HistoryItem::new("db current", Output::message("ok"));
	item.recorded_at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
	assert_eq!(item.timestamp(), "3 / 7 / 2024 @ 9:05");
}
