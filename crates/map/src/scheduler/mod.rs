//! Debounced redraw passes over the visible vector layers.
//!
//! [`RedrawScheduler`] runs a single actor task that owns the map surface.
//! Triggers (store changes, map ready, viewport changes) move it through three
//! phases:
//!
//! - `Idle`: nothing to do.
//! - `Scheduled`: a debounce window is armed. Every further trigger restarts it.
//! - `Drawing`: one pass is running. Overlays were cleared, the click handler
//!   replaced, and one geometry fetch per visible layer is in flight.
//!
//! Triggers that arrive while drawing collapse into a single follow-up pass,
//! which gets its own debounce window once the current pass completes.
//!
//! # Progress
//!
//! Each pass emits `loading` on the event hub: `75` at pass start, `90` once
//! every fetch has resolved, then `0`. A pass with no visible layers emits `75`
//! then `0`.
//!
//! # Failures and cancellation
//!
//! Every fetch is bounded by [`RedrawConfig::fetch_timeout`]. A rejected or
//! timed-out fetch is logged and listed in the [`PassReport`]; the pass goes on.
//! Fetches live in a `JoinSet` owned by the pass that spawned them, and a pass
//! drains or aborts that set before the next one starts. A result can therefore
//! only reach the pass that asked for it; overlays keep its generation tag.
//! Shutdown cancels in-flight fetches.

mod token;

use std::time::Duration;

use thiserror::Error;
use tigre_bridge::backend::fetch_geometry;
use tigre_bridge::{BridgeError, EventHub, GeometrySet, SharedBackend};
use tigre_model::{CommandSurface, LayerRef, LayerStore, LayerStoreState, SessionEvent, Symbology};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use self::token::{GenerationClock, GenerationToken};
use crate::click::{ClickDispatcher, ClickPort, ClickSlot};
use crate::surface::{MapSurface, Overlay};

/// Default quiescence window before a pass starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Default bound on a single layer's geometry fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub const LOADING_STARTED: i64 = 75;
pub const LOADING_FETCHED: i64 = 90;
pub const LOADING_DONE: i64 = 0;

const REPORT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawConfig {
	pub debounce: Duration,
	pub fetch_timeout: Duration,
}

impl Default for RedrawConfig {
	fn default() -> Self {
		Self {
			debounce: DEFAULT_DEBOUNCE,
			fetch_timeout: DEFAULT_FETCH_TIMEOUT,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawPhase {
	Idle,
	Scheduled,
	Drawing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawTrigger {
	StoreChanged,
	MapReady,
	/// Pan or zoom ended.
	ViewportChanged,
}

impl RedrawTrigger {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::StoreChanged => "store_changed",
			Self::MapReady => "map_ready",
			Self::ViewportChanged => "viewport_changed",
		}
	}
}

#[derive(Debug, Error)]
pub enum FetchError {
	#[error(transparent)]
	Backend(#[from] BridgeError),
	#[error("timed out after {0:?}")]
	TimedOut(Duration),
	#[error("cancelled")]
	Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedFetch {
	pub layer: LayerRef,
	pub reason: String,
}

/// Outcome of one completed pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
	pub generation: u64,
	/// Fetches issued, one per visible layer.
	pub fetched: usize,
	pub rendered: usize,
	pub failed: Vec<FailedFetch>,
}

/// Handle to the redraw actor.
///
/// Dropping the handle cancels the actor and any in-flight fetches.
pub struct RedrawScheduler {
	triggers: mpsc::UnboundedSender<RedrawTrigger>,
	phase: watch::Receiver<RedrawPhase>,
	reports: broadcast::Sender<PassReport>,
	click: ClickPort,
	shutdown: CancellationToken,
	task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for RedrawScheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RedrawScheduler")
			.field("phase", &*self.phase.borrow())
			.finish_non_exhaustive()
	}
}

impl RedrawScheduler {
	/// Spawns the actor. It observes `store` from now on; call
	/// [`request_redraw`](Self::request_redraw) with [`RedrawTrigger::MapReady`]
	/// for the initial pass.
	pub fn spawn<S: MapSurface>(
		surface: S,
		store: LayerStore,
		backend: SharedBackend,
		hub: EventHub,
		commands: CommandSurface,
		config: RedrawConfig,
	) -> Self {
		let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
		let (phase_tx, phase_rx) = watch::channel(RedrawPhase::Idle);
		let (reports, _) = broadcast::channel(REPORT_CAPACITY);
		let click = ClickSlot::default();
		let shutdown = CancellationToken::new();

		let triggers = Triggers {
			rx: trigger_rx,
			store: store.subscribe(),
		};
		let actor = RedrawActor {
			surface,
			store,
			backend,
			hub,
			dispatcher: ClickDispatcher::new(commands),
			click: click.clone(),
			config,
			clock: GenerationClock::default(),
			phase: phase_tx,
			reports: reports.clone(),
			shutdown: shutdown.clone(),
		};
		let task = tokio::spawn(actor.run(triggers));

		Self {
			triggers: trigger_tx,
			phase: phase_rx,
			reports,
			click: click.port(),
			shutdown,
			task: Some(task),
		}
	}

	/// Feeds a trigger that does not come from the store.
	///
	/// Returns `false` once the actor has stopped.
	pub fn request_redraw(&self, trigger: RedrawTrigger) -> bool {
		self.triggers.send(trigger).is_ok()
	}

	pub fn phase(&self) -> RedrawPhase {
		*self.phase.borrow()
	}

	pub fn watch_phase(&self) -> watch::Receiver<RedrawPhase> {
		self.phase.clone()
	}

	/// Receives a report for every pass completed from now on.
	pub fn subscribe_reports(&self) -> broadcast::Receiver<PassReport> {
		self.reports.subscribe()
	}

	pub fn click_port(&self) -> ClickPort {
		self.click.clone()
	}

	/// Cancels the actor and waits for it to stop.
	pub async fn shutdown(&mut self) {
		self.shutdown.cancel();
		if let Some(task) = self.task.take()
			&& let Err(error) = task.await
		{
			warn!(%error, "map.redraw.join_failed");
		}
	}
}

impl Drop for RedrawScheduler {
	fn drop(&mut self) {
		self.shutdown.cancel();
	}
}

/// Merged trigger sources of the actor.
struct Triggers {
	rx: mpsc::UnboundedReceiver<RedrawTrigger>,
	store: watch::Receiver<LayerStoreState>,
}

impl Triggers {
	/// Waits for the next trigger. `None` once a source is gone.
	async fn next(&mut self) -> Option<RedrawTrigger> {
		tokio::select! {
			changed = self.store.changed() => changed.ok().map(|()| RedrawTrigger::StoreChanged),
			trigger = self.rx.recv() => trigger,
		}
	}
}

enum PassOutcome {
	Done,
	/// Triggered while drawing; schedule another pass.
	FollowUp(RedrawTrigger),
	Stopped,
}

/// Result of one fetch task, tagged with its pass.
struct Fetched {
	generation: u64,
	layer: LayerRef,
	result: Result<GeometrySet, FetchError>,
}

struct RedrawActor<S> {
	surface: S,
	store: LayerStore,
	backend: SharedBackend,
	hub: EventHub,
	dispatcher: ClickDispatcher,
	click: ClickSlot,
	config: RedrawConfig,
	clock: GenerationClock,
	phase: watch::Sender<RedrawPhase>,
	reports: broadcast::Sender<PassReport>,
	shutdown: CancellationToken,
}

impl<S: MapSurface> RedrawActor<S> {
	async fn run(mut self, mut triggers: Triggers) {
		let mut pending = None;
		loop {
			let trigger = match pending.take() {
				Some(trigger) => trigger,
				None => tokio::select! {
					biased;
					_ = self.shutdown.cancelled() => break,
					trigger = triggers.next() => match trigger {
						Some(trigger) => trigger,
						None => break,
					},
				},
			};

			if !self.debounce(trigger, &mut triggers).await {
				break;
			}

			match self.draw(&mut triggers).await {
				PassOutcome::Done => self.set_phase(RedrawPhase::Idle),
				PassOutcome::FollowUp(trigger) => pending = Some(trigger),
				PassOutcome::Stopped => break,
			}
		}
		self.set_phase(RedrawPhase::Idle);
		debug!("map.redraw.stopped");
	}

	/// Waits out the debounce window. Returns `false` on shutdown.
	async fn debounce(&mut self, trigger: RedrawTrigger, triggers: &mut Triggers) -> bool {
		self.set_phase(RedrawPhase::Scheduled);
		debug!(trigger = trigger.as_str(), "map.redraw.scheduled");

		let window = sleep(self.config.debounce);
		tokio::pin!(window);
		loop {
			tokio::select! {
				biased;
				_ = self.shutdown.cancelled() => return false,
				() = &mut window => return true,
				trigger = triggers.next() => match trigger {
					Some(trigger) => {
						trace!(trigger = trigger.as_str(), "map.redraw.debounce_restart");
						window.as_mut().reset(Instant::now() + self.config.debounce);
					}
					None => return false,
				},
			}
		}
	}

	async fn draw(&mut self, triggers: &mut Triggers) -> PassOutcome {
		let pass = GenerationToken::new(self.clock.next(), self.shutdown.child_token());
		let generation = pass.generation();
		self.set_phase(RedrawPhase::Drawing);

		let layers = self.store.with_state(LayerStoreState::visible_refs);
		info!(generation, layers = layers.len(), "map.redraw.pass_start");

		self.hub.emit(SessionEvent::Loading(LOADING_STARTED));
		self.surface.clear_overlays();
		self.click.install(self.dispatcher.handler(layers.clone()));

		let mut report = PassReport {
			generation,
			fetched: layers.len(),
			..PassReport::default()
		};
		let mut follow_up = None;

		if !layers.is_empty() {
			let mut fetches = JoinSet::new();
			for layer in layers {
				fetches.spawn(fetch(self.backend.clone(), layer, pass.child(), self.config.fetch_timeout));
			}

			while !fetches.is_empty() {
				tokio::select! {
					biased;
					_ = pass.cancelled() => {
						fetches.abort_all();
						info!(generation, "map.redraw.pass_cancelled");
						return PassOutcome::Stopped;
					}
					joined = fetches.join_next() => match joined {
						Some(Ok(fetched)) => self.render(fetched, &mut report),
						Some(Err(error)) => warn!(generation, %error, "map.redraw.fetch_task_failed"),
						None => break,
					},
					trigger = triggers.next(), if follow_up.is_none() => match trigger {
						Some(trigger) => {
							debug!(generation, trigger = trigger.as_str(), "map.redraw.follow_up");
							follow_up = Some(trigger);
						}
						None => return PassOutcome::Stopped,
					},
				}
			}
			self.hub.emit(SessionEvent::Loading(LOADING_FETCHED));
		}
		self.hub.emit(SessionEvent::Loading(LOADING_DONE));

		info!(
			generation,
			fetched = report.fetched,
			rendered = report.rendered,
			failed = report.failed.len(),
			"map.redraw.pass_done"
		);
		// No subscribers is fine.
		let _ = self.reports.send(report);

		match follow_up {
			Some(trigger) => PassOutcome::FollowUp(trigger),
			None => PassOutcome::Done,
		}
	}

	fn render(&mut self, fetched: Fetched, report: &mut PassReport) {
		match fetched.result {
			Ok(set) => {
				let style = self.current_style(&set.layer);
				trace!(layer = %set.layer, geometries = set.geometries.len(), "map.redraw.render");
				self.surface.add_overlay(Overlay {
					layer: set.layer,
					generation: fetched.generation,
					geometries: set.geometries,
					style,
				});
				report.rendered += 1;
			}
			Err(error) => {
				warn!(generation = fetched.generation, layer = %fetched.layer, %error, "map.redraw.fetch_failed");
				report.failed.push(FailedFetch {
					layer: fetched.layer,
					reason: error.to_string(),
				});
			}
		}
	}

	/// Symbology of `layer` as the store holds it now, not at pass start.
	fn current_style(&self, layer: &LayerRef) -> Option<Symbology> {
		self.store.with_state(|state| {
			state
				.vector_layer(&layer.name)
				.and_then(|layer| layer.symbology.as_ref())
				.map(Symbology::clamped)
		})
	}

	fn set_phase(&self, phase: RedrawPhase) {
		self.phase.send_if_modified(|current| {
			if *current == phase {
				return false;
			}
			trace!(from = ?*current, to = ?phase, "map.redraw.phase");
			*current = phase;
			true
		});
	}
}

async fn fetch(backend: SharedBackend, layer: LayerRef, token: GenerationToken, limit: Duration) -> Fetched {
	let result = tokio::select! {
		biased;
		_ = token.cancelled() => Err(FetchError::Cancelled),
		fetched = timeout(limit, fetch_geometry(backend.as_ref(), &layer)) => match fetched {
			Ok(result) => result.map_err(FetchError::from),
			Err(_) => Err(FetchError::TimedOut(limit)),
		},
	};
	Fetched {
		generation: token.generation(),
		layer,
		result,
	}
}
