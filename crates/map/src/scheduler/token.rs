use tokio_util::sync::CancellationToken;

/// Monotonic redraw pass counter. The first pass is generation 1.
#[derive(Debug, Default)]
pub(crate) struct GenerationClock {
	last: u64,
}

impl GenerationClock {
	pub fn next(&mut self) -> u64 {
		self.last = self.last.wrapping_add(1);
		self.last
	}
}

/// Generation-scoped cancellation token for one redraw pass.
#[derive(Debug, Clone)]
pub(crate) struct GenerationToken {
	generation: u64,
	cancel: CancellationToken,
}

impl GenerationToken {
	pub fn new(generation: u64, cancel: CancellationToken) -> Self {
		Self { generation, cancel }
	}

	pub const fn generation(&self) -> u64 {
		self.generation
	}

	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Creates a child token in the same generation, for one fetch.
	pub fn child(&self) -> Self {
		Self {
			generation: self.generation,
			cancel: self.cancel.child_token(),
		}
	}
}
