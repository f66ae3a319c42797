use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `configured`, which wins over the built-in default.
/// With `TIGRE_LOG_DIR` set, logs go to `tigre.<pid>.log` in that directory;
/// otherwise to stderr, since stdout carries the REPL.
pub fn setup_tracing(verbose: bool, configured: Option<&str>) {
	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| match configured {
			Some(directives) => EnvFilter::new(directives),
			None if verbose => EnvFilter::new("debug,tigre_map=trace,tigre_bridge=trace"),
			None => EnvFilter::new("warn,tigre_term=info"),
		})
	};

	if let Some(log_dir) = std::env::var("TIGRE_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("tigre.{}.log", std::process::id()));
		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);
			tracing_subscriber::registry().with(filter()).with(file_layer).init();
			tracing::info!(path = ?log_path, "term.tracing.file");
			return;
		}
	}

	tracing_subscriber::registry()
		.with(filter())
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}
