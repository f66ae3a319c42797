//! TOML configuration.
//!
//! ```toml
//! [backend]
//! program = "hytigre"
//! args = ["--stdio"]
//!
//! [map]
//! debounce_ms = 200
//! fetch_timeout_ms = 30000
//! basemap_url = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png"
//!
//! [log]
//! filter = "info,tigre_map=debug"
//! ```
//!
//! Every section and key is optional.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tigre_map::surface::DEFAULT_BASEMAP_URL;
use tigre_map::{Basemap, RedrawConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: io::Error },

	#[error("failed to parse {path}: {error}")]
	Parse { path: PathBuf, error: toml::de::Error },

	#[error("invalid value for {field}: {reason}")]
	Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub backend: BackendConfig,
	pub map: MapConfig,
	pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
	pub program: String,
	pub args: Vec<String>,
}

impl Default for BackendConfig {
	fn default() -> Self {
		Self {
			program: "hytigre".to_string(),
			args: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
	pub debounce_ms: u64,
	/// Bounds every backend call: geometry fetches, symbology lookups and
	/// typed commands.
	pub fetch_timeout_ms: u64,
	pub basemap_url: String,
}

impl Default for MapConfig {
	fn default() -> Self {
		let redraw = RedrawConfig::default();
		Self {
			debounce_ms: redraw.debounce.as_millis() as u64,
			fetch_timeout_ms: redraw.fetch_timeout.as_millis() as u64,
			basemap_url: DEFAULT_BASEMAP_URL.to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
	/// `EnvFilter` directives; `RUST_LOG` wins when set.
	pub filter: Option<String>,
}

impl Config {
	/// `$XDG_CONFIG_HOME/tigre/config.toml` or the platform equivalent.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("tigre").join("config.toml"))
	}

	/// Loads `explicit` if given, else the default path.
	///
	/// A missing file at the default path yields the defaults; a missing
	/// explicit file is an error.
	pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
		match explicit {
			Some(path) => Self::load(path),
			None => match Self::default_path() {
				Some(path) if path.exists() => Self::load(&path),
				_ => Ok(Self::default()),
			},
		}
	}

	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&text, path)
	}

	/// Parses and validates `text`; `path` is only used in errors.
	pub fn parse(text: &str, path: &Path) -> Result<Self> {
		let config: Self = toml::from_str(text).map_err(|error| ConfigError::Parse {
			path: path.to_path_buf(),
			error,
		})?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if self.backend.program.trim().is_empty() {
			return Err(ConfigError::Invalid {
				field: "backend.program",
				reason: "must not be empty".into(),
			});
		}
		if self.map.fetch_timeout_ms == 0 {
			return Err(ConfigError::Invalid {
				field: "map.fetch_timeout_ms",
				reason: "must be positive".into(),
			});
		}
		Ok(())
	}

	pub fn redraw(&self) -> RedrawConfig {
		RedrawConfig {
			debounce: Duration::from_millis(self.map.debounce_ms),
			fetch_timeout: Duration::from_millis(self.map.fetch_timeout_ms),
		}
	}

	pub fn basemap(&self) -> Basemap {
		Basemap {
			url: self.map.basemap_url.clone(),
		}
	}
}
