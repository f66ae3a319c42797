//! CLI schema for the tigre binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "tigre")]
#[command(about = "Headless client for the TIGRE geospatial REPL")]
#[command(version)]
pub struct Cli {
	/// Configuration file (defaults to $XDG_CONFIG_HOME/tigre/config.toml)
	#[arg(long, short = 'c', value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Backend program to spawn, overriding `[backend] program`
	#[arg(long, short = 'b', value_name = "PROGRAM")]
	pub backend: Option<String>,

	/// Verbose logging
	#[arg(long, short = 'v')]
	pub verbose: bool,

	/// Arguments for the backend program, after `--`
	#[arg(last = true, value_name = "ARGS")]
	pub backend_args: Vec<String>,
}

impl Cli {
	/// Backend program and arguments, with flags taking precedence over `config`.
	///
	/// Arguments from the configuration are only used when the program comes
	/// from the configuration too.
	pub fn backend_command(&self, config: &Config) -> (String, Vec<String>) {
		match &self.backend {
			Some(program) => (program.clone(), self.backend_args.clone()),
			None if !self.backend_args.is_empty() => (config.backend.program.clone(), self.backend_args.clone()),
			None => (config.backend.program.clone(), config.backend.args.clone()),
		}
	}
}

#[cfg(test)]
mod tests;
