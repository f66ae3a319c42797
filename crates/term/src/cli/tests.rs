use clap::Parser;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn defaults_come_from_config() {
	let cli = Cli::parse_from(["tigre"]);
	let mut config = Config::default();
	config.backend.program = "hytigre".into();
	config.backend.args = vec!["--stdio".into()];

	assert!(!cli.verbose);
	assert_eq!(cli.backend_command(&config), ("hytigre".to_string(), vec!["--stdio".to_string()]));
}

#[test]
fn backend_flag_overrides_program_and_args() {
	let cli = Cli::parse_from(["tigre", "-v", "--backend", "./target/debug/hytigre", "--", "--db", "gis"]);
	let mut config = Config::default();
	config.backend.args = vec!["--stdio".into()];

	assert!(cli.verbose);
	assert_eq!(
		cli.backend_command(&config),
		(
			"./target/debug/hytigre".to_string(),
			vec!["--db".to_string(), "gis".to_string()]
		)
	);
}

#[test]
fn trailing_args_alone_keep_the_configured_program() {
	let cli = Cli::parse_from(["tigre", "--config", "/tmp/tigre.toml", "--", "--db", "gis"]);
	let config = Config::default();

	assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/tigre.toml")));
	assert_eq!(cli.backend_command(&config).0, config.backend.program);
	assert_eq!(cli.backend_command(&config).1, vec!["--db".to_string(), "gis".to_string()]);
}
