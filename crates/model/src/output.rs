use serde::{Deserialize, Serialize};

use crate::layer::VectorLayer;

/// Result of evaluating one REPL command.
///
/// A command failed, for display purposes, exactly when `errors` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
	#[serde(default)]
	pub errors: Vec<String>,
	#[serde(default)]
	pub results: OutputResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputResults {
	Messages(Vec<String>),
	Layers(Vec<VectorLayer>),
}

impl Default for OutputResults {
	fn default() -> Self {
		Self::Messages(Vec::new())
	}
}

impl Output {
	pub fn message(text: impl Into<String>) -> Self {
		Self {
			errors: Vec::new(),
			results: OutputResults::Messages(vec![text.into()]),
		}
	}

	pub fn error(text: impl Into<String>) -> Self {
		Self {
			errors: vec![text.into()],
			results: OutputResults::default(),
		}
	}

	pub fn is_error(&self) -> bool {
		!self.errors.is_empty()
	}

	/// Returns the human-readable lines of `results`.
	pub fn result_lines(&self) -> Vec<String> {
		match &self.results {
			OutputResults::Messages(lines) => lines.clone(),
			OutputResults::Layers(layers) => layers.iter().map(|l| format!("{}.{}", l.schema, l.name)).collect(),
		}
	}

	/// One-line summary: errors when failed, results otherwise, joined by ` → `.
	pub fn summary(&self) -> String {
		if self.is_error() {
			self.errors.join(" → ")
		} else {
			self.result_lines().join(" → ")
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn decodes_message_results() {
		let output: Output = serde_json::from_str(r#"{ "errors": [], "results": ["Done.", "Connected"] }"#).unwrap();
		assert!(!output.is_error());
		assert_eq!(output.summary(), "Done. → Connected");
	}

	#[test]
	fn decodes_layer_results() {
		let output: Output =
			serde_json::from_str(r#"{ "errors": [], "results": [{"schema": "public", "name": "parcels", "visible": true}] }"#)
				.unwrap();
		assert_eq!(output.result_lines(), vec!["public.parcels".to_string()]);
	}

	#[test]
	fn errors_win_summary() {
		let output: Output =
			serde_json::from_str(r#"{ "errors": ["ERROR! Unknown command.", "again"], "results": ["ignored"] }"#).unwrap();
		assert!(output.is_error());
		assert_eq!(output.summary(), "ERROR! Unknown command. → again");
	}
}
