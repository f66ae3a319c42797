use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failures crossing the backend boundary.
#[derive(Debug, Error)]
pub enum BridgeError {
	/// The backend answered the invocation with an error.
	#[error("backend rejected '{command}': {message}")]
	Rejected { command: &'static str, message: String },
	/// The transport stopped before a response arrived.
	#[error("backend connection closed")]
	Closed,
	/// The backend did not answer within the call bound.
	#[error("backend did not answer '{command}' within {after:?}")]
	TimedOut { command: &'static str, after: Duration },
	/// The backend sent something outside the wire contract.
	#[error("protocol error: {0}")]
	Protocol(String),
	/// A response could not be decoded into the expected shape.
	#[error("decode failed: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("{0}")]
	Io(#[from] io::Error),
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
