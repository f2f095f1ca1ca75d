//! Errors surfaced to the host.
//!
//! Data-quality problems (dangling edges, missing node metadata, empty graphs)
//! are recovered locally and never show up here. Only failures the host has to
//! act on are represented: no browser window, no drawing surface, or a payload
//! that is not JSON at all.

use thiserror::Error;

/// Fatal errors returned across the crate's public boundary.
#[derive(Error, Debug)]
pub enum GraphError {
	#[error("browser window is unavailable")]
	WindowUnavailable,

	#[error("drawing surface is unavailable: {0}")]
	SurfaceUnavailable(String),

	#[error("graph payload is not valid JSON: {source}")]
	Payload {
		#[from]
		source: serde_json::Error,
	},
}

pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn json_error_conversion() {
		let err = serde_json::from_str::<serde_json::Value>("{nodes").unwrap_err();
		let graph_err: GraphError = err.into();
		assert!(matches!(graph_err, GraphError::Payload { .. }));
		assert!(graph_err.to_string().starts_with("graph payload is not valid JSON"));
	}

	#[test]
	fn display_formatting() {
		let err = GraphError::SurfaceUnavailable("2d context missing".into());
		assert_eq!(
			err.to_string(),
			"drawing surface is unavailable: 2d context missing"
		);
		assert_eq!(
			GraphError::WindowUnavailable.to_string(),
			"browser window is unavailable"
		);
	}
}
