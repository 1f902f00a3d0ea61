use thiserror::Error;

/// Failure of a graph fetch or a search recording.
#[derive(Error, Debug)]
pub enum FetchError {
	/// The request could not be sent or the body could not be read.
	#[error("transport error: {0}")]
	Transport(#[from] reqwest::Error),

	/// The API answered with a non-success status.
	#[error("graph API returned HTTP {status} for {url}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Requested URL.
		url: String,
	},

	/// The body was not a graph payload.
	#[error("invalid graph payload: {0}")]
	Decode(#[from] serde_json::Error),

	/// The request was dropped before it produced a response.
	#[error("fetch cancelled")]
	Cancelled,
}

/// Result alias for collaborator calls.
pub type FetchResult<T> = Result<T, FetchError>;
