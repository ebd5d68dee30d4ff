use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	/// A bounded wait exhausted its attempts. Recoverable: the feature is
	/// skipped for this cycle and retried on the next tick.
	#[error("timed out waiting for {what}")]
	Timeout { what: String },

	#[error("invalid url: {url}")]
	InvalidUrl { url: String },

	/// A signal was read or written after `dispose`.
	#[error("signal used after dispose")]
	SignalDisposed,

	/// The background side of the message channel is not connected.
	#[error("no message receiver connected")]
	NoReceiver,

	#[error("unexpected response to {request}")]
	UnexpectedResponse { request: &'static str },

	#[error("allow-list serialization failed: {0}")]
	Serialize(#[from] serde_json::Error),
}
