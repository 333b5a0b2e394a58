use arcstr::ArcStr;
use thiserror::Error;

use crate::payload::PublishRequest;
use crate::status::Status;

/// Registry-level failures surfaced synchronously to the caller.
#[derive(Error, Debug)]
pub enum RegistryError {
	/// The operation referenced an identifier with no live connection.
	#[error("client '{client_id}' not found")]
	ClientNotFound { client_id: ArcStr },

	/// The connection behind this handle has already shut down.
	#[error("client '{client_id}' connection is closed")]
	ConnectionClosed { client_id: ArcStr },
}

/// Publish failures.
#[derive(Error, Debug)]
pub enum PublishError {
	#[error(transparent)]
	Rejected(#[from] PublishRejected),

	/// The connection shut down while the request was in flight.
	#[error("client '{client_id}' connection is closed")]
	ConnectionClosed { client_id: ArcStr },
}

/// A publish refused because the connection cannot send right now.
///
/// Carries the original request back unmodified so the caller can retry
/// or re-route it once the connection recovers.
#[derive(Error, Debug)]
#[error("client '{client_id}' is not connected (status: {status})")]
pub struct PublishRejected {
	pub client_id: ArcStr,
	pub status: Status,
	pub request: PublishRequest,
}
