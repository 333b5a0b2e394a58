//! Transport capability consumed by the registry.
//!
//! The registry does not implement the wire protocol. It consumes a
//! capability: request operations on a live session plus a stream of
//! lifecycle events, with the owning connection as the sole subscriber
//! translating those events into status transitions. The default
//! implementation in [`mqtt`] drives a rumqttc session; tests substitute
//! a scripted one.

use arcstr::ArcStr;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::ConnectionConfig;

pub mod mqtt;

/// Lifecycle and data events reported by a transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
	/// The broker session is established.
	Connected,
	/// A connection fault, with its human-readable detail.
	Error(String),
	/// A reconnect attempt is starting.
	Reconnecting,
	/// The broker ended the session.
	Disconnected,
	/// Network connectivity was lost.
	Offline,
	/// The transport is gone for good; no further events follow.
	Closed,
	/// An inbound message on a concrete topic.
	Message { topic: ArcStr, payload: Bytes },
}

#[derive(Error, Debug, Clone)]
pub enum TransportError {
	#[error("transport request failed: {0}")]
	Request(String),
}

/// Request side of a live transport session.
///
/// All operations are asynchronous; completion or failure of the
/// underlying protocol exchange arrives as a later [`TransportEvent`].
#[async_trait]
pub trait Transport: Send + Sync {
	async fn publish(
		&self,
		topic: &str,
		payload: Bytes,
	) -> Result<(), TransportError>;

	async fn subscribe(&self, pattern: &str) -> Result<(), TransportError>;

	async fn unsubscribe(&self, pattern: &str) -> Result<(), TransportError>;

	async fn close(&self) -> Result<(), TransportError>;
}

/// A freshly opened transport session: request handle plus event stream.
pub struct TransportHandle {
	pub ops: std::sync::Arc<dyn Transport>,
	pub events: mpsc::Receiver<TransportEvent>,
}

/// Builds transport sessions for new connections.
///
/// `open` must not block on the network: session establishment happens in
/// the background and is reported through the event stream.
pub trait TransportFactory: Send + Sync {
	fn open(
		&self,
		client_id: &ArcStr,
		config: &ConnectionConfig,
	) -> TransportHandle;
}
