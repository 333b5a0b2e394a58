//! Process-wide registry of named client connections.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arcstr::ArcStr;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::connection::ClientConnection;
use crate::error::RegistryError;
use crate::notification::{
	ClientSnapshot, NotificationCallback, NotificationMode,
};
use crate::status::StatusTracker;
use crate::transport::mqtt::MqttTransportFactory;
use crate::transport::TransportFactory;

/// Dynamic registry and lifecycle manager for named broker connections.
///
/// The registry is the sole owner of connection lifetimes: connections
/// are created, looked up and torn down exclusively through it, keyed by
/// a caller-chosen identifier. Cheap to clone; all clones share one
/// table.
///
/// Construct it once at process start and pass it to every call site —
/// there is deliberately no global instance.
#[derive(Clone)]
pub struct ConnectionRegistry {
	inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
	clients: Mutex<HashMap<ArcStr, ClientConnection>>,
	tracker: StatusTracker,
	mode: NotificationMode,
	factory: Arc<dyn TransportFactory>,
}

impl ConnectionRegistry {
	/// A registry backed by the rumqttc transport.
	pub fn new(mode: NotificationMode) -> Self {
		Self::with_transport(
			Arc::new(MqttTransportFactory::default()),
			mode,
		)
	}

	/// A registry with a custom transport factory.
	pub fn with_transport(
		factory: Arc<dyn TransportFactory>,
		mode: NotificationMode,
	) -> Self {
		Self {
			inner: Arc::new(RegistryInner {
				clients: Mutex::new(HashMap::new()),
				tracker: StatusTracker::new(),
				mode,
				factory,
			}),
		}
	}

	/// Creates a connection under `client_id`, or returns the existing
	/// one.
	///
	/// Idempotent: an identifier that is already registered gets its
	/// existing connection back unchanged — no reconnect, no
	/// reconfiguration. Registration is atomic, so two racing callers
	/// with the same identifier end up sharing one connection and only
	/// one transport session is ever opened.
	///
	/// A new connection announces `initiated` synchronously before its
	/// transport session starts; every later transition arrives through
	/// `callback`.
	pub fn create_client(
		&self,
		client_id: impl Into<ArcStr>,
		config: ConnectionConfig,
		callback: NotificationCallback,
	) -> ClientConnection {
		let client_id = client_id.into();
		let (connection, command_rx) = {
			let mut clients = self.inner.clients.lock();
			if let Some(existing) = clients.get(&client_id) {
				info!(client_id = %client_id, "client already known");
				// TODO: check health of the existing connection and
				// recreate it when degraded
				return existing.clone();
			}
			info!(client_id = %client_id, "creating new client");
			let (connection, command_rx) = ClientConnection::new(
				client_id.clone(),
				config,
				callback,
				Arc::downgrade(&self.inner),
			);
			clients.insert(client_id.clone(), connection.clone());
			(connection, command_rx)
		};

		connection.announce_initiated();
		let transport =
			self.inner.factory.open(&client_id, connection.config());
		connection.start(transport, command_rx);
		connection
	}

	/// Pure lookup, no side effects.
	pub fn get_client(&self, client_id: &str) -> Option<ClientConnection> {
		self.inner.clients.lock().get(client_id).cloned()
	}

	/// Lookup that surfaces absence as an error, for call sites that must
	/// report it to their caller.
	pub fn require_client(
		&self,
		client_id: &str,
	) -> Result<ClientConnection, RegistryError> {
		self.get_client(client_id)
			.ok_or_else(|| RegistryError::ClientNotFound {
				client_id: ArcStr::from(client_id),
			})
	}

	/// Snapshot of every registered connection with its status and
	/// subscription patterns.
	pub fn list_clients(&self) -> BTreeMap<ArcStr, ClientSnapshot> {
		self.inner.snapshot()
	}

	/// The aggregate per-status summary, re-rendered on demand.
	pub fn status_summary(&self) -> String {
		self.inner.tracker.summary()
	}

	/// Closes every tracked connection and clears the table. Used on
	/// shutdown of the host environment.
	pub async fn close_clients(&self) {
		let connections: Vec<ClientConnection> =
			self.inner.clients.lock().values().cloned().collect();
		for connection in connections {
			connection.close().await;
		}
		self.inner.clients.lock().clear();
	}
}

impl RegistryInner {
	pub(crate) fn tracker(&self) -> &StatusTracker {
		&self.tracker
	}

	pub(crate) fn mode(&self) -> NotificationMode {
		self.mode
	}

	pub(crate) fn snapshot(&self) -> BTreeMap<ArcStr, ClientSnapshot> {
		let connections: Vec<ClientConnection> =
			self.clients.lock().values().cloned().collect();
		connections
			.into_iter()
			.map(|connection| {
				(
					connection.client_id().clone(),
					ClientSnapshot {
						status: connection.status(),
						subscriptions: connection.subscriptions(),
					},
				)
			})
			.collect()
	}

	pub(crate) fn remove(&self, client_id: &str) {
		if self.clients.lock().remove(client_id).is_some() {
			debug!(client_id = %client_id, "removed from registry");
		}
	}
}

impl Drop for RegistryInner {
	fn drop(&mut self) {
		let live = self.clients.lock().len();
		if live > 0 {
			warn!(
				live_connections = live,
				"registry dropped with live connections; call \
				 close_clients() before dropping"
			);
		}
	}
}
