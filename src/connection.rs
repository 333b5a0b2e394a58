//! One managed broker connection and the actor task that drives it.

use std::sync::{Arc, Weak};

use arcstr::ArcStr;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::ConnectionConfig;
use crate::error::{PublishError, PublishRejected, RegistryError};
use crate::notification::{
	Notification, NotificationCallback, NotificationMode, StatusNotification,
};
use crate::payload::{Payload, PublishRequest};
use crate::registry::RegistryInner;
use crate::status::Status;
use crate::subscription::{
	DeliveryCallback, InboundMessage, SubscriptionTable,
};
use crate::transport::{Transport, TransportEvent, TransportHandle};

const COMMAND_CAPACITY: usize = 32;

pub(crate) enum Command {
	Subscribe {
		pattern: ArcStr,
		callback: DeliveryCallback,
		done: oneshot::Sender<()>,
	},
	Unsubscribe {
		pattern: ArcStr,
		done: oneshot::Sender<()>,
	},
	Publish {
		request: PublishRequest,
		done: oneshot::Sender<Result<(), PublishRejected>>,
	},
	Close {
		done: oneshot::Sender<()>,
	},
}

/// Handle to one managed broker connection.
///
/// Cheap to clone; all clones address the same connection. Operations are
/// serialized onto the connection's actor task together with transport
/// events, so no two handlers for the same connection ever run
/// concurrently.
#[derive(Clone)]
pub struct ClientConnection {
	state: Arc<ConnectionState>,
	command_tx: mpsc::Sender<Command>,
}

pub(crate) struct ConnectionState {
	client_id: ArcStr,
	config: ConnectionConfig,
	// None only between construction and the first transition.
	status: Mutex<Option<Status>>,
	subscriptions: Mutex<SubscriptionTable>,
	callback: NotificationCallback,
	registry: Weak<RegistryInner>,
}

impl ClientConnection {
	pub(crate) fn new(
		client_id: ArcStr,
		config: ConnectionConfig,
		callback: NotificationCallback,
		registry: Weak<RegistryInner>,
	) -> (Self, mpsc::Receiver<Command>) {
		let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
		let state = Arc::new(ConnectionState {
			client_id,
			config,
			status: Mutex::new(None),
			subscriptions: Mutex::new(SubscriptionTable::new()),
			callback,
			registry,
		});
		(Self { state, command_tx }, command_rx)
	}

	/// Fires the entry transition, before any network activity.
	pub(crate) fn announce_initiated(&self) {
		self.state.change_status(Status::Initiated);
	}

	/// Hands the transport session to the actor task and starts it.
	pub(crate) fn start(
		&self,
		transport: TransportHandle,
		commands: mpsc::Receiver<Command>,
	) {
		let actor = ConnectionActor {
			state: Arc::clone(&self.state),
			transport: transport.ops,
			events: transport.events,
			commands,
		};
		tokio::spawn(actor.run());
	}

	pub fn client_id(&self) -> &ArcStr {
		&self.state.client_id
	}

	pub fn config(&self) -> &ConnectionConfig {
		&self.state.config
	}

	pub fn status(&self) -> Status {
		(*self.state.status.lock()).unwrap_or(Status::Initiated)
	}

	/// Currently registered subscription patterns, in registration order.
	pub fn subscriptions(&self) -> Vec<ArcStr> {
		self.state.subscriptions.lock().patterns()
	}

	/// Registers a subscription pattern with its delivery callback.
	///
	/// The first registration of a pattern wins; a repeat is silently
	/// ignored. The pattern is recorded locally only once the broker
	/// confirms the subscription; a broker rejection is logged and leaves
	/// no local trace. Resolves once the attempt has been processed.
	pub async fn subscribe(
		&self,
		pattern: impl Into<ArcStr>,
		callback: DeliveryCallback,
	) -> Result<(), RegistryError> {
		let (done_tx, done_rx) = oneshot::channel();
		let command = Command::Subscribe {
			pattern: pattern.into(),
			callback,
			done: done_tx,
		};
		self.send_command(command, done_rx).await
	}

	/// Drops a subscription pattern.
	///
	/// The local removal is immediate and authoritative; the broker-side
	/// unsubscribe is best effort and a failure there is only logged.
	/// Unknown patterns are a no-op.
	pub async fn unsubscribe(
		&self,
		pattern: impl Into<ArcStr>,
	) -> Result<(), RegistryError> {
		let (done_tx, done_rx) = oneshot::channel();
		let command = Command::Unsubscribe {
			pattern: pattern.into(),
			done: done_tx,
		};
		self.send_command(command, done_rx).await
	}

	/// Publishes fire-and-forget, only while the connection is
	/// `connected`.
	///
	/// In any other status the request is handed back unmodified inside
	/// the error so the caller can retry or re-route it. No delivery
	/// acknowledgment is awaited; a transport-level send failure is only
	/// logged.
	pub async fn publish(
		&self,
		topic: impl Into<ArcStr>,
		payload: impl Into<Payload>,
	) -> Result<(), PublishError> {
		let request = PublishRequest::new(topic, payload);

		// Cheap pre-check; the actor re-checks authoritatively.
		let status = self.status();
		if status != Status::Connected {
			return Err(PublishError::Rejected(PublishRejected {
				client_id: self.state.client_id.clone(),
				status,
				request,
			}));
		}

		let (done_tx, done_rx) = oneshot::channel();
		let command = Command::Publish {
			request,
			done: done_tx,
		};
		match self.command_tx.send(command).await {
			| Ok(()) => match done_rx.await {
				| Ok(result) => result.map_err(PublishError::from),
				| Err(_) => Err(PublishError::ConnectionClosed {
					client_id: self.state.client_id.clone(),
				}),
			},
			| Err(mpsc::error::SendError(command)) => match command {
				| Command::Publish { request, .. } => {
					Err(PublishError::Rejected(PublishRejected {
						client_id: self.state.client_id.clone(),
						status: Status::Closed,
						request,
					}))
				}
				| _ => Err(PublishError::ConnectionClosed {
					client_id: self.state.client_id.clone(),
				}),
			},
		}
	}

	/// Terminates the transport, clears the subscription table and
	/// removes the connection from the registry. Safe to call twice; the
	/// second call is a no-op.
	pub async fn close(&self) {
		let (done_tx, done_rx) = oneshot::channel();
		if self
			.command_tx
			.send(Command::Close { done: done_tx })
			.await
			.is_err()
		{
			debug!(
				client_id = %self.state.client_id,
				"close on already closed connection"
			);
			return;
		}
		let _ = done_rx.await;
	}

	async fn send_command(
		&self,
		command: Command,
		done: oneshot::Receiver<()>,
	) -> Result<(), RegistryError> {
		let closed = || RegistryError::ConnectionClosed {
			client_id: self.state.client_id.clone(),
		};
		self.command_tx
			.send(command)
			.await
			.map_err(|_| closed())?;
		done.await.map_err(|_| closed())
	}
}

impl std::fmt::Debug for ClientConnection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientConnection")
			.field("client_id", &self.state.client_id)
			.field("status", &self.status())
			.finish_non_exhaustive()
	}
}

impl ConnectionState {
	/// Shared transition algorithm: update the counters, set the status,
	/// notify the caller.
	///
	/// `Closed` is terminal; once there, later transition attempts are
	/// dropped. `Closed` is also never counted, so the summary only ever
	/// reflects live connections.
	pub(crate) fn change_status(&self, next: Status) {
		let previous = {
			let mut status = self.status.lock();
			if *status == Some(Status::Closed) {
				return;
			}
			status.replace(next)
		};
		debug!(
			client_id = %self.client_id,
			previous = ?previous,
			next = %next,
			"status change"
		);

		let Some(registry) = self.registry.upgrade() else {
			warn!(
				client_id = %self.client_id,
				"registry gone, dropping status notification"
			);
			return;
		};
		let summary = registry.tracker().apply(previous, next);
		let clients = match registry.mode() {
			| NotificationMode::Verbose => Some(registry.snapshot()),
			| NotificationMode::Minimal => None,
		};
		(self.callback)(Notification::Status(StatusNotification {
			client_id: self.client_id.clone(),
			previous,
			current: next,
			summary,
			clients,
		}));
	}

	/// Re-announces the current status, e.g. after the subscription list
	/// changed, so snapshots embedded in notifications stay current.
	fn reannounce(&self) {
		let current = *self.status.lock();
		if let Some(current) = current {
			self.change_status(current);
		}
	}
}

struct ConnectionActor {
	state: Arc<ConnectionState>,
	transport: Arc<dyn Transport>,
	events: mpsc::Receiver<TransportEvent>,
	commands: mpsc::Receiver<Command>,
}

impl ConnectionActor {
	async fn run(mut self) {
		loop {
			tokio::select! {
				Some(command) = self.commands.recv() => {
					if self.handle_command(command).await {
						break;
					}
				}
				event = self.events.recv() => match event {
					| Some(event) => {
						if self.handle_event(event).await {
							break;
						}
					}
					| None => {
						warn!(
							client_id = %self.state.client_id,
							"transport event stream ended unexpectedly"
						);
						self.teardown().await;
						break;
					}
				},
			}
		}
		debug!(
			client_id = %self.state.client_id,
			"connection actor stopped"
		);
	}

	/// Returns `true` when the actor should stop.
	async fn handle_command(&mut self, command: Command) -> bool {
		match command {
			| Command::Subscribe {
				pattern,
				callback,
				done,
			} => {
				self.handle_subscribe(pattern, callback).await;
				let _ = done.send(());
				false
			}
			| Command::Unsubscribe { pattern, done } => {
				self.handle_unsubscribe(&pattern).await;
				let _ = done.send(());
				false
			}
			| Command::Publish { request, done } => {
				let result = self.handle_publish(request).await;
				let _ = done.send(result);
				false
			}
			| Command::Close { done } => {
				self.handle_close().await;
				let _ = done.send(());
				true
			}
		}
	}

	/// Returns `true` when the actor should stop.
	async fn handle_event(&mut self, event: TransportEvent) -> bool {
		match event {
			| TransportEvent::Connected => {
				self.state.change_status(Status::Connected);
				false
			}
			| TransportEvent::Error(detail) => {
				self.state.change_status(Status::Error);
				error!(
					client_id = %self.state.client_id,
					error = %detail,
					"error on mqtt connection"
				);
				(self.state.callback)(Notification::TransportError {
					client_id: self.state.client_id.clone(),
					detail,
				});
				false
			}
			| TransportEvent::Reconnecting => {
				self.state.change_status(Status::Reconnecting);
				false
			}
			| TransportEvent::Disconnected => {
				self.state.change_status(Status::Disconnected);
				false
			}
			| TransportEvent::Offline => {
				self.state.change_status(Status::Offline);
				false
			}
			| TransportEvent::Closed => {
				self.handle_transport_closed().await;
				true
			}
			| TransportEvent::Message { topic, payload } => {
				self.handle_message(topic, payload);
				false
			}
		}
	}

	async fn handle_subscribe(
		&self,
		pattern: ArcStr,
		callback: DeliveryCallback,
	) {
		if self.state.subscriptions.lock().contains(&pattern) {
			debug!(
				client_id = %self.state.client_id,
				pattern = %pattern,
				"already subscribed"
			);
			return;
		}
		match self.transport.subscribe(&pattern).await {
			| Ok(()) => {
				info!(
					client_id = %self.state.client_id,
					pattern = %pattern,
					"subscribed"
				);
				self.state
					.subscriptions
					.lock()
					.insert(pattern, callback);
				self.state.reannounce();
			}
			| Err(err) => {
				error!(
					client_id = %self.state.client_id,
					pattern = %pattern,
					error = %err,
					"subscribe failed"
				);
			}
		}
	}

	async fn handle_unsubscribe(&self, pattern: &str) {
		// Local removal first: authoritative here, best effort at the
		// broker.
		if !self.state.subscriptions.lock().remove(pattern) {
			debug!(
				client_id = %self.state.client_id,
				pattern = %pattern,
				"not subscribed"
			);
			return;
		}
		info!(
			client_id = %self.state.client_id,
			pattern = %pattern,
			"removing subscription"
		);
		if let Err(err) = self.transport.unsubscribe(pattern).await {
			error!(
				client_id = %self.state.client_id,
				pattern = %pattern,
				error = %err,
				"unsubscribe failed"
			);
		}
		self.state.reannounce();
	}

	async fn handle_publish(
		&self,
		request: PublishRequest,
	) -> Result<(), PublishRejected> {
		let status = (*self.state.status.lock())
			.unwrap_or(Status::Initiated);
		if status != Status::Connected {
			return Err(PublishRejected {
				client_id: self.state.client_id.clone(),
				status,
				request,
			});
		}
		let payload = request.payload.to_bytes();
		debug!(
			client_id = %self.state.client_id,
			topic = %request.topic,
			payload_size = payload.len(),
			"publishing"
		);
		if let Err(err) =
			self.transport.publish(&request.topic, payload).await
		{
			error!(
				client_id = %self.state.client_id,
				topic = %request.topic,
				error = %err,
				"publish failed"
			);
		}
		Ok(())
	}

	fn handle_message(&self, topic: ArcStr, payload: Bytes) {
		let callback = {
			let subscriptions = self.state.subscriptions.lock();
			subscriptions
				.resolve(&topic)
				.map(|entry| entry.callback())
		};
		match callback {
			| Some(callback) => callback(InboundMessage {
				client_id: self.state.client_id.clone(),
				topic,
				payload,
			}),
			| None => {
				error!(
					client_id = %self.state.client_id,
					topic = %topic,
					"received message without matching subscription"
				);
			}
		}
	}

	/// Caller-initiated close.
	async fn handle_close(&mut self) {
		if let Err(err) = self.transport.close().await {
			debug!(
				client_id = %self.state.client_id,
				error = %err,
				"transport close reported an error"
			);
		}
		self.state.subscriptions.lock().clear();
		self.remove_from_registry();
		self.state.change_status(Status::Closed);
		self.drain_commands();
	}

	/// Transport-initiated close, e.g. connection loss with reconnect
	/// disabled. Drives every held pattern through the normal
	/// unsubscribe path before finalizing.
	async fn handle_transport_closed(&mut self) {
		let patterns = self.state.subscriptions.lock().patterns();
		for pattern in patterns {
			self.handle_unsubscribe(&pattern).await;
		}
		self.remove_from_registry();
		self.state.change_status(Status::Closed);
		self.drain_commands();
	}

	async fn teardown(&mut self) {
		self.state.subscriptions.lock().clear();
		self.remove_from_registry();
		self.state.change_status(Status::Closed);
		self.drain_commands();
	}

	fn remove_from_registry(&self) {
		if let Some(registry) = self.state.registry.upgrade() {
			registry.remove(&self.state.client_id);
		}
	}

	/// Rejects whatever was still queued behind the close, handing
	/// publish requests back to their callers.
	fn drain_commands(&mut self) {
		self.commands.close();
		while let Ok(command) = self.commands.try_recv() {
			match command {
				| Command::Publish { request, done } => {
					let _ = done.send(Err(PublishRejected {
						client_id: self.state.client_id.clone(),
						status: Status::Closed,
						request,
					}));
				}
				| Command::Close { done } => {
					let _ = done.send(());
				}
				// Dropping the ack reports the closed connection.
				| Command::Subscribe { .. }
				| Command::Unsubscribe { .. } => {}
			}
		}
	}
}
