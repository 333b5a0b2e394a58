//! rumqttc-backed transport.

use std::sync::Arc;
use std::time::Duration;

use arcstr::ArcStr;
use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::{
	AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
	TlsConfiguration, Transport as WireTransport,
};
use tokio::sync::mpsc::{self, Sender};
use tokio::time;
use tracing::debug;

use super::{Transport, TransportError, TransportEvent, TransportFactory};
use crate::config::ConnectionConfig;

/// Tuning knobs of the rumqttc transport.
#[derive(Debug, Clone)]
pub struct MqttSettings {
	pub keep_alive: Duration,
	/// Request capacity handed to the rumqttc event loop.
	pub request_capacity: usize,
	/// Capacity of the lifecycle event channel toward the connection.
	pub event_capacity: usize,
	pub subscribe_qos: QoS,
}

impl Default for MqttSettings {
	fn default() -> Self {
		Self {
			keep_alive: Duration::from_secs(10),
			request_capacity: 10,
			event_capacity: 100,
			subscribe_qos: QoS::AtLeastOnce,
		}
	}
}

/// Opens rumqttc sessions, plaintext or TLS depending on the config.
#[derive(Debug, Clone, Default)]
pub struct MqttTransportFactory {
	pub settings: MqttSettings,
}

impl TransportFactory for MqttTransportFactory {
	fn open(
		&self,
		client_id: &ArcStr,
		config: &ConnectionConfig,
	) -> super::TransportHandle {
		let (host, port) = config.host_port();
		let mut options = MqttOptions::new(client_id.as_str(), host, port);
		options.set_keep_alive(self.settings.keep_alive);
		if let Some(tls) = &config.tls {
			options.set_transport(WireTransport::Tls(
				TlsConfiguration::Simple {
					ca: tls.ca.clone(),
					alpn: None,
					client_auth: Some((tls.cert.clone(), tls.key.clone())),
				},
			));
		}

		let (client, event_loop) =
			AsyncClient::new(options, self.settings.request_capacity);
		let (event_tx, event_rx) =
			mpsc::channel(self.settings.event_capacity);
		tokio::spawn(drive(event_loop, event_tx, config.reconnect));

		super::TransportHandle {
			ops: Arc::new(MqttTransport {
				client,
				subscribe_qos: self.settings.subscribe_qos,
			}),
			events: event_rx,
		}
	}
}

struct MqttTransport {
	client: AsyncClient,
	subscribe_qos: QoS,
}

#[async_trait]
impl Transport for MqttTransport {
	async fn publish(
		&self,
		topic: &str,
		payload: Bytes,
	) -> Result<(), TransportError> {
		// Fire-and-forget: QoS 0, no delivery acknowledgment awaited.
		self.client
			.publish(topic, QoS::AtMostOnce, false, payload.to_vec())
			.await
			.map_err(|err| TransportError::Request(err.to_string()))
	}

	async fn subscribe(&self, pattern: &str) -> Result<(), TransportError> {
		self.client
			.subscribe(pattern, self.subscribe_qos)
			.await
			.map_err(|err| TransportError::Request(err.to_string()))
	}

	async fn unsubscribe(
		&self,
		pattern: &str,
	) -> Result<(), TransportError> {
		self.client
			.unsubscribe(pattern)
			.await
			.map_err(|err| TransportError::Request(err.to_string()))
	}

	async fn close(&self) -> Result<(), TransportError> {
		self.client
			.disconnect()
			.await
			.map_err(|err| TransportError::Request(err.to_string()))
	}
}

/// Polls the rumqttc event loop and translates its notifications into
/// [`TransportEvent`]s until the session or its consumer goes away.
///
/// Reconnect pacing lives here: a poll error pauses for the configured
/// interval before the next attempt, and a zero interval turns the first
/// connection loss into a terminal `Closed`.
async fn drive(
	mut event_loop: EventLoop,
	events: Sender<TransportEvent>,
	reconnect: Duration,
) {
	let mut was_connected = false;
	loop {
		match event_loop.poll().await {
			| Ok(Event::Incoming(Packet::ConnAck(_))) => {
				was_connected = true;
				if !emit(&events, TransportEvent::Connected).await {
					break;
				}
			}
			| Ok(Event::Incoming(Packet::Publish(publish))) => {
				let event = TransportEvent::Message {
					topic: ArcStr::from(publish.topic),
					payload: publish.payload,
				};
				if !emit(&events, event).await {
					break;
				}
			}
			| Ok(Event::Incoming(Packet::Disconnect)) => {
				if !emit(&events, TransportEvent::Disconnected).await {
					break;
				}
			}
			| Ok(Event::Outgoing(Outgoing::Disconnect)) => {
				let _ = emit(&events, TransportEvent::Closed).await;
				break;
			}
			| Ok(notification) => {
				debug!(notification = ?notification, "mqtt notification");
			}
			| Err(err) => {
				if !emit(&events, TransportEvent::Error(err.to_string()))
					.await
				{
					break;
				}
				if was_connected {
					was_connected = false;
					if !emit(&events, TransportEvent::Offline).await {
						break;
					}
				}
				if reconnect.is_zero() {
					let _ = emit(&events, TransportEvent::Closed).await;
					break;
				}
				time::sleep(reconnect).await;
				if !emit(&events, TransportEvent::Reconnecting).await {
					break;
				}
			}
		}
	}
	debug!("mqtt transport driver stopped");
}

/// Returns `false` when the consuming connection is gone.
async fn emit(
	events: &Sender<TransportEvent>,
	event: TransportEvent,
) -> bool {
	events.send(event).await.is_ok()
}
