//! # MQTT Dynamic Client Registry
//!
//! A registry and lifecycle manager for MQTT client connections created
//! on demand, each identified by a caller-supplied string instead of
//! static configuration.
//!
//! ## Features
//!
//! - **Named connections**: create, look up and tear down broker
//!   connections by identifier at runtime
//! - **Wildcard routing**: inbound messages resolve against the
//!   registered patterns (`+`, `#`) in registration order
//! - **Status tracking**: every connection reports its lifecycle status
//!   and a shared tracker renders an aggregate summary across all of them
//! - **Pluggable transport**: the wire protocol is consumed as a
//!   capability; rumqttc backs the default, tests script their own
//! - **Async/Await**: built on `tokio`, one actor task per connection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use mqtt_dyn_client::{
//!     ConnectionConfig, ConnectionRegistry, NotificationMode,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ConnectionRegistry::new(NotificationMode::Verbose);
//!
//!     // Connections are created on demand under caller-chosen names
//!     let connection = registry.create_client(
//!         "dev1",
//!         ConnectionConfig::new("broker.local")
//!             .with_reconnect(Duration::from_secs(5)),
//!         Arc::new(|notification| println!("{notification:?}")),
//!     );
//!
//!     connection
//!         .subscribe(
//!             "sensors/+/temp",
//!             Arc::new(|message| println!("{message:?}")),
//!         )
//!         .await?;
//!
//!     connection.publish("sensors/42/temp", json!({"v": 21.5})).await?;
//!
//!     // Shutdown closes every connection the registry still tracks
//!     registry.close_clients().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Status notifications
//!
//! Every status transition of every connection re-renders an aggregate
//! summary (`"initiated:1 connected:2 "`) and invokes the callback given
//! at creation. [`NotificationMode`] selects between embedding a full
//! [`list_clients`] snapshot in each event or carrying only the firing
//! connection's old and new status.
//!
//! [`list_clients`]: ConnectionRegistry::list_clients

pub mod config;
pub mod connection;
pub mod error;
pub mod notification;
pub mod payload;
pub mod registry;
pub mod status;
pub mod subscription;
pub mod topic;
pub mod transport;

pub use config::{ConnectionConfig, TlsMaterial};
pub use connection::ClientConnection;
pub use error::{PublishError, PublishRejected, RegistryError};
pub use notification::{
	ClientSnapshot, Notification, NotificationCallback, NotificationMode,
	StatusNotification,
};
pub use payload::{Payload, PublishRequest};
pub use registry::ConnectionRegistry;
pub use status::{Status, StatusTracker};
pub use subscription::{DeliveryCallback, InboundMessage};
pub use transport::{
	Transport, TransportError, TransportEvent, TransportFactory,
	TransportHandle,
};

/// Essential types for most applications.
pub mod prelude {
	pub use crate::{
		ClientConnection, ConnectionConfig, ConnectionRegistry,
		Notification, NotificationMode, Payload, RegistryError, Status,
	};
}
