//! Per-connection configuration.

use std::time::Duration;

/// Configuration of one managed broker connection.
///
/// Immutable once the connection is created: changing any of it means
/// closing the connection and recreating it under the same identifier.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
	/// Broker address, either `host` or `host:port` (default port 1883).
	pub host: String,
	/// Client certificate material; when present the transport connects
	/// over TLS instead of plaintext.
	pub tls: Option<TlsMaterial>,
	/// Automatic reconnect cadence. Zero disables reconnecting: the
	/// connection closes after the first connection loss.
	pub reconnect: Duration,
}

impl ConnectionConfig {
	pub fn new(host: impl Into<String>) -> Self {
		Self {
			host: host.into(),
			tls: None,
			reconnect: Duration::ZERO,
		}
	}

	pub fn with_tls(mut self, tls: TlsMaterial) -> Self {
		self.tls = Some(tls);
		self
	}

	pub fn with_reconnect(mut self, interval: Duration) -> Self {
		self.reconnect = interval;
		self
	}

	/// Splits the configured address into host and port. A trailing
	/// `:port` that does not parse is treated as part of the host.
	pub fn host_port(&self) -> (&str, u16) {
		match self.host.rsplit_once(':') {
			| Some((host, port)) => match port.parse() {
				| Ok(port) => (host, port),
				| Err(_) => (self.host.as_str(), 1883),
			},
			| None => (self.host.as_str(), 1883),
		}
	}
}

/// Byte contents of the TLS credential files.
///
/// Resolving credential *paths* to bytes is the host environment's job;
/// this core only consumes the material.
#[derive(Clone)]
pub struct TlsMaterial {
	pub key: Vec<u8>,
	pub cert: Vec<u8>,
	pub ca: Vec<u8>,
}

impl std::fmt::Debug for TlsMaterial {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TlsMaterial")
			.field("key", &format_args!("[{} bytes]", self.key.len()))
			.field("cert", &format_args!("[{} bytes]", self.cert.len()))
			.field("ca", &format_args!("[{} bytes]", self.ca.len()))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn host_port_defaults_to_1883() {
		assert_eq!(
			ConnectionConfig::new("broker.local").host_port(),
			("broker.local", 1883)
		);
	}

	#[test]
	fn host_port_splits_explicit_port() {
		assert_eq!(
			ConnectionConfig::new("broker.local:8883").host_port(),
			("broker.local", 8883)
		);
	}

	#[test]
	fn unparseable_port_stays_in_host() {
		assert_eq!(
			ConnectionConfig::new("broker:local").host_port(),
			("broker:local", 1883)
		);
	}
}
