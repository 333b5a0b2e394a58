use std::sync::Arc;
use std::time::Duration;

use mqtt_dyn_client::{
	ConnectionConfig, ConnectionRegistry, Notification, NotificationMode,
};
use serde_json::json;
use tokio::time;

/// Small demo against a public broker: create a named connection,
/// subscribe with a wildcard, publish into it, watch the status stream.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let registry = ConnectionRegistry::new(NotificationMode::Verbose);

	let connection = registry.create_client(
		"dyn-demo",
		ConnectionConfig::new("broker.mqtt.cool:1883")
			.with_reconnect(Duration::from_secs(5)),
		Arc::new(|notification| match notification {
			| Notification::Status(status) => {
				println!(
					"[{}] {:?} -> {} | {}",
					status.client_id,
					status.previous,
					status.current,
					status.summary
				);
			}
			| Notification::TransportError { client_id, detail } => {
				eprintln!("[{client_id}] transport error: {detail}");
			}
		}),
	);

	connection
		.subscribe(
			"hello/dynamic/+",
			Arc::new(|message| {
				println!(
					"message on '{}': {:?}",
					message.topic, message.payload
				);
			}),
		)
		.await?;

	for i in 0 .. 10 {
		let res = connection
			.publish("hello/dynamic/demo", json!({"count": i}))
			.await;
		if let Err(err) = res {
			eprintln!("publish rejected: {err}");
		}
		time::sleep(Duration::from_secs(1)).await;
	}

	println!("clients: {:?}", registry.list_clients());
	registry.close_clients().await;
	Ok(())
}
