//! Events delivered back to the caller of [`create_client`].
//!
//! [`create_client`]: crate::registry::ConnectionRegistry::create_client

use std::collections::BTreeMap;
use std::sync::Arc;

use arcstr::ArcStr;
use serde::Serialize;

use crate::status::Status;

/// Caller-supplied sink for everything a connection reports back.
pub type NotificationCallback = Arc<dyn Fn(Notification) + Send + Sync>;

/// One event on the notification channel.
#[derive(Debug, Clone)]
pub enum Notification {
	/// A status transition, with the freshly rendered aggregate summary.
	Status(StatusNotification),
	/// Raw transport error detail, distinct from the status payload that
	/// accompanies the transition to [`Status::Error`].
	TransportError { client_id: ArcStr, detail: String },
}

/// Structured payload of a status-change notification.
#[derive(Debug, Clone, Serialize)]
pub struct StatusNotification {
	pub client_id: ArcStr,
	/// `None` only on a connection's very first transition.
	pub previous: Option<Status>,
	pub current: Status,
	/// Aggregate per-status counts rendered as `"<name>:<count> "`.
	pub summary: String,
	/// Full registry snapshot; populated in
	/// [`NotificationMode::Verbose`] only.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub clients: Option<BTreeMap<ArcStr, ClientSnapshot>>,
}

/// Shape of the status-notification payload.
///
/// Both variants exist in the field: one consumer population wants the
/// full client list embedded in every event, the other only the firing
/// connection's delta. Configured per registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationMode {
	/// Embed a full `list_clients()` snapshot in every status event.
	#[default]
	Verbose,
	/// Carry only the firing connection's old and new status.
	Minimal,
}

/// One registry entry as reported by `list_clients()`.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSnapshot {
	pub status: Status,
	pub subscriptions: Vec<ArcStr>,
}
