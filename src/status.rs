//! Connection lifecycle status and the shared per-status counter tracker.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

/// Lifecycle status of one managed connection.
///
/// Variants are declared in lifecycle order; that order is also the
/// rendering order of the aggregate summary (derived `Ord`). `Closed` is
/// terminal and is never counted in the summary.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
	Initiated,
	Connected,
	Error,
	Reconnecting,
	Disconnected,
	Offline,
	Closed,
}

impl Status {
	/// Lowercase wire/display name of the status.
	pub fn as_str(self) -> &'static str {
		match self {
			| Status::Initiated => "initiated",
			| Status::Connected => "connected",
			| Status::Error => "error",
			| Status::Reconnecting => "reconnecting",
			| Status::Disconnected => "disconnected",
			| Status::Offline => "offline",
			| Status::Closed => "closed",
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Shared per-status live-connection counters.
///
/// Every status transition is applied transactionally: the previous
/// status (if any) is decremented and the new status incremented, except
/// `Closed`, which is never counted. Non-positive entries are pruned on
/// every change ("auto-sanitize"), and the summary renders the surviving
/// entries in [`Status`] declaration order as `"<name>:<count> "`.
#[derive(Debug, Default)]
pub struct StatusTracker {
	counts: Mutex<BTreeMap<Status, i64>>,
}

impl StatusTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Applies one transition and returns the freshly rendered summary.
	pub fn apply(&self, previous: Option<Status>, next: Status) -> String {
		let mut counts = self.counts.lock();
		if let Some(previous) = previous {
			*counts.entry(previous).or_insert(0) -= 1;
		}
		if next != Status::Closed {
			*counts.entry(next).or_insert(0) += 1;
		}
		counts.retain(|_, count| *count > 0);
		render(&counts)
	}

	/// Renders the current summary without changing any counter.
	pub fn summary(&self) -> String {
		render(&self.counts.lock())
	}
}

fn render(counts: &BTreeMap<Status, i64>) -> String {
	let mut summary = String::new();
	for (status, count) in counts {
		if *count > 0 {
			use std::fmt::Write as _;
			let _ = write!(summary, "{status}:{count} ");
		}
	}
	summary
}
