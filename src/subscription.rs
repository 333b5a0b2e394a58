//! Per-connection subscription table.

use std::sync::Arc;

use arcstr::ArcStr;
use bytes::Bytes;

use crate::topic::{first_match, TopicFilter};

/// Caller-supplied delivery sink for one subscription.
pub type DeliveryCallback = Arc<dyn Fn(InboundMessage) + Send + Sync>;

/// An inbound message routed to a subscription.
#[derive(Debug, Clone)]
pub struct InboundMessage {
	pub client_id: ArcStr,
	/// The concrete topic the message arrived on, free of wildcards.
	pub topic: ArcStr,
	pub payload: Bytes,
}

/// One registered subscription: the compiled pattern plus its sink.
pub struct SubscriptionEntry {
	filter: TopicFilter,
	callback: DeliveryCallback,
}

impl SubscriptionEntry {
	pub fn pattern(&self) -> &ArcStr {
		self.filter.pattern()
	}

	pub fn callback(&self) -> DeliveryCallback {
		Arc::clone(&self.callback)
	}
}

/// Insertion-ordered mapping from subscription pattern to delivery sink.
///
/// Owned exclusively by one connection. Keys are the patterns exactly as
/// the caller gave them; insertion order is what makes resolution
/// deterministic for overlapping patterns (first registered wins).
#[derive(Default)]
pub struct SubscriptionTable {
	entries: Vec<SubscriptionEntry>,
}

impl SubscriptionTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, pattern: &str) -> bool {
		self.entries
			.iter()
			.any(|entry| entry.pattern().as_str() == pattern)
	}

	/// Registers a pattern. The first registration wins: an already
	/// present pattern is left untouched and `false` is returned.
	pub fn insert(
		&mut self,
		pattern: ArcStr,
		callback: DeliveryCallback,
	) -> bool {
		if self.contains(&pattern) {
			return false;
		}
		self.entries.push(SubscriptionEntry {
			filter: TopicFilter::new(pattern),
			callback,
		});
		true
	}

	/// Removes a pattern; `false` when it was not registered.
	pub fn remove(&mut self, pattern: &str) -> bool {
		let before = self.entries.len();
		self.entries
			.retain(|entry| entry.pattern().as_str() != pattern);
		self.entries.len() != before
	}

	/// Resolves a received topic to the first matching subscription.
	pub fn resolve(&self, topic: &str) -> Option<&SubscriptionEntry> {
		let index = first_match(
			topic,
			self.entries.iter().map(|entry| &entry.filter),
		)?;
		self.entries.get(index)
	}

	pub fn patterns(&self) -> Vec<ArcStr> {
		self.entries
			.iter()
			.map(|entry| entry.pattern().clone())
			.collect()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn noop() -> DeliveryCallback {
		Arc::new(|_| {})
	}

	#[test]
	fn first_registration_wins() {
		let mut table = SubscriptionTable::new();
		assert!(table.insert(ArcStr::from("a/+"), noop()));
		assert!(!table.insert(ArcStr::from("a/+"), noop()));
		assert_eq!(table.len(), 1);
	}

	#[test]
	fn remove_reports_presence() {
		let mut table = SubscriptionTable::new();
		table.insert(ArcStr::from("a/b"), noop());
		assert!(table.remove("a/b"));
		assert!(!table.remove("a/b"));
		assert!(table.is_empty());
	}

	#[test]
	fn resolution_follows_insertion_order() {
		let mut table = SubscriptionTable::new();
		table.insert(ArcStr::from("sensors/#"), noop());
		table.insert(ArcStr::from("sensors/+/temp"), noop());
		let entry = table.resolve("sensors/42/temp").unwrap();
		assert_eq!(entry.pattern().as_str(), "sensors/#");
	}

	#[test]
	fn unmatched_topic_resolves_to_none() {
		let mut table = SubscriptionTable::new();
		table.insert(ArcStr::from("sensors/+/temp"), noop());
		assert!(table.resolve("sensors/42/humidity").is_none());
	}
}
