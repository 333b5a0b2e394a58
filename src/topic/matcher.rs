use super::filter::TopicFilter;

/// Resolves a received topic against an ordered sequence of patterns.
///
/// Patterns are tested in the order supplied and the first match wins:
/// the tie-break among overlapping subscriptions is first-registered, not
/// most-specific. Returns the index of the winning pattern so callers can
/// address whatever they keep alongside it.
pub fn first_match<'a, I>(received: &str, patterns: I) -> Option<usize>
where I: IntoIterator<Item = &'a TopicFilter> {
	patterns
		.into_iter()
		.position(|filter| filter.matches(received))
}
