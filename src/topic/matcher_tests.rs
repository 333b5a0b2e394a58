use super::filter::TopicFilter;
use super::matcher::first_match;

fn filters(patterns: &[&str]) -> Vec<TopicFilter> {
	patterns
		.iter()
		.map(|pattern| TopicFilter::new(*pattern))
		.collect()
}

// Helper to resolve a topic against a pattern list and hand back the
// winning pattern text.
fn resolve<'a>(topic: &str, patterns: &'a [TopicFilter]) -> Option<&'a str> {
	first_match(topic, patterns.iter())
		.map(|index| patterns[index].pattern().as_str())
}

#[test]
fn exact_topics() {
	let patterns = filters(&["sensors/temperature", "sensors/humidity"]);
	assert_eq!(
		resolve("sensors/temperature", &patterns),
		Some("sensors/temperature")
	);
	assert_eq!(
		resolve("sensors/humidity", &patterns),
		Some("sensors/humidity")
	);
	assert_eq!(resolve("sensors/pressure", &patterns), None);
}

#[test]
fn single_level_wildcard() {
	let patterns = filters(&["a/+/c"]);
	assert_eq!(resolve("a/b/c", &patterns), Some("a/+/c"));
	assert_eq!(resolve("x/b/c", &patterns), None);
	// '+' spans exactly one level
	assert_eq!(resolve("a/b/b/c", &patterns), None);
	assert_eq!(resolve("a/c", &patterns), None);
}

#[test]
fn multi_level_wildcard() {
	let patterns = filters(&["a/#"]);
	assert_eq!(resolve("a/b/c", &patterns), Some("a/#"));
	assert_eq!(resolve("a/b", &patterns), Some("a/#"));
	// '#' also covers the empty remainder
	assert_eq!(resolve("a", &patterns), Some("a/#"));
	assert_eq!(resolve("b/a", &patterns), None);
}

#[test]
fn dollar_is_literal() {
	let patterns = filters(&["$SYS/x"]);
	assert_eq!(resolve("$SYS/x", &patterns), Some("$SYS/x"));
	assert_eq!(resolve("aSYS/x", &patterns), None);
	assert_eq!(resolve("$SYS/y", &patterns), None);
}

#[test]
fn embedded_wildcard_characters_are_literal() {
	let patterns = filters(&["a+b/c", "d#/e"]);
	assert_eq!(resolve("a+b/c", &patterns), Some("a+b/c"));
	assert_eq!(resolve("axb/c", &patterns), None);
	assert_eq!(resolve("d#/e", &patterns), Some("d#/e"));
	assert_eq!(resolve("d/anything/e", &patterns), None);
}

#[test]
fn first_registered_pattern_wins() {
	// Overlapping subscriptions resolve to the earliest registration,
	// regardless of specificity.
	let patterns = filters(&["sensors/#", "sensors/+/temp"]);
	assert_eq!(resolve("sensors/42/temp", &patterns), Some("sensors/#"));

	let reversed = filters(&["sensors/+/temp", "sensors/#"]);
	assert_eq!(
		resolve("sensors/42/temp", &reversed),
		Some("sensors/+/temp")
	);
}

#[test]
fn empty_levels_are_preserved() {
	let patterns = filters(&["a//b"]);
	assert_eq!(resolve("a//b", &patterns), Some("a//b"));
	assert_eq!(resolve("a/b", &patterns), None);

	let plus = filters(&["a/+/b"]);
	// A '+' level requires a level to be present, even an empty one
	assert_eq!(resolve("a//b", &plus), Some("a/+/b"));
}

#[test]
fn catch_all_pattern() {
	let patterns = filters(&["#"]);
	assert_eq!(resolve("anything/at/all", &patterns), Some("#"));
	assert_eq!(resolve("$SYS/broker", &patterns), Some("#"));
}
