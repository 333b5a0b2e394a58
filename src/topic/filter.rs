use arcstr::ArcStr;

/// One level of a compiled subscription pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSegment {
	/// Matches exactly this text. `$` and every other non-wildcard
	/// character is compared literally, never as a pattern.
	Literal(String),
	/// `+` — matches exactly one topic level.
	SingleLevel,
	/// `#` — matches the entire remaining suffix, including none.
	MultiLevel,
}

/// A subscription pattern compiled for matching.
///
/// The pattern is kept verbatim as given by the caller; it is the key the
/// subscription table is addressed by. A segment counts as a wildcard only
/// when it is exactly `+` or `#` — embedded occurrences (`a+b`) are
/// literal text.
#[derive(Debug, Clone)]
pub struct TopicFilter {
	pattern: ArcStr,
	segments: Vec<FilterSegment>,
}

impl TopicFilter {
	pub fn new(pattern: impl Into<ArcStr>) -> Self {
		let pattern = pattern.into();
		let segments = pattern
			.split('/')
			.map(|segment| match segment {
				| "+" => FilterSegment::SingleLevel,
				| "#" => FilterSegment::MultiLevel,
				| literal => FilterSegment::Literal(literal.to_string()),
			})
			.collect();
		Self { pattern, segments }
	}

	/// The pattern exactly as supplied by the caller.
	pub fn pattern(&self) -> &ArcStr {
		&self.pattern
	}

	/// Tests a received topic against this pattern.
	///
	/// The received topic is concrete: wildcard characters inside it carry
	/// no meaning and only ever match themselves literally.
	pub fn matches(&self, topic: &str) -> bool {
		let mut levels = topic.split('/');
		for segment in &self.segments {
			match segment {
				// Everything after a '#' segment is unreachable, so the
				// suffix match ends the scan.
				| FilterSegment::MultiLevel => return true,
				| FilterSegment::SingleLevel => {
					if levels.next().is_none() {
						return false;
					}
				}
				| FilterSegment::Literal(literal) => match levels.next() {
					| Some(level) if level == literal => {}
					| _ => return false,
				},
			}
		}
		levels.next().is_none()
	}
}

impl std::fmt::Display for TopicFilter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.pattern)
	}
}
