use serde::Serialize;

use crate::inline::convert_code_spans;
use crate::section::find_role_section;

/// Mined descriptions shorter than this many characters are noise.
pub const DEFAULT_MIN_DESCRIPTION_LENGTH: usize = 10;

/// Prefix shared by every requirement identifier.
pub const REQUIREMENT_PREFIX: &str = "REQ-";

const IDENTIFIER_OPEN: &str = "**REQ-";
const IMPLEMENTATION_LABEL: &str = "**Implementation**";

/// A `REQ-<CATEGORY>-<NUMBER>` requirement mined from prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementRecord {
	pub id: String,
	pub description: String,
}

impl RequirementRecord {
	pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			description: description.into(),
		}
	}
}

/// Parse a requirement identifier at the start of `text`, returning the
/// identifier.
///
/// The category is one or more ASCII uppercase letters and the number is one
/// or more ASCII digits.
pub fn parse_requirement_id(text: &str) -> Option<&str> {
	let rest = text.strip_prefix(REQUIREMENT_PREFIX)?;
	let category = rest.bytes().take_while(u8::is_ascii_uppercase).count();
	if category == 0 {
		return None;
	}

	let rest = rest[category..].strip_prefix('-')?;
	let number = rest.bytes().take_while(u8::is_ascii_digit).count();
	if number == 0 {
		return None;
	}

	Some(&text[..REQUIREMENT_PREFIX.len() + category + 1 + number])
}

/// Find the first requirement identifier anywhere in `text`.
pub fn find_requirement_id(text: &str) -> Option<&str> {
	text.match_indices(REQUIREMENT_PREFIX)
		.find_map(|(index, _)| parse_requirement_id(&text[index..]))
}

/// Mine every `**REQ-XXX-NNN**` record from `text` in source order.
///
/// A description starts after the identifier (and an optional `:`) and ends at
/// the next identifier, a line opening with `**Implementation**`, a heading
/// line, a `_Removed` or `_Deprecated` line, a blank line or the end of the
/// text. Descriptions shorter than `min_length` characters, or that open with
/// `**`, `_Removed:` or `_Deprecated:`, are dropped. Duplicate identifiers are
/// kept.
pub fn mine_requirements(text: &str, min_length: usize) -> Vec<RequirementRecord> {
	let mut records = Vec::new();

	for (index, _) in text.match_indices(IDENTIFIER_OPEN) {
		let Some(id) = parse_requirement_id(&text[index + 2..]) else {
			continue;
		};

		let after_id = index + 2 + id.len();
		let Some(rest) = text[after_id..].strip_prefix("**") else {
			continue;
		};

		let rest = rest.strip_prefix(':').unwrap_or(rest);
		let description = clean_description(&capture_description(rest));

		if is_meaningful(&description, min_length) {
			records.push(RequirementRecord::new(id, description));
		}
	}

	records
}

/// Mine the requirements listed under a role's third-level section of the
/// requirements document. A role without a section has no requirements.
pub fn mine_role_requirements(
	document: &str,
	role: &str,
	min_length: usize,
) -> Vec<RequirementRecord> {
	find_role_section(document, role)
		.map(|section| mine_requirements(section.body(), min_length))
		.unwrap_or_default()
}

fn capture_description(rest: &str) -> String {
	let mut captured: Vec<&str> = Vec::new();

	for (position, line) in rest.split('\n').enumerate() {
		if position > 0 && is_stop_line(line) {
			break;
		}

		// Another identifier on the same line ends this description.
		if let Some(next) = line.find(IDENTIFIER_OPEN) {
			captured.push(&line[..next]);
			break;
		}

		captured.push(line);
	}

	captured.join("\n")
}

fn is_stop_line(line: &str) -> bool {
	let line = line.trim_start();

	line.is_empty()
		|| line.starts_with(IDENTIFIER_OPEN)
		|| line.starts_with(IMPLEMENTATION_LABEL)
		|| line.starts_with('#')
		|| line.starts_with("_Removed")
		|| line.starts_with("_Deprecated")
}

fn clean_description(raw: &str) -> String {
	let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
	let mut description = convert_code_spans(&collapsed);

	if let Some(tail) = description.find(&format!("{IMPLEMENTATION_LABEL}:")) {
		description.truncate(tail);
	}

	description.trim().trim_end_matches('~').trim().to_string()
}

fn is_meaningful(description: &str, min_length: usize) -> bool {
	description.chars().count() >= min_length
		&& !description.starts_with("**")
		&& !description.starts_with("_Removed:")
		&& !description.starts_with("_Deprecated:")
}
