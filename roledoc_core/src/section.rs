use crate::lexer::tokenize;
use crate::tokens::Token;

/// A markdown ATX heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
	/// `1` for `#`, `2` for `##`, and so on.
	pub level: usize,
	pub title: String,
	/// Byte offset of the heading line in its document.
	pub offset: usize,
	/// 1-indexed line number.
	pub line: usize,
}

/// A heading together with the span of the document it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
	pub heading: Heading,
	/// Byte offset where the section starts (the heading line).
	pub start: usize,
	/// Byte offset of the next heading with an equal or lower level, or the
	/// document length.
	pub end: usize,
	/// The trimmed text of `document[start..end]`.
	pub content: &'a str,
}

impl Section<'_> {
	/// The section text without its heading line.
	pub fn body(&self) -> &str {
		self.content
			.split_once('\n')
			.map_or("", |(_, rest)| rest)
			.trim()
	}
}

/// All headings in the document, skipping anything inside fenced code.
pub fn headings(document: &str) -> Vec<Heading> {
	tokenize(document)
		.iter()
		.filter_map(|line| {
			match &line.token {
				Token::Heading { level, title } => {
					Some(Heading {
						level: *level,
						title: title.clone(),
						offset: line.offset,
						line: line.line,
					})
				}
				_ => None,
			}
		})
		.collect()
}

/// Extract the section whose heading has exactly `level` markers and whose
/// title matches `heading_title` case-insensitively after trimming.
///
/// Returns `None` when no heading matches. Callers treat a missing section
/// as optional content.
pub fn extract_section<'a>(
	document: &'a str,
	heading_title: &str,
	level: usize,
) -> Option<Section<'a>> {
	let target = heading_title.trim().to_lowercase();
	let all = headings(document);
	let index = all
		.iter()
		.position(|heading| heading.level == level && heading.title.to_lowercase() == target)?;

	Some(section_at(document, &all, index))
}

/// Find the requirements section for a role. Role sections are third-level
/// headings such as `### 3.2 Os Configuration` or `### nodejs`.
///
/// The first pass compares the title (without its leading section number)
/// with the role name, using spaces for underscores. The second pass accepts
/// any third-level title containing the raw role name.
pub fn find_role_section<'a>(document: &'a str, role: &str) -> Option<Section<'a>> {
	let all = headings(document);
	let spaced = role.replace('_', " ").to_lowercase();
	let raw = role.to_lowercase();

	let index = all
		.iter()
		.position(|heading| {
			heading.level == 3 && strip_section_number(&heading.title).to_lowercase() == spaced
		})
		.or_else(|| {
			all.iter()
				.position(|heading| heading.level == 3 && heading.title.to_lowercase().contains(&raw))
		})?;

	Some(section_at(document, &all, index))
}

fn section_at<'a>(document: &'a str, all: &[Heading], index: usize) -> Section<'a> {
	let heading = all[index].clone();
	let start = heading.offset;
	let end = all[index + 1..]
		.iter()
		.find(|next| next.level <= heading.level)
		.map_or(document.len(), |next| next.offset);

	Section {
		heading,
		start,
		end,
		content: document[start..end].trim(),
	}
}

/// Remove a leading outline number such as `3.2` or `3.2.` from a title.
fn strip_section_number(title: &str) -> &str {
	let rest = title.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
	if rest.len() == title.len() {
		return title;
	}

	rest.trim_start()
}
