use crate::tokens::LineToken;
use crate::tokens::Token;
use crate::tokens::TokenStream;

/// The marker that opens and closes a fenced code block.
pub const FENCE_MARKER: &str = "```";

/// Split a document into lines and classify each one.
///
/// A fence marker opens a fence when another marker follows it somewhere
/// later in the document; the next marker closes it. Lines between the two
/// are [`Token::Code`] and are never treated as headings or table rows. A
/// marker with nothing after it to close it is a [`Token::StrayFence`] and
/// everything after it is lexed as regular markdown.
///
/// RST that is already in the document is left alone: an explicit markup
/// line (`.. code-block:: bash`, `.. list-table::`) is [`Token::Literal`],
/// and so is every line indented past it, or past a paragraph ending in
/// `::`, up to the next line that is not.
pub fn tokenize(document: &str) -> TokenStream<'_> {
	let lines = split_lines(document);
	let mut tokens = Vec::with_capacity(lines.len());
	let mut state = LexState::Markdown;

	for (index, &(offset, text)) in lines.iter().enumerate() {
		let token = match state {
			LexState::Fence => {
				if fence_language(text).is_some() {
					state = LexState::Markdown;
					Token::FenceClose
				} else {
					Token::Code
				}
			}
			LexState::Literal { .. } if text.trim().is_empty() => Token::Blank,
			LexState::Literal { indent } if indentation(text) > indent => Token::Literal,
			_ => {
				match fence_language(text) {
					Some(language) if has_closing_fence(&lines[index + 1..]) => {
						state = LexState::Fence;
						Token::FenceOpen { language }
					}
					Some(_) => {
						state = LexState::Markdown;
						Token::StrayFence
					}
					None => {
						state = if opens_literal_block(text) {
							LexState::Literal {
								indent: indentation(text),
							}
						} else {
							LexState::Markdown
						};
						classify_line(text)
					}
				}
			}
		};

		tokens.push(LineToken {
			token,
			text,
			offset,
			line: index + 1,
		});
	}

	TokenStream::new(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
	Markdown,
	Fence,
	/// Inside the indented body of an RST block opened at `indent`.
	Literal { indent: usize },
}

fn has_closing_fence(rest: &[(usize, &str)]) -> bool {
	rest.iter().any(|(_, line)| fence_language(line).is_some())
}

/// Leading whitespace, in characters.
fn indentation(line: &str) -> usize {
	line.chars().take_while(|c| c.is_whitespace()).count()
}

/// An RST explicit markup line such as `.. code-block:: yaml`.
pub fn is_directive(line: &str) -> bool {
	line.trim_start()
		.strip_prefix(".. ")
		.is_some_and(|rest| rest.contains("::"))
}

/// Whether the lines indented below `line` form an RST block body.
fn opens_literal_block(line: &str) -> bool {
	is_directive(line) || line.trim_end().ends_with("::")
}

/// Split `document` into `(offset, line)` pairs. Trailing `\r` is removed and
/// a final newline does not produce an empty trailing line.
fn split_lines(document: &str) -> Vec<(usize, &str)> {
	let mut lines = Vec::new();
	let mut offset = 0;

	for raw in document.split('\n') {
		let text = raw.strip_suffix('\r').unwrap_or(raw);
		lines.push((offset, text));
		offset += raw.len() + 1;
	}

	if document.ends_with('\n') {
		lines.pop();
	}

	lines
}

/// Classify a line that is not part of a fence.
fn classify_line(line: &str) -> Token {
	if line.trim().is_empty() {
		return Token::Blank;
	}

	if is_directive(line) {
		return Token::Literal;
	}

	if let Some((level, title)) = parse_heading(line) {
		return Token::Heading {
			level,
			title: title.to_string(),
		};
	}

	if is_table_separator(line) {
		return Token::TableSeparator;
	}

	if pipe_count(line) >= 2 {
		return Token::TableRow;
	}

	Token::Text
}

/// Parse an ATX heading: one to six `#`, a space or tab, then a non-empty
/// title. Returns the level and the trimmed title.
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
	let level = line.bytes().take_while(|&b| b == b'#').count();
	if !(1..=6).contains(&level) {
		return None;
	}

	let rest = &line[level..];
	if !rest.starts_with([' ', '\t']) {
		return None;
	}

	let title = rest.trim();
	if title.is_empty() {
		return None;
	}

	Some((level, title))
}

/// Returns `Some(language)` when the line is a fence marker. The inner option
/// is `None` when the marker has no language tag.
pub fn fence_language(line: &str) -> Option<Option<String>> {
	let rest = line.trim_start().strip_prefix(FENCE_MARKER)?;
	let language = rest.trim().trim_start_matches('`').trim();

	if language.is_empty() {
		Some(None)
	} else {
		Some(Some(language.to_string()))
	}
}

pub fn pipe_count(line: &str) -> usize {
	line.bytes().filter(|&b| b == b'|').count()
}

/// A table alignment row such as `|---|:---:|`.
pub fn is_table_separator(line: &str) -> bool {
	pipe_count(line) >= 2
		&& line.contains('-')
		&& line
			.chars()
			.all(|c| matches!(c, '-' | ':' | '|' | ' ' | '\t'))
}
