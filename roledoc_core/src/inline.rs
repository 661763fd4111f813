use std::ops::Range;

use logos::Logos;

use crate::lexer::parse_heading;

/// Raw tokens for inline markup. Everything that is not a run of backticks
/// is plain text, so the lexer always covers its whole input.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum InlineToken {
	#[regex("`+")]
	Backticks,
	#[regex("[^`]+")]
	Text,
}

/// Underline character for an RST section title at the given markdown
/// heading level. Levels past five reuse the level-three character.
pub fn underline_char(level: usize) -> char {
	match level {
		0..=2 => '=',
		4 => '~',
		5 => '^',
		_ => '-',
	}
}

/// An underline exactly as long as `title`, counted in characters.
pub fn underline(title: &str, level: usize) -> String {
	underline_char(level)
		.to_string()
		.repeat(title.chars().count())
}

/// Render an RST section title with its underline.
pub fn title_block(title: &str, level: usize) -> String {
	format!("{title}\n{}", underline(title, level))
}

/// Convert a span of markdown text (never a fenced code block) to RST.
///
/// - `##` to `######` headings become a title line plus an underline.
///   Level-one headings are left alone.
/// - Single-backtick code spans become double-backtick inline literals.
///   Double-backtick spans are already RST and pass through.
/// - `**bold**` is identical in both dialects and passes through.
///
/// Unmatched markup is kept as it is.
pub fn convert_inline(text: &str) -> String {
	let mut output: Vec<String> = Vec::new();

	for line in text.split('\n') {
		match parse_heading(line) {
			Some((level, title)) if level >= 2 => {
				let title = convert_code_spans(title);
				output.push(title_block(&title, level));
			}
			_ => output.push(convert_code_spans(line)),
		}
	}

	output.join("\n")
}

/// Rewrite markdown code spans as RST inline literals.
pub fn convert_code_spans(text: &str) -> String {
	let tokens: Vec<(InlineToken, Range<usize>)> = InlineToken::lexer(text)
		.spanned()
		.map(|(result, span)| (result.unwrap_or(InlineToken::Text), span))
		.collect();

	let mut output = String::with_capacity(text.len() + 8);
	let mut cursor = 0;

	while cursor < tokens.len() {
		let (token, span) = &tokens[cursor];

		if *token == InlineToken::Text {
			output.push_str(&text[span.clone()]);
			cursor += 1;
			continue;
		}

		let run = span.len();
		let closing = tokens[cursor + 1..]
			.iter()
			.position(|(other, other_span)| {
				*other == InlineToken::Backticks && other_span.len() == run
			})
			.map(|relative| cursor + 1 + relative);

		let Some(closing) = closing else {
			output.push_str(&text[span.clone()]);
			cursor += 1;
			continue;
		};

		let inner = &text[span.end..tokens[closing].1.start];
		if run == 1 && !inner.trim().is_empty() {
			output.push_str("``");
			output.push_str(inner);
			output.push_str("``");
		} else {
			output.push_str(&text[span.start..tokens[closing].1.end]);
		}

		cursor = closing + 1;
	}

	output
}

/// Collapse three or more consecutive newlines into exactly two, leaving a
/// single blank line.
pub fn collapse_blank_lines(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut newlines = 0;

	for ch in text.chars() {
		if ch == '\n' {
			newlines += 1;
			continue;
		}

		push_newlines(&mut output, newlines);
		newlines = 0;
		output.push(ch);
	}

	push_newlines(&mut output, newlines);
	output
}

fn push_newlines(output: &mut String, count: usize) {
	for _ in 0..count.min(2) {
		output.push('\n');
	}
}
