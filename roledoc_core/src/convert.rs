use crate::fence::render_code_block;
use crate::inline::collapse_blank_lines;
use crate::inline::convert_code_spans;
use crate::inline::convert_inline;
use crate::lexer::tokenize;
use crate::table::ListTableOptions;
use crate::table::Table;
use crate::tokens::LineToken;
use crate::tokens::Token;

/// Convert a markdown document into RST.
///
/// The document is lexed once. The token stream is then walked a second time
/// and each run of lines goes to the converter for its kind:
///
/// - complete fences become `.. code-block::` directives,
/// - stray fence markers are dropped,
/// - RST directives and indented block bodies are copied as they are,
/// - pipe tables become `.. list-table::` directives titled with the nearest
///   preceding heading, with their cells run through the inline converter,
/// - everything else goes through [`convert_inline`].
///
/// The result has collapsed blank lines and no surrounding whitespace. Text
/// that is already RST passes through unchanged.
pub fn markdown_to_rst(text: &str) -> String {
	let tokens = tokenize(text);
	let mut output: Vec<String> = Vec::new();
	let mut pending: Vec<&str> = Vec::new();
	let mut last_heading: Option<String> = None;
	let mut index = 0;

	while index < tokens.len() {
		let line = &tokens[index];

		match &line.token {
			Token::FenceOpen { language } => {
				flush_text(&mut output, &mut pending);
				let body: Vec<&str> = tokens[index + 1..]
					.iter()
					.take_while(|next| next.token == Token::Code)
					.map(|next| next.text)
					.collect();
				output.push(String::new());
				output.push(render_code_block(language.as_deref(), &body));
				// Skip the body and the closing marker.
				index += body.len() + 2;
				continue;
			}
			Token::StrayFence => {}
			Token::Literal => {
				flush_text(&mut output, &mut pending);
				output.push(line.text.to_string());
			}
			Token::TableRow if starts_table(&tokens, index) => {
				let block: Vec<&LineToken<'_>> = tokens[index..]
					.iter()
					.take_while(|next| next.token.is_table_line())
					.collect();

				if let Some(table) = Table::parse(block.iter().map(|next| next.text)) {
					flush_text(&mut output, &mut pending);
					let options = ListTableOptions {
						title: last_heading.as_deref().map(convert_code_spans),
						..ListTableOptions::default()
					};
					output.push(String::new());
					output.push(table.map_cells(convert_code_spans).to_list_table(&options));
					output.push(String::new());
					index += block.len();
					continue;
				}

				pending.push(line.text);
			}
			Token::Heading { title, .. } => {
				last_heading = Some(title.clone());
				pending.push(line.text);
			}
			_ => pending.push(line.text),
		}

		index += 1;
	}

	flush_text(&mut output, &mut pending);

	let document = output.join("\n");
	let document = document
		.lines()
		.map(|line| if line.trim().is_empty() { "" } else { line })
		.collect::<Vec<_>>()
		.join("\n");

	collapse_blank_lines(&document).trim().to_string()
}

fn starts_table(tokens: &[LineToken<'_>], index: usize) -> bool {
	tokens
		.get(index + 1)
		.is_some_and(|next| next.token == Token::TableSeparator)
}

fn flush_text(output: &mut Vec<String>, pending: &mut Vec<&str>) {
	if pending.is_empty() {
		return;
	}

	output.push(convert_inline(&pending.join("\n")));
	pending.clear();
}
