use crate::lexer::tokenize;
use crate::tokens::Token;

/// Indentation applied to literal block bodies.
pub const CODE_INDENT: &str = "   ";

/// Render a `.. code-block::` directive with its body indented.
///
/// Blank body lines stay empty so the output carries no trailing whitespace.
pub fn render_code_block(language: Option<&str>, body: &[&str]) -> String {
	let mut lines = vec![match language {
		Some(language) => format!(".. code-block:: {language}"),
		None => ".. code-block::".to_string(),
	}];
	lines.push(String::new());

	for line in body {
		if line.trim().is_empty() {
			lines.push(String::new());
		} else {
			lines.push(format!("{CODE_INDENT}{line}"));
		}
	}

	lines.push(String::new());
	lines.join("\n")
}

/// Replace every complete fenced code block with a `.. code-block::`
/// directive.
///
/// An opening marker without a closer is dropped and the lines after it are
/// kept as plain text.
pub fn convert_fences(text: &str) -> String {
	let tokens = tokenize(text);
	let mut output: Vec<String> = Vec::with_capacity(tokens.len());
	let mut language: Option<String> = None;
	let mut body: Vec<&str> = Vec::new();

	for line in tokens.iter() {
		match &line.token {
			Token::FenceOpen { language: tag } => {
				language.clone_from(tag);
				body.clear();
			}
			Token::Code => body.push(line.text),
			Token::FenceClose => {
				output.push(render_code_block(language.as_deref(), &body));
				language = None;
				body.clear();
			}
			Token::StrayFence => {}
			_ => output.push(line.text.to_string()),
		}
	}

	let mut converted = output.join("\n");
	if text.ends_with('\n') {
		converted.push('\n');
	}

	converted
}
