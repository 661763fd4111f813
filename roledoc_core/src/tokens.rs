use derive_more::Deref;
use derive_more::DerefMut;

/// The classification of a single markdown line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// An empty or whitespace-only line.
	Blank,
	/// `## Title`
	Heading { level: usize, title: String },
	/// The opening marker of a fence that has a matching closer.
	FenceOpen { language: Option<String> },
	/// A line inside a complete fence.
	Code,
	/// The closing marker of a complete fence.
	FenceClose,
	/// An opening marker with no closer before the end of the document.
	StrayFence,
	/// `| a | b |`
	TableRow,
	/// `|---|:--:|`
	TableSeparator,
	/// RST markup that is already in the document: a directive line or a
	/// line of an indented block body.
	Literal,
	/// Anything else.
	Text,
}

impl Token {
	/// Whether this line can continue the body of a pipe table.
	pub fn is_table_line(&self) -> bool {
		matches!(self, Token::TableRow | Token::TableSeparator)
	}
}

/// A classified line together with its location in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineToken<'a> {
	pub token: Token,
	/// The raw line without its trailing newline.
	pub text: &'a str,
	/// Byte offset of the first character of the line.
	pub offset: usize,
	/// 1-indexed line number.
	pub line: usize,
}

/// The ordered token stream for one document.
#[derive(Debug, Clone, Default, Deref, DerefMut)]
pub struct TokenStream<'a>(
	#[deref]
	#[deref_mut]
	Vec<LineToken<'a>>,
);

impl<'a> TokenStream<'a> {
	pub fn new(tokens: Vec<LineToken<'a>>) -> Self {
		Self(tokens)
	}
}
