use crate::lexer::is_table_separator;
use crate::lexer::pipe_count;

/// Rendered in place of a table that has a header but no data rows.
pub const EMPTY_TABLE_PLACEHOLDER: &str = "No data available";

/// Marker appended to truncated grid cells.
pub const ELLIPSIS: &str = "...";

/// Indentation used for directive bodies.
const INDENT: &str = "   ";

/// A parsed pipe table. Rows may have a different number of cells than the
/// header; renderers emit whatever cells a row has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
	pub header: Vec<String>,
	pub rows: Vec<Vec<String>>,
}

/// The output shape of a rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableForm {
	/// A `.. list-table::` directive.
	#[default]
	Directive,
	/// A fixed-width simple table framed by `=` rules.
	Grid,
}

/// Column width hints for the `:widths:` option of a list table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnWidths {
	#[default]
	Auto,
	Fixed(Vec<u16>),
}

/// Options for the directive form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTableOptions {
	pub title: Option<String>,
	pub widths: ColumnWidths,
}

/// Width limits for one grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridColumn {
	/// The column is never narrower than this.
	pub min_width: usize,
	/// The column is never wider than this. Longer cells are truncated with
	/// an ellipsis.
	pub max_width: Option<usize>,
}

impl GridColumn {
	pub const fn new(min_width: usize) -> Self {
		Self {
			min_width,
			max_width: None,
		}
	}

	pub const fn capped(min_width: usize, max_width: usize) -> Self {
		Self {
			min_width,
			max_width: Some(max_width),
		}
	}
}

impl Table {
	pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
		Self { header, rows }
	}

	/// Parse a block of pipe-table lines. The first line is the header and
	/// the second must be an alignment row with the same number of cells.
	/// Returns `None` when the block is not a table.
	pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<Self> {
		let mut lines = lines.into_iter().filter(|line| !line.trim().is_empty());
		let header_line = lines.next()?;
		let separator_line = lines.next()?;

		if pipe_count(header_line) < 2 || !is_table_separator(separator_line) {
			return None;
		}

		let header = split_row(header_line);
		if split_row(separator_line).len() != header.len() {
			return None;
		}

		let rows = lines.map(split_row).filter(|row| !row.is_empty()).collect();

		Some(Self { header, rows })
	}

	/// Apply `convert` to every header and body cell.
	#[must_use]
	pub fn map_cells(self, convert: impl Fn(&str) -> String) -> Self {
		Self {
			header: self.header.iter().map(|cell| convert(cell)).collect(),
			rows: self
				.rows
				.iter()
				.map(|row| row.iter().map(|cell| convert(cell)).collect())
				.collect(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Render as a `.. list-table::` directive.
	pub fn to_list_table(&self, options: &ListTableOptions) -> String {
		if self.is_empty() {
			return EMPTY_TABLE_PLACEHOLDER.to_string();
		}

		let mut lines = vec![match &options.title {
			Some(title) if !title.trim().is_empty() => format!(".. list-table:: {}", title.trim()),
			_ => ".. list-table::".to_string(),
		}];
		lines.push(format!("{INDENT}:header-rows: 1"));
		lines.push(match &options.widths {
			ColumnWidths::Auto => format!("{INDENT}:widths: auto"),
			ColumnWidths::Fixed(widths) => {
				let widths: Vec<String> = widths.iter().map(ToString::to_string).collect();
				format!("{INDENT}:widths: {}", widths.join(" "))
			}
		});
		lines.push(String::new());

		for row in std::iter::once(&self.header).chain(&self.rows) {
			push_list_item(&mut lines, row);
		}

		lines.join("\n")
	}

	/// Render as a fixed-width simple table.
	///
	/// Each column is as wide as the widest of its header, its cells and its
	/// `min_width`, but no wider than its `max_width`. Columns without an
	/// entry in `columns` have no minimum and no cap.
	pub fn to_grid(&self, columns: &[GridColumn]) -> String {
		if self.is_empty() {
			return EMPTY_TABLE_PLACEHOLDER.to_string();
		}

		let widths: Vec<usize> = self
			.header
			.iter()
			.enumerate()
			.map(|(index, header)| {
				let column = columns.get(index).copied().unwrap_or_default();
				let widest = self
					.rows
					.iter()
					.filter_map(|row| row.get(index))
					.map(|cell| cell.chars().count())
					.chain([header.chars().count(), column.min_width])
					.max()
					.unwrap_or(0);
				match column.max_width {
					Some(max) => widest.min(max.max(column.min_width)),
					None => widest,
				}
			})
			.collect();

		let rule = widths
			.iter()
			.map(|width| "=".repeat(*width))
			.collect::<Vec<_>>()
			.join(" ");

		let mut lines = vec![rule.clone(), grid_row(&self.header, &widths), rule.clone()];
		lines.extend(self.rows.iter().map(|row| grid_row(row, &widths)));
		lines.push(rule);

		lines.join("\n")
	}

	pub fn render(&self, form: TableForm, options: &ListTableOptions, columns: &[GridColumn]) -> String {
		match form {
			TableForm::Directive => self.to_list_table(options),
			TableForm::Grid => self.to_grid(columns),
		}
	}
}

/// Convert a raw markdown pipe table into RST. Blocks that are not tables
/// are returned unchanged.
pub fn convert_table(raw_block: &str, form: TableForm) -> String {
	match Table::parse(raw_block.lines()) {
		Some(table) => table.render(form, &ListTableOptions::default(), &[]),
		None => raw_block.to_string(),
	}
}

/// Split a pipe row into trimmed cells, dropping only the empty cells created
/// by a leading or trailing pipe.
pub fn split_row(line: &str) -> Vec<String> {
	let trimmed = line.trim();
	let mut cells: Vec<&str> = trimmed.split('|').collect();

	if trimmed.starts_with('|') && !cells.is_empty() {
		cells.remove(0);
	}

	if trimmed.ends_with('|') && trimmed.len() > 1 {
		cells.pop();
	}

	cells.into_iter().map(|cell| cell.trim().to_string()).collect()
}

/// Truncate `cell` to `width` characters, ending in an ellipsis when cut.
///
/// The cut never leaves markup open: when it lands inside an inline literal
/// the whole literal is dropped, and a trailing escape backslash goes too.
pub fn truncate_cell(cell: &str, width: usize) -> String {
	if cell.chars().count() <= width {
		return cell.to_string();
	}

	let keep = width.saturating_sub(ELLIPSIS.len());
	let mut truncated: String = cell.chars().take(keep).collect();

	if truncated.matches("``").count() % 2 == 1 {
		if let Some(open) = truncated.rfind("``") {
			truncated.truncate(open);
		}
	}

	while truncated.ends_with('\\') {
		truncated.pop();
	}

	truncated.push_str(ELLIPSIS);
	truncated
}

fn push_list_item(lines: &mut Vec<String>, row: &[String]) {
	for (index, cell) in row.iter().enumerate() {
		let marker = if index == 0 { "* -" } else { "  -" };
		if cell.is_empty() {
			lines.push(format!("{INDENT}{marker}"));
		} else {
			lines.push(format!("{INDENT}{marker} {cell}"));
		}
	}

	if row.is_empty() {
		lines.push(format!("{INDENT}* -"));
	}
}

fn grid_row(row: &[String], widths: &[usize]) -> String {
	row.iter()
		.enumerate()
		.map(|(index, cell)| {
			match widths.get(index) {
				Some(width) => format!("{:<width$}", truncate_cell(cell, *width), width = *width),
				None => cell.clone(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}
