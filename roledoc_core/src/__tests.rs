use std::path::PathBuf;

use chrono::TimeZone;
use chrono::Utc;
use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;
use crate::lexer::parse_heading;
use crate::lexer::tokenize;
use crate::project::scan_project;
use crate::project::scan_project_with_config;
use crate::tokens::Token;

// --- Lexer tests ---

#[test]
fn tokenize_classifies_lines() {
	let document = "## Title\n\n| a | b |\n|---|---|\ntext\n```yaml\n# not a heading\n```\n";
	let tokens: Vec<Token> = tokenize(document)
		.iter()
		.map(|line| line.token.clone())
		.collect();

	assert_eq!(
		tokens,
		vec![
			Token::Heading {
				level: 2,
				title: "Title".to_string(),
			},
			Token::Blank,
			Token::TableRow,
			Token::TableSeparator,
			Token::Text,
			Token::FenceOpen {
				language: Some("yaml".to_string()),
			},
			Token::Code,
			Token::FenceClose,
		]
	);
}

#[test]
fn tokenize_marks_unpaired_fence_as_stray() {
	let tokens = tokenize("```bash\necho hi\n## Next");

	assert_eq!(tokens[0].token, Token::StrayFence);
	assert_eq!(tokens[1].token, Token::Text);
	assert!(matches!(tokens[2].token, Token::Heading { level: 2, .. }));
	assert_eq!(tokens[2].line, 3);
}

#[test]
fn tokenize_keeps_rst_blocks_literal() {
	let document = "Run this::

   echo `date`
   | a | b |

.. code-block:: bash

   ```
after `x`
";
	let tokens: Vec<Token> = tokenize(document)
		.iter()
		.map(|line| line.token.clone())
		.collect();

	assert_eq!(
		tokens,
		vec![
			Token::Text,
			Token::Blank,
			Token::Literal,
			Token::Literal,
			Token::Blank,
			Token::Literal,
			Token::Blank,
			Token::Literal,
			Token::Text,
		]
	);
}

#[rstest]
#[case::no_space("##Title", None)]
#[case::too_deep("####### Title", None)]
#[case::empty_title("##   ", None)]
#[case::tab("###\tTitle ", Some((3, "Title")))]
#[case::level_one("# Title", Some((1, "Title")))]
fn parse_heading_lines(#[case] line: &str, #[case] expected: Option<(usize, &str)>) {
	assert_eq!(parse_heading(line), expected);
}

// --- Section extractor tests ---

const NESTED: &str = "## A\nintro\n### A1\none\n### A2\ntwo\n## B\nthree\n";

#[test]
fn extract_section_stops_at_next_equal_level_heading() {
	let section = extract_section(NESTED, "a", 2).unwrap_or_else(|| panic!("section A"));

	assert_eq!(section.content, "## A\nintro\n### A1\none\n### A2\ntwo");
	assert_eq!(section.start, 0);
	assert_eq!(Some(section.end), NESTED.find("## B"));
	assert_eq!(section.body(), "intro\n### A1\none\n### A2\ntwo");
}

#[test]
fn extract_section_runs_to_end_of_document() {
	let section = extract_section(NESTED, "  B  ", 2).unwrap_or_else(|| panic!("section B"));

	assert_eq!(section.content, "## B\nthree");
	assert_eq!(section.end, NESTED.len());
}

#[rstest]
#[case::missing("C", 2)]
#[case::wrong_level("A1", 2)]
#[case::partial_title("A", 3)]
fn extract_section_not_found(#[case] title: &str, #[case] level: usize) {
	assert!(extract_section(NESTED, title, level).is_none());
}

#[test]
fn headings_ignore_fenced_code() {
	let titles: Vec<String> = headings("# One\n```\n## Hidden\n```\n## Two\n")
		.into_iter()
		.map(|heading| heading.title)
		.collect();

	assert_eq!(titles, vec!["One".to_string(), "Two".to_string()]);
}

#[rstest]
#[case::numbered_title("os_configuration", "3.2 Os Configuration")]
#[case::single_word("rust", "3.3 Rust")]
#[case::contains_name("node", "3.1 Nodejs")]
fn find_role_section_by_title(#[case] role: &str, #[case] expected: &str) {
	let section = find_role_section(REQUIREMENTS_DOCUMENT, role)
		.unwrap_or_else(|| panic!("section for {role}"));

	assert_eq!(section.heading.title, expected);
	assert_eq!(section.heading.level, 3);
}

#[test]
fn find_role_section_missing_role() {
	assert!(find_role_section(REQUIREMENTS_DOCUMENT, "terminal_config").is_none());
}

// --- Inline converter tests ---

#[rstest]
#[case::level_two(2, '=')]
#[case::level_three(3, '-')]
#[case::level_four(4, '~')]
#[case::level_five(5, '^')]
#[case::level_six(6, '-')]
fn underline_matches_title_length(#[case] level: usize, #[case] expected: char) {
	for title in ["Overview", "Überblick ✓", "日本語のタイトル", "x"] {
		let line = underline(title, level);

		assert_eq!(line.chars().count(), title.chars().count());
		assert!(line.chars().all(|c| c == expected));
	}
}

#[rstest]
#[case::heading("## Überblick", "Überblick\n=========")]
#[case::deep_heading("###### Deep", "Deep\n----")]
#[case::level_one_untouched("# Title", "# Title")]
#[case::code_in_heading("### Use `apt`", "Use ``apt``\n-----------")]
#[case::code_span("use `foo` and ``bar``", "use ``foo`` and ``bar``")]
#[case::adjacent_spans("`a` `b`", "``a`` ``b``")]
#[case::unmatched("a ` b", "a ` b")]
#[case::empty_span("a `` b", "a `` b")]
#[case::bold("**bold** text", "**bold** text")]
fn convert_inline_markup(#[case] input: &str, #[case] expected: &str) {
	assert_eq!(convert_inline(input), expected);
}

#[rstest]
#[case("plain `code` and ``literal``")]
#[case("``already`` converted")]
#[case("dangling ` tick")]
fn convert_code_spans_is_idempotent(#[case] input: &str) {
	let once = convert_code_spans(input);
	assert_eq!(convert_code_spans(&once), once);
}

#[rstest]
#[case("a\n\n\n\nb", "a\n\nb")]
#[case("a\n\nb", "a\n\nb")]
#[case("a\nb\n\n\n", "a\nb\n\n")]
fn collapse_blank_lines_to_one(#[case] input: &str, #[case] expected: &str) {
	assert_eq!(collapse_blank_lines(input), expected);
}

// --- Table converter tests ---

#[test]
fn parse_table_drops_outer_empty_cells() {
	let table = Table::parse("| a | b |\n|---|:-:|\n| 1 | 2 |".lines())
		.unwrap_or_else(|| panic!("table"));

	assert_eq!(table.header, vec!["a".to_string(), "b".to_string()]);
	assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
}

#[rstest]
#[case::outer_pipes("| a | b |", vec!["a", "b"])]
#[case::no_outer_pipes("a | b", vec!["a", "b"])]
#[case::inner_empty("| a || c |", vec!["a", "", "c"])]
fn split_row_cells(#[case] line: &str, #[case] expected: Vec<&str>) {
	assert_eq!(split_row(line), expected);
}

#[test]
fn separator_with_wrong_cell_count_is_not_a_table() {
	let raw = "| a | b |\n|---|\n| 1 | 2 |";

	assert!(Table::parse(raw.lines()).is_none());
	assert_eq!(convert_table(raw, TableForm::Directive), raw);
}

#[test]
fn grid_form_has_one_line_per_row() {
	let raw = "| Name | Value |\n|---|---|\n| x | 1 |\n| y | 2 |";
	let grid = convert_table(raw, TableForm::Grid);
	let lines: Vec<&str> = grid.lines().collect();

	assert_eq!(
		grid,
		"==== =====\nName Value\n==== =====\nx    1    \ny    2    \n==== ====="
	);
	assert_eq!(lines.len(), 2 + 4);
	assert_eq!(lines[0].len(), lines[1].len());
}

#[test]
fn grid_form_applies_floors_and_caps() {
	let long = "d".repeat(60);
	let table = Table::new(
		vec!["Name".to_string(), "Description".to_string()],
		vec![vec!["x".to_string(), long]],
	);
	let grid = table.to_grid(&[GridColumn::new(20), GridColumn::capped(40, 50)]);
	let lines: Vec<&str> = grid.lines().collect();

	assert_eq!(lines[0], format!("{} {}", "=".repeat(20), "=".repeat(50)));
	assert_eq!(lines[3], format!("{:<20} {}...", "x", "d".repeat(47)));
}

#[rstest]
#[case::plain("abcdefghij", 8, "abcde...")]
#[case::inside_literal("use ``value`` now", 10, "use ...")]
#[case::closed_literal("``ab`` and more text", 12, "``ab`` an...")]
#[case::dangling_escape("abcd\\|efgh", 8, "abcd...")]
#[case::fits("short", 8, "short")]
fn truncate_cell_keeps_markup_closed(#[case] cell: &str, #[case] width: usize, #[case] expected: &str) {
	assert_eq!(truncate_cell(cell, width), expected);
}

#[test]
fn variable_grid_does_not_cut_choice_literals() {
	let variable = VariableSpec {
		name: "tool_state".to_string(),
		var_type: VariableType::String,
		required: false,
		default: None,
		description: "d".repeat(63),
		choices: vec!["present".to_string(), "absent".to_string(), "latest".to_string()],
	};

	let grid = variable_grid(&[variable], 80);
	let row = grid.lines().nth(3).unwrap_or_default();

	assert_eq!(row.matches("``").count() % 2, 0);
	assert!(row.trim_end().ends_with(&format!("{} Choices: ...", "d".repeat(63))));
}

#[test]
fn ragged_rows_render_available_cells() {
	let raw = "| a | b | c |\n|---|---|---|\n| 1 |\n| 1 | 2 | 3 | 4 |";

	assert_eq!(
		convert_table(raw, TableForm::Grid),
		"= = =\na b c\n= = =\n1\n1 2 3 4\n= = ="
	);
	assert_eq!(
		convert_table(raw, TableForm::Directive),
		".. list-table::\n   :header-rows: 1\n   :widths: auto\n\n   * - a\n     - b\n     - c\n   * - \
		 1\n   * - 1\n     - 2\n     - 3\n     - 4"
	);
}

#[rstest]
#[case::directive(TableForm::Directive)]
#[case::grid(TableForm::Grid)]
fn table_without_rows_renders_placeholder(#[case] form: TableForm) {
	assert_eq!(
		convert_table("| a | b |\n|---|---|", form),
		EMPTY_TABLE_PLACEHOLDER
	);
}

#[test]
fn directive_form_with_title_and_widths() {
	let table = Table::new(
		vec!["Platform".to_string(), "Support Level".to_string()],
		vec![vec!["macOS".to_string(), String::new()]],
	);
	let options = ListTableOptions {
		title: Some("Install Support".to_string()),
		widths: ColumnWidths::Fixed(vec![30, 70]),
	};

	assert_eq!(
		table.to_list_table(&options),
		".. list-table:: Install Support\n   :header-rows: 1\n   :widths: 30 70\n\n   * - Platform\n     \
		 - Support Level\n   * - macOS\n     -"
	);
}

// --- Code fence tests ---

#[test]
fn convert_complete_fence() {
	assert_eq!(
		convert_fences("text\n```yaml\nkey: value\n\nother: 1\n```\nafter"),
		"text\n.. code-block:: yaml\n\n   key: value\n\n   other: 1\n\nafter"
	);
}

#[test]
fn convert_fence_without_language() {
	assert_eq!(convert_fences("```\nx\n```"), ".. code-block::\n\n   x\n");
}

#[test]
fn unterminated_fence_keeps_body_as_text() {
	assert_eq!(
		convert_fences("intro\n```bash\necho hi\n## Next"),
		"intro\necho hi\n## Next"
	);
	assert_eq!(
		markdown_to_rst("intro\n```bash\necho hi\n## Next"),
		"intro\necho hi\nNext\n===="
	);
}

// --- Markdown pipeline tests ---

const OVERVIEW_RST: &str = "1. Collection Overview
======================

The collection configures ``developer`` workstations.

.. list-table:: 1. Collection Overview
   :header-rows: 1
   :widths: auto

   * - Platform
     - Status
   * - Ubuntu
     - Supported
   * - Arch Linux
     - Supported";

#[test]
fn markdown_to_rst_converts_section() {
	let section = extract_section(REQUIREMENTS_DOCUMENT, "1. Collection Overview", 2)
		.unwrap_or_else(|| panic!("overview section"));

	assert_eq!(markdown_to_rst(section.content), OVERVIEW_RST);
}

#[test]
fn markdown_to_rst_is_idempotent() {
	assert_eq!(markdown_to_rst(OVERVIEW_RST), OVERVIEW_RST);

	let converted = markdown_to_rst(REQUIREMENTS_DOCUMENT);
	assert_eq!(markdown_to_rst(&converted), converted);
}

#[rstest]
#[case::fence("intro\n\n```bash\necho `date`\n```\n")]
#[case::fence_with_pipes("```text\n| a | b |\n|---|---|\n```")]
#[case::list_table("## Tools\n\n| Tool | Use |\n|---|---|\n| `npm` | packages |")]
#[case::literal_paragraph("Example::\n\n    run `make` | tee log |\n\nDone `here`.")]
fn converted_output_is_stable(#[case] markdown: &str) {
	let once = markdown_to_rst(markdown);

	assert_eq!(markdown_to_rst(&once), once);
}

#[test]
fn converted_fence_body_is_not_reconverted() {
	let once = markdown_to_rst("intro\n\n```bash\necho `date`\n```\n");

	assert_eq!(once, "intro\n\n.. code-block:: bash\n\n   echo `date`");
	assert_eq!(markdown_to_rst(&once), once);
}

#[test]
fn grid_table_passes_through_conversion() {
	let grid = Table::new(
		vec!["Name".to_string(), "Value".to_string()],
		vec![vec!["``x``".to_string(), "a | b".to_string()]],
	)
	.to_grid(&[]);

	assert_eq!(markdown_to_rst(&grid), grid);
}

#[test]
fn markdown_to_rst_converts_table_cells() {
	assert_eq!(
		markdown_to_rst("| Tool | Use |\n|---|---|\n| `npm` | packages |"),
		".. list-table::\n   :header-rows: 1\n   :widths: auto\n\n   * - Tool\n     - Use\n   * - \
		 ``npm``\n     - packages"
	);
}

// --- Requirement mining tests ---

#[test]
fn mine_adjacent_requirements() {
	let records = mine_requirements(
		"**REQ-ABC-001**: Do the thing.\n**REQ-ABC-002**: Do another.",
		DEFAULT_MIN_DESCRIPTION_LENGTH,
	);

	assert_eq!(
		records,
		vec![
			RequirementRecord::new("REQ-ABC-001", "Do the thing."),
			RequirementRecord::new("REQ-ABC-002", "Do another."),
		]
	);
}

#[rstest]
#[case::too_short("**REQ-A-1**: short", vec![])]
#[case::bold_start("**REQ-A-2**: **bold** opening text", vec![])]
#[case::removed("**REQ-A-3**: _Removed: no longer needed", vec![])]
#[case::multi_line(
	"**REQ-A-4**: Keep this line\nand this one\n**Implementation**: tasks/main.yml",
	vec![RequirementRecord::new("REQ-A-4", "Keep this line and this one")]
)]
#[case::blank_line_stop(
	"**REQ-A-5** Described here\n\nUnrelated paragraph",
	vec![RequirementRecord::new("REQ-A-5", "Described here")]
)]
#[case::heading_stop(
	"**REQ-A-6**: Described here too\n### Next",
	vec![RequirementRecord::new("REQ-A-6", "Described here too")]
)]
#[case::code_span(
	"**REQ-A-7**: Use `apt` for packages.",
	vec![RequirementRecord::new("REQ-A-7", "Use ``apt`` for packages.")]
)]
#[case::inline_tail(
	"**REQ-A-8**: Install the tools **Implementation**: via apt",
	vec![RequirementRecord::new("REQ-A-8", "Install the tools")]
)]
#[case::lowercase_category("**REQ-abc-1**: Not an identifier at all", vec![])]
fn mine_requirement_edge_cases(#[case] text: &str, #[case] expected: Vec<RequirementRecord>) {
	assert_eq!(mine_requirements(text, DEFAULT_MIN_DESCRIPTION_LENGTH), expected);
}

#[test]
fn mine_requirements_keeps_duplicates() {
	let records = mine_requirements(
		"**REQ-X-1**: First description here\n**REQ-X-1**: Second description here",
		DEFAULT_MIN_DESCRIPTION_LENGTH,
	);

	assert_eq!(records.len(), 2);
	assert_eq!(records[1].description, "Second description here");
}

#[test]
fn mine_role_requirements_from_section() {
	let records = mine_role_requirements(REQUIREMENTS_DOCUMENT, "nodejs", 10);

	assert_eq!(
		records,
		vec![
			RequirementRecord::new("REQ-NODE-001", "Install Node.js from the upstream repository."),
			RequirementRecord::new("REQ-NODE-002", "Install global npm packages for ``nodejs_user``."),
		]
	);
	assert!(mine_role_requirements(REQUIREMENTS_DOCUMENT, "terminal_config", 10).is_empty());
}

#[rstest]
#[case("REQ-OS-12 trailing", Some("REQ-OS-12"))]
#[case("REQ-OS-", None)]
#[case("REQ--1", None)]
#[case("REQ-os-1", None)]
fn parse_requirement_identifiers(#[case] text: &str, #[case] expected: Option<&str>) {
	assert_eq!(parse_requirement_id(text), expected);
}

// --- Verification mining tests ---

#[test]
fn mine_tagged_verifications() {
	let verifications = mine_verifications(VERIFY_PLAYBOOK);

	assert_eq!(
		verifications,
		vec![
			TestVerification {
				requirement: "REQ-NODE-001".to_string(),
				description: "Node.js is installed".to_string(),
				code: "- name: Check node\n  ansible.builtin.command: node --version\n  register: \
				       node_version\n  changed_when: false\n\n- name: Assert node\n  \
				       ansible.builtin.assert:\n    that:\n      - node_version.rc == 0\n    \
				       success_msg: Node.js is installed"
					.to_string(),
			},
			TestVerification {
				requirement: "REQ-NODE-002".to_string(),
				description: "Test verification".to_string(),
				code: "- name: Assert prefix\n  ansible.builtin.assert:\n    that: true\n    \
				       success_msg: prefix ok"
					.to_string(),
			},
		]
	);
}

#[test]
fn verification_without_assertion_is_ignored() {
	let content = "# REQ-A-1: untested\n- name: Just a command\n  command: true\n";
	assert!(mine_verifications(content).is_empty());
}

// --- Variable model tests ---

#[test]
fn defaults_comments_are_captured() -> AnyEmptyResult {
	let defaults = DefaultsFile::parse(DEFAULTS_MAIN, "defaults/main.yml")?;

	assert_eq!(
		defaults.comment("nodejs_user"),
		Some("User that owns the npm prefix")
	);
	assert_eq!(
		defaults.comment("nodejs_packages"),
		Some("Packages installed globally with npm")
	);
	assert_eq!(defaults.comment("nodejs_version"), None);
	assert_eq!(defaults.values.len(), 4);

	Ok(())
}

#[test]
fn malformed_defaults_are_an_error() {
	let result = DefaultsFile::parse("key: [unclosed", "defaults/main.yml");
	assert!(matches!(result, Err(RoledocError::Yaml { .. })));
}

#[test]
fn specification_takes_precedence_over_defaults() -> AnyEmptyResult {
	let specs: ArgumentSpecsFile = serde_yaml_ng::from_str(ARGUMENT_SPECS)?;
	let defaults = DefaultsFile::parse(DEFAULTS_MAIN, "defaults/main.yml")?;
	let variables = merge_variables(specs.main(), &defaults);

	let names: Vec<&str> = variables.iter().map(|variable| variable.name.as_str()).collect();
	assert_eq!(
		names,
		vec!["nodejs_user", "nodejs_packages", "nodejs_prefix", "nodejs_version"]
	);

	let user = &variables[0];
	assert!(user.required);
	assert_eq!(user.default_display(), "*(required)*");
	assert_eq!(user.description, "User that owns the npm prefix.");

	let packages = &variables[1];
	assert_eq!(packages.var_type.to_string(), "list[string]");
	assert_eq!(packages.default_display(), "``[]``");

	let prefix = &variables[2];
	assert_eq!(prefix.description, "Where npm installs global packages");
	assert_eq!(prefix.default_display(), "``~/.npm-global``");

	let version = &variables[3];
	assert_eq!(version.default_display(), "``20``");
	assert_eq!(
		version.description_display(),
		"Major Node.js version. Choices: ``18``, ``20``."
	);

	Ok(())
}

#[test]
fn defaults_only_variables() -> AnyEmptyResult {
	let defaults = DefaultsFile::parse(DEFAULTS_MAIN, "defaults/main.yml")?;
	let variables = merge_variables(None, &defaults);

	let names: Vec<&str> = variables.iter().map(|variable| variable.name.as_str()).collect();
	assert_eq!(
		names,
		vec!["nodejs_packages", "nodejs_prefix", "nodejs_user", "nodejs_version"]
	);
	assert!(variables.iter().all(|variable| !variable.required));
	assert_eq!(variables[2].default_display(), "*(empty string)*");
	assert_eq!(variables[3].description, NO_DESCRIPTION);

	Ok(())
}

#[rstest]
#[case::string(Some("str"), None, "string")]
#[case::missing(None, None, "string")]
#[case::boolean(Some("bool"), None, "boolean")]
#[case::integer(Some("int"), None, "integer")]
#[case::object(Some("dict"), None, "object")]
#[case::list_default(Some("list"), None, "list[string]")]
#[case::list_of_dicts(Some("list"), Some("dict"), "list[object]")]
#[case::passthrough(Some("path"), None, "path")]
fn ansible_type_names(
	#[case] type_name: Option<&str>,
	#[case] elements: Option<&str>,
	#[case] expected: &str,
) {
	assert_eq!(
		VariableType::from_ansible(type_name, elements).to_string(),
		expected
	);
}

#[rstest]
#[case::boolean("true", "``true``")]
#[case::integer("42", "``42``")]
#[case::string("hello", "``hello``")]
#[case::empty_string("''", "*(empty string)*")]
#[case::list("[a, b]", "``[\"a\",\"b\"]``")]
#[case::mapping("{k: 1}", "``{\"k\":1}``")]
fn default_value_display(#[case] yaml: &str, #[case] expected: &str) -> AnyEmptyResult {
	let variable = VariableSpec {
		name: "example".to_string(),
		var_type: VariableType::String,
		required: false,
		default: Some(serde_yaml_ng::from_str(yaml)?),
		description: String::new(),
		choices: Vec::new(),
	};

	assert_eq!(variable.default_display(), expected);

	Ok(())
}

#[test]
fn narrative_table_filters_by_suffix() -> AnyEmptyResult {
	let specs: ArgumentSpecsFile = serde_yaml_ng::from_str(ARGUMENT_SPECS)?;
	let defaults = DefaultsFile::parse(DEFAULTS_MAIN, "defaults/main.yml")?;
	let variables = merge_variables(specs.main(), &defaults);
	let narrative = NarrativeConfig::default();

	let table = narrative_variable_table(&variables, &narrative);
	assert!(table.starts_with(".. list-table:: Configuration Options\n   :header-rows: 1\n   :widths: 25 15 60"));
	assert!(table.contains("   * - ``nodejs_user``\n     - *(required)*\n     - User that owns the npm prefix."));
	assert!(table.contains("``nodejs_packages``"));
	assert!(table.contains("``nodejs_version``"));
	assert!(!table.contains("nodejs_prefix"));

	let strict = NarrativeConfig {
		variable_suffixes: vec!["_nothing".to_string()],
		..NarrativeConfig::default()
	};
	assert_eq!(narrative_variable_table(&variables, &strict), DEFAULTS_ONLY);
	assert_eq!(narrative_variable_table(&[], &narrative), NO_CONFIGURABLE_VARIABLES);

	Ok(())
}

// --- Config tests ---

#[test]
fn empty_config_uses_defaults() -> AnyEmptyResult {
	let config = RoledocConfig::parse("")?;

	assert_eq!(config.paths.output, PathBuf::from("docs/generated"));
	assert_eq!(
		config.paths.requirements,
		PathBuf::from("docs/SOFTWARE_REQUIREMENTS_DOCUMENT.md")
	);
	assert_eq!(config.output.profile, Profile::Formal);
	assert_eq!(config.output.description_width, 80);
	assert_eq!(config.requirements.min_length, 10);
	assert_eq!(
		config.narrative.variable_suffixes,
		vec!["_user", "_packages", "_version"]
	);

	Ok(())
}

#[test]
fn config_with_capabilities() -> AnyEmptyResult {
	let config = RoledocConfig::parse(
		r#"
[output]
profile = "narrative"

[capabilities.nodejs]
description = "Install Node.js"
title = "Nodejs Development Environment"

[[capabilities.nodejs.capabilities]]
name = "Installation"
user_experience = ["Run `node --version`"]
implementation = "NodeSource"
platforms = [{ name = "Ubuntu", support = "Repository" }, { name = "macOS", support = "Homebrew" }]
"#,
	)?;

	assert_eq!(config.output.profile, Profile::Narrative);
	let nodejs = config.capabilities_for("nodejs");
	assert_eq!(nodejs.title.as_deref(), Some("Nodejs Development Environment"));
	assert_eq!(nodejs.capabilities[0].platforms[1].name, "macOS");

	let fallback = config.capabilities_for("os_configuration");
	assert_eq!(fallback.description, "Os Configuration role functionality");
	assert_eq!(fallback.capabilities[0].name, "Core Functionality");

	Ok(())
}

#[test]
fn invalid_config_is_a_parse_error() {
	let result = RoledocConfig::parse("[output\nprofile = 1");
	assert!(matches!(result, Err(RoledocError::ConfigParse(_))));
}

#[test]
fn config_discovery_order() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), ".config/roledoc.toml", "[requirements]\nmin_length = 3\n");

	assert_eq!(
		RoledocConfig::resolve_path(tmp.path()),
		Some(tmp.path().join(".config/roledoc.toml"))
	);

	write_file(tmp.path(), "roledoc.toml", "[requirements]\nmin_length = 5\n");
	let config = RoledocConfig::load(tmp.path())?.unwrap_or_else(|| panic!("config"));
	assert_eq!(config.requirements.min_length, 5);

	Ok(())
}

#[rstest]
#[case("os_configuration", "Os Configuration")]
#[case("nodejs", "Nodejs")]
#[case("manage_SNAP_packages", "Manage Snap Packages")]
fn title_case_role_names(#[case] name: &str, #[case] expected: &str) {
	assert_eq!(title_case(name), expected);
}

// --- Project tests ---

#[test]
fn scan_project_discovers_sorted_roles() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("zeta", true), ("alpha", true), ("skip_me", true)]);
	write_file(tmp.path(), "roles/.hidden/meta/main.yml", "");
	write_file(tmp.path(), "roles/README.md", "not a role");
	write_file(tmp.path(), "roledoc.toml", "[roles]\nexclude = [\"skip_*\"]\n");

	let project = scan_project(tmp.path())?;
	let names: Vec<&str> = project.roles.iter().map(|role| role.name.as_str()).collect();

	assert_eq!(names, vec!["alpha", "zeta"]);
	assert_eq!(project.collection.qualified_name(), "wolskies.infrastructure");
	assert_eq!(project.collection.version, "1.2.3");
	assert_eq!(project.collection.author.as_deref(), Some("wolskies team"));
	assert!(matches!(
		project.role("missing"),
		Err(RoledocError::RoleNotFound(_))
	));

	Ok(())
}

#[test]
fn missing_roles_directory_is_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let result = scan_project(tmp.path());

	assert!(matches!(result, Err(RoledocError::MissingRolesDir(_))));

	Ok(())
}

#[test]
fn roles_are_discovered_in_configured_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), "roledoc.toml", "[paths]\nroles = \"ansible/roles\"\n");
	write_file(tmp.path(), "ansible/roles/alpha/meta/main.yml", META_MAIN);

	let project = scan_project(tmp.path())?;

	assert_eq!(project.roles_dir(), tmp.path().join("ansible/roles"));
	let names: Vec<&str> = project.roles.iter().map(|role| role.name.as_str()).collect();
	assert_eq!(names, vec!["alpha"]);

	Ok(())
}

#[test]
fn invalid_exclude_pattern_is_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("alpha", true)]);
	write_file(tmp.path(), "roledoc.toml", "[roles]\nexclude = [\"[\"]\n");

	assert!(matches!(
		scan_project(tmp.path()),
		Err(RoledocError::InvalidPattern { .. })
	));

	Ok(())
}

// --- Composer tests ---

#[test]
fn compose_formal_role_document() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("nodejs", true)]);
	let project = scan_project(tmp.path())?;
	let requirements = project.read_requirements()?;

	let document = render_role(
		&project,
		project.role("nodejs")?,
		Profile::Formal,
		requirements.as_deref(),
	)?;

	assert!(document.starts_with("Nodejs Role\n===========\n\nInstall Node.js and npm packages.\n"));
	assert!(document.contains("* Installs Node.js.\n* Manages global npm packages."));
	assert!(document.contains(":Author: Jane Doe\n:License: MIT\n:Minimum Ansible Version: 2.15\n:Galaxy Tags: nodejs, npm"));
	assert!(document.contains("This role provides install Node.js and npm packages."));
	assert!(document.contains(&format!(
		"{:<20} {:<15} {:<10} *(required)*",
		"nodejs_user", "string", "Yes"
	)));
	assert!(document.contains("**REQ-NODE-001**\n   Install Node.js from the upstream repository."));
	assert!(document.contains("* **Ubuntu**: jammy, noble\n* **ArchLinux**: all"));
	assert!(document.contains("* ``base_packages``"));
	assert!(document.contains("       - wolskies.infrastructure.nodejs"));
	assert!(document.ends_with("This role is maintained by Jane Doe.\n"));
	assert!(!document.contains("\n\n\n"));
	assert!(document.lines().all(|line| line.is_empty() || !line.trim().is_empty()));

	Ok(())
}

#[test]
fn formal_profile_requires_specification() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("beta", false)]);
	let project = scan_project(tmp.path())?;

	let result = render_role(&project, project.role("beta")?, Profile::Formal, None);
	assert!(matches!(
		result,
		Err(RoledocError::MissingSpecification { ref role, .. }) if role == "beta"
	));

	Ok(())
}

#[test]
fn compose_narrative_role_document() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("nodejs", false)]);
	let config = RoledocConfig::parse(
		r#"
[capabilities.nodejs]
description = "Install Node.js and manage `npm` packages"
title = "Nodejs Development Environment"

[[capabilities.nodejs.capabilities]]
name = "Zeta Capability"
user_experience = ["Run `node --version`", "Use npm"]
implementation = "NodeSource repository"
platforms = [{ name = "Ubuntu/Debian", support = "NodeSource" }]

[[capabilities.nodejs.capabilities]]
name = "Alpha Capability"
implementation = "npm prefix"
"#,
	)?;
	let project = scan_project_with_config(tmp.path(), config)?;

	let document = render_role(&project, project.role("nodejs")?, Profile::Narrative, None)?;

	assert!(document.starts_with(
		"Nodejs Development Environment\n==============================\n\nInstall Node.js and manage ``npm`` packages\n"
	));
	let zeta = document.find("Zeta Capability\n---------------").unwrap_or_else(|| panic!("zeta"));
	let alpha = document.find("Alpha Capability\n----------------").unwrap_or_else(|| panic!("alpha"));
	assert!(zeta < alpha);
	assert!(document.contains("**What you get**: Run ``node --version``"));
	assert!(document.contains("- Run ``node --version``\n- Use npm"));
	assert!(document.contains("**What you get**: Enhanced functionality"));
	assert!(document.contains(".. list-table:: Zeta Capability Support\n   :header-rows: 1\n   :widths: 30 70"));
	assert!(document.contains("   * - Ubuntu/Debian\n     - NodeSource"));
	assert!(document.contains("**REQ-NODE-001**: Node.js is installed\n\n.. code-block:: yaml\n\n   - name: Check node"));
	assert!(document.contains(".. list-table:: Configuration Options"));
	assert!(document.contains("nodejs_user: \"{{ ansible_user }}\""));
	assert!(document.contains("nodejs_packages:\n             - package1"));
	assert!(document.contains("This role is part of the wolskies.infrastructure collection."));
	assert!(!document.contains("\n\n\n"));

	Ok(())
}

#[test]
fn narrative_profile_uses_fallback_capability() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("os_configuration", false)]);
	let project = scan_project(tmp.path())?;

	let document = render_role(
		&project,
		project.role("os_configuration")?,
		Profile::Narrative,
		None,
	)?;

	assert!(document.starts_with("Os Configuration Role\n=====================\n\nOs Configuration role functionality\n"));
	assert!(document.contains("Core Functionality\n------------------"));
	assert!(document.contains("   * - All platforms\n     - Basic support"));
	assert!(document.contains("# Add your variables here"));

	Ok(())
}

#[test]
fn compose_collection_overview() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("nodejs", true), ("rust", false)]);
	let project = scan_project(tmp.path())?;

	let document = render_collection(&project)?;

	assert!(document.starts_with(
		"wolskies.infrastructure Ansible Collection\n==========================================\n"
	));
	assert!(document.contains(OVERVIEW_RST));
	assert!(document.contains("2. Collection-Wide Requirements\n===============================\n\nAll roles must be idempotent."));
	assert!(document.contains("* **nodejs** - Install Node.js and npm packages."));
	assert!(document.contains("* **rust** - Install Node.js and npm packages"));
	assert!(document.contains(".. code-block:: yaml\n\n   broken: true"));
	assert!(document.contains("- Windows support"));
	assert!(document.contains("ansible-galaxy collection install wolskies.infrastructure"));
	assert!(document.contains("       - wolskies.infrastructure.nodejs\n       - wolskies.infrastructure.rust"));
	assert!(document.contains("* **Ubuntu**: jammy, noble"));
	assert!(!document.contains("3. Role Requirements"));
	assert!(!document.contains("\n\n\n"));

	Ok(())
}

#[test]
fn collection_requires_requirements_document() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_role(tmp.path(), "nodejs", true);
	let project = scan_project(tmp.path())?;

	assert!(matches!(
		render_collection(&project),
		Err(RoledocError::MissingRequirementsDocument(_))
	));

	Ok(())
}

#[test]
fn collection_skips_missing_sections() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("nodejs", true)]);
	write_file(
		tmp.path(),
		"roledoc.toml",
		"[requirements]\nleading_sections = [\"9. Nothing Here\"]\ntrailing_sections = []\n",
	);
	let project = scan_project(tmp.path())?;

	let document = render_collection(&project)?;
	assert!(!document.contains("Collection Overview\n="));
	assert!(document.contains("Roles Overview\n=============="));

	Ok(())
}

// --- Engine tests ---

#[test]
#[traced_test]
fn batch_continues_after_role_failure() {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write_collection(tmp.path(), &[("alpha", true), ("beta", false), ("gamma", true)]);
	let project = scan_project(tmp.path()).unwrap_or_else(|e| panic!("scan: {e}"));

	let report = generate_roles(&project, &GenerateOptions::default())
		.unwrap_or_else(|e| panic!("generate: {e}"));

	assert_eq!(report.generated_count(), 2);
	assert_eq!(report.failed_count(), 1);
	assert!(!report.is_ok());

	let failures: Vec<&str> = report.failures().map(|(role, _)| role).collect();
	assert_eq!(failures, vec!["beta"]);

	let output = tmp.path().join("docs/generated");
	assert!(output.join("role_alpha.rst").is_file());
	assert!(!output.join("role_beta.rst").exists());
	assert!(output.join("role_gamma.rst").is_file());
	assert!(logs_contain("failed to generate role document"));

	let rerun = generate_roles(&project, &GenerateOptions::default())
		.unwrap_or_else(|e| panic!("generate: {e}"));
	assert_eq!(rerun.generated_count(), 0);
	assert_eq!(rerun.skipped_count(), 2);
	assert_eq!(rerun.failed_count(), 1);
}

#[test]
#[traced_test]
fn batch_continues_after_write_failure() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("alpha", true), ("beta", true), ("gamma", true)]);
	let output = tmp.path().join("docs/generated");
	std::fs::create_dir_all(output.join("role_beta.rst"))?;
	let project = scan_project(tmp.path())?;

	let report = generate_roles(&project, &GenerateOptions::default())?;

	assert_eq!(report.generated_count(), 2);
	let failures: Vec<&str> = report.failures().map(|(role, _)| role).collect();
	assert_eq!(failures, vec!["beta"]);
	assert!(matches!(
		report.failures().next(),
		Some((_, RoledocError::Io(_)))
	));
	assert!(output.join("role_alpha.rst").is_file());
	assert!(output.join("role_gamma.rst").is_file());
	assert!(logs_contain("failed to generate role document"));

	Ok(())
}

#[test]
fn generate_single_role_into_custom_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("alpha", true), ("beta", true)]);
	let project = scan_project(tmp.path())?;

	let report = generate_roles(
		&project,
		&GenerateOptions {
			profile: Profile::Narrative,
			role: Some("beta".to_string()),
			output_dir: Some(PathBuf::from("out")),
		},
	)?;

	assert_eq!(report.outcomes.len(), 1);
	assert_eq!(report.outcomes[0].role(), "beta");
	assert!(tmp.path().join("out/role_beta.rst").is_file());
	assert!(!tmp.path().join("out/role_alpha.rst").exists());

	let unknown = generate_roles(
		&project,
		&GenerateOptions {
			role: Some("missing".to_string()),
			..GenerateOptions::default()
		},
	);
	assert!(matches!(unknown, Err(RoledocError::RoleNotFound(_))));

	Ok(())
}

#[test]
fn sphinx_conf_uses_collection_identity() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("alpha", true)]);
	let project = scan_project(tmp.path())?;

	let conf = render_sphinx_conf(&project, 2026)?;

	assert!(conf.contains("project = \"wolskies.infrastructure\"\n"));
	assert!(conf.contains("copyright = \"2026, wolskies team\"\n"));
	assert!(conf.contains("author = \"wolskies team\"\n"));
	assert!(conf.contains("release = \"1.2.3\"\nversion = \"1.2.3\"\n"));
	assert!(conf.contains("html_theme = 'sphinx_rtd_theme'"));

	let path = write_sphinx_conf(&project, None)?;
	assert_eq!(path, tmp.path().join("docs/conf.py"));
	assert!(std::fs::read_to_string(path)?.starts_with("# Configuration file"));

	Ok(())
}

#[test]
fn sphinx_conf_quotes_values() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("alpha", true)]);
	write_file(
		tmp.path(),
		"galaxy.yml",
		"namespace: acme\nname: tools\nversion: 0.1.0\nauthors:\n  - O'Brien \"ops\"\n",
	);
	let project = scan_project(tmp.path())?;

	let conf = render_sphinx_conf(&project, 2026)?;

	assert!(conf.contains("author = \"O'Brien \\\"ops\\\"\"\n"));

	Ok(())
}

#[test]
fn build_info_prefers_ci_variables() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("alpha", true), ("beta", true)]);
	let project = scan_project(tmp.path())?;
	let time = Utc
		.with_ymd_and_hms(2026, 10, 19, 8, 30, 0)
		.single()
		.unwrap_or_else(|| panic!("time"));

	let info = BuildInfo::from_sources(
		&project,
		time,
		|key| {
			match key {
				"GITHUB_SHA" => Some("abc123".to_string()),
				"GITHUB_RUN_ID" => Some("42".to_string()),
				_ => None,
			}
		},
		|| Some("from-git".to_string()),
	);

	assert_eq!(
		info,
		BuildInfo {
			collection: "wolskies.infrastructure".to_string(),
			version: "1.2.3".to_string(),
			build_time: "2026-10-19T08:30:00Z".to_string(),
			commit: "abc123".to_string(),
			pipeline: "42".to_string(),
			roles: vec!["alpha".to_string(), "beta".to_string()],
		}
	);

	let local = BuildInfo::from_sources(&project, time, |_| None, || None);
	assert_eq!(local.commit, "unknown");
	assert_eq!(local.pipeline, "local");

	let yaml = info.to_yaml()?;
	assert!(yaml.contains("collection: wolskies.infrastructure\n"));
	assert!(yaml.contains("roles:\n- alpha\n- beta\n"));

	Ok(())
}

#[test]
fn check_outputs_detects_stale_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("nodejs", true)]);
	let project = scan_project(tmp.path())?;

	let missing = check_outputs(&project, Profile::Formal, None)?;
	assert_eq!(missing.stale.len(), 2);
	assert!(missing.stale.iter().all(|entry| entry.current_content.is_none()));

	generate_roles(&project, &GenerateOptions::default())?;
	generate_collection(&project, None)?;
	let fresh = check_outputs(&project, Profile::Formal, None)?;
	assert!(fresh.is_ok());

	let role_document = tmp.path().join("docs/generated/role_nodejs.rst");
	std::fs::write(&role_document, "outdated\n")?;
	let stale = check_outputs(&project, Profile::Formal, None)?;
	assert_eq!(stale.stale.len(), 1);
	assert_eq!(stale.stale[0].file, role_document);
	assert_eq!(stale.stale[0].current_content.as_deref(), Some("outdated\n"));

	Ok(())
}

#[test]
fn check_outputs_reports_render_errors() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("beta", false)]);
	let project = scan_project(tmp.path())?;

	let result = check_outputs(&project, Profile::Formal, None)?;
	assert!(result.has_errors());
	assert_eq!(result.render_errors[0].unit, "beta");

	Ok(())
}

#[test]
fn malformed_role_yaml_fails_only_that_role() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_collection(tmp.path(), &[("alpha", true), ("broken", true)]);
	write_file(tmp.path(), "roles/broken/meta/main.yml", "galaxy_info: [unclosed");
	let project = scan_project(tmp.path())?;

	let report = generate_roles(&project, &GenerateOptions::default())?;
	assert_eq!(report.generated_count(), 1);

	let (role, error) = report.failures().next().unwrap_or_else(|| panic!("failure"));
	assert_eq!(role, "broken");
	assert!(matches!(error, RoledocError::Yaml { .. }));

	Ok(())
}
