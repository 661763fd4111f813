use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;
use serde_yaml_ng::Mapping;
use serde_yaml_ng::Value;

use crate::RoledocError;
use crate::RoledocResult;
use crate::metadata::EntryPoint;
use crate::metadata::OptionSpec;
use crate::metadata::scalar_to_string;

pub const NO_DESCRIPTION: &str = "No description available";

/// The documented type of a role variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableType {
	String,
	Boolean,
	Integer,
	List(Box<VariableType>),
	Object,
	/// Any other Ansible type name, shown as written.
	Other(String),
}

impl VariableType {
	/// Map an Ansible argument type to its documented name. Lists without an
	/// `elements` entry hold strings.
	pub fn from_ansible(type_name: Option<&str>, elements: Option<&str>) -> Self {
		match type_name.unwrap_or("str") {
			"str" | "string" => Self::String,
			"bool" | "boolean" => Self::Boolean,
			"int" | "integer" => Self::Integer,
			"dict" | "object" => Self::Object,
			"list" => Self::List(Box::new(Self::from_ansible(elements, None))),
			other => Self::Other(other.to_string()),
		}
	}

	/// Infer a type from a YAML default value.
	pub fn infer(value: &Value) -> Self {
		match value {
			Value::Bool(_) => Self::Boolean,
			Value::Number(number) if number.is_i64() || number.is_u64() => Self::Integer,
			Value::Number(_) => Self::Other("float".to_string()),
			Value::Sequence(items) => {
				Self::List(Box::new(items.first().map_or(Self::String, Self::infer)))
			}
			Value::Mapping(_) => Self::Object,
			Value::Tagged(tagged) => Self::infer(&tagged.value),
			Value::Null | Value::String(_) => Self::String,
		}
	}
}

impl Display for VariableType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::String => write!(f, "string"),
			Self::Boolean => write!(f, "boolean"),
			Self::Integer => write!(f, "integer"),
			Self::List(elements) => write!(f, "list[{elements}]"),
			Self::Object => write!(f, "object"),
			Self::Other(name) => write!(f, "{name}"),
		}
	}
}

impl Serialize for VariableType {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

/// One documented role variable, merged from every source that mentions it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSpec {
	pub name: String,
	#[serde(rename = "type")]
	pub var_type: VariableType,
	pub required: bool,
	pub default: Option<Value>,
	pub description: String,
	pub choices: Vec<String>,
}

impl VariableSpec {
	/// `Yes` or `No`.
	pub fn required_label(&self) -> &'static str {
		if self.required { "Yes" } else { "No" }
	}

	/// The default value as an RST cell.
	pub fn default_display(&self) -> String {
		match self.default.as_ref() {
			None | Some(Value::Null) if self.required => "*(required)*".to_string(),
			None | Some(Value::Null) => "*(none)*".to_string(),
			Some(Value::String(text)) if text.is_empty() => "*(empty string)*".to_string(),
			Some(value) => format!("``{}``", value_literal(value)),
		}
	}

	/// The description with the allowed choices appended.
	pub fn description_display(&self) -> String {
		if self.choices.is_empty() {
			return self.description.clone();
		}

		let choices: Vec<String> = self
			.choices
			.iter()
			.map(|choice| format!("``{choice}``"))
			.collect();

		format!("{} Choices: {}.", self.description, choices.join(", "))
	}

	/// Whether the name ends in any of `suffixes`.
	pub fn has_suffix<S: AsRef<str>>(&self, suffixes: &[S]) -> bool {
		suffixes
			.iter()
			.any(|suffix| self.name.ends_with(suffix.as_ref()))
	}
}

/// Render a YAML value on one line: scalars as text, collections in JSON flow
/// style.
pub fn value_literal(value: &Value) -> String {
	if let Some(text) = scalar_to_string(value) {
		return text;
	}

	match value {
		Value::Null => "null".to_string(),
		other => {
			serde_json::to_string(other).unwrap_or_else(|_| {
				serde_yaml_ng::to_string(other)
					.map(|text| text.trim().replace('\n', " "))
					.unwrap_or_default()
			})
		}
	}
}

/// The values of `defaults/main.yml` together with the comments written
/// directly above each top-level key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultsFile {
	/// Top-level entries in file order.
	pub values: Vec<(String, Value)>,
	/// Comment text keyed by variable name.
	pub comments: BTreeMap<String, String>,
}

impl DefaultsFile {
	/// Parse a defaults file. `path` is only used in error messages.
	pub fn parse(content: &str, path: &str) -> RoledocResult<Self> {
		let mapping: Option<Mapping> =
			serde_yaml_ng::from_str(content).map_err(|e| {
				RoledocError::Yaml {
					path: path.to_string(),
					reason: e.to_string(),
				}
			})?;

		let values = mapping
			.unwrap_or_default()
			.into_iter()
			.filter_map(|(key, value)| scalar_to_string(&key).map(|key| (key, value)))
			.collect();

		Ok(Self {
			values,
			comments: capture_comments(content),
		})
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.values
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value)
	}

	pub fn comment(&self, name: &str) -> Option<&str> {
		self.comments.get(name).map(String::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

/// Collect the comment lines directly above each top-level key.
///
/// Comment lines are joined with spaces. Lines that only hold `#` markers or
/// look like `key=value` examples are skipped. Any other non-blank line that
/// is not a top-level key discards the collected comment.
pub fn capture_comments(content: &str) -> BTreeMap<String, String> {
	let mut comments = BTreeMap::new();
	let mut current: Vec<&str> = Vec::new();

	for line in content.lines() {
		let line = line.trim_end();

		if line.starts_with('#') {
			let comment = line.trim_start_matches(['#', ' ']).trim();
			if !comment.is_empty() && !comment.contains('=') {
				current.push(comment);
			}
			continue;
		}

		if let Some(name) = top_level_key(line) {
			if !current.is_empty() {
				comments.insert(name.to_string(), current.join(" "));
			}
			current.clear();
			continue;
		}

		if !line.trim().is_empty() {
			current.clear();
		}
	}

	comments
}

/// The key of an unindented `name: value` line.
fn top_level_key(line: &str) -> Option<&str> {
	let (key, _) = line.split_once(':')?;
	let key = key.trim_end();
	let mut chars = key.chars();
	let first = chars.next()?;

	if !(first.is_ascii_alphabetic() || first == '_') {
		return None;
	}

	chars
		.all(|c| c.is_ascii_alphanumeric() || c == '_')
		.then_some(key)
}

/// Build the variable list for a role.
///
/// The formal specification decides which variables exist and owns their
/// type, required flag, default and description. The defaults file supplies
/// a default only when the specification has none and the variable is not
/// required, and its comment stands in for a missing description. Without a
/// specification every defaults entry becomes an optional variable.
///
/// Variables are sorted required first, then by name.
pub fn merge_variables(specification: Option<&EntryPoint>, defaults: &DefaultsFile) -> Vec<VariableSpec> {
	let mut variables: Vec<VariableSpec> = match specification {
		Some(entry) => {
			entry
				.options
				.iter()
				.map(|(name, option)| from_specification(name, option, defaults))
				.collect()
		}
		None => {
			defaults
				.values
				.iter()
				.map(|(name, value)| from_default(name, value, defaults))
				.collect()
		}
	};

	sort_variables(&mut variables);
	variables
}

/// Required variables first, then by name.
pub fn sort_variables(variables: &mut [VariableSpec]) {
	variables.sort_by(|a, b| {
		b.required
			.cmp(&a.required)
			.then_with(|| a.name.cmp(&b.name))
	});
}

fn from_specification(name: &str, option: &OptionSpec, defaults: &DefaultsFile) -> VariableSpec {
	let default = option
		.default
		.clone()
		.filter(|value| !value.is_null())
		.or_else(|| {
			if option.required {
				None
			} else {
				defaults.get(name).filter(|value| !value.is_null()).cloned()
			}
		});

	let description = option
		.description
		.as_ref()
		.map(|description| description.to_single_line())
		.filter(|text| !text.is_empty())
		.or_else(|| defaults.comment(name).map(ToString::to_string))
		.unwrap_or_else(|| NO_DESCRIPTION.to_string());

	VariableSpec {
		name: name.to_string(),
		var_type: VariableType::from_ansible(option.type_name.as_deref(), option.elements.as_deref()),
		required: option.required,
		default,
		description,
		choices: option.choices.iter().map(value_literal).collect(),
	}
}

fn from_default(name: &str, value: &Value, defaults: &DefaultsFile) -> VariableSpec {
	VariableSpec {
		name: name.to_string(),
		var_type: VariableType::infer(value),
		required: false,
		default: (!value.is_null()).then(|| value.clone()),
		description: defaults
			.comment(name)
			.map_or_else(|| NO_DESCRIPTION.to_string(), ToString::to_string),
		choices: Vec::new(),
	}
}
