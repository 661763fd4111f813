use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_yaml_ng::Value;

pub const DEFAULT_AUTHOR: &str = "Unknown";
pub const DEFAULT_LICENSE: &str = "MIT";
pub const DEFAULT_MIN_ANSIBLE_VERSION: &str = "2.15";

/// The parsed contents of `meta/main.yml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaFile {
	#[serde(default)]
	pub galaxy_info: GalaxyInfo,
	#[serde(default)]
	pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalaxyInfo {
	pub author: Option<String>,
	pub description: Option<String>,
	/// Either a single license or a list of them.
	pub license: Option<Value>,
	pub min_ansible_version: Option<Value>,
	#[serde(default)]
	pub galaxy_tags: Vec<String>,
	#[serde(default)]
	pub platforms: Vec<PlatformEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformEntry {
	pub name: Option<String>,
	#[serde(default)]
	pub versions: Vec<Value>,
}

/// A role dependency, either a bare name or a mapping with `role` or `name`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
	Name(String),
	Entry {
		role: Option<String>,
		name: Option<String>,
	},
}

impl Dependency {
	pub fn name(&self) -> &str {
		match self {
			Self::Name(name) => name,
			Self::Entry { role, name } => role.as_deref().or(name.as_deref()).unwrap_or("Unknown"),
		}
	}
}

/// The parsed contents of `meta/argument_specs.yml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArgumentSpecsFile {
	#[serde(default)]
	pub argument_specs: BTreeMap<String, EntryPoint>,
}

impl ArgumentSpecsFile {
	/// The `main` entry point, which documents the role's variables.
	pub fn main(&self) -> Option<&EntryPoint> {
		self.argument_specs.get("main")
	}
}

/// One entry point of an argument specification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPoint {
	pub short_description: Option<String>,
	pub description: Option<Description>,
	#[serde(default)]
	pub options: BTreeMap<String, OptionSpec>,
}

/// A single documented variable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionSpec {
	#[serde(rename = "type")]
	pub type_name: Option<String>,
	pub elements: Option<String>,
	#[serde(default)]
	pub required: bool,
	pub default: Option<Value>,
	pub description: Option<Description>,
	#[serde(default)]
	pub choices: Vec<Value>,
}

/// Ansible accepts a description as one string or as a list of paragraphs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Description {
	Text(String),
	Lines(Vec<String>),
}

impl Description {
	/// All paragraphs joined into one line with collapsed whitespace.
	pub fn to_single_line(&self) -> String {
		let joined = match self {
			Self::Text(text) => text.clone(),
			Self::Lines(lines) => lines.join(" "),
		};

		joined.split_whitespace().collect::<Vec<_>>().join(" ")
	}

	/// A single paragraph as-is, several paragraphs as a bullet list.
	pub fn to_block(&self) -> String {
		match self {
			Self::Text(text) => text.trim().to_string(),
			Self::Lines(lines) if lines.len() == 1 => lines[0].trim().to_string(),
			Self::Lines(lines) => {
				lines
					.iter()
					.map(|line| format!("* {}", line.trim()))
					.collect::<Vec<_>>()
					.join("\n")
			}
		}
	}
}

/// The parsed contents of a collection's `galaxy.yml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalaxyManifest {
	pub namespace: Option<String>,
	pub name: Option<String>,
	pub version: Option<String>,
	pub description: Option<String>,
	#[serde(default)]
	pub authors: Vec<String>,
	/// Either a single license or a list of them.
	pub license: Option<Value>,
}

/// A platform and the versions a role supports on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
	pub name: String,
	pub versions: Vec<String>,
}

/// The metadata fields used when composing a role document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleMetadata {
	pub author: String,
	pub license: String,
	pub min_ansible_version: String,
	/// `galaxy_info.description` from `meta/main.yml`.
	pub description: Option<String>,
	/// `short_description` of the `main` argument specification.
	pub short_description: Option<String>,
	/// `description` of the `main` argument specification, as a block.
	pub long_description: Option<String>,
	pub galaxy_tags: Vec<String>,
	pub platforms: Vec<Platform>,
	pub dependencies: Vec<String>,
}

impl RoleMetadata {
	/// Combine `meta/main.yml` with the `main` argument specification. Missing
	/// fields fall back to `author` and `license`, then to built-in defaults.
	pub fn new(
		meta: &MetaFile,
		specification: Option<&EntryPoint>,
		fallback_author: Option<&str>,
		fallback_license: Option<&str>,
	) -> Self {
		let info = &meta.galaxy_info;

		Self {
			author: info
				.author
				.clone()
				.or_else(|| fallback_author.map(ToString::to_string))
				.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
			license: info
				.license
				.as_ref()
				.and_then(license_text)
				.or_else(|| fallback_license.map(ToString::to_string))
				.unwrap_or_else(|| DEFAULT_LICENSE.to_string()),
			min_ansible_version: info
				.min_ansible_version
				.as_ref()
				.and_then(scalar_to_string)
				.unwrap_or_else(|| DEFAULT_MIN_ANSIBLE_VERSION.to_string()),
			description: non_empty(info.description.as_deref()),
			short_description: non_empty(
				specification.and_then(|spec| spec.short_description.as_deref()),
			),
			long_description: specification
				.and_then(|spec| spec.description.as_ref())
				.map(Description::to_block)
				.filter(|block| !block.is_empty()),
			galaxy_tags: info.galaxy_tags.clone(),
			platforms: info
				.platforms
				.iter()
				.map(|platform| {
					Platform {
						name: platform
							.name
							.clone()
							.unwrap_or_else(|| "Unknown".to_string()),
						versions: platform.versions.iter().filter_map(scalar_to_string).collect(),
					}
				})
				.collect(),
			dependencies: meta
				.dependencies
				.iter()
				.map(|dependency| dependency.name().to_string())
				.collect(),
		}
	}

	/// The one-line summary used under the document title.
	pub fn summary(&self) -> Option<&str> {
		self.short_description
			.as_deref()
			.or(self.description.as_deref())
	}
}

/// Render a YAML scalar as text. Sequences, mappings and null have no scalar
/// form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Number(number) => Some(number.to_string()),
		Value::Tagged(tagged) => scalar_to_string(&tagged.value),
		Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
	}
}

/// A license field may be a single string or a list of strings.
pub fn license_text(value: &Value) -> Option<String> {
	match value {
		Value::Sequence(items) => {
			let names: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
			(!names.is_empty()).then(|| names.join(", "))
		}
		other => scalar_to_string(other),
	}
}

fn non_empty(text: Option<&str>) -> Option<String> {
	text.map(str::trim)
		.filter(|text| !text.is_empty())
		.map(ToString::to_string)
}
