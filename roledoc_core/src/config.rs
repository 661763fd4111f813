use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use serde::Deserialize;
use serde::Serialize;

use crate::RoledocError;
use crate::RoledocResult;
use crate::requirements::DEFAULT_MIN_DESCRIPTION_LENGTH;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["roledoc.toml", ".roledoc.toml", ".config/roledoc.toml"];

pub const DEFAULT_ROLES_DIR: &str = "roles";
pub const DEFAULT_REQUIREMENTS_DOCUMENT: &str = "docs/SOFTWARE_REQUIREMENTS_DOCUMENT.md";
pub const DEFAULT_OUTPUT_DIR: &str = "docs/generated";
pub const DEFAULT_GALAXY_FILE: &str = "galaxy.yml";
pub const DEFAULT_DESCRIPTION_WIDTH: usize = 80;
pub const DEFAULT_NARRATIVE_DESCRIPTION_WIDTH: usize = 50;
pub const DEFAULT_MAX_VERIFICATIONS: usize = 3;
pub const DEFAULT_VARIABLE_SUFFIXES: [&str; 3] = ["_user", "_packages", "_version"];
pub const DEFAULT_LEADING_SECTIONS: [&str; 2] =
	["1. Collection Overview", "2. Collection-Wide Requirements"];
pub const DEFAULT_TRAILING_SECTIONS: [&str; 2] =
	["4. Known Issues and Limitations", "5. Future Requirements"];

/// The content written by `roledoc init`.
pub const SAMPLE_CONFIG: &str = r#"# roledoc configuration

[collection]
# Overrides the values read from galaxy.yml.
# namespace = "my_namespace"
# name = "my_collection"

[paths]
roles = "roles"
requirements = "docs/SOFTWARE_REQUIREMENTS_DOCUMENT.md"
output = "docs/generated"

[output]
profile = "formal"
description_width = 80

[requirements]
min_length = 10

[narrative]
variable_suffixes = ["_user", "_packages", "_version"]

[roles]
exclude = []

# [capabilities.my_role]
# description = "What the role gives its users"
#
# [[capabilities.my_role.capabilities]]
# name = "Core Functionality"
# user_experience = ["Provides essential functionality"]
# implementation = "Standard Ansible modules"
# platforms = [{ name = "All platforms", support = "Supported" }]
"#;

/// The layout of a role document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
	/// Overview fields, a grid variable table, formal requirements and
	/// platform support.
	#[default]
	Formal,
	/// Capability sections, tested behaviour and a condensed variable table.
	Narrative,
}

impl std::fmt::Display for Profile {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Formal => write!(f, "formal"),
			Self::Narrative => write!(f, "narrative"),
		}
	}
}

/// Configuration loaded from a `roledoc.toml` file.
///
/// ```toml
/// [collection]
/// namespace = "wolskies"
/// name = "infrastructure"
///
/// [paths]
/// roles = "roles"
/// requirements = "docs/SOFTWARE_REQUIREMENTS_DOCUMENT.md"
/// output = "docs/generated"
///
/// [output]
/// profile = "narrative"
///
/// [roles]
/// exclude = ["deprecated_*"]
///
/// [capabilities.nodejs]
/// description = "Install Node.js and manage npm packages"
///
/// [[capabilities.nodejs.capabilities]]
/// name = "Cross-Platform Node.js Installation"
/// user_experience = ["Run `node --version` and get modern Node.js"]
/// implementation = "Platform-specific repositories"
/// platforms = [{ name = "Ubuntu/Debian", support = "NodeSource repository" }]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoledocConfig {
	#[serde(default)]
	pub collection: CollectionConfig,
	#[serde(default)]
	pub paths: PathsConfig,
	#[serde(default)]
	pub output: OutputConfig,
	#[serde(default)]
	pub requirements: RequirementsConfig,
	#[serde(default)]
	pub narrative: NarrativeConfig,
	#[serde(default)]
	pub roles: RolesConfig,
	/// Narrative content keyed by role name.
	#[serde(default)]
	pub capabilities: BTreeMap<String, RoleCapabilities>,
}

/// Collection identity and document-wide fallbacks. Every field overrides
/// the matching `galaxy.yml` value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionConfig {
	pub namespace: Option<String>,
	pub name: Option<String>,
	pub version: Option<String>,
	pub description: Option<String>,
	/// Used for roles whose metadata has no author.
	pub author: Option<String>,
	/// Used for roles whose metadata has no license.
	pub license: Option<String>,
}

/// Input and output locations, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
	#[serde(default = "default_roles_dir")]
	pub roles: PathBuf,
	#[serde(default = "default_requirements_document")]
	pub requirements: PathBuf,
	#[serde(default = "default_output_dir")]
	pub output: PathBuf,
	#[serde(default = "default_galaxy_file")]
	pub galaxy: PathBuf,
}

impl Default for PathsConfig {
	fn default() -> Self {
		Self {
			roles: default_roles_dir(),
			requirements: default_requirements_document(),
			output: default_output_dir(),
			galaxy: default_galaxy_file(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
	#[serde(default)]
	pub profile: Profile,
	/// Maximum width of the description column in grid variable tables.
	#[serde(default = "default_description_width")]
	pub description_width: usize,
}

impl Default for OutputConfig {
	fn default() -> Self {
		Self {
			profile: Profile::default(),
			description_width: default_description_width(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequirementsConfig {
	/// Mined descriptions shorter than this are dropped.
	#[serde(default = "default_min_length")]
	pub min_length: usize,
	/// Level-2 sections of the requirements document placed before the roles
	/// overview of the collection document.
	#[serde(default = "default_leading_sections")]
	pub leading_sections: Vec<String>,
	/// Level-2 sections placed after the roles overview.
	#[serde(default = "default_trailing_sections")]
	pub trailing_sections: Vec<String>,
}

impl Default for RequirementsConfig {
	fn default() -> Self {
		Self {
			min_length: default_min_length(),
			leading_sections: default_leading_sections(),
			trailing_sections: default_trailing_sections(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarrativeConfig {
	/// Only variables ending in one of these suffixes are listed.
	#[serde(default = "default_variable_suffixes")]
	pub variable_suffixes: Vec<String>,
	/// How many test verifications to show.
	#[serde(default = "default_max_verifications")]
	pub max_verifications: usize,
	/// Descriptions longer than this are truncated.
	#[serde(default = "default_narrative_description_width")]
	pub description_width: usize,
}

impl Default for NarrativeConfig {
	fn default() -> Self {
		Self {
			variable_suffixes: default_variable_suffixes(),
			max_verifications: default_max_verifications(),
			description_width: default_narrative_description_width(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolesConfig {
	/// Glob patterns matched against role directory names.
	#[serde(default)]
	pub exclude: Vec<String>,
}

impl RolesConfig {
	pub fn exclude_set(&self) -> RoledocResult<GlobSet> {
		let mut builder = GlobSetBuilder::new();

		for pattern in &self.exclude {
			let glob = Glob::new(pattern).map_err(|e| {
				RoledocError::InvalidPattern {
					pattern: pattern.clone(),
					reason: e.to_string(),
				}
			})?;
			builder.add(glob);
		}

		builder.build().map_err(|e| {
			RoledocError::InvalidPattern {
				pattern: self.exclude.join(", "),
				reason: e.to_string(),
			}
		})
	}
}

/// Narrative content for one role.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoleCapabilities {
	pub description: String,
	/// Replaces the generated document title.
	pub title: Option<String>,
	#[serde(default)]
	pub capabilities: Vec<Capability>,
}

impl RoleCapabilities {
	/// Used for roles without configured capabilities.
	pub fn fallback(role: &str) -> Self {
		Self {
			description: format!("{} role functionality", title_case(role)),
			title: None,
			capabilities: vec![Capability {
				name: "Core Functionality".to_string(),
				user_experience: vec!["Provides essential functionality".to_string()],
				implementation: "Standard Ansible modules".to_string(),
				platforms: vec![PlatformSupport {
					name: "All platforms".to_string(),
					support: "Basic support".to_string(),
				}],
			}],
		}
	}
}

/// A user-facing behaviour of a role.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Capability {
	pub name: String,
	#[serde(default)]
	pub user_experience: Vec<String>,
	#[serde(default)]
	pub implementation: String,
	/// Platform support in declaration order.
	#[serde(default)]
	pub platforms: Vec<PlatformSupport>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlatformSupport {
	pub name: String,
	pub support: String,
}

impl RoledocConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> RoledocResult<Option<RoledocConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	pub fn parse(content: &str) -> RoledocResult<RoledocConfig> {
		toml::from_str(content).map_err(|e| RoledocError::ConfigParse(e.to_string()))
	}

	/// Narrative content for `role`, or the generic fallback.
	pub fn capabilities_for(&self, role: &str) -> RoleCapabilities {
		self.capabilities
			.get(role)
			.cloned()
			.unwrap_or_else(|| RoleCapabilities::fallback(role))
	}
}

/// `os_configuration` becomes `Os Configuration`.
pub fn title_case(name: &str) -> String {
	name.split(['_', ' '])
		.filter(|word| !word.is_empty())
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => {
					first
						.to_uppercase()
						.chain(chars.flat_map(char::to_lowercase))
						.collect::<String>()
				}
				None => String::new(),
			}
		})
		.collect::<Vec<String>>()
		.join(" ")
}

fn default_roles_dir() -> PathBuf {
	PathBuf::from(DEFAULT_ROLES_DIR)
}

fn default_requirements_document() -> PathBuf {
	PathBuf::from(DEFAULT_REQUIREMENTS_DOCUMENT)
}

fn default_output_dir() -> PathBuf {
	PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_galaxy_file() -> PathBuf {
	PathBuf::from(DEFAULT_GALAXY_FILE)
}

fn default_description_width() -> usize {
	DEFAULT_DESCRIPTION_WIDTH
}

fn default_narrative_description_width() -> usize {
	DEFAULT_NARRATIVE_DESCRIPTION_WIDTH
}

fn default_min_length() -> usize {
	DEFAULT_MIN_DESCRIPTION_LENGTH
}

fn default_max_verifications() -> usize {
	DEFAULT_MAX_VERIFICATIONS
}

fn default_variable_suffixes() -> Vec<String> {
	DEFAULT_VARIABLE_SUFFIXES.iter().map(ToString::to_string).collect()
}

fn default_leading_sections() -> Vec<String> {
	DEFAULT_LEADING_SECTIONS.iter().map(ToString::to_string).collect()
}

fn default_trailing_sections() -> Vec<String> {
	DEFAULT_TRAILING_SECTIONS.iter().map(ToString::to_string).collect()
}
