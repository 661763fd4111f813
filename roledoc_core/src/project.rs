use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::RoledocError;
use crate::RoledocResult;
use crate::config::RoledocConfig;
use crate::metadata::GalaxyManifest;
use crate::metadata::license_text;
use crate::sources::load_yaml;

/// Used when neither the config nor `galaxy.yml` sets a version.
pub const DEFAULT_COLLECTION_VERSION: &str = "0.0.0";

/// A role directory under the roles path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleInfo {
	pub name: String,
	pub path: PathBuf,
}

/// The collection a project builds documentation for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionIdentity {
	pub namespace: Option<String>,
	pub name: String,
	pub version: String,
	pub description: Option<String>,
	pub author: Option<String>,
	pub license: Option<String>,
}

impl CollectionIdentity {
	/// `namespace.name`, or just the name when there is no namespace.
	pub fn qualified_name(&self) -> String {
		match &self.namespace {
			Some(namespace) => format!("{namespace}.{}", self.name),
			None => self.name.clone(),
		}
	}

	/// The fully qualified name of a role in this collection.
	pub fn role_reference(&self, role: &str) -> String {
		format!("{}.{role}", self.qualified_name())
	}
}

/// A scanned project, ready for generation.
#[derive(Debug, Clone)]
pub struct ProjectContext {
	pub root: PathBuf,
	pub config: RoledocConfig,
	pub collection: CollectionIdentity,
	/// Discovered roles, sorted by name.
	pub roles: Vec<RoleInfo>,
}

impl ProjectContext {
	/// Look up a discovered role by name.
	pub fn role(&self, name: &str) -> RoledocResult<&RoleInfo> {
		self.roles
			.iter()
			.find(|role| role.name == name)
			.ok_or_else(|| RoledocError::RoleNotFound(name.to_string()))
	}

	/// The directory holding one subdirectory per role.
	pub fn roles_dir(&self) -> PathBuf {
		self.root.join(&self.config.paths.roles)
	}

	pub fn requirements_path(&self) -> PathBuf {
		self.root.join(&self.config.paths.requirements)
	}

	/// The output directory, using `override_dir` when given. Relative paths
	/// resolve against the project root.
	pub fn output_dir(&self, override_dir: Option<&Path>) -> PathBuf {
		self.root
			.join(override_dir.unwrap_or(self.config.paths.output.as_path()))
	}

	/// Read the requirements document, or `None` when it does not exist.
	pub fn read_requirements(&self) -> RoledocResult<Option<String>> {
		let path = self.requirements_path();
		if !path.is_file() {
			tracing::debug!(path = %path.display(), "requirements document not found");
			return Ok(None);
		}

		Ok(Some(std::fs::read_to_string(path)?))
	}
}

/// Scan the project at `root`: load `roledoc.toml` and `galaxy.yml` when
/// present and list the role directories.
///
/// A missing roles directory is an error. Hidden directories and names
/// matching `[roles] exclude` are skipped.
pub fn scan_project(root: &Path) -> RoledocResult<ProjectContext> {
	let config = RoledocConfig::load(root)?.unwrap_or_default();
	scan_project_with_config(root, config)
}

/// Scan with an already loaded configuration.
pub fn scan_project_with_config(root: &Path, config: RoledocConfig) -> RoledocResult<ProjectContext> {
	let galaxy: GalaxyManifest = load_yaml(&root.join(&config.paths.galaxy))?.unwrap_or_default();
	let collection = resolve_collection(root, &config, galaxy);
	let mut project = ProjectContext {
		root: root.to_path_buf(),
		config,
		collection,
		roles: Vec::new(),
	};
	project.roles = discover_roles(&project.roles_dir(), &project.config)?;

	tracing::debug!(
		collection = %project.collection.qualified_name(),
		roles = project.roles.len(),
		"scanned project"
	);

	Ok(project)
}

fn resolve_collection(root: &Path, config: &RoledocConfig, galaxy: GalaxyManifest) -> CollectionIdentity {
	let settings = &config.collection;
	let fallback_name = root
		.canonicalize()
		.ok()
		.and_then(|path| path.file_name().map(|name| name.to_string_lossy().to_string()))
		.unwrap_or_else(|| "collection".to_string());

	CollectionIdentity {
		namespace: settings.namespace.clone().or(galaxy.namespace),
		name: settings.name.clone().or(galaxy.name).unwrap_or(fallback_name),
		version: settings
			.version
			.clone()
			.or(galaxy.version)
			.unwrap_or_else(|| DEFAULT_COLLECTION_VERSION.to_string()),
		description: settings.description.clone().or(galaxy.description),
		author: settings
			.author
			.clone()
			.or_else(|| galaxy.authors.first().cloned()),
		license: settings
			.license
			.clone()
			.or_else(|| galaxy.license.as_ref().and_then(license_text)),
	}
}

fn discover_roles(roles_dir: &Path, config: &RoledocConfig) -> RoledocResult<Vec<RoleInfo>> {
	if !roles_dir.is_dir() {
		return Err(RoledocError::MissingRolesDir(roles_dir.display().to_string()));
	}

	let exclude = config.roles.exclude_set()?;
	let mut roles = Vec::new();

	for entry in std::fs::read_dir(roles_dir)? {
		let entry = entry?;
		let path = entry.path();
		if !path.is_dir() {
			continue;
		}

		let name = entry.file_name().to_string_lossy().to_string();
		if name.starts_with('.') || exclude.is_match(&name) {
			tracing::debug!(role = %name, "skipping role directory");
			continue;
		}

		roles.push(RoleInfo { name, path });
	}

	roles.sort_by(|a, b| a.name.cmp(&b.name));
	Ok(roles)
}
