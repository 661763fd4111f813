use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use chrono::DateTime;
use chrono::Datelike;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::Serialize;

use crate::RoledocError;
use crate::RoledocResult;
use crate::compose::RoleSummary;
use crate::compose::compose_collection;
use crate::compose::compose_role;
use crate::config::Profile;
use crate::metadata::RoleMetadata;
use crate::project::ProjectContext;
use crate::project::RoleInfo;
use crate::sources::RoleSources;
use crate::templates::SPHINX_CONF_TEMPLATE;
use crate::templates::render_template;

pub const COLLECTION_DOCUMENT: &str = "collection_overview.rst";
pub const BUILD_INFO_FILE: &str = "build_info.yml";
pub const SPHINX_CONF_FILE: &str = "conf.py";
/// Where `conf.py` goes when no directory is given, relative to the root.
pub const DEFAULT_SPHINX_DIR: &str = "docs";

/// File name of the generated document for `role`.
pub fn role_document_name(role: &str) -> String {
	format!("role_{role}.rst")
}

/// What happened to one role during a batch.
#[derive(Debug)]
pub enum RoleOutcome {
	/// The document was written.
	Generated { role: String, path: PathBuf },
	/// The document on disk already had the generated content.
	Skipped { role: String, path: PathBuf },
	/// The role could not be documented. Other roles are unaffected.
	Failed { role: String, error: RoledocError },
}

impl RoleOutcome {
	pub fn role(&self) -> &str {
		match self {
			Self::Generated { role, .. } | Self::Skipped { role, .. } | Self::Failed { role, .. } => {
				role
			}
		}
	}

	pub fn is_failed(&self) -> bool {
		matches!(self, Self::Failed { .. })
	}
}

/// Outcomes of a batch, in role order.
#[derive(Debug, Default)]
pub struct BatchReport {
	pub outcomes: Vec<RoleOutcome>,
}

impl BatchReport {
	/// Returns true if no role failed.
	pub fn is_ok(&self) -> bool {
		!self.outcomes.iter().any(RoleOutcome::is_failed)
	}

	pub fn generated_count(&self) -> usize {
		self.outcomes
			.iter()
			.filter(|outcome| matches!(outcome, RoleOutcome::Generated { .. }))
			.count()
	}

	pub fn skipped_count(&self) -> usize {
		self.outcomes
			.iter()
			.filter(|outcome| matches!(outcome, RoleOutcome::Skipped { .. }))
			.count()
	}

	pub fn failed_count(&self) -> usize {
		self.outcomes.iter().filter(|outcome| outcome.is_failed()).count()
	}

	pub fn failures(&self) -> impl Iterator<Item = (&str, &RoledocError)> {
		self.outcomes.iter().filter_map(|outcome| {
			match outcome {
				RoleOutcome::Failed { role, error } => Some((role.as_str(), error)),
				_ => None,
			}
		})
	}
}

/// Options for a role batch.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
	pub profile: Profile,
	/// Only this role; every discovered role when `None`.
	pub role: Option<String>,
	/// Overrides the configured output directory.
	pub output_dir: Option<PathBuf>,
}

/// Render one role's document without writing it.
pub fn render_role(
	project: &ProjectContext,
	role: &RoleInfo,
	profile: Profile,
	requirements_document: Option<&str>,
) -> RoledocResult<String> {
	let sources = RoleSources::load(role)?;
	compose_role(&role.name, &sources, profile, project, requirements_document)
}

/// Generate role documents into the output directory.
///
/// Per-role problems, including a document that cannot be written, become
/// [`RoleOutcome::Failed`] and the batch carries on.
/// An unknown role name or an output directory that cannot be created ends
/// the batch with an error.
pub fn generate_roles(project: &ProjectContext, options: &GenerateOptions) -> RoledocResult<BatchReport> {
	let roles: Vec<&RoleInfo> = match &options.role {
		Some(name) => vec![project.role(name)?],
		None => project.roles.iter().collect(),
	};

	let output_dir = project.output_dir(options.output_dir.as_deref());
	std::fs::create_dir_all(&output_dir)?;

	let requirements = project.read_requirements()?;
	let mut report = BatchReport::default();

	for role in roles {
		let path = output_dir.join(role_document_name(&role.name));
		let outcome = match render_role(project, role, options.profile, requirements.as_deref())
			.and_then(|document| write_if_changed(&role.name, &path, &document))
		{
			Ok(outcome) => outcome,
			Err(error) => {
				tracing::warn!(role = %role.name, %error, "failed to generate role document");
				RoleOutcome::Failed {
					role: role.name.clone(),
					error,
				}
			}
		};

		report.outcomes.push(outcome);
	}

	Ok(report)
}

fn write_if_changed(role: &str, path: &Path, document: &str) -> RoledocResult<RoleOutcome> {
	if std::fs::read_to_string(path).is_ok_and(|current| current == document) {
		tracing::debug!(role, path = %path.display(), "role document is up to date");
		return Ok(RoleOutcome::Skipped {
			role: role.to_string(),
			path: path.to_path_buf(),
		});
	}

	std::fs::write(path, document)?;
	tracing::info!(role, path = %path.display(), "generated role document");

	Ok(RoleOutcome::Generated {
		role: role.to_string(),
		path: path.to_path_buf(),
	})
}

/// Summaries of every discovered role for the collection overview. A role
/// whose metadata cannot be read is listed without a description.
pub fn role_summaries(project: &ProjectContext) -> Vec<RoleSummary> {
	project
		.roles
		.iter()
		.map(|role| {
			match RoleSources::load(role) {
				Ok(sources) => {
					let metadata = RoleMetadata::new(
						&sources.meta,
						sources.specification.as_ref(),
						None,
						None,
					);
					RoleSummary::new(&role.name, Some(&metadata))
				}
				Err(error) => {
					tracing::warn!(role = %role.name, %error, "failed to read role metadata");
					RoleSummary::new(&role.name, None)
				}
			}
		})
		.collect()
}

/// Render the collection overview. The requirements document is required.
pub fn render_collection(project: &ProjectContext) -> RoledocResult<String> {
	let Some(requirements) = project.read_requirements()? else {
		return Err(RoledocError::MissingRequirementsDocument(
			project.requirements_path().display().to_string(),
		));
	};

	compose_collection(project, &requirements, &role_summaries(project))
}

/// Write the collection overview and return its path.
pub fn generate_collection(project: &ProjectContext, output_dir: Option<&Path>) -> RoledocResult<PathBuf> {
	let document = render_collection(project)?;
	let output_dir = project.output_dir(output_dir);
	std::fs::create_dir_all(&output_dir)?;

	let path = output_dir.join(COLLECTION_DOCUMENT);
	std::fs::write(&path, document)?;
	tracing::info!(path = %path.display(), "generated collection overview");

	Ok(path)
}

/// Metadata describing a documentation build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
	pub collection: String,
	pub version: String,
	/// RFC 3339, UTC, whole seconds.
	pub build_time: String,
	pub commit: String,
	pub pipeline: String,
	pub roles: Vec<String>,
}

impl BuildInfo {
	/// Gather build metadata from the process environment and git.
	pub fn collect(project: &ProjectContext) -> Self {
		Self::from_sources(
			project,
			Utc::now(),
			|key| std::env::var(key).ok(),
			|| git_head(&project.root),
		)
	}

	/// Build metadata from explicit sources.
	///
	/// The commit is `CI_COMMIT_SHA`, then `GITHUB_SHA`, then `git_head`, then
	/// `unknown`. The pipeline is `CI_PIPELINE_ID`, then `GITHUB_RUN_ID`, then
	/// `local`.
	pub fn from_sources(
		project: &ProjectContext,
		build_time: DateTime<Utc>,
		env: impl Fn(&str) -> Option<String>,
		git_head: impl FnOnce() -> Option<String>,
	) -> Self {
		let lookup = |keys: &[&str]| {
			keys.iter()
				.find_map(|key| env(key).filter(|value| !value.trim().is_empty()))
		};

		Self {
			collection: project.collection.qualified_name(),
			version: project.collection.version.clone(),
			build_time: build_time.to_rfc3339_opts(SecondsFormat::Secs, true),
			commit: lookup(&["CI_COMMIT_SHA", "GITHUB_SHA"])
				.or_else(git_head)
				.unwrap_or_else(|| "unknown".to_string()),
			pipeline: lookup(&["CI_PIPELINE_ID", "GITHUB_RUN_ID"])
				.unwrap_or_else(|| "local".to_string()),
			roles: project.roles.iter().map(|role| role.name.clone()).collect(),
		}
	}

	pub fn to_yaml(&self) -> RoledocResult<String> {
		serde_yaml_ng::to_string(self).map_err(|e| RoledocError::BuildInfo(e.to_string()))
	}
}

/// Write `build_info.yml` and return its path.
pub fn write_build_info(project: &ProjectContext, output_dir: Option<&Path>) -> RoledocResult<PathBuf> {
	let info = BuildInfo::collect(project);
	let output_dir = project.output_dir(output_dir);
	std::fs::create_dir_all(&output_dir)?;

	let path = output_dir.join(BUILD_INFO_FILE);
	std::fs::write(&path, info.to_yaml()?)?;
	tracing::info!(path = %path.display(), commit = %info.commit, "wrote build info");

	Ok(path)
}

#[derive(Serialize)]
struct SphinxConfView {
	project: String,
	copyright: String,
	author: String,
	version: String,
}

/// Render a Sphinx `conf.py` for the collection, with the copyright dated
/// `year`. The author falls back to the collection's contributors.
pub fn render_sphinx_conf(project: &ProjectContext, year: i32) -> RoledocResult<String> {
	let collection = &project.collection;
	let name = collection.qualified_name();
	let author = collection
		.author
		.clone()
		.unwrap_or_else(|| format!("{name} contributors"));

	let view = SphinxConfView {
		project: python_string(&name)?,
		copyright: python_string(&format!("{year}, {author}"))?,
		author: python_string(&author)?,
		version: python_string(&collection.version)?,
	};

	render_template(SPHINX_CONF_TEMPLATE, &view)
}

/// Write `conf.py` into `output_dir`, or [`DEFAULT_SPHINX_DIR`], and return
/// its path. An existing file is replaced.
pub fn write_sphinx_conf(project: &ProjectContext, output_dir: Option<&Path>) -> RoledocResult<PathBuf> {
	let output_dir = project
		.root
		.join(output_dir.unwrap_or(Path::new(DEFAULT_SPHINX_DIR)));
	std::fs::create_dir_all(&output_dir)?;

	let path = output_dir.join(SPHINX_CONF_FILE);
	std::fs::write(&path, render_sphinx_conf(project, Utc::now().year())?)?;
	tracing::info!(path = %path.display(), "wrote sphinx configuration");

	Ok(path)
}

/// A JSON string is also a valid Python string literal.
fn python_string(value: &str) -> RoledocResult<String> {
	serde_json::to_string(value).map_err(|e| RoledocError::TemplateRender(e.to_string()))
}

fn git_head(root: &Path) -> Option<String> {
	let output = Command::new("git")
		.args(["rev-parse", "HEAD"])
		.current_dir(root)
		.output()
		.ok()?;

	if !output.status.success() {
		return None;
	}

	let head = String::from_utf8_lossy(&output.stdout).trim().to_string();
	(!head.is_empty()).then_some(head)
}

/// Result of comparing generated documents with the files on disk.
#[derive(Debug, Default)]
pub struct CheckResult {
	/// Documents whose file is missing or out of date.
	pub stale: Vec<StaleEntry>,
	/// Documents that could not be rendered.
	pub render_errors: Vec<RenderError>,
}

impl CheckResult {
	/// Returns true if all documents are up to date and no errors occurred.
	pub fn is_ok(&self) -> bool {
		self.stale.is_empty() && self.render_errors.is_empty()
	}

	pub fn has_errors(&self) -> bool {
		!self.render_errors.is_empty()
	}
}

/// A document that is missing or out of date.
#[derive(Debug)]
pub struct StaleEntry {
	pub file: PathBuf,
	/// The content on disk, `None` when the file does not exist.
	pub current_content: Option<String>,
	pub expected_content: String,
}

/// A document that failed to render.
#[derive(Debug)]
pub struct RenderError {
	/// The role name, or the collection document name.
	pub unit: String,
	pub message: String,
}

/// Check that every role document, and the collection overview when a
/// requirements document exists, match what would be generated. Build info
/// changes on every build and is not checked.
pub fn check_outputs(
	project: &ProjectContext,
	profile: Profile,
	output_dir: Option<&Path>,
) -> RoledocResult<CheckResult> {
	let output_dir = project.output_dir(output_dir);
	let requirements = project.read_requirements()?;
	let mut result = CheckResult::default();

	for role in &project.roles {
		let file = output_dir.join(role_document_name(&role.name));
		match render_role(project, role, profile, requirements.as_deref()) {
			Ok(expected) => compare(&mut result, file, expected),
			Err(error) => {
				result.render_errors.push(RenderError {
					unit: role.name.clone(),
					message: error.to_string(),
				});
			}
		}
	}

	if let Some(requirements) = requirements.as_deref() {
		let file = output_dir.join(COLLECTION_DOCUMENT);
		match compose_collection(project, requirements, &role_summaries(project)) {
			Ok(expected) => compare(&mut result, file, expected),
			Err(error) => {
				result.render_errors.push(RenderError {
					unit: COLLECTION_DOCUMENT.to_string(),
					message: error.to_string(),
				});
			}
		}
	}

	Ok(result)
}

fn compare(result: &mut CheckResult, file: PathBuf, expected: String) {
	let current = std::fs::read_to_string(&file).ok();
	if current.as_deref() != Some(expected.as_str()) {
		result.stale.push(StaleEntry {
			file,
			current_content: current,
			expected_content: expected,
		});
	}
}
