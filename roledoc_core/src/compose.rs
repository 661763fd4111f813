use std::collections::BTreeMap;

use serde::Serialize;

use crate::RoledocError;
use crate::RoledocResult;
use crate::config::Capability;
use crate::config::NarrativeConfig;
use crate::config::Profile;
use crate::config::title_case;
use crate::convert::markdown_to_rst;
use crate::fence::render_code_block;
use crate::inline::collapse_blank_lines;
use crate::inline::convert_code_spans;
use crate::inline::underline;
use crate::metadata::DEFAULT_AUTHOR;
use crate::metadata::DEFAULT_LICENSE;
use crate::metadata::Platform;
use crate::metadata::RoleMetadata;
use crate::project::ProjectContext;
use crate::requirements::RequirementRecord;
use crate::requirements::mine_role_requirements;
use crate::section::extract_section;
use crate::sources::ARGUMENT_SPECS_FILE;
use crate::sources::RoleSources;
use crate::table::ColumnWidths;
use crate::table::GridColumn;
use crate::table::ListTableOptions;
use crate::table::Table;
use crate::table::truncate_cell;
use crate::templates::COLLECTION_TEMPLATE;
use crate::templates::ROLE_FORMAL_TEMPLATE;
use crate::templates::ROLE_NARRATIVE_TEMPLATE;
use crate::templates::render_template;
use crate::variables::NO_DESCRIPTION;
use crate::variables::VariableSpec;
use crate::variables::merge_variables;

pub const NO_VARIABLES: &str = "No variables defined.";
pub const NO_CONFIGURABLE_VARIABLES: &str = "**Configuration**: No configurable variables.";
pub const DEFAULTS_ONLY: &str =
	"**Configuration**: Role uses sensible defaults; minimal configuration required.";

const GRID_HEADER: [&str; 5] = ["Name", "Type", "Required", "Default", "Description"];
const NARRATIVE_HEADER: [&str; 3] = ["Variable", "Default", "Purpose"];
const SECTION_LEVEL: usize = 2;

/// A role as listed in the collection overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
	pub name: String,
	pub description: String,
	pub platforms: Vec<Platform>,
}

impl RoleSummary {
	pub fn new(name: &str, metadata: Option<&RoleMetadata>) -> Self {
		Self {
			name: name.to_string(),
			description: metadata
				.and_then(RoleMetadata::summary)
				.unwrap_or(NO_DESCRIPTION)
				.to_string(),
			platforms: metadata.map(|meta| meta.platforms.clone()).unwrap_or_default(),
		}
	}
}

/// The document title of a role: the configured title, or the role name in
/// title case followed by `Role`.
pub fn role_title(role: &str, project: &ProjectContext) -> String {
	project
		.config
		.capabilities
		.get(role)
		.and_then(|capabilities| capabilities.title.clone())
		.unwrap_or_else(|| format!("{} Role", title_case(role)))
}

/// Compose the RST document for one role.
///
/// The formal profile needs the role's argument specification and fails
/// without it. Requirements are mined from `requirements_document` when one
/// is given.
pub fn compose_role(
	role: &str,
	sources: &RoleSources,
	profile: Profile,
	project: &ProjectContext,
	requirements_document: Option<&str>,
) -> RoledocResult<String> {
	let document = match profile {
		Profile::Formal => compose_formal(role, sources, project, requirements_document)?,
		Profile::Narrative => compose_narrative(role, sources, project)?,
	};

	Ok(finalize(&document))
}

fn role_metadata(sources: &RoleSources, project: &ProjectContext) -> RoleMetadata {
	RoleMetadata::new(
		&sources.meta,
		sources.specification.as_ref(),
		project.collection.author.as_deref(),
		project.collection.license.as_deref(),
	)
}

#[derive(Serialize)]
struct PlatformView {
	name: String,
	versions: String,
}

impl From<&Platform> for PlatformView {
	fn from(platform: &Platform) -> Self {
		Self {
			name: platform.name.clone(),
			versions: if platform.versions.is_empty() {
				"all".to_string()
			} else {
				platform.versions.join(", ")
			},
		}
	}
}

#[derive(Serialize)]
struct FormalView<'a> {
	role: &'a str,
	title: String,
	title_underline: String,
	summary: String,
	purpose: String,
	long_description: Option<String>,
	metadata: &'a RoleMetadata,
	variable_table: String,
	requirements: Vec<RequirementRecord>,
	platforms: Vec<PlatformView>,
	dependencies: &'a [String],
	role_reference: String,
}

fn compose_formal(
	role: &str,
	sources: &RoleSources,
	project: &ProjectContext,
	requirements_document: Option<&str>,
) -> RoledocResult<String> {
	let Some(specification) = sources.specification.as_ref() else {
		return Err(RoledocError::MissingSpecification {
			role: role.to_string(),
			path: project
				.config
				.paths
				.roles
				.join(role)
				.join(ARGUMENT_SPECS_FILE)
				.display()
				.to_string(),
		});
	};

	let metadata = role_metadata(sources, project);
	let variables = merge_variables(Some(specification), &sources.defaults);
	let requirements = requirements_document
		.map(|document| {
			mine_role_requirements(document, role, project.config.requirements.min_length)
		})
		.unwrap_or_default();

	let title = role_title(role, project);
	let summary = metadata.summary().unwrap_or(NO_DESCRIPTION).to_string();

	let view = FormalView {
		role,
		title_underline: underline(&title, 1),
		title,
		purpose: purpose_clause(&summary),
		summary,
		long_description: metadata.long_description.clone(),
		metadata: &metadata,
		variable_table: variable_grid(&variables, project.config.output.description_width),
		requirements,
		platforms: metadata.platforms.iter().map(PlatformView::from).collect(),
		dependencies: &metadata.dependencies,
		role_reference: project.collection.role_reference(role),
	};

	render_template(ROLE_FORMAL_TEMPLATE, &view)
}

/// Render the variables as a fixed-width table with per-column floors and a
/// capped description column.
pub fn variable_grid(variables: &[VariableSpec], description_width: usize) -> String {
	if variables.is_empty() {
		return NO_VARIABLES.to_string();
	}

	let table = Table::new(
		GRID_HEADER.iter().map(ToString::to_string).collect(),
		variables
			.iter()
			.map(|variable| {
				vec![
					variable.name.clone(),
					variable.var_type.to_string(),
					variable.required_label().to_string(),
					variable.default_display(),
					variable.description_display(),
				]
			})
			.collect(),
	);

	table.to_grid(&[
		GridColumn::new(20),
		GridColumn::new(15),
		GridColumn::new(10),
		GridColumn::new(15),
		GridColumn::capped(40, description_width),
	])
}

#[derive(Serialize)]
struct CapabilityView {
	name: String,
	underline: String,
	headline: String,
	user_experience: Vec<String>,
	implementation: String,
	platform_table: String,
}

impl From<&Capability> for CapabilityView {
	fn from(capability: &Capability) -> Self {
		let user_experience: Vec<String> = capability
			.user_experience
			.iter()
			.map(|item| convert_code_spans(item))
			.collect();

		Self {
			name: capability.name.clone(),
			underline: underline(&capability.name, 3),
			headline: user_experience
				.first()
				.cloned()
				.unwrap_or_else(|| "Enhanced functionality".to_string()),
			user_experience,
			implementation: convert_code_spans(&capability.implementation),
			platform_table: platform_matrix(capability),
		}
	}
}

#[derive(Serialize)]
struct VerificationView {
	requirement: String,
	description: String,
	code_block: String,
}

#[derive(Serialize)]
struct NarrativeView<'a> {
	title: String,
	title_underline: String,
	description: String,
	capabilities: Vec<CapabilityView>,
	verifications: Vec<VerificationView>,
	variable_table: String,
	role_reference: String,
	user_variable: Option<String>,
	packages_variable: Option<String>,
	metadata: &'a RoleMetadata,
	collection: String,
}

fn compose_narrative(role: &str, sources: &RoleSources, project: &ProjectContext) -> RoledocResult<String> {
	let metadata = role_metadata(sources, project);
	let capabilities = project.config.capabilities_for(role);
	let variables = merge_variables(sources.specification.as_ref(), &sources.defaults);
	let narrative = &project.config.narrative;

	let conventional = |suffix: &str| {
		let name = format!("{role}{suffix}");
		variables
			.iter()
			.any(|variable| variable.name == name)
			.then_some(name)
	};

	let title = role_title(role, project);
	let view = NarrativeView {
		title_underline: underline(&title, 1),
		title,
		description: convert_code_spans(&capabilities.description),
		capabilities: capabilities.capabilities.iter().map(CapabilityView::from).collect(),
		verifications: sources
			.verifications
			.iter()
			.take(narrative.max_verifications)
			.map(|verification| {
				let lines: Vec<&str> = verification.code.lines().collect();
				VerificationView {
					requirement: verification.requirement.clone(),
					description: verification.description.clone(),
					code_block: render_code_block(Some("yaml"), &lines),
				}
			})
			.collect(),
		variable_table: narrative_variable_table(&variables, narrative),
		role_reference: project.collection.role_reference(role),
		user_variable: conventional("_user"),
		packages_variable: conventional("_packages"),
		metadata: &metadata,
		collection: project.collection.qualified_name(),
	};

	render_template(ROLE_NARRATIVE_TEMPLATE, &view)
}

/// The platform support list table of one capability.
pub fn platform_matrix(capability: &Capability) -> String {
	let table = Table::new(
		vec!["Platform".to_string(), "Support Level".to_string()],
		capability
			.platforms
			.iter()
			.map(|platform| vec![platform.name.clone(), convert_code_spans(&platform.support)])
			.collect(),
	);

	table.to_list_table(&ListTableOptions {
		title: Some(format!("{} Support", capability.name)),
		widths: ColumnWidths::Fixed(vec![30, 70]),
	})
}

/// A condensed list table holding only the variables whose names end in one
/// of the configured suffixes.
pub fn narrative_variable_table(variables: &[VariableSpec], narrative: &NarrativeConfig) -> String {
	if variables.is_empty() {
		return NO_CONFIGURABLE_VARIABLES.to_string();
	}

	let rows: Vec<Vec<String>> = variables
		.iter()
		.filter(|variable| variable.has_suffix(&narrative.variable_suffixes))
		.map(|variable| {
			let purpose = variable.description.replace('|', "\\|");
			vec![
				format!("``{}``", variable.name),
				variable.default_display(),
				truncate_cell(&purpose, narrative.description_width),
			]
		})
		.collect();

	if rows.is_empty() {
		return DEFAULTS_ONLY.to_string();
	}

	Table::new(NARRATIVE_HEADER.iter().map(ToString::to_string).collect(), rows).to_list_table(
		&ListTableOptions {
			title: Some("Configuration Options".to_string()),
			widths: ColumnWidths::Fixed(vec![25, 15, 60]),
		},
	)
}

#[derive(Serialize)]
struct CollectionView {
	title: String,
	title_underline: String,
	description: String,
	leading_sections: Vec<String>,
	trailing_sections: Vec<String>,
	roles: Vec<RoleSummary>,
	collection: String,
	example_roles: Vec<String>,
	platforms: Vec<PlatformView>,
	license: String,
	author: String,
}

/// Compose the collection overview from the requirements document and the
/// role summaries.
///
/// The configured level-2 sections are converted from markdown; sections the
/// document lacks are left out.
pub fn compose_collection(
	project: &ProjectContext,
	requirements_document: &str,
	roles: &[RoleSummary],
) -> RoledocResult<String> {
	let settings = &project.config.requirements;
	let collection = &project.collection;
	let title = format!("{} Ansible Collection", collection.qualified_name());

	let view = CollectionView {
		title_underline: underline(&title, 1),
		title,
		description: collection.description.clone().unwrap_or_else(|| {
			"Infrastructure management roles for Ansible.".to_string()
		}),
		leading_sections: converted_sections(requirements_document, &settings.leading_sections),
		trailing_sections: converted_sections(requirements_document, &settings.trailing_sections),
		roles: roles.to_vec(),
		collection: collection.qualified_name(),
		example_roles: roles
			.iter()
			.take(3)
			.map(|role| collection.role_reference(&role.name))
			.collect(),
		platforms: merge_platforms(roles).iter().map(PlatformView::from).collect(),
		license: collection
			.license
			.clone()
			.unwrap_or_else(|| DEFAULT_LICENSE.to_string()),
		author: collection
			.author
			.clone()
			.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
	};

	let document = render_template(COLLECTION_TEMPLATE, &view)?;
	Ok(finalize(&document))
}

fn converted_sections(document: &str, titles: &[String]) -> Vec<String> {
	titles
		.iter()
		.filter_map(|title| {
			let section = extract_section(document, title, SECTION_LEVEL);
			if section.is_none() {
				tracing::debug!(section = %title, "section not found in requirements document");
			}
			section
		})
		.map(|section| markdown_to_rst(section.content))
		.filter(|converted| !converted.is_empty())
		.collect()
}

/// Every platform named by any role, with the union of their versions in
/// first-seen order.
fn merge_platforms(roles: &[RoleSummary]) -> Vec<Platform> {
	let mut order: Vec<String> = Vec::new();
	let mut versions: BTreeMap<String, Vec<String>> = BTreeMap::new();

	for platform in roles.iter().flat_map(|role| &role.platforms) {
		let entry = versions.entry(platform.name.clone()).or_insert_with(|| {
			order.push(platform.name.clone());
			Vec::new()
		});

		for version in &platform.versions {
			if !entry.contains(version) {
				entry.push(version.clone());
			}
		}
	}

	order
		.into_iter()
		.map(|name| {
			let versions = versions.remove(&name).unwrap_or_default();
			Platform { name, versions }
		})
		.collect()
}

/// `Manage packages.` becomes `manage packages`, for use mid-sentence.
/// Acronyms such as `NPM` keep their case.
fn purpose_clause(summary: &str) -> String {
	let trimmed = summary.trim().trim_end_matches('.');
	let mut chars = trimmed.chars();
	let Some(first) = chars.next() else {
		return String::new();
	};

	if chars.clone().next().is_some_and(char::is_uppercase) {
		return trimmed.to_string();
	}

	first.to_lowercase().chain(chars).collect()
}

/// Final cleanup applied to every composed document: whitespace-only lines
/// become empty, blank runs collapse to one blank line, and the document ends
/// with exactly one newline.
pub fn finalize(document: &str) -> String {
	let lines: Vec<&str> = document
		.lines()
		.map(|line| if line.trim().is_empty() { "" } else { line })
		.collect();

	let mut cleaned = collapse_blank_lines(&lines.join("\n")).trim().to_string();
	cleaned.push('\n');
	cleaned
}
