use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum RoledocError {
	#[error(transparent)]
	#[diagnostic(code(roledoc::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(roledoc::config_parse),
		help("check that roledoc.toml is valid TOML with [collection], [paths] and [capabilities] tables")
	)]
	ConfigParse(String),

	#[error("failed to parse yaml file `{path}`: {reason}")]
	#[diagnostic(code(roledoc::yaml))]
	Yaml { path: String, reason: String },

	#[error("role `{role}` has no argument specification at `{path}`")]
	#[diagnostic(
		code(roledoc::missing_specification),
		help("add `meta/argument_specs.yml` to the role or use `--profile narrative`")
	)]
	MissingSpecification { role: String, path: String },

	#[error("requirements document not found: `{0}`")]
	#[diagnostic(
		code(roledoc::missing_requirements_document),
		help("set `paths.requirements` in roledoc.toml to the markdown requirements document")
	)]
	MissingRequirementsDocument(String),

	#[error("roles directory not found: `{0}`")]
	#[diagnostic(
		code(roledoc::missing_roles_dir),
		help("run roledoc from the collection root or pass `--path`")
	)]
	MissingRolesDir(String),

	#[error("role not found: `{0}`")]
	#[diagnostic(code(roledoc::role_not_found))]
	RoleNotFound(String),

	#[error("invalid role exclude pattern `{pattern}`: {reason}")]
	#[diagnostic(code(roledoc::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(roledoc::template_render))]
	TemplateRender(String),

	#[error("failed to serialize build metadata: {0}")]
	#[diagnostic(code(roledoc::build_info))]
	BuildInfo(String),
}

pub type RoledocResult<T> = Result<T, RoledocError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
