use std::path::Path;

use serde::de::DeserializeOwned;

use crate::RoledocError;
use crate::RoledocResult;
use crate::metadata::ArgumentSpecsFile;
use crate::metadata::EntryPoint;
use crate::metadata::MetaFile;
use crate::project::RoleInfo;
use crate::variables::DefaultsFile;
use crate::verify::TestVerification;
use crate::verify::mine_verifications;

pub const META_FILE: &str = "meta/main.yml";
pub const ARGUMENT_SPECS_FILE: &str = "meta/argument_specs.yml";
pub const DEFAULTS_FILE: &str = "defaults/main.yml";
pub const VERIFY_FILE: &str = "molecule/default/verify.yml";

/// Everything read from a role directory.
#[derive(Debug, Clone, Default)]
pub struct RoleSources {
	pub meta: MetaFile,
	/// The `main` entry point of `meta/argument_specs.yml`, when the file
	/// exists.
	pub specification: Option<EntryPoint>,
	pub defaults: DefaultsFile,
	pub verifications: Vec<TestVerification>,
}

impl RoleSources {
	/// Read every source file of `role`. Missing files are empty; malformed
	/// YAML is an error.
	pub fn load(role: &RoleInfo) -> RoledocResult<Self> {
		let meta: MetaFile = load_yaml(&role.path.join(META_FILE))?.unwrap_or_default();

		let specification = load_yaml::<ArgumentSpecsFile>(&role.path.join(ARGUMENT_SPECS_FILE))?
			.map(|file| file.main().cloned().unwrap_or_default());

		let defaults = match read_optional(&role.path.join(DEFAULTS_FILE))? {
			Some(content) => DefaultsFile::parse(&content, &display(role, DEFAULTS_FILE))?,
			None => DefaultsFile::default(),
		};

		let verifications = read_optional(&role.path.join(VERIFY_FILE))?
			.map(|content| mine_verifications(&content))
			.unwrap_or_default();

		Ok(Self {
			meta,
			specification,
			defaults,
			verifications,
		})
	}
}

/// Parse a YAML file into `T`. Returns `None` when the file does not exist
/// and `T::default()` when it holds no document.
pub fn load_yaml<T>(path: &Path) -> RoledocResult<Option<T>>
where
	T: DeserializeOwned + Default,
{
	let Some(content) = read_optional(path)? else {
		return Ok(None);
	};

	serde_yaml_ng::from_str::<Option<T>>(&content)
		.map(|value| Some(value.unwrap_or_default()))
		.map_err(|e| {
			RoledocError::Yaml {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})
}

/// Read a file that is allowed to be absent.
pub fn read_optional(path: &Path) -> RoledocResult<Option<String>> {
	if !path.is_file() {
		tracing::debug!(path = %path.display(), "optional input not found");
		return Ok(None);
	}

	Ok(Some(std::fs::read_to_string(path)?))
}

fn display(role: &RoleInfo, relative: &str) -> String {
	role.path.join(relative).display().to_string()
}
