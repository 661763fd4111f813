use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use roledoc_core::Profile;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Generate reStructuredText documentation for the roles of an Ansible collection.",
	long_about = "roledoc reads role metadata, argument specifications, variable defaults, \
	              molecule verify playbooks and a markdown requirements document, and writes \
	              lint-clean reStructuredText for Sphinx.\n\nQuick start:\n  roledoc init        \
	              Create a roledoc.toml file\n  roledoc roles       Generate one document per \
	              role\n  roledoc collection  Generate the collection overview\n  roledoc build    \
	              Generate everything plus build info\n  roledoc sphinx      Write the Sphinx \
	              conf.py\n  roledoc check       Verify the generated documents are up to date"
)]
pub struct RoledocCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the collection root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output and debug logging.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `roledoc.toml` in the collection root.
	///
	/// If a config file already exists, this command is a no-op and exits
	/// successfully.
	Init,
	/// Generate role documents.
	///
	/// Writes `role_<name>.rst` for every role under the roles directory, or
	/// only for `ROLE` when given. A role that cannot be documented is
	/// reported and the others are still generated. Exits with status 1 when
	/// any role failed.
	Roles {
		/// Only document this role.
		role: Option<String>,

		/// Output directory. Defaults to `[paths] output` from the config.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Document layout. Defaults to `[output] profile` from the config.
		#[arg(long, value_enum)]
		profile: Option<ProfileArg>,

		/// Output format for the batch report.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Generate the collection overview document.
	///
	/// Converts the configured sections of the requirements document and
	/// lists every role with its summary.
	Collection {
		/// Output directory. Defaults to `[paths] output` from the config.
		output_dir: Option<PathBuf>,
	},
	/// Generate role documents, the collection overview and `build_info.yml`.
	Build {
		/// Output directory. Defaults to `[paths] output` from the config.
		output_dir: Option<PathBuf>,

		/// Document layout. Defaults to `[output] profile` from the config.
		#[arg(long, value_enum)]
		profile: Option<ProfileArg>,
	},
	/// Write a Sphinx `conf.py` for the documentation site.
	///
	/// The project name, author and version come from the collection
	/// identity. An existing `conf.py` is replaced.
	Sphinx {
		/// Directory for `conf.py`. Defaults to `docs` in the collection root.
		output_dir: Option<PathBuf>,
	},
	/// Check that the generated documents on disk are up to date.
	///
	/// Renders every document in memory and compares it with the file in the
	/// output directory. Exits with a non-zero status code if any document is
	/// missing, stale or cannot be rendered. Ideal for CI pipelines.
	Check {
		/// Show a unified diff for each stale document.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Document layout. Defaults to `[output] profile` from the config.
		#[arg(long, value_enum)]
		profile: Option<ProfileArg>,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProfileArg {
	/// Overview fields, a variable grid, formal requirements and platforms.
	Formal,
	/// Capability sections, tested behaviour and a condensed variable table.
	Narrative,
}

impl From<ProfileArg> for Profile {
	fn from(value: ProfileArg) -> Self {
		match value {
			ProfileArg::Formal => Profile::Formal,
			ProfileArg::Narrative => Profile::Narrative,
		}
	}
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Each role entry includes
	/// its name, status, path and error message.
	Json,
}
