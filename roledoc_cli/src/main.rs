use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use roledoc_cli::Commands;
use roledoc_cli::OutputFormat;
use roledoc_cli::ProfileArg;
use roledoc_cli::RoledocCli;
use roledoc_core::BatchReport;
use roledoc_core::CheckResult;
use roledoc_core::GenerateOptions;
use roledoc_core::Profile;
use roledoc_core::RoleOutcome;
use roledoc_core::RoledocConfig;
use roledoc_core::SAMPLE_CONFIG;
use roledoc_core::check_outputs;
use roledoc_core::generate_collection;
use roledoc_core::generate_roles;
use roledoc_core::project::ProjectContext;
use roledoc_core::project::scan_project;
use roledoc_core::write_build_info;
use roledoc_core::write_sphinx_conf;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = RoledocCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Roles {
			role,
			output,
			profile,
			format,
		}) => run_roles(&args, role.clone(), output.clone(), *profile, *format),
		Some(Commands::Collection { output_dir }) => run_collection(&args, output_dir.as_deref()),
		Some(Commands::Build {
			output_dir,
			profile,
		}) => run_build(&args, output_dir.clone(), *profile),
		Some(Commands::Sphinx { output_dir }) => run_sphinx(&args, output_dir.as_deref()),
		Some(Commands::Check { diff, profile }) => run_check(&args, *diff, *profile),
		None => {
			eprintln!("No subcommand specified. Run `roledoc --help` for usage.");
			process::exit(1);
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			match e.downcast::<roledoc_core::RoledocError>() {
				Ok(roledoc_err) => {
					let report: miette::Report = (*roledoc_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool, use_color: bool) {
	let default_directive = if verbose {
		"roledoc_core=debug"
	} else {
		"roledoc_core=warn"
	};
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &RoledocCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn scan(args: &RoledocCli) -> CliResult<ProjectContext> {
	let root = resolve_root(args);
	let project = scan_project(&root)?;

	if args.verbose {
		println!(
			"Scanned collection {}: {} role(s)",
			project.collection.qualified_name(),
			project.roles.len()
		);
		for role in &project.roles {
			println!("  {} ({})", role.name, make_relative(&role.path, &root));
		}
	}

	Ok(project)
}

fn resolve_profile(project: &ProjectContext, profile: Option<ProfileArg>) -> Profile {
	profile.map_or(project.config.output.profile, Profile::from)
}

fn run_init(args: &RoledocCli) -> CliResult<bool> {
	let root = resolve_root(args);

	if let Some(existing) = RoledocConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(true);
	}

	let config_path = root.join("roledoc.toml");
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created {}", config_path.display());

	println!();
	println!("Next steps:");
	println!("  1. Edit roledoc.toml to point at your roles and requirements document");
	println!("  2. Run `roledoc build` to generate the documentation");
	println!("  3. Run `roledoc check` in CI to keep it up to date");

	Ok(true)
}

fn run_roles(
	args: &RoledocCli,
	role: Option<String>,
	output: Option<PathBuf>,
	profile: Option<ProfileArg>,
	format: OutputFormat,
) -> CliResult<bool> {
	let project = scan(args)?;
	let options = GenerateOptions {
		profile: resolve_profile(&project, profile),
		role,
		output_dir: output,
	};
	let report = generate_roles(&project, &options)?;

	match format {
		OutputFormat::Json => print_report_json(&report, &project.root),
		OutputFormat::Text => {
			print_report(&report, &project.root);
			println!();
			println!("{}", report_summary(&report));
		}
	}

	Ok(report.is_ok())
}

fn run_collection(args: &RoledocCli, output_dir: Option<&Path>) -> CliResult<bool> {
	let project = scan(args)?;
	let path = generate_collection(&project, output_dir)?;
	println!(
		"{} {}",
		colored!("generated", green),
		make_relative(&path, &project.root)
	);

	Ok(true)
}

fn run_sphinx(args: &RoledocCli, output_dir: Option<&Path>) -> CliResult<bool> {
	let project = scan(args)?;
	let path = write_sphinx_conf(&project, output_dir)?;
	println!(
		"{} {}",
		colored!("generated", green),
		make_relative(&path, &project.root)
	);

	Ok(true)
}

fn run_build(args: &RoledocCli, output_dir: Option<PathBuf>, profile: Option<ProfileArg>) -> CliResult<bool> {
	let project = scan(args)?;
	let options = GenerateOptions {
		profile: resolve_profile(&project, profile),
		role: None,
		output_dir: output_dir.clone(),
	};

	let report = generate_roles(&project, &options)?;
	print_report(&report, &project.root);

	let collection_ok = match generate_collection(&project, output_dir.as_deref()) {
		Ok(path) => {
			println!(
				"{} {}",
				colored!("generated", green),
				make_relative(&path, &project.root)
			);
			true
		}
		Err(error) => {
			eprintln!("{} collection overview: {error}", colored!("failed", red));
			false
		}
	};

	let build_info = write_build_info(&project, output_dir.as_deref())?;
	println!(
		"{} {}",
		colored!("generated", green),
		make_relative(&build_info, &project.root)
	);

	println!();
	println!("{}", report_summary(&report));
	if !collection_ok {
		println!("Collection overview failed.");
	}

	Ok(report.is_ok() && collection_ok)
}

fn run_check(args: &RoledocCli, show_diff: bool, profile: Option<ProfileArg>) -> CliResult<bool> {
	let project = scan(args)?;
	let profile = resolve_profile(&project, profile);
	let result = check_outputs(&project, profile, None)?;

	if result.is_ok() {
		println!("Check passed: all documents are up to date.");
		return Ok(true);
	}

	eprintln!("Check failed.");
	eprintln!("  render errors: {}", result.render_errors.len());
	eprintln!("  stale documents: {}", result.stale.len());

	if !result.render_errors.is_empty() {
		eprintln!();
		eprintln!("Render errors:");
		for error in &result.render_errors {
			eprintln!("  {}: {}", error.unit, error.message);
		}
	}

	if !result.stale.is_empty() {
		eprintln!();
		eprintln!("Stale documents:");
		for entry in &result.stale {
			let rel = make_relative(&entry.file, &project.root);
			let state = if entry.current_content.is_some() {
				colored!("out of date", yellow)
			} else {
				colored!("missing", yellow)
			};
			eprintln!("  {rel} ({state})");

			if show_diff {
				print_diff(
					entry.current_content.as_deref().unwrap_or_default(),
					&entry.expected_content,
				);
			}
		}
	}

	eprintln!();
	eprintln!("{}", check_summary(&result));

	Ok(false)
}

fn print_report(report: &BatchReport, root: &Path) {
	for outcome in &report.outcomes {
		match outcome {
			RoleOutcome::Generated { path, .. } => {
				println!("{} {}", colored!("generated", green), make_relative(path, root));
			}
			RoleOutcome::Skipped { path, .. } => {
				println!("{} {}", colored!("unchanged", bold), make_relative(path, root));
			}
			RoleOutcome::Failed { role, error } => {
				eprintln!("{} {role}: {error}", colored!("failed", red));
			}
		}
	}
}

fn print_report_json(report: &BatchReport, root: &Path) {
	let roles: Vec<serde_json::Value> = report
		.outcomes
		.iter()
		.map(|outcome| {
			match outcome {
				RoleOutcome::Generated { role, path } => {
					serde_json::json!({
						"role": role,
						"status": "generated",
						"path": make_relative(path, root),
					})
				}
				RoleOutcome::Skipped { role, path } => {
					serde_json::json!({
						"role": role,
						"status": "unchanged",
						"path": make_relative(path, root),
					})
				}
				RoleOutcome::Failed { role, error } => {
					serde_json::json!({
						"role": role,
						"status": "failed",
						"error": error.to_string(),
					})
				}
			}
		})
		.collect();

	let output = serde_json::json!({
		"ok": report.is_ok(),
		"generated": report.generated_count(),
		"unchanged": report.skipped_count(),
		"failed": report.failed_count(),
		"roles": roles,
	});
	println!("{output}");
}

fn report_summary(report: &BatchReport) -> String {
	format!(
		"Generated {} role document(s), {} unchanged, {} failed.",
		report.generated_count(),
		report.skipped_count(),
		report.failed_count()
	)
}

fn check_summary(result: &CheckResult) -> String {
	let mut parts = Vec::new();
	if !result.render_errors.is_empty() {
		parts.push(format!("{} render error(s)", result.render_errors.len()));
	}
	if !result.stale.is_empty() {
		parts.push(format!("{} document(s) are out of date", result.stale.len()));
	}
	format!("{}. Run `roledoc build` to fix.", parts.join(" and "))
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
