#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn roledoc_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("roledoc"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

const GALAXY: &str = "namespace: wolskies\nname: infrastructure\nversion: 1.0.0\nauthors:\n  - \
                      wolskies team\n";

const REQUIREMENTS: &str = "# Requirements

## 1. Collection Overview

Roles for `developer` workstations.

## 3. Role Requirements

### 3.1 Alpha

**REQ-ALPHA-001**: Install the alpha tooling system-wide.
";

const META: &str = "galaxy_info:
  author: Jane Doe
  description: Install alpha tooling
  license: MIT
  platforms:
    - name: Ubuntu
      versions:
        - noble
";

const ARGUMENT_SPECS: &str = "argument_specs:
  main:
    short_description: Install alpha tooling.
    options:
      tool_user:
        type: str
        required: true
        description: Owner of the installation.
";

pub fn write_file(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

/// A role with metadata and, when `with_specification` is set, an argument
/// specification.
pub fn write_role(root: &Path, name: &str, with_specification: bool) {
	write_file(root, &format!("roles/{name}/meta/main.yml"), META);
	write_file(
		root,
		&format!("roles/{name}/defaults/main.yml"),
		"# Owner of the installation\ntool_user: root\n",
	);

	if with_specification {
		write_file(
			root,
			&format!("roles/{name}/meta/argument_specs.yml"),
			ARGUMENT_SPECS,
		);
	}
}

/// A collection with `galaxy.yml`, a requirements document and the given
/// roles.
pub fn write_collection(root: &Path, roles: &[(&str, bool)]) {
	write_file(root, "galaxy.yml", GALAXY);
	write_file(root, "docs/SOFTWARE_REQUIREMENTS_DOCUMENT.md", REQUIREMENTS);

	for (name, with_specification) in roles {
		write_role(root, name, *with_specification);
	}
}
