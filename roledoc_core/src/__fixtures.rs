use std::path::Path;

pub const REQUIREMENTS_DOCUMENT: &str = "# Software Requirements

## 1. Collection Overview

The collection configures `developer` workstations.

| Platform | Status |
|----------|--------|
| Ubuntu | Supported |
| Arch Linux | Supported |

## 2. Collection-Wide Requirements

All roles must be idempotent.

## 3. Role Requirements

### 3.1 Nodejs

**REQ-NODE-001**: Install Node.js from the upstream repository.
**REQ-NODE-002**: Install global npm packages for `nodejs_user`.
**Implementation**: community.general.npm

### 3.2 Os Configuration

**REQ-OS-001**: Configure the system timezone from a variable.

### 3.3 Rust

**REQ-RUST-001**: Install the stable toolchain with rustup.

## 4. Known Issues and Limitations

```yaml
broken: true
```

## 5. Future Requirements

- Windows support
";

pub const META_MAIN: &str = "galaxy_info:
  author: Jane Doe
  description: Install Node.js and npm packages
  license: MIT
  min_ansible_version: \"2.15\"
  galaxy_tags:
    - nodejs
    - npm
  platforms:
    - name: Ubuntu
      versions:
        - jammy
        - noble
    - name: ArchLinux
      versions:
        - all
dependencies:
  - role: base_packages
";

pub const ARGUMENT_SPECS: &str = "argument_specs:
  main:
    short_description: Install Node.js and npm packages.
    description:
      - Installs Node.js.
      - Manages global npm packages.
    options:
      nodejs_user:
        type: str
        required: true
        description: User that owns the npm prefix.
      nodejs_packages:
        type: list
        elements: str
        description: Global npm packages.
      nodejs_version:
        type: str
        default: \"20\"
        description: Major Node.js version.
        choices:
          - \"18\"
          - \"20\"
      nodejs_prefix:
        type: str
";

pub const DEFAULTS_MAIN: &str = "---
# User that owns the npm prefix
nodejs_user: \"\"

# Packages installed globally
# with npm
nodejs_packages: []

nodejs_version: \"18\"

# Where npm installs global packages
nodejs_prefix: \"~/.npm-global\"
";

pub const VERIFY_PLAYBOOK: &str = "---
- name: Verify
  hosts: all
  tasks:
    # REQ-NODE-001: Node.js is installed
    - name: Check node
      ansible.builtin.command: node --version
      register: node_version
      changed_when: false

    - name: Assert node
      ansible.builtin.assert:
        that:
          - node_version.rc == 0
        success_msg: Node.js is installed

    # REQ-NODE-002
    - name: Assert prefix
      ansible.builtin.assert:
        that: true
        success_msg: prefix ok
";

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

/// Create a role directory with metadata, defaults and a verify playbook.
/// The argument specification is only written when `with_specification` is
/// set.
pub fn write_role(root: &Path, name: &str, with_specification: bool) {
	write_file(root, &format!("roles/{name}/meta/main.yml"), META_MAIN);
	write_file(root, &format!("roles/{name}/defaults/main.yml"), DEFAULTS_MAIN);
	write_file(
		root,
		&format!("roles/{name}/molecule/default/verify.yml"),
		VERIFY_PLAYBOOK,
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
	write_file(
		root,
		"galaxy.yml",
		"namespace: wolskies\nname: infrastructure\nversion: 1.2.3\nauthors:\n  - wolskies team\nlicense:\n  - MIT\n",
	);
	write_file(
		root,
		"docs/SOFTWARE_REQUIREMENTS_DOCUMENT.md",
		REQUIREMENTS_DOCUMENT,
	);

	for (name, with_specification) in roles {
		write_role(root, name, *with_specification);
	}
}
