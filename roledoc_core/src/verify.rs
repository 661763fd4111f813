use serde::Serialize;

use crate::requirements::find_requirement_id;

const ASSERT_MODULE: &str = "ansible.builtin.assert:";
const SUCCESS_MESSAGE: &str = "success_msg:";
const FALLBACK_DESCRIPTION: &str = "Test verification";

/// An assertion block in a molecule verify playbook tagged with the
/// requirement it checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestVerification {
	pub requirement: String,
	pub description: String,
	/// The YAML tasks from the line after the tag through the assertion's
	/// `success_msg`, dedented.
	pub code: String,
}

/// Mine tagged assertions from a verify playbook.
///
/// A tag is a comment such as `# REQ-NODE-001: Node.js is installed`. The
/// block under it runs until the first `ansible.builtin.assert:` task has
/// produced its `success_msg:` line, plus any continuation lines that do not
/// open a new task or comment. Tags whose block never reaches an assertion
/// are ignored.
pub fn mine_verifications(content: &str) -> Vec<TestVerification> {
	let lines: Vec<&str> = content.lines().collect();
	let mut verifications = Vec::new();
	let mut index = 0;

	while index < lines.len() {
		let Some((requirement, description)) = parse_tag(lines[index]) else {
			index += 1;
			continue;
		};

		match capture_block(&lines[index + 1..]) {
			Some(block) => {
				index += 1 + block.len();
				verifications.push(TestVerification {
					requirement: requirement.to_string(),
					description,
					code: dedent(&block),
				});
			}
			None => index += 1,
		}
	}

	verifications
}

fn parse_tag(line: &str) -> Option<(&str, String)> {
	let comment = line.trim_start().strip_prefix('#')?;
	let requirement = find_requirement_id(comment)?;
	let description = comment
		.split_once(':')
		.map(|(_, rest)| rest.trim().to_string())
		.filter(|rest| !rest.is_empty())
		.unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string());

	Some((requirement, description))
}

fn capture_block<'a>(lines: &[&'a str]) -> Option<Vec<&'a str>> {
	let mut block = Vec::new();
	let mut seen_assert = false;
	let mut complete = false;

	for line in lines {
		let trimmed = line.trim_start();

		if complete {
			if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
				break;
			}

			block.push(*line);
			continue;
		}

		// A new tag before the assertion completes starts a new block.
		if trimmed.starts_with('#') && find_requirement_id(trimmed).is_some() {
			return None;
		}

		if trimmed.contains(ASSERT_MODULE) {
			seen_assert = true;
		}

		if seen_assert && trimmed.contains(SUCCESS_MESSAGE) {
			complete = true;
		}

		block.push(*line);
	}

	complete.then_some(block)
}

fn dedent(lines: &[&str]) -> String {
	let indent = lines
		.iter()
		.filter(|line| !line.trim().is_empty())
		.map(|line| line.len() - line.trim_start().len())
		.min()
		.unwrap_or(0);

	lines
		.iter()
		.map(|line| line.get(indent..).unwrap_or("").trim_end())
		.collect::<Vec<_>>()
		.join("\n")
		.trim_matches('\n')
		.to_string()
}
