use minijinja::Environment;
use serde::Serialize;

use crate::RoledocError;
use crate::RoledocResult;

pub const ROLE_FORMAL_TEMPLATE: &str = "role_formal.rst";
pub const ROLE_NARRATIVE_TEMPLATE: &str = "role_narrative.rst";
pub const COLLECTION_TEMPLATE: &str = "collection.rst";
pub const SPHINX_CONF_TEMPLATE: &str = "sphinx_conf.py";

const TEMPLATES: [(&str, &str); 4] = [
	(ROLE_FORMAL_TEMPLATE, include_str!("templates/role_formal.rst")),
	(ROLE_NARRATIVE_TEMPLATE, include_str!("templates/role_narrative.rst")),
	(COLLECTION_TEMPLATE, include_str!("templates/collection.rst")),
	(SPHINX_CONF_TEMPLATE, include_str!("templates/sphinx_conf.py")),
];

/// The environment holding every embedded document skeleton.
///
/// Block tags on their own line leave no trace in the output, and neither
/// `.rst` nor `.py` names enable auto-escaping.
pub fn environment() -> RoledocResult<Environment<'static>> {
	let mut env = Environment::new();
	env.set_keep_trailing_newline(true);
	env.set_trim_blocks(true);
	env.set_lstrip_blocks(true);

	for (name, source) in TEMPLATES {
		env.add_template(name, source)
			.map_err(|e| RoledocError::TemplateRender(e.to_string()))?;
	}

	Ok(env)
}

/// Render the named skeleton with `view` as its context.
pub fn render_template<S: Serialize>(name: &str, view: &S) -> RoledocResult<String> {
	let env = environment()?;
	let template = env
		.get_template(name)
		.map_err(|e| RoledocError::TemplateRender(e.to_string()))?;

	template
		.render(minijinja::Value::from_serialize(view))
		.map_err(|e| RoledocError::TemplateRender(format!("{name}: {e}")))
}
