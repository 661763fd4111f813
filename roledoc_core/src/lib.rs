//! `roledoc_core` is the core library for roledoc, a documentation generator
//! for Ansible collections. It reads role metadata, argument specifications,
//! variable defaults, molecule verify playbooks and a markdown requirements
//! document, and produces lint-clean reStructuredText.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown requirements document
//!   -> Lexer (classifies every line: heading, fence, table row, text)
//!   -> Section extractor (heading-bounded spans, role sections)
//!   -> Converters (inline markup, pipe tables, code fences)
//! Role YAML sources
//!   -> Variable model (argument specs merged with defaults)
//!   -> Requirement and verification miners
//! Both
//!   -> Composer (minijinja skeletons, formal or narrative profile)
//!   -> Engine (per-role outcomes, collection overview, build info, check)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: configuration loading from `roledoc.toml`, including paths,
//!   output profile, narrative capabilities and role exclusions.
//! - [`project`]: project scanning. Discovers roles and resolves the
//!   collection identity from the config and `galaxy.yml`.
//! - [`section`]: heading lookup and section extraction.
//! - [`convert`]: whole-document markdown to RST conversion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roledoc_core::GenerateOptions;
//! use roledoc_core::generate_roles;
//! use roledoc_core::project::scan_project;
//! use std::path::Path;
//!
//! let project = scan_project(Path::new(".")).unwrap();
//! let report = generate_roles(&project, &GenerateOptions::default()).unwrap();
//!
//! for (role, error) in report.failures() {
//!     eprintln!("{role}: {error}");
//! }
//! ```

pub use compose::*;
pub use config::*;
pub use convert::*;
pub use engine::*;
pub use error::*;
pub use fence::*;
pub use inline::*;
pub use metadata::*;
pub use project::*;
pub use requirements::*;
pub use section::*;
pub use sources::*;
pub use table::*;
pub use variables::*;
pub use verify::*;

mod compose;
pub mod config;
pub mod convert;
mod engine;
#[allow(unused_assignments)]
mod error;
mod fence;
mod inline;
pub(crate) mod lexer;
mod metadata;
pub mod project;
mod requirements;
pub mod section;
mod sources;
mod table;
mod templates;
pub(crate) mod tokens;
mod variables;
mod verify;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
