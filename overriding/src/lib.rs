//! Override and merge engine for workspace templates.
//!
//! Two operations turn a template and its imports into one flat document:
//!
//! - **override** patches flattened content with a partial override
//!   document. Keyed list elements are merged in place, lists marked
//!   replace are swapped wholesale, and new elements are appended.
//! - **merge** concatenates the content of a template with its already
//!   overridden parent and plugins, rejecting keys defined in more than
//!   one scope.
//!
//! [`TemplateEngine::compose`] chains both over imports the caller has
//! already resolved.
//!
//! # Quick start
//!
//! ```
//! use devtemplate_core::*;
//! use devtemplate_overriding::{TemplateEngine, parse_content, parse_parent_overrides};
//!
//! let parent = parse_content(r#"
//! components:
//!   - container:
//!       name: runtime
//!       image: node:18
//! commands:
//!   - id: start
//!     exec:
//!       component: runtime
//!       commandLine: npm start
//!       args: [--inspect]
//! "#).unwrap();
//!
//! let overrides = parse_parent_overrides(r#"
//! commands:
//!   - id: start
//!     exec:
//!       args: [--watch]
//! "#).unwrap();
//!
//! let engine = TemplateEngine::default();
//! let flat_parent = engine.override_content(&parent, &overrides).unwrap();
//! let start = flat_parent.find_command("start").unwrap();
//! assert_eq!(start.union.exec.as_ref().unwrap().args, vec!["--watch"]);
//! assert_eq!(start.component(), Some("runtime"));
//!
//! let mut main = TemplateSpecContent::default();
//! main.commands.push(Command::exec("test", "npm test").with_component("runtime"));
//! let merged = engine.merge(&main, Some(&flat_parent), &[]).unwrap();
//! assert_eq!(merged.commands.len(), 2);
//! ```
//!
//! # Configuration
//!
//! [`EngineConfig`] can be loaded from YAML and controls whether patches
//! may introduce new elements and how merged event bindings are ordered.

mod compose;
mod config;
mod conflicts;
mod engine;
mod error;
mod loader;
mod merging;
mod overriding;
mod patch;

pub use compose::ResolvedImports;
pub use config::{EngineConfig, EventOrder};
pub use conflicts::{
    DuplicateKeyError, Scope, UnknownOverrideError, check_no_overlap, check_scope,
};
pub use engine::TemplateEngine;
pub use error::{EngineError, Result};
pub use loader::{
    load_content, load_template, merge_bytes, override_bytes, parse_content,
    parse_parent_overrides, parse_plugin_overrides, parse_template,
};
pub use merging::merge;
pub use overriding::override_content;
pub use patch::{PatchStats, patch_document};
