//! Core schema types and document primitives for workspace templates.
//!
//! This crate defines the foundational types the override and merge engine
//! operates on:
//!
//! - [`TemplateSpecContent`]: the document under composition (commands,
//!   components, projects, starter projects, events, attributes).
//! - [`Component`], [`Command`], [`ProjectSource`], [`ImportReference`]:
//!   discriminated unions, with exactly one variant slot populated.
//! - [`ParentOverrides`], [`PluginOverrides`]: partial patch documents.
//! - [`TemplateSpec`]: a template with an optional [`Parent`].
//!
//! Unions are normalized and simplified with [`normalize`],
//! [`normalize_partial`] and [`simplify`]. Element identity comes from
//! [`Keyed`], and [`Keying`] converts documents to the keyed form used for
//! merge-by-key. Every type lowers to the generic [`Document`] model, and
//! [`PatchMeta`] describes how each field is patched.
//!
//! Validation ([`validate_content`]) catches structural errors such as
//! inconsistent unions, duplicate keys and dangling command references.
//!
//! # Example
//!
//! ```
//! use devtemplate_core::*;
//!
//! let mut content = TemplateSpecContent::default();
//! content.components.push(Component::container("web", "nginx:1.27"));
//! content.components.push(Component::plugin(PluginComponent::new(
//!     ImportReference::kubernetes("theia", Some("plugins")),
//! )));
//! content.commands.push(Command::exec("serve", "nginx -g 'daemon off;'").with_component("web"));
//!
//! normalize(&mut content).unwrap();
//! let keyed = content.clone().into_keyed().unwrap();
//! assert_eq!(
//!     keyed.top_level_keys().get(ElementType::Component),
//!     ["web".to_string(), "plugins/theia".to_string()]
//! );
//! assert!(validate_content(&content).is_empty());
//! ```

mod components;
mod document;
mod keys;
mod overrides;
mod patch_meta;
mod types;
mod union;
mod validate;

pub use components::*;
pub use document::{
    Document, DocumentError, DocumentMap, FieldPath, PathSegment, from_document, kind_of,
    to_document,
};
pub use keys::{
    ElementType, KeyError, KeyFailure, Keyed, KeyedContent, KeyedParentOverrides,
    KeyedPluginOverrides, Keying, NamedElement, TopLevelKeys, TopLevelLists, import_key,
};
pub use overrides::*;
pub use patch_meta::{FieldMeta, PatchMeta, PatchStrategy};
pub use types::*;
pub use union::{
    Union, UnionError, UnionTree, UnionWalker, WalkMode, normalize, normalize_partial, simplify,
};
pub use validate::{ValidationError, validate_content};
