//! Detection of keys defined in more than one scope.
//!
//! Composition concatenates the lists of the main document with those of
//! its parent and plugins. A key the main document shares with one of them
//! is an authoring mistake; overriding is the sanctioned way to change an
//! inherited element, so such collisions are reported instead of resolved.

use std::collections::BTreeSet;
use std::fmt;

use devtemplate_core::{ElementType, TopLevelKeys};
use thiserror::Error;

/// Layer a piece of content comes from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    Main,
    Parent,
    /// Plugin, named by the key of the component importing it.
    Plugin(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Main => f.write_str("main"),
            Scope::Parent => f.write_str("parent"),
            Scope::Plugin(name) => write!(f, "plugin '{name}'"),
        }
    }
}

/// A key of the main document is also defined in another scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{element_type} '{key}' is already defined in {scope}")]
pub struct DuplicateKeyError {
    pub element_type: ElementType,
    pub key: String,
    /// Scope that already defines the key.
    pub scope: Scope,
}

/// Patch elements of one type whose keys are missing from the base.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("some {element_type} overrides do not touch any existing element: {}", .keys.join(", "))]
pub struct UnknownOverrideError {
    pub element_type: ElementType,
    /// Offending keys, sorted.
    pub keys: Vec<String>,
}

/// Reports every key of `element_type` present in both `main` and `other`.
///
/// One error is returned per shared key, in the order the keys appear in
/// `main`.
///
/// # Examples
///
/// ```
/// use devtemplate_core::*;
/// use devtemplate_overriding::{Scope, check_no_overlap};
///
/// let mut main = TemplateSpecContent::default();
/// main.components.push(Component::container("web", "nginx"));
/// let mut parent = TemplateSpecContent::default();
/// parent.components.push(Component::container("web", "httpd"));
/// parent.components.push(Component::volume("cache"));
///
/// let main = main.into_keyed().unwrap().top_level_keys();
/// let parent = parent.into_keyed().unwrap().top_level_keys();
/// let conflicts = check_no_overlap(&main, &parent, ElementType::Component, &Scope::Parent);
/// assert_eq!(conflicts.len(), 1);
/// assert_eq!(conflicts[0].to_string(), "component 'web' is already defined in parent");
/// ```
pub fn check_no_overlap(
    main: &TopLevelKeys,
    other: &TopLevelKeys,
    element_type: ElementType,
    scope: &Scope,
) -> Vec<DuplicateKeyError> {
    let defined: BTreeSet<&str> = other
        .get(element_type)
        .iter()
        .map(String::as_str)
        .collect();
    let mut reported = BTreeSet::new();

    main.get(element_type)
        .iter()
        .filter(|key| defined.contains(key.as_str()))
        .filter(|key| reported.insert(key.as_str()))
        .map(|key| DuplicateKeyError {
            element_type,
            key: key.clone(),
            scope: scope.clone(),
        })
        .collect()
}

/// Runs [`check_no_overlap`] for every element type.
pub fn check_scope(
    main: &TopLevelKeys,
    other: &TopLevelKeys,
    scope: &Scope,
) -> Vec<DuplicateKeyError> {
    ElementType::ALL
        .iter()
        .flat_map(|element_type| check_no_overlap(main, other, *element_type, scope))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(element_type: ElementType, keys: &[&str]) -> TopLevelKeys {
        let mut top = TopLevelKeys::default();
        top.insert(element_type, keys.iter().map(|k| k.to_string()).collect());
        top
    }

    #[test]
    fn test_disjoint_keys_do_not_conflict() {
        let main = keys(ElementType::Component, &["web"]);
        let parent = keys(ElementType::Component, &["web2"]);
        assert!(check_scope(&main, &parent, &Scope::Parent).is_empty());
    }

    #[test]
    fn test_same_key_in_other_list_does_not_conflict() {
        let main = keys(ElementType::Command, &["build"]);
        let parent = keys(ElementType::Component, &["build"]);
        assert!(check_scope(&main, &parent, &Scope::Parent).is_empty());
    }

    #[test]
    fn test_each_shared_key_reported_once() {
        let main = keys(ElementType::Command, &["build", "test", "build"]);
        let plugin = keys(ElementType::Command, &["test", "build"]);
        let scope = Scope::Plugin("java".to_string());

        let conflicts = check_no_overlap(&main, &plugin, ElementType::Command, &scope);
        let reported: Vec<&str> = conflicts.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(reported, vec!["build", "test"]);
        assert_eq!(
            conflicts[1].to_string(),
            "command 'test' is already defined in plugin 'java'"
        );
    }
}
