//! Identity keys of list elements and the keyed document forms.
//!
//! Every element of a top-level list (commands, components, projects,
//! starter projects) has a key that must be unique within its list. Most
//! elements carry the key in an explicit field; components keep their name
//! inside the populated variant, and plugin components may derive it from
//! their import reference.
//!
//! Before patching or composition a document is converted to its *keyed*
//! form ([`Keying::into_keyed`]), in which every component is wrapped in a
//! [`NamedElement`] carrying its key as an explicit `name` field. The inverse
//! ([`Keying::from_keyed`]) strips those injected keys again.
//!
//! # Example
//!
//! ```
//! use devtemplate_core::*;
//!
//! let plugin = Component::plugin(PluginComponent::new(ImportReference::kubernetes(
//!     "foo",
//!     Some("bar"),
//! )));
//! assert_eq!(plugin.key().unwrap(), "bar/foo");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Attributes, Command, Component, ComponentOverride, ComponentOverrideVariant,
    ComponentVariant, Events, FieldPath, ImportReference, ImportReferenceVariant,
    ParentOverrides, PluginOverrides, Project, StarterProject, TemplateSpecContent,
};

/// Kind of element held by a top-level list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementType {
    Command,
    Component,
    Project,
    StarterProject,
}

impl ElementType {
    pub const ALL: [ElementType; 4] = [
        ElementType::Command,
        ElementType::Component,
        ElementType::Project,
        ElementType::StarterProject,
    ];

    /// Name of the top-level list field holding this element type.
    pub fn list_field(self) -> &'static str {
        match self {
            ElementType::Command => "commands",
            ElementType::Component => "components",
            ElementType::Project => "projects",
            ElementType::StarterProject => "starterProjects",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementType::Command => "command",
            ElementType::Component => "component",
            ElementType::Project => "project",
            ElementType::StarterProject => "starter project",
        })
    }
}

/// Why no key could be computed for an element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyFailure {
    /// The union the key is derived from has no usable variant.
    #[error("no variant of {union_type} is set")]
    EmptyUnion { union_type: &'static str },
    /// The identity field is empty.
    #[error("identity field `{field}` is empty")]
    MissingIdentity { field: &'static str },
}

/// An element that requires a key has none.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot key {element_type} at {path}: {reason}")]
pub struct KeyError {
    pub element_type: ElementType,
    pub path: FieldPath,
    pub reason: KeyFailure,
}

/// An element of a keyed list.
pub trait Keyed {
    const ELEMENT_TYPE: ElementType;

    /// Computes the element's identity key.
    ///
    /// Union-typed elements are expected to be normalized first, so that the
    /// discriminator picks the slot the key is read from.
    fn key(&self) -> Result<String, KeyFailure>;
}

fn non_empty(value: &str, field: &'static str) -> Result<String, KeyFailure> {
    if value.is_empty() {
        Err(KeyFailure::MissingIdentity { field })
    } else {
        Ok(value.to_string())
    }
}

impl Keyed for Command {
    const ELEMENT_TYPE: ElementType = ElementType::Command;

    fn key(&self) -> Result<String, KeyFailure> {
        non_empty(&self.id, "id")
    }
}

impl Keyed for Project {
    const ELEMENT_TYPE: ElementType = ElementType::Project;

    fn key(&self) -> Result<String, KeyFailure> {
        non_empty(&self.name, "name")
    }
}

impl Keyed for StarterProject {
    const ELEMENT_TYPE: ElementType = ElementType::StarterProject;

    fn key(&self) -> Result<String, KeyFailure> {
        non_empty(&self.name, "name")
    }
}

impl Keyed for Component {
    const ELEMENT_TYPE: ElementType = ElementType::Component;

    fn key(&self) -> Result<String, KeyFailure> {
        let variant = self.variant().ok_or(KeyFailure::EmptyUnion {
            union_type: "Component",
        })?;
        match variant {
            ComponentVariant::Container(c) => non_empty(&c.name, "name"),
            ComponentVariant::Kubernetes(k) | ComponentVariant::Openshift(k) => {
                non_empty(&k.name, "name")
            }
            ComponentVariant::Volume(v) => non_empty(&v.name, "name"),
            ComponentVariant::Custom(c) => non_empty(&c.name, "name"),
            ComponentVariant::Plugin(plugin) => match plugin.name.as_deref() {
                Some(name) if !name.is_empty() => Ok(name.to_string()),
                _ => import_key(&plugin.import_reference),
            },
        }
    }
}

impl Keyed for ComponentOverride {
    const ELEMENT_TYPE: ElementType = ElementType::Component;

    fn key(&self) -> Result<String, KeyFailure> {
        let variant = self.variant().ok_or(KeyFailure::EmptyUnion {
            union_type: "ComponentOverride",
        })?;
        match variant {
            ComponentOverrideVariant::Container(c) => non_empty(&c.name, "name"),
            ComponentOverrideVariant::Kubernetes(k) | ComponentOverrideVariant::Openshift(k) => {
                non_empty(&k.name, "name")
            }
            ComponentOverrideVariant::Volume(v) => non_empty(&v.name, "name"),
        }
    }
}

/// Derives a plugin's key from where it is imported from.
///
/// A URI is used as is, a registry id is prefixed with the registry URL
/// and a custom resource name with its namespace, when those are set.
pub fn import_key(reference: &ImportReference) -> Result<String, KeyFailure> {
    let variant = reference.union.variant().ok_or(KeyFailure::EmptyUnion {
        union_type: "ImportReferenceUnion",
    })?;
    match variant {
        ImportReferenceVariant::Uri(uri) => non_empty(uri, "uri"),
        ImportReferenceVariant::Id(id) => {
            let id = non_empty(id, "id")?;
            Ok(match reference.registry_url.as_deref() {
                Some(registry) if !registry.is_empty() => format!("{registry}/{id}"),
                _ => id,
            })
        }
        ImportReferenceVariant::Kubernetes(cr) => {
            let name = non_empty(&cr.name, "name")?;
            Ok(match cr.namespace.as_deref() {
                Some(namespace) if !namespace.is_empty() => format!("{namespace}/{name}"),
                _ => name,
            })
        }
    }
}

/// Element with its key injected as an explicit `name` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedElement<T> {
    pub name: String,
    #[serde(flatten)]
    pub element: T,
}

impl<T: Keyed> NamedElement<T> {
    pub fn new(element: T) -> Result<Self, KeyFailure> {
        Ok(Self {
            name: element.key()?,
            element,
        })
    }
}

/// Ordered keys of every top-level list of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopLevelKeys(BTreeMap<ElementType, Vec<String>>);

impl TopLevelKeys {
    pub fn insert(&mut self, element_type: ElementType, keys: Vec<String>) {
        self.0.insert(element_type, keys);
    }

    /// Keys of the given list, in document order. Empty if the list is.
    pub fn get(&self, element_type: ElementType) -> &[String] {
        self.0.get(&element_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementType, &[String])> {
        self.0.iter().map(|(ty, keys)| (*ty, keys.as_slice()))
    }
}

/// Documents whose top-level lists can be enumerated by key.
pub trait TopLevelLists {
    fn top_level_keys(&self) -> TopLevelKeys;
}

/// Conversion of a document to and from its keyed form.
pub trait Keying: Sized {
    type Keyed: Serialize + DeserializeOwned + TopLevelLists;

    /// Computes every element key and makes it explicit.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] for the first element without a key.
    fn into_keyed(self) -> Result<Self::Keyed, KeyError>;

    /// Strips the injected keys.
    fn from_keyed(keyed: Self::Keyed) -> Self;
}

fn check_keys<T: Keyed>(items: &[T]) -> Result<(), KeyError> {
    for (idx, item) in items.iter().enumerate() {
        item.key().map_err(|reason| key_error::<T>(idx, reason))?;
    }
    Ok(())
}

fn name_all<T: Keyed>(items: Vec<T>) -> Result<Vec<NamedElement<T>>, KeyError> {
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| NamedElement::new(item).map_err(|reason| key_error::<T>(idx, reason)))
        .collect()
}

fn key_error<T: Keyed>(idx: usize, reason: KeyFailure) -> KeyError {
    KeyError {
        element_type: T::ELEMENT_TYPE,
        path: FieldPath::root()
            .field(T::ELEMENT_TYPE.list_field())
            .index(idx),
        reason,
    }
}

fn unname_all<T>(items: Vec<NamedElement<T>>) -> Vec<T> {
    items.into_iter().map(|named| named.element).collect()
}

fn names<T>(items: &[NamedElement<T>]) -> Vec<String> {
    items.iter().map(|named| named.name.clone()).collect()
}

fn explicit_keys<T: Keyed>(items: &[T]) -> Vec<String> {
    // Keyed forms are only built after `check_keys`, so no key fails here.
    items.iter().filter_map(|item| item.key().ok()).collect()
}

/// Keyed form of [`TemplateSpecContent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedContent {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<NamedElement<Component>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starter_projects: Vec<StarterProject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Events>,
}

impl TopLevelLists for KeyedContent {
    fn top_level_keys(&self) -> TopLevelKeys {
        let mut keys = TopLevelKeys::default();
        keys.insert(ElementType::Command, explicit_keys(&self.commands));
        keys.insert(ElementType::Component, names(&self.components));
        keys.insert(ElementType::Project, explicit_keys(&self.projects));
        keys.insert(
            ElementType::StarterProject,
            explicit_keys(&self.starter_projects),
        );
        keys
    }
}

impl Keying for TemplateSpecContent {
    type Keyed = KeyedContent;

    fn into_keyed(self) -> Result<KeyedContent, KeyError> {
        check_keys(&self.commands)?;
        check_keys(&self.projects)?;
        check_keys(&self.starter_projects)?;
        Ok(KeyedContent {
            attributes: self.attributes,
            components: name_all(self.components)?,
            projects: self.projects,
            starter_projects: self.starter_projects,
            commands: self.commands,
            events: self.events,
        })
    }

    fn from_keyed(keyed: KeyedContent) -> Self {
        Self {
            attributes: keyed.attributes,
            components: unname_all(keyed.components),
            projects: keyed.projects,
            starter_projects: keyed.starter_projects,
            commands: keyed.commands,
            events: keyed.events,
        }
    }
}

/// Keyed form of [`ParentOverrides`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedParentOverrides {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<NamedElement<Component>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starter_projects: Vec<StarterProject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
}

impl TopLevelLists for KeyedParentOverrides {
    fn top_level_keys(&self) -> TopLevelKeys {
        let mut keys = TopLevelKeys::default();
        keys.insert(ElementType::Command, explicit_keys(&self.commands));
        keys.insert(ElementType::Component, names(&self.components));
        keys.insert(ElementType::Project, explicit_keys(&self.projects));
        keys.insert(
            ElementType::StarterProject,
            explicit_keys(&self.starter_projects),
        );
        keys
    }
}

impl Keying for ParentOverrides {
    type Keyed = KeyedParentOverrides;

    fn into_keyed(self) -> Result<KeyedParentOverrides, KeyError> {
        check_keys(&self.commands)?;
        check_keys(&self.projects)?;
        check_keys(&self.starter_projects)?;
        Ok(KeyedParentOverrides {
            attributes: self.attributes,
            components: name_all(self.components)?,
            projects: self.projects,
            starter_projects: self.starter_projects,
            commands: self.commands,
        })
    }

    fn from_keyed(keyed: KeyedParentOverrides) -> Self {
        Self {
            attributes: keyed.attributes,
            components: unname_all(keyed.components),
            projects: keyed.projects,
            starter_projects: keyed.starter_projects,
            commands: keyed.commands,
        }
    }
}

/// Keyed form of [`PluginOverrides`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedPluginOverrides {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<NamedElement<ComponentOverride>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
}

impl TopLevelLists for KeyedPluginOverrides {
    fn top_level_keys(&self) -> TopLevelKeys {
        let mut keys = TopLevelKeys::default();
        keys.insert(ElementType::Command, explicit_keys(&self.commands));
        keys.insert(ElementType::Component, names(&self.components));
        keys
    }
}

impl Keying for PluginOverrides {
    type Keyed = KeyedPluginOverrides;

    fn into_keyed(self) -> Result<KeyedPluginOverrides, KeyError> {
        check_keys(&self.commands)?;
        Ok(KeyedPluginOverrides {
            components: name_all(self.components)?,
            commands: self.commands,
        })
    }

    fn from_keyed(keyed: KeyedPluginOverrides) -> Self {
        Self {
            components: unname_all(keyed.components),
            commands: keyed.commands,
        }
    }
}
