//! Override documents and the top-level template.
//!
//! Override documents mirror [`TemplateSpecContent`] with every field
//! optional: they are patches applied onto imported content, not complete
//! documents. [`ParentOverrides`] patch a parent template and
//! [`PluginOverrides`] patch a plugin's content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Attributes, Command, Component, ContainerComponent, ImportReference, K8sLikeComponent,
    Project, StarterProject, TemplateSpecContent, Union, UnionError, UnionTree, UnionWalker,
    VolumeComponent,
};

/// Discriminator of [`ComponentOverride`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentOverrideType {
    Container,
    Kubernetes,
    Openshift,
    Volume,
}

/// Component patch allowed inside plugin overrides.
///
/// Plugins cannot import further plugins nor declare custom components, so
/// only the container, Kubernetes-like and volume variants exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<ComponentOverrideType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<K8sLikeComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift: Option<K8sLikeComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeComponent>,
}

/// Borrowed view of the authoritative slot of a [`ComponentOverride`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentOverrideVariant<'a> {
    Container(&'a ContainerComponent),
    Kubernetes(&'a K8sLikeComponent),
    Openshift(&'a K8sLikeComponent),
    Volume(&'a VolumeComponent),
}

impl ComponentOverride {
    pub fn container(container: ContainerComponent) -> Self {
        Self {
            container: Some(container),
            ..Default::default()
        }
    }

    pub fn volume(volume: VolumeComponent) -> Self {
        Self {
            volume: Some(volume),
            ..Default::default()
        }
    }

    pub fn variant(&self) -> Option<ComponentOverrideVariant<'_>> {
        Some(match self.active()? {
            ComponentOverrideType::Container => {
                ComponentOverrideVariant::Container(self.container.as_ref()?)
            }
            ComponentOverrideType::Kubernetes => {
                ComponentOverrideVariant::Kubernetes(self.kubernetes.as_ref()?)
            }
            ComponentOverrideType::Openshift => {
                ComponentOverrideVariant::Openshift(self.openshift.as_ref()?)
            }
            ComponentOverrideType::Volume => ComponentOverrideVariant::Volume(self.volume.as_ref()?),
        })
    }
}

impl Union for ComponentOverride {
    type Tag = ComponentOverrideType;
    const UNION_TYPE: &'static str = "ComponentOverride";

    fn discriminator(&self) -> Option<ComponentOverrideType> {
        self.component_type
    }

    fn set_discriminator(&mut self, tag: Option<ComponentOverrideType>) {
        self.component_type = tag;
    }

    fn populated(&self) -> Vec<ComponentOverrideType> {
        let mut tags = Vec::new();
        if self.container.is_some() {
            tags.push(ComponentOverrideType::Container);
        }
        if self.kubernetes.is_some() {
            tags.push(ComponentOverrideType::Kubernetes);
        }
        if self.openshift.is_some() {
            tags.push(ComponentOverrideType::Openshift);
        }
        if self.volume.is_some() {
            tags.push(ComponentOverrideType::Volume);
        }
        tags
    }

    fn retain_only(&mut self, tag: ComponentOverrideType) {
        if tag != ComponentOverrideType::Container {
            self.container = None;
        }
        if tag != ComponentOverrideType::Kubernetes {
            self.kubernetes = None;
        }
        if tag != ComponentOverrideType::Openshift {
            self.openshift = None;
        }
        if tag != ComponentOverrideType::Volume {
            self.volume = None;
        }
    }
}

impl UnionTree for ComponentOverride {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.visit(self)?;
        walker.optional("kubernetes", &mut self.kubernetes)?;
        walker.optional("openshift", &mut self.openshift)
    }
}

/// Patch applied onto a parent template's content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentOverrides {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starter_projects: Vec<StarterProject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
}

impl ParentOverrides {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.components.is_empty()
            && self.projects.is_empty()
            && self.starter_projects.is_empty()
            && self.commands.is_empty()
    }
}

impl UnionTree for ParentOverrides {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.list("components", &mut self.components)?;
        walker.list("projects", &mut self.projects)?;
        walker.list("starterProjects", &mut self.starter_projects)?;
        walker.list("commands", &mut self.commands)
    }
}

/// Patch applied onto a plugin's content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOverrides {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentOverride>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
}

impl PluginOverrides {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.commands.is_empty()
    }
}

impl UnionTree for PluginOverrides {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.list("components", &mut self.components)?;
        walker.list("commands", &mut self.commands)
    }
}

/// Parent template import, with the overrides applied onto it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    #[serde(flatten)]
    pub import_reference: ImportReference,
    #[serde(flatten)]
    pub overrides: ParentOverrides,
}

impl Parent {
    pub fn new(import_reference: ImportReference) -> Self {
        Self {
            import_reference,
            overrides: ParentOverrides::default(),
        }
    }
}

impl UnionTree for Parent {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        self.import_reference.walk_unions(walker)?;
        walker.partial(&mut self.overrides)
    }
}

/// Complete workspace template: optional parent plus its own content.
///
/// # Examples
///
/// ```
/// use devtemplate_core::*;
///
/// let mut spec = TemplateSpec::default();
/// spec.parent = Some(Parent::new(ImportReference::uri("https://example.com/base.yaml")));
/// spec.content.components.push(Component::container("app", "rust:1.86"));
///
/// let doc = to_document(&spec).unwrap();
/// assert_eq!(doc["parent"]["uri"], "https://example.com/base.yaml");
/// assert_eq!(doc["components"][0]["container"]["name"], "app");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Parent>,
    #[serde(flatten)]
    pub content: TemplateSpecContent,
}

impl UnionTree for TemplateSpec {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.optional("parent", &mut self.parent)?;
        self.content.walk_unions(walker)
    }
}
