//! Component types and plugin import references.
//!
//! A [`Component`] is itself a discriminated union: exactly one of its
//! variant slots (`container`, `kubernetes`, `openshift`, `volume`,
//! `plugin`, `custom`) describes it. The component's name lives inside
//! the populated variant, except for plugins, whose name is optional and
//! otherwise derived from the [`ImportReference`].

use serde::{Deserialize, Serialize};

use crate::{Endpoint, EnvVar, PluginOverrides, Union, UnionError, UnionTree, UnionWalker};

/// Volume mounted into a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Name of the volume component to mount.
    pub name: String,
    /// Mount path inside the container; defaults to `/<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl VolumeMount {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }
}

/// Container image run in the workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerComponent {
    /// Component name; its key when merging.
    #[serde(default)]
    pub name: String,
    /// Container image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Memory limit, e.g. `512Mi`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,
    /// Whether project sources are mounted into the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_sources: Option<bool>,
    /// Path project sources are mounted at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_mapping: Option<String>,
    /// Entrypoint override; replaced wholesale when overridden.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Arguments of the entrypoint; replaced wholesale when overridden.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment variables, merged by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    /// Volumes mounted into the container, merged by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    /// Exposed ports, merged by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
}

/// Discriminator of [`K8sLikeComponentLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum K8sLikeComponentLocationType {
    /// The `uri` slot.
    Uri,
    /// The `inlined` slot.
    Inlined,
}

/// Where the manifest of a Kubernetes-like component comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sLikeComponentLocation {
    /// Discriminator; set by normalization, stripped by simplification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_type: Option<K8sLikeComponentLocationType>,
    /// URI of the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Manifest content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlined: Option<String>,
}

impl Union for K8sLikeComponentLocation {
    type Tag = K8sLikeComponentLocationType;
    const UNION_TYPE: &'static str = "K8sLikeComponentLocation";

    fn discriminator(&self) -> Option<K8sLikeComponentLocationType> {
        self.location_type
    }

    fn set_discriminator(&mut self, tag: Option<K8sLikeComponentLocationType>) {
        self.location_type = tag;
    }

    fn populated(&self) -> Vec<K8sLikeComponentLocationType> {
        let mut tags = Vec::new();
        if self.uri.is_some() {
            tags.push(K8sLikeComponentLocationType::Uri);
        }
        if self.inlined.is_some() {
            tags.push(K8sLikeComponentLocationType::Inlined);
        }
        tags
    }

    fn retain_only(&mut self, tag: K8sLikeComponentLocationType) {
        if tag != K8sLikeComponentLocationType::Uri {
            self.uri = None;
        }
        if tag != K8sLikeComponentLocationType::Inlined {
            self.inlined = None;
        }
    }
}

/// Kubernetes or OpenShift manifest applied alongside the workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sLikeComponent {
    /// Component name; its key when merging.
    #[serde(default)]
    pub name: String,
    /// Where the manifest comes from, flattened into the component.
    #[serde(flatten)]
    pub location: K8sLikeComponentLocation,
    /// Exposed ports, merged by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
}

impl UnionTree for K8sLikeComponent {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.visit(&mut self.location)
    }
}

/// Alias used for the `kubernetes` slot.
pub type KubernetesComponent = K8sLikeComponent;

/// Alias used for the `openshift` slot.
pub type OpenshiftComponent = K8sLikeComponent;

/// Persistent or ephemeral storage shared between containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeComponent {
    /// Component name; its key when merging.
    #[serde(default)]
    pub name: String,
    /// Requested size, e.g. `1Gi`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Whether the volume is discarded with the workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,
}

impl VolumeComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Implementation-defined component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomComponent {
    /// Component name; its key when merging.
    #[serde(default)]
    pub name: String,
    /// Class interpreting the embedded resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_class: Option<String>,
    /// Opaque component definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_resource: Option<serde_json::Value>,
}

/// Custom resource holding a template in a Kubernetes cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesCustomResourceImportReference {
    /// Resource name.
    #[serde(default)]
    pub name: String,
    /// Resource namespace; the current one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Discriminator of [`ImportReferenceUnion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportReferenceType {
    /// The `uri` slot.
    Uri,
    /// The `id` slot.
    Id,
    /// The `kubernetes` slot.
    Kubernetes,
}

/// Location of an imported template: a URI, a registry id, or a
/// Kubernetes custom resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReferenceUnion {
    /// Discriminator; set by normalization, stripped by simplification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_reference_type: Option<ImportReferenceType>,
    /// URI of the template document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Template id in a registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Custom resource holding the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<KubernetesCustomResourceImportReference>,
}

/// Borrowed view of the authoritative slot of an [`ImportReferenceUnion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImportReferenceVariant<'a> {
    /// URI of the template document.
    Uri(&'a str),
    /// Registry id.
    Id(&'a str),
    /// Custom resource.
    Kubernetes(&'a KubernetesCustomResourceImportReference),
}

impl ImportReferenceUnion {
    /// Returns the authoritative slot, or `None` if it cannot be determined.
    pub fn variant(&self) -> Option<ImportReferenceVariant<'_>> {
        Some(match self.active()? {
            ImportReferenceType::Uri => ImportReferenceVariant::Uri(self.uri.as_deref()?),
            ImportReferenceType::Id => ImportReferenceVariant::Id(self.id.as_deref()?),
            ImportReferenceType::Kubernetes => {
                ImportReferenceVariant::Kubernetes(self.kubernetes.as_ref()?)
            }
        })
    }
}

impl Union for ImportReferenceUnion {
    type Tag = ImportReferenceType;
    const UNION_TYPE: &'static str = "ImportReferenceUnion";

    fn discriminator(&self) -> Option<ImportReferenceType> {
        self.import_reference_type
    }

    fn set_discriminator(&mut self, tag: Option<ImportReferenceType>) {
        self.import_reference_type = tag;
    }

    fn populated(&self) -> Vec<ImportReferenceType> {
        let mut tags = Vec::new();
        if self.uri.is_some() {
            tags.push(ImportReferenceType::Uri);
        }
        if self.id.is_some() {
            tags.push(ImportReferenceType::Id);
        }
        if self.kubernetes.is_some() {
            tags.push(ImportReferenceType::Kubernetes);
        }
        tags
    }

    fn retain_only(&mut self, tag: ImportReferenceType) {
        if tag != ImportReferenceType::Uri {
            self.uri = None;
        }
        if tag != ImportReferenceType::Id {
            self.id = None;
        }
        if tag != ImportReferenceType::Kubernetes {
            self.kubernetes = None;
        }
    }
}

/// Reference to a parent or plugin template.
///
/// ```
/// use devtemplate_core::*;
///
/// let reference = ImportReference::id("java-maven").with_registry_url("https://registry.example.com");
/// assert!(matches!(reference.union.variant(), Some(ImportReferenceVariant::Id("java-maven"))));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReference {
    /// Location slots, flattened into the reference.
    #[serde(flatten)]
    pub union: ImportReferenceUnion,
    /// Registry resolving an `id`; also part of the derived plugin key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,
}

impl ImportReference {
    /// Reference to a template document at `uri`.
    pub fn uri(uri: impl Into<String>) -> Self {
        Self {
            union: ImportReferenceUnion {
                uri: Some(uri.into()),
                ..Default::default()
            },
            registry_url: None,
        }
    }

    /// Reference to a registry template; see [`with_registry_url`](Self::with_registry_url).
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            union: ImportReferenceUnion {
                id: Some(id.into()),
                ..Default::default()
            },
            registry_url: None,
        }
    }

    /// Reference to a template held in a Kubernetes custom resource.
    pub fn kubernetes(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            union: ImportReferenceUnion {
                kubernetes: Some(KubernetesCustomResourceImportReference {
                    name: name.into(),
                    namespace: namespace.map(str::to_string),
                }),
                ..Default::default()
            },
            registry_url: None,
        }
    }

    pub fn with_registry_url(mut self, registry_url: impl Into<String>) -> Self {
        self.registry_url = Some(registry_url.into());
        self
    }
}

impl UnionTree for ImportReference {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.visit(&mut self.union)
    }
}

/// Template imported as a plugin, optionally overridden.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginComponent {
    /// Explicit name; derived from the import reference when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Template imported as the plugin.
    #[serde(flatten)]
    pub import_reference: ImportReference,
    /// Overrides applied to the imported template.
    #[serde(flatten)]
    pub overrides: PluginOverrides,
}

impl PluginComponent {
    pub fn new(import_reference: ImportReference) -> Self {
        Self {
            name: None,
            import_reference,
            overrides: PluginOverrides::default(),
        }
    }

    /// Plugin with an explicit name, used as its key.
    pub fn named(name: impl Into<String>, import_reference: ImportReference) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(import_reference)
        }
    }

    pub fn with_overrides(mut self, overrides: PluginOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

impl UnionTree for PluginComponent {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        self.import_reference.walk_unions(walker)?;
        walker.partial(&mut self.overrides)
    }
}

/// Discriminator of [`Component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentType {
    /// The `container` slot.
    Container,
    /// The `kubernetes` slot.
    Kubernetes,
    /// The `openshift` slot.
    Openshift,
    /// The `volume` slot.
    Volume,
    /// The `plugin` slot.
    Plugin,
    /// The `custom` slot.
    Custom,
}

/// Borrowed view of the authoritative slot of a [`Component`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentVariant<'a> {
    /// Container component.
    Container(&'a ContainerComponent),
    /// Kubernetes manifest.
    Kubernetes(&'a K8sLikeComponent),
    /// OpenShift manifest.
    Openshift(&'a K8sLikeComponent),
    /// Volume component.
    Volume(&'a VolumeComponent),
    /// Plugin import.
    Plugin(&'a PluginComponent),
    /// Custom component.
    Custom(&'a CustomComponent),
}

/// Workspace component.
///
/// # Examples
///
/// ```
/// use devtemplate_core::*;
///
/// let web = Component::container("web", "nginx:1.27");
/// assert_eq!(web.name(), Some("web"));
/// assert!(!web.is_plugin());
///
/// let plugin = Component::plugin(PluginComponent::new(ImportReference::uri(
///     "https://example.com/plugin.yaml",
/// )));
/// assert!(plugin.is_plugin());
/// assert_eq!(plugin.name(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Discriminator; set by normalization, stripped by simplification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<ComponentType>,
    /// Container run in the workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerComponent>,
    /// Kubernetes manifest applied with the workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<K8sLikeComponent>,
    /// OpenShift manifest applied with the workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift: Option<K8sLikeComponent>,
    /// Shared storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeComponent>,
    /// Imported plugin template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginComponent>,
    /// Implementation-defined component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomComponent>,
}

impl Component {
    pub fn container(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            container: Some(ContainerComponent {
                name: name.into(),
                image: Some(image.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn volume(name: impl Into<String>) -> Self {
        Self {
            volume: Some(VolumeComponent::new(name)),
            ..Default::default()
        }
    }

    /// Kubernetes component whose manifest is fetched from `uri`.
    pub fn kubernetes(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            kubernetes: Some(K8sLikeComponent {
                name: name.into(),
                location: K8sLikeComponentLocation {
                    uri: Some(uri.into()),
                    ..Default::default()
                },
                endpoints: Vec::new(),
            }),
            ..Default::default()
        }
    }

    pub fn plugin(plugin: PluginComponent) -> Self {
        Self {
            plugin: Some(plugin),
            ..Default::default()
        }
    }

    pub fn variant(&self) -> Option<ComponentVariant<'_>> {
        Some(match self.active()? {
            ComponentType::Container => ComponentVariant::Container(self.container.as_ref()?),
            ComponentType::Kubernetes => ComponentVariant::Kubernetes(self.kubernetes.as_ref()?),
            ComponentType::Openshift => ComponentVariant::Openshift(self.openshift.as_ref()?),
            ComponentType::Volume => ComponentVariant::Volume(self.volume.as_ref()?),
            ComponentType::Plugin => ComponentVariant::Plugin(self.plugin.as_ref()?),
            ComponentType::Custom => ComponentVariant::Custom(self.custom.as_ref()?),
        })
    }

    /// Returns the explicit name of the authoritative variant.
    ///
    /// Plugins without an explicit name return `None`; their identity is
    /// derived by [`Keyed::key`](crate::Keyed::key).
    pub fn name(&self) -> Option<&str> {
        match self.variant()? {
            ComponentVariant::Container(c) => Some(&c.name),
            ComponentVariant::Kubernetes(k) | ComponentVariant::Openshift(k) => Some(&k.name),
            ComponentVariant::Volume(v) => Some(&v.name),
            ComponentVariant::Plugin(p) => p.name.as_deref(),
            ComponentVariant::Custom(c) => Some(&c.name),
        }
    }

    pub fn is_plugin(&self) -> bool {
        matches!(self.active(), Some(ComponentType::Plugin))
    }
}

impl Union for Component {
    type Tag = ComponentType;
    const UNION_TYPE: &'static str = "Component";

    fn discriminator(&self) -> Option<ComponentType> {
        self.component_type
    }

    fn set_discriminator(&mut self, tag: Option<ComponentType>) {
        self.component_type = tag;
    }

    fn populated(&self) -> Vec<ComponentType> {
        let mut tags = Vec::new();
        if self.container.is_some() {
            tags.push(ComponentType::Container);
        }
        if self.kubernetes.is_some() {
            tags.push(ComponentType::Kubernetes);
        }
        if self.openshift.is_some() {
            tags.push(ComponentType::Openshift);
        }
        if self.volume.is_some() {
            tags.push(ComponentType::Volume);
        }
        if self.plugin.is_some() {
            tags.push(ComponentType::Plugin);
        }
        if self.custom.is_some() {
            tags.push(ComponentType::Custom);
        }
        tags
    }

    fn retain_only(&mut self, tag: ComponentType) {
        if tag != ComponentType::Container {
            self.container = None;
        }
        if tag != ComponentType::Kubernetes {
            self.kubernetes = None;
        }
        if tag != ComponentType::Openshift {
            self.openshift = None;
        }
        if tag != ComponentType::Volume {
            self.volume = None;
        }
        if tag != ComponentType::Plugin {
            self.plugin = None;
        }
        if tag != ComponentType::Custom {
            self.custom = None;
        }
    }
}

impl UnionTree for Component {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.visit(self)?;
        walker.optional("kubernetes", &mut self.kubernetes)?;
        walker.optional("openshift", &mut self.openshift)?;
        walker.optional("plugin", &mut self.plugin)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{from_document, normalize, simplify, to_document};

    #[test]
    fn test_kubernetes_location_flattens() {
        let component = Component::kubernetes("deploy", "manifests/deploy.yaml");
        let doc = to_document(&component).unwrap();
        assert_eq!(
            doc,
            json!({"kubernetes": {"name": "deploy", "uri": "manifests/deploy.yaml"}})
        );
    }

    #[test]
    fn test_plugin_parses_reference_and_overrides() {
        let doc = json!({
            "plugin": {
                "kubernetes": {"name": "theia", "namespace": "plugins"},
                "components": [{"container": {"name": "theia-ide", "memoryLimit": "1Gi"}}]
            }
        });
        let component: Component = from_document(doc).unwrap();
        let plugin = component.plugin.as_ref().unwrap();
        assert_eq!(plugin.name, None);
        assert!(matches!(
            plugin.import_reference.union.variant(),
            Some(ImportReferenceVariant::Kubernetes(_))
        ));
        assert_eq!(plugin.overrides.components.len(), 1);
    }

    #[test]
    fn test_plugin_override_without_variant_is_accepted() {
        // An override that only names the element leaves the variant alone.
        let doc = json!({
            "plugin": {
                "uri": "https://example.com/plugin.yaml",
                "commands": [{"id": "build"}]
            }
        });
        let mut component: Component = from_document(doc).unwrap();
        normalize(&mut component).unwrap();
        assert_eq!(component.component_type, Some(ComponentType::Plugin));
    }

    #[test]
    fn test_plugin_without_import_reference_is_rejected() {
        let mut component = Component::plugin(PluginComponent::default());
        let err = normalize(&mut component).unwrap_err();
        assert_eq!(err.union_type(), "ImportReferenceUnion");
        assert_eq!(err.path().to_string(), "plugin");
    }

    #[test]
    fn test_simplify_strips_nested_discriminators() {
        let mut component = Component::kubernetes("deploy", "deploy.yaml");
        simplify(&mut component).unwrap();
        let kubernetes = component.kubernetes.as_ref().unwrap();
        assert_eq!(component.component_type, None);
        assert_eq!(kubernetes.location.location_type, None);
        assert_eq!(kubernetes.location.uri.as_deref(), Some("deploy.yaml"));
    }

    #[test]
    fn test_name_follows_discriminator() {
        let mut component = Component::volume("cache");
        component.container = Some(ContainerComponent {
            name: "ignored".into(),
            ..Default::default()
        });
        component.component_type = Some(ComponentType::Volume);
        assert_eq!(component.name(), Some("cache"));
    }
}
