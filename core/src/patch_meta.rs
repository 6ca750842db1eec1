//! Merge-field metadata consumed by the patch engine.
//!
//! The table maps `(type name, field name)` to how the field is patched.
//! Fields absent from the table fall back to the default policy: maps are
//! merged recursively, lists and scalars are replaced.
//!
//! # Examples
//!
//! ```
//! use devtemplate_core::*;
//!
//! let meta = PatchMeta::template_content();
//! let commands = meta.field(PatchMeta::ROOT, "commands").unwrap();
//! assert_eq!(commands.strategy, PatchStrategy::MergeByKey { key: "id" });
//! assert_eq!(commands.type_name, Some("Command"));
//!
//! let args = meta.field("ExecCommand", "args").unwrap();
//! assert_eq!(args.strategy, PatchStrategy::Replace);
//! ```

use std::collections::BTreeMap;

/// How a field of a patch is combined with the same field of its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStrategy {
    /// List of records merged element-wise by the named key field.
    MergeByKey { key: &'static str },
    /// Whole-value replacement.
    Replace,
    /// Recursive, key-wise merge of maps.
    Merge,
}

/// Patch policy of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    pub strategy: PatchStrategy,
    /// Schema type of the field's value (of its elements, for lists).
    /// `None` for free-form values.
    pub type_name: Option<&'static str>,
}

impl FieldMeta {
    pub const fn merge(type_name: &'static str) -> Self {
        Self {
            strategy: PatchStrategy::Merge,
            type_name: Some(type_name),
        }
    }

    pub const fn merge_by_key(key: &'static str, type_name: &'static str) -> Self {
        Self {
            strategy: PatchStrategy::MergeByKey { key },
            type_name: Some(type_name),
        }
    }

    pub const fn replace() -> Self {
        Self {
            strategy: PatchStrategy::Replace,
            type_name: None,
        }
    }

    /// Recursive merge of a free-form map.
    pub const fn free_map() -> Self {
        Self {
            strategy: PatchStrategy::Merge,
            type_name: None,
        }
    }
}

/// `(type, field) -> FieldMeta` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchMeta {
    types: BTreeMap<&'static str, BTreeMap<&'static str, FieldMeta>>,
}

impl PatchMeta {
    /// Type name of the document root.
    pub const ROOT: &'static str = "TemplateSpecContent";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(
        mut self,
        type_name: &'static str,
        field: &'static str,
        meta: FieldMeta,
    ) -> Self {
        self.types.entry(type_name).or_default().insert(field, meta);
        self
    }

    /// Returns the policy of `field` in `type_name`, if the table lists it.
    pub fn field(&self, type_name: &str, field: &str) -> Option<FieldMeta> {
        self.types.get(type_name)?.get(field).copied()
    }

    /// Returns `true` if the table describes `type_name`.
    pub fn knows(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Table for [`TemplateSpecContent`](crate::TemplateSpecContent) and
    /// every type reachable from it.
    pub fn template_content() -> Self {
        Self::new()
            .with_field(Self::ROOT, "attributes", FieldMeta::free_map())
            .with_field(Self::ROOT, "components", FieldMeta::merge_by_key("name", "Component"))
            .with_field(Self::ROOT, "projects", FieldMeta::merge_by_key("name", "Project"))
            .with_field(
                Self::ROOT,
                "starterProjects",
                FieldMeta::merge_by_key("name", "StarterProject"),
            )
            .with_field(Self::ROOT, "commands", FieldMeta::merge_by_key("id", "Command"))
            .with_field(Self::ROOT, "events", FieldMeta::merge("Events"))
            // events
            .with_field("Events", "preStart", FieldMeta::replace())
            .with_field("Events", "postStart", FieldMeta::replace())
            .with_field("Events", "preStop", FieldMeta::replace())
            .with_field("Events", "postStop", FieldMeta::replace())
            // commands
            .with_field("Command", "attributes", FieldMeta::free_map())
            .with_field("Command", "exec", FieldMeta::merge("ExecCommand"))
            .with_field("Command", "apply", FieldMeta::merge("ApplyCommand"))
            .with_field("Command", "composite", FieldMeta::merge("CompositeCommand"))
            .with_field("Command", "custom", FieldMeta::merge("CustomCommand"))
            .with_field("ExecCommand", "args", FieldMeta::replace())
            .with_field("ExecCommand", "env", FieldMeta::merge_by_key("name", "EnvVar"))
            .with_field("ExecCommand", "group", FieldMeta::merge("CommandGroup"))
            .with_field("ApplyCommand", "group", FieldMeta::merge("CommandGroup"))
            .with_field("CompositeCommand", "commands", FieldMeta::replace())
            .with_field("CompositeCommand", "group", FieldMeta::merge("CommandGroup"))
            .with_field("CustomCommand", "embeddedResource", FieldMeta::replace())
            .with_field("CustomCommand", "group", FieldMeta::merge("CommandGroup"))
            // components
            .with_field("Component", "container", FieldMeta::merge("ContainerComponent"))
            .with_field("Component", "kubernetes", FieldMeta::merge("K8sLikeComponent"))
            .with_field("Component", "openshift", FieldMeta::merge("K8sLikeComponent"))
            .with_field("Component", "volume", FieldMeta::merge("VolumeComponent"))
            .with_field("Component", "plugin", FieldMeta::merge("PluginComponent"))
            .with_field("Component", "custom", FieldMeta::merge("CustomComponent"))
            .with_field("ContainerComponent", "command", FieldMeta::replace())
            .with_field("ContainerComponent", "args", FieldMeta::replace())
            .with_field("ContainerComponent", "env", FieldMeta::merge_by_key("name", "EnvVar"))
            .with_field(
                "ContainerComponent",
                "volumeMounts",
                FieldMeta::merge_by_key("name", "VolumeMount"),
            )
            .with_field(
                "ContainerComponent",
                "endpoints",
                FieldMeta::merge_by_key("name", "Endpoint"),
            )
            .with_field("K8sLikeComponent", "endpoints", FieldMeta::merge_by_key("name", "Endpoint"))
            .with_field("Endpoint", "attributes", FieldMeta::free_map())
            .with_field("CustomComponent", "embeddedResource", FieldMeta::replace())
            // Nested plugin overrides keep their components unkeyed, so they
            // are replaced as a whole.
            .with_field("PluginComponent", "components", FieldMeta::replace())
            .with_field("PluginComponent", "commands", FieldMeta::merge_by_key("id", "Command"))
            .with_field(
                "PluginComponent",
                "kubernetes",
                FieldMeta::merge("KubernetesCustomResourceImportReference"),
            )
            // projects
            .with_field("Project", "sparseCheckoutDirs", FieldMeta::replace())
            .with_field("Project", "git", FieldMeta::merge("GitProjectSource"))
            .with_field("Project", "github", FieldMeta::merge("GitProjectSource"))
            .with_field("Project", "zip", FieldMeta::merge("ZipProjectSource"))
            .with_field("Project", "custom", FieldMeta::merge("CustomProjectSource"))
            .with_field("StarterProject", "git", FieldMeta::merge("GitProjectSource"))
            .with_field("StarterProject", "github", FieldMeta::merge("GitProjectSource"))
            .with_field("StarterProject", "zip", FieldMeta::merge("ZipProjectSource"))
            .with_field("StarterProject", "custom", FieldMeta::merge("CustomProjectSource"))
            .with_field("GitProjectSource", "checkoutFrom", FieldMeta::merge("CheckoutFrom"))
            .with_field("GitProjectSource", "remotes", FieldMeta::free_map())
            .with_field("CustomProjectSource", "embeddedResource", FieldMeta::replace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlisted_field_has_no_entry() {
        let meta = PatchMeta::template_content();
        assert_eq!(meta.field("ContainerComponent", "image"), None);
        assert_eq!(meta.field("NoSuchType", "image"), None);
    }

    #[test]
    fn test_keyed_lists_name_their_element_type() {
        let meta = PatchMeta::template_content();
        for (field, key, element) in [
            ("components", "name", "Component"),
            ("projects", "name", "Project"),
            ("starterProjects", "name", "StarterProject"),
            ("commands", "id", "Command"),
        ] {
            let entry = meta.field(PatchMeta::ROOT, field).unwrap();
            assert_eq!(entry.strategy, PatchStrategy::MergeByKey { key });
            assert_eq!(entry.type_name, Some(element));
            assert!(meta.knows(element), "{element} has no entries");
        }
    }

    #[test]
    fn test_with_field_overrides_previous_entry() {
        let meta = PatchMeta::new()
            .with_field("T", "f", FieldMeta::replace())
            .with_field("T", "f", FieldMeta::free_map());
        assert_eq!(meta.field("T", "f"), Some(FieldMeta::free_map()));
    }
}
