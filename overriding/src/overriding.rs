//! Override: patching content with a partial override document.
//!
//! The base is normalized strictly and the patch leniently (an override
//! element that sets no variant leaves the base variant alone). Both are
//! converted to their keyed form and lowered to generic documents, the
//! patch is applied with [`patch_document`], and the result is raised back,
//! de-keyed and simplified.

use std::collections::BTreeSet;

use devtemplate_core::{
    KeyedContent, Keying, TemplateSpecContent, TopLevelLists, UnionTree, from_document,
    normalize, normalize_partial, simplify, to_document,
};
use tracing::debug;

use crate::conflicts::UnknownOverrideError;
use crate::engine::TemplateEngine;
use crate::error::{EngineError, Result};
use crate::patch::patch_document;

impl TemplateEngine {
    /// Applies `patch` onto `base` and returns the simplified result.
    ///
    /// Neither argument is modified. `patch` can be any override document:
    /// [`ParentOverrides`](devtemplate_core::ParentOverrides),
    /// [`PluginOverrides`](devtemplate_core::PluginOverrides), or full
    /// content.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AmbiguousUnion`] if a union of either input, or of
    ///   the patched result, is inconsistent.
    /// - [`EngineError::UnkeyableElement`] if an element has no key.
    /// - [`EngineError::SchemaMismatch`] if the patch does not fit the
    ///   shape of the base.
    /// - [`EngineError::UnknownOverride`] if new elements are disallowed
    ///   and the patch names a key missing from the base.
    ///
    /// # Examples
    ///
    /// ```
    /// use devtemplate_core::*;
    /// use devtemplate_overriding::TemplateEngine;
    ///
    /// let mut base = TemplateSpecContent::default();
    /// base.components.push(Component::container("web", "nginx:1.25"));
    ///
    /// let mut patch = ParentOverrides::default();
    /// patch.components.push(Component::container("web", "nginx:1.27"));
    ///
    /// let result = TemplateEngine::default().override_content(&base, &patch).unwrap();
    /// let web = result.components[0].container.as_ref().unwrap();
    /// assert_eq!(web.image.as_deref(), Some("nginx:1.27"));
    /// assert_eq!(result.components[0].component_type, None);
    /// ```
    pub fn override_content<P>(&self, base: &TemplateSpecContent, patch: &P) -> Result<TemplateSpecContent>
    where
        P: Keying + UnionTree + Clone,
    {
        let mut base = base.clone();
        normalize(&mut base)?;
        let mut patch = patch.clone();
        normalize_partial(&mut patch)?;

        let base = base.into_keyed()?;
        let patch = patch.into_keyed()?;
        if !self.config.allow_new_elements {
            ensure_only_existing(&base, &patch)?;
        }

        let mut document = to_document(&base)?;
        let stats = patch_document(&self.meta, &mut document, to_document(&patch)?)?;
        debug!(merged = stats.merged, appended = stats.appended, "Applied override");

        let keyed: KeyedContent = from_document(document)?;
        let mut result = TemplateSpecContent::from_keyed(keyed);
        simplify(&mut result)?;
        Ok(result)
    }
}

/// Fails if `patch` names an element key that `base` does not define.
///
/// Every list is checked; the error holds one entry per element type with
/// unknown keys, in element type order.
fn ensure_only_existing<B, P>(base: &B, patch: &P) -> Result<()>
where
    B: TopLevelLists,
    P: TopLevelLists,
{
    let base_keys = base.top_level_keys();
    let mut failures = Vec::new();
    for (element_type, keys) in patch.top_level_keys().iter() {
        let existing: BTreeSet<&str> = base_keys
            .get(element_type)
            .iter()
            .map(String::as_str)
            .collect();
        let unknown: BTreeSet<&str> = keys
            .iter()
            .map(String::as_str)
            .filter(|key| !existing.contains(key))
            .collect();
        if !unknown.is_empty() {
            failures.push(UnknownOverrideError {
                element_type,
                keys: unknown.into_iter().map(str::to_string).collect(),
            });
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(EngineError::UnknownOverride(failures))
    }
}

/// Applies `patch` onto `base` with the default engine.
///
/// See [`TemplateEngine::override_content`].
pub fn override_content<P>(base: &TemplateSpecContent, patch: &P) -> Result<TemplateSpecContent>
where
    P: Keying + UnionTree + Clone,
{
    TemplateEngine::default().override_content(base, patch)
}

#[cfg(test)]
mod tests {
    use devtemplate_core::*;
    use serde_json::json;

    use super::*;
    use crate::EngineConfig;

    fn base() -> TemplateSpecContent {
        let mut base = TemplateSpecContent::default();
        base.components.push(Component::container("web", "nginx:1"));
        base.components.push(Component::volume("cache"));
        base.commands.push(
            Command::exec("build", "make")
                .with_component("web")
                .with_args(["-j4", "all"]),
        );
        base.commands.push(Command::exec("test", "make test"));
        base
    }

    #[test]
    fn test_empty_patch_simplifies_base() {
        let base = base();
        let result = override_content(&base, &ParentOverrides::default()).unwrap();

        let mut expected = base.clone();
        normalize(&mut expected).unwrap();
        simplify(&mut expected).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_patch_overrides_scalar_and_keeps_siblings() {
        let mut patch = ParentOverrides::default();
        patch.components.push(Component {
            container: Some(ContainerComponent {
                name: "web".into(),
                memory_limit: Some("1Gi".into()),
                ..Default::default()
            }),
            ..Default::default()
        });

        let result = override_content(&base(), &patch).unwrap();
        let web = result.components[0].container.as_ref().unwrap();
        assert_eq!(web.memory_limit.as_deref(), Some("1Gi"));
        assert_eq!(web.image.as_deref(), Some("nginx:1"));
        assert_eq!(result.components.len(), 2);
    }

    #[test]
    fn test_patch_args_replace_base_args() {
        let mut patch = ParentOverrides::default();
        patch.commands.push(Command::exec("build", "make").with_args(["x"]));

        let result = override_content(&base(), &patch).unwrap();
        let build = result.find_command("build").unwrap();
        assert_eq!(build.union.exec.as_ref().unwrap().args, vec!["x"]);
        assert_eq!(build.component(), Some("web"));
        assert!(result.find_command("test").is_some());
    }

    #[test]
    fn test_patch_can_change_variant() {
        let mut patch = ParentOverrides::default();
        patch
            .components
            .push(Component::kubernetes("cache", "cache.yaml"));

        let result = override_content(&base(), &patch).unwrap();
        let cache = &result.components[1];
        assert!(cache.volume.is_none());
        assert_eq!(
            cache.kubernetes.as_ref().unwrap().location.uri.as_deref(),
            Some("cache.yaml")
        );
    }

    #[test]
    fn test_plugin_overrides_patch_components() {
        let mut patch = PluginOverrides::default();
        patch.components.push(ComponentOverride::container(ContainerComponent {
            name: "web".into(),
            image: Some("nginx:2".into()),
            ..Default::default()
        }));

        let result = override_content(&base(), &patch).unwrap();
        let web = result.components[0].container.as_ref().unwrap();
        assert_eq!(web.image.as_deref(), Some("nginx:2"));
    }

    #[test]
    fn test_new_element_without_variant_is_rejected() {
        let patch: ParentOverrides =
            from_document(json!({"projects": [{"name": "api", "clonePath": "api"}]})).unwrap();
        let err = override_content(&base(), &patch).unwrap_err();
        assert!(matches!(err, EngineError::AmbiguousUnion(_)));
    }

    #[test]
    fn test_strict_engine_rejects_unknown_keys() {
        let engine = TemplateEngine::new(EngineConfig::strict());
        let mut patch = ParentOverrides::default();
        patch.commands.push(Command::exec("lint", "make lint"));
        patch.commands.push(Command::exec("deploy", "make deploy"));
        patch.commands.push(Command::exec("test", "make check"));

        let err = engine.override_content(&base(), &patch).unwrap_err();
        match err {
            EngineError::UnknownOverride(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].element_type, ElementType::Command);
                assert_eq!(failures[0].keys, vec!["deploy", "lint"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_engine_reports_every_element_type() {
        let engine = TemplateEngine::new(EngineConfig::strict());
        let mut patch = ParentOverrides::default();
        patch.components.push(Component::volume("scratch"));
        patch.commands.push(Command::exec("deploy", "make deploy"));
        patch.commands.push(Command::exec("test", "make check"));

        let err = engine.override_content(&base(), &patch).unwrap_err();
        let EngineError::UnknownOverride(failures) = &err else {
            panic!("unexpected error: {err}");
        };
        let found: Vec<(ElementType, &[String])> = failures
            .iter()
            .map(|f| (f.element_type, f.keys.as_slice()))
            .collect();
        assert_eq!(
            found,
            vec![
                (ElementType::Command, ["deploy".to_string()].as_slice()),
                (ElementType::Component, ["scratch".to_string()].as_slice()),
            ]
        );
        assert_eq!(
            err.to_string(),
            "some command overrides do not touch any existing element: deploy; \
             some component overrides do not touch any existing element: scratch"
        );
    }

    #[test]
    fn test_strict_engine_accepts_existing_keys() {
        let engine = TemplateEngine::new(EngineConfig::strict());
        let mut patch = ParentOverrides::default();
        patch.commands.push(Command::exec("test", "make check"));
        assert!(engine.override_content(&base(), &patch).is_ok());
    }
}
