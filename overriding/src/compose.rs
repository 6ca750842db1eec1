//! Template composition from already-resolved imports.
//!
//! Fetching a parent or plugin is the caller's business. [`ResolvedImports`]
//! carries their flattened content; [`TemplateEngine::compose`] applies
//! the template's overrides onto each import and merges the results with
//! the template's own content.

use std::collections::BTreeMap;

use devtemplate_core::{ComponentVariant, TemplateSpec, TemplateSpecContent, normalize};
use tracing::debug;

use crate::conflicts::Scope;
use crate::engine::TemplateEngine;
use crate::error::{EngineError, Result};
use crate::merging::plugin_keys;

/// Flattened content of the imports of a template.
///
/// Plugins are looked up by the key of the component importing them: its
/// explicit name, or the key derived from its import reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedImports {
    pub parent: Option<TemplateSpecContent>,
    pub plugins: BTreeMap<String, TemplateSpecContent>,
}

impl ResolvedImports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, content: TemplateSpecContent) -> Self {
        self.parent = Some(content);
        self
    }

    pub fn with_plugin(mut self, key: impl Into<String>, content: TemplateSpecContent) -> Self {
        self.plugins.insert(key.into(), content);
        self
    }
}

impl TemplateEngine {
    /// Resolves a template into flat content.
    ///
    /// The parent import is overridden with the template's parent
    /// overrides, each plugin import with the overrides of its plugin
    /// component, and everything is then merged with the template's content.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingImport`] if the template references a
    /// parent or plugin that `imports` does not supply, plus any error of
    /// [`override_content`](Self::override_content) or
    /// [`merge`](Self::merge).
    ///
    /// # Examples
    ///
    /// ```
    /// use devtemplate_core::*;
    /// use devtemplate_overriding::{ResolvedImports, TemplateEngine};
    ///
    /// let mut spec = TemplateSpec::default();
    /// let mut parent = Parent::new(ImportReference::id("nodejs"));
    /// parent.overrides.components.push(Component::container("runtime", "node:22"));
    /// spec.parent = Some(parent);
    /// spec.content.commands.push(Command::exec("start", "npm start").with_component("runtime"));
    ///
    /// let mut base = TemplateSpecContent::default();
    /// base.components.push(Component::container("runtime", "node:18"));
    /// let imports = ResolvedImports::new().with_parent(base);
    ///
    /// let flat = TemplateEngine::default().compose(&spec, &imports).unwrap();
    /// let runtime = flat.components[0].container.as_ref().unwrap();
    /// assert_eq!(runtime.image.as_deref(), Some("node:22"));
    /// assert!(validate_content(&flat).is_empty());
    /// ```
    pub fn compose(&self, spec: &TemplateSpec, imports: &ResolvedImports) -> Result<TemplateSpecContent> {
        let mut spec = spec.clone();
        normalize(&mut spec)?;

        let parent = match &spec.parent {
            Some(parent) => {
                let content = imports
                    .parent
                    .as_ref()
                    .ok_or(EngineError::MissingImport(Scope::Parent))?;
                Some(self.override_content(content, &parent.overrides)?)
            }
            None => None,
        };

        let keys = plugin_keys(&spec.content.components)?;
        let plugin_components = spec
            .content
            .components
            .iter()
            .filter_map(|component| match component.variant() {
                Some(ComponentVariant::Plugin(plugin)) => Some(plugin),
                _ => None,
            });
        let mut plugins = Vec::with_capacity(keys.len());
        for (key, plugin) in keys.iter().zip(plugin_components) {
            let content = imports
                .plugins
                .get(key)
                .ok_or_else(|| EngineError::MissingImport(Scope::Plugin(key.clone())))?;
            plugins.push(self.override_content(content, &plugin.overrides)?);
        }
        debug!(plugins = ?keys, has_parent = parent.is_some(), "Resolved imports");

        self.merge(&spec.content, parent.as_ref(), &plugins)
    }
}

#[cfg(test)]
mod tests {
    use devtemplate_core::*;

    use super::*;

    fn spec_with_plugin() -> TemplateSpec {
        let mut spec = TemplateSpec::default();
        let plugin = PluginComponent::new(ImportReference::kubernetes("theia", Some("plugins")))
            .with_overrides(PluginOverrides {
                components: vec![ComponentOverride::container(ContainerComponent {
                    name: "theia-ide".into(),
                    memory_limit: Some("2Gi".into()),
                    ..Default::default()
                })],
                commands: Vec::new(),
            });
        spec.content.components.push(Component::plugin(plugin));
        spec.content
            .components
            .push(Component::container("tools", "quay.io/tools"));
        spec
    }

    fn theia() -> TemplateSpecContent {
        let mut content = TemplateSpecContent::default();
        content
            .components
            .push(Component::container("theia-ide", "quay.io/theia"));
        content
    }

    #[test]
    fn test_plugin_overrides_applied_before_merge() {
        let imports = ResolvedImports::new().with_plugin("plugins/theia", theia());
        let flat = TemplateEngine::default()
            .compose(&spec_with_plugin(), &imports)
            .unwrap();

        let names: Vec<&str> = flat.components.iter().filter_map(Component::name).collect();
        assert_eq!(names, vec!["theia-ide", "tools"]);
        let ide = flat.components[0].container.as_ref().unwrap();
        assert_eq!(ide.memory_limit.as_deref(), Some("2Gi"));
        assert!(flat.components.iter().all(|c| !c.is_plugin()));
    }

    #[test]
    fn test_missing_plugin_import() {
        let err = TemplateEngine::default()
            .compose(&spec_with_plugin(), &ResolvedImports::new())
            .unwrap_err();
        match err {
            EngineError::MissingImport(scope) => {
                assert_eq!(scope, Scope::Plugin("plugins/theia".to_string()))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_parent_import() {
        let spec = TemplateSpec {
            parent: Some(Parent::new(ImportReference::uri("https://example.com/base.yaml"))),
            ..Default::default()
        };
        let err = TemplateEngine::default()
            .compose(&spec, &ResolvedImports::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "no resolved content supplied for parent");
    }

    #[test]
    fn test_compose_without_imports_simplifies_content() {
        let mut spec = TemplateSpec::default();
        spec.content.components.push(Component::volume("cache"));
        let flat = TemplateEngine::default()
            .compose(&spec, &ResolvedImports::new())
            .unwrap();
        assert_eq!(flat.components, vec![Component::volume("cache")]);
    }
}
