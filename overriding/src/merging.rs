//! Merge: composing main content with flattened parent and plugin content.
//!
//! Lists are concatenated in fixed precedence order (parent, each plugin
//! in argument order, then main), event bindings are set-unioned and
//! attributes are key-unioned with the later scope winning. A key that main
//! shares with its parent or one of its plugins is a
//! [`DuplicateKeyError`]. The plugin components of main are references to
//! the plugin contents passed alongside and are not carried forward.

use std::collections::BTreeSet;

use devtemplate_core::{
    Component, ElementType, Events, FieldPath, KeyError, Keyed, KeyedContent, Keying,
    TemplateSpecContent, TopLevelLists, normalize, simplify,
};
use tracing::debug;

use crate::config::EventOrder;
use crate::conflicts::{Scope, check_scope};
use crate::engine::TemplateEngine;
use crate::error::{EngineError, Result};

impl TemplateEngine {
    /// Composes `main` with its flattened `parent` and `plugins`.
    ///
    /// `plugins` are matched by position with the plugin components of
    /// `main`, which only name the conflict scopes in error messages.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DuplicateKeys`] listing every key main shares with
    ///   another scope, sorted by element type then key.
    /// - [`EngineError::AmbiguousUnion`] or
    ///   [`EngineError::UnkeyableElement`] if an input is inconsistent.
    ///
    /// # Examples
    ///
    /// ```
    /// use devtemplate_core::*;
    /// use devtemplate_overriding::{EngineError, TemplateEngine};
    ///
    /// let mut main = TemplateSpecContent::default();
    /// main.components.push(Component::container("web", "nginx"));
    /// let mut parent = TemplateSpecContent::default();
    /// parent.components.push(Component::container("web2", "httpd"));
    ///
    /// let engine = TemplateEngine::default();
    /// let merged = engine.merge(&main, Some(&parent), &[]).unwrap();
    /// assert_eq!(merged.components.len(), 2);
    /// assert_eq!(merged.components[0].name(), Some("web2"));
    ///
    /// parent.components.push(Component::volume("web"));
    /// let err = engine.merge(&main, Some(&parent), &[]).unwrap_err();
    /// assert!(matches!(err, EngineError::DuplicateKeys(_)));
    /// ```
    pub fn merge(
        &self,
        main: &TemplateSpecContent,
        parent: Option<&TemplateSpecContent>,
        plugins: &[TemplateSpecContent],
    ) -> Result<TemplateSpecContent> {
        let mut main = main.clone();
        normalize(&mut main)?;

        let plugin_names = plugin_keys(&main.components)?;
        let total = main.components.len();
        main.components.retain(|component| !component.is_plugin());
        debug!(
            elided = total - main.components.len(),
            plugins = plugins.len(),
            has_parent = parent.is_some(),
            "Merging content"
        );
        let main = main.into_keyed()?;

        let mut layers = Vec::with_capacity(plugins.len() + 1);
        if let Some(parent) = parent {
            layers.push((Scope::Parent, keyed(parent)?));
        }
        for (idx, plugin) in plugins.iter().enumerate() {
            let name = plugin_names
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("#{idx}"));
            layers.push((Scope::Plugin(name), keyed(plugin)?));
        }

        let main_keys = main.top_level_keys();
        let mut conflicts = Vec::new();
        for (scope, layer) in &layers {
            conflicts.extend(check_scope(&main_keys, &layer.top_level_keys(), scope));
        }
        if !conflicts.is_empty() {
            conflicts.sort_by(|a, b| {
                (a.element_type, &a.key, &a.scope).cmp(&(b.element_type, &b.key, &b.scope))
            });
            debug!(conflicts = conflicts.len(), "Merge conflicts found");
            return Err(EngineError::DuplicateKeys(conflicts));
        }

        let contents: Vec<KeyedContent> = layers
            .into_iter()
            .map(|(_, layer)| layer)
            .chain(std::iter::once(main))
            .collect();
        let events = union_events(&contents, self.config.event_order);

        let mut merged = KeyedContent {
            events,
            ..KeyedContent::default()
        };
        for content in contents {
            merged.attributes.extend(content.attributes);
            merged.components.extend(content.components);
            merged.projects.extend(content.projects);
            merged.starter_projects.extend(content.starter_projects);
            merged.commands.extend(content.commands);
        }

        let mut result = TemplateSpecContent::from_keyed(merged);
        simplify(&mut result)?;
        debug!(
            components = result.components.len(),
            commands = result.commands.len(),
            "Merged content"
        );
        Ok(result)
    }
}

fn keyed(content: &TemplateSpecContent) -> Result<KeyedContent> {
    let mut content = content.clone();
    normalize(&mut content)?;
    Ok(content.into_keyed()?)
}

/// Keys of the plugin components of a normalized component list, in order.
pub(crate) fn plugin_keys(components: &[Component]) -> Result<Vec<String>> {
    components
        .iter()
        .enumerate()
        .filter(|(_, component)| component.is_plugin())
        .map(|(idx, component)| {
            component.key().map_err(|reason| {
                EngineError::from(KeyError {
                    element_type: ElementType::Component,
                    path: FieldPath::root().field("components").index(idx),
                    reason,
                })
            })
        })
        .collect()
}

/// Set union of the event bindings of every layer.
///
/// Returns `None` when no layer has events.
fn union_events(layers: &[KeyedContent], order: EventOrder) -> Option<Events> {
    let events: Vec<&Events> = layers.iter().filter_map(|l| l.events.as_ref()).collect();
    if events.is_empty() {
        return None;
    }
    Some(Events {
        pre_start: union_lists(events.iter().map(|e| e.pre_start.as_slice()), order),
        post_start: union_lists(events.iter().map(|e| e.post_start.as_slice()), order),
        pre_stop: union_lists(events.iter().map(|e| e.pre_stop.as_slice()), order),
        post_stop: union_lists(events.iter().map(|e| e.post_stop.as_slice()), order),
    })
}

fn union_lists<'a>(lists: impl Iterator<Item = &'a [String]>, order: EventOrder) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut union: Vec<String> = lists
        .flatten()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();
    if order == EventOrder::Sorted {
        union.sort();
    }
    union
}

/// Composes `main` with its parent and plugins using the default engine.
///
/// See [`TemplateEngine::merge`].
pub fn merge(
    main: &TemplateSpecContent,
    parent: Option<&TemplateSpecContent>,
    plugins: &[TemplateSpecContent],
) -> Result<TemplateSpecContent> {
    TemplateEngine::default().merge(main, parent, plugins)
}

#[cfg(test)]
mod tests {
    use devtemplate_core::*;
    use serde_json::json;

    use super::*;
    use crate::EngineConfig;

    fn with_post_stop(ids: &[&str]) -> TemplateSpecContent {
        let mut content = TemplateSpecContent::default();
        content.events = Some(Events {
            post_stop: ids.iter().map(|id| id.to_string()).collect(),
            ..Default::default()
        });
        content
    }

    #[test]
    fn test_union_lists_keeps_first_occurrence() {
        let a = vec!["b".to_string(), "a".to_string()];
        let b = vec!["a".to_string(), "c".to_string()];
        let lists = [a.as_slice(), b.as_slice()];
        assert_eq!(
            union_lists(lists.into_iter(), EventOrder::Precedence),
            vec!["b", "a", "c"]
        );
        assert_eq!(
            union_lists(lists.into_iter(), EventOrder::Sorted),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_events_are_unioned() {
        let main = with_post_stop(&["a"]);
        let parent = with_post_stop(&["a", "b"]);

        let merged = merge(&main, Some(&parent), &[]).unwrap();
        let post_stop: BTreeSet<String> =
            merged.events.unwrap().post_stop.into_iter().collect();
        assert_eq!(post_stop, BTreeSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_events_absent_when_no_input_has_them() {
        let merged = merge(
            &TemplateSpecContent::default(),
            Some(&TemplateSpecContent::default()),
            &[],
        )
        .unwrap();
        assert_eq!(merged.events, None);
    }

    #[test]
    fn test_sorted_event_order() {
        let engine = TemplateEngine::new(EngineConfig {
            event_order: EventOrder::Sorted,
            ..EngineConfig::default()
        });
        let main = with_post_stop(&["z", "m"]);
        let parent = with_post_stop(&["q"]);
        let merged = engine.merge(&main, Some(&parent), &[]).unwrap();
        assert_eq!(merged.events.unwrap().post_stop, vec!["m", "q", "z"]);
    }

    #[test]
    fn test_attributes_later_scope_wins() {
        let mut main = TemplateSpecContent::default();
        main.attributes.insert("tier".into(), json!("main"));
        let mut parent = TemplateSpecContent::default();
        parent.attributes.insert("tier".into(), json!("parent"));
        parent.attributes.insert("owner".into(), json!("team"));

        let merged = merge(&main, Some(&parent), &[]).unwrap();
        assert_eq!(merged.attributes["tier"], json!("main"));
        assert_eq!(merged.attributes["owner"], json!("team"));
    }

    #[test]
    fn test_lists_concatenate_in_precedence_order() {
        let mut main = TemplateSpecContent::default();
        main.commands.push(Command::exec("main-cmd", "true"));
        let mut parent = TemplateSpecContent::default();
        parent.commands.push(Command::exec("parent-cmd", "true"));
        let mut plugin = TemplateSpecContent::default();
        plugin.commands.push(Command::exec("plugin-cmd", "true"));

        let merged = merge(&main, Some(&parent), &[plugin]).unwrap();
        let ids: Vec<&str> = merged.commands.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["parent-cmd", "plugin-cmd", "main-cmd"]);
    }

    #[test]
    fn test_conflicts_name_plugin_scope() {
        let mut main = TemplateSpecContent::default();
        main.components.push(Component::plugin(PluginComponent::named(
            "ed",
            ImportReference::id("editor"),
        )));
        main.commands.push(Command::exec("run", "true"));
        let mut plugin = TemplateSpecContent::default();
        plugin.commands.push(Command::exec("run", "true"));

        let err = merge(&main, None, &[plugin]).unwrap_err();
        match err {
            EngineError::DuplicateKeys(conflicts) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].scope, Scope::Plugin("ed".to_string()));
                assert_eq!(
                    conflicts[0].to_string(),
                    "command 'run' is already defined in plugin 'ed'"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unmatched_plugin_scope_uses_index() {
        let mut main = TemplateSpecContent::default();
        main.projects.push(Project::new("api", ProjectSource::zip("a.zip")));
        let mut plugin = TemplateSpecContent::default();
        plugin.projects.push(Project::new("api", ProjectSource::zip("b.zip")));

        let err = merge(&main, None, &[plugin]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "project 'api' is already defined in plugin '#0'"
        );
    }

    #[test]
    fn test_conflicts_are_sorted_by_type_then_key() {
        let mut main = TemplateSpecContent::default();
        main.components.push(Component::volume("z"));
        main.components.push(Component::volume("a"));
        main.commands.push(Command::exec("build", "true"));
        let parent = main.clone();

        let err = merge(&main, Some(&parent), &[]).unwrap_err();
        let EngineError::DuplicateKeys(conflicts) = err else {
            panic!("expected duplicate keys");
        };
        let found: Vec<(ElementType, &str)> = conflicts
            .iter()
            .map(|c| (c.element_type, c.key.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (ElementType::Command, "build"),
                (ElementType::Component, "a"),
                (ElementType::Component, "z"),
            ]
        );
    }
}
