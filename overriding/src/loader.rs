//! Parsing and loading of template documents.
//!
//! Documents are YAML; JSON input is accepted as well since it parses as
//! YAML. The byte-level entry points parse their inputs and run the
//! default engine.
//!
//! # Loading patterns
//!
//! ```no_run
//! use devtemplate_overriding::{load_content, load_template, override_bytes};
//!
//! let template = load_template("devfile.yaml").unwrap();
//! let parent = load_content("parent.flattened.yaml").unwrap();
//!
//! let patched = override_bytes(
//!     &std::fs::read("parent.flattened.yaml").unwrap(),
//!     b"components: [{container: {name: runtime, image: 'node:22'}}]",
//! )
//! .unwrap();
//! ```

use std::io::BufReader;
use std::path::Path;

use devtemplate_core::{ParentOverrides, PluginOverrides, TemplateSpec, TemplateSpecContent};
use serde::de::DeserializeOwned;

use crate::engine::TemplateEngine;
use crate::error::Result;

fn parse<T: DeserializeOwned>(input: &[u8]) -> Result<T> {
    Ok(serde_yaml::from_slice(input)?)
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_yaml::from_reader(reader)?)
}

/// Parses template content.
///
/// # Examples
///
/// ```
/// use devtemplate_overriding::parse_content;
///
/// let content = parse_content(r#"
/// components:
///   - volume:
///       name: cache
/// commands:
///   - id: build
///     exec:
///       commandLine: make
/// "#).unwrap();
/// assert_eq!(content.components.len(), 1);
/// assert_eq!(content.commands[0].id, "build");
/// ```
///
/// # Errors
///
/// Returns [`YamlError`](crate::EngineError::YamlError) if the input is not
/// valid YAML or does not have the shape of template content.
pub fn parse_content(input: &str) -> Result<TemplateSpecContent> {
    parse(input.as_bytes())
}

/// Parses parent overrides.
pub fn parse_parent_overrides(input: &str) -> Result<ParentOverrides> {
    parse(input.as_bytes())
}

/// Parses plugin overrides.
pub fn parse_plugin_overrides(input: &str) -> Result<PluginOverrides> {
    parse(input.as_bytes())
}

/// Parses a complete template, parent included.
pub fn parse_template(input: &str) -> Result<TemplateSpec> {
    parse(input.as_bytes())
}

/// Loads template content from a YAML or JSON file.
///
/// # Errors
///
/// Returns [`IoError`](crate::EngineError::IoError) if the file cannot be
/// read, or [`YamlError`](crate::EngineError::YamlError) if parsing fails.
pub fn load_content(path: impl AsRef<Path>) -> Result<TemplateSpecContent> {
    load(path.as_ref())
}

/// Loads a complete template from a YAML or JSON file.
///
/// # Errors
///
/// Same as [`load_content`].
pub fn load_template(path: impl AsRef<Path>) -> Result<TemplateSpec> {
    load(path.as_ref())
}

/// Parses `original` as content and `patch` as parent overrides, then
/// applies the patch with the default engine.
///
/// # Examples
///
/// ```
/// use devtemplate_overriding::override_bytes;
///
/// let original = br#"{"commands": [{"id": "run", "exec": {"commandLine": "./run", "args": ["a"]}}]}"#;
/// let patch = b"commands: [{id: run, exec: {args: [b]}}]";
///
/// let result = override_bytes(original, patch).unwrap();
/// assert_eq!(result.commands[0].union.exec.as_ref().unwrap().args, vec!["b"]);
/// ```
///
/// # Errors
///
/// Returns [`YamlError`](crate::EngineError::YamlError) if either input
/// fails to parse, plus any error of
/// [`TemplateEngine::override_content`].
pub fn override_bytes(original: &[u8], patch: &[u8]) -> Result<TemplateSpecContent> {
    let original: TemplateSpecContent = parse(original)?;
    let patch: ParentOverrides = parse(patch)?;
    TemplateEngine::default().override_content(&original, &patch)
}

/// Parses every input as content and merges them with the default engine.
///
/// # Errors
///
/// Returns [`YamlError`](crate::EngineError::YamlError) if an input fails
/// to parse, plus any error of [`TemplateEngine::merge`].
pub fn merge_bytes(main: &[u8], parent: Option<&[u8]>, plugins: &[&[u8]]) -> Result<TemplateSpecContent> {
    let main: TemplateSpecContent = parse(main)?;
    let parent: Option<TemplateSpecContent> = parent.map(parse).transpose()?;
    let plugins = plugins
        .iter()
        .map(|plugin| parse(plugin))
        .collect::<Result<Vec<TemplateSpecContent>>>()?;
    TemplateEngine::default().merge(&main, parent.as_ref(), &plugins)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::EngineError;

    #[test]
    fn test_parse_json_input() {
        let content = parse_content(r#"{"components": [{"volume": {"name": "cache", "size": "1Gi"}}]}"#)
            .unwrap();
        let volume = content.components[0].volume.as_ref().unwrap();
        assert_eq!(volume.size.as_deref(), Some("1Gi"));
    }

    #[test]
    fn test_parse_template_with_parent() {
        let template = parse_template(
            r#"
parent:
  id: java-maven
  registryUrl: https://registry.example.com
  commands:
    - id: build
      exec:
        args: [-DskipTests]
components:
  - container:
      name: tools
      image: maven:3
"#,
        )
        .unwrap();
        let parent = template.parent.unwrap();
        assert_eq!(
            parent.import_reference.registry_url.as_deref(),
            Some("https://registry.example.com")
        );
        assert_eq!(parent.overrides.commands[0].id, "build");
        assert_eq!(template.content.components.len(), 1);
    }

    #[test]
    fn test_parse_plugin_overrides() {
        let overrides = parse_plugin_overrides(
            r#"
components:
  - container:
      name: ide
      memoryLimit: 2Gi
"#,
        )
        .unwrap();
        assert_eq!(overrides.components.len(), 1);
        assert!(overrides.commands.is_empty());
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let err = parse_parent_overrides("components: nope").unwrap_err();
        assert!(matches!(err, EngineError::YamlError(_)));
    }

    #[test]
    fn test_load_content_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "projects:\n  - name: api\n    zip:\n      location: api.zip").unwrap();

        let content = load_content(file.path()).unwrap();
        assert_eq!(content.projects[0].name, "api");
    }

    #[test]
    fn test_merge_bytes() {
        let main = b"components: [{container: {name: web, image: nginx}}]";
        let parent: &[u8] = b"components: [{container: {name: web2, image: httpd}}]";
        let merged = merge_bytes(main, Some(parent), &[]).unwrap();
        assert_eq!(merged.components.len(), 2);
    }
}
