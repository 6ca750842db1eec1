//! Structural validation of template content.
//!
//! Catches inconsistent unions, unkeyable or duplicate elements and
//! dangling references between commands, components and events before they
//! reach composition.
//!
//! # Examples
//!
//! ```
//! use devtemplate_core::*;
//!
//! let mut content = TemplateSpecContent::default();
//! content.components.push(Component::container("tools", "quay.io/tools"));
//! content.commands.push(Command::exec("build", "make").with_component("tools"));
//! assert!(validate_content(&content).is_empty());
//!
//! // Invalid: the command runs in a component that does not exist
//! content.commands.push(Command::exec("test", "make test").with_component("runner"));
//! let errors = validate_content(&content);
//! assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownComponent { .. })));
//! ```

use std::collections::BTreeSet;

use thiserror::Error;

use crate::{
    CommandVariant, ElementType, KeyError, Keyed, TemplateSpecContent, UnionError, normalize,
};

/// Content validation errors.
///
/// Each variant describes a specific structural problem found during
/// validation. The `Display` impl provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A union has zero or several variants set, or a dangling discriminator.
    #[error(transparent)]
    Union(#[from] UnionError),
    /// An element has no derivable key.
    #[error(transparent)]
    Key(#[from] KeyError),
    /// Two elements of the same list share a key.
    #[error("duplicate {element_type} key: {key}")]
    DuplicateKey {
        element_type: ElementType,
        key: String,
    },
    /// An event is bound to a command that is not defined.
    #[error("event {event} references unknown command: {command}")]
    UnknownEventCommand { event: &'static str, command: String },
    /// A composite command runs a command that is not defined.
    #[error("composite command {command} references unknown command: {missing}")]
    UnknownCompositeCommand { command: String, missing: String },
    /// An exec or apply command targets a component that is not defined.
    #[error("command {command} references unknown component: {component}")]
    UnknownComponent { command: String, component: String },
}

/// Validates template content.
///
/// Union consistency is checked first; if any union is inconsistent the
/// remaining checks are skipped, since keys and references are read from
/// the normalized variants. All other findings are reported together.
///
/// # Examples
///
/// ```
/// use devtemplate_core::*;
///
/// let mut content = TemplateSpecContent::default();
/// content.components.push(Component::volume("cache"));
/// content.components.push(Component::volume("cache"));
///
/// let errors = validate_content(&content);
/// assert_eq!(
///     errors,
///     vec![ValidationError::DuplicateKey {
///         element_type: ElementType::Component,
///         key: "cache".to_string(),
///     }]
/// );
/// ```
pub fn validate_content(content: &TemplateSpecContent) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut content = content.clone();
    if let Err(err) = normalize(&mut content) {
        errors.push(err.into());
        return errors;
    }

    let commands = collect_keys(&content.commands, &mut errors);
    let components = collect_keys(&content.components, &mut errors);
    collect_keys(&content.projects, &mut errors);
    collect_keys(&content.starter_projects, &mut errors);

    if let Some(events) = &content.events {
        for (event, bound) in events.bindings() {
            for command in bound {
                if !commands.contains(command.as_str()) {
                    errors.push(ValidationError::UnknownEventCommand {
                        event,
                        command: command.clone(),
                    });
                }
            }
        }
    }

    for command in &content.commands {
        match command.union.variant() {
            Some(CommandVariant::Composite(composite)) => {
                for sub in &composite.commands {
                    if !commands.contains(sub.as_str()) {
                        errors.push(ValidationError::UnknownCompositeCommand {
                            command: command.id.clone(),
                            missing: sub.clone(),
                        });
                    }
                }
            }
            Some(CommandVariant::Exec(_) | CommandVariant::Apply(_)) => {
                if let Some(component) = command.component() {
                    if !components.contains(component) {
                        errors.push(ValidationError::UnknownComponent {
                            command: command.id.clone(),
                            component: component.to_string(),
                        });
                    }
                }
            }
            Some(CommandVariant::Custom(_)) | None => {}
        }
    }

    errors
}

/// Keys every element of a list, recording unkeyable and duplicate ones.
fn collect_keys<T: Keyed>(items: &[T], errors: &mut Vec<ValidationError>) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    for (idx, item) in items.iter().enumerate() {
        match item.key() {
            Ok(key) => {
                if seen.contains(&key) {
                    errors.push(ValidationError::DuplicateKey {
                        element_type: T::ELEMENT_TYPE,
                        key,
                    });
                } else {
                    seen.insert(key);
                }
            }
            Err(reason) => errors.push(
                KeyError {
                    element_type: T::ELEMENT_TYPE,
                    path: crate::FieldPath::root()
                        .field(T::ELEMENT_TYPE.list_field())
                        .index(idx),
                    reason,
                }
                .into(),
            ),
        }
    }
    seen
}
