//! Discriminated union normalization and simplification.
//!
//! A union is a record with several mutually exclusive optional variant
//! slots plus an optional discriminator naming the authoritative slot. The
//! [`Union`] trait describes one such record; [`UnionTree`] lets a whole
//! document be walked so that every union reachable from it is visited.
//!
//! - [`normalize`] sets missing discriminators from the sole populated slot
//!   and clears slots that disagree with an explicit discriminator.
//! - [`simplify`] normalizes, then clears every discriminator, yielding the
//!   canonical on-disk form.
//! - [`normalize_partial`] is the variant used for override documents, where
//!   an empty union means "leave the variant alone".
//!
//! # Example
//!
//! ```
//! use devtemplate_core::*;
//!
//! let mut source = ProjectSource {
//!     git: Some(GitProjectSource::with_remote("origin", "https://example.com/repo.git")),
//!     zip: Some(ZipProjectSource { location: Some("file:///tmp/repo.zip".into()) }),
//!     source_type: Some(ProjectSourceType::Git),
//!     ..Default::default()
//! };
//!
//! let mut project = Project::new("repo", source.clone());
//! normalize(&mut project).unwrap();
//! assert!(project.source.zip.is_none());
//! assert_eq!(project.source.source_type, Some(ProjectSourceType::Git));
//!
//! simplify(&mut project).unwrap();
//! assert_eq!(project.source.source_type, None);
//! assert!(project.source.git.is_some());
//!
//! // Two slots and no discriminator cannot be resolved.
//! source.source_type = None;
//! let mut ambiguous = Project::new("repo", source);
//! assert!(normalize(&mut ambiguous).is_err());
//! ```

use std::fmt;

use thiserror::Error;

use crate::FieldPath;

/// Inconsistent discriminated union.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnionError {
    /// Several slots are populated and no discriminator picks one.
    #[error("ambiguous {union_type} at {path}: variants {} are all set and no discriminator is given", .populated.join(", "))]
    Ambiguous {
        union_type: &'static str,
        path: FieldPath,
        populated: Vec<String>,
    },
    /// No slot is populated and no discriminator is given.
    #[error("empty {union_type} at {path}: exactly one variant must be set")]
    Empty {
        union_type: &'static str,
        path: FieldPath,
    },
    /// The discriminator names a slot that is not populated.
    #[error("inconsistent {union_type} at {path}: discriminator is {discriminator} but that variant is not set")]
    DanglingDiscriminator {
        union_type: &'static str,
        path: FieldPath,
        discriminator: String,
    },
}

impl UnionError {
    /// Returns the name of the union type that failed.
    pub fn union_type(&self) -> &'static str {
        match self {
            Self::Ambiguous { union_type, .. }
            | Self::Empty { union_type, .. }
            | Self::DanglingDiscriminator { union_type, .. } => union_type,
        }
    }

    /// Returns the path of the failing union node.
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::Ambiguous { path, .. }
            | Self::Empty { path, .. }
            | Self::DanglingDiscriminator { path, .. } => path,
        }
    }
}

/// A record holding mutually exclusive variant slots and a discriminator.
pub trait Union {
    /// Discriminator value type, one value per variant slot.
    type Tag: Copy + Eq + fmt::Debug;

    /// Type name used in error messages.
    const UNION_TYPE: &'static str;

    fn discriminator(&self) -> Option<Self::Tag>;

    fn set_discriminator(&mut self, tag: Option<Self::Tag>);

    /// Tags of every populated slot, in declaration order.
    fn populated(&self) -> Vec<Self::Tag>;

    /// Clears every slot except the one named by `tag`.
    fn retain_only(&mut self, tag: Self::Tag);

    /// Returns the authoritative variant tag, if it can be determined.
    ///
    /// That is the discriminator when set, otherwise the single populated
    /// slot. Returns `None` for empty or ambiguous unions.
    fn active(&self) -> Option<Self::Tag> {
        if let Some(tag) = self.discriminator() {
            return Some(tag);
        }
        match self.populated().as_slice() {
            [tag] => Some(*tag),
            _ => None,
        }
    }
}

/// How a walk treats each union it visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Strict normalization; empty unions are errors.
    Normalize,
    /// Normalization of partial documents; empty unions are left as is.
    NormalizePartial,
    /// Strict normalization followed by discriminator removal.
    Simplify,
}

/// Walk state threaded through [`UnionTree::walk_unions`].
#[derive(Debug)]
pub struct UnionWalker {
    mode: WalkMode,
    path: FieldPath,
    // Set while walking an override document embedded in a full one.
    lenient: bool,
}

impl UnionWalker {
    pub fn new(mode: WalkMode) -> Self {
        Self {
            mode,
            path: FieldPath::root(),
            lenient: false,
        }
    }

    pub fn mode(&self) -> WalkMode {
        self.mode
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Applies the walk mode to a single union node at the current path.
    pub fn visit<U: Union + ?Sized>(&mut self, union: &mut U) -> Result<(), UnionError> {
        let populated = union.populated();
        match union.discriminator() {
            Some(tag) => {
                if !populated.contains(&tag) {
                    return Err(UnionError::DanglingDiscriminator {
                        union_type: U::UNION_TYPE,
                        path: self.path.clone(),
                        discriminator: format!("{tag:?}"),
                    });
                }
                union.retain_only(tag);
            }
            None => match populated.as_slice() {
                [tag] => union.set_discriminator(Some(*tag)),
                [] if self.mode == WalkMode::NormalizePartial || self.lenient => {}
                [] => {
                    return Err(UnionError::Empty {
                        union_type: U::UNION_TYPE,
                        path: self.path.clone(),
                    });
                }
                many => {
                    return Err(UnionError::Ambiguous {
                        union_type: U::UNION_TYPE,
                        path: self.path.clone(),
                        populated: many.iter().map(|tag| format!("{tag:?}")).collect(),
                    });
                }
            },
        }

        if self.mode == WalkMode::Simplify {
            union.set_discriminator(None);
        }
        Ok(())
    }

    /// Walks `node` under the field named `name`.
    pub fn field<T: UnionTree + ?Sized>(
        &mut self,
        name: &str,
        node: &mut T,
    ) -> Result<(), UnionError> {
        self.path.push(crate::PathSegment::Field(name.to_string()));
        let result = node.walk_unions(self);
        self.path.pop();
        result
    }

    /// Walks an optional child under the field named `name`.
    pub fn optional<T: UnionTree>(
        &mut self,
        name: &str,
        node: &mut Option<T>,
    ) -> Result<(), UnionError> {
        match node {
            Some(inner) => self.field(name, inner),
            None => Ok(()),
        }
    }

    /// Walks an embedded override document at the current path.
    ///
    /// Empty unions inside it are accepted whatever the walk mode: an
    /// override element that sets no variant leaves the variant unchanged.
    pub fn partial<T: UnionTree + ?Sized>(&mut self, node: &mut T) -> Result<(), UnionError> {
        let outer = std::mem::replace(&mut self.lenient, true);
        let result = node.walk_unions(self);
        self.lenient = outer;
        result
    }

    /// Walks every element of a list field.
    pub fn list<T: UnionTree>(&mut self, name: &str, nodes: &mut [T]) -> Result<(), UnionError> {
        self.path.push(crate::PathSegment::Field(name.to_string()));
        let mut result = Ok(());
        for (idx, node) in nodes.iter_mut().enumerate() {
            self.path.push(crate::PathSegment::Index(idx));
            result = node.walk_unions(self);
            self.path.pop();
            if result.is_err() {
                break;
            }
        }
        self.path.pop();
        result
    }
}

/// A node from which unions can be reached.
///
/// Implementations visit their own union first (if they are one) and then
/// descend into the children that may hold further unions, so slots cleared
/// by normalization are never walked.
pub trait UnionTree {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError>;
}

/// Normalizes every union reachable from `tree`.
///
/// # Errors
///
/// Returns a [`UnionError`] for the first union that has zero or several
/// populated slots without a discriminator, or whose discriminator names an
/// empty slot.
pub fn normalize<T: UnionTree + ?Sized>(tree: &mut T) -> Result<(), UnionError> {
    tree.walk_unions(&mut UnionWalker::new(WalkMode::Normalize))
}

/// Normalizes a partial (override) document.
///
/// Behaves like [`normalize`] except that unions with no populated slot and
/// no discriminator are accepted unchanged.
///
/// # Errors
///
/// Returns a [`UnionError`] for ambiguous unions or dangling discriminators.
pub fn normalize_partial<T: UnionTree + ?Sized>(tree: &mut T) -> Result<(), UnionError> {
    tree.walk_unions(&mut UnionWalker::new(WalkMode::NormalizePartial))
}

/// Normalizes every union reachable from `tree`, then removes their
/// discriminators.
///
/// Idempotent: simplifying an already simplified tree leaves it unchanged.
///
/// # Errors
///
/// Same as [`normalize`].
pub fn simplify<T: UnionTree + ?Sized>(tree: &mut T) -> Result<(), UnionError> {
    tree.walk_unions(&mut UnionWalker::new(WalkMode::Simplify))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn git_source() -> GitProjectSource {
        GitProjectSource::with_remote("origin", "https://example.com/a.git")
    }

    #[test]
    fn test_normalize_sets_discriminator_from_single_slot() {
        let mut source = ProjectSource {
            git: Some(git_source()),
            ..Default::default()
        };
        normalize(&mut source).unwrap();
        assert_eq!(source.source_type, Some(ProjectSourceType::Git));
    }

    #[test]
    fn test_normalize_clears_slots_not_matching_discriminator() {
        let mut source = ProjectSource {
            source_type: Some(ProjectSourceType::Git),
            git: Some(git_source()),
            zip: Some(ZipProjectSource::default()),
            ..Default::default()
        };
        normalize(&mut source).unwrap();
        assert!(source.zip.is_none());
        assert!(source.git.is_some());
    }

    #[test]
    fn test_normalize_rejects_empty_union() {
        let mut source = ProjectSource::default();
        let err = normalize(&mut source).unwrap_err();
        assert_eq!(err.union_type(), "ProjectSource");
        assert!(matches!(err, UnionError::Empty { .. }));
    }

    #[test]
    fn test_partial_normalize_accepts_empty_union() {
        let mut source = ProjectSource::default();
        normalize_partial(&mut source).unwrap();
        assert_eq!(source, ProjectSource::default());
    }

    #[test]
    fn test_discriminator_naming_empty_slot_is_rejected() {
        let mut source = ProjectSource {
            source_type: Some(ProjectSourceType::Zip),
            git: Some(git_source()),
            ..Default::default()
        };
        let err = normalize(&mut source).unwrap_err();
        assert_eq!(
            err,
            UnionError::DanglingDiscriminator {
                union_type: "ProjectSource",
                path: FieldPath::root(),
                discriminator: "Zip".to_string(),
            }
        );
    }

    #[test]
    fn test_error_path_points_at_nested_union() {
        let mut content = TemplateSpecContent::default();
        content.components.push(Component::volume("cache"));
        content.components.push(Component {
            kubernetes: Some(K8sLikeComponent {
                name: "deploy".into(),
                location: K8sLikeComponentLocation {
                    uri: Some("deploy.yaml".into()),
                    inlined: Some("kind: Deployment".into()),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        });

        let err = normalize(&mut content).unwrap_err();
        assert_eq!(err.union_type(), "K8sLikeComponentLocation");
        assert_eq!(err.path().to_string(), "components[1].kubernetes");
    }

    #[test]
    fn test_simplify_is_idempotent() {
        let mut content = TemplateSpecContent::default();
        content.commands.push(Command::exec("build", "make"));
        content
            .projects
            .push(Project::new("api", ProjectSource::git(git_source())));

        simplify(&mut content).unwrap();
        let once = content.clone();
        simplify(&mut content).unwrap();
        assert_eq!(content, once);
        assert_eq!(content.commands[0].union.command_type, None);
    }

    #[test]
    fn test_normalize_does_not_walk_cleared_slots() {
        // The cleared kubernetes slot holds an ambiguous location; it must
        // not be reported once the discriminator has discarded it.
        let mut component = Component {
            component_type: Some(ComponentType::Volume),
            volume: Some(VolumeComponent::new("data")),
            kubernetes: Some(K8sLikeComponent {
                name: "data".into(),
                location: K8sLikeComponentLocation {
                    uri: Some("a.yaml".into()),
                    inlined: Some("b".into()),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        normalize(&mut component).unwrap();
        assert!(component.kubernetes.is_none());
    }
}
