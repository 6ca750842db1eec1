//! Generic document model shared by every schema type.
//!
//! A [`Document`] is a recursively-typed tree of maps, ordered sequences and
//! scalars. Every schema type converts to and from it without loss through
//! [`to_document`] and [`from_document`], which is what lets the overriding
//! engine merge typed content with a single generic algorithm.
//!
//! # Example
//!
//! ```
//! use devtemplate_core::*;
//!
//! let command = Command::exec("build", "make all");
//! let doc = to_document(&command).unwrap();
//! assert_eq!(doc["id"], "build");
//! assert_eq!(doc["exec"]["commandLine"], "make all");
//!
//! let back: Command = from_document(doc).unwrap();
//! assert_eq!(back, command);
//! ```

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Generic document tree.
pub type Document = serde_json::Value;

/// Map node of a [`Document`].
pub type DocumentMap = serde_json::Map<String, Document>;

/// Failure to lower a typed value to a [`Document`] or to raise it back.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The typed value could not be represented as a document.
    #[error("cannot lower {type_name} to a document: {source}")]
    Lower {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The document does not have the shape of the requested type.
    #[error("document does not match the shape of {type_name}: {source}")]
    Raise {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Lowers a typed value to the generic document model.
///
/// # Errors
///
/// Returns [`DocumentError::Lower`] if the value's `Serialize` impl fails
/// (for example a map with non-string keys).
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, DocumentError> {
    serde_json::to_value(value).map_err(|source| DocumentError::Lower {
        type_name: short_type_name::<T>(),
        source,
    })
}

/// Raises a generic document back into a typed value.
///
/// # Errors
///
/// Returns [`DocumentError::Raise`] if the document's structure does not
/// fit `T`.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, DocumentError> {
    serde_json::from_value(document).map_err(|source| DocumentError::Raise {
        type_name: short_type_name::<T>(),
        source,
    })
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Strip the module path but keep generic arguments intact.
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

/// Returns a short label for the kind of a document node.
pub fn kind_of(document: &Document) -> &'static str {
    match document {
        Document::Null => "null",
        Document::Bool(_) => "boolean",
        Document::Number(_) => "number",
        Document::String(_) => "string",
        Document::Array(_) => "list",
        Document::Object(_) => "map",
    }
}

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Named record or map field.
    Field(String),
    /// Position in a list.
    Index(usize),
    /// Element of a keyed list, addressed by its key.
    Key(String),
}

/// Location of a node inside a document, used in error messages.
///
/// ```
/// use devtemplate_core::FieldPath;
///
/// let path = FieldPath::root().field("components").index(2).field("kubernetes");
/// assert_eq!(path.to_string(), "components[2].kubernetes");
/// assert_eq!(FieldPath::root().to_string(), "<root>");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path, pointing at the document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a copy extended with a field segment.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathSegment::Field(name.into()));
        self
    }

    /// Returns a copy extended with a list index segment.
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    /// Returns a copy extended with a keyed element segment.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (idx, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if idx == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
                PathSegment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}
