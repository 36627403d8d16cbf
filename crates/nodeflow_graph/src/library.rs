// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node libraries and their on-disk format.
//!
//! A [`NodeLibrary`] bundles a root node with the function repository its
//! nodes call into and the libraries it imports. Libraries are stored as RON
//! documents carrying a format version, which is checked before anything
//! else is parsed.

use crate::function::{FunctionRepository, LookupError};
use crate::node::{Node, NodeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Version of a library document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatVersion {
    /// Incompatible changes
    pub major: u32,
    /// Compatible additions
    pub minor: u32,
}

/// Version written by this crate
pub const FORMAT_VERSION: FormatVersion = FormatVersion { major: 2, minor: 0 };

/// Oldest version this crate reads
pub const MIN_FORMAT_VERSION: FormatVersion = FormatVersion { major: 2, minor: 0 };

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for FormatVersion {
    type Err = LoadError;

    /// Parse `major` or `major.minor`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LoadError::InvalidVersion(s.to_string());
        let (major, minor) = s.trim().split_once('.').unwrap_or((s.trim(), "0"));
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl FormatVersion {
    /// Check that a document of this version can be read
    pub fn check_supported(self) -> Result<(), LoadError> {
        if self < MIN_FORMAT_VERSION {
            Err(LoadError::TooOld {
                found: self.to_string(),
                minimum: MIN_FORMAT_VERSION.to_string(),
            })
        } else if self.major > FORMAT_VERSION.major {
            Err(LoadError::TooNew {
                found: self.to_string(),
                current: FORMAT_VERSION.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// An immutable library: a root network plus its functions and imports
#[derive(Debug, Clone)]
pub struct NodeLibrary {
    name: String,
    uuid: Uuid,
    root: Arc<Node>,
    functions: FunctionRepository,
    imports: Vec<Arc<NodeLibrary>>,
}

impl NodeLibrary {
    /// Create a library with an empty network as root and only core functions
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_parts(name, Node::network(), FunctionRepository::default())
    }

    /// Create a library from its root and function repository
    pub fn with_parts(name: impl Into<String>, root: Node, functions: FunctionRepository) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4(),
            root: Arc::new(root),
            functions,
            imports: Vec::new(),
        }
    }

    /// Library name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Document identity, regenerated for every new library
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Root node
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Function repository used to evaluate the nodes
    pub fn functions(&self) -> &FunctionRepository {
        &self.functions
    }

    /// Imported libraries
    pub fn imports(&self) -> impl Iterator<Item = &NodeLibrary> {
        self.imports.iter().map(AsRef::as_ref)
    }

    /// Look up an import by name
    pub fn import(&self, name: &str) -> Option<&NodeLibrary> {
        self.imports().find(|library| library.name == name)
    }

    /// Rename the library
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Replace the root node
    pub fn with_root(&self, root: Node) -> Self {
        Self {
            root: Arc::new(root),
            ..self.clone()
        }
    }

    /// Replace the function repository
    pub fn with_functions(&self, functions: FunctionRepository) -> Self {
        Self {
            functions,
            ..self.clone()
        }
    }

    /// Add or replace an import, matched by name
    pub fn with_import_added(&self, library: NodeLibrary) -> Self {
        let mut imports: Vec<_> = self
            .imports
            .iter()
            .filter(|existing| existing.name != library.name)
            .cloned()
            .collect();
        imports.push(Arc::new(library));
        Self {
            imports,
            ..self.clone()
        }
    }

    /// Remove an import by name
    pub fn with_import_removed(&self, name: &str) -> Self {
        Self {
            imports: self
                .imports
                .iter()
                .filter(|existing| existing.name != name)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Look up a node by absolute path: `/` is the root, `/net/child` a
    /// descendant
    pub fn node_for_path(&self, path: &str) -> Option<&Node> {
        let mut node: &Node = &self.root;
        for segment in path_segments(path)? {
            node = node.child(segment)?.as_ref();
        }
        Some(node)
    }

    /// Replace the node at `path` with the result of `edit`, rebuilding its
    /// ancestors
    pub fn with_node_edited<F>(&self, path: &str, edit: F) -> Result<Self, NodeError>
    where
        F: FnOnce(&Node) -> Result<Node, NodeError>,
    {
        let segments =
            path_segments(path).ok_or_else(|| NodeError::ChildNotFound(path.to_string()))?;
        let root = edit_at(&self.root, &segments, edit)?;
        Ok(self.with_root(root))
    }

    /// Check the root and all imports
    pub fn validate(&self) -> Result<(), NodeError> {
        self.root.validate()?;
        self.imports().try_for_each(NodeLibrary::validate)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Serialize to a RON document
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        let config = ron::ser::PrettyConfig::default().depth_limit(64);
        ron::ser::to_string_pretty(&LibraryDocument::from(self), config)
    }

    /// Parse a RON document, resolving function namespaces against
    /// `available`
    pub fn from_ron(text: &str, available: &FunctionRepository) -> Result<Self, LoadError> {
        let header: DocumentHeader = ron::from_str(text)?;
        header.format_version.parse::<FormatVersion>()?.check_supported()?;

        let document: LibraryDocument = ron::from_str(text)?;
        let library = document.into_library(available)?;
        library.validate()?;
        tracing::debug!(library = %library.name, "Loaded node library");
        Ok(library)
    }

    /// Write to a file
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let text = self.to_ron().map_err(|e| LoadError::Serialize(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Read from a file
    pub fn load(path: &Path, available: &FunctionRepository) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text, available)
    }
}

/// Libraries are equal when their contents are, regardless of identity
impl PartialEq for NodeLibrary {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.root == other.root
            && self.functions == other.functions
            && self.imports == other.imports
    }
}

fn path_segments(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix('/')?;
    Some(rest.split('/').filter(|s| !s.is_empty()).collect())
}

fn edit_at<F>(node: &Node, segments: &[&str], edit: F) -> Result<Node, NodeError>
where
    F: FnOnce(&Node) -> Result<Node, NodeError>,
{
    match segments.split_first() {
        None => edit(node),
        Some((first, rest)) => {
            let child = node
                .child(first)
                .ok_or_else(|| NodeError::ChildNotFound((*first).to_string()))?;
            let edited = edit_at(child, rest, edit)?;
            node.with_child_replaced(first, edited)
        }
    }
}

#[derive(Deserialize)]
struct DocumentHeader {
    format_version: String,
}

#[derive(Serialize, Deserialize)]
struct LibraryDocument {
    format_version: String,
    name: String,
    uuid: Uuid,
    #[serde(default)]
    functions: Vec<String>,
    #[serde(default)]
    imports: Vec<LibraryDocument>,
    root: Node,
}

impl From<&NodeLibrary> for LibraryDocument {
    fn from(library: &NodeLibrary) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            name: library.name.clone(),
            uuid: library.uuid,
            functions: library
                .functions
                .namespaces()
                .filter(|ns| *ns != crate::functions::CORE)
                .map(str::to_string)
                .collect(),
            imports: library.imports().map(LibraryDocument::from).collect(),
            root: (*library.root).clone(),
        }
    }
}

impl LibraryDocument {
    fn into_library(self, available: &FunctionRepository) -> Result<NodeLibrary, LoadError> {
        let functions = available.subset(self.functions.iter().map(String::as_str))?;
        let imports = self
            .imports
            .into_iter()
            .map(|import| import.into_library(available).map(Arc::new))
            .collect::<Result<_, _>>()?;
        Ok(NodeLibrary {
            name: self.name,
            uuid: self.uuid,
            root: Arc::new(self.root),
            functions,
            imports,
        })
    }
}

/// Error when loading or saving a library
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Document predates the oldest supported format
    #[error("Library format version {found} is too old (minimum {minimum})")]
    TooOld {
        /// Version in the document
        found: String,
        /// Oldest readable version
        minimum: String,
    },

    /// Document was written by a newer program
    #[error("Library format version {found} is too new (current {current})")]
    TooNew {
        /// Version in the document
        found: String,
        /// Version written by this crate
        current: String,
    },

    /// Unparsable version string
    #[error("Invalid format version `{0}`")]
    InvalidVersion(String),

    /// Malformed document
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failure
    #[error("Serialize error: {0}")]
    Serialize(String),

    /// Document references an unknown function library
    #[error(transparent)]
    Functions(#[from] LookupError),

    /// Document breaks a structural invariant
    #[error("Invalid library: {0}")]
    Invalid(#[from] NodeError),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
