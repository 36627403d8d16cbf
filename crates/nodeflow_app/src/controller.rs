// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing facade over a node library.
//!
//! Every edit is expressed through the immutable node API and addressed by
//! node path. A failed edit leaves the library untouched; a successful one is
//! recorded in the undo history.

use crate::history::{History, HistoryError};
use nodeflow_graph::{
    FunctionRepository, LoadError, LookupError, Node, NodeContext, NodeError, NodeLibrary, Port,
    PortType, RenderError, Value,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error from a controller operation
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Structural edit rejected
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Unknown function
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Loading or saving failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Undo or redo not possible
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Rendering failed
    #[error(transparent)]
    Render(#[from] RenderError),

    /// No node at a path
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Library has never been saved
    #[error("Library has no file path")]
    NoPath,
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Owns the current library and applies edits to it
#[derive(Debug)]
pub struct LibraryController {
    library: NodeLibrary,
    history: History,
    path: Option<PathBuf>,
    dirty: bool,
}

/// Path of a child inside the network at `parent`
pub fn child_path(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}

impl LibraryController {
    /// Create a controller for a library
    pub fn new(library: NodeLibrary) -> Self {
        Self::with_history(library, History::new())
    }

    /// Create a controller with a custom history
    pub fn with_history(library: NodeLibrary, history: History) -> Self {
        Self {
            library,
            history,
            path: None,
            dirty: false,
        }
    }

    /// Open a library file
    pub fn open(path: &Path, available: &FunctionRepository, history: History) -> Result<Self> {
        let library = NodeLibrary::load(path, available)?;
        info!(path = %path.display(), library = library.name(), "Opened library");
        let mut controller = Self::with_history(library, history);
        controller.path = Some(path.to_path_buf());
        Ok(controller)
    }

    /// The current library
    pub fn library(&self) -> &NodeLibrary {
        &self.library
    }

    /// The undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether there are unsaved edits
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// File the library was opened from or last saved to
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Save to the current path
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(ControllerError::NoPath)?;
        self.save_as(&path)
    }

    /// Save to a new path
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.library.save(path)?;
        info!(path = %path.display(), "Saved library");
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }

    fn node(&self, path: &str) -> Result<&Node> {
        self.library
            .node_for_path(path)
            .ok_or_else(|| ControllerError::NodeNotFound(path.to_string()))
    }

    fn apply<F>(&mut self, description: String, edit: F) -> Result<()>
    where
        F: FnOnce(&NodeLibrary) -> Result<NodeLibrary>,
    {
        let next = edit(&self.library)?;
        if next == self.library {
            debug!(%description, "Edit changed nothing");
            return Ok(());
        }
        let before = std::mem::replace(&mut self.library, next);
        self.history.record(description.clone(), before, self.library.clone());
        self.dirty = true;
        info!(%description, "Applied edit");
        Ok(())
    }

    fn edit_node<F>(&mut self, description: String, path: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&Node) -> std::result::Result<Node, NodeError>,
    {
        self.node(path)?;
        self.apply(description, |library| Ok(library.with_node_edited(path, edit)?))
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Add an instance of `prototype` to a network under a free name derived
    /// from the prototype's name. Returns the new child's name.
    pub fn create_node(&mut self, parent: &str, prototype: &Node) -> Result<String> {
        let name = self.node(parent)?.unique_child_name(prototype.name());
        let instance = prototype.extend().with_name(&name).map_err(NodeError::from)?;
        self.add_node(parent, instance)?;
        Ok(name)
    }

    /// Add a node that calls a library function. Returns the new child's
    /// name.
    pub fn create_function_node(&mut self, parent: &str, identifier: &str) -> Result<String> {
        let function = self.library.functions().resolve(identifier)?;
        let prototype = Node::from_function(identifier, function)?;
        let name = self.node(parent)?.unique_child_name(prototype.name());
        self.add_node(parent, prototype.with_name(&name).map_err(NodeError::from)?)?;
        Ok(name)
    }

    /// Add a child to a network
    pub fn add_node(&mut self, parent: &str, node: Node) -> Result<()> {
        let description = format!("Add node {}", child_path(parent, node.name()));
        self.edit_node(description, parent, |network| Ok(network.with_child_added(node)?))
    }

    /// Remove a child from a network
    pub fn remove_node(&mut self, parent: &str, name: &str) -> Result<()> {
        let description = format!("Remove node {}", child_path(parent, name));
        self.edit_node(description, parent, |network| network.with_child_removed(name))
    }

    /// Rename a child
    pub fn rename_node(&mut self, parent: &str, old: &str, new: &str) -> Result<()> {
        let description = format!("Rename {} to {new}", child_path(parent, old));
        self.edit_node(description, parent, |network| network.with_child_renamed(old, new))
    }

    /// Set or clear the rendered child of a network
    pub fn set_rendered_child(&mut self, parent: &str, name: Option<&str>) -> Result<()> {
        let description = format!("Render {}", name.unwrap_or("nothing"));
        self.edit_node(description, parent, |network| network.with_rendered_child(name))
    }

    /// Point a node at another function
    pub fn set_function(&mut self, path: &str, identifier: &str) -> Result<()> {
        self.library.functions().resolve(identifier)?;
        let description = format!("Set function of {path} to {identifier}");
        self.edit_node(description, path, |node| Ok(node.with_function(identifier)))
    }

    // ========================================================================
    // Ports
    // ========================================================================

    /// Add an input port under a free name. Returns the port name.
    pub fn add_port(&mut self, path: &str, name: &str, port_type: PortType) -> Result<String> {
        let name = self.node(path)?.unique_input_name(name);
        let description = format!("Add port {path}.{name}");
        let port = Port::new(&name, port_type);
        self.edit_node(description, path, |node| node.with_input_added(port))?;
        Ok(name)
    }

    /// Replace an input port's definition
    pub fn edit_port(&mut self, path: &str, name: &str, port: Port) -> Result<()> {
        let description = format!("Edit port {path}.{name}");
        self.edit_node(description, path, |node| node.with_input_changed(name, port))
    }

    /// Remove an input port
    pub fn remove_port(&mut self, path: &str, name: &str) -> Result<()> {
        let description = format!("Remove port {path}.{name}");
        self.edit_node(description, path, |node| node.with_input_removed(name))
    }

    /// Set an input value
    pub fn set_port_value(&mut self, path: &str, port: &str, value: Value) -> Result<()> {
        let description = format!("Set {path}.{port} to {value}");
        self.edit_node(description, path, |node| node.with_input_value(port, value))
    }

    /// Restore an input's inherited value
    pub fn revert_port_value(&mut self, path: &str, port: &str) -> Result<()> {
        let description = format!("Revert {path}.{port}");
        self.edit_node(description, path, |node| node.with_input_value_reset(port))
    }

    // ========================================================================
    // Connections and published ports
    // ========================================================================

    /// Connect two children of a network
    pub fn connect(&mut self, parent: &str, output: &str, input: &str, port: &str) -> Result<()> {
        let description = format!("Connect {output} to {input}.{port}");
        self.edit_node(description, parent, |network| Ok(network.connect(output, input, port)?))
    }

    /// Remove connections into a child port
    pub fn disconnect(
        &mut self,
        parent: &str,
        input: &str,
        port: &str,
        output: Option<&str>,
    ) -> Result<()> {
        let description = format!("Disconnect {input}.{port}");
        self.edit_node(description, parent, |network| {
            Ok(network.disconnect(input, port, output)?)
        })
    }

    /// Publish a child port on its network
    pub fn publish(&mut self, parent: &str, child: &str, port: &str, public_name: &str) -> Result<()> {
        let description = format!("Publish {child}.{port} as {public_name}");
        self.edit_node(description, parent, |network| {
            Ok(network.publish(child, port, public_name)?)
        })
    }

    /// Remove a published port
    pub fn unpublish(&mut self, parent: &str, public_name: &str) -> Result<()> {
        let description = format!("Unpublish {public_name}");
        self.edit_node(description, parent, |network| Ok(network.unpublish(public_name)?))
    }

    // ========================================================================
    // History and rendering
    // ========================================================================

    /// Revert the last edit
    pub fn undo(&mut self) -> Result<()> {
        let operation = self.history.undo()?;
        info!(description = %operation.description, "Undo");
        self.library = operation.before.clone();
        self.dirty = true;
        Ok(())
    }

    /// Reapply the last undone edit
    pub fn redo(&mut self) -> Result<()> {
        let operation = self.history.redo()?;
        info!(description = %operation.description, "Redo");
        self.library = operation.after.clone();
        self.dirty = true;
        Ok(())
    }

    /// Render the node at a path
    pub fn render(&self, path: &str) -> Result<Vec<Value>> {
        Ok(NodeContext::new(&self.library).render_path(path)?)
    }
}
