// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immutable nodes and networks.
//!
//! Every edit returns a new [`Node`]; the receiver is never changed. Ports,
//! children and connections live behind [`Arc`]s, so an edit copies only the
//! collection it touches and shares everything else with the original.

use crate::connection::{Connection, ConnectionError};
use crate::dependency::{is_reachable, DependencyError, DependencyGraph};
use crate::function::{Function, LookupError};
use crate::naming::{unique_name, validate_name, NameError};
use crate::port::{Cardinality, ChildReference, Port, PortError, PortType, Range};
use crate::value::{Point, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A computation node, optionally a network of child nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prototype: Option<Arc<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_type: Option<PortType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_range: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default)]
    position: Point,
    #[serde(default)]
    inputs: Arc<IndexMap<String, Port>>,
    #[serde(default)]
    children: Arc<IndexMap<String, Arc<Node>>>,
    #[serde(default)]
    connections: Arc<Vec<Connection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rendered_child: Option<String>,
}

impl Node {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prototype: None,
            function: None,
            output_type: None,
            output_range: None,
            category: None,
            description: None,
            comment: None,
            position: Point::ZERO,
            inputs: Arc::default(),
            children: Arc::default(),
            connections: Arc::default(),
            rendered_child: None,
        }
    }

    /// The root node every other node descends from
    pub fn root() -> Self {
        Self::named("node")
    }

    /// An empty network
    pub fn network() -> Self {
        Self::named("network")
    }

    /// Create a node that calls `identifier`, with one input per argument
    pub fn from_function(identifier: &str, function: &Function) -> Result<Self, NodeError> {
        let mut node = Self::root()
            .extend()
            .with_name(function.name())?
            .with_function(identifier)
            .with_output_type(function.output_type().clone())
            .with_output_range(function.output_range());
        for argument in function.arguments() {
            let port = Port::new(&argument.name, argument.port_type.clone())
                .with_range(argument.range);
            node = node.with_input_added(port)?;
        }
        Ok(node)
    }

    fn edited(&self, edit: impl FnOnce(&mut Node)) -> Node {
        let mut node = self.clone();
        edit(&mut node);
        node
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node this one was derived from
    pub fn prototype(&self) -> Option<&Arc<Node>> {
        self.prototype.as_ref()
    }

    fn inherited<T>(&self, attribute: impl Fn(&Node) -> Option<&T>) -> Option<&T> {
        let mut current = Some(self);
        while let Some(node) = current {
            if let Some(value) = attribute(node) {
                return Some(value);
            }
            current = node.prototype.as_deref();
        }
        None
    }

    /// Function identifier, looked up through the prototype chain
    pub fn function(&self) -> Option<&str> {
        self.inherited(|n| n.function.as_ref()).map(String::as_str)
    }

    /// Output type, looked up through the prototype chain (default `float`)
    pub fn output_type(&self) -> PortType {
        self.inherited(|n| n.output_type.as_ref())
            .cloned()
            .unwrap_or(PortType::Float)
    }

    /// Output range, looked up through the prototype chain (default value)
    pub fn output_range(&self) -> Range {
        self.inherited(|n| n.output_range.as_ref())
            .copied()
            .unwrap_or_default()
    }

    /// Category used to group nodes
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Help text
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// User comment
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Position in the network view
    pub fn position(&self) -> Point {
        self.position
    }

    /// Create a node whose prototype is this node
    pub fn extend(&self) -> Node {
        self.edited(|n| {
            n.prototype = Some(Arc::new(self.clone()));
            n.function = None;
            n.output_type = None;
            n.output_range = None;
        })
    }

    /// Rename the node. Renaming to the current name returns an equal node.
    pub fn with_name(&self, name: &str) -> Result<Node, NameError> {
        if name == self.name {
            return Ok(self.clone());
        }
        validate_name(name)?;
        Ok(self.edited(|n| n.name = name.to_string()))
    }

    /// Set the prototype
    pub fn with_prototype(&self, prototype: Option<Arc<Node>>) -> Node {
        self.edited(|n| n.prototype = prototype)
    }

    /// Set the function identifier
    pub fn with_function(&self, identifier: impl Into<String>) -> Node {
        let identifier = identifier.into();
        self.edited(|n| n.function = Some(identifier))
    }

    /// Clear the local function identifier
    pub fn without_function(&self) -> Node {
        self.edited(|n| n.function = None)
    }

    /// Set the output type
    pub fn with_output_type(&self, output_type: PortType) -> Node {
        self.edited(|n| n.output_type = Some(output_type))
    }

    /// Set the output range
    pub fn with_output_range(&self, output_range: Range) -> Node {
        self.edited(|n| n.output_range = Some(output_range))
    }

    /// Set the category
    pub fn with_category(&self, category: impl Into<String>) -> Node {
        let category = category.into();
        self.edited(|n| n.category = Some(category))
    }

    /// Set the description
    pub fn with_description(&self, description: impl Into<String>) -> Node {
        let description = description.into();
        self.edited(|n| n.description = Some(description))
    }

    /// Set the comment
    pub fn with_comment(&self, comment: impl Into<String>) -> Node {
        let comment = comment.into();
        self.edited(|n| n.comment = Some(comment))
    }

    /// Set the position
    pub fn with_position(&self, position: Point) -> Node {
        self.edited(|n| n.position = position)
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Input ports in order
    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.inputs.values()
    }

    /// Get an input port by name
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.get(name)
    }

    /// Check if an input port exists
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// Current value of an input port
    pub fn input_value(&self, name: &str) -> Option<&Value> {
        self.input(name).and_then(|port| port.value.as_ref())
    }

    /// The value a port falls back to: the nearest prototype's value for
    /// the port, or the type default
    pub fn input_default(&self, name: &str) -> Option<Value> {
        let port = self.input(name)?;
        let mut prototype = self.prototype.as_deref();
        while let Some(node) = prototype {
            if let Some(value) = node.input(name).and_then(|p| p.value.clone()) {
                if value.port_type() == port.port_type {
                    return Some(value);
                }
            }
            prototype = node.prototype.as_deref();
        }
        port.port_type.default_value()
    }

    /// Free port name based on `prefix`
    pub fn unique_input_name(&self, prefix: &str) -> String {
        unique_name(prefix, |name| self.has_input(name))
    }

    /// Add an input port
    pub fn with_input_added(&self, port: Port) -> Result<Node, NodeError> {
        validate_name(&port.name)?;
        if self.has_input(&port.name) {
            return Err(NameError::Duplicate(port.name).into());
        }
        port.validate()?;
        Ok(self.edited(|n| {
            Arc::make_mut(&mut n.inputs).insert(port.name.clone(), port);
        }))
    }

    /// Remove an input port
    pub fn with_input_removed(&self, name: &str) -> Result<Node, NodeError> {
        self.require_input(name)?;
        Ok(self.edited(|n| {
            Arc::make_mut(&mut n.inputs).shift_remove(name);
        }))
    }

    /// Replace an input port, keeping its position
    pub fn with_input_changed(&self, name: &str, port: Port) -> Result<Node, NodeError> {
        self.require_input(name)?;
        if port.name != name {
            validate_name(&port.name)?;
            if self.has_input(&port.name) {
                return Err(NameError::Duplicate(port.name).into());
            }
        }
        port.validate()?;
        Ok(self.edited(|n| {
            n.inputs = Arc::new(
                n.inputs
                    .iter()
                    .map(|(key, existing)| {
                        if key == name {
                            (port.name.clone(), port.clone())
                        } else {
                            (key.clone(), existing.clone())
                        }
                    })
                    .collect(),
            );
        }))
    }

    /// Set the value of an input port.
    ///
    /// Setting a published port also sets the child port it forwards to.
    pub fn with_input_value(&self, name: &str, value: impl Into<Value>) -> Result<Node, NodeError> {
        let value = value.into();
        let port = self.require_input(name)?.clone().with_value(value.clone())?;
        let mut node = self.clone();
        if let Some(reference) = &port.child_reference {
            let child = node.require_child(&reference.child)?;
            let child = child.with_input_value(&reference.port, value)?;
            node = node.with_child_replaced(&reference.child, child)?;
        }
        Arc::make_mut(&mut node.inputs).insert(name.to_string(), port);
        Ok(node)
    }

    /// Restore an input port to its default value
    pub fn with_input_value_reset(&self, name: &str) -> Result<Node, NodeError> {
        match self.input_default(name) {
            Some(value) => self.with_input_value(name, value),
            None => {
                self.require_input(name)?;
                Ok(self.clone())
            }
        }
    }

    fn require_input(&self, name: &str) -> Result<&Port, NodeError> {
        self.input(name).ok_or_else(|| NodeError::PortNotFound {
            node: self.name.clone(),
            port: name.to_string(),
        })
    }

    // ========================================================================
    // Children
    // ========================================================================

    /// Whether this node has children
    pub fn is_network(&self) -> bool {
        !self.children.is_empty()
    }

    /// Children in order
    pub fn children(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.children.values()
    }

    /// Get a child by name
    pub fn child(&self, name: &str) -> Option<&Arc<Node>> {
        self.children.get(name)
    }

    /// Check if a child exists
    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Free child name based on `prefix`, reusing the lowest free suffix
    pub fn unique_child_name(&self, prefix: &str) -> String {
        unique_name(prefix, |name| self.has_child(name))
    }

    fn require_child(&self, name: &str) -> Result<&Arc<Node>, NodeError> {
        self.child(name)
            .ok_or_else(|| NodeError::ChildNotFound(name.to_string()))
    }

    /// Add a child. Fails if the name is invalid or taken.
    pub fn with_child_added(&self, child: Node) -> Result<Node, NameError> {
        validate_name(&child.name)?;
        if self.has_child(&child.name) {
            return Err(NameError::Duplicate(child.name));
        }
        Ok(self.edited(|n| {
            Arc::make_mut(&mut n.children).insert(child.name.clone(), Arc::new(child));
        }))
    }

    /// Remove a child with its connections and published ports
    pub fn with_child_removed(&self, name: &str) -> Result<Node, NodeError> {
        self.require_child(name)?;
        Ok(self.edited(|n| {
            Arc::make_mut(&mut n.children).shift_remove(name);
            n.connections = Arc::new(
                n.connections
                    .iter()
                    .filter(|c| !c.involves_node(name))
                    .cloned()
                    .collect(),
            );
            Arc::make_mut(&mut n.inputs).retain(|_, port| {
                port.child_reference.as_ref().map_or(true, |r| r.child != name)
            });
            if n.rendered_child.as_deref() == Some(name) {
                n.rendered_child = None;
            }
        }))
    }

    /// Replace a child with a node of the same name.
    ///
    /// Connections into ports the replacement lacks are dropped, and so are
    /// published ports that referenced them. Published ports take over the
    /// values of the child ports they forward to.
    pub fn with_child_replaced(&self, name: &str, child: Node) -> Result<Node, NodeError> {
        self.require_child(name)?;
        if child.name != name {
            return Err(NodeError::ChildNameMismatch {
                expected: name.to_string(),
                found: child.name,
            });
        }
        Ok(self.edited(|n| {
            if n.connections.iter().any(|c| c.input_node == name && !child.has_input(&c.input_port)) {
                n.connections = Arc::new(
                    n.connections
                        .iter()
                        .filter(|c| c.input_node != name || child.has_input(&c.input_port))
                        .cloned()
                        .collect(),
                );
            }
            if n.published_ports().any(|(_, r)| r.child == name && !child.has_input(&r.port)) {
                Arc::make_mut(&mut n.inputs).retain(|_, port| match &port.child_reference {
                    Some(r) => r.child != name || child.has_input(&r.port),
                    None => true,
                });
            }
            let stale = |port: &Port| match &port.child_reference {
                Some(r) if r.child == name => {
                    child.input(&r.port).is_some_and(|p| p.value != port.value)
                }
                _ => false,
            };
            if n.inputs.values().any(stale) {
                for port in Arc::make_mut(&mut n.inputs).values_mut() {
                    if let Some(r) = &port.child_reference {
                        if let Some(source) = child.input(&r.port).filter(|_| r.child == name) {
                            port.value = source.value.clone();
                        }
                    }
                }
            }
            Arc::make_mut(&mut n.children).insert(name.to_string(), Arc::new(child));
        }))
    }

    /// Rename a child, updating connections, published ports and the
    /// rendered child
    pub fn with_child_renamed(&self, old: &str, new: &str) -> Result<Node, NodeError> {
        let child = self.require_child(old)?;
        if old == new {
            return Ok(self.clone());
        }
        validate_name(new)?;
        if self.has_child(new) {
            return Err(NameError::Duplicate(new.to_string()).into());
        }
        let renamed = Arc::new(child.edited(|c| c.name = new.to_string()));
        let rename = |s: &str| if s == old { new.to_string() } else { s.to_string() };
        Ok(self.edited(|n| {
            n.children = Arc::new(
                n.children
                    .iter()
                    .map(|(key, existing)| {
                        if key == old {
                            (new.to_string(), Arc::clone(&renamed))
                        } else {
                            (key.clone(), Arc::clone(existing))
                        }
                    })
                    .collect(),
            );
            n.connections = Arc::new(
                n.connections
                    .iter()
                    .map(|c| {
                        Connection::new(
                            rename(c.output_node.as_str()),
                            rename(c.input_node.as_str()),
                            &c.input_port,
                        )
                    })
                    .collect(),
            );
            for port in Arc::make_mut(&mut n.inputs).values_mut() {
                if let Some(reference) = port.child_reference.as_mut() {
                    reference.child = rename(reference.child.as_str());
                }
            }
            n.rendered_child = n.rendered_child.as_deref().map(rename);
        }))
    }

    /// Name of the child whose output is the network output
    pub fn rendered_child_name(&self) -> Option<&str> {
        self.rendered_child.as_deref()
    }

    /// The child whose output is the network output
    pub fn rendered_child(&self) -> Option<&Arc<Node>> {
        self.rendered_child.as_deref().and_then(|name| self.child(name))
    }

    /// Set or clear the rendered child
    pub fn with_rendered_child(&self, name: Option<&str>) -> Result<Node, NodeError> {
        if let Some(name) = name {
            self.require_child(name)?;
        }
        Ok(self.edited(|n| n.rendered_child = name.map(str::to_string)))
    }

    // ========================================================================
    // Connections
    // ========================================================================

    /// Connections between children, in creation order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Whether a child takes part in any connection
    pub fn is_connected(&self, child: &str) -> bool {
        self.connections.iter().any(|c| c.involves_node(child))
    }

    /// Whether a child port has an incoming connection
    pub fn is_port_connected(&self, child: &str, port: &str) -> bool {
        self.connections.iter().any(|c| c.feeds(child, port))
    }

    /// Connections feeding a child port, in creation order
    pub fn connections_into<'a>(
        &'a self,
        child: &'a str,
        port: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.feeds(child, port))
    }

    /// Connect the output of `output_node` to `input_port` of `input_node`.
    ///
    /// A single-cardinality port loses its existing connection.
    pub fn connect(
        &self,
        output_node: &str,
        input_node: &str,
        input_port: &str,
    ) -> Result<Node, ConnectionError> {
        let output = self
            .child(output_node)
            .ok_or_else(|| ConnectionError::ChildNotFound(output_node.to_string()))?;
        let input = self
            .child(input_node)
            .ok_or_else(|| ConnectionError::ChildNotFound(input_node.to_string()))?;
        let port = input.input(input_port).ok_or_else(|| ConnectionError::PortNotFound {
            node: input_node.to_string(),
            port: input_port.to_string(),
        })?;
        if self.published_port_for(input_node, input_port).is_some() {
            return Err(ConnectionError::PortPublished {
                node: input_node.to_string(),
                port: input_port.to_string(),
            });
        }
        let output_type = output.output_type();
        if !output_type.can_connect_to(&port.port_type) {
            return Err(ConnectionError::IncompatibleTypes {
                output_type,
                input_type: port.port_type.clone(),
            });
        }
        if output_node == input_node {
            return Err(ConnectionError::SelfLoop(output_node.to_string()));
        }

        let mut connections: Vec<Connection> = self
            .connections
            .iter()
            .filter(|c| port.cardinality == Cardinality::Multiple || !c.feeds(input_node, input_port))
            .cloned()
            .collect();
        let downstream = |name: &String| {
            connections
                .iter()
                .filter(|c| c.output_node == *name)
                .map(|c| c.input_node.clone())
                .collect::<Vec<_>>()
        };
        if is_reachable(&input_node.to_string(), &output_node.to_string(), downstream) {
            return Err(ConnectionError::Cycle {
                output_node: output_node.to_string(),
                input_node: input_node.to_string(),
            });
        }

        let connection = Connection::new(output_node, input_node, input_port);
        if !connections.contains(&connection) {
            connections.push(connection);
        }
        Ok(self.edited(|n| n.connections = Arc::new(connections)))
    }

    /// Remove connections into a child port: all of them, or only the one
    /// from `output_node`
    pub fn disconnect(
        &self,
        input_node: &str,
        input_port: &str,
        output_node: Option<&str>,
    ) -> Result<Node, ConnectionError> {
        let input = self
            .child(input_node)
            .ok_or_else(|| ConnectionError::ChildNotFound(input_node.to_string()))?;
        if !input.has_input(input_port) {
            return Err(ConnectionError::PortNotFound {
                node: input_node.to_string(),
                port: input_port.to_string(),
            });
        }
        let keep = |c: &&Connection| {
            !c.feeds(input_node, input_port) || output_node.is_some_and(|o| c.output_node != o)
        };
        Ok(self.edited(|n| {
            n.connections = Arc::new(n.connections.iter().filter(keep).cloned().collect());
        }))
    }

    /// Remove every connection from or to a child
    pub fn disconnect_child(&self, child: &str) -> Result<Node, ConnectionError> {
        if !self.has_child(child) {
            return Err(ConnectionError::ChildNotFound(child.to_string()));
        }
        Ok(self.edited(|n| {
            n.connections = Arc::new(
                n.connections
                    .iter()
                    .filter(|c| !c.involves_node(child))
                    .cloned()
                    .collect(),
            );
        }))
    }

    /// Dependency graph of the children, with an edge per connection
    pub fn dependency_graph(&self) -> Result<DependencyGraph<String>, DependencyError> {
        let mut graph = DependencyGraph::new();
        for name in self.children.keys() {
            graph.add_node(name.clone());
        }
        for c in self.connections.iter() {
            if !graph.has_dependency(&c.output_node, &c.input_node) {
                graph.add_dependency(c.output_node.clone(), c.input_node.clone())?;
            }
        }
        Ok(graph)
    }

    // ========================================================================
    // Published ports
    // ========================================================================

    /// Published ports as (public name, child reference) pairs
    pub fn published_ports(&self) -> impl Iterator<Item = (&str, &ChildReference)> {
        self.inputs
            .values()
            .filter_map(|port| Some((port.name.as_str(), port.child_reference.as_ref()?)))
    }

    /// The network port that publishes a child port, if any
    pub fn published_port_for(&self, child: &str, port: &str) -> Option<&Port> {
        self.inputs.values().find(|p| {
            p.child_reference
                .as_ref()
                .is_some_and(|r| r.child == child && r.port == port)
        })
    }

    /// Expose a child port as an input of this network.
    ///
    /// Existing connections into the child port are removed.
    pub fn publish(&self, child: &str, port: &str, public_name: &str) -> Result<Node, PublishError> {
        validate_name(public_name)?;
        let child_node = self
            .child(child)
            .ok_or_else(|| PublishError::ChildNotFound(child.to_string()))?;
        let child_port = child_node.input(port).ok_or_else(|| PublishError::PortNotFound {
            child: child.to_string(),
            port: port.to_string(),
        })?;
        if let Some(existing) = self.published_port_for(child, port) {
            return Err(PublishError::AlreadyPublished {
                child: child.to_string(),
                port: port.to_string(),
                name: existing.name.clone(),
            });
        }
        if self.has_input(public_name) {
            return Err(PublishError::DuplicateName(public_name.to_string()));
        }
        let published = Port::published(public_name, child, child_port);
        Ok(self.edited(|n| {
            n.connections = Arc::new(
                n.connections
                    .iter()
                    .filter(|c| !c.feeds(child, port))
                    .cloned()
                    .collect(),
            );
            Arc::make_mut(&mut n.inputs).insert(public_name.to_string(), published);
        }))
    }

    /// Remove a published port
    pub fn unpublish(&self, public_name: &str) -> Result<Node, PublishError> {
        match self.input(public_name) {
            Some(port) if port.is_published() => Ok(self.edited(|n| {
                Arc::make_mut(&mut n.inputs).shift_remove(public_name);
            })),
            _ => Err(PublishError::NotPublished(public_name.to_string())),
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check every structural invariant of this node and its descendants
    pub fn validate(&self) -> Result<(), NodeError> {
        for (key, port) in self.inputs.iter() {
            if *key != port.name {
                return Err(NodeError::KeyMismatch {
                    key: key.clone(),
                    name: port.name.clone(),
                });
            }
            validate_name(&port.name)?;
            port.validate()?;
            if let Some(reference) = &port.child_reference {
                let child_port = self
                    .child(&reference.child)
                    .and_then(|c| c.input(&reference.port));
                if child_port.is_none() {
                    return Err(PublishError::PortNotFound {
                        child: reference.child.clone(),
                        port: reference.port.clone(),
                    }
                    .into());
                }
                let publishers = self
                    .inputs
                    .values()
                    .filter(|p| p.child_reference.as_ref() == Some(reference))
                    .count();
                if publishers > 1 {
                    return Err(PublishError::AlreadyPublished {
                        child: reference.child.clone(),
                        port: reference.port.clone(),
                        name: port.name.clone(),
                    }
                    .into());
                }
            }
        }

        for (key, child) in self.children.iter() {
            if *key != child.name {
                return Err(NodeError::KeyMismatch {
                    key: key.clone(),
                    name: child.name.clone(),
                });
            }
            validate_name(&child.name)?;
        }

        if let Some(rendered) = &self.rendered_child {
            self.require_child(rendered)?;
        }

        for c in self.connections.iter() {
            let output = self
                .child(&c.output_node)
                .ok_or_else(|| ConnectionError::ChildNotFound(c.output_node.clone()))?;
            let input = self
                .child(&c.input_node)
                .ok_or_else(|| ConnectionError::ChildNotFound(c.input_node.clone()))?;
            let port = input.input(&c.input_port).ok_or_else(|| ConnectionError::PortNotFound {
                node: c.input_node.clone(),
                port: c.input_port.clone(),
            })?;
            if !output.output_type().can_connect_to(&port.port_type) {
                return Err(ConnectionError::IncompatibleTypes {
                    output_type: output.output_type(),
                    input_type: port.port_type.clone(),
                }
                .into());
            }
            if self.published_port_for(&c.input_node, &c.input_port).is_some() {
                return Err(ConnectionError::PortPublished {
                    node: c.input_node.clone(),
                    port: c.input_port.clone(),
                }
                .into());
            }
            if port.cardinality == Cardinality::Single
                && self.connections_into(&c.input_node, &c.input_port).count() > 1
            {
                return Err(NodeError::MultipleConnections {
                    node: c.input_node.clone(),
                    port: c.input_port.clone(),
                });
            }
        }
        self.dependency_graph()?;

        self.children.values().try_for_each(|child| child.validate())
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::root()
    }
}

/// Error when publishing or unpublishing a port
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PublishError {
    /// Public name is not a valid identifier
    #[error(transparent)]
    InvalidName(#[from] NameError),

    /// Public name already used by a port of the network
    #[error("Port name `{0}` is already in use")]
    DuplicateName(String),

    /// Child not found
    #[error("Child not found: {0}")]
    ChildNotFound(String),

    /// Child port not found
    #[error("Port not found: {child}.{port}")]
    PortNotFound {
        /// Child name
        child: String,
        /// Port name
        port: String,
    },

    /// Child port already published
    #[error("Port {child}.{port} is already published as `{name}`")]
    AlreadyPublished {
        /// Child name
        child: String,
        /// Port name
        port: String,
        /// Existing public name
        name: String,
    },

    /// No published port with that name
    #[error("No published port named `{0}`")]
    NotPublished(String),
}

/// Error for structural node edits
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NodeError {
    /// Invalid or duplicate name
    #[error(transparent)]
    Name(#[from] NameError),

    /// Connection problem
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Publishing problem
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Port value or metadata problem
    #[error(transparent)]
    Port(#[from] PortError),

    /// Function lookup problem
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Children form a cycle
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// Child not found
    #[error("Child not found: {0}")]
    ChildNotFound(String),

    /// Input port not found
    #[error("Port not found: {node}.{port}")]
    PortNotFound {
        /// Node name
        node: String,
        /// Port name
        port: String,
    },

    /// Replacement child has another name
    #[error("Replacement for `{expected}` is named `{found}`")]
    ChildNameMismatch {
        /// Name of the replaced child
        expected: String,
        /// Name of the replacement
        found: String,
    },

    /// Map key differs from the entry's name
    #[error("Entry `{key}` is named `{name}`")]
    KeyMismatch {
        /// Map key
        key: String,
        /// Entry name
        name: String,
    },

    /// Single-cardinality port with several connections
    #[error("Port {node}.{port} accepts a single connection")]
    MultipleConnections {
        /// Child name
        node: String,
        /// Port name
        port: String,
    },
}
