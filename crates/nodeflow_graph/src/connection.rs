// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for a network.

use crate::port::PortType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A connection from one child's output into an input port of another child
/// of the same network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Source child name
    pub output_node: String,
    /// Destination child name
    pub input_node: String,
    /// Destination port name
    pub input_port: String,
}

impl Connection {
    /// Create a new connection
    pub fn new(
        output_node: impl Into<String>,
        input_node: impl Into<String>,
        input_port: impl Into<String>,
    ) -> Self {
        Self {
            output_node: output_node.into(),
            input_node: input_node.into(),
            input_port: input_port.into(),
        }
    }

    /// Check if this connection involves a specific child
    pub fn involves_node(&self, name: &str) -> bool {
        self.output_node == name || self.input_node == name
    }

    /// Check if this connection feeds a specific port
    pub fn feeds(&self, node: &str, port: &str) -> bool {
        self.input_node == node && self.input_port == port
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}.{}", self.output_node, self.input_node, self.input_port)
    }
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// Child not found
    #[error("Child not found: {0}")]
    ChildNotFound(String),

    /// Port not found
    #[error("Port not found: {node}.{port}")]
    PortNotFound {
        /// Child name
        node: String,
        /// Port name
        port: String,
    },

    /// Incompatible port types
    #[error("Cannot connect {output_type} output to {input_type} port")]
    IncompatibleTypes {
        /// Output type of the source
        output_type: PortType,
        /// Type of the destination port
        input_type: PortType,
    },

    /// Self-loop not allowed
    #[error("Child `{0}` cannot be connected to itself")]
    SelfLoop(String),

    /// Connection would introduce a cycle
    #[error("Connecting {output_node} to {input_node} would create a cycle")]
    Cycle {
        /// Source child
        output_node: String,
        /// Destination child
        input_node: String,
    },

    /// Port is fed through a published port
    #[error("Port {node}.{port} is published and cannot be connected")]
    PortPublished {
        /// Child name
        node: String,
        /// Port name
        port: String,
    },
}
