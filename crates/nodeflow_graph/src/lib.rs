// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immutable node graphs and their evaluator.
//!
//! A [`Node`] is either a computation that calls a native function or a
//! network of named children wired together by [`Connection`]s. Nodes are
//! persistent values: every edit returns a new node and shares the untouched
//! parts with the original.
//!
//! ## Architecture
//!
//! - [`value`] and [`port`]: typed values, ports and the type compatibility
//!   rules used when connecting
//! - [`node`]: the immutable node and network API
//! - [`dependency`]: a generic dependency graph, sharing its reachability
//!   check with [`Node::connect`]
//! - [`function`] and [`functions`]: the function repository and the built-in
//!   `core`, `math`, `string` and `list` libraries
//! - [`library`]: node libraries and their RON document format
//! - [`evaluation`]: [`NodeContext`], which renders nodes to value lists

pub mod connection;
pub mod dependency;
pub mod evaluation;
pub mod function;
pub mod functions;
pub mod library;
pub mod naming;
pub mod node;
pub mod port;
pub mod value;

pub use connection::{Connection, ConnectionError};
pub use dependency::{DependencyError, DependencyGraph};
pub use evaluation::{NodeContext, RenderError};
pub use function::{
    Function, FunctionError, FunctionLibrary, FunctionRepository, LookupError, MAX_LIST_LENGTH,
};
pub use library::{LoadError, NodeLibrary, FORMAT_VERSION};
pub use naming::NameError;
pub use node::{Node, NodeError, PublishError};
pub use port::{is_compatible, Cardinality, Port, PortError, PortType, Range};
pub use value::{Color, ParseValueError, Point, Value};
