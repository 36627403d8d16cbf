// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rendering nodes to value lists.
//!
//! [`NodeContext`] evaluates a node inside its library. Inputs are resolved by
//! rendering upstream children, list-range inputs are broadcast against each
//! other, and networks render their rendered child with inputs bound through
//! their published ports.
//!
//! A context holds no mutable state between calls. Each render owns its memo
//! table, so a child feeding several consumers is evaluated once per call and
//! independent threads can render the same library concurrently.

use crate::function::{Callable, Function, FunctionError};
use crate::library::NodeLibrary;
use crate::node::Node;
use crate::port::{Port, Range};
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Evaluator for the nodes of one library
#[derive(Debug, Clone)]
pub struct NodeContext<'a> {
    library: &'a NodeLibrary,
    overrides: IndexMap<String, Value>,
}

/// Per-network evaluation state for one render call
struct Scope<'n> {
    network: Option<&'n Node>,
    /// Values of published child ports, keyed by (child, port)
    bindings: HashMap<(String, String), Vec<Value>>,
    /// Whether overrides apply to this network's children
    top: bool,
    memo: HashMap<String, Vec<Value>>,
    in_progress: IndexSet<String>,
}

impl<'n> Scope<'n> {
    fn detached() -> Self {
        Self::new(None, HashMap::new(), false)
    }

    fn new(
        network: Option<&'n Node>,
        bindings: HashMap<(String, String), Vec<Value>>,
        top: bool,
    ) -> Self {
        Self {
            network,
            bindings,
            top,
            memo: HashMap::new(),
            in_progress: IndexSet::new(),
        }
    }
}

impl<'a> NodeContext<'a> {
    /// Create a context for a library
    pub fn new(library: &'a NodeLibrary) -> Self {
        Self {
            library,
            overrides: IndexMap::new(),
        }
    }

    /// Override a port of a child of the top-level network, addressed as
    /// `child.port`
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// The library being rendered
    pub fn library(&self) -> &'a NodeLibrary {
        self.library
    }

    /// Render the library root
    pub fn render_root(&self) -> Result<Vec<Value>, RenderError> {
        self.render_node(self.library.root())
    }

    /// Render the node at an absolute path. Nodes below the root are rendered
    /// inside their parent network.
    pub fn render_path(&self, path: &str) -> Result<Vec<Value>, RenderError> {
        let missing = || RenderError::NodeNotFound(path.to_string());
        let trimmed = path.trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((parent, child)) if !child.is_empty() => {
                let parent = if parent.is_empty() { "/" } else { parent };
                let network = self.library.node_for_path(parent).ok_or_else(missing)?;
                if !network.has_child(child) {
                    return Err(missing());
                }
                self.render_child(network, child)
            }
            _ => {
                let node = self.library.node_for_path(path).ok_or_else(missing)?;
                self.render_node(node)
            }
        }
    }

    /// Render a node on its own, outside any network
    pub fn render_node(&self, node: &Node) -> Result<Vec<Value>, RenderError> {
        debug!(node = node.name(), "Rendering node");
        self.evaluate(&mut Scope::detached(), node)
    }

    /// Render a child of a network, with the network's published ports
    /// bound to their own values
    pub fn render_child(&self, network: &Node, child: &str) -> Result<Vec<Value>, RenderError> {
        debug!(network = network.name(), child, "Rendering child");
        let mut scope = self.network_scope(&mut Scope::detached(), network, true)?;
        self.render_in(&mut scope, child)
    }

    fn render_in<'n>(&self, scope: &mut Scope<'n>, name: &str) -> Result<Vec<Value>, RenderError> {
        if let Some(values) = scope.memo.get(name) {
            trace!(node = name, "Memoized result");
            return Ok(values.clone());
        }
        let node = scope
            .network
            .and_then(|network| network.child(name))
            .ok_or_else(|| RenderError::ChildNotFound(name.to_string()))?;
        if !scope.in_progress.insert(name.to_string()) {
            return Err(RenderError::Cycle(name.to_string()));
        }
        let result = self.evaluate(scope, node);
        scope.in_progress.shift_remove(name);
        let values = result?;
        scope.memo.insert(name.to_string(), values.clone());
        Ok(values)
    }

    fn evaluate<'n>(&self, scope: &mut Scope<'n>, node: &'n Node) -> Result<Vec<Value>, RenderError> {
        if let Some(identifier) = node.function() {
            let function = self.library.functions().resolve(identifier).map_err(|_| {
                RenderError::FunctionNotFound {
                    node: node.name().to_string(),
                    function: identifier.to_string(),
                }
            })?;
            let mut inputs = Vec::new();
            for port in node.inputs() {
                inputs.push((port.range, self.resolve_input(scope, node, port)?));
            }
            return invoke(node, function, inputs);
        }
        if node.is_network() {
            let top = scope.network.is_none();
            let mut inner = self.network_scope(scope, node, top)?;
            return match node.rendered_child_name() {
                Some(rendered) => self.render_in(&mut inner, rendered),
                None => Ok(Vec::new()),
            };
        }
        trace!(node = node.name(), "Node has no function");
        Ok(Vec::new())
    }

    /// Resolve a network's published ports in the enclosing scope and bind
    /// them to the child ports they forward to.
    ///
    /// Only ports fed from the enclosing scope are bound. An unfed child
    /// port keeps its own value.
    fn network_scope<'n>(
        &self,
        outer: &mut Scope<'n>,
        network: &'n Node,
        top: bool,
    ) -> Result<Scope<'n>, RenderError> {
        let mut bindings = HashMap::new();
        for port in network.inputs() {
            if let Some(reference) = &port.child_reference {
                if !self.is_fed(outer, network, port) {
                    continue;
                }
                let values = self.resolve_input(outer, network, port)?;
                bindings.insert((reference.child.clone(), reference.port.clone()), values);
            }
        }
        Ok(Scope::new(Some(network), bindings, top))
    }

    /// Whether an input gets its values from a connection, a binding or an
    /// override instead of its own value
    fn is_fed(&self, scope: &Scope<'_>, node: &Node, port: &Port) -> bool {
        let connected = scope
            .network
            .is_some_and(|network| network.is_port_connected(node.name(), &port.name));
        connected
            || scope
                .bindings
                .contains_key(&(node.name().to_string(), port.name.clone()))
            || (scope.top && self.overrides.contains_key(&override_key(node, port)))
    }

    /// Effective values of one input: connections, then a published binding,
    /// then an override, then the port's own value
    fn resolve_input<'n>(
        &self,
        scope: &mut Scope<'n>,
        node: &Node,
        port: &Port,
    ) -> Result<Vec<Value>, RenderError> {
        if let Some(network) = scope.network {
            let sources: Vec<&str> = network
                .connections_into(node.name(), &port.name)
                .map(|c| c.output_node.as_str())
                .collect();
            if !sources.is_empty() {
                let mut values = Vec::new();
                for source in sources {
                    let upstream = self.render_in(scope, source)?;
                    values.extend(
                        upstream
                            .into_iter()
                            .map(|v| port.clamp(v.convert_to(&port.port_type))),
                    );
                }
                return Ok(values);
            }
        }

        let key = (node.name().to_string(), port.name.clone());
        if let Some(values) = scope.bindings.get(&key) {
            return Ok(values.clone());
        }

        if scope.top {
            if let Some(value) = self.overrides.get(&override_key(node, port)) {
                return Ok(vec![port.clamp(value.clone().convert_to(&port.port_type))]);
            }
        }

        Ok(port.value.clone().into_iter().collect())
    }
}

fn override_key(node: &Node, port: &Port) -> String {
    format!("{}.{}", node.name(), port.name)
}

/// Call a node's function over its resolved inputs
fn invoke(
    node: &Node,
    function: &Function,
    inputs: Vec<(Range, Vec<Value>)>,
) -> Result<Vec<Value>, RenderError> {
    if inputs.iter().any(|(_, values)| values.is_empty()) {
        trace!(node = node.name(), "Empty input, no results");
        return Ok(Vec::new());
    }
    let processing = |source| RenderError::Processing {
        node: node.name().to_string(),
        source,
    };

    if let (Callable::ListAware(f), Range::List) = (function.callable(), node.output_range()) {
        let lists: Vec<Vec<Value>> = inputs
            .into_iter()
            .map(|(range, values)| match range {
                Range::List => values,
                Range::Value => values.into_iter().take(1).collect(),
            })
            .collect();
        return f(lists.as_slice()).map_err(processing);
    }

    let length = inputs
        .iter()
        .filter(|(range, _)| *range == Range::List)
        .map(|(_, values)| values.len())
        .max()
        .unwrap_or(1);
    trace!(node = node.name(), length, "Broadcasting");

    let mut results = Vec::with_capacity(length);
    for index in 0..length {
        let args: Vec<Value> = inputs
            .iter()
            .map(|(range, values)| match range {
                Range::List => values[index.min(values.len() - 1)].clone(),
                Range::Value => values[0].clone(),
            })
            .collect();
        match function.callable() {
            Callable::Scalar(f) => results.extend(f(args.as_slice()).map_err(processing)?),
            Callable::ListAware(f) => {
                let lists: Vec<Vec<Value>> = args.into_iter().map(|v| vec![v]).collect();
                results.extend(f(lists.as_slice()).map_err(processing)?);
            }
        }
    }
    Ok(results)
}

/// Error during rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A node names a function the library cannot resolve
    #[error("Function `{function}` of node `{node}` not found")]
    FunctionNotFound {
        /// Node name
        node: String,
        /// Function identifier
        function: String,
    },

    /// A function failed
    #[error("Error processing node `{node}`: {source}")]
    Processing {
        /// Node name
        node: String,
        /// Failure raised by the function
        source: FunctionError,
    },

    /// Child not found in the enclosing network
    #[error("Child not found: {0}")]
    ChildNotFound(String),

    /// No node at a library path
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Connections form a cycle through this node
    #[error("Cycle detected at node `{0}`")]
    Cycle(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{FunctionLibrary, FunctionRepository};
    use crate::functions::standard_repository;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn node(repo: &FunctionRepository, identifier: &str, name: &str) -> Node {
        Node::from_function(identifier, repo.resolve(identifier).unwrap())
            .unwrap()
            .with_name(name)
            .unwrap()
    }

    fn number(repo: &FunctionRepository, name: &str, value: f64) -> Node {
        node(repo, "math/number", name).with_input_value("value", value).unwrap()
    }

    fn adder_network(repo: &FunctionRepository) -> Node {
        Node::network()
            .with_child_added(number(repo, "number42", 42.0))
            .unwrap()
            .with_child_added(number(repo, "number5", 5.0))
            .unwrap()
            .with_child_added(node(repo, "math/add", "add"))
            .unwrap()
            .connect("number42", "add", "v1")
            .unwrap()
            .connect("number5", "add", "v2")
            .unwrap()
            .with_rendered_child(Some("add"))
            .unwrap()
    }

    fn floats(values: &[f64]) -> Vec<Value> {
        values.iter().copied().map(Value::Float).collect()
    }

    #[test]
    fn test_render_connected_network() {
        let repo = standard_repository();
        let library = NodeLibrary::with_parts("test", adder_network(&repo), repo);
        let context = NodeContext::new(&library);
        assert_eq!(context.render_root().unwrap(), floats(&[47.0]));
        assert_eq!(context.render_path("/").unwrap(), floats(&[47.0]));
        assert_eq!(context.render_path("/number5").unwrap(), floats(&[5.0]));
        assert!(matches!(
            context.render_path("/missing"),
            Err(RenderError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_empty_generator_yields_nothing() {
        let repo = standard_repository();
        let root = Node::network()
            .with_child_added(node(&repo, "math/make_numbers", "make_numbers1"))
            .unwrap()
            .with_child_added(node(&repo, "math/add", "add1"))
            .unwrap()
            .connect("make_numbers1", "add1", "v1")
            .unwrap()
            .with_rendered_child(Some("add1"))
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        assert_eq!(NodeContext::new(&library).render_root().unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_list_inputs_broadcast_longest() {
        let repo = standard_repository();
        let as_list = |n: Node, port: &str| {
            let changed = n.input(port).unwrap().clone().with_range(Range::List);
            n.with_input_changed(port, changed).unwrap()
        };
        let add = as_list(as_list(node(&repo, "math/add", "add"), "v1"), "v2");
        let root = Node::network()
            .with_child_added(
                node(&repo, "math/make_numbers", "short")
                    .with_input_value("string", "1,2,3")
                    .unwrap()
                    .with_input_value("separator", ",")
                    .unwrap(),
            )
            .unwrap()
            .with_child_added(
                node(&repo, "math/make_numbers", "long")
                    .with_input_value("string", "100,200,300,400,500")
                    .unwrap()
                    .with_input_value("separator", ",")
                    .unwrap(),
            )
            .unwrap()
            .with_child_added(add)
            .unwrap()
            .connect("short", "add", "v1")
            .unwrap()
            .connect("long", "add", "v2")
            .unwrap()
            .with_rendered_child(Some("add"))
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        assert_eq!(
            NodeContext::new(&library).render_root().unwrap(),
            floats(&[101.0, 202.0, 303.0, 401.0, 502.0])
        );
    }

    #[test]
    fn test_value_range_takes_first_element() {
        let repo = standard_repository();
        let root = Node::network()
            .with_child_added(
                node(&repo, "math/make_numbers", "numbers")
                    .with_input_value("string", "3 4 5")
                    .unwrap()
                    .with_input_value("separator", " ")
                    .unwrap(),
            )
            .unwrap()
            .with_child_added(node(&repo, "math/negate", "negate"))
            .unwrap()
            .connect("numbers", "negate", "value")
            .unwrap()
            .with_rendered_child(Some("negate"))
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        assert_eq!(NodeContext::new(&library).render_root().unwrap(), floats(&[-3.0]));
    }

    #[test]
    fn test_list_aware_function_receives_whole_list() {
        let repo = standard_repository();
        let root = Node::network()
            .with_child_added(
                node(&repo, "math/range", "range")
                    .with_input_value("end", 5.0)
                    .unwrap()
                    .with_input_value("step", 1.0)
                    .unwrap(),
            )
            .unwrap()
            .with_child_added(node(&repo, "math/sum", "sum"))
            .unwrap()
            .with_child_added(node(&repo, "list/reverse", "reverse"))
            .unwrap()
            .connect("range", "sum", "values")
            .unwrap()
            .connect("range", "reverse", "list")
            .unwrap()
            .with_rendered_child(Some("sum"))
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        let context = NodeContext::new(&library);
        assert_eq!(context.render_root().unwrap(), floats(&[10.0]));
        assert_eq!(
            context.render_path("/reverse").unwrap(),
            floats(&[4.0, 3.0, 2.0, 1.0, 0.0])
        );
    }

    #[test]
    fn test_published_ports_bind_subnetwork_inputs() {
        let repo = standard_repository();
        let sub = Node::network()
            .with_name("sub")
            .unwrap()
            .with_child_added(node(&repo, "math/add", "add").with_input_value("v2", 2.0).unwrap())
            .unwrap()
            .with_rendered_child(Some("add"))
            .unwrap()
            .publish("add", "v1", "a")
            .unwrap()
            .publish("add", "v2", "b")
            .unwrap();
        let root = Node::network()
            .with_child_added(number(&repo, "number5", 5.0))
            .unwrap()
            .with_child_added(number(&repo, "number3", 3.0))
            .unwrap()
            .with_child_added(sub)
            .unwrap()
            .connect("number5", "sub", "a")
            .unwrap()
            .connect("number3", "sub", "b")
            .unwrap()
            .with_rendered_child(Some("sub"))
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        assert_eq!(NodeContext::new(&library).render_root().unwrap(), floats(&[8.0]));

        let unpublished = library
            .with_node_edited("/sub", |sub| Ok(sub.unpublish("b")?))
            .unwrap();
        assert_eq!(unpublished.root().connections().len(), 1);
        assert_eq!(NodeContext::new(&unpublished).render_root().unwrap(), floats(&[7.0]));

        let reconnected = unpublished
            .with_node_edited("/sub", |sub| Ok(sub.publish("add", "v2", "b")?))
            .unwrap()
            .with_node_edited("/", |root| Ok(root.connect("number3", "sub", "b")?))
            .unwrap();
        assert_eq!(reconnected.root().connections().len(), 2);
        assert_eq!(NodeContext::new(&reconnected).render_root().unwrap(), floats(&[8.0]));
    }

    #[test]
    fn test_unfed_published_port_uses_child_value() {
        let repo = standard_repository();
        let sub = Node::network()
            .with_name("sub")
            .unwrap()
            .with_child_added(node(&repo, "math/negate", "negate"))
            .unwrap()
            .with_rendered_child(Some("negate"))
            .unwrap()
            .publish("negate", "value", "amount")
            .unwrap();
        let root = Node::network()
            .with_child_added(sub)
            .unwrap()
            .with_rendered_child(Some("sub"))
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo)
            .with_node_edited("/sub/negate", |negate| negate.with_input_value("value", 5.0))
            .unwrap();
        assert_eq!(NodeContext::new(&library).render_root().unwrap(), floats(&[-5.0]));
        assert_eq!(
            library.node_for_path("/sub").and_then(|sub| sub.input_value("amount")),
            Some(&Value::Float(5.0))
        );

        let context = NodeContext::new(&library).with_override("sub.amount", 2.0);
        assert_eq!(context.render_root().unwrap(), floats(&[-2.0]));
    }

    #[test]
    fn test_shared_upstream_rendered_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counting = FunctionLibrary::new("test").with_function(Function::scalar("count", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Value::Float(2.0)))
        }));
        let repo = standard_repository().with_library_added(counting);
        let source = Node::root().extend().with_name("source").unwrap().with_function("test/count");
        let root = Node::network()
            .with_child_added(source)
            .unwrap()
            .with_child_added(node(&repo, "math/multiply", "multiply"))
            .unwrap()
            .connect("source", "multiply", "v1")
            .unwrap()
            .connect("source", "multiply", "v2")
            .unwrap()
            .with_rendered_child(Some("multiply"))
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        let context = NodeContext::new(&library);
        assert_eq!(context.render_root().unwrap(), floats(&[4.0]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        context.render_root().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_connected_values_are_converted_and_clamped() {
        let repo = standard_repository();
        let integer = node(&repo, "math/integer", "integer");
        let bounded = integer.input("value").unwrap().clone().with_max(Some(5.0)).unwrap();
        let root = Node::network()
            .with_child_added(number(&repo, "number", 7.6))
            .unwrap()
            .with_child_added(integer.with_input_changed("value", bounded).unwrap())
            .unwrap()
            .with_child_added(node(&repo, "string/upper", "upper"))
            .unwrap()
            .connect("number", "integer", "value")
            .unwrap()
            .connect("number", "upper", "string")
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        let context = NodeContext::new(&library);
        assert_eq!(context.render_path("/integer").unwrap(), vec![Value::Int(5)]);
        assert_eq!(context.render_path("/upper").unwrap(), vec![Value::from("7.6")]);
    }

    #[test]
    fn test_overrides_apply_to_top_network() {
        let repo = standard_repository();
        let library = NodeLibrary::with_parts("test", adder_network(&repo), repo);
        let context = NodeContext::new(&library).with_override("number5.value", 10.0);
        assert_eq!(context.render_root().unwrap(), floats(&[52.0]));
    }

    #[test]
    fn test_missing_function_and_failures() {
        let repo = standard_repository();
        let root = Node::network()
            .with_child_added(Node::root().extend().with_name("ghost").unwrap().with_function("math/nope"))
            .unwrap()
            .with_child_added(
                node(&repo, "math/divide", "divide").with_input_value("v1", 1.0).unwrap(),
            )
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        let context = NodeContext::new(&library);
        assert!(matches!(
            context.render_path("/ghost"),
            Err(RenderError::FunctionNotFound { .. })
        ));
        assert!(matches!(
            context.render_path("/divide"),
            Err(RenderError::Processing { source: FunctionError::DivisionByZero, .. })
        ));
    }

    #[test]
    fn test_failure_midway_through_broadcast_discards_results() {
        let repo = standard_repository();
        let divide = node(&repo, "math/divide", "divide").with_input_value("v1", 1.0).unwrap();
        let divisor = divide.input("v2").unwrap().clone().with_range(Range::List);
        let root = Node::network()
            .with_child_added(
                node(&repo, "math/make_numbers", "divisors")
                    .with_input_value("string", "1,2,0")
                    .unwrap()
                    .with_input_value("separator", ",")
                    .unwrap(),
            )
            .unwrap()
            .with_child_added(divide.with_input_changed("v2", divisor).unwrap())
            .unwrap()
            .connect("divisors", "divide", "v2")
            .unwrap()
            .with_rendered_child(Some("divide"))
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        assert!(matches!(
            NodeContext::new(&library).render_root(),
            Err(RenderError::Processing { source: FunctionError::DivisionByZero, .. })
        ));
    }

    #[test]
    fn test_unbounded_range_fails_without_allocating() {
        let repo = standard_repository();
        let root = Node::network()
            .with_child_added(
                node(&repo, "math/pow", "pow")
                    .with_input_value("v1", 10.0)
                    .unwrap()
                    .with_input_value("v2", 400.0)
                    .unwrap(),
            )
            .unwrap()
            .with_child_added(node(&repo, "math/range", "range").with_input_value("step", 1.0).unwrap())
            .unwrap()
            .connect("pow", "range", "end")
            .unwrap()
            .with_rendered_child(Some("range"))
            .unwrap();
        let library = NodeLibrary::with_parts("test", root, repo);
        assert!(matches!(
            NodeContext::new(&library).render_root(),
            Err(RenderError::Processing { source: FunctionError::Failed(_), .. })
        ));
    }

    #[test]
    fn test_empty_network_renders_nothing() {
        let library = NodeLibrary::new("empty");
        assert_eq!(NodeContext::new(&library).render_root().unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_cycle_in_unvalidated_network() {
        let text = r#"(
            name: "network",
            children: {
                "a": (name: "a", function: Some("math/negate"), inputs: {
                    "value": (name: "value", port_type: Float, value: Some(Float(1.0))),
                }),
                "b": (name: "b", function: Some("math/negate"), inputs: {
                    "value": (name: "value", port_type: Float, value: Some(Float(1.0))),
                }),
            },
            connections: [
                (output_node: "a", input_node: "b", input_port: "value"),
                (output_node: "b", input_node: "a", input_port: "value"),
            ],
            rendered_child: Some("b"),
        )"#;
        let root: Node = ron::from_str(text).unwrap();
        assert!(root.validate().is_err());
        let library = NodeLibrary::with_parts("cyclic", root, standard_repository());
        assert!(matches!(
            NodeContext::new(&library).render_root(),
            Err(RenderError::Cycle(_))
        ));
    }

    #[test]
    fn test_concurrent_renders() {
        let repo = standard_repository();
        let library = NodeLibrary::with_parts("test", adder_network(&repo), repo);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| NodeContext::new(&library).render_root().unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), floats(&[47.0]));
            }
        });
    }
}
