// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sample library written by `nodeflow demo`.

use crate::controller::{LibraryController, Result};
use nodeflow_graph::functions::standard_repository;
use nodeflow_graph::{Node, NodeError, NodeLibrary, Range, Value};

/// Build the sample library.
///
/// The root network adds a list of numbers to a ramp produced by a
/// subnetwork, and renders the sum. The ramp's length is published.
pub fn demo_library() -> Result<NodeLibrary> {
    let library = NodeLibrary::with_parts("demo", Node::network(), standard_repository());
    let mut c = LibraryController::new(library);

    let prototype = Node::network().with_name("ramp").map_err(NodeError::from)?;
    let ramp = c.create_node("/", &prototype)?;
    let ramp_path = format!("/{ramp}");
    let range = c.create_function_node(&ramp_path, "math/range")?;
    c.set_port_value(&format!("{ramp_path}/{range}"), "step", Value::Float(1.0))?;
    c.set_rendered_child(&ramp_path, Some(&range))?;
    c.publish(&ramp_path, &range, "end", "length")?;
    c.set_port_value(&ramp_path, "length", Value::Float(4.0))?;

    let numbers = c.create_function_node("/", "math/make_numbers")?;
    c.set_port_value(&format!("/{numbers}"), "string", Value::from("10 20 30"))?;
    c.set_port_value(&format!("/{numbers}"), "separator", Value::from(" "))?;

    let add = c.create_function_node("/", "math/add")?;
    let add_path = format!("/{add}");
    for port in ["v1", "v2"] {
        let input = c
            .library()
            .node_for_path(&add_path)
            .and_then(|n| n.input(port))
            .cloned();
        if let Some(input) = input {
            c.edit_port(&add_path, port, input.with_range(Range::List))?;
        }
    }
    c.connect("/", &ramp, &add, "v1")?;
    c.connect("/", &numbers, &add, "v2")?;

    let sum = c.create_function_node("/", "math/sum")?;
    c.connect("/", &add, &sum, "values")?;
    c.set_rendered_child("/", Some(&sum))?;

    Ok(c.library().clone())
}
