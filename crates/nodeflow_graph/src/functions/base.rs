// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `core` namespace.

use crate::function::{arg, Function, FunctionLibrary};
use crate::port::PortType;
use crate::value::Value;

/// Create the core library
pub fn library() -> FunctionLibrary {
    FunctionLibrary::new(super::CORE)
        .with_function(Function::scalar("zero", |_| Ok(Some(Value::Float(0.0)))))
        .with_function(
            Function::scalar("identity", |args| Ok(Some(arg(args, 0)?.clone())))
                .with_argument("value", PortType::Float),
        )
}
