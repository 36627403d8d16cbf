// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in function libraries.

pub mod base;
pub mod list;
pub mod math;
pub mod string;

use crate::function::FunctionRepository;

/// Namespace of the library every repository contains
pub const CORE: &str = "core";

/// Repository with every built-in library
pub fn standard_repository() -> FunctionRepository {
    FunctionRepository::of([math::library(), string::library(), list::library()])
}
