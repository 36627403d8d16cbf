// SPDX-License-Identifier: MIT OR Apache-2.0
//! Native functions and the repository that resolves them by identifier.
//!
//! Identifiers have the form `namespace/name`. A [`FunctionLibrary`] owns one
//! namespace; a [`FunctionRepository`] is an immutable set of libraries that
//! always includes `core`.

use crate::functions;
use crate::port::{PortType, Range};
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Signature of a function invoked once per broadcast index
pub type ScalarFn = dyn Fn(&[Value]) -> Result<Option<Value>, FunctionError> + Send + Sync;

/// Signature of a function invoked once over whole lists
pub type ListFn = dyn Fn(&[Vec<Value>]) -> Result<Vec<Value>, FunctionError> + Send + Sync;

/// The calling convention of a function
#[derive(Clone)]
pub enum Callable {
    /// One value per argument in, at most one value out
    Scalar(Arc<ScalarFn>),
    /// One list per argument in, a list out
    ListAware(Arc<ListFn>),
}

/// A declared function argument, used to build ports
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Argument (and port) name
    pub name: String,
    /// Port type
    pub port_type: PortType,
    /// Port range
    pub range: Range,
}

/// A named native function with its signature
#[derive(Clone)]
pub struct Function {
    name: String,
    arguments: Vec<Argument>,
    output_type: PortType,
    output_range: Range,
    callable: Callable,
}

impl Function {
    /// Create a function called once per broadcast index
    pub fn scalar<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Option<Value>, FunctionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            output_type: PortType::Float,
            output_range: Range::Value,
            callable: Callable::Scalar(Arc::new(f)),
        }
    }

    /// Create a function called once with whole lists
    pub fn list_aware<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Vec<Value>]) -> Result<Vec<Value>, FunctionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            output_type: PortType::Float,
            output_range: Range::List,
            callable: Callable::ListAware(Arc::new(f)),
        }
    }

    /// Declare a value-range argument
    pub fn with_argument(self, name: impl Into<String>, port_type: PortType) -> Self {
        self.with_ranged_argument(name, port_type, Range::Value)
    }

    /// Declare a list-range argument
    pub fn with_list_argument(self, name: impl Into<String>, port_type: PortType) -> Self {
        self.with_ranged_argument(name, port_type, Range::List)
    }

    fn with_ranged_argument(
        mut self,
        name: impl Into<String>,
        port_type: PortType,
        range: Range,
    ) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            port_type,
            range,
        });
        self
    }

    /// Set the output type
    pub fn with_output_type(mut self, output_type: PortType) -> Self {
        self.output_type = output_type;
        self
    }

    /// Set the output range suggested for nodes using this function
    pub fn with_output_range(mut self, output_range: Range) -> Self {
        self.output_range = output_range;
        self
    }

    /// Function name within its library
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared arguments
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Declared output type
    pub fn output_type(&self) -> &PortType {
        &self.output_type
    }

    /// Suggested output range
    pub fn output_range(&self) -> Range {
        self.output_range
    }

    /// Calling convention
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Whether the function consumes whole lists
    pub fn is_list_aware(&self) -> bool {
        matches!(self.callable, Callable::ListAware(_))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("output_type", &self.output_type)
            .field("list_aware", &self.is_list_aware())
            .finish()
    }
}

/// A namespace of functions
#[derive(Debug, Clone)]
pub struct FunctionLibrary {
    namespace: String,
    functions: IndexMap<String, Function>,
}

impl FunctionLibrary {
    /// Create an empty library
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            functions: IndexMap::new(),
        }
    }

    /// Add a function, replacing one with the same name
    pub fn with_function(mut self, function: Function) -> Self {
        self.functions.insert(function.name.clone(), function);
        self
    }

    /// Library namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Look up a function by its short name
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Function names in registration order
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Full identifiers of every function
    pub fn identifiers(&self) -> impl Iterator<Item = String> + '_ {
        self.functions
            .keys()
            .map(move |name| format!("{}/{name}", self.namespace))
    }
}

/// An immutable set of function libraries keyed by namespace
#[derive(Debug, Clone)]
pub struct FunctionRepository {
    libraries: IndexMap<String, Arc<FunctionLibrary>>,
}

impl FunctionRepository {
    /// Create a repository from libraries. The core library is always added.
    pub fn of(libraries: impl IntoIterator<Item = FunctionLibrary>) -> Self {
        Self::from_shared(libraries.into_iter().map(Arc::new))
    }

    fn from_shared(libraries: impl IntoIterator<Item = Arc<FunctionLibrary>>) -> Self {
        let mut map = IndexMap::new();
        map.insert(functions::CORE.to_string(), Arc::new(functions::base::library()));
        for library in libraries {
            map.insert(library.namespace.clone(), library);
        }
        Self { libraries: map }
    }

    /// Union of several repositories. Later libraries win on namespace clashes.
    pub fn combine<'a>(repositories: impl IntoIterator<Item = &'a FunctionRepository>) -> Self {
        Self::from_shared(
            repositories
                .into_iter()
                .flat_map(|repo| repo.libraries.values().cloned())
                .filter(|library| library.namespace != functions::CORE),
        )
    }

    /// Return a repository with the library added or replaced
    pub fn with_library_added(&self, library: FunctionLibrary) -> Self {
        let mut libraries = self.libraries.clone();
        libraries.insert(library.namespace.clone(), Arc::new(library));
        Self { libraries }
    }

    /// Return a repository without the given namespace
    pub fn with_library_removed(&self, namespace: &str) -> Result<Self, LookupError> {
        if namespace == functions::CORE {
            return Err(LookupError::CoreLibrary);
        }
        let mut libraries = self.libraries.clone();
        libraries
            .shift_remove(namespace)
            .ok_or_else(|| LookupError::UnknownNamespace(namespace.to_string()))?;
        Ok(Self { libraries })
    }

    /// Keep only the given namespaces (core is always kept)
    pub fn subset<'a>(
        &self,
        namespaces: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, LookupError> {
        let libraries = namespaces
            .into_iter()
            .map(|ns| {
                self.libraries
                    .get(ns)
                    .cloned()
                    .ok_or_else(|| LookupError::UnknownNamespace(ns.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_shared(libraries))
    }

    /// Check if a namespace is present
    pub fn has_library(&self, namespace: &str) -> bool {
        self.libraries.contains_key(namespace)
    }

    /// Get a library by namespace
    pub fn library(&self, namespace: &str) -> Option<&FunctionLibrary> {
        self.libraries.get(namespace).map(AsRef::as_ref)
    }

    /// All libraries, core first
    pub fn libraries(&self) -> impl Iterator<Item = &FunctionLibrary> {
        self.libraries.values().map(AsRef::as_ref)
    }

    /// All namespaces, core first
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    /// Check if an identifier resolves
    pub fn has(&self, identifier: &str) -> bool {
        self.resolve(identifier).is_ok()
    }

    /// Resolve a `namespace/name` identifier
    pub fn resolve(&self, identifier: &str) -> Result<&Function, LookupError> {
        let (namespace, name) = identifier
            .split_once('/')
            .filter(|(ns, name)| !ns.is_empty() && !name.is_empty() && !name.contains('/'))
            .ok_or_else(|| LookupError::MalformedIdentifier(identifier.to_string()))?;
        let library = self
            .libraries
            .get(namespace)
            .ok_or_else(|| LookupError::UnknownNamespace(namespace.to_string()))?;
        library
            .function(name)
            .ok_or_else(|| LookupError::UnknownFunction(identifier.to_string()))
    }
}

impl Default for FunctionRepository {
    fn default() -> Self {
        Self::of([])
    }
}

/// Repositories are equal when they hold the same namespaces
impl PartialEq for FunctionRepository {
    fn eq(&self, other: &Self) -> bool {
        self.libraries.len() == other.libraries.len()
            && self.namespaces().all(|ns| other.has_library(ns))
    }
}

/// Error when resolving a function identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Identifier is not `namespace/name`
    #[error("Function identifier `{0}` should be in the form namespace/function")]
    MalformedIdentifier(String),

    /// Namespace not in the repository
    #[error("Unknown function namespace `{0}`")]
    UnknownNamespace(String),

    /// Function not in its library
    #[error("Unknown function `{0}`")]
    UnknownFunction(String),

    /// The core library cannot be removed
    #[error("The core library cannot be removed")]
    CoreLibrary,
}

/// Error raised by a native function
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FunctionError {
    /// Too few arguments
    #[error("Expected at least {expected} arguments, got {found}")]
    ArgumentCount {
        /// Required arguments
        expected: usize,
        /// Supplied arguments
        found: usize,
    },

    /// Argument of the wrong type
    #[error("Argument {index} should be {expected}, got {found:?}")]
    ArgumentType {
        /// Argument position
        index: usize,
        /// Expected kind
        expected: &'static str,
        /// Supplied value
        found: Value,
    },

    /// Division or modulo by zero
    #[error("Divider cannot be zero")]
    DivisionByZero,

    /// Result would hold more than [`MAX_LIST_LENGTH`] values
    #[error("Result list would exceed {} values", MAX_LIST_LENGTH)]
    ListTooLong,

    /// Any other failure
    #[error("{0}")]
    Failed(String),
}

/// Upper bound on the length of a list produced by a single function call
pub const MAX_LIST_LENGTH: usize = 1 << 24;

/// Check that a list of `length` values may be produced
pub fn check_length(length: usize) -> Result<usize, FunctionError> {
    if length > MAX_LIST_LENGTH {
        Err(FunctionError::ListTooLong)
    } else {
        Ok(length)
    }
}

/// Fetch argument `index`
pub fn arg(args: &[Value], index: usize) -> Result<&Value, FunctionError> {
    args.get(index).ok_or(FunctionError::ArgumentCount {
        expected: index + 1,
        found: args.len(),
    })
}

/// Fetch argument `index` as a float (integers are widened)
pub fn float_arg(args: &[Value], index: usize) -> Result<f64, FunctionError> {
    let value = arg(args, index)?;
    value.as_float().ok_or_else(|| FunctionError::ArgumentType {
        index,
        expected: "number",
        found: value.clone(),
    })
}

/// Fetch argument `index` as an integer (floats are rounded)
pub fn int_arg(args: &[Value], index: usize) -> Result<i64, FunctionError> {
    let value = arg(args, index)?;
    value.as_int().ok_or_else(|| FunctionError::ArgumentType {
        index,
        expected: "integer",
        found: value.clone(),
    })
}

/// Fetch argument `index` as a boolean
pub fn bool_arg(args: &[Value], index: usize) -> Result<bool, FunctionError> {
    let value = arg(args, index)?;
    value.as_bool().ok_or_else(|| FunctionError::ArgumentType {
        index,
        expected: "boolean",
        found: value.clone(),
    })
}

/// Fetch argument `index` as text. Non-string values use their textual form.
pub fn string_arg(args: &[Value], index: usize) -> Result<String, FunctionError> {
    Ok(arg(args, index)?.to_string())
}

/// Fetch list argument `index`
pub fn list_arg(lists: &[Vec<Value>], index: usize) -> Result<&[Value], FunctionError> {
    lists
        .get(index)
        .map(Vec::as_slice)
        .ok_or(FunctionError::ArgumentCount {
            expected: index + 1,
            found: lists.len(),
        })
}
