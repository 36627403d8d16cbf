// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs.

use crate::value::{Color, Point, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data type that can flow through ports
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    String,
    /// Boolean value
    Boolean,
    /// 2D point
    Point,
    /// RGBA color
    Color,
    /// Custom type, identified by its tag. Custom ports hold no value.
    Custom(String),
}

impl PortType {
    /// Type name as used in documents and on the command line
    pub fn as_str(&self) -> &str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Point => "point",
            Self::Color => "color",
            Self::Custom(tag) => tag,
        }
    }

    /// Whether this is one of the built-in value types
    pub fn is_standard(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Whether values of this type can be bounded
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Default value for a freshly created port of this type
    pub fn default_value(&self) -> Option<Value> {
        match self {
            Self::Int => Some(Value::Int(0)),
            Self::Float => Some(Value::Float(0.0)),
            Self::String => Some(Value::String(String::new())),
            Self::Boolean => Some(Value::Boolean(false)),
            Self::Point => Some(Value::Point(Point::ZERO)),
            Self::Color => Some(Value::Color(Color::BLACK)),
            Self::Custom(_) => None,
        }
    }

    /// Check if an output of this type can feed a port of another type
    pub fn can_connect_to(&self, target: &PortType) -> bool {
        // Same types can always connect
        if self == target {
            return true;
        }

        match (self, target) {
            // Everything has a textual form
            (_, Self::String) => true,
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => true,
            (Self::Int | Self::Float, Self::Point) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortType {
    type Err = std::convert::Infallible;

    /// Unknown names become custom types
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "int" => Self::Int,
            "float" => Self::Float,
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "point" => Self::Point,
            "color" => Self::Color,
            other => Self::Custom(other.to_string()),
        })
    }
}

/// Check if an output of `source` type can feed a port of `target` type
pub fn is_compatible(source: &PortType, target: &PortType) -> bool {
    source.can_connect_to(target)
}

/// Whether a port consumes one value or a whole list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Range {
    /// Only the first value is used
    #[default]
    Value,
    /// The whole list takes part in broadcasting
    List,
}

/// How many connections a port accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cardinality {
    /// A new connection replaces the existing one
    #[default]
    Single,
    /// Connections accumulate and their values are concatenated
    Multiple,
}

/// An entry in a port's choice menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Stored value
    pub key: String,
    /// Display label
    pub label: String,
}

impl MenuItem {
    /// Create a new menu item
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// The child port a published port forwards to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildReference {
    /// Child node name
    pub child: String,
    /// Port name on the child
    pub port: String,
}

impl fmt::Display for ChildReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.child, self.port)
    }
}

/// An input port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port name, unique within the node
    pub name: String,
    /// Data type
    pub port_type: PortType,
    /// Value or list range
    #[serde(default)]
    pub range: Range,
    /// Connection cardinality
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Current value. `None` only for custom types.
    pub value: Option<Value>,
    /// Lower bound for numeric ports
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound for numeric ports
    #[serde(default)]
    pub max: Option<f64>,
    /// Display label
    #[serde(default)]
    pub label: Option<String>,
    /// Help text
    #[serde(default)]
    pub description: Option<String>,
    /// Choices for string ports
    #[serde(default)]
    pub menu: Vec<MenuItem>,
    /// Set on ports a network publishes from one of its children
    #[serde(default)]
    pub child_reference: Option<ChildReference>,
}

impl Port {
    /// Create a new port holding the default value for its type
    pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
        let value = port_type.default_value();
        Self {
            name: name.into(),
            port_type,
            range: Range::Value,
            cardinality: Cardinality::Single,
            value,
            min: None,
            max: None,
            label: None,
            description: None,
            menu: Vec::new(),
            child_reference: None,
        }
    }

    /// Create an integer port
    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self::with_raw_value(name, PortType::Int, Value::Int(value))
    }

    /// Create a float port
    pub fn float(name: impl Into<String>, value: f64) -> Self {
        Self::with_raw_value(name, PortType::Float, Value::Float(value))
    }

    /// Create a boolean port
    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::with_raw_value(name, PortType::Boolean, Value::Boolean(value))
    }

    /// Create a string port
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_raw_value(name, PortType::String, Value::String(value.into()))
    }

    /// Create a point port
    pub fn point(name: impl Into<String>, value: Point) -> Self {
        Self::with_raw_value(name, PortType::Point, Value::Point(value))
    }

    /// Create a color port
    pub fn color(name: impl Into<String>, value: Color) -> Self {
        Self::with_raw_value(name, PortType::Color, Value::Color(value))
    }

    /// Create a port of a custom type
    pub fn custom(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(name, PortType::Custom(tag.into()))
    }

    /// Create the network-level port that forwards to `child_port` of `child`
    pub fn published(
        public_name: impl Into<String>,
        child: impl Into<String>,
        child_port: &Port,
    ) -> Self {
        Self {
            name: public_name.into(),
            child_reference: Some(ChildReference {
                child: child.into(),
                port: child_port.name.clone(),
            }),
            ..child_port.clone()
        }
    }

    fn with_raw_value(name: impl Into<String>, port_type: PortType, value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::new(name, port_type)
        }
    }

    /// Name shown to the user
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Whether the whole upstream list is used
    pub fn has_list_range(&self) -> bool {
        self.range == Range::List
    }

    /// Whether this port forwards to a child of its network
    pub fn is_published(&self) -> bool {
        self.child_reference.is_some()
    }

    /// Return a copy with a new name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the range
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    /// Set the cardinality
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the value.
    ///
    /// The value must match the port type; integers are accepted by float
    /// ports. Bounded ports clamp the value.
    pub fn with_value(mut self, value: impl Into<Value>) -> Result<Self, PortError> {
        let value = match (&self.port_type, value.into()) {
            (PortType::Float, Value::Int(i)) => Value::Float(i as f64),
            (port_type, value) if port_type.is_standard() && value.port_type() == *port_type => {
                value
            }
            (_, value) => {
                return Err(PortError::TypeMismatch {
                    port: self.name.clone(),
                    expected: self.port_type.clone(),
                    found: value.port_type(),
                });
            }
        };
        self.value = Some(self.clamp(value));
        Ok(self)
    }

    /// Set the lower bound, clamping the current value
    pub fn with_min(mut self, min: Option<f64>) -> Result<Self, PortError> {
        self.check_bounds(min, self.max)?;
        self.min = min;
        self.value = self.value.take().map(|v| self.clamp(v));
        Ok(self)
    }

    /// Set the upper bound, clamping the current value
    pub fn with_max(mut self, max: Option<f64>) -> Result<Self, PortError> {
        self.check_bounds(self.min, max)?;
        self.max = max;
        self.value = self.value.take().map(|v| self.clamp(v));
        Ok(self)
    }

    fn check_bounds(&self, min: Option<f64>, max: Option<f64>) -> Result<(), PortError> {
        if (min.is_some() || max.is_some()) && !self.port_type.is_numeric() {
            return Err(PortError::NotNumeric(self.name.clone()));
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(PortError::InvalidBounds { min, max });
            }
        }
        Ok(())
    }

    /// Clamp a numeric value to the port bounds. Other values pass through.
    pub fn clamp(&self, value: Value) -> Value {
        let clamp = |v: f64| {
            let v = self.min.map_or(v, |min| v.max(min));
            self.max.map_or(v, |max| v.min(max))
        };
        match value {
            Value::Float(v) => Value::Float(clamp(v)),
            Value::Int(v) if self.min.is_some() || self.max.is_some() => {
                Value::Int(clamp(v as f64).round() as i64)
            }
            other => other,
        }
    }

    /// Replace the menu
    pub fn with_menu_items(mut self, items: Vec<MenuItem>) -> Result<Self, PortError> {
        if self.port_type != PortType::String {
            return Err(PortError::MenuOnNonString(self.name.clone()));
        }
        self.menu = items;
        Ok(self)
    }

    /// Append a menu item
    pub fn with_menu_item_added(
        self,
        key: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<Self, PortError> {
        let mut items = self.menu.clone();
        items.push(MenuItem::new(key, label));
        self.with_menu_items(items)
    }

    /// Remove every menu item with the given key
    pub fn with_menu_item_removed(self, key: &str) -> Result<Self, PortError> {
        let items = self.menu.iter().filter(|item| item.key != key).cloned().collect();
        self.with_menu_items(items)
    }

    /// Move the menu item at `index` one place up
    pub fn with_menu_item_moved_up(self, index: usize) -> Result<Self, PortError> {
        if index == 0 || index >= self.menu.len() {
            return Err(PortError::MenuIndex(index));
        }
        let mut items = self.menu.clone();
        items.swap(index, index - 1);
        self.with_menu_items(items)
    }

    /// Move the menu item at `index` one place down
    pub fn with_menu_item_moved_down(self, index: usize) -> Result<Self, PortError> {
        if index + 1 >= self.menu.len() {
            return Err(PortError::MenuIndex(index));
        }
        let mut items = self.menu.clone();
        items.swap(index, index + 1);
        self.with_menu_items(items)
    }

    /// Replace the menu item at `index`
    pub fn with_menu_item_changed(
        self,
        index: usize,
        key: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<Self, PortError> {
        if index >= self.menu.len() {
            return Err(PortError::MenuIndex(index));
        }
        let mut items = self.menu.clone();
        items[index] = MenuItem::new(key, label);
        self.with_menu_items(items)
    }

    /// Check the value/type/bounds invariant
    pub fn validate(&self) -> Result<(), PortError> {
        self.check_bounds(self.min, self.max)?;
        match (&self.value, self.port_type.is_standard()) {
            (None, false) => Ok(()),
            (Some(value), true) if value.port_type() == self.port_type => {
                let within = match (self.clamp(value.clone()), value) {
                    (Value::Float(clamped), Value::Float(v)) => clamped.total_cmp(v).is_eq(),
                    (clamped, v) => clamped == *v,
                };
                if within {
                    Ok(())
                } else {
                    Err(PortError::OutOfBounds(self.name.clone()))
                }
            }
            (value, _) => Err(PortError::TypeMismatch {
                port: self.name.clone(),
                expected: self.port_type.clone(),
                found: value
                    .as_ref()
                    .map_or_else(|| PortType::Custom("none".into()), Value::port_type),
            }),
        }
    }
}

/// Error when editing a port
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// Value does not match the port type
    #[error("Port `{port}` expects {expected}, got {found}")]
    TypeMismatch {
        /// Port name
        port: String,
        /// Port type
        expected: PortType,
        /// Type of the rejected value
        found: PortType,
    },

    /// Bounds on a non-numeric port
    #[error("Port `{0}` is not numeric and cannot be bounded")]
    NotNumeric(String),

    /// Minimum above maximum
    #[error("Invalid bounds: min {min} > max {max}")]
    InvalidBounds {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Stored value lies outside the bounds
    #[error("Value of port `{0}` is out of bounds")]
    OutOfBounds(String),

    /// Menus are only available on string ports
    #[error("Port `{0}` is not a string port and cannot have a menu")]
    MenuOnNonString(String),

    /// Menu index out of range
    #[error("Menu index {0} out of range")]
    MenuIndex(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility() {
        assert!(is_compatible(&PortType::Int, &PortType::Int));
        assert!(is_compatible(&PortType::Int, &PortType::Float));
        assert!(is_compatible(&PortType::Float, &PortType::Int));
        assert!(is_compatible(&PortType::Color, &PortType::String));
        assert!(is_compatible(&PortType::Float, &PortType::Point));
        assert!(!is_compatible(&PortType::Point, &PortType::Float));
        assert!(!is_compatible(&PortType::String, &PortType::Int));
        assert!(is_compatible(
            &PortType::Custom("geometry".into()),
            &PortType::Custom("geometry".into())
        ));
        assert!(!is_compatible(&PortType::Custom("geometry".into()), &PortType::Float));
    }

    #[test]
    fn test_with_value_checks_type() {
        let port = Port::float("v", 1.0);
        assert_eq!(port.clone().with_value(3i64).unwrap().value, Some(Value::Float(3.0)));
        assert!(matches!(
            port.with_value("text"),
            Err(PortError::TypeMismatch { .. })
        ));
        assert!(Port::custom("shape", "geometry").with_value(1i64).is_err());
    }

    #[test]
    fn test_clamping() {
        let port = Port::float("alpha", 0.5)
            .with_min(Some(0.0))
            .unwrap()
            .with_max(Some(1.0))
            .unwrap();
        assert_eq!(port.clone().with_value(2.0).unwrap().value, Some(Value::Float(1.0)));
        assert_eq!(port.clone().with_value(-2.0).unwrap().value, Some(Value::Float(0.0)));

        let count = Port::int("count", 50).with_max(Some(10.0)).unwrap();
        assert_eq!(count.value, Some(Value::Int(10)));
        assert!(count.validate().is_ok());

        assert_eq!(
            Port::string("s", "x").with_min(Some(0.0)),
            Err(PortError::NotNumeric("s".into()))
        );
        assert!(Port::int("i", 0).with_min(Some(5.0)).unwrap().with_max(Some(1.0)).is_err());
    }

    #[test]
    fn test_nan_values_validate() {
        let port = Port::float("x", f64::NAN);
        assert!(port.validate().is_ok());

        let bounded = Port::float("alpha", 0.5).with_min(Some(0.0)).unwrap();
        let port = bounded.with_value(f64::NAN).unwrap();
        assert_eq!(port.value, Some(Value::Float(0.0)));
        assert!(port.validate().is_ok());
    }

    #[test]
    fn test_menu_items() {
        let port = Port::string("align", "left")
            .with_menu_item_added("left", "Left")
            .and_then(|p| p.with_menu_item_added("center", "Center"))
            .and_then(|p| p.with_menu_item_added("right", "Right"))
            .unwrap();

        let moved = port.clone().with_menu_item_moved_up(2).unwrap();
        let keys: Vec<_> = moved.menu.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, ["left", "right", "center"]);

        assert!(port.clone().with_menu_item_moved_up(0).is_err());
        assert!(port.clone().with_menu_item_moved_down(2).is_err());

        let changed = port.clone().with_menu_item_changed(0, "start", "Start").unwrap();
        assert_eq!(changed.menu[0], MenuItem::new("start", "Start"));

        let removed = port.with_menu_item_removed("center").unwrap();
        assert_eq!(removed.menu.len(), 2);

        assert!(Port::int("n", 0).with_menu_item_added("a", "A").is_err());
    }

    #[test]
    fn test_published_port_copies_child_port() {
        let child_port = Port::float("v1", 3.0).with_range(Range::List);
        let published = Port::published("amount", "add1", &child_port);
        assert_eq!(published.name, "amount");
        assert_eq!(published.range, Range::List);
        assert_eq!(published.value, Some(Value::Float(3.0)));
        assert_eq!(published.child_reference.as_ref().map(ToString::to_string).as_deref(), Some("add1.v1"));
    }

    #[test]
    fn test_port_type_names() {
        assert_eq!("color".parse::<PortType>(), Ok(PortType::Color));
        assert_eq!("geometry".parse::<PortType>(), Ok(PortType::Custom("geometry".into())));
        assert_eq!(PortType::Boolean.to_string(), "boolean");
    }
}
