// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values that flow between nodes.
//!
//! Every port holds a [`Value`] and every function produces them. Values
//! crossing a connection are converted to the destination port's type with
//! [`Value::convert_to`].

use crate::port::PortType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// The origin
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2},{:.2}", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| ParseValueError::new(PortType::Point, s))?;
        let x = x.trim().parse().map_err(|_| ParseValueError::new(PortType::Point, s))?;
        let y = y.trim().parse().map_err(|_| ParseValueError::new(PortType::Point, s))?;
        Ok(Self { x, y })
    }
}

/// An RGBA color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f64,
    /// Green
    pub g: f64,
    /// Blue
    pub b: f64,
    /// Alpha
    pub a: f64,
}

impl Color {
    /// Opaque black
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    /// Opaque white
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    /// Create a new color, clamping every component to `0.0..=1.0`
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Create an opaque grey with the given level
    pub fn grey(level: f64) -> Self {
        Self::new(level, level, level, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let byte = |c: f64| (c * 255.0).round() as u8;
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a)
        )
    }
}

impl FromStr for Color {
    type Err = ParseValueError;

    /// Parse `#rrggbb` or `#rrggbbaa`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseValueError::new(PortType::Color, s);
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(err());
        }
        let component = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| err())
        };
        let alpha = if hex.len() == 8 { component(6)? } else { 1.0 };
        Ok(Self::new(component(0)?, component(2)?, component(4)?, alpha))
    }
}

/// A value held by a port or produced by a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// String value
    String(String),
    /// 2D point
    Point(Point),
    /// RGBA color
    Color(Color),
}

impl Value {
    /// Get the port type matching this value
    pub fn port_type(&self) -> PortType {
        match self {
            Self::Int(_) => PortType::Int,
            Self::Float(_) => PortType::Float,
            Self::Boolean(_) => PortType::Boolean,
            Self::String(_) => PortType::String,
            Self::Point(_) => PortType::Point,
            Self::Color(_) => PortType::Color,
        }
    }

    /// Numeric view of the value (ints and floats only)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view of the value (floats are rounded)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => Some(v.round() as i64),
            _ => None,
        }
    }

    /// Boolean view of the value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// String view of the value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Point view of the value
    pub fn as_point(&self) -> Option<Point> {
        match self {
            Self::Point(p) => Some(*p),
            _ => None,
        }
    }

    /// Color view of the value
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Parse a value of the given type from its textual form
    pub fn parse(port_type: &PortType, text: &str) -> Result<Value, ParseValueError> {
        let err = || ParseValueError::new(port_type.clone(), text);
        match port_type {
            PortType::Int => text.trim().parse().map(Value::Int).map_err(|_| err()),
            PortType::Float => text.trim().parse().map(Value::Float).map_err(|_| err()),
            PortType::Boolean => Ok(Value::Boolean(text.trim().eq_ignore_ascii_case("true"))),
            PortType::String => Ok(Value::String(text.to_string())),
            PortType::Point => text.parse().map(Value::Point),
            PortType::Color => text.parse().map(Value::Color),
            PortType::Custom(_) => Err(err()),
        }
    }

    /// Convert the value so it can be fed into a port of the given type.
    ///
    /// Pairs without a conversion, and strings that do not parse, are
    /// returned unchanged.
    pub fn convert_to(self, target: &PortType) -> Value {
        match (self, target) {
            (v @ Value::Int(_), PortType::Int)
            | (v @ Value::Float(_), PortType::Float)
            | (v @ Value::Boolean(_), PortType::Boolean)
            | (v @ Value::String(_), PortType::String)
            | (v @ Value::Point(_), PortType::Point)
            | (v @ Value::Color(_), PortType::Color) => v,
            (v, PortType::String) => Value::String(v.to_string()),
            (Value::Int(i), PortType::Float) => Value::Float(i as f64),
            (Value::Float(f), PortType::Int) => Value::Int(f.round() as i64),
            (Value::Int(i), PortType::Point) => Value::Point(Point::new(i as f64, i as f64)),
            (Value::Float(f), PortType::Point) => Value::Point(Point::new(f, f)),
            (Value::Boolean(b), PortType::Int) => Value::Int(i64::from(b)),
            (Value::Boolean(b), PortType::Float) => Value::Float(if b { 1.0 } else { 0.0 }),
            (Value::Int(i), PortType::Boolean) => Value::Boolean(i != 0),
            (Value::Float(f), PortType::Boolean) => Value::Boolean(f != 0.0),
            (Value::Boolean(b), PortType::Color) => {
                Value::Color(if b { Color::WHITE } else { Color::BLACK })
            }
            (Value::Int(i), PortType::Color) => Value::Color(Color::grey(i as f64 / 255.0)),
            (Value::Float(f), PortType::Color) => Value::Color(Color::grey(f)),
            (Value::String(s), target @ (PortType::Int
            | PortType::Float
            | PortType::Boolean
            | PortType::Point
            | PortType::Color)) => Value::parse(target, &s).unwrap_or(Value::String(s)),
            (v, _) => v,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            // Floats always show a fractional part: 42.0, not 42
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Point(p) => write!(f, "{p}"),
            Self::Color(c) => write!(f, "{c}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Point> for Value {
    fn from(v: Point) -> Self {
        Self::Point(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

/// Error when text cannot be parsed as a value of the requested type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Cannot parse `{text}` as {port_type}")]
pub struct ParseValueError {
    /// Requested type
    pub port_type: PortType,
    /// Offending text
    pub text: String,
}

impl ParseValueError {
    fn new(port_type: PortType, text: &str) -> Self {
        Self {
            port_type,
            text: text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(value: impl Into<Value>, target: PortType) -> Value {
        value.into().convert_to(&target)
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(convert(42i64, PortType::Float), Value::Float(42.0));
        assert_eq!(convert(41.6, PortType::Int), Value::Int(42));
        assert_eq!(convert(42i64, PortType::Point), Value::Point(Point::new(42.0, 42.0)));
        assert_eq!(convert(2.5, PortType::Point), Value::Point(Point::new(2.5, 2.5)));
        assert_eq!(convert(true, PortType::Int), Value::Int(1));
        assert_eq!(convert(0.0, PortType::Boolean), Value::Boolean(false));
    }

    #[test]
    fn test_string_conversions() {
        assert_eq!(convert(42i64, PortType::String), Value::from("42"));
        assert_eq!(convert(42.0, PortType::String), Value::from("42.0"));
        assert_eq!(convert(false, PortType::String), Value::from("false"));
        assert_eq!(convert(Point::new(4.0, 2.0), PortType::String), Value::from("4.00,2.00"));
        assert_eq!(convert(Color::new(0.0, 1.0, 0.0, 1.0), PortType::String), Value::from("#00ff00ff"));
        assert_eq!(convert("42", PortType::Int), Value::Int(42));
        assert_eq!(convert("4,2", PortType::Point), Value::Point(Point::new(4.0, 2.0)));
        assert_eq!(convert("not-a-boolean", PortType::Boolean), Value::Boolean(false));
        // Unparsable strings pass through
        assert_eq!(convert("abc", PortType::Float), Value::from("abc"));
    }

    #[test]
    fn test_color_conversions() {
        assert_eq!(convert(true, PortType::Color), Value::Color(Color::WHITE));
        assert_eq!(convert(255i64, PortType::Color), Value::Color(Color::WHITE));
        assert_eq!(convert(0.0, PortType::Color), Value::Color(Color::BLACK));
        assert_eq!(
            convert("#ff0000ff", PortType::Color),
            Value::Color(Color::new(1.0, 0.0, 0.0, 1.0))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Value::parse(&PortType::Int, "4.5").is_err());
        assert!("#12".parse::<Color>().is_err());
        assert!("1;2".parse::<Point>().is_err());
        assert!(Value::parse(&PortType::Custom("geometry".into()), "x").is_err());
    }
}
