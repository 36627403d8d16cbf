// SPDX-License-Identifier: MIT OR Apache-2.0
//! Basic math functions.

use crate::function::{
    bool_arg, float_arg, int_arg, list_arg, string_arg, Function, FunctionError,
    FunctionLibrary, MAX_LIST_LENGTH,
};
use crate::port::PortType;
use crate::value::{Point, Value};

/// Create the math library
pub fn library() -> FunctionLibrary {
    let mut library = FunctionLibrary::new("math");

    // ========================================================================
    // Constants
    // ========================================================================

    library = library
        .with_function(
            Function::scalar("number", |args| Ok(Some(Value::Float(float_arg(args, 0)?))))
                .with_argument("value", PortType::Float),
        )
        .with_function(
            Function::scalar("integer", |args| Ok(Some(Value::Int(int_arg(args, 0)?))))
                .with_argument("value", PortType::Int)
                .with_output_type(PortType::Int),
        )
        .with_function(
            Function::scalar("make_boolean", |args| Ok(Some(Value::Boolean(bool_arg(args, 0)?))))
                .with_argument("value", PortType::Boolean)
                .with_output_type(PortType::Boolean),
        )
        .with_function(Function::scalar("pi", |_| Ok(Some(Value::Float(std::f64::consts::PI)))))
        .with_function(Function::scalar("e", |_| Ok(Some(Value::Float(std::f64::consts::E)))));

    // ========================================================================
    // Arithmetic
    // ========================================================================

    library = library
        .with_function(unary("negate", |v| -v))
        .with_function(unary("abs", f64::abs))
        .with_function(unary("sqrt", f64::sqrt))
        .with_function(unary("ceil", f64::ceil))
        .with_function(unary("floor", f64::floor))
        .with_function(unary("sin", f64::sin))
        .with_function(unary("cos", f64::cos))
        .with_function(unary("radians", f64::to_radians))
        .with_function(unary("degrees", f64::to_degrees))
        .with_function(binary("add", |a, b| Ok(a + b)))
        .with_function(binary("subtract", |a, b| Ok(a - b)))
        .with_function(binary("multiply", |a, b| Ok(a * b)))
        .with_function(binary("divide", |a, b| {
            if b == 0.0 {
                Err(FunctionError::DivisionByZero)
            } else {
                Ok(a / b)
            }
        }))
        .with_function(binary("modulo", |a, b| {
            if b == 0.0 {
                Err(FunctionError::DivisionByZero)
            } else {
                Ok(a % b)
            }
        }))
        .with_function(binary("pow", |a, b| Ok(a.powf(b))))
        .with_function(binary("min", |a, b| Ok(a.min(b))))
        .with_function(binary("max", |a, b| Ok(a.max(b))))
        .with_function(
            Function::scalar("round", |args| {
                Ok(Some(Value::Int(float_arg(args, 0)?.round() as i64)))
            })
            .with_argument("value", PortType::Float)
            .with_output_type(PortType::Int),
        )
        .with_function(
            Function::scalar("even", |args| Ok(Some(Value::Boolean(int_arg(args, 0)? % 2 == 0))))
                .with_argument("value", PortType::Int)
                .with_output_type(PortType::Boolean),
        )
        .with_function(
            Function::scalar("odd", |args| Ok(Some(Value::Boolean(int_arg(args, 0)? % 2 != 0))))
                .with_argument("value", PortType::Int)
                .with_output_type(PortType::Boolean),
        )
        .with_function(
            Function::scalar("compare", |args| {
                let (a, b) = (float_arg(args, 0)?, float_arg(args, 1)?);
                let result = match string_arg(args, 2)?.as_str() {
                    "<" => a < b,
                    ">" => a > b,
                    "<=" => a <= b,
                    ">=" => a >= b,
                    "==" => a == b,
                    "!=" => a != b,
                    other => {
                        return Err(FunctionError::Failed(format!("Unknown comparator `{other}`")))
                    }
                };
                Ok(Some(Value::Boolean(result)))
            })
            .with_argument("v1", PortType::Float)
            .with_argument("v2", PortType::Float)
            .with_argument("comparator", PortType::String)
            .with_output_type(PortType::Boolean),
        );

    // ========================================================================
    // Geometry
    // ========================================================================

    library = library
        .with_function(
            Function::scalar("make_point", |args| {
                Ok(Some(Value::Point(Point::new(float_arg(args, 0)?, float_arg(args, 1)?))))
            })
            .with_argument("x", PortType::Float)
            .with_argument("y", PortType::Float)
            .with_output_type(PortType::Point),
        )
        .with_function(
            Function::scalar("distance", |args| {
                let (a, b) = (point_arg(args, 0)?, point_arg(args, 1)?);
                Ok(Some(Value::Float((b.x - a.x).hypot(b.y - a.y))))
            })
            .with_argument("point1", PortType::Point)
            .with_argument("point2", PortType::Point),
        )
        .with_function(
            Function::scalar("angle", |args| {
                let (a, b) = (point_arg(args, 0)?, point_arg(args, 1)?);
                Ok(Some(Value::Float((b.y - a.y).atan2(b.x - a.x).to_degrees())))
            })
            .with_argument("point1", PortType::Point)
            .with_argument("point2", PortType::Point),
        );

    // ========================================================================
    // Lists of numbers
    // ========================================================================

    library
        .with_function(
            Function::list_aware("sum", |lists| {
                Ok(vec![Value::Float(numbers(list_arg(lists, 0)?)?.sum())])
            })
            .with_list_argument("values", PortType::Float),
        )
        .with_function(
            Function::list_aware("average", |lists| {
                let values: Vec<f64> = numbers(list_arg(lists, 0)?)?.collect();
                if values.is_empty() {
                    return Ok(vec![Value::Float(0.0)]);
                }
                Ok(vec![Value::Float(values.iter().sum::<f64>() / values.len() as f64)])
            })
            .with_list_argument("values", PortType::Float),
        )
        .with_function(
            Function::list_aware("running_total", |lists| {
                let mut total = 0.0;
                numbers(list_arg(lists, 0)?)?
                    .map(|v| {
                        let current = total;
                        total += v;
                        Ok(Value::Float(current))
                    })
                    .collect()
            })
            .with_list_argument("values", PortType::Float),
        )
        .with_function(
            Function::list_aware("make_numbers", |lists| {
                let Some(text) = list_arg(lists, 0)?.first() else {
                    return Ok(Vec::new());
                };
                let separator = list_arg(lists, 1)?
                    .first()
                    .map_or_else(|| ",".to_string(), ToString::to_string);
                let text = text.to_string();
                split(&text, &separator)
                    .map(|part| {
                        part.trim()
                            .parse()
                            .map(Value::Float)
                            .map_err(|_| FunctionError::Failed(format!("`{part}` is not a number")))
                    })
                    .collect()
            })
            .with_argument("string", PortType::String)
            .with_argument("separator", PortType::String),
        )
        .with_function(
            Function::list_aware("range", |lists| {
                let first = |i: usize| -> Result<f64, FunctionError> {
                    let Some(v) = list_arg(lists, i)?.first() else {
                        return Ok(0.0);
                    };
                    v.as_float().ok_or_else(|| FunctionError::ArgumentType {
                        index: i,
                        expected: "number",
                        found: v.clone(),
                    })
                };
                let (start, end, step) = (first(0)?, first(1)?, first(2)?);
                if !(start.is_finite() && end.is_finite() && step.is_finite()) {
                    return Err(FunctionError::Failed(format!(
                        "Range bounds must be finite, got {start}..{end} by {step}"
                    )));
                }
                if step == 0.0 || (step > 0.0 && start > end) || (step < 0.0 && start < end) {
                    return Ok(Vec::new());
                }
                let count = ((end - start) / step).ceil();
                if !count.is_finite() || count > MAX_LIST_LENGTH as f64 {
                    return Err(FunctionError::ListTooLong);
                }
                let count = count as usize;
                Ok((0..count).map(|i| Value::Float(start + step * i as f64)).collect())
            })
            .with_argument("start", PortType::Float)
            .with_argument("end", PortType::Float)
            .with_argument("step", PortType::Float),
        )
}

fn unary(name: &str, f: fn(f64) -> f64) -> Function {
    Function::scalar(name, move |args| Ok(Some(Value::Float(f(float_arg(args, 0)?)))))
        .with_argument("value", PortType::Float)
}

fn binary(name: &str, f: fn(f64, f64) -> Result<f64, FunctionError>) -> Function {
    Function::scalar(name, move |args| {
        Ok(Some(Value::Float(f(float_arg(args, 0)?, float_arg(args, 1)?)?)))
    })
    .with_argument("v1", PortType::Float)
    .with_argument("v2", PortType::Float)
}

fn point_arg(args: &[Value], index: usize) -> Result<Point, FunctionError> {
    let value = crate::function::arg(args, index)?;
    value.as_point().ok_or_else(|| FunctionError::ArgumentType {
        index,
        expected: "point",
        found: value.clone(),
    })
}

fn numbers(values: &[Value]) -> Result<impl Iterator<Item = f64> + '_, FunctionError> {
    if let Some((index, bad)) = values.iter().enumerate().find(|(_, v)| v.as_float().is_none()) {
        return Err(FunctionError::ArgumentType {
            index,
            expected: "number",
            found: bad.clone(),
        });
    }
    Ok(values.iter().filter_map(Value::as_float))
}

fn split<'a>(text: &'a str, separator: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    if text.trim().is_empty() {
        Box::new(std::iter::empty())
    } else if separator.is_empty() {
        Box::new(text.split_terminator("").skip(1))
    } else {
        Box::new(text.split(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Callable;

    fn call(name: &str, args: &[Value]) -> Result<Option<Value>, FunctionError> {
        let library = library();
        match library.function(name).map(|f| f.callable().clone()) {
            Some(Callable::Scalar(f)) => f(args),
            _ => panic!("{name} is not a scalar function"),
        }
    }

    fn call_list(name: &str, lists: &[Vec<Value>]) -> Result<Vec<Value>, FunctionError> {
        let library = library();
        match library.function(name).map(|f| f.callable().clone()) {
            Some(Callable::ListAware(f)) => f(lists),
            _ => panic!("{name} is not list-aware"),
        }
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(call("add", &[Value::Float(42.0), Value::Float(5.0)]), Ok(Some(Value::Float(47.0))));
        assert_eq!(call("negate", &[Value::Int(3)]), Ok(Some(Value::Float(-3.0))));
        assert_eq!(
            call("divide", &[Value::Float(1.0), Value::Float(0.0)]),
            Err(FunctionError::DivisionByZero)
        );
        assert_eq!(call("round", &[Value::Float(2.6)]), Ok(Some(Value::Int(3))));
        assert_eq!(
            call("compare", &[Value::Float(1.0), Value::Float(2.0), Value::from("<")]),
            Ok(Some(Value::Boolean(true)))
        );
    }

    #[test]
    fn test_list_functions() {
        let values = vec![Value::Float(1.0), Value::Int(2), Value::Float(3.0)];
        assert_eq!(call_list("sum", &[values.clone()]), Ok(vec![Value::Float(6.0)]));
        assert_eq!(call_list("average", &[values.clone()]), Ok(vec![Value::Float(2.0)]));
        assert_eq!(
            call_list("running_total", &[values]),
            Ok(vec![Value::Float(0.0), Value::Float(1.0), Value::Float(3.0)])
        );
        assert_eq!(call_list("average", &[vec![]]), Ok(vec![Value::Float(0.0)]));
        assert!(call_list("sum", &[vec![Value::from("x")]]).is_err());
    }

    #[test]
    fn test_make_numbers() {
        let numbers = call_list("make_numbers", &[vec![Value::from("1;2;3")], vec![Value::from(";")]]);
        assert_eq!(numbers, Ok(vec![Value::Float(1.0), Value::Float(2.0), Value::Float(3.0)]));
        assert_eq!(call_list("make_numbers", &[vec![Value::from("")], vec![Value::from(",")]]), Ok(vec![]));
        assert!(call_list("make_numbers", &[vec![Value::from("1,a")], vec![Value::from(",")]]).is_err());
    }

    #[test]
    fn test_range() {
        let range = |s: f64, e: f64, st: f64| {
            call_list("range", &[vec![Value::Float(s)], vec![Value::Float(e)], vec![Value::Float(st)]])
        };
        assert_eq!(range(0.0, 3.0, 1.0).unwrap().len(), 3);
        assert_eq!(range(0.0, 10.0, 3.0).unwrap().last(), Some(&Value::Float(9.0)));
        assert_eq!(range(0.0, 3.0, 0.0), Ok(vec![]));
        assert_eq!(range(3.0, 0.0, 1.0), Ok(vec![]));
    }

    #[test]
    fn test_range_rejects_unbounded_spans() {
        let range = |s: f64, e: f64, st: f64| {
            call_list("range", &[vec![Value::Float(s)], vec![Value::Float(e)], vec![Value::Float(st)]])
        };
        assert!(matches!(range(0.0, f64::INFINITY, 1.0), Err(FunctionError::Failed(_))));
        assert!(matches!(range(0.0, 1.0, f64::NAN), Err(FunctionError::Failed(_))));
        assert_eq!(range(0.0, 1e300, 1.0), Err(FunctionError::ListTooLong));
        assert_eq!(range(0.0, 1.0, 1e-300), Err(FunctionError::ListTooLong));
    }
}
