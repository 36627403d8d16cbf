// SPDX-License-Identifier: MIT OR Apache-2.0
//! String functions.

use crate::function::{int_arg, list_arg, string_arg, Function, FunctionLibrary};
use crate::port::PortType;
use crate::value::Value;

/// Create the string library
pub fn library() -> FunctionLibrary {
    FunctionLibrary::new("string")
        .with_function(text("string", str::to_string))
        .with_function(text("upper", str::to_uppercase))
        .with_function(text("lower", str::to_lowercase))
        .with_function(text("trim", |s| s.trim().to_string()))
        .with_function(
            Function::scalar("length", |args| {
                Ok(Some(Value::Int(string_arg(args, 0)?.chars().count() as i64)))
            })
            .with_argument("string", PortType::String)
            .with_output_type(PortType::Int),
        )
        .with_function(
            Function::scalar("concatenate", |args| {
                let joined: String = (0..args.len())
                    .map(|i| string_arg(args, i))
                    .collect::<Result<_, _>>()?;
                Ok(Some(Value::String(joined)))
            })
            .with_argument("string1", PortType::String)
            .with_argument("string2", PortType::String)
            .with_output_type(PortType::String),
        )
        .with_function(
            Function::scalar("replace", |args| {
                let (s, old, new) = (string_arg(args, 0)?, string_arg(args, 1)?, string_arg(args, 2)?);
                if old.is_empty() {
                    return Ok(Some(Value::String(s)));
                }
                Ok(Some(Value::String(s.replace(&old, &new))))
            })
            .with_argument("string", PortType::String)
            .with_argument("old", PortType::String)
            .with_argument("new", PortType::String)
            .with_output_type(PortType::String),
        )
        .with_function(
            Function::scalar("substring", |args| {
                let s = string_arg(args, 0)?;
                let start = int_arg(args, 1)?.max(0) as usize;
                let end = int_arg(args, 2)?.max(0) as usize;
                let sub: String = s.chars().skip(start).take(end.saturating_sub(start)).collect();
                Ok(Some(Value::String(sub)))
            })
            .with_argument("string", PortType::String)
            .with_argument("start", PortType::Int)
            .with_argument("end", PortType::Int)
            .with_output_type(PortType::String),
        )
        .with_function(
            Function::list_aware("make_strings", |lists| {
                let Some(text) = list_arg(lists, 0)?.first() else {
                    return Ok(Vec::new());
                };
                let text = text.to_string();
                let separator = list_arg(lists, 1)?
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                if text.is_empty() {
                    return Ok(Vec::new());
                }
                let parts: Vec<Value> = if separator.is_empty() {
                    text.chars().map(|c| Value::String(c.to_string())).collect()
                } else {
                    text.split(separator.as_str()).map(Value::from).collect()
                };
                Ok(parts)
            })
            .with_argument("string", PortType::String)
            .with_argument("separator", PortType::String)
            .with_output_type(PortType::String),
        )
}

fn text(name: &str, f: fn(&str) -> String) -> Function {
    Function::scalar(name, move |args| Ok(Some(Value::String(f(&string_arg(args, 0)?)))))
        .with_argument("string", PortType::String)
        .with_output_type(PortType::String)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{Callable, FunctionRepository};

    fn scalar(name: &str, args: &[Value]) -> Option<Value> {
        let repo = FunctionRepository::of([library()]);
        match repo.resolve(&format!("string/{name}")).map(|f| f.callable().clone()) {
            Ok(Callable::Scalar(f)) => f(args).unwrap(),
            _ => panic!("string/{name} is not scalar"),
        }
    }

    #[test]
    fn test_scalar_string_functions() {
        assert_eq!(scalar("upper", &[Value::from("abc")]), Some(Value::from("ABC")));
        assert_eq!(scalar("length", &[Value::from("héllo")]), Some(Value::Int(5)));
        assert_eq!(
            scalar("concatenate", &[Value::from("a"), Value::Float(1.0)]),
            Some(Value::from("a1.0"))
        );
        assert_eq!(
            scalar("replace", &[Value::from("a-b-c"), Value::from("-"), Value::from("+")]),
            Some(Value::from("a+b+c"))
        );
        assert_eq!(
            scalar("substring", &[Value::from("nodeflow"), Value::Int(4), Value::Int(8)]),
            Some(Value::from("flow"))
        );
    }

    #[test]
    fn test_make_strings() {
        let repo = FunctionRepository::of([library()]);
        let Ok(Callable::ListAware(f)) = repo.resolve("string/make_strings").map(|f| f.callable().clone()) else {
            panic!("make_strings is not list-aware");
        };
        let parts = f(&[vec![Value::from("a;b")], vec![Value::from(";")]]).unwrap();
        assert_eq!(parts, vec![Value::from("a"), Value::from("b")]);
        let chars = f(&[vec![Value::from("xy")], vec![Value::from("")]]).unwrap();
        assert_eq!(chars.len(), 2);
    }
}
