// SPDX-License-Identifier: MIT OR Apache-2.0
//! Functions that operate on lists themselves, not on their items.
//!
//! All of them are list-aware; their list arguments use list range.

use crate::function::{check_length, list_arg, Function, FunctionError, FunctionLibrary};
use crate::port::PortType;
use crate::value::Value;
use std::cmp::Ordering;

/// Create the list library
pub fn library() -> FunctionLibrary {
    FunctionLibrary::new("list")
        .with_function(
            Function::list_aware("count", |lists| {
                Ok(vec![Value::Int(list_arg(lists, 0)?.len() as i64)])
            })
            .with_list_argument("list", PortType::Float)
            .with_output_type(PortType::Int),
        )
        .with_function(pick_one("first", |list| list.first()))
        .with_function(pick_one("second", |list| list.get(1)))
        .with_function(pick_one("last", |list| list.last()))
        .with_function(transform("rest", |list| list.iter().skip(1).cloned().collect()))
        .with_function(transform("reverse", |list| list.iter().rev().cloned().collect()))
        .with_function(transform("distinct", |list| {
            let mut seen: Vec<&Value> = Vec::new();
            for value in list {
                if !seen.contains(&value) {
                    seen.push(value);
                }
            }
            seen.into_iter().cloned().collect()
        }))
        .with_function(transform("sort", |list| {
            let mut sorted = list.to_vec();
            sorted.sort_by(compare_values);
            sorted
        }))
        .with_function(
            Function::list_aware("combine", |lists| {
                Ok(lists.iter().flatten().cloned().collect())
            })
            .with_list_argument("list1", PortType::Float)
            .with_list_argument("list2", PortType::Float)
            .with_list_argument("list3", PortType::Float),
        )
        .with_function(with_amount("slice", "start", |list, start| {
            let start = usize::try_from(start.max(0)).unwrap_or(usize::MAX);
            Ok(list.iter().skip(start).cloned().collect())
        }))
        .with_function(with_amount("shift", "amount", |list, amount| {
            let Ok(len) = i64::try_from(list.len()) else {
                return Err(FunctionError::ListTooLong);
            };
            if len == 0 {
                return Ok(Vec::new());
            }
            let n = amount.rem_euclid(len) as usize;
            Ok(list[n..].iter().chain(&list[..n]).cloned().collect())
        }))
        .with_function(with_amount("repeat", "amount", |list, amount| {
            let times = usize::try_from(amount.max(0)).unwrap_or(usize::MAX);
            let length = list
                .len()
                .checked_mul(times)
                .ok_or(FunctionError::ListTooLong)
                .and_then(check_length)?;
            Ok(list.iter().cloned().cycle().take(length).collect())
        }))
        .with_function(with_amount("take_every", "n", |list, n| {
            match usize::try_from(n) {
                Ok(step) if step > 0 => Ok(list.iter().step_by(step).cloned().collect()),
                _ => Ok(Vec::new()),
            }
        }))
}

/// Numbers sort numerically, everything else by its textual form
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_float(), b.as_float()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn pick_one(name: &str, pick: fn(&[Value]) -> Option<&Value>) -> Function {
    Function::list_aware(name, move |lists| {
        Ok(pick(list_arg(lists, 0)?).cloned().into_iter().collect())
    })
    .with_list_argument("list", PortType::Float)
}

fn transform(name: &str, f: fn(&[Value]) -> Vec<Value>) -> Function {
    Function::list_aware(name, move |lists| Ok(f(list_arg(lists, 0)?)))
        .with_list_argument("list", PortType::Float)
}

fn with_amount(
    name: &str,
    amount: &str,
    f: fn(&[Value], i64) -> Result<Vec<Value>, FunctionError>,
) -> Function {
    Function::list_aware(name, move |lists| {
        let list = list_arg(lists, 0)?;
        let amount = match list_arg(lists, 1)?.first() {
            Some(value) => value.as_int().ok_or_else(|| FunctionError::ArgumentType {
                index: 1,
                expected: "integer",
                found: value.clone(),
            })?,
            None => 0,
        };
        f(list, amount)
    })
    .with_list_argument("list", PortType::Float)
    .with_argument(amount, PortType::Int)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Callable;

    fn try_call(name: &str, lists: &[Vec<Value>]) -> Result<Vec<Value>, FunctionError> {
        let library = library();
        match library.function(name).map(|f| f.callable().clone()) {
            Some(Callable::ListAware(f)) => f(lists),
            _ => panic!("{name} is not list-aware"),
        }
    }

    fn call(name: &str, lists: &[Vec<Value>]) -> Vec<Value> {
        try_call(name, lists).unwrap()
    }

    fn floats(values: &[f64]) -> Vec<Value> {
        values.iter().copied().map(Value::Float).collect()
    }

    #[test]
    fn test_pick_functions() {
        let list = floats(&[1.0, 2.0, 3.0]);
        assert_eq!(call("count", &[list.clone()]), vec![Value::Int(3)]);
        assert_eq!(call("first", &[list.clone()]), floats(&[1.0]));
        assert_eq!(call("second", &[list.clone()]), floats(&[2.0]));
        assert_eq!(call("last", &[list.clone()]), floats(&[3.0]));
        assert_eq!(call("first", &[vec![]]), Vec::<Value>::new());
        assert_eq!(call("rest", &[list]), floats(&[2.0, 3.0]));
    }

    #[test]
    fn test_reordering() {
        let list = floats(&[3.0, 1.0, 2.0, 1.0]);
        assert_eq!(call("sort", &[list.clone()]), floats(&[1.0, 1.0, 2.0, 3.0]));
        assert_eq!(call("distinct", &[list.clone()]), floats(&[3.0, 1.0, 2.0]));
        assert_eq!(call("reverse", &[list.clone()]), floats(&[1.0, 2.0, 1.0, 3.0]));
        assert_eq!(call("shift", &[list.clone(), vec![Value::Int(1)]]), floats(&[1.0, 2.0, 1.0, 3.0]));
        assert_eq!(call("shift", &[list, vec![Value::Int(-1)]]), floats(&[1.0, 3.0, 1.0, 2.0]));
    }

    #[test]
    fn test_amount_functions() {
        let list = floats(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(call("slice", &[list.clone(), vec![Value::Int(2)]]), floats(&[3.0, 4.0]));
        assert_eq!(call("repeat", &[floats(&[1.0, 2.0]), vec![Value::Int(2)]]), floats(&[1.0, 2.0, 1.0, 2.0]));
        assert_eq!(call("take_every", &[list.clone(), vec![Value::Int(2)]]), floats(&[1.0, 3.0]));
        assert_eq!(call("take_every", &[list.clone(), vec![Value::Int(0)]]), Vec::<Value>::new());
        assert_eq!(
            call("combine", &[list, vec![], floats(&[9.0])]).len(),
            5
        );
    }

    #[test]
    fn test_huge_amounts_fail_instead_of_allocating() {
        let list = floats(&[1.0, 2.0, 3.0]);
        assert_eq!(
            try_call("repeat", &[list.clone(), vec![Value::Int(i64::MAX)]]),
            Err(FunctionError::ListTooLong)
        );
        assert_eq!(
            try_call("repeat", &[list.clone(), vec![Value::Int(crate::MAX_LIST_LENGTH as i64)]]),
            Err(FunctionError::ListTooLong)
        );
        assert_eq!(try_call("repeat", &[list.clone(), vec![Value::Int(-4)]]), Ok(vec![]));

        assert_eq!(call("take_every", &[list.clone(), vec![Value::Int(i64::MAX)]]), floats(&[1.0]));
        assert_eq!(call("slice", &[list.clone(), vec![Value::Int(i64::MAX)]]), Vec::<Value>::new());
        assert_eq!(call("shift", &[list, vec![Value::Int(i64::MIN)]]), floats(&[2.0, 3.0, 1.0]));
    }
}
