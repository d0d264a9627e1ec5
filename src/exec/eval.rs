//! Expression evaluator: evaluates a parsed [`Expr`] against a binding row.
//!
//! Pure with respect to the store (read-only lookups only). Degrades to
//! `null` on type misuse wherever the language specifies tolerance; raises
//! `UnboundVariable`, `UnknownFunction` or `ArgumentError` only where the
//! language specifies a hard error.

use regex::Regex;

use crate::cypher::ast::{BinaryOp, Expr, Literal, StringOp, UnaryOp};
use crate::model::{PropertyMap, Value};
use crate::store::Store;
use crate::{Error, Result};

use super::binding::{Binding, Row};

pub fn eval(expr: &Expr, row: &Row, store: &Store, params: &PropertyMap) -> Result<Value> {
    match expr {
        Expr::Literal(lit) => Ok(literal_to_value(lit)),
        Expr::Variable(name) => bound_to_scalar(name, row, store),
        Expr::Property { expr, key } => eval_property(expr, key, row, store, params),
        Expr::Parameter(name) => Ok(params.get(name).cloned().unwrap_or(Value::Null)),
        Expr::FunctionCall { name, args } => eval_function(name, args, row, store, params),
        Expr::Aggregate { name, .. } => {
            Err(Error::ArgumentError(format!("{name} is an aggregate and cannot be evaluated per-row")))
        }
        Expr::BinaryOp { left, op, right } => eval_binary(left, *op, right, row, store, params),
        Expr::UnaryOp { op, expr } => eval_unary(*op, expr, row, store, params),
        Expr::List(items) => {
            let values = items
                .iter()
                .map(|item| eval(item, row, store, params))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(values))
        }
        Expr::MapLiteral(entries) => {
            let mut map = PropertyMap::new();
            for (key, value_expr) in entries {
                map.insert(key.clone(), eval(value_expr, row, store, params)?);
            }
            Ok(Value::Map(map))
        }
        Expr::StringOp { left, op, right } => eval_string_op(left, *op, right, row, store, params),
    }
}

fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(f) => Value::Float(*f),
        Literal::String(s) => Value::String(s.clone()),
    }
}

/// A bound entity used directly as a scalar (not via property access)
/// has no representation in the narrow `Value` union; it evaluates to
/// `null`; only `var.key` resolves entity data.
fn bound_to_scalar(name: &str, row: &Row, _store: &Store) -> Result<Value> {
    match row.get(name) {
        Some(Binding::Value(v)) => Ok(v.clone()),
        Some(Binding::Node(_) | Binding::Edge(_) | Binding::EdgePath(_)) => Ok(Value::Null),
        None => Err(Error::UnboundVariable(name.to_string())),
    }
}

fn eval_property(inner: &Expr, key: &str, row: &Row, store: &Store, params: &PropertyMap) -> Result<Value> {
    if let Expr::Variable(name) = inner {
        return match row.get(name) {
            Some(Binding::Node(id)) => Ok(store.get_node(*id)?.get(key).cloned().unwrap_or(Value::Null)),
            Some(Binding::Edge(id)) => Ok(store.get_edge(*id)?.get(key).cloned().unwrap_or(Value::Null)),
            Some(Binding::Value(Value::Map(m))) => Ok(m.get(key).cloned().unwrap_or(Value::Null)),
            Some(Binding::EdgePath(_) | Binding::Value(_)) => Ok(Value::Null),
            None => Err(Error::UnboundVariable(name.clone())),
        };
    }
    let value = eval(inner, row, store, params)?;
    Ok(match value {
        Value::Map(m) => m.get(key).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    })
}

fn eval_binary(
    left: &Expr,
    op: BinaryOp,
    right: &Expr,
    row: &Row,
    store: &Store,
    params: &PropertyMap,
) -> Result<Value> {
    match op {
        BinaryOp::And => {
            let l = eval(left, row, store, params)?;
            if !l.is_truthy() {
                return Ok(Value::Bool(false));
            }
            let r = eval(right, row, store, params)?;
            Ok(Value::Bool(r.is_truthy()))
        }
        BinaryOp::Or => {
            let l = eval(left, row, store, params)?;
            if l.is_truthy() {
                return Ok(Value::Bool(true));
            }
            let r = eval(right, row, store, params)?;
            Ok(Value::Bool(r.is_truthy()))
        }
        BinaryOp::RegexMatch => {
            let l = eval(left, row, store, params)?;
            let r = eval(right, row, store, params)?;
            match (coerce_to_string(&l), coerce_to_string(&r)) {
                (Some(haystack), Some(pattern)) => match Regex::new(&pattern) {
                    Ok(re) => Ok(Value::Bool(re.is_match(&haystack))),
                    Err(_) => Ok(Value::Bool(false)),
                },
                _ => Ok(Value::Bool(false)),
            }
        }
        BinaryOp::Eq | BinaryOp::Neq => {
            let l = eval(left, row, store, params)?;
            let r = eval(right, row, store, params)?;
            let equal = if l.is_null() || r.is_null() { false } else { l.values_equal(&r) };
            Ok(Value::Bool(if op == BinaryOp::Eq { equal } else { !equal }))
        }
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            let l = eval(left, row, store, params)?;
            let r = eval(right, row, store, params)?;
            let ordering = l.partial_cmp_value(&r);
            let result = match (op, ordering) {
                (_, None) => false,
                (BinaryOp::Lt, Some(o)) => o == std::cmp::Ordering::Less,
                (BinaryOp::Lte, Some(o)) => o != std::cmp::Ordering::Greater,
                (BinaryOp::Gt, Some(o)) => o == std::cmp::Ordering::Greater,
                (BinaryOp::Gte, Some(o)) => o != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let l = eval(left, row, store, params)?;
            let r = eval(right, row, store, params)?;
            eval_arithmetic(op, &l, &r)
        }
    }
}

fn eval_arithmetic(op: BinaryOp, l: &Value, r: &Value) -> Result<Value> {
    if op == BinaryOp::Add {
        if let (Value::String(a), Value::String(b)) = (l, r) {
            return Ok(Value::String(format!("{a}{b}")));
        }
    }
    if !l.is_numeric() || !r.is_numeric() {
        return Ok(Value::Null);
    }
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        return Ok(match op {
            BinaryOp::Add => Value::Int(a + b),
            BinaryOp::Sub => Value::Int(a - b),
            BinaryOp::Mul => Value::Int(a * b),
            BinaryOp::Div => {
                if *b == 0 {
                    Value::Null
                } else {
                    Value::Int(a / b)
                }
            }
            _ => unreachable!(),
        });
    }
    let a = l.as_float().unwrap();
    let b = r.as_float().unwrap();
    Ok(match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                Value::Null
            } else {
                Value::Float(a / b)
            }
        }
        _ => unreachable!(),
    })
}

fn eval_unary(op: UnaryOp, expr: &Expr, row: &Row, store: &Store, params: &PropertyMap) -> Result<Value> {
    let value = eval(expr, row, store, params)?;
    Ok(match op {
        UnaryOp::Not => Value::Bool(!value.is_truthy()),
        UnaryOp::Negate => match value {
            Value::Int(i) => Value::Int(-i),
            Value::Float(f) => Value::Float(-f),
            _ => Value::Null,
        },
    })
}

fn eval_string_op(
    left: &Expr,
    op: StringOp,
    right: &Expr,
    row: &Row,
    store: &Store,
    params: &PropertyMap,
) -> Result<Value> {
    let l = eval(left, row, store, params)?;
    let r = eval(right, row, store, params)?;
    let result = match (coerce_to_string(&l), coerce_to_string(&r)) {
        (Some(haystack), Some(needle)) => match op {
            StringOp::StartsWith => haystack.starts_with(&needle),
            StringOp::EndsWith => haystack.ends_with(&needle),
            StringOp::Contains => haystack.contains(&needle),
        },
        _ => false,
    };
    Ok(Value::Bool(result))
}

fn coerce_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::List(_) | Value::Map(_) => None,
        other => Some(other.to_string()),
    }
}

fn eval_function(name: &str, args: &[Expr], row: &Row, store: &Store, params: &PropertyMap) -> Result<Value> {
    let values = args
        .iter()
        .map(|a| eval(a, row, store, params))
        .collect::<Result<Vec<_>>>()?;
    let upper = name.to_uppercase();
    match upper.as_str() {
        "UPPER" => string_fn(&upper, &values, 1, |s| s.to_uppercase()),
        "LOWER" => string_fn(&upper, &values, 1, |s| s.to_lowercase()),
        "TRIM" => string_fn(&upper, &values, 1, |s| s.trim().to_string()),
        "LTRIM" => string_fn(&upper, &values, 1, |s| s.trim_start().to_string()),
        "RTRIM" => string_fn(&upper, &values, 1, |s| s.trim_end().to_string()),
        "REVERSE" => string_fn(&upper, &values, 1, |s| s.chars().rev().collect()),
        "LENGTH" => {
            expect_args(&upper, &values, 1)?;
            Ok(match values[0].as_str() {
                Some(s) => Value::Int(s.chars().count() as i64),
                None => Value::Null,
            })
        }
        "SUBSTRING" => eval_substring(&values),
        "REPLACE" => {
            expect_args(&upper, &values, 3)?;
            match (values[0].as_str(), values[1].as_str(), values[2].as_str()) {
                (Some(s), Some(old), Some(new)) => Ok(Value::String(s.replace(old, new))),
                _ => Ok(Value::Null),
            }
        }
        "SPLIT" => {
            expect_args(&upper, &values, 2)?;
            match (values[0].as_str(), values[1].as_str()) {
                (Some(s), Some(delim)) => {
                    Ok(Value::List(s.split(delim).map(|p| Value::String(p.to_string())).collect()))
                }
                _ => Ok(Value::Null),
            }
        }
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}

fn string_fn(name: &str, values: &[Value], expected_args: usize, f: impl Fn(&str) -> String) -> Result<Value> {
    expect_args(name, values, expected_args)?;
    Ok(match values[0].as_str() {
        Some(s) => Value::String(f(s)),
        None => Value::Null,
    })
}

fn eval_substring(values: &[Value]) -> Result<Value> {
    if values.len() != 2 && values.len() != 3 {
        return Err(Error::ArgumentError("substring expects 2 or 3 arguments".into()));
    }
    let Some(s) = values[0].as_str() else { return Ok(Value::Null) };
    let Some(start) = values[1].as_int() else { return Ok(Value::Null) };
    let chars: Vec<char> = s.chars().collect();
    let start = start.max(0) as usize;
    if start >= chars.len() {
        return Ok(Value::String(String::new()));
    }
    let end = if values.len() == 3 {
        match values[2].as_int() {
            Some(len) => (start + len.max(0) as usize).min(chars.len()),
            None => return Ok(Value::Null),
        }
    } else {
        chars.len()
    };
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn expect_args(name: &str, values: &[Value], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(Error::ArgumentError(format!(
            "{name} expects {expected} argument(s), got {}",
            values.len()
        )));
    }
    Ok(())
}
