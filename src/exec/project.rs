//! Projection: `WITH`/`RETURN` evaluation, including aggregate grouping.

use std::collections::HashMap;

use crate::cypher::ast::{Expr, Projection};
use crate::model::{PropertyMap, Value};
use crate::store::Store;
use crate::Result;

use super::aggregate::{self, AggregateState};
use super::binding::{Binding, Row};
use super::eval::eval;

/// Projects every row through `projection`, handling aggregate grouping if
/// any projection item contains an aggregate call.
///
/// `carry_scope`: when `true`, the pre-projection row's bindings are kept
/// alongside the new projected columns (under their original variable
/// names, where that name isn't itself a projected alias) so that a
/// trailing `ORDER BY`/`SKIP`/`LIMIT` in the same `RETURN` scope can still
/// reference them. `RETURN` uses this; `WITH` does not — its whole point
/// is to narrow scope to just the named columns.
pub fn project(
    rows: &[Row],
    projection: &Projection,
    store: &Store,
    params: &PropertyMap,
    carry_scope: bool,
) -> Result<Vec<Row>> {
    if projection.items.iter().any(|item| contains_aggregate(&item.expr)) {
        aggregate::project_grouped(rows, projection, store, params)
    } else {
        rows.iter().map(|row| project_row(row, projection, store, params, carry_scope)).collect()
    }
}

/// Projects a single row with no aggregation: a bare variable reference
/// keeps its entity binding (so a later clause can still traverse from
/// it); any other expression collapses to a computed `Value`.
pub fn project_row(
    row: &Row,
    projection: &Projection,
    store: &Store,
    params: &PropertyMap,
    carry_scope: bool,
) -> Result<Row> {
    let mut out = Row::new();
    for item in &projection.items {
        let name = item.column_name();
        let binding = match &item.expr {
            Expr::Variable(var) if row.contains_key(var) => row.get(var).unwrap().clone(),
            other => Binding::Value(eval(other, row, store, params)?),
        };
        out.insert(name, binding);
    }
    if carry_scope {
        for (var, binding) in row {
            out.entry(var.clone()).or_insert_with(|| binding.clone());
        }
    }
    Ok(out)
}

pub fn contains_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Aggregate { .. } => true,
        Expr::Literal(_) | Expr::Variable(_) | Expr::Parameter(_) => false,
        Expr::Property { expr, .. } => contains_aggregate(expr),
        Expr::FunctionCall { args, .. } => args.iter().any(contains_aggregate),
        Expr::BinaryOp { left, right, .. } => contains_aggregate(left) || contains_aggregate(right),
        Expr::UnaryOp { expr, .. } => contains_aggregate(expr),
        Expr::List(items) => items.iter().any(contains_aggregate),
        Expr::MapLiteral(entries) => entries.values().any(contains_aggregate),
        Expr::StringOp { left, right, .. } => contains_aggregate(left) || contains_aggregate(right),
    }
}

/// Deduplicates rows by structural equality of the named `columns`, in the
/// order first seen. Only `columns` are compared, not a row's full binding
/// set, so that scope carried through for a trailing `ORDER BY` (see
/// [`project`]) never affects which rows count as duplicates.
pub fn distinct(rows: Vec<Row>, columns: &[String]) -> Vec<Row> {
    let mut seen: Vec<Row> = Vec::new();
    let mut out = Vec::new();
    for row in rows {
        if !seen.iter().any(|s| rows_equal_on(s, &row, columns)) {
            seen.push(row.clone());
            out.push(row);
        }
    }
    out
}

fn rows_equal_on(a: &Row, b: &Row, columns: &[String]) -> bool {
    columns.iter().all(|c| match (a.get(c), b.get(c)) {
        (Some(av), Some(bv)) => binding_equal(av, bv),
        (None, None) => true,
        _ => false,
    })
}

fn binding_equal(a: &Binding, b: &Binding) -> bool {
    match (a, b) {
        (Binding::Node(x), Binding::Node(y)) => x == y,
        (Binding::Edge(x), Binding::Edge(y)) => x == y,
        (Binding::EdgePath(x), Binding::EdgePath(y)) => x == y,
        (Binding::Value(x), Binding::Value(y)) => x.values_equal(y),
        _ => false,
    }
}

/// Grouping key used by the aggregate pipeline: structural values for the
/// non-aggregate projection items, in order.
pub fn group_key(row: &Row, projection: &Projection, store: &Store, params: &PropertyMap) -> Result<Vec<Value>> {
    let mut key = Vec::new();
    for item in &projection.items {
        if !contains_aggregate(&item.expr) {
            key.push(binding_or_eval(&item.expr, row, store, params)?);
        }
    }
    Ok(key)
}

fn binding_or_eval(expr: &Expr, row: &Row, store: &Store, params: &PropertyMap) -> Result<Value> {
    eval(expr, row, store, params)
}

pub fn default_aggregate_row(projection: &Projection) -> Row {
    let mut row = Row::new();
    for item in &projection.items {
        let name = item.column_name();
        let value = match &item.expr {
            Expr::Aggregate { name, .. } if name.eq_ignore_ascii_case("COUNT") => Value::Int(0),
            _ => Value::Null,
        };
        row.insert(name, Binding::Value(value));
    }
    row
}

/// Produces aggregate output values for one bucket of rows sharing the
/// same grouping key.
pub fn finalize_bucket(
    bucket: &[Row],
    projection: &Projection,
    store: &Store,
    params: &PropertyMap,
) -> Result<Row> {
    let mut states: HashMap<usize, AggregateState> = HashMap::new();
    for (idx, item) in projection.items.iter().enumerate() {
        if let Expr::Aggregate { name, .. } = &item.expr {
            states.insert(idx, AggregateState::new(name));
        }
    }
    for row in bucket {
        for (idx, item) in projection.items.iter().enumerate() {
            if let Expr::Aggregate { arg, .. } = &item.expr {
                let value = match arg {
                    Some(inner) => Some(eval(inner, row, store, params)?),
                    None => None,
                };
                states.get_mut(&idx).unwrap().accumulate(value);
            }
        }
    }
    let representative = bucket.first();
    let mut out = Row::new();
    for (idx, item) in projection.items.iter().enumerate() {
        let name = item.column_name();
        let binding = if let Some(state) = states.get(&idx) {
            Binding::Value(state.finish())
        } else if let Some(row) = representative {
            match &item.expr {
                Expr::Variable(var) if row.contains_key(var) => row.get(var).unwrap().clone(),
                other => Binding::Value(eval(other, row, store, params)?),
            }
        } else {
            Binding::Value(Value::Null)
        };
        out.insert(name, binding);
    }
    Ok(out)
}
