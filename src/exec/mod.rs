//! The executor: turns a parsed [`Statement`] into a [`QueryResult`] by
//! interpreting its clauses as a sequential pipeline (see crate docs).

pub mod aggregate;
pub mod binding;
pub mod create;
pub mod eval;
pub mod pattern;
pub mod project;

use std::cmp::Ordering;

use crate::cypher::ast::{Clause, OrderItem, Statement};
use crate::model::PropertyMap;
use crate::result::{QueryResult, Record, RecordValue};
use crate::store::Store;
use crate::Result;

use binding::{Binding, Row};

/// Executes a parsed statement against `store`. Read-only unless the
/// statement contains a `CREATE` clause; callers that need atomicity
/// across multiple mutating statements should wrap the call in
/// [`Store::transaction`].
pub fn execute(stmt: &Statement, store: &mut Store, params: &PropertyMap) -> Result<QueryResult> {
    let mut rows: Vec<Row> = vec![Row::new()];
    let mut returned_columns: Option<Vec<String>> = None;

    for clause in &stmt.clauses {
        match clause {
            Clause::Match(patterns) => {
                for pattern in patterns {
                    rows = pattern::match_pattern(&rows, pattern, store, params)?;
                }
            }
            Clause::Where(expr) => {
                let mut kept = Vec::with_capacity(rows.len());
                for row in rows {
                    if eval::eval(expr, &row, store, params)?.is_truthy() {
                        kept.push(row);
                    }
                }
                rows = kept;
            }
            Clause::Create(patterns) => {
                let mut next = Vec::with_capacity(rows.len());
                for row in &rows {
                    next.push(create::execute_create(patterns, row, store, params)?);
                }
                rows = next;
            }
            Clause::With(projection) => {
                let columns: Vec<String> = projection.items.iter().map(|i| i.column_name()).collect();
                rows = project::project(&rows, projection, store, params, false)?;
                if projection.distinct {
                    rows = project::distinct(rows, &columns);
                }
            }
            Clause::Return(projection) => {
                let columns: Vec<String> = projection.items.iter().map(|i| i.column_name()).collect();
                // `carry_scope = true`: keep pre-projection bindings around so a
                // trailing ORDER BY can still reference variables that weren't
                // themselves returned (e.g. `RETURN p.age AS age ORDER BY p.age`).
                rows = project::project(&rows, projection, store, params, true)?;
                if projection.distinct {
                    rows = project::distinct(rows, &columns);
                }
                returned_columns = Some(columns);
            }
            Clause::OrderBy(items) => {
                rows = order_by(rows, items, store, params)?;
            }
            Clause::Skip(expr) => {
                let n = eval_nonneg_int(expr, store, params)?;
                rows = rows.into_iter().skip(n).collect();
            }
            Clause::Limit(expr) => {
                let n = eval_nonneg_int(expr, store, params)?;
                rows.truncate(n);
            }
        }
    }

    let Some(columns) = returned_columns else {
        return Ok(QueryResult::new(Vec::new(), Vec::new()));
    };
    rows_to_result(rows, columns, store)
}

fn eval_nonneg_int(expr: &crate::cypher::ast::Expr, store: &Store, params: &PropertyMap) -> Result<usize> {
    let value = eval::eval(expr, &Row::new(), store, params)?;
    Ok(value.as_int().unwrap_or(0).max(0) as usize)
}

fn order_by(rows: Vec<Row>, items: &[OrderItem], store: &Store, params: &PropertyMap) -> Result<Vec<Row>> {
    let mut keyed: Vec<(Vec<crate::model::Value>, Row)> = Vec::with_capacity(rows.len());
    for row in rows {
        let mut key = Vec::with_capacity(items.len());
        for item in items {
            key.push(eval::eval(&item.expr, &row, store, params)?);
        }
        keyed.push((key, row));
    }
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, items));
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

fn compare_keys(a: &[crate::model::Value], b: &[crate::model::Value], items: &[OrderItem]) -> Ordering {
    for ((av, bv), item) in a.iter().zip(b).zip(items) {
        // `null` always sorts last, in both `ASC` and `DESC`; direction only
        // reverses the relative order of the non-null keys.
        let ordering = match (av.is_null(), bv.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let cmp = av.partial_cmp_value(bv).unwrap_or(Ordering::Equal);
                if item.ascending { cmp } else { cmp.reverse() }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn rows_to_result(rows: Vec<Row>, columns: Vec<String>, store: &Store) -> Result<QueryResult> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells = Vec::with_capacity(columns.len());
        for column in &columns {
            let binding = row.get(column).cloned().unwrap_or(Binding::Value(crate::model::Value::Null));
            cells.push((column.clone(), resolve_binding(binding, store)?));
        }
        records.push(Record::new(cells));
    }
    Ok(QueryResult::new(columns, records))
}

fn resolve_binding(binding: Binding, store: &Store) -> Result<RecordValue> {
    Ok(match binding {
        Binding::Node(id) => RecordValue::Node(store.get_node(id)?.clone()),
        Binding::Edge(id) => RecordValue::Relationship(store.get_edge(id)?.clone()),
        Binding::EdgePath(ids) => {
            let mut rels = Vec::with_capacity(ids.len());
            for id in ids {
                rels.push(store.get_edge(id)?.clone());
            }
            RecordValue::Path(rels)
        }
        Binding::Value(v) => RecordValue::Value(v),
    })
}
