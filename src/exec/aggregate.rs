//! Aggregate accumulation: `COUNT`, `SUM`, `AVG`, `MIN`, `MAX`.

use std::collections::HashMap;

use crate::cypher::ast::Projection;
use crate::model::{PropertyMap, Value};
use crate::store::Store;
use crate::Result;

use super::binding::Row;
use super::project::{default_aggregate_row, finalize_bucket, group_key};

/// Running state for one aggregate projection item.
pub struct AggregateState {
    kind: Kind,
    count: i64,
    non_null_count: i64,
    saw_star: bool,
    sum: f64,
    sum_is_float: bool,
    min: Option<Value>,
    max: Option<Value>,
}

enum Kind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateState {
    pub fn new(name: &str) -> Self {
        let kind = match name.to_uppercase().as_str() {
            "COUNT" => Kind::Count,
            "SUM" => Kind::Sum,
            "AVG" => Kind::Avg,
            "MIN" => Kind::Min,
            "MAX" => Kind::Max,
            _ => Kind::Count,
        };
        Self { kind, count: 0, non_null_count: 0, saw_star: false, sum: 0.0, sum_is_float: false, min: None, max: None }
    }

    /// `value` is `None` for `COUNT(*)` (counts rows, not expression results).
    /// `COUNT(expr)` only counts rows where `expr` evaluated to non-null.
    pub fn accumulate(&mut self, value: Option<Value>) {
        let Some(value) = value else {
            self.count += 1;
            self.saw_star = true;
            return;
        };
        if value.is_null() {
            return;
        }
        self.non_null_count += 1;
        if let Some(f) = value.as_float() {
            self.sum += f;
            if matches!(value, Value::Float(_)) {
                self.sum_is_float = true;
            }
        }
        if self.min.as_ref().is_none_or(|m| value.partial_cmp_value(m) == Some(std::cmp::Ordering::Less)) {
            self.min = Some(value.clone());
        }
        if self.max.as_ref().is_none_or(|m| value.partial_cmp_value(m) == Some(std::cmp::Ordering::Greater)) {
            self.max = Some(value);
        }
    }

    pub fn finish(&self) -> Value {
        match self.kind {
            Kind::Count => Value::Int(if self.saw_star { self.count } else { self.non_null_count }),
            Kind::Sum => {
                if self.non_null_count == 0 {
                    Value::Int(0)
                } else if self.sum_is_float {
                    Value::Float(self.sum)
                } else {
                    Value::Int(self.sum as i64)
                }
            }
            Kind::Avg => {
                if self.non_null_count == 0 {
                    Value::Null
                } else {
                    Value::Float(self.sum / self.non_null_count as f64)
                }
            }
            Kind::Min => self.min.clone().unwrap_or(Value::Null),
            Kind::Max => self.max.clone().unwrap_or(Value::Null),
        }
    }
}

/// Buckets `rows` by their non-aggregate projection values and computes
/// aggregate items per bucket. An empty input produces a single row of
/// aggregate defaults (`COUNT` → 0, others → `null`), per the documented
/// "aggregate without matched rows" behavior.
pub fn project_grouped(rows: &[Row], projection: &Projection, store: &Store, params: &PropertyMap) -> Result<Vec<Row>> {
    if rows.is_empty() {
        return Ok(vec![default_aggregate_row(projection)]);
    }

    let mut buckets: Vec<(Vec<Value>, Vec<Row>)> = Vec::new();
    for row in rows {
        let key = group_key(row, projection, store, params)?;
        match buckets.iter_mut().find(|(k, _)| keys_equal(k, &key)) {
            Some((_, bucket)) => bucket.push(row.clone()),
            None => buckets.push((key, vec![row.clone()])),
        }
    }

    buckets
        .into_iter()
        .map(|(_, bucket)| finalize_bucket(&bucket, projection, store, params))
        .collect()
}

fn keys_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.values_equal(y))
}
