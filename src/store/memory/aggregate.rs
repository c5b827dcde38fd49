use super::collection::MemoryCollection;
use crate::errors::StoreError;
use crate::pipeline::{Accumulator, Expr, Stage};
use crate::query::{compare_docs, eval_filter, get_path, to_f64};
use crate::types::ID_FIELD;
use bson::{Bson, Document as BsonDocument};
use indexmap::IndexMap;

/// Runs `pipeline` over the collection in natural order.
pub fn aggregate(col: &MemoryCollection, pipeline: &[Stage]) -> Result<Vec<BsonDocument>, StoreError> {
    let mut rows: Vec<BsonDocument> = col.get_all_documents().iter().map(|d| d.to_bson()).collect();
    for stage in pipeline {
        rows = match stage {
            Stage::Match(filter) => rows.into_iter().filter(|d| eval_filter(d, filter)).collect(),
            Stage::Group { id, fields } => group(rows, id, fields)?,
            Stage::Project(fields) => rows.iter().map(|d| project(d, fields)).collect::<Result<_, _>>()?,
            Stage::Sort(specs) => {
                rows.sort_by(|a, b| compare_docs(a, b, specs));
                rows
            }
            Stage::Limit(n) => {
                rows.truncate(*n);
                rows
            }
        };
    }
    log::debug!(target: "bookstore::store", "aggregate collection={} stages={} rows={}", col.name_str(), pipeline.len(), rows.len());
    Ok(rows)
}

/// Evaluates `expr` against `doc`; missing fields read as `Null`.
pub fn eval_expr(doc: &BsonDocument, expr: &Expr) -> Result<Bson, StoreError> {
    match expr {
        Expr::Field(path) => Ok(get_path(doc, path).cloned().unwrap_or(Bson::Null)),
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Add(a, b) => arith(eval_expr(doc, a)?, eval_expr(doc, b)?, "$add"),
        Expr::Subtract(a, b) => arith(eval_expr(doc, a)?, eval_expr(doc, b)?, "$subtract"),
        Expr::Mod(a, b) => arith(eval_expr(doc, a)?, eval_expr(doc, b)?, "$mod"),
    }
}

fn as_int(v: &Bson) -> Option<i64> {
    match v {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

fn narrow(n: i64, wide: bool) -> Bson {
    match i32::try_from(n) {
        Ok(small) if !wide => Bson::Int32(small),
        _ => Bson::Int64(n),
    }
}

fn arith(a: Bson, b: Bson, op: &str) -> Result<Bson, StoreError> {
    if matches!(a, Bson::Null) || matches!(b, Bson::Null) {
        return Ok(Bson::Null);
    }
    let wide = matches!(a, Bson::Int64(_)) || matches!(b, Bson::Int64(_));
    if let (Some(x), Some(y)) = (as_int(&a), as_int(&b)) {
        let out = match op {
            "$mod" if y == 0 => return Err(StoreError::AggregationError("$mod by zero".into())),
            "$mod" => x.checked_rem(y),
            "$add" => x.checked_add(y),
            _ => x.checked_sub(y),
        };
        return out
            .map(|n| narrow(n, wide))
            .ok_or_else(|| StoreError::AggregationError(format!("{op} overflow")));
    }
    let (Some(x), Some(y)) = (to_f64(&a), to_f64(&b)) else {
        return Err(StoreError::AggregationError(format!("{op} only supports numeric types, got {a} and {b}")));
    };
    match op {
        "$mod" if y == 0.0 => Err(StoreError::AggregationError("$mod by zero".into())),
        "$mod" => Ok(Bson::Double(x % y)),
        "$add" => Ok(Bson::Double(x + y)),
        _ => Ok(Bson::Double(x - y)),
    }
}

/// Grouping key: numerically equal values collapse regardless of width.
fn key_string(v: &Bson) -> String {
    to_f64(v).map_or_else(|| format!("{v:?}"), |f| format!("num:{f}"))
}

enum AccState {
    Sum { ints: i64, floats: f64, any_float: bool, wide: bool },
    Avg { total: f64, n: u64 },
}

impl AccState {
    fn new(acc: &Accumulator) -> Self {
        match acc {
            Accumulator::Sum(_) => Self::Sum { ints: 0, floats: 0.0, any_float: false, wide: false },
            Accumulator::Avg(_) => Self::Avg { total: 0.0, n: 0 },
        }
    }

    // Non-numeric inputs are ignored by both accumulators.
    #[allow(clippy::cast_precision_loss)]
    fn push(&mut self, v: &Bson) {
        match self {
            Self::Sum { ints, floats, any_float, wide } => match v {
                Bson::Int32(_) | Bson::Int64(_) => {
                    *wide |= matches!(v, Bson::Int64(_));
                    let n = as_int(v).unwrap_or(0);
                    if let Some(s) = ints.checked_add(n) {
                        *ints = s;
                    } else {
                        *any_float = true;
                        *floats += n as f64;
                    }
                }
                Bson::Double(f) => {
                    *any_float = true;
                    *floats += f;
                }
                _ => {}
            },
            Self::Avg { total, n } => {
                if let Some(f) = to_f64(v) {
                    *total += f;
                    *n += 1;
                }
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> Bson {
        match self {
            Self::Sum { ints, floats, any_float, wide } => {
                if any_float { Bson::Double(floats + ints as f64) } else { narrow(ints, wide) }
            }
            Self::Avg { n: 0, .. } => Bson::Null,
            Self::Avg { total, n } => Bson::Double(total / n as f64),
        }
    }
}

fn group(
    rows: Vec<BsonDocument>,
    id: &Expr,
    fields: &[(String, Accumulator)],
) -> Result<Vec<BsonDocument>, StoreError> {
    let mut groups: IndexMap<String, (Bson, Vec<AccState>)> = IndexMap::new();
    for row in &rows {
        let key = eval_expr(row, id)?;
        let entry = groups
            .entry(key_string(&key))
            .or_insert_with(|| (key, fields.iter().map(|(_, a)| AccState::new(a)).collect()));
        for ((_, acc), state) in fields.iter().zip(entry.1.iter_mut()) {
            let input = match acc {
                Accumulator::Sum(e) | Accumulator::Avg(e) => eval_expr(row, e)?,
            };
            state.push(&input);
        }
    }
    Ok(groups
        .into_values()
        .map(|(key, states)| {
            let mut out = BsonDocument::new();
            out.insert(ID_FIELD, key);
            for ((name, _), state) in fields.iter().zip(states) {
                out.insert(name.clone(), state.finish());
            }
            out
        })
        .collect())
}

fn project(doc: &BsonDocument, fields: &[(String, Expr)]) -> Result<BsonDocument, StoreError> {
    let mut out = BsonDocument::new();
    if let Some(id) = doc.get(ID_FIELD) {
        out.insert(ID_FIELD, id.clone());
    }
    for (name, expr) in fields {
        out.insert(name.clone(), eval_expr(doc, expr)?);
    }
    Ok(out)
}
