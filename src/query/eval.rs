use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::types::{CmpOp, Filter, MAX_PATH_DEPTH, MAX_SORT_FIELDS, Order, SortSpec};
use crate::types::ID_FIELD;

pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Not(f) => !eval_filter(doc, f),
        Filter::Exists { path, exists } => get_path(doc, path).is_some() == *exists,
        Filter::In { path, values } => get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Nin { path, values } => !get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Cmp { path, op, value } => {
            let Some(v) = get_path(doc, path) else { return false };
            if *op == CmpOp::Eq {
                return bson_equal(v, value);
            }
            // Range operators only match within the same type bracket.
            bracketed_cmp(v, value).is_some_and(|ord| match op {
                CmpOp::Gt => ord == Ordering::Greater,
                CmpOp::Gte => ord != Ordering::Less,
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Lte => ord != Ordering::Greater,
                CmpOp::Eq => ord == Ordering::Equal,
            })
        }
    }
}

pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortSpec]) -> Ordering {
    for s in sort.iter().take(MAX_SORT_FIELDS) {
        let ord = match (get_path(a, &s.field), get_path(b, &s.field)) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if s.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

fn is_in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().any(|x| bson_equal(v, x))
}

pub fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut parts = path.split('.');
    let mut cur = doc.get(parts.next()?)?;
    for (depth, part) in parts.enumerate() {
        if depth + 1 >= MAX_PATH_DEPTH {
            return None;
        }
        match cur {
            Bson::Document(d) => cur = d.get(part)?,
            _ => return None,
        }
    }
    Some(cur)
}

#[allow(clippy::cast_precision_loss)]
pub fn to_f64(b: &Bson) -> Option<f64> {
    match b {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

#[allow(clippy::float_cmp)]
pub fn bson_equal(a: &Bson, b: &Bson) -> bool {
    match (a, b) {
        (Bson::Int32(x), Bson::Int32(y)) => x == y,
        (Bson::Int64(x), Bson::Int64(y)) => x == y,
        (Bson::Int32(x), Bson::Int64(y)) | (Bson::Int64(y), Bson::Int32(x)) => i64::from(*x) == *y,
        _ => match (to_f64(a), to_f64(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

/// Ordering within a type bracket (numbers, strings, booleans); `None` across brackets.
fn bracketed_cmp(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (to_f64(a), to_f64(b)) {
        return Some(x.total_cmp(&y));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order over values; mixed types order by type rank.
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    bracketed_cmp(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::DbPointer(_) | Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => 12,
        Bson::MaxKey => 255,
    }
}

/// Keeps only `fields` (in the order given). `_id` survives only when listed.
pub fn project_fields(doc: &BsonDocument, fields: &[String]) -> BsonDocument {
    let mut out = BsonDocument::new();
    for f in fields {
        if let Some(v) = get_path(doc, f) {
            out.insert(f.clone(), v.clone());
        }
    }
    if !fields.iter().any(|f| f == ID_FIELD) {
        out.remove(ID_FIELD);
    }
    out
}
