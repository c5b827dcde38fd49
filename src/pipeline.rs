//! Aggregation pipeline vocabulary: an ordered list of stages the store executes.
//!
//! Only the stages and operators the bookstore reports need are modelled:
//! `$match`, `$group`, `$project`, `$sort` and `$limit`, with `$sum`/`$avg`
//! accumulators and `$add`/`$subtract`/`$mod` arithmetic.

use crate::query::{Filter, SortSpec};
use bson::Bson;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A field path, written `$path` in pipeline JSON.
    Field(String),
    Literal(Bson),
    Add(Box<Expr>, Box<Expr>),
    Subtract(Box<Expr>, Box<Expr>),
    Mod(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    pub fn literal(value: impl Into<Bson>) -> Self {
        Self::Literal(value.into())
    }

    #[must_use]
    pub fn add(self, rhs: Self) -> Self {
        Self::Add(Box::new(self), Box::new(rhs))
    }

    #[must_use]
    pub fn subtract(self, rhs: Self) -> Self {
        Self::Subtract(Box::new(self), Box::new(rhs))
    }

    #[must_use]
    pub fn modulo(self, rhs: Self) -> Self {
        Self::Mod(Box::new(self), Box::new(rhs))
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Field(p) => json!(format!("${p}")),
            Self::Literal(v) => v.clone().into_relaxed_extjson(),
            Self::Add(a, b) => json!({ "$add": [a.to_json(), b.to_json()] }),
            Self::Subtract(a, b) => json!({ "$subtract": [a.to_json(), b.to_json()] }),
            Self::Mod(a, b) => json!({ "$mod": [a.to_json(), b.to_json()] }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum(Expr),
    Avg(Expr),
}

impl Accumulator {
    /// `{$sum: 1}`
    #[must_use]
    pub fn count() -> Self {
        Self::Sum(Expr::literal(1_i32))
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Sum(e) => json!({ "$sum": e.to_json() }),
            Self::Avg(e) => json!({ "$avg": e.to_json() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    /// Groups by `id`; each output row is `{_id: key, name: accumulated, ..}`.
    Group { id: Expr, fields: Vec<(String, Accumulator)> },
    /// Computes the listed fields; `_id` is carried through.
    Project(Vec<(String, Expr)>),
    Sort(Vec<SortSpec>),
    Limit(usize),
}

impl Stage {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Match(f) => json!({ "$match": f.to_json() }),
            Self::Group { id, fields } => {
                let mut body = serde_json::Map::new();
                body.insert("_id".into(), id.to_json());
                for (name, acc) in fields {
                    body.insert(name.clone(), acc.to_json());
                }
                json!({ "$group": body })
            }
            Self::Project(fields) => {
                let body: serde_json::Map<String, Value> =
                    fields.iter().map(|(n, e)| (n.clone(), e.to_json())).collect();
                json!({ "$project": body })
            }
            Self::Sort(specs) => {
                let body: serde_json::Map<String, Value> =
                    specs.iter().map(|s| (s.field.clone(), json!(s.order.as_i32()))).collect();
                json!({ "$sort": body })
            }
            Self::Limit(n) => json!({ "$limit": n }),
        }
    }
}

/// Renders a whole pipeline as the JSON array a shell user would type.
#[must_use]
pub fn pipeline_json(stages: &[Stage]) -> Value {
    Value::Array(stages.iter().map(Stage::to_json).collect())
}
