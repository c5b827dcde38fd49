use crate::types::DocumentId;
use bson::Bson;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;
pub const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    /// The `1` / `-1` form used in index and sort specifications.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

/// Options for `find`.
///
/// Semantics:
/// - Sorting is applied first, then `skip`/`limit`, then projection.
/// - When `projection` is `Some(fields)`, returned documents contain only those fields;
///   `_id` is included only when listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindOptions {
    pub projection: Option<Vec<String>>,
    pub sort: Option<Vec<SortSpec>>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Exists { path: String, exists: bool },
    In { path: String, values: Vec<Bson> },
    Nin { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.into(), op: CmpOp::Eq, value: value.into() }
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.into(), op: CmpOp::Gt, value: value.into() }
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Self::Exists { path: path.into(), exists: true }
    }

    /// Conjunction of `filters`, flattening nested `And`s and dropping `True`.
    pub fn and(filters: impl IntoIterator<Item = Self>) -> Self {
        let mut out = Vec::new();
        for f in filters {
            match f {
                Self::True => {}
                Self::And(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Self::True,
            1 => out.remove(0),
            _ => Self::And(out),
        }
    }

    /// Renders the filter in the familiar `{field: {$op: value}}` JSON form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::True => json!({}),
            Self::And(fs) => json!({ "$and": fs.iter().map(Self::to_json).collect::<Vec<_>>() }),
            Self::Or(fs) => json!({ "$or": fs.iter().map(Self::to_json).collect::<Vec<_>>() }),
            Self::Not(f) => json!({ "$not": f.to_json() }),
            Self::Exists { path, exists } => json!({ path.as_str(): { "$exists": exists } }),
            Self::In { path, values } => json!({ path.as_str(): { "$in": to_json_values(values) } }),
            Self::Nin { path, values } => json!({ path.as_str(): { "$nin": to_json_values(values) } }),
            Self::Cmp { path, op, value } => {
                json!({ path.as_str(): { op.as_str(): value.clone().into_relaxed_extjson() } })
            }
        }
    }
}

fn to_json_values(values: &[Bson]) -> Vec<Value> {
    values.iter().map(|v| v.clone().into_relaxed_extjson()).collect()
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Field-level `$set` / `$unset` update.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateDoc {
    pub set: Vec<(String, Bson)>,
    pub unset: Vec<String>,
}

impl UpdateDoc {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InsertManyReport {
    pub inserted_ids: Vec<DocumentId>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: u64,
}
