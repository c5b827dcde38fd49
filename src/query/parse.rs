use crate::errors::StoreError;
use bson::Bson;
use serde::{Deserialize, Serialize};

use super::types::{CmpOp, Filter, MAX_IN_SET};

// Serde-facing structures for safe JSON parsing of filters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterSerde {
    And {
        #[serde(rename = "$and")]
        and: Vec<FilterSerde>,
    },
    Or {
        #[serde(rename = "$or")]
        or: Vec<FilterSerde>,
    },
    Not {
        #[serde(rename = "$not")]
        not: Box<FilterSerde>,
    },
    Exists {
        field: String,
        #[serde(rename = "$exists")]
        exists: bool,
    },
    In {
        field: String,
        #[serde(rename = "$in")]
        in_vals: Vec<Bson>,
    },
    Nin {
        field: String,
        #[serde(rename = "$nin")]
        nin_vals: Vec<Bson>,
    },
    Cmp {
        field: String,
        #[serde(default, rename = "$eq")]
        eq: Option<Bson>,
        #[serde(default, rename = "$gt")]
        gt: Option<Bson>,
        #[serde(default, rename = "$gte")]
        gte: Option<Bson>,
        #[serde(default, rename = "$lt")]
        lt: Option<Bson>,
        #[serde(default, rename = "$lte")]
        lte: Option<Bson>,
    },
    True(bool),
}

impl TryFrom<FilterSerde> for Filter {
    type Error = StoreError;
    fn try_from(fs: FilterSerde) -> Result<Self, Self::Error> {
        use FilterSerde as FS;
        Ok(match fs {
            FS::And { and } => {
                Self::And(and.into_iter().map(Self::try_from).collect::<Result<_, _>>()?)
            }
            FS::Or { or } => Self::Or(or.into_iter().map(Self::try_from).collect::<Result<_, _>>()?),
            FS::Not { not } => Self::Not(Box::new(Self::try_from(*not)?)),
            FS::Exists { field, exists } => Self::Exists { path: field, exists },
            FS::In { field, in_vals } => Self::In { path: field, values: bounded_set("$in", in_vals)? },
            FS::Nin { field, nin_vals } => Self::Nin { path: field, values: bounded_set("$nin", nin_vals)? },
            FS::Cmp { field, eq, gt, gte, lt, lte } => {
                let mut cmps: Vec<Self> =
                    [(CmpOp::Eq, eq), (CmpOp::Gt, gt), (CmpOp::Gte, gte), (CmpOp::Lt, lt), (CmpOp::Lte, lte)]
                        .into_iter()
                        .filter_map(|(op, v)| v.map(|value| Self::Cmp { path: field.clone(), op, value }))
                        .collect();
                // Several operators on one field mean all of them, e.g. `$gt` with `$lt`.
                match cmps.len() {
                    0 => return Err(StoreError::QueryError("No comparison operator provided".into())),
                    1 => cmps.remove(0),
                    _ => Self::And(cmps),
                }
            }
            FS::True(b) => {
                if b {
                    Self::True
                } else {
                    Self::Not(Box::new(Self::True))
                }
            }
        })
    }
}

fn bounded_set(op: &str, values: Vec<Bson>) -> Result<Vec<Bson>, StoreError> {
    if values.len() > MAX_IN_SET {
        return Err(StoreError::QueryError(format!(
            "{op} lists {} values; at most {MAX_IN_SET} are allowed",
            values.len()
        )));
    }
    Ok(values)
}

/// # Errors
/// Returns an error if the JSON string cannot be parsed into a filter structure.
pub fn parse_filter_json(json: &str) -> Result<Filter, StoreError> {
    let fs: FilterSerde = serde_json::from_str(json)?;
    Filter::try_from(fs)
}
