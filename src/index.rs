//! Index specifications, descriptors and explain statistics shared by every store.

use crate::errors::ServiceError;
use crate::query::Order;
use crate::types::ID_FIELD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the implicit unique index every collection has on `_id`.
pub const ID_INDEX_NAME: &str = "_id_";

/// Ordered index keys, e.g. `{author: 1, published_year: -1}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    pub keys: Vec<(String, Order)>,
}

impl IndexSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { keys: vec![(field.into(), Order::Asc)] }
    }

    #[must_use]
    pub fn then(mut self, field: impl Into<String>, order: Order) -> Self {
        self.keys.push((field.into(), order));
        self
    }

    /// The conventional name: `field_dir` pairs joined by `_` (`author_1_published_year_-1`).
    #[must_use]
    pub fn name(&self) -> String {
        if self.is_id() {
            return ID_INDEX_NAME.to_string();
        }
        self.keys
            .iter()
            .map(|(f, o)| format!("{f}_{}", o.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Whether this is the `{_id: 1}` spec of the implicit index.
    #[must_use]
    pub fn is_id(&self) -> bool {
        matches!(self.keys.as_slice(), [(f, Order::Asc)] if f == ID_FIELD)
    }

    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.keys.iter().map(|(f, _)| f.as_str()).collect()
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.keys.iter().map(|(k, o)| format!("{k}: {}", o.as_i32())).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Parses `title:1` or `author:1,published_year:-1`. A bare field means ascending.
impl FromStr for IndexSpec {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut keys = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, dir) = part.split_once(':').unwrap_or((part, "1"));
            let field = field.trim();
            if field.is_empty() {
                return Err(ServiceError::invalid(format!("empty field in index spec `{s}`")));
            }
            let order = match dir.trim() {
                "1" => Order::Asc,
                "-1" => Order::Desc,
                other => {
                    return Err(ServiceError::invalid(format!(
                        "index direction must be 1 or -1, got `{other}`"
                    )));
                }
            };
            keys.push((field.to_string(), order));
        }
        if keys.is_empty() {
            return Err(ServiceError::invalid("index spec has no fields"));
        }
        Ok(Self { keys })
    }
}

/// A defined index as reported by `list_indexes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub spec: IndexSpec,
    /// Number of distinct keys currently held.
    pub keys: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage")]
pub enum PlanStage {
    #[serde(rename = "COLLSCAN")]
    CollScan,
    #[serde(rename = "IXSCAN")]
    IxScan { index_name: String },
}

impl fmt::Display for PlanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollScan => f.write_str("COLLSCAN"),
            Self::IxScan { index_name } => write!(f, "IXSCAN({index_name})"),
        }
    }
}

/// Execution statistics reported by a store for one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainStats {
    pub plan: PlanStage,
    pub n_returned: u64,
    pub total_keys_examined: u64,
    pub total_docs_examined: u64,
    pub execution_time_millis: u64,
}

impl ExplainStats {
    #[must_use]
    pub const fn used_index(&self) -> bool {
        matches!(self.plan, PlanStage::IxScan { .. })
    }
}
