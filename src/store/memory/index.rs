use crate::index::{IndexDescriptor, IndexSpec};
use crate::query::{CmpOp, get_path};
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::mem::discriminant;

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub keys: usize,
    pub entries: usize,
    pub build_time_ms: u128,
}

/// One component of an index key. Missing and unsupported values index as `Null`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexKeyKind {
    Null,
    Bool(bool),
    Num(OrderedFloat<f64>),
    Str(String),
}

/// The key a query value probes with; `None` when the value cannot be served by an index.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn key_from_bson(v: &Bson) -> Option<IndexKeyKind> {
    match v {
        Bson::Null => Some(IndexKeyKind::Null),
        Bson::String(s) => Some(IndexKeyKind::Str(s.clone())),
        Bson::Int32(i) => Some(IndexKeyKind::Num(OrderedFloat(f64::from(*i)))),
        Bson::Int64(i) => Some(IndexKeyKind::Num(OrderedFloat(*i as f64))),
        Bson::Double(f) => Some(IndexKeyKind::Num(OrderedFloat(*f))),
        Bson::Boolean(b) => Some(IndexKeyKind::Bool(*b)),
        _ => None,
    }
}

type CompoundKey = Vec<IndexKeyKind>;

/// Candidate ids produced by an index scan.
#[derive(Debug, Default)]
pub struct Scan {
    pub ids: Vec<DocumentId>,
    pub keys_examined: u64,
}

#[derive(Debug, Clone)]
pub struct BTreeIndex {
    pub spec: IndexSpec,
    pub map: BTreeMap<CompoundKey, BTreeSet<DocumentId>>,
    pub stats: IndexStats,
}

impl BTreeIndex {
    #[must_use]
    pub fn new(spec: IndexSpec) -> Self {
        Self { spec, map: BTreeMap::new(), stats: IndexStats::default() }
    }

    fn key_for(&self, doc: &BsonDocument) -> CompoundKey {
        self.spec
            .keys
            .iter()
            .map(|(field, _)| get_path(doc, field).and_then(key_from_bson).unwrap_or(IndexKeyKind::Null))
            .collect()
    }

    pub fn insert(&mut self, doc: &BsonDocument, id: &DocumentId) {
        let set = self.map.entry(self.key_for(doc)).or_default();
        if set.insert(id.clone()) {
            self.stats.entries += 1;
        }
        self.stats.keys = self.map.len();
    }

    pub fn remove(&mut self, doc: &BsonDocument, id: &DocumentId) {
        let k = self.key_for(doc);
        if let Some(set) = self.map.get_mut(&k) {
            if set.remove(id) {
                self.stats.entries = self.stats.entries.saturating_sub(1);
            }
            if set.is_empty() {
                self.map.remove(&k);
            }
            self.stats.keys = self.map.len();
        }
    }

    /// Every entry whose leading components equal `prefix`.
    #[must_use]
    pub fn lookup_prefix(&self, prefix: &[IndexKeyKind]) -> Scan {
        let mut scan = Scan::default();
        for (k, set) in self.map.range(prefix.to_vec()..) {
            if !k.starts_with(prefix) {
                break;
            }
            scan.keys_examined += set.len() as u64;
            scan.ids.extend(set.iter().cloned());
        }
        scan
    }

    /// Entries whose leading component satisfies `op bound`, within the bound's type bracket.
    #[must_use]
    pub fn lookup_leading_range(&self, op: CmpOp, bound: &IndexKeyKind) -> Scan {
        if op == CmpOp::Eq {
            return self.lookup_prefix(std::slice::from_ref(bound));
        }
        let mut scan = Scan::default();
        let ascending_from_bound = matches!(op, CmpOp::Gt | CmpOp::Gte);
        let iter: Box<dyn Iterator<Item = (&CompoundKey, &BTreeSet<DocumentId>)>> = if ascending_from_bound {
            Box::new(self.map.range(vec![bound.clone()]..))
        } else {
            Box::new(self.map.iter())
        };
        for (k, set) in iter {
            let Some(lead) = k.first() else { continue };
            if discriminant(lead) != discriminant(bound) {
                if ascending_from_bound {
                    break;
                }
                continue;
            }
            let ord = lead.cmp(bound);
            let keep = match op {
                CmpOp::Gt => ord == Ordering::Greater,
                CmpOp::Gte => true,
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Lte => ord != Ordering::Greater,
                CmpOp::Eq => ord == Ordering::Equal,
            };
            if !keep {
                if ascending_from_bound {
                    continue;
                }
                break;
            }
            scan.keys_examined += set.len() as u64;
            scan.ids.extend(set.iter().cloned());
        }
        scan
    }
}

/// Index set of one collection, keyed by index name in creation order.
#[derive(Debug, Default)]
pub struct IndexManager {
    pub indexes: IndexMap<String, BTreeIndex>,
}

impl IndexManager {
    #[must_use]
    pub fn new() -> Self {
        Self { indexes: IndexMap::new() }
    }

    /// Creates and backfills the index unless one with the same name exists.
    /// Returns the name and whether anything was built.
    pub fn create_index<'a>(
        &mut self,
        spec: &IndexSpec,
        docs: impl Iterator<Item = (&'a DocumentId, &'a BsonDocument)>,
    ) -> (String, bool) {
        let name = spec.name();
        if self.indexes.contains_key(&name) {
            return (name, false);
        }
        let start = std::time::Instant::now();
        let mut idx = BTreeIndex::new(spec.clone());
        for (id, doc) in docs {
            idx.insert(doc, id);
        }
        idx.stats.build_time_ms = start.elapsed().as_millis();
        self.indexes.insert(name.clone(), idx);
        (name, true)
    }

    pub fn drop_index(&mut self, name: &str) -> bool {
        self.indexes.shift_remove(name).is_some()
    }

    #[must_use]
    pub fn descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes
            .iter()
            .map(|(name, idx)| IndexDescriptor { name: name.clone(), spec: idx.spec.clone(), keys: idx.stats.keys })
            .collect()
    }

    pub fn insert_all(&mut self, doc: &BsonDocument, id: &DocumentId) {
        for idx in self.indexes.values_mut() {
            idx.insert(doc, id);
        }
    }

    pub fn remove_all(&mut self, doc: &BsonDocument, id: &DocumentId) {
        for idx in self.indexes.values_mut() {
            idx.remove(doc, id);
        }
    }
}
