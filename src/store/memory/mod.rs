//! In-memory document store: insertion-ordered collections with compound B-tree indexes.

mod aggregate;
mod collection;
mod exec;
mod index;

pub use collection::MemoryCollection;
pub use index::{BTreeIndex, IndexKeyKind, IndexManager, IndexStats};

use super::DocumentStore;
use crate::document::Document;
use crate::errors::StoreError;
use crate::index::{ExplainStats, ID_INDEX_NAME, IndexDescriptor, IndexSpec};
use crate::types::ID_FIELD;
use crate::pipeline::Stage;
use crate::query::{Cursor, DeleteReport, Filter, FindOptions, InsertManyReport, UpdateDoc, UpdateReport};
use bson::Document as BsonDocument;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A set of named in-memory collections.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_collection(&self, name: &str) -> Result<MemoryCollection, StoreError> {
        let mut cols = self.collections.write();
        if cols.contains_key(name) {
            return Err(StoreError::CollectionAlreadyExists(name.to_string()));
        }
        let col = MemoryCollection::new(name);
        cols.insert(name.to_string(), col.clone());
        log::info!(target: "bookstore::store", "created collection {name}");
        Ok(col)
    }

    pub fn collection(&self, name: &str) -> Result<MemoryCollection, StoreError> {
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchCollection(name.to_string()))
    }

    pub fn get_or_create_collection(&self, name: &str) -> MemoryCollection {
        self.collections.write().entry(name.to_string()).or_insert_with(|| MemoryCollection::new(name)).clone()
    }

    pub fn drop_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl DocumentStore for MemoryCollection {
    fn name(&self) -> String {
        self.name_str().to_string()
    }

    /// All-or-nothing: the batch is committed under one write guard and cannot fail mid-batch.
    fn insert_many(&self, docs: Vec<BsonDocument>) -> Result<InsertManyReport, StoreError> {
        let staged: Vec<Document> = docs.into_iter().map(Document::new).collect();
        Ok(InsertManyReport { inserted_ids: self.insert_documents(staged) })
    }

    fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Cursor, StoreError> {
        Ok(exec::find_docs(self, filter, opts))
    }

    fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        Ok(exec::count_docs(self, filter))
    }

    fn update_one(&self, filter: &Filter, update: &UpdateDoc) -> Result<UpdateReport, StoreError> {
        if update.is_empty() {
            return Err(StoreError::QueryError("update document is empty".into()));
        }
        Ok(exec::update_one(self, filter, update))
    }

    fn delete_one(&self, filter: &Filter) -> Result<DeleteReport, StoreError> {
        Ok(exec::delete_one(self, filter))
    }

    fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<BsonDocument>, StoreError> {
        aggregate::aggregate(self, pipeline)
    }

    fn create_index(&self, spec: &IndexSpec) -> Result<String, StoreError> {
        if spec.keys.is_empty() {
            return Err(StoreError::IndexError("index needs at least one key".into()));
        }
        if spec.is_id() {
            return Ok(ID_INDEX_NAME.to_string());
        }
        let mut st = self.state().write();
        let st = &mut *st;
        let rows: Vec<_> = st.docs.iter().map(|(id, d)| (id.clone(), d.to_bson())).collect();
        let (name, built) = st.indexes.create_index(spec, rows.iter().map(|(id, d)| (id, d)));
        if built {
            log::info!(target: "bookstore::store", "built index {name} on {} over {} documents", self.name_str(), rows.len());
        }
        Ok(name)
    }

    /// The implicit `_id_` index first, then created indexes in creation order.
    fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, StoreError> {
        let st = self.state().read();
        let implicit =
            IndexDescriptor { name: ID_INDEX_NAME.to_string(), spec: IndexSpec::asc(ID_FIELD), keys: st.docs.len() };
        Ok(std::iter::once(implicit).chain(st.indexes.descriptors()).collect())
    }

    fn explain(&self, filter: &Filter) -> Result<ExplainStats, StoreError> {
        Ok(exec::explain(self, filter))
    }
}
