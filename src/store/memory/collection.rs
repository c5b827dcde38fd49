use super::index::IndexManager;
use crate::document::Document;
use crate::types::DocumentId;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

pub(crate) struct State {
    /// Documents in natural (insertion) order.
    pub docs: IndexMap<DocumentId, Document>,
    pub indexes: IndexManager,
}

struct Inner {
    name: String,
    state: RwLock<State>,
}

/// An in-memory collection. Clones share the same documents and indexes.
#[derive(Clone)]
pub struct MemoryCollection {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCollection")
            .field("name", &self.inner.name)
            .field("len", &self.len())
            .finish()
    }
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                state: RwLock::new(State { docs: IndexMap::new(), indexes: IndexManager::new() }),
            }),
        }
    }

    pub fn name_str(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn state(&self) -> &RwLock<State> {
        &self.inner.state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.read().docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert_document(&self, document: Document) -> DocumentId {
        let mut st = self.inner.state.write();
        Self::insert_locked(&mut st, &self.inner.name, document)
    }

    /// Inserts `documents` under one write guard; readers see all of them or none.
    pub fn insert_documents(&self, documents: Vec<Document>) -> Vec<DocumentId> {
        let mut st = self.inner.state.write();
        documents.into_iter().map(|d| Self::insert_locked(&mut st, &self.inner.name, d)).collect()
    }

    fn insert_locked(st: &mut State, name: &str, document: Document) -> DocumentId {
        let doc_id = document.id.clone();
        st.indexes.insert_all(&document.to_bson(), &doc_id);
        st.docs.insert(doc_id.clone(), document);
        log::trace!(target: "bookstore::store", "insert {doc_id} into {name}");
        doc_id
    }

    pub fn find_document(&self, id: &DocumentId) -> Option<Document> {
        self.inner.state.read().docs.get(id).cloned()
    }

    /// Replaces the stored document, keeping its id and creation time.
    pub fn update_document(&self, id: &DocumentId, new_document: Document) -> bool {
        let mut st = self.inner.state.write();
        let Some(old) = st.docs.get(id).cloned() else { return false };
        let mut replacement = new_document;
        replacement.id = id.clone();
        replacement.metadata.created_at = old.metadata.created_at;
        st.indexes.remove_all(&old.to_bson(), id);
        st.indexes.insert_all(&replacement.to_bson(), id);
        st.docs.insert(id.clone(), replacement);
        true
    }

    pub fn delete_document(&self, id: &DocumentId) -> bool {
        let mut st = self.inner.state.write();
        let Some(old) = st.docs.shift_remove(id) else { return false };
        st.indexes.remove_all(&old.to_bson(), id);
        true
    }

    pub fn get_all_documents(&self) -> Vec<Document> {
        self.inner.state.read().docs.values().cloned().collect()
    }

    /// Return only the IDs of all documents without cloning each document.
    pub fn list_ids(&self) -> Vec<DocumentId> {
        self.inner.state.read().docs.keys().cloned().collect()
    }

    /// Reorders `ids` into natural order, dropping ids no longer present.
    pub fn natural_order(&self, ids: Vec<DocumentId>) -> Vec<DocumentId> {
        let st = self.inner.state.read();
        let mut positioned: Vec<(usize, DocumentId)> =
            ids.into_iter().filter_map(|id| st.docs.get_index_of(&id).map(|pos| (pos, id))).collect();
        positioned.sort_unstable_by_key(|(pos, _)| *pos);
        positioned.into_iter().map(|(_, id)| id).collect()
    }
}
