use crate::types::{DocumentId, ID_FIELD};
use bson::{Bson, Document as BsonDocument};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Metadata {
    pub fn new() -> Self {
        let now = Utc::now();
        Self { created_at: now, updated_at: now }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A stored document: identity, field data and bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: BsonDocument,
    pub metadata: Metadata,
}

impl Document {
    /// Wraps `data` with a freshly assigned id. A caller-supplied `_id` key is dropped;
    /// identity is always store-assigned.
    pub fn new(mut data: BsonDocument) -> Self {
        data.remove(ID_FIELD);
        Self { id: DocumentId::new(), data, metadata: Metadata::new() }
    }

    pub fn update(&mut self, new_data: BsonDocument) {
        self.data = new_data;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.metadata.updated_at = Utc::now();
    }

    /// The document as exposed to callers: `_id` first, then the data fields.
    #[must_use]
    pub fn to_bson(&self) -> BsonDocument {
        let mut out = BsonDocument::new();
        out.insert(ID_FIELD, Bson::String(self.id.to_string()));
        for (k, v) in &self.data {
            out.insert(k.clone(), v.clone());
        }
        out
    }
}
