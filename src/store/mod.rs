//! The collection-handle boundary the bookstore service talks to.

pub mod memory;

use crate::errors::StoreError;
use crate::index::{ExplainStats, IndexDescriptor, IndexSpec};
use crate::pipeline::Stage;
use crate::query::{Cursor, DeleteReport, Filter, FindOptions, InsertManyReport, UpdateDoc, UpdateReport};
use bson::Document as BsonDocument;

pub use memory::{MemoryCollection, MemoryDatabase};

/// A handle to one already-connected document collection.
///
/// Implementations own connection setup, timeouts and retries; callers only issue requests.
/// The service never closes a handle it was given.
pub trait DocumentStore: Send + Sync {
    /// Collection name, used for logging and error context.
    fn name(&self) -> String;

    /// Inserts `docs` in order and returns their assigned ids. Whether a failed batch leaves
    /// earlier documents committed is up to the store.
    fn insert_many(&self, docs: Vec<BsonDocument>) -> Result<InsertManyReport, StoreError>;

    /// Matching documents with `_id` exposed, shaped by `opts`.
    fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Cursor, StoreError>;

    fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Applies `update` to the first match, if any.
    fn update_one(&self, filter: &Filter, update: &UpdateDoc) -> Result<UpdateReport, StoreError>;

    /// Removes the first match, if any.
    fn delete_one(&self, filter: &Filter) -> Result<DeleteReport, StoreError>;

    fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<BsonDocument>, StoreError>;

    /// Creates the index if it does not exist and returns its name. Creating an index that
    /// already exists succeeds without changing anything.
    fn create_index(&self, spec: &IndexSpec) -> Result<String, StoreError>;

    fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, StoreError>;

    /// Runs `filter` and reports how it was executed.
    fn explain(&self, filter: &Filter) -> Result<ExplainStats, StoreError>;
}
