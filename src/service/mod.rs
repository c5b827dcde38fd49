//! The bookstore query service: typed operations over an injected collection handle.

mod listing;
mod reports;

pub use listing::{ListQuery, Page, SortDirection};
pub use reports::{AuthorCount, DecadeCount, GenreStats};

use crate::book::{Book, BookField, BookId, BookUpdate, validate_document};
use crate::config::ServiceConfig;
use crate::errors::{Result, ServiceError, StoreError};
use crate::index::{ExplainStats, IndexDescriptor, IndexSpec};
use crate::oplog;
use crate::query::{Cursor, Filter, FindOptions};
use crate::store::DocumentStore;
use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Result of a batch or single insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub ids: Vec<BookId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// No book has the given title; nothing was written.
    NotFound,
    /// A book matched but already held the requested values.
    Unchanged,
    Modified,
}

impl UpdateOutcome {
    #[must_use]
    pub const fn matched(self) -> bool {
        !matches!(self, Self::NotFound)
    }

    #[must_use]
    pub const fn modified(self) -> bool {
        matches!(self, Self::Modified)
    }
}

/// Lazily decoded books. Each item is read from the store cursor on demand; a stored document
/// that is not a valid book yields an `Err` item and iteration continues.
#[derive(Debug)]
pub struct BookCursor {
    inner: Cursor,
}

impl BookCursor {
    /// Number of documents read so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.inner.position()
    }
}

impl Iterator for BookCursor {
    type Item = Result<Book>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.advance().map(|d| Book::from_document(&d))
    }
}

pub struct BookstoreService {
    store: Arc<dyn DocumentStore>,
    config: ServiceConfig,
}

impl std::fmt::Debug for BookstoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookstoreService")
            .field("collection", &self.store.name())
            .field("config", &self.config)
            .finish()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl BookstoreService {
    /// Wraps an already-connected collection handle. The service never closes it.
    pub fn new(store: Arc<dyn DocumentStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn with_defaults(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, ServiceConfig::default())
    }

    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[must_use]
    pub fn collection_name(&self) -> String {
        self.store.name()
    }

    // ---- writes ----

    /// Inserts `books` in order. Ids already set on the input are ignored.
    pub fn insert_many(&self, books: Vec<Book>) -> Result<InsertOutcome> {
        let docs = books.iter().map(Book::to_document).collect();
        self.insert_batch("insert_many", docs)
    }

    pub fn insert_one(&self, book: &Book) -> Result<BookId> {
        let out = self.insert_batch("insert_one", vec![book.to_document()])?;
        out.ids
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::store("insert_one", "{}", StoreError::QueryError("store returned no id".into())))
    }

    /// Inserts loosely-typed records. With validation enabled each must have the book shape.
    pub fn insert_documents(&self, docs: Vec<BsonDocument>) -> Result<InsertOutcome> {
        self.insert_batch("insert_documents", docs)
    }

    fn insert_batch(&self, op: &'static str, docs: Vec<BsonDocument>) -> Result<InsertOutcome> {
        let start = Instant::now();
        if self.config.validate_on_write {
            for (i, d) in docs.iter().enumerate() {
                validate_document(i, d)?;
            }
        }
        if docs.is_empty() {
            return Ok(InsertOutcome::default());
        }
        let requested = docs.len();
        let report = self.store.insert_many(docs).map_err(|e| ServiceError::store(op, "{}", e))?;
        let out = InsertOutcome { inserted: report.inserted_ids.len(), ids: report.inserted_ids };
        oplog!(op, "collection" => self.store.name(), "requested" => requested, "inserted" => out.inserted, "duration_ms" => elapsed_ms(start));
        Ok(out)
    }

    /// Sets the given fields on the first book titled `title`.
    pub fn update_field(&self, title: &str, update: &BookUpdate) -> Result<UpdateOutcome> {
        let start = Instant::now();
        if update.is_empty() {
            return Err(ServiceError::invalid("update sets no fields"));
        }
        if self.config.validate_on_write {
            update.validate()?;
        }
        let filter = Filter::eq(BookField::Title.as_str(), title);
        let report = self
            .store
            .update_one(&filter, &update.to_update_doc())
            .map_err(|e| ServiceError::store("update_field", filter.to_string(), e))?;
        let outcome = match (report.matched, report.modified) {
            (0, _) => UpdateOutcome::NotFound,
            (_, 0) => UpdateOutcome::Unchanged,
            _ => UpdateOutcome::Modified,
        };
        oplog!("update_field", "collection" => self.store.name(), "filter" => filter.to_json(), "outcome" => outcome, "duration_ms" => elapsed_ms(start));
        Ok(outcome)
    }

    /// Removes the first book titled `title`; `false` when there was none.
    pub fn delete_one(&self, title: &str) -> Result<bool> {
        let start = Instant::now();
        let filter = Filter::eq(BookField::Title.as_str(), title);
        let report =
            self.store.delete_one(&filter).map_err(|e| ServiceError::store("delete_one", filter.to_string(), e))?;
        oplog!("delete_one", "collection" => self.store.name(), "filter" => filter.to_json(), "deleted" => report.deleted, "duration_ms" => elapsed_ms(start));
        Ok(report.deleted > 0)
    }

    // ---- finds ----

    pub fn find_by_genre(&self, genre: &str) -> Result<BookCursor> {
        self.find_books("find_by_genre", &Filter::eq(BookField::Genre.as_str(), genre))
    }

    pub fn find_by_author(&self, author: &str) -> Result<BookCursor> {
        self.find_books("find_by_author", &Filter::eq(BookField::Author.as_str(), author))
    }

    /// Books published strictly after `year`.
    pub fn find_published_after(&self, year: i32) -> Result<BookCursor> {
        self.find_books("find_published_after", &Filter::gt(BookField::PublishedYear.as_str(), year))
    }

    pub fn find_by_title(&self, title: &str) -> Result<BookCursor> {
        self.find_books("find_by_title", &Filter::eq(BookField::Title.as_str(), title))
    }

    fn find_books(&self, op: &'static str, filter: &Filter) -> Result<BookCursor> {
        let inner = self
            .store
            .find(filter, &FindOptions::default())
            .map_err(|e| ServiceError::store(op, filter.to_string(), e))?;
        oplog!(op, "collection" => self.store.name(), "filter" => filter.to_json());
        Ok(BookCursor { inner })
    }

    /// Total number of books in the collection.
    pub fn count(&self) -> Result<u64> {
        self.store.count(&Filter::True).map_err(|e| ServiceError::store("count", "{}", e))
    }

    // ---- indexes ----

    /// Creates the index unless it already exists; returns its name either way.
    pub fn ensure_index(&self, spec: &IndexSpec) -> Result<String> {
        let start = Instant::now();
        if spec.keys.is_empty() {
            return Err(ServiceError::invalid("index spec has no fields"));
        }
        let name = self
            .store
            .create_index(spec)
            .map_err(|e| ServiceError::store("ensure_index", spec.to_string(), e))?;
        oplog!("ensure_index", "collection" => self.store.name(), "spec" => spec.to_string(), "index" => name.clone(), "duration_ms" => elapsed_ms(start));
        Ok(name)
    }

    /// Store-reported execution statistics for `filter`. Diagnostic only.
    pub fn explain_performance(&self, filter: &Filter) -> Result<ExplainStats> {
        let stats = self
            .store
            .explain(filter)
            .map_err(|e| ServiceError::store("explain_performance", filter.to_string(), e))?;
        log::info!(
            "explain collection={} filter={} plan={} returned={} keys_examined={} docs_examined={} millis={}",
            self.store.name(),
            filter,
            stats.plan,
            stats.n_returned,
            stats.total_keys_examined,
            stats.total_docs_examined,
            stats.execution_time_millis
        );
        oplog!("explain_performance", "collection" => self.store.name(), "filter" => filter.to_json(), "stats" => &stats);
        Ok(stats)
    }

    pub fn list_indexes(&self) -> Result<Vec<IndexDescriptor>> {
        self.store.list_indexes().map_err(|e| ServiceError::store("list_indexes", "{}", e))
    }
}
