//! Bookstore query service.
//!
//! A typed layer over a document-store collection of books: lookups by genre, author and year,
//! field updates and deletes by title, projected and paginated listings, aggregate reports, and
//! index maintenance with query-plan inspection. The store is injected as an
//! [`Arc<dyn DocumentStore>`](store::DocumentStore); [`store::MemoryCollection`] is the bundled
//! in-memory implementation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use bookstore::{BookstoreService, sample, store::MemoryCollection};
//!
//! let svc = BookstoreService::with_defaults(Arc::new(MemoryCollection::new("books")));
//! svc.insert_many(sample::sample_books()?)?;
//! for book in svc.find_by_author("George Orwell")? {
//!     println!("{}", book?.title);
//! }
//! # Ok::<(), bookstore::errors::ServiceError>(())
//! ```

pub mod book;
pub mod config;
pub mod document;
pub mod errors;
pub mod index;
pub mod logger;
pub mod pipeline;
pub mod query;
pub mod sample;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

pub use book::{Book, BookField, BookId, BookUpdate, PartialBook};
pub use config::{BookstoreConfig, ServiceConfig};
pub use errors::{ConfigError, ServiceError, StoreError};
pub use index::{ExplainStats, IndexDescriptor, IndexSpec, PlanStage};
pub use service::{
    AuthorCount, BookCursor, BookstoreService, DecadeCount, GenreStats, InsertOutcome, ListQuery, Page,
    SortDirection, UpdateOutcome,
};
