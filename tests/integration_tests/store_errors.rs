use bookstore::index::{ExplainStats, IndexDescriptor};
use bookstore::pipeline::Stage;
use bookstore::query::{Cursor, DeleteReport, Filter, FindOptions, InsertManyReport, UpdateDoc, UpdateReport};
use bookstore::store::DocumentStore;
use bookstore::{Book, BookUpdate, BookstoreService, IndexSpec, ListQuery, ServiceError, StoreError};
use bson::Document as BsonDocument;
use std::error::Error as _;
use std::sync::Arc;

/// A collection whose connection is gone: every request fails.
struct Unreachable;

fn down() -> StoreError {
    StoreError::Unavailable("connection reset".into())
}

impl DocumentStore for Unreachable {
    fn name(&self) -> String {
        "books".into()
    }
    fn insert_many(&self, _: Vec<BsonDocument>) -> Result<InsertManyReport, StoreError> {
        Err(down())
    }
    fn find(&self, _: &Filter, _: &FindOptions) -> Result<Cursor, StoreError> {
        Err(down())
    }
    fn count(&self, _: &Filter) -> Result<u64, StoreError> {
        Err(down())
    }
    fn update_one(&self, _: &Filter, _: &UpdateDoc) -> Result<UpdateReport, StoreError> {
        Err(down())
    }
    fn delete_one(&self, _: &Filter) -> Result<DeleteReport, StoreError> {
        Err(down())
    }
    fn aggregate(&self, _: &[Stage]) -> Result<Vec<BsonDocument>, StoreError> {
        Err(down())
    }
    fn create_index(&self, _: &IndexSpec) -> Result<String, StoreError> {
        Err(down())
    }
    fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, StoreError> {
        Err(down())
    }
    fn explain(&self, _: &Filter) -> Result<ExplainStats, StoreError> {
        Err(down())
    }
}

fn svc() -> BookstoreService {
    BookstoreService::with_defaults(Arc::new(Unreachable))
}

fn assert_store_error(err: ServiceError, op: &str, filter_mentions: &str) {
    match &err {
        ServiceError::Store { operation, filter, source } => {
            assert_eq!(*operation, op);
            assert!(filter.contains(filter_mentions), "filter context `{filter}` lacks `{filter_mentions}`");
            assert!(matches!(source, StoreError::Unavailable(_)));
        }
        other => panic!("expected a store error, got {other:?}"),
    }
    let cause = err.source().expect("store errors keep their cause");
    assert!(cause.to_string().contains("connection reset"));
    assert!(err.store_source().is_some());
}

#[test]
fn lookups_carry_operation_and_filter() {
    assert_store_error(svc().find_by_genre("Fiction").unwrap_err(), "find_by_genre", "Fiction");
    assert_store_error(svc().find_by_author("George Orwell").unwrap_err(), "find_by_author", "George Orwell");
    assert_store_error(svc().find_published_after(1950).unwrap_err(), "find_published_after", "1950");
}

#[test]
fn writes_carry_context() {
    let book = Book::new("Dune", "Frank Herbert", "Science Fiction", 1965, 9.99, true);
    assert!(matches!(svc().insert_many(vec![book]).unwrap_err(), ServiceError::Store { operation: "insert_many", .. }));
    assert_store_error(svc().update_field("Dune", &BookUpdate::new().price(5.0)).unwrap_err(), "update_field", "Dune");
    assert_store_error(svc().delete_one("Dune").unwrap_err(), "delete_one", "Dune");
}

#[test]
fn validation_runs_before_the_store_is_contacted() {
    let bad = Book::new("", "Nobody", "Fiction", 2000, 1.0, true);
    assert!(matches!(svc().insert_many(vec![bad]).unwrap_err(), ServiceError::Validation { index: 0, .. }));
    assert!(matches!(svc().update_field("Dune", &BookUpdate::new()).unwrap_err(), ServiceError::InvalidArgument(_)));
    assert!(matches!(svc().list_catalog(&ListQuery::default().page(0)).unwrap_err(), ServiceError::InvalidArgument(_)));
}

#[test]
fn reports_and_indexes_surface_store_failures() {
    for err in [
        svc().average_price_by_genre().unwrap_err(),
        svc().author_with_most_books().unwrap_err(),
        svc().count_by_decade().unwrap_err(),
        svc().ensure_index(&IndexSpec::asc("title")).unwrap_err(),
        svc().list_indexes().unwrap_err(),
        svc().explain_performance(&Filter::eq("title", "Dune")).unwrap_err(),
    ] {
        assert!(matches!(err.store_source(), Some(StoreError::Unavailable(_))), "{err}");
    }
}
