use bookstore::config::ServiceConfig;
use bookstore::store::MemoryCollection;
use bookstore::{Book, BookstoreService};
use std::sync::Arc;

pub fn empty_service() -> (BookstoreService, MemoryCollection) {
    service_with_config(ServiceConfig::default())
}

pub fn service_with_config(cfg: ServiceConfig) -> (BookstoreService, MemoryCollection) {
    let col = MemoryCollection::new("books");
    (BookstoreService::new(Arc::new(col.clone()), cfg), col)
}

/// A service loaded with the bundled catalog.
pub fn catalog_service() -> (BookstoreService, MemoryCollection) {
    let (svc, col) = empty_service();
    svc.insert_many(bookstore::sample::sample_books().unwrap()).unwrap();
    (svc, col)
}

pub fn titles(books: impl IntoIterator<Item = bookstore::errors::Result<Book>>) -> Vec<String> {
    books.into_iter().map(|b| b.unwrap().title).collect()
}

/// `n` Fiction books titled `b00000`, `b00001`, ... priced by index.
pub fn bulk_service(n: usize) -> BookstoreService {
    let (svc, _) = empty_service();
    let books = (0..n)
        .map(|i| Book::new(format!("b{i:05}"), "Bulk Author", "Fiction", 2000, (i % 100) as f64, true))
        .collect();
    svc.insert_many(books).unwrap();
    svc
}
