use super::_support::{bulk_service, catalog_service, empty_service, service_with_config, titles};
use bookstore::config::ServiceConfig;
use bookstore::{Book, BookUpdate, ServiceError, UpdateOutcome};
use bson::doc;

#[test]
fn inserted_books_are_found_by_their_fields() {
    let (svc, _) = empty_service();
    let books = vec![
        Book::new("Kindred", "Octavia E. Butler", "Science Fiction", 1979, 11.0, true),
        Book::new("Beloved", "Toni Morrison", "Fiction", 1987, 13.5, false),
    ];
    let out = svc.insert_many(books.clone()).unwrap();
    assert_eq!(out.inserted, 2);
    assert_eq!(out.ids.len(), 2);
    for (book, id) in books.iter().zip(&out.ids) {
        let by_genre: Vec<Book> = svc.find_by_genre(&book.genre).unwrap().map(Result::unwrap).collect();
        assert!(by_genre.iter().any(|b| b.id.as_ref() == Some(id) && b.title == book.title));
        let by_author: Vec<Book> = svc.find_by_author(&book.author).unwrap().map(Result::unwrap).collect();
        assert!(by_author.iter().any(|b| b.id.as_ref() == Some(id)));
    }
}

#[test]
fn three_book_scenario() {
    let (svc, _) = empty_service();
    svc.insert_many(vec![
        Book::new("A", "x", "Fiction", 2001, 1.0, true),
        Book::new("B", "y", "Fiction", 2002, 2.0, true),
        Book::new("C", "z", "Sci-Fi", 2003, 3.0, true),
    ])
    .unwrap();
    assert_eq!(svc.find_by_genre("Fiction").unwrap().count(), 2);
    assert!(svc.delete_one("A").unwrap());
    assert_eq!(titles(svc.find_by_genre("Fiction").unwrap()), vec!["B"]);
}

#[test]
fn published_after_is_strict_and_in_insertion_order() {
    let (svc, _) = catalog_service();
    assert_eq!(
        titles(svc.find_published_after(1950).unwrap()),
        vec!["To Kill a Mockingbird", "The Catcher in the Rye", "The Lord of the Rings", "The Alchemist"]
    );
    assert!(titles(svc.find_published_after(1988).unwrap()).is_empty());
}

#[test]
fn update_of_missing_title_changes_nothing() {
    let (svc, col) = catalog_service();
    let before: Vec<_> = col.get_all_documents().into_iter().map(|d| d.data).collect();
    let out = svc.update_field("No Such Book", &BookUpdate::new().price(1.0)).unwrap();
    assert_eq!(out, UpdateOutcome::NotFound);
    assert!(!out.matched());
    let after: Vec<_> = col.get_all_documents().into_iter().map(|d| d.data).collect();
    assert_eq!(before, after);
}

#[test]
fn update_sets_only_named_fields() {
    let (svc, _) = catalog_service();
    let out = svc.update_field("Wuthering Heights", &BookUpdate::new().price(12.5)).unwrap();
    assert!(out.modified());
    let book = svc.find_by_title("Wuthering Heights").unwrap().next().unwrap().unwrap();
    assert!((book.price - 12.5).abs() < f64::EPSILON);
    assert_eq!(book.author, "Emily Brontë");
    assert_eq!(book.published_year, 1847);
}

#[test]
fn update_rejects_bad_values_when_validating() {
    let (svc, _) = catalog_service();
    let err = svc.update_field("1984", &BookUpdate::new().price(-3.0)).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[test]
fn delete_twice_then_not_found() {
    let (svc, _) = catalog_service();
    assert!(svc.delete_one("Moby Dick").unwrap());
    assert!(!svc.delete_one("Moby Dick").unwrap());
    assert_eq!(svc.count().unwrap(), 11);
}

#[test]
fn insert_one_assigns_an_id() {
    let (svc, _) = empty_service();
    let id = svc.insert_one(&Book::new("Emma", "Jane Austen", "Romance", 1815, 6.5, true)).unwrap();
    let found = svc.find_by_title("Emma").unwrap().next().unwrap().unwrap();
    assert_eq!(found.id, Some(id));
}

#[test]
fn cursor_reads_lazily() {
    let (svc, _) = catalog_service();
    let fiction = svc.find_by_genre("Fiction").unwrap();
    assert!(svc.delete_one("The Great Gatsby").unwrap());
    assert_eq!(titles(fiction), vec!["To Kill a Mockingbird", "The Catcher in the Rye", "The Alchemist"]);
}

#[test]
fn validation_rejects_missing_genre_when_enabled() {
    let (svc, _) = empty_service();
    let raw = doc! {"title": "Untitled", "author": "Anon", "published_year": 2000, "price": 1.0, "in_stock": true};
    let err = svc.insert_documents(vec![raw]).unwrap_err();
    match err {
        ServiceError::Validation { index, field, .. } => {
            assert_eq!(index, 0);
            assert_eq!(field, "genre");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(svc.count().unwrap(), 0);
}

#[test]
fn without_validation_records_reach_the_store_and_decode_per_item() {
    let cfg = ServiceConfig { validate_on_write: false, ..ServiceConfig::default() };
    let (svc, _) = service_with_config(cfg);
    let good = Book::new("Emma", "Anon", "Romance", 1815, 6.5, true).to_document();
    let raw = doc! {"title": "Untitled", "author": "Anon", "published_year": 2000, "price": 1.0, "in_stock": true};
    let out = svc.insert_documents(vec![raw, good]).unwrap();
    assert_eq!(out.inserted, 2);
    let items: Vec<_> = svc.find_by_author("Anon").unwrap().collect();
    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], Err(ServiceError::Decode { ref reason, .. }) if reason.contains("genre")));
    assert_eq!(items[1].as_ref().unwrap().title, "Emma");
}

#[test]
fn unbounded_finds_return_every_match() {
    let svc = bulk_service(10_005);
    assert_eq!(svc.find_by_genre("Fiction").unwrap().count(), 10_005);
    assert_eq!(svc.find_by_author("Bulk Author").unwrap().count(), 10_005);
    assert_eq!(svc.find_published_after(1999).unwrap().count(), 10_005);
}
