use super::_support::{catalog_service, service_with_config};
use bookstore::config::ServiceConfig;
use bookstore::{AuthorCount, Book, DecadeCount};
use bson::doc;

#[test]
fn genre_report_over_catalog() {
    let (svc, _) = catalog_service();
    let stats = svc.average_price_by_genre().unwrap();
    let order: Vec<(&str, u64)> = stats.iter().map(|s| (s.genre.as_str(), s.count)).collect();
    assert_eq!(order, vec![
        ("Fiction", 4),
        ("Dystopian", 2),
        ("Fantasy", 2),
        ("Adventure", 1),
        ("Gothic Fiction", 1),
        ("Political Satire", 1),
        ("Romance", 1),
    ]);
    let fiction = stats[0].average_price.unwrap();
    assert!((fiction - 10.74).abs() < 1e-9, "got {fiction}");
    let fantasy = stats[2].average_price.unwrap();
    assert!((fantasy - 17.49).abs() < 1e-9, "got {fantasy}");
}

#[test]
fn top_author_over_catalog() {
    let (svc, _) = catalog_service();
    let top = svc.author_with_most_books().unwrap();
    assert_eq!(top, Some(AuthorCount { author: "George Orwell".into(), count: 2 }));
    svc.insert_one(&Book::new("Unfinished Tales", "J.R.R. Tolkien", "Fantasy", 1980, 16.0, true)).unwrap();
    assert_eq!(svc.author_with_most_books().unwrap().map(|a| a.author), Some("J.R.R. Tolkien".to_string()));
}

#[test]
fn decades_over_catalog() {
    let (svc, _) = catalog_service();
    let got: Vec<(i32, u64)> = svc.count_by_decade().unwrap().into_iter().map(|d| (d.decade, d.count)).collect();
    assert_eq!(got, vec![
        (1810, 1),
        (1840, 1),
        (1850, 1),
        (1920, 1),
        (1930, 2),
        (1940, 2),
        (1950, 2),
        (1960, 1),
        (1980, 1),
    ]);
}

#[test]
fn decades_skip_books_without_a_year() {
    let cfg = ServiceConfig { validate_on_write: false, ..ServiceConfig::default() };
    let (svc, _) = service_with_config(cfg);
    svc.insert_documents(vec![
        doc! {"title": "Undated", "author": "Anon", "genre": "Poetry", "price": 3.0, "in_stock": true},
        doc! {"title": "Dated", "author": "Anon", "genre": "Poetry", "published_year": 1999, "price": 3.0, "in_stock": true},
    ])
    .unwrap();
    assert_eq!(svc.count_by_decade().unwrap(), vec![DecadeCount { decade: 1990, count: 1 }]);
}

#[test]
fn reports_on_empty_collection() {
    let cfg = ServiceConfig::default();
    let (svc, _) = service_with_config(cfg);
    assert!(svc.average_price_by_genre().unwrap().is_empty());
    assert_eq!(svc.author_with_most_books().unwrap(), None);
    assert!(svc.count_by_decade().unwrap().is_empty());
}

#[test]
fn decades_skip_null_and_mistyped_years() {
    let cfg = ServiceConfig { validate_on_write: false, ..ServiceConfig::default() };
    let (svc, _) = service_with_config(cfg);
    svc.insert_documents(vec![
        doc! {"title": "Dated", "author": "Anon", "genre": "Poetry", "published_year": 1951, "price": 3.0, "in_stock": true},
        doc! {"title": "Null year", "author": "Anon", "genre": "Poetry", "published_year": bson::Bson::Null, "price": 3.0, "in_stock": true},
        doc! {"title": "Text year", "author": "Anon", "genre": "Poetry", "published_year": "1960", "price": 3.0, "in_stock": true},
    ])
    .unwrap();
    assert_eq!(svc.count_by_decade().unwrap(), vec![DecadeCount { decade: 1950, count: 1 }]);
}
