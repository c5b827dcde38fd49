use super::_support::{bulk_service, catalog_service, empty_service};
use bookstore::{Book, BookField, ListQuery, ServiceError, SortDirection};

fn title_author_price() -> ListQuery {
    ListQuery::new([BookField::Title, BookField::Author, BookField::Price])
}

#[test]
fn in_stock_after_filters_projects_and_sorts() {
    let (svc, _) = empty_service();
    svc.insert_many(vec![
        Book::new("Circe", "Madeline Miller", "Fantasy", 2018, 15.0, true),
        Book::new("The Martian", "Andy Weir", "Sci-Fi", 2011, 9.0, true),
        Book::new("Gone Girl", "Gillian Flynn", "Thriller", 2012, 8.0, false),
        Book::new("The Road", "Cormac McCarthy", "Fiction", 2006, 7.0, true),
    ])
    .unwrap();
    let rows = svc.list_in_stock_after(2010, &title_author_price()).unwrap();
    let got: Vec<(&str, f64)> =
        rows.iter().map(|r| (r.title.as_deref().unwrap(), r.price.unwrap())).collect();
    assert_eq!(got, vec![("The Martian", 9.0), ("Circe", 15.0)]);
    assert!(rows.iter().all(|r| r.id.is_none() && r.genre.is_none() && r.in_stock.is_none()));
}

#[test]
fn catalog_pages_by_price_descending() {
    let (svc, _) = catalog_service();
    let page = |n| {
        let q = title_author_price().sort(BookField::Price, SortDirection::Descending).page(n).page_size(5);
        svc.list_catalog(&q).unwrap().into_iter().map(|r| r.title.unwrap()).collect::<Vec<_>>()
    };
    assert_eq!(page(1), vec![
        "The Lord of the Rings",
        "The Hobbit",
        "To Kill a Mockingbird",
        "Moby Dick",
        "Brave New World",
    ]);
    assert_eq!(page(2), vec![
        "1984",
        "The Alchemist",
        "The Great Gatsby",
        "Wuthering Heights",
        "The Catcher in the Rye",
    ]);
    assert_eq!(page(3), vec!["Animal Farm", "Pride and Prejudice"]);
    assert!(page(4).is_empty());
}

#[test]
fn tiebreaker_orders_equal_prices() {
    let (svc, _) = catalog_service();
    let q = title_author_price()
        .sort(BookField::Price, SortDirection::Descending)
        .then_by(BookField::Title, SortDirection::Descending)
        .page(2)
        .page_size(5);
    let titles: Vec<String> = svc.list_catalog(&q).unwrap().into_iter().filter_map(|r| r.title).collect();
    assert_eq!(titles, vec![
        "The Alchemist",
        "1984",
        "Wuthering Heights",
        "The Great Gatsby",
        "The Catcher in the Rye",
    ]);
}

#[test]
fn identifier_only_when_requested() {
    let (svc, _) = catalog_service();
    let q = ListQuery::new([BookField::Id, BookField::Title]).page_size(3);
    let rows = svc.list_catalog(&q).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.id.is_some() && r.title.is_some() && r.price.is_none()));
}

#[test]
fn default_page_size_comes_from_config() {
    let (svc, _) = catalog_service();
    let rows = svc.list_catalog(&ListQuery::default()).unwrap();
    assert_eq!(rows.len(), svc.config().default_page_size);
    assert!(rows.iter().all(|r| r.genre.is_some() && r.id.is_none()));
}

#[test]
fn invalid_paging_is_rejected_before_the_store() {
    let (svc, _) = catalog_service();
    assert!(matches!(svc.list_catalog(&ListQuery::default().page(0)), Err(ServiceError::InvalidArgument(_))));
    assert!(matches!(
        svc.list_in_stock_after(1900, &ListQuery::default().page_size(0)),
        Err(ServiceError::InvalidArgument(_))
    ));
    assert!(matches!("upwards".parse::<SortDirection>(), Err(ServiceError::InvalidArgument(_))));
    assert!(matches!("isbn".parse::<BookField>(), Err(ServiceError::InvalidArgument(_))));
}

#[test]
fn oversized_pages_are_rejected_not_clamped() {
    let svc = bulk_service(10_005);
    let q = ListQuery::new([BookField::Title]).sort(BookField::Title, SortDirection::Ascending);
    assert!(matches!(svc.list_catalog(&q.clone().page_size(20_000)), Err(ServiceError::InvalidArgument(_))));

    let first = svc.list_catalog(&q.clone().page_size(10_000)).unwrap();
    let second = svc.list_catalog(&q.page(2).page_size(10_000)).unwrap();
    assert_eq!((first.len(), second.len()), (10_000, 5));
    assert_eq!(second.last().and_then(|r| r.title.as_deref()), Some("b10004"));
}
