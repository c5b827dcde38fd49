use bookstore::store::MemoryCollection;
use bookstore::{Book, BookField, BookstoreService, ListQuery, SortDirection};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 32,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn pages_partition_the_sorted_catalog(
        prices in prop::collection::vec(0u16..50, 0..25),
        size in 1usize..8,
        descending in any::<bool>(),
    ) {
        let svc = BookstoreService::with_defaults(Arc::new(MemoryCollection::new("books")));
        let books: Vec<Book> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| Book::new(format!("t{i:02}"), "a", "g", 2000, f64::from(*p), true))
            .collect();
        svc.insert_many(books).unwrap();

        let direction = if descending { SortDirection::Descending } else { SortDirection::Ascending };
        let base = ListQuery::new([BookField::Title, BookField::Price])
            .sort(BookField::Price, direction)
            .then_by(BookField::Title, SortDirection::Ascending);
        let whole: Vec<String> = svc
            .list_catalog(&base.clone().page_size(prices.len().max(1)))
            .unwrap()
            .into_iter()
            .map(|r| r.title.unwrap())
            .collect();
        prop_assert_eq!(whole.len(), prices.len());

        let mut joined = Vec::new();
        let mut page = 1;
        loop {
            let rows = svc.list_catalog(&base.clone().page(page).page_size(size)).unwrap();
            prop_assert!(rows.len() <= size);
            if rows.is_empty() {
                break;
            }
            joined.extend(rows.into_iter().map(|r| r.title.unwrap()));
            page += 1;
        }
        prop_assert_eq!(&joined, &whole);
        prop_assert_eq!(joined.iter().collect::<HashSet<_>>().len(), joined.len());

        let mut expected: Vec<(u16, String)> =
            prices.iter().enumerate().map(|(i, p)| (*p, format!("t{i:02}"))).collect();
        expected.sort_by(|a, b| if descending { b.0.cmp(&a.0).then(a.1.cmp(&b.1)) } else { a.cmp(b) });
        prop_assert_eq!(whole, expected.into_iter().map(|(_, t)| t).collect::<Vec<_>>());
    }
}
