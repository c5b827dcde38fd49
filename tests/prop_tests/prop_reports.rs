use bookstore::store::MemoryCollection;
use bookstore::{Book, BookstoreService};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

const AUTHORS: [&str; 4] = ["Austen", "Bronte", "Orwell", "Tolkien"];

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 32,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn decades_bucket_every_book(rows in prop::collection::vec((0i32..2100, 0usize..AUTHORS.len(), 1u16..3000), 0..40)) {
        let svc = BookstoreService::with_defaults(Arc::new(MemoryCollection::new("books")));
        let books: Vec<Book> = rows
            .iter()
            .enumerate()
            .map(|(i, (y, a, c))| Book::new(format!("t{i}"), AUTHORS[*a], "g", *y, f64::from(*c) / 100.0, true))
            .collect();
        svc.insert_many(books).unwrap();

        let mut expected: BTreeMap<i32, u64> = BTreeMap::new();
        for (y, _, _) in &rows {
            *expected.entry(y - y % 10).or_default() += 1;
        }
        let got: BTreeMap<i32, u64> = svc.count_by_decade().unwrap().into_iter().map(|d| (d.decade, d.count)).collect();
        prop_assert_eq!(got.values().sum::<u64>(), rows.len() as u64);
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn top_author_has_maximal_count(rows in prop::collection::vec(0usize..AUTHORS.len(), 0..40)) {
        let svc = BookstoreService::with_defaults(Arc::new(MemoryCollection::new("books")));
        let books: Vec<Book> = rows
            .iter()
            .enumerate()
            .map(|(i, a)| Book::new(format!("t{i}"), AUTHORS[*a], "g", 2000, 1.0, true))
            .collect();
        svc.insert_many(books).unwrap();

        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for a in &rows {
            *counts.entry(AUTHORS[*a]).or_default() += 1;
        }
        let max = counts.values().copied().max();
        let expected = counts.iter().find(|(_, c)| Some(**c) == max).map(|(a, c)| (a.to_string(), *c));
        let top = svc.author_with_most_books().unwrap().map(|t| (t.author, t.count));
        prop_assert_eq!(top, expected);
    }
}
