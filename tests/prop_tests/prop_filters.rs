use bookstore::store::MemoryCollection;
use bookstore::{Book, BookstoreService, IndexSpec};
use proptest::prelude::*;
use std::sync::Arc;

const GENRES: [&str; 3] = ["Fiction", "Fantasy", "Poetry"];

fn books() -> impl Strategy<Value = Vec<(i32, usize, u16)>> {
    prop::collection::vec((1800i32..2030, 0usize..GENRES.len(), 0u16..5000), 0..30)
}

fn load(rows: &[(i32, usize, u16)]) -> BookstoreService {
    let svc = BookstoreService::with_defaults(Arc::new(MemoryCollection::new("books")));
    let books = rows
        .iter()
        .enumerate()
        .map(|(i, (year, g, cents))| Book::new(format!("t{i}"), "a", GENRES[*g], *year, f64::from(*cents) / 100.0, true))
        .collect();
    svc.insert_many(books).unwrap();
    svc
}

fn sorted_titles(svc_books: impl Iterator<Item = bookstore::errors::Result<Book>>) -> Vec<String> {
    let mut t: Vec<String> = svc_books.map(|b| b.unwrap().title).collect();
    t.sort();
    t
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 32,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn published_after_is_strict(rows in books(), cutoff in 1790i32..2040) {
        let svc = load(&rows);
        let mut expected: Vec<String> = rows
            .iter()
            .enumerate()
            .filter(|(_, (y, _, _))| *y > cutoff)
            .map(|(i, _)| format!("t{i}"))
            .collect();
        expected.sort();
        prop_assert_eq!(sorted_titles(svc.find_published_after(cutoff).unwrap()), expected);
    }

    #[test]
    fn indexes_do_not_change_results(rows in books(), cutoff in 1790i32..2040, g in 0usize..GENRES.len()) {
        let svc = load(&rows);
        let genre_before = sorted_titles(svc.find_by_genre(GENRES[g]).unwrap());
        let after_before = sorted_titles(svc.find_published_after(cutoff).unwrap());
        svc.ensure_index(&IndexSpec::asc("genre")).unwrap();
        svc.ensure_index(&IndexSpec::asc("published_year")).unwrap();
        prop_assert_eq!(sorted_titles(svc.find_by_genre(GENRES[g]).unwrap()), genre_before);
        prop_assert_eq!(sorted_titles(svc.find_published_after(cutoff).unwrap()), after_before);
    }
}
