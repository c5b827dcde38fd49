//! The bundled twelve-title catalog used by the CLI and tests.

use crate::book::Book;
use crate::errors::{Result, ServiceError};

pub const SAMPLE_CATALOG_JSON: &str = include_str!("../data/books.json");

/// Parses a JSON array of books.
pub fn parse_catalog(json: &str) -> Result<Vec<Book>> {
    serde_json::from_str(json).map_err(|e| ServiceError::invalid(format!("malformed book catalog: {e}")))
}

/// The bundled catalog, in file order.
pub fn sample_books() -> Result<Vec<Book>> {
    parse_catalog(SAMPLE_CATALOG_JSON)
}
