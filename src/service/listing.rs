//! Projected, sorted, paginated listings.

use super::{BookstoreService, elapsed_ms};
use crate::book::{BookField, PartialBook};
use crate::errors::{Result, ServiceError};
use crate::oplog;
use crate::query::{Filter, FindOptions, MAX_LIMIT, Order, SortSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn order(self) -> Order {
        match self {
            Self::Ascending => Order::Asc,
            Self::Descending => Order::Desc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        })
    }
}

/// Accepts `asc`/`ascending`/`1` and `desc`/`descending`/`-1`, case-insensitively.
impl FromStr for SortDirection {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(Self::Ascending),
            "desc" | "descending" | "-1" => Ok(Self::Descending),
            _ => Err(ServiceError::invalid(format!("unknown sort direction `{s}`"))),
        }
    }
}

/// A 1-indexed page of `size` rows; `size` is at most [`MAX_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: usize,
    size: usize,
}

impl Page {
    pub fn new(number: usize, size: usize) -> Result<Self> {
        if number < 1 {
            return Err(ServiceError::invalid(format!("page must be at least 1, got {number}")));
        }
        if size < 1 {
            return Err(ServiceError::invalid(format!("page size must be at least 1, got {size}")));
        }
        if size > MAX_LIMIT {
            return Err(ServiceError::invalid(format!("page size must be at most {MAX_LIMIT}, got {size}")));
        }
        Ok(Self { number, size })
    }

    /// `(page - 1) * size`
    #[must_use]
    pub const fn skip(self) -> usize {
        (self.number - 1).saturating_mul(self.size)
    }

    #[must_use]
    pub const fn limit(self) -> usize {
        self.size
    }
}

/// What to return from a listing and in which order.
///
/// `fields` empty means all six book fields. The identifier is returned only when
/// [`BookField::Id`] is listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub fields: Vec<BookField>,
    pub sort_by: BookField,
    pub direction: SortDirection,
    pub page: usize,
    /// Falls back to the configured default page size.
    pub page_size: Option<usize>,
    /// Secondary sort keys, applied in order when `sort_by` ties.
    pub then_by: Vec<(BookField, SortDirection)>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            sort_by: BookField::Price,
            direction: SortDirection::Ascending,
            page: 1,
            page_size: None,
            then_by: Vec::new(),
        }
    }
}

impl ListQuery {
    pub fn new(fields: impl IntoIterator<Item = BookField>) -> Self {
        Self { fields: fields.into_iter().collect(), ..Self::default() }
    }

    #[must_use]
    pub fn sort(mut self, field: BookField, direction: SortDirection) -> Self {
        self.sort_by = field;
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    #[must_use]
    pub fn then_by(mut self, field: BookField, direction: SortDirection) -> Self {
        self.then_by.push((field, direction));
        self
    }

    fn find_options(&self, default_page_size: usize) -> Result<FindOptions> {
        let page = Page::new(self.page, self.page_size.unwrap_or(default_page_size))?;
        let projection = if self.fields.is_empty() {
            BookField::REQUIRED.iter().map(|f| f.as_str().to_string()).collect()
        } else {
            self.fields.iter().map(|f| f.as_str().to_string()).collect()
        };
        let sort = std::iter::once((self.sort_by, self.direction))
            .chain(self.then_by.iter().copied())
            .map(|(f, d)| SortSpec { field: f.as_str().to_string(), order: d.order() })
            .collect();
        Ok(FindOptions { projection: Some(projection), sort: Some(sort), skip: Some(page.skip()), limit: Some(page.limit()) })
    }
}

impl BookstoreService {
    /// In-stock books published after `year`, projected, sorted and paged.
    pub fn list_in_stock_after(&self, year: i32, query: &ListQuery) -> Result<Vec<PartialBook>> {
        let filter = Filter::and([
            Filter::eq(BookField::InStock.as_str(), true),
            Filter::gt(BookField::PublishedYear.as_str(), year),
        ]);
        self.list("list_in_stock_after", &filter, query)
    }

    /// The whole catalog, projected, sorted and paged.
    pub fn list_catalog(&self, query: &ListQuery) -> Result<Vec<PartialBook>> {
        self.list("list_catalog", &Filter::True, query)
    }

    fn list(&self, op: &'static str, filter: &Filter, query: &ListQuery) -> Result<Vec<PartialBook>> {
        let start = Instant::now();
        let opts = query.find_options(self.config.default_page_size)?;
        let rows: Vec<PartialBook> = self
            .store
            .find(filter, &opts)
            .map_err(|e| ServiceError::store(op, filter.to_string(), e))?
            .map(|d| PartialBook::from_document(&d))
            .collect();
        oplog!(op, "collection" => self.store.name(), "filter" => filter.to_json(), "skip" => opts.skip, "limit" => opts.limit, "returned" => rows.len(), "duration_ms" => elapsed_ms(start));
        Ok(rows)
    }
}
