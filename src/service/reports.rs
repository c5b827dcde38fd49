//! Aggregate reports: price by genre, most prolific author, books per decade.

use super::{BookstoreService, elapsed_ms};
use crate::book::BookField;
use crate::errors::{Result, ServiceError, StoreError};
use crate::oplog;
use crate::pipeline::{Accumulator, Expr, Stage, pipeline_json};
use crate::query::{CmpOp, Filter, SortSpec, to_f64};
use crate::types::ID_FIELD;
use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const TOTAL: &str = "totalBooks";
const AVERAGE: &str = "averagePrice";
const DECADE: &str = "decade";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreStats {
    pub genre: String,
    pub count: u64,
    /// `None` when no book in the genre has a numeric price.
    pub average_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCount {
    pub author: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeCount {
    pub decade: i32,
    pub count: u64,
}

fn bad_row(op: &'static str, stages: &[Stage], row: &BsonDocument, what: &str) -> ServiceError {
    ServiceError::store(
        op,
        pipeline_json(stages).to_string(),
        StoreError::AggregationError(format!("unexpected result row {row}: {what}")),
    )
}

fn count_of(v: Option<&Bson>) -> Option<u64> {
    match v? {
        Bson::Int32(n) => u64::try_from(*n).ok(),
        Bson::Int64(n) => u64::try_from(*n).ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn decade_of(v: Option<&Bson>) -> Option<i32> {
    let f = to_f64(v?)?;
    (f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX)).then_some(f as i32)
}

impl BookstoreService {
    fn run_pipeline(&self, op: &'static str, stages: &[Stage]) -> Result<Vec<BsonDocument>> {
        let start = Instant::now();
        let rows = self
            .store
            .aggregate(stages)
            .map_err(|e| ServiceError::store(op, pipeline_json(stages).to_string(), e))?;
        oplog!(op, "collection" => self.store.name(), "pipeline" => pipeline_json(stages), "rows" => rows.len(), "duration_ms" => elapsed_ms(start));
        Ok(rows)
    }

    /// Count and mean price per genre, largest genre first; equal counts order by genre name.
    pub fn average_price_by_genre(&self) -> Result<Vec<GenreStats>> {
        let stages = [
            Stage::Group {
                id: Expr::field(BookField::Genre.as_str()),
                fields: vec![
                    (TOTAL.into(), Accumulator::count()),
                    (AVERAGE.into(), Accumulator::Avg(Expr::field(BookField::Price.as_str()))),
                ],
            },
            Stage::Sort(vec![SortSpec::desc(TOTAL), SortSpec::asc(ID_FIELD)]),
        ];
        let op = "average_price_by_genre";
        self.run_pipeline(op, &stages)?
            .iter()
            .map(|row| -> Result<GenreStats> {
                Ok(GenreStats {
                    genre: row
                        .get_str(ID_FIELD)
                        .map_err(|_| bad_row(op, &stages, row, "genre is not a string"))?
                        .to_string(),
                    count: count_of(row.get(TOTAL)).ok_or_else(|| bad_row(op, &stages, row, "missing count"))?,
                    average_price: row.get(AVERAGE).and_then(to_f64),
                })
            })
            .collect()
    }

    /// The author with the most books; ties go to the alphabetically first name.
    /// `None` for an empty collection.
    pub fn author_with_most_books(&self) -> Result<Option<AuthorCount>> {
        let stages = [
            Stage::Group {
                id: Expr::field(BookField::Author.as_str()),
                fields: vec![(TOTAL.into(), Accumulator::count())],
            },
            Stage::Sort(vec![SortSpec::desc(TOTAL), SortSpec::asc(ID_FIELD)]),
            Stage::Limit(1),
        ];
        let op = "author_with_most_books";
        let rows = self.run_pipeline(op, &stages)?;
        let Some(row) = rows.first() else { return Ok(None) };
        Ok(Some(AuthorCount {
            author: row
                .get_str(ID_FIELD)
                .map_err(|_| bad_row(op, &stages, row, "author is not a string"))?
                .to_string(),
            count: count_of(row.get(TOTAL)).ok_or_else(|| bad_row(op, &stages, row, "missing count"))?,
        }))
    }

    /// Books per decade (`floor(year / 10) * 10`), oldest first. Books without a numeric year
    /// (missing, null or mistyped) are skipped.
    pub fn count_by_decade(&self) -> Result<Vec<DecadeCount>> {
        let year = || Expr::field(BookField::PublishedYear.as_str());
        // `$mod` keeps the dividend's sign; shift it into 0..10 so BC years round down.
        let offset = year().modulo(Expr::literal(10)).add(Expr::literal(10)).modulo(Expr::literal(10));
        let stages = [
            // Range comparisons stay inside the numeric bracket, so this admits numeric years only.
            Stage::Match(Filter::Cmp {
                path: BookField::PublishedYear.as_str().to_string(),
                op: CmpOp::Gte,
                value: Bson::Int64(i64::MIN),
            }),
            Stage::Project(vec![(DECADE.into(), year().subtract(offset))]),
            Stage::Group {
                id: Expr::field(DECADE),
                fields: vec![(TOTAL.into(), Accumulator::count())],
            },
            Stage::Sort(vec![SortSpec::asc(ID_FIELD)]),
        ];
        let op = "count_by_decade";
        self.run_pipeline(op, &stages)?
            .iter()
            .map(|row| -> Result<DecadeCount> {
                Ok(DecadeCount {
                    decade: decade_of(row.get(ID_FIELD)).ok_or_else(|| bad_row(op, &stages, row, "decade is not a number"))?,
                    count: count_of(row.get(TOTAL)).ok_or_else(|| bad_row(op, &stages, row, "missing count"))?,
                })
            })
            .collect()
    }
}
